//! PDF downloads.
//!
//! Bodies are streamed into `<name>.part` next to the target and renamed on
//! success, so an interrupted download never leaves a file under the final
//! name.

use futures_util::StreamExt;
use std::path::{Path, PathBuf};
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};
use url::Url;

use crate::models::{DownloadResult, Paper};
use crate::utils::HttpClient;

/// Errors for a single paper's download. They never abort a batch.
#[derive(Debug, thiserror::Error)]
pub enum DownloadError {
    #[error("no PDF link")]
    MissingPdf,

    #[error("invalid PDF URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("network error: {0}")]
    Network(String),

    #[error("download timed out: {0}")]
    Timeout(String),

    #[error("HTTP {status} from {url}")]
    Status { status: u16, url: String },

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            DownloadError::Timeout(err.to_string())
        } else {
            DownloadError::Network(err.to_string())
        }
    }
}

fn io_error(path: &Path) -> impl FnOnce(std::io::Error) -> DownloadError + '_ {
    move |source| DownloadError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// Only absolute http(s) URLs are fetched
pub fn validate_pdf_url(raw: &str) -> Result<Url, DownloadError> {
    let url = Url::parse(raw).map_err(|e| DownloadError::InvalidUrl {
        url: raw.to_string(),
        reason: e.to_string(),
    })?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(DownloadError::InvalidUrl {
            url: raw.to_string(),
            reason: format!("unsupported scheme '{}'", scheme),
        }),
    }
}

/// Fetches PDFs over HTTP and writes them to disk
#[derive(Debug, Clone)]
pub struct PdfDownloader {
    client: HttpClient,
}

impl PdfDownloader {
    pub fn new(client: HttpClient) -> Self {
        Self { client }
    }

    /// Download `paper`'s PDF to `dir/file_name`, replacing any existing file.
    pub async fn download(
        &self,
        paper: &Paper,
        dir: &Path,
        file_name: &str,
    ) -> Result<DownloadResult, DownloadError> {
        if !paper.has_pdf() {
            return Err(DownloadError::MissingPdf);
        }
        let url = validate_pdf_url(&paper.pdf_url)?;

        tokio::fs::create_dir_all(dir).await.map_err(io_error(dir))?;
        let target = dir.join(file_name);
        let partial = dir.join(format!("{}.part", file_name));

        debug!(%url, path = %target.display(), "Downloading PDF");
        let result = self.fetch_to(url, &partial).await;

        match result {
            Ok(bytes) => {
                tokio::fs::rename(&partial, &target)
                    .await
                    .map_err(io_error(&target))?;
                Ok(DownloadResult::new(paper.paper_id.clone(), target, bytes))
            }
            Err(err) => {
                if let Err(e) = tokio::fs::remove_file(&partial).await {
                    if e.kind() != std::io::ErrorKind::NotFound {
                        warn!(path = %partial.display(), error = %e, "Could not remove partial download");
                    }
                }
                Err(err)
            }
        }
    }

    async fn fetch_to(&self, url: Url, path: &Path) -> Result<u64, DownloadError> {
        let response = self.client.get(url.as_str()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DownloadError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            });
        }

        let mut file = tokio::fs::File::create(path).await.map_err(io_error(path))?;
        let mut stream = response.bytes_stream();
        let mut written = 0u64;

        while let Some(chunk) = stream.next().await {
            let chunk = chunk?;
            file.write_all(&chunk).await.map_err(io_error(path))?;
            written += chunk.len() as u64;
        }
        file.flush().await.map_err(io_error(path))?;

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaperBuilder;
    use mockito::Server;

    fn paper_at(url: &str) -> Paper {
        PaperBuilder::new("2203.00001v1", "The State of Fortran", 2022)
            .pdf_url(url)
            .build()
    }

    #[test]
    fn test_validate_pdf_url() {
        assert!(validate_pdf_url("http://arxiv.org/pdf/2203.00001v1").is_ok());
        assert!(validate_pdf_url("https://arxiv.org/pdf/2203.00001v1").is_ok());
        assert!(matches!(
            validate_pdf_url("file:///etc/passwd"),
            Err(DownloadError::InvalidUrl { .. })
        ));
        assert!(matches!(
            validate_pdf_url("not a url"),
            Err(DownloadError::InvalidUrl { .. })
        ));
    }

    #[tokio::test]
    async fn test_download_writes_file() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pdf/2203.00001v1")
            .with_status(200)
            .with_header("content-type", "application/pdf")
            .with_body(b"%PDF-1.4 test")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = PdfDownloader::new(HttpClient::new().unwrap());
        let paper = paper_at(&format!("{}/pdf/2203.00001v1", server.url()));

        let result = downloader
            .download(&paper, dir.path(), "the_state_of_fortran.pdf")
            .await
            .unwrap();

        assert_eq!(result.bytes, 13);
        assert_eq!(result.path, dir.path().join("the_state_of_fortran.pdf"));
        assert_eq!(std::fs::read(&result.path).unwrap(), b"%PDF-1.4 test");
        assert!(!dir.path().join("the_state_of_fortran.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_download_creates_directory() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pdf/1")
            .with_status(200)
            .with_body("pdf")
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("a").join("b");
        let downloader = PdfDownloader::new(HttpClient::new().unwrap());
        let paper = paper_at(&format!("{}/pdf/1", server.url()));

        downloader.download(&paper, &nested, "x.pdf").await.unwrap();
        assert!(nested.join("x.pdf").exists());
    }

    #[tokio::test]
    async fn test_http_error_leaves_no_file() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/pdf/missing")
            .with_status(404)
            .create_async()
            .await;

        let dir = tempfile::tempdir().unwrap();
        let downloader = PdfDownloader::new(HttpClient::new().unwrap());
        let paper = paper_at(&format!("{}/pdf/missing", server.url()));

        let err = downloader
            .download(&paper, dir.path(), "missing.pdf")
            .await
            .unwrap_err();

        assert!(matches!(err, DownloadError::Status { status: 404, .. }));
        assert!(!dir.path().join("missing.pdf").exists());
        assert!(!dir.path().join("missing.pdf.part").exists());
    }

    #[tokio::test]
    async fn test_missing_pdf_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let downloader = PdfDownloader::new(HttpClient::new().unwrap());
        let paper = PaperBuilder::new("1", "No PDF", 2020).build();

        assert!(matches!(
            downloader.download(&paper, dir.path(), "x.pdf").await,
            Err(DownloadError::MissingPdf)
        ));
    }
}
