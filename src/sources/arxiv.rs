//! arXiv research source implementation.

use async_trait::async_trait;
use feed_rs::parser;
use tracing::{debug, trace};

use crate::models::{PageRequest, RawEntry, RawLink, SortBy, SortOrder};
use crate::query::Query;
use crate::sources::{Source, SourceError, DEFAULT_PAGE_SIZE};
use crate::utils::HttpClient;

/// Base URL for arXiv API
pub const ARXIV_API_URL: &str = "http://export.arxiv.org/api/query";

/// Entry ids under this path are error reports, not papers
const ERROR_ENTRY_MARKER: &str = "/api/errors";

/// arXiv research source
#[derive(Debug, Clone)]
pub struct ArxivSource {
    client: HttpClient,
    base_url: String,
    sort_by: SortBy,
    sort_order: SortOrder,
    page_size: usize,
}

impl ArxivSource {
    /// Create a new arXiv source on the public endpoint
    pub fn new(client: HttpClient) -> Self {
        Self {
            client,
            base_url: ARXIV_API_URL.to_string(),
            sort_by: SortBy::default(),
            sort_order: SortOrder::default(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }

    /// Point at another endpoint (mirrors, tests)
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn with_sort(mut self, sort_by: SortBy, sort_order: SortOrder) -> Self {
        self.sort_by = sort_by;
        self.sort_order = sort_order;
        self
    }

    /// Entries requested per page, at least one
    pub fn with_page_size(mut self, page_size: usize) -> Self {
        self.page_size = page_size.max(1);
        self
    }

    /// Build the request URL for one page
    pub fn request_url(&self, query: &Query, page: PageRequest) -> String {
        format!(
            "{}?search_query={}&start={}&max_results={}&sortBy={}&sortOrder={}",
            self.base_url,
            urlencoding::encode(&query.to_string()),
            page.start,
            page.limit,
            self.sort_by.as_str(),
            self.sort_order.as_str()
        )
    }

    /// Parse an Atom response body into raw entries
    pub fn parse_feed(body: &[u8]) -> Result<Vec<RawEntry>, SourceError> {
        let feed = parser::parse(body)?;

        if let Some(error) = feed
            .entries
            .iter()
            .find(|entry| entry.id.contains(ERROR_ENTRY_MARKER))
        {
            let message = error
                .summary
                .as_ref()
                .or(error.title.as_ref())
                .map(|text| text.content.trim().to_string())
                .unwrap_or_else(|| error.id.clone());
            return Err(SourceError::Api(message));
        }

        Ok(feed.entries.into_iter().map(Self::convert_entry).collect())
    }

    fn convert_entry(entry: feed_rs::model::Entry) -> RawEntry {
        RawEntry {
            id: entry.id,
            title: entry.title.map(|t| t.content).unwrap_or_default(),
            authors: entry.authors.into_iter().map(|a| a.name).collect(),
            published: entry.published,
            updated: entry.updated,
            links: entry
                .links
                .into_iter()
                .map(|link| RawLink {
                    href: link.href,
                    rel: link.rel,
                    media_type: link.media_type,
                    title: link.title,
                })
                .collect(),
            summary: entry.summary.map(|s| s.content),
            categories: entry.categories.into_iter().map(|c| c.term).collect(),
        }
    }
}

#[async_trait]
impl Source for ArxivSource {
    fn id(&self) -> &str {
        "arxiv"
    }

    fn page_size(&self) -> usize {
        self.page_size
    }

    async fn fetch_page(
        &self,
        query: &Query,
        page: PageRequest,
    ) -> Result<Vec<RawEntry>, SourceError> {
        let url = self.request_url(query, page);
        debug!(%url, "Requesting arXiv page");

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/atom+xml")
            .send()
            .await?;

        let status = response.status();
        let body = response.bytes().await?;
        trace!(status = status.as_u16(), bytes = body.len(), "Received arXiv response");

        if !status.is_success() {
            // arXiv reports malformed queries as an error feed with a 400
            if let Err(err @ SourceError::Api(_)) = Self::parse_feed(&body) {
                return Err(err);
            }
            return Err(SourceError::Status {
                status: status.as_u16(),
                url,
            });
        }

        Self::parse_feed(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Clause, Field};
    use chrono::Datelike;
    use mockito::{Matcher, Server};

    const FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom" xmlns:arxiv="http://arxiv.org/schemas/atom">
  <title type="html">ArXiv Query: search_query=au:"Richardson"</title>
  <id>http://arxiv.org/api/abc</id>
  <updated>2023-01-01T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/abs/2203.00001v1</id>
    <updated>2022-03-02T10:00:00Z</updated>
    <published>2022-03-01T10:00:00Z</published>
    <title>The State of
      Fortran</title>
    <summary>  A survey of the
      Fortran ecosystem.
    </summary>
    <author><name>Brad Richardson</name></author>
    <author><name>Milan Curcic</name></author>
    <link href="http://arxiv.org/abs/2203.00001v1" rel="alternate" type="text/html"/>
    <link title="pdf" href="http://arxiv.org/pdf/2203.00001v1" rel="related" type="application/pdf"/>
    <arxiv:primary_category term="cs.SE" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.SE" scheme="http://arxiv.org/schemas/atom"/>
    <category term="cs.PL" scheme="http://arxiv.org/schemas/atom"/>
  </entry>
</feed>"#;

    const ERROR_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query: search_query=</title>
  <id>http://arxiv.org/api/err</id>
  <updated>2023-01-01T00:00:00-05:00</updated>
  <entry>
    <id>http://arxiv.org/api/errors#incorrect_id_format_for_1234</id>
    <title>Error</title>
    <summary>incorrect id format for 1234</summary>
    <updated>2023-01-01T00:00:00-05:00</updated>
    <author><name>arXiv api core</name></author>
  </entry>
</feed>"#;

    const EMPTY_FEED: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<feed xmlns="http://www.w3.org/2005/Atom">
  <title>ArXiv Query</title>
  <id>http://arxiv.org/api/empty</id>
  <updated>2023-01-01T00:00:00-05:00</updated>
</feed>"#;

    fn richardson_query() -> Query {
        Query::new()
            .and(Clause::term(Field::Author, "Richardson").unwrap())
            .and(Clause::term(Field::Title, "fortran").unwrap())
    }

    fn source_for(server: &Server) -> ArxivSource {
        ArxivSource::new(HttpClient::new().unwrap())
            .with_base_url(format!("{}/api/query", server.url()))
    }

    #[test]
    fn test_request_url() {
        let source = ArxivSource::new(HttpClient::new().unwrap());
        let url = source.request_url(&richardson_query(), PageRequest::new(100, 50));
        assert_eq!(
            url,
            "http://export.arxiv.org/api/query?search_query=au%3A%22Richardson%22%20AND%20ti%3A%22fortran%22&start=100&max_results=50&sortBy=lastUpdatedDate&sortOrder=descending"
        );
    }

    #[test]
    fn test_request_url_sort() {
        let source = ArxivSource::new(HttpClient::new().unwrap())
            .with_sort(SortBy::SubmittedDate, SortOrder::Ascending);
        let url = source.request_url(&Query::new(), PageRequest::new(0, 10));
        assert!(url.contains("search_query=all%3A%2A"));
        assert!(url.ends_with("&sortBy=submittedDate&sortOrder=ascending"));
    }

    #[test]
    fn test_parse_feed() {
        let entries = ArxivSource::parse_feed(FEED.as_bytes()).unwrap();
        assert_eq!(entries.len(), 1);

        let entry = &entries[0];
        assert_eq!(entry.id, "http://arxiv.org/abs/2203.00001v1");
        assert!(entry.title.contains("The State of"));
        assert_eq!(entry.authors, vec!["Brad Richardson", "Milan Curcic"]);
        assert_eq!(entry.published.map(|d| d.year()), Some(2022));
        assert_eq!(entry.categories, vec!["cs.SE", "cs.PL"]);
        assert!(entry
            .links
            .iter()
            .any(|l| l.is_pdf_typed() && l.href == "http://arxiv.org/pdf/2203.00001v1"));
        assert!(entry.summary.as_deref().unwrap().contains("Fortran ecosystem"));
    }

    #[test]
    fn test_parse_empty_feed() {
        assert!(ArxivSource::parse_feed(EMPTY_FEED.as_bytes())
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_parse_error_feed() {
        match ArxivSource::parse_feed(ERROR_FEED.as_bytes()) {
            Err(SourceError::Api(message)) => {
                assert_eq!(message, "incorrect id format for 1234")
            }
            other => panic!("expected API error, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_malformed_feed() {
        assert!(matches!(
            ArxivSource::parse_feed(b"this is not xml"),
            Err(SourceError::Parse(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_page_sends_query_parameters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded(
                    "search_query".to_string(),
                    r#"au:"Richardson" AND ti:"fortran""#.to_string(),
                ),
                Matcher::UrlEncoded("start".to_string(), "0".to_string()),
                Matcher::UrlEncoded("max_results".to_string(), "5".to_string()),
                Matcher::UrlEncoded("sortBy".to_string(), "lastUpdatedDate".to_string()),
            ]))
            .with_status(200)
            .with_header("content-type", "application/atom+xml")
            .with_body(FEED)
            .expect(1)
            .create_async()
            .await;

        let entries = source_for(&server)
            .fetch_page(&richardson_query(), PageRequest::new(0, 5))
            .await
            .unwrap();

        assert_eq!(entries.len(), 1);
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_fetch_page_http_error() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(503)
            .with_body("Service Unavailable")
            .create_async()
            .await;

        let result = source_for(&server)
            .fetch_page(&richardson_query(), PageRequest::new(0, 5))
            .await;

        match result {
            Err(SourceError::Status { status, url }) => {
                assert_eq!(status, 503);
                assert!(url.contains("start=0"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_error_feed_with_400() {
        let mut server = Server::new_async().await;
        let _mock = server
            .mock("GET", "/api/query")
            .match_query(Matcher::Any)
            .with_status(400)
            .with_body(ERROR_FEED)
            .create_async()
            .await;

        let result = source_for(&server)
            .fetch_page(&Query::new(), PageRequest::new(0, 5))
            .await;
        assert!(matches!(result, Err(SourceError::Api(_))));
    }
}
