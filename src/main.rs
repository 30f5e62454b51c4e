use anyhow::{Context, Result};
use arxiv_fetch::config::{load_config, Config};
use arxiv_fetch::harvest::{DownloadEvent, Harvester};
use arxiv_fetch::models::{Filter, Paper, YearRange};
use arxiv_fetch::query::build_query;
use arxiv_fetch::query::expr::Expr;
use arxiv_fetch::ui::{
    format_file_size, print_section, print_status, status_line, stderr_is_terminal, Spinner,
    Status,
};
use arxiv_fetch::utils::{
    is_terminal, render_download_header, render_json, render_listing, render_table,
    terminal_width, NameBase,
};
use clap::{Parser, ValueEnum};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// arxiv-fetch - Search arXiv by author and title, list matches and download their PDFs
#[derive(Parser, Debug)]
#[command(name = "arxiv-fetch")]
#[command(version = arxiv_fetch::VERSION)]
#[command(about = "Search arXiv by author and title, list matches and download their PDFs", long_about = None)]
struct Cli {
    /// Author expression: "Name", "A OR B", "A AND B", "OR A, B" or "AND A, B"
    #[arg(default_value = "")]
    authors: String,

    /// Maximum number of results to fetch
    #[arg(default_value_t = 10, value_parser = clap::value_parser!(u64).range(1..))]
    n: u64,

    /// Keyword that must appear in the title
    #[arg(default_value = "")]
    title: String,

    /// First publication year to keep (inclusive)
    #[arg(long, alias = "start_year", value_name = "YEAR")]
    start_year: Option<i32>,

    /// Last publication year to keep (inclusive)
    #[arg(long, alias = "end_year", value_name = "YEAR")]
    end_year: Option<i32>,

    /// Only list matching papers, do not download
    #[arg(long)]
    list: bool,

    /// Include abstracts in the listing
    #[arg(long = "abstract")]
    include_abstract: bool,

    /// Filter results locally, e.g. 'ti:"neural" AND year:2020'
    #[arg(long = "where", value_name = "EXPR")]
    where_expr: Option<String>,

    /// Save the resulting papers as JSON
    #[arg(long, value_name = "FILE")]
    save: Option<PathBuf>,

    /// Load papers from a saved JSON file instead of querying arXiv
    #[arg(long, value_name = "FILE")]
    from: Option<PathBuf>,

    /// Directory to save PDFs into
    #[arg(long, short = 'd', value_name = "DIR")]
    dir: Option<PathBuf>,

    /// Output format
    #[arg(long, short, value_enum, default_value_t = OutputFormat::Auto)]
    output: OutputFormat,

    /// Enable verbose logging (-v for debug, -vv for trace)
    #[arg(long, short, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(long, short)]
    quiet: bool,

    /// Configuration file path
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout: Option<u64>,

    /// Entries requested per page
    #[arg(long, value_name = "N")]
    page_size: Option<usize>,

    /// Minimum milliseconds between requests
    #[arg(long, value_name = "MS")]
    interval_ms: Option<u64>,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    print_config: bool,
}

/// Output format for results
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Plain on a terminal, JSON otherwise
    Auto,
    /// Aligned text listing
    Plain,
    /// Table format (human-readable)
    Table,
    /// JSON format (machine-readable)
    Json,
}

impl OutputFormat {
    fn resolve(self, tty: bool) -> OutputFormat {
        match self {
            OutputFormat::Auto if tty => OutputFormat::Plain,
            OutputFormat::Auto => OutputFormat::Json,
            other => other,
        }
    }
}

impl Cli {
    fn filter(&self) -> Result<Filter> {
        let years = YearRange::new(self.start_year, self.end_year)?;
        let filter = Filter::new(usize::try_from(self.n).unwrap_or(usize::MAX))
            .author_expr(&self.authors)?
            .title(&self.title)
            .years(years);
        filter.validate()?;
        Ok(filter)
    }

    fn apply_overrides(&self, config: &mut Config) {
        if let Some(timeout) = self.timeout {
            config.api.timeout_secs = timeout;
        }
        if let Some(page_size) = self.page_size {
            config.api.page_size = page_size;
        }
        if let Some(interval) = self.interval_ms {
            config.api.request_interval_ms = interval;
        }
        if let Some(dir) = &self.dir {
            config.downloads.directory = dir.clone();
        }
    }

    fn log_directive(&self, config: &Config) -> String {
        let level = if self.quiet {
            "error"
        } else {
            match self.verbose {
                0 => config.logging.level.as_str(),
                1 => "debug",
                _ => "trace",
            }
        };
        format!("arxiv_fetch={}", level)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = load_config(cli.config.as_deref()).context("Failed to load configuration")?;
    cli.apply_overrides(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| cli.log_directive(&config)),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    if cli.print_config {
        print!("{}", config.to_toml()?);
        return Ok(());
    }

    run(&cli, &config).await
}

async fn run(cli: &Cli, config: &Config) -> Result<()> {
    let filter = cli.filter()?;
    let query = build_query(&filter)?;
    let where_expr = cli
        .where_expr
        .as_deref()
        .map(Expr::parse)
        .transpose()
        .context("Invalid --where expression")?;
    let harvester = Harvester::from_config(config).context("Failed to create HTTP client")?;
    let directory = &config.downloads.directory;

    if !cli.quiet {
        print_criteria(cli, &filter, &query.to_string(), directory);
    }

    let (mut papers, fetch_error) = match &cli.from {
        Some(path) => (harvester.refine(load_papers(path)?, &filter), None),
        None => {
            let spinner = Spinner::new("Searching arXiv...");
            let outcome = harvester.search(&filter).await;
            spinner.clear();
            let outcome = outcome?;
            (outcome.papers, outcome.fetch_error)
        }
    };

    if let Some(expr) = &where_expr {
        expr.retain(&mut papers);
    }

    if let Some(path) = &cli.save {
        save_papers(path, &papers)?;
        print_status(
            Status::Success,
            &format!("Saved {} paper(s) to {}", papers.len(), path.display()),
        );
    }

    if papers.is_empty() {
        if let Some(err) = fetch_error {
            return Err(err).context("Search failed");
        }
        print_status(Status::Info, "No papers found matching the criteria.");
        return Ok(());
    }

    let format = cli.output.resolve(is_terminal());
    if cli.list {
        print_listing(&papers, format, cli.include_abstract)?;
    } else {
        download(cli, &harvester, &papers, &filter, directory, format).await?;
    }

    match fetch_error {
        Some(err) => Err(err).context("Search stopped early; the results above are partial"),
        None => Ok(()),
    }
}

fn print_criteria(cli: &Cli, filter: &Filter, query: &str, directory: &Path) {
    let author = filter
        .author
        .as_ref()
        .map(|a| a.to_string())
        .unwrap_or_else(|| "(any)".to_string());
    let action = if cli.list {
        "list".to_string()
    } else {
        format!("download to {}", directory.display())
    };

    print_section("arXiv search");
    eprintln!("Author query : {}", author);
    eprintln!("Title filter : {}", filter.title.as_deref().unwrap_or("(none)"));
    eprintln!("Year range   : {}", filter.years);
    eprintln!("Max results  : {}", filter.max_count);
    match &cli.from {
        Some(path) => eprintln!("Source       : {}", path.display()),
        None => eprintln!("Query        : {}", query),
    }
    if let Some(expr) = &cli.where_expr {
        eprintln!("Where        : {}", expr);
    }
    eprintln!("Action       : {}", action);
    eprintln!();
}

fn print_listing(papers: &[Paper], format: OutputFormat, include_abstract: bool) -> Result<()> {
    match format {
        OutputFormat::Json => println!("{}", render_json(papers)?),
        OutputFormat::Table => {
            println!("Found {} paper(s) matching the criteria:\n", papers.len());
            println!("{}", render_table(papers, terminal_width()));
        }
        OutputFormat::Plain | OutputFormat::Auto => {
            println!("Found {} paper(s) matching the criteria:\n", papers.len());
            print!("{}", render_listing(papers, include_abstract));
        }
    }
    Ok(())
}

async fn download(
    cli: &Cli,
    harvester: &Harvester,
    papers: &[Paper],
    filter: &Filter,
    directory: &Path,
    format: OutputFormat,
) -> Result<()> {
    let color = stderr_is_terminal();
    let verbose = !cli.quiet;

    if verbose {
        eprintln!("Found {} paper(s). Starting download...\n", papers.len());
    }

    let batch = harvester
        .download_all_with_progress(papers, directory, &NameBase::from_filter(filter), |event| {
            if !verbose {
                return;
            }
            match event {
                DownloadEvent::Started { index, paper, .. } => {
                    eprintln!("{}", render_download_header(index, paper));
                }
                DownloadEvent::Finished { result, .. } => {
                    let msg = format!(
                        "Saved as: {} ({})",
                        result.path.display(),
                        format_file_size(result.bytes)
                    );
                    eprintln!("    {}\n", status_line(Status::Success, &msg, color));
                }
                DownloadEvent::Failed { error, .. } => {
                    let msg = format!("Error downloading PDF: {}", error);
                    eprintln!("    {}\n", status_line(Status::Error, &msg, color));
                }
                DownloadEvent::Skipped { index, paper } => {
                    let msg = format!("[{}] Skipping: {} (no PDF link)", index, paper.title);
                    eprintln!("{}\n", status_line(Status::Skipped, &msg, color));
                }
            }
        })
        .await;

    for failure in &batch.failures {
        print_status(Status::Error, &format!("Failed: {}", failure));
    }

    let summary = batch.to_string();
    if batch.failed() > 0 {
        print_status(Status::Warning, &summary);
    } else {
        print_status(Status::Success, &summary);
    }

    if format == OutputFormat::Json {
        println!("{}", serde_json::to_string_pretty(&batch)?);
    }
    Ok(())
}

fn load_papers(path: &Path) -> Result<Vec<Paper>> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("{} is not a saved paper list", path.display()))
}

fn save_papers(path: &Path, papers: &[Paper]) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, render_json(papers)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}
