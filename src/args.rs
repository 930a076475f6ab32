use clap::{Parser, ValueEnum};
use site_map::{CrawlConfig, FetcherKind};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "site-map")]
#[command(about = "Maps the navigation graph of a web application")]
#[command(version)]
pub struct Args {
    /// Base URL of the site (defaults to http://localhost:3001)
    pub base_url: Option<String>,

    /// Path to a JSON configuration file
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Path to start crawling from
    #[arg(short, long)]
    pub entry: Option<String>,

    /// CSS selector marking navigation links
    #[arg(short, long)]
    pub selector: Option<String>,

    /// Number of concurrent page fetches
    #[arg(long)]
    pub concurrency: Option<usize>,

    /// Maximum number of pages to fetch
    #[arg(long)]
    pub max_pages: Option<usize>,

    /// Per-page fetch timeout in seconds
    #[arg(long)]
    pub fetch_timeout: Option<u64>,

    /// Total timeout in seconds (0 disables it)
    #[arg(long)]
    pub total_timeout: Option<u64>,

    /// How page documents are fetched
    #[arg(long, value_enum)]
    pub fetcher: Option<FetcherArg>,

    /// URL of the WebDriver server
    #[arg(long)]
    pub webdriver_url: Option<String>,

    /// Directory for page screenshots
    #[arg(long)]
    pub screenshots_dir: Option<PathBuf>,

    /// Skip browser screenshots
    #[arg(long)]
    pub no_screenshots: bool,

    /// Image file rendered by Graphviz
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Skip rendering the graph image
    #[arg(long)]
    pub no_render: bool,

    /// Graphviz output format
    #[arg(long)]
    pub format: Option<String>,

    /// Print the DOT source to stdout
    #[arg(long)]
    pub dot: bool,

    /// Print the link graph as JSON to stdout
    #[arg(long)]
    pub json: bool,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum FetcherArg {
    Http,
    Webdriver,
}

impl From<FetcherArg> for FetcherKind {
    fn from(arg: FetcherArg) -> Self {
        match arg {
            FetcherArg::Http => FetcherKind::Http,
            FetcherArg::Webdriver => FetcherKind::WebDriver,
        }
    }
}

impl Args {
    /// Applies command-line overrides on top of a loaded configuration
    pub fn apply(&self, config: &mut CrawlConfig) {
        if let Some(base_url) = &self.base_url {
            config.base_url = base_url.clone();
        }
        if let Some(entry) = &self.entry {
            config.entry_path = entry.clone();
        }
        if let Some(selector) = &self.selector {
            config.link_selector = selector.clone();
        }
        if let Some(concurrency) = self.concurrency {
            config.max_concurrency = concurrency;
        }
        if let Some(max_pages) = self.max_pages {
            config.max_pages = max_pages;
        }
        if let Some(fetch_timeout) = self.fetch_timeout {
            config.fetch_timeout_secs = fetch_timeout;
        }
        if let Some(total_timeout) = self.total_timeout {
            config.total_timeout_secs = total_timeout;
        }
        if let Some(fetcher) = self.fetcher {
            config.fetcher = fetcher.into();
        }
        if let Some(webdriver_url) = &self.webdriver_url {
            config.webdriver_url = webdriver_url.clone();
        }
        if let Some(dir) = &self.screenshots_dir {
            config.screenshot.output_dir = dir.clone();
        }
        if self.no_screenshots {
            config.screenshot.enabled = false;
        }
        if let Some(output) = &self.output {
            config.render.output = Some(output.clone());
        }
        if self.no_render {
            config.render.output = None;
        }
        if let Some(format) = &self.format {
            config.render.format = format.clone();
        }
    }
}
