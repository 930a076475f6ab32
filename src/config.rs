use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Errors raised while loading or validating configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Json(#[from] serde_json::Error),

    #[error("invalid URL '{url}': {source}")]
    InvalidUrl {
        url: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid URL pattern '{pattern}': {source}")]
    InvalidPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("invalid link selector '{selector}': {message}")]
    InvalidSelector { selector: String, message: String },

    #[error("invalid configuration: {0}")]
    Invalid(String),
}

/// How page documents are retrieved
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FetcherKind {
    /// Plain HTTP GET
    #[default]
    Http,
    /// Page source as rendered by a WebDriver browser session
    WebDriver,
}

/// Configuration for a site mapping run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlConfig {
    /// Root of the site; every link is resolved against this origin
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Path the traversal starts from
    #[serde(default = "default_entry_path")]
    pub entry_path: String,

    /// CSS selector marking navigation links
    #[serde(default = "default_link_selector")]
    pub link_selector: String,

    /// Maximum number of concurrent page fetches
    #[serde(default = "default_max_concurrency")]
    pub max_concurrency: usize,

    /// Maximum number of pages fetched in one crawl
    #[serde(default = "default_max_pages")]
    pub max_pages: usize,

    /// Per-page fetch timeout in seconds
    #[serde(default = "default_fetch_timeout_secs")]
    pub fetch_timeout_secs: u64,

    /// Whole-crawl timeout in seconds (0 disables it)
    #[serde(default = "default_total_timeout_secs")]
    pub total_timeout_secs: u64,

    /// Regex patterns a link path must match (if empty, all paths are included)
    #[serde(default)]
    pub include_patterns: Vec<String>,

    /// Regex patterns that exclude a link path (take precedence over includes)
    #[serde(default)]
    pub exclude_patterns: Vec<String>,

    #[serde(default)]
    pub fetcher: FetcherKind,

    /// URL for the WebDriver instance
    #[serde(default = "default_webdriver_url")]
    pub webdriver_url: String,

    #[serde(default)]
    pub screenshot: ScreenshotConfig,

    #[serde(default)]
    pub render: RenderConfig,
}

/// Browser screenshot settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScreenshotConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Directory receiving one `{index}.png` per visited page
    #[serde(default = "default_screenshot_dir")]
    pub output_dir: PathBuf,

    /// URL for the WebDriver instance (filled from the crawl config when empty)
    #[serde(default)]
    pub webdriver_url: String,

    #[serde(default = "default_window_width")]
    pub window_width: u32,

    #[serde(default = "default_window_height")]
    pub window_height: u32,

    /// Extra width added to the measured document width before capture
    #[serde(default = "default_width_padding")]
    pub width_padding: u32,

    /// Run the browser without a visible window
    #[serde(default = "default_true")]
    pub headless: bool,
}

/// Graph rendering settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RenderConfig {
    /// Image written by Graphviz (no image is produced when unset)
    #[serde(default = "default_render_output")]
    pub output: Option<PathBuf>,

    /// Graphviz output format (`png`, `svg`, ...)
    #[serde(default = "default_render_format")]
    pub format: String,

    #[serde(default = "default_rankdir")]
    pub rankdir: String,

    #[serde(default = "default_ranksep")]
    pub ranksep: f32,

    #[serde(default = "default_arrowsize")]
    pub arrowsize: f32,

    #[serde(default = "default_penwidth")]
    pub penwidth: f32,

    /// Path to the Graphviz `dot` executable
    #[serde(default = "default_dot_binary")]
    pub dot_binary: String,
}

fn default_base_url() -> String {
    "http://localhost:3001".to_string()
}

fn default_entry_path() -> String {
    "/".to_string()
}

fn default_link_selector() -> String {
    "a.govuk-button".to_string()
}

fn default_max_concurrency() -> usize {
    4
}

fn default_max_pages() -> usize {
    500
}

fn default_fetch_timeout_secs() -> u64 {
    45
}

fn default_total_timeout_secs() -> u64 {
    1200
}

fn default_webdriver_url() -> String {
    "http://localhost:4444".to_string()
}

fn default_true() -> bool {
    true
}

fn default_screenshot_dir() -> PathBuf {
    PathBuf::from("tmp")
}

fn default_window_width() -> u32 {
    800
}

fn default_window_height() -> u32 {
    600
}

fn default_width_padding() -> u32 {
    100
}

fn default_render_output() -> Option<PathBuf> {
    Some(PathBuf::from("site-map.png"))
}

fn default_render_format() -> String {
    "png".to_string()
}

fn default_rankdir() -> String {
    "LR".to_string()
}

fn default_ranksep() -> f32 {
    3.0
}

fn default_arrowsize() -> f32 {
    2.0
}

fn default_penwidth() -> f32 {
    7.0
}

fn default_dot_binary() -> String {
    "dot".to_string()
}

impl Default for CrawlConfig {
    fn default() -> Self {
        Self::new(&default_base_url())
    }
}

impl Default for ScreenshotConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            output_dir: default_screenshot_dir(),
            webdriver_url: String::new(),
            window_width: default_window_width(),
            window_height: default_window_height(),
            width_padding: default_width_padding(),
            headless: true,
        }
    }
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            output: default_render_output(),
            format: default_render_format(),
            rankdir: default_rankdir(),
            ranksep: default_ranksep(),
            arrowsize: default_arrowsize(),
            penwidth: default_penwidth(),
            dot_binary: default_dot_binary(),
        }
    }
}

impl CrawlConfig {
    /// Create a new configuration with default values
    pub fn new(base_url: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            entry_path: default_entry_path(),
            link_selector: default_link_selector(),
            max_concurrency: default_max_concurrency(),
            max_pages: default_max_pages(),
            fetch_timeout_secs: default_fetch_timeout_secs(),
            total_timeout_secs: default_total_timeout_secs(),
            include_patterns: Vec::new(),
            exclude_patterns: Vec::new(),
            fetcher: FetcherKind::default(),
            webdriver_url: default_webdriver_url(),
            screenshot: ScreenshotConfig::default(),
            render: RenderConfig::default(),
        }
    }

    /// Load configuration from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let mut file = File::open(path)?;
        let mut contents = String::new();
        file.read_to_string(&mut contents)?;

        Self::from_json(&contents)
    }

    /// Load configuration from a JSON string
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        Ok(config)
    }

    /// Apply the `WEBDRIVER_URL` environment variable, if set
    pub fn apply_env(&mut self) {
        if let Ok(webdriver_url) = std::env::var("WEBDRIVER_URL") {
            if !webdriver_url.is_empty() {
                self.webdriver_url = webdriver_url;
            }
        }
    }

    /// Check field values that serde cannot enforce
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_concurrency == 0 {
            return Err(ConfigError::Invalid(
                "max_concurrency must be at least 1".to_string(),
            ));
        }
        if self.max_pages == 0 {
            return Err(ConfigError::Invalid(
                "max_pages must be at least 1".to_string(),
            ));
        }
        if self.fetch_timeout_secs == 0 {
            return Err(ConfigError::Invalid(
                "fetch_timeout_secs must be at least 1".to_string(),
            ));
        }
        if !self.entry_path.starts_with('/') {
            return Err(ConfigError::Invalid(format!(
                "entry_path must be site-relative, got '{}'",
                self.entry_path
            )));
        }
        if self.link_selector.trim().is_empty() {
            return Err(ConfigError::Invalid(
                "link_selector must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_secs(self.fetch_timeout_secs)
    }

    /// Whole-crawl deadline, `None` when disabled
    pub fn total_timeout(&self) -> Option<Duration> {
        (self.total_timeout_secs > 0).then(|| Duration::from_secs(self.total_timeout_secs))
    }

    /// Screenshot settings with the WebDriver URL inherited from the crawl config
    pub fn screenshot_config(&self) -> ScreenshotConfig {
        let mut screenshot = self.screenshot.clone();
        if screenshot.webdriver_url.is_empty() {
            screenshot.webdriver_url = self.webdriver_url.clone();
        }
        screenshot
    }
}
