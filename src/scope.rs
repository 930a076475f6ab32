use crate::config::ConfigError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use url::Url;

/// Why a link target was left out of the crawl
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Blank or missing href
    Empty,
    /// In-page anchor such as `#top`
    FragmentOnly,
    /// Could not be resolved against the page URL
    Malformed,
    /// Non-HTTP scheme (`mailto:`, `javascript:`, ...)
    UnsupportedScheme,
    /// Different origin than the site being mapped
    External,
    /// Rejected by the include/exclude patterns
    Excluded,
    /// The crawl reached its page limit before this path was claimed
    PageLimit,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            SkipReason::Empty => "empty href",
            SkipReason::FragmentOnly => "fragment-only link",
            SkipReason::Malformed => "malformed link",
            SkipReason::UnsupportedScheme => "unsupported scheme",
            SkipReason::External => "external link",
            SkipReason::Excluded => "excluded by pattern",
            SkipReason::PageLimit => "page limit reached",
        };
        f.write_str(reason)
    }
}

/// Result of classifying one raw href
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Site-relative path to crawl
    Page(String),
    Skipped(SkipReason),
}

/// Decides which hrefs belong to the site and normalizes them to paths
#[derive(Debug)]
pub struct LinkScope {
    base: Url,
    include_regexes: Vec<Regex>,
    exclude_regexes: Vec<Regex>,
}

impl LinkScope {
    /// Create a scope for the site rooted at `base`
    pub fn new(base: Url) -> Self {
        Self {
            base,
            include_regexes: Vec::new(),
            exclude_regexes: Vec::new(),
        }
    }

    /// Compile include/exclude patterns, matched against the normalized path
    pub fn with_patterns(
        mut self,
        include_patterns: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, ConfigError> {
        self.include_regexes = compile(include_patterns)?;
        self.exclude_regexes = compile(exclude_patterns)?;
        Ok(self)
    }

    pub fn base(&self) -> &Url {
        &self.base
    }

    /// Absolute URL for a site-relative path
    pub fn resolve(&self, path: &str) -> Result<Url, url::ParseError> {
        self.base.join(path)
    }

    /// Classify `href` as found on the page at `page_url`
    pub fn classify(&self, page_url: &Url, href: &str) -> LinkTarget {
        let href = href.trim();
        if href.is_empty() {
            return LinkTarget::Skipped(SkipReason::Empty);
        }
        if href.starts_with('#') {
            return LinkTarget::Skipped(SkipReason::FragmentOnly);
        }

        let resolved = match page_url.join(href) {
            Ok(url) => url,
            Err(e) => {
                ::log::debug!("Cannot resolve '{}' on {}: {}", href, page_url, e);
                return LinkTarget::Skipped(SkipReason::Malformed);
            }
        };

        if !matches!(resolved.scheme(), "http" | "https") {
            return LinkTarget::Skipped(SkipReason::UnsupportedScheme);
        }
        if resolved.origin() != self.base.origin() {
            return LinkTarget::Skipped(SkipReason::External);
        }

        let path = normalize_path(&resolved);
        if !self.is_included(&path) {
            return LinkTarget::Skipped(SkipReason::Excluded);
        }

        LinkTarget::Page(path)
    }

    fn is_included(&self, path: &str) -> bool {
        // Exclusions take precedence
        if self.exclude_regexes.iter().any(|regex| regex.is_match(path)) {
            return false;
        }
        self.include_regexes.is_empty()
            || self
                .include_regexes
                .iter()
                .any(|regex| regex.is_match(path))
    }
}

/// Site-relative key for a URL: path plus query, fragment dropped
pub fn normalize_path(url: &Url) -> String {
    match url.query() {
        Some(query) => format!("{}?{}", url.path(), query),
        None => url.path().to_string(),
    }
}

fn compile(patterns: &[String]) -> Result<Vec<Regex>, ConfigError> {
    patterns
        .iter()
        .map(|pattern| {
            Regex::new(pattern).map_err(|source| ConfigError::InvalidPattern {
                pattern: pattern.clone(),
                source,
            })
        })
        .collect()
}
