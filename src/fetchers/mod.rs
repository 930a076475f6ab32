pub mod http;
pub mod webdriver;

use crate::parsers::Document;
use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;
use url::Url;

pub use http::HttpFetcher;
pub use webdriver::WebDriverFetcher;

/// A page document could not be retrieved
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("'{path}' does not resolve to a URL: {source}")]
    InvalidPath {
        path: String,
        #[source]
        source: url::ParseError,
    },

    #[error("request to {url} failed: {source}")]
    Http {
        url: Url,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned HTTP {status}")]
    Status { url: Url, status: u16 },

    #[error("{url} is not an HTML document (content type {content_type})")]
    NotHtml { url: Url, content_type: String },

    #[error("WebDriver failed while {context} {url}: {message}")]
    WebDriver {
        url: Url,
        context: &'static str,
        message: String,
    },

    #[error("fetching {url} timed out after {after:?}")]
    Timeout { url: Url, after: Duration },
}

/// Retrieves documents for the crawler
#[async_trait]
pub trait DocumentFetcher: Send + Sync {
    /// Fetch the document at an absolute URL
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError>;

    /// Upper bound on concurrent fetches this fetcher can serve, if any
    ///
    /// Fetch timeouts start once a fetch is admitted, so a fetcher that
    /// serializes internally must report it here.
    fn max_concurrency(&self) -> Option<usize> {
        None
    }

    /// Release any held resources (browser sessions, ...)
    async fn close(&self) {}
}
