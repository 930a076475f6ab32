use crate::fetchers::{DocumentFetcher, FetchError};
use crate::parsers::Document;
use async_trait::async_trait;
use fantoccini::wd::Capabilities;
use fantoccini::{Client, ClientBuilder};
use serde_json::json;
use tokio::sync::Mutex;
use url::Url;

/// Fetches page source through a WebDriver browser session
///
/// The session is shared, so navigation and source retrieval are serialized
/// and the crawler runs one fetch at a time.
pub struct WebDriverFetcher {
    client: Mutex<Client>,
}

impl WebDriverFetcher {
    /// Connects to the WebDriver instance at `webdriver_url`
    pub async fn connect(
        webdriver_url: &str,
        headless: bool,
    ) -> Result<Self, fantoccini::error::NewSessionError> {
        let client = connect_to_webdriver(webdriver_url, headless).await?;
        Ok(Self {
            client: Mutex::new(client),
        })
    }
}

#[async_trait]
impl DocumentFetcher for WebDriverFetcher {
    async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
        let client = self.client.lock().await;

        client
            .goto(url.as_str())
            .await
            .map_err(|e| navigation_error(e, "accessing", url))?;

        // Relative links on the page resolve against where redirects ended up
        let current_url = client
            .current_url()
            .await
            .map_err(|e| navigation_error(e, "reading the location of", url))?;

        let source = client
            .source()
            .await
            .map_err(|e| navigation_error(e, "getting source for", url))?;

        Ok(Document::new(current_url, source))
    }

    fn max_concurrency(&self) -> Option<usize> {
        Some(1)
    }

    async fn close(&self) {
        let client = self.client.lock().await.clone();
        if let Err(e) = client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }
}

/// Browser capabilities requesting a headless window from Firefox or Chrome drivers
fn headless_capabilities() -> Capabilities {
    let mut caps = Capabilities::new();
    caps.insert(
        "moz:firefoxOptions".to_string(),
        json!({ "args": ["-headless"] }),
    );
    caps.insert(
        "goog:chromeOptions".to_string(),
        json!({ "args": ["--headless=new"] }),
    );
    caps
}

async fn connect_with(
    webdriver_url: &str,
    headless: bool,
) -> Result<Client, fantoccini::error::NewSessionError> {
    let mut builder = ClientBuilder::native();
    if headless {
        builder.capabilities(headless_capabilities());
    }
    builder.connect(webdriver_url).await
}

/// Connects to the WebDriver instance, trying common local ports as fallbacks
pub(crate) async fn connect_to_webdriver(
    webdriver_url: &str,
    headless: bool,
) -> Result<Client, fantoccini::error::NewSessionError> {
    let error = match connect_with(webdriver_url, headless).await {
        Ok(client) => {
            ::log::debug!("Connected to WebDriver at {}", webdriver_url);
            return Ok(client);
        }
        Err(e) => {
            ::log::error!(
                "Failed to connect to WebDriver at {}: {}",
                webdriver_url,
                e
            );
            e
        }
    };

    let fallback_urls = [
        "http://localhost:4444", // geckodriver default
        "http://localhost:9515", // ChromeDriver default
        "http://127.0.0.1:4444",
    ];

    for url in fallback_urls {
        if url == webdriver_url {
            continue;
        }

        ::log::info!("Trying fallback WebDriver URL: {}", url);
        if let Ok(client) = connect_with(url, headless).await {
            ::log::debug!("Connected to fallback WebDriver at {}", url);
            return Ok(client);
        }
    }

    ::log::error!(
        "Make sure a WebDriver server is running or set the WEBDRIVER_URL environment variable"
    );
    Err(error)
}

fn navigation_error(
    error: fantoccini::error::CmdError,
    context: &'static str,
    url: &Url,
) -> FetchError {
    if error.to_string().contains("Unable to find session") {
        ::log::warn!("Lost WebDriver session while {} {}", context, url);
    }
    FetchError::WebDriver {
        url: url.clone(),
        context,
        message: error.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_capabilities() {
        let caps = headless_capabilities();
        assert_eq!(caps["moz:firefoxOptions"]["args"][0], "-headless");
        assert_eq!(caps["goog:chromeOptions"]["args"][0], "--headless=new");
    }
}
