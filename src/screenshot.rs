use crate::config::ScreenshotConfig;
use crate::fetchers::webdriver::connect_to_webdriver;
use crate::results::SiteMap;
use fantoccini::Client;
use fantoccini::error::{CmdError, NewSessionError};
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;
use url::Url;

const DOCUMENT_WIDTH_SCRIPT: &str = "return Math.max(document.body.scrollWidth, document.body.offsetWidth, document.documentElement.clientWidth, document.documentElement.scrollWidth, document.documentElement.offsetWidth);";
const DOCUMENT_HEIGHT_SCRIPT: &str = "return Math.max(document.body.scrollHeight, document.body.offsetHeight, document.documentElement.clientHeight, document.documentElement.scrollHeight, document.documentElement.offsetHeight);";

#[derive(Debug, Error)]
pub enum ScreenshotError {
    #[error("could not start a WebDriver session: {0}")]
    Connect(#[from] NewSessionError),

    #[error("WebDriver command failed: {0}")]
    Command(#[from] CmdError),

    #[error("document size script returned {0}")]
    Measure(Value),

    #[error("failed to write screenshot: {0}")]
    Io(#[from] std::io::Error),
}

/// Captures full-page screenshots through a WebDriver browser session
pub struct Screenshotter {
    client: Client,
    config: ScreenshotConfig,
}

impl Screenshotter {
    pub async fn connect(config: &ScreenshotConfig) -> Result<Self, ScreenshotError> {
        let client = connect_to_webdriver(&config.webdriver_url, config.headless).await?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Renders `url` and returns a PNG of the whole document
    ///
    /// The window is reset to its configured size, then stretched to the
    /// document's scroll size (plus width padding) before the capture.
    pub async fn capture(&self, url: &Url) -> Result<Vec<u8>, ScreenshotError> {
        self.client
            .set_window_size(self.config.window_width, self.config.window_height)
            .await?;
        self.client.goto(url.as_str()).await?;

        let width = self.measure(DOCUMENT_WIDTH_SCRIPT).await?;
        let height = self.measure(DOCUMENT_HEIGHT_SCRIPT).await?;
        self.client
            .set_window_size(width.saturating_add(self.config.width_padding), height)
            .await?;

        if let Ok(title) = self.client.title().await {
            ::log::info!("{}", title);
        }

        Ok(self.client.screenshot().await?)
    }

    /// Writes `{index}.png` for every visited page into `dir`
    ///
    /// Returns the image path per visited page, in visited order. Pages that
    /// fail to render are logged and get `None`.
    pub async fn capture_site(
        &self,
        site_map: &SiteMap,
        dir: &Path,
    ) -> Result<Vec<Option<PathBuf>>, ScreenshotError> {
        tokio::fs::create_dir_all(dir).await?;

        let mut images = Vec::with_capacity(site_map.len());
        for (index, page) in site_map.visited().enumerate() {
            let image_path = dir.join(screenshot_file_name(index));
            match self.capture(page.url()).await {
                Ok(png) => {
                    tokio::fs::write(&image_path, png).await?;
                    ::log::debug!("Saved {} as {}", page.path(), image_path.display());
                    images.push(Some(image_path));
                }
                Err(e) => {
                    ::log::warn!("Failed to screenshot {}: {}", page.path(), e);
                    images.push(None);
                }
            }
        }

        Ok(images)
    }

    /// Ends the browser session
    pub async fn close(self) {
        if let Err(e) = self.client.close().await {
            ::log::warn!("Failed to close WebDriver session: {}", e);
        }
    }

    async fn measure(&self, script: &str) -> Result<u32, ScreenshotError> {
        let value = self.client.execute(script, Vec::new()).await?;
        parse_dimension(&value).ok_or(ScreenshotError::Measure(value))
    }
}

pub fn screenshot_file_name(index: usize) -> String {
    format!("{}.png", index)
}

fn parse_dimension(value: &Value) -> Option<u32> {
    value
        .as_u64()
        .or_else(|| value.as_f64().filter(|v| *v >= 0.0).map(|v| v.ceil() as u64))
        .and_then(|v| u32::try_from(v).ok())
}
