pub mod config;
pub mod crawler;
pub mod fetchers;
pub mod page;
pub mod parsers;
pub mod render;
pub mod results;
pub mod scope;
pub mod screenshot;

// Re-export commonly used types for convenience
pub use config::{CrawlConfig, FetcherKind};
pub use crawler::{CrawlError, CrawlLimits, Crawler};
pub use fetchers::{DocumentFetcher, FetchError};
pub use page::Page;
pub use results::{LinkGraph, SiteMap, SkippedLink, Unreachable};

use std::error::Error;
use std::sync::Arc;

/// Creates the document fetcher selected by the configuration
pub async fn connect_fetcher(
    config: &CrawlConfig,
) -> Result<Arc<dyn DocumentFetcher>, Box<dyn Error>> {
    match config.fetcher {
        FetcherKind::Http => {
            let fetcher = fetchers::HttpFetcher::new(config.fetch_timeout())?;
            Ok(Arc::new(fetcher))
        }
        FetcherKind::WebDriver => {
            let fetcher = fetchers::WebDriverFetcher::connect(
                &config.webdriver_url,
                config.screenshot.headless,
            )
            .await?;
            Ok(Arc::new(fetcher))
        }
    }
}

/// Crawls the site described by `config` and returns the completed site map
pub async fn crawl_site(config: &CrawlConfig) -> Result<SiteMap, Box<dyn Error>> {
    config.validate()?;

    let fetcher = connect_fetcher(config).await?;
    let crawler = Crawler::from_config(Arc::clone(&fetcher), config)?;

    let result = crawler.crawl().await;
    fetcher.close().await;

    Ok(result?)
}
