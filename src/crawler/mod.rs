use crate::config::{ConfigError, CrawlConfig};
use crate::fetchers::{DocumentFetcher, FetchError};
use crate::page::Page;
use crate::parsers::LinkExtractor;
use crate::results::{SiteMap, SkippedLink, Unreachable};
use crate::scope::{LinkScope, SkipReason, normalize_path};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use url::Url;


/// A crawl that could not produce a site map
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("entry page is unreachable: {0}")]
    EntryUnreachable(#[source] FetchError),

    #[error("crawl did not complete within {0:?}")]
    Deadline(Duration),

    #[error("page task failed: {0}")]
    Task(#[from] JoinError),
}

/// Bounds applied to a single crawl
#[derive(Debug, Clone)]
pub struct CrawlLimits {
    pub max_concurrency: usize,
    pub max_pages: usize,
    pub fetch_timeout: Duration,
    pub total_timeout: Option<Duration>,
}

impl Default for CrawlLimits {
    fn default() -> Self {
        Self {
            max_concurrency: 4,
            max_pages: 500,
            fetch_timeout: Duration::from_secs(45),
            total_timeout: None,
        }
    }
}

impl From<&CrawlConfig> for CrawlLimits {
    fn from(config: &CrawlConfig) -> Self {
        Self {
            max_concurrency: config.max_concurrency.max(1),
            max_pages: config.max_pages.max(1),
            fetch_timeout: config.fetch_timeout(),
            total_timeout: config.total_timeout(),
        }
    }
}

/// Outcome of claiming a path in the discovery set
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    /// First sighting; the caller must load the page
    New,
    /// Already claimed earlier in the crawl
    Seen,
    /// First sighting, but the page limit is exhausted
    OverLimit,
}

/// Paths discovered so far
///
/// Grows monotonically. `claim` is the only way in, so a path can be handed
/// out for loading at most once.
#[derive(Debug)]
struct Discovery {
    claimed: HashSet<String>,
    loads: usize,
    max_pages: usize,
}

impl Discovery {
    fn new(max_pages: usize) -> Self {
        Self {
            claimed: HashSet::new(),
            loads: 0,
            max_pages,
        }
    }

    fn claim(&mut self, path: &str) -> Claim {
        if !self.claimed.insert(path.to_string()) {
            return Claim::Seen;
        }
        if self.loads >= self.max_pages {
            return Claim::OverLimit;
        }
        self.loads += 1;
        Claim::New
    }
}

/// Discovers every page reachable from the entry path
///
/// Consumed by [`Crawler::crawl`], which returns the completed [`SiteMap`].
pub struct Crawler {
    fetcher: Arc<dyn DocumentFetcher>,
    scope: Arc<LinkScope>,
    extractor: Arc<LinkExtractor>,
    entry: String,
    limits: CrawlLimits,
}

impl Crawler {
    pub fn new(
        fetcher: Arc<dyn DocumentFetcher>,
        scope: LinkScope,
        extractor: LinkExtractor,
        entry: &str,
    ) -> Self {
        // The entry gets the same key as any link that reaches the same page
        let entry = scope
            .resolve(entry)
            .map(|url| normalize_path(&url))
            .unwrap_or_else(|_| entry.to_string());

        Self {
            fetcher,
            scope: Arc::new(scope),
            extractor: Arc::new(extractor),
            entry,
            limits: CrawlLimits::default(),
        }
    }

    /// Builds a crawler for the site described by `config`
    pub fn from_config(
        fetcher: Arc<dyn DocumentFetcher>,
        config: &CrawlConfig,
    ) -> Result<Self, ConfigError> {
        let base = Url::parse(&config.base_url).map_err(|source| ConfigError::InvalidUrl {
            url: config.base_url.clone(),
            source,
        })?;
        let scope = LinkScope::new(base)
            .with_patterns(&config.include_patterns, &config.exclude_patterns)?;
        let extractor = LinkExtractor::new(&config.link_selector)?;

        Ok(Self::new(fetcher, scope, extractor, &config.entry_path)
            .with_limits(CrawlLimits::from(config)))
    }

    pub fn with_limits(mut self, limits: CrawlLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Runs the crawl to completion
    pub async fn crawl(self) -> Result<SiteMap, CrawlError> {
        ::log::info!(
            "Starting crawl of {} from {}",
            self.scope.base(),
            self.entry
        );
        let start_time = std::time::Instant::now();

        let total_timeout = self.limits.total_timeout;
        let site_map = match total_timeout {
            Some(limit) => tokio::time::timeout(limit, self.discover())
                .await
                .map_err(|_| CrawlError::Deadline(limit))??,
            None => self.discover().await?,
        };

        ::log::info!(
            "Crawl complete - {} pages, {} unreachable, {} skipped links in {:.2} seconds",
            site_map.len(),
            site_map.unreachable().len(),
            site_map.skipped().len(),
            start_time.elapsed().as_secs_f64()
        );
        Ok(site_map)
    }

    async fn discover(self) -> Result<SiteMap, CrawlError> {
        let semaphore = Arc::new(Semaphore::new(self.concurrency()));
        let mut discovery = Discovery::new(self.limits.max_pages);
        let mut in_flight = JoinSet::new();

        let mut pages = HashMap::new();
        let mut unreachable = Vec::new();
        let mut limited = Vec::new();

        // Claimed before it is loaded, so a self-link on the entry page is absorbed
        discovery.claim(&self.entry);
        self.spawn_load(&mut in_flight, &semaphore, self.entry.clone());

        while let Some(joined) = in_flight.join_next().await {
            let (path, result) = joined?;

            let page = match result {
                Ok(page) => page,
                Err(error) if path == self.entry => {
                    in_flight.abort_all();
                    return Err(CrawlError::EntryUnreachable(error));
                }
                Err(error) => {
                    ::log::warn!("Page {} is unreachable: {}", path, error);
                    unreachable.push(Unreachable { path, error });
                    continue;
                }
            };

            for link in page.links_to() {
                match discovery.claim(link) {
                    Claim::New => {
                        ::log::debug!("Queuing {} (linked from {})", link, path);
                        self.spawn_load(&mut in_flight, &semaphore, link.clone());
                    }
                    Claim::Seen => {
                        ::log::trace!("Skipping already discovered link: {}", link);
                    }
                    Claim::OverLimit => {
                        ::log::warn!(
                            "Page limit of {} reached, not following {}",
                            self.limits.max_pages,
                            link
                        );
                        limited.push(SkippedLink {
                            from: path.clone(),
                            href: link.clone(),
                            reason: SkipReason::PageLimit,
                        });
                    }
                }
            }

            pages.insert(path, page);
        }

        Ok(SiteMap::assemble(
            self.entry.clone(),
            pages,
            unreachable,
            limited,
        ))
    }

    /// Concurrent fetches allowed, capped by what the fetcher can serve
    fn concurrency(&self) -> usize {
        let limit = match self.fetcher.max_concurrency() {
            Some(fetcher_limit) => self.limits.max_concurrency.min(fetcher_limit),
            None => self.limits.max_concurrency,
        };
        limit.max(1)
    }

    fn spawn_load(
        &self,
        in_flight: &mut JoinSet<(String, Result<Page, FetchError>)>,
        semaphore: &Arc<Semaphore>,
        path: String,
    ) {
        let fetcher = Arc::clone(&self.fetcher);
        let scope = Arc::clone(&self.scope);
        let extractor = Arc::clone(&self.extractor);
        let semaphore = Arc::clone(semaphore);
        let fetch_timeout = self.limits.fetch_timeout;

        in_flight.spawn(async move {
            // The semaphore is never closed
            let _permit = semaphore.acquire_owned().await;
            let result =
                Page::load(fetcher.as_ref(), &scope, &extractor, &path, fetch_timeout).await;
            (path, result)
        });
    }
}
