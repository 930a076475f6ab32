use crate::fetchers::{DocumentFetcher, FetchError};
use crate::parsers::{Document, LinkExtractor};
use crate::results::SkippedLink;
use crate::scope::{LinkScope, LinkTarget};
use std::time::Duration;
use tokio::time::timeout;
use url::Url;

/// One fetched page of the site and its outbound navigation links
#[derive(Debug, Clone)]
pub struct Page {
    path: String,
    document: Document,
    links: Vec<String>,
    skipped_links: Vec<SkippedLink>,
}

impl Page {
    /// Fetches `path` from the site and extracts its navigation links
    ///
    /// The fetch is abandoned after `fetch_timeout`.
    pub async fn load(
        fetcher: &dyn DocumentFetcher,
        scope: &LinkScope,
        extractor: &LinkExtractor,
        path: &str,
        fetch_timeout: Duration,
    ) -> Result<Self, FetchError> {
        ::log::info!("Parsing {}", path);

        let url = scope.resolve(path).map_err(|source| FetchError::InvalidPath {
            path: path.to_string(),
            source,
        })?;

        let document = match timeout(fetch_timeout, fetcher.fetch(&url)).await {
            Ok(result) => result?,
            Err(_) => {
                return Err(FetchError::Timeout {
                    url,
                    after: fetch_timeout,
                });
            }
        };

        Ok(Self::from_document(path, document, extractor, scope))
    }

    /// Builds a page from an already fetched document
    pub fn from_document(
        path: &str,
        document: Document,
        extractor: &LinkExtractor,
        scope: &LinkScope,
    ) -> Self {
        let mut links = Vec::new();
        let mut skipped_links = Vec::new();

        for href in extractor.extract(&document) {
            match scope.classify(document.url(), &href) {
                LinkTarget::Page(target) => links.push(target),
                LinkTarget::Skipped(reason) => {
                    ::log::debug!("Skipping {} on {}: {}", href, path, reason);
                    skipped_links.push(SkippedLink {
                        from: path.to_string(),
                        href,
                        reason,
                    });
                }
            }
        }

        ::log::info!("Found {} links in {}", links.len(), path);

        Self {
            path: path.to_string(),
            document,
            links,
            skipped_links,
        }
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn url(&self) -> &Url {
        self.document.url()
    }

    pub fn document(&self) -> &Document {
        &self.document
    }

    pub fn title(&self) -> Option<String> {
        self.document.title()
    }

    /// Site paths this page links to, in document order, duplicates kept
    pub fn links_to(&self) -> &[String] {
        &self.links
    }

    /// Navigation links that were left out of the crawl
    pub fn skipped_links(&self) -> &[SkippedLink] {
        &self.skipped_links
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scope::SkipReason;

    fn page(path: &str, body: &str) -> Page {
        let scope = LinkScope::new(Url::parse("http://localhost:3001").unwrap());
        let extractor = LinkExtractor::new("a.govuk-button").unwrap();
        let document = Document::new(scope.resolve(path).unwrap(), body.to_string());
        Page::from_document(path, document, &extractor, &scope)
    }

    #[test]
    fn test_links_keep_order_and_duplicates() {
        let page = page(
            "/",
            r#"<a class="govuk-button" href="/b">b</a>
               <a class="govuk-button" href="/a">a</a>
               <a class="govuk-button" href="/b">b again</a>"#,
        );
        assert_eq!(page.path(), "/");
        assert_eq!(page.links_to(), ["/b", "/a", "/b"]);
        assert_eq!(page.links_to(), page.links_to());
        assert!(page.skipped_links().is_empty());
    }

    #[test]
    fn test_out_of_scope_links_recorded() {
        let page = page(
            "/start",
            r##"<a class="govuk-button" href="https://www.gov.uk">gov</a>
                <a class="govuk-button" href="#top">top</a>
                <a class="govuk-button" href="name">next</a>"##,
        );
        assert_eq!(page.links_to(), ["/name"]);
        let reasons: Vec<_> = page.skipped_links().iter().map(|s| s.reason).collect();
        assert_eq!(reasons, vec![SkipReason::External, SkipReason::FragmentOnly]);
        assert_eq!(page.skipped_links()[0].from, "/start");
        assert_eq!(page.skipped_links()[0].href, "https://www.gov.uk");
    }
}
