pub mod html;

use crate::config::ConfigError;
use scraper::Selector;
use url::Url;

/// A fetched HTML document
#[derive(Debug, Clone)]
pub struct Document {
    url: Url,
    source: String,
}

impl Document {
    pub fn new(url: Url, source: String) -> Self {
        Self { url, source }
    }

    /// Address the document was fetched from
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// Raw HTML source
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Contents of the `<title>` element, if any
    pub fn title(&self) -> Option<String> {
        html::parse_title(&self.source)
    }
}

/// Selects navigation links from documents with a CSS selector
#[derive(Debug, Clone)]
pub struct LinkExtractor {
    selector: Selector,
}

impl LinkExtractor {
    /// Compile the navigation link selector
    pub fn new(selector: &str) -> Result<Self, ConfigError> {
        let selector = Selector::parse(selector).map_err(|e| ConfigError::InvalidSelector {
            selector: selector.to_string(),
            message: e.to_string(),
        })?;
        Ok(Self { selector })
    }

    /// Raw `href` values of all matching elements, in document order
    pub fn extract(&self, document: &Document) -> Vec<String> {
        html::parse_links(document.source(), &self.selector)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE: &str = r#"<html>
        <head><title>Apply for a licence</title></head>
        <body>
          <a href="/help">Help</a>
          <a class="govuk-button" href="/start">Start now</a>
          <a class="govuk-button govuk-button--secondary" href="/later">Later</a>
          <a class="govuk-button" href="/start">Start again</a>
          <a class="govuk-button">No target</a>
        </body>
    </html>"#;

    fn document() -> Document {
        Document::new(
            Url::parse("http://localhost:3001/").unwrap(),
            PAGE.to_string(),
        )
    }

    #[test]
    fn test_extract_matches_selector_in_order() {
        let extractor = LinkExtractor::new("a.govuk-button").unwrap();
        assert_eq!(
            extractor.extract(&document()),
            vec!["/start", "/later", "/start"]
        );
    }

    #[test]
    fn test_extract_with_other_selector() {
        let extractor = LinkExtractor::new("a").unwrap();
        assert_eq!(
            extractor.extract(&document()),
            vec!["/help", "/start", "/later", "/start"]
        );
    }

    #[test]
    fn test_title() {
        assert_eq!(document().title().as_deref(), Some("Apply for a licence"));
    }

    #[test]
    fn test_invalid_selector() {
        assert!(matches!(
            LinkExtractor::new("a[href"),
            Err(ConfigError::InvalidSelector { .. })
        ));
    }
}
