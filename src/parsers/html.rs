use scraper::{Html, Selector};

/// Extracts the `href` of every element matching `selector`, in document order
///
/// Duplicates are kept; elements without an `href` are ignored.
pub fn parse_links(html: &str, selector: &Selector) -> Vec<String> {
    let doc = Html::parse_document(html);

    let links = doc
        .select(selector)
        .filter_map(|e| e.value().attr("href"))
        .map(|s| s.to_string())
        .collect::<Vec<String>>();

    ::log::debug!("HTML parser found {} links", links.len());
    if !links.is_empty() {
        ::log::trace!(
            "First few links: {:?}",
            links.iter().take(5).collect::<Vec<_>>()
        );
    }

    links
}

/// Parses the document title, whitespace-normalized
pub fn parse_title(html: &str) -> Option<String> {
    let doc = Html::parse_document(html);
    let title_selector = Selector::parse("title").ok()?;

    doc.select(&title_selector)
        .next()
        .map(|e| {
            e.text()
                .collect::<Vec<_>>()
                .join(" ")
                .split_whitespace()
                .collect::<Vec<_>>()
                .join(" ")
        })
        .filter(|title| !title.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_links_ignores_missing_href() {
        let selector = Selector::parse("a").unwrap();
        let links = parse_links(
            "<body><a>none</a><a href=\"/x\">x</a><a href=\"\">blank</a></body>",
            &selector,
        );
        assert_eq!(links, vec!["/x", ""]);
    }

    #[test]
    fn test_parse_title_missing_or_blank() {
        assert_eq!(parse_title("<html><body></body></html>"), None);
        assert_eq!(parse_title("<title>   </title>"), None);
        assert_eq!(
            parse_title("<title>\n  Check   answers\n</title>").as_deref(),
            Some("Check answers")
        );
    }
}
