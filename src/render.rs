use crate::config::RenderConfig;
use crate::results::LinkGraph;
use std::collections::HashSet;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use thiserror::Error;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("failed to run Graphviz '{binary}': {source}")]
    Spawn {
        binary: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Graphviz exited with {status}: {stderr}")]
    Graphviz { status: String, stderr: String },
}

/// Builds a Graphviz digraph of the link graph
///
/// `images[i]` is attached to the i-th node of `graph`. Link targets that are
/// not nodes of the graph (unreachable or skipped pages) are drawn dashed.
pub fn to_dot(graph: &LinkGraph, images: &[Option<PathBuf>], config: &RenderConfig) -> String {
    let mut dot = String::new();

    // Writing to a String cannot fail
    let _ = writeln!(dot, "digraph {{");
    let _ = writeln!(dot, "  rankdir={};", quote(&config.rankdir));
    let _ = writeln!(dot, "  ranksep={};", quote(&config.ranksep.to_string()));

    for (index, path) in graph.paths().enumerate() {
        match images.get(index).and_then(Option::as_ref) {
            Some(image) => {
                let _ = writeln!(
                    dot,
                    "  {} [shape=\"box\", imagescale=\"true\", image={}, label={}];",
                    quote(path),
                    quote(&image.to_string_lossy()),
                    quote(path)
                );
            }
            None => {
                let _ = writeln!(dot, "  {} [shape=\"box\"];", quote(path));
            }
        }
    }

    let mut missing = HashSet::new();
    for (_, links) in graph.iter() {
        for link in links {
            if !graph.contains(link) && missing.insert(link.as_str()) {
                let _ = writeln!(dot, "  {} [shape=\"box\", style=\"dashed\"];", quote(link));
            }
        }
    }

    let edge_attrs = format!(
        "[arrowsize={}, penwidth={}]",
        quote(&config.arrowsize.to_string()),
        quote(&config.penwidth.to_string())
    );
    for (path, links) in graph.iter() {
        for link in links {
            let _ = writeln!(dot, "  {} -> {} {};", quote(path), quote(link), edge_attrs);
        }
    }

    dot.push_str("}\n");
    dot
}

/// Pipes `dot` source through the Graphviz binary, writing `output`
pub async fn render_image(
    dot: &str,
    output: &Path,
    config: &RenderConfig,
) -> Result<(), RenderError> {
    let spawn_error = |source| RenderError::Spawn {
        binary: config.dot_binary.clone(),
        source,
    };

    let mut child = Command::new(&config.dot_binary)
        .arg(format!("-T{}", config.format))
        .arg("-o")
        .arg(output)
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()
        .map_err(spawn_error)?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(dot.as_bytes()).await.map_err(spawn_error)?;
        // Closing stdin lets Graphviz finish
        drop(stdin);
    }

    let result = child.wait_with_output().await.map_err(spawn_error)?;
    if !result.status.success() {
        return Err(RenderError::Graphviz {
            status: result.status.to_string(),
            stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
        });
    }

    ::log::info!("Wrote {}", output.display());
    Ok(())
}

/// Quotes a DOT identifier
fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crawler::Crawler;
    use crate::fetchers::{DocumentFetcher, FetchError};
    use crate::parsers::{Document, LinkExtractor};
    use crate::scope::LinkScope;
    use async_trait::async_trait;
    use std::sync::Arc;
    use url::Url;

    struct TwoPages;

    #[async_trait]
    impl DocumentFetcher for TwoPages {
        async fn fetch(&self, url: &Url) -> Result<Document, FetchError> {
            let body = match url.path() {
                "/" => r#"<a class="govuk-button" href="/a">a</a><a class="govuk-button" href="/gone">x</a>"#,
                "/a" => r#"<a class="govuk-button" href="/">home</a>"#,
                _ => {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: 404,
                    });
                }
            };
            Ok(Document::new(url.clone(), body.to_string()))
        }
    }

    async fn graph() -> LinkGraph {
        let scope = LinkScope::new(Url::parse("http://localhost:3001").unwrap());
        let extractor = LinkExtractor::new("a.govuk-button").unwrap();
        Crawler::new(Arc::new(TwoPages), scope, extractor, "/")
            .crawl()
            .await
            .unwrap()
            .links_graph()
    }

    #[tokio::test]
    async fn test_to_dot() {
        let graph = graph().await;
        let images = vec![Some(PathBuf::from("tmp/0.png")), None];
        let dot = to_dot(&graph, &images, &RenderConfig::default());

        assert!(dot.starts_with("digraph {\n"));
        assert!(dot.contains("  rankdir=\"LR\";\n"));
        assert!(dot.contains("  ranksep=\"3\";\n"));
        assert!(dot.contains(
            "  \"/\" [shape=\"box\", imagescale=\"true\", image=\"tmp/0.png\", label=\"/\"];\n"
        ));
        assert!(dot.contains("  \"/a\" [shape=\"box\"];\n"));
        assert!(dot.contains("  \"/gone\" [shape=\"box\", style=\"dashed\"];\n"));
        assert!(dot.contains("  \"/\" -> \"/a\" [arrowsize=\"2\", penwidth=\"7\"];\n"));
        assert!(dot.contains("  \"/a\" -> \"/\" [arrowsize=\"2\", penwidth=\"7\"];\n"));
        assert!(dot.ends_with("}\n"));
    }

    #[test]
    fn test_quote_escapes() {
        assert_eq!(quote("/a"), "\"/a\"");
        assert_eq!(quote("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(quote(r"a\b"), r#""a\\b""#);
    }

    #[test]
    fn test_empty_graph() {
        let dot = to_dot(&LinkGraph::default(), &[], &RenderConfig::default());
        assert!(!dot.contains("->"));
        assert!(dot.ends_with("}\n"));
    }

    #[tokio::test]
    async fn test_missing_graphviz_binary() {
        let config = RenderConfig {
            dot_binary: "definitely-not-a-graphviz-binary".to_string(),
            ..RenderConfig::default()
        };
        let result = render_image("digraph {}", Path::new("unused.png"), &config).await;
        assert!(matches!(result, Err(RenderError::Spawn { .. })));
    }
}
