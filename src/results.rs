use crate::fetchers::FetchError;
use crate::page::Page;
use crate::scope::SkipReason;
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::collections::{HashMap, HashSet};

/// A navigation link that was not followed
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct SkippedLink {
    /// Path of the page the link was found on
    pub from: String,
    /// Link target as written in the document (or the normalized path for `PageLimit`)
    pub href: String,
    pub reason: SkipReason,
}

/// A claimed page whose document could not be fetched
#[derive(Debug)]
pub struct Unreachable {
    pub path: String,
    pub error: FetchError,
}

/// Ordered mapping from each visited path to the paths it links to
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LinkGraph {
    entries: Vec<(String, Vec<String>)>,
    index: HashMap<String, usize>,
}

impl LinkGraph {
    /// Builds a graph from `(path, links)` pairs, keeping their order
    ///
    /// Paths are unique; a repeated path keeps its first entry.
    pub fn from_entries(entries: impl IntoIterator<Item = (String, Vec<String>)>) -> Self {
        let mut graph = Self::default();
        for (path, links) in entries {
            if graph.index.contains_key(&path) {
                continue;
            }
            graph.index.insert(path.clone(), graph.entries.len());
            graph.entries.push((path, links));
        }
        graph
    }

    /// Outbound links of `path`, duplicates kept
    pub fn get(&self, path: &str) -> Option<&[String]> {
        self.index
            .get(path)
            .map(|&position| self.entries[position].1.as_slice())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.get(path).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.entries
            .iter()
            .map(|(path, links)| (path.as_str(), links.as_slice()))
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(path, _)| path.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Total number of edges, repeated links counted each time
    pub fn edge_count(&self) -> usize {
        self.entries.iter().map(|(_, links)| links.len()).sum()
    }
}

impl Serialize for LinkGraph {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (path, links) in &self.entries {
            map.serialize_entry(path, links)?;
        }
        map.end()
    }
}

/// The completed result of a crawl
///
/// Pages are kept in depth-first, pre-order, link-order sequence from the
/// entry path, independent of the order fetches finished in.
#[derive(Debug)]
pub struct SiteMap {
    entry: String,
    order: Vec<String>,
    pages: HashMap<String, Page>,
    unreachable: Vec<Unreachable>,
    skipped: Vec<SkippedLink>,
}

impl SiteMap {
    /// Orders the collected pages and failures into a completed site map
    pub(crate) fn assemble(
        entry: String,
        pages: HashMap<String, Page>,
        mut unreachable: Vec<Unreachable>,
        mut limited: Vec<SkippedLink>,
    ) -> Self {
        let (order, dangling) = preorder(&entry, &pages);

        let ranks: HashMap<&str, usize> = dangling
            .iter()
            .enumerate()
            .map(|(rank, path)| (path.as_str(), rank))
            .collect();
        let rank = |path: &str| ranks.get(path).copied().unwrap_or(usize::MAX);
        unreachable.sort_by_key(|u| rank(u.path.as_str()));

        let mut skipped: Vec<SkippedLink> = order
            .iter()
            .filter_map(|path| pages.get(path))
            .flat_map(|page| page.skipped_links().iter().cloned())
            .collect();
        limited.sort_by_key(|s| rank(s.href.as_str()));
        skipped.extend(limited);

        Self {
            entry,
            order,
            pages,
            unreachable,
            skipped,
        }
    }

    /// Path the crawl started from
    pub fn entry(&self) -> &str {
        &self.entry
    }

    /// Visited pages in discovery order
    pub fn visited(&self) -> impl Iterator<Item = &Page> {
        self.order.iter().filter_map(|path| self.pages.get(path))
    }

    /// Visited paths in discovery order
    pub fn visited_paths(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn page(&self, path: &str) -> Option<&Page> {
        self.pages.get(path)
    }

    pub fn contains(&self, path: &str) -> bool {
        self.pages.contains_key(path)
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Pages that were claimed but failed to load
    pub fn unreachable(&self) -> &[Unreachable] {
        &self.unreachable
    }

    /// Links that were not followed, per page in discovery order, then page-limit skips
    pub fn skipped(&self) -> &[SkippedLink] {
        &self.skipped
    }

    /// Projects visited pages into path → outbound links, recomputed on each call
    pub fn links_graph(&self) -> LinkGraph {
        LinkGraph::from_entries(
            self.visited()
                .map(|page| (page.path().to_string(), page.links_to().to_vec())),
        )
    }
}

/// Replays a depth-first pre-order walk over the loaded pages
///
/// Returns visited paths in order, and the paths that were linked but never
/// loaded in order of first encounter.
fn preorder(entry: &str, pages: &HashMap<String, Page>) -> (Vec<String>, Vec<String>) {
    let mut order = Vec::new();
    let mut dangling = Vec::new();
    let mut seen = HashSet::new();
    let mut stack = vec![entry.to_string()];

    // Marking on pop matches a recursive walk that checks each link when it reaches it
    while let Some(path) = stack.pop() {
        if !seen.insert(path.clone()) {
            continue;
        }
        match pages.get(&path) {
            Some(page) => {
                stack.extend(page.links_to().iter().rev().cloned());
                order.push(path);
            }
            None => dangling.push(path),
        }
    }

    (order, dangling)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(path: &str, links: &[&str]) -> (String, Vec<String>) {
        (
            path.to_string(),
            links.iter().map(|link| link.to_string()).collect(),
        )
    }

    #[test]
    fn test_link_graph_lookup_keeps_order() {
        let graph = LinkGraph::from_entries([
            entry("/", &["/b", "/a", "/b"]),
            entry("/b", &[]),
            entry("/a", &["/"]),
        ]);

        assert_eq!(graph.paths().collect::<Vec<_>>(), vec!["/", "/b", "/a"]);
        assert_eq!(graph.get("/").unwrap(), ["/b", "/a", "/b"]);
        assert_eq!(graph.get("/a").unwrap(), ["/"]);
        assert!(graph.contains("/b"));
        assert!(!graph.contains("/c"));
        assert_eq!(graph.edge_count(), 4);
    }

    #[test]
    fn test_link_graph_repeated_path_keeps_first() {
        let graph = LinkGraph::from_entries([entry("/", &["/a"]), entry("/", &["/b"])]);

        assert_eq!(graph.len(), 1);
        assert_eq!(graph.get("/").unwrap(), ["/a"]);
    }
}
