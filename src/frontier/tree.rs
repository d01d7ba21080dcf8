use crate::link::strip_scheme;
use std::collections::BTreeMap;

/// Depth of a node whose URL is known but not yet scheduled
pub const UNSCHEDULED: i32 = -1;

/// Segment label of the synthetic root
pub const ROOT_SEGMENT: &str = ".";

/// One path segment of a URL
///
/// Children are owned by their parent and kept sorted by segment. There is no
/// back-reference; every traversal starts at the root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierNode {
    segment: String,
    depth: i32,
    children: BTreeMap<String, FrontierNode>,
}

impl FrontierNode {
    fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_string(),
            depth: UNSCHEDULED,
            children: BTreeMap::new(),
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    /// Hop count from the seed, or [`UNSCHEDULED`]
    pub fn depth(&self) -> i32 {
        self.depth
    }

    pub fn is_scheduled(&self) -> bool {
        self.depth >= 0
    }

    /// Children in segment order
    pub fn children(&self) -> impl Iterator<Item = &FrontierNode> {
        self.children.values()
    }
}

/// Per-session prefix tree over URL path segments
///
/// The tree is the only deduplication authority of a crawl session. A URL is
/// "known" once the node ending its segment chain carries a non-negative
/// depth; nodes created only as prefixes of other URLs stay unscheduled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierTree {
    root: FrontierNode,
}

impl Default for FrontierTree {
    fn default() -> Self {
        Self {
            root: FrontierNode::new(ROOT_SEGMENT),
        }
    }
}

impl FrontierTree {
    /// Builds the initial chain for a seed URL, every node unscheduled
    pub fn new(seed_url: &str) -> Self {
        let mut tree = Self::default();
        let mut node = &mut tree.root;
        for segment in segments(seed_url) {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| FrontierNode::new(segment));
        }
        tree
    }

    pub fn root(&self) -> &FrontierNode {
        &self.root
    }

    /// Inserts a URL, creating any missing segment nodes
    ///
    /// The leaf takes `depth` only if it is still unscheduled, so repeated
    /// insertion never changes a recorded depth. An URL without segments is
    /// ignored.
    pub fn insert(&mut self, url: &str, depth: i32) {
        let mut segments = segments(url).peekable();
        if segments.peek().is_none() {
            return;
        }

        let mut node = &mut self.root;
        for segment in segments {
            node = node
                .children
                .entry(segment.to_string())
                .or_insert_with(|| FrontierNode::new(segment));
        }

        if node.depth == UNSCHEDULED {
            node.depth = depth;
        }
    }

    /// Finds the node ending the segment chain of `url`
    pub fn find(&self, url: &str) -> Option<&FrontierNode> {
        let mut segments = segments(url).peekable();
        segments.peek()?;

        let mut node = &self.root;
        for segment in segments {
            node = node.children.get(segment)?;
        }
        Some(node)
    }

    /// Returns true if `url` has already been scheduled
    ///
    /// A node that only exists as a prefix, or that was created by
    /// [`FrontierTree::new`] and never dispatched, is not known.
    pub fn is_known(&self, url: &str) -> bool {
        self.find(url).map(FrontierNode::is_scheduled).unwrap_or(false)
    }

    /// Every scheduled URL with its depth, in root-down segment order
    pub fn scheduled_urls(&self) -> Vec<(String, i32)> {
        let mut urls = Vec::new();
        let mut stack: Vec<(String, &FrontierNode)> = self
            .root
            .children
            .values()
            .rev()
            .map(|child| (child.segment.clone(), child))
            .collect();

        while let Some((prefix, node)) = stack.pop() {
            if node.is_scheduled() {
                urls.push((prefix.clone(), node.depth));
            }
            for child in node.children.values().rev() {
                stack.push((format!("{}/{}", prefix, child.segment), child));
            }
        }

        urls
    }

    /// Number of nodes below the root
    pub fn node_count(&self) -> usize {
        let mut count = 0;
        let mut stack: Vec<&FrontierNode> = self.root.children.values().collect();
        while let Some(node) = stack.pop() {
            count += 1;
            stack.extend(node.children.values());
        }
        count
    }

    /// Releases every node, children before their parent
    ///
    /// Returns the number of nodes released, root excluded.
    pub fn delete(self) -> usize {
        let mut released = 0;
        let mut pending: Vec<FrontierNode> = self.root.children.into_values().collect();

        while let Some(mut node) = pending.pop() {
            let children = std::mem::take(&mut node.children);
            if children.is_empty() {
                released += 1;
                continue;
            }
            pending.push(node);
            pending.extend(children.into_values());
        }

        released
    }
}

/// Splits a URL into its non-empty path segments, scheme removed
fn segments(url: &str) -> impl Iterator<Item = &str> {
    strip_scheme(url).split('/').filter(|s| !s.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_builds_unscheduled_chain() {
        let tree = FrontierTree::new("http://example.com/a/b");

        assert_eq!(tree.root().segment(), ".");
        assert_eq!(tree.root().depth(), UNSCHEDULED);
        assert_eq!(tree.node_count(), 3);

        let leaf = tree.find("example.com/a/b").unwrap();
        assert_eq!(leaf.segment(), "b");
        assert_eq!(leaf.depth(), UNSCHEDULED);
        assert!(!tree.is_known("example.com/a/b"));
    }

    #[test]
    fn test_insert_schedules_leaf() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("example.com", 0);

        assert!(tree.is_known("example.com"));
        assert!(tree.is_known("http://example.com/"));
        assert_eq!(tree.find("example.com").unwrap().depth(), 0);
    }

    #[test]
    fn test_insert_is_idempotent() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("example.com/page", 2);
        assert!(tree.is_known("example.com/page"));

        tree.insert("example.com/page", 5);
        tree.insert("example.com/page", 0);
        assert_eq!(tree.find("example.com/page").unwrap().depth(), 2);
        assert_eq!(tree.node_count(), 2);
    }

    #[test]
    fn test_prefix_nodes_are_not_known() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("example.com/a/b/c", 1);

        assert!(tree.find("example.com/a").is_some());
        assert!(!tree.is_known("example.com/a"));
        assert!(!tree.is_known("example.com/a/b"));
        assert!(tree.is_known("example.com/a/b/c"));

        // scheduling a prefix later is still possible
        tree.insert("example.com/a", 2);
        assert_eq!(tree.find("example.com/a").unwrap().depth(), 2);
    }

    #[test]
    fn test_shared_prefixes_share_nodes() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("example.com/docs/one", 1);
        tree.insert("example.com/docs/two", 1);
        tree.insert("example.com/blog/one", 1);

        // example.com, docs, one, two, blog, one
        assert_eq!(tree.node_count(), 6);
    }

    #[test]
    fn test_children_sorted() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("example.com/zeta", 1);
        tree.insert("example.com/alpha", 1);
        tree.insert("example.com/mid", 1);

        let host = tree.find("example.com").unwrap();
        let segments: Vec<&str> = host.children().map(FrontierNode::segment).collect();
        assert_eq!(segments, vec!["alpha", "mid", "zeta"]);
    }

    #[test]
    fn test_find_missing() {
        let tree = FrontierTree::new("http://example.com/a");
        assert!(tree.find("example.com/b").is_none());
        assert!(tree.find("other.com").is_none());
        assert!(tree.find("").is_none());
        assert!(!tree.is_known("other.com/a"));
    }

    #[test]
    fn test_empty_url_ignored() {
        let mut tree = FrontierTree::new("http://example.com/");
        tree.insert("", 0);
        tree.insert("http://", 0);
        assert_eq!(tree.root().depth(), UNSCHEDULED);
        assert_eq!(tree.node_count(), 1);
    }

    #[test]
    fn test_scheduled_urls_in_order() {
        let mut tree = FrontierTree::new("http://x.test/");
        tree.insert("x.test", 0);
        tree.insert("x.test/b", 1);
        tree.insert("x.test/a/deep", 1);
        tree.insert("other.test/z", 1);

        assert_eq!(
            tree.scheduled_urls(),
            vec![
                ("other.test/z".to_string(), 1),
                ("x.test".to_string(), 0),
                ("x.test/a/deep".to_string(), 1),
                ("x.test/b".to_string(), 1),
            ]
        );
    }

    #[test]
    fn test_delete_releases_every_node() {
        let mut tree = FrontierTree::new("http://x.test/a/b");
        tree.insert("x.test/c", 1);
        tree.insert("y.test", 1);
        let count = tree.node_count();

        assert_eq!(tree.delete(), count);
        assert_eq!(FrontierTree::default().delete(), 0);
    }
}
