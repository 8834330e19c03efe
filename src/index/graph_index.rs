//! Flat and grouped node-id indexes

use crate::graph::NodeId;
use rustc_hash::FxHashMap;

/// A single secondary index
///
/// Flat indexes list every matching node id in insertion order. Grouped
/// indexes keep one ordered bucket per grouping value; empty buckets are
/// pruned.
#[derive(Debug, Clone, PartialEq)]
pub enum GraphIndex {
    Flat(Vec<NodeId>),
    Grouped(FxHashMap<String, Vec<NodeId>>),
}

impl GraphIndex {
    pub fn flat() -> Self {
        GraphIndex::Flat(Vec::new())
    }

    pub fn grouped() -> Self {
        GraphIndex::Grouped(FxHashMap::default())
    }

    pub fn is_grouped(&self) -> bool {
        matches!(self, GraphIndex::Grouped(_))
    }

    /// Append to the flat list, or to the bucket for `group`
    pub fn insert(&mut self, group: Option<&str>, id: NodeId) {
        match (self, group) {
            (GraphIndex::Flat(ids), _) => ids.push(id),
            (GraphIndex::Grouped(buckets), Some(group)) => {
                buckets.entry(group.to_string()).or_default().push(id)
            }
            (GraphIndex::Grouped(_), None) => {}
        }
    }

    /// Remove `id` from the bucket for `group`, pruning it if emptied
    pub fn remove_from(&mut self, group: &str, id: &NodeId) {
        if let GraphIndex::Grouped(buckets) = self {
            if let Some(ids) = buckets.get_mut(group) {
                ids.retain(|other| other != id);
                if ids.is_empty() {
                    buckets.remove(group);
                }
            }
        }
    }

    /// Remove `id` from the flat list or from every bucket
    pub fn remove(&mut self, id: &NodeId) {
        match self {
            GraphIndex::Flat(ids) => ids.retain(|other| other != id),
            GraphIndex::Grouped(buckets) => {
                buckets.retain(|_, ids| {
                    ids.retain(|other| other != id);
                    !ids.is_empty()
                });
            }
        }
    }

    /// Drop the bucket keyed by `group`
    pub fn purge_group(&mut self, group: &str) {
        if let GraphIndex::Grouped(buckets) = self {
            buckets.remove(group);
        }
    }

    /// Ids in the flat list, or in the bucket for `group`
    pub fn ids(&self, group: Option<&str>) -> &[NodeId] {
        match (self, group) {
            (GraphIndex::Flat(ids), _) => ids,
            (GraphIndex::Grouped(buckets), Some(group)) => {
                buckets.get(group).map(Vec::as_slice).unwrap_or(&[])
            }
            (GraphIndex::Grouped(_), None) => &[],
        }
    }

    pub fn groups(&self) -> Vec<&str> {
        match self {
            GraphIndex::Flat(_) => Vec::new(),
            GraphIndex::Grouped(buckets) => buckets.keys().map(String::as_str).collect(),
        }
    }

    pub fn clear(&mut self) {
        match self {
            GraphIndex::Flat(ids) => ids.clear(),
            GraphIndex::Grouped(buckets) => buckets.clear(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_index_ops() {
        let mut index = GraphIndex::flat();
        index.insert(None, NodeId::new("a"));
        index.insert(None, NodeId::new("b"));
        assert_eq!(index.ids(None), &[NodeId::new("a"), NodeId::new("b")]);

        index.remove(&NodeId::new("a"));
        assert_eq!(index.ids(None), &[NodeId::new("b")]);
    }

    #[test]
    fn test_grouped_index_prunes_empty_buckets() {
        let mut index = GraphIndex::grouped();
        index.insert(Some("Ann"), NodeId::new("p1"));
        index.insert(Some("Ann"), NodeId::new("p2"));
        index.insert(Some("Bea"), NodeId::new("p3"));

        index.remove_from("Ann", &NodeId::new("p1"));
        assert_eq!(index.ids(Some("Ann")), &[NodeId::new("p2")]);

        index.remove_from("Ann", &NodeId::new("p2"));
        assert!(index.ids(Some("Ann")).is_empty());
        assert_eq!(index.groups(), vec!["Bea"]);

        index.remove(&NodeId::new("p3"));
        assert!(index.groups().is_empty());
    }

    #[test]
    fn test_purge_group() {
        let mut index = GraphIndex::grouped();
        index.insert(Some("p1"), NodeId::new("c1"));
        index.purge_group("p1");
        assert!(index.ids(Some("p1")).is_empty());
    }
}
