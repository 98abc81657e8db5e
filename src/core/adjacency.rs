use crate::domain::model::Slug;
use std::collections::BTreeMap;

/// Normalized adjacency: canonical suburb -> ordered, de-duplicated neighbors.
/// Whatever shape the source document used, downstream code only sees this.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AdjacencyGraph {
    edges: BTreeMap<Slug, Vec<Slug>>,
}

impl AdjacencyGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds `to` after `from`'s existing neighbors. Self-loops and repeats are ignored.
    pub fn add_edge(&mut self, from: &str, to: &str) {
        if from == to {
            return;
        }
        let neighbors = self.edges.entry(from.to_string()).or_default();
        if !neighbors.iter().any(|n| n == to) {
            neighbors.push(to.to_string());
        }
    }

    /// Registers `from` even when it has no neighbors.
    pub fn touch(&mut self, from: &str) {
        self.edges.entry(from.to_string()).or_default();
    }

    pub fn neighbors(&self, slug: &str) -> &[Slug] {
        self.edges.get(slug).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn contains(&self, from: &str, to: &str) -> bool {
        self.neighbors(from).iter().any(|n| n == to)
    }

    pub fn has_entry(&self, slug: &str) -> bool {
        self.edges.contains_key(slug)
    }

    /// Edges whose reverse is missing, in sorted order.
    pub fn non_reciprocal_edges(&self) -> Vec<(Slug, Slug)> {
        self.edges
            .iter()
            .flat_map(|(from, neighbors)| neighbors.iter().map(move |to| (from, to)))
            .filter(|(from, to)| !self.contains(to, from))
            .map(|(from, to)| (from.clone(), to.clone()))
            .collect()
    }

    /// Adds every missing back-edge. Returns how many were added.
    pub fn symmetrize(&mut self) -> usize {
        let missing = self.non_reciprocal_edges();
        for (from, to) in &missing {
            self.add_edge(to, from);
        }
        missing.len()
    }

    pub fn len(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.values().map(Vec::len).sum()
    }
}
