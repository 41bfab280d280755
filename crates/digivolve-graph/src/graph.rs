//! Evolution graph storage.
//!
//! Nodes are stored densely and addressed by `NodeId`. The forward index is
//! filled while building; the backward index is derived from it in `freeze`,
//! so the two directions can never disagree.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::name::normalize_name;
use crate::record::Digimon;

// ============================================================================
// Identifiers
// ============================================================================

/// Dense node index into an `EvolutionGraph`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct NodeId(u32);

impl NodeId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }

    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Directed edge: `from` can evolve into `to`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EvolutionEdge {
    pub from: NodeId,
    pub to: NodeId,
}

// ============================================================================
// Builder
// ============================================================================

/// Result of inserting a record into a `GraphBuilder`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Upsert {
    pub id: NodeId,
    /// The record this insert replaced (same normalized name), if any.
    pub replaced: Option<Digimon>,
}

/// Result of adding an edge by name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeOutcome {
    Added,
    Duplicate,
    SelfReference,
    UnknownSource,
    UnknownTarget,
}

impl EdgeOutcome {
    pub fn is_added(self) -> bool {
        matches!(self, Self::Added)
    }
}

/// Mutable staging area for an `EvolutionGraph`.
#[derive(Debug, Default)]
pub struct GraphBuilder {
    nodes: Vec<Digimon>,
    by_name: HashMap<String, NodeId>,
    forward: Vec<Vec<NodeId>>,
}

impl GraphBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Insert a record keyed by its normalized name.
    ///
    /// A record whose normalized name already exists replaces the earlier one
    /// (last write wins). The node keeps the position of the first row with
    /// that name, so predecessor lists that include it stay in first-seen
    /// order. Its outgoing edges are cleared and the successor list follows
    /// the surviving record.
    pub fn insert(&mut self, record: Digimon) -> Upsert {
        let key = normalize_name(&record.name);
        if let Some(&id) = self.by_name.get(&key) {
            let replaced = std::mem::replace(&mut self.nodes[id.index()], record);
            self.forward[id.index()].clear();
            return Upsert {
                id,
                replaced: Some(replaced),
            };
        }

        let id = NodeId(self.nodes.len() as u32);
        self.nodes.push(record);
        self.forward.push(Vec::new());
        self.by_name.insert(key, id);
        Upsert { id, replaced: None }
    }

    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&Digimon> {
        self.nodes.get(id.index())
    }

    /// Add `from -> to`, resolving both endpoints by name.
    pub fn add_edge_by_name(&mut self, from: &str, to: &str) -> EdgeOutcome {
        let Some(from_id) = self.find(from) else {
            return EdgeOutcome::UnknownSource;
        };
        let Some(to_id) = self.find(to) else {
            return EdgeOutcome::UnknownTarget;
        };
        self.add_edge(from_id, to_id)
    }

    pub fn add_edge(&mut self, from: NodeId, to: NodeId) -> EdgeOutcome {
        if from.index() >= self.nodes.len() {
            return EdgeOutcome::UnknownSource;
        }
        if to.index() >= self.nodes.len() {
            return EdgeOutcome::UnknownTarget;
        }
        if from == to {
            return EdgeOutcome::SelfReference;
        }
        let successors = &mut self.forward[from.index()];
        if successors.contains(&to) {
            return EdgeOutcome::Duplicate;
        }
        successors.push(to);
        EdgeOutcome::Added
    }

    /// Finish building: derive the backward index and freeze the graph.
    pub fn freeze(self) -> EvolutionGraph {
        let mut backward: Vec<Vec<NodeId>> = vec![Vec::new(); self.nodes.len()];
        let mut edge_count = 0usize;
        for (from, successors) in self.forward.iter().enumerate() {
            for to in successors {
                backward[to.index()].push(NodeId(from as u32));
                edge_count += 1;
            }
        }

        tracing::debug!(
            nodes = self.nodes.len(),
            edges = edge_count,
            "froze evolution graph"
        );

        EvolutionGraph {
            nodes: self.nodes,
            by_name: self.by_name,
            forward: self.forward,
            backward,
            edge_count,
        }
    }
}

// ============================================================================
// Frozen graph
// ============================================================================

/// Immutable evolution graph.
///
/// Predecessor lists are ordered by the predecessor's node position (the row
/// where its name first appeared); successor lists keep the order they were
/// listed in.
#[derive(Debug, Clone)]
pub struct EvolutionGraph {
    nodes: Vec<Digimon>,
    by_name: HashMap<String, NodeId>,
    forward: Vec<Vec<NodeId>>,
    backward: Vec<Vec<NodeId>>,
    edge_count: usize,
}

impl EvolutionGraph {
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn edge_count(&self) -> usize {
        self.edge_count
    }

    /// Exact match on the normalized name.
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.by_name.get(&normalize_name(name)).copied()
    }

    pub fn get(&self, id: NodeId) -> Option<&Digimon> {
        self.nodes.get(id.index())
    }

    /// Direct successors (forward adjacency).
    pub fn successors(&self, id: NodeId) -> &[NodeId] {
        self.forward
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Direct predecessors (backward adjacency).
    pub fn predecessors(&self, id: NodeId) -> &[NodeId] {
        self.backward
            .get(id.index())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn has_edge(&self, from: NodeId, to: NodeId) -> bool {
        self.successors(from).contains(&to)
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &Digimon)> + '_ {
        self.nodes
            .iter()
            .enumerate()
            .map(|(i, d)| (NodeId(i as u32), d))
    }

    pub fn edges(&self) -> impl Iterator<Item = EvolutionEdge> + '_ {
        self.forward.iter().enumerate().flat_map(|(from, successors)| {
            successors.iter().map(move |&to| EvolutionEdge {
                from: NodeId(from as u32),
                to,
            })
        })
    }

    /// Display names in node order (handy for completion lists).
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.nodes.iter().map(|d| d.name.as_str())
    }
}
