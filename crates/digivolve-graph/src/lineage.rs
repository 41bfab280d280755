//! Lineage traversal.
//!
//! Walks backward (pre-evolutions) or forward (post-evolutions) adjacency
//! breadth-first. A visited set seeded with the start node guarantees that
//! every node is reported at most once, the start node is never part of its
//! own lineage, and cyclic data terminates.

use std::collections::VecDeque;

use crate::graph::{EvolutionGraph, NodeId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow backward edges (what this Digimon evolves from).
    Previous,
    /// Follow forward edges (what this Digimon evolves into).
    Next,
}

/// Traversal limits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LineageOptions {
    /// Maximum number of hops; `None` walks transitively until exhausted.
    pub max_depth: Option<usize>,
}

impl LineageOptions {
    pub fn transitive() -> Self {
        Self { max_depth: None }
    }

    pub fn direct() -> Self {
        Self { max_depth: Some(1) }
    }

    pub fn with_max_depth(max_depth: Option<usize>) -> Self {
        Self { max_depth }
    }
}

impl EvolutionGraph {
    fn neighbours(&self, id: NodeId, direction: Direction) -> &[NodeId] {
        match direction {
            Direction::Previous => self.predecessors(id),
            Direction::Next => self.successors(id),
        }
    }

    /// Nodes reachable from `start` in `direction`, in discovery order.
    pub fn lineage(&self, start: NodeId, direction: Direction, options: LineageOptions) -> Vec<NodeId> {
        let mut out = Vec::new();
        if self.get(start).is_none() {
            return out;
        }

        let mut visited = vec![false; self.len()];
        visited[start.raw() as usize] = true;

        let mut queue: VecDeque<(NodeId, usize)> = VecDeque::new();
        queue.push_back((start, 0));

        while let Some((current, depth)) = queue.pop_front() {
            if options.max_depth.is_some_and(|max| depth >= max) {
                continue;
            }
            for &next in self.neighbours(current, direction) {
                let seen = &mut visited[next.raw() as usize];
                if *seen {
                    continue;
                }
                *seen = true;
                out.push(next);
                queue.push_back((next, depth + 1));
            }
        }

        out
    }
}
