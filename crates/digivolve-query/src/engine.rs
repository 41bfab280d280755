//! Evolution-line queries over a frozen graph.

use std::sync::Arc;

use digivolve_graph::{Digimon, Direction, EvolutionGraph, LineageOptions, NodeId};

use crate::response::{
    CanEvolve, EvolutionLine, EvolutionList, EvolutionResponse, EvolutionSummary, SummaryView,
};

/// Read-only query service. Cheap to clone; clones share the graph.
#[derive(Debug, Clone)]
pub struct EvolutionService {
    graph: Arc<EvolutionGraph>,
}

impl EvolutionService {
    pub fn new(graph: Arc<EvolutionGraph>) -> Self {
        Self { graph }
    }

    pub fn graph(&self) -> &EvolutionGraph {
        &self.graph
    }

    /// Exact match on the normalized name; no fuzzy matching.
    pub fn lookup(&self, name: &str) -> Option<&Digimon> {
        self.graph.find(name).and_then(|id| self.graph.get(id))
    }

    /// Full transitive lineage of `name`.
    pub fn get_evolution_line(&self, name: &str) -> EvolutionResponse {
        self.get_evolution_line_with(name, LineageOptions::transitive())
    }

    pub fn get_evolution_line_with(&self, name: &str, options: LineageOptions) -> EvolutionResponse {
        let Some((id, record)) = self.resolve(name) else {
            tracing::debug!(query = %name, "digimon not found");
            return EvolutionResponse::not_found(name);
        };

        let previous = self.records(&self.graph.lineage(id, Direction::Previous, options));
        let next = self.records(&self.graph.lineage(id, Direction::Next, options));
        tracing::debug!(
            query = %name,
            previous = previous.len(),
            next = next.len(),
            "resolved evolution line"
        );

        EvolutionResponse::found(name, vec![EvolutionLine::new(record.clone(), previous, next)])
    }

    pub fn get_evolution_line_json(&self, name: &str) -> String {
        self.get_evolution_line(name).to_json()
    }

    // ------------------------------------------------------------------------
    // Direct-neighbour views
    // ------------------------------------------------------------------------

    pub fn next_evolutions(&self, name: &str) -> Option<EvolutionList> {
        self.neighbours(name, Direction::Next)
    }

    pub fn previous_evolutions(&self, name: &str) -> Option<EvolutionList> {
        self.neighbours(name, Direction::Previous)
    }

    /// Record plus transitive lineage counts.
    pub fn evolution_summary(&self, name: &str) -> Option<SummaryView> {
        let (id, record) = self.resolve(name)?;
        let options = LineageOptions::transitive();
        Some(SummaryView {
            digimon: record.clone(),
            summary: EvolutionSummary {
                total_previous: self.graph.lineage(id, Direction::Previous, options).len(),
                total_next: self.graph.lineage(id, Direction::Next, options).len(),
            },
        })
    }

    /// Whether `from` lists `to` as a direct evolution. `None` when `from` is
    /// unknown; an unknown `to` is simply `can_evolve: false`.
    pub fn can_evolve(&self, from: &str, to: &str) -> Option<CanEvolve> {
        let from_id = self.graph.find(from)?;
        let can_evolve = self
            .graph
            .find(to)
            .is_some_and(|to_id| self.graph.has_edge(from_id, to_id));
        let message = if can_evolve {
            format!("{from} can evolve directly into {to}")
        } else {
            format!("{from} cannot evolve directly into {to}")
        };
        Some(CanEvolve {
            from: from.to_string(),
            to: to.to_string(),
            can_evolve,
            message,
        })
    }

    fn resolve(&self, name: &str) -> Option<(NodeId, &Digimon)> {
        let id = self.graph.find(name)?;
        self.graph.get(id).map(|record| (id, record))
    }

    fn neighbours(&self, name: &str, direction: Direction) -> Option<EvolutionList> {
        let (id, record) = self.resolve(name)?;
        let ids = match direction {
            Direction::Next => self.graph.successors(id),
            Direction::Previous => self.graph.predecessors(id),
        };
        let evolutions = self.records(ids);
        Some(EvolutionList {
            digimon: record.name.clone(),
            total: evolutions.len(),
            evolutions,
        })
    }

    fn records(&self, ids: &[NodeId]) -> Vec<Digimon> {
        ids.iter()
            .filter_map(|&id| self.graph.get(id).cloned())
            .collect()
    }
}
