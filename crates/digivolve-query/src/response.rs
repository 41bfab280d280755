//! Wire schema for evolution queries.
//!
//! Found:
//! `{success: true, message, total_results, results: [{digimon, previous_evolutions, next_evolutions, evolution_summary}]}`
//!
//! Not found:
//! `{success: false, message, results: []}`

use digivolve_graph::Digimon;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionSummary {
    pub total_previous: usize,
    pub total_next: usize,
}

/// Lineage of one matched Digimon.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionLine {
    pub digimon: Digimon,
    pub previous_evolutions: Vec<Digimon>,
    pub next_evolutions: Vec<Digimon>,
    pub evolution_summary: EvolutionSummary,
}

impl EvolutionLine {
    pub fn new(digimon: Digimon, previous_evolutions: Vec<Digimon>, next_evolutions: Vec<Digimon>) -> Self {
        let evolution_summary = EvolutionSummary {
            total_previous: previous_evolutions.len(),
            total_next: next_evolutions.len(),
        };
        Self {
            digimon,
            previous_evolutions,
            next_evolutions,
            evolution_summary,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionResponse {
    pub success: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_results: Option<usize>,
    pub results: Vec<EvolutionLine>,
}

impl EvolutionResponse {
    pub fn found(query: &str, results: Vec<EvolutionLine>) -> Self {
        Self {
            success: true,
            message: format!("Found {} result(s) for: {query}", results.len()),
            total_results: Some(results.len()),
            results,
        }
    }

    pub fn not_found(query: &str) -> Self {
        Self {
            success: false,
            message: format!("Digimon not found: {query}"),
            total_results: None,
            results: Vec::new(),
        }
    }

    pub fn is_found(&self) -> bool {
        self.success && !self.results.is_empty()
    }

    /// Pretty-printed JSON (UTF-8 kept as-is).
    pub fn to_json(&self) -> String {
        serde_json::to_string_pretty(self).unwrap_or_default()
    }

    pub fn from_json(text: &str) -> serde_json::Result<Self> {
        serde_json::from_str(text)
    }
}

/// Direct neighbours in one direction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvolutionList {
    pub digimon: String,
    pub total: usize,
    pub evolutions: Vec<Digimon>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SummaryView {
    pub digimon: Digimon,
    pub summary: EvolutionSummary,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CanEvolve {
    pub from: String,
    pub to: String,
    pub can_evolve: bool,
    pub message: String,
}
