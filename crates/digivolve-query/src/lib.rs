//! Digivolve query engine
//!
//! `EvolutionService` answers "what does this Digimon evolve from and into?"
//! against a frozen `EvolutionGraph`. Every method takes `&self`; the graph is
//! shared through `Arc` and never mutated, so one service can be queried from
//! any number of threads.
//!
//! A name that is not in the dataset is a normal outcome: `get_evolution_line`
//! returns a response with `success: false` instead of an error.

pub mod engine;
pub mod response;

pub use engine::EvolutionService;
pub use response::{
    CanEvolve, EvolutionLine, EvolutionList, EvolutionResponse, EvolutionSummary, SummaryView,
};

pub use digivolve_graph::LineageOptions;
