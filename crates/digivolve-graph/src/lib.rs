//! Digivolve evolution graph
//!
//! In-memory model of a Digimon evolution dataset:
//! - `Digimon`: one typed row of the source table
//! - `EvolutionGraph`: records keyed by normalized name, with forward
//!   (successor) and backward (predecessor) adjacency
//! - lineage traversal in either direction, cycle-safe
//!
//! The graph is built once through `GraphBuilder` and is immutable afterwards.
//! Loading from spreadsheets lives in `digivolve-ingest-table`; request-level
//! query semantics live in `digivolve-query`.

pub mod graph;
pub mod lineage;
pub mod name;
pub mod record;

pub use graph::{EdgeOutcome, EvolutionEdge, EvolutionGraph, GraphBuilder, NodeId, Upsert};
pub use lineage::{Direction, LineageOptions};
pub use name::normalize_name;
pub use record::{Digimon, NO_ATTRIBUTE};
