//! Table ingestion for Digivolve (boundary adapter).
//!
//! This crate sits at the untrusted input boundary:
//!
//! - It reads a spreadsheet export (CSV, or a JSON array of row objects).
//! - It validates the column layout and turns every row into a typed `Digimon`.
//! - It parses the evolution columns into edges and freezes an
//!   `EvolutionGraph`.
//!
//! Untyped cell values never leave this crate. Data-quality problems that do
//! not prevent serving (unknown evolution targets, duplicate names, bad ids)
//! are recorded in a `LoadReport` instead of failing the load; only a missing
//! required column is fatal.

pub mod columns;
pub mod error;
pub mod evolutions;
pub mod loader;
pub mod table;

pub use columns::{check_schema, ColumnLayout, REQUIRED_COLUMNS};
pub use error::{LoadError, SchemaError};
pub use evolutions::parse_evolution_list;
pub use loader::{load_graph, load_graph_from_path, LoadReport, LoadedGraph, UnresolvedEdge};
pub use table::{SourceTable, TableFormat};
