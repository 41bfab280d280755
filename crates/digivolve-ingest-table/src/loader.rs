//! Table → `EvolutionGraph`.
//!
//! Loading runs in two passes:
//! 1. rows become typed records (last row wins per normalized name), and each
//!    surviving record keeps the successor names listed on its own row;
//! 2. successor names are resolved against the full record set and turned
//!    into edges.
//!
//! Resolving after all rows are known lets a row name a successor that only
//! appears further down the sheet.

use std::path::Path;

use digivolve_graph::{Digimon, EdgeOutcome, EvolutionGraph, GraphBuilder, NodeId};
use serde::{Deserialize, Serialize};

use crate::columns::{check_schema, ColumnLayout};
use crate::error::LoadError;
use crate::evolutions::parse_evolution_list;
use crate::table::SourceTable;

/// A successor name that did not match any record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnresolvedEdge {
    /// 1-based data row (header excluded).
    pub row: usize,
    pub from: String,
    pub to: String,
}

/// Data-quality counters gathered while loading.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoadReport {
    pub rows: usize,
    pub records: usize,
    pub edges: usize,
    pub skipped_blank_rows: usize,
    pub duplicate_names: usize,
    pub duplicate_edges: usize,
    pub self_references: usize,
    pub unknown_numbers: usize,
    pub unresolved_edges: Vec<UnresolvedEdge>,
}

impl LoadReport {
    /// Whether anything was dropped or replaced during the load.
    pub fn has_issues(&self) -> bool {
        self.skipped_blank_rows > 0
            || self.duplicate_names > 0
            || self.unknown_numbers > 0
            || !self.unresolved_edges.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct LoadedGraph {
    pub graph: EvolutionGraph,
    pub report: LoadReport,
}

pub fn load_graph_from_path(path: &Path) -> Result<LoadedGraph, LoadError> {
    let table = SourceTable::from_path(path)?;
    let loaded = load_graph(&table)?;
    tracing::info!(
        path = %path.display(),
        records = loaded.report.records,
        edges = loaded.report.edges,
        "loaded evolution table"
    );
    Ok(loaded)
}

pub fn load_graph(table: &SourceTable) -> Result<LoadedGraph, LoadError> {
    let layout = check_schema(table)?;

    let mut report = LoadReport {
        rows: table.len(),
        ..LoadReport::default()
    };
    let mut builder = GraphBuilder::new();
    // Indexed by node id: (row, successor names) of the surviving record.
    let mut pending: Vec<(usize, Vec<String>)> = Vec::new();

    for row in 0..table.len() {
        let Some(record) = parse_row(table, row, &layout, &mut report) else {
            report.skipped_blank_rows += 1;
            continue;
        };
        let successors = successor_names(table, row, &layout);

        let upsert = builder.insert(record);
        let slot = upsert.id.raw() as usize;
        if let Some(previous) = upsert.replaced {
            report.duplicate_names += 1;
            tracing::debug!(
                row = row + 1,
                name = %previous.name,
                "duplicate name, later row replaces earlier one"
            );
            pending[slot] = (row + 1, successors);
        } else {
            debug_assert_eq!(slot, pending.len());
            pending.push((row + 1, successors));
        }
    }

    for (slot, (row, successors)) in pending.iter().enumerate() {
        let from = NodeId::new(slot as u32);
        for to_name in successors {
            let outcome = match builder.find(to_name) {
                Some(to) => builder.add_edge(from, to),
                None => EdgeOutcome::UnknownTarget,
            };
            match outcome {
                EdgeOutcome::Added => report.edges += 1,
                EdgeOutcome::Duplicate => report.duplicate_edges += 1,
                EdgeOutcome::SelfReference => {
                    report.self_references += 1;
                    tracing::debug!(row, name = %to_name, "dropping self-referencing evolution");
                }
                EdgeOutcome::UnknownTarget | EdgeOutcome::UnknownSource => {
                    let from_name = builder
                        .get(from)
                        .map(|d| d.name.clone())
                        .unwrap_or_default();
                    tracing::warn!(
                        row,
                        from = %from_name,
                        to = %to_name,
                        "evolution target not found in table, edge dropped"
                    );
                    report.unresolved_edges.push(UnresolvedEdge {
                        row: *row,
                        from: from_name,
                        to: to_name.clone(),
                    });
                }
            }
        }
    }

    report.records = builder.len();
    if report.has_issues() {
        tracing::info!(
            skipped_blank_rows = report.skipped_blank_rows,
            duplicate_names = report.duplicate_names,
            unknown_numbers = report.unknown_numbers,
            unresolved_edges = report.unresolved_edges.len(),
            "evolution table loaded with data-quality issues"
        );
    }

    Ok(LoadedGraph {
        graph: builder.freeze(),
        report,
    })
}

// ============================================================================
// Cell parsing
// ============================================================================

fn cell<'a>(table: &'a SourceTable, row: usize, col: usize) -> &'a str {
    table.cell(row, col).map(str::trim).unwrap_or("")
}

fn parse_row(
    table: &SourceTable,
    row: usize,
    layout: &ColumnLayout,
    report: &mut LoadReport,
) -> Option<Digimon> {
    let name = cell(table, row, layout.name);
    if name.is_empty() {
        return None;
    }

    let number = match parse_number(cell(table, row, layout.number)) {
        Some(n) => n,
        None => {
            report.unknown_numbers += 1;
            0
        }
    };

    let mut record = Digimon::new(number, name, cell(table, row, layout.stage))
        .with_attribute(cell(table, row, layout.attribute));
    if let Some(col) = layout.image {
        record = record.with_image(cell(table, row, col));
    }
    Some(record)
}

fn successor_names(table: &SourceTable, row: usize, layout: &ColumnLayout) -> Vec<String> {
    layout
        .evolutions
        .iter()
        .flat_map(|&col| parse_evolution_list(cell(table, row, col)))
        .collect()
}

/// Parse a numeric id; spreadsheet exports often write integers as `12.0`.
fn parse_number(raw: &str) -> Option<u32> {
    if raw.is_empty() {
        return None;
    }
    if let Ok(n) = raw.parse::<u32>() {
        return Some(n);
    }
    let f: f64 = raw.parse().ok()?;
    if f.is_finite() && f >= 0.0 && f.fract() == 0.0 && f <= u32::MAX as f64 {
        Some(f as u32)
    } else {
        None
    }
}
