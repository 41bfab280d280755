//! Human-readable terminal output.

use std::path::Path;

use colored::Colorize;
use digivolve_graph::{Digimon, EvolutionGraph};
use digivolve_ingest_table::LoadReport;
use digivolve_query::{EvolutionLine, EvolutionResponse};

pub(crate) fn print_response(response: &EvolutionResponse) {
    if !response.is_found() {
        println!("{} {}", "not found:".red().bold(), response.message);
        return;
    }
    for line in &response.results {
        print_line(line);
    }
}

fn print_line(line: &EvolutionLine) {
    let d = &line.digimon;
    println!(
        "{} {}",
        d.name.green().bold(),
        format!("#{} stage {} attribute {}", d.number, d.stage, d.attribute_label()).dimmed()
    );

    print_section(
        "previous evolutions",
        line.evolution_summary.total_previous,
        &line.previous_evolutions,
    );
    print_section(
        "next evolutions",
        line.evolution_summary.total_next,
        &line.next_evolutions,
    );
}

fn print_section(title: &str, total: usize, records: &[Digimon]) {
    println!("  {} ({total})", title.cyan().bold());
    if records.is_empty() {
        println!("    {}", "(none)".dimmed());
        return;
    }
    for d in records {
        println!("    - {} ({}, {})", d.name, d.stage, d.attribute_label());
    }
}

pub(crate) fn print_report(path: &Path, report: &LoadReport, graph: &EvolutionGraph) {
    println!("{} {}", "loaded".green().bold(), path.display());
    println!("  rows:               {}", report.rows);
    println!("  records:            {}", report.records);
    println!("  edges:              {}", graph.edge_count());
    println!("  skipped blank rows: {}", report.skipped_blank_rows);
    println!("  duplicate names:    {}", report.duplicate_names);
    println!("  duplicate edges:    {}", report.duplicate_edges);
    println!("  self references:    {}", report.self_references);
    println!("  unknown numbers:    {}", report.unknown_numbers);
    println!("  unresolved edges:   {}", report.unresolved_edges.len());

    for edge in &report.unresolved_edges {
        println!(
            "    {} row {}: {} -> {}",
            "warning:".yellow().bold(),
            edge.row,
            edge.from,
            edge.to
        );
    }
}
