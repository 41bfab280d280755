//! Successor-list cell parsing.

/// Characters separating names inside one evolution cell.
pub const EVOLUTION_DELIMITERS: [char; 2] = [',', ';'];

/// Split an evolution cell into trimmed, non-empty names.
pub fn parse_evolution_list(cell: &str) -> Vec<String> {
    cell.split(EVOLUTION_DELIMITERS)
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .map(str::to_string)
        .collect()
}
