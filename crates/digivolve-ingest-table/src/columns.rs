//! Column layout validation.

use crate::error::SchemaError;
use crate::table::SourceTable;

pub const COL_NUMBER: &str = "Number";
pub const COL_IMAGE: &str = "Image";
pub const COL_NAME: &str = "Name";
pub const COL_STAGE: &str = "Stage";
pub const COL_ATTRIBUTE: &str = "Attribute";
pub const COL_EVOLUTIONS: &str = "Evolutions";

/// Columns that must be present (exact, case-sensitive headers).
pub const REQUIRED_COLUMNS: [&str; 5] = [COL_NUMBER, COL_NAME, COL_STAGE, COL_ATTRIBUTE, COL_EVOLUTIONS];

/// Resolved column indexes for a validated table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnLayout {
    pub number: usize,
    pub name: usize,
    pub stage: usize,
    pub attribute: usize,
    pub image: Option<usize>,
    /// `Evolutions` plus continuation columns, in table order.
    pub evolutions: Vec<usize>,
}

/// Whether a header holds (part of) a successor list.
///
/// Unlabelled spreadsheet columns (`Unnamed: 7`) next to `Evolutions` carry
/// the overflow of long successor lists; numbered variants such as
/// `Evolutions 2` are accepted as well.
pub fn is_evolution_column(header: &str) -> bool {
    header.starts_with(COL_EVOLUTIONS) || header.starts_with("Unnamed")
}

pub fn check_schema(table: &SourceTable) -> Result<ColumnLayout, SchemaError> {
    let resolved = REQUIRED_COLUMNS.map(|c| table.column(c));
    let missing: Vec<String> = REQUIRED_COLUMNS
        .iter()
        .zip(&resolved)
        .filter(|(_, idx)| idx.is_none())
        .map(|(c, _)| c.to_string())
        .collect();

    let [Some(number), Some(name), Some(stage), Some(attribute), Some(_)] = resolved else {
        return Err(SchemaError::MissingColumns { missing });
    };

    let evolutions = table
        .headers()
        .iter()
        .enumerate()
        .filter(|(_, h)| is_evolution_column(h))
        .map(|(i, _)| i)
        .collect();

    Ok(ColumnLayout {
        number,
        name,
        stage,
        attribute,
        image: table.column(COL_IMAGE),
        evolutions,
    })
}
