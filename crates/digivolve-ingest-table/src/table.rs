//! Raw source tables.
//!
//! A `SourceTable` is a header row plus string cells, nothing more. It exists
//! so the loader can work the same way whether the data came from CSV or a
//! JSON export.

use std::fs::File;
use std::io::Read;
use std::path::Path;

use csv::ReaderBuilder;
use serde_json::Value;

use crate::error::LoadError;

/// Input formats understood by `SourceTable::from_path`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Csv,
    JsonRows,
}

impl TableFormat {
    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_ascii_lowercase())
            .unwrap_or_default();
        match ext.as_str() {
            "csv" => Ok(Self::Csv),
            "json" => Ok(Self::JsonRows),
            other => Err(LoadError::UnsupportedFormat(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SourceTable {
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
}

impl SourceTable {
    /// Build a table from already-split cells.
    ///
    /// Headers are trimmed; blank headers become `Unnamed: <index>`, the name
    /// spreadsheet tools give unlabelled continuation columns.
    pub fn new(headers: Vec<String>, rows: Vec<Vec<String>>) -> Self {
        let headers = headers
            .into_iter()
            .enumerate()
            .map(|(i, h)| {
                let h = h.trim();
                if h.is_empty() {
                    format!("Unnamed: {i}")
                } else {
                    h.to_string()
                }
            })
            .collect();
        Self { headers, rows }
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Index of the first column with exactly this header.
    pub fn column(&self, header: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == header)
    }

    /// Cell at (`row`, `col`); ragged rows read as missing.
    pub fn cell(&self, row: usize, col: usize) -> Option<&str> {
        self.rows
            .get(row)
            .and_then(|r| r.get(col))
            .map(String::as_str)
    }

    // ========================================================================
    // Readers
    // ========================================================================

    pub fn from_path(path: &Path) -> Result<Self, LoadError> {
        match TableFormat::from_path(path)? {
            TableFormat::Csv => Self::from_csv_path(path),
            TableFormat::JsonRows => {
                let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                Self::from_json_rows(&text)
            }
        }
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, LoadError> {
        let file = File::open(path).map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_csv_reader(file)
    }

    pub fn from_csv_str(text: &str) -> Result<Self, LoadError> {
        Self::from_csv_reader(text.as_bytes())
    }

    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, LoadError> {
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true)
            .from_reader(reader);

        let headers: Vec<String> = reader.headers()?.iter().map(str::to_string).collect();

        let mut rows = Vec::new();
        for record in reader.records() {
            let record = record?;
            rows.push(record.iter().map(str::to_string).collect());
        }

        Ok(Self::new(headers, rows))
    }

    /// Read a JSON array of row objects (`[{"Name": "Agumon", ...}, ...]`).
    ///
    /// Columns appear in first-seen order. Array cells are joined with `", "`
    /// so a list of evolutions survives as one delimited cell.
    pub fn from_json_rows(text: &str) -> Result<Self, LoadError> {
        let value: Value = serde_json::from_str(text)?;
        let Value::Array(items) = value else {
            return Err(LoadError::JsonShape);
        };

        let mut headers: Vec<String> = Vec::new();
        let mut objects = Vec::with_capacity(items.len());
        for item in items {
            let Value::Object(obj) = item else {
                return Err(LoadError::JsonShape);
            };
            for key in obj.keys() {
                if !headers.iter().any(|h| h == key) {
                    headers.push(key.clone());
                }
            }
            objects.push(obj);
        }

        let rows = objects
            .iter()
            .map(|obj| {
                headers
                    .iter()
                    .map(|h| obj.get(h).map(json_cell).unwrap_or_default())
                    .collect()
            })
            .collect();

        Ok(Self::new(headers, rows))
    }
}

fn json_cell(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(json_cell)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_headers_become_unnamed() {
        let t = SourceTable::from_csv_str("Name,Evolutions,,\nAgumon,Greymon,Geo Greymon,\n").unwrap();
        assert_eq!(t.headers(), ["Name", "Evolutions", "Unnamed: 2", "Unnamed: 3"]);
        assert_eq!(t.cell(0, 2), Some("Geo Greymon"));
    }

    #[test]
    fn ragged_rows_are_accepted() {
        let t = SourceTable::from_csv_str("Name,Evolutions,Extra\nKoromon\nAgumon,Greymon,x\n").unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.cell(0, 1), None);
        assert_eq!(t.cell(1, 1), Some("Greymon"));
    }

    #[test]
    fn json_rows_join_array_cells() {
        let t = SourceTable::from_json_rows(
            r#"[{"Name":"Agumon","Number":26,"Evolutions":["Greymon","Geo Greymon"],"Image":null}]"#,
        )
        .unwrap();
        let evo = t.column("Evolutions").unwrap();
        let num = t.column("Number").unwrap();
        let img = t.column("Image").unwrap();
        assert_eq!(t.cell(0, evo), Some("Greymon, Geo Greymon"));
        assert_eq!(t.cell(0, num), Some("26"));
        assert_eq!(t.cell(0, img), Some(""));
    }

    #[test]
    fn json_rows_reject_non_array() {
        assert!(matches!(
            SourceTable::from_json_rows(r#"{"Name":"Agumon"}"#),
            Err(LoadError::JsonShape)
        ));
    }

    #[test]
    fn format_from_extension() {
        assert_eq!(TableFormat::from_path(Path::new("a/b.CSV")).unwrap(), TableFormat::Csv);
        assert_eq!(TableFormat::from_path(Path::new("rows.json")).unwrap(), TableFormat::JsonRows);
        assert!(matches!(
            TableFormat::from_path(Path::new("list.xlsx")),
            Err(LoadError::UnsupportedFormat(ext)) if ext == "xlsx"
        ));
    }
}
