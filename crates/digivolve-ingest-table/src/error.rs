use std::path::PathBuf;

use thiserror::Error;

/// The table does not have the columns the loader needs.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("missing required columns: {}", .missing.join(", "))]
    MissingColumns { missing: Vec<String> },
}

#[derive(Debug, Error)]
pub enum LoadError {
    #[error(transparent)]
    Schema(#[from] SchemaError),

    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("expected a JSON array of row objects")]
    JsonShape,

    #[error("unsupported table format `{0}` (expected .csv or .json)")]
    UnsupportedFormat(String),
}
