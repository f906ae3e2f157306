//! Delimited-file ingestion: separator sniffing, encoding fallback, column
//! resolution against a [`LayerSchema`] and type coercion.

pub mod normalizer;
mod parser;
pub mod schema;
mod sniff;

pub use schema::{ColumnKind, ColumnSpec, LayerSchema};
pub use sniff::{EncodingAttempt, TextEncoding};

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Failure to turn a source file into a table.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("source file not found: {}", .path.display())]
    SourceNotFound { path: PathBuf },
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not decode {}; attempted {}", .path.display(), summarize(.attempts))]
    Encoding {
        path: PathBuf,
        attempts: Vec<EncodingAttempt>,
    },
    #[error("missing column '{column}' in {}; columns found: [{}]", .path.display(), .found.join(", "))]
    Schema {
        path: PathBuf,
        column: String,
        found: Vec<String>,
    },
    #[error("invalid GeoJSON in {}: {reason}", .path.display())]
    Geojson { path: PathBuf, reason: String },
}

fn summarize(attempts: &[EncodingAttempt]) -> String {
    attempts
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

pub(crate) fn read_source(path: &Path) -> Result<Vec<u8>, LoadError> {
    std::fs::read(path).map_err(|source| {
        if source.kind() == std::io::ErrorKind::NotFound {
            LoadError::SourceNotFound {
                path: path.to_path_buf(),
            }
        } else {
            LoadError::Io {
                path: path.to_path_buf(),
                source,
            }
        }
    })
}

/// A coerced cell value.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Text(String),
    Number(f64),
}

/// One row keyed by canonical column name. Absent keys are missing values.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Record {
    row: usize,
    cells: HashMap<&'static str, Cell>,
}

impl Record {
    pub(crate) fn at_row(row: usize) -> Self {
        Self {
            row,
            cells: HashMap::new(),
        }
    }

    /// 0-based position among the file's data rows, counted before any drops.
    pub fn row(&self) -> usize {
        self.row
    }

    pub(crate) fn insert(&mut self, column: &'static str, cell: Cell) {
        self.cells.insert(column, cell);
    }

    pub fn contains(&self, column: &str) -> bool {
        self.cells.contains_key(column)
    }

    pub fn text(&self, column: &str) -> Option<&str> {
        match self.cells.get(column) {
            Some(Cell::Text(value)) => Some(value.as_str()),
            _ => None,
        }
    }

    pub fn number(&self, column: &str) -> Option<f64> {
        match self.cells.get(column) {
            Some(Cell::Number(value)) => Some(*value),
            _ => None,
        }
    }
}

/// Provenance of a loaded layer.
#[derive(Debug, Clone, Serialize)]
pub struct SourceInfo {
    pub layer: &'static str,
    pub path: PathBuf,
    pub encoding: TextEncoding,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<char>,
    pub rows: usize,
    pub dropped: usize,
    pub loaded_at: DateTime<Utc>,
}

/// Validated rows of one source file under canonical column names.
#[derive(Debug, Clone)]
pub struct Table {
    pub columns: Vec<&'static str>,
    pub records: Vec<Record>,
    pub source: SourceInfo,
}

impl Table {
    pub fn has_column(&self, column: &str) -> bool {
        self.columns.iter().any(|name| *name == column)
    }
}

/// Read `path` with the fallback encodings and coerce it into `schema`.
pub fn read_table(path: &Path, schema: &'static LayerSchema) -> Result<Table, LoadError> {
    let bytes = read_source(path)?;
    let delimiter = sniff::detect_delimiter(&bytes);

    let mut attempts = Vec::new();
    let mut decoded = None;
    for encoding in TextEncoding::FALLBACK_ORDER {
        let parsed = encoding
            .decode(&bytes)
            .and_then(|text| parser::parse_text(&text, delimiter).map_err(|err| err.to_string()));
        match parsed {
            Ok(raw) => {
                decoded = Some((encoding, raw));
                break;
            }
            Err(reason) => {
                debug!(layer = schema.layer, %encoding, %reason, "encoding attempt failed");
                attempts.push(EncodingAttempt { encoding, reason });
            }
        }
    }

    let Some((encoding, raw)) = decoded else {
        return Err(LoadError::Encoding {
            path: path.to_path_buf(),
            attempts,
        });
    };
    if !attempts.is_empty() {
        info!(layer = schema.layer, %encoding, "decoded with fallback encoding");
    }

    let bindings = schema::resolve_columns(schema, &raw.headers).map_err(|missing| {
        LoadError::Schema {
            path: path.to_path_buf(),
            column: missing.column,
            found: missing.found,
        }
    })?;

    let (records, dropped) = parser::coerce_records(schema, &bindings, &raw.rows);
    if dropped > 0 {
        warn!(
            layer = schema.layer,
            path = %path.display(),
            dropped,
            "dropped rows without usable coordinates"
        );
    }

    let columns = bindings
        .iter()
        .filter(|binding| binding.index.is_some())
        .map(|binding| binding.spec.canonical)
        .collect();

    Ok(Table {
        columns,
        source: SourceInfo {
            layer: schema.layer,
            path: path.to_path_buf(),
            encoding,
            delimiter: Some(char::from(delimiter)),
            rows: records.len(),
            dropped,
            loaded_at: Utc::now(),
        },
        records,
    })
}
