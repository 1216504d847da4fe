//! Plain-text snapshots of the value table
//!
//! The layout is the one `numpy.savetxt` writes with its defaults: one line
//! per state, one `%.18e` value per action separated by single spaces. It has
//! no header and no version, so any numeric-text loader can read it back.

use ndarray::Array2;
use std::fmt::Write as _;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::value::{TableShape, ValueTable};

/// Why a snapshot could not be read
#[derive(Error, Debug)]
pub enum SnapshotError {
    /// File could not be read or written
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File content is not a numeric matrix
    #[error("malformed snapshot at line {line}: {reason}")]
    Malformed {
        /// 1-based line number
        line: usize,
        /// What was wrong
        reason: String,
    },

    /// File holds a matrix of a different shape
    #[error("snapshot shape {found} does not match expected {expected}")]
    ShapeMismatch {
        /// Shape the caller asked for
        expected: TableShape,
        /// Shape found in the file
        found: TableShape,
    },
}

/// Render a table in snapshot format
#[must_use]
pub fn format_table(table: &ValueTable) -> String {
    let values = table.as_array();
    let mut out = String::with_capacity(values.len() * 26);
    for row in values.rows() {
        for (col, &value) in row.iter().enumerate() {
            if col > 0 {
                out.push(' ');
            }
            push_scientific(&mut out, value);
        }
        out.push('\n');
    }
    out
}

/// Parse snapshot text and check it against `shape`
///
/// Blank lines and `#` comments are ignored.
pub fn parse_table(text: &str, shape: TableShape) -> Result<ValueTable, SnapshotError> {
    let mut values = Vec::with_capacity(shape.states * shape.actions);
    let mut rows = 0;
    let mut columns = None;

    for (number, line) in text.lines().enumerate() {
        let content = line.split('#').next().unwrap_or_default().trim();
        if content.is_empty() {
            continue;
        }

        let before = values.len();
        for token in content.split_whitespace() {
            let value = token.parse::<f64>().map_err(|e| SnapshotError::Malformed {
                line: number + 1,
                reason: format!("{token:?}: {e}"),
            })?;
            values.push(value);
        }

        let width = values.len() - before;
        match columns {
            None => columns = Some(width),
            Some(expected) if expected != width => {
                return Err(SnapshotError::Malformed {
                    line: number + 1,
                    reason: format!("expected {expected} columns, found {width}"),
                });
            }
            Some(_) => {}
        }
        rows += 1;
    }

    let found = TableShape::new(rows, columns.unwrap_or(0));
    if found != shape {
        return Err(SnapshotError::ShapeMismatch {
            expected: shape,
            found,
        });
    }

    let matrix = Array2::from_shape_vec((shape.states, shape.actions), values).map_err(|e| {
        SnapshotError::Malformed {
            line: 0,
            reason: e.to_string(),
        }
    })?;
    Ok(ValueTable::from_array(matrix))
}

/// Read a snapshot, reporting every failure
pub async fn read_snapshot(
    path: impl AsRef<Path>,
    shape: TableShape,
) -> Result<ValueTable, SnapshotError> {
    let text = tokio::fs::read_to_string(path.as_ref()).await?;
    parse_table(&text, shape)
}

/// Write a snapshot, replacing any existing file
pub async fn write_snapshot(
    path: impl AsRef<Path>,
    table: &ValueTable,
) -> Result<(), SnapshotError> {
    tokio::fs::write(path.as_ref(), format_table(table)).await?;
    Ok(())
}

impl ValueTable {
    /// Load a table from a snapshot, or start from zeros
    ///
    /// A missing, unreadable, malformed or wrongly shaped snapshot never
    /// stops training: the failure is logged and a zero table of `shape` is
    /// returned instead.
    pub async fn load(path: impl AsRef<Path>, shape: impl Into<TableShape>) -> Self {
        let path = path.as_ref();
        let shape = shape.into();
        match read_snapshot(path, shape).await {
            Ok(table) => {
                info!(path = %path.display(), %shape, "Q-table loaded");
                table
            }
            Err(e) => {
                warn!(
                    path = %path.display(),
                    error = %e,
                    "could not load Q-table, initializing {shape} table with zeros"
                );
                Self::zeros(shape)
            }
        }
    }

    /// Persist the table to `path`
    pub async fn save(&self, path: impl AsRef<Path>) -> crate::Result<()> {
        let path = path.as_ref();
        write_snapshot(path, self).await?;
        debug!(path = %path.display(), "Q-table saved");
        Ok(())
    }
}

// Rust writes exponents as `e-1`, numpy as `e-01`.
fn push_scientific(out: &mut String, value: f64) {
    if value.is_nan() {
        out.push_str("nan");
        return;
    }
    if value.is_infinite() {
        out.push_str(if value > 0.0 { "inf" } else { "-inf" });
        return;
    }

    let formatted = format!("{value:.18e}");
    let (mantissa, exponent) = formatted
        .split_once('e')
        .unwrap_or((formatted.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let sign = if exponent < 0 { '-' } else { '+' };
    let _ = write!(out, "{mantissa}e{sign}{:02}", exponent.abs());
}
