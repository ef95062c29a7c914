use std::path::PathBuf;

use thiserror::Error;

/// Domain errors raised while loading, aggregating or rendering measurements.
///
/// Every variant is fatal; callers attach the file being processed with
/// `anyhow::Context` and exit.
#[derive(Debug, Error)]
pub enum PlotError {
    /// A required column is absent from the input header.
    #[error("{path}: missing column '{column}'")]
    MissingColumn { path: PathBuf, column: String },

    /// A cell could not be read as a number.
    #[error("{path}, row {row}: '{value}' in column '{column}' is not a number")]
    InvalidValue {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    /// The input has a header but no data rows.
    #[error("{0}: no measurements found")]
    EmptyDataset(PathBuf),

    /// A log-scaled axis received a value <= 0.
    #[error("{axis} axis uses a logarithmic scale but contains {value}")]
    NonPositiveValue { axis: &'static str, value: f64 },

    #[error("Unsupported input file extension: .{0}")]
    UnsupportedInput(String),

    #[error("Unsupported output file extension: .{0} (expected .pdf or .svg)")]
    UnsupportedOutput(String),

    /// Any failure reported by the drawing backend.
    #[error("rendering failed: {0}")]
    Render(String),
}
