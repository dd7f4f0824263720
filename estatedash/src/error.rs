//! Error types.

use std::path::PathBuf;

#[derive(thiserror::Error, Debug)]
pub enum EstatedashError {
    #[error("Wrapped anyhow error: {0}")]
    AnyhowError(#[from] anyhow::Error),
    #[error("Unsupported date format '{0}': expected YYYY-MM-DD or YYYY-MM")]
    InvalidDate(String),
    #[error("Input file not found: {0}")]
    MissingInput(PathBuf),
    #[error("Column '{column}' missing from {table}")]
    MissingColumn { table: String, column: String },
    #[error("Boundary feature without required property '{0}'")]
    MissingProperty(String),
    #[error("Unsupported boundary format: {0}")]
    UnsupportedBoundaryFormat(String),
    #[error("Join produced no rows: {0}")]
    EmptyJoin(String),
    #[error("Unknown state code: {0}")]
    UnknownState(String),
    #[error("Wrapped polars error: {0}")]
    PolarsError(#[from] polars::error::PolarsError),
    #[error("Wrapped IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, EstatedashError>;
