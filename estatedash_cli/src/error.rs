use estatedash::error::EstatedashError;
use polars::error::PolarsError;

#[derive(thiserror::Error, Debug)]
pub enum EstatedashCliError {
    #[error("Anyhow error: {0}")]
    Anyhow(#[from] anyhow::Error),
    #[error("serde JSON error: {0}")]
    SerdeJSONError(#[from] serde_json::Error),
    #[error("Invalid TOML in config file: {0}")]
    TomlError(#[from] toml::de::Error),
    #[error("polars error: {0}")]
    PolarsError(#[from] PolarsError),
    #[error("estatedash error: {0}")]
    EstatedashError(#[from] EstatedashError),
    #[error("std IO error: {0}")]
    IOError(#[from] std::io::Error),
}

pub type EstatedashCliResult<T> = Result<T, EstatedashCliError>;
