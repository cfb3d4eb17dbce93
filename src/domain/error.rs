//! Domain error types.
//!
//! Load, feature and backtest errors are fatal and flow into
//! [`FusetraderError`]. [`ExternalEngineError`] is recoverable: it stops at the
//! analysis adapter boundary and has no conversion into the top-level error.

use std::time::Duration;

/// Failure to produce a dataset from the input source.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("data file not found: {path}")]
    NotFound { path: String },

    #[error("unsupported file type: {format} (expected csv or parquet)")]
    UnsupportedFormat { format: String },

    #[error("failed to parse {path}: {reason}")]
    ParseFailure { path: String, reason: String },
}

#[derive(Debug, thiserror::Error)]
pub enum FeatureError {
    #[error("feature engineering requires column {column}")]
    MissingColumn { column: String },
}

/// Failure of an external analysis engine. Never fatal to a pipeline run.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ExternalEngineError {
    #[error("{engine} engine unavailable: {reason}")]
    Unavailable { engine: String, reason: String },

    #[error("engine script not found: {path}")]
    ScriptMissing { path: String },

    #[error("failed to convert dataset for engine: {reason}")]
    ConversionFailure { reason: String },

    #[error("malformed engine output: {reason}")]
    MalformedOutput { reason: String },

    #[error("{engine} engine timed out after {after:?}")]
    Timeout { engine: String, after: Duration },
}

#[derive(Debug, thiserror::Error)]
pub enum BacktestError {
    #[error("backtest requires column {column}")]
    MissingColumn { column: String },

    #[error("insufficient rows for backtest: have {rows}, need {minimum}")]
    InsufficientRows { rows: usize, minimum: usize },
}

/// Top-level error type for fusetrader.
#[derive(Debug, thiserror::Error)]
pub enum FusetraderError {
    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Feature(#[from] FeatureError),

    #[error(transparent)]
    Backtest(#[from] BacktestError),

    #[error("config parse error in {file}: {reason}")]
    ConfigParse { file: String, reason: String },

    #[error("invalid config value [{section}] {key}: {reason}")]
    ConfigInvalid {
        section: String,
        key: String,
        reason: String,
    },

    #[error("failed to write report {path}: {reason}")]
    Report { path: String, reason: String },

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl From<&FusetraderError> for std::process::ExitCode {
    fn from(err: &FusetraderError) -> Self {
        let code: u8 = match err {
            FusetraderError::Io(_) | FusetraderError::Report { .. } => 1,
            FusetraderError::ConfigParse { .. } | FusetraderError::ConfigInvalid { .. } => 2,
            FusetraderError::Load(_) => 3,
            FusetraderError::Feature(_) => 4,
            FusetraderError::Backtest(_) => 5,
        };
        std::process::ExitCode::from(code)
    }
}
