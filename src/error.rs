use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ReportError>;

/// Errors raised while loading a difference report.
///
/// The engine itself never fails; only getting a report into memory can.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse JSON. Please provide a valid file ({0})")]
    Json(#[from] serde_json::Error),
}
