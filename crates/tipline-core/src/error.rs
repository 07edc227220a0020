//! Error taxonomy for a single analysis run.
//!
//! Only a report that fails to load/parse is fatal to the run. Everything
//! else (missing fields, bad timestamps, failed lookups, failed saves)
//! degrades to an in-band marker or a logged warning.

use std::path::PathBuf;
use thiserror::Error;

/// Input-fatal: the report file could not be loaded as structured data.
#[derive(Debug, Error)]
pub enum ReportError {
    #[error("failed to read report {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("report is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Persistence faults (credentials, statements, exports) are surfaced as
/// warnings and never affect the in-memory report.
#[derive(Debug, Error)]
pub enum PersistError {
    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed JSON in {path}: {source}")]
    Malformed {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
