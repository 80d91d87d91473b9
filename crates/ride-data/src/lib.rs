//! Flat-file access layer for the ridership dashboard
//!
//! Reads the trip sample, the daily summary and the top-routes CSV into
//! read-only tables, memoized by file path and modification time. The
//! tables are produced upstream; nothing here writes back.

pub mod cache;
pub mod loader;
pub mod store;

pub use cache::*;
pub use loader::*;
pub use store::*;

use serde::Deserialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Data unavailable: {}", .path.display())]
    DataUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error(
        "Malformed record in {}{}: field `{field}`: {reason}",
        .path.display(),
        line_suffix(.line)
    )]
    MalformedRecord {
        path: PathBuf,
        line: Option<u64>,
        field: String,
        reason: String,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type LoadResult<T> = Result<T, LoadError>;

fn line_suffix(line: &Option<u64>) -> String {
    line.map(|l| format!(" at line {l}")).unwrap_or_default()
}

/// What to do with a row that fails to parse
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MalformedPolicy {
    /// Skip and count bad rows, warn once with a summary
    #[default]
    Skip,
    /// Fail the whole load on the first bad row
    Abort,
}
