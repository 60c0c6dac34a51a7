//! Error types for Smartdriver Core
//!
//! The stream processors themselves are pure transformation over validated
//! numeric input and have no failure modes; errors only arise at the
//! recorded-trip boundary (parsing and file I/O).

use thiserror::Error;

/// Errors that can occur loading or validating recorded trips
#[derive(Debug, Error)]
pub enum ProfilerError {
    #[error("failed to parse recorded trip: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("failed to read recorded trip: {0}")]
    Io(#[from] std::io::Error),

    #[error("recorded trip contains no fixes or samples")]
    EmptyTrip,
}
