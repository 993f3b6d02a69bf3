//! Vehicle Track Data Model
//!
//! Per-frame detection records produced by the upstream detector/tracker,
//! plus a parser for its slash-separated text log format.

mod parser;
mod record;

pub use parser::{load_track_log, parse_track_log};
pub use record::{BoundingBox, DetectionRecord};

use thiserror::Error;

/// Track data error types
#[derive(Error, Debug)]
pub enum TrackError {
    /// A log line does not match the expected record layout
    #[error("Malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    /// Underlying I/O failure while reading the log
    #[error("Failed to read track log: {0}")]
    Io(#[from] std::io::Error),
}
