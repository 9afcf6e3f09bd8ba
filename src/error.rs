//! Error taxonomy for the EnergyPlus `.eso` streaming parser.
//!
//! Mirrors spec.md §7: every fatal condition is a distinct `EsoError`
//! variant carrying the context needed to diagnose it; non-fatal
//! conditions (`DuplicateVariable`, `UnknownResultId`) are logged and
//! handled locally — they are never returned as a terminal `Err` from
//! the parser, so they are modelled here only for completeness and for
//! callers who want to inspect what was dropped.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, EsoError>;

#[derive(Debug, Error)]
pub enum EsoError {
    /// A syntactically malformed line in the header or body.
    #[error("invalid line syntax: {line:?}")]
    InvalidLineSyntax { line: String },

    /// An empty line observed inside the dictionary or body.
    #[error("blank line encountered where none is permitted")]
    BlankLine,

    /// Stream exhaustion before the expected sentinel (`End of Data
    /// Dictionary` / `End of Data`).
    #[error("input ended before the expected sentinel was reached")]
    IncompleteFile,

    /// A result record referring to an id not present in the header for
    /// the current interval. Non-fatal: logged and the value dropped.
    #[error("result record for unknown id {id} in interval {interval}")]
    UnknownResultId { id: u32, interval: String },

    /// A dictionary entry whose `(interval, key, type, units)` tuple
    /// duplicates an already-seen entry. Non-fatal: surfaces only
    /// through `SearchIndex::prune_duplicates`.
    #[error("duplicate variable id {id} for an already-indexed (interval, key, type, units)")]
    DuplicateVariable { id: u32 },

    /// Raised by a `ProgressSink` at a chunk boundary when cancellation
    /// has been requested.
    #[error("parse cancelled")]
    Cancelled,

    /// Wraps an underlying I/O failure from the line source.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
