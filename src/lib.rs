//! EnergyPlus `.eso` reader
//!
//! A streaming parser and in-memory data model for EnergyPlus
//! simulation-output (`.eso`) files. This library turns a flat,
//! line-oriented text format into typed, queryable environments without
//! ever holding more than one chunk of the file in memory at a time.
//!
//! ## Core Features
//!
//! - **Single-pass streaming**: header and body are each read exactly
//!   once, front to back, over a `BufRead`
//! - **Sparse-aware series**: every reporting gap materializes as an
//!   explicit [`body::Value::Missing`] rather than shifting later values
//! - **Duplicate-variable pruning**: first-id-wins semantics across
//!   header, outputs and peak-outputs
//! - **Wildcard search**: case-insensitive `interval`/`key`/`type`/`units`
//!   lookup with `*` wildcards
//! - **Cooperative cancellation**: a [`progress::ProgressSink`] ticked at
//!   chunk boundaries, polled for cancellation at the same boundary
//!
//! ## Architecture Overview
//!
//! - [`version`] - preamble (`Program Version`) parsing
//! - [`header`] - Data Dictionary parsing into a [`header::HeaderTable`]
//! - [`body`] - per-environment interval/result state machine
//! - [`search_index`] - duplicate detection, pruning and wildcard lookup
//! - [`line_source`] - buffered, progress-ticking line reader
//! - [`driver`] - top-level orchestration ([`driver::parse_eso_file`])
//! - [`error`] - the [`error::EsoError`] taxonomy
//! - [`progress`] - the [`progress::ProgressSink`] trait and sinks
//! - [`config`] - configuration with environment variable overrides
//! - [`logging`] - structured logging with JSON and pretty-print formats
//!
//! ## Main Entry Point
//!
//! ```no_run
//! use eso_reader::driver::parse_eso_file;
//! use std::path::Path;
//!
//! # fn example() -> eso_reader::error::Result<()> {
//! let parsed = parse_eso_file(Path::new("eplusout.eso"), 10_000, true)?;
//! println!("{} environments", parsed.environments.len());
//! # Ok(())
//! # }
//! ```

pub mod body;
pub mod config;
pub mod driver;
pub mod error;
pub mod header;
pub mod line_source;
pub mod logging;
pub mod progress;
pub mod search_index;
pub mod version;

pub use body::{RawEnvironment, Value};
pub use driver::{parse_eso, parse_eso_file, ParsedFile};
pub use error::{EsoError, Result};
pub use header::{HeaderTable, Variable};
pub use search_index::SearchIndex;
pub use version::VersionInfo;
