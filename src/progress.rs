//! Cooperative progress reporting and cancellation.
//!
//! Grounded on the teacher's streaming-processor trait objects (a single
//! trait implemented by a no-op and a real sink, ticked by the reader
//! loop rather than polled) and on the `rust/` variant's `Cargo.toml`,
//! which pulls in `indicatif` for exactly this purpose.

/// Ticked by a `LineSource` at chunk boundaries (spec.md §4.1). Any
/// `ProgressSink` may request cancellation; the parser checks
/// `should_cancel` at the same chunk boundary and unwinds with
/// `EsoError::Cancelled` rather than polling on every line.
pub trait ProgressSink {
    /// Total units of work, usually a pre-scanned line count. Called once
    /// before parsing starts; a sink that cannot show determinate
    /// progress may ignore it.
    fn set_maximum(&mut self, maximum: usize);

    /// Advance progress by one chunk.
    fn tick(&mut self);

    /// Record which section of the file is currently being parsed
    /// (e.g. "header", "body: RUN PERIOD 1").
    fn log_section(&mut self, section: &str);

    /// Lines consumed so far.
    fn line_counter(&self) -> usize;

    /// Polled at chunk boundaries; `true` aborts the parse.
    fn should_cancel(&self) -> bool {
        false
    }
}

/// Default sink: tracks the line counter, does nothing else.
#[derive(Debug, Default)]
pub struct NullProgressSink {
    lines: usize,
}

impl ProgressSink for NullProgressSink {
    fn set_maximum(&mut self, _maximum: usize) {}

    fn tick(&mut self) {
        self.lines += 1;
    }

    fn log_section(&mut self, _section: &str) {}

    fn line_counter(&self) -> usize {
        self.lines
    }
}

#[cfg(feature = "progress")]
pub use console::ConsoleProgressSink;

#[cfg(feature = "progress")]
mod console {
    use super::ProgressSink;
    use indicatif::{ProgressBar, ProgressStyle};
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    /// Console progress bar backed by `indicatif`. Cancellation is
    /// exposed through a shared flag so a Ctrl-C handler (or any other
    /// caller holding a clone of the `Arc`) can request a stop.
    pub struct ConsoleProgressSink {
        bar: ProgressBar,
        lines: usize,
        cancel: Arc<AtomicBool>,
    }

    impl ConsoleProgressSink {
        pub fn new() -> Self {
            let bar = ProgressBar::new(0);
            bar.set_style(
                ProgressStyle::with_template(
                    "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} lines ({msg})",
                )
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("#>-"),
            );
            Self {
                bar,
                lines: 0,
                cancel: Arc::new(AtomicBool::new(false)),
            }
        }

        /// Clone of the cancellation flag, for wiring into a signal handler.
        pub fn cancel_handle(&self) -> Arc<AtomicBool> {
            Arc::clone(&self.cancel)
        }
    }

    impl Default for ConsoleProgressSink {
        fn default() -> Self {
            Self::new()
        }
    }

    impl ProgressSink for ConsoleProgressSink {
        fn set_maximum(&mut self, maximum: usize) {
            self.bar.set_length(maximum as u64);
        }

        fn tick(&mut self) {
            self.lines += 1;
            self.bar.set_position(self.lines as u64);
        }

        fn log_section(&mut self, section: &str) {
            self.bar.set_message(section.to_string());
        }

        fn line_counter(&self) -> usize {
            self.lines
        }

        fn should_cancel(&self) -> bool {
            self.cancel.load(Ordering::Relaxed)
        }
    }

    impl Drop for ConsoleProgressSink {
        fn drop(&mut self) {
            self.bar.finish_and_clear();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn null_sink_counts_lines() {
        let mut sink = NullProgressSink::default();
        sink.tick();
        sink.tick();
        assert_eq!(sink.line_counter(), 2);
        assert!(!sink.should_cancel());
    }
}
