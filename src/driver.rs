//! Top-level orchestration: preamble, header, body, then per-environment
//! duplicate pruning, producing the final `Vec<RawEnvironment>`.
//!
//! Grounded on the teacher's analyzer-orchestrator, which wires a
//! discovery step, a parse step and a post-processing step together
//! behind one public entry point rather than leaving callers to stitch
//! the pieces themselves.

use crate::body::{BodyParser, RawEnvironment};
use crate::error::{EsoError, Result};
use crate::header::{HeaderParser, HeaderTable};
use crate::line_source::LineSource;
use crate::progress::{NullProgressSink, ProgressSink};
use crate::search_index::SearchIndex;
use crate::version::VersionInfo;
use std::io::{BufRead, BufReader, Read};

/// Everything produced by a successful parse: the pruned header table
/// (shared across environments) and one `RawEnvironment` per
/// `Environment Title` block, each carrying its own pruned search
/// index.
pub struct ParsedFile {
    pub version: VersionInfo,
    pub header: HeaderTable,
    pub environments: Vec<RawEnvironment>,
    pub indices: Vec<SearchIndex>,
}

/// Parses a complete `.eso` stream. `chunk_size` controls how often the
/// `ProgressSink` is ticked (spec.md §4.1); `ignore_peaks` controls
/// whether peak (min/max-at-timestamp) records are retained.
pub fn parse_eso<R: Read>(
    reader: R,
    chunk_size: usize,
    ignore_peaks: bool,
    sink: &mut dyn ProgressSink,
) -> Result<ParsedFile> {
    let mut source = LineSource::new(BufReader::new(reader), chunk_size);

    let preamble = source
        .next_line(sink)?
        .ok_or(EsoError::IncompleteFile)?;
    let version = VersionInfo::parse(&preamble)?;

    // The preamble is followed by one reserved line per interval id up
    // to highest_interval_id(version) (spec.md §4.5 step 3, §6); these
    // carry no dictionary content and are consumed, not parsed.
    let reserved_lines = highest_interval_id(&version);
    for _ in 0..reserved_lines {
        source.next_line(sink)?.ok_or(EsoError::IncompleteFile)?;
    }

    let mut header = HeaderParser::parse(&mut source, sink)?;

    let body_parser = BodyParser::new(version.uses_legacy_interval_ids(), ignore_peaks);
    let mut environments = body_parser.parse(&mut source, sink, &header)?;

    let mut indices = Vec::with_capacity(environments.len());
    for env in &mut environments {
        let index = SearchIndex::build(&header);
        index.prune_duplicates(&mut header, env);
        indices.push(index);
    }

    Ok(ParsedFile {
        version,
        header,
        environments,
        indices,
    })
}

/// Number of reserved preamble lines following the `Program Version`
/// line: one per interval id the body's state machine recognizes (5 for
/// versions before 8.9.0, 6 from 8.9.0 on).
fn highest_interval_id(version: &VersionInfo) -> u32 {
    if version.uses_legacy_interval_ids() {
        5
    } else {
        6
    }
}

/// Pre-scans `reader` to count lines, so a `ProgressSink` can show
/// determinate progress before the real parse begins. Grounded on the
/// teacher's file-discovery pre-count used to size its own progress
/// bar ahead of the main pass.
pub fn count_lines<R: BufRead>(mut reader: R) -> Result<usize> {
    let mut count = 0;
    let mut buf = String::new();
    loop {
        buf.clear();
        let bytes = reader.read_line(&mut buf)?;
        if bytes == 0 {
            break;
        }
        count += 1;
    }
    Ok(count)
}

/// Convenience wrapper: parses a file path end-to-end using a
/// `NullProgressSink`.
pub fn parse_eso_file(
    path: &std::path::Path,
    chunk_size: usize,
    ignore_peaks: bool,
) -> Result<ParsedFile> {
    let file = std::fs::File::open(path)?;
    let mut sink = NullProgressSink::default();
    parse_eso(file, chunk_size, ignore_peaks, &mut sink)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const SAMPLE: &str = concat!(
        "Program Version,EnergyPlus, Version 8.9.0-40101eaafd, YMD=2020.05.14 14:22\n",
        "1,Average,Zone Timestep\n",
        "2,Average,Hourly\n",
        "3,Average,Daily\n",
        "4,Average,Monthly\n",
        "5,Average,Run Period\n",
        "6,Average,Annual\n",
        "7,1,Environment,Site Outdoor Air Drybulb Temperature [C] !Hourly\n",
        "End of Data Dictionary\n",
        "1,Run Period 1\n",
        "2,6,1,1,0,1,0,60,WeekDay\n",
        "7,21.5\n",
        "End of Data\n",
    );

    #[test]
    fn parses_full_minimal_file() {
        let mut sink = NullProgressSink::default();
        let parsed = parse_eso(Cursor::new(SAMPLE), 10, true, &mut sink).unwrap();
        assert_eq!(parsed.version.version, 890);
        assert_eq!(parsed.environments.len(), 1);
        assert_eq!(parsed.environments[0].name, "Run Period 1");
        assert_eq!(parsed.indices.len(), 1);
    }

    #[test]
    fn incomplete_stream_is_fatal() {
        let mut sink = NullProgressSink::default();
        let truncated = "Program Version,EnergyPlus, Version 8.9.0-40101eaafd, YMD=2020.05.14 14:22\n";
        let err = parse_eso(Cursor::new(truncated), 10, true, &mut sink).unwrap_err();
        assert!(matches!(err, EsoError::IncompleteFile));
    }
}
