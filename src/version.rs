//! Preamble parsing: the single `Program Version` line that precedes
//! the Data Dictionary.
//!
//! Format (bit-exact, spec.md §6):
//! `Program Version,EnergyPlus, Version 8.9.0-40101eaafd, YMD=2020.05.14 14:22`
//!
//! Grounded on the teacher's header-parsing regex style: a single
//! `once_cell::sync::Lazy<Regex>` compiled once, matched against one
//! line, never touched again in the hot path.

use crate::error::{EsoError, Result};
use chrono::NaiveDateTime;
use once_cell::sync::Lazy;
use regex::Regex;

static PREAMBLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"^Program Version,EnergyPlus, Version (\d+)\.(\d+)\.(\d+)-\w+, YMD=(\d{4})\.(\d{2})\.(\d{2}) (\d{2}):(\d{2})$",
    )
    .expect("static preamble regex is valid")
});

/// Parsed contents of the preamble line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionInfo {
    /// `major*100 + minor*10 + patch`, e.g. `8.9.0` -> `890`.
    pub version: u32,
    pub generated_at: NaiveDateTime,
}

impl VersionInfo {
    /// Parses the single preamble line. Not a dictionary line, so it is
    /// consumed by the file driver before the `HeaderParser` takes over.
    pub fn parse(line: &str) -> Result<Self> {
        let caps = PREAMBLE_RE
            .captures(line)
            .ok_or_else(|| EsoError::InvalidLineSyntax { line: line.to_string() })?;

        let major: u32 = caps[1].parse().map_err(|_| invalid(line))?;
        let minor: u32 = caps[2].parse().map_err(|_| invalid(line))?;
        let patch: u32 = caps[3].parse().map_err(|_| invalid(line))?;
        let version = major * 100 + minor * 10 + patch;

        let year: i32 = caps[4].parse().map_err(|_| invalid(line))?;
        let month: u32 = caps[5].parse().map_err(|_| invalid(line))?;
        let day: u32 = caps[6].parse().map_err(|_| invalid(line))?;
        let hour: u32 = caps[7].parse().map_err(|_| invalid(line))?;
        let minute: u32 = caps[8].parse().map_err(|_| invalid(line))?;

        let date = chrono::NaiveDate::from_ymd_opt(year, month, day)
            .ok_or_else(|| invalid(line))?;
        let time = chrono::NaiveTime::from_hms_opt(hour, minute, 0).ok_or_else(|| invalid(line))?;

        Ok(VersionInfo {
            version,
            generated_at: NaiveDateTime::new(date, time),
        })
    }

    /// `true` when the body parser should use the pre-8.9.0 set of
    /// interval ids (highest id 5) rather than the current set (6),
    /// per spec.md §4.3.
    pub fn uses_legacy_interval_ids(&self) -> bool {
        self.version < 890
    }
}

fn invalid(line: &str) -> EsoError {
    EsoError::InvalidLineSyntax { line: line.to_string() }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_s1_scenario() {
        let line = "Program Version,EnergyPlus, Version 8.9.0-40101eaafd, YMD=2020.05.14 14:22";
        let info = VersionInfo::parse(line).unwrap();
        assert_eq!(info.version, 890);
        assert_eq!(info.generated_at.to_string(), "2020-05-14 14:22:00");
        assert!(!info.uses_legacy_interval_ids());
    }

    #[test]
    fn pre_890_uses_legacy_ids() {
        let line = "Program Version,EnergyPlus, Version 8.1.0-abcdef0123, YMD=2019.01.01 00:00";
        let info = VersionInfo::parse(line).unwrap();
        assert_eq!(info.version, 810);
        assert!(info.uses_legacy_interval_ids());
    }

    #[test]
    fn rejects_malformed_preamble() {
        assert!(VersionInfo::parse("not a preamble line").is_err());
    }
}
