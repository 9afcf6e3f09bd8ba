//! Body parsing: the per-environment state machine that turns interval
//! stamps and result records into dense, sparse-aware series.
//!
//! Grounded on the teacher's streaming processor: a mutable "current
//! interval" held as an explicit local (never a global), advanced line
//! by line, exactly the way the teacher's line-dispatch loop threads
//! its own running state through a single pass over the input.

use crate::error::{EsoError, Result};
use crate::header::HeaderTable;
use crate::line_source::LineSource;
use crate::progress::ProgressSink;
use std::collections::HashMap;
use std::io::BufRead;

const END_OF_DATA: &str = "End of Data";

/// The four interval families that ever carry a peak (min/max) record.
pub const PEAK_INTERVALS: [&str; 4] = ["daily", "monthly", "runperiod", "annual"];

/// Interval families whose stamp record carries a day-of-week/day-type
/// field (spec.md §3).
const DAY_OF_WEEK_INTERVALS: [&str; 3] = ["timestep", "hourly", "daily"];

/// Interval families whose stamp record carries a cumulative-day field
/// (spec.md §3).
const CUMULATIVE_DAY_INTERVALS: [&str; 3] = ["monthly", "annual", "runperiod"];

/// A sparse value: EnergyPlus omits a record for a variable that a
/// reporting frequency skips; `Missing` keeps every series the same
/// length as its interval's stamp count instead of silently shifting.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Missing,
    Num(f64),
}

/// One timestamp within an environment's interval sequence. Fields that
/// do not apply at a given interval granularity are left at `0`
/// (Monthly uses `month` only, RunPeriod/Annual use none).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IntervalStamp {
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub end_minute: u32,
}

/// Dense, `Missing`-padded series for one variable id within one
/// interval.
#[derive(Debug, Clone, Default)]
pub struct RawSeries {
    pub values: Vec<Value>,
}

/// A peak (min/max-at-timestamp) record for one reporting period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakRecord {
    pub value: f64,
    pub month: u32,
    pub day: u32,
    pub hour: u32,
    pub minute: u32,
}

/// Dense, `None`-padded peak series, aligned to the same stamp count as
/// the interval's `RawSeries` collection.
#[derive(Debug, Clone, Default)]
pub struct PeakSeries {
    pub records: Vec<Option<PeakRecord>>,
}

/// Everything parsed for one `Environment Title` block.
#[derive(Debug, Clone, Default)]
pub struct RawEnvironment {
    pub name: String,
    pub dates: HashMap<String, Vec<IntervalStamp>>,
    pub days_of_week: HashMap<String, Vec<Option<String>>>,
    pub cumulative_days: HashMap<String, Vec<u32>>,
    pub outputs: HashMap<String, HashMap<u32, RawSeries>>,
    pub peak_outputs: HashMap<String, HashMap<u32, PeakSeries>>,
}

impl RawEnvironment {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Default::default()
        }
    }

    /// Seeds an empty (zero-length) series for every id the header
    /// declares, for every interval, so a variable that never reports a
    /// value still materializes as an all-`Missing` series of the
    /// interval's stamp count rather than being absent entirely
    /// (spec.md §4.3.2 step 2, invariant (c)). Peak series are seeded
    /// the same way for the D/M/A/RP interval families when peaks are
    /// being tracked.
    fn init_from_header(&mut self, header: &HeaderTable, track_peaks: bool) {
        for (interval, ids) in &header.by_interval {
            let series_map = self.outputs.entry(interval.clone()).or_default();
            for &id in ids.keys() {
                series_map.entry(id).or_insert_with(|| RawSeries { values: Vec::new() });
            }
            if track_peaks && PEAK_INTERVALS.contains(&interval.as_str()) {
                let peak_map = self.peak_outputs.entry(interval.clone()).or_default();
                for &id in ids.keys() {
                    peak_map.entry(id).or_insert_with(|| PeakSeries { records: Vec::new() });
                }
            }
        }
    }

    /// Pushes one new stamp for `interval` and pads every already-known
    /// series for that interval with `Missing`/`None` so the series
    /// stay aligned with the stamp count (spec.md's sparse-series
    /// materialization rule). `day_of_week`/`cumulative_day` are only
    /// recorded for the interval families the data model tracks them
    /// for (TS/H/D and M/A/RP respectively).
    fn push_stamp(
        &mut self,
        interval: &str,
        stamp: IntervalStamp,
        day_of_week: Option<String>,
        cumulative_day: Option<u32>,
    ) {
        self.dates.entry(interval.to_string()).or_default().push(stamp);

        if DAY_OF_WEEK_INTERVALS.contains(&interval) {
            self.days_of_week
                .entry(interval.to_string())
                .or_default()
                .push(day_of_week);
        }
        if CUMULATIVE_DAY_INTERVALS.contains(&interval) {
            self.cumulative_days
                .entry(interval.to_string())
                .or_default()
                .push(cumulative_day.unwrap_or(0));
        }

        if let Some(series_map) = self.outputs.get_mut(interval) {
            for series in series_map.values_mut() {
                series.values.push(Value::Missing);
            }
        }
        if let Some(peak_map) = self.peak_outputs.get_mut(interval) {
            for series in peak_map.values_mut() {
                series.records.push(None);
            }
        }
    }

    fn set_value(&mut self, interval: &str, id: u32, value: f64) {
        let stamp_count = self.dates.get(interval).map(|v| v.len()).unwrap_or(0);
        let series = self
            .outputs
            .entry(interval.to_string())
            .or_default()
            .entry(id)
            .or_insert_with(|| RawSeries {
                values: vec![Value::Missing; stamp_count.saturating_sub(1)],
            });
        if series.values.len() < stamp_count {
            series.values.push(Value::Missing);
        }
        let last = series.values.len() - 1;
        series.values[last] = Value::Num(value);
    }

    fn set_peak(&mut self, interval: &str, id: u32, record: PeakRecord) {
        let stamp_count = self.dates.get(interval).map(|v| v.len()).unwrap_or(0);
        let series = self
            .peak_outputs
            .entry(interval.to_string())
            .or_default()
            .entry(id)
            .or_insert_with(|| PeakSeries {
                records: vec![None; stamp_count.saturating_sub(1)],
            });
        if series.records.len() < stamp_count {
            series.records.push(None);
        }
        let last = series.records.len() - 1;
        series.records[last] = Some(record);
    }
}

/// Per-environment, per-interval body state machine.
pub struct BodyParser {
    highest_interval_id: u32,
    ignore_peaks: bool,
}

impl BodyParser {
    pub fn new(legacy_interval_ids: bool, ignore_peaks: bool) -> Self {
        Self {
            highest_interval_id: if legacy_interval_ids { 5 } else { 6 },
            ignore_peaks,
        }
    }

    /// Parses the whole body and returns every environment encountered,
    /// in file order. Fatal on EOF before `End of Data`.
    pub fn parse<R: BufRead>(
        &self,
        source: &mut LineSource<R>,
        sink: &mut dyn ProgressSink,
        header: &HeaderTable,
    ) -> Result<Vec<RawEnvironment>> {
        sink.log_section("body");
        let mut environments = Vec::new();
        let mut current: Option<RawEnvironment> = None;
        let mut current_interval: Option<String> = None;

        loop {
            let line = source
                .next_line(sink)?
                .ok_or(EsoError::IncompleteFile)?;
            let trimmed = line.trim();

            if trimmed == END_OF_DATA {
                if let Some(env) = current.take() {
                    environments.push(env);
                }
                return Ok(environments);
            }
            if trimmed.is_empty() {
                return Err(EsoError::BlankLine);
            }

            let mut fields = trimmed.splitn(2, ',');
            let id_str = fields.next().unwrap_or("");
            let rest = fields.next().unwrap_or("");
            let id: u32 = id_str
                .parse()
                .map_err(|_| EsoError::InvalidLineSyntax { line: line.clone() })?;

            if id == 1 {
                if let Some(env) = current.take() {
                    environments.push(env);
                }
                let name = rest.split(',').next().unwrap_or("").trim().to_string();
                let mut env = RawEnvironment::new(name);
                env.init_from_header(header, !self.ignore_peaks);
                current = Some(env);
                current_interval = None;
                continue;
            }

            let env = current
                .as_mut()
                .ok_or_else(|| EsoError::InvalidLineSyntax { line: line.clone() })?;

            if id >= 2 && id <= self.highest_interval_id {
                let (interval, stamp, dow, cum_day) = parse_interval_stamp(id, rest, &line)?;
                env.push_stamp(&interval, stamp, dow, cum_day);
                current_interval = Some(interval);
                continue;
            }

            let interval = current_interval
                .clone()
                .ok_or_else(|| EsoError::InvalidLineSyntax { line: line.clone() })?;

            if header.get(&interval, id).is_none() {
                tracing::warn!(id, interval = %interval, "unknown result id, dropping record");
                continue;
            }

            let parts: Vec<&str> = rest.split(',').collect();
            let value: f64 = parts
                .first()
                .ok_or_else(|| EsoError::InvalidLineSyntax { line: line.clone() })?
                .parse()
                .map_err(|_| EsoError::InvalidLineSyntax { line: line.clone() })?;
            env.set_value(&interval, id, value);

            if !self.ignore_peaks && PEAK_INTERVALS.contains(&interval.as_str()) && parts.len() >= 5 {
                let month: u32 = parts[1].trim().parse().unwrap_or(0);
                let day: u32 = parts[2].trim().parse().unwrap_or(0);
                let hour: u32 = parts[3].trim().parse().unwrap_or(0);
                let minute: u32 = parts[4].trim().parse().unwrap_or(0);
                env.set_peak(&interval, id, PeakRecord { value, month, day, hour, minute });
            }
        }
    }
}

/// Parses an interval-stamp record. TimeStep and Hourly share leading
/// id `2`; they are disambiguated by the half-up-rounded end-minute
/// rule from spec.md §4.3: `start_minute == 0 && round(end_minute) ==
/// 60` means the record is actually Hourly.
fn parse_interval_stamp(
    id: u32,
    rest: &str,
    line: &str,
) -> Result<(String, IntervalStamp, Option<String>, Option<u32>)> {
    let parts: Vec<&str> = rest.split(',').map(|p| p.trim()).collect();
    let bad = || EsoError::InvalidLineSyntax { line: line.to_string() };

    match id {
        // [day-of-sim, month, day-of-month, dst, hour, start-min, end-min, day-type]
        2 => {
            let month: u32 = parts.get(1).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let day: u32 = parts.get(2).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let hour: u32 = parts.get(4).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let start_min: f64 = parts.get(5).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let end_min: f64 = parts.get(6).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let day_type = parts.get(7).map(|s| s.to_string());

            let rounded_end = half_up_round(end_min);
            let interval = if start_min == 0.0 && rounded_end == 60 {
                "hourly"
            } else {
                "timestep"
            };

            Ok((
                interval.to_string(),
                IntervalStamp { month, day, hour, end_minute: rounded_end },
                day_type,
                None,
            ))
        }
        // [day-of-sim, month, day-of-month, dst, day-type]
        3 => {
            let month: u32 = parts.get(1).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let day: u32 = parts.get(2).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let day_type = parts.get(4).map(|s| s.to_string());
            Ok((
                "daily".to_string(),
                IntervalStamp { month, day, hour: 0, end_minute: 0 },
                day_type,
                None,
            ))
        }
        // [cumulative-day, month]
        4 => {
            let cumulative: u32 = parts.first().ok_or_else(bad)?.parse().map_err(|_| bad())?;
            let month: u32 = parts.get(1).ok_or_else(bad)?.parse().map_err(|_| bad())?;
            Ok((
                "monthly".to_string(),
                IntervalStamp { month, day: 0, hour: 0, end_minute: 0 },
                None,
                Some(cumulative),
            ))
        }
        5 => {
            let cumulative: u32 = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0);
            Ok((
                "runperiod".to_string(),
                IntervalStamp::default(),
                None,
                Some(cumulative),
            ))
        }
        6 => {
            let cumulative: u32 = parts.first().and_then(|s| s.parse().ok()).unwrap_or(0);
            Ok(("annual".to_string(), IntervalStamp::default(), None, Some(cumulative)))
        }
        _ => Err(bad()),
    }
}

fn half_up_round(value: f64) -> u32 {
    (value + 0.5).floor() as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::{HeaderParser, HeaderTable};
    use crate::progress::NullProgressSink;
    use std::io::Cursor;

    fn header_with(interval: &str, id: u32) -> HeaderTable {
        let text = format!(
            "{},1,Environment,Site Outdoor Air Drybulb Temperature [C] !{}\nEnd of Data Dictionary\n",
            id, interval
        );
        let mut source = LineSource::new(Cursor::new(text), 10);
        let mut sink = NullProgressSink::default();
        HeaderParser::parse(&mut source, &mut sink).unwrap()
    }

    #[test]
    fn discriminates_hourly_from_timestep() {
        let header = header_with("Hourly", 7);
        let body = "1,Run Period 1\n2,6,1,1,0,1,0,60,WeekDay\n7,21.5\nEnd of Data\n";
        let mut source = LineSource::new(Cursor::new(body), 10);
        let mut sink = NullProgressSink::default();
        let parser = BodyParser::new(false, true);
        let envs = parser.parse(&mut source, &mut sink, &header).unwrap();
        assert_eq!(envs.len(), 1);
        let series = &envs[0].outputs["hourly"][&7];
        assert_eq!(series.values, vec![Value::Num(21.5)]);
    }

    #[test]
    fn pads_missing_for_unreported_slots() {
        let header = header_with("daily", 9);
        let body = "1,Run Period 1\n3,4,1,1,0,WeekDay\n3,4,1,2,0,WeekDay\n9,5.0\nEnd of Data\n";
        let mut source = LineSource::new(Cursor::new(body), 10);
        let mut sink = NullProgressSink::default();
        let parser = BodyParser::new(false, true);
        let envs = parser.parse(&mut source, &mut sink, &header).unwrap();
        let series = &envs[0].outputs["daily"][&9];
        assert_eq!(series.values, vec![Value::Missing, Value::Num(5.0)]);
    }

    #[test]
    fn unknown_result_id_is_dropped_not_fatal() {
        let header = header_with("hourly", 7);
        let body = "1,Run Period 1\n2,6,1,1,0,1,0,60,WeekDay\n999,1.0\nEnd of Data\n";
        let mut source = LineSource::new(Cursor::new(body), 10);
        let mut sink = NullProgressSink::default();
        let parser = BodyParser::new(false, true);
        let envs = parser.parse(&mut source, &mut sink, &header).unwrap();
        assert!(!envs[0].outputs["hourly"].contains_key(&999));
    }
}
