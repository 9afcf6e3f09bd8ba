//! Duplicate-variable detection and wildcard variable lookup.
//!
//! Grounded on `other_examples/299810e9_yan-zaretskiy-eclair__src-summary.rs.rs`'s
//! `Summary`/`SummaryItem` index, which keeps a static table of
//! interned keyword names and exposes keyword lookups over it; the
//! first-id-wins duplicate rule and the `*`/case-insensitive matching
//! here follow spec.md §4.4 directly since neither pack repo implements
//! that part.

use crate::body::RawEnvironment;
use crate::header::{HeaderTable, Variable};
use std::collections::HashMap;

/// `(interval, key, type, units)` -> canonical id, plus a record of
/// every id that was found to duplicate an already-indexed tuple.
#[derive(Debug, Clone, Default)]
pub struct SearchIndex {
    canonical: HashMap<(String, String, String, String), u32>,
    entries: HashMap<u32, Variable>,
    /// duplicate id -> canonical id it duplicates
    pub duplicates: HashMap<u32, u32>,
}

impl SearchIndex {
    /// Builds an index over every `(interval, id)` pair in `header`.
    /// The first id seen for a given `(interval, key, type, units)`
    /// tuple becomes canonical; every subsequent id mapping to the same
    /// tuple is recorded in `duplicates`.
    pub fn build(header: &HeaderTable) -> Self {
        let mut index = SearchIndex::default();
        let mut ids: Vec<(u32, Variable)> = header
            .by_interval
            .values()
            .flat_map(|m| m.iter().map(|(id, v)| (*id, v.clone())))
            .collect();
        ids.sort_by_key(|(id, _)| *id);

        for (id, variable) in ids {
            let tuple = (
                variable.interval.clone(),
                variable.key.clone(),
                variable.var_type.clone(),
                variable.units.clone(),
            );
            match index.canonical.get(&tuple) {
                Some(&canonical_id) => {
                    index.duplicates.insert(id, canonical_id);
                }
                None => {
                    index.canonical.insert(tuple, id);
                    index.entries.insert(id, variable);
                }
            }
        }
        index
    }

    /// Removes every duplicate id's series from `header` and from an
    /// environment's `outputs`/`peak_outputs` maps, keeping only the
    /// canonical id.
    pub fn prune_duplicates(&self, header: &mut HeaderTable, env: &mut RawEnvironment) {
        for (&dup_id, _canonical_id) in &self.duplicates {
            for ids in header.by_interval.values_mut() {
                ids.remove(&dup_id);
            }
            for outputs in env.outputs.values_mut() {
                outputs.remove(&dup_id);
            }
            for peak_outputs in env.peak_outputs.values_mut() {
                peak_outputs.remove(&dup_id);
            }
        }
    }

    /// Finds every canonical `(id, Variable)` matching the given
    /// filters. `None` means "don't filter on this field"; `Some("*")`
    /// or any literal string match case-insensitively (all stored
    /// fields are already lower-cased by the header parser).
    pub fn lookup(
        &self,
        interval: Option<&str>,
        key: Option<&str>,
        var_type: Option<&str>,
        units: Option<&str>,
    ) -> Vec<(u32, &Variable)> {
        self.entries
            .iter()
            .filter(|(_, v)| matches_filter(interval, &v.interval))
            .filter(|(_, v)| matches_filter(key, &v.key))
            .filter(|(_, v)| matches_filter(var_type, &v.var_type))
            .filter(|(_, v)| matches_filter(units, &v.units))
            .map(|(&id, v)| (id, v))
            .collect()
    }
}

fn matches_filter(filter: Option<&str>, field: &str) -> bool {
    match filter {
        None => true,
        Some(pattern) => glob_match(pattern, field),
    }
}

/// Simple shell-glob match: `*` stands for any run of characters
/// (including none), case-insensitively. Every other character must
/// match literally. The pattern's `*`-separated segments are matched
/// in order against `field`; the first and last segments are anchored
/// to the start/end unless the pattern itself begins or ends with `*`.
fn glob_match(pattern: &str, field: &str) -> bool {
    let field = field.to_ascii_lowercase();
    let pattern = pattern.to_ascii_lowercase();

    if !pattern.contains('*') {
        return field == pattern;
    }

    let segments: Vec<&str> = pattern.split('*').collect();
    let mut cursor = 0usize;

    if let Some(first) = segments.first() {
        if !first.is_empty() {
            if !field[cursor..].starts_with(first) {
                return false;
            }
            cursor += first.len();
        }
    }

    for segment in &segments[1..segments.len().saturating_sub(1)] {
        if segment.is_empty() {
            continue;
        }
        match field[cursor..].find(segment) {
            Some(pos) => cursor += pos + segment.len(),
            None => return false,
        }
    }

    if segments.len() > 1 {
        if let Some(last) = segments.last() {
            if !last.is_empty() {
                return field[cursor..].ends_with(last);
            }
        }
    }

    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::Variable;

    fn variable(interval: &str, key: &str, var_type: &str, units: &str) -> Variable {
        Variable {
            interval: interval.into(),
            key: key.into(),
            var_type: var_type.into(),
            units: units.into(),
        }
    }

    #[test]
    fn first_id_wins_on_duplicate_tuple() {
        let mut header = HeaderTable::default();
        header.insert(10, variable("hourly", "zone1", "temp", "c"));
        header.insert(20, variable("hourly", "zone1", "temp", "c"));
        let index = SearchIndex::build(&header);
        assert_eq!(index.duplicates.get(&20), Some(&10));
        assert!(!index.duplicates.contains_key(&10));
    }

    #[test]
    fn wildcard_and_case_insensitive_lookup() {
        let mut header = HeaderTable::default();
        header.insert(1, variable("hourly", "zone1", "temp", "c"));
        header.insert(2, variable("daily", "zone2", "temp", "c"));
        let index = SearchIndex::build(&header);

        let hourly_only = index.lookup(Some("hourly"), None, None, None);
        assert_eq!(hourly_only.len(), 1);

        let all_temps = index.lookup(Some("*"), None, Some("TEMP"), None);
        assert_eq!(all_temps.len(), 2);
    }

    #[test]
    fn prefix_and_substring_globs_match() {
        let mut header = HeaderTable::default();
        header.insert(1, variable("hourly", "site outdoor air", "drybulb temperature", "c"));
        header.insert(2, variable("hourly", "zone1", "mean air temperature", "c"));
        header.insert(3, variable("hourly", "zone2", "relative humidity", "pct"));
        let index = SearchIndex::build(&header);

        let site_prefixed = index.lookup(None, Some("site*"), None, None);
        assert_eq!(site_prefixed.len(), 1);

        let temp_substring = index.lookup(None, None, Some("*temp*"), None);
        assert_eq!(temp_substring.len(), 2);

        let drybulb_suffix = index.lookup(None, None, Some("*temperature"), None);
        assert_eq!(drybulb_suffix.len(), 2);

        let none_match = index.lookup(None, None, Some("*humidity*foo"), None);
        assert_eq!(none_match.len(), 0);
    }

    #[test]
    fn prune_removes_duplicate_series() {
        let mut header = HeaderTable::default();
        header.insert(10, variable("hourly", "zone1", "temp", "c"));
        header.insert(20, variable("hourly", "zone1", "temp", "c"));
        let index = SearchIndex::build(&header);

        let mut env = RawEnvironment::default();
        env.outputs.entry("hourly".into()).or_default().insert(
            20,
            crate::body::RawSeries { values: vec![crate::body::Value::Num(1.0)] },
        );

        index.prune_duplicates(&mut header, &mut env);
        assert!(!header.by_interval["hourly"].contains_key(&20));
        assert!(!env.outputs["hourly"].contains_key(&20));
    }
}
