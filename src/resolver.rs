//! Name resolution against the roster.
//!
//! Each query is compared with every record using three similarity ratios
//! (see [`crate::similarity`]):
//!
//! | Ratio | Compares | Gate |
//! |-------|----------|------|
//! | `full` | `"{first} {last}"` vs. the query as given | `>= full_name_threshold` |
//! | `last` | record last name vs. the query's last token | `> last_name_threshold` |
//! | `first` | record first name vs. the query's first token | `>= first_name_threshold` |
//!
//! The last-name gate is the strictest and the only strict inequality; the
//! first-name gate is loose enough to admit nicknames. A record must clear
//! all three gates to be a candidate, and the candidate with the highest
//! `full` ratio wins. Equal `full` ratios keep the record that appears first
//! in the roster.
//!
//! Queries with no candidate are dropped from the batch output.

use serde::Deserialize;

use crate::models::{InstructorRecord, MatchResult};
use crate::similarity::ratio;

/// Threshold gates applied to each comparison.
///
/// Loaded from the `[matching]` section of the config file.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
pub struct Thresholds {
    #[serde(default = "default_full_name_threshold")]
    pub full_name_threshold: f64,
    #[serde(default = "default_last_name_threshold")]
    pub last_name_threshold: f64,
    #[serde(default = "default_first_name_threshold")]
    pub first_name_threshold: f64,
}

fn default_full_name_threshold() -> f64 {
    0.67
}
fn default_last_name_threshold() -> f64 {
    0.85
}
fn default_first_name_threshold() -> f64 {
    0.5
}

impl Default for Thresholds {
    fn default() -> Self {
        Self {
            full_name_threshold: default_full_name_threshold(),
            last_name_threshold: default_last_name_threshold(),
            first_name_threshold: default_first_name_threshold(),
        }
    }
}

/// A query split into first-name and last-name candidates.
#[derive(Debug, Clone, PartialEq)]
pub struct QueryParts<'a> {
    pub full: &'a str,
    pub first: &'a str,
    pub last: &'a str,
}

impl<'a> QueryParts<'a> {
    /// Split on whitespace: first token is the first name, last token is the
    /// last name. A single token stands for both; an empty query yields
    /// empty candidates (which match nothing).
    pub fn parse(query: &'a str) -> Self {
        let mut tokens = query.split_whitespace();
        let first = tokens.next().unwrap_or(query);
        let last = tokens.last().unwrap_or(first);
        Self {
            full: query,
            first,
            last,
        }
    }
}

/// The three ratios for one record/query comparison.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NameScore {
    pub full: f64,
    pub last: f64,
    pub first: f64,
}

impl NameScore {
    pub fn compute(record: &InstructorRecord, query: &QueryParts<'_>) -> Self {
        Self {
            full: ratio(&record.full_name(), query.full),
            last: ratio(&record.last_name, query.last),
            first: ratio(&record.first_name, query.first),
        }
    }

    pub fn passes(&self, thresholds: &Thresholds) -> bool {
        self.full >= thresholds.full_name_threshold
            && self.last > thresholds.last_name_threshold
            && self.first >= thresholds.first_name_threshold
    }
}

/// Find the best passing record for `query`.
///
/// Returns the record with the strictly highest `full` ratio among those
/// passing every gate; on ties the earliest record in `roster` is kept.
pub fn best_match<'r>(
    roster: &'r [InstructorRecord],
    query: &str,
    thresholds: &Thresholds,
) -> Option<(&'r InstructorRecord, NameScore)> {
    let parts = QueryParts::parse(query);

    roster
        .iter()
        .filter_map(|record| {
            let score = NameScore::compute(record, &parts);
            if !score.passes(thresholds) {
                return None;
            }
            if score.full < 1.0 {
                tracing::info!(
                    candidate = %record.full_name(),
                    query = %parts.full,
                    full = score.full,
                    last_name = %record.last_name,
                    query_last = %parts.last,
                    last = score.last,
                    first_name = %record.first_name,
                    query_first = %parts.first,
                    first = score.first,
                    "fuzzy name match"
                );
            }
            Some((record, score))
        })
        .fold(None, |best, (record, score)| match best {
            Some((_, best_score)) if score.full <= best_score.full => best,
            _ => Some((record, score)),
        })
}

/// Resolve every query in `queries` against `roster`.
///
/// The output holds one [`MatchResult`] per resolved query, in query order.
/// Unresolved queries are omitted.
pub fn resolve_batch<S: AsRef<str>>(
    roster: &[InstructorRecord],
    queries: &[S],
    thresholds: &Thresholds,
) -> Vec<MatchResult> {
    queries
        .iter()
        .filter_map(|query| {
            let query = query.as_ref();
            best_match(roster, query, thresholds)
                .map(|(record, _)| MatchResult::from_record(query, record))
        })
        .collect()
}
