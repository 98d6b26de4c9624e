//! Core data models shared by the acquirer, the resolver and the server.
//!
//! [`InstructorRecord`] is the unit stored in the roster snapshot. Its serde
//! representation (camelCase field names) is the snapshot file format.

use serde::{Deserialize, Serialize};

/// One instructor in the harvested roster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InstructorRecord {
    /// Opaque external identifier, unique within a snapshot.
    pub id: String,
    /// Legacy numeric identifier, returned to callers as the match `id`.
    pub legacy_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub department: String,
    /// Institution name.
    pub school: String,
    pub avg_rating: f64,
    pub num_ratings: u32,
    /// `None` when the source has no data (null or absent).
    #[serde(default)]
    pub would_take_again_percent: Option<f64>,
    pub avg_difficulty: f64,
}

impl InstructorRecord {
    /// `"{first} {last}"`, the form compared against the whole query.
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// A resolved query, as returned by `POST /search/professors`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    /// The query string exactly as submitted.
    pub name: String,
    pub difficulty: f64,
    pub rating: f64,
    pub num_ratings: u32,
    /// The record's legacy identifier.
    pub id: i64,
}

impl MatchResult {
    pub fn from_record(query: &str, record: &InstructorRecord) -> Self {
        Self {
            name: query.to_string(),
            difficulty: record.avg_difficulty,
            rating: record.avg_rating,
            num_ratings: record.num_ratings,
            id: record.legacy_id,
        }
    }
}

#[cfg(test)]
pub(crate) fn record(first: &str, last: &str, legacy_id: i64) -> InstructorRecord {
    InstructorRecord {
        id: format!("VGVhY2hlci0{}", legacy_id),
        legacy_id,
        first_name: first.to_string(),
        last_name: last.to_string(),
        department: "Mathematics".to_string(),
        school: "DePauw University".to_string(),
        avg_rating: 4.2,
        num_ratings: 17,
        would_take_again_percent: Some(88.0),
        avg_difficulty: 2.9,
    }
}
