//! Paginated remote roster source.
//!
//! [`RosterSource`] is the seam between the crawl loop and the network.
//! [`GraphqlSource`] implements it against the ratings site's GraphQL
//! endpoint; tests substitute an in-memory source.
//!
//! # Wire format
//!
//! Each page request is a `POST` of:
//!
//! ```json
//! {
//!   "query": "query TeacherSearchPaginationQuery(...) { ... }",
//!   "variables": {
//!     "count": 100,
//!     "cursor": "",
//!     "query": { "text": "", "schoolID": "U2Nob29sLTE1MjM=", "fallback": true }
//!   }
//! }
//! ```
//!
//! and the response carries records under
//! `data.search.teachers.edges[].node` with pagination state in
//! `data.search.teachers.pageInfo`.
//!
//! # Environment Variables
//!
//! - `ROSTER_SOURCE_TOKEN`: optional, sent as `Authorization: Bearer <token>`.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use std::time::Duration;

use crate::config::SourceConfig;
use crate::models::InstructorRecord;

/// One page of the remote listing.
#[derive(Debug, Clone, PartialEq)]
pub struct Page {
    /// Records in edge order.
    pub records: Vec<InstructorRecord>,
    pub has_next_page: bool,
    /// Cursor to pass to the next [`RosterSource::fetch_page`] call.
    pub next_cursor: String,
}

/// A paginated listing of instructor records.
#[async_trait]
pub trait RosterSource: Send + Sync {
    /// Fetch up to `page_size` records starting after `cursor`.
    ///
    /// An empty `cursor` requests the first page.
    async fn fetch_page(&self, page_size: u32, cursor: &str) -> Result<Page>;
}

const TEACHER_SEARCH_QUERY: &str = r#"query TeacherSearchPaginationQuery(
  $count: Int!
  $cursor: String
  $query: TeacherSearchQuery!
) {
  search: newSearch {
    teachers(query: $query, first: $count, after: $cursor) {
      edges {
        cursor
        node {
          id
          legacyId
          firstName
          lastName
          department
          school {
            name
            id
          }
          avgRating
          numRatings
          wouldTakeAgainPercent
          avgDifficulty
        }
      }
      pageInfo {
        hasNextPage
        endCursor
      }
      resultCount
    }
  }
}"#;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
    (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Remote source backed by the ratings site's GraphQL API.
pub struct GraphqlSource {
    client: reqwest::Client,
    endpoint: String,
    school_id: String,
    token: Option<String>,
}

impl GraphqlSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(USER_AGENT)
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            school_id: config.school_id.clone(),
            token: std::env::var("ROSTER_SOURCE_TOKEN").ok(),
        })
    }

    /// Override the bearer token picked up from `ROSTER_SOURCE_TOKEN`.
    pub fn with_token(mut self, token: Option<String>) -> Self {
        self.token = token;
        self
    }
}

#[async_trait]
impl RosterSource for GraphqlSource {
    async fn fetch_page(&self, page_size: u32, cursor: &str) -> Result<Page> {
        let body = serde_json::json!({
            "query": TEACHER_SEARCH_QUERY,
            "variables": {
                "count": page_size,
                "cursor": cursor,
                "query": {
                    "text": "",
                    "schoolID": self.school_id,
                    "fallback": true,
                },
            },
        });

        let mut request = self.client.post(&self.endpoint).json(&body);
        if let Some(ref token) = self.token {
            request = request.bearer_auth(token);
        }

        let resp = request
            .send()
            .await
            .with_context(|| format!("Failed to reach roster source at {}", self.endpoint))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            bail!(
                "Roster source returned HTTP {}: {}",
                status,
                text.chars().take(500).collect::<String>()
            );
        }

        let text = resp.text().await?;
        parse_page(&text)
    }
}

// ============ Response decoding ============

#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<ResponseData>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    message: String,
}

#[derive(Deserialize)]
struct ResponseData {
    search: SearchResult,
}

#[derive(Deserialize)]
struct SearchResult {
    teachers: TeacherConnection,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherConnection {
    edges: Vec<TeacherEdge>,
    page_info: PageInfo,
}

#[derive(Deserialize)]
struct TeacherEdge {
    node: TeacherNode,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    has_next_page: bool,
    end_cursor: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TeacherNode {
    id: String,
    legacy_id: i64,
    first_name: String,
    last_name: String,
    department: String,
    school: SchoolRef,
    avg_rating: f64,
    num_ratings: u32,
    would_take_again_percent: Option<f64>,
    avg_difficulty: f64,
}

#[derive(Deserialize)]
struct SchoolRef {
    name: String,
}

impl From<TeacherNode> for InstructorRecord {
    fn from(node: TeacherNode) -> Self {
        InstructorRecord {
            id: node.id,
            legacy_id: node.legacy_id,
            first_name: node.first_name,
            last_name: node.last_name,
            department: node.department,
            school: node.school.name,
            avg_rating: node.avg_rating,
            num_ratings: node.num_ratings,
            would_take_again_percent: node.would_take_again_percent,
            avg_difficulty: node.avg_difficulty,
        }
    }
}

/// Decode one GraphQL response body into a [`Page`].
///
/// Any GraphQL error, a missing `data` object, or a node missing a required
/// field fails the whole page.
pub fn parse_page(body: &str) -> Result<Page> {
    let response: GraphqlResponse =
        serde_json::from_str(body).context("Malformed roster page")?;

    if let Some(errors) = response.errors.as_deref() {
        if let Some(first) = errors.first() {
            bail!(
                "Roster source reported {} error(s): {}",
                errors.len(),
                first.message
            );
        }
    }

    let teachers = response
        .data
        .ok_or_else(|| anyhow::anyhow!("Roster page has no data"))?
        .search
        .teachers;

    Ok(Page {
        records: teachers
            .edges
            .into_iter()
            .map(|edge| edge.node.into())
            .collect(),
        has_next_page: teachers.page_info.has_next_page,
        next_cursor: teachers.page_info.end_cursor.unwrap_or_default(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn node_json(legacy_id: i64, first: &str, last: &str) -> serde_json::Value {
        serde_json::json!({
            "id": format!("VGVhY2hlci0{}", legacy_id),
            "legacyId": legacy_id,
            "firstName": first,
            "lastName": last,
            "department": "History",
            "school": { "name": "DePauw University", "id": "U2Nob29sLTE1MjM=" },
            "avgRating": 4.5,
            "numRatings": 12,
            "wouldTakeAgainPercent": 91.6,
            "avgDifficulty": 3.1,
            "isSaved": false,
            "__typename": "Teacher"
        })
    }

    fn page_json(nodes: Vec<serde_json::Value>, has_next: bool, cursor: &str) -> String {
        let edges: Vec<_> = nodes
            .into_iter()
            .map(|n| serde_json::json!({ "cursor": "x", "node": n }))
            .collect();
        serde_json::json!({
            "data": {
                "search": {
                    "teachers": {
                        "didFallback": false,
                        "edges": edges,
                        "pageInfo": { "hasNextPage": has_next, "endCursor": cursor },
                        "resultCount": 2
                    }
                }
            }
        })
        .to_string()
    }

    #[test]
    fn test_parse_page_flattens_nodes() {
        let body = page_json(
            vec![node_json(1, "Jane", "Smith"), node_json(2, "Ada", "Lovelace")],
            true,
            "YXJyYXljb25uZWN0aW9uOjE=",
        );
        let page = parse_page(&body).unwrap();

        assert!(page.has_next_page);
        assert_eq!(page.next_cursor, "YXJyYXljb25uZWN0aW9uOjE=");
        assert_eq!(page.records.len(), 2);
        assert_eq!(page.records[0].first_name, "Jane");
        assert_eq!(page.records[0].school, "DePauw University");
        assert_eq!(page.records[1].legacy_id, 2);
        assert_eq!(page.records[1].would_take_again_percent, Some(91.6));
    }

    #[test]
    fn test_parse_page_null_percent_and_cursor() {
        let mut node = node_json(1, "Jane", "Smith");
        node["wouldTakeAgainPercent"] = serde_json::Value::Null;
        let body = serde_json::json!({
            "data": { "search": { "teachers": {
                "edges": [{ "node": node }],
                "pageInfo": { "hasNextPage": false, "endCursor": null }
            }}}
        })
        .to_string();

        let page = parse_page(&body).unwrap();
        assert!(!page.has_next_page);
        assert_eq!(page.next_cursor, "");
        assert_eq!(page.records[0].would_take_again_percent, None);
    }

    #[test]
    fn test_parse_page_missing_field_fails_page() {
        let mut bad = node_json(2, "Ada", "Lovelace");
        bad.as_object_mut().unwrap().remove("lastName");
        let body = page_json(vec![node_json(1, "Jane", "Smith"), bad], false, "");

        assert!(parse_page(&body).is_err());
    }

    #[test]
    fn test_parse_page_missing_school_name_fails_page() {
        let mut bad = node_json(1, "Jane", "Smith");
        bad["school"] = serde_json::json!({ "id": "U2Nob29sLTE1MjM=" });
        let body = page_json(vec![bad], false, "");

        assert!(parse_page(&body).is_err());
    }

    #[test]
    fn test_parse_page_graphql_errors() {
        let body = r#"{"data": null, "errors": [{"message": "rate limited"}]}"#;
        let err = parse_page(body).unwrap_err();
        assert!(err.to_string().contains("rate limited"));
    }

    #[test]
    fn test_parse_page_without_data() {
        assert!(parse_page("{}").is_err());
        assert!(parse_page("<html>blocked</html>").is_err());
    }
}
