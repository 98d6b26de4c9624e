//! TOML configuration.
//!
//! Every section is optional; a missing section takes its defaults. See
//! `config/roster.example.toml` for a complete file.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::resolver::Thresholds;

/// Lower bound on the pause between page requests to the remote source.
pub const MIN_PAGE_DELAY_MS: u64 = 500;

#[derive(Debug, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub snapshot: SnapshotConfig,
    #[serde(default)]
    pub source: SourceConfig,
    #[serde(default)]
    pub matching: Thresholds,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct SnapshotConfig {
    #[serde(default = "default_snapshot_path")]
    pub path: PathBuf,
}

impl Default for SnapshotConfig {
    fn default() -> Self {
        Self {
            path: default_snapshot_path(),
        }
    }
}

fn default_snapshot_path() -> PathBuf {
    PathBuf::from("./data/roster.json")
}

#[derive(Debug, Deserialize, Clone)]
pub struct SourceConfig {
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    /// Institution identifier sent as `schoolID` with every page request.
    #[serde(default = "default_school_id")]
    pub school_id: String,
    #[serde(default = "default_page_size")]
    pub page_size: u32,
    #[serde(default = "default_page_delay_ms")]
    pub page_delay_ms: u64,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            endpoint: default_endpoint(),
            school_id: default_school_id(),
            page_size: default_page_size(),
            page_delay_ms: default_page_delay_ms(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

fn default_endpoint() -> String {
    "https://www.ratemyprofessors.com/graphql".to_string()
}
fn default_school_id() -> String {
    "U2Nob29sLTE1MjM=".to_string()
}
fn default_page_size() -> u32 {
    100
}
fn default_page_delay_ms() -> u64 {
    MIN_PAGE_DELAY_MS
}
fn default_timeout_secs() -> u64 {
    30
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Origins allowed by CORS.
    #[serde(default = "default_allowed_origins")]
    pub allowed_origins: Vec<String>,
    /// Number of records returned by `GET /sample_data`.
    #[serde(default = "default_sample_size")]
    pub sample_size: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origins: default_allowed_origins(),
            sample_size: default_sample_size(),
        }
    }
}

fn default_bind() -> String {
    "0.0.0.0:5000".to_string()
}
fn default_allowed_origins() -> Vec<String> {
    vec!["https://my.depauw.edu".to_string()]
}
fn default_sample_size() -> usize {
    5
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(&config)?;
    Ok(config)
}

pub fn validate(config: &Config) -> Result<()> {
    // Validate matching
    let gates = [
        ("full_name_threshold", config.matching.full_name_threshold),
        ("last_name_threshold", config.matching.last_name_threshold),
        ("first_name_threshold", config.matching.first_name_threshold),
    ];
    for (name, value) in gates {
        if !(0.0..=1.0).contains(&value) {
            anyhow::bail!("matching.{} must be in [0.0, 1.0]", name);
        }
    }

    // Validate source
    if config.source.page_size == 0 {
        anyhow::bail!("source.page_size must be > 0");
    }
    if config.source.page_delay_ms < MIN_PAGE_DELAY_MS {
        anyhow::bail!("source.page_delay_ms must be >= {}", MIN_PAGE_DELAY_MS);
    }
    if config.source.timeout_secs == 0 {
        anyhow::bail!("source.timeout_secs must be > 0");
    }
    if config.source.school_id.trim().is_empty() {
        anyhow::bail!("source.school_id must not be empty");
    }

    // Validate server
    if config.server.sample_size == 0 {
        anyhow::bail!("server.sample_size must be > 0");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(toml_str: &str) -> Result<Config> {
        let config: Config = toml::from_str(toml_str)?;
        validate(&config)?;
        Ok(config)
    }

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = parse("").unwrap();
        assert_eq!(config.snapshot.path, PathBuf::from("./data/roster.json"));
        assert_eq!(config.source.page_size, 100);
        assert_eq!(config.source.page_delay_ms, 500);
        assert_eq!(config.matching, Thresholds::default());
        assert_eq!(config.matching.full_name_threshold, 0.67);
        assert_eq!(config.matching.last_name_threshold, 0.85);
        assert_eq!(config.matching.first_name_threshold, 0.5);
        assert_eq!(config.server.allowed_origins, vec!["https://my.depauw.edu"]);
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = parse(
            r#"
[matching]
last_name_threshold = 0.9

[source]
school_id = "U2Nob29sLTE="
"#,
        )
        .unwrap();
        assert_eq!(config.matching.last_name_threshold, 0.9);
        assert_eq!(config.matching.full_name_threshold, 0.67);
        assert_eq!(config.source.school_id, "U2Nob29sLTE=");
        assert_eq!(config.source.timeout_secs, 30);
    }

    #[test]
    fn test_rejects_threshold_out_of_range() {
        let err = parse("[matching]\nfirst_name_threshold = 1.5\n").unwrap_err();
        assert!(err.to_string().contains("first_name_threshold"));
    }

    #[test]
    fn test_rejects_short_page_delay() {
        let err = parse("[source]\npage_delay_ms = 100\n").unwrap_err();
        assert!(err.to_string().contains("page_delay_ms"));
    }

    #[test]
    fn test_rejects_zero_page_size() {
        assert!(parse("[source]\npage_size = 0\n").is_err());
    }

    #[test]
    fn test_load_missing_file() {
        let err = load_config(Path::new("/nonexistent/roster.toml")).unwrap_err();
        assert!(err.to_string().contains("Failed to read config file"));
    }
}
