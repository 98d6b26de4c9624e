//! CLI lookups against the snapshot: `roster resolve` and `roster sample`.
//!
//! Both commands behave like the HTTP endpoints: a missing snapshot is
//! crawled first, then the whole snapshot is loaded.

use anyhow::Result;
use chrono::{DateTime, Local};
use std::path::Path;

use crate::acquire::{ensure_available, Availability, CrawlAcquirer};
use crate::config::Config;
use crate::models::{InstructorRecord, MatchResult};
use crate::resolver::resolve_batch;
use crate::snapshot;

async fn load_roster(config: &Config) -> Result<Vec<InstructorRecord>> {
    let path = &config.snapshot.path;
    if !snapshot::exists(path) {
        let acquirer = CrawlAcquirer::from_config(&config.source)?;
        if let Availability::Fetched(report) = ensure_available(path, &acquirer).await? {
            println!(
                "Fetched {} records in {} pages.",
                report.records, report.pages
            );
        }
    }
    snapshot::load(path)
}

/// Resolve `names` and print one row per match.
pub async fn run_resolve(config: &Config, names: &[String]) -> Result<Vec<MatchResult>> {
    let roster = load_roster(config).await?;
    let results = resolve_batch(&roster, names, &config.matching);

    if results.is_empty() {
        println!("No matches.");
    } else {
        println!(
            "{:<28} {:>7} {:>10} {:>8} {:>10}",
            "NAME", "RATING", "DIFFICULTY", "RATINGS", "ID"
        );
        for r in &results {
            println!(
                "{:<28} {:>7.1} {:>10.1} {:>8} {:>10}",
                r.name, r.rating, r.difficulty, r.num_ratings, r.id
            );
        }
    }
    println!("resolved: {} of {}", results.len(), names.len());

    Ok(results)
}

/// Print the snapshot size and its first `limit` records.
pub async fn run_sample(config: &Config, limit: usize) -> Result<()> {
    let roster = load_roster(config).await?;
    let path = &config.snapshot.path;

    println!("Snapshot:  {}", path.display());
    if let Some(ts) = modified_at(path) {
        println!("Captured:  {}", ts.format("%Y-%m-%d %H:%M:%S"));
    }
    println!("Records:   {}", roster.len());
    println!();

    for r in roster.iter().take(limit) {
        let again = r
            .would_take_again_percent
            .map(|p| format!("{:.0}%", p))
            .unwrap_or_else(|| "n/a".to_string());
        println!(
            "  {:>8}  {} {} ({}, {})  rating {:.1}  difficulty {:.1}  ratings {}  again {}",
            r.legacy_id,
            r.first_name,
            r.last_name,
            r.department,
            r.school,
            r.avg_rating,
            r.avg_difficulty,
            r.num_ratings,
            again
        );
    }

    Ok(())
}

fn modified_at(path: &Path) -> Option<DateTime<Local>> {
    let modified = std::fs::metadata(path).ok()?.modified().ok()?;
    Some(DateTime::<Local>::from(modified))
}
