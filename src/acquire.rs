//! Roster acquisition: the crawl loop and on-demand snapshot population.
//!
//! [`crawl`] walks a [`RosterSource`] page by page until the source reports
//! no next page, pausing between requests. [`CrawlAcquirer`] runs a crawl and
//! writes the result as the new snapshot. [`ensure_available`] is what
//! request paths call: it leaves an existing snapshot alone and runs the
//! injected [`Acquirer`] only when the snapshot is missing.
//!
//! A crawl either completes and replaces the snapshot, or fails and writes
//! nothing. There are no retries.

use anyhow::{bail, Context, Result};
use async_trait::async_trait;
use std::path::Path;
use std::time::Duration;

use crate::config::{Config, SourceConfig, MIN_PAGE_DELAY_MS};
use crate::models::InstructorRecord;
use crate::snapshot;
use crate::source::{GraphqlSource, RosterSource};

/// Summary of a completed crawl.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CrawlReport {
    pub pages: usize,
    pub records: usize,
}

/// Fetch every page from `source`, in order.
///
/// The pause between consecutive requests is `page_delay`, raised to
/// [`MIN_PAGE_DELAY_MS`] if shorter. The first failed page aborts the crawl.
pub async fn crawl(
    source: &dyn RosterSource,
    page_size: u32,
    page_delay: Duration,
) -> Result<(Vec<InstructorRecord>, CrawlReport)> {
    let page_delay = page_delay.max(Duration::from_millis(MIN_PAGE_DELAY_MS));
    let mut records = Vec::new();
    let mut cursor = String::new();
    let mut pages = 0;

    loop {
        if pages > 0 {
            tokio::time::sleep(page_delay).await;
        }
        pages += 1;

        let shown = if cursor.is_empty() { "start" } else { cursor.as_str() };
        tracing::info!(page = pages, page_size, cursor = shown, "fetching roster page");
        let page = source
            .fetch_page(page_size, &cursor)
            .await
            .with_context(|| format!("Crawl aborted on page {}", pages))?;

        records.extend(page.records);
        tracing::info!(page = pages, total = records.len(), "retrieved roster page");

        if !page.has_next_page {
            break;
        }
        if page.next_cursor.is_empty() {
            bail!("Page {} reports a next page but no cursor", pages);
        }
        cursor = page.next_cursor;
    }

    let report = CrawlReport {
        pages,
        records: records.len(),
    };
    Ok((records, report))
}

/// Something that can populate the snapshot at a given path.
#[async_trait]
pub trait Acquirer: Send + Sync {
    async fn acquire(&self, dest: &Path) -> Result<CrawlReport>;
}

/// Crawls a [`RosterSource`] and replaces the snapshot with the result.
pub struct CrawlAcquirer<S> {
    source: S,
    page_size: u32,
    page_delay: Duration,
}

impl<S: RosterSource> CrawlAcquirer<S> {
    pub fn new(source: S, page_size: u32, page_delay: Duration) -> Self {
        Self {
            source,
            page_size,
            page_delay,
        }
    }
}

impl CrawlAcquirer<GraphqlSource> {
    /// Acquirer for the configured remote GraphQL source.
    pub fn from_config(config: &SourceConfig) -> Result<Self> {
        Ok(Self::new(
            GraphqlSource::new(config)?,
            config.page_size,
            Duration::from_millis(config.page_delay_ms),
        ))
    }
}

#[async_trait]
impl<S: RosterSource> Acquirer for CrawlAcquirer<S> {
    async fn acquire(&self, dest: &Path) -> Result<CrawlReport> {
        let (records, report) = crawl(&self.source, self.page_size, self.page_delay).await?;
        snapshot::write(dest, &records)?;
        tracing::info!(
            records = report.records,
            pages = report.pages,
            path = %dest.display(),
            "saved roster snapshot"
        );
        Ok(report)
    }
}

/// Outcome of [`ensure_available`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Availability {
    /// The snapshot was already on disk.
    Present,
    /// The snapshot was missing and has just been acquired.
    Fetched(CrawlReport),
}

/// Make sure a snapshot exists at `path`, acquiring one if needed.
pub async fn ensure_available(path: &Path, acquirer: &dyn Acquirer) -> Result<Availability> {
    if snapshot::exists(path) {
        return Ok(Availability::Present);
    }

    tracing::warn!(path = %path.display(), "roster snapshot missing, acquiring");
    let report = acquirer
        .acquire(path)
        .await
        .context("Failed to acquire roster snapshot")?;

    if !snapshot::exists(path) {
        bail!(
            "Acquisition finished but no snapshot was written to {}",
            path.display()
        );
    }
    Ok(Availability::Fetched(report))
}

/// Run a full crawl with the configured source and replace the snapshot.
///
/// Used by `roster crawl`.
pub async fn run_crawl(config: &Config) -> Result<CrawlReport> {
    let acquirer = CrawlAcquirer::from_config(&config.source)?;
    let report = acquirer.acquire(&config.snapshot.path).await?;

    println!("Crawl complete.");
    println!("  pages:   {}", report.pages);
    println!("  records: {}", report.records);
    println!("  saved:   {}", config.snapshot.path.display());
    Ok(report)
}
