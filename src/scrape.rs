//! Scrape pipeline orchestration.
//!
//! Coordinates one full run: listing fetch → link extraction → paced,
//! sequential breed-page fetches → page extraction → JSON store. Listing
//! failures abort the run; every per-page failure becomes a
//! [`SkippedPage`] in the [`ScrapeReport`] and the loop moves on.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use url::Url;

use crate::config::{Config, ScrapeConfig};
use crate::extract::{LinkExtractor, PageExtractor};
use crate::fetch::{HttpFetcher, PageFetcher};
use crate::models::{BreedDocument, ScrapeReport, SkipReason, SkippedPage};
use crate::progress::{ProgressMode, ScrapeProgressEvent, ScrapeProgressReporter};
use crate::rate_limit::{self, RateLimiter};
use crate::store;

/// Per-run scrape parameters, decoupled from the config file.
#[derive(Debug, Clone)]
pub struct ScrapeOptions {
    pub listing_url: String,
    pub max_breeds: usize,
    pub source_label: String,
    pub link_patterns: Vec<String>,
}

impl ScrapeOptions {
    pub fn from_config(config: &ScrapeConfig) -> Self {
        Self {
            listing_url: config.listing_url.clone(),
            max_breeds: config.max_breeds,
            source_label: config.source_label.clone(),
            link_patterns: config.link_patterns.clone(),
        }
    }
}

/// Fetch the listing and every breed page it links to, in order.
///
/// Returns the accepted documents together with the run report. The
/// report's `output` is left `None`; see [`scrape_and_save`].
///
/// # Errors
///
/// Only listing-level failures are errors: an unparseable listing URL or
/// a listing page that cannot be fetched.
pub async fn scrape_breeds(
    fetcher: &dyn PageFetcher,
    limiter: &mut dyn RateLimiter,
    progress: &dyn ScrapeProgressReporter,
    options: &ScrapeOptions,
) -> Result<(Vec<BreedDocument>, ScrapeReport)> {
    let base = Url::parse(&options.listing_url)
        .with_context(|| format!("Invalid listing URL: {}", options.listing_url))?;

    progress.report(ScrapeProgressEvent::Listing {
        url: options.listing_url.clone(),
    });
    let listing_html = fetcher
        .fetch(&options.listing_url)
        .await
        .with_context(|| format!("Failed to fetch listing page {}", options.listing_url))?;

    let links = LinkExtractor::with_patterns(&options.link_patterns).extract(&listing_html, &base);
    if links.is_empty() {
        tracing::warn!(
            url = %options.listing_url,
            "no breed pages found; the listing markup may have changed"
        );
    }

    let mut report = ScrapeReport {
        listing_url: options.listing_url.clone(),
        found: links.len(),
        ..Default::default()
    };

    let visit_count = links.len().min(options.max_breeds);
    report.truncated = links.len() - visit_count;
    report.visited = visit_count;

    let pages = PageExtractor::default();
    let mut documents: Vec<BreedDocument> = Vec::with_capacity(visit_count);

    for (i, url) in links.iter().take(visit_count).enumerate() {
        limiter.wait().await;
        progress.report(ScrapeProgressEvent::Page {
            n: i as u64 + 1,
            total: visit_count as u64,
            url: url.clone(),
        });

        let fetched = fetcher.fetch(url).await;
        limiter.finished();

        let outcome = match fetched {
            Ok(html) => pages.extract(&html),
            Err(e) => Err(SkipReason::Fetch(e.to_string())),
        };

        match outcome {
            Ok(page) => {
                tracing::info!(url = %url, title = %page.title, strategy = page.strategy, "added breed");
                documents.push(BreedDocument {
                    title: page.title,
                    content: page.content,
                    url: url.clone(),
                    source: options.source_label.clone(),
                });
                progress.report(ScrapeProgressEvent::PageDone {
                    url: url.clone(),
                    accepted: true,
                });
            }
            Err(reason) => {
                tracing::warn!(url = %url, reason = %reason, "skipped breed page");
                report.skipped.push(SkippedPage {
                    url: url.clone(),
                    reason,
                });
                progress.report(ScrapeProgressEvent::PageDone {
                    url: url.clone(),
                    accepted: false,
                });
            }
        }
    }

    report.accepted = documents.len();
    Ok((documents, report))
}

/// Run [`scrape_breeds`] and persist the accepted documents to `output`.
///
/// When no document is accepted nothing is written and any existing file
/// is left untouched; `report.output` stays `None`.
pub async fn scrape_and_save(
    fetcher: &dyn PageFetcher,
    limiter: &mut dyn RateLimiter,
    progress: &dyn ScrapeProgressReporter,
    options: &ScrapeOptions,
    output: &Path,
) -> Result<ScrapeReport> {
    let (documents, mut report) = scrape_breeds(fetcher, limiter, progress, options).await?;

    if documents.is_empty() {
        tracing::warn!(path = %output.display(), "no documents accepted; output not written");
        return Ok(report);
    }

    store::save_documents(output, &documents)?;
    report.output = Some(output.to_path_buf());
    Ok(report)
}

/// CLI overrides for `scout scrape`.
#[derive(Debug, Clone, Default)]
pub struct ScrapeOverrides {
    pub max_breeds: Option<usize>,
    pub output: Option<PathBuf>,
    pub listing_url: Option<String>,
    pub delay_ms: Option<u64>,
}

/// Entry point for `scout scrape`: build the HTTP stack from config, run,
/// and print the summary.
pub async fn run_scrape(
    config: &Config,
    overrides: ScrapeOverrides,
    progress_mode: ProgressMode,
) -> Result<ScrapeReport> {
    let mut options = ScrapeOptions::from_config(&config.scrape);
    if let Some(max) = overrides.max_breeds {
        if max == 0 {
            anyhow::bail!("--max-breeds must be >= 1");
        }
        options.max_breeds = max;
    }
    if let Some(url) = overrides.listing_url {
        options.listing_url = url;
    }
    let output = overrides.output.unwrap_or_else(|| config.store.path.clone());
    let delay_ms = overrides.delay_ms.unwrap_or(config.scrape.delay_ms);

    let fetcher = HttpFetcher::from_config(&config.scrape)?;
    let mut limiter = rate_limit::from_delay_ms(delay_ms);
    let reporter = progress_mode.reporter();

    let report = scrape_and_save(
        &fetcher,
        limiter.as_mut(),
        reporter.as_ref(),
        &options,
        &output,
    )
    .await?;

    print_report(&report, &output, options.max_breeds);
    Ok(report)
}

fn print_report(report: &ScrapeReport, output: &Path, max_breeds: usize) {
    println!("scrape {}", report.listing_url);
    println!("  found: {}", report.found);
    println!("  visited: {}", report.visited);
    println!("  accepted: {}", report.accepted);
    println!("  skipped: {}", report.skipped.len());
    for skip in &report.skipped {
        println!("    - {}: {}", skip.url, skip.reason);
    }
    if report.truncated > 0 {
        println!(
            "  not visited: {} (limited to {}; raise --max-breeds to scrape more)",
            report.truncated, max_breeds
        );
    }
    match &report.output {
        Some(path) => {
            println!("  output: {}", path.display());
            println!("ok");
        }
        None => {
            println!(
                "  output: none (no documents accepted; {} left unchanged)",
                output.display()
            );
            println!("warning: scrape produced no documents");
        }
    }
}
