//! Data-source overview for `scout status`.
//!
//! Shows which collection a search or ask would use right now: the scraped
//! file (with size, age, and document count) or the built-in breeds.

use anyhow::Result;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;

use crate::config::Config;
use crate::fallback;
use crate::models::MIN_CONTENT_CHARS;
use crate::search::{DataSource, Retriever};

/// Snapshot of the breed data a query would see.
#[derive(Debug, Clone)]
pub struct StoreStatus {
    pub path: PathBuf,
    pub source: DataSource,
    pub documents: usize,
    /// Loaded documents at or below the content threshold (hand edits).
    pub thin_documents: usize,
    pub file_size: Option<u64>,
    pub modified: Option<i64>,
    pub sources: Vec<(String, usize)>,
}

pub fn collect_status(path: &Path) -> StoreStatus {
    let retriever = Retriever::load(path, fallback::BUILTIN_BREEDS);
    let meta = std::fs::metadata(path).ok();

    let mut sources: Vec<(String, usize)> = Vec::new();
    for doc in retriever.documents() {
        match sources.iter_mut().find(|(s, _)| *s == doc.source) {
            Some((_, n)) => *n += 1,
            None => sources.push((doc.source.clone(), 1)),
        }
    }

    StoreStatus {
        path: path.to_path_buf(),
        source: retriever.source().clone(),
        documents: retriever.len(),
        thin_documents: retriever
            .documents()
            .iter()
            .filter(|d| !d.has_sufficient_content())
            .count(),
        file_size: meta.as_ref().map(|m| m.len()),
        modified: meta
            .and_then(|m| m.modified().ok())
            .and_then(|t| t.duration_since(UNIX_EPOCH).ok())
            .map(|d| d.as_secs() as i64),
        sources,
    }
}

/// Entry point for `scout status`.
pub fn run_status(config: &Config, data: Option<PathBuf>) -> Result<()> {
    let path = data.unwrap_or_else(|| config.store.path.clone());
    let status = collect_status(&path);

    println!("Breed Scout: Data Status");
    println!("========================");
    println!();
    println!("  Data file:   {}", status.path.display());
    match status.file_size {
        Some(size) => println!("  Size:        {}", format_bytes(size)),
        None => println!("  Size:        (missing)"),
    }
    if let Some(ts) = status.modified {
        println!(
            "  Modified:    {} ({})",
            format_ts_relative(ts),
            format_ts_iso(ts)
        );
    }
    println!();
    match &status.source {
        DataSource::File(_) => println!("  Source:      scraped file"),
        DataSource::Fallback => println!("  Source:      built-in breeds (fallback)"),
        DataSource::Memory => println!("  Source:      in-memory documents"),
    }
    println!("  Documents:   {}", status.documents);
    if status.thin_documents > 0 {
        println!(
            "  Thin:        {} (≤ {} chars of content)",
            status.thin_documents, MIN_CONTENT_CHARS
        );
    }

    if !status.sources.is_empty() {
        println!();
        println!("  By source:");
        for (source, count) in &status.sources {
            println!("    {:<28} {:>5}", source, count);
        }
    }
    println!();
    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{} B", bytes)
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}

/// Format a Unix timestamp as a relative time string (e.g. "3 hours ago").
fn format_ts_relative(ts: i64) -> String {
    let delta = chrono::Utc::now().timestamp() - ts;

    if delta < 0 {
        return format_ts_iso(ts);
    }

    if delta < 60 {
        "just now".to_string()
    } else if delta < 3600 {
        let mins = delta / 60;
        format!("{} min{} ago", mins, if mins == 1 { "" } else { "s" })
    } else if delta < 86400 {
        let hours = delta / 3600;
        format!("{} hour{} ago", hours, if hours == 1 { "" } else { "s" })
    } else {
        let days = delta / 86400;
        format!("{} day{} ago", days, if days == 1 { "" } else { "s" })
    }
}

fn format_ts_iso(ts: i64) -> String {
    chrono::DateTime::from_timestamp(ts, 0)
        .map(|dt| dt.format("%Y-%m-%d %H:%M UTC").to_string())
        .unwrap_or_else(|| ts.to_string())
}
