//! Scrape progress reporting.
//!
//! Reports observable progress during `scout scrape` so users see which page
//! is being fetched and how many remain. Progress is emitted on **stderr** so
//! stdout stays reserved for the final summary.

use std::io::Write;

/// A single progress event for a scrape run.
#[derive(Clone, Debug)]
pub enum ScrapeProgressEvent {
    /// Fetching the listing page. Total unknown.
    Listing { url: String },
    /// Fetching breed page `n` of `total`.
    Page { n: u64, total: u64, url: String },
    /// A page finished; `accepted` tells whether it produced a document.
    PageDone { url: String, accepted: bool },
}

/// Reports scrape progress. Implementations write to stderr (human or JSON).
pub trait ScrapeProgressReporter: Send + Sync {
    fn report(&self, event: ScrapeProgressEvent);
}

/// Human-friendly progress on stderr: "scrape  [3 / 30]  https://...".
pub struct StderrProgress;

impl ScrapeProgressReporter for StderrProgress {
    fn report(&self, event: ScrapeProgressEvent) {
        let line = match &event {
            ScrapeProgressEvent::Listing { url } => {
                format!("scrape  fetching listing {}\n", url)
            }
            ScrapeProgressEvent::Page { n, total, url } => {
                format!(
                    "scrape  [{} / {}]  {}\n",
                    format_number(*n),
                    format_number(*total),
                    url
                )
            }
            ScrapeProgressEvent::PageDone { accepted, .. } => {
                if *accepted {
                    "        added\n".to_string()
                } else {
                    "        skipped\n".to_string()
                }
            }
        };
        let _ = std::io::stderr().lock().write_all(line.as_bytes());
        let _ = std::io::stderr().lock().flush();
    }
}

/// Machine-readable progress: one JSON object per line on stderr.
pub struct JsonProgress;

impl ScrapeProgressReporter for JsonProgress {
    fn report(&self, event: ScrapeProgressEvent) {
        let obj = match &event {
            ScrapeProgressEvent::Listing { url } => serde_json::json!({
                "event": "progress",
                "phase": "listing",
                "url": url
            }),
            ScrapeProgressEvent::Page { n, total, url } => serde_json::json!({
                "event": "progress",
                "phase": "page",
                "n": n,
                "total": total,
                "url": url
            }),
            ScrapeProgressEvent::PageDone { url, accepted } => serde_json::json!({
                "event": "page_done",
                "url": url,
                "accepted": accepted
            }),
        };
        if let Ok(line) = serde_json::to_string(&obj) {
            let _ = writeln!(std::io::stderr().lock(), "{}", line);
            let _ = std::io::stderr().lock().flush();
        }
    }
}

/// No-op reporter when progress is disabled.
pub struct NoProgress;

impl ScrapeProgressReporter for NoProgress {
    fn report(&self, _event: ScrapeProgressEvent) {}
}

fn format_number(n: u64) -> String {
    let s = n.to_string();
    let mut result = String::with_capacity(s.len() + (s.len() - 1) / 3);
    let chars: Vec<char> = s.chars().rev().collect();
    for (i, c) in chars.iter().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(',');
        }
        result.push(*c);
    }
    result.chars().rev().collect()
}

/// Progress mode for the CLI: off, human (stderr), or JSON (stderr).
#[derive(Clone, Copy, Debug, Eq, PartialEq, clap::ValueEnum)]
pub enum ProgressMode {
    Off,
    Human,
    Json,
}

impl ProgressMode {
    /// Default: human progress when stderr is a TTY, otherwise off.
    pub fn default_for_tty() -> Self {
        if atty::is(atty::Stream::Stderr) {
            ProgressMode::Human
        } else {
            ProgressMode::Off
        }
    }

    pub fn reporter(&self) -> Box<dyn ScrapeProgressReporter> {
        match self {
            ProgressMode::Off => Box::new(NoProgress),
            ProgressMode::Human => Box::new(StderrProgress),
            ProgressMode::Json => Box::new(JsonProgress),
        }
    }
}
