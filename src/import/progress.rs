//! Progress tracking for dump passes

use crate::types::{ArticleRecord, RecordType};
use indicatif::{ProgressBar, ProgressStyle};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Counters for one pass over a dump
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DumpStats {
    /// Records read
    pub records: usize,
    /// Article records
    pub articles: usize,
    /// Redirect records
    pub redirects: usize,
    /// Records from other namespaces
    pub other: usize,
    /// Records that could not be read
    pub errors: usize,
    /// Wikitext bytes read
    pub bytes: u64,
    /// Wall time in seconds
    pub elapsed_seconds: f64,
    /// Records per second
    pub records_per_second: f64,
}

/// Progress tracker for a dump pass
pub struct DumpProgress {
    /// Progress bar (None in quiet mode)
    progress_bar: Option<ProgressBar>,
    start_time: Instant,
    records: AtomicUsize,
    articles: AtomicUsize,
    redirects: AtomicUsize,
    other: AtomicUsize,
    errors: AtomicUsize,
    bytes: AtomicU64,
}

impl DumpProgress {
    /// Create a new progress tracker
    pub fn new(label: &str, total_expected: Option<u64>, quiet: bool) -> Self {
        let progress_bar = if !quiet {
            let pb = match total_expected {
                Some(total) => ProgressBar::new(total),
                None => ProgressBar::new_spinner(),
            };

            pb.set_style(
                ProgressStyle::default_bar()
                    .template("{spinner:.green} [{elapsed_precise}] {prefix} {pos} records {msg}")
                    .unwrap_or_else(|_| ProgressStyle::default_bar()),
            );
            pb.set_prefix(label.to_string());
            pb.enable_steady_tick(Duration::from_millis(200));

            Some(pb)
        } else {
            None
        };

        Self {
            progress_bar,
            start_time: Instant::now(),
            records: AtomicUsize::new(0),
            articles: AtomicUsize::new(0),
            redirects: AtomicUsize::new(0),
            other: AtomicUsize::new(0),
            errors: AtomicUsize::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    /// Count a record that was read successfully
    pub fn record_read(&self, record: &ArticleRecord) {
        let read = self.records.fetch_add(1, Ordering::Relaxed) + 1;

        let counter = match record.record_type {
            RecordType::Article => &self.articles,
            RecordType::Redirect => &self.redirects,
            RecordType::Other => &self.other,
        };
        counter.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(record.text.len() as u64, Ordering::Relaxed);

        if let Some(ref pb) = self.progress_bar {
            pb.set_position(read as u64);

            if read % 1000 == 0 {
                // Truncate safely for UTF-8
                let display_title = if record.title.chars().count() > 30 {
                    let truncated: String = record.title.chars().take(27).collect();
                    format!("{}...", truncated)
                } else {
                    record.title.clone()
                };
                pb.set_message(format!("| {}", display_title));
            }
        }
    }

    /// Count a record that failed to read
    pub fn record_error(&self) {
        self.errors.fetch_add(1, Ordering::Relaxed);
    }

    /// Current statistics
    pub fn stats(&self) -> DumpStats {
        let elapsed = self.start_time.elapsed().as_secs_f64();
        let records = self.records.load(Ordering::Relaxed);

        DumpStats {
            records,
            articles: self.articles.load(Ordering::Relaxed),
            redirects: self.redirects.load(Ordering::Relaxed),
            other: self.other.load(Ordering::Relaxed),
            errors: self.errors.load(Ordering::Relaxed),
            bytes: self.bytes.load(Ordering::Relaxed),
            elapsed_seconds: elapsed,
            records_per_second: if elapsed > 0.0 {
                records as f64 / elapsed
            } else {
                0.0
            },
        }
    }

    /// Finish the progress bar
    pub fn finish(&self) {
        if let Some(ref pb) = self.progress_bar {
            let stats = self.stats();
            pb.finish_with_message(format!(
                "done: {} articles, {} redirects, {} errors, {:.1} records/s",
                stats.articles, stats.redirects, stats.errors, stats.records_per_second
            ));
        }
    }
}
