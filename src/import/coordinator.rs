//! Drives passes over a record source

use super::progress::{DumpProgress, DumpStats};
use super::source::{ImportError, RecordSource};
use crate::config::ImportConfig;
use crate::redirects::{edge_from_record, partition_edges};
use crate::types::{ArticleRecord, RedirectEdge};
use tracing::{info, warn};

/// Outcome of one pass over a source
#[derive(Debug)]
pub struct DumpPass {
    pub stats: DumpStats,
    /// Read error that ended the pass early, if any
    pub error: Option<ImportError>,
}

impl DumpPass {
    /// Turn an early-terminated pass into an error
    pub fn into_result(self) -> Result<DumpStats, ImportError> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.stats),
        }
    }
}

/// Redirect edges gathered from a source
#[derive(Debug)]
pub struct EdgeCollection {
    /// Edges in source order
    pub edges: Vec<RedirectEdge>,
    pub pass: DumpPass,
}

impl EdgeCollection {
    /// Split the edges into partitions for parallel resolution.
    ///
    /// When the pass ended on a read error, a failed partition is appended so
    /// that resolution refuses to build an index from an incomplete edge set.
    pub fn into_partitions(
        self,
        partitions: usize,
    ) -> Vec<Result<Vec<RedirectEdge>, ImportError>> {
        let mut result: Vec<Result<Vec<RedirectEdge>, ImportError>> =
            partition_edges(self.edges, partitions)
                .into_iter()
                .map(Ok)
                .collect();

        if let Some(e) = self.pass.error {
            result.push(Err(e));
        }

        result
    }
}

/// Reads records out of a source, applying the import limits
pub struct ImportCoordinator {
    config: ImportConfig,
    quiet: bool,
}

impl ImportCoordinator {
    pub fn new(config: ImportConfig) -> Self {
        Self {
            config,
            quiet: false,
        }
    }

    /// Set quiet mode (no progress output)
    pub fn with_quiet(mut self, quiet: bool) -> Self {
        self.quiet = quiet;
        self
    }

    /// Visit every record of the source in order.
    ///
    /// The pass stops at `max_records` or at the first read error.
    pub fn for_each_record<S, F>(&self, source: &mut S, mut visit: F) -> DumpPass
    where
        S: RecordSource + ?Sized,
        F: FnMut(ArticleRecord),
    {
        let source_name = source.source_name().to_string();
        info!("Reading records from: {}", source_name);

        let progress = DumpProgress::new(&source_name, source.record_count_hint(), self.quiet);
        let mut error = None;
        let mut count = 0usize;

        for record in source.iter_records() {
            if let Some(max) = self.config.max_records {
                if count >= max {
                    info!("Reached max records limit: {}", max);
                    break;
                }
            }

            match record {
                Ok(record) => {
                    progress.record_read(&record);
                    count += 1;
                    visit(record);
                }
                Err(e) => {
                    warn!("Error reading {}: {}", source_name, e);
                    progress.record_error();
                    error = Some(e);
                    break;
                }
            }
        }

        progress.finish();
        let stats = progress.stats();
        info!(
            "Read {} records ({} articles, {} redirects) in {:.1}s",
            stats.records, stats.articles, stats.redirects, stats.elapsed_seconds
        );

        DumpPass { stats, error }
    }

    /// Gather every redirect edge of the source
    pub fn collect_edges<S>(&self, source: &mut S) -> EdgeCollection
    where
        S: RecordSource + ?Sized,
    {
        let mut edges = Vec::new();
        let pass = self.for_each_record(source, |record| {
            if let Some(edge) = edge_from_record(&record) {
                edges.push(edge);
            }
        });

        EdgeCollection { edges, pass }
    }
}
