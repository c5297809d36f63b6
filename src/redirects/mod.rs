//! Redirect resolution engine
//!
//! Turns `source -> target` redirect edges into `source -> canonical` pairs,
//! where the canonical title is the end of the redirect chain.
//!
//! # Architecture
//!
//! ```text
//!   partition 0     partition 1     ...     partition N
//!        │               │                       │
//!        ▼               ▼                       ▼
//!   local map       local map               local map      (parallel)
//!        └───────────────┼───────────────────────┘
//!                        ▼
//!              merge in partition order
//!                        ▼
//!            Arc<RedirectIndex> (frozen)                  (barrier)
//!        ┌───────────────┼───────────────────────┐
//!        ▼               ▼                       ▼
//!   chain walks     chain walks             chain walks    (parallel)
//!        └───────────────┼───────────────────────┘
//!                        ▼
//!         ResolutionMaps { forward, reverse }
//! ```
//!
//! The index is only ever read once built, so the resolution phase needs no
//! locks. Malformed edges are dropped, cycles and over-long chains are
//! resolved by policy (see [`ChainResolver::resolve`]); the only fatal error
//! is an index that cannot be built.

pub mod edges;
pub mod emitter;
pub mod index;
pub mod resolver;

pub use edges::{edge_from_record, extract_edges, partition_edges, validate_edge};
pub use emitter::{AliasGroup, ResolutionMaps};
pub use index::{EdgeOrigin, IndexBuildStats, RedirectIndex, RedirectIndexBuilder};
pub use resolver::{
    ChainOutcome, ChainResolution, ChainResolver, PartitionResolution, DEFAULT_MAX_DEPTH,
};

use crate::config::ResolveConfig;
use crate::types::{RedirectEdge, ResolvedEdge};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::time::Instant;
use thiserror::Error;
use tracing::info;

/// Errors raised by redirect resolution
#[derive(Debug, Error)]
pub enum RedirectError {
    /// Edge with an empty source or target. Recovered by dropping the edge.
    #[error("Malformed redirect edge: {0}")]
    MalformedEdge(String),

    /// The shared index could not be built or handed to the workers
    #[error("Redirect index unavailable: {0}")]
    IndexUnavailable(String),
}

/// Counters for a resolution run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolveStats {
    /// Number of edge partitions
    pub partitions: usize,
    /// Distinct redirect sources in the index
    pub index_sources: usize,
    /// Index construction counters
    pub index: IndexBuildStats,
    /// Edges skipped because a later duplicate owns their source
    pub superseded_edges: usize,
    /// Chains ending at a non-redirect title
    pub terminal: usize,
    /// Chains stopped by cycle detection
    pub cycles: usize,
    /// Chains stopped by the depth bound
    pub depth_bounded: usize,
}

impl ResolveStats {
    /// Count one chain outcome
    pub fn record(&mut self, outcome: ChainOutcome) {
        match outcome {
            ChainOutcome::Terminal => self.terminal += 1,
            ChainOutcome::Cycle => self.cycles += 1,
            ChainOutcome::DepthBound => self.depth_bounded += 1,
        }
    }

    /// Fold partition-level counters into this one
    pub fn merge(&mut self, other: &ResolveStats) {
        self.superseded_edges += other.superseded_edges;
        self.terminal += other.terminal;
        self.cycles += other.cycles;
        self.depth_bounded += other.depth_bounded;
    }

    /// Total resolved sources
    pub fn resolved(&self) -> usize {
        self.terminal + self.cycles + self.depth_bounded
    }
}

/// Output of a resolution run
#[derive(Debug, Clone, Default)]
pub struct Resolution {
    pub maps: ResolutionMaps,
    pub stats: ResolveStats,
}

/// Runs index construction and parallel resolution on a dedicated worker pool
#[derive(Debug, Clone)]
pub struct RedirectPipeline {
    max_depth: usize,
    threads: Option<usize>,
}

impl Default for RedirectPipeline {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            threads: None,
        }
    }
}

impl RedirectPipeline {
    pub fn new(config: &ResolveConfig) -> Self {
        Self {
            max_depth: config.max_depth,
            threads: config.threads,
        }
    }

    /// Set the maximum number of hops followed per chain
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Set the worker thread count (None = one per core)
    pub fn with_threads(mut self, threads: Option<usize>) -> Self {
        self.threads = threads;
        self
    }

    /// Resolve partitions handed over by an upstream collaborator.
    ///
    /// Any partition that failed to materialize makes the index incomplete, so
    /// the whole run fails with [`RedirectError::IndexUnavailable`].
    pub fn resolve_partitions<E: Display>(
        &self,
        partitions: Vec<Result<Vec<RedirectEdge>, E>>,
    ) -> Result<Resolution, RedirectError> {
        let partitions = partitions
            .into_iter()
            .enumerate()
            .map(|(i, partition)| {
                partition.map_err(|e| {
                    RedirectError::IndexUnavailable(format!("partition {} failed: {}", i, e))
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        self.resolve(&partitions)
    }

    /// Build the index from every partition, then resolve each partition in parallel
    pub fn resolve(&self, partitions: &[Vec<RedirectEdge>]) -> Result<Resolution, RedirectError> {
        let start = Instant::now();

        let mut builder = rayon::ThreadPoolBuilder::new();
        if let Some(threads) = self.threads {
            builder = builder.num_threads(threads);
        }
        let pool = builder.build().map_err(|e| {
            RedirectError::IndexUnavailable(format!("failed to start worker pool: {}", e))
        })?;

        let (outputs, index_stats, index_sources) = pool.install(|| {
            let (index, index_stats) = RedirectIndexBuilder::new().build(partitions);
            let index_sources = index.len();
            info!(
                "Redirect index ready: {} sources, {} malformed edges dropped",
                index_sources, index_stats.malformed_edges
            );

            let resolver = ChainResolver::new(index, self.max_depth);
            let outputs: Vec<PartitionResolution> = partitions
                .par_iter()
                .enumerate()
                .map(|(partition, edges)| resolver.resolve_partition(partition, edges))
                .collect();

            (outputs, index_stats, index_sources)
        });

        let mut stats = ResolveStats {
            partitions: partitions.len(),
            index_sources,
            index: index_stats,
            ..Default::default()
        };

        let mut resolved: Vec<ResolvedEdge> = Vec::with_capacity(index_sources);
        for output in outputs {
            stats.merge(&output.stats);
            resolved.extend(output.resolved);
        }

        let maps = ResolutionMaps::from_resolved(resolved);

        info!(
            "Resolved {} redirects in {:.2}s ({} cycles, {} depth-bounded)",
            maps.len(),
            start.elapsed().as_secs_f64(),
            stats.cycles,
            stats.depth_bounded
        );

        Ok(Resolution { maps, stats })
    }
}

/// Resolve a flat list of edges with default settings.
///
/// Edges are split into one partition per available core.
pub fn resolve_redirects(edges: Vec<RedirectEdge>) -> Result<ResolutionMaps, RedirectError> {
    let partitions = partition_edges(edges, rayon::current_num_threads());
    RedirectPipeline::default()
        .resolve(&partitions)
        .map(|resolution| resolution.maps)
}
