//! Cycle-safe chain walking over a shared redirect index

use super::index::{EdgeOrigin, RedirectIndex};
use super::ResolveStats;
use crate::types::{RedirectEdge, ResolvedEdge, Title};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::debug;

/// Default maximum number of redirect hops followed from one source
pub const DEFAULT_MAX_DEPTH: usize = 100;

/// How a chain walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChainOutcome {
    /// Reached a title that is not itself a redirect source
    Terminal,
    /// The next hop would revisit a title already on the chain
    Cycle,
    /// Stopped after the maximum number of hops
    DepthBound,
}

/// Result of walking one redirect chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainResolution {
    /// Title the walk settled on
    pub canonical: Title,
    pub outcome: ChainOutcome,
    /// Number of hops taken
    pub steps: usize,
}

/// Edges resolved by one partition worker
#[derive(Debug, Clone, Default)]
pub struct PartitionResolution {
    pub partition: usize,
    pub resolved: Vec<ResolvedEdge>,
    pub stats: ResolveStats,
}

/// Resolves redirect sources to their end-of-chain targets.
///
/// Cloning is cheap; every clone shares the same frozen index.
#[derive(Debug, Clone)]
pub struct ChainResolver {
    index: Arc<RedirectIndex>,
    max_depth: usize,
}

impl ChainResolver {
    pub fn new(index: Arc<RedirectIndex>, max_depth: usize) -> Self {
        Self { index, max_depth }
    }

    /// Walk the chain starting at `source`.
    ///
    /// A title with no index entry resolves to itself. On a cycle the last
    /// title before re-entering the visited set is returned; past
    /// `max_depth` hops the title reached at the bound is returned.
    pub fn resolve(&self, source: &str) -> ChainResolution {
        let mut visited: HashSet<&str> = HashSet::new();
        visited.insert(source);

        let mut current = source;
        let mut steps = 0;

        while let Some(next) = self.index.target(current) {
            if steps >= self.max_depth {
                debug!(
                    "Redirect chain from '{}' exceeded {} hops, stopping at '{}'",
                    source, self.max_depth, current
                );
                return ChainResolution {
                    canonical: current.to_string(),
                    outcome: ChainOutcome::DepthBound,
                    steps,
                };
            }

            if !visited.insert(next) {
                debug!(
                    "Redirect cycle from '{}' re-enters at '{}', stopping at '{}'",
                    source, next, current
                );
                return ChainResolution {
                    canonical: current.to_string(),
                    outcome: ChainOutcome::Cycle,
                    steps,
                };
            }

            current = next;
            steps += 1;
        }

        ChainResolution {
            canonical: current.to_string(),
            outcome: ChainOutcome::Terminal,
            steps,
        }
    }

    /// Resolve every edge of one partition that owns its index slot.
    ///
    /// Malformed edges and edges superseded by a later duplicate are skipped,
    /// which leaves exactly one resolved edge per index source across all
    /// partitions.
    pub fn resolve_partition(
        &self,
        partition: usize,
        edges: &[RedirectEdge],
    ) -> PartitionResolution {
        let mut result = PartitionResolution {
            partition,
            resolved: Vec::with_capacity(edges.len()),
            stats: ResolveStats::default(),
        };

        for (offset, edge) in edges.iter().enumerate() {
            if edge.is_malformed() {
                continue;
            }

            if self.index.origin(&edge.source) != Some(EdgeOrigin { partition, offset }) {
                result.stats.superseded_edges += 1;
                continue;
            }

            let resolution = self.resolve(&edge.source);
            result.stats.record(resolution.outcome);
            result
                .resolved
                .push(ResolvedEdge::new(edge.source.clone(), resolution.canonical));
        }

        result
    }
}
