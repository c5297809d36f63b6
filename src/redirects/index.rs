//! Read-only redirect index built once from every edge partition

use super::edges::validate_edge;
use crate::types::{RedirectEdge, Title};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::debug;

/// Where the edge that won an index slot came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeOrigin {
    pub partition: usize,
    pub offset: usize,
}

#[derive(Debug, Clone)]
struct IndexEntry {
    target: Title,
    origin: EdgeOrigin,
}

/// Mapping from every redirect source to its immediate target.
///
/// There is no way to mutate an index after [`RedirectIndexBuilder::build`]
/// returns it, so it can be shared across workers without locking.
#[derive(Debug, Default)]
pub struct RedirectIndex {
    entries: HashMap<Title, IndexEntry>,
}

impl RedirectIndex {
    /// Immediate target of `source`, if it is a redirect source
    pub fn target(&self, source: &str) -> Option<&str> {
        self.entries.get(source).map(|e| e.target.as_str())
    }

    /// Origin of the edge that owns the entry for `source`
    pub fn origin(&self, source: &str) -> Option<EdgeOrigin> {
        self.entries.get(source).map(|e| e.origin)
    }

    pub fn contains(&self, source: &str) -> bool {
        self.entries.contains_key(source)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Counters gathered while building the index
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexBuildStats {
    /// Edges offered to the builder
    pub edges_seen: usize,
    /// Edges dropped for an empty source or target
    pub malformed_edges: usize,
    /// Edges whose source had already been seen
    pub duplicate_sources: usize,
    /// Duplicates that pointed somewhere different than the edge they replaced
    pub conflicting_duplicates: usize,
}

impl IndexBuildStats {
    fn merge(&mut self, other: &IndexBuildStats) {
        self.edges_seen += other.edges_seen;
        self.malformed_edges += other.malformed_edges;
        self.duplicate_sources += other.duplicate_sources;
        self.conflicting_duplicates += other.conflicting_duplicates;
    }

    fn record_replacement(&mut self, source: &str, previous: &IndexEntry, next: &IndexEntry) {
        self.duplicate_sources += 1;
        if previous.target != next.target {
            self.conflicting_duplicates += 1;
            debug!(
                "Redirect '{}' points to both '{}' and '{}', keeping '{}'",
                source, previous.target, next.target, next.target
            );
        }
    }
}

/// Partition-local aggregation result
#[derive(Default)]
struct LocalMap {
    entries: HashMap<Title, IndexEntry>,
    stats: IndexBuildStats,
}

/// Builds a [`RedirectIndex`] from partitioned edges.
///
/// Partitions are aggregated into local maps in parallel, then merged in
/// partition order. Later edges overwrite earlier ones: by offset inside a
/// partition, by partition index across partitions.
#[derive(Debug, Default, Clone, Copy)]
pub struct RedirectIndexBuilder;

impl RedirectIndexBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build the frozen index. Runs on the current rayon pool.
    pub fn build(&self, partitions: &[Vec<RedirectEdge>]) -> (Arc<RedirectIndex>, IndexBuildStats) {
        let locals: Vec<LocalMap> = partitions
            .par_iter()
            .enumerate()
            .map(|(partition, edges)| Self::aggregate_partition(partition, edges))
            .collect();

        let capacity = locals.iter().map(|l| l.entries.len()).sum();
        let mut entries: HashMap<Title, IndexEntry> = HashMap::with_capacity(capacity);
        let mut stats = IndexBuildStats::default();

        for local in locals {
            stats.merge(&local.stats);
            for (source, entry) in local.entries {
                if let Some(previous) = entries.get(&source) {
                    stats.record_replacement(&source, previous, &entry);
                }
                entries.insert(source, entry);
            }
        }

        debug!(
            "Built redirect index with {} sources from {} partitions",
            entries.len(),
            partitions.len()
        );

        (Arc::new(RedirectIndex { entries }), stats)
    }

    fn aggregate_partition(partition: usize, edges: &[RedirectEdge]) -> LocalMap {
        let mut local = LocalMap::default();

        for (offset, edge) in edges.iter().enumerate() {
            local.stats.edges_seen += 1;

            let edge = match validate_edge(edge) {
                Ok(edge) => edge,
                Err(e) => {
                    debug!("Skipping edge in partition {}: {}", partition, e);
                    local.stats.malformed_edges += 1;
                    continue;
                }
            };

            let entry = IndexEntry {
                target: edge.target.clone(),
                origin: EdgeOrigin { partition, offset },
            };

            if let Some(previous) = local.entries.get(&edge.source) {
                local.stats.record_replacement(&edge.source, previous, &entry);
            }
            local.entries.insert(edge.source.clone(), entry);
        }

        local
    }
}
