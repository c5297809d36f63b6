//! Redirect resolution configuration

use crate::redirects::DEFAULT_MAX_DEPTH;
use serde::{Deserialize, Serialize};

/// Redirect resolution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResolveConfig {
    /// Maximum redirect hops followed from one source
    #[serde(default = "default_max_depth")]
    pub max_depth: usize,
    /// Number of edge partitions (None = one per worker thread)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub partitions: Option<usize>,
    /// Worker threads (None = one per core)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub threads: Option<usize>,
}

fn default_max_depth() -> usize {
    DEFAULT_MAX_DEPTH
}

impl Default for ResolveConfig {
    fn default() -> Self {
        Self {
            max_depth: DEFAULT_MAX_DEPTH,
            partitions: None,
            threads: None,
        }
    }
}

impl ResolveConfig {
    /// Partition count to use for this run
    pub fn effective_partitions(&self) -> usize {
        self.partitions
            .or(self.threads)
            .unwrap_or_else(rayon::current_num_threads)
            .max(1)
    }
}
