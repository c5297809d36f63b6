//! Dump import configuration

use serde::{Deserialize, Serialize};

/// Dump import configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Namespace allowlist (empty = all namespaces)
    #[serde(default = "default_namespaces")]
    pub allowed_namespaces: Vec<i32>,
    /// Base URL for article URIs (detected from the dump file name when unset)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Articles whose plain text is shorter than this are not emitted as text
    #[serde(default = "default_min_text_length")]
    pub min_text_length: usize,
    /// Stop after this many records (None = whole dump)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_records: Option<usize>,
}

fn default_namespaces() -> Vec<i32> {
    vec![0]
}

fn default_min_text_length() -> usize {
    50
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            allowed_namespaces: default_namespaces(),
            base_url: None,
            min_text_length: default_min_text_length(),
            max_records: None,
        }
    }
}
