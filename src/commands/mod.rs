mod extract;
mod init;
mod resolve;

pub use extract::extract_artifacts;
pub use init::init_config;
pub use resolve::resolve_dump;

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::Path;
use wikiredirects::artifacts::ArtifactCounts;
use wikiredirects::config::Config;
use wikiredirects::import::{DumpFormat, DumpStats, WikimediaSource};
use wikiredirects::redirects::ResolveStats;

/// Contents of `stats.json`
#[derive(Debug, Serialize)]
struct RunStats<'a> {
    dump: &'a str,
    records: &'a DumpStats,
    resolution: &'a ResolveStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    artifacts: Option<&'a ArtifactCounts>,
}

/// Open a dump with the configured namespace filter and base URL
fn open_dump(config: &Config, path: &Path) -> Result<WikimediaSource> {
    if !path.exists() {
        anyhow::bail!("Dump file not found: {}", path.display());
    }

    let Some(format) = DumpFormat::detect(path) else {
        anyhow::bail!(
            "Could not detect dump format for: {} (expected .xml or .xml.bz2)",
            path.display()
        );
    };
    tracing::debug!("Dump format: {:?}", format);

    let mut source = WikimediaSource::open(path)
        .with_context(|| format!("Failed to open dump: {}", path.display()))?
        .with_namespaces(&config.import.allowed_namespaces);

    if let Some(ref base_url) = config.import.base_url {
        source = source.with_base_url(base_url.clone());
    }

    Ok(source)
}

fn write_stats(config: &Config, stats: &RunStats<'_>) -> Result<()> {
    let path = config.output.stats_path();
    let json = serde_json::to_string_pretty(stats)?;
    std::fs::write(&path, json)
        .with_context(|| format!("Failed to write stats: {}", path.display()))
}
