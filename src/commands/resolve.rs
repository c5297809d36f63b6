use super::{open_dump, write_stats, RunStats};
use anyhow::{Context, Result};
use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use tracing::info;
use wikiredirects::config::Config;
use wikiredirects::import::{DumpStats, ImportCoordinator};
use wikiredirects::redirects::{RedirectPipeline, Resolution};

/// Resolve every redirect of a dump and write the forward and reverse maps
pub fn resolve_dump(config: Config, dump: PathBuf, quiet: bool) -> Result<()> {
    let (resolution, records) = resolve_from_dump(&config, &dump, quiet)?;

    write_maps(&config, &resolution)?;
    write_stats(
        &config,
        &RunStats {
            dump: &dump.to_string_lossy(),
            records: &records,
            resolution: &resolution.stats,
            artifacts: None,
        },
    )?;

    if !quiet {
        println!(
            "Resolved {} redirects onto {} articles ({} cycles, {} depth-bounded)",
            resolution.maps.len(),
            resolution.maps.reverse.len(),
            resolution.stats.cycles,
            resolution.stats.depth_bounded
        );
        println!("Output written to {}", config.output.dir.display());
    }

    Ok(())
}

/// First pass over a dump: gather redirect edges and resolve them
pub(super) fn resolve_from_dump(
    config: &Config,
    dump: &Path,
    quiet: bool,
) -> Result<(Resolution, DumpStats)> {
    let mut source = open_dump(config, dump)?;
    let coordinator = ImportCoordinator::new(config.import.clone()).with_quiet(quiet);

    let collection = coordinator.collect_edges(&mut source);
    let records = collection.pass.stats.clone();
    info!("Collected {} redirect edges", collection.edges.len());

    let partitions = collection.into_partitions(config.resolve.effective_partitions());
    let resolution = RedirectPipeline::new(&config.resolve)
        .resolve_partitions(partitions)
        .with_context(|| format!("Failed to resolve redirects of {}", dump.display()))?;

    Ok((resolution, records))
}

pub(super) fn write_maps(config: &Config, resolution: &Resolution) -> Result<()> {
    let output = &config.output;
    std::fs::create_dir_all(&output.dir)
        .with_context(|| format!("Failed to create output directory: {}", output.dir.display()))?;

    let forward = output.forward_path();
    let file = File::create(&forward)
        .with_context(|| format!("Failed to create {}", forward.display()))?;
    resolution.maps.write_forward_tsv(BufWriter::new(file))?;

    let reverse = output.reverse_path();
    let file = File::create(&reverse)
        .with_context(|| format!("Failed to create {}", reverse.display()))?;
    resolution.maps.write_reverse_jsonl(BufWriter::new(file))?;

    info!("Wrote {} and {}", forward.display(), reverse.display());
    Ok(())
}
