use super::resolve::{resolve_from_dump, write_maps};
use super::{open_dump, write_stats, RunStats};
use anyhow::{Context, Result};
use std::path::PathBuf;
use tracing::info;
use wikiredirects::artifacts::{ArtifactExtractor, ArtifactWriter};
use wikiredirects::config::Config;
use wikiredirects::import::ImportCoordinator;

/// Extract article text, paragraph links and surface forms from a dump.
///
/// Redirects are resolved in a first pass so that the second pass can rewrite
/// every link to its canonical target.
pub fn extract_artifacts(config: Config, dump: PathBuf, quiet: bool) -> Result<()> {
    let (resolution, _) = resolve_from_dump(&config, &dump, quiet)?;
    write_maps(&config, &resolution)?;

    let mut source = open_dump(&config, &dump)?;
    let base_url = source.base_url().to_string();
    info!("Article URIs use base {}", base_url);

    let extractor = ArtifactExtractor::new(&resolution.maps, base_url)
        .with_min_text_length(config.import.min_text_length);
    let mut writer = ArtifactWriter::create(&config.output).with_context(|| {
        format!("Failed to create artifact files in {}", config.output.dir.display())
    })?;

    let coordinator = ImportCoordinator::new(config.import.clone()).with_quiet(quiet);
    let mut write_result = Ok(());
    let pass = coordinator.for_each_record(&mut source, |record| {
        if write_result.is_ok() {
            write_result = writer.write_article(&extractor.extract(&record));
        }
    });
    write_result.context("Failed to write article artifacts")?;

    let records = pass.into_result().with_context(|| {
        format!(
            "Failed to read {}; artifacts were left unfinished as *.partial files",
            dump.display()
        )
    })?;

    let aliases: Vec<_> = extractor.redirect_surface_forms().collect();
    writer.write_surface_forms(&aliases)?;
    let counts = writer.finish()?;

    write_stats(
        &config,
        &RunStats {
            dump: &dump.to_string_lossy(),
            records: &records,
            resolution: &resolution.stats,
            artifacts: Some(&counts),
        },
    )?;

    if !quiet {
        println!(
            "Extracted {} articles, {} linked paragraphs, {} surface forms",
            counts.articles, counts.paragraphs, counts.surface_forms
        );
        println!("Output written to {}", config.output.dir.display());
    }

    Ok(())
}
