//! Integration tests for wikiredirects
//!
//! These tests run whole dumps through reading, resolution and extraction.

use std::collections::BTreeSet;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;
use wikiredirects::{
    artifacts::{ArticleText, ArtifactExtractor, ArtifactWriter, ParagraphLinks, SurfaceForm},
    config::{Config, ImportConfig, OutputConfig},
    import::{ImportCoordinator, RecordSource, WikimediaSource},
    redirects::{resolve_redirects, AliasGroup, RedirectError, RedirectPipeline},
    types::RedirectEdge,
};

fn page(id: u32, title: &str, ns: i32, redirect: Option<&str>, text: &str) -> String {
    let redirect = redirect
        .map(|t| format!("<redirect title=\"{}\" />", t))
        .unwrap_or_default();
    format!(
        "<page><title>{}</title><ns>{}</ns><id>{}</id>{}<revision><id>{}</id>\
         <timestamp>2024-01-15T10:30:00Z</timestamp><text xml:space=\"preserve\">{}</text>\
         </revision></page>\n",
        title,
        ns,
        id,
        redirect,
        id + 1000,
        text
    )
}

/// A small dump with a chain, a two-cycle, a self-redirect, a duplicate
/// source and links that point at redirects
fn sample_dump() -> String {
    let mut xml = String::from(
        "<mediawiki xmlns=\"http://www.mediawiki.org/xml/export-0.10/\">\n\
         <siteinfo><sitename>Wikipedia</sitename></siteinfo>\n",
    );

    xml.push_str(&page(
        1,
        "Paris",
        0,
        None,
        "'''Paris''' is the capital and most populous city of [[France]].\n\n\
         It is known as the [[City of Light|Ville Lumière]] and hosts the [[Louvre]].",
    ));
    xml.push_str(&page(
        2,
        "France",
        0,
        None,
        "'''France''' is a country in Western Europe whose capital is [[Paname]].",
    ));
    xml.push_str(&page(3, "City of Light", 0, Some("Paname"), "#REDIRECT [[Paname]]"));
    xml.push_str(&page(4, "Paname", 0, Some("Paris"), "#REDIRECT [[Paris]]"));
    xml.push_str(&page(5, "Ping", 0, Some("Pong"), "#REDIRECT [[Pong]]"));
    xml.push_str(&page(6, "Pong", 0, Some("Ping"), "#REDIRECT [[Ping]]"));
    xml.push_str(&page(7, "Mirror", 0, Some("Mirror"), "#REDIRECT [[Mirror]]"));
    xml.push_str(&page(8, "Lutetia", 0, None, "#REDIRECT [[Paris]]"));
    xml.push_str(&page(
        9,
        "Talk:Paris",
        1,
        None,
        "Discussion about [[Paris]] that should be filtered out.",
    ));
    xml.push_str(&page(10, "City of Light", 0, Some("Paris"), "#REDIRECT [[Paris]]"));
    xml.push_str("</mediawiki>\n");
    xml
}

fn write_dump(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, content).unwrap();
    path
}

fn read_jsonl<T: serde::de::DeserializeOwned>(path: &Path) -> Vec<T> {
    std::fs::read_to_string(path)
        .unwrap()
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}

/// Test redirect resolution over a dump read from disk
#[test]
fn test_resolution_from_dump() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(temp_dir.path(), "enwiki-test.xml", &sample_dump());

    let mut source = WikimediaSource::open(&dump).unwrap();
    assert_eq!(source.base_url(), "https://en.wikipedia.org/wiki/");

    let coordinator = ImportCoordinator::new(ImportConfig::default()).with_quiet(true);
    let collection = coordinator.collect_edges(&mut source);
    assert!(collection.pass.error.is_none());
    assert_eq!(collection.pass.stats.articles, 2);
    // Talk page filtered by the namespace allowlist
    assert_eq!(collection.pass.stats.records, 9);

    let resolution = RedirectPipeline::default()
        .with_threads(Some(2))
        .resolve_partitions(collection.into_partitions(3))
        .unwrap();
    let maps = &resolution.maps;

    // The later duplicate wins: City of Light -> Paris directly
    assert_eq!(maps.forward["City of Light"], "Paris");
    assert_eq!(maps.forward["Paname"], "Paris");
    // Redirect detected from text alone
    assert_eq!(maps.forward["Lutetia"], "Paris");
    // Two-cycle: each resolves to the last title before re-entry
    assert_eq!(maps.forward["Ping"], "Pong");
    assert_eq!(maps.forward["Pong"], "Ping");
    assert_eq!(maps.forward["Mirror"], "Mirror");

    // Exactly one entry per distinct source
    assert_eq!(maps.len(), 6);
    assert_eq!(resolution.stats.index.duplicate_sources, 1);
    assert_eq!(resolution.stats.cycles, 3);

    // Reverse map is the exact inverse of the forward map
    assert_eq!(
        maps.aliases("Paris"),
        &["City of Light".to_string(), "Lutetia".to_string(), "Paname".to_string()]
    );
    let reverse_total: usize = maps.reverse.values().map(|v| v.len()).sum();
    assert_eq!(reverse_total, maps.forward.len());
    for (canonical, sources) in &maps.reverse {
        for source in sources {
            assert_eq!(&maps.forward[source], canonical);
        }
    }
}

/// Test that partitioning and thread count never change the result
#[test]
fn test_resolution_is_deterministic() {
    let mut edges = Vec::new();
    for i in 0..200 {
        edges.push(RedirectEdge::new(format!("T{}", i), format!("T{}", i + 1)));
    }
    for i in 0..50 {
        edges.push(RedirectEdge::new(format!("Alias {}", i), format!("T{}", i * 4)));
    }
    edges.push(RedirectEdge::new("Loop A", "Loop B"));
    edges.push(RedirectEdge::new("Loop B", "Loop C"));
    edges.push(RedirectEdge::new("Loop C", "Loop A"));
    edges.push(RedirectEdge::new("", "Nowhere"));

    let baseline = resolve_redirects(edges.clone()).unwrap();

    for (partitions, threads) in [(1, 1), (4, 2), (7, 3), (64, 4)] {
        let split = wikiredirects::redirects::partition_edges(edges.clone(), partitions);
        let resolution = RedirectPipeline::default()
            .with_threads(Some(threads))
            .resolve(&split)
            .unwrap();
        assert_eq!(resolution.maps, baseline);
        assert_eq!(resolution.stats.index.malformed_edges, 1);
    }

    // Chains longer than the depth bound stop at the title reached
    assert_eq!(baseline.forward["T0"], "T100");
    assert_eq!(baseline.forward["T150"], "T200");
    // Alias 10 -> T40 is the first of the 100 hops
    assert_eq!(baseline.forward["Alias 10"], "T139");
}

/// Cut the sample dump right after the first occurrence of `marker`
fn truncated_dump(marker: &str) -> String {
    let xml = sample_dump();
    let end = xml.find(marker).unwrap() + marker.len();
    xml[..end].to_string()
}

/// Test that a dump that cannot be fully read aborts resolution
#[test]
fn test_truncated_dump_is_fatal() {
    let cuts = [
        // Inside a closing tag
        "<page><title>Ping</tit",
        // Inside the wikitext of a redirect
        "#REDIRECT [[Po",
        // Right after an element
        "<page><title>Ping</title>",
        // Between two pages
        "#REDIRECT [[Pong]]</text></revision></page>\n",
    ];

    for cut in cuts {
        let mut source = WikimediaSource::from_xml_string(&truncated_dump(cut));
        let coordinator = ImportCoordinator::new(ImportConfig::default()).with_quiet(true);
        let collection = coordinator.collect_edges(&mut source);
        assert!(collection.pass.error.is_some(), "no read error for cut {:?}", cut);

        let result = RedirectPipeline::default().resolve_partitions(collection.into_partitions(2));
        assert!(
            matches!(result, Err(RedirectError::IndexUnavailable(_))),
            "cut {:?} resolved anyway",
            cut
        );
    }
}

/// Test that the CLI refuses to publish maps for a truncated dump
#[test]
fn test_cli_truncated_dump_fails() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(
        temp_dir.path(),
        "enwiki-test.xml",
        &truncated_dump("<page><title>Ping</title>"),
    );
    let out = temp_dir.path().join("out");

    let output = Command::new(env!("CARGO_BIN_EXE_wikiredirects"))
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("--quiet")
        .arg("resolve")
        .arg(&dump)
        .arg("--output")
        .arg(&out)
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("unavailable"));
    assert!(!out.join("redirects.tsv").exists());
}

/// Test artifact extraction with links rewritten through the redirect maps
#[test]
fn test_artifact_extraction() {
    let mut source = WikimediaSource::from_xml_string(&sample_dump());
    let coordinator = ImportCoordinator::new(ImportConfig::default()).with_quiet(true);
    let resolution = RedirectPipeline::default()
        .resolve_partitions(coordinator.collect_edges(&mut source).into_partitions(2))
        .unwrap();

    let extractor = ArtifactExtractor::new(&resolution.maps, "https://en.wikipedia.org/wiki/")
        .with_min_text_length(10);
    let mut writer = ArtifactWriter::new(Vec::new(), Vec::new(), Vec::new());

    let mut source = WikimediaSource::from_xml_string(&sample_dump());
    for record in source.iter_records() {
        writer.write_article(&extractor.extract(&record.unwrap())).unwrap();
    }
    let aliases: Vec<SurfaceForm> = extractor.redirect_surface_forms().collect();
    writer.write_surface_forms(&aliases).unwrap();

    let (text, paragraphs, forms) = writer.into_inner();

    let articles: Vec<ArticleText> = String::from_utf8(text)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let titles: Vec<&str> = articles.iter().map(|a| a.title.as_str()).collect();
    assert_eq!(titles, vec!["Paris", "France"]);

    let paragraphs: Vec<ParagraphLinks> = String::from_utf8(paragraphs)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    let paris_second = paragraphs
        .iter()
        .find(|p| p.title == "Paris" && p.paragraph == 1)
        .unwrap();
    // [[City of Light|Ville Lumière]] lands on Paris
    assert_eq!(paris_second.links[0].target, "Paris");
    assert_eq!(paris_second.links[0].anchor, "Ville Lumière");
    assert_eq!(paris_second.links[1].target, "Louvre");

    let france = paragraphs.iter().find(|p| p.title == "France").unwrap();
    assert_eq!(france.links[0].target, "Paris");

    let forms: BTreeSet<(String, String)> = String::from_utf8(forms)
        .unwrap()
        .lines()
        .map(|l| serde_json::from_str::<SurfaceForm>(l).unwrap())
        .map(|f| (f.surface, f.uri))
        .collect();
    let paris_uri = "https://en.wikipedia.org/wiki/Paris".to_string();
    assert!(forms.contains(&("Ville Lumière".to_string(), paris_uri.clone())));
    assert!(forms.contains(&("Paname".to_string(), paris_uri.clone())));
    assert!(forms.contains(&("Lutetia".to_string(), paris_uri)));
    assert!(forms.contains(&(
        "Louvre".to_string(),
        "https://en.wikipedia.org/wiki/Louvre".to_string()
    )));
}

/// Test reading a bzip2-compressed dump
#[test]
fn test_bz2_dump() {
    use bzip2::write::BzEncoder;
    use bzip2::Compression;

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("frwiki-test.xml.bz2");

    let mut encoder = BzEncoder::new(std::fs::File::create(&path).unwrap(), Compression::fast());
    encoder.write_all(sample_dump().as_bytes()).unwrap();
    encoder.finish().unwrap();

    let mut source = WikimediaSource::open(&path).unwrap();
    assert_eq!(source.base_url(), "https://fr.wikipedia.org/wiki/");

    let coordinator = ImportCoordinator::new(ImportConfig::default()).with_quiet(true);
    let collection = coordinator.collect_edges(&mut source);
    assert!(collection.pass.error.is_none());
    assert_eq!(collection.edges.len(), 7);
}

/// Test configuration written by `init` and read back
#[test]
fn test_config_roundtrip_through_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("wikiredirects.toml");

    let mut config = Config::default();
    config.resolve.max_depth = 12;
    config.output = OutputConfig::default().with_dir(temp_dir.path().join("out"));
    std::fs::write(&path, config.to_toml().unwrap()).unwrap();

    let loaded = Config::load(&path).unwrap();
    assert_eq!(loaded.resolve.max_depth, 12);
    assert_eq!(loaded.output.dir, temp_dir.path().join("out"));
}

/// Test the CLI end to end
#[test]
fn test_cli_resolve_and_extract() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(temp_dir.path(), "enwiki-test.xml", &sample_dump());
    let out = temp_dir.path().join("out");
    let config = temp_dir.path().join("missing.toml");

    let status = Command::new(env!("CARGO_BIN_EXE_wikiredirects"))
        .arg("--config")
        .arg(&config)
        .arg("--quiet")
        .arg("resolve")
        .arg(&dump)
        .arg("--output")
        .arg(&out)
        .arg("--partitions")
        .arg("3")
        .status()
        .unwrap();
    assert!(status.success());

    let forward = std::fs::read_to_string(out.join("redirects.tsv")).unwrap();
    let first_run: Vec<&str> = forward.lines().collect();
    assert!(first_run.contains(&"Paname\tParis"));
    assert!(first_run.contains(&"Ping\tPong"));
    assert_eq!(first_run.len(), 6);

    let groups: Vec<AliasGroup> = read_jsonl(&out.join("aliases.jsonl"));
    let paris = groups.iter().find(|g| g.canonical == "Paris").unwrap();
    assert_eq!(paris.sources, vec!["City of Light", "Lutetia", "Paname"]);

    let stats: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(out.join("stats.json")).unwrap()).unwrap();
    assert_eq!(stats["resolution"]["partitions"], 3);

    let status = Command::new(env!("CARGO_BIN_EXE_wikiredirects"))
        .arg("--config")
        .arg(&config)
        .arg("--quiet")
        .arg("extract")
        .arg(&dump)
        .arg("--output")
        .arg(&out)
        .arg("--min-length")
        .arg("10")
        .status()
        .unwrap();
    assert!(status.success());

    // Same dump, same bytes
    assert_eq!(std::fs::read_to_string(out.join("redirects.tsv")).unwrap(), forward);

    let articles: Vec<ArticleText> = read_jsonl(&out.join("articles.jsonl"));
    assert_eq!(articles.len(), 2);
    let forms: Vec<SurfaceForm> = read_jsonl(&out.join("surface_forms.jsonl"));
    assert!(forms.iter().any(|f| f.surface == "Paname"));
}

/// Test that an invalid override is rejected before any work is done
#[test]
fn test_cli_rejects_zero_depth() {
    let temp_dir = TempDir::new().unwrap();
    let dump = write_dump(temp_dir.path(), "enwiki-test.xml", &sample_dump());

    let output = Command::new(env!("CARGO_BIN_EXE_wikiredirects"))
        .arg("--config")
        .arg(temp_dir.path().join("missing.toml"))
        .arg("--quiet")
        .arg("resolve")
        .arg(&dump)
        .arg("--output")
        .arg(temp_dir.path().join("out"))
        .arg("--max-depth")
        .arg("0")
        .output()
        .unwrap();

    assert!(!output.status.success());
    assert!(String::from_utf8_lossy(&output.stderr).contains("max_depth"));
    assert!(!temp_dir.path().join("out").exists());
}
