//! Forward and reverse orientations of the resolved redirect edges

use crate::types::{ResolvedEdge, Title};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::Write;

/// One line of the reverse map output
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AliasGroup {
    pub canonical: Title,
    pub sources: Vec<Title>,
}

/// Resolved redirects keyed both ways.
///
/// Both maps are ordered and reverse lists are sorted, so the same resolved
/// edges always produce identical maps.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionMaps {
    /// source -> canonical
    pub forward: BTreeMap<Title, Title>,
    /// canonical -> every source resolving to it
    pub reverse: BTreeMap<Title, Vec<Title>>,
}

impl ResolutionMaps {
    /// Build both orientations from resolved edges
    pub fn from_resolved<I>(edges: I) -> Self
    where
        I: IntoIterator<Item = ResolvedEdge>,
    {
        let forward: BTreeMap<Title, Title> = edges
            .into_iter()
            .map(|edge| (edge.source, edge.canonical))
            .collect();

        let mut reverse: BTreeMap<Title, Vec<Title>> = BTreeMap::new();
        for (source, canonical) in &forward {
            reverse
                .entry(canonical.clone())
                .or_default()
                .push(source.clone());
        }

        Self { forward, reverse }
    }

    /// Rewrite a title to its canonical target, or return it unchanged
    pub fn canonicalize<'a>(&'a self, title: &'a str) -> &'a str {
        self.forward.get(title).map(|c| c.as_str()).unwrap_or(title)
    }

    /// Every known redirect source of `canonical`
    pub fn aliases(&self, canonical: &str) -> &[Title] {
        self.reverse.get(canonical).map(|v| v.as_slice()).unwrap_or(&[])
    }

    /// Number of resolved sources
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }

    /// Write the forward map as `source<TAB>canonical` lines
    pub fn write_forward_tsv<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for (source, canonical) in &self.forward {
            writeln!(writer, "{}\t{}", source, canonical)?;
        }
        writer.flush()
    }

    /// Write the reverse map as one JSON object per canonical title
    pub fn write_reverse_jsonl<W: Write>(&self, mut writer: W) -> std::io::Result<()> {
        for (canonical, sources) in &self.reverse {
            let group = AliasGroup {
                canonical: canonical.clone(),
                sources: sources.clone(),
            };
            serde_json::to_writer(&mut writer, &group)?;
            writer.write_all(b"\n")?;
        }
        writer.flush()
    }
}
