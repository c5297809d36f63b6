//! Artifacts derived from article records
//!
//! Every link target is rewritten through the resolved forward map, so a link
//! to a redirect lands on the canonical article. Redirect aliases from the
//! reverse map become extra surface forms of their canonical article.

pub mod writer;

pub use writer::{ArtifactCounts, ArtifactWriter};

use crate::import::WikiTextParser;
use crate::redirects::ResolutionMaps;
use crate::types::{title_to_uri, ArticleRecord, PageId, RecordType, Title, WikiLink};
use serde::{Deserialize, Serialize};

/// Plain text of one article
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArticleText {
    pub id: PageId,
    pub title: Title,
    pub text: String,
}

/// A paragraph and the canonical targets of the links inside it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParagraphLinks {
    pub title: Title,
    /// Position of the paragraph within the article, from zero
    pub paragraph: usize,
    pub text: String,
    pub links: Vec<WikiLink>,
}

/// A string used to refer to an article, paired with the article URI
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SurfaceForm {
    pub surface: String,
    pub uri: String,
}

/// Everything extracted from one article record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ArticleArtifacts {
    pub text: Option<ArticleText>,
    pub paragraphs: Vec<ParagraphLinks>,
    pub surface_forms: Vec<SurfaceForm>,
}

/// Turns article records into text, paragraph links and surface forms
pub struct ArtifactExtractor<'a> {
    parser: WikiTextParser,
    maps: &'a ResolutionMaps,
    base_url: String,
    min_text_length: usize,
}

impl<'a> ArtifactExtractor<'a> {
    pub fn new(maps: &'a ResolutionMaps, base_url: impl Into<String>) -> Self {
        Self {
            parser: WikiTextParser::new(),
            maps,
            base_url: base_url.into(),
            min_text_length: 0,
        }
    }

    /// Skip article text shorter than `min` characters
    pub fn with_min_text_length(mut self, min: usize) -> Self {
        self.min_text_length = min;
        self
    }

    /// URI of the canonical article behind `title`
    pub fn uri(&self, title: &str) -> String {
        title_to_uri(&self.base_url, self.maps.canonicalize(title))
    }

    /// Plain text of an article. Redirects and non-article pages yield nothing.
    pub fn article_text(&self, record: &ArticleRecord) -> Option<ArticleText> {
        if record.record_type != RecordType::Article {
            return None;
        }

        let text = self.parser.parse(&record.text);
        if text.chars().count() < self.min_text_length.max(1) {
            return None;
        }

        Some(ArticleText {
            id: record.id.clone(),
            title: record.title.clone(),
            text,
        })
    }

    /// Paragraphs of an article that contain at least one link
    pub fn paragraph_links(&self, record: &ArticleRecord) -> Vec<ParagraphLinks> {
        if record.record_type != RecordType::Article {
            return Vec::new();
        }

        self.parser
            .paragraphs(&record.text)
            .into_iter()
            .enumerate()
            .filter(|(_, paragraph)| !paragraph.links.is_empty())
            .map(|(index, paragraph)| ParagraphLinks {
                title: record.title.clone(),
                paragraph: index,
                text: paragraph.text,
                links: paragraph
                    .links
                    .into_iter()
                    .map(|link| self.canonical_link(link))
                    .collect(),
            })
            .collect()
    }

    /// Anchor text of every link paired with the URI of its canonical target
    pub fn link_surface_forms(&self, record: &ArticleRecord) -> Vec<SurfaceForm> {
        if record.record_type != RecordType::Article {
            return Vec::new();
        }

        self.parser
            .extract_links(&record.text)
            .into_iter()
            .filter(|link| !link.anchor.is_empty())
            .map(|link| SurfaceForm {
                uri: self.uri(&link.target),
                surface: link.anchor,
            })
            .collect()
    }

    /// Every redirect alias paired with the URI of its canonical article
    pub fn redirect_surface_forms(&self) -> impl Iterator<Item = SurfaceForm> + '_ {
        self.maps.reverse.iter().flat_map(move |(canonical, sources)| {
            let uri = title_to_uri(&self.base_url, canonical);
            sources.iter().map(move |source| SurfaceForm {
                surface: source.clone(),
                uri: uri.clone(),
            })
        })
    }

    /// Extract all per-article artifacts in one go
    pub fn extract(&self, record: &ArticleRecord) -> ArticleArtifacts {
        if record.record_type != RecordType::Article {
            return ArticleArtifacts::default();
        }

        ArticleArtifacts {
            text: self.article_text(record),
            paragraphs: self.paragraph_links(record),
            surface_forms: self.link_surface_forms(record),
        }
    }

    fn canonical_link(&self, link: WikiLink) -> WikiLink {
        WikiLink {
            target: self.maps.canonicalize(&link.target).to_string(),
            anchor: link.anchor,
        }
    }
}
