//! Core types for redirect resolution and article extraction

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Canonical identifier of an article or redirect page
pub type Title = String;

/// Identifier of a page within the dump
pub type PageId = String;

// ============================================================================
// Records
// ============================================================================

/// Kind of page a record was parsed from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordType {
    /// Regular article in an allowed namespace
    Article,
    /// Page that forwards to another title
    Redirect,
    /// Anything else (talk pages, templates, ...)
    Other,
}

impl RecordType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Article => "article",
            Self::Redirect => "redirect",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for RecordType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A structured record for one page of the dump
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArticleRecord {
    /// Page ID
    pub id: PageId,
    /// Page title
    pub title: Title,
    /// MediaWiki namespace
    pub namespace: i32,
    /// What kind of page this is
    pub record_type: RecordType,
    /// Redirect target, populated only for redirects
    pub redirect_target: Option<Title>,
    /// Raw wikitext of the latest revision
    pub text: String,
    /// Last modification timestamp
    pub modified: Option<DateTime<Utc>>,
}

impl ArticleRecord {
    /// Create an article record
    pub fn article(
        id: impl Into<PageId>,
        title: impl Into<Title>,
        text: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            namespace: 0,
            record_type: RecordType::Article,
            redirect_target: None,
            text: text.into(),
            modified: None,
        }
    }

    /// Create a redirect record
    pub fn redirect(
        id: impl Into<PageId>,
        title: impl Into<Title>,
        target: impl Into<Title>,
    ) -> Self {
        let target = target.into();
        Self {
            id: id.into(),
            title: title.into(),
            namespace: 0,
            record_type: RecordType::Redirect,
            text: format!("#REDIRECT [[{}]]", target),
            redirect_target: Some(target),
            modified: None,
        }
    }

    /// Set the modification timestamp
    pub fn with_modified(mut self, modified: DateTime<Utc>) -> Self {
        self.modified = Some(modified);
        self
    }

    /// Set the namespace
    pub fn with_namespace(mut self, namespace: i32) -> Self {
        self.namespace = namespace;
        self
    }

    pub fn is_redirect(&self) -> bool {
        self.record_type == RecordType::Redirect
    }
}

// ============================================================================
// Redirect edges
// ============================================================================

/// One observed "source redirects to target" fact
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RedirectEdge {
    pub source: Title,
    pub target: Title,
}

impl RedirectEdge {
    pub fn new(source: impl Into<Title>, target: impl Into<Title>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
        }
    }

    /// An edge is malformed when either end is empty or whitespace
    pub fn is_malformed(&self) -> bool {
        self.source.trim().is_empty() || self.target.trim().is_empty()
    }
}

impl fmt::Display for RedirectEdge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} -> {}", self.source, self.target)
    }
}

/// A redirect source paired with the title at the end of its chain
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResolvedEdge {
    pub source: Title,
    pub canonical: Title,
}

impl ResolvedEdge {
    pub fn new(source: impl Into<Title>, canonical: impl Into<Title>) -> Self {
        Self {
            source: source.into(),
            canonical: canonical.into(),
        }
    }
}

// ============================================================================
// Links
// ============================================================================

/// An internal wiki link `[[target|anchor]]`
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WikiLink {
    /// Linked title, with any `#section` fragment removed
    pub target: Title,
    /// Text displayed for the link
    pub anchor: String,
}

impl WikiLink {
    pub fn new(target: impl Into<Title>, anchor: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            anchor: anchor.into(),
        }
    }
}

/// Normalize a link or redirect target to title form.
///
/// Drops a `#section` fragment, turns underscores into spaces, collapses
/// whitespace and upper-cases the first character as MediaWiki does.
pub fn normalize_title(raw: &str) -> Title {
    let without_fragment = match raw.find('#') {
        Some(pos) => &raw[..pos],
        None => raw,
    };

    let spaced = without_fragment.replace('_', " ");
    let collapsed = spaced.split_whitespace().collect::<Vec<_>>().join(" ");

    let mut chars = collapsed.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Build an article URI from a base URL and a title
pub fn title_to_uri(base_url: &str, title: &str) -> String {
    format!("{}{}", base_url, title.replace(' ', "_"))
}
