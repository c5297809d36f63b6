//! Output configuration

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Forward map file (`source<TAB>canonical`)
pub const FORWARD_FILE: &str = "redirects.tsv";
/// Reverse map file (one `{canonical, sources}` object per line)
pub const REVERSE_FILE: &str = "aliases.jsonl";
/// Article text file
pub const TEXT_FILE: &str = "articles.jsonl";
/// Paragraph/link association file
pub const PARAGRAPHS_FILE: &str = "paragraph_links.jsonl";
/// Surface form file
pub const SURFACE_FORMS_FILE: &str = "surface_forms.jsonl";
/// Run statistics
pub const STATS_FILE: &str = "stats.json";

/// Output configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory all artifacts are written to
    #[serde(default = "default_output_dir")]
    pub dir: PathBuf,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from("out")
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: default_output_dir(),
        }
    }
}

impl OutputConfig {
    pub fn forward_path(&self) -> PathBuf {
        self.dir.join(FORWARD_FILE)
    }

    pub fn reverse_path(&self) -> PathBuf {
        self.dir.join(REVERSE_FILE)
    }

    pub fn text_path(&self) -> PathBuf {
        self.dir.join(TEXT_FILE)
    }

    pub fn paragraphs_path(&self) -> PathBuf {
        self.dir.join(PARAGRAPHS_FILE)
    }

    pub fn surface_forms_path(&self) -> PathBuf {
        self.dir.join(SURFACE_FORMS_FILE)
    }

    pub fn stats_path(&self) -> PathBuf {
        self.dir.join(STATS_FILE)
    }

    /// Point output somewhere else
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.dir = dir.as_ref().to_path_buf();
        self
    }
}
