//! JSONL sinks for extracted artifacts

use super::{ArticleArtifacts, SurfaceForm};
use crate::config::OutputConfig;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};

/// Suffix of artifact files that are still being written
const PARTIAL_SUFFIX: &str = ".partial";

/// Lines written to each artifact file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ArtifactCounts {
    pub articles: usize,
    pub paragraphs: usize,
    pub surface_forms: usize,
}

/// Writes article text, paragraph links and surface forms as JSON lines
pub struct ArtifactWriter<W: Write> {
    text: W,
    paragraphs: W,
    surface_forms: W,
    counts: ArtifactCounts,
    /// `(partial, final)` file pairs renamed by `finish`
    renames: Vec<(PathBuf, PathBuf)>,
}

impl ArtifactWriter<BufWriter<File>> {
    /// Create the artifact files inside the output directory.
    ///
    /// Lines go to `<name>.partial` files which only replace the final files
    /// once [`finish`](Self::finish) succeeds, so a failed run never leaves
    /// truncated artifacts under their final names.
    pub fn create(output: &OutputConfig) -> io::Result<Self> {
        std::fs::create_dir_all(&output.dir)?;

        let targets = [
            output.text_path(),
            output.paragraphs_path(),
            output.surface_forms_path(),
        ];
        let renames: Vec<(PathBuf, PathBuf)> = targets
            .into_iter()
            .map(|target| (partial_path(&target), target))
            .collect();

        let open = |path: &PathBuf| File::create(path).map(BufWriter::new);
        let mut writer = Self::new(
            open(&renames[0].0)?,
            open(&renames[1].0)?,
            open(&renames[2].0)?,
        );
        writer.renames = renames;
        Ok(writer)
    }
}

fn partial_path(path: &Path) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(PARTIAL_SUFFIX);
    PathBuf::from(name)
}

impl<W: Write> ArtifactWriter<W> {
    pub fn new(text: W, paragraphs: W, surface_forms: W) -> Self {
        Self {
            text,
            paragraphs,
            surface_forms,
            counts: ArtifactCounts::default(),
            renames: Vec::new(),
        }
    }

    /// Write everything extracted from one article
    pub fn write_article(&mut self, artifacts: &ArticleArtifacts) -> io::Result<()> {
        if let Some(text) = &artifacts.text {
            write_line(&mut self.text, text)?;
            self.counts.articles += 1;
        }

        for paragraph in &artifacts.paragraphs {
            write_line(&mut self.paragraphs, paragraph)?;
            self.counts.paragraphs += 1;
        }

        self.write_surface_forms(&artifacts.surface_forms)
    }

    pub fn write_surface_forms<'a, I>(&mut self, forms: I) -> io::Result<()>
    where
        I: IntoIterator<Item = &'a SurfaceForm>,
    {
        for form in forms {
            write_line(&mut self.surface_forms, form)?;
            self.counts.surface_forms += 1;
        }
        Ok(())
    }

    /// Flush all sinks, move the files to their final names and return the line counts
    pub fn finish(mut self) -> io::Result<ArtifactCounts> {
        self.text.flush()?;
        self.paragraphs.flush()?;
        self.surface_forms.flush()?;

        for (partial, target) in &self.renames {
            std::fs::rename(partial, target)?;
        }
        Ok(self.counts)
    }

    /// Consume the writer, returning the sinks
    pub fn into_inner(self) -> (W, W, W) {
        (self.text, self.paragraphs, self.surface_forms)
    }
}

fn write_line<W: Write, T: Serialize>(writer: &mut W, value: &T) -> io::Result<()> {
    serde_json::to_writer(&mut *writer, value)?;
    writer.write_all(b"\n")
}
