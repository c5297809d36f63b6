//! Core types and traits for reading structured records out of a dump

use crate::types::ArticleRecord;
use std::path::Path;
use thiserror::Error;

/// Trait for sources that yield one structured record per page
pub trait RecordSource: Send {
    /// Iterate over the records in the source
    fn iter_records(&mut self) -> Box<dyn Iterator<Item = Result<ArticleRecord, ImportError>> + '_>;

    /// Total record count if known (for progress reporting)
    fn record_count_hint(&self) -> Option<u64>;

    /// Source name for display
    fn source_name(&self) -> &str;
}

/// Records already in memory, e.g. materialized by another process
#[derive(Debug, Clone, Default)]
pub struct MemorySource {
    name: String,
    records: Vec<ArticleRecord>,
}

impl MemorySource {
    pub fn new(name: impl Into<String>, records: Vec<ArticleRecord>) -> Self {
        Self {
            name: name.into(),
            records,
        }
    }
}

impl RecordSource for MemorySource {
    fn iter_records(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<ArticleRecord, ImportError>> + '_> {
        Box::new(self.records.iter().cloned().map(Ok))
    }

    fn record_count_hint(&self) -> Option<u64> {
        Some(self.records.len() as u64)
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Errors that can occur while reading a dump
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML parse error: {0}")]
    XmlParse(String),

    #[error("Invalid dump format: {0}")]
    InvalidFormat(String),
}

impl From<quick_xml::Error> for ImportError {
    fn from(e: quick_xml::Error) -> Self {
        ImportError::XmlParse(e.to_string())
    }
}

/// Dump format enumeration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DumpFormat {
    /// Uncompressed MediaWiki XML export
    WikimediaXml,
    /// MediaWiki XML export compressed with bzip2 (single or multistream)
    WikimediaXmlBz2,
}

impl DumpFormat {
    /// Detect format from file path
    pub fn detect(path: &Path) -> Option<Self> {
        let name = path.file_name()?.to_str()?.to_lowercase();

        if name.ends_with(".xml.bz2") || name.ends_with(".bz2") {
            Some(DumpFormat::WikimediaXmlBz2)
        } else if name.ends_with(".xml") {
            Some(DumpFormat::WikimediaXml)
        } else {
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_detection() {
        assert_eq!(
            DumpFormat::detect(Path::new("enwiki-latest-pages-articles-multistream.xml.bz2")),
            Some(DumpFormat::WikimediaXmlBz2)
        );
        assert_eq!(
            DumpFormat::detect(Path::new("simplewiki-latest-pages-articles.xml")),
            Some(DumpFormat::WikimediaXml)
        );
        assert_eq!(DumpFormat::detect(Path::new("archive.warc.gz")), None);
    }

    #[test]
    fn test_memory_source() {
        let mut source = MemorySource::new(
            "memory",
            vec![
                ArticleRecord::article("1", "Paris", "Paris is the capital of France."),
                ArticleRecord::redirect("2", "Paname", "Paris"),
            ],
        );

        assert_eq!(source.record_count_hint(), Some(2));
        let records: Vec<_> = source.iter_records().collect::<Result<_, _>>().unwrap();
        assert_eq!(records.len(), 2);
        assert!(records[1].is_redirect());
    }
}
