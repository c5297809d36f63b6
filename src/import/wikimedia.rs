//! Wikimedia XML dump parser
//!
//! Streams `<page>` elements out of a MediaWiki export (plain or bzip2
//! compressed) and turns each one into an [`ArticleRecord`].

use super::source::{DumpFormat, ImportError, RecordSource};
use super::wikitext::WikiTextParser;
use crate::types::{normalize_title, ArticleRecord, RecordType};
use bzip2::read::MultiBzDecoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use std::collections::HashSet;
use std::fs::File;
use std::io::{BufRead, BufReader, Cursor};
use std::path::Path;
use tracing::debug;

const READ_BUFFER_SIZE: usize = 1024 * 1024;
const DEFAULT_BASE_URL: &str = "https://en.wikipedia.org/wiki/";

/// Wikimedia XML dump source
pub struct WikimediaSource {
    /// Display name (file name of the dump)
    name: String,
    /// XML reader over the (possibly decompressed) stream
    reader: Reader<Box<dyn BufRead + Send>>,
    /// Current page being parsed
    current_page: Option<PartialPage>,
    /// `<mediawiki>` was opened and not yet closed
    in_root: bool,
    /// Allowed namespaces (empty = all)
    allowed_namespaces: HashSet<i32>,
    /// Base URL for article URIs
    base_url: String,
}

/// Partial page being built from XML events
#[derive(Debug, Default)]
struct PartialPage {
    title: Option<String>,
    id: Option<String>,
    namespace: Option<i32>,
    text: Option<String>,
    timestamp: Option<String>,
    redirect: bool,
    redirect_title: Option<String>,
}

/// Result of parsing a page from the XML stream
enum ParseResult {
    Record(ArticleRecord),
    /// Page was filtered out or incomplete
    Skipped,
    Eof,
}

impl WikimediaSource {
    /// Open a Wikimedia XML dump file (`.xml` or `.xml.bz2`)
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ImportError> {
        let path = path.as_ref();
        let format = DumpFormat::detect(path).ok_or_else(|| {
            ImportError::InvalidFormat(format!("unrecognized dump file: {}", path.display()))
        })?;

        let file = File::open(path)?;
        let stream: Box<dyn BufRead + Send> = match format {
            DumpFormat::WikimediaXmlBz2 => Box::new(BufReader::with_capacity(
                READ_BUFFER_SIZE,
                MultiBzDecoder::new(file),
            )),
            DumpFormat::WikimediaXml => Box::new(BufReader::with_capacity(READ_BUFFER_SIZE, file)),
        };

        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "wikimedia dump".to_string());
        let base_url = base_url_for(&name);

        Ok(Self::from_reader(name, stream).with_base_url(base_url))
    }

    /// Read a dump from any buffered stream
    pub fn from_reader(name: impl Into<String>, stream: Box<dyn BufRead + Send>) -> Self {
        Self {
            name: name.into(),
            reader: Reader::from_reader(stream),
            current_page: None,
            in_root: false,
            allowed_namespaces: HashSet::from([0]),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Read a dump held in memory
    pub fn from_xml_string(xml: &str) -> Self {
        Self::from_reader("inline dump", Box::new(Cursor::new(xml.as_bytes().to_vec())))
    }

    /// Set allowed namespaces (empty = all namespaces)
    pub fn with_namespaces(mut self, namespaces: &[i32]) -> Self {
        self.allowed_namespaces = namespaces.iter().copied().collect();
        self
    }

    /// Set the base URL for article URIs
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Parse the next page from the XML stream
    fn parse_next_page(&mut self) -> Result<ParseResult, ImportError> {
        let mut buf = Vec::with_capacity(8192);
        let mut text_buf = String::new();
        let mut current_element: Option<String> = None;

        loop {
            buf.clear();
            let event = self.reader.read_event_into(&mut buf)?;

            match event {
                Event::Start(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    match name.as_str() {
                        "mediawiki" => self.in_root = true,
                        "page" => {
                            self.current_page = Some(PartialPage::default());
                        }
                        "redirect" => self.mark_redirect(e),
                        "title" | "id" | "ns" | "text" | "timestamp" => {
                            current_element = Some(name);
                            text_buf.clear();
                        }
                        _ => {}
                    }
                }
                Event::Empty(ref e) => {
                    if e.name().as_ref() == b"redirect" {
                        self.mark_redirect(e);
                    }
                }
                Event::Text(ref e) => {
                    if current_element.is_some() {
                        if let Ok(text) = e.unescape() {
                            text_buf.push_str(&text);
                        }
                    }
                }
                Event::CData(ref e) => {
                    if current_element.is_some() {
                        text_buf.push_str(&String::from_utf8_lossy(e));
                    }
                }
                Event::End(ref e) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_string();

                    if name == "mediawiki" {
                        self.in_root = false;
                        continue;
                    }

                    if name == "page" {
                        if let Some(page) = self.current_page.take() {
                            return Ok(self.page_to_record(page));
                        }
                        continue;
                    }

                    if let Some(ref mut page) = self.current_page {
                        match name.as_str() {
                            "title" => page.title = Some(std::mem::take(&mut text_buf)),
                            "id" => {
                                // The page ID comes before revision and contributor IDs
                                if page.id.is_none() {
                                    page.id = Some(std::mem::take(&mut text_buf));
                                }
                            }
                            "ns" => page.namespace = text_buf.trim().parse().ok(),
                            "text" => page.text = Some(std::mem::take(&mut text_buf)),
                            "timestamp" => page.timestamp = Some(std::mem::take(&mut text_buf)),
                            _ => {}
                        }
                    }

                    if current_element.as_deref() == Some(name.as_str()) {
                        current_element = None;
                        text_buf.clear();
                    }
                }
                Event::Eof => {
                    if self.current_page.take().is_some() {
                        return Err(ImportError::XmlParse(
                            "unexpected end of dump inside <page>".to_string(),
                        ));
                    }
                    if self.in_root {
                        return Err(ImportError::XmlParse(
                            "unexpected end of dump before </mediawiki>".to_string(),
                        ));
                    }
                    return Ok(ParseResult::Eof);
                }
                _ => {}
            }
        }
    }

    fn mark_redirect(&mut self, element: &BytesStart<'_>) {
        if let Some(ref mut page) = self.current_page {
            page.redirect = true;
            page.redirect_title = element
                .attributes()
                .flatten()
                .find(|attr| attr.key.as_ref() == b"title")
                .and_then(|attr| attr.unescape_value().ok().map(|v| v.into_owned()));
        }
    }

    /// Convert a parsed page to a record (or Skipped if filtered)
    fn page_to_record(&self, page: PartialPage) -> ParseResult {
        let namespace = page.namespace.unwrap_or(0);
        if !self.allowed_namespaces.is_empty() && !self.allowed_namespaces.contains(&namespace) {
            return ParseResult::Skipped;
        }

        let (title, id) = match (page.title, page.id) {
            (Some(title), Some(id)) if !title.trim().is_empty() => (title, id),
            (title, _) => {
                debug!("Skipping page without title or id: {:?}", title);
                return ParseResult::Skipped;
            }
        };

        let text = page.text.unwrap_or_default();
        let text_target = WikiTextParser::redirect_target(&text);

        let record_type = if page.redirect || text_target.is_some() {
            RecordType::Redirect
        } else if namespace == 0 {
            RecordType::Article
        } else {
            RecordType::Other
        };

        let redirect_target = match record_type {
            RecordType::Redirect => page
                .redirect_title
                .map(|t| normalize_title(&t))
                .filter(|t| !t.is_empty())
                .or(text_target),
            _ => None,
        };

        let modified = page.timestamp.and_then(|ts| {
            chrono::DateTime::parse_from_rfc3339(&ts)
                .ok()
                .map(|dt| dt.with_timezone(&chrono::Utc))
        });

        ParseResult::Record(ArticleRecord {
            id,
            title,
            namespace,
            record_type,
            redirect_target,
            text,
            modified,
        })
    }
}

/// Derive the article base URL from a dump file name such as `enwiki-latest-...`
pub fn base_url_for(file_name: &str) -> String {
    if !file_name.contains("wiki") {
        return DEFAULT_BASE_URL.to_string();
    }

    let lang = file_name
        .split("wiki")
        .next()
        .filter(|lang| {
            !lang.is_empty() && lang.chars().all(|c| c.is_ascii_lowercase() || c == '_')
        });

    match lang {
        Some(lang) => format!("https://{}.wikipedia.org/wiki/", lang.replace('_', "-")),
        None => DEFAULT_BASE_URL.to_string(),
    }
}

impl RecordSource for WikimediaSource {
    fn iter_records(
        &mut self,
    ) -> Box<dyn Iterator<Item = Result<ArticleRecord, ImportError>> + '_> {
        Box::new(WikimediaIterator {
            source: self,
            done: false,
        })
    }

    fn record_count_hint(&self) -> Option<u64> {
        None
    }

    fn source_name(&self) -> &str {
        &self.name
    }
}

/// Iterator over records in a Wikimedia dump
struct WikimediaIterator<'a> {
    source: &'a mut WikimediaSource,
    done: bool,
}

impl<'a> Iterator for WikimediaIterator<'a> {
    type Item = Result<ArticleRecord, ImportError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        loop {
            match self.source.parse_next_page() {
                Ok(ParseResult::Record(record)) => return Some(Ok(record)),
                Ok(ParseResult::Skipped) => continue,
                Ok(ParseResult::Eof) => {
                    self.done = true;
                    return None;
                }
                Err(e) => {
                    // The XML stream cannot be resynchronized after a parse error
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<mediawiki xmlns="http://www.mediawiki.org/xml/export-0.10/">
  <page>
    <title>United States</title>
    <ns>0</ns>
    <id>3434750</id>
    <revision>
      <id>100</id>
      <timestamp>2024-01-15T10:30:00Z</timestamp>
      <contributor><username>Editor</username><id>55</id></contributor>
      <text>The '''United States''' is a country in [[North America]].</text>
    </revision>
  </page>
  <page>
    <title>USA</title>
    <ns>0</ns>
    <id>31644</id>
    <redirect title="United States" />
    <revision>
      <id>101</id>
      <text>#REDIRECT [[United States]] {{R from abbreviation}}</text>
    </revision>
  </page>
  <page>
    <title>U.S.A.</title>
    <ns>0</ns>
    <id>31645</id>
    <revision>
      <id>102</id>
      <text>#redirect [[USA]]</text>
    </revision>
  </page>
  <page>
    <title>Talk:United States</title>
    <ns>1</ns>
    <id>12347</id>
    <revision>
      <id>103</id>
      <text>Discussion about the article &amp; its sources.</text>
    </revision>
  </page>
</mediawiki>
"#;

    fn records(source: &mut WikimediaSource) -> Vec<ArticleRecord> {
        source
            .iter_records()
            .collect::<Result<Vec<_>, _>>()
            .unwrap()
    }

    #[test]
    fn test_parse_sample_xml() {
        let mut source = WikimediaSource::from_xml_string(SAMPLE_XML);
        let records = records(&mut source);

        // Talk page filtered by namespace
        assert_eq!(records.len(), 3);

        let article = &records[0];
        assert_eq!(article.id, "3434750");
        assert_eq!(article.title, "United States");
        assert_eq!(article.record_type, RecordType::Article);
        assert!(article.redirect_target.is_none());
        assert!(article.text.contains("[[North America]]"));
        assert!(article.modified.is_some());

        let redirect = &records[1];
        assert_eq!(redirect.record_type, RecordType::Redirect);
        assert_eq!(redirect.redirect_target.as_deref(), Some("United States"));
    }

    #[test]
    fn test_redirect_detected_from_text() {
        let mut source = WikimediaSource::from_xml_string(SAMPLE_XML);
        let records = records(&mut source);

        let redirect = &records[2];
        assert_eq!(redirect.title, "U.S.A.");
        assert!(redirect.is_redirect());
        assert_eq!(redirect.redirect_target.as_deref(), Some("USA"));
    }

    #[test]
    fn test_all_namespaces() {
        let mut source = WikimediaSource::from_xml_string(SAMPLE_XML).with_namespaces(&[]);
        let records = records(&mut source);

        assert_eq!(records.len(), 4);
        assert_eq!(records[3].record_type, RecordType::Other);
        assert_eq!(records[3].namespace, 1);
        assert!(records[3].text.contains("article & its"));
    }

    #[test]
    fn test_open_plain_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("dewiki-latest-pages-articles.xml");
        std::fs::write(&path, SAMPLE_XML).unwrap();

        let mut source = WikimediaSource::open(&path).unwrap();
        assert_eq!(source.source_name(), "dewiki-latest-pages-articles.xml");
        assert_eq!(source.base_url(), "https://de.wikipedia.org/wiki/");
        assert_eq!(records(&mut source).len(), 3);
    }

    #[test]
    fn test_open_rejects_unknown_format() {
        let result = WikimediaSource::open("dump.zim");
        assert!(matches!(result, Err(ImportError::InvalidFormat(_))));
    }

    /// Cut the sample right after `marker`
    fn cut_after(marker: &str) -> String {
        let end = SAMPLE_XML.find(marker).unwrap() + marker.len();
        SAMPLE_XML[..end].to_string()
    }

    fn assert_first_page_then_error(xml: &str) {
        let mut source = WikimediaSource::from_xml_string(xml);
        let results: Vec<_> = source.iter_records().collect();

        // The first page survives; iteration stops at the damage
        assert_eq!(results.len(), 2, "{:?}", results);
        assert_eq!(results[0].as_ref().unwrap().title, "United States");
        assert!(matches!(results[1], Err(ImportError::XmlParse(_))));
    }

    #[test]
    fn test_truncated_inside_tag() {
        assert_first_page_then_error(&format!("{}</tit", cut_after("<title>USA")));
    }

    #[test]
    fn test_truncated_inside_text() {
        assert_first_page_then_error(&cut_after("#REDIRECT [[United"));
    }

    #[test]
    fn test_truncated_at_element_boundary() {
        assert_first_page_then_error(&cut_after("<title>USA</title>"));
    }

    #[test]
    fn test_truncated_between_pages() {
        let first_page_end = SAMPLE_XML.find("</page>").unwrap() + "</page>".len();
        assert_first_page_then_error(&SAMPLE_XML[..first_page_end]);
    }

    #[test]
    fn test_fragment_without_root_ends_cleanly() {
        let xml = "<page><title>A</title><ns>0</ns><id>1</id>\
                   <revision><text>Plain text.</text></revision></page>";
        let mut source = WikimediaSource::from_xml_string(xml);
        assert_eq!(records(&mut source).len(), 1);
    }

    #[test]
    fn test_base_url_detection() {
        assert_eq!(
            base_url_for("enwiki-latest-pages-articles.xml.bz2"),
            "https://en.wikipedia.org/wiki/"
        );
        assert_eq!(
            base_url_for("simplewiki-20240101-pages-articles.xml"),
            "https://simple.wikipedia.org/wiki/"
        );
        assert_eq!(
            base_url_for("zh_min_nanwiki-latest.xml"),
            "https://zh-min-nan.wikipedia.org/wiki/"
        );
        assert_eq!(base_url_for("dump.xml"), DEFAULT_BASE_URL);
    }
}
