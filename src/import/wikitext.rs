//! WikiText processing
//!
//! Converts MediaWiki markup to plain text, extracts internal links and
//! redirect targets, and splits articles into paragraphs.

use crate::types::{normalize_title, Title, WikiLink};
use regex::Regex;
use std::sync::OnceLock;

// Lazy-compiled regex patterns
static RE_NOWIKI: OnceLock<Regex> = OnceLock::new();
static RE_PRE: OnceLock<Regex> = OnceLock::new();
static RE_EXTERNAL_LINK: OnceLock<Regex> = OnceLock::new();
static RE_EXTERNAL_BARE: OnceLock<Regex> = OnceLock::new();
static RE_HEADING: OnceLock<Regex> = OnceLock::new();
static RE_LIST: OnceLock<Regex> = OnceLock::new();
static RE_DEF_LIST: OnceLock<Regex> = OnceLock::new();
static RE_MAGIC_WORDS: OnceLock<Regex> = OnceLock::new();
static RE_REDIRECT: OnceLock<Regex> = OnceLock::new();
static RE_PARAGRAPH_BREAK: OnceLock<Regex> = OnceLock::new();

fn regex(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| Regex::new(pattern).expect("static regex pattern"))
}

/// Namespace prefixes whose links are not article links
const NON_ARTICLE_PREFIXES: &[&str] = &[
    "file:",
    "image:",
    "media:",
    "category:",
    "kategorie:",
    "catégorie:",
    "categoría:",
    "datei:",
    "fichier:",
    "archivo:",
    "wikt:",
    "wiktionary:",
    "wikipedia:",
    "wp:",
    "template:",
    "help:",
    "portal:",
    "special:",
];

/// A paragraph of an article: its plain text and the links it contains
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedParagraph {
    pub text: String,
    pub links: Vec<WikiLink>,
}

/// Piece of wikitext around internal links
enum Segment<'a> {
    Text(&'a str),
    /// Inner content of `[[...]]`
    Link(String),
}

/// WikiText parser that converts MediaWiki markup to plain text
pub struct WikiTextParser {
    /// Remove references and citations
    remove_refs: bool,
    /// Remove tables
    remove_tables: bool,
}

impl Default for WikiTextParser {
    fn default() -> Self {
        Self {
            remove_refs: true,
            remove_tables: true,
        }
    }
}

impl WikiTextParser {
    /// Create a new WikiText parser with default settings
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep `<ref>` content in the output
    pub fn keep_references(mut self) -> Self {
        self.remove_refs = false;
        self
    }

    /// Parse WikiText and return clean plaintext
    pub fn parse(&self, wikitext: &str) -> String {
        let text = self.strip_non_prose(wikitext);
        self.render(&text)
    }

    /// Internal article links, in document order
    pub fn extract_links(&self, wikitext: &str) -> Vec<WikiLink> {
        let text = self.strip_non_prose(wikitext);
        collect_links(&text)
    }

    /// Split an article into paragraphs separated by blank lines.
    ///
    /// Paragraphs that are empty once rendered (headings, leftover markup) are dropped.
    pub fn paragraphs(&self, wikitext: &str) -> Vec<ParsedParagraph> {
        let text = self.strip_non_prose(wikitext);
        let re_break = regex(&RE_PARAGRAPH_BREAK, r"\n[ \t]*\n");

        re_break
            .split(&text)
            .filter_map(|raw| {
                let rendered = self.render(raw);
                if rendered.is_empty() || is_heading_only(raw) {
                    return None;
                }
                Some(ParsedParagraph {
                    text: rendered,
                    links: collect_links(raw),
                })
            })
            .collect()
    }

    /// Target of a `#REDIRECT [[Target]]` page, normalized to title form
    pub fn redirect_target(wikitext: &str) -> Option<Title> {
        let re = regex(&RE_REDIRECT, r"(?i)^\s*#REDIRECT\s*:?\s*\[\[([^\]|]+)");
        let target = normalize_title(re.captures(wikitext)?.get(1)?.as_str());
        if target.is_empty() {
            None
        } else {
            Some(target)
        }
    }

    /// Remove everything that is never prose: comments, refs, tables, templates
    fn strip_non_prose(&self, wikitext: &str) -> String {
        let mut text = self.handle_nowiki(wikitext);
        text = self.remove_comments(&text);

        if self.remove_refs {
            text = self.remove_references(&text);
        }

        if self.remove_tables {
            text = self.remove_tables_markup(&text);
        }

        self.remove_templates(&text)
    }

    /// Turn stripped wikitext into plain text
    fn render(&self, text: &str) -> String {
        // [[link|display]] -> display
        let mut result = self.process_internal_links(text);

        // [url text] -> text
        result = self.process_external_links(&result);

        result = self.process_formatting(&result);

        let re_magic = regex(&RE_MAGIC_WORDS, r"__[A-Z]+__");
        result = re_magic.replace_all(&result, "").into_owned();

        self.clean_whitespace(&result)
    }

    /// Handle <nowiki> and <pre> blocks
    fn handle_nowiki(&self, text: &str) -> String {
        let re_nowiki = regex(&RE_NOWIKI, r"(?s)<nowiki>(.*?)</nowiki>");
        let result = re_nowiki.replace_all(text, "$1");

        let re_pre = regex(&RE_PRE, r"(?s)<pre>(.*?)</pre>");
        re_pre.replace_all(&result, "$1").into_owned()
    }

    /// Remove HTML/XML comments
    fn remove_comments(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut rest = text;

        while let Some(start) = rest.find("<!--") {
            result.push_str(&rest[..start]);
            match rest[start + 4..].find("-->") {
                Some(end) => rest = &rest[start + 4 + end + 3..],
                None => {
                    rest = "";
                    break;
                }
            }
        }

        result.push_str(rest);
        result
    }

    /// Remove <ref>...</ref> and <ref .../> tags
    fn remove_references(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let chars: Vec<char> = text.chars().collect();
        let mut i = 0;

        while i < chars.len() {
            if i + 4 < chars.len()
                && chars[i] == '<'
                && chars[i + 1].eq_ignore_ascii_case(&'r')
                && chars[i + 2].eq_ignore_ascii_case(&'e')
                && chars[i + 3].eq_ignore_ascii_case(&'f')
                && (chars[i + 4] == '>' || chars[i + 4].is_whitespace() || chars[i + 4] == '/')
            {
                let mut j = i + 4;
                while j < chars.len() && chars[j] != '>' {
                    j += 1;
                }

                if j >= chars.len() {
                    // Malformed tag, keep the rest
                    result.extend(&chars[i..]);
                    break;
                }

                // Self-closing <ref ... />
                if chars[j - 1] == '/' {
                    i = j + 1;
                    continue;
                }

                j += 1;
                let mut found_close = false;
                while j + 5 < chars.len() {
                    if chars[j] == '<'
                        && chars[j + 1] == '/'
                        && chars[j + 2].eq_ignore_ascii_case(&'r')
                        && chars[j + 3].eq_ignore_ascii_case(&'e')
                        && chars[j + 4].eq_ignore_ascii_case(&'f')
                    {
                        while j < chars.len() && chars[j] != '>' {
                            j += 1;
                        }
                        found_close = true;
                        i = j + 1;
                        break;
                    }
                    j += 1;
                }

                if !found_close {
                    // No closing tag, drop just the opening tag
                    while i < chars.len() && chars[i] != '>' {
                        i += 1;
                    }
                    i += 1;
                }
            } else {
                result.push(chars[i]);
                i += 1;
            }
        }

        result
    }

    /// Remove wiki tables {| ... |}
    fn remove_tables_markup(&self, text: &str) -> String {
        strip_nested(text, ('{', '|'), ('|', '}'))
    }

    /// Remove templates {{ ... }}
    fn remove_templates(&self, text: &str) -> String {
        strip_nested(text, ('{', '{'), ('}', '}'))
    }

    /// Process internal links [[link]] or [[link|display]]
    fn process_internal_links(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());

        for segment in segments(text) {
            match segment {
                Segment::Text(t) => result.push_str(t),
                Segment::Link(content) => {
                    if let Some(display) = link_display(&content) {
                        result.push_str(display);
                    }
                }
            }
        }

        result
    }

    /// Process external links [url text] -> text, [url] -> url
    fn process_external_links(&self, text: &str) -> String {
        let re = regex(&RE_EXTERNAL_LINK, r"\[https?://[^\s\]]+\s+([^\]]+)\]");
        let result = re.replace_all(text, "$1");

        let re_bare = regex(&RE_EXTERNAL_BARE, r"\[(https?://[^\s\]]+)\]");
        re_bare.replace_all(&result, "$1").into_owned()
    }

    /// Process formatting markup
    fn process_formatting(&self, text: &str) -> String {
        // '''''bold italic''''', '''bold''', ''italic''
        let mut result = text.replace("'''''", "").replace("'''", "").replace("''", "");

        // == Heading == -> Heading
        let re_heading = regex(&RE_HEADING, r"(?m)^={1,6}\s*(.*?)\s*={1,6}\s*$");
        result = re_heading.replace_all(&result, "$1\n").into_owned();

        result = result.replace("----", "");

        // ;term : definition -> term: definition
        let re_def = regex(&RE_DEF_LIST, r"(?m)^;([^:\n]+):(.+)$");
        result = re_def.replace_all(&result, "$1: $2").into_owned();

        let re_list = regex(&RE_LIST, r"(?m)^[*#:;]+[ \t]*");
        re_list.replace_all(&result, "").into_owned()
    }

    /// Clean up excessive whitespace
    fn clean_whitespace(&self, text: &str) -> String {
        let mut result = String::with_capacity(text.len());
        let mut prev_newline = false;
        let mut prev_space = false;

        for c in text.chars() {
            if c == '\n' {
                if !prev_newline {
                    if prev_space {
                        result.pop();
                    }
                    result.push('\n');
                    prev_newline = true;
                }
                prev_space = false;
            } else if c.is_whitespace() {
                if !prev_space && !prev_newline {
                    result.push(' ');
                    prev_space = true;
                }
            } else {
                result.push(c);
                prev_newline = false;
                prev_space = false;
            }
        }

        result.trim().to_string()
    }
}

/// Remove balanced `open ... close` spans, where both delimiters are two characters
fn strip_nested(text: &str, open: (char, char), close: (char, char)) -> String {
    let mut result = String::with_capacity(text.len());
    let mut depth = 0usize;
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == open.0 && chars.peek() == Some(&open.1) {
            depth += 1;
            chars.next();
        } else if depth > 0 && c == close.0 && chars.peek() == Some(&close.1) {
            depth -= 1;
            chars.next();
        } else if depth == 0 {
            result.push(c);
        }
    }

    result
}

/// Split text into plain runs and top-level `[[...]]` links (nesting aware)
fn segments(text: &str) -> Vec<Segment<'_>> {
    let mut out = Vec::new();
    let mut plain_start = 0;
    let mut i = 0;
    let bytes = text.as_bytes();

    while i + 1 < bytes.len() {
        if bytes[i] == b'[' && bytes[i + 1] == b'[' {
            if plain_start < i {
                out.push(Segment::Text(&text[plain_start..i]));
            }

            let mut depth = 1;
            let mut j = i + 2;
            let content_start = j;
            let mut content_end = bytes.len();

            while j < bytes.len() {
                if j + 1 < bytes.len() && bytes[j] == b'[' && bytes[j + 1] == b'[' {
                    depth += 1;
                    j += 2;
                } else if j + 1 < bytes.len() && bytes[j] == b']' && bytes[j + 1] == b']' {
                    depth -= 1;
                    if depth == 0 {
                        content_end = j;
                        j += 2;
                        break;
                    }
                    j += 2;
                } else {
                    j += 1;
                }
            }

            // An unterminated link swallows the rest of the text
            out.push(Segment::Link(text[content_start..content_end].to_string()));
            i = j;
            plain_start = j;
        } else {
            i += 1;
        }
    }

    if plain_start < text.len() {
        out.push(Segment::Text(&text[plain_start..]));
    }

    out
}

/// True for links into non-article namespaces or other wikis
fn is_non_article(content: &str) -> bool {
    let lower = content.trim_start().to_lowercase();
    if NON_ARTICLE_PREFIXES.iter().any(|p| lower.starts_with(p)) {
        return true;
    }

    // Interwiki: 2-3 letter language code (optionally with a -variant) before a colon
    match lower.find(':') {
        Some(colon) => {
            let prefix = &lower[..colon];
            let code = prefix.split('-').next().unwrap_or(prefix);
            (2..=3).contains(&code.len())
                && prefix.chars().all(|c| c.is_ascii_lowercase() || c == '-')
        }
        None => false,
    }
}

/// Display text of a link, or None when the link renders as nothing
fn link_display(content: &str) -> Option<&str> {
    if is_non_article(content) {
        return None;
    }

    let content = content.strip_prefix(':').unwrap_or(content);
    match content.find('|') {
        Some(pipe) if !content[pipe + 1..].trim().is_empty() => Some(&content[pipe + 1..]),
        Some(pipe) => Some(&content[..pipe]),
        None => Some(content),
    }
}

/// Article link carried by `[[content]]`, if any
fn parse_link(content: &str) -> Option<WikiLink> {
    if content.starts_with(':') || is_non_article(content) {
        return None;
    }

    let (raw_target, display) = match content.find('|') {
        Some(pipe) => (&content[..pipe], &content[pipe + 1..]),
        None => (content, content),
    };

    let target = normalize_title(raw_target);
    if target.is_empty() {
        return None;
    }

    let anchor = strip_formatting(display);
    let anchor = if anchor.is_empty() {
        strip_formatting(raw_target)
    } else {
        anchor
    };

    Some(WikiLink::new(target, anchor))
}

fn strip_formatting(text: &str) -> String {
    text.replace("'''", "")
        .replace("''", "")
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

fn collect_links(text: &str) -> Vec<WikiLink> {
    segments(text)
        .into_iter()
        .filter_map(|segment| match segment {
            Segment::Link(content) => parse_link(&content),
            Segment::Text(_) => None,
        })
        .collect()
}

fn is_heading_only(raw: &str) -> bool {
    let re_heading = regex(&RE_HEADING, r"(?m)^={1,6}\s*(.*?)\s*={1,6}\s*$");
    raw.lines()
        .filter(|l| !l.trim().is_empty())
        .all(|l| re_heading.is_match(l))
}
