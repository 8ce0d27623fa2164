//! # Master Chunks
//!
//! A master document is a run of **chunks**, one per callout, each headed by a link
//! back to the callout's block:
//!
//! ```text
//! [Shopping](Shopping.md#^abc12345)      <- header: display, encoded path, block id
//! - [ ] buy milk                         <- body, unquoted
//!                                        <- one blank line closes the chunk
//! [[Projects/Garden#^q1w2e3r4|Garden]]   <- wiki-link headers are accepted too
//! - [ ] order seeds
//!
//! ```
//!
//! A chunk runs from its header up to the next header or the end of the document.
//! Its `end` covers trailing blank lines, so replacing the span leaves no strays,
//! while `body_lines` has them trimmed. Anything before the first header is preamble
//! and belongs to no chunk. Lines that merely look like links are never headers
//! unless the whole line is one.
//!
//! [`build`] renders the canonical form: markdown-link header with a URI-encoded
//! path, the body, one blank line. A body line that would itself read as a header
//! gets one extra leading backslash, which [`parse`] strips again.

use crate::lines::{trim_trailing_blank, LineBuf};
use crate::paths::{display_name, normalize_path, with_markdown_ext};
use once_cell::sync::Lazy;
use percent_encoding::{percent_decode_str, utf8_percent_encode, AsciiSet, CONTROLS};
use regex::Regex;

/// Characters escaped in link paths. Non-ASCII is always escaped.
const LINK_PATH: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'(')
    .add(b')')
    .add(b'<')
    .add(b'>')
    .add(b'[')
    .add(b']')
    .add(b'^')
    .add(b'`')
    .add(b'{')
    .add(b'|')
    .add(b'}')
    .add(b'\\');

static MARKDOWN_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[([^\]]*)\]\(([^)]+?)#\^([A-Za-z0-9_-]+)\)$")
        .expect("valid markdown link header regex")
});

static WIKI_HEADER_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^\[\[([^\]|#]+)#\^([A-Za-z0-9_-]+)(?:\|([^\]]*))?\]\]$")
        .expect("valid wiki link header regex")
});

/// One chunk of a master document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MasterChunk {
    pub display: String,
    /// Normalized vault path of the source document.
    pub source_path: String,
    pub block_id: String,
    /// Body with trailing blank lines trimmed.
    pub body_lines: Vec<String>,
    /// Header line index.
    pub start: usize,
    /// Exclusive end, including trailing blank lines.
    pub end: usize,
}

impl MasterChunk {
    pub fn key(&self) -> (&str, &str) {
        (&self.source_path, &self.block_id)
    }
}

#[derive(Debug, Clone)]
pub struct ParsedMaster {
    pub lines: LineBuf,
    pub chunks: Vec<MasterChunk>,
}

impl ParsedMaster {
    pub fn chunks_for<'a>(&'a self, source_path: &'a str) -> impl Iterator<Item = &'a MasterChunk> + 'a {
        self.chunks
            .iter()
            .filter(move |chunk| chunk.source_path == source_path)
    }
}

/// What a chunk is rendered from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkEntry {
    pub display: String,
    pub source_path: String,
    pub block_id: String,
    pub body_lines: Vec<String>,
}

impl ChunkEntry {
    /// Entry for a callout found in `source_path`, labelled with the file's name.
    pub fn for_source(source_path: &str, block_id: &str, body_lines: &[String]) -> Self {
        Self {
            display: display_name(source_path),
            source_path: source_path.to_string(),
            block_id: block_id.to_string(),
            body_lines: body_lines.to_vec(),
        }
    }
}

/// A recognized chunk header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkHeader {
    pub display: String,
    pub source_path: String,
    pub block_id: String,
}

pub fn parse_header(line: &str) -> Option<ChunkHeader> {
    let line = line.trim();

    if let Some(caps) = MARKDOWN_HEADER_RE.captures(line) {
        let raw_path = &caps[2];
        let decoded = percent_decode_str(raw_path)
            .decode_utf8()
            .map(|cow| cow.into_owned())
            .unwrap_or_else(|_| raw_path.to_string());
        let source_path = normalize_path(&decoded);
        if source_path.is_empty() {
            return None;
        }
        return Some(ChunkHeader {
            display: caps[1].to_string(),
            source_path,
            block_id: caps[3].to_string(),
        });
    }

    let caps = WIKI_HEADER_RE.captures(line)?;
    let source_path = normalize_path(&with_markdown_ext(caps[1].trim()));
    if source_path.is_empty() {
        return None;
    }
    let display = caps
        .get(3)
        .map(|m| m.as_str().to_string())
        .unwrap_or_else(|| display_name(&source_path));
    Some(ChunkHeader {
        display,
        source_path,
        block_id: caps[2].to_string(),
    })
}

/// Splits a master document into chunks.
pub fn parse(text: &str) -> ParsedMaster {
    let lines = LineBuf::parse(text);
    let headers: Vec<(usize, ChunkHeader)> = lines
        .lines
        .iter()
        .enumerate()
        .filter_map(|(idx, line)| parse_header(line).map(|header| (idx, header)))
        .collect();

    let mut chunks = Vec::with_capacity(headers.len());
    for (pos, (start, header)) in headers.iter().enumerate() {
        let end = headers
            .get(pos + 1)
            .map_or(lines.len(), |(next, _)| *next);
        let body_lines = trim_trailing_blank(&lines.lines[start + 1..end])
            .iter()
            .map(|line| unescape_body_line(line))
            .collect();
        chunks.push(MasterChunk {
            display: header.display.clone(),
            source_path: header.source_path.clone(),
            block_id: header.block_id.clone(),
            body_lines,
            start: *start,
            end,
        });
    }

    ParsedMaster { lines, chunks }
}

pub fn encode_path(path: &str) -> String {
    utf8_percent_encode(path, LINK_PATH).to_string()
}

/// The markdown-link header for a chunk.
pub fn header_line(display: &str, source_path: &str, block_id: &str) -> String {
    format!(
        "[{}]({}#^{})",
        display.replace(['[', ']'], ""),
        encode_path(source_path),
        block_id
    )
}

/// Renders a chunk: header, body, one blank line.
pub fn build(entry: &ChunkEntry) -> Vec<String> {
    let mut lines = Vec::with_capacity(entry.body_lines.len() + 2);
    lines.push(header_line(&entry.display, &entry.source_path, &entry.block_id));
    lines.extend(entry.body_lines.iter().map(|line| escape_body_line(line)));
    lines.push(String::new());
    lines
}

/// Splits off indentation and reports whether the rest, minus leading backslashes,
/// is a header.
fn split_header_like(line: &str) -> (&str, &str, bool) {
    let rest = line.trim_start();
    let indent = &line[..line.len() - rest.len()];
    let header_like = parse_header(rest.trim_start_matches('\\')).is_some();
    (indent, rest, header_like)
}

fn escape_body_line(line: &str) -> String {
    match split_header_like(line) {
        (indent, rest, true) => format!("{indent}\\{rest}"),
        _ => line.to_string(),
    }
}

fn unescape_body_line(line: &str) -> String {
    match split_header_like(line) {
        (indent, rest, true) if rest.starts_with('\\') => format!("{indent}{}", &rest[1..]),
        _ => line.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_renders_header_body_and_blank() {
        let entry = ChunkEntry::for_source("Shopping.md", "abc12345", &["- [ ] buy milk".into()]);
        let rendered = LineBuf::from_lines(build(&entry)).render();
        assert_eq!(rendered, "[Shopping](Shopping.md#^abc12345)\n- [ ] buy milk\n\n");
    }

    #[test]
    fn header_like_body_lines_stay_in_their_chunk() {
        for body in ["[x](y.md#^id)", "\\[x](y.md#^id)", "  [[y#^id]]", "plain"] {
            let entry = ChunkEntry::for_source("a.md", "t1", &[body.to_string()]);
            let text = LineBuf::from_lines(build(&entry)).render();
            let parsed = parse(&text);
            assert_eq!(parsed.chunks.len(), 1, "{text}");
            assert_eq!(parsed.chunks[0].body_lines, vec![body.to_string()]);
        }
    }

    #[test]
    fn header_like_body_line_is_escaped_once() {
        let entry = ChunkEntry::for_source("a.md", "t1", &["[x](y.md#^id)".into()]);
        let rendered = LineBuf::from_lines(build(&entry)).render();
        assert_eq!(rendered, "[a](a.md#^t1)\n\\[x](y.md#^id)\n\n");
    }

    #[test]
    fn header_encodes_path() {
        assert_eq!(
            header_line("My Note", "Daily/My Note (draft).md", "x1"),
            "[My Note](Daily/My%20Note%20%28draft%29.md#^x1)"
        );
        assert_eq!(header_line("Café", "Café.md", "x1"), "[Café](Caf%C3%A9.md#^x1)");
    }

    #[test]
    fn parses_encoded_markdown_header() {
        let header = parse_header("[My Note](Daily/My%20Note%20%28draft%29.md#^x1)").unwrap();
        assert_eq!(header.source_path, "Daily/My Note (draft).md");
        assert_eq!(header.display, "My Note");
        assert_eq!(header.block_id, "x1");
    }

    #[test]
    fn parses_wiki_header_and_completes_extension() {
        let header = parse_header("[[Projects/Garden#^q1w2e3r4|Garden plans]]").unwrap();
        assert_eq!(header.source_path, "Projects/Garden.md");
        assert_eq!(header.display, "Garden plans");
        assert_eq!(header.block_id, "q1w2e3r4");

        let bare = parse_header("[[Inbox.md#^zz]]").unwrap();
        assert_eq!(bare.source_path, "Inbox.md");
        assert_eq!(bare.display, "Inbox");
    }

    #[test]
    fn malformed_lines_are_not_headers() {
        for line in [
            "[Shopping](Shopping.md)",
            "[Shopping](Shopping.md#heading)",
            "see [Shopping](Shopping.md#^abc) for more",
            "[[Shopping]]",
            "- [ ] buy milk",
            "",
        ] {
            assert!(parse_header(line).is_none(), "{:?} parsed as header", line);
        }
    }

    #[test]
    fn chunks_span_to_next_header() {
        let text = "# Todo\n\n[A](A.md#^a1)\none\n\n\n[[B#^b1|B]]\ntwo\nthree\n";
        let parsed = parse(text);

        assert_eq!(parsed.chunks.len(), 2);
        let a = &parsed.chunks[0];
        assert_eq!((a.start, a.end), (2, 6));
        assert_eq!(a.body_lines, vec!["one"]);
        assert_eq!(a.key(), ("A.md", "a1"));

        let b = &parsed.chunks[1];
        assert_eq!((b.start, b.end), (6, 9));
        assert_eq!(b.body_lines, vec!["two", "three"]);
        assert_eq!(b.source_path, "B.md");
    }

    #[test]
    fn empty_master_has_no_chunks() {
        assert!(parse("").chunks.is_empty());
        assert!(parse("# Heading\n\nnotes\n").chunks.is_empty());
    }

    #[test]
    fn build_then_parse_recovers_entry() {
        let entry = ChunkEntry {
            display: "Weird [name]".into(),
            source_path: "a b/c#d.md".into(),
            block_id: "id-1".into(),
            body_lines: vec!["x".into(), "".into(), "y".into()],
        };
        let parsed = parse(&LineBuf::from_lines(build(&entry)).render());
        let chunk = &parsed.chunks[0];
        assert_eq!(chunk.source_path, entry.source_path);
        assert_eq!(chunk.block_id, entry.block_id);
        assert_eq!(chunk.display, "Weird name");
        assert_eq!(chunk.body_lines, entry.body_lines);
    }

    #[test]
    fn chunks_for_filters_by_source() {
        let parsed = parse("[A](A.md#^1)\na\n\n[B](B.md#^2)\nb\n\n[A](A.md#^3)\nc\n\n");
        let ids: Vec<_> = parsed.chunks_for("A.md").map(|c| c.block_id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
    }
}
