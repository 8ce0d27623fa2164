//! # Line Model
//!
//! The engine treats every document as a sequence of lines and every change as a
//! replacement of a line range. This module holds the primitives for that model.
//!
//! ## Lossless Splitting
//!
//! [`LineBuf`] splits text on `\n` and remembers whether the text ended with a
//! newline, so `LineBuf::parse(t).render() == t` for every input. Parsing a document
//! that needs no changes must hand back byte-identical text, otherwise the
//! write-only-on-change guard would fire on every pass.
//!
//! ## Range Edits and Index Safety
//!
//! An [`Edit`] replaces `lines[start..end]` with `insert`. [`apply_edits`] applies a
//! batch **in descending order of `start`**: splicing at a high index never moves a
//! lower one, so every edit computed against the original line numbers stays valid.
//! Edits in a batch must not overlap.
//!
//! ## Block Identifiers
//!
//! A block identifier line holds exactly `^token` where the token is ASCII
//! alphanumeric, `-` or `_`. Generated identifiers are eight lowercase alphanumerics.

use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;
use uuid::Uuid;

pub const ID_LEN: usize = 8;
const ID_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Bytes of a v4 UUID that are fully random (6 and 8 carry version/variant bits).
const RANDOM_BYTES: [usize; ID_LEN] = [0, 1, 2, 3, 4, 5, 10, 11];

static ID_LINE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\^([A-Za-z0-9_-]+)$").expect("valid id line regex"));

static TRAILING_BLOCK_REF_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?:^|\s)\^([A-Za-z0-9_-]+)\s*$").expect("valid block ref regex"));

/// A document split into lines, remembering its trailing newline.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct LineBuf {
    pub lines: Vec<String>,
    pub trailing_newline: bool,
}

impl LineBuf {
    pub fn parse(text: &str) -> Self {
        if text.is_empty() {
            return Self::default();
        }
        let (body, trailing_newline) = match text.strip_suffix('\n') {
            Some(body) => (body, true),
            None => (text, false),
        };
        Self {
            lines: body.split('\n').map(str::to_string).collect(),
            trailing_newline,
        }
    }

    pub fn from_lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            trailing_newline: true,
        }
    }

    pub fn render(&self) -> String {
        if self.lines.is_empty() {
            return String::new();
        }
        let mut text = self.lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn len(&self) -> usize {
        self.lines.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    /// Index of the first line at or after `from` that is not blank.
    pub fn next_non_blank(&self, from: usize) -> Option<usize> {
        (from..self.lines.len()).find(|&idx| !is_blank(&self.lines[idx]))
    }
}

/// One line-range replacement: `lines[start..end]` becomes `insert`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edit {
    pub start: usize,
    pub end: usize,
    pub insert: Vec<String>,
}

impl Edit {
    pub fn replace(start: usize, end: usize, insert: Vec<String>) -> Self {
        Self { start, end, insert }
    }

    pub fn delete(start: usize, end: usize) -> Self {
        Self::replace(start, end, Vec::new())
    }

    pub fn insert_at(at: usize, insert: Vec<String>) -> Self {
        Self::replace(at, at, insert)
    }

    /// Net change in line count once applied.
    pub fn delta(&self) -> isize {
        self.insert.len() as isize - (self.end - self.start) as isize
    }
}

/// Applies non-overlapping edits highest-`start` first.
///
/// Pure insertions sharing a `start` land in the order they were given.
/// Returns the number of edits applied.
pub fn apply_edits(lines: &mut Vec<String>, edits: Vec<Edit>) -> usize {
    let mut ordered: Vec<Edit> = edits.into_iter().rev().collect();
    ordered.sort_by(|a, b| b.start.cmp(&a.start));

    let count = ordered.len();
    for edit in ordered {
        let end = edit.end.min(lines.len());
        let start = edit.start.min(end);
        lines.splice(start..end, edit.insert);
    }
    count
}

pub fn is_blank(line: &str) -> bool {
    line.trim().is_empty()
}

/// Removes one leading block-quote marker (`>` plus at most one space).
///
/// Lines without a marker come back unchanged.
pub fn strip_quote_marker(line: &str) -> &str {
    let trimmed = line.trim_start();
    match trimmed.strip_prefix('>') {
        Some(rest) => rest.strip_prefix(' ').unwrap_or(rest),
        None => line,
    }
}

/// True if the line starts a block quote, ignoring indentation.
pub fn is_quoted(line: &str) -> bool {
    line.trim_start().starts_with('>')
}

/// Wraps body lines for storage inside a block quote.
///
/// Blank lines become a bare `>` so the quote is not broken.
pub fn quote_lines<S: AsRef<str>>(lines: &[S]) -> Vec<String> {
    lines
        .iter()
        .map(|line| {
            let line = line.as_ref();
            if is_blank(line) {
                ">".to_string()
            } else {
                format!("> {}", line)
            }
        })
        .collect()
}

/// The slice without its trailing whitespace-only lines.
pub fn trim_trailing_blank<S: AsRef<str>>(lines: &[S]) -> &[S] {
    let keep = lines
        .iter()
        .rposition(|line| !is_blank(line.as_ref()))
        .map_or(0, |idx| idx + 1);
    &lines[..keep]
}

/// Returns the token of a line that holds exactly `^token`.
pub fn recognize_identifier_line(line: &str) -> Option<&str> {
    ID_LINE_RE
        .captures(line.trim())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// Every block identifier declared in the lines, standalone or at a line end.
pub fn collect_identifiers<S: AsRef<str>>(lines: &[S]) -> HashSet<String> {
    lines
        .iter()
        .filter_map(|line| TRAILING_BLOCK_REF_RE.captures(line.as_ref()))
        .filter_map(|caps| caps.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// A fresh eight-character lowercase alphanumeric identifier.
///
/// Collision-prone at scale: fine for one personal vault, not for many writers.
pub fn generate_identifier() -> String {
    let bytes = Uuid::new_v4().into_bytes();
    RANDOM_BYTES
        .iter()
        .map(|&idx| ID_ALPHABET[bytes[idx] as usize % ID_ALPHABET.len()] as char)
        .collect()
}

/// Draws identifiers until one is not in `taken`.
pub fn generate_unique_identifier(taken: &HashSet<String>) -> String {
    loop {
        let candidate = generate_identifier();
        if !taken.contains(&candidate) {
            return candidate;
        }
    }
}
