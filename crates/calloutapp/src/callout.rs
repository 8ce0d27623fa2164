//! # Callout Parser
//!
//! Extracts tracked callout blocks from a source document:
//!
//! ```text
//! > [!todo]- Groceries        <- header (type "todo", modifier and title ignored)
//! > - [ ] buy milk            <- body: every following line starting with `>`
//! > - [ ] eggs
//!                             <- blank lines are skipped...
//! ^k3f9a2xq                   <- ...and the next line may hold the block identifier
//! ```
//!
//! Parsing is two pure phases. The scan walks the lines once and records every
//! tracked block. When identifier assignment is requested, the missing identifiers
//! become insertion [`Edit`]s applied to a copy of the lines, and the recorded line
//! numbers are shifted to match the new text. The scan never mutates what it reads.
//!
//! ## Identifier Assignment
//!
//! With `auto_assign_ids`, a block without an identifier gets a fresh one spliced in
//! right after its quote, on its own line with a blank line on both sides. Without
//! it, such blocks are left out of the result entirely: the master-to-source direction
//! must never make unsolicited edits to callouts it has no chunk for.
//!
//! Callouts of untracked types are skipped together with their quoted body.

use crate::lines::{
    apply_edits, collect_identifiers, generate_unique_identifier, is_blank, is_quoted,
    recognize_identifier_line, strip_quote_marker, trim_trailing_blank, Edit, LineBuf,
};
use once_cell::sync::Lazy;
use regex::Regex;

static HEADER_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*>\s*\[!([^\]\s]+)\]").expect("valid callout header regex"));

/// One tracked callout block as found in a source document.
///
/// Line numbers index into [`ParsedSource::lines`]. Invariant:
/// `start_line < quote_end_line <= id_line`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Callout {
    /// Lowercased callout type.
    pub kind: String,
    pub block_id: String,
    /// Body with quote markers stripped and trailing blanks trimmed.
    pub body_lines: Vec<String>,
    /// The `> [!type]` header line.
    pub start_line: usize,
    /// First line after the quoted body.
    pub quote_end_line: usize,
    /// The `^id` line.
    pub id_line: usize,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ParseOptions {
    pub auto_assign_ids: bool,
}

impl ParseOptions {
    pub fn assigning() -> Self {
        Self {
            auto_assign_ids: true,
        }
    }

    pub fn existing_only() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone)]
pub struct ParsedSource {
    pub lines: LineBuf,
    /// Callouts in document order.
    pub callouts: Vec<Callout>,
    /// How many identifiers were inserted into `lines`.
    pub assigned: usize,
}

impl ParsedSource {
    pub fn text(&self) -> String {
        self.lines.render()
    }

    pub fn changed(&self) -> bool {
        self.assigned > 0
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Callout> + 'a {
        self.callouts.iter().filter(move |c| c.kind == kind)
    }
}

/// The lowercased type of a callout header line, tracked or not.
pub fn header_kind(line: &str) -> Option<String> {
    HEADER_RE
        .captures(line)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_lowercase())
}

struct Scanned {
    kind: String,
    start: usize,
    quote_end: usize,
    body: Vec<String>,
    id: Option<(String, usize)>,
}

fn scan(lines: &[String], tracked: &[String]) -> Vec<Scanned> {
    let mut found = Vec::new();
    let mut idx = 0;

    while idx < lines.len() {
        let Some(kind) = header_kind(&lines[idx]) else {
            idx += 1;
            continue;
        };

        let start = idx;
        let mut quote_end = start + 1;
        while quote_end < lines.len() && is_quoted(&lines[quote_end]) {
            quote_end += 1;
        }

        if !tracked.iter().any(|t| *t == kind) {
            idx = quote_end;
            continue;
        }

        let stripped: Vec<&str> = lines[start + 1..quote_end]
            .iter()
            .map(|line| strip_quote_marker(line))
            .collect();
        let body = trim_trailing_blank(&stripped)
            .iter()
            .map(|s| s.to_string())
            .collect();

        let id = (quote_end..lines.len())
            .find(|&i| !is_blank(&lines[i]))
            .and_then(|i| recognize_identifier_line(&lines[i]).map(|id| (id.to_string(), i)));

        idx = id.as_ref().map_or(quote_end, |(_, line)| line + 1);
        found.push(Scanned {
            kind,
            start,
            quote_end,
            body,
            id,
        });
    }

    found
}

/// Parses the tracked callouts of `text`.
///
/// `tracked` holds lowercased type names. The returned text equals the input unless
/// identifiers were assigned; line numbers always refer to the returned text.
pub fn parse(text: &str, tracked: &[String], options: ParseOptions) -> ParsedSource {
    let mut lines = LineBuf::parse(text);
    let scanned = scan(&lines.lines, tracked);

    if !options.auto_assign_ids {
        let callouts = scanned
            .into_iter()
            .filter_map(|s| {
                let (block_id, id_line) = s.id?;
                Some(Callout {
                    kind: s.kind,
                    block_id,
                    body_lines: s.body,
                    start_line: s.start,
                    quote_end_line: s.quote_end,
                    id_line,
                })
            })
            .collect();
        return ParsedSource {
            lines,
            callouts,
            assigned: 0,
        };
    }

    let mut taken = collect_identifiers(&lines.lines);
    let mut edits = Vec::new();
    let mut callouts = Vec::with_capacity(scanned.len());
    let mut shift = 0;

    for s in scanned {
        let (block_id, id_line) = match s.id {
            Some((id, line)) => (id, line + shift),
            None => {
                let id = generate_unique_identifier(&taken);
                taken.insert(id.clone());

                let mut insert = vec![String::new(), format!("^{}", id)];
                let followed_by_blank = lines
                    .lines
                    .get(s.quote_end)
                    .is_some_and(|line| is_blank(line));
                if !followed_by_blank {
                    insert.push(String::new());
                }

                let id_line = s.quote_end + shift + 1;
                let inserted = insert.len();
                edits.push(Edit::insert_at(s.quote_end, insert));
                callouts.push(Callout {
                    kind: s.kind,
                    block_id: id,
                    body_lines: s.body,
                    start_line: s.start + shift,
                    quote_end_line: s.quote_end + shift,
                    id_line,
                });
                shift += inserted;
                continue;
            }
        };
        callouts.push(Callout {
            kind: s.kind,
            block_id,
            body_lines: s.body,
            start_line: s.start + shift,
            quote_end_line: s.quote_end + shift,
            id_line,
        });
    }

    let assigned = apply_edits(&mut lines.lines, edits);
    ParsedSource {
        lines,
        callouts,
        assigned,
    }
}
