//! # Reconciler
//!
//! Pure `text -> text` functions that make one document agree with another. Each one
//! parses its input fresh, computes a batch of [`Edit`]s against the parsed lines,
//! applies them highest-index-first with [`apply_edits`], and renders the result.
//! Callers compare the output with what is on disk and write only on difference, so
//! an up-to-date pair of documents produces no writes at all.
//!
//! ## Directions
//!
//! - [`source_to_master`]: a source document's callouts of one type are authoritative
//!   for that source's chunks in the type's master. Edited callouts replace their
//!   chunk, removed callouts delete it, new callouts are appended at the end.
//! - [`master_to_source`]: chunk bodies flow back into the callouts they came from.
//!   Only bodies change; this direction never creates or deletes a callout, and
//!   ignores chunks whose block identifier the source does not declare.
//! - [`rebuild_master`]: a master regenerated from scratch, sorted by source path and
//!   block identifier.
//! - [`rename_source`] / [`remove_source`]: structural updates after a document (or a
//!   whole folder) was renamed or deleted.
//!
//! ## Duplicate Chunks
//!
//! When a master holds several chunks for the same `(source, block id)` pair, the
//! first one is authoritative. `source_to_master` updates it and deletes the rest;
//! `master_to_source` reads only the first.

use crate::callout::{self, Callout, ParseOptions};
use crate::chunk::{self, build, header_line, ChunkEntry, MasterChunk};
use crate::lines::{apply_edits, quote_lines, trim_trailing_blank, Edit, LineBuf};
use crate::paths::{display_name, is_within, rebase};
use std::collections::{HashMap, HashSet};

/// Chunk entries for the callouts of one source document.
pub fn entries_for<'a, I>(source_path: &str, callouts: I) -> Vec<ChunkEntry>
where
    I: IntoIterator<Item = &'a Callout>,
{
    callouts
        .into_iter()
        .map(|c| ChunkEntry::for_source(source_path, &c.block_id, &c.body_lines))
        .collect()
}

/// Makes `source_path`'s chunks in a master match `current`.
pub fn source_to_master(master_text: &str, source_path: &str, current: &[ChunkEntry]) -> String {
    let parsed = chunk::parse(master_text);
    let mut lines = parsed.lines;

    let by_id: HashMap<&str, &ChunkEntry> = current
        .iter()
        .map(|entry| (entry.block_id.as_str(), entry))
        .collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut edits = Vec::new();

    for existing in parsed.chunks.iter().filter(|c| c.source_path == source_path) {
        let first = seen.insert(existing.block_id.as_str());
        match by_id.get(existing.block_id.as_str()) {
            Some(entry) if first => {
                edits.push(Edit::replace(existing.start, existing.end, build(entry)));
            }
            _ => edits.push(Edit::delete(existing.start, existing.end)),
        }
    }

    let missing: Vec<&ChunkEntry> = current
        .iter()
        .filter(|entry| !seen.contains(entry.block_id.as_str()))
        .collect();

    let mut touched = apply_edits(&mut lines.lines, edits) > 0;
    if !missing.is_empty() {
        append_chunks(&mut lines.lines, missing);
        touched = true;
    }
    if touched {
        lines.trailing_newline = true;
    }
    lines.render()
}

/// Appends chunks after exactly one blank line.
fn append_chunks<'a, I>(lines: &mut Vec<String>, entries: I)
where
    I: IntoIterator<Item = &'a ChunkEntry>,
{
    let keep = trim_trailing_blank(lines.as_slice()).len();
    lines.truncate(keep);
    if !lines.is_empty() {
        lines.push(String::new());
    }
    for entry in entries {
        lines.extend(build(entry));
    }
}

/// Writes chunk bodies back into the `kind` callouts of one source document.
///
/// `chunks` are the master chunks whose source is this document.
pub fn master_to_source(source_text: &str, kind: &str, chunks: &[&MasterChunk]) -> String {
    let parsed = callout::parse(
        source_text,
        &[kind.to_string()],
        ParseOptions::existing_only(),
    );

    let mut by_id: HashMap<&str, &MasterChunk> = HashMap::new();
    for chunk in chunks.iter().copied() {
        by_id.entry(chunk.block_id.as_str()).or_insert(chunk);
    }

    let edits: Vec<Edit> = parsed
        .callouts
        .iter()
        .filter_map(|callout| {
            let chunk = by_id.get(callout.block_id.as_str())?;
            if chunk.body_lines == callout.body_lines {
                return None;
            }
            Some(Edit::replace(
                callout.start_line + 1,
                callout.quote_end_line,
                quote_lines(&chunk.body_lines),
            ))
        })
        .collect();

    let mut lines = parsed.lines;
    apply_edits(&mut lines.lines, edits);
    lines.render()
}

/// Groups a master's chunks by source path, in first-appearance order.
pub fn group_by_source(chunks: &[MasterChunk]) -> Vec<(String, Vec<&MasterChunk>)> {
    let mut order: Vec<(String, Vec<&MasterChunk>)> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();
    for chunk in chunks {
        match index.get(chunk.source_path.as_str()) {
            Some(&pos) => order[pos].1.push(chunk),
            None => {
                index.insert(chunk.source_path.as_str(), order.len());
                order.push((chunk.source_path.clone(), vec![chunk]));
            }
        }
    }
    order
}

/// A master document rendered from scratch.
///
/// Entries are ordered by source path, then block identifier; repeated pairs keep
/// their first occurrence.
pub fn rebuild_master(mut entries: Vec<ChunkEntry>) -> String {
    entries.sort_by(|a, b| {
        a.source_path
            .cmp(&b.source_path)
            .then_with(|| a.block_id.cmp(&b.block_id))
    });
    entries.dedup_by(|b, a| a.source_path == b.source_path && a.block_id == b.block_id);

    let lines: Vec<String> = entries.iter().flat_map(build).collect();
    LineBuf::from_lines(lines).render()
}

/// Points chunks of a renamed document (or of documents in a renamed folder) at the
/// new path. Bodies and identifiers are left alone.
pub fn rename_source(master_text: &str, from: &str, to: &str) -> String {
    let parsed = chunk::parse(master_text);
    let edits: Vec<Edit> = parsed
        .chunks
        .iter()
        .filter_map(|chunk| {
            let moved = rebase(&chunk.source_path, from, to)?;
            let header = header_line(&display_name(&moved), &moved, &chunk.block_id);
            Some(Edit::replace(chunk.start, chunk.start + 1, vec![header]))
        })
        .collect();

    let mut lines = parsed.lines;
    apply_edits(&mut lines.lines, edits);
    lines.render()
}

/// Drops every chunk whose source is `path` or lies below it.
pub fn remove_source(master_text: &str, path: &str) -> String {
    let parsed = chunk::parse(master_text);
    let edits: Vec<Edit> = parsed
        .chunks
        .iter()
        .filter(|chunk| is_within(&chunk.source_path, path))
        .map(|chunk| Edit::delete(chunk.start, chunk.end))
        .collect();

    let mut lines = parsed.lines;
    apply_edits(&mut lines.lines, edits);
    lines.render()
}
