use crate::commands::{CmdMessage, CmdResult};
use crate::editor::{insert_skeleton, EditingSurface, TextBuffer};
use crate::engine::SyncEngine;
use crate::error::{CalloutError, Result};
use crate::lines::{collect_identifiers, generate_unique_identifier, LineBuf};
use crate::store::{read_if_exists, Vault};

/// Inserts a fresh callout skeleton of `kind` into `path` and syncs the document.
///
/// `line` is 1-based; the skeleton goes at the end of the document when absent.
/// A missing document is created.
pub fn run<V: Vault>(
    engine: &SyncEngine<V>,
    kind: &str,
    path: &str,
    line: Option<usize>,
) -> Result<CmdResult> {
    let kind = kind.trim().to_lowercase();
    if !engine.tracked().contains(&kind) {
        return Err(CalloutError::UnknownType(kind));
    }
    if engine.is_master(path) {
        return Err(CalloutError::Store(format!(
            "{} is a master document; add callouts to a source document",
            path
        )));
    }

    let text = read_if_exists(engine.vault(), path)?.unwrap_or_default();
    let id = generate_unique_identifier(&collect_identifiers(&LineBuf::parse(&text).lines));

    let mut buffer = TextBuffer::new(text);
    let at = match line {
        Some(n) => buffer.line_start(n.saturating_sub(1)),
        None => buffer.end(),
    };
    let at = buffer.separate_from_previous(at);
    buffer.set_cursor(at);
    let item = insert_skeleton(&mut buffer, &kind, &id);
    engine.vault().write(path, buffer.text())?;

    let mut result = CmdResult::default();
    result.written.push(path.to_string());
    result.absorb_report(engine.sync_source(path)?);
    result.add_message(CmdMessage::success(format!(
        "Inserted {} callout ^{} into {} (item on line {}).",
        kind,
        id,
        path,
        item.line + 1
    )));
    Ok(result)
}
