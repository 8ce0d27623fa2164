//! # Vault Paths
//!
//! Every path the engine handles is **vault-relative** and in canonical form:
//! `/`-separated, no leading or trailing slash, no `.` segments, no runs of
//! separators. The vault root itself is the empty string.
//!
//! Canonical form matters because paths are join keys: a master chunk's source path
//! is compared against the path of a changed document, and `Notes//a.md` must not be
//! treated as a different document from `Notes/a.md`.

use std::path::Path;

const MARKDOWN_EXT: &str = ".md";

/// Normalizes a path to the vault's canonical form.
///
/// Backslashes become slashes, duplicate separators collapse, `.` segments and
/// leading/trailing slashes are dropped, and non-breaking spaces become plain spaces.
pub fn normalize_path(raw: &str) -> String {
    raw.replace('\u{00A0}', " ")
        .split(['/', '\\'])
        .filter(|segment| !segment.is_empty() && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// Vault-relative canonical path of `abs`, if it lies strictly under `root`.
pub fn relative_path(root: &Path, abs: &Path) -> Option<String> {
    let rel = abs.strip_prefix(root).ok()?;
    let joined = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect::<Vec<_>>()
        .join("/");
    let path = normalize_path(&joined);
    (!path.is_empty()).then_some(path)
}

/// Joins a folder and a child name, normalizing the result.
pub fn join(folder: &str, name: &str) -> String {
    normalize_path(&format!("{}/{}", folder, name))
}

/// The folder containing `path`, or `None` for top-level entries.
pub fn parent(path: &str) -> Option<&str> {
    path.rfind('/').map(|idx| &path[..idx])
}

/// Last path segment.
pub fn file_name(path: &str) -> &str {
    path.rsplit('/').next().unwrap_or(path)
}

/// Human readable label for a document: its file name without the extension.
pub fn display_name(path: &str) -> String {
    let name = file_name(path);
    match name.rfind('.') {
        Some(idx) if idx > 0 => name[..idx].to_string(),
        _ => name.to_string(),
    }
}

pub fn is_markdown(path: &str) -> bool {
    path.len() > MARKDOWN_EXT.len()
        && path
            .get(path.len() - MARKDOWN_EXT.len()..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(MARKDOWN_EXT))
}

/// True if any segment is a dot-entry (`.obsidian`, `.git`, `.trash`, temp files).
pub fn is_hidden(path: &str) -> bool {
    path.split('/').any(|segment| segment.starts_with('.'))
}

/// Whether `path` is a document the engine should look at.
pub fn is_tracked_document(path: &str) -> bool {
    is_markdown(path) && !is_hidden(path)
}

/// Path of the master document for a callout type: `<folder>/<kind>.md`.
pub fn master_path(folder: &str, kind: &str) -> String {
    join(folder, &format!("{}{}", kind, MARKDOWN_EXT))
}

/// Appends `.md` to a link target that carries no extension, as wiki links do.
pub fn with_markdown_ext(path: &str) -> String {
    if file_name(path).contains('.') {
        path.to_string()
    } else {
        format!("{}{}", path, MARKDOWN_EXT)
    }
}

/// Maps `path` from under `from` to under `to`.
///
/// Matches either the exact path (a renamed file) or anything below it (a renamed
/// folder). Returns `None` when `path` is unaffected.
pub fn rebase(path: &str, from: &str, to: &str) -> Option<String> {
    if path == from {
        return Some(to.to_string());
    }
    path.strip_prefix(from)
        .and_then(|rest| rest.strip_prefix('/'))
        .map(|rest| join(to, rest))
}

/// True if `path` is `prefix` itself or lives below it.
pub fn is_within(path: &str, prefix: &str) -> bool {
    rebase(path, prefix, prefix).is_some()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_collapses_separators_and_dots() {
        assert_eq!(normalize_path("/Notes//daily\\2024.md/"), "Notes/daily/2024.md");
        assert_eq!(normalize_path("./a/./b.md"), "a/b.md");
        assert_eq!(normalize_path(""), "");
        assert_eq!(normalize_path("/"), "");
    }

    #[test]
    fn normalize_replaces_non_breaking_space() {
        assert_eq!(normalize_path("My\u{00A0}Note.md"), "My Note.md");
    }

    #[test]
    fn display_name_strips_extension_and_folders() {
        assert_eq!(display_name("Projects/Shopping.md"), "Shopping");
        assert_eq!(display_name("v1.2 notes.md"), "v1.2 notes");
        assert_eq!(display_name(".hidden"), ".hidden");
    }

    #[test]
    fn markdown_detection_is_case_insensitive() {
        assert!(is_markdown("a/B.MD"));
        assert!(is_markdown("x.md"));
        assert!(!is_markdown(".md"));
        assert!(!is_markdown("image.png"));
    }

    #[test]
    fn markdown_detection_survives_multibyte_names() {
        assert!(!is_markdown("Ideas 💡"));
        assert!(!is_markdown("photo😀"));
        assert!(!is_tracked_document("Inbox/Ideas 💡"));
        assert!(is_markdown("Ideas 💡.md"));
    }

    #[test]
    fn relative_path_under_root() {
        let root = Path::new("/vault");
        assert_eq!(
            relative_path(root, Path::new("/vault/Notes/a.md")).as_deref(),
            Some("Notes/a.md")
        );
        assert_eq!(relative_path(root, Path::new("/vault")), None);
        assert_eq!(relative_path(root, Path::new("/elsewhere/a.md")), None);
    }

    #[test]
    fn hidden_segments_are_not_tracked() {
        assert!(!is_tracked_document(".obsidian/workspace.md"));
        assert!(!is_tracked_document("notes/.callout-1234.tmp"));
        assert!(is_tracked_document("notes/today.md"));
    }

    #[test]
    fn master_path_respects_folder() {
        assert_eq!(master_path("", "todo"), "todo.md");
        assert_eq!(master_path("Masters/", "questions"), "Masters/questions.md");
    }

    #[test]
    fn wiki_targets_gain_markdown_extension() {
        assert_eq!(with_markdown_ext("Projects/Shopping"), "Projects/Shopping.md");
        assert_eq!(with_markdown_ext("Shopping.md"), "Shopping.md");
    }

    #[test]
    fn rebase_handles_files_and_folders() {
        assert_eq!(rebase("a.md", "a.md", "b.md").as_deref(), Some("b.md"));
        assert_eq!(
            rebase("old/sub/n.md", "old", "new").as_deref(),
            Some("new/sub/n.md")
        );
        assert_eq!(rebase("older/n.md", "old", "new"), None);
        assert!(is_within("old/n.md", "old"));
        assert!(!is_within("oldish.md", "old"));
    }

    #[test]
    fn parent_of_top_level_is_none() {
        assert_eq!(parent("a.md"), None);
        assert_eq!(parent("x/y/a.md"), Some("x/y"));
    }
}
