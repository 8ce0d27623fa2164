//! # Editing Surface
//!
//! The interactive "insert a new callout" affordance talks to whatever holds the
//! document being edited through [`EditingSurface`]: read the cursor, insert text,
//! move the cursor. [`TextBuffer`] is a plain in-memory implementation used by the
//! `insert` command.
//!
//! A skeleton looks like this, with the cursor left after `> ` on the item line:
//!
//! ```text
//! > [!todo]
//! > |
//!
//! ^k3f9a2xq
//!
//! ```

use crate::lines::is_blank;

/// A cursor position. `ch` counts characters, not bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    pub line: usize,
    pub ch: usize,
}

impl Position {
    pub fn new(line: usize, ch: usize) -> Self {
        Self { line, ch }
    }
}

pub trait EditingSurface {
    fn cursor(&self) -> Position;
    fn insert_text_at(&mut self, position: Position, text: &str);
    fn set_cursor(&mut self, position: Position);
}

/// The skeleton text for a callout of `kind` with identifier `id`.
pub fn skeleton(kind: &str, id: &str) -> String {
    format!("> [!{}]\n> \n\n^{}\n\n", kind, id)
}

/// Inserts a skeleton at the cursor and moves the cursor onto its item line.
///
/// When the cursor is mid-line the skeleton starts on the next line.
pub fn insert_skeleton<E: EditingSurface>(editor: &mut E, kind: &str, id: &str) -> Position {
    let at = editor.cursor();
    let (text, header_line) = if at.ch > 0 {
        (format!("\n{}", skeleton(kind, id)), at.line + 1)
    } else {
        (skeleton(kind, id), at.line)
    };
    editor.insert_text_at(at, &text);

    let item = Position::new(header_line + 1, 2);
    editor.set_cursor(item);
    item
}

/// A document held in memory, edited through [`EditingSurface`].
#[derive(Debug, Clone, Default)]
pub struct TextBuffer {
    text: String,
    cursor: Position,
}

impl TextBuffer {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            cursor: Position::default(),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn into_text(self) -> String {
        self.text
    }

    /// Number of lines, counting the empty line after a trailing newline.
    pub fn line_count(&self) -> usize {
        self.text.split('\n').count()
    }

    pub fn line(&self, idx: usize) -> Option<&str> {
        self.text.split('\n').nth(idx)
    }

    /// The position right after the last character.
    pub fn end(&self) -> Position {
        let last = self.line_count() - 1;
        let ch = self.line(last).map_or(0, |line| line.chars().count());
        Position::new(last, ch)
    }

    /// Start of line `line`, clamped to the end of the document.
    pub fn line_start(&self, line: usize) -> Position {
        if line >= self.line_count() {
            return self.end();
        }
        Position::new(line, 0)
    }

    /// Makes sure the line before `position` is blank, inserting one if needed.
    ///
    /// Keeps a new callout from being read as part of a quote right above it.
    pub fn separate_from_previous(&mut self, position: Position) -> Position {
        if position.line == 0 || position.ch > 0 {
            return position;
        }
        match self.line(position.line - 1) {
            Some(prev) if !is_blank(prev) => {
                self.insert_text_at(position, "\n");
                Position::new(position.line + 1, 0)
            }
            _ => position,
        }
    }

    fn byte_offset(&self, position: Position) -> usize {
        let mut offset = 0;
        for (idx, line) in self.text.split('\n').enumerate() {
            if idx == position.line {
                let within = line
                    .char_indices()
                    .nth(position.ch)
                    .map_or(line.len(), |(byte, _)| byte);
                return offset + within;
            }
            offset += line.len() + 1;
        }
        self.text.len()
    }
}

impl EditingSurface for TextBuffer {
    fn cursor(&self) -> Position {
        self.cursor
    }

    fn insert_text_at(&mut self, position: Position, text: &str) {
        let offset = self.byte_offset(position);
        self.text.insert_str(offset, text);
    }

    fn set_cursor(&mut self, position: Position) {
        self.cursor = position;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn skeleton_at_line_start() {
        let mut buffer = TextBuffer::new("# Title\n\nafter\n");
        buffer.set_cursor(Position::new(2, 0));

        let item = insert_skeleton(&mut buffer, "todo", "abc12345");
        assert_eq!(
            buffer.text(),
            "# Title\n\n> [!todo]\n> \n\n^abc12345\n\nafter\n"
        );
        assert_eq!(item, Position::new(3, 2));
        assert_eq!(buffer.cursor(), item);
        assert_eq!(buffer.line(3), Some("> "));
    }

    #[test]
    fn skeleton_mid_line_starts_on_next_line() {
        let mut buffer = TextBuffer::new("some text");
        buffer.set_cursor(buffer.end());

        let item = insert_skeleton(&mut buffer, "questions", "q1");
        assert_eq!(buffer.text(), "some text\n> [!questions]\n> \n\n^q1\n\n");
        assert_eq!(item, Position::new(2, 2));
    }

    #[test]
    fn separate_from_previous_adds_blank_line() {
        let mut buffer = TextBuffer::new("> [!todo]\n> a\n");
        let at = buffer.separate_from_previous(buffer.line_start(2));
        assert_eq!(buffer.text(), "> [!todo]\n> a\n\n");
        assert_eq!(at, Position::new(3, 0));

        let again = buffer.separate_from_previous(at);
        assert_eq!(again, at);
    }

    #[test]
    fn positions_count_characters() {
        let mut buffer = TextBuffer::new("héllo\n");
        buffer.insert_text_at(Position::new(0, 2), "X");
        assert_eq!(buffer.text(), "héXllo\n");
        buffer.insert_text_at(Position::new(9, 9), "end");
        assert_eq!(buffer.text(), "héXllo\nend");
    }

    #[test]
    fn line_start_clamps_to_end() {
        let buffer = TextBuffer::new("a\nb");
        assert_eq!(buffer.line_start(10), Position::new(1, 1));
        assert_eq!(buffer.line_start(1), Position::new(1, 0));
    }
}
