//! Cursor state and DECSC/DECRC snapshots

use serde::{Deserialize, Serialize};

use crate::core::cell::CellAttributes;
use crate::core::charset::CharsetState;

/// Cursor shape selected by DECSCUSR.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CursorShape {
    #[default]
    Block,
    Underscore,
    Bar,
}

/// DECSCUSR style: shape plus blink.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CursorStyle {
    pub shape: CursorShape,
    pub blinking: bool,
}

impl Default for CursorStyle {
    fn default() -> Self {
        Self {
            shape: CursorShape::Block,
            blinking: true,
        }
    }
}

/// The active cursor: position within the page, current SGR rendition,
/// charset state and the wrap bookkeeping the print path needs.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Cursor {
    /// 0-based page line.
    pub line: usize,
    /// 0-based column.
    pub col: usize,
    pub attrs: CellAttributes,
    pub charsets: CharsetState,
    /// A glyph was written in the last column with autowrap on; the next
    /// printable wraps first.
    pub pending_wrap: bool,
    /// Active hyperlink id applied to written cells (0 = none).
    pub hyperlink_id: u32,
}

impl Cursor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reset position and rendition (RIS path).
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Everything DECSC captures and DECRC restores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SavedCursor {
    pub line: usize,
    pub col: usize,
    pub attrs: CellAttributes,
    pub charsets: CharsetState,
    pub origin_mode: bool,
    pub autowrap: bool,
    pub pending_wrap: bool,
    pub hyperlink_id: u32,
}

impl Default for SavedCursor {
    fn default() -> Self {
        // restoring without a prior save yields power-on state
        Self {
            line: 0,
            col: 0,
            attrs: CellAttributes::default(),
            charsets: CharsetState::default(),
            origin_mode: false,
            autowrap: true,
            pending_wrap: false,
            hyperlink_id: 0,
        }
    }
}

impl SavedCursor {
    pub fn capture(cursor: &Cursor, origin_mode: bool, autowrap: bool) -> Self {
        Self {
            line: cursor.line,
            col: cursor.col,
            attrs: cursor.attrs,
            charsets: cursor.charsets,
            origin_mode,
            autowrap,
            pending_wrap: cursor.pending_wrap,
            hyperlink_id: cursor.hyperlink_id,
        }
    }

    /// Restore into `cursor`; the caller reapplies origin/autowrap modes
    /// and clamps the position to the current page.
    pub fn restore(&self, cursor: &mut Cursor) {
        cursor.line = self.line;
        cursor.col = self.col;
        cursor.attrs = self.attrs;
        cursor.charsets = self.charsets;
        cursor.pending_wrap = self.pending_wrap;
        cursor.hyperlink_id = self.hyperlink_id;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::Color;

    #[test]
    fn test_cursor_default() {
        let cursor = Cursor::new();
        assert_eq!((cursor.line, cursor.col), (0, 0));
        assert!(!cursor.pending_wrap);
    }

    #[test]
    fn test_save_restore_full_tuple() {
        let mut cursor = Cursor::new();
        cursor.line = 3;
        cursor.col = 7;
        cursor.attrs.bold = true;
        cursor.attrs.fg = Color::Indexed(2);
        cursor.pending_wrap = true;
        cursor.hyperlink_id = 5;

        let saved = SavedCursor::capture(&cursor, true, false);
        assert!(saved.origin_mode);
        assert!(!saved.autowrap);

        let mut other = Cursor::new();
        saved.restore(&mut other);
        assert_eq!(other, cursor);
    }
}
