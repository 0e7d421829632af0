//! Grid cells and their display attributes

use serde::{Deserialize, Serialize};

use crate::core::color::Color;

/// Most combining marks a cell will hold beyond its base codepoint;
/// further marks are dropped rather than grown unboundedly.
pub const MAX_COMBINING: usize = 6;

/// Underline rendition variants (SGR 4:0 .. 4:5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum UnderlineStyle {
    #[default]
    None,
    Single,
    Double,
    Curly,
    Dotted,
    Dashed,
}

/// Rendition state carried by the cursor and stamped onto written cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CellAttributes {
    pub fg: Color,
    pub bg: Color,
    /// Underline color (SGR 58/59); `Default` means "use fg".
    pub underline_color: Color,
    pub bold: bool,
    pub faint: bool,
    pub italic: bool,
    pub underline: UnderlineStyle,
    pub blink: bool,
    pub inverse: bool,
    pub hidden: bool,
    pub crossed_out: bool,
    pub overline: bool,
    pub framed: bool,
    pub encircled: bool,
    /// DECSCA guard against selective erase.
    pub protected: bool,
}

impl CellAttributes {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        // protection is DECSCA state, not SGR state
        let protected = self.protected;
        *self = Self::default();
        self.protected = protected;
    }

    /// Attributes an erased cell keeps: background only.
    pub fn erased(bg: Color) -> Self {
        Self {
            bg,
            ..Self::default()
        }
    }

    pub fn effective_fg(&self) -> Color {
        if self.inverse {
            self.bg
        } else {
            self.fg
        }
    }

    pub fn effective_bg(&self) -> Color {
        if self.inverse {
            self.fg
        } else {
            self.bg
        }
    }
}

/// Reference from a cell to a slice of a registered image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFragment {
    pub image_id: u32,
    /// Cell offset into the image, in cells.
    pub row: u16,
    pub col: u16,
}

/// One cell of the grid.
///
/// The column position is implicit from the cell's index in its line. A
/// width-2 cell is always followed by a width-0 continuation cell.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cell {
    /// Base codepoint plus up to `MAX_COMBINING` combining marks; empty for
    /// blank and continuation cells.
    content: String,
    width: u8,
    pub attrs: CellAttributes,
    /// 0 = no hyperlink.
    pub hyperlink_id: u32,
    pub image: Option<ImageFragment>,
}

impl Default for Cell {
    fn default() -> Self {
        Self {
            content: String::new(),
            width: 1,
            attrs: CellAttributes::default(),
            hyperlink_id: 0,
            image: None,
        }
    }
}

impl Cell {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_char(c: char) -> Self {
        let mut cell = Self::default();
        cell.write(c, char_width(c), CellAttributes::default());
        cell
    }

    /// Stamp a fresh codepoint into the cell, replacing prior content.
    pub fn write(&mut self, c: char, width: usize, attrs: CellAttributes) {
        self.content.clear();
        self.content.push(c);
        self.width = width as u8;
        self.attrs = attrs;
        self.image = None;
    }

    /// Append a combining mark to the occupant, up to the cap.
    pub fn combine(&mut self, mark: char) {
        if !self.content.is_empty() && self.content.chars().count() <= MAX_COMBINING {
            self.content.push(mark);
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    /// First codepoint, or a space for blank cells.
    pub fn display_char(&self) -> char {
        self.content.chars().next().unwrap_or(' ')
    }

    pub fn is_blank(&self) -> bool {
        self.content.is_empty() || self.content == " "
    }

    pub fn width(&self) -> usize {
        usize::from(self.width)
    }

    /// Turn the cell into the spacer half of a wide character.
    pub fn make_continuation(&mut self, attrs: CellAttributes) {
        self.content.clear();
        self.width = 0;
        self.attrs = attrs;
        self.image = None;
    }

    pub fn is_continuation(&self) -> bool {
        self.width == 0
    }

    /// Erase to a blank cell keeping only the given background.
    pub fn erase(&mut self, bg: Color) {
        self.content.clear();
        self.width = 1;
        self.attrs = CellAttributes::erased(bg);
        self.hyperlink_id = 0;
        self.image = None;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Display width of a codepoint: 0 for combining marks, 2 for wide (CJK
/// and friends), otherwise 1.
pub fn char_width(c: char) -> usize {
    use unicode_width::UnicodeWidthChar;
    c.width().unwrap_or(1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_by_default() {
        let cell = Cell::new();
        assert!(cell.is_blank());
        assert_eq!(cell.width(), 1);
        assert_eq!(cell.display_char(), ' ');
    }

    #[test]
    fn test_write_and_erase() {
        let mut cell = Cell::with_char('A');
        cell.hyperlink_id = 3;
        assert_eq!(cell.display_char(), 'A');

        cell.erase(Color::Indexed(4));
        assert!(cell.is_blank());
        assert_eq!(cell.attrs.bg, Color::Indexed(4));
        assert_eq!(cell.attrs.fg, Color::Default);
        assert_eq!(cell.hyperlink_id, 0);
    }

    #[test]
    fn test_wide_and_continuation() {
        let mut wide = Cell::with_char('中');
        assert_eq!(wide.width(), 2);

        wide.make_continuation(CellAttributes::default());
        assert!(wide.is_continuation());
        assert!(wide.is_blank());
    }

    #[test]
    fn test_combining_cap() {
        let mut cell = Cell::with_char('e');
        for _ in 0..10 {
            cell.combine('\u{0301}');
        }
        assert_eq!(cell.content().chars().count(), 1 + MAX_COMBINING);
    }

    #[test]
    fn test_attrs_reset_keeps_protection() {
        let mut attrs = CellAttributes::new();
        attrs.bold = true;
        attrs.protected = true;
        attrs.reset();
        assert!(!attrs.bold);
        assert!(attrs.protected);
    }

    #[test]
    fn test_effective_colors_inverse() {
        let mut attrs = CellAttributes::new();
        attrs.fg = Color::Indexed(1);
        attrs.bg = Color::Indexed(2);
        attrs.inverse = true;
        assert_eq!(attrs.effective_fg(), Color::Indexed(2));
        assert_eq!(attrs.effective_bg(), Color::Indexed(1));
    }
}
