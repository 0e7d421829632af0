//! Read-only render snapshots
//!
//! The renderer thread reads the screen through these value snapshots; a
//! snapshot can also re-emit itself as a VT byte stream (`to_vt`) which,
//! fed to a fresh terminal of the same size, reproduces the page.

use serde::{Deserialize, Serialize};

use crate::core::cell::{Cell, CellAttributes, UnderlineStyle};
use crate::core::color::{Color, ColorPalette};
use crate::core::cursor::Cursor;
use crate::core::grid::Grid;
use crate::core::line::Line;

/// A frozen copy of the visible page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    lines: Vec<Line>,
    cols: usize,
    cursor_line: usize,
    cursor_col: usize,
    cursor_attrs: CellAttributes,
    cursor_visible: bool,
    palette: ColorPalette,
}

impl Snapshot {
    pub fn capture(grid: &Grid, cursor: &Cursor, palette: &ColorPalette, cursor_visible: bool) -> Self {
        Self {
            lines: grid.page().cloned().collect(),
            cols: grid.cols(),
            cursor_line: cursor.line,
            cursor_col: cursor.col,
            cursor_attrs: cursor.attrs,
            cursor_visible,
            palette: palette.clone(),
        }
    }

    pub fn rows(&self) -> usize {
        self.lines.len()
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn line(&self, row: usize) -> Option<&Line> {
        self.lines.get(row)
    }

    pub fn cell(&self, row: usize, col: usize) -> Option<&Cell> {
        self.lines.get(row).and_then(|l| l.cell(col))
    }

    pub fn cursor_position(&self) -> (usize, usize) {
        (self.cursor_line, self.cursor_col)
    }

    pub fn cursor_visible(&self) -> bool {
        self.cursor_visible
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    /// Plain text of the page, one string per line, trailing blanks
    /// trimmed.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for (i, line) in self.lines.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            out.push_str(&line.text());
        }
        out
    }

    /// Re-emit the page as VT sequences. Feeding the result to a fresh
    /// terminal of the same size reproduces every cell's content and
    /// rendition and the cursor position.
    pub fn to_vt(&self) -> Vec<u8> {
        let mut out = Vec::new();
        let mut current = CellAttributes::default();
        out.extend_from_slice(b"\x1b[H\x1b[0m");

        for (row, line) in self.lines.iter().enumerate() {
            out.extend_from_slice(format!("\x1b[{};1H", row + 1).as_bytes());
            let occupied = line.occupied_len();
            for cell in &line.cells()[..occupied] {
                if cell.is_continuation() {
                    continue;
                }
                if cell.attrs != current {
                    out.extend_from_slice(sgr_sequence(&cell.attrs).as_bytes());
                    current = cell.attrs;
                }
                if cell.content().is_empty() {
                    out.push(b' ');
                } else {
                    out.extend_from_slice(cell.content().as_bytes());
                }
            }
        }

        // final cursor state
        out.extend_from_slice(
            format!("\x1b[{};{}H", self.cursor_line + 1, self.cursor_col + 1).as_bytes(),
        );
        out.extend_from_slice(sgr_sequence(&self.cursor_attrs).as_bytes());
        out
    }

    /// Visual equality: same glyphs, widths and renditions everywhere and
    /// the same cursor position. Blank cells compare equal to space cells.
    pub fn visual_eq(&self, other: &Snapshot) -> bool {
        if self.rows() != other.rows()
            || self.cols != other.cols
            || (self.cursor_line, self.cursor_col) != (other.cursor_line, other.cursor_col)
        {
            return false;
        }
        self.lines.iter().zip(&other.lines).all(|(a, b)| {
            a.cells().iter().zip(b.cells()).all(|(x, y)| {
                x.display_char() == y.display_char()
                    && x.width() == y.width()
                    && x.attrs == y.attrs
            })
        })
    }
}

/// Render one attribute state as a full SGR sequence (reset + set).
fn sgr_sequence(attrs: &CellAttributes) -> String {
    let mut params = vec!["0".to_string()];
    if attrs.bold {
        params.push("1".into());
    }
    if attrs.faint {
        params.push("2".into());
    }
    if attrs.italic {
        params.push("3".into());
    }
    match attrs.underline {
        UnderlineStyle::None => {}
        UnderlineStyle::Single => params.push("4".into()),
        UnderlineStyle::Double => params.push("4:2".into()),
        UnderlineStyle::Curly => params.push("4:3".into()),
        UnderlineStyle::Dotted => params.push("4:4".into()),
        UnderlineStyle::Dashed => params.push("4:5".into()),
    }
    if attrs.blink {
        params.push("5".into());
    }
    if attrs.inverse {
        params.push("7".into());
    }
    if attrs.hidden {
        params.push("8".into());
    }
    if attrs.crossed_out {
        params.push("9".into());
    }
    if attrs.framed {
        params.push("51".into());
    }
    if attrs.encircled {
        params.push("52".into());
    }
    if attrs.overline {
        params.push("53".into());
    }
    match attrs.fg {
        Color::Default => {}
        Color::Indexed(i) if i < 8 => params.push(format!("{}", 30 + u16::from(i))),
        Color::Indexed(i) if i < 16 => params.push(format!("{}", 90 + u16::from(i) - 8)),
        Color::Indexed(i) => params.push(format!("38;5;{i}")),
        Color::Rgb(c) => params.push(format!("38;2;{};{};{}", c.r, c.g, c.b)),
    }
    match attrs.bg {
        Color::Default => {}
        Color::Indexed(i) if i < 8 => params.push(format!("{}", 40 + u16::from(i))),
        Color::Indexed(i) if i < 16 => params.push(format!("{}", 100 + u16::from(i) - 8)),
        Color::Indexed(i) => params.push(format!("48;5;{i}")),
        Color::Rgb(c) => params.push(format!("48;2;{};{};{}", c.r, c.g, c.b)),
    }
    match attrs.underline_color {
        Color::Default => {}
        Color::Indexed(i) => params.push(format!("58;5;{i}")),
        Color::Rgb(c) => params.push(format!("58;2;{};{};{}", c.r, c.g, c.b)),
    }
    format!("\x1b[{}m", params.join(";"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::cell::Cell;

    fn grid_with(text: &str) -> Grid {
        let mut grid = Grid::new(10, 3, 0);
        for (i, c) in text.chars().enumerate() {
            *grid.cell_mut(0, i).unwrap() = Cell::with_char(c);
        }
        grid
    }

    #[test]
    fn test_capture_and_text() {
        let grid = grid_with("hey");
        let snapshot = Snapshot::capture(&grid, &Cursor::new(), &ColorPalette::default(), true);
        assert_eq!(snapshot.rows(), 3);
        assert_eq!(snapshot.to_text(), "hey\n\n");
        assert_eq!(snapshot.cursor_position(), (0, 0));
    }

    #[test]
    fn test_to_vt_contains_content_and_cursor() {
        let grid = grid_with("ab");
        let mut cursor = Cursor::new();
        cursor.line = 1;
        cursor.col = 2;
        let snapshot = Snapshot::capture(&grid, &cursor, &ColorPalette::default(), true);
        let vt = String::from_utf8(snapshot.to_vt()).unwrap();
        assert!(vt.contains("ab"));
        assert!(vt.ends_with("\x1b[0m"));
        assert!(vt.contains("\x1b[2;3H"));
    }

    #[test]
    fn test_visual_eq_ignores_blank_vs_space() {
        let grid_a = grid_with("a");
        let mut grid_b = grid_with("a");
        *grid_b.cell_mut(0, 5).unwrap() = Cell::with_char(' ');

        let a = Snapshot::capture(&grid_a, &Cursor::new(), &ColorPalette::default(), true);
        let b = Snapshot::capture(&grid_b, &Cursor::new(), &ColorPalette::default(), true);
        assert!(a.visual_eq(&b));
    }

    #[test]
    fn test_sgr_sequence_round_trip_shape() {
        let mut attrs = CellAttributes::default();
        attrs.bold = true;
        attrs.fg = Color::Indexed(1);
        attrs.bg = Color::rgb(1, 2, 3);
        assert_eq!(sgr_sequence(&attrs), "\x1b[0;1;31;48;2;1;2;3m");
    }
}
