//! One row of cells plus its line-level flags

use serde::{Deserialize, Serialize};

use crate::core::cell::{Cell, CellAttributes};
use crate::core::color::Color;

/// A line of the grid: a fixed-width run of cells with per-line flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Line {
    cells: Vec<Cell>,
    /// Continuation of the previous line (soft wrap).
    pub wrapped: bool,
    /// User bookmark (OSC 1337 SetMark).
    pub marked: bool,
}

impl Line {
    pub fn new(cols: usize) -> Self {
        Self {
            cells: vec![Cell::new(); cols],
            wrapped: false,
            marked: false,
        }
    }

    /// A blank line whose cells carry an erase background.
    pub fn blank(cols: usize, bg: Color) -> Self {
        let mut line = Self::new(cols);
        if bg != Color::Default {
            for cell in &mut line.cells {
                cell.attrs = CellAttributes::erased(bg);
            }
        }
        line
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn cell(&self, col: usize) -> Option<&Cell> {
        self.cells.get(col)
    }

    pub fn cell_mut(&mut self, col: usize) -> Option<&mut Cell> {
        self.cells.get_mut(col)
    }

    pub fn cells(&self) -> &[Cell] {
        &self.cells
    }

    pub fn cells_mut(&mut self) -> &mut [Cell] {
        &mut self.cells
    }

    /// Erase every cell; wrap state does not survive an erase.
    pub fn erase(&mut self, bg: Color) {
        for cell in &mut self.cells {
            cell.erase(bg);
        }
        self.wrapped = false;
    }

    /// Erase columns `from..` (EL 0).
    pub fn erase_from(&mut self, from: usize, bg: Color) {
        for cell in self.cells.iter_mut().skip(from) {
            cell.erase(bg);
        }
        self.repair_wide_span(from.saturating_sub(1), from);
    }

    /// Erase columns `..=to` (EL 1).
    pub fn erase_to(&mut self, to: usize, bg: Color) {
        for cell in self.cells.iter_mut().take(to + 1) {
            cell.erase(bg);
        }
        self.repair_wide_span(to, to.saturating_add(1));
    }

    /// Erase `count` cells starting at `col` without shifting (ECH).
    pub fn erase_range(&mut self, col: usize, count: usize, bg: Color) {
        let len = self.cells.len();
        let end = col.saturating_add(count).min(len);
        for cell in &mut self.cells[col.min(len)..end] {
            cell.erase(bg);
        }
        self.repair_wide_span(col.saturating_sub(1), end);
    }

    /// Insert blanks at `col`, shifting the remainder right within
    /// `..=right`; cells pushed past `right` are lost (ICH/DECIC).
    pub fn insert_cells(&mut self, col: usize, count: usize, right: usize, bg: Color) {
        let right = right.min(self.cells.len().saturating_sub(1));
        if col > right {
            return;
        }
        let count = count.min(right - col + 1);
        self.cells[col..=right].rotate_right(count);
        for cell in &mut self.cells[col..col + count] {
            cell.erase(bg);
        }
        self.repair_wide_span(col.saturating_sub(1), right.saturating_add(1));
    }

    /// Delete cells at `col`, shifting the remainder left within `..=right`
    /// and back-filling blanks (DCH/DECDC).
    pub fn delete_cells(&mut self, col: usize, count: usize, right: usize, bg: Color) {
        let right = right.min(self.cells.len().saturating_sub(1));
        if col > right {
            return;
        }
        let count = count.min(right - col + 1);
        self.cells[col..=right].rotate_left(count);
        for cell in &mut self.cells[right + 1 - count..=right] {
            cell.erase(bg);
        }
        self.repair_wide_span(col.saturating_sub(1), right.saturating_add(1));
    }

    /// Grow or shrink to `cols`, padding with blanks.
    pub fn resize(&mut self, cols: usize) {
        self.cells.resize_with(cols, Cell::new);
        let last = cols.saturating_sub(1);
        self.repair_wide_span(last, last);
    }

    /// Re-establish the wide-cell pairing invariant over a span that was
    /// just mutated: a width-2 cell without its continuation is erased, a
    /// continuation without its base becomes an ordinary blank.
    pub fn repair_wide_span(&mut self, start: usize, end: usize) {
        let len = self.cells.len();
        if len == 0 {
            return;
        }
        let start = start.min(len - 1);
        let end = end.min(len - 1);
        for i in start..=end {
            let cell = &self.cells[i];
            if cell.width() == 2 {
                let paired = i + 1 < len && self.cells[i + 1].is_continuation();
                if !paired {
                    let bg = self.cells[i].attrs.bg;
                    self.cells[i].erase(bg);
                }
            } else if cell.is_continuation() && (i == 0 || self.cells[i - 1].width() != 2) {
                let bg = self.cells[i].attrs.bg;
                self.cells[i].erase(bg);
            }
        }
    }

    /// Index of the last occupied cell plus one (trailing blanks trimmed).
    pub fn occupied_len(&self) -> usize {
        self.cells
            .iter()
            .rposition(|c| !c.is_blank())
            .map_or(0, |i| i + 1)
    }

    pub fn is_blank(&self) -> bool {
        self.cells.iter().all(Cell::is_blank)
    }

    /// Visible text of the line, trailing blanks trimmed, continuation
    /// cells skipped.
    pub fn text(&self) -> String {
        let mut out = String::new();
        for cell in &self.cells[..self.occupied_len()] {
            if cell.is_continuation() {
                continue;
            }
            if cell.content().is_empty() {
                out.push(' ');
            } else {
                out.push_str(cell.content());
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn filled(text: &str) -> Line {
        let mut line = Line::new(10);
        for (i, c) in text.chars().enumerate() {
            *line.cell_mut(i).unwrap() = Cell::with_char(c);
        }
        line
    }

    #[test]
    fn test_new_line_is_blank() {
        let line = Line::new(8);
        assert!(line.is_blank());
        assert!(!line.wrapped);
        assert_eq!(line.occupied_len(), 0);
    }

    #[test]
    fn test_text_trims_and_pads() {
        let mut line = Line::new(10);
        *line.cell_mut(0).unwrap() = Cell::with_char('a');
        *line.cell_mut(2).unwrap() = Cell::with_char('b');
        assert_eq!(line.text(), "a b");
    }

    #[test]
    fn test_erase_from_to() {
        let mut line = filled("ABCDEFGHIJ");
        line.erase_from(5, Color::Default);
        assert_eq!(line.text(), "ABCDE");

        let mut line = filled("ABCDEFGHIJ");
        line.erase_to(4, Color::Default);
        assert_eq!(line.cell(4).unwrap().display_char(), ' ');
        assert_eq!(line.cell(5).unwrap().display_char(), 'F');
    }

    #[test]
    fn test_insert_cells_respects_right_margin() {
        let mut line = filled("ABCDEFGHIJ");
        line.insert_cells(2, 3, 6, Color::Default);
        // ABCDEFG|HIJ with margin at 6: AB...CD|HIJ
        assert_eq!(line.cell(1).unwrap().display_char(), 'B');
        assert!(line.cell(2).unwrap().is_blank());
        assert!(line.cell(4).unwrap().is_blank());
        assert_eq!(line.cell(5).unwrap().display_char(), 'C');
        assert_eq!(line.cell(6).unwrap().display_char(), 'D');
        assert_eq!(line.cell(7).unwrap().display_char(), 'H');
    }

    #[test]
    fn test_delete_cells_backfills_blanks() {
        let mut line = filled("ABCDEFGHIJ");
        line.delete_cells(2, 3, 9, Color::Default);
        assert_eq!(line.text(), "ABFGHIJ");
        assert!(line.cell(7).unwrap().is_blank());
    }

    #[test]
    fn test_erase_range_clamps() {
        let mut line = filled("ABCDEFGHIJ");
        line.erase_range(8, 100, Color::Default);
        assert_eq!(line.text(), "ABCDEFGH");
    }

    #[test]
    fn test_resize_preserves_prefix() {
        let mut line = filled("ABC");
        line.resize(2);
        assert_eq!(line.len(), 2);
        line.resize(5);
        assert_eq!(line.len(), 5);
        assert_eq!(line.cell(0).unwrap().display_char(), 'A');
        assert!(line.cell(4).unwrap().is_blank());
    }
}
