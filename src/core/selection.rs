//! Selection state and text extraction
//!
//! Selections address lines by the grid's signed offsets, so they span
//! scrollback and page uniformly. This is read-only state for the host:
//! nothing the application writes ever consults it.

use serde::{Deserialize, Serialize};

use crate::core::grid::Grid;

/// A selection endpoint: signed line offset (negative = scrollback) plus
/// column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SelectionPoint {
    pub line: isize,
    pub col: usize,
}

impl SelectionPoint {
    pub fn new(line: isize, col: usize) -> Self {
        Self { line, col }
    }
}

/// How endpoints expand into a selected region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SelectionMode {
    /// Character-linear between the endpoints.
    #[default]
    Linear,
    /// Whole lines.
    Lines,
    /// Rectangular block.
    Block,
}

/// An active or cleared selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub mode: SelectionMode,
    pub anchor: SelectionPoint,
    pub focus: SelectionPoint,
    pub active: bool,
}

impl Selection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&mut self, at: SelectionPoint, mode: SelectionMode) {
        self.mode = mode;
        self.anchor = at;
        self.focus = at;
        self.active = true;
    }

    pub fn extend(&mut self, to: SelectionPoint) {
        if self.active {
            self.focus = to;
        }
    }

    pub fn clear(&mut self) {
        self.active = false;
    }

    /// Endpoints ordered top-to-bottom.
    pub fn ordered(&self) -> (SelectionPoint, SelectionPoint) {
        if (self.anchor.line, self.anchor.col) <= (self.focus.line, self.focus.col) {
            (self.anchor, self.focus)
        } else {
            (self.focus, self.anchor)
        }
    }

    /// Whether a cell lies inside the selection.
    pub fn contains(&self, line: isize, col: usize) -> bool {
        if !self.active {
            return false;
        }
        let (start, end) = self.ordered();
        match self.mode {
            SelectionMode::Lines => line >= start.line && line <= end.line,
            SelectionMode::Block => {
                let (lo, hi) = if start.col <= end.col {
                    (start.col, end.col)
                } else {
                    (end.col, start.col)
                };
                line >= start.line && line <= end.line && col >= lo && col <= hi
            }
            SelectionMode::Linear => {
                if line < start.line || line > end.line {
                    false
                } else if start.line == end.line {
                    col >= start.col && col <= end.col
                } else if line == start.line {
                    col >= start.col
                } else if line == end.line {
                    col <= end.col
                } else {
                    true
                }
            }
        }
    }

    /// Extract the selected text. Soft-wrapped line boundaries join
    /// without a newline; hard boundaries insert one.
    pub fn extract(&self, grid: &Grid) -> String {
        if !self.active {
            return String::new();
        }
        let (start, end) = self.ordered();
        let mut out = String::new();
        for line_offset in start.line..=end.line {
            let Some(line) = grid.line_at(line_offset) else {
                continue;
            };
            let occupied = line.occupied_len();
            let mut row = String::new();
            for (col, cell) in line.cells()[..occupied].iter().enumerate() {
                if cell.is_continuation() || !self.contains(line_offset, col) {
                    continue;
                }
                if cell.content().is_empty() {
                    row.push(' ');
                } else {
                    row.push_str(cell.content());
                }
            }
            if line_offset > start.line {
                let wrapped = grid.line_at(line_offset).map_or(false, |l| l.wrapped);
                if !wrapped || self.mode == SelectionMode::Block {
                    out.push('\n');
                }
            }
            out.push_str(row.trim_end());
        }
        out
    }
}
