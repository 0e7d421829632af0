//! The screen: owner of the grids and all mutable terminal state
//!
//! Every VT operation the sequencer dispatches lands here. The screen owns
//! the primary and alternate buffers, cursor, margins, modes, tab stops,
//! palette and the hyperlink/image registries, and talks back to the host
//! exclusively through its `EventListener`.

use std::collections::HashSet;
use std::fmt::Write as _;

use crate::config::TerminalConfig;
use crate::core::cell::{char_width, CellAttributes, ImageFragment};
use crate::core::charset::{CharsetId, CharsetTable};
use crate::core::color::{
    format_color_report, Color, ColorPalette, DynamicColor, Rgb,
};
use crate::core::cursor::{Cursor, CursorShape, CursorStyle, SavedCursor};
use crate::core::grid::Grid;
use crate::core::hyperlink::HyperlinkRegistry;
use crate::core::image::{ImageRegistry, ImageSize};
use crate::core::modes::{AnsiMode, DecMode, ModeManager};
use crate::core::snapshot::Snapshot;
use crate::core::tabs::TabStops;
use crate::events::{EventListener, WindowResize};

/// Maximum depth of the window title stack (`CSI 22/23 t`).
const TITLE_STACK_DEPTH: usize = 10;

/// Which buffer is addressable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BufferKind {
    #[default]
    Primary,
    Alternate,
}

/// Vertical and horizontal margins, inclusive 0-based offsets.
/// Left/right only constrain operations while DECLRMM is set.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margins {
    pub top: usize,
    pub bottom: usize,
    pub left: usize,
    pub right: usize,
}

/// DECRQSS targets this terminal can answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusString {
    Sgr,
    Decscl,
    Decscusr,
    Decsca,
    Decstbm,
    Decslrm,
}

impl StatusString {
    /// Map the DECRQSS payload onto a known target.
    pub fn from_payload(data: &str) -> Option<Self> {
        match data {
            "m" => Some(StatusString::Sgr),
            "\"p" => Some(StatusString::Decscl),
            " q" => Some(StatusString::Decscusr),
            "\"q" => Some(StatusString::Decsca),
            "r" => Some(StatusString::Decstbm),
            "s" => Some(StatusString::Decslrm),
            _ => None,
        }
    }
}

/// One screen buffer: its grid, saved cursor and hyperlink namespace.
#[derive(Debug)]
struct Buffer {
    grid: Grid,
    saved_cursor: SavedCursor,
    hyperlinks: HyperlinkRegistry,
}

impl Buffer {
    fn new(cols: usize, rows: usize, max_history: usize) -> Self {
        Self {
            grid: Grid::new(cols, rows, max_history),
            saved_cursor: SavedCursor::default(),
            hyperlinks: HyperlinkRegistry::new(),
        }
    }
}

/// The terminal screen.
pub struct Screen<L: EventListener> {
    listener: L,
    config: TerminalConfig,
    primary: Buffer,
    alternate: Buffer,
    active: BufferKind,
    cursor: Cursor,
    modes: ModeManager,
    margins: Margins,
    tabs: TabStops,
    palette: ColorPalette,
    images: ImageRegistry,
    title: String,
    title_stack: Vec<String>,
    working_directory: String,
    cursor_style: CursorStyle,
    /// Last printed codepoint, the REP target.
    preceding_char: Option<char>,
}

impl<L: EventListener> Screen<L> {
    pub fn new(config: TerminalConfig, listener: L) -> Self {
        let cols = config.cols.max(1);
        let rows = config.rows.max(1);
        Self {
            primary: Buffer::new(cols, rows, config.max_history),
            alternate: Buffer::new(cols, rows, 0),
            active: BufferKind::Primary,
            cursor: Cursor::new(),
            modes: ModeManager::new(),
            margins: Margins {
                top: 0,
                bottom: rows - 1,
                left: 0,
                right: cols - 1,
            },
            tabs: TabStops::new(cols, config.tab_width),
            palette: config.palette.clone(),
            images: ImageRegistry::new(),
            title: String::new(),
            title_stack: Vec::new(),
            working_directory: String::new(),
            cursor_style: CursorStyle::default(),
            preceding_char: None,
            listener,
            config,
        }
    }

    // ---- accessors ------------------------------------------------------

    pub fn cols(&self) -> usize {
        self.grid().cols()
    }

    pub fn rows(&self) -> usize {
        self.grid().rows()
    }

    pub fn grid(&self) -> &Grid {
        match self.active {
            BufferKind::Primary => &self.primary.grid,
            BufferKind::Alternate => &self.alternate.grid,
        }
    }

    fn grid_mut(&mut self) -> &mut Grid {
        match self.active {
            BufferKind::Primary => &mut self.primary.grid,
            BufferKind::Alternate => &mut self.alternate.grid,
        }
    }

    fn buffer_mut(&mut self) -> &mut Buffer {
        match self.active {
            BufferKind::Primary => &mut self.primary,
            BufferKind::Alternate => &mut self.alternate,
        }
    }

    pub fn active_buffer(&self) -> BufferKind {
        self.active
    }

    pub fn cursor(&self) -> &Cursor {
        &self.cursor
    }

    pub fn cursor_mut(&mut self) -> &mut Cursor {
        &mut self.cursor
    }

    pub fn attrs_mut(&mut self) -> &mut CellAttributes {
        &mut self.cursor.attrs
    }

    pub fn modes(&self) -> &ModeManager {
        &self.modes
    }

    pub fn margins(&self) -> Margins {
        self.margins
    }

    pub fn palette(&self) -> &ColorPalette {
        &self.palette
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    pub fn hyperlink_uri(&self, id: u32) -> Option<&str> {
        let buffer = match self.active {
            BufferKind::Primary => &self.primary,
            BufferKind::Alternate => &self.alternate,
        };
        buffer.hyperlinks.get(id).map(|l| l.uri.as_str())
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn working_directory(&self) -> &str {
        &self.working_directory
    }

    pub fn cursor_style(&self) -> CursorStyle {
        self.cursor_style
    }

    pub fn config(&self) -> &TerminalConfig {
        &self.config
    }

    pub fn listener(&self) -> &L {
        &self.listener
    }

    pub fn listener_mut(&mut self) -> &mut L {
        &mut self.listener
    }

    pub fn snapshot(&self) -> Snapshot {
        Snapshot::capture(self.grid(), &self.cursor, &self.palette, self.modes.get(DecMode::VisibleCursor))
    }

    fn origin_mode(&self) -> bool {
        self.modes.get(DecMode::Origin)
    }

    fn autowrap(&self) -> bool {
        self.modes.get(DecMode::AutoWrap)
    }

    /// Effective horizontal margins (full width unless DECLRMM is set).
    fn h_margins(&self) -> (usize, usize) {
        if self.modes.get(DecMode::LeftRightMargin) {
            (self.margins.left, self.margins.right)
        } else {
            (0, self.cols() - 1)
        }
    }

    fn bg(&self) -> Color {
        self.cursor.attrs.bg
    }

    /// True when a full-width scroll at the page top should feed history.
    fn scrolls_into_history(&self) -> bool {
        let (left, right) = self.h_margins();
        self.active == BufferKind::Primary
            && self.margins.top == 0
            && left == 0
            && right == self.cols() - 1
    }

    // ---- host events ----------------------------------------------------

    pub fn reply(&mut self, data: impl AsRef<[u8]>) {
        self.listener.reply(data.as_ref());
    }

    pub fn bell(&mut self) {
        self.listener.bell();
    }

    // ---- printing -------------------------------------------------------

    /// Write one decoded codepoint at the cursor.
    pub fn write_char(&mut self, c: char) {
        let c = self.cursor.charsets.map(c);
        let width = char_width(c);

        // zero-width codepoints combine into the preceding cell
        if width == 0 {
            let (line, col) = if self.cursor.col > 0 && !self.cursor.pending_wrap {
                (self.cursor.line, self.cursor.col - 1)
            } else {
                (self.cursor.line, self.cursor.col)
            };
            // land on the base cell of a wide character, not its spacer
            let col = match self.grid().cell(line, col) {
                Some(cell) if cell.is_continuation() && col > 0 => col - 1,
                _ => col,
            };
            if let Some(cell) = self.grid_mut().cell_mut(line, col) {
                cell.combine(c);
            }
            return;
        }

        let (left, right) = self.h_margins();

        if self.cursor.pending_wrap {
            self.cursor.pending_wrap = false;
            if self.autowrap() {
                self.cursor.col = left;
                self.index();
                let line = self.cursor.line;
                if let Some(l) = self.grid_mut().line_mut(line) {
                    l.wrapped = true;
                }
            }
        }

        // a wide glyph that cannot fit before the margin wraps (or pins)
        if width == 2 && self.cursor.col + 1 > right {
            if self.autowrap() {
                self.cursor.col = left;
                self.index();
                let line = self.cursor.line;
                if let Some(l) = self.grid_mut().line_mut(line) {
                    l.wrapped = true;
                }
            } else {
                self.cursor.col = right.saturating_sub(1);
            }
        }

        let line = self.cursor.line;
        let col = self.cursor.col;
        let attrs = self.cursor.attrs;
        let hyperlink_id = self.cursor.hyperlink_id;
        let bg = self.bg();

        if self.modes.get_ansi(AnsiMode::Insert) {
            if let Some(l) = self.grid_mut().line_mut(line) {
                l.insert_cells(col, width, right, bg);
            }
        }

        self.release_cell_image(line, col);
        if let Some(cell) = self.grid_mut().cell_mut(line, col) {
            cell.write(c, width, attrs);
            cell.hyperlink_id = hyperlink_id;
        }
        if width == 2 {
            self.release_cell_image(line, col + 1);
            if let Some(cell) = self.grid_mut().cell_mut(line, col + 1) {
                cell.make_continuation(attrs);
                cell.hyperlink_id = hyperlink_id;
            }
        }
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.repair_wide_span(col.saturating_sub(1), col + width);
        }

        self.preceding_char = Some(c);

        let next = col + width;
        if next > right {
            if self.autowrap() {
                self.cursor.col = right;
                self.cursor.pending_wrap = true;
            } else {
                self.cursor.col = (right + 1).saturating_sub(width);
            }
        } else {
            self.cursor.col = next;
        }
    }

    /// REP: repeat the preceding graphic character.
    pub fn repeat_preceding(&mut self, count: usize) {
        if let Some(c) = self.preceding_char {
            let limit = self.cols();
            for _ in 0..count.min(limit) {
                self.write_char(c);
            }
        }
    }

    // ---- simple cursor control ------------------------------------------

    pub fn backspace(&mut self) {
        let (left, _) = self.h_margins();
        self.cursor.pending_wrap = false;
        if self.cursor.col > left {
            self.cursor.col -= 1;
        } else if self.cursor.col > 0 {
            self.cursor.col -= 1;
        }
    }

    pub fn carriage_return(&mut self) {
        let (left, _) = self.h_margins();
        self.cursor.pending_wrap = false;
        self.cursor.col = if self.cursor.col >= left { left } else { 0 };
    }

    /// LF/VT/FF; honors LNM.
    pub fn linefeed(&mut self) {
        self.index();
        if self.modes.get_ansi(AnsiMode::AutomaticNewline) {
            self.carriage_return();
        }
    }

    /// IND: down one line, scrolling at the bottom margin.
    pub fn index(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.line == self.margins.bottom {
            self.scroll_up_internal(1);
        } else if self.cursor.line + 1 < self.rows() {
            self.cursor.line += 1;
        }
    }

    /// RI: up one line, scrolling down at the top margin.
    pub fn reverse_index(&mut self) {
        self.cursor.pending_wrap = false;
        if self.cursor.line == self.margins.top {
            self.scroll_down_internal(1);
        } else if self.cursor.line > 0 {
            self.cursor.line -= 1;
        }
    }

    /// NEL.
    pub fn next_line(&mut self) {
        self.index();
        self.carriage_return();
    }

    pub fn move_to_next_tab(&mut self) {
        self.cursor.pending_wrap = false;
        let (_, right) = self.h_margins();
        self.cursor.col = self.tabs.next(self.cursor.col).min(right);
    }

    pub fn cursor_forward_tab(&mut self, count: usize) {
        for _ in 0..count {
            self.move_to_next_tab();
        }
    }

    pub fn cursor_backward_tab(&mut self, count: usize) {
        self.cursor.pending_wrap = false;
        for _ in 0..count {
            self.cursor.col = self.tabs.previous(self.cursor.col);
        }
    }

    // ---- parameterized cursor motion ------------------------------------

    pub fn move_cursor_up(&mut self, n: usize) {
        self.cursor.pending_wrap = false;
        let floor = if self.cursor.line >= self.margins.top {
            self.margins.top
        } else {
            0
        };
        self.cursor.line = self.cursor.line.saturating_sub(n.max(1)).max(floor);
    }

    pub fn move_cursor_down(&mut self, n: usize) {
        self.cursor.pending_wrap = false;
        let ceil = if self.cursor.line <= self.margins.bottom {
            self.margins.bottom
        } else {
            self.rows() - 1
        };
        self.cursor.line = (self.cursor.line + n.max(1)).min(ceil);
    }

    pub fn move_cursor_forward(&mut self, n: usize) {
        self.cursor.pending_wrap = false;
        let (_, right) = self.h_margins();
        let ceil = if self.cursor.col <= right {
            right
        } else {
            self.cols() - 1
        };
        self.cursor.col = (self.cursor.col + n.max(1)).min(ceil);
    }

    pub fn move_cursor_backward(&mut self, n: usize) {
        self.cursor.pending_wrap = false;
        let (left, _) = self.h_margins();
        let floor = if self.cursor.col >= left { left } else { 0 };
        self.cursor.col = self.cursor.col.saturating_sub(n.max(1)).max(floor);
    }

    /// CHA/HPA target, 0-based, origin-aware.
    pub fn move_cursor_to_column(&mut self, col: usize) {
        self.cursor.pending_wrap = false;
        let (left, right) = self.h_margins();
        self.cursor.col = if self.origin_mode() {
            (left + col).min(right)
        } else {
            col.min(self.cols() - 1)
        };
    }

    /// VPA target, 0-based, origin-aware.
    pub fn move_cursor_to_line(&mut self, line: usize) {
        self.cursor.pending_wrap = false;
        self.cursor.line = if self.origin_mode() {
            (self.margins.top + line).min(self.margins.bottom)
        } else {
            line.min(self.rows() - 1)
        };
    }

    /// CUP/HVP, both 0-based.
    pub fn move_cursor_to(&mut self, line: usize, col: usize) {
        self.move_cursor_to_line(line);
        self.move_cursor_to_column(col);
    }

    pub fn move_cursor_to_next_line(&mut self, n: usize) {
        self.move_cursor_down(n);
        self.carriage_return();
    }

    pub fn move_cursor_to_prev_line(&mut self, n: usize) {
        self.move_cursor_up(n);
        self.carriage_return();
    }

    // ---- save / restore --------------------------------------------------

    pub fn save_cursor(&mut self) {
        let saved = SavedCursor::capture(&self.cursor, self.origin_mode(), self.autowrap());
        self.buffer_mut().saved_cursor = saved;
    }

    pub fn restore_cursor(&mut self) {
        let saved = match self.active {
            BufferKind::Primary => self.primary.saved_cursor.clone(),
            BufferKind::Alternate => self.alternate.saved_cursor.clone(),
        };
        saved.restore(&mut self.cursor);
        self.modes.set(DecMode::Origin, saved.origin_mode);
        self.modes.set(DecMode::AutoWrap, saved.autowrap);
        self.cursor.line = self.cursor.line.min(self.rows() - 1);
        self.cursor.col = self.cursor.col.min(self.cols() - 1);
    }

    // ---- scrolling -------------------------------------------------------

    fn scroll_up_internal(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        let (left, right) = self.h_margins();
        let bg = self.bg();
        let full_width = left == 0 && right == self.cols() - 1;

        if full_width && self.scrolls_into_history() {
            self.grid_mut().scroll_up_into_history(bottom, n, bg);
        } else if full_width {
            self.grid_mut().scroll_up(top, bottom, n, bg);
        } else {
            self.grid_mut().scroll_rect_up(top, bottom, left, right, n, bg);
        }
    }

    fn scroll_down_internal(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        let (left, right) = self.h_margins();
        let bg = self.bg();
        if left == 0 && right == self.cols() - 1 {
            self.grid_mut().scroll_down(top, bottom, n, bg);
        } else {
            self.grid_mut().scroll_rect_down(top, bottom, left, right, n, bg);
        }
    }

    /// SU.
    pub fn scroll_up(&mut self, n: usize) {
        self.scroll_up_internal(n.max(1));
    }

    /// SD.
    pub fn scroll_down(&mut self, n: usize) {
        self.scroll_down_internal(n.max(1));
    }

    // ---- erase -----------------------------------------------------------

    pub fn clear_to_end_of_screen(&mut self) {
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        self.grid_mut().erase_below(line, col, bg);
    }

    pub fn clear_to_begin_of_screen(&mut self) {
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        self.grid_mut().erase_above(line, col, bg);
    }

    pub fn clear_screen(&mut self) {
        let bg = self.bg();
        self.grid_mut().erase_page(bg);
        self.prune_registries();
    }

    pub fn clear_scrollback(&mut self) {
        self.primary.grid.clear_history();
        self.prune_registries();
    }

    pub fn clear_to_end_of_line(&mut self) {
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.erase_from(col, bg);
        }
    }

    pub fn clear_to_begin_of_line(&mut self) {
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.erase_to(col, bg);
        }
    }

    pub fn clear_line(&mut self) {
        let (line, bg) = (self.cursor.line, self.bg());
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.erase(bg);
        }
    }

    /// ECH; protected cells survive.
    pub fn erase_characters(&mut self, n: usize) {
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        let end = col.saturating_add(n.max(1)).min(self.cols());
        if let Some(l) = self.grid_mut().line_mut(line) {
            for cell in &mut l.cells_mut()[col..end] {
                if !cell.attrs.protected {
                    cell.erase(bg);
                }
            }
            l.repair_wide_span(col.saturating_sub(1), end);
        }
    }

    /// DECSED/DECSEL share this: erase unprotected cells in a page span.
    fn selective_erase_line_span(&mut self, line: usize, from: usize, to: usize) {
        let bg = self.bg();
        let cols = self.cols();
        if let Some(l) = self.grid_mut().line_mut(line) {
            let to = to.min(cols.saturating_sub(1));
            for cell in &mut l.cells_mut()[from..=to] {
                if !cell.attrs.protected {
                    cell.erase(bg);
                }
            }
            l.repair_wide_span(from.saturating_sub(1), to.saturating_add(1));
        }
    }

    pub fn selective_erase_to_end_of_screen(&mut self) {
        let (line, col) = (self.cursor.line, self.cursor.col);
        let (cols, rows) = (self.cols(), self.rows());
        self.selective_erase_line_span(line, col, cols - 1);
        for row in line + 1..rows {
            self.selective_erase_line_span(row, 0, cols - 1);
        }
    }

    pub fn selective_erase_to_begin_of_screen(&mut self) {
        let (line, col) = (self.cursor.line, self.cursor.col);
        let cols = self.cols();
        for row in 0..line {
            self.selective_erase_line_span(row, 0, cols - 1);
        }
        self.selective_erase_line_span(line, 0, col);
    }

    pub fn selective_erase_screen(&mut self) {
        let (cols, rows) = (self.cols(), self.rows());
        for row in 0..rows {
            self.selective_erase_line_span(row, 0, cols - 1);
        }
    }

    pub fn selective_erase_to_end_of_line(&mut self) {
        let (line, col) = (self.cursor.line, self.cursor.col);
        let cols = self.cols();
        self.selective_erase_line_span(line, col, cols - 1);
    }

    pub fn selective_erase_to_begin_of_line(&mut self) {
        let (line, col) = (self.cursor.line, self.cursor.col);
        self.selective_erase_line_span(line, 0, col);
    }

    pub fn selective_erase_line(&mut self) {
        let line = self.cursor.line;
        let cols = self.cols();
        self.selective_erase_line_span(line, 0, cols - 1);
    }

    // ---- insert / delete -------------------------------------------------

    pub fn insert_characters(&mut self, n: usize) {
        let (_, right) = self.h_margins();
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.insert_cells(col, n.max(1), right, bg);
        }
    }

    pub fn delete_characters(&mut self, n: usize) {
        let (_, right) = self.h_margins();
        let (line, col, bg) = (self.cursor.line, self.cursor.col, self.bg());
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.delete_cells(col, n.max(1), right, bg);
        }
    }

    /// IL: only acts with the cursor inside the scroll region.
    pub fn insert_lines(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        if self.cursor.line < top || self.cursor.line > bottom {
            return;
        }
        let line = self.cursor.line;
        let bg = self.bg();
        self.grid_mut().scroll_down(line, bottom, n.max(1), bg);
        self.carriage_return();
    }

    /// DL.
    pub fn delete_lines(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        if self.cursor.line < top || self.cursor.line > bottom {
            return;
        }
        let line = self.cursor.line;
        let bg = self.bg();
        self.grid_mut().scroll_up(line, bottom, n.max(1), bg);
        self.carriage_return();
    }

    /// DECIC: shift columns right of the cursor further right.
    pub fn insert_columns(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        let (left, right) = self.h_margins();
        let col = self.cursor.col;
        if col < left || col > right {
            return;
        }
        let n = n.max(1);
        let bg = self.bg();
        for row in top..=bottom {
            if let Some(line) = self.grid_mut().line_mut(row) {
                line.insert_cells(col, n, right, bg);
            }
        }
    }

    /// DECDC.
    pub fn delete_columns(&mut self, n: usize) {
        let Margins { top, bottom, .. } = self.margins;
        let (left, right) = self.h_margins();
        let col = self.cursor.col;
        if col < left || col > right {
            return;
        }
        let n = n.max(1);
        let bg = self.bg();
        for row in top..=bottom {
            if let Some(line) = self.grid_mut().line_mut(row) {
                line.delete_cells(col, n, right, bg);
            }
        }
    }

    // ---- rectangles ------------------------------------------------------

    /// Clamp a 1-based rectangle spec to the page; origin-relative under
    /// DECOM. Empty and inverted rectangles yield `None` (documented
    /// no-op).
    fn clamp_rect(&self, top: u16, left: u16, bottom: u16, right: u16) -> Option<(usize, usize, usize, usize)> {
        let (oy, ox) = if self.origin_mode() {
            (self.margins.top, self.h_margins().0)
        } else {
            (0, 0)
        };
        let top = oy + usize::from(top.max(1)) - 1;
        let left = ox + usize::from(left.max(1)) - 1;
        let bottom = (oy + usize::from(bottom.max(1)) - 1).min(self.rows() - 1);
        let right = (ox + usize::from(right.max(1)) - 1).min(self.cols() - 1);
        if top > bottom || left > right {
            return None;
        }
        Some((top, left, bottom, right))
    }

    /// DECCRA.
    pub fn copy_area(&mut self, src: (u16, u16, u16, u16), dst_top: u16, dst_left: u16) {
        let Some((top, left, bottom, right)) = self.clamp_rect(src.0, src.1, src.2, src.3) else {
            return;
        };
        let (oy, ox) = if self.origin_mode() {
            (self.margins.top, self.h_margins().0)
        } else {
            (0, 0)
        };
        let dst_top = oy + usize::from(dst_top.max(1)) - 1;
        let dst_left = ox + usize::from(dst_left.max(1)) - 1;

        // buffer the source so overlapping copies stay exact
        let mut source = Vec::new();
        for row in top..=bottom {
            let line = self.grid().line(row).expect("row clamped to page");
            source.push(line.cells()[left..=right].to_vec());
        }

        let span = right - left;
        for (dy, row_cells) in source.into_iter().enumerate() {
            let dst_row = dst_top + dy;
            if dst_row >= self.rows() {
                break;
            }
            for (dx, cell) in row_cells.into_iter().enumerate() {
                let dst_col = dst_left + dx;
                if dst_col >= self.cols() {
                    break;
                }
                if let Some(frag) = cell.image {
                    self.images.add_use(frag.image_id);
                }
                self.release_cell_image(dst_row, dst_col);
                if let Some(target) = self.grid_mut().cell_mut(dst_row, dst_col) {
                    *target = cell;
                }
            }
            if let Some(l) = self.grid_mut().line_mut(dst_row) {
                l.repair_wide_span(dst_left.saturating_sub(1), dst_left + span + 1);
            }
        }
    }

    /// DECERA.
    pub fn erase_area(&mut self, top: u16, left: u16, bottom: u16, right: u16) {
        let Some((top, left, bottom, right)) = self.clamp_rect(top, left, bottom, right) else {
            return;
        };
        let bg = self.bg();
        for row in top..=bottom {
            if let Some(line) = self.grid_mut().line_mut(row) {
                line.erase_range(left, right - left + 1, bg);
            }
        }
    }

    /// DECFRA.
    pub fn fill_area(&mut self, fill: char, top: u16, left: u16, bottom: u16, right: u16) {
        // only printable fills are meaningful
        if char_width(fill) != 1 {
            return;
        }
        let Some((top, left, bottom, right)) = self.clamp_rect(top, left, bottom, right) else {
            return;
        };
        let attrs = self.cursor.attrs;
        for row in top..=bottom {
            for col in left..=right {
                self.release_cell_image(row, col);
                if let Some(cell) = self.grid_mut().cell_mut(row, col) {
                    cell.write(fill, 1, attrs);
                    cell.hyperlink_id = 0;
                }
            }
            if let Some(l) = self.grid_mut().line_mut(row) {
                l.repair_wide_span(left.saturating_sub(1), right.saturating_add(1));
            }
        }
    }

    // ---- margins ---------------------------------------------------------

    /// DECSTBM; parameters already 0-based, `None` meaning default.
    pub fn set_top_bottom_margins(&mut self, top: Option<usize>, bottom: Option<usize>) {
        let top = top.unwrap_or(0);
        let bottom = bottom.unwrap_or(self.rows() - 1).min(self.rows() - 1);
        if top >= bottom {
            return;
        }
        self.margins.top = top;
        self.margins.bottom = bottom;
        self.move_cursor_to(0, 0);
    }

    /// DECSLRM; requires DECLRMM.
    pub fn set_left_right_margins(&mut self, left: Option<usize>, right: Option<usize>) {
        if !self.modes.get(DecMode::LeftRightMargin) {
            return;
        }
        let left = left.unwrap_or(0);
        let right = right.unwrap_or(self.cols() - 1).min(self.cols() - 1);
        if left >= right {
            return;
        }
        self.margins.left = left;
        self.margins.right = right;
        self.move_cursor_to(0, 0);
    }

    fn reset_margins(&mut self) {
        self.margins = Margins {
            top: 0,
            bottom: self.rows() - 1,
            left: 0,
            right: self.cols() - 1,
        };
    }

    // ---- modes -----------------------------------------------------------

    pub fn set_ansi_mode(&mut self, mode: AnsiMode, enable: bool) {
        self.modes.set_ansi(mode, enable);
    }

    /// DECSET/DECRST including side effects.
    pub fn set_mode(&mut self, mode: DecMode, enable: bool) {
        match mode {
            DecMode::Columns132 => {
                self.modes.set(mode, enable);
                if self.modes.get(DecMode::AllowColumns80to132) {
                    let cols = if enable { 132 } else { 80 };
                    let rows = self.rows();
                    self.resize(cols, rows);
                }
                // DECCOLM clears the screen, resets margins and homes the
                // cursor regardless of an actual resize
                self.reset_margins();
                self.clear_screen();
                self.move_cursor_to(0, 0);
            }
            DecMode::Origin => {
                self.modes.set(mode, enable);
                self.move_cursor_to(0, 0);
            }
            DecMode::LeftRightMargin => {
                self.modes.set(mode, enable);
                if !enable {
                    self.margins.left = 0;
                    self.margins.right = self.cols() - 1;
                }
            }
            DecMode::AlternateScreen => {
                self.modes.set(mode, enable);
                if enable {
                    self.activate_buffer(BufferKind::Alternate);
                } else {
                    self.activate_buffer(BufferKind::Primary);
                }
            }
            DecMode::SaveCursor => {
                self.modes.set(mode, enable);
                if enable {
                    self.save_cursor();
                } else {
                    self.restore_cursor();
                }
            }
            DecMode::ExtendedAlternateScreen => {
                self.modes.set(mode, enable);
                if enable {
                    self.save_cursor();
                    self.activate_buffer(BufferKind::Alternate);
                    self.clear_screen();
                    self.move_cursor_to(0, 0);
                } else {
                    self.activate_buffer(BufferKind::Primary);
                    self.restore_cursor();
                }
            }
            _ => self.modes.set(mode, enable),
        }
    }

    fn activate_buffer(&mut self, kind: BufferKind) {
        if self.active != kind {
            self.active = kind;
            self.cursor.line = self.cursor.line.min(self.rows() - 1);
            self.cursor.col = self.cursor.col.min(self.cols() - 1);
            self.reset_margins();
        }
    }

    pub fn save_modes(&mut self, modes: &[DecMode]) {
        for &mode in modes {
            self.modes.save(mode);
        }
    }

    pub fn restore_modes(&mut self, modes: &[DecMode]) {
        for &mode in modes {
            let value = self.modes.restore(mode);
            // reapply through set_mode so side effects fire
            self.set_mode(mode, value);
        }
    }

    /// DECRQM reply for a DEC mode number.
    pub fn request_dec_mode(&mut self, number: u16) {
        let value = match DecMode::from_number(number) {
            Some(mode) => {
                if self.modes.get(mode) {
                    1
                } else {
                    2
                }
            }
            None => 0,
        };
        self.reply(format!("\x1b[?{number};{value}$y"));
    }

    /// DECRQM reply for an ANSI mode number.
    pub fn request_ansi_mode(&mut self, number: u16) {
        let value = match AnsiMode::from_number(number) {
            // KAM and SRM are recognized but permanently reset here
            Some(AnsiMode::KeyboardAction) | Some(AnsiMode::SendReceive) => 4,
            Some(mode) => {
                if self.modes.get_ansi(mode) {
                    1
                } else {
                    2
                }
            }
            None => 0,
        };
        self.reply(format!("\x1b[{number};{value}$y"));
    }

    // ---- charsets --------------------------------------------------------

    pub fn designate_charset(&mut self, table: CharsetTable, id: CharsetId) {
        self.cursor.charsets.designate(table, id);
    }

    pub fn shift_in(&mut self) {
        self.cursor.charsets.shift_in();
    }

    pub fn shift_out(&mut self) {
        self.cursor.charsets.shift_out();
    }

    pub fn single_shift(&mut self, table: CharsetTable) {
        self.cursor.charsets.single_shift(table);
    }

    // ---- tab stops -------------------------------------------------------

    pub fn horizontal_tab_set(&mut self) {
        self.tabs.set(self.cursor.col);
    }

    pub fn tab_clear_at_cursor(&mut self) {
        self.tabs.clear(self.cursor.col);
    }

    pub fn tab_clear_all(&mut self) {
        self.tabs.clear_all();
    }

    /// DECTABSR.
    pub fn report_tab_stops(&mut self) {
        let stops: Vec<String> = self.tabs.report().iter().map(usize::to_string).collect();
        self.reply(format!("\x1bP2$u{}\x1b\\", stops.join("/")));
    }

    // ---- reports ---------------------------------------------------------

    /// DA1.
    pub fn send_device_attributes(&mut self) {
        // VT220 level with sixel, selective erase and ANSI color
        self.reply("\x1b[?62;4;6;22c");
    }

    /// DA2.
    pub fn send_terminal_id(&mut self) {
        self.reply("\x1b[>61;100;0c");
    }

    /// DA3.
    pub fn send_tertiary_attributes(&mut self) {
        self.reply("\x1bP!|C0000000\x1b\\");
    }

    /// DSR 5.
    pub fn device_status_report(&mut self) {
        self.reply("\x1b[0n");
    }

    /// CPR (DSR 6); origin-relative under DECOM.
    pub fn report_cursor_position(&mut self) {
        let (line, col) = self.relative_cursor();
        self.reply(format!("\x1b[{line};{col}R"));
    }

    /// DECXCPR.
    pub fn report_extended_cursor_position(&mut self) {
        let (line, col) = self.relative_cursor();
        self.reply(format!("\x1b[?{line};{col};1R"));
    }

    fn relative_cursor(&self) -> (usize, usize) {
        if self.origin_mode() {
            let (left, _) = self.h_margins();
            (
                self.cursor.line - self.margins.top + 1,
                self.cursor.col - left + 1,
            )
        } else {
            (self.cursor.line + 1, self.cursor.col + 1)
        }
    }

    /// XTVERSION.
    pub fn report_version(&mut self) {
        self.reply(format!(
            "\x1bP>|{} {}\x1b\\",
            self.config.term_name,
            self.config.term_version
        ));
    }

    /// DECRQSS replies.
    pub fn request_status_string(&mut self, target: Option<StatusString>) {
        let value = match target {
            Some(StatusString::Sgr) => Some(format!("{}m", self.sgr_status())),
            Some(StatusString::Decscl) => Some("64;1\"p".to_string()),
            Some(StatusString::Decscusr) => {
                let style = self.cursor_style;
                let base = match style.shape {
                    CursorShape::Block => 1,
                    CursorShape::Underscore => 3,
                    CursorShape::Bar => 5,
                };
                let n = if style.blinking { base } else { base + 1 };
                Some(format!("{n} q"))
            }
            Some(StatusString::Decsca) => {
                let n = if self.cursor.attrs.protected { 1 } else { 0 };
                Some(format!("{n}\"q"))
            }
            Some(StatusString::Decstbm) => Some(format!(
                "{};{}r",
                self.margins.top + 1,
                self.margins.bottom + 1
            )),
            Some(StatusString::Decslrm) => Some(format!(
                "{};{}s",
                self.margins.left + 1,
                self.margins.right + 1
            )),
            None => None,
        };
        match value {
            Some(v) => self.reply(format!("\x1bP1$r{v}\x1b\\")),
            None => self.reply("\x1bP0$r\x1b\\"),
        }
    }

    /// Current SGR state rendered as the parameter list DECRQSS reports.
    fn sgr_status(&self) -> String {
        use crate::core::cell::UnderlineStyle;
        let a = &self.cursor.attrs;
        let mut parts = vec!["0".to_string()];
        if a.bold {
            parts.push("1".into());
        }
        if a.faint {
            parts.push("2".into());
        }
        if a.italic {
            parts.push("3".into());
        }
        match a.underline {
            UnderlineStyle::None => {}
            UnderlineStyle::Single => parts.push("4".into()),
            UnderlineStyle::Double => parts.push("21".into()),
            UnderlineStyle::Curly => parts.push("4:3".into()),
            UnderlineStyle::Dotted => parts.push("4:4".into()),
            UnderlineStyle::Dashed => parts.push("4:5".into()),
        }
        if a.blink {
            parts.push("5".into());
        }
        if a.inverse {
            parts.push("7".into());
        }
        if a.hidden {
            parts.push("8".into());
        }
        if a.crossed_out {
            parts.push("9".into());
        }
        match a.fg {
            Color::Default => {}
            Color::Indexed(i) if i < 8 => parts.push(format!("{}", 30 + u16::from(i))),
            Color::Indexed(i) if i < 16 => parts.push(format!("{}", 90 + u16::from(i) - 8)),
            Color::Indexed(i) => parts.push(format!("38:5:{i}")),
            Color::Rgb(rgb) => parts.push(format!("38:2:{}:{}:{}", rgb.r, rgb.g, rgb.b)),
        }
        match a.bg {
            Color::Default => {}
            Color::Indexed(i) if i < 8 => parts.push(format!("{}", 40 + u16::from(i))),
            Color::Indexed(i) if i < 16 => parts.push(format!("{}", 100 + u16::from(i) - 8)),
            Color::Indexed(i) => parts.push(format!("48:5:{i}")),
            Color::Rgb(rgb) => parts.push(format!("48:2:{}:{}:{}", rgb.r, rgb.g, rgb.b)),
        }
        parts.join(";")
    }

    /// XTGETTCAP: answer one capability query.
    pub fn request_capability(&mut self, name: &str) {
        let hex = |s: &str| -> String {
            s.bytes().fold(String::new(), |mut acc, b| {
                let _ = write!(acc, "{b:02X}");
                acc
            })
        };
        let value = match name {
            "TN" | "name" => Some(self.config.term_name.clone()),
            "Co" | "colors" => Some("256".to_string()),
            "RGB" => Some("8/8/8".to_string()),
            _ => None,
        };
        match value {
            Some(v) => self.reply(format!("\x1bP1+r{}={}\x1b\\", hex(name), hex(&v))),
            None => self.reply(format!("\x1bP0+r{}\x1b\\", hex(name))),
        }
    }

    // ---- window ops ------------------------------------------------------

    pub fn request_pixel_size(&mut self) {
        let (cw, ch) = self.config.cell_pixels;
        let width = cw * self.cols() as u32;
        let height = ch * self.rows() as u32;
        self.reply(format!("\x1b[4;{height};{width}t"));
    }

    pub fn request_cell_pixel_size(&mut self) {
        let (cw, ch) = self.config.cell_pixels;
        self.reply(format!("\x1b[6;{ch};{cw}t"));
    }

    pub fn request_character_size(&mut self) {
        self.reply(format!("\x1b[8;{};{}t", self.rows(), self.cols()));
    }

    pub fn request_screen_character_size(&mut self) {
        self.reply(format!("\x1b[9;{};{}t", self.rows(), self.cols()));
    }

    pub fn resize_window(&mut self, request: WindowResize) {
        self.listener.resize_window(request);
    }

    pub fn save_window_title(&mut self) {
        if self.title_stack.len() == TITLE_STACK_DEPTH {
            self.title_stack.remove(0);
        }
        self.title_stack.push(self.title.clone());
    }

    pub fn restore_window_title(&mut self) {
        if let Some(title) = self.title_stack.pop() {
            self.title = title.clone();
            self.listener.set_window_title(&title);
        }
    }

    pub fn set_window_title(&mut self, title: &str) {
        self.title = title.chars().take(1024).collect();
        let title = self.title.clone();
        self.listener.set_window_title(&title);
    }

    pub fn set_working_directory(&mut self, url: &str) {
        self.working_directory = url.to_string();
        self.listener.set_working_directory(url);
    }

    pub fn notify(&mut self, title: &str, body: &str) {
        self.listener.notify(title, body);
    }

    // ---- cursor styling / protection ------------------------------------

    pub fn set_cursor_style(&mut self, shape: CursorShape, blinking: bool) {
        self.cursor_style = CursorStyle { shape, blinking };
    }

    pub fn set_character_protection(&mut self, protected: bool) {
        self.cursor.attrs.protected = protected;
    }

    // ---- hyperlinks ------------------------------------------------------

    /// OSC 8: empty uri ends the active link.
    pub fn hyperlink(&mut self, id_param: Option<&str>, uri: &str) {
        if uri.is_empty() {
            self.cursor.hyperlink_id = 0;
        } else {
            let id = self.buffer_mut().hyperlinks.open(id_param, uri);
            self.cursor.hyperlink_id = id;
        }
    }

    // ---- colors ----------------------------------------------------------

    pub fn set_palette_color(&mut self, index: u8, color: Rgb) {
        self.palette.set_indexed(index, color);
    }

    pub fn report_palette_color(&mut self, index: u8) {
        let color = self.palette.indexed(index);
        self.reply(format!(
            "\x1b]4;{index};{}\x1b\\",
            format_color_report(color)
        ));
    }

    pub fn reset_palette_color(&mut self, index: u8) {
        self.palette.reset_indexed(index);
    }

    pub fn reset_palette(&mut self) {
        self.palette.reset_all_indexed();
    }

    pub fn set_dynamic_color(&mut self, name: DynamicColor, color: Rgb) {
        self.palette.set_dynamic(name, color);
    }

    pub fn report_dynamic_color(&mut self, name: DynamicColor) {
        let code = match name {
            DynamicColor::Foreground => 10,
            DynamicColor::Background => 11,
            DynamicColor::Cursor => 12,
        };
        let color = self.palette.dynamic(name);
        self.reply(format!("\x1b]{code};{}\x1b\\", format_color_report(color)));
    }

    pub fn reset_dynamic_color(&mut self, name: DynamicColor) {
        self.palette.reset_dynamic(name);
    }

    // ---- marks -----------------------------------------------------------

    /// OSC 1337 SetMark.
    pub fn set_mark(&mut self) {
        let line = self.cursor.line;
        if let Some(l) = self.grid_mut().line_mut(line) {
            l.marked = true;
        }
    }

    // ---- images ----------------------------------------------------------

    /// Attach a decoded sixel image at the cursor.
    pub fn sixel_image(&mut self, size: ImageSize, rgba: Vec<u8>) {
        if size.width == 0 || size.height == 0 {
            return;
        }
        let (cw, ch) = self.config.cell_pixels;
        let (cw, ch) = (cw.max(1), ch.max(1));
        let cols_needed = ((size.width + cw - 1) / cw) as usize;
        let rows_needed = ((size.height + ch - 1) / ch) as usize;
        let image_id = self.images.insert(size, rgba);

        let scrolling = self.modes.get(DecMode::SixelScrolling);
        let start_col = if scrolling { self.cursor.col } else { 0 };
        if !scrolling {
            self.cursor_mut().pending_wrap = false;
        }

        let max_cols = self.cols() - start_col.min(self.cols() - 1);
        let cols_placed = cols_needed.min(max_cols);

        let mut row_on_page = if scrolling { self.cursor.line } else { 0 };
        for image_row in 0..rows_needed {
            for dx in 0..cols_placed {
                let col = start_col + dx;
                self.release_cell_image(row_on_page, col);
                if let Some(cell) = self.grid_mut().cell_mut(row_on_page, col) {
                    cell.erase(Color::Default);
                    cell.image = Some(ImageFragment {
                        image_id,
                        row: image_row as u16,
                        col: dx as u16,
                    });
                }
                self.images.add_use(image_id);
            }
            if let Some(l) = self.grid_mut().line_mut(row_on_page) {
                l.repair_wide_span(
                    start_col.saturating_sub(1),
                    start_col + cols_placed,
                );
            }
            if !scrolling {
                row_on_page += 1;
                if row_on_page >= self.rows() {
                    break;
                }
            } else if image_row + 1 < rows_needed {
                self.index();
                row_on_page = self.cursor.line;
            }
        }

        if scrolling {
            if self.modes.get(DecMode::SixelCursorNextToGraphic) {
                self.cursor.col = (start_col + cols_placed).min(self.cols() - 1);
            } else {
                self.index();
                self.cursor.col = start_col;
            }
        }
    }

    fn release_cell_image(&mut self, line: usize, col: usize) {
        if let Some(frag) = self.grid().cell(line, col).and_then(|c| c.image) {
            self.images.drop_use(frag.image_id);
        }
    }

    /// Reclaim unreferenced images and hyperlinks. Runs at maintenance
    /// points (clears, buffer switches, resizes), never per write.
    pub fn prune_registries(&mut self) {
        let mut live_images = HashSet::new();
        let mut live_links_primary = HashSet::new();
        let mut live_links_alternate = HashSet::new();
        for (buffer, live_links) in [
            (&self.primary, &mut live_links_primary),
            (&self.alternate, &mut live_links_alternate),
        ] {
            for line in buffer.grid.iter_all() {
                for cell in line.cells() {
                    if let Some(frag) = cell.image {
                        live_images.insert(frag.image_id);
                    }
                    if cell.hyperlink_id != 0 {
                        live_links.insert(cell.hyperlink_id);
                    }
                }
            }
        }
        live_links_primary.insert(self.cursor.hyperlink_id);
        live_links_alternate.insert(self.cursor.hyperlink_id);
        self.images.prune(&live_images);
        self.primary.hyperlinks.retain_ids(&live_links_primary);
        self.alternate.hyperlinks.retain_ids(&live_links_alternate);
    }

    // ---- alignment / reset ----------------------------------------------

    /// DECALN: fill the page with E, reset margins, home the cursor.
    pub fn screen_alignment_pattern(&mut self) {
        self.reset_margins();
        self.cursor.attrs = CellAttributes::default();
        let rows = self.rows();
        let cols = self.cols();
        for row in 0..rows {
            for col in 0..cols {
                self.release_cell_image(row, col);
                if let Some(cell) = self.grid_mut().cell_mut(row, col) {
                    cell.write('E', 1, CellAttributes::default());
                    cell.hyperlink_id = 0;
                }
            }
        }
        self.move_cursor_to(0, 0);
    }

    /// DECSTR.
    pub fn soft_reset(&mut self) {
        self.modes.set(DecMode::VisibleCursor, true);
        self.modes.set(DecMode::Origin, false);
        self.modes.set(DecMode::AutoWrap, true);
        self.modes.set_ansi(AnsiMode::Insert, false);
        self.reset_margins();
        self.cursor.attrs = CellAttributes::default();
        self.cursor.attrs.protected = false;
        self.cursor.charsets.reset();
        self.cursor.pending_wrap = false;
        self.cursor_style = CursorStyle::default();
        self.buffer_mut().saved_cursor = SavedCursor::default();
    }

    /// RIS.
    pub fn hard_reset(&mut self) {
        let cols = self.cols();
        let rows = self.rows();
        self.primary = Buffer::new(cols, rows, self.config.max_history);
        self.alternate = Buffer::new(cols, rows, 0);
        self.active = BufferKind::Primary;
        self.cursor = Cursor::new();
        self.modes.reset();
        self.reset_margins();
        self.tabs = TabStops::new(cols, self.config.tab_width);
        self.palette = self.config.palette.clone();
        self.images.clear();
        self.title.clear();
        self.title_stack.clear();
        self.cursor_style = CursorStyle::default();
        self.preceding_char = None;
    }

    // ---- resize ----------------------------------------------------------

    /// Resize the page; reflows when DEC mode 2027 is set.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let reflow = self.modes.get(DecMode::TextReflow) && self.config.reflow;

        let shift = match self.active {
            BufferKind::Primary => {
                self.alternate.grid.resize(cols, rows, false);
                self.primary.grid.resize(cols, rows, reflow)
            }
            BufferKind::Alternate => {
                self.primary.grid.resize(cols, rows, reflow);
                self.alternate.grid.resize(cols, rows, false)
            }
        };

        self.tabs.resize(cols);
        self.reset_margins();
        let line = self.cursor.line as isize - shift;
        self.cursor.line = line.clamp(0, rows as isize - 1) as usize;
        self.cursor.col = self.cursor.col.min(cols - 1);
        self.cursor.pending_wrap = false;
        self.prune_registries();
    }

    /// Debug-build consistency checks, run at sequence boundaries.
    #[cfg(debug_assertions)]
    pub fn verify_state(&self) {
        assert!(self.cursor.line < self.rows());
        assert!(self.cursor.col < self.cols());
        assert!(self.margins.top < self.margins.bottom || self.rows() == 1);
        assert!(
            self.grid().total_lines() <= self.grid().max_history() + self.rows(),
            "ring exceeded history bound"
        );
    }

    #[cfg(not(debug_assertions))]
    pub fn verify_state(&self) {}

    /// Human-readable state dump for the `inspect` callback.
    pub fn inspect(&mut self) {
        let mut dump = String::new();
        let _ = writeln!(
            dump,
            "screen {}x{} buffer={:?} cursor=({}, {}) margins={:?}",
            self.cols(),
            self.rows(),
            self.active,
            self.cursor.line,
            self.cursor.col,
            self.margins,
        );
        for row in 0..self.rows() {
            let line = self.grid().line(row).expect("page row");
            let _ = writeln!(dump, "{:>3} |{}|", row, line.text());
        }
        self.listener.inspect(&dump);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::VoidListener;

    fn screen(cols: usize, rows: usize) -> Screen<VoidListener> {
        let config = TerminalConfig {
            cols,
            rows,
            ..TerminalConfig::default()
        };
        Screen::new(config, VoidListener)
    }

    fn write_str(screen: &mut Screen<VoidListener>, text: &str) {
        for c in text.chars() {
            screen.write_char(c);
        }
    }

    fn row_text(screen: &Screen<VoidListener>, row: usize) -> String {
        screen.grid().line(row).unwrap().text()
    }

    #[test]
    fn test_write_and_advance() {
        let mut s = screen(10, 3);
        write_str(&mut s, "Hi");
        assert_eq!(row_text(&s, 0), "Hi");
        assert_eq!(s.cursor().col, 2);
    }

    #[test]
    fn test_autowrap_pending_semantics() {
        let mut s = screen(5, 3);
        write_str(&mut s, "12345");
        // cursor pins at the last column with the wrap pending
        assert_eq!(s.cursor().col, 4);
        assert!(s.cursor().pending_wrap);

        write_str(&mut s, "6");
        assert_eq!(s.cursor().line, 1);
        assert_eq!(s.cursor().col, 1);
        assert_eq!(row_text(&s, 1), "6");
        assert!(s.grid().line(1).unwrap().wrapped);
    }

    #[test]
    fn test_cursor_motion_clears_pending_wrap() {
        let mut s = screen(5, 3);
        write_str(&mut s, "12345");
        assert!(s.cursor().pending_wrap);
        s.move_cursor_backward(1);
        assert!(!s.cursor().pending_wrap);
        assert_eq!(s.cursor().line, 0);
    }

    #[test]
    fn test_autowrap_off_pins_and_overwrites() {
        let mut s = screen(5, 3);
        s.set_mode(DecMode::AutoWrap, false);
        write_str(&mut s, "123456789");
        assert_eq!(s.cursor().line, 0);
        assert_eq!(s.cursor().col, 4);
        assert_eq!(row_text(&s, 0), "12349");
    }

    #[test]
    fn test_wide_char_continuation() {
        let mut s = screen(10, 3);
        write_str(&mut s, "中x");
        assert_eq!(s.grid().cell(0, 0).unwrap().width(), 2);
        assert!(s.grid().cell(0, 1).unwrap().is_continuation());
        assert_eq!(s.grid().cell(0, 2).unwrap().display_char(), 'x');
    }

    #[test]
    fn test_wide_char_never_splits_at_margin() {
        let mut s = screen(5, 3);
        write_str(&mut s, "1234中");
        // no room at column 4: the wide glyph wraps whole
        assert_eq!(row_text(&s, 1), "中");
        assert!(s.grid().line(1).unwrap().wrapped);
    }

    #[test]
    fn test_combining_mark_attaches() {
        let mut s = screen(10, 3);
        write_str(&mut s, "e\u{0301}");
        assert_eq!(s.grid().cell(0, 0).unwrap().content(), "e\u{0301}");
        assert_eq!(s.cursor().col, 1);
    }

    #[test]
    fn test_linefeed_scrolls_into_history() {
        let mut s = screen(10, 2);
        write_str(&mut s, "one");
        s.linefeed();
        s.carriage_return();
        write_str(&mut s, "two");
        s.linefeed();

        assert_eq!(s.grid().history_len(), 1);
        assert_eq!(s.grid().line_at(-1).unwrap().text(), "one");
        assert_eq!(row_text(&s, 0), "two");
    }

    #[test]
    fn test_margins_confine_scrolling() {
        let mut s = screen(10, 5);
        for t in ["a", "b", "c", "d", "e"] {
            write_str(&mut s, t);
            if t != "e" {
                s.next_line();
            }
        }
        s.set_top_bottom_margins(Some(1), Some(3));
        s.move_cursor_to(3, 0);
        assert_eq!(s.cursor().line, 3);
        s.index();

        assert_eq!(row_text(&s, 0), "a");
        assert_eq!(row_text(&s, 1), "c");
        assert_eq!(row_text(&s, 2), "d");
        assert!(s.grid().line(3).unwrap().is_blank());
        assert_eq!(row_text(&s, 4), "e");
        // margin scroll never leaks into history
        assert_eq!(s.grid().history_len(), 0);
    }

    #[test]
    fn test_origin_mode_addressing() {
        let mut s = screen(10, 6);
        s.set_top_bottom_margins(Some(2), Some(4));
        s.set_mode(DecMode::Origin, true);

        s.move_cursor_to(0, 0);
        assert_eq!(s.cursor().line, 2);

        // clamped to the bottom margin
        s.move_cursor_to(99, 0);
        assert_eq!(s.cursor().line, 4);
    }

    #[test]
    fn test_insert_delete_lines_at_cursor() {
        let mut s = screen(10, 4);
        for t in ["a", "b", "c", "d"] {
            write_str(&mut s, t);
            if t != "d" {
                s.next_line();
            }
        }
        s.move_cursor_to(1, 0);
        s.insert_lines(1);
        assert_eq!(row_text(&s, 0), "a");
        assert!(s.grid().line(1).unwrap().is_blank());
        assert_eq!(row_text(&s, 2), "b");
        assert_eq!(row_text(&s, 3), "c");

        s.delete_lines(1);
        assert_eq!(row_text(&s, 1), "b");
        assert_eq!(row_text(&s, 2), "c");
    }

    #[test]
    fn test_alternate_screen_round_trip() {
        let mut s = screen(10, 4);
        write_str(&mut s, "hello");

        s.set_mode(DecMode::ExtendedAlternateScreen, true);
        assert_eq!(s.active_buffer(), BufferKind::Alternate);
        assert!(s.grid().line(0).unwrap().is_blank());
        write_str(&mut s, "XYZ");

        s.set_mode(DecMode::ExtendedAlternateScreen, false);
        assert_eq!(s.active_buffer(), BufferKind::Primary);
        assert_eq!(row_text(&s, 0), "hello");
        assert_eq!(s.cursor().col, 5);
    }

    #[test]
    fn test_save_restore_cursor_tuple() {
        let mut s = screen(10, 4);
        s.move_cursor_to(2, 3);
        s.attrs_mut().bold = true;
        s.attrs_mut().fg = Color::Indexed(1);
        s.save_cursor();

        s.move_cursor_to(0, 0);
        s.attrs_mut().bold = false;
        s.attrs_mut().fg = Color::Default;

        s.restore_cursor();
        assert_eq!((s.cursor().line, s.cursor().col), (2, 3));
        assert!(s.cursor().attrs.bold);
        assert_eq!(s.cursor().attrs.fg, Color::Indexed(1));
    }

    #[test]
    fn test_ech_respects_protection() {
        let mut s = screen(10, 2);
        s.set_character_protection(true);
        write_str(&mut s, "AB");
        s.set_character_protection(false);
        write_str(&mut s, "CD");

        s.move_cursor_to(0, 0);
        s.erase_characters(4);
        assert_eq!(row_text(&s, 0), "AB");
    }

    #[test]
    fn test_selective_erase_screen() {
        let mut s = screen(10, 2);
        s.set_character_protection(true);
        write_str(&mut s, "KEEP");
        s.set_character_protection(false);
        write_str(&mut s, "drop");

        s.selective_erase_screen();
        assert_eq!(row_text(&s, 0), "KEEP");
    }

    #[test]
    fn test_rect_fill_and_erase() {
        let mut s = screen(10, 5);
        s.fill_area('#', 2, 2, 4, 4);
        assert_eq!(row_text(&s, 1), " ###");
        assert_eq!(row_text(&s, 3), " ###");

        s.erase_area(2, 2, 3, 3);
        assert_eq!(row_text(&s, 1), "   #");
        assert_eq!(row_text(&s, 3), " ###");
    }

    #[test]
    fn test_rect_copy() {
        let mut s = screen(10, 5);
        write_str(&mut s, "AB");
        s.next_line();
        write_str(&mut s, "CD");

        s.copy_area((1, 1, 2, 2), 4, 5);
        assert_eq!(s.grid().cell(3, 4).unwrap().display_char(), 'A');
        assert_eq!(s.grid().cell(3, 5).unwrap().display_char(), 'B');
        assert_eq!(s.grid().cell(4, 4).unwrap().display_char(), 'C');
    }

    #[test]
    fn test_rect_inverted_is_noop() {
        let mut s = screen(10, 5);
        write_str(&mut s, "AB");
        s.fill_area('#', 4, 1, 2, 5);
        assert_eq!(row_text(&s, 0), "AB");
        s.erase_area(1, 5, 1, 2);
        assert_eq!(row_text(&s, 0), "AB");
    }

    #[test]
    fn test_deccolm_clears_and_homes() {
        let mut s = screen(80, 24);
        write_str(&mut s, "residue");
        s.move_cursor_to(5, 5);
        s.set_mode(DecMode::AllowColumns80to132, true);
        s.set_mode(DecMode::Columns132, true);

        assert_eq!(s.cols(), 132);
        assert_eq!((s.cursor().line, s.cursor().col), (0, 0));
        assert!(s.grid().line(0).unwrap().is_blank());
    }

    #[test]
    fn test_decaln_fills_page() {
        let mut s = screen(4, 2);
        s.screen_alignment_pattern();
        assert_eq!(row_text(&s, 0), "EEEE");
        assert_eq!(row_text(&s, 1), "EEEE");
        assert_eq!((s.cursor().line, s.cursor().col), (0, 0));
    }

    #[test]
    fn test_left_right_margins_confine_motion() {
        let mut s = screen(10, 4);
        s.set_mode(DecMode::LeftRightMargin, true);
        s.set_left_right_margins(Some(2), Some(6));

        s.move_cursor_to(0, 0);
        s.move_cursor_forward(99);
        assert_eq!(s.cursor().col, 6);
        s.carriage_return();
        assert_eq!(s.cursor().col, 2);
    }

    #[test]
    fn test_sixel_image_attaches_fragments() {
        let mut s = screen(20, 6);
        // 2x2 cells at 10x20 px/cell
        s.sixel_image(ImageSize::new(20, 40), vec![0; 20 * 40 * 4]);
        let frag = s.grid().cell(0, 0).unwrap().image.unwrap();
        assert_eq!((frag.row, frag.col), (0, 0));
        let frag = s.grid().cell(1, 1).unwrap().image.unwrap();
        assert_eq!((frag.row, frag.col), (1, 1));
        assert_eq!(s.images().len(), 1);
        // sixel scrolling on by default: cursor below the image
        assert_eq!(s.cursor().line, 2);
    }

    #[test]
    fn test_image_pruning_after_clear() {
        let mut s = screen(20, 6);
        s.sixel_image(ImageSize::new(10, 20), vec![0; 10 * 20 * 4]);
        assert_eq!(s.images().len(), 1);
        s.clear_screen();
        assert_eq!(s.images().len(), 0);
    }

    #[test]
    fn test_resize_reflow_keeps_text() {
        let mut s = screen(10, 4);
        s.set_mode(DecMode::TextReflow, true);
        write_str(&mut s, "abcdefghij");
        s.resize(5, 4);
        assert_eq!(row_text(&s, 0), "abcde");
        assert_eq!(row_text(&s, 1), "fghij");
        assert!(s.grid().line(1).unwrap().wrapped);
    }

    #[test]
    fn test_hard_reset_restores_initial_state() {
        let mut s = screen(10, 4);
        write_str(&mut s, "junk");
        s.set_mode(DecMode::Origin, true);
        s.set_top_bottom_margins(Some(1), Some(2));
        s.hard_reset();

        assert!(s.grid().line(0).unwrap().is_blank());
        assert!(!s.modes().get(DecMode::Origin));
        assert_eq!(s.margins().top, 0);
        assert_eq!(s.margins().bottom, 3);
        assert_eq!((s.cursor().line, s.cursor().col), (0, 0));
    }

    #[test]
    fn test_rep_repeats_preceding() {
        let mut s = screen(10, 2);
        write_str(&mut s, "x");
        s.repeat_preceding(3);
        assert_eq!(row_text(&s, 0), "xxxx");
    }

    #[test]
    fn test_hyperlink_tracking() {
        let mut s = screen(10, 2);
        s.hyperlink(None, "https://example.com");
        write_str(&mut s, "ab");
        s.hyperlink(None, "");
        write_str(&mut s, "c");

        let id = s.grid().cell(0, 0).unwrap().hyperlink_id;
        assert_ne!(id, 0);
        assert_eq!(s.hyperlink_uri(id).unwrap(), "https://example.com");
        assert_eq!(s.grid().cell(0, 2).unwrap().hyperlink_id, 0);
    }

    #[test]
    fn test_insert_mode_shifts_cells() {
        let mut s = screen(10, 2);
        write_str(&mut s, "world");
        s.move_cursor_to(0, 0);
        s.set_ansi_mode(AnsiMode::Insert, true);
        write_str(&mut s, "hi");
        assert_eq!(row_text(&s, 0), "hiworld");
    }
}
