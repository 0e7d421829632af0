//! Platform-independent screen model
//!
//! Cells, lines, the scrollback/page grid, cursor, charsets, modes, colors
//! and the screen that ties them together. Deterministic by construction:
//! the same operations always produce the same state.

pub mod cell;
pub mod charset;
pub mod color;
pub mod cursor;
pub mod grid;
pub mod hyperlink;
pub mod image;
pub mod line;
pub mod modes;
pub mod screen;
pub mod selection;
pub mod snapshot;
pub mod tabs;

pub use cell::{Cell, CellAttributes, ImageFragment, UnderlineStyle};
pub use charset::{CharsetId, CharsetState, CharsetTable};
pub use color::{Color, ColorPalette, DynamicColor, Rgb};
pub use cursor::{Cursor, CursorShape, CursorStyle, SavedCursor};
pub use grid::Grid;
pub use hyperlink::{Hyperlink, HyperlinkRegistry};
pub use image::{Image, ImageRegistry, ImageSize};
pub use line::Line;
pub use modes::{AnsiMode, DecMode, ModeManager};
pub use screen::{BufferKind, Margins, Screen, StatusString};
pub use selection::{Selection, SelectionMode, SelectionPoint};
pub use snapshot::Snapshot;
pub use tabs::TabStops;
