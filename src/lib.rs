//! Dango Terminal Core
//!
//! A virtual-terminal core: a byte-stream interpreter that consumes
//! application output (UTF-8 text mixed with escape sequences) and
//! maintains an authoritative, queryable model of a character cell grid.
//!
//! # Architecture
//!
//! - `parser`: the VT500-family byte state machine emitting events
//! - `sequencer`: semantic dispatch of events against the function
//!   registry, including DCS hook sub-parsers (Sixel, DECRQSS, XTGETTCAP)
//! - `core`: the screen model — grids with scrollback, cursor, margins,
//!   modes, charsets, colors, hyperlinks and images
//! - `terminal`: the front object wiring the three together
//!
//! # Example
//!
//! ```
//! use dango_terminal::{Terminal, TerminalConfig, VoidListener};
//!
//! let mut term = Terminal::new(TerminalConfig::sized(80, 24), VoidListener);
//! term.write(b"hello \x1b[1;31mworld\x1b[0m");
//! assert!(term.snapshot().to_text().starts_with("hello world"));
//! ```
//!
//! # Threading
//!
//! The core is single-threaded and performs no I/O. One thread owns the
//! `Terminal` and feeds it bytes; renderers read through `snapshot()`
//! under whatever lock the host chooses. Host-visible effects (reply
//! bytes, bells, title changes) are delivered synchronously through an
//! [`EventListener`].

pub mod config;
pub mod core;
pub mod events;
pub mod functions;
pub mod parser;
pub mod sequence;
pub mod sequencer;
pub mod sixel;
pub mod terminal;

pub use config::TerminalConfig;
pub use core::{
    Cell, CellAttributes, Color, ColorPalette, Cursor, CursorShape, CursorStyle, Grid, Line,
    Rgb, Screen, Selection, SelectionMode, SelectionPoint, Snapshot,
};
pub use events::{EventListener, FontDef, VoidListener, WindowResize};
pub use functions::{FunctionCategory, FunctionDefinition, FunctionId};
pub use parser::{Action, Parser};
pub use sequence::{Params, Sequence};
pub use sequencer::{ApplyResult, Sequencer};
pub use terminal::Terminal;
