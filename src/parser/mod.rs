//! Escape sequence parsing
//!
//! `state` holds the byte-level VT500 state machine, `actions` the events it
//! emits, and `utf8` the streaming decoder behind the print path.

mod actions;
mod state;
mod utf8;

pub use actions::Action;
pub use state::{Parser, State};
pub use utf8::{Decoded, Utf8Decoder, REPLACEMENT};
