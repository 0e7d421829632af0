//! VT escape sequence parser
//!
//! A state machine in the VT500-series mold described by Paul Williams
//! (https://vt100.net/emu/dec_ansi_parser), covering C0/C1 controls, ESC,
//! CSI, OSC and DCS sequences plus SOS/PM/APC strings (consumed, ignored).
//!
//! The parser is chunk-boundary safe: a sequence or UTF-8 codepoint split
//! across `parse` calls resumes where it left off. For every input byte
//! exactly one transition fires; unrecognized terminators drop back to
//! Ground without side effects.

use crate::parser::actions::Action;
use crate::parser::utf8::{Decoded, Utf8Decoder, REPLACEMENT};
use crate::sequence::Params;

/// Cap on collected intermediate bytes; extras are dropped, the sequence
/// still completes.
const MAX_INTERMEDIATES: usize = 4;
/// Cap on buffered OSC payload bytes (1 MiB).
const MAX_OSC_LENGTH: usize = 1024 * 1024;

/// Parser state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum State {
    #[default]
    Ground,
    Escape,
    EscapeIntermediate,
    CsiEntry,
    CsiParam,
    CsiIntermediate,
    CsiIgnore,
    DcsEntry,
    DcsParam,
    DcsIntermediate,
    DcsPassthrough,
    DcsIgnore,
    OscString,
    SosPmApcString,
}

/// The VT parser.
#[derive(Debug, Clone, Default)]
pub struct Parser {
    state: State,
    utf8: Utf8Decoder,
    leader: u8,
    intermediates: Vec<u8>,
    params: Params,
    osc: Vec<u8>,
    /// Set once a DcsHook event was emitted, so the matching DcsUnhook is
    /// only sent when a hook is actually active.
    hooked: bool,
}

impl Parser {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> State {
        self.state
    }

    /// Return to Ground, discarding any partial sequence.
    pub fn reset(&mut self) {
        self.state = State::Ground;
        self.utf8.reset();
        self.clear();
        self.osc.clear();
        self.hooked = false;
    }

    /// Process a chunk of bytes, emitting events through `sink`.
    pub fn parse<F>(&mut self, data: &[u8], mut sink: F)
    where
        F: FnMut(Action),
    {
        for &byte in data {
            self.advance(byte, &mut sink);
        }
    }

    /// Convenience wrapper collecting events into a vector.
    pub fn parse_collect(&mut self, data: &[u8]) -> Vec<Action> {
        let mut actions = Vec::new();
        self.parse(data, |action| actions.push(action));
        actions
    }

    fn clear(&mut self) {
        self.leader = 0;
        self.intermediates.clear();
        self.params = Params::new();
    }

    fn advance<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        // String-collecting states see every byte, including C0.
        match self.state {
            State::OscString => return self.advance_osc(byte, sink),
            State::DcsPassthrough => return self.advance_dcs_passthrough(byte, sink),
            State::DcsIgnore | State::SosPmApcString => {
                return self.advance_opaque_string(byte, sink)
            }
            _ => {}
        }

        // C0 controls execute from any non-string state; ESC and CAN/SUB
        // restart or abort the current sequence.
        if byte < 0x20 {
            match byte {
                0x1B => {
                    self.state = State::Escape;
                    self.clear();
                }
                0x18 | 0x1A => self.state = State::Ground,
                _ => {
                    self.utf8.reset();
                    sink(Action::Execute(byte));
                }
            }
            return;
        }

        if byte == 0x7F {
            // DEL is ignored everywhere outside string states
            return;
        }

        // 8-bit C1 introducers, unless we are inside a UTF-8 sequence.
        if (0x80..=0x9F).contains(&byte) && !self.utf8.in_progress() {
            match byte {
                0x90 => self.enter_dcs(),
                0x98 | 0x9E | 0x9F => self.enter_opaque_string(),
                0x9B => self.enter_csi(),
                0x9D => self.enter_osc(),
                _ => {}
            }
            return;
        }

        match self.state {
            State::Ground => self.advance_ground(byte, sink),
            State::Escape => self.advance_escape(byte, sink),
            State::EscapeIntermediate => self.advance_escape_intermediate(byte, sink),
            State::CsiEntry => self.advance_csi_entry(byte, sink),
            State::CsiParam => self.advance_csi_param(byte, sink),
            State::CsiIntermediate => self.advance_csi_intermediate(byte, sink),
            State::CsiIgnore => {
                if (0x40..=0x7E).contains(&byte) {
                    self.state = State::Ground;
                }
            }
            State::DcsEntry => self.advance_dcs_entry(byte, sink),
            State::DcsParam => self.advance_dcs_param(byte, sink),
            State::DcsIntermediate => self.advance_dcs_intermediate(byte, sink),
            // handled above
            State::DcsPassthrough
            | State::DcsIgnore
            | State::OscString
            | State::SosPmApcString => unreachable!("string states handled before dispatch"),
        }
    }

    // ---- Ground ---------------------------------------------------------

    fn advance_ground<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match self.utf8.feed(byte) {
            Decoded::Codepoint(c) => sink(Action::Print(c)),
            Decoded::Incomplete => {}
            Decoded::Rejected => {
                sink(Action::Print(REPLACEMENT));
                // An ASCII byte that broke a multi-byte sequence still
                // stands on its own.
                if byte < 0x80 {
                    sink(Action::Print(byte as char));
                }
            }
        }
    }

    // ---- ESC ------------------------------------------------------------

    fn advance_escape<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            b'[' => self.enter_csi(),
            b']' => self.enter_osc(),
            b'P' => self.enter_dcs(),
            b'X' | b'^' | b'_' => self.enter_opaque_string(),
            // ST: the second half of a string terminator, nothing on its own
            b'\\' => self.state = State::Ground,
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::EscapeIntermediate;
            }
            0x30..=0x7E => {
                self.state = State::Ground;
                sink(Action::Esc {
                    intermediates: Vec::new(),
                    final_byte: byte,
                });
            }
            _ => self.state = State::Ground,
        }
    }

    fn advance_escape_intermediate<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            0x30..=0x7E => {
                self.state = State::Ground;
                sink(Action::Esc {
                    intermediates: std::mem::take(&mut self.intermediates),
                    final_byte: byte,
                });
            }
            _ => self.state = State::Ground,
        }
    }

    // ---- CSI ------------------------------------------------------------

    fn enter_csi(&mut self) {
        self.state = State::CsiEntry;
        self.clear();
    }

    fn advance_csi_entry<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            b'?' | b'>' | b'=' | b'<' => {
                self.leader = byte;
                self.state = State::CsiParam;
            }
            b'0'..=b'9' | b';' | b':' => {
                self.params.put(byte);
                self.state = State::CsiParam;
            }
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_param<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            b'0'..=b'9' | b';' | b':' => self.params.put(byte),
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::CsiIntermediate;
            }
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn advance_csi_intermediate<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            0x40..=0x7E => self.dispatch_csi(byte, sink),
            _ => self.state = State::CsiIgnore,
        }
    }

    fn dispatch_csi<F: FnMut(Action)>(&mut self, final_byte: u8, sink: &mut F) {
        self.state = State::Ground;
        sink(Action::Csi {
            leader: self.leader,
            intermediates: std::mem::take(&mut self.intermediates),
            params: std::mem::take(&mut self.params),
            final_byte,
        });
    }

    // ---- OSC ------------------------------------------------------------

    fn enter_osc(&mut self) {
        self.state = State::OscString;
        self.osc.clear();
    }

    fn advance_osc<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            // BEL terminator (xterm extension)
            0x07 => self.dispatch_osc(State::Ground, sink),
            // ESC: almost certainly the first half of ST; dispatch now and
            // let the Escape state swallow the `\`
            0x1B => self.dispatch_osc(State::Escape, sink),
            // 8-bit ST
            0x9C => self.dispatch_osc(State::Ground, sink),
            0x18 | 0x1A => {
                self.osc.clear();
                self.state = State::Ground;
            }
            0x00..=0x06 | 0x08..=0x17 | 0x19 | 0x1C..=0x1F => {}
            _ => {
                if self.osc.len() < MAX_OSC_LENGTH {
                    self.osc.push(byte);
                }
            }
        }
    }

    fn dispatch_osc<F: FnMut(Action)>(&mut self, next: State, sink: &mut F) {
        sink(Action::Osc {
            data: std::mem::take(&mut self.osc),
        });
        self.state = next;
        if next == State::Escape {
            self.clear();
        }
    }

    // ---- DCS ------------------------------------------------------------

    fn enter_dcs(&mut self) {
        self.state = State::DcsEntry;
        self.clear();
    }

    fn advance_dcs_entry<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            b'?' | b'>' | b'=' | b'<' => {
                self.leader = byte;
                self.state = State::DcsParam;
            }
            b'0'..=b'9' | b';' | b':' => {
                self.params.put(byte);
                self.state = State::DcsParam;
            }
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7E => self.hook(byte, sink),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_param<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            b'0'..=b'9' | b';' | b':' => self.params.put(byte),
            0x20..=0x2F => {
                self.collect(byte);
                self.state = State::DcsIntermediate;
            }
            0x40..=0x7E => self.hook(byte, sink),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn advance_dcs_intermediate<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            0x20..=0x2F => self.collect(byte),
            0x40..=0x7E => self.hook(byte, sink),
            _ => self.state = State::DcsIgnore,
        }
    }

    fn hook<F: FnMut(Action)>(&mut self, final_byte: u8, sink: &mut F) {
        self.state = State::DcsPassthrough;
        self.hooked = true;
        sink(Action::DcsHook {
            leader: self.leader,
            intermediates: std::mem::take(&mut self.intermediates),
            params: std::mem::take(&mut self.params),
            final_byte,
        });
    }

    fn advance_dcs_passthrough<F: FnMut(Action)>(&mut self, byte: u8, sink: &mut F) {
        match byte {
            0x1B => {
                self.unhook(sink);
                self.state = State::Escape;
                self.clear();
            }
            0x9C => {
                self.unhook(sink);
                self.state = State::Ground;
            }
            0x18 | 0x1A => {
                // early termination still finalizes the hook; a partial
                // Sixel image is committed, not discarded
                self.unhook(sink);
                self.state = State::Ground;
            }
            _ => sink(Action::DcsPut(byte)),
        }
    }

    fn unhook<F: FnMut(Action)>(&mut self, sink: &mut F) {
        if self.hooked {
            self.hooked = false;
            sink(Action::DcsUnhook);
        }
    }

    // ---- SOS / PM / APC / ignored DCS ------------------------------------

    fn enter_opaque_string(&mut self) {
        self.state = State::SosPmApcString;
    }

    fn advance_opaque_string<F: FnMut(Action)>(&mut self, byte: u8, _sink: &mut F) {
        match byte {
            0x1B => {
                self.state = State::Escape;
                self.clear();
            }
            0x9C | 0x18 | 0x1A => self.state = State::Ground,
            _ => {}
        }
    }

    fn collect(&mut self, byte: u8) {
        if self.intermediates.len() < MAX_INTERMEDIATES {
            self.intermediates.push(byte);
        }
    }
}
