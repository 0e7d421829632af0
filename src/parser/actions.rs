//! Parser events
//!
//! The state machine distills the byte stream into these events; the
//! Sequencer turns them into screen operations. DCS content is streamed
//! (hook / put / unhook) so sub-parsers such as Sixel never buffer the
//! whole payload.

use serde::{Deserialize, Serialize};

use crate::sequence::Params;

/// One event emitted by the parser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Action {
    /// A printable codepoint (already decoded from UTF-8).
    Print(char),

    /// A C0 control byte (0x00..=0x1F, except ESC).
    Execute(u8),

    /// ESC sequence: `ESC [intermediates] final`.
    Esc { intermediates: Vec<u8>, final_byte: u8 },

    /// CSI sequence: `ESC [ [leader] [params] [intermediates] final`.
    Csi {
        /// `?`, `>`, `=` or `<`; 0 when absent.
        leader: u8,
        intermediates: Vec<u8>,
        params: Params,
        final_byte: u8,
    },

    /// OSC payload, terminated by BEL or ST. The numeric code is still part
    /// of `data`; the Sequencer splits it off.
    Osc { data: Vec<u8> },

    /// DCS introducer reached its final byte; a hook may now be installed.
    DcsHook {
        leader: u8,
        intermediates: Vec<u8>,
        params: Params,
        final_byte: u8,
    },

    /// One DCS passthrough byte for the installed hook.
    DcsPut(u8),

    /// DCS terminated (ST, or aborted by CAN/SUB/a new sequence).
    DcsUnhook,
}

impl Action {
    pub fn is_print(&self) -> bool {
        matches!(self, Action::Print(_))
    }

    pub fn is_execute(&self) -> bool {
        matches!(self, Action::Execute(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_predicates() {
        assert!(Action::Print('x').is_print());
        assert!(Action::Execute(0x0A).is_execute());
        assert!(!Action::DcsPut(b'~').is_print());
    }

    #[test]
    fn test_action_serialization_round_trip() {
        let action = Action::Csi {
            leader: b'?',
            intermediates: vec![b'$'],
            params: Params::parse(b"6"),
            final_byte: b'p',
        };
        let json = serde_json::to_string(&action).unwrap();
        let restored: Action = serde_json::from_str(&json).unwrap();
        assert_eq!(action, restored);
    }
}
