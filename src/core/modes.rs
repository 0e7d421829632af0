//! ANSI and DEC private modes
//!
//! Two disjoint namespaces, each mode a boolean with a bounded save stack
//! for XTSAVE/XTRESTORE. Side effects of toggling (alternate screen,
//! DECCOLM clears, cursor visibility) live in the screen; this module only
//! tracks the registers.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Depth cap of each per-mode save stack.
const SAVE_STACK_DEPTH: usize = 8;

/// ANSI (non-private) modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AnsiMode {
    /// KAM (2) - recognized, never implemented.
    KeyboardAction,
    /// IRM (4)
    Insert,
    /// SRM (12)
    SendReceive,
    /// LNM (20)
    AutomaticNewline,
}

impl AnsiMode {
    pub fn from_number(value: u16) -> Option<Self> {
        match value {
            2 => Some(AnsiMode::KeyboardAction),
            4 => Some(AnsiMode::Insert),
            12 => Some(AnsiMode::SendReceive),
            20 => Some(AnsiMode::AutomaticNewline),
            _ => None,
        }
    }

    pub fn number(self) -> u16 {
        match self {
            AnsiMode::KeyboardAction => 2,
            AnsiMode::Insert => 4,
            AnsiMode::SendReceive => 12,
            AnsiMode::AutomaticNewline => 20,
        }
    }
}

/// DEC private modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecMode {
    /// DECCKM (1)
    ApplicationCursorKeys,
    /// DECCOLM (3)
    Columns132,
    /// DECSCLM (4)
    SmoothScroll,
    /// DECSCNM (5)
    ReverseVideo,
    /// DECOM (6)
    Origin,
    /// DECAWM (7)
    AutoWrap,
    /// X10 mouse (9)
    MouseProtocolX10,
    /// att610 blinking cursor (12)
    BlinkingCursor,
    /// DECTCEM (25)
    VisibleCursor,
    /// xterm 80<->132 permission (40)
    AllowColumns80to132,
    /// 47 / 1047
    AlternateScreen,
    /// DECLRMM (69)
    LeftRightMargin,
    /// Sixel scrolling (80)
    SixelScrolling,
    /// 1000
    MouseNormalTracking,
    /// 1002
    MouseButtonTracking,
    /// 1003
    MouseAnyEventTracking,
    /// 1004
    FocusTracking,
    /// 1005
    MouseExtendedUtf8,
    /// 1006
    MouseSgr,
    /// 1007
    MouseAlternateScroll,
    /// 1015
    MouseUrxvt,
    /// 1016
    MouseSgrPixels,
    /// 1048
    SaveCursor,
    /// 1049
    ExtendedAlternateScreen,
    /// 2004
    BracketedPaste,
    /// 2026
    BatchedRendering,
    /// 2027
    TextReflow,
    /// 8452
    SixelCursorNextToGraphic,
}

impl DecMode {
    pub fn from_number(value: u16) -> Option<Self> {
        match value {
            1 => Some(DecMode::ApplicationCursorKeys),
            3 => Some(DecMode::Columns132),
            4 => Some(DecMode::SmoothScroll),
            5 => Some(DecMode::ReverseVideo),
            6 => Some(DecMode::Origin),
            7 => Some(DecMode::AutoWrap),
            9 => Some(DecMode::MouseProtocolX10),
            12 => Some(DecMode::BlinkingCursor),
            25 => Some(DecMode::VisibleCursor),
            40 => Some(DecMode::AllowColumns80to132),
            47 | 1047 => Some(DecMode::AlternateScreen),
            69 => Some(DecMode::LeftRightMargin),
            80 => Some(DecMode::SixelScrolling),
            1000 => Some(DecMode::MouseNormalTracking),
            1002 => Some(DecMode::MouseButtonTracking),
            1003 => Some(DecMode::MouseAnyEventTracking),
            1004 => Some(DecMode::FocusTracking),
            1005 => Some(DecMode::MouseExtendedUtf8),
            1006 => Some(DecMode::MouseSgr),
            1007 => Some(DecMode::MouseAlternateScroll),
            1015 => Some(DecMode::MouseUrxvt),
            1016 => Some(DecMode::MouseSgrPixels),
            1048 => Some(DecMode::SaveCursor),
            1049 => Some(DecMode::ExtendedAlternateScreen),
            2004 => Some(DecMode::BracketedPaste),
            2026 => Some(DecMode::BatchedRendering),
            2027 => Some(DecMode::TextReflow),
            8452 => Some(DecMode::SixelCursorNextToGraphic),
            _ => None,
        }
    }

    pub fn number(self) -> u16 {
        match self {
            DecMode::ApplicationCursorKeys => 1,
            DecMode::Columns132 => 3,
            DecMode::SmoothScroll => 4,
            DecMode::ReverseVideo => 5,
            DecMode::Origin => 6,
            DecMode::AutoWrap => 7,
            DecMode::MouseProtocolX10 => 9,
            DecMode::BlinkingCursor => 12,
            DecMode::VisibleCursor => 25,
            DecMode::AllowColumns80to132 => 40,
            DecMode::AlternateScreen => 47,
            DecMode::LeftRightMargin => 69,
            DecMode::SixelScrolling => 80,
            DecMode::MouseNormalTracking => 1000,
            DecMode::MouseButtonTracking => 1002,
            DecMode::MouseAnyEventTracking => 1003,
            DecMode::FocusTracking => 1004,
            DecMode::MouseExtendedUtf8 => 1005,
            DecMode::MouseSgr => 1006,
            DecMode::MouseAlternateScroll => 1007,
            DecMode::MouseUrxvt => 1015,
            DecMode::MouseSgrPixels => 1016,
            DecMode::SaveCursor => 1048,
            DecMode::ExtendedAlternateScreen => 1049,
            DecMode::BracketedPaste => 2004,
            DecMode::BatchedRendering => 2026,
            DecMode::TextReflow => 2027,
            DecMode::SixelCursorNextToGraphic => 8452,
        }
    }

    /// Power-on default.
    pub fn default_value(self) -> bool {
        matches!(
            self,
            DecMode::AutoWrap | DecMode::VisibleCursor | DecMode::BlinkingCursor | DecMode::SixelScrolling
        )
    }
}

/// Mode registers plus per-mode save stacks.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModeManager {
    ansi: HashMap<AnsiMode, bool>,
    dec: HashMap<DecMode, bool>,
    saved: HashMap<DecMode, Vec<bool>>,
}

impl ModeManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        self.ansi.clear();
        self.dec.clear();
        self.saved.clear();
    }

    pub fn get_ansi(&self, mode: AnsiMode) -> bool {
        self.ansi.get(&mode).copied().unwrap_or(false)
    }

    pub fn set_ansi(&mut self, mode: AnsiMode, value: bool) {
        self.ansi.insert(mode, value);
    }

    pub fn get(&self, mode: DecMode) -> bool {
        self.dec.get(&mode).copied().unwrap_or_else(|| mode.default_value())
    }

    pub fn set(&mut self, mode: DecMode, value: bool) {
        self.dec.insert(mode, value);
    }

    /// XTSAVE: push the current value onto the mode's save stack.
    pub fn save(&mut self, mode: DecMode) {
        let value = self.get(mode);
        let stack = self.saved.entry(mode).or_default();
        if stack.len() == SAVE_STACK_DEPTH {
            stack.remove(0);
        }
        stack.push(value);
    }

    /// XTRESTORE: pop the save stack; falls back to the power-on default
    /// when nothing was saved.
    pub fn restore(&mut self, mode: DecMode) -> bool {
        let value = self
            .saved
            .get_mut(&mode)
            .and_then(Vec::pop)
            .unwrap_or_else(|| mode.default_value());
        self.set(mode, value);
        value
    }
}
