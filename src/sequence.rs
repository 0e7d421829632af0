//! Parsed VT sequence value object
//!
//! A `Sequence` is the immutable result of parsing one escape sequence:
//! category, optional leader byte, intermediate characters, the parameter
//! list and the final byte. Parameters may carry colon-separated
//! subparameters (used by SGR 38/48/58 and 4:x underline styles).

use serde::{Deserialize, Serialize};

use crate::functions::FunctionCategory;

/// Hard cap on the number of parameters in one sequence.
pub const MAX_PARAMETERS: usize = 16;
/// Hard cap on subparameters per parameter.
pub const MAX_SUBPARAMETERS: usize = 8;

/// Parameter list for a control sequence.
///
/// Each top-level parameter is a non-empty list: `params[i][0]` is the
/// parameter value, `params[i][1..]` its subparameters. Input beyond the
/// caps is silently dropped; the sequence still completes (overlong
/// sequences are truncated, not rejected).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Params {
    list: Vec<Vec<u16>>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw parameter byte string such as `"1;2:3;44"`.
    pub fn parse(bytes: &[u8]) -> Self {
        let mut params = Self::new();
        if bytes.is_empty() {
            return params;
        }
        params.list.push(vec![0]);
        for &byte in bytes {
            params.put(byte);
        }
        params
    }

    /// Feed one parameter byte (digit, `;` or `:`); anything else is ignored.
    pub fn put(&mut self, byte: u8) {
        if self.list.is_empty() {
            self.list.push(vec![0]);
        }
        match byte {
            b';' => {
                if self.list.len() < MAX_PARAMETERS {
                    self.list.push(vec![0]);
                }
            }
            b':' => {
                let group = self.list.last_mut().expect("list is non-empty");
                if group.len() < MAX_SUBPARAMETERS {
                    group.push(0);
                }
            }
            b'0'..=b'9' => {
                let slot = self
                    .list
                    .last_mut()
                    .expect("list is non-empty")
                    .last_mut()
                    .expect("group is non-empty");
                *slot = slot
                    .saturating_mul(10)
                    .saturating_add(u16::from(byte - b'0'));
            }
            _ => {}
        }
    }

    /// Number of top-level parameters.
    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Parameter value at `index`, or 0 when absent.
    pub fn raw(&self, index: usize) -> u16 {
        self.list.get(index).map_or(0, |g| g[0])
    }

    /// Parameter value at `index`, `None` when absent or zero
    /// (VT treats an omitted and a zero parameter identically for most
    /// functions, with the function supplying its own default).
    pub fn get(&self, index: usize) -> Option<u16> {
        self.list.get(index).map(|g| g[0]).filter(|&v| v != 0)
    }

    /// Parameter at `index` with a per-function default.
    pub fn get_or(&self, index: usize, default: u16) -> u16 {
        self.get(index).unwrap_or(default)
    }

    /// Number of subparameters attached to parameter `index`.
    pub fn subparam_count(&self, index: usize) -> usize {
        self.list.get(index).map_or(0, |g| g.len() - 1)
    }

    /// Subparameter `sub` (0-based) of parameter `index`.
    pub fn subparam(&self, index: usize, sub: usize) -> Option<u16> {
        self.list.get(index).and_then(|g| g.get(sub + 1)).copied()
    }

    /// Iterate over top-level parameter values.
    pub fn iter(&self) -> impl Iterator<Item = u16> + '_ {
        self.list.iter().map(|g| g[0])
    }

    /// Push a parameter value programmatically (used by the OSC path to
    /// front-load the numeric code).
    pub fn push(&mut self, value: u16) {
        if self.list.len() < MAX_PARAMETERS {
            self.list.push(vec![value]);
        }
    }
}

/// One fully parsed escape sequence.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sequence {
    pub category: FunctionCategory,
    /// Leader byte (`?`, `>`, `=`, `<`), 0 when absent.
    pub leader: u8,
    /// Intermediate characters (0x20..=0x2F).
    pub intermediates: String,
    pub params: Params,
    /// Final byte; for OSC sequences this is 0.
    pub final_byte: u8,
    /// String payload for OSC and hooked DCS sequences (after the numeric
    /// code for OSC).
    pub data: String,
}

impl Sequence {
    pub fn new(category: FunctionCategory) -> Self {
        Self {
            category,
            leader: 0,
            intermediates: String::new(),
            params: Params::new(),
            final_byte: 0,
            data: String::new(),
        }
    }

    /// Parameter accessors, mirrored from `Params` for dispatch-site brevity.
    pub fn param(&self, index: usize) -> u16 {
        self.params.raw(index)
    }

    pub fn param_or(&self, index: usize, default: u16) -> u16 {
        self.params.get_or(index, default)
    }

    pub fn parameter_count(&self) -> usize {
        self.params.len()
    }

    /// Render the sequence for log messages, e.g. `CSI ? 1049 h`.
    pub fn text(&self) -> String {
        let mut out = String::new();
        out.push_str(match self.category {
            FunctionCategory::C0 => "C0",
            FunctionCategory::Esc => "ESC",
            FunctionCategory::Csi => "CSI",
            FunctionCategory::Osc => "OSC",
            FunctionCategory::Dcs => "DCS",
        });
        if self.leader != 0 {
            out.push(' ');
            out.push(self.leader as char);
        }
        for (i, group) in self.params.list.iter().enumerate() {
            out.push(if i == 0 { ' ' } else { ';' });
            for (j, value) in group.iter().enumerate() {
                if j > 0 {
                    out.push(':');
                }
                out.push_str(&value.to_string());
            }
        }
        if !self.intermediates.is_empty() {
            out.push(' ');
            out.push_str(&self.intermediates);
        }
        if self.final_byte != 0 {
            out.push(' ');
            out.push(self.final_byte as char);
        }
        out
    }
}
