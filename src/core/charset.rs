//! Character set translation (SCS, SO/SI, SS2/SS3)
//!
//! Each printable is translated through the active G-set before it reaches
//! the grid. Only the charsets the VT spec's designators name are carried:
//! USASCII, DEC Special Graphics and the UK set.

use serde::{Deserialize, Serialize};

/// A designatable character set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CharsetId {
    #[default]
    Usascii,
    /// DEC Special Graphics (line drawing), designator `0`.
    Special,
    /// British, designator `A` (only `#` differs).
    British,
}

/// The four designation slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CharsetTable {
    G0,
    G1,
    G2,
    G3,
}

/// Active charset state: slot designations, the locked-in GL slot, and a
/// pending single shift that applies to exactly one printable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharsetState {
    slots: [CharsetId; 4],
    gl: CharsetTable,
    single_shift: Option<CharsetTable>,
}

impl Default for CharsetState {
    fn default() -> Self {
        Self {
            slots: [CharsetId::Usascii; 4],
            gl: CharsetTable::G0,
            single_shift: None,
        }
    }
}

impl CharsetState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }

    pub fn designate(&mut self, table: CharsetTable, id: CharsetId) {
        self.slots[table as usize] = id;
    }

    pub fn slot(&self, table: CharsetTable) -> CharsetId {
        self.slots[table as usize]
    }

    /// SI: lock G0 into GL.
    pub fn shift_in(&mut self) {
        self.gl = CharsetTable::G0;
    }

    /// SO: lock G1 into GL.
    pub fn shift_out(&mut self) {
        self.gl = CharsetTable::G1;
    }

    /// SS2/SS3: use the given slot for the next printable only.
    pub fn single_shift(&mut self, table: CharsetTable) {
        self.single_shift = Some(table);
    }

    /// Translate one printable, consuming any pending single shift.
    pub fn map(&mut self, c: char) -> char {
        let table = self.single_shift.take().unwrap_or(self.gl);
        translate(self.slots[table as usize], c)
    }
}

fn translate(id: CharsetId, c: char) -> char {
    match id {
        CharsetId::Usascii => c,
        CharsetId::British => {
            if c == '#' {
                '£'
            } else {
                c
            }
        }
        CharsetId::Special => dec_special_graphics(c),
    }
}

/// DEC Special Graphics maps 0x5F..0x7E onto line-drawing glyphs
/// (https://vt100.net/docs/vt220-rm/table2-4.html).
fn dec_special_graphics(c: char) -> char {
    match c {
        '_' => ' ',
        '`' => '◆',
        'a' => '▒',
        'b' => '␉',
        'c' => '␌',
        'd' => '␍',
        'e' => '␊',
        'f' => '°',
        'g' => '±',
        'h' => '␤',
        'i' => '␋',
        'j' => '┘',
        'k' => '┐',
        'l' => '┌',
        'm' => '└',
        'n' => '┼',
        'o' => '⎺',
        'p' => '⎻',
        'q' => '─',
        'r' => '⎼',
        's' => '⎽',
        't' => '├',
        'u' => '┤',
        'v' => '┴',
        'w' => '┬',
        'x' => '│',
        'y' => '≤',
        'z' => '≥',
        '{' => 'π',
        '|' => '≠',
        '}' => '£',
        '~' => '·',
        _ => c,
    }
}

/// Map an SCS designator final byte onto a charset, if recognized.
pub fn charset_for_designator(final_byte: u8) -> Option<CharsetId> {
    match final_byte {
        b'B' => Some(CharsetId::Usascii),
        b'0' => Some(CharsetId::Special),
        b'A' => Some(CharsetId::British),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_transparent() {
        let mut state = CharsetState::new();
        assert_eq!(state.map('q'), 'q');
        assert_eq!(state.map('#'), '#');
    }

    #[test]
    fn test_shift_out_uses_g1() {
        let mut state = CharsetState::new();
        state.designate(CharsetTable::G1, CharsetId::Special);
        assert_eq!(state.map('q'), 'q');
        state.shift_out();
        assert_eq!(state.map('q'), '─');
        assert_eq!(state.map('x'), '│');
        state.shift_in();
        assert_eq!(state.map('q'), 'q');
    }

    #[test]
    fn test_single_shift_applies_once() {
        let mut state = CharsetState::new();
        state.designate(CharsetTable::G2, CharsetId::Special);
        state.single_shift(CharsetTable::G2);
        assert_eq!(state.map('j'), '┘');
        assert_eq!(state.map('j'), 'j');
    }

    #[test]
    fn test_british_pound() {
        let mut state = CharsetState::new();
        state.designate(CharsetTable::G0, CharsetId::British);
        assert_eq!(state.map('#'), '£');
        assert_eq!(state.map('a'), 'a');
    }

    #[test]
    fn test_designator_parsing() {
        assert_eq!(charset_for_designator(b'B'), Some(CharsetId::Usascii));
        assert_eq!(charset_for_designator(b'0'), Some(CharsetId::Special));
        assert_eq!(charset_for_designator(b'A'), Some(CharsetId::British));
        assert_eq!(charset_for_designator(b'Z'), None);
    }
}
