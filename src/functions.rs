//! VT function registry
//!
//! The single source of truth for which control functions this terminal
//! understands. Every recognized ESC/CSI/DCS sequence and OSC code has one
//! `FunctionDefinition` row here; adding support for a new function means
//! adding a row and a dispatch arm in the sequencer.
//!
//! Lookup narrows by (category, final byte) via binary search over the
//! sorted table, then disambiguates the short remainder by leader,
//! intermediates and parameter arity.

use serde::{Deserialize, Serialize};

use crate::sequence::Sequence;

/// Escape sequence category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum FunctionCategory {
    C0,
    Esc,
    Csi,
    Dcs,
    Osc,
}

/// Stable symbolic identifiers for all recognized functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[allow(clippy::upper_case_acronyms)]
pub enum FunctionId {
    // ESC
    DECSC,
    DECRC,
    IND,
    NEL,
    HTS,
    RI,
    SS2,
    SS3,
    RIS,
    DECKPAM,
    DECKPNM,
    DECALN,
    ScsG0Usascii,
    ScsG0Special,
    ScsG0Uk,
    ScsG1Usascii,
    ScsG1Special,
    ScsG1Uk,
    ScsG2Usascii,
    ScsG2Special,
    ScsG2Uk,
    ScsG3Usascii,
    ScsG3Special,
    ScsG3Uk,
    // CSI
    ICH,
    CUU,
    CUD,
    CUF,
    CUB,
    CNL,
    CPL,
    CHA,
    CUP,
    CHT,
    ED,
    DECSED,
    EL,
    DECSEL,
    IL,
    DL,
    DCH,
    SU,
    XTSMGRAPHICS,
    SD,
    ECH,
    CBT,
    HPA,
    HPR,
    REP,
    DA1,
    DA2,
    DA3,
    VPA,
    VPR,
    HVP,
    TBC,
    SM,
    DECSM,
    RM,
    DECRM,
    SGR,
    DSR,
    DECXCPR,
    DECRQM,
    DECRQMANSI,
    DECSTR,
    DECSCUSR,
    DECSCA,
    DECSTBM,
    DECSLRM,
    SCOSC,
    SCORC,
    DECMODESAVE,
    DECMODERESTORE,
    WINMANIP,
    XTCAPTURE,
    XTVERSION,
    DECRQPSR,
    DECCRA,
    DECFRA,
    DECERA,
    DECIC,
    DECDC,
    // DCS
    DECSIXEL,
    DECRQSS,
    XTGETTCAP,
    STP,
    // OSC
    SETICONANDTITLE,
    SETICON,
    SETTITLE,
    SETCOLPAL,
    SETCWD,
    HYPERLINK,
    COLORFG,
    COLORBG,
    COLORCURSOR,
    SETFONT,
    CLIPBOARD,
    SETFONTALL,
    RCOLPAL,
    RCOLORFG,
    RCOLORBG,
    RCOLORCURSOR,
    NOTIFY,
    ITERM2,
}

/// One registry row.
#[derive(Debug, Clone, Copy)]
pub struct FunctionDefinition {
    pub category: FunctionCategory,
    /// Leader byte (`?`, `>`, `=`, `<`); 0 when none.
    pub leader: u8,
    /// Required intermediate characters, in order.
    pub intermediates: &'static str,
    /// Final byte; 0 for OSC rows.
    pub final_byte: u8,
    /// Accepted parameter count range, inclusive.
    pub min_params: usize,
    pub max_params: usize,
    /// OSC code; only meaningful for `FunctionCategory::Osc` rows.
    pub osc_code: u16,
    pub id: FunctionId,
    pub doc: &'static str,
}

const fn esc(intermediates: &'static str, final_byte: u8, id: FunctionId, doc: &'static str) -> FunctionDefinition {
    FunctionDefinition {
        category: FunctionCategory::Esc,
        leader: 0,
        intermediates,
        final_byte,
        min_params: 0,
        max_params: 0,
        osc_code: 0,
        id,
        doc,
    }
}

const fn csi(
    leader: u8,
    intermediates: &'static str,
    final_byte: u8,
    min_params: usize,
    max_params: usize,
    id: FunctionId,
    doc: &'static str,
) -> FunctionDefinition {
    FunctionDefinition {
        category: FunctionCategory::Csi,
        leader,
        intermediates,
        final_byte,
        min_params,
        max_params,
        osc_code: 0,
        id,
        doc,
    }
}

const fn dcs(
    leader: u8,
    intermediates: &'static str,
    final_byte: u8,
    max_params: usize,
    id: FunctionId,
    doc: &'static str,
) -> FunctionDefinition {
    FunctionDefinition {
        category: FunctionCategory::Dcs,
        leader,
        intermediates,
        final_byte,
        min_params: 0,
        max_params,
        osc_code: 0,
        id,
        doc,
    }
}

const fn osc(code: u16, id: FunctionId, doc: &'static str) -> FunctionDefinition {
    FunctionDefinition {
        category: FunctionCategory::Osc,
        leader: 0,
        intermediates: "",
        final_byte: 0,
        min_params: 0,
        max_params: usize::MAX,
        osc_code: code,
        id,
        doc,
    }
}

use FunctionId::*;

/// The registry, sorted by (category, final byte) for range lookup.
/// OSC rows sort last (final byte 0 within the Osc category).
pub static FUNCTIONS: &[FunctionDefinition] = &[
    // -- ESC --------------------------------------------------------------
    esc("(", b'0', ScsG0Special, "Designate G0: DEC Special Graphics"),
    esc(")", b'0', ScsG1Special, "Designate G1: DEC Special Graphics"),
    esc("*", b'0', ScsG2Special, "Designate G2: DEC Special Graphics"),
    esc("+", b'0', ScsG3Special, "Designate G3: DEC Special Graphics"),
    esc("", b'7', DECSC, "Save cursor"),
    esc("", b'8', DECRC, "Restore cursor"),
    esc("#", b'8', DECALN, "Screen alignment pattern"),
    esc("", b'=', DECKPAM, "Application keypad mode"),
    esc("", b'>', DECKPNM, "Numeric keypad mode"),
    esc("(", b'A', ScsG0Uk, "Designate G0: United Kingdom"),
    esc(")", b'A', ScsG1Uk, "Designate G1: United Kingdom"),
    esc("*", b'A', ScsG2Uk, "Designate G2: United Kingdom"),
    esc("+", b'A', ScsG3Uk, "Designate G3: United Kingdom"),
    esc("(", b'B', ScsG0Usascii, "Designate G0: USASCII"),
    esc(")", b'B', ScsG1Usascii, "Designate G1: USASCII"),
    esc("*", b'B', ScsG2Usascii, "Designate G2: USASCII"),
    esc("+", b'B', ScsG3Usascii, "Designate G3: USASCII"),
    esc("", b'D', IND, "Index"),
    esc("", b'E', NEL, "Next line"),
    esc("", b'H', HTS, "Horizontal tab set"),
    esc("", b'M', RI, "Reverse index"),
    esc("", b'N', SS2, "Single shift G2"),
    esc("", b'O', SS3, "Single shift G3"),
    esc("", b'c', RIS, "Reset to initial state"),
    // -- CSI --------------------------------------------------------------
    csi(0, "", b'@', 0, 1, ICH, "Insert characters"),
    csi(0, "", b'A', 0, 1, CUU, "Cursor up"),
    csi(0, "", b'B', 0, 1, CUD, "Cursor down"),
    csi(0, "", b'C', 0, 1, CUF, "Cursor forward"),
    csi(0, "", b'D', 0, 1, CUB, "Cursor backward"),
    csi(0, "", b'E', 0, 1, CNL, "Cursor next line"),
    csi(0, "", b'F', 0, 1, CPL, "Cursor previous line"),
    csi(0, "", b'G', 0, 1, CHA, "Cursor horizontal absolute"),
    csi(0, "", b'H', 0, 2, CUP, "Cursor position"),
    csi(0, "", b'I', 0, 1, CHT, "Cursor forward tabulation"),
    csi(0, "", b'J', 0, 1, ED, "Erase in display"),
    csi(b'?', "", b'J', 0, 1, DECSED, "Selective erase in display"),
    csi(0, "", b'K', 0, 1, EL, "Erase in line"),
    csi(b'?', "", b'K', 0, 1, DECSEL, "Selective erase in line"),
    csi(0, "", b'L', 0, 1, IL, "Insert lines"),
    csi(0, "", b'M', 0, 1, DL, "Delete lines"),
    csi(0, "", b'P', 0, 1, DCH, "Delete characters"),
    csi(0, "", b'S', 0, 1, SU, "Scroll up"),
    csi(b'?', "", b'S', 2, 4, XTSMGRAPHICS, "Set/request graphics attributes"),
    csi(0, "", b'T', 0, 1, SD, "Scroll down"),
    csi(0, "", b'X', 0, 1, ECH, "Erase characters"),
    csi(0, "", b'Z', 0, 1, CBT, "Cursor backward tabulation"),
    csi(0, "", b'`', 0, 1, HPA, "Horizontal position absolute"),
    csi(0, "", b'a', 0, 1, HPR, "Horizontal position relative"),
    csi(0, "", b'b', 0, 1, REP, "Repeat preceding graphic character"),
    csi(0, "", b'c', 0, 1, DA1, "Primary device attributes"),
    csi(b'>', "", b'c', 0, 1, DA2, "Secondary device attributes"),
    csi(b'=', "", b'c', 0, 1, DA3, "Tertiary device attributes"),
    csi(0, "", b'd', 0, 1, VPA, "Vertical position absolute"),
    csi(0, "", b'e', 0, 1, VPR, "Vertical position relative"),
    csi(0, "", b'f', 0, 2, HVP, "Horizontal and vertical position"),
    csi(0, "", b'g', 0, 1, TBC, "Tab clear"),
    csi(0, "", b'h', 1, 16, SM, "Set mode"),
    csi(b'?', "", b'h', 1, 16, DECSM, "Set DEC private mode"),
    csi(0, "", b'l', 1, 16, RM, "Reset mode"),
    csi(b'?', "", b'l', 1, 16, DECRM, "Reset DEC private mode"),
    csi(0, "", b'm', 0, 16, SGR, "Select graphic rendition"),
    csi(0, "", b'n', 1, 1, DSR, "Device status report"),
    csi(b'?', "", b'n', 1, 1, DECXCPR, "Extended cursor position report"),
    csi(b'?', "$", b'p', 1, 1, DECRQM, "Request DEC private mode"),
    csi(0, "$", b'p', 1, 1, DECRQMANSI, "Request ANSI mode"),
    csi(0, "!", b'p', 0, 0, DECSTR, "Soft terminal reset"),
    csi(0, " ", b'q', 0, 1, DECSCUSR, "Set cursor style"),
    csi(0, "\"", b'q', 0, 1, DECSCA, "Select character protection"),
    csi(b'>', "", b'q', 0, 1, XTVERSION, "Request terminal name and version"),
    csi(0, "", b'r', 0, 2, DECSTBM, "Set top and bottom margins"),
    csi(b'?', "", b'r', 1, 16, DECMODERESTORE, "Restore DEC private modes"),
    csi(0, "", b's', 0, 0, SCOSC, "Save cursor (ANSI.SYS)"),
    csi(0, "", b's', 1, 2, DECSLRM, "Set left and right margins"),
    csi(b'?', "", b's', 1, 16, DECMODESAVE, "Save DEC private modes"),
    csi(0, "", b't', 1, 3, WINMANIP, "Window manipulation"),
    csi(b'>', "", b't', 1, 2, XTCAPTURE, "Request screen buffer capture"),
    csi(0, "", b'u', 0, 0, SCORC, "Restore cursor (ANSI.SYS)"),
    csi(0, "$", b'v', 0, 8, DECCRA, "Copy rectangular area"),
    csi(0, "$", b'w', 1, 1, DECRQPSR, "Request presentation state report"),
    csi(0, "$", b'x', 0, 5, DECFRA, "Fill rectangular area"),
    csi(0, "$", b'z', 0, 4, DECERA, "Erase rectangular area"),
    csi(0, "'", b'}', 0, 1, DECIC, "Insert columns"),
    csi(0, "'", b'~', 0, 1, DECDC, "Delete columns"),
    // -- DCS --------------------------------------------------------------
    dcs(0, "$", b'p', 0, STP, "Set terminal profile"),
    dcs(0, "", b'q', 3, DECSIXEL, "Sixel graphics image"),
    dcs(0, "$", b'q', 0, DECRQSS, "Request status string"),
    dcs(0, "+", b'q', 0, XTGETTCAP, "Request termcap/terminfo string"),
    // -- OSC --------------------------------------------------------------
    osc(0, SETICONANDTITLE, "Set icon name and window title"),
    osc(1, SETICON, "Set icon name"),
    osc(2, SETTITLE, "Set window title"),
    osc(4, SETCOLPAL, "Set or query color palette entry"),
    osc(7, SETCWD, "Set current working directory"),
    osc(8, HYPERLINK, "Begin or end hyperlink"),
    osc(10, COLORFG, "Set or query default foreground color"),
    osc(11, COLORBG, "Set or query default background color"),
    osc(12, COLORCURSOR, "Set or query cursor color"),
    osc(50, SETFONT, "Set or query font"),
    osc(52, CLIPBOARD, "Set clipboard contents"),
    osc(60, SETFONTALL, "Set or query all font faces"),
    osc(104, RCOLPAL, "Reset color palette entries"),
    osc(110, RCOLORFG, "Reset default foreground color"),
    osc(111, RCOLORBG, "Reset default background color"),
    osc(112, RCOLORCURSOR, "Reset cursor color"),
    osc(777, NOTIFY, "Desktop notification"),
    osc(1337, ITERM2, "iTerm2 extensions (SetMark)"),
];

/// Find the definition matching a parsed sequence.
///
/// ESC/CSI/DCS match on leader + intermediates + final byte + parameter
/// arity; OSC matches on the numeric code alone.
pub fn select(seq: &Sequence) -> Option<&'static FunctionDefinition> {
    if seq.category == FunctionCategory::Osc {
        let code = seq.param(0);
        return FUNCTIONS
            .iter()
            .find(|f| f.category == FunctionCategory::Osc && f.osc_code == code);
    }

    let key = (seq.category, seq.final_byte);
    let start = FUNCTIONS.partition_point(|f| (f.category, f.final_byte) < key);
    let candidates = FUNCTIONS[start..]
        .iter()
        .take_while(|f| (f.category, f.final_byte) == key);

    // For functions taking parameters, an omitted parameter list still
    // matches min_params == 1 rows (the default is applied at dispatch);
    // arity only disambiguates between rows sharing a final byte.
    let count = seq.parameter_count();
    let mut fallback = None;
    for def in candidates {
        if def.leader != seq.leader || def.intermediates != seq.intermediates {
            continue;
        }
        if count >= def.min_params && count <= def.max_params {
            return Some(def);
        }
        if fallback.is_none() {
            fallback = Some(def);
        }
    }
    fallback
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sequence::Params;

    fn seq(category: FunctionCategory, leader: u8, inter: &str, params: &[u8], final_byte: u8) -> Sequence {
        let mut s = Sequence::new(category);
        s.leader = leader;
        s.intermediates = inter.to_string();
        s.params = Params::parse(params);
        s.final_byte = final_byte;
        s
    }

    #[test]
    fn test_table_is_sorted_for_lookup() {
        let keys: Vec<_> = FUNCTIONS
            .iter()
            .map(|f| (f.category, f.final_byte))
            .collect();
        let mut sorted = keys.clone();
        sorted.sort();
        assert_eq!(keys, sorted, "registry must stay sorted by (category, final)");
    }

    #[test]
    fn test_select_cup() {
        let s = seq(FunctionCategory::Csi, 0, "", b"2;3", b'H');
        assert_eq!(select(&s).unwrap().id, FunctionId::CUP);
    }

    #[test]
    fn test_select_by_leader() {
        let plain = seq(FunctionCategory::Csi, 0, "", b"4", b'h');
        assert_eq!(select(&plain).unwrap().id, FunctionId::SM);

        let private = seq(FunctionCategory::Csi, b'?', "", b"1049", b'h');
        assert_eq!(select(&private).unwrap().id, FunctionId::DECSM);
    }

    #[test]
    fn test_select_by_intermediate() {
        let decrqm = seq(FunctionCategory::Csi, b'?', "$", b"6", b'p');
        assert_eq!(select(&decrqm).unwrap().id, FunctionId::DECRQM);

        let decstr = seq(FunctionCategory::Csi, 0, "!", b"", b'p');
        assert_eq!(select(&decstr).unwrap().id, FunctionId::DECSTR);
    }

    #[test]
    fn test_select_by_arity() {
        let save = seq(FunctionCategory::Csi, 0, "", b"", b's');
        assert_eq!(select(&save).unwrap().id, FunctionId::SCOSC);

        let margins = seq(FunctionCategory::Csi, 0, "", b"1;40", b's');
        assert_eq!(select(&margins).unwrap().id, FunctionId::DECSLRM);
    }

    #[test]
    fn test_select_dcs() {
        let sixel = seq(FunctionCategory::Dcs, 0, "", b"0;1;0", b'q');
        assert_eq!(select(&sixel).unwrap().id, FunctionId::DECSIXEL);

        let decrqss = seq(FunctionCategory::Dcs, 0, "$", b"", b'q');
        assert_eq!(select(&decrqss).unwrap().id, FunctionId::DECRQSS);

        let tcap = seq(FunctionCategory::Dcs, 0, "+", b"", b'q');
        assert_eq!(select(&tcap).unwrap().id, FunctionId::XTGETTCAP);
    }

    #[test]
    fn test_select_osc_by_code() {
        let mut s = Sequence::new(FunctionCategory::Osc);
        s.params.push(8);
        assert_eq!(select(&s).unwrap().id, FunctionId::HYPERLINK);

        let mut unknown = Sequence::new(FunctionCategory::Osc);
        unknown.params.push(9999);
        assert!(select(&unknown).is_none());
    }

    #[test]
    fn test_unknown_function() {
        let s = seq(FunctionCategory::Csi, b'>', "", b"", b'Z');
        assert!(select(&s).is_none());
    }
}
