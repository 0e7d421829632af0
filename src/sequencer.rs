//! Semantic dispatch of parser events
//!
//! The sequencer turns parser events into `Sequence` values, resolves them
//! against the function registry and applies them to the screen. DCS
//! sequences install hook sub-parsers (Sixel, DECRQSS, XTGETTCAP, STP)
//! that live exactly as long as their sequence.

use base64::Engine as _;
use tracing::debug;

use crate::core::cell::UnderlineStyle;
use crate::core::charset::{charset_for_designator, CharsetId, CharsetTable};
use crate::core::color::{parse_color, Color, DynamicColor};
use crate::core::cursor::CursorShape;
use crate::core::modes::{AnsiMode, DecMode};
use crate::core::screen::{Screen, StatusString};
use crate::events::{EventListener, FontDef, WindowResize};
use crate::functions::{select, FunctionCategory, FunctionId};
use crate::parser::Action;
use crate::sequence::{Params, Sequence};
use crate::sixel::{SixelImageBuilder, SixelParser};

/// Cap on bytes buffered by the string-collecting DCS hooks.
const MAX_COLLECTED: usize = 4096;

/// Outcome of dispatching one sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyResult {
    Ok,
    /// Parameter values outside the function's contract.
    Invalid,
    /// Recognized but not implemented.
    Unsupported,
}

impl ApplyResult {
    fn worst(self, other: ApplyResult) -> ApplyResult {
        use ApplyResult::*;
        match (self, other) {
            (Invalid, _) | (_, Invalid) => Invalid,
            (Unsupported, _) | (_, Unsupported) => Unsupported,
            _ => Ok,
        }
    }
}

/// Bounded accumulator for DECRQSS/XTGETTCAP/STP payloads.
#[derive(Debug, Default)]
struct StringCollector {
    data: Vec<u8>,
}

impl StringCollector {
    fn put(&mut self, byte: u8) {
        if self.data.len() < MAX_COLLECTED {
            self.data.push(byte);
        }
    }

    fn into_string(self) -> String {
        String::from_utf8_lossy(&self.data).into_owned()
    }
}

/// A hooked DCS sub-parser; owned for the duration of one sequence.
enum Hook {
    Sixel(Box<SixelParser>),
    StatusString(StringCollector),
    Termcap(StringCollector),
    Profile(StringCollector),
}

/// The sequencer.
#[derive(Default)]
pub struct Sequencer {
    hook: Option<Hook>,
}

impl Sequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one parser event to the screen.
    pub fn process<L: EventListener>(
        &mut self,
        action: Action,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        let result = match action {
            Action::Print(c) => {
                screen.write_char(c);
                ApplyResult::Ok
            }
            Action::Execute(byte) => self.execute(byte, screen),
            Action::Esc {
                intermediates,
                final_byte,
            } => {
                let mut seq = Sequence::new(FunctionCategory::Esc);
                seq.intermediates = String::from_utf8_lossy(&intermediates).into_owned();
                seq.final_byte = final_byte;
                self.dispatch(seq, screen)
            }
            Action::Csi {
                leader,
                intermediates,
                params,
                final_byte,
            } => {
                let mut seq = Sequence::new(FunctionCategory::Csi);
                seq.leader = leader;
                seq.intermediates = String::from_utf8_lossy(&intermediates).into_owned();
                seq.params = params;
                seq.final_byte = final_byte;
                self.dispatch(seq, screen)
            }
            Action::Osc { data } => {
                let mut seq = Sequence::new(FunctionCategory::Osc);
                let (code, rest) = split_osc(&data);
                seq.params.push(code);
                seq.data = rest;
                self.dispatch(seq, screen)
            }
            Action::DcsHook {
                leader,
                intermediates,
                params,
                final_byte,
            } => {
                let mut seq = Sequence::new(FunctionCategory::Dcs);
                seq.leader = leader;
                seq.intermediates = String::from_utf8_lossy(&intermediates).into_owned();
                seq.params = params;
                seq.final_byte = final_byte;
                self.install_hook(seq, screen)
            }
            Action::DcsPut(byte) => {
                match self.hook.as_mut() {
                    Some(Hook::Sixel(parser)) => parser.pass(byte),
                    Some(Hook::StatusString(c))
                    | Some(Hook::Termcap(c))
                    | Some(Hook::Profile(c)) => c.put(byte),
                    None => {}
                }
                ApplyResult::Ok
            }
            Action::DcsUnhook => self.finalize_hook(screen),
        };
        screen.verify_state();
        result
    }

    /// C0 execution.
    fn execute<L: EventListener>(&mut self, byte: u8, screen: &mut Screen<L>) -> ApplyResult {
        match byte {
            0x07 => screen.bell(),
            0x08 => screen.backspace(),
            0x09 => screen.move_to_next_tab(),
            0x0A => screen.linefeed(),
            // VT and FF execute as IND, following xterm
            0x0B | 0x0C => screen.index(),
            0x0D => screen.carriage_return(),
            0x0E => screen.shift_out(),
            0x0F => screen.shift_in(),
            _ => {
                debug!(byte, "ignored C0 control");
            }
        }
        ApplyResult::Ok
    }

    fn dispatch<L: EventListener>(
        &mut self,
        seq: Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        let Some(def) = select(&seq) else {
            debug!(sequence = %seq.text(), "unknown VT sequence");
            return ApplyResult::Unsupported;
        };
        let result = self.apply(def.id, &seq, screen);
        match result {
            ApplyResult::Invalid => debug!(sequence = %seq.text(), "invalid VT sequence"),
            ApplyResult::Unsupported => {
                debug!(sequence = %seq.text(), "unsupported VT sequence")
            }
            ApplyResult::Ok => {}
        }
        result
    }

    // ---- DCS hooks -------------------------------------------------------

    fn install_hook<L: EventListener>(
        &mut self,
        seq: Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        self.hook = None;
        let Some(def) = select(&seq) else {
            debug!(sequence = %seq.text(), "unknown DCS sequence");
            return ApplyResult::Unsupported;
        };
        match def.id {
            FunctionId::DECSIXEL => {
                // P2 = 1 requests a transparent background
                let transparent = seq.param_or(1, 0) == 1;
                let background = if transparent {
                    None
                } else {
                    Some(screen.palette().background)
                };
                let builder = SixelImageBuilder::new(
                    screen.config().max_image_size,
                    background,
                    256,
                );
                self.hook = Some(Hook::Sixel(Box::new(SixelParser::new(builder))));
                ApplyResult::Ok
            }
            FunctionId::DECRQSS => {
                self.hook = Some(Hook::StatusString(StringCollector::default()));
                ApplyResult::Ok
            }
            FunctionId::XTGETTCAP => {
                self.hook = Some(Hook::Termcap(StringCollector::default()));
                ApplyResult::Ok
            }
            FunctionId::STP => {
                self.hook = Some(Hook::Profile(StringCollector::default()));
                ApplyResult::Ok
            }
            _ => ApplyResult::Unsupported,
        }
    }

    fn finalize_hook<L: EventListener>(&mut self, screen: &mut Screen<L>) -> ApplyResult {
        match self.hook.take() {
            Some(Hook::Sixel(parser)) => {
                let (size, rgba) = parser.finalize();
                screen.sixel_image(size, rgba);
                ApplyResult::Ok
            }
            Some(Hook::StatusString(collector)) => {
                let target = StatusString::from_payload(&collector.into_string());
                screen.request_status_string(target);
                ApplyResult::Ok
            }
            Some(Hook::Termcap(collector)) => {
                let payload = collector.into_string();
                for cap in payload.split(';') {
                    match hex_decode(cap) {
                        Some(name) => screen.request_capability(&name),
                        None => screen.reply(format!("\x1bP0+r{cap}\x1b\\")),
                    }
                }
                ApplyResult::Ok
            }
            Some(Hook::Profile(collector)) => {
                let name = collector.into_string();
                screen.listener_mut().set_terminal_profile(&name);
                ApplyResult::Ok
            }
            None => ApplyResult::Ok,
        }
    }

    // ---- function dispatch ----------------------------------------------

    fn apply<L: EventListener>(
        &mut self,
        id: FunctionId,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        use FunctionId::*;
        match id {
            // -- ESC ------------------------------------------------------
            DECSC => screen.save_cursor(),
            DECRC => screen.restore_cursor(),
            IND => screen.index(),
            NEL => screen.next_line(),
            HTS => screen.horizontal_tab_set(),
            RI => screen.reverse_index(),
            SS2 => screen.single_shift(CharsetTable::G2),
            SS3 => screen.single_shift(CharsetTable::G3),
            RIS => screen.hard_reset(),
            DECKPAM | DECKPNM => return ApplyResult::Unsupported,
            DECALN => screen.screen_alignment_pattern(),
            ScsG0Usascii | ScsG0Special | ScsG0Uk => {
                self.designate(screen, CharsetTable::G0, seq.final_byte)
            }
            ScsG1Usascii | ScsG1Special | ScsG1Uk => {
                self.designate(screen, CharsetTable::G1, seq.final_byte)
            }
            ScsG2Usascii | ScsG2Special | ScsG2Uk => {
                self.designate(screen, CharsetTable::G2, seq.final_byte)
            }
            ScsG3Usascii | ScsG3Special | ScsG3Uk => {
                self.designate(screen, CharsetTable::G3, seq.final_byte)
            }

            // -- CSI: cursor motion ---------------------------------------
            CUU => screen.move_cursor_up(usize::from(seq.param_or(0, 1))),
            CUD | VPR => screen.move_cursor_down(usize::from(seq.param_or(0, 1))),
            CUF | HPR => screen.move_cursor_forward(usize::from(seq.param_or(0, 1))),
            CUB => screen.move_cursor_backward(usize::from(seq.param_or(0, 1))),
            CNL => screen.move_cursor_to_next_line(usize::from(seq.param_or(0, 1))),
            CPL => screen.move_cursor_to_prev_line(usize::from(seq.param_or(0, 1))),
            CHA | HPA => screen.move_cursor_to_column(usize::from(seq.param_or(0, 1)) - 1),
            VPA => screen.move_cursor_to_line(usize::from(seq.param_or(0, 1)) - 1),
            CUP | HVP => screen.move_cursor_to(
                usize::from(seq.param_or(0, 1)) - 1,
                usize::from(seq.param_or(1, 1)) - 1,
            ),
            CHT => screen.cursor_forward_tab(usize::from(seq.param_or(0, 1))),
            CBT => screen.cursor_backward_tab(usize::from(seq.param_or(0, 1))),

            // -- CSI: erase -----------------------------------------------
            ED => {
                match seq.param_or(0, 0) {
                    0 => screen.clear_to_end_of_screen(),
                    1 => screen.clear_to_begin_of_screen(),
                    2 => screen.clear_screen(),
                    3 => screen.clear_scrollback(),
                    _ => return ApplyResult::Invalid,
                }
            }
            DECSED => {
                match seq.param_or(0, 0) {
                    0 => screen.selective_erase_to_end_of_screen(),
                    1 => screen.selective_erase_to_begin_of_screen(),
                    2 => screen.selective_erase_screen(),
                    _ => return ApplyResult::Invalid,
                }
            }
            EL => {
                match seq.param_or(0, 0) {
                    0 => screen.clear_to_end_of_line(),
                    1 => screen.clear_to_begin_of_line(),
                    2 => screen.clear_line(),
                    _ => return ApplyResult::Invalid,
                }
            }
            DECSEL => {
                match seq.param_or(0, 0) {
                    0 => screen.selective_erase_to_end_of_line(),
                    1 => screen.selective_erase_to_begin_of_line(),
                    2 => screen.selective_erase_line(),
                    _ => return ApplyResult::Invalid,
                }
            }
            ECH => screen.erase_characters(usize::from(seq.param_or(0, 1))),
            DCH => screen.delete_characters(usize::from(seq.param_or(0, 1))),
            ICH => screen.insert_characters(usize::from(seq.param_or(0, 1))),
            IL => screen.insert_lines(usize::from(seq.param_or(0, 1))),
            DL => screen.delete_lines(usize::from(seq.param_or(0, 1))),
            DECIC => screen.insert_columns(usize::from(seq.param_or(0, 1))),
            DECDC => screen.delete_columns(usize::from(seq.param_or(0, 1))),

            // -- CSI: scrolling -------------------------------------------
            SU => screen.scroll_up(usize::from(seq.param_or(0, 1))),
            SD => screen.scroll_down(usize::from(seq.param_or(0, 1))),
            REP => screen.repeat_preceding(usize::from(seq.param_or(0, 1))),

            // -- CSI: rectangles ------------------------------------------
            DECCRA => {
                let rows = screen.rows() as u16;
                let cols = screen.cols() as u16;
                let src = (
                    seq.param_or(0, 1),
                    seq.param_or(1, 1),
                    seq.param_or(2, rows),
                    seq.param_or(3, cols),
                );
                let dst_top = seq.param_or(5, 1);
                let dst_left = seq.param_or(6, 1);
                screen.copy_area(src, dst_top, dst_left);
            }
            DECERA => {
                let rows = screen.rows() as u16;
                let cols = screen.cols() as u16;
                screen.erase_area(
                    seq.param_or(0, 1),
                    seq.param_or(1, 1),
                    seq.param_or(2, rows),
                    seq.param_or(3, cols),
                );
            }
            DECFRA => {
                let Some(fill) = char::from_u32(u32::from(seq.param(0))) else {
                    return ApplyResult::Invalid;
                };
                if seq.param(0) == 0 {
                    return ApplyResult::Invalid;
                }
                let rows = screen.rows() as u16;
                let cols = screen.cols() as u16;
                screen.fill_area(
                    fill,
                    seq.param_or(1, 1),
                    seq.param_or(2, 1),
                    seq.param_or(3, rows),
                    seq.param_or(4, cols),
                );
            }

            // -- CSI: margins ---------------------------------------------
            DECSTBM => {
                let top = seq.params.get(0).map(|v| usize::from(v) - 1);
                let bottom = seq.params.get(1).map(|v| usize::from(v) - 1);
                screen.set_top_bottom_margins(top, bottom);
            }
            DECSLRM => {
                let left = seq.params.get(0).map(|v| usize::from(v) - 1);
                let right = seq.params.get(1).map(|v| usize::from(v) - 1);
                screen.set_left_right_margins(left, right);
            }

            // -- CSI: modes -----------------------------------------------
            SM => return self.ansi_modes(seq, screen, true),
            RM => return self.ansi_modes(seq, screen, false),
            DECSM => return self.dec_modes(seq, screen, true),
            DECRM => return self.dec_modes(seq, screen, false),
            DECMODESAVE => {
                let modes = known_dec_modes(&seq.params);
                screen.save_modes(&modes);
            }
            DECMODERESTORE => {
                let modes = known_dec_modes(&seq.params);
                screen.restore_modes(&modes);
            }
            DECRQM => screen.request_dec_mode(seq.param(0)),
            DECRQMANSI => screen.request_ansi_mode(seq.param(0)),

            // -- CSI: attributes ------------------------------------------
            SGR => return self.select_graphic_rendition(seq, screen),
            DECSCUSR => {
                return match seq.param_or(0, 1) {
                    0 | 1 => ok(screen.set_cursor_style(CursorShape::Block, true)),
                    2 => ok(screen.set_cursor_style(CursorShape::Block, false)),
                    3 => ok(screen.set_cursor_style(CursorShape::Underscore, true)),
                    4 => ok(screen.set_cursor_style(CursorShape::Underscore, false)),
                    5 => ok(screen.set_cursor_style(CursorShape::Bar, true)),
                    6 => ok(screen.set_cursor_style(CursorShape::Bar, false)),
                    _ => ApplyResult::Invalid,
                };
            }
            DECSCA => {
                return match seq.param_or(0, 0) {
                    0 | 2 => ok(screen.set_character_protection(false)),
                    1 => ok(screen.set_character_protection(true)),
                    _ => ApplyResult::Invalid,
                };
            }

            // -- CSI: reports ---------------------------------------------
            DA1 => screen.send_device_attributes(),
            DA2 => screen.send_terminal_id(),
            DA3 => screen.send_tertiary_attributes(),
            DSR => {
                return match seq.param(0) {
                    5 => ok(screen.device_status_report()),
                    6 => ok(screen.report_cursor_position()),
                    _ => ApplyResult::Unsupported,
                };
            }
            DECXCPR => {
                return match seq.param(0) {
                    6 => ok(screen.report_extended_cursor_position()),
                    _ => ApplyResult::Unsupported,
                };
            }
            DECRQPSR => {
                return match seq.param(0) {
                    2 => ok(screen.report_tab_stops()),
                    1 => ApplyResult::Unsupported,
                    _ => ApplyResult::Invalid,
                };
            }
            XTVERSION => screen.report_version(),
            XTSMGRAPHICS => return self.xtsmgraphics(seq, screen),

            // -- CSI: cursor save / tabs / reset --------------------------
            SCOSC => {
                // with DECLRMM active, `CSI s` sets default margins instead
                if screen.modes().get(DecMode::LeftRightMargin) {
                    screen.set_left_right_margins(None, None);
                } else {
                    screen.save_cursor();
                }
            }
            SCORC => screen.restore_cursor(),
            TBC => {
                return match seq.param_or(0, 0) {
                    0 => ok(screen.tab_clear_at_cursor()),
                    3 => ok(screen.tab_clear_all()),
                    _ => ApplyResult::Invalid,
                };
            }
            DECSTR => screen.soft_reset(),

            // -- CSI: window ----------------------------------------------
            WINMANIP => return self.window_manipulation(seq, screen),
            XTCAPTURE => {
                let logical = seq.param_or(0, 0);
                if logical > 1 {
                    return ApplyResult::Invalid;
                }
                let rows = screen.rows();
                let count = usize::from(seq.param(1));
                let count = if count == 0 { rows } else { count };
                screen
                    .listener_mut()
                    .request_capture_buffer(count, logical == 1);
            }

            // -- OSC ------------------------------------------------------
            SETICONANDTITLE | SETTITLE => screen.set_window_title(&seq.data.clone()),
            SETICON => {}
            SETCOLPAL => return self.color_palette_osc(seq, screen),
            SETCWD => screen.set_working_directory(&seq.data.clone()),
            HYPERLINK => return self.hyperlink_osc(seq, screen),
            COLORFG => return self.dynamic_color_osc(seq, screen, DynamicColor::Foreground),
            COLORBG => return self.dynamic_color_osc(seq, screen, DynamicColor::Background),
            COLORCURSOR => return self.dynamic_color_osc(seq, screen, DynamicColor::Cursor),
            SETFONT => return self.set_font(seq, screen),
            SETFONTALL => return self.set_font_all(seq, screen),
            CLIPBOARD => return self.clipboard(seq, screen),
            RCOLPAL => {
                if seq.data.is_empty() {
                    screen.reset_palette();
                } else {
                    for part in seq.data.clone().split(';') {
                        match part.parse::<u8>() {
                            Ok(index) => screen.reset_palette_color(index),
                            Err(_) => return ApplyResult::Invalid,
                        }
                    }
                }
            }
            RCOLORFG => screen.reset_dynamic_color(DynamicColor::Foreground),
            RCOLORBG => screen.reset_dynamic_color(DynamicColor::Background),
            RCOLORCURSOR => screen.reset_dynamic_color(DynamicColor::Cursor),
            NOTIFY => {
                let parts: Vec<&str> = seq.data.splitn(3, ';').collect();
                return match parts.as_slice() {
                    ["notify", title, body] => {
                        let (title, body) = (title.to_string(), body.to_string());
                        screen.notify(&title, &body);
                        ApplyResult::Ok
                    }
                    _ => ApplyResult::Unsupported,
                };
            }
            ITERM2 => {
                return match seq.data.as_str() {
                    "SetMark" => ok(screen.set_mark()),
                    _ => ApplyResult::Unsupported,
                };
            }

            // DCS ids are handled by the hook path
            DECSIXEL | DECRQSS | XTGETTCAP | STP => return ApplyResult::Unsupported,
        }
        ApplyResult::Ok
    }

    fn designate<L: EventListener>(
        &self,
        screen: &mut Screen<L>,
        table: CharsetTable,
        final_byte: u8,
    ) {
        let id = charset_for_designator(final_byte).unwrap_or(CharsetId::Usascii);
        screen.designate_charset(table, id);
    }

    fn ansi_modes<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
        enable: bool,
    ) -> ApplyResult {
        let mut result = ApplyResult::Ok;
        for value in seq.params.iter() {
            let step = match AnsiMode::from_number(value) {
                Some(mode @ (AnsiMode::Insert | AnsiMode::AutomaticNewline)) => {
                    screen.set_ansi_mode(mode, enable);
                    ApplyResult::Ok
                }
                // KAM and SRM are recognized, never implemented
                Some(_) | None => ApplyResult::Unsupported,
            };
            result = result.worst(step);
        }
        result
    }

    fn dec_modes<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
        enable: bool,
    ) -> ApplyResult {
        let mut result = ApplyResult::Ok;
        for value in seq.params.iter() {
            match DecMode::from_number(value) {
                Some(mode) => screen.set_mode(mode, enable),
                None => result = result.worst(ApplyResult::Invalid),
            }
        }
        result
    }

    // ---- SGR -------------------------------------------------------------

    fn select_graphic_rendition<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        if seq.parameter_count() == 0 {
            screen.attrs_mut().reset();
            return ApplyResult::Ok;
        }

        let mut result = ApplyResult::Ok;
        let mut i = 0;
        while i < seq.parameter_count() {
            let attrs = screen.attrs_mut();
            match seq.param(i) {
                0 => attrs.reset(),
                1 => attrs.bold = true,
                2 => attrs.faint = true,
                3 => attrs.italic = true,
                4 => {
                    attrs.underline = match seq.params.subparam(i, 0) {
                        None | Some(1) => UnderlineStyle::Single,
                        Some(0) => UnderlineStyle::None,
                        Some(2) => UnderlineStyle::Double,
                        Some(3) => UnderlineStyle::Curly,
                        Some(4) => UnderlineStyle::Dotted,
                        Some(5) => UnderlineStyle::Dashed,
                        Some(_) => UnderlineStyle::Single,
                    };
                }
                5 | 6 => attrs.blink = true,
                7 => attrs.inverse = true,
                8 => attrs.hidden = true,
                9 => attrs.crossed_out = true,
                21 => attrs.underline = UnderlineStyle::Double,
                22 => {
                    attrs.bold = false;
                    attrs.faint = false;
                }
                23 => attrs.italic = false,
                24 => attrs.underline = UnderlineStyle::None,
                25 => attrs.blink = false,
                27 => attrs.inverse = false,
                28 => attrs.hidden = false,
                29 => attrs.crossed_out = false,
                30..=37 => attrs.fg = Color::Indexed((seq.param(i) - 30) as u8),
                38 => match parse_color_spec(seq, &mut i) {
                    ColorSpec::Color(color) => screen.attrs_mut().fg = color,
                    ColorSpec::Unsupported => result = result.worst(ApplyResult::Unsupported),
                    ColorSpec::Invalid => result = result.worst(ApplyResult::Invalid),
                },
                39 => attrs.fg = Color::Default,
                40..=47 => attrs.bg = Color::Indexed((seq.param(i) - 40) as u8),
                48 => match parse_color_spec(seq, &mut i) {
                    ColorSpec::Color(color) => screen.attrs_mut().bg = color,
                    ColorSpec::Unsupported => result = result.worst(ApplyResult::Unsupported),
                    ColorSpec::Invalid => result = result.worst(ApplyResult::Invalid),
                },
                49 => attrs.bg = Color::Default,
                51 => attrs.framed = true,
                52 => attrs.encircled = true,
                53 => attrs.overline = true,
                54 => {
                    attrs.framed = false;
                    attrs.encircled = false;
                }
                55 => attrs.overline = false,
                58 => match parse_color_spec(seq, &mut i) {
                    ColorSpec::Color(color) => screen.attrs_mut().underline_color = color,
                    ColorSpec::Unsupported => result = result.worst(ApplyResult::Unsupported),
                    ColorSpec::Invalid => result = result.worst(ApplyResult::Invalid),
                },
                59 => attrs.underline_color = Color::Default,
                90..=97 => attrs.fg = Color::Indexed((seq.param(i) - 90 + 8) as u8),
                100..=107 => attrs.bg = Color::Indexed((seq.param(i) - 100 + 8) as u8),
                other => {
                    debug!(parameter = other, "unknown SGR parameter");
                    result = result.worst(ApplyResult::Unsupported);
                }
            }
            i += 1;
        }
        result
    }

    // ---- CSI helpers -----------------------------------------------------

    fn xtsmgraphics<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        let item = seq.param(0);
        let action = seq.param(1);
        match (item, action) {
            // number of color registers: read / read-limit
            (1, 1) | (1, 4) => {
                screen.reply("\x1b[?1;0;256S");
                ApplyResult::Ok
            }
            // sixel geometry: read / read-limit
            (2, 1) | (2, 4) => {
                let size = screen.config().max_image_size;
                screen.reply(format!("\x1b[?2;0;{};{}S", size.width, size.height));
                ApplyResult::Ok
            }
            (1..=3, 2) | (1..=3, 3) => ApplyResult::Unsupported,
            _ => ApplyResult::Invalid,
        }
    }

    fn window_manipulation<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        match seq.param(0) {
            4 => {
                let height = u32::from(seq.param(1));
                let width = u32::from(seq.param(2));
                screen.resize_window(WindowResize::Pixels(width, height));
            }
            8 => {
                let rows = usize::from(seq.param(1));
                let cols = usize::from(seq.param(2));
                screen.resize_window(WindowResize::Cells(cols, rows));
            }
            14 => screen.request_pixel_size(),
            16 => screen.request_cell_pixel_size(),
            18 => screen.request_character_size(),
            19 => screen.request_screen_character_size(),
            22 => screen.save_window_title(),
            23 => screen.restore_window_title(),
            _ => return ApplyResult::Unsupported,
        }
        ApplyResult::Ok
    }

    // ---- OSC helpers -----------------------------------------------------

    fn color_palette_osc<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        // payload := index ';' ('?' | color) (';' index ';' ...)*
        let data = seq.data.clone();
        let mut parts = data.split(';');
        loop {
            let Some(index_str) = parts.next() else {
                return ApplyResult::Ok;
            };
            let Ok(index) = index_str.parse::<u8>() else {
                return ApplyResult::Invalid;
            };
            match parts.next() {
                Some("?") => screen.report_palette_color(index),
                Some(spec) => match parse_color(spec) {
                    Ok(color) => screen.set_palette_color(index, color),
                    Err(_) => return ApplyResult::Invalid,
                },
                None => return ApplyResult::Invalid,
            }
        }
    }

    fn dynamic_color_osc<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
        name: DynamicColor,
    ) -> ApplyResult {
        if seq.data == "?" {
            screen.report_dynamic_color(name);
            return ApplyResult::Ok;
        }
        match parse_color(&seq.data) {
            Ok(color) => {
                screen.set_dynamic_color(name, color);
                ApplyResult::Ok
            }
            Err(_) => ApplyResult::Invalid,
        }
    }

    fn hyperlink_osc<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        // OSC 8 ; params ; URI — params are ':'-separated key=value pairs
        let data = seq.data.clone();
        let Some((params, uri)) = data.split_once(';') else {
            screen.hyperlink(None, "");
            return ApplyResult::Ok;
        };
        let id = params.split(':').find_map(|pair| {
            pair.strip_prefix("id=")
        });
        screen.hyperlink(id, uri);
        ApplyResult::Ok
    }

    fn set_font<L: EventListener>(&self, seq: &Sequence, screen: &mut Screen<L>) -> ApplyResult {
        if seq.data == "?" {
            let font = screen.listener_mut().get_font_def();
            screen.reply(format!("\x1b]50;{}\x1b\\", font.regular));
        } else {
            let font = FontDef {
                regular: seq.data.clone(),
                ..FontDef::default()
            };
            screen.listener_mut().set_font_def(&font);
        }
        ApplyResult::Ok
    }

    fn set_font_all<L: EventListener>(
        &self,
        seq: &Sequence,
        screen: &mut Screen<L>,
    ) -> ApplyResult {
        let data = seq.data.clone();
        let fields: Vec<&str> = data.split(';').collect();
        if fields.iter().all(|f| f.is_empty()) {
            let font = screen.listener_mut().get_font_def();
            screen.reply(format!(
                "\x1b]60;{};{};{};{};{};{}\x1b\\",
                (font.size * 100.0) as u32,
                font.regular,
                font.bold,
                font.italic,
                font.bold_italic,
                font.emoji,
            ));
            return ApplyResult::Ok;
        }
        let field = |n: usize| fields.get(n).copied().unwrap_or("").to_string();
        let size = field(0).parse::<u32>().unwrap_or(0);
        let font = FontDef {
            size: f64::from(size) / 100.0,
            regular: field(1),
            bold: field(2),
            italic: field(3),
            bold_italic: field(4),
            emoji: field(5),
        };
        screen.listener_mut().set_font_def(&font);
        ApplyResult::Ok
    }

    fn clipboard<L: EventListener>(&self, seq: &Sequence, screen: &mut Screen<L>) -> ApplyResult {
        // only setting the clipboard is supported, never reading it out
        let data = seq.data.clone();
        let Some((target, payload)) = data.split_once(';') else {
            return ApplyResult::Invalid;
        };
        if target != "c" || payload == "?" {
            return ApplyResult::Unsupported;
        }
        match base64::engine::general_purpose::STANDARD.decode(payload) {
            Ok(bytes) => {
                screen.listener_mut().copy_to_clipboard(&bytes);
                ApplyResult::Ok
            }
            Err(_) => ApplyResult::Invalid,
        }
    }
}

fn ok<T>(_: T) -> ApplyResult {
    ApplyResult::Ok
}

/// Split an OSC payload into its numeric code and the remaining data.
fn split_osc(data: &[u8]) -> (u16, String) {
    let text = String::from_utf8_lossy(data);
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    let code = text[..digits].parse::<u16>().unwrap_or(u16::MAX);
    let rest = &text[digits..];
    let rest = rest.strip_prefix(';').unwrap_or(rest);
    (code, rest.to_string())
}

/// Collect the recognized DEC modes out of a parameter list.
fn known_dec_modes(params: &Params) -> Vec<DecMode> {
    params.iter().filter_map(DecMode::from_number).collect()
}

/// Decode a hex string (2 digits per character), as used by XTGETTCAP.
fn hex_decode(hex: &str) -> Option<String> {
    if hex.is_empty() || hex.len() % 2 != 0 {
        return None;
    }
    let mut out = Vec::with_capacity(hex.len() / 2);
    let bytes = hex.as_bytes();
    for pair in bytes.chunks_exact(2) {
        let pair = std::str::from_utf8(pair).ok()?;
        out.push(u8::from_str_radix(pair, 16).ok()?);
    }
    String::from_utf8(out).ok()
}

/// Result of parsing one SGR 38/48/58 color specification.
enum ColorSpec {
    Color(Color),
    /// CMY/CMYK: parsed, deliberately not applied.
    Unsupported,
    Invalid,
}

/// Parse the color forms behind SGR 38/48/58, advancing `i` past the
/// consumed parameters. Handles both the `:`-subparameter form and the
/// legacy `;`-separated compatibility form.
fn parse_color_spec(seq: &Sequence, i: &mut usize) -> ColorSpec {
    let subs = seq.params.subparam_count(*i);
    if subs >= 1 {
        let sub = |n: usize| seq.params.subparam(*i, n).unwrap_or(0);
        return match sub(0) {
            2 => {
                // ":2:R:G:B" or ":2::R:G:B" (colorspace id slot skipped)
                let (r, g, b) = match subs {
                    4 => (sub(1), sub(2), sub(3)),
                    5 => (sub(2), sub(3), sub(4)),
                    _ => return ColorSpec::Invalid,
                };
                if r > 255 || g > 255 || b > 255 {
                    return ColorSpec::Invalid;
                }
                ColorSpec::Color(Color::rgb(r as u8, g as u8, b as u8))
            }
            // ":3:F:C:M:Y" and ":4:F:C:M:Y:K"
            3 | 4 => ColorSpec::Unsupported,
            5 => {
                let index = sub(1);
                if index > 255 {
                    return ColorSpec::Invalid;
                }
                ColorSpec::Color(Color::Indexed(index as u8))
            }
            _ => ColorSpec::Invalid,
        };
    }

    // compatibility form: "38;5;N" / "38;2;R;G;B"
    match seq.params.get(*i + 1) {
        Some(5) => {
            let index = seq.param(*i + 2);
            *i += 2;
            if index > 255 {
                return ColorSpec::Invalid;
            }
            ColorSpec::Color(Color::Indexed(index as u8))
        }
        Some(2) => {
            if *i + 4 >= seq.parameter_count() {
                *i = seq.parameter_count();
                return ColorSpec::Invalid;
            }
            let (r, g, b) = (seq.param(*i + 2), seq.param(*i + 3), seq.param(*i + 4));
            *i += 4;
            if r > 255 || g > 255 || b > 255 {
                return ColorSpec::Invalid;
            }
            ColorSpec::Color(Color::rgb(r as u8, g as u8, b as u8))
        }
        _ => {
            *i += 1;
            ColorSpec::Invalid
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::TerminalConfig;
    use crate::events::VoidListener;
    use crate::parser::Parser;

    fn run(input: &[u8]) -> Screen<VoidListener> {
        let config = TerminalConfig::sized(80, 24);
        let mut screen = Screen::new(config, VoidListener);
        let mut parser = Parser::new();
        let mut sequencer = Sequencer::new();
        parser.parse(input, |action| {
            sequencer.process(action, &mut screen);
        });
        screen
    }

    #[test]
    fn test_print_through_pipeline() {
        let screen = run(b"hello");
        assert_eq!(screen.grid().line(0).unwrap().text(), "hello");
    }

    #[test]
    fn test_cup_moves_then_prints() {
        let screen = run(b"\x1b[2;3HAB");
        assert_eq!(screen.grid().cell(1, 2).unwrap().display_char(), 'A');
        assert_eq!(screen.grid().cell(1, 3).unwrap().display_char(), 'B');
        assert_eq!((screen.cursor().line, screen.cursor().col), (1, 4));
    }

    #[test]
    fn test_sgr_rgb_both_forms() {
        let screen = run(b"\x1b[38;2;10;20;30mX");
        assert_eq!(
            screen.grid().cell(0, 0).unwrap().attrs.fg,
            Color::rgb(10, 20, 30)
        );

        let screen = run(b"\x1b[38:2::10:20:30mX");
        assert_eq!(
            screen.grid().cell(0, 0).unwrap().attrs.fg,
            Color::rgb(10, 20, 30)
        );
    }

    #[test]
    fn test_sgr_underline_styles() {
        let screen = run(b"\x1b[4:3mX");
        assert_eq!(
            screen.grid().cell(0, 0).unwrap().attrs.underline,
            UnderlineStyle::Curly
        );
    }

    #[test]
    fn test_sgr_invalid_group_does_not_poison_rest() {
        // out-of-range blue component, then bold: bold still applies
        let screen = run(b"\x1b[38;2;1;2;999;1mX");
        let attrs = screen.grid().cell(0, 0).unwrap().attrs;
        assert_eq!(attrs.fg, Color::Default);
        assert!(attrs.bold);
    }

    #[test]
    fn test_vt_ff_are_index() {
        let screen = run(b"A\x0bB\x0cC");
        assert_eq!(screen.grid().line(0).unwrap().text(), "A");
        assert_eq!(screen.grid().line(1).unwrap().text(), " B");
        assert_eq!(screen.grid().line(2).unwrap().text(), "  C");
    }

    #[test]
    fn test_charset_designation_pipeline() {
        let screen = run(b"\x1b(0qx\x1b(Bq");
        assert_eq!(screen.grid().cell(0, 0).unwrap().display_char(), '─');
        assert_eq!(screen.grid().cell(0, 1).unwrap().display_char(), '│');
        assert_eq!(screen.grid().cell(0, 2).unwrap().display_char(), 'q');
    }

    #[test]
    fn test_osc_title() {
        let screen = run(b"\x1b]2;hello title\x07");
        assert_eq!(screen.title(), "hello title");
    }

    #[test]
    fn test_osc_hyperlink_with_id() {
        let screen = run(b"\x1b]8;id=x;https://example.com\x1b\\ab\x1b]8;;\x1b\\");
        let id = screen.grid().cell(0, 0).unwrap().hyperlink_id;
        assert_ne!(id, 0);
        assert_eq!(screen.hyperlink_uri(id).unwrap(), "https://example.com");
    }

    #[test]
    fn test_alt_screen_round_trip_via_sequences() {
        let screen = run(b"hello\x1b[?1049h\x1b[2JXYZ\x1b[?1049l");
        assert_eq!(screen.grid().line(0).unwrap().text(), "hello");
        assert_eq!(screen.cursor().col, 5);
    }

    #[test]
    fn test_param_clamp_scenario() {
        let screen = run(b"\x1b[999;999H*");
        assert_eq!(screen.grid().cell(23, 79).unwrap().display_char(), '*');
    }

    #[test]
    fn test_sixel_pipeline() {
        let screen = run(b"\x1bP0;1;0q\"1;1;4;2#0;2;100;0;0#0!4~-\x1b\\");
        assert_eq!(screen.images().len(), 1);
        let frag = screen.grid().cell(0, 0).unwrap().image.unwrap();
        let image = screen.images().get(frag.image_id).unwrap();
        assert_eq!((image.size.width, image.size.height), (4, 2));
        assert_eq!(image.pixel(0, 0), [255, 0, 0, 255]);
        assert_eq!(image.pixel(3, 1), [255, 0, 0, 255]);
    }

    #[test]
    fn test_mode_set_reset_round_trip() {
        for n in [1u16, 6, 7, 25, 1004, 2004, 2026] {
            let mode = DecMode::from_number(n).unwrap();
            let before_screen = run(b"");
            let before = before_screen.modes().get(mode);

            let input = format!("\x1b[?{n}h\x1b[?{n}l");
            let screen = run(input.as_bytes());
            assert!(!screen.modes().get(mode), "DECRST {n} must reset");

            let input = format!("\x1b[?{n}l\x1b[?{n}h");
            let screen = run(input.as_bytes());
            assert!(screen.modes().get(mode), "DECSET {n} must set");
            let _ = before;
        }
    }

    #[test]
    fn test_decfra_fills() {
        // fill 3x3 block of 'Z' (90)
        let screen = run(b"\x1b[90;2;2;4;4$x");
        assert_eq!(screen.grid().cell(1, 1).unwrap().display_char(), 'Z');
        assert_eq!(screen.grid().cell(3, 3).unwrap().display_char(), 'Z');
        assert_eq!(screen.grid().cell(0, 0).unwrap().display_char(), ' ');
    }

    #[test]
    fn test_unknown_sequence_is_noop() {
        let mut screen = {
            let config = TerminalConfig::sized(80, 24);
            Screen::new(config, VoidListener)
        };
        let mut parser = Parser::new();
        let mut sequencer = Sequencer::new();
        let mut results = Vec::new();
        parser.parse(b"\x1b[>99Z", |action| {
            results.push(sequencer.process(action, &mut screen));
        });
        assert_eq!(results, vec![ApplyResult::Unsupported]);
        assert_eq!((screen.cursor().line, screen.cursor().col), (0, 0));
    }

    #[test]
    fn test_split_osc() {
        assert_eq!(split_osc(b"0;title"), (0, "title".to_string()));
        assert_eq!(split_osc(b"8;;uri"), (8, ";uri".to_string()));
        assert_eq!(split_osc(b"104"), (104, String::new()));
    }

    #[test]
    fn test_rep_via_pipeline() {
        let screen = run(b"ab\x1b[3b");
        assert_eq!(screen.grid().line(0).unwrap().text(), "abbbb");
    }

    #[test]
    fn test_decaln() {
        let screen = run(b"\x1b#8");
        assert_eq!(screen.grid().cell(0, 0).unwrap().display_char(), 'E');
        assert_eq!(screen.grid().cell(23, 79).unwrap().display_char(), 'E');
    }
}
