//! Terminal front object
//!
//! Owns the parser, sequencer and screen and drives bytes through them.
//! Single-threaded by design: one writer thread feeds `write`, and every
//! parser event runs to completion before `write` returns, so a renderer
//! sharing the terminal behind a mutex always observes sequence-boundary
//! state. Replies reach the host through the listener, in order, with no
//! I/O performed here.

use crate::config::TerminalConfig;
use crate::core::screen::Screen;
use crate::core::snapshot::Snapshot;
use crate::events::EventListener;
use crate::parser::Parser;
use crate::sequencer::Sequencer;

/// A complete virtual terminal.
pub struct Terminal<L: EventListener> {
    parser: Parser,
    sequencer: Sequencer,
    screen: Screen<L>,
}

impl<L: EventListener> Terminal<L> {
    pub fn new(config: TerminalConfig, listener: L) -> Self {
        Self {
            parser: Parser::new(),
            sequencer: Sequencer::new(),
            screen: Screen::new(config, listener),
        }
    }

    /// Feed application output. Chunk boundaries are arbitrary; split
    /// sequences resume on the next call.
    pub fn write(&mut self, data: &[u8]) {
        let Self {
            parser,
            sequencer,
            screen,
        } = self;
        parser.parse(data, |action| {
            sequencer.process(action, screen);
        });
    }

    /// Change the page size. Applied at a sequence boundary; reflow
    /// happens when DEC mode 2027 is set and enabled in the config.
    pub fn resize(&mut self, cols: usize, rows: usize) {
        self.screen.resize(cols, rows);
    }

    pub fn screen(&self) -> &Screen<L> {
        &self.screen
    }

    pub fn screen_mut(&mut self) -> &mut Screen<L> {
        &mut self.screen
    }

    /// Read-only copy of the visible page for the renderer.
    pub fn snapshot(&self) -> Snapshot {
        self.screen.snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::color::Color;
    use crate::events::EventListener;

    /// Listener capturing host-visible effects for assertions.
    #[derive(Debug, Default)]
    struct Recorder {
        replies: Vec<u8>,
        titles: Vec<String>,
        bells: usize,
        clipboard: Vec<Vec<u8>>,
        notifications: Vec<(String, String)>,
    }

    impl EventListener for Recorder {
        fn reply(&mut self, data: &[u8]) {
            self.replies.extend_from_slice(data);
        }
        fn bell(&mut self) {
            self.bells += 1;
        }
        fn set_window_title(&mut self, title: &str) {
            self.titles.push(title.to_string());
        }
        fn copy_to_clipboard(&mut self, data: &[u8]) {
            self.clipboard.push(data.to_vec());
        }
        fn notify(&mut self, title: &str, body: &str) {
            self.notifications.push((title.to_string(), body.to_string()));
        }
    }

    fn terminal() -> Terminal<Recorder> {
        Terminal::new(TerminalConfig::sized(80, 24), Recorder::default())
    }

    fn replies(term: &Terminal<Recorder>) -> String {
        String::from_utf8_lossy(&term.screen().listener().replies).into_owned()
    }

    #[test]
    fn test_write_and_snapshot() {
        let mut term = terminal();
        term.write(b"Hello, \x1b[31mWorld\x1b[0m!");
        assert!(term.snapshot().to_text().contains("Hello, World!"));
        assert_eq!(
            term.screen().grid().cell(0, 7).unwrap().attrs.fg,
            Color::Indexed(1)
        );
    }

    #[test]
    fn test_chunked_writes() {
        let mut term = terminal();
        term.write(b"\x1b[2;");
        term.write(b"3H");
        term.write(b"A");
        assert_eq!(term.screen().grid().cell(1, 2).unwrap().display_char(), 'A');
    }

    #[test]
    fn test_bell_and_title() {
        let mut term = terminal();
        term.write(b"\x07\x1b]0;my title\x07");
        assert_eq!(term.screen().listener().bells, 1);
        assert_eq!(term.screen().listener().titles, vec!["my title"]);
    }

    #[test]
    fn test_cpr_reply() {
        let mut term = terminal();
        term.write(b"\x1b[5;10H\x1b[6n");
        assert_eq!(replies(&term), "\x1b[5;10R");
    }

    #[test]
    fn test_decrqm_reply_origin_mode() {
        let mut term = terminal();
        term.write(b"\x1b[?6h\x1b[?6$p");
        assert_eq!(replies(&term), "\x1b[?6;1$y");
    }

    #[test]
    fn test_da_replies() {
        let mut term = terminal();
        term.write(b"\x1b[c\x1b[>c\x1b[=c");
        let all = replies(&term);
        assert!(all.starts_with("\x1b[?62;4;6;22c"));
        assert!(all.contains("\x1b[>61;100;0c"));
        assert!(all.ends_with("\x1bP!|C0000000\x1b\\"));
    }

    #[test]
    fn test_decrqss_margins() {
        let mut term = terminal();
        term.write(b"\x1b[3;10r\x1bP$qr\x1b\\");
        assert_eq!(replies(&term), "\x1bP1$r3;10r\x1b\\");
    }

    #[test]
    fn test_decrqss_unknown_is_invalid_reply() {
        let mut term = terminal();
        term.write(b"\x1bPzz\x1b\\");
        // "zz" is not DECRQSS (no $ intermediate): no hook, no reply
        assert_eq!(replies(&term), "");

        term.write(b"\x1bP$qzz\x1b\\");
        assert_eq!(replies(&term), "\x1bP0$r\x1b\\");
    }

    #[test]
    fn test_xtgettcap_reply() {
        let mut term = terminal();
        // "TN" hex-encoded is 544E
        term.write(b"\x1bP+q544E\x1b\\");
        let reply = replies(&term);
        assert!(reply.starts_with("\x1bP1+r544E="));
        assert!(reply.ends_with("\x1b\\"));
    }

    #[test]
    fn test_osc_color_query() {
        let mut term = terminal();
        term.write(b"\x1b]4;1;?\x07");
        assert_eq!(replies(&term), "\x1b]4;1;rgb:cdcd/0000/0000\x1b\\");
    }

    #[test]
    fn test_osc_clipboard() {
        let mut term = terminal();
        term.write(b"\x1b]52;c;aGVsbG8=\x07");
        assert_eq!(term.screen().listener().clipboard, vec![b"hello".to_vec()]);
    }

    #[test]
    fn test_osc_notify() {
        let mut term = terminal();
        term.write(b"\x1b]777;notify;Title;Body text\x07");
        assert_eq!(
            term.screen().listener().notifications,
            vec![("Title".to_string(), "Body text".to_string())]
        );
    }

    #[test]
    fn test_resize_truncates_without_reflow_mode() {
        let mut term = terminal();
        term.write(b"abcdefghij");
        term.write(b"\x1b[?2027l");
        term.resize(5, 24);
        assert_eq!(term.screen().grid().line(0).unwrap().text(), "abcde");
    }

    #[test]
    fn test_resize_reflows_with_mode_2027() {
        let mut term = terminal();
        term.write(b"\x1b[?2027h");
        term.write(b"abcdefghij");
        term.resize(6, 24);
        assert_eq!(term.screen().grid().line(0).unwrap().text(), "abcdef");
        assert_eq!(term.screen().grid().line(1).unwrap().text(), "ghij");
    }

    #[test]
    fn test_screenshot_round_trip() {
        let mut term = terminal();
        term.write(b"\x1b[2;3H\x1b[1;31mhi\x1b[0m there\x1b[5;5H\x1b[44mblue bg");
        let shot = term.snapshot();

        let mut fresh = terminal();
        fresh.write(&shot.to_vt());
        assert!(shot.visual_eq(&fresh.snapshot()));
    }

    #[test]
    fn test_ris_wipes_history_dependence() {
        let mut term = terminal();
        term.write(b"lots of junk\x1b[?1049h\x1b[5;5Hmore\x1bc");
        let after_reset = term.snapshot();

        let fresh = terminal();
        assert!(after_reset.visual_eq(&fresh.snapshot()));
    }
}
