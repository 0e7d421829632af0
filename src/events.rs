//! Host callback surface
//!
//! The core performs no I/O. Everything that must leave the terminal —
//! reply bytes for the application, window title changes, notifications —
//! is delivered synchronously through this trait, in generation order.
//! Hosts queue as they see fit; default implementations make every
//! callback optional.

use serde::{Deserialize, Serialize};

/// Font configuration exchanged via OSC 50/60.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FontDef {
    pub size: f64,
    pub regular: String,
    pub bold: String,
    pub italic: String,
    pub bold_italic: String,
    pub emoji: String,
}

/// Window resize requests issued by `CSI 4/8 t`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum WindowResize {
    /// Pixel dimensions (width, height); (0, 0) means "maximize".
    Pixels(u32, u32),
    /// Cell dimensions (cols, rows).
    Cells(usize, usize),
}

/// Callbacks supplied by the embedding host.
pub trait EventListener {
    /// Bytes to write back to the application (DA/DSR/DECRQSS/... replies).
    /// Must reach the wire unmodified and in call order.
    fn reply(&mut self, _data: &[u8]) {}

    /// BEL.
    fn bell(&mut self) {}

    /// OSC 0/2 title change.
    fn set_window_title(&mut self, _title: &str) {}

    /// OSC 7.
    fn set_working_directory(&mut self, _url: &str) {}

    /// OSC 52 with decoded payload.
    fn copy_to_clipboard(&mut self, _data: &[u8]) {}

    /// OSC 777 `notify`.
    fn notify(&mut self, _title: &str, _body: &str) {}

    /// DCS $ p (soft terminal profile).
    fn set_terminal_profile(&mut self, _name: &str) {}

    /// XTCAPTURE: the host should capture `line_count` lines from the
    /// bottom of the page, joined logically when `logical_lines` is set.
    fn request_capture_buffer(&mut self, _line_count: usize, _logical_lines: bool) {}

    /// CSI 4/8 t.
    fn resize_window(&mut self, _request: WindowResize) {}

    /// OSC 50/60 set forms.
    fn set_font_def(&mut self, _font: &FontDef) {}

    /// OSC 50/60 query forms.
    fn get_font_def(&self) -> FontDef {
        FontDef::default()
    }

    /// OSC 1337 dump request / debugging aid: a human-readable state dump.
    fn inspect(&mut self, _dump: &str) {}
}

/// Listener that drops every event; used by tests and headless screens.
#[derive(Debug, Clone, Copy, Default)]
pub struct VoidListener;

impl EventListener for VoidListener {}

impl<L: EventListener + ?Sized> EventListener for &mut L {
    fn reply(&mut self, data: &[u8]) {
        (**self).reply(data)
    }
    fn bell(&mut self) {
        (**self).bell()
    }
    fn set_window_title(&mut self, title: &str) {
        (**self).set_window_title(title)
    }
    fn set_working_directory(&mut self, url: &str) {
        (**self).set_working_directory(url)
    }
    fn copy_to_clipboard(&mut self, data: &[u8]) {
        (**self).copy_to_clipboard(data)
    }
    fn notify(&mut self, title: &str, body: &str) {
        (**self).notify(title, body)
    }
    fn set_terminal_profile(&mut self, name: &str) {
        (**self).set_terminal_profile(name)
    }
    fn request_capture_buffer(&mut self, line_count: usize, logical_lines: bool) {
        (**self).request_capture_buffer(line_count, logical_lines)
    }
    fn resize_window(&mut self, request: WindowResize) {
        (**self).resize_window(request)
    }
    fn set_font_def(&mut self, font: &FontDef) {
        (**self).set_font_def(font)
    }
    fn get_font_def(&self) -> FontDef {
        (**self).get_font_def()
    }
    fn inspect(&mut self, dump: &str) {
        (**self).inspect(dump)
    }
}
