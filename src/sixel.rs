//! DECSIXEL sub-parser and image builder
//!
//! Runs inside a DCS hook: the sequencer feeds passthrough bytes one at a
//! time and finalizes on unhook. The grammar is the DEC STD 070 subset:
//! `"` raster attributes, `#` color introducer, `!` repeat introducer,
//! `$` carriage return, `-` newline (six pixel rows), `?`..`~` sixel data.

use crate::core::color::Rgb;
use crate::core::image::ImageSize;

/// VT340 default color registers
/// (https://www.vt100.net/docs/vt3xx-gp/chapter2.html#S2.4).
const VT340_COLORS: [Rgb; 16] = [
    Rgb::new(0, 0, 0),
    Rgb::new(51, 51, 204),
    Rgb::new(204, 33, 33),
    Rgb::new(51, 204, 51),
    Rgb::new(204, 51, 204),
    Rgb::new(51, 204, 204),
    Rgb::new(204, 204, 51),
    Rgb::new(135, 135, 135),
    Rgb::new(66, 66, 66),
    Rgb::new(84, 84, 153),
    Rgb::new(153, 66, 66),
    Rgb::new(84, 153, 84),
    Rgb::new(153, 84, 153),
    Rgb::new(84, 153, 153),
    Rgb::new(153, 153, 84),
    Rgb::new(204, 204, 204),
];

/// Sixel color registers, VT340-seeded, capped in size.
#[derive(Debug, Clone)]
pub struct SixelColorPalette {
    colors: Vec<Rgb>,
    max_size: usize,
}

impl SixelColorPalette {
    pub fn new(max_size: usize) -> Self {
        let mut palette = Self {
            colors: vec![Rgb::default(); VT340_COLORS.len()],
            max_size: max_size.max(VT340_COLORS.len()),
        };
        palette.reset();
        palette
    }

    pub fn reset(&mut self) {
        for (i, slot) in self.colors.iter_mut().enumerate() {
            *slot = VT340_COLORS.get(i).copied().unwrap_or_default();
        }
    }

    pub fn size(&self) -> usize {
        self.colors.len()
    }

    pub fn set(&mut self, register: usize, color: Rgb) {
        if register >= self.max_size {
            return;
        }
        if register >= self.colors.len() {
            self.colors.resize(register + 1, Rgb::default());
        }
        self.colors[register] = color;
    }

    pub fn at(&self, register: usize) -> Rgb {
        self.colors[register % self.colors.len()]
    }
}

/// Accumulates sixel bands into an RGBA buffer.
///
/// The raster grows on demand as bands render, clamped to `max_size`; an
/// explicit `"` raster attribute fixes the reported size up front.
#[derive(Debug, Clone)]
pub struct SixelImageBuilder {
    max_size: ImageSize,
    size: ImageSize,
    buffer: Vec<u8>,
    column: u32,
    /// Top pixel row of the current sixel band.
    row: u32,
    current_register: usize,
    palette: SixelColorPalette,
    background: Option<Rgb>,
    /// Set by an explicit raster attribute; rendering then clamps to the
    /// declared size instead of growing it.
    fixed_raster: bool,
}

impl SixelImageBuilder {
    pub fn new(max_size: ImageSize, background: Option<Rgb>, max_registers: usize) -> Self {
        Self {
            max_size,
            size: ImageSize::new(0, 0),
            buffer: Vec::new(),
            column: 0,
            row: 0,
            current_register: 0,
            palette: SixelColorPalette::new(max_registers),
            background,
            fixed_raster: false,
        }
    }

    pub fn size(&self) -> ImageSize {
        self.size
    }

    /// `"` Pan;Pad;Ph;Pv — aspect ratio is accepted and ignored, the pixel
    /// size pre-allocates the raster (clamped to the configured maximum).
    pub fn set_raster(&mut self, _pan: u32, _pad: u32, width: u32, height: u32) {
        let width = width.min(self.max_size.width);
        let height = height.min(self.max_size.height);
        self.grow_to(width, height);
        self.fixed_raster = true;
    }

    pub fn set_color(&mut self, register: usize, color: Rgb) {
        self.palette.set(register, color);
    }

    pub fn use_color(&mut self, register: usize) {
        self.current_register = register % self.palette.size().max(1);
    }

    /// `$`: back to the left edge of the current band.
    pub fn rewind(&mut self) {
        self.column = 0;
    }

    /// `-`: next band (six pixel rows down), left edge.
    pub fn newline(&mut self) {
        self.column = 0;
        if self.row + 6 < self.max_size.height {
            self.row += 6;
        }
    }

    /// Render one sixel: six vertically stacked pixels, LSB on top.
    pub fn render(&mut self, sixel: u8) {
        let x = self.column;
        if x >= self.max_size.width {
            return;
        }
        let color = self.palette.at(self.current_register);
        if !self.fixed_raster {
            let needed_h = (self.row + 6).min(self.max_size.height);
            self.grow_to(x + 1, needed_h);
        }
        for bit in 0..6u32 {
            if sixel & (1 << bit) != 0 {
                self.put_pixel(x, self.row + bit, color);
            }
        }
        self.column += 1;
    }

    /// The accumulated raster, even when the stream was cut short.
    pub fn finish(self) -> (ImageSize, Vec<u8>) {
        (self.size, self.buffer)
    }

    fn put_pixel(&mut self, x: u32, y: u32, color: Rgb) {
        if x >= self.size.width || y >= self.size.height {
            return;
        }
        let idx = (y as usize * self.size.width as usize + x as usize) * 4;
        if let Some(px) = self.buffer.get_mut(idx..idx + 4) {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = 0xFF;
        }
    }

    fn grow_to(&mut self, width: u32, height: u32) {
        let width = width.min(self.max_size.width).max(self.size.width);
        let height = height.min(self.max_size.height).max(self.size.height);
        if width == self.size.width && height == self.size.height {
            return;
        }
        let mut grown = vec![0u8; width as usize * height as usize * 4];
        if let Some(bg) = self.background {
            for px in grown.chunks_exact_mut(4) {
                px[0] = bg.r;
                px[1] = bg.g;
                px[2] = bg.b;
                px[3] = 0xFF;
            }
        }
        for y in 0..self.size.height as usize {
            let src = y * self.size.width as usize * 4;
            let dst = y * width as usize * 4;
            let len = self.size.width as usize * 4;
            grown[dst..dst + len].copy_from_slice(&self.buffer[src..src + len]);
        }
        self.buffer = grown;
        self.size = ImageSize::new(width, height);
    }
}

/// Sixel grammar states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
enum SixelState {
    #[default]
    Ground,
    ColorIntroducer,
    ColorParam,
    RepeatIntroducer,
    RasterSettings,
}

/// The DECSIXEL sub-state machine. Lives exactly as long as one DCS
/// sequence: constructed on hook, fed passthrough bytes, finalized on
/// unhook.
#[derive(Debug, Clone)]
pub struct SixelParser {
    state: SixelState,
    params: Vec<u32>,
    builder: SixelImageBuilder,
}

impl SixelParser {
    pub fn new(builder: SixelImageBuilder) -> Self {
        Self {
            state: SixelState::Ground,
            params: Vec::new(),
            builder,
        }
    }

    pub fn pass(&mut self, byte: u8) {
        match self.state {
            SixelState::Ground => self.enter_token(byte),

            SixelState::RepeatIntroducer => match byte {
                b'0'..=b'9' => self.push_digit(byte),
                0x3F..=0x7E => {
                    let count = self.params.first().copied().unwrap_or(1);
                    let sixel = byte - 0x3F;
                    for _ in 0..count {
                        self.builder.render(sixel);
                    }
                    self.transition(SixelState::Ground);
                }
                _ => {
                    self.leave();
                    self.enter_token(byte);
                }
            },

            SixelState::ColorIntroducer => match byte {
                b'0'..=b'9' => {
                    self.push_digit(byte);
                    self.state = SixelState::ColorParam;
                }
                _ => {
                    self.leave();
                    self.enter_token(byte);
                }
            },

            SixelState::ColorParam => match byte {
                b'0'..=b'9' => self.push_digit(byte),
                b';' => self.params.push(0),
                _ => {
                    self.leave();
                    self.enter_token(byte);
                }
            },

            SixelState::RasterSettings => match byte {
                b'0'..=b'9' => self.push_digit(byte),
                b';' => self.params.push(0),
                _ => {
                    self.leave();
                    self.enter_token(byte);
                }
            },
        }
    }

    /// Commit the image, returning its raster. A truncated stream still
    /// yields whatever rendered so far.
    pub fn finalize(mut self) -> (ImageSize, Vec<u8>) {
        self.leave();
        self.builder.finish()
    }

    fn enter_token(&mut self, byte: u8) {
        match byte {
            b'#' => self.transition(SixelState::ColorIntroducer),
            b'!' => self.transition(SixelState::RepeatIntroducer),
            b'"' => self.transition(SixelState::RasterSettings),
            b'$' => self.builder.rewind(),
            b'-' => self.builder.newline(),
            0x3F..=0x7E => self.builder.render(byte - 0x3F),
            // anything else is ignored
            _ => {}
        }
    }

    fn transition(&mut self, next: SixelState) {
        self.state = next;
        self.params.clear();
        if next != SixelState::Ground {
            self.params.push(0);
        }
    }

    /// Apply the action of the state being left.
    fn leave(&mut self) {
        match self.state {
            SixelState::ColorParam => match self.params.len() {
                1 => {
                    let register = self.params[0] as usize;
                    self.builder.use_color(register);
                }
                5 => {
                    let register = self.params[0] as usize;
                    let colorspace = self.params[1];
                    // colorspace 1 (HLS) is parsed but unsupported: the
                    // register is left unchanged
                    if colorspace == 2 {
                        let scale = |v: u32| ((v.min(100) * 255) / 100) as u8;
                        let color = Rgb::new(
                            scale(self.params[2]),
                            scale(self.params[3]),
                            scale(self.params[4]),
                        );
                        self.builder.set_color(register, color);
                        self.builder.use_color(register);
                    }
                }
                _ => {}
            },
            SixelState::RasterSettings => {
                if self.params.len() == 4 {
                    let (pan, pad) = (self.params[0], self.params[1]);
                    let (w, h) = (self.params[2], self.params[3]);
                    self.builder.set_raster(pan, pad, w, h);
                }
            }
            SixelState::Ground | SixelState::ColorIntroducer | SixelState::RepeatIntroducer => {}
        }
        self.state = SixelState::Ground;
    }

    fn push_digit(&mut self, byte: u8) {
        if let Some(last) = self.params.last_mut() {
            *last = last
                .saturating_mul(10)
                .saturating_add(u32::from(byte - b'0'));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parser() -> SixelParser {
        let builder =
            SixelImageBuilder::new(ImageSize::new(4096, 4096), None, 256);
        SixelParser::new(builder)
    }

    fn feed(parser: &mut SixelParser, data: &[u8]) {
        for &b in data {
            parser.pass(b);
        }
    }

    #[test]
    fn test_default_palette_is_vt340() {
        let palette = SixelColorPalette::new(256);
        assert_eq!(palette.at(0), Rgb::new(0, 0, 0));
        assert_eq!(palette.at(1), Rgb::new(51, 51, 204));
        assert_eq!(palette.at(2), Rgb::new(204, 33, 33));
    }

    #[test]
    fn test_raster_sets_size() {
        let mut p = parser();
        feed(&mut p, b"\"1;1;4;2");
        // raster applies when its state is left
        p.pass(b'?');
        let (size, rgba) = p.finalize();
        assert_eq!(size, ImageSize::new(4, 2));
        assert_eq!(rgba.len(), 4 * 2 * 4);
    }

    #[test]
    fn test_spec_red_image() {
        // color 0 := RGB(100,0,0), then 4 full sixels on a 4x2 raster
        let mut p = parser();
        feed(&mut p, b"\"1;1;4;2#0;2;100;0;0#0!4~-");
        let (size, rgba) = p.finalize();
        assert_eq!(size, ImageSize::new(4, 2));
        for px in rgba.chunks_exact(4) {
            assert_eq!(px, [255, 0, 0, 255]);
        }
    }

    #[test]
    fn test_sixel_bit_order_is_lsb_top(){
        // sixel '@' = value 1: only the top pixel of the band
        let mut p = parser();
        feed(&mut p, b"#1@");
        let (size, rgba) = p.finalize();
        assert_eq!(size.width, 1);
        assert_eq!(rgba[3], 0xFF);
        // second pixel row transparent
        assert_eq!(rgba[(size.width as usize * 4) + 3], 0);
    }

    #[test]
    fn test_repeat_expands() {
        let mut p = parser();
        feed(&mut p, b"#1!5~");
        let (size, _) = p.finalize();
        assert_eq!(size.width, 5);
        assert_eq!(size.height, 6);
    }

    #[test]
    fn test_newline_advances_six_rows() {
        let mut p = parser();
        feed(&mut p, b"~-~");
        let (size, _) = p.finalize();
        assert_eq!(size.height, 12);
    }

    #[test]
    fn test_rewind_overwrites_in_band() {
        let mut p = parser();
        feed(&mut p, b"#1~~$#2~");
        let (size, rgba) = p.finalize();
        assert_eq!(size.width, 2);
        // first column overwritten with register 2 (red-ish on VT340)
        assert_eq!([rgba[0], rgba[1], rgba[2]], [204, 33, 33]);
    }

    #[test]
    fn test_hls_color_is_ignored() {
        let mut p = parser();
        // register 1 via HLS: parsed, register keeps its VT340 value
        feed(&mut p, b"#1;1;120;50;100#1~");
        let (_, rgba) = p.finalize();
        assert_eq!([rgba[0], rgba[1], rgba[2]], [51, 51, 204]);
    }

    #[test]
    fn test_truncated_stream_commits_partial() {
        let mut p = parser();
        feed(&mut p, b"\"1;1;10;10#0;2;0;100;0!3");
        // stream cut inside the repeat introducer
        let (size, _) = p.finalize();
        assert_eq!(size, ImageSize::new(10, 10));
    }

    #[test]
    fn test_oversized_raster_clamped() {
        let builder = SixelImageBuilder::new(ImageSize::new(8, 8), None, 256);
        let mut p = SixelParser::new(builder);
        feed(&mut p, b"\"1;1;100;100?");
        let (size, _) = p.finalize();
        assert_eq!(size, ImageSize::new(8, 8));
    }
}
