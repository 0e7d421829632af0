//! Construction-time terminal configuration
//!
//! All tunables are passed in here and read-only afterwards; the core keeps
//! no process-wide mutable state.

use serde::{Deserialize, Serialize};

use crate::core::color::ColorPalette;
use crate::core::image::ImageSize;

/// Configuration for a terminal instance.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TerminalConfig {
    /// Initial page size.
    pub cols: usize,
    pub rows: usize,
    /// Scrollback cap for the primary screen, in lines.
    pub max_history: usize,
    /// Default tab stop interval.
    pub tab_width: usize,
    /// Cell size in pixels (width, height); used for sixel placement and
    /// the pixel-size window reports.
    pub cell_pixels: (u32, u32),
    /// Upper bound for decoded sixel rasters.
    pub max_image_size: ImageSize,
    /// Master switch for reflow-on-resize (DEC mode 2027 must also be set).
    pub reflow: bool,
    /// Name reported by XTVERSION and XTGETTCAP TN.
    pub term_name: String,
    /// Version reported by XTVERSION.
    pub term_version: String,
    /// Color palette seed.
    pub palette: ColorPalette,
}

impl Default for TerminalConfig {
    fn default() -> Self {
        Self {
            cols: 80,
            rows: 24,
            max_history: 10_000,
            tab_width: 8,
            cell_pixels: (10, 20),
            max_image_size: ImageSize::new(4096, 4096),
            reflow: true,
            term_name: "dango-terminal".to_string(),
            term_version: env!("CARGO_PKG_VERSION").to_string(),
            palette: ColorPalette::default(),
        }
    }
}

impl TerminalConfig {
    /// Convenience constructor for the common case.
    pub fn sized(cols: usize, rows: usize) -> Self {
        Self {
            cols,
            rows,
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_sane() {
        let config = TerminalConfig::default();
        assert_eq!((config.cols, config.rows), (80, 24));
        assert!(config.max_history > 0);
        assert_eq!(config.tab_width, 8);
    }

    #[test]
    fn test_sized() {
        let config = TerminalConfig::sized(132, 50);
        assert_eq!((config.cols, config.rows), (132, 50));
    }
}
