//! Advance widths for the standard PDF fonts used by the report.
//!
//! Widths are AFM values in 1/1000 em for the printable ASCII range
//! (0x20..=0x7E). Characters outside that range fall back to the width of
//! `o`, which keeps measurement deterministic for accented Latin text.

/// Helvetica, 0x20..=0x7E.
const HELVETICA: [u16; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556, // 0x30
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556, // 0x50
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556, // 0x60
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584, // 0x70
];

/// Helvetica-Bold, 0x20..=0x7E.
const HELVETICA_BOLD: [u16; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278, // 0x20
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611, // 0x30
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778, // 0x40
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556, // 0x50
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611, // 0x60
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584, // 0x70
];

/// Width table for one standard font.
#[derive(Debug, Clone, Copy)]
pub struct StandardFontMetrics {
    widths: &'static [u16; 95],
    fallback: u16,
}

impl StandardFontMetrics {
    pub const HELVETICA: StandardFontMetrics = StandardFontMetrics {
        widths: &HELVETICA,
        fallback: 556,
    };

    pub const HELVETICA_BOLD: StandardFontMetrics = StandardFontMetrics {
        widths: &HELVETICA_BOLD,
        fallback: 611,
    };

    /// Advance width of `ch` in points at `font_size`.
    pub fn char_width(&self, ch: char, font_size: f64) -> f64 {
        let cp = ch as u32;
        let units = if (0x20..=0x7E).contains(&cp) {
            self.widths[(cp - 0x20) as usize]
        } else if ch.is_whitespace() {
            self.widths[0]
        } else {
            self.fallback
        };
        units as f64 * font_size / 1000.0
    }

    pub fn measure_string(&self, text: &str, font_size: f64) -> f64 {
        text.chars().map(|ch| self.char_width(ch, font_size)).sum()
    }
}
