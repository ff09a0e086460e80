//! # Font Management
//!
//! The report is set entirely in the standard PDF Helvetica family, which
//! needs no embedding. Measurement uses the AFM width tables in [`metrics`].

pub mod metrics;

pub use metrics::StandardFontMetrics;

/// The standard PDF fonts the report draws with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum StandardFont {
    Helvetica,
    HelveticaBold,
}

impl StandardFont {
    /// Every font the writer registers, in resource order (/F0, /F1).
    pub const ALL: [StandardFont; 2] = [StandardFont::Helvetica, StandardFont::HelveticaBold];

    /// The PDF name for this font.
    pub fn pdf_name(&self) -> &'static str {
        match self {
            Self::Helvetica => "Helvetica",
            Self::HelveticaBold => "Helvetica-Bold",
        }
    }

    /// Index of the font's /F resource name.
    pub fn resource_index(&self) -> usize {
        match self {
            Self::Helvetica => 0,
            Self::HelveticaBold => 1,
        }
    }

    pub fn metrics(&self) -> StandardFontMetrics {
        match self {
            Self::Helvetica => StandardFontMetrics::HELVETICA,
            Self::HelveticaBold => StandardFontMetrics::HELVETICA_BOLD,
        }
    }

    /// Width of `text` in points.
    pub fn measure(&self, text: &str, font_size: f64) -> f64 {
        self.metrics().measure_string(text, font_size)
    }

    /// Shorten `text` with a trailing "..." until it fits `max_width`.
    ///
    /// Text that already fits is returned unchanged. If not even the ellipsis
    /// fits, the ellipsis alone is returned.
    pub fn truncate_to_width(&self, text: &str, max_width: f64, font_size: f64) -> String {
        if self.measure(text, font_size) <= max_width {
            return text.to_string();
        }
        let ellipsis = "...";
        let budget = max_width - self.measure(ellipsis, font_size);
        let mut width = 0.0;
        let mut out = String::new();
        for ch in text.chars() {
            let w = self.metrics().char_width(ch, font_size);
            if width + w > budget {
                break;
            }
            width += w;
            out.push(ch);
        }
        let mut out = out.trim_end().to_string();
        out.push_str(ellipsis);
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bold_is_wider() {
        let regular = StandardFont::Helvetica.measure("Valuation", 10.0);
        let bold = StandardFont::HelveticaBold.measure("Valuation", 10.0);
        assert!(bold > regular);
    }

    #[test]
    fn truncate_keeps_fitting_text() {
        let s = StandardFont::Helvetica.truncate_to_width("Flat 4B", 200.0, 10.0);
        assert_eq!(s, "Flat 4B");
    }

    #[test]
    fn truncate_appends_ellipsis() {
        let long = "Survey No. 112/4, Near Old Water Tank, Behind District Court";
        let s = StandardFont::Helvetica.truncate_to_width(long, 80.0, 10.0);
        assert!(s.ends_with("..."));
        assert!(StandardFont::Helvetica.measure(&s, 10.0) <= 80.0);
    }
}
