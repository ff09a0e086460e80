//! # Text Box Renderer
//!
//! Two phases. [`measure`] wraps every paragraph against the interior width
//! and fixes the box height. [`draw`] then emits the border rectangle first
//! and the lines on top of it, using only what `measure` computed.

use super::{LayoutElement, Stroke};
use crate::config::ReportConfig;
use crate::font::StandardFont;
use crate::model::TextBoxBlock;
use crate::text;

/// The measured form of a text box. `draw` needs nothing else.
#[derive(Debug, Clone, PartialEq)]
pub struct MeasuredTextBox {
    /// Every wrapped line, paragraphs in order.
    pub lines: Vec<String>,
    pub line_height: f64,
    pub box_height: f64,
}

pub fn measure(block: &TextBoxBlock, width: f64, config: &ReportConfig) -> MeasuredTextBox {
    let style = &config.text_box;
    let interior = (width - 2.0 * style.padding).max(0.0);
    let lines: Vec<String> = block
        .lines
        .iter()
        .flat_map(|paragraph| text::wrap(paragraph, interior, style.font_size))
        .collect();
    let line_height = style.font_size * config.typography.line_height;
    let box_height = lines.len() as f64 * line_height + 2.0 * style.padding;
    MeasuredTextBox {
        lines,
        line_height,
        box_height,
    }
}

pub fn draw(
    measured: &MeasuredTextBox,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let style = &config.text_box;
    let mut elements = Vec::with_capacity(measured.lines.len() + 1);
    elements.push(LayoutElement::rect(
        x,
        y,
        width,
        measured.box_height,
        None,
        Some(Stroke {
            color: style.border_color,
            width: style.border_width,
        }),
    ));

    let mut line_y = y + style.padding;
    for line in &measured.lines {
        if !line.is_empty() {
            elements.push(LayoutElement::text(
                x + style.padding,
                line_y,
                measured.line_height,
                line.clone(),
                StandardFont::Helvetica,
                style.font_size,
                config.typography.text_color,
            ));
        }
        line_y += measured.line_height;
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::default_remarks;
    use crate::layout::DrawCommand;
    use proptest::prelude::*;

    #[test]
    fn height_follows_line_count() {
        let config = ReportConfig::default();
        let block = TextBoxBlock {
            lines: vec!["One".to_string(), "Two".to_string()],
        };
        let m = measure(&block, 480.0, &config);
        assert_eq!(m.lines, vec!["One", "Two"]);
        let expected = 2.0 * 8.5 * 1.4 + 20.0;
        assert!((m.box_height - expected).abs() < 1e-9);
    }

    #[test]
    fn remarks_wrap_within_interior() {
        let config = ReportConfig::default();
        let block = TextBoxBlock {
            lines: default_remarks(),
        };
        let m = measure(&block, 480.0, &config);
        assert!(m.lines.len() > block.lines.len());
        for line in &m.lines {
            let w = StandardFont::Helvetica.measure(line, config.text_box.font_size);
            assert!(w <= 460.0 + 1e-6, "line too wide: {}", line);
        }
    }

    #[test]
    fn border_is_drawn_before_text() {
        let config = ReportConfig::default();
        let block = TextBoxBlock {
            lines: vec!["Inspected on site.".to_string()],
        };
        let m = measure(&block, 480.0, &config);
        let elements = draw(&m, 0.0, 0.0, 480.0, &config);
        assert!(matches!(elements[0].draw, DrawCommand::Rect { .. }));
        assert!(matches!(elements[1].draw, DrawCommand::Text { .. }));
    }

    proptest! {
        #[test]
        fn drawn_height_matches_measured(
            paragraphs in proptest::collection::vec("[a-zA-Z ,.]{0,300}", 0..8),
            width in 120.0f64..520.0,
        ) {
            let config = ReportConfig::default();
            let block = TextBoxBlock { lines: paragraphs };
            let m = measure(&block, width, &config);
            let elements = draw(&m, 0.0, 0.0, width, &config);
            prop_assert_eq!(elements[0].height, m.box_height);
            // Every line sits inside the border.
            for el in &elements[1..] {
                prop_assert!(el.y + el.height <= m.box_height - config.text_box.padding + 1e-9);
            }
        }
    }
}
