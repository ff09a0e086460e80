//! # Footer Stamping
//!
//! A second pass over the finished page set, run once the total page count
//! is known. Each page gets the contact line centred near the bottom edge and
//! "Page i of N" directly under it.
//!
//! The stamper only ever writes [`LayoutPage::footer`], which lives below the
//! content area. Re-stamping replaces the footer, so stamping twice gives the
//! same pages as stamping once.

use crate::config::ReportConfig;
use crate::font::StandardFont;
use crate::layout::{DrawCommand, LayoutElement, LayoutPage};

pub fn stamp_pages(pages: &mut [LayoutPage], config: &ReportConfig) {
    let total = pages.len();
    for (i, page) in pages.iter_mut().enumerate() {
        page.footer = footer_for(page, i + 1, total, config);
    }
}

fn footer_for(
    page: &LayoutPage,
    number: usize,
    total: usize,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let footer = &config.footer;
    let size = config.typography.footer_size;
    let left = config.page.margin.left;
    let span = page.width - config.page.margin.horizontal();

    let contact_baseline = page.height - footer.offset_from_bottom;
    let label_baseline = contact_baseline + footer.label_gap;

    let mut elements = Vec::with_capacity(2);
    if !footer.contact_line.is_empty() {
        let text = StandardFont::Helvetica.truncate_to_width(&footer.contact_line, span, size);
        elements.push(line_at(left, span, contact_baseline, text, size, config));
    }
    elements.push(line_at(
        left,
        span,
        label_baseline,
        format!("Page {} of {}", number, total),
        size,
        config,
    ));
    elements
}

/// A centred line whose baseline falls exactly on `baseline`.
fn line_at(
    left: f64,
    span: f64,
    baseline: f64,
    text: String,
    size: f64,
    config: &ReportConfig,
) -> LayoutElement {
    let font = StandardFont::Helvetica;
    let width = font.measure(&text, size);
    LayoutElement {
        x: left + (span - width) / 2.0,
        y: baseline - size,
        width,
        height: size,
        draw: DrawCommand::Text {
            text,
            font,
            size,
            color: config.footer.color,
            baseline,
        },
        children: Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::ImageSet;
    use crate::layout::Paginator;

    fn pages(count: usize, config: &ReportConfig) -> Vec<LayoutPage> {
        let images = ImageSet::new();
        let mut paginator = Paginator::new(config, &images);
        for _ in 1..count {
            paginator.force_page_break();
        }
        paginator.finish()
    }

    fn footer_texts(page: &LayoutPage) -> Vec<String> {
        page.footer
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn labels_carry_total_count() {
        let config = ReportConfig::default();
        let mut pages = pages(3, &config);
        stamp_pages(&mut pages, &config);
        assert_eq!(footer_texts(&pages[0])[1], "Page 1 of 3");
        assert_eq!(footer_texts(&pages[2])[1], "Page 3 of 3");
        assert_eq!(footer_texts(&pages[1])[0], config.footer.contact_line);
    }

    #[test]
    fn stamping_is_idempotent() {
        let config = ReportConfig::default();
        let mut once = pages(2, &config);
        stamp_pages(&mut once, &config);
        let mut twice = once.clone();
        stamp_pages(&mut twice, &config);
        for (a, b) in once.iter().zip(&twice) {
            assert_eq!(footer_texts(a), footer_texts(b));
            assert_eq!(a.footer.len(), b.footer.len());
        }
    }

    #[test]
    fn footer_stays_below_content_and_leaves_it_untouched() {
        let config = ReportConfig::default();
        let mut pages = pages(2, &config);
        let before: Vec<usize> = pages.iter().map(|p| p.elements.len()).collect();
        stamp_pages(&mut pages, &config);
        for (page, n) in pages.iter().zip(before) {
            assert_eq!(page.elements.len(), n);
            for el in &page.footer {
                assert!(el.y >= page.content_bottom);
                assert!(el.y + el.height <= page.height);
            }
        }
    }

    #[test]
    fn label_sits_below_contact_line() {
        let config = ReportConfig::default();
        let mut pages = pages(1, &config);
        stamp_pages(&mut pages, &config);
        let baselines: Vec<f64> = pages[0]
            .footer
            .iter()
            .filter_map(|el| match el.draw {
                DrawCommand::Text { baseline, .. } => Some(baseline),
                _ => None,
            })
            .collect();
        assert!((baselines[0] - (841.89 - 34.0)).abs() < 1e-9);
        assert!((baselines[1] - baselines[0] - 11.0).abs() < 1e-9);
    }
}
