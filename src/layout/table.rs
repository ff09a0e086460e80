//! # Key/Value Table Renderer
//!
//! Fixed-height rows, no intra-row wrapping. A value wider than its cell is
//! truncated with an ellipsis so the row height stays predictable.

use super::{LayoutElement, Stroke};
use crate::config::ReportConfig;
use crate::font::StandardFont;
use crate::model::{TableBlock, TableColumns};

/// Height of the title line above the first segment, zero without a title.
pub fn title_height(table: &TableBlock, config: &ReportConfig) -> f64 {
    if table.title.is_empty() {
        0.0
    } else {
        config.typography.table_title_size * config.typography.line_height + 4.0
    }
}

/// Total unsplit height: title, header band and every row.
pub fn measure(table: &TableBlock, config: &ReportConfig) -> f64 {
    let rows = table.visual_rows().len() as f64;
    title_height(table, config) + config.table.header_height + rows * config.table.row_height
}

/// Column widths for a table `width` wide.
///
/// Each (label, value) pair splits its share by the label fraction.
pub fn column_widths(columns: TableColumns, width: f64, label_fraction: f64) -> Vec<f64> {
    let pair = |w: f64| [w * label_fraction, w * (1.0 - label_fraction)];
    match columns {
        TableColumns::Two => pair(width).to_vec(),
        TableColumns::Four => {
            let half = pair(width / 2.0);
            vec![half[0], half[1], half[0], half[1]]
        }
    }
}

pub fn draw_title(
    table: &TableBlock,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let typo = &config.typography;
    let size = typo.table_title_size;
    let font = StandardFont::HelveticaBold;
    let text = font.truncate_to_width(&table.title, width, size);
    vec![LayoutElement::text(
        x,
        y,
        size * typo.line_height,
        text,
        font,
        size,
        typo.accent_color,
    )]
}

/// The shaded header band. Drawn once per segment.
pub fn draw_header(
    table: &TableBlock,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let style = &config.table;
    let size = config.typography.body_size;
    let mut elements = vec![LayoutElement::rect(
        x,
        y,
        width,
        style.header_height,
        Some(style.header_fill),
        None,
    )];

    let widths = column_widths(table.columns, width, style.label_fraction);
    let mut cell_x = x;
    for (label, w) in table.header_cells().into_iter().zip(widths) {
        let font = StandardFont::HelveticaBold;
        let text = font.truncate_to_width(label, w - 2.0 * style.cell_padding, size);
        elements.push(LayoutElement::text(
            cell_x + style.cell_padding,
            y,
            style.header_height,
            text,
            font,
            size,
            style.header_text,
        ));
        cell_x += w;
    }
    elements
}

/// One visual row. `row_index` counts from the first body row of the table
/// across all segments, so stripes stay aligned after a page break.
pub fn draw_row(
    cells: &[&str],
    row_index: usize,
    x: f64,
    y: f64,
    width: f64,
    config: &ReportConfig,
) -> Vec<LayoutElement> {
    let style = &config.table;
    let typo = &config.typography;
    let size = typo.body_size;
    let height = style.row_height;
    let mut elements = Vec::with_capacity(cells.len() * 2 + 1);

    if row_index % 2 == 1 {
        if let Some(stripe) = style.stripe_fill {
            elements.push(LayoutElement::rect(x, y, width, height, Some(stripe), None));
        }
    }

    let columns = if cells.len() > 2 {
        TableColumns::Four
    } else {
        TableColumns::Two
    };
    let widths = column_widths(columns, width, style.label_fraction);
    let border = Stroke {
        color: style.border_color,
        width: style.border_width,
    };

    let mut cell_x = x;
    for (col, (cell, w)) in cells.iter().zip(widths).enumerate() {
        elements.push(LayoutElement::rect(cell_x, y, w, height, None, Some(border)));
        if !cell.is_empty() {
            // Even columns hold labels.
            let font = if col % 2 == 0 {
                StandardFont::HelveticaBold
            } else {
                StandardFont::Helvetica
            };
            let text = font.truncate_to_width(cell, w - 2.0 * style.cell_padding, size);
            elements.push(LayoutElement::text(
                cell_x + style.cell_padding,
                y,
                height,
                text,
                font,
                size,
                typo.text_color,
            ));
        }
        cell_x += w;
    }
    elements
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::DrawCommand;

    fn table(n: usize) -> TableBlock {
        let rows = (0..n)
            .map(|i| (format!("Label {}", i), format!("Value {}", i)))
            .collect();
        TableBlock::new("Identification", ("Particulars", "Details"), rows)
    }

    #[test]
    fn measure_counts_title_header_and_rows() {
        let config = ReportConfig::default();
        let t = table(5);
        let expected = title_height(&t, &config) + 20.0 + 5.0 * 18.0;
        assert!((measure(&t, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn untitled_table_has_no_title_line() {
        let config = ReportConfig::default();
        let t = TableBlock::new("", ("A", "B"), Vec::new());
        assert_eq!(title_height(&t, &config), 0.0);
        assert_eq!(measure(&t, &config), 20.0);
    }

    #[test]
    fn four_column_measures_by_visual_rows() {
        let config = ReportConfig::default();
        let t = table(5).four_column();
        let expected = title_height(&t, &config) + 20.0 + 3.0 * 18.0;
        assert!((measure(&t, &config) - expected).abs() < 1e-9);
    }

    #[test]
    fn widths_fill_the_table() {
        for columns in [TableColumns::Two, TableColumns::Four] {
            let total: f64 = column_widths(columns, 480.0, 0.42).iter().sum();
            assert!((total - 480.0).abs() < 1e-9);
        }
    }

    #[test]
    fn label_is_bold_value_regular() {
        let config = ReportConfig::default();
        let elements = draw_row(&["Owner", "A. Sharma"], 0, 0.0, 0.0, 480.0, &config);
        let fonts: Vec<StandardFont> = elements
            .iter()
            .filter_map(|el| match &el.draw {
                DrawCommand::Text { font, .. } => Some(*font),
                _ => None,
            })
            .collect();
        assert_eq!(fonts, vec![StandardFont::HelveticaBold, StandardFont::Helvetica]);
    }

    #[test]
    fn odd_rows_are_striped() {
        let config = ReportConfig::default();
        let even = draw_row(&["a", "b"], 0, 0.0, 0.0, 480.0, &config);
        let odd = draw_row(&["a", "b"], 1, 0.0, 0.0, 480.0, &config);
        assert_eq!(odd.len(), even.len() + 1);
    }

    #[test]
    fn long_values_are_truncated_to_cell() {
        let config = ReportConfig::default();
        let long = "Plot 17, Survey No. 221/3B, Opposite Municipal Garden, Ward 14, Kothrud, Pune";
        let elements = draw_row(&["Address", long], 0, 0.0, 0.0, 300.0, &config);
        let value_width = column_widths(TableColumns::Two, 300.0, 0.42)[1];
        let value = elements
            .iter()
            .find(|el| matches!(&el.draw, DrawCommand::Text { font: StandardFont::Helvetica, .. }))
            .unwrap();
        assert!(value.width <= value_width - 2.0 * config.table.cell_padding + 1e-9);
    }

    #[test]
    fn header_band_is_shaded() {
        let config = ReportConfig::default();
        let elements = draw_header(&table(1), 10.0, 20.0, 480.0, &config);
        match &elements[0].draw {
            DrawCommand::Rect { fill, .. } => assert_eq!(*fill, Some(config.table.header_fill)),
            other => panic!("expected header band, got {:?}", other),
        }
        assert_eq!(elements[0].height, 20.0);
    }
}
