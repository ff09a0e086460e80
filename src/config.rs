//! Engine configuration: page geometry, typography, block styles and the
//! fixed report text.
//!
//! Every field has a default, so a config file only needs the values it
//! overrides.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;
use crate::model::{Color, Edges, PageSize};

/// 20 mm in points.
const MARGIN_20MM: f64 = 56.69;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ReportConfig {
    pub page: PageConfig,
    /// Vertical gap left after every placed block.
    pub block_spacing: f64,
    pub typography: Typography,
    pub table: TableStyle,
    pub text_box: TextBoxStyle,
    pub image: ImageBoxStyle,
    /// Running header drawn at the top of every page when set.
    pub page_header: Option<String>,
    pub footer: FooterConfig,
    /// Fixed legal / methodology paragraphs for the remarks box.
    pub remarks: Vec<String>,
    /// Timeout for a single map snapshot request.
    pub fetch_timeout_secs: u64,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            page: PageConfig::default(),
            block_spacing: 12.0,
            typography: Typography::default(),
            table: TableStyle::default(),
            text_box: TextBoxStyle::default(),
            image: ImageBoxStyle::default(),
            page_header: Some("PROPERTY VALUATION REPORT".to_string()),
            footer: FooterConfig::default(),
            remarks: default_remarks(),
            fetch_timeout_secs: 15,
        }
    }
}

impl ReportConfig {
    /// Load a config from a JSON file.
    pub fn from_json_file(path: &Path) -> Result<Self, FolioError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn from_json(text: &str) -> Result<Self, FolioError> {
        let config: Self =
            serde_json::from_str(text).map_err(|e| FolioError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reject geometry that leaves no room to lay anything out.
    pub fn validate(&self) -> Result<(), FolioError> {
        let (page_w, page_h) = self.page.size.dimensions();
        let margin = &self.page.margin;
        let content_w = page_w - margin.horizontal();
        let content_h = page_h - margin.vertical() - self.page_header_height();
        if content_w <= 0.0 || content_h <= 0.0 {
            return Err(FolioError::Config(format!(
                "margins leave no content area on a {:.0}x{:.0}pt page",
                page_w, page_h
            )));
        }
        if !positive(self.table.row_height) || !positive(self.table.header_height) {
            return Err(FolioError::Config(
                "table row and header heights must be positive".to_string(),
            ));
        }
        if !(0.0..1.0).contains(&self.table.label_fraction) {
            return Err(FolioError::Config(format!(
                "table labelFraction must be in [0, 1), got {}",
                self.table.label_fraction
            )));
        }
        if !self.block_spacing.is_finite() || self.block_spacing < 0.0 {
            return Err(FolioError::Config(format!(
                "blockSpacing must be a non-negative number, got {}",
                self.block_spacing
            )));
        }
        // The contact line's top edge must sit at or below the content bottom.
        let footer_reach = self.footer.offset_from_bottom + self.typography.footer_size;
        if !footer_reach.is_finite() || footer_reach > margin.bottom {
            return Err(FolioError::Config(format!(
                "footer reaches {:.1}pt above the page edge but the bottom margin is {:.1}pt",
                footer_reach, margin.bottom
            )));
        }
        Ok(())
    }

    /// Height reserved at the top of every page for the running header.
    pub fn page_header_height(&self) -> f64 {
        match self.page_header {
            Some(_) => self.typography.header_size * self.typography.line_height + 6.0,
            None => 0.0,
        }
    }
}

fn positive(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// Page size and margins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub size: PageSize,
    pub margin: Edges,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            size: PageSize::A4,
            margin: Edges::uniform(MARGIN_20MM),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Typography {
    pub title_size: f64,
    pub section_size: f64,
    pub table_title_size: f64,
    pub body_size: f64,
    pub caption_size: f64,
    pub header_size: f64,
    pub footer_size: f64,
    /// Line height as a multiple of font size.
    pub line_height: f64,
    pub text_color: Color,
    pub accent_color: Color,
}

impl Default for Typography {
    fn default() -> Self {
        Self {
            title_size: 16.0,
            section_size: 12.0,
            table_title_size: 10.5,
            body_size: 9.0,
            caption_size: 9.0,
            header_size: 8.0,
            footer_size: 8.0,
            line_height: 1.4,
            text_color: Color::gray(0.1),
            accent_color: Color::rgb(0.11, 0.25, 0.45),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TableStyle {
    pub row_height: f64,
    pub header_height: f64,
    /// Share of a (label, value) pair's width given to the label column.
    pub label_fraction: f64,
    pub cell_padding: f64,
    pub header_fill: Color,
    pub header_text: Color,
    /// Fill for every second body row; `None` lists rows plainly.
    pub stripe_fill: Option<Color>,
    pub border_color: Color,
    pub border_width: f64,
}

impl Default for TableStyle {
    fn default() -> Self {
        Self {
            row_height: 18.0,
            header_height: 20.0,
            label_fraction: 0.42,
            cell_padding: 5.0,
            header_fill: Color::rgb(0.11, 0.25, 0.45),
            header_text: Color::WHITE,
            stripe_fill: Some(Color::rgb(0.95, 0.96, 0.98)),
            border_color: Color::gray(0.75),
            border_width: 0.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TextBoxStyle {
    pub padding: f64,
    pub border_width: f64,
    pub border_color: Color,
    pub font_size: f64,
}

impl Default for TextBoxStyle {
    fn default() -> Self {
        Self {
            padding: 10.0,
            border_width: 0.8,
            border_color: Color::gray(0.35),
            font_size: 8.5,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ImageBoxStyle {
    pub max_width: f64,
    pub max_height: f64,
    /// Height of the box drawn in place of an image that failed to load.
    pub placeholder_height: f64,
    pub placeholder_fill: Color,
}

impl Default for ImageBoxStyle {
    fn default() -> Self {
        Self {
            max_width: 460.0,
            max_height: 270.0,
            placeholder_height: 120.0,
            placeholder_fill: Color::gray(0.9),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FooterConfig {
    pub contact_line: String,
    /// Distance from the page bottom edge to the contact line baseline.
    pub offset_from_bottom: f64,
    /// Distance from the contact line baseline to the page label baseline.
    pub label_gap: f64,
    pub color: Color,
}

impl Default for FooterConfig {
    fn default() -> Self {
        Self {
            contact_line:
                "Registered Valuers & Engineers | valuations@example.in | +91 22 4000 1234"
                    .to_string(),
            offset_from_bottom: 34.0,
            label_gap: 11.0,
            color: Color::gray(0.4),
        }
    }
}

/// The standard disclaimer printed in the remarks box.
pub fn default_remarks() -> Vec<String> {
    [
        "This report has been prepared on the basis of a physical inspection of the property and the documents made available to the valuer. Title has not been investigated and is assumed to be good and marketable.",
        "The fair market value stated is the estimated amount for which the property should exchange on the date of valuation between a willing buyer and a willing seller in an arm's length transaction, after proper marketing.",
        "Realizable value and distress value are indicative figures for lending purposes only and do not represent a guaranteed sale price.",
        "Areas have been taken from approved plans or measured on site where plans were not available. Minor variations in area do not materially affect the valuation.",
        "This report is valid only for the purpose stated and should not be relied upon by any third party without the written consent of the valuer.",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_config_keeps_defaults() {
        let cfg = ReportConfig::from_json(r#"{"blockSpacing": 20, "table": {"rowHeight": 22}}"#)
            .unwrap();
        assert_eq!(cfg.block_spacing, 20.0);
        assert_eq!(cfg.table.row_height, 22.0);
        assert_eq!(cfg.table.header_height, TableStyle::default().header_height);
        assert_eq!(cfg.remarks, default_remarks());
    }

    #[test]
    fn margins_default_to_20mm() {
        let cfg = ReportConfig::default();
        assert!((cfg.page.margin.left - 56.69).abs() < 0.01);
    }

    #[test]
    fn bad_config_is_config_error() {
        let err = ReportConfig::from_json(r#"{"blockSpacing": "wide"}"#).unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn margins_wider_than_page_are_rejected() {
        let err = ReportConfig::from_json(r#"{"page": {"margin": {"top": 500, "right": 20, "bottom": 500, "left": 20}}}"#)
            .unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
        assert!(ReportConfig::default().validate().is_ok());
    }

    #[test]
    fn negative_block_spacing_is_rejected() {
        let err = ReportConfig::from_json(r#"{"blockSpacing": -200}"#).unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
        assert!(ReportConfig::from_json(r#"{"blockSpacing": 0}"#).is_ok());
    }

    #[test]
    fn non_finite_spacing_is_rejected() {
        let cfg = ReportConfig {
            block_spacing: f64::NAN,
            ..Default::default()
        };
        assert!(matches!(cfg.validate(), Err(FolioError::Config(_))));
    }

    #[test]
    fn footer_inside_content_area_is_rejected() {
        let err = ReportConfig::from_json(
            r#"{"page": {"margin": {"top": 56.69, "right": 56.69, "bottom": 10, "left": 56.69}}}"#,
        )
        .unwrap_err();
        assert!(matches!(err, FolioError::Config(_)));
    }

    #[test]
    fn footer_offset_must_fit_bottom_margin() {
        let mut cfg = ReportConfig::default();
        cfg.footer.offset_from_bottom = cfg.page.margin.bottom;
        assert!(cfg.validate().is_err());
        cfg.footer.offset_from_bottom = cfg.page.margin.bottom - cfg.typography.footer_size - 1.0;
        assert!(cfg.validate().is_ok());
    }

    #[test]
    fn nan_row_height_is_rejected() {
        let mut cfg = ReportConfig::default();
        cfg.table.row_height = f64::NAN;
        assert!(cfg.validate().is_err());
    }

    #[test]
    fn header_height_zero_without_header() {
        let cfg = ReportConfig {
            page_header: None,
            ..Default::default()
        };
        assert_eq!(cfg.page_header_height(), 0.0);
    }
}
