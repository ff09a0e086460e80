//! # Report Model
//!
//! The input record handed to the engine by the surrounding application, and
//! the block sequence the assembler derives from it.
//!
//! Every record field is optional. Absent values are rendered as the
//! [`PLACEHOLDER`] so that the row structure of every table is the same for
//! sparse and complete records alike.

pub mod format;

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::FolioError;

/// Display value for any field that is absent, null or blank.
pub const PLACEHOLDER: &str = "-";

/// A scalar field value, exactly as the surrounding application sent it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Scalar {
    Bool(bool),
    Number(serde_json::Number),
    Text(String),
}

impl Scalar {
    /// The value as a number, if it is one or is a string that parses as one.
    ///
    /// Digit-group separators and a leading currency marker in strings are
    /// tolerated: `"80,00,000"` and `"Rs. 8000000"` both parse.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Scalar::Number(n) => n.as_f64(),
            Scalar::Text(s) => {
                let cleaned: String = s
                    .trim()
                    .trim_start_matches("Rs.")
                    .trim_start_matches("INR")
                    .chars()
                    .filter(|c| *c != ',' && !c.is_whitespace())
                    .collect();
                if cleaned.is_empty() {
                    None
                } else {
                    cleaned.parse::<f64>().ok().filter(|v| v.is_finite())
                }
            }
            Scalar::Bool(_) => None,
        }
    }

    /// True for blank strings, which display as the placeholder.
    pub fn is_blank(&self) -> bool {
        matches!(self, Scalar::Text(s) if s.trim().is_empty())
    }
}

impl fmt::Display for Scalar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scalar::Bool(true) => write!(f, "Yes"),
            Scalar::Bool(false) => write!(f, "No"),
            Scalar::Number(n) => write!(f, "{}", n),
            Scalar::Text(s) => write!(f, "{}", s.trim()),
        }
    }
}

/// One property valuation, as supplied by the surrounding application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReportRecord {
    // Identification
    pub case_ref_no: Option<Scalar>,
    pub report_date: Option<Scalar>,
    pub inspection_date: Option<Scalar>,
    pub owner_name: Option<Scalar>,
    pub owner_address: Option<Scalar>,
    pub property_address: Option<Scalar>,
    pub landmark: Option<Scalar>,
    pub property_type: Option<Scalar>,
    pub purpose_of_valuation: Option<Scalar>,

    // Valuation figures
    pub final_valuation: Option<Scalar>,
    pub realizable_value: Option<Scalar>,
    pub distress_value: Option<Scalar>,
    pub valuation_in_words: Option<Scalar>,

    // Area and specification
    pub land_area: Option<Scalar>,
    pub carpet_area: Option<Scalar>,
    pub built_up_area: Option<Scalar>,
    pub super_built_up_area: Option<Scalar>,
    pub land_rate: Option<Scalar>,
    pub construction_rate: Option<Scalar>,
    pub age_of_building: Option<Scalar>,
    pub residual_life: Option<Scalar>,

    /// Locality, utility and condition attributes, keyed by snake_case name.
    pub additional_details: Option<BTreeMap<String, Option<Scalar>>>,
}

impl ReportRecord {
    /// Parse a record from JSON text.
    ///
    /// Fails only when the input is not a JSON object or a field holds an
    /// array or object where a scalar is expected.
    pub fn from_json(json: &str) -> Result<Self, FolioError> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        Self::from_value(value)
    }

    /// Convert an already-parsed JSON value into a record.
    pub fn from_value(value: serde_json::Value) -> Result<Self, FolioError> {
        if !value.is_object() {
            let kind = match value {
                serde_json::Value::Null => "null",
                serde_json::Value::Bool(_) => "a boolean",
                serde_json::Value::Number(_) => "a number",
                serde_json::Value::String(_) => "a string",
                serde_json::Value::Array(_) => "an array",
                serde_json::Value::Object(_) => "an object",
            };
            let err = <serde_json::Error as serde::de::Error>::custom(format!(
                "expected an object, found {}",
                kind
            ));
            return Err(err.into());
        }
        Ok(serde_json::from_value(value)?)
    }

    /// Look up an additional-details attribute, treating blanks as absent.
    pub fn detail(&self, key: &str) -> Option<&Scalar> {
        self.additional_details
            .as_ref()
            .and_then(|map| map.get(key))
            .and_then(|v| v.as_ref())
            .filter(|v| !v.is_blank())
    }
}

/// Optional map snapshot locations.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MapUrls {
    pub normal: Option<String>,
    pub satellite: Option<String>,
}

impl MapUrls {
    /// Present URLs with their captions, trimmed. Blank entries count as absent.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &'static str)> {
        [
            (self.normal.as_deref(), "Location Map"),
            (self.satellite.as_deref(), "Satellite View"),
        ]
        .into_iter()
        .filter_map(|(url, caption)| {
            url.map(str::trim)
                .filter(|u| !u.is_empty())
                .map(|u| (u, caption))
        })
    }

    pub fn is_empty(&self) -> bool {
        self.entries().next().is_none()
    }
}

// ── Blocks ──────────────────────────────────────────────────────

/// One independently sized unit of document content, or a break directive.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading(HeadingBlock),
    Table(TableBlock),
    Image(ImageBlock),
    TextBox(TextBoxBlock),
    /// Start a new page regardless of remaining space.
    PageBreak,
}

impl Block {
    /// Short kind name used in layout summaries and logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Block::Heading(_) => "Heading",
            Block::Table(_) => "Table",
            Block::Image(_) => "Image",
            Block::TextBox(_) => "TextBox",
            Block::PageBreak => "PageBreak",
        }
    }

    /// Human-readable label for the block.
    pub fn label(&self) -> String {
        match self {
            Block::Heading(h) => h.text.clone(),
            Block::Table(t) => t.title.clone(),
            Block::Image(i) => i.caption.clone(),
            Block::TextBox(_) => "Text box".to_string(),
            Block::PageBreak => String::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeadingLevel {
    /// The document title on the first page.
    Title,
    /// A section heading.
    Section,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HeadingBlock {
    pub text: String,
    pub level: HeadingLevel,
}

/// Column arrangement of a key/value table.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableColumns {
    /// One (label, value) pair per visual row.
    Two,
    /// Two (label, value) pairs side by side per visual row.
    Four,
}

/// A labelled key/value table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableBlock {
    /// Drawn once above the first segment. Empty for no title line.
    pub title: String,
    /// Header labels for the label and value columns.
    pub header: (String, String),
    pub rows: Vec<(String, String)>,
    pub columns: TableColumns,
}

impl TableBlock {
    pub fn new(title: &str, header: (&str, &str), rows: Vec<(String, String)>) -> Self {
        Self {
            title: title.to_string(),
            header: (header.0.to_string(), header.1.to_string()),
            rows,
            columns: TableColumns::Two,
        }
    }

    pub fn four_column(mut self) -> Self {
        self.columns = TableColumns::Four;
        self
    }

    /// Cell text for every visual row, left to right.
    pub fn visual_rows(&self) -> Vec<Vec<&str>> {
        match self.columns {
            TableColumns::Two => self
                .rows
                .iter()
                .map(|(l, v)| vec![l.as_str(), v.as_str()])
                .collect(),
            TableColumns::Four => self
                .rows
                .chunks(2)
                .map(|pair| {
                    let mut cells = vec![pair[0].0.as_str(), pair[0].1.as_str()];
                    match pair.get(1) {
                        Some((l, v)) => cells.extend([l.as_str(), v.as_str()]),
                        None => cells.extend(["", ""]),
                    }
                    cells
                })
                .collect(),
        }
    }

    /// Header cell text, repeated per pair for four-column tables.
    pub fn header_cells(&self) -> Vec<&str> {
        let (l, v) = (self.header.0.as_str(), self.header.1.as_str());
        match self.columns {
            TableColumns::Two => vec![l, v],
            TableColumns::Four => vec![l, v, l, v],
        }
    }
}

/// A raster image with a caption line drawn above it.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageBlock {
    pub source_url: String,
    pub caption: String,
}

/// Paragraphs wrapped inside a bordered box.
#[derive(Debug, Clone, PartialEq)]
pub struct TextBoxBlock {
    pub lines: Vec<String>,
}

// ── Geometry ────────────────────────────────────────────────────

/// Standard page sizes in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub enum PageSize {
    #[default]
    A4,
    Letter,
    Legal,
    Custom {
        width: f64,
        height: f64,
    },
}

impl PageSize {
    /// Returns (width, height) in points.
    pub fn dimensions(&self) -> (f64, f64) {
        match self {
            PageSize::A4 => (595.28, 841.89),
            PageSize::Letter => (612.0, 792.0),
            PageSize::Legal => (612.0, 1008.0),
            PageSize::Custom { width, height } => (*width, *height),
        }
    }
}

/// Edge values (top, right, bottom, left) in points.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Edges {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

impl Edges {
    pub fn uniform(v: f64) -> Self {
        Self {
            top: v,
            right: v,
            bottom: v,
            left: v,
        }
    }

    pub fn horizontal(&self) -> f64 {
        self.left + self.right
    }

    pub fn vertical(&self) -> f64 {
        self.top + self.bottom
    }
}

/// An RGB color with components in 0.0..=1.0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f64,
    pub g: f64,
    pub b: f64,
}

impl Color {
    pub const BLACK: Color = Color {
        r: 0.0,
        g: 0.0,
        b: 0.0,
    };
    pub const WHITE: Color = Color {
        r: 1.0,
        g: 1.0,
        b: 1.0,
    };

    pub const fn rgb(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b }
    }

    pub const fn gray(v: f64) -> Self {
        Self { r: v, g: v, b: v }
    }
}
