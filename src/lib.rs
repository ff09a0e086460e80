//! # Folio
//!
//! A paginated document engine for property valuation reports.
//!
//! A report record goes in, a finished multi-page PDF comes out. Layout is
//! page-native: every block is measured before it is drawn and placed onto a
//! page of known size, so nothing is ever sliced after the fact. Tables are
//! the only content that continues across a page boundary, and they re-draw
//! their header row when they do.
//!
//! ## Architecture
//!
//! ```text
//! ReportRecord (JSON/API) + map URLs
//!       ↓
//!   [assemble] Ordered block sequence, placeholders for missing fields
//!       ↓
//!   [fetch]    Map snapshots, fetched concurrently (the only await)
//!       ↓
//!   [layout]   Paginator places blocks onto pages
//!       ↓
//!   [stamp]    Contact line and "Page i of N" on every page
//!       ↓
//!   [pdf]      Serialize to PDF bytes
//! ```

pub mod assemble;
pub mod config;
pub mod error;
pub mod fetch;
pub mod font;
pub mod image_loader;
pub mod layout;
pub mod model;
pub mod pdf;
pub mod stamp;
pub mod text;

use chrono::{NaiveDate, NaiveDateTime};
use log::info;

pub use config::ReportConfig;
pub use error::FolioError;
pub use fetch::{HttpImageSource, ImageSet, ImageSource, LocalImageSource};
pub use layout::{LayoutPage, LayoutSummary};
pub use model::{Block, MapUrls, ReportRecord};

use layout::Paginator;
use model::format;
use pdf::{PdfMetadata, PdfWriter};

/// Pages after pagination and stamping, before serialization.
#[derive(Debug, Clone)]
pub struct ReportLayout {
    pub pages: Vec<LayoutPage>,
    pub summary: LayoutSummary,
}

/// A finished report.
#[derive(Debug, Clone)]
pub struct RenderedReport {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub page_count: usize,
    pub layout: LayoutSummary,
}

/// Render a report to PDF bytes.
///
/// Map images are fetched through `source` first; any that fail are drawn
/// as placeholders. The only errors are a failure of the PDF writer itself.
pub async fn render_report<S: ImageSource>(
    record: &ReportRecord,
    map_urls: &MapUrls,
    config: &ReportConfig,
    source: &S,
    generated_at: NaiveDateTime,
) -> Result<RenderedReport, FolioError> {
    config.validate()?;
    let blocks = assemble::assemble(record, map_urls, config);
    let images = fetch::resolve_images(&blocks, source).await;
    let layout = layout_blocks(&blocks, config, &images);
    write_report(record, layout, generated_at)
}

/// Render a report given as JSON text.
///
/// Fails with [`FolioError::MalformedRecord`] when the JSON is not an object
/// of scalar fields.
pub async fn render_report_json<S: ImageSource>(
    json: &str,
    map_urls: &MapUrls,
    config: &ReportConfig,
    source: &S,
    generated_at: NaiveDateTime,
) -> Result<RenderedReport, FolioError> {
    let record = ReportRecord::from_json(json)?;
    render_report(&record, map_urls, config, source, generated_at).await
}

/// Lay out and stamp a report against images that were already resolved.
///
/// Fails with [`FolioError::Config`] when `config` leaves no usable page.
pub fn layout_report(
    record: &ReportRecord,
    map_urls: &MapUrls,
    config: &ReportConfig,
    images: &ImageSet,
) -> Result<ReportLayout, FolioError> {
    config.validate()?;
    let blocks = assemble::assemble(record, map_urls, config);
    Ok(layout_blocks(&blocks, config, images))
}

fn layout_blocks(blocks: &[Block], config: &ReportConfig, images: &ImageSet) -> ReportLayout {
    let mut paginator = Paginator::new(config, images);
    paginator.place_sequence(blocks);
    let mut pages = paginator.finish();
    stamp::stamp_pages(&mut pages, config);
    let summary = LayoutSummary::from_pages(&pages);
    ReportLayout { pages, summary }
}

fn write_report(
    record: &ReportRecord,
    layout: ReportLayout,
    generated_at: NaiveDateTime,
) -> Result<RenderedReport, FolioError> {
    let case_ref = format::text(record.case_ref_no.as_ref());
    let metadata = PdfMetadata {
        title: Some(format!("{} {}", assemble::REPORT_TITLE, case_ref)),
        author: None,
        subject: Some("Property valuation".to_string()),
        creation_date: Some(generated_at),
    };
    let bytes = PdfWriter::new().write(&layout.pages, &metadata)?;
    let filename = report_filename(record, generated_at.date());

    info!(
        "Rendered {} ({} pages, {} bytes)",
        filename,
        layout.pages.len(),
        bytes.len()
    );

    Ok(RenderedReport {
        filename,
        bytes,
        page_count: layout.pages.len(),
        layout: layout.summary,
    })
}

/// `Valuation_Report_<case_ref>_<YYYYMMDD>.pdf`.
///
/// Characters that are unsafe in file names become `_`. A record without a
/// case reference is named `UNKNOWN`.
pub fn report_filename(record: &ReportRecord, date: NaiveDate) -> String {
    let raw = record
        .case_ref_no
        .as_ref()
        .filter(|v| !v.is_blank())
        .map(|v| v.to_string())
        .unwrap_or_default();
    let cleaned: String = raw
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_matches('_');
    let case_ref = if cleaned.is_empty() { "UNKNOWN" } else { cleaned };
    format!("Valuation_Report_{}_{}.pdf", case_ref, date.format("%Y%m%d"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use model::Scalar;

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 7, 1).unwrap()
    }

    #[test]
    fn filename_uses_case_ref_and_date() {
        let record = ReportRecord {
            case_ref_no: Some(Scalar::Text("CR-001".to_string())),
            ..Default::default()
        };
        assert_eq!(report_filename(&record, date()), "Valuation_Report_CR-001_20240701.pdf");
    }

    #[test]
    fn filename_sanitizes_separators() {
        let record = ReportRecord {
            case_ref_no: Some(Scalar::Text("BOM/2024/17 ".to_string())),
            ..Default::default()
        };
        assert_eq!(
            report_filename(&record, date()),
            "Valuation_Report_BOM_2024_17_20240701.pdf"
        );
    }

    #[test]
    fn filename_without_case_ref() {
        assert_eq!(
            report_filename(&ReportRecord::default(), date()),
            "Valuation_Report_UNKNOWN_20240701.pdf"
        );
    }

    #[test]
    fn numeric_case_ref() {
        let record = ReportRecord {
            case_ref_no: Some(Scalar::Number(4521.into())),
            ..Default::default()
        };
        assert_eq!(report_filename(&record, date()), "Valuation_Report_4521_20240701.pdf");
    }
}
