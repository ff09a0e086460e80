//! # Document Assembly
//!
//! Maps a [`ReportRecord`] onto the ordered block sequence of a report:
//!
//! ```text
//! title, identification, valuation, specification
//! ── page break ──
//! additional details
//! ── page break ──   ┐
//! maps heading,      │ only when at least one
//! map images         │ map URL is present
//! ── page break ──   ┘
//! remarks heading, remarks box
//! ```
//!
//! Every row is always emitted. Missing values show the placeholder, so a
//! sparse record lays out exactly like a complete one.

use crate::config::ReportConfig;
use crate::model::format::{self, humanize_key};
use crate::model::{
    Block, HeadingBlock, HeadingLevel, ImageBlock, MapUrls, ReportRecord, Scalar, TableBlock,
    TextBoxBlock,
};

pub const REPORT_TITLE: &str = "Valuation Report";

const TABLE_HEADER: (&str, &str) = ("Particulars", "Details");
const AREA_UNIT: &str = "sq. ft.";

/// Locality, utility and condition attributes, in report order. Each gets a
/// row whether or not the record carries it.
pub const KNOWN_DETAILS: [(&str, &str); 14] = [
    ("nature_of_locality", "Nature of Locality"),
    ("classification_of_locality", "Classification of Locality"),
    ("road_width", "Width of Approach Road"),
    ("water_supply", "Water Supply"),
    ("drainage", "Drainage / Sewerage"),
    ("electricity", "Electricity"),
    ("public_transport", "Public Transport"),
    ("nearest_railway_station", "Nearest Railway Station"),
    ("distance_from_city_centre", "Distance from City Centre"),
    ("number_of_floors", "Number of Floors"),
    ("construction_quality", "Quality of Construction"),
    ("maintenance", "State of Maintenance"),
    ("occupancy_status", "Occupancy Status"),
    ("amenities", "Amenities"),
];

/// Build the block sequence for one report.
pub fn assemble(record: &ReportRecord, map_urls: &MapUrls, config: &ReportConfig) -> Vec<Block> {
    let mut blocks = vec![
        heading(REPORT_TITLE, HeadingLevel::Title),
        Block::Table(identification(record)),
        Block::Table(valuation(record)),
        Block::Table(specification(record)),
        Block::PageBreak,
        Block::Table(additional_details(record)),
    ];

    if !map_urls.is_empty() {
        blocks.push(Block::PageBreak);
        blocks.push(heading("Location Maps", HeadingLevel::Section));
        blocks.extend(map_blocks(map_urls));
        blocks.push(Block::PageBreak);
    }

    blocks.push(heading("Remarks", HeadingLevel::Section));
    blocks.push(Block::TextBox(TextBoxBlock {
        lines: config.remarks.clone(),
    }));
    blocks
}

fn heading(text: &str, level: HeadingLevel) -> Block {
    Block::Heading(HeadingBlock {
        text: text.to_string(),
        level,
    })
}

fn row(label: &str, value: String) -> (String, String) {
    (label.to_string(), value)
}

fn identification(r: &ReportRecord) -> TableBlock {
    let t = format::text;
    TableBlock::new(
        "Property Identification",
        TABLE_HEADER,
        vec![
            row("Case Reference No.", t(r.case_ref_no.as_ref())),
            row("Report Date", t(r.report_date.as_ref())),
            row("Date of Inspection", t(r.inspection_date.as_ref())),
            row("Name of Owner", t(r.owner_name.as_ref())),
            row("Address of Owner", t(r.owner_address.as_ref())),
            row("Property Address", t(r.property_address.as_ref())),
            row("Landmark", t(r.landmark.as_ref())),
            row("Type of Property", t(r.property_type.as_ref())),
            row("Purpose of Valuation", t(r.purpose_of_valuation.as_ref())),
        ],
    )
}

fn valuation(r: &ReportRecord) -> TableBlock {
    TableBlock::new(
        "Valuation Summary",
        TABLE_HEADER,
        vec![
            row("Fair Market Value", format::currency(r.final_valuation.as_ref())),
            row("Realizable Value", format::currency(r.realizable_value.as_ref())),
            row("Distress Value", format::currency(r.distress_value.as_ref())),
            row("Value in Words", format::text(r.valuation_in_words.as_ref())),
        ],
    )
}

fn specification(r: &ReportRecord) -> TableBlock {
    let area = |v: Option<&Scalar>| format::with_unit(v, AREA_UNIT);
    let rate = |v: Option<&Scalar>| format::rate(v, AREA_UNIT);
    let years = |v: Option<&Scalar>| format::with_unit(v, "years");
    TableBlock::new(
        "Area & Specification",
        TABLE_HEADER,
        vec![
            row("Land Area", area(r.land_area.as_ref())),
            row("Carpet Area", area(r.carpet_area.as_ref())),
            row("Built-up Area", area(r.built_up_area.as_ref())),
            row("Super Built-up Area", area(r.super_built_up_area.as_ref())),
            row("Land Rate", rate(r.land_rate.as_ref())),
            row("Construction Rate", rate(r.construction_rate.as_ref())),
            row("Age of Building", years(r.age_of_building.as_ref())),
            row("Residual Life", years(r.residual_life.as_ref())),
        ],
    )
    .four_column()
}

fn additional_details(r: &ReportRecord) -> TableBlock {
    let mut rows: Vec<(String, String)> = KNOWN_DETAILS
        .iter()
        .map(|(key, label)| row(label, format::text(r.detail(key))))
        .collect();

    if let Some(details) = &r.additional_details {
        let extra = details
            .keys()
            .filter(|key| !KNOWN_DETAILS.iter().any(|(known, _)| *known == key.as_str()));
        for key in extra {
            rows.push((humanize_key(key), format::text(r.detail(key))));
        }
    }
    TableBlock::new("Additional Details", TABLE_HEADER, rows)
}

fn map_blocks(urls: &MapUrls) -> impl Iterator<Item = Block> + '_ {
    urls.entries().map(|(url, caption)| {
        Block::Image(ImageBlock {
            source_url: url.to_string(),
            caption: caption.to_string(),
        })
    })
}
