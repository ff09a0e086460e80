//! # Folio CLI
//!
//! Usage:
//!   folio record.json -o report.pdf
//!   folio record.json -d ./out --normal-map https://... --satellite-map https://...
//!   echo '{ ... }' | folio -o report.pdf
//!   folio record.json --layout
//!   folio --example > record.json

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use log::error;

use folio::{FolioError, HttpImageSource, MapUrls, ReportConfig, ReportRecord};

#[derive(Parser, Debug)]
#[command(name = "folio", version, about = "Render a property valuation report to PDF")]
struct Args {
    /// Report record JSON. Reads stdin when omitted.
    input: Option<PathBuf>,

    /// Output file. Defaults to the generated report file name.
    #[arg(short, long, conflicts_with = "output_dir")]
    output: Option<PathBuf>,

    /// Directory for the generated report file name.
    #[arg(short = 'd', long)]
    output_dir: Option<PathBuf>,

    /// Road map snapshot URL.
    #[arg(long)]
    normal_map: Option<String>,

    /// Satellite snapshot URL.
    #[arg(long)]
    satellite_map: Option<String>,

    /// Engine configuration JSON.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the layout summary as JSON instead of writing a PDF.
    #[arg(long)]
    layout: bool,

    /// Print an example report record and exit.
    #[arg(long)]
    example: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args = Args::parse();

    if args.example {
        print!("{}", example_record_json());
        return ExitCode::SUCCESS;
    }

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), FolioError> {
    let input = match &args.input {
        Some(path) => fs::read_to_string(path)?,
        None => {
            let mut buf = String::new();
            io::stdin().read_to_string(&mut buf)?;
            buf
        }
    };

    let config = match &args.config {
        Some(path) => ReportConfig::from_json_file(path)?,
        None => ReportConfig::default(),
    };
    let map_urls = MapUrls {
        normal: args.normal_map.clone(),
        satellite: args.satellite_map.clone(),
    };

    let source = HttpImageSource::new(Duration::from_secs(config.fetch_timeout_secs))
        .map_err(|e| FolioError::Config(e.to_string()))?;

    if args.layout {
        let record = ReportRecord::from_json(&input)?;
        let blocks = folio::assemble::assemble(&record, &map_urls, &config);
        let images = folio::fetch::resolve_images(&blocks, &source).await;
        let layout = folio::layout_report(&record, &map_urls, &config, &images)?;
        let json = serde_json::to_string_pretty(&layout.summary)
            .map_err(|e| FolioError::RenderSink(e.to_string()))?;
        println!("{}", json);
        return Ok(());
    }

    let generated_at = chrono::Local::now().naive_local();
    let report =
        folio::render_report_json(&input, &map_urls, &config, &source, generated_at).await?;

    let path = match (args.output, args.output_dir) {
        (Some(path), _) => path,
        (None, Some(dir)) => dir.join(&report.filename),
        (None, None) => PathBuf::from(&report.filename),
    };
    fs::write(&path, &report.bytes)?;
    eprintln!(
        "Written {} pages ({} bytes) to {}",
        report.page_count,
        report.bytes.len(),
        path.display()
    );
    Ok(())
}

fn example_record_json() -> &'static str {
    r##"{
  "case_ref_no": "CR-001",
  "report_date": "2024-07-01",
  "inspection_date": "2024-06-27",
  "owner_name": "Anjali Deshpande",
  "owner_address": "12 Lakeview Apartments, Baner Road, Pune 411045",
  "property_address": "Flat 4B, Sai Residency, Survey No. 112/4, Aundh, Pune 411007",
  "landmark": "Opposite Aundh Post Office",
  "property_type": "Residential Flat",
  "purpose_of_valuation": "Housing loan",
  "final_valuation": 8000000,
  "realizable_value": 7200000,
  "distress_value": 6400000,
  "valuation_in_words": "Rupees Eighty Lakh Only",
  "land_area": null,
  "carpet_area": 860,
  "built_up_area": 1030,
  "super_built_up_area": 1240,
  "land_rate": null,
  "construction_rate": 2400,
  "age_of_building": 8,
  "residual_life": 52,
  "additional_details": {
    "nature_of_locality": "Residential",
    "classification_of_locality": "Upper middle class",
    "road_width": "12 m",
    "water_supply": "Municipal",
    "drainage": "Underground sewerage",
    "electricity": "MSEDCL",
    "public_transport": "PMPML bus, 200 m",
    "nearest_railway_station": "Shivajinagar, 6 km",
    "number_of_floors": "Stilt + 7",
    "construction_quality": "Good",
    "maintenance": "Well maintained",
    "occupancy_status": "Owner occupied",
    "amenities": "Lift, covered parking, security"
  }
}
"##
}
