//! Batch report generator: runs the pipeline once and writes the JSON, CSV
//! and document artifacts under `reports/`.
//!
//! Usage: sales-report [ORDER_DATE_START] [ORDER_DATE_END]
//! Dates are ISO (YYYY-MM-DD); the data directory comes from DATA_DIR.

use chrono::NaiveDate;
use std::path::Path;
use tracing::info;
use tracing_subscriber::fmt::time::ChronoLocal;

use bakery_sales::models::FilterCriteria;
use bakery_sales::service::{assemble, batch};
use bakery_sales::{AppConfig, CsvDirSource, ReportService};

const OUTPUT_DIR: &str = "reports";

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_timer(ChronoLocal::new("%Y-%m-%d %H:%M:%S".to_string()))
        .with_target(false)
        .init();

    let mut args = std::env::args().skip(1);
    let start = args.next().map(|s| parse_date(&s)).transpose()?;
    let end = args.next().map(|s| parse_date(&s)).transpose()?;

    let criteria = FilterCriteria {
        order_date_start: start,
        order_date_end: end,
        ..Default::default()
    };

    let config = AppConfig::from_env();
    info!("Reading tables from {}", config.source.data_dir);

    let service = ReportService::new(CsvDirSource::new(&config.source.data_dir));
    let run = service.run(&criteria)?;

    if run.report.is_empty() {
        info!("No data for selected filters; writing explicit empty report");
    }
    for warning in &run.report.warnings {
        tracing::warn!("data quality: {warning:?}");
    }

    println!("{}", String::from_utf8_lossy(&assemble::to_document(&run)));

    let paths = batch::write_artifacts(&run, Path::new(OUTPUT_DIR))?;
    info!("Artifacts written:");
    info!("  {}", paths.json.display());
    info!("  {}", paths.csv.display());
    info!("  {}", paths.document.display());

    Ok(())
}

fn parse_date(raw: &str) -> Result<NaiveDate, Box<dyn std::error::Error>> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .map_err(|_| format!("expected ISO date (YYYY-MM-DD), got '{raw}'").into())
}
