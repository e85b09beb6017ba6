use crate::config::DataSource;
use crate::error::{DashboardError, Result};
use crate::types::{Dataset, RawRow, SalesRecord, REQUIRED_COLUMNS};
use crate::util::{non_empty, parse_f64_safe, parse_flag_safe, parse_i32_safe};
use csv::{ReaderBuilder, Trim};
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LoadReport {
    pub total_rows: usize,
    pub loaded_rows: usize,
    pub parse_errors: usize,
    pub missing_measures: usize,
    pub missing_rates: usize,
}

pub fn load(source: &DataSource) -> Result<(Dataset, LoadReport)> {
    match source {
        DataSource::Path(path) => load_from_path(path),
        DataSource::Url(url) => load_from_url(url),
    }
}

pub fn load_from_path(path: &Path) -> Result<(Dataset, LoadReport)> {
    info!(path = %path.display(), "reading sales data");
    let file = File::open(path)?;
    load_from_reader(file)
}

/// Fetch the CSV once over HTTP(S) and parse it from memory.
pub fn load_from_url(url: &str) -> Result<(Dataset, LoadReport)> {
    info!(%url, "downloading sales data");
    let body = reqwest::blocking::get(url)?.error_for_status()?.bytes()?;
    debug!(bytes = body.len(), "download complete");
    load_from_reader(Cursor::new(body))
}

/// Parse sales records from any CSV reader.
///
/// The header must carry every column in [`REQUIRED_COLUMNS`]; a missing
/// column means the dataset does not match the schema and nothing is loaded.
/// Rows whose `Year` or `Recession` cell is unusable are skipped and counted.
/// Unparseable measure cells become absent values so aggregations skip them.
pub fn load_from_reader<R: Read>(reader: R) -> Result<(Dataset, LoadReport)> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::Headers)
        .from_reader(reader);

    let headers = rdr.headers()?.clone();
    for column in REQUIRED_COLUMNS {
        if !headers.iter().any(|h| h == column) {
            return Err(DashboardError::MissingColumn(column.to_string()));
        }
    }

    let mut report = LoadReport::default();
    let mut records: Vec<SalesRecord> = Vec::new();

    for result in rdr.deserialize::<RawRow>() {
        report.total_rows += 1;
        let row = match result {
            Ok(r) => r,
            Err(_) => { report.parse_errors += 1; continue; }
        };

        let year = match parse_i32_safe(row.year.as_deref()) { Some(y) => y, None => { report.parse_errors += 1; continue; } };
        let recession = match parse_flag_safe(row.recession.as_deref()) { Some(f) => f, None => { report.parse_errors += 1; continue; } };

        let automobile_sales = parse_f64_safe(row.automobile_sales.as_deref());
        let advertising_expenditure = parse_f64_safe(row.advertising_expenditure.as_deref());
        let unemployment_rate = parse_f64_safe(row.unemployment_rate.as_deref());
        report.missing_measures += [automobile_sales, advertising_expenditure]
            .iter()
            .filter(|v| v.is_none())
            .count();
        if unemployment_rate.is_none() {
            report.missing_rates += 1;
        }

        records.push(SalesRecord {
            year,
            month: non_empty(row.month).unwrap_or_default(),
            recession,
            vehicle_type: non_empty(row.vehicle_type).unwrap_or_default(),
            automobile_sales,
            advertising_expenditure,
            unemployment_rate,
        });
    }

    report.loaded_rows = records.len();
    if report.parse_errors > 0 {
        warn!(skipped = report.parse_errors, "rows skipped due to unparseable Year/Recession");
    }
    if records.is_empty() {
        return Err(DashboardError::EmptyDataset);
    }
    info!(rows = report.loaded_rows, "sales data loaded");
    Ok((Dataset::new(records), report))
}
