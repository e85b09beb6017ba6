use crate::error::Result;
use crate::types::{AggTable, ChartKind, ChartSpec, Encoding};
use crate::util::format_number;
use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use tabled::{builder::Builder, settings::Style};
use tracing::info;

const BAR_WIDTH: usize = 24;

/// Write one chart's aggregated table; header uses the raw column names.
pub fn write_csv(path: &Path, table: &AggTable) -> Result<()> {
    let mut wtr = csv::Writer::from_path(path)?;
    let mut header: Vec<&str> = table.dimensions.iter().map(|d| d.column()).collect();
    header.push(table.measure.column());
    wtr.write_record(&header)?;
    for row in &table.rows {
        let mut record: Vec<String> = row.keys.iter().map(|k| k.to_string()).collect();
        record.push(row.value.to_string());
        wtr.write_record(&record)?;
    }
    wtr.flush()?;
    Ok(())
}

pub fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let s = serde_json::to_string_pretty(value)?;
    std::fs::write(path, s)?;
    Ok(())
}

/// Write `charts.json` plus `chart{N}_{kind}.csv` per chart into `dir`.
pub fn export_charts(dir: &Path, charts: &[ChartSpec]) -> Result<Vec<PathBuf>> {
    std::fs::create_dir_all(dir)?;
    let mut written = Vec::with_capacity(charts.len() + 1);

    let json_path = dir.join("charts.json");
    write_json(&json_path, &charts)?;
    written.push(json_path);

    for (idx, chart) in charts.iter().enumerate() {
        let path = dir.join(format!("chart{}_{}.csv", idx + 1, chart.kind));
        write_csv(&path, &chart.table)?;
        written.push(path);
    }
    info!(dir = %dir.display(), files = written.len(), "charts exported");
    Ok(written)
}

fn header_row(encoding: &Encoding, table: &AggTable, kind: ChartKind) -> Vec<String> {
    let mut header: Vec<String> = table
        .dimensions
        .iter()
        .map(|d| encoding.label_for(d.column()).to_string())
        .collect();
    header.push(encoding.label_for(table.measure.column()).to_string());
    if kind == ChartKind::Pie {
        header.push("Share".to_string());
    }
    header.push(String::new());
    header
}

fn bar(value: f64, max: f64) -> String {
    if !value.is_finite() || max <= 0.0 {
        return String::new();
    }
    let n = ((value.abs() / max) * BAR_WIDTH as f64).round() as usize;
    "█".repeat(n.min(BAR_WIDTH))
}

/// Render a chart as a titled markdown table with a proportional bar column.
pub fn render_chart(number: usize, chart: &ChartSpec, max_rows: usize) -> String {
    let table = &chart.table;
    let mut out = String::new();
    let _ = writeln!(out, "Chart {}: {} [{}]", number, chart.title, chart.kind);
    if let Some(color) = chart.encoding.color {
        let _ = writeln!(out, "(one series per {})", color.column());
    }
    out.push('\n');

    if table.is_empty() {
        out.push_str("(no rows)\n");
        return out;
    }

    let max = table
        .rows
        .iter()
        .map(|r| r.value.abs())
        .filter(|v| v.is_finite())
        .fold(0.0_f64, f64::max);
    let total = table.total();

    let mut builder = Builder::default();
    builder.push_record(header_row(&chart.encoding, table, chart.kind));
    for row in table.rows.iter().take(max_rows) {
        let mut record: Vec<String> = row.keys.iter().map(|k| k.to_string()).collect();
        record.push(format_number(row.value, 2));
        if chart.kind == ChartKind::Pie {
            let share = if total > 0.0 { row.value / total * 100.0 } else { 0.0 };
            record.push(format!("{}%", format_number(share, 1)));
        }
        record.push(bar(row.value, max));
        builder.push_record(record);
    }
    let mut rendered = builder.build();
    rendered.with(Style::markdown());
    let _ = writeln!(out, "{}", rendered);
    if table.len() > max_rows {
        let _ = writeln!(out, "({} more rows)", table.len() - max_rows);
    }
    out
}

pub fn preview_charts(charts: &[ChartSpec], max_rows: usize) {
    if charts.is_empty() {
        println!("No charts for the current selection.\n");
        return;
    }
    for (idx, chart) in charts.iter().enumerate() {
        println!("{}", render_chart(idx + 1, chart, max_rows));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reports::recession_charts;
    use crate::types::{Dataset, SalesRecord};

    fn data() -> Dataset {
        let row = |vt: &str, ads| SalesRecord {
            year: 1980,
            month: "Jan".to_string(),
            recession: true,
            vehicle_type: vt.to_string(),
            automobile_sales: Some(10.0),
            advertising_expenditure: Some(ads),
            unemployment_rate: Some(5.0),
        };
        Dataset::new(vec![row("Sports", 1500.0), row("Trucks", 500.0)])
    }

    #[test]
    fn pie_rows_show_shares() {
        let charts = recession_charts(&data());
        let text = render_chart(3, &charts[2], 10);
        assert!(text.starts_with("Chart 3: Advertisement Expenditure Share by Vehicle Type (Recessions) [pie]"));
        assert!(text.contains("| Share"));
        assert!(text.contains("1,500.00"));
        assert!(text.contains("75.0%"));
        assert!(text.contains("25.0%"));
    }

    #[test]
    fn labels_replace_column_names() {
        let charts = recession_charts(&data());
        let text = render_chart(4, &charts[3], 10);
        assert!(text.contains("Unemployment Rate"));
        assert!(text.contains("Average Automobile Sales"));
        assert!(text.contains("(one series per Vehicle_Type)"));
    }

    #[test]
    fn empty_tables_render_placeholder() {
        let charts = recession_charts(&Dataset::default());
        assert!(render_chart(1, &charts[0], 5).contains("(no rows)"));
    }

    #[test]
    fn long_tables_are_truncated() {
        let charts = recession_charts(&data());
        let text = render_chart(2, &charts[1], 1);
        assert!(text.contains("(1 more rows)"));
    }

    #[test]
    fn export_writes_json_and_csv() {
        let dir = tempfile::tempdir().unwrap();
        let charts = recession_charts(&data());
        let files = export_charts(dir.path(), &charts).unwrap();
        assert_eq!(files.len(), 5);
        assert!(dir.path().join("chart3_pie.csv").exists());

        let csv = std::fs::read_to_string(dir.path().join("chart2_bar.csv")).unwrap();
        assert_eq!(csv, "Vehicle_Type,Automobile_Sales\nSports,10\nTrucks,10\n");

        let json: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&files[0]).unwrap()).unwrap();
        assert_eq!(json[2]["kind"], "pie");
        assert_eq!(json[3]["encoding"]["color"], "Vehicle_Type");
        assert_eq!(json[0]["table"]["rows"][0]["keys"][0], 1980);
    }
}
