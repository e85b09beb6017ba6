use crate::types::{
    AggRow, AggTable, Aggregation, ChartKind, ChartSpec, Dataset, Dimension, Encoding, KeyValue,
    Measure, ReportMode, ReportRequest, SalesRecord,
};
use std::collections::BTreeMap;
use tracing::debug;

#[derive(Default)]
struct Acc {
    sum: f64,
    count: usize,
}

/// Group `rows` by `dims` and aggregate `measure`.
///
/// Rows with a missing key cell are dropped. Missing measure values are
/// skipped, so a group with no values has a NaN mean and a zero sum.
pub fn group_aggregate<'a, I>(
    rows: I,
    dims: &[Dimension],
    measure: Measure,
    aggregation: Aggregation,
) -> AggTable
where
    I: IntoIterator<Item = &'a SalesRecord>,
{
    let mut map: BTreeMap<Vec<KeyValue>, Acc> = BTreeMap::new();
    'rows: for r in rows {
        let mut keys = Vec::with_capacity(dims.len());
        for dim in dims {
            match dim.key(r) {
                Some(k) => keys.push(k),
                None => continue 'rows,
            }
        }
        let e = map.entry(keys).or_default();
        if let Some(v) = measure.value(r) {
            e.sum += v;
            e.count += 1;
        }
    }

    let rows = map
        .into_iter()
        .map(|(keys, acc)| {
            let value = match aggregation {
                Aggregation::Sum => acc.sum,
                Aggregation::Mean if acc.count == 0 => f64::NAN,
                Aggregation::Mean => acc.sum / acc.count as f64,
            };
            AggRow { keys, value }
        })
        .collect();

    AggTable { dimensions: dims.to_vec(), measure, aggregation, rows }
}

fn mean_sales_by(rows: &[&SalesRecord], dims: &[Dimension]) -> AggTable {
    group_aggregate(rows.iter().copied(), dims, Measure::AutomobileSales, Aggregation::Mean)
}

fn ad_spend_by_vehicle(rows: &[&SalesRecord]) -> AggTable {
    group_aggregate(
        rows.iter().copied(),
        &[Dimension::VehicleType],
        Measure::AdvertisingExpenditure,
        Aggregation::Sum,
    )
}

fn chart(kind: ChartKind, title: impl Into<String>, encoding: Encoding, table: AggTable) -> ChartSpec {
    ChartSpec { kind, title: title.into(), encoding, table }
}

/// Charts for the recession report, in display order.
pub fn recession_charts(data: &Dataset) -> Vec<ChartSpec> {
    let rec = data.recession_rows();

    let by_year = mean_sales_by(&rec, &[Dimension::Year]);
    let by_type = mean_sales_by(&rec, &[Dimension::VehicleType]);
    let spend = ad_spend_by_vehicle(&rec);
    let unemp = mean_sales_by(&rec, &[Dimension::UnemploymentRate, Dimension::VehicleType]);

    vec![
        chart(
            ChartKind::Line,
            "Average Automobile Sales over Recession Years",
            Encoding::new(Dimension::Year, Measure::AutomobileSales),
            by_year,
        ),
        chart(
            ChartKind::Bar,
            "Average Vehicles Sold by Vehicle Type (Recessions)",
            Encoding::new(Dimension::VehicleType, Measure::AutomobileSales),
            by_type,
        ),
        chart(
            ChartKind::Pie,
            "Advertisement Expenditure Share by Vehicle Type (Recessions)",
            Encoding::new(Dimension::VehicleType, Measure::AdvertisingExpenditure),
            spend,
        ),
        chart(
            ChartKind::Bar,
            "Effect of Unemployment Rate on Vehicle Type and Sales (Recessions)",
            Encoding::new(Dimension::UnemploymentRate, Measure::AutomobileSales)
                .with_color(Dimension::VehicleType)
                .with_label("unemployment_rate", "Unemployment Rate")
                .with_label("Automobile_Sales", "Average Automobile Sales"),
            unemp,
        ),
    ]
}

/// Charts for the yearly report. The first two span every year; the last
/// two only look at `year`.
pub fn yearly_charts(data: &Dataset, year: i32) -> Vec<ChartSpec> {
    let all: Vec<&SalesRecord> = data.records().iter().collect();
    let in_year = data.rows_for_year(year);

    let by_year = mean_sales_by(&all, &[Dimension::Year]);
    let by_month = group_aggregate(
        all.iter().copied(),
        &[Dimension::Month],
        Measure::AutomobileSales,
        Aggregation::Sum,
    );
    let by_type = mean_sales_by(&in_year, &[Dimension::VehicleType]);
    let spend = ad_spend_by_vehicle(&in_year);

    vec![
        chart(
            ChartKind::Line,
            "Yearly Automobile Sales (Average per Year)",
            Encoding::new(Dimension::Year, Measure::AutomobileSales),
            by_year,
        ),
        chart(
            ChartKind::Line,
            "Total Monthly Automobile Sales (All Years)",
            Encoding::new(Dimension::Month, Measure::AutomobileSales),
            by_month,
        ),
        chart(
            ChartKind::Bar,
            format!("Average Vehicles Sold by Vehicle Type in {year}"),
            Encoding::new(Dimension::VehicleType, Measure::AutomobileSales),
            by_type,
        ),
        chart(
            ChartKind::Pie,
            format!("Advertisement Expenditure by Vehicle Type in {year}"),
            Encoding::new(Dimension::VehicleType, Measure::AdvertisingExpenditure),
            spend,
        ),
    ]
}

/// Compute the ordered chart list for a request.
///
/// Yearly mode without a year, or with a year absent from the dataset,
/// yields no charts. The year is ignored in recession mode.
pub fn select(request: &ReportRequest, data: &Dataset) -> Vec<ChartSpec> {
    let charts = match (request.mode, request.year) {
        (ReportMode::Recession, _) => recession_charts(data),
        (ReportMode::Yearly, Some(year)) if data.has_year(year) => yearly_charts(data, year),
        (ReportMode::Yearly, _) => Vec::new(),
    };
    debug!(mode = %request.mode, year = ?request.year, charts = charts.len(), "charts recomputed");
    charts
}

/// Same as [`select`] but takes the raw mode literal from a selector
/// control. Unknown literals produce no charts.
pub fn select_by_label(mode: &str, year: Option<i32>, data: &Dataset) -> Vec<ChartSpec> {
    match mode.parse::<ReportMode>() {
        Ok(mode) => select(&ReportRequest { mode, year }, data),
        Err(_) => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rec(year: i32, month: &str, recession: bool, vt: &str, sales: f64, ads: f64, unemp: f64) -> SalesRecord {
        SalesRecord {
            year,
            month: month.to_string(),
            recession,
            vehicle_type: vt.to_string(),
            automobile_sales: Some(sales),
            advertising_expenditure: Some(ads),
            unemployment_rate: Some(unemp),
        }
    }

    fn sample() -> Dataset {
        Dataset::new(vec![
            rec(2000, "Feb", false, "Car", 10.0, 100.0, 4.0),
            rec(2000, "Jan", true, "Truck", 20.0, 300.0, 6.5),
            rec(2001, "Jan", true, "Car", 30.0, 50.0, 6.5),
            rec(2001, "Feb", true, "Car", 50.0, 70.0, 4.0),
        ])
    }

    fn kinds(charts: &[ChartSpec]) -> Vec<ChartKind> {
        charts.iter().map(|c| c.kind).collect()
    }

    #[test]
    fn mean_by_vehicle_type() {
        let data = sample();
        let t = group_aggregate(
            data.records(),
            &[Dimension::VehicleType],
            Measure::AutomobileSales,
            Aggregation::Mean,
        );
        assert_eq!(t.len(), 2);
        assert_eq!(t.value_for(&[KeyValue::from("Car")]), Some(30.0));
        assert_eq!(t.value_for(&[KeyValue::from("Truck")]), Some(20.0));
    }

    #[test]
    fn missing_measures_are_excluded() {
        let mut a = rec(2000, "Jan", false, "Car", 0.0, 1.0, 5.0);
        a.automobile_sales = None;
        let b = rec(2000, "Jan", false, "Car", 8.0, 1.0, 5.0);
        let mut c = rec(2000, "Jan", false, "Van", 0.0, 1.0, 5.0);
        c.automobile_sales = None;
        let rows = [a, b, c];

        let mean = group_aggregate(&rows, &[Dimension::VehicleType], Measure::AutomobileSales, Aggregation::Mean);
        assert_eq!(mean.value_for(&[KeyValue::from("Car")]), Some(8.0));
        assert!(mean.value_for(&[KeyValue::from("Van")]).unwrap().is_nan());

        let sum = group_aggregate(&rows, &[Dimension::VehicleType], Measure::AutomobileSales, Aggregation::Sum);
        assert_eq!(sum.value_for(&[KeyValue::from("Van")]), Some(0.0));
    }

    #[test]
    fn missing_keys_drop_the_row() {
        let mut a = rec(2000, "Jan", true, "Car", 1.0, 1.0, 5.0);
        a.unemployment_rate = None;
        let b = rec(2000, "Jan", true, "Car", 3.0, 1.0, 5.0);
        let rows = [a, b];
        let t = group_aggregate(
            &rows,
            &[Dimension::UnemploymentRate, Dimension::VehicleType],
            Measure::AutomobileSales,
            Aggregation::Mean,
        );
        assert_eq!(t.len(), 1);
        assert_eq!(t.rows[0].value, 3.0);
    }

    #[test]
    fn months_group_in_calendar_order() {
        let data = sample();
        let charts = select(&ReportRequest::yearly(2000), &data);
        let months: Vec<String> = charts[1].table.rows.iter().map(|r| r.keys[0].to_string()).collect();
        assert_eq!(months, vec!["Jan", "Feb"]);
        assert_eq!(charts[1].table.rows[0].value, 50.0);
        assert_eq!(charts[1].table.rows[1].value, 60.0);
    }

    #[test]
    fn yearly_report_shape() {
        let data = sample();
        let charts = select(&ReportRequest::yearly(2000), &data);
        assert_eq!(kinds(&charts), vec![ChartKind::Line, ChartKind::Line, ChartKind::Bar, ChartKind::Pie]);
        assert_eq!(charts[2].title, "Average Vehicles Sold by Vehicle Type in 2000");
        assert_eq!(charts[3].title, "Advertisement Expenditure by Vehicle Type in 2000");
        // whole-period line covers both years
        assert_eq!(charts[0].table.len(), 2);
        assert_eq!(charts[0].table.value_for(&[KeyValue::Int(2001)]), Some(40.0));
        assert_eq!(charts[3].table.value_for(&[KeyValue::from("Truck")]), Some(300.0));
    }

    #[test]
    fn recession_report_shape() {
        let data = sample();
        let charts = select(&ReportRequest::recession(), &data);
        assert_eq!(kinds(&charts), vec![ChartKind::Line, ChartKind::Bar, ChartKind::Pie, ChartKind::Bar]);
        assert_eq!(charts[0].table.value_for(&[KeyValue::Int(2000)]), Some(20.0));
        assert_eq!(charts[0].table.value_for(&[KeyValue::Int(2001)]), Some(40.0));
        assert_eq!(charts[2].table.value_for(&[KeyValue::from("Car")]), Some(120.0));

        let unemp = &charts[3];
        assert_eq!(unemp.encoding.color, Some(Dimension::VehicleType));
        assert_eq!(unemp.encoding.label_for("unemployment_rate"), "Unemployment Rate");
        assert_eq!(unemp.table.value_for(&[KeyValue::Number(6.5), "Car".into()]), Some(30.0));
        assert_eq!(unemp.table.value_for(&[KeyValue::Number(6.5), "Truck".into()]), Some(20.0));
        assert_eq!(unemp.table.rows[0].keys[0], KeyValue::Number(4.0));
    }

    #[test]
    fn yearly_without_year_or_unknown_year_is_empty() {
        let data = sample();
        let no_year = ReportRequest { mode: ReportMode::Yearly, year: None };
        assert!(select(&no_year, &data).is_empty());
        assert!(select(&ReportRequest::yearly(1999), &data).is_empty());
    }

    #[test]
    fn unknown_mode_label_is_empty() {
        let data = sample();
        assert!(select_by_label("Monthly Statistics", Some(2000), &data).is_empty());
        assert_eq!(select_by_label("Yearly Statistics", Some(2000), &data).len(), 4);
    }
}
