use chrono::Month;
use serde::{Deserialize, Serialize, Serializer};
use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;

/// Columns the loader insists on. Anything else in the CSV is ignored.
pub const REQUIRED_COLUMNS: [&str; 7] = [
    "Year",
    "Month",
    "Recession",
    "Vehicle_Type",
    "Automobile_Sales",
    "Advertising_Expenditure",
    "unemployment_rate",
];

#[derive(Debug, Deserialize)]
pub struct RawRow {
    #[serde(rename = "Year")]
    pub year: Option<String>,
    #[serde(rename = "Month")]
    pub month: Option<String>,
    #[serde(rename = "Recession")]
    pub recession: Option<String>,
    #[serde(rename = "Vehicle_Type")]
    pub vehicle_type: Option<String>,
    #[serde(rename = "Automobile_Sales")]
    pub automobile_sales: Option<String>,
    #[serde(rename = "Advertising_Expenditure")]
    pub advertising_expenditure: Option<String>,
    #[serde(rename = "unemployment_rate")]
    pub unemployment_rate: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SalesRecord {
    pub year: i32,
    pub month: String,
    pub recession: bool,
    pub vehicle_type: String,
    pub automobile_sales: Option<f64>,
    pub advertising_expenditure: Option<f64>,
    pub unemployment_rate: Option<f64>,
}

/// The loaded, read-only dataset.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    records: Vec<SalesRecord>,
}

impl Dataset {
    pub fn new(records: Vec<SalesRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[SalesRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Sorted distinct years; these are the options of the year selector.
    pub fn years(&self) -> Vec<i32> {
        let set: BTreeSet<i32> = self.records.iter().map(|r| r.year).collect();
        set.into_iter().collect()
    }

    pub fn has_year(&self, year: i32) -> bool {
        self.records.iter().any(|r| r.year == year)
    }

    pub fn recession_rows(&self) -> Vec<&SalesRecord> {
        self.records.iter().filter(|r| r.recession).collect()
    }

    pub fn rows_for_year(&self, year: i32) -> Vec<&SalesRecord> {
        self.records.iter().filter(|r| r.year == year).collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ReportMode {
    #[serde(rename = "Yearly Statistics")]
    Yearly,
    #[serde(rename = "Recession Period Statistics")]
    Recession,
}

impl ReportMode {
    pub const ALL: [ReportMode; 2] = [ReportMode::Yearly, ReportMode::Recession];

    pub fn label(self) -> &'static str {
        match self {
            ReportMode::Yearly => "Yearly Statistics",
            ReportMode::Recession => "Recession Period Statistics",
        }
    }
}

impl fmt::Display for ReportMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ReportMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s == ReportMode::Yearly.label() || s.eq_ignore_ascii_case("yearly") {
            Ok(ReportMode::Yearly)
        } else if s == ReportMode::Recession.label() || s.eq_ignore_ascii_case("recession") {
            Ok(ReportMode::Recession)
        } else {
            Err(format!("unknown report mode: {s}"))
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportRequest {
    pub mode: ReportMode,
    pub year: Option<i32>,
}

impl ReportRequest {
    pub fn yearly(year: i32) -> Self {
        Self { mode: ReportMode::Yearly, year: Some(year) }
    }

    pub fn recession() -> Self {
        Self { mode: ReportMode::Recession, year: None }
    }
}

/// A column rows can be grouped by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Dimension {
    #[serde(rename = "Year")]
    Year,
    #[serde(rename = "Month")]
    Month,
    #[serde(rename = "Vehicle_Type")]
    VehicleType,
    #[serde(rename = "unemployment_rate")]
    UnemploymentRate,
}

impl Dimension {
    pub fn column(self) -> &'static str {
        match self {
            Dimension::Year => "Year",
            Dimension::Month => "Month",
            Dimension::VehicleType => "Vehicle_Type",
            Dimension::UnemploymentRate => "unemployment_rate",
        }
    }

    /// Group key of a record, `None` when the cell is missing.
    pub fn key(self, r: &SalesRecord) -> Option<KeyValue> {
        match self {
            Dimension::Year => Some(KeyValue::Int(r.year as i64)),
            Dimension::Month => {
                let m = r.month.trim();
                if m.is_empty() {
                    return None;
                }
                Some(match Month::from_str(m) {
                    Ok(month) => KeyValue::Month(month),
                    Err(_) => KeyValue::Text(m.to_string()),
                })
            }
            Dimension::VehicleType => {
                let v = r.vehicle_type.trim();
                if v.is_empty() {
                    None
                } else {
                    Some(KeyValue::Text(v.to_string()))
                }
            }
            Dimension::UnemploymentRate => r.unemployment_rate.map(KeyValue::Number),
        }
    }
}

/// A numeric column that gets aggregated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Measure {
    #[serde(rename = "Automobile_Sales")]
    AutomobileSales,
    #[serde(rename = "Advertising_Expenditure")]
    AdvertisingExpenditure,
}

impl Measure {
    pub fn column(self) -> &'static str {
        match self {
            Measure::AutomobileSales => "Automobile_Sales",
            Measure::AdvertisingExpenditure => "Advertising_Expenditure",
        }
    }

    pub fn value(self, r: &SalesRecord) -> Option<f64> {
        match self {
            Measure::AutomobileSales => r.automobile_sales,
            Measure::AdvertisingExpenditure => r.advertising_expenditure,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Aggregation {
    Mean,
    Sum,
}

/// One group-key cell. Ordering is the natural order of the column:
/// numbers numerically, months by calendar, text lexicographically.
#[derive(Debug, Clone)]
pub enum KeyValue {
    Int(i64),
    Number(f64),
    Month(Month),
    Text(String),
}

impl KeyValue {
    fn rank(&self) -> u8 {
        match self {
            KeyValue::Int(_) => 0,
            KeyValue::Number(_) => 1,
            KeyValue::Month(_) => 2,
            KeyValue::Text(_) => 3,
        }
    }
}

impl Ord for KeyValue {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (KeyValue::Int(a), KeyValue::Int(b)) => a.cmp(b),
            (KeyValue::Number(a), KeyValue::Number(b)) => a.total_cmp(b),
            (KeyValue::Month(a), KeyValue::Month(b)) => {
                a.number_from_month().cmp(&b.number_from_month())
            }
            (KeyValue::Text(a), KeyValue::Text(b)) => a.cmp(b),
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl PartialOrd for KeyValue {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for KeyValue {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for KeyValue {}

impl fmt::Display for KeyValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyValue::Int(v) => write!(f, "{v}"),
            KeyValue::Number(v) => write!(f, "{v}"),
            KeyValue::Month(m) => f.write_str(&m.name()[..3]),
            KeyValue::Text(s) => f.write_str(s),
        }
    }
}

impl Serialize for KeyValue {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            KeyValue::Int(v) => serializer.serialize_i64(*v),
            KeyValue::Number(v) => serializer.serialize_f64(*v),
            KeyValue::Month(_) | KeyValue::Text(_) => serializer.collect_str(self),
        }
    }
}

impl From<&str> for KeyValue {
    fn from(s: &str) -> Self {
        KeyValue::Text(s.to_string())
    }
}

impl From<i32> for KeyValue {
    fn from(v: i32) -> Self {
        KeyValue::Int(v as i64)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AggRow {
    pub keys: Vec<KeyValue>,
    pub value: f64,
}

// Bitwise on `value` so an empty group's NaN mean equals itself.
impl PartialEq for AggRow {
    fn eq(&self, other: &Self) -> bool {
        self.keys == other.keys && self.value.to_bits() == other.value.to_bits()
    }
}

/// Result of a group-by: one row per distinct key tuple, in key order.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AggTable {
    pub dimensions: Vec<Dimension>,
    pub measure: Measure,
    pub aggregation: Aggregation,
    pub rows: Vec<AggRow>,
}

impl AggTable {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn value_for(&self, keys: &[KeyValue]) -> Option<f64> {
        self.rows.iter().find(|r| r.keys == keys).map(|r| r.value)
    }

    /// Sum of all finite values; the denominator for pie shares.
    pub fn total(&self) -> f64 {
        self.rows.iter().map(|r| r.value).filter(|v| v.is_finite()).sum()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    Line,
    Bar,
    Pie,
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ChartKind::Line => "line",
            ChartKind::Bar => "bar",
            ChartKind::Pie => "pie",
        })
    }
}

/// Axis bindings. For pie charts `x` names the slices and `y` sizes them.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Encoding {
    pub x: Dimension,
    pub y: Measure,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub color: Option<Dimension>,
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub labels: BTreeMap<String, String>,
}

impl Encoding {
    pub fn new(x: Dimension, y: Measure) -> Self {
        Self { x, y, color: None, labels: BTreeMap::new() }
    }

    pub fn with_color(mut self, color: Dimension) -> Self {
        self.color = Some(color);
        self
    }

    pub fn with_label(mut self, column: &str, label: &str) -> Self {
        self.labels.insert(column.to_string(), label.to_string());
        self
    }

    /// Display label for a column, falling back to the column name.
    pub fn label_for<'a>(&'a self, column: &'a str) -> &'a str {
        self.labels.get(column).map(String::as_str).unwrap_or(column)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartSpec {
    pub kind: ChartKind,
    pub title: String,
    pub encoding: Encoding,
    pub table: AggTable,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mode_parses_labels_and_short_names() {
        assert_eq!("Yearly Statistics".parse::<ReportMode>(), Ok(ReportMode::Yearly));
        assert_eq!("recession".parse::<ReportMode>(), Ok(ReportMode::Recession));
        assert!("Monthly Statistics".parse::<ReportMode>().is_err());
    }

    #[test]
    fn months_order_by_calendar() {
        let mut keys = vec![
            KeyValue::Month(Month::March),
            KeyValue::Month(Month::January),
            KeyValue::Month(Month::December),
        ];
        keys.sort();
        let shown: Vec<String> = keys.iter().map(|k| k.to_string()).collect();
        assert_eq!(shown, vec!["Jan", "Mar", "Dec"]);
    }

    #[test]
    fn rows_with_nan_means_compare_equal() {
        let row = AggRow { keys: vec![KeyValue::from("Van")], value: f64::NAN };
        assert_eq!(row, row.clone());
        let other = AggRow { keys: vec![KeyValue::from("Van")], value: 1.0 };
        assert_ne!(row, other);
    }

    #[test]
    fn key_values_serialize_as_plain_json() {
        let keys = vec![KeyValue::Int(1980), KeyValue::Number(5.5), KeyValue::from("Sports")];
        let json = serde_json::to_string(&keys).unwrap();
        assert_eq!(json, r#"[1980,5.5,"Sports"]"#);
    }
}
