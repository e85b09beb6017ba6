use crate::types::ReportMode;
use clap::Parser;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

pub const DEFAULT_DATA_URL: &str = "https://cf-courses-data.s3.us.cloud-object-storage.appdomain.cloud/IBMDeveloperSkillsNetwork-DV0101EN-SkillsNetwork/Data%20Files/historical_automobile_sales.csv";

pub const DASHBOARD_TITLE: &str = "Automobile Sales Statistics Dashboard";

/// Where the sales CSV comes from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataSource {
    Path(PathBuf),
    Url(String),
}

impl FromStr for DataSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err("data source must not be empty".to_string());
        }
        if s.starts_with("http://") || s.starts_with("https://") {
            Ok(DataSource::Url(s.to_string()))
        } else {
            Ok(DataSource::Path(PathBuf::from(s)))
        }
    }
}

impl fmt::Display for DataSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DataSource::Path(p) => write!(f, "{}", p.display()),
            DataSource::Url(u) => f.write_str(u),
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "auto-sales", version, about = "Automobile sales statistics dashboard")]
pub struct Cli {
    /// CSV file path or http(s) URL of the sales dataset
    #[arg(long, env = "AUTO_SALES_DATA", default_value = DEFAULT_DATA_URL)]
    pub data: DataSource,

    /// Report to render once and exit (yearly | recession); omit for the interactive menu
    #[arg(long)]
    pub mode: Option<ReportMode>,

    /// Year for the yearly report
    #[arg(long)]
    pub year: Option<i32>,

    /// Write charts.json and one CSV per chart into this directory
    #[arg(long)]
    pub export_dir: Option<PathBuf>,

    /// Maximum table rows printed per chart
    #[arg(long, default_value_t = 10)]
    pub preview_rows: usize,
}
