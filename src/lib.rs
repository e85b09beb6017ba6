//! Automobile sales statistics dashboard.
//!
//! Loads a historical automobile sales CSV once and turns a report selection
//! (yearly or recession statistics, plus a year) into an ordered list of
//! aggregated chart specs. The `auto-sales` binary is a terminal front end
//! over [`dashboard::Dashboard`].

pub mod config;
pub mod dashboard;
pub mod error;
pub mod loader;
pub mod output;
pub mod reports;
pub mod types;
pub mod util;

pub use error::{DashboardError, Result};
pub use reports::{select, select_by_label};
pub use types::{ChartKind, ChartSpec, Dataset, ReportMode, ReportRequest};
