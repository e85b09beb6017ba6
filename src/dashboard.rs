//! Selector state and change notification.
//!
//! The dashboard owns the two control values (report mode and year). Every
//! change recomputes the chart list from the read-only dataset and hands it
//! to each subscriber in registration order.

use crate::reports;
use crate::types::{ChartSpec, Dataset, ReportMode, ReportRequest};
use tracing::debug;

type Listener<'a> = Box<dyn FnMut(&ReportRequest, &[ChartSpec]) + 'a>;

pub struct Dashboard<'a> {
    data: &'a Dataset,
    mode: ReportMode,
    year: Option<i32>,
    charts: Vec<ChartSpec>,
    listeners: Vec<Listener<'a>>,
}

impl<'a> Dashboard<'a> {
    /// Starts in yearly mode on the earliest year, like the initial form.
    pub fn new(data: &'a Dataset) -> Self {
        let year = data.years().first().copied();
        let mode = ReportMode::Yearly;
        let charts = reports::select(&ReportRequest { mode, year }, data);
        Self { data, mode, year, charts, listeners: Vec::new() }
    }

    pub fn subscribe<F>(&mut self, listener: F)
    where
        F: FnMut(&ReportRequest, &[ChartSpec]) + 'a,
    {
        self.listeners.push(Box::new(listener));
    }

    pub fn request(&self) -> ReportRequest {
        ReportRequest { mode: self.mode, year: self.year }
    }

    pub fn mode(&self) -> ReportMode {
        self.mode
    }

    pub fn year(&self) -> Option<i32> {
        self.year
    }

    pub fn charts(&self) -> &[ChartSpec] {
        &self.charts
    }

    /// Options for the year selector.
    pub fn year_options(&self) -> Vec<i32> {
        self.data.years()
    }

    /// The year control only applies to the yearly report.
    pub fn year_selector_enabled(&self) -> bool {
        self.mode == ReportMode::Yearly
    }

    pub fn set_mode(&mut self, mode: ReportMode) {
        self.mode = mode;
        self.refresh();
    }

    pub fn set_year(&mut self, year: Option<i32>) {
        self.year = year;
        self.refresh();
    }

    /// Recompute and notify subscribers. Called after every control change.
    pub fn refresh(&mut self) {
        let request = self.request();
        self.charts = reports::select(&request, self.data);
        debug!(listeners = self.listeners.len(), "notifying subscribers");
        for listener in &mut self.listeners {
            listener(&request, &self.charts);
        }
    }
}
