use thiserror::Error;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Dataset is missing required column: {0}")]
    MissingColumn(String),

    #[error("Dataset contains no usable rows")]
    EmptyDataset,
}

pub type Result<T> = std::result::Result<T, DashboardError>;
