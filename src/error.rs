use plotters::drawing::DrawingAreaErrorKind;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PerfError {
    #[error("input file {path} not found")]
    NotFound { path: PathBuf },

    #[error("could not read input: {0}")]
    Io(#[from] std::io::Error),

    #[error("csv header is missing the required column {column:?}")]
    MissingColumn { column: &'static str },

    #[error("invalid record on line {line}: {reason}")]
    InvalidRecord { line: u64, reason: String },

    #[error("could not parse csv: {0}")]
    Csv(#[from] csv::Error),

    #[error("could not render chart: {0}")]
    Render(String),
}

impl<E: std::error::Error + Send + Sync> From<DrawingAreaErrorKind<E>> for PerfError {
    fn from(e: DrawingAreaErrorKind<E>) -> Self {
        PerfError::Render(e.to_string())
    }
}
