//! Error types for the xyscan library

use thiserror::Error;

#[derive(Error, Debug)]
pub enum XyError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("htslib error: {0}")]
    Htslib(#[from] rust_htslib::errors::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Chromosome '{0}' not found in alignment header")]
    UnknownChromosome(String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Threshold validation error: {field} must be between {min} and {max}, got {value}")]
    ThresholdValidation {
        field: String,
        min: f64,
        max: f64,
        value: f64,
    },

    #[error("Plot error: {0}")]
    Plot(String),
}

pub type Result<T> = std::result::Result<T, XyError>;
