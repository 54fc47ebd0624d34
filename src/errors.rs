use thiserror::Error;

/// The unified error type for the per-symbol chart pipeline.
///
/// Every variant is fatal for the symbol being processed and for that
/// symbol only; the batch driver reports it and moves on.
#[derive(Debug, Error)]
pub enum Error {
    /// A required OHLCV column is absent from an input file.
    #[error("required column '{0}' not found in CSV")]
    MissingColumn(&'static str),

    /// The input file exists but yielded zero usable rows after cleaning.
    #[error("no usable rows after cleaning")]
    EmptySeries,

    /// Composing or persisting a chart image failed.
    #[error("render failed: {0}")]
    Render(String),

    /// The input file could not be opened or read as CSV.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
