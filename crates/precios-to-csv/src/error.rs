use std::io;

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),

    #[error("failed to load PDF: {0}")]
    PdfLoad(#[from] lopdf::Error),

    #[error("date tokens {year:04}-{month:02}-{day:02} do not form a calendar date")]
    MalformedDate { year: i32, month: u32, day: u32 },

    #[error("invalid option: {0}")]
    InvalidOption(String),

    #[error("failed to commit output file: {0}")]
    Persist(#[from] tempfile::PersistError),

    #[error("no pages available after applying selection")]
    NoPagesSelected,
}
