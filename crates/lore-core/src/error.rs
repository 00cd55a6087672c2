//! Errors raised by the domain types.

use crate::extraction::ExtractionType;
use crate::types::IngestionStatus;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    /// An extraction lacks a field its type cannot do without.
    #[error("{extraction_type} extraction is missing '{field}'")]
    MissingField {
        extraction_type: ExtractionType,
        field: &'static str,
    },

    #[error("Source cannot move from {from} to {to}")]
    InvalidTransition {
        from: IngestionStatus,
        to: IngestionStatus,
    },
}

pub type Result<T> = std::result::Result<T, Error>;
