//! Error taxonomy for the public mirror operations
//!
//! Caller errors (`InvalidField`, `ArityMismatch`, `ImmutableField`,
//! `InvalidValue`) are always raised before any store access. Structural and
//! fetch errors abort a sync run without rolling back pages already committed.

use thiserror::Error;

use crate::domain::record::ServerCategory;
use crate::infrastructure::parsing_error::ParsingError;

#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Invalid field name '{0}'")]
    InvalidField(String),

    #[error("Field and value counts differ: {fields} fields, {values} values")]
    ArityMismatch { fields: usize, values: usize },

    #[error("Field '{0}' cannot be written")]
    ImmutableField(&'static str),

    #[error("Value '{value}' is not valid for field '{field}'")]
    InvalidValue { field: &'static str, value: String },

    #[error("No record with identifier '{0}'")]
    NotFound(String),

    #[error("Unexpected page structure for {category} page {page}: {source}")]
    ExtractionStructure {
        category: ServerCategory,
        page: u32,
        #[source]
        source: ParsingError,
    },

    #[error("Failed to fetch '{query}': {reason}")]
    Fetch { query: String, reason: String },

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl SyncError {
    /// Caller errors are reported without any store mutation having happened.
    pub fn is_caller_error(&self) -> bool {
        matches!(
            self,
            Self::InvalidField(_)
                | Self::ArityMismatch { .. }
                | Self::ImmutableField(_)
                | Self::InvalidValue { .. }
                | Self::NotFound(_)
        )
    }
}

pub type SyncResult<T> = Result<T, SyncError>;
