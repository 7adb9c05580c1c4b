//! Parsing error types for listing-page extraction
//!
//! Every variant describes markup that did not match the expected table
//! structure. None of them are recoverable within a page: a page either
//! yields complete records or an error, never a partial list.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParsingError {
    #[error(
        "Listing table not found at path {path:?} ({layout} layout, {table_count} tables in page)"
    )]
    TableNotFound {
        layout: String,
        path: Vec<usize>,
        table_count: usize,
    },

    #[error("Row {row} has {found} cells, expected at least {expected}")]
    MissingCell {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("Row {row} has no record link: {reason}")]
    MissingRecordLink { row: usize, reason: String },

    #[error("Row {row} link '{href}' carries no identifier: {reason}")]
    MissingIdentifier {
        row: usize,
        href: String,
        reason: String,
    },

    #[error("Invalid CSS selector: {selector} - {reason}")]
    InvalidSelector { selector: String, reason: String },

    #[error("Configuration error: {message}")]
    ConfigurationError { message: String, field: String },
}

impl ParsingError {
    pub fn table_not_found(layout: impl ToString, path: &[usize], table_count: usize) -> Self {
        Self::TableNotFound {
            layout: layout.to_string(),
            path: path.to_vec(),
            table_count,
        }
    }

    pub fn missing_record_link(row: usize, reason: &str) -> Self {
        Self::MissingRecordLink {
            row,
            reason: reason.to_string(),
        }
    }

    pub fn missing_identifier(row: usize, href: &str, reason: &str) -> Self {
        Self::MissingIdentifier {
            row,
            href: href.to_string(),
            reason: reason.to_string(),
        }
    }
}

pub type ParsingResult<T> = Result<T, ParsingError>;
