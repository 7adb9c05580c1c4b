//! Parsing configuration for listing-page extraction
//!
//! The positional values reproduce the remote site's current markup; they
//! are configuration rather than code so a markup change can be absorbed
//! without a release.

use serde::{Deserialize, Serialize};

use super::ParsingError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ListingLayoutConfig {
    /// Text that switches a page to the extended layout (matched case-insensitively)
    pub extended_marker: String,

    /// Table path for the extended layout. The first index counts every table
    /// in the document, each following index counts tables nested inside the
    /// previous hit, all in document order.
    pub extended_table_path: Vec<usize>,

    /// Table path for the standard layout
    pub standard_table_path: Vec<usize>,

    /// Keep every n-th row of the listing table before trimming header and footer
    pub row_stride: usize,

    /// `&`-separated segment of the record link that carries the identifier
    pub identifier_segment: usize,

    /// Characters to strip from that segment (the parameter name and `=`)
    pub identifier_prefix_len: usize,

    pub name_cell: usize,
    pub admin_cell: usize,
    pub owned_cell: usize,

    /// Exact cell text meaning "admin access"
    pub admin_literal: String,

    /// Exact cell text meaning "this is the player's gateway"
    pub owned_literal: String,

    /// Scan for the listing table by row shape when the positional path
    /// does not resolve
    pub semantic_fallback: bool,
}

impl Default for ListingLayoutConfig {
    fn default() -> Self {
        Self {
            extended_marker: "Remote host web service".to_string(),
            extended_table_path: vec![16],
            standard_table_path: vec![9, 3],
            row_stride: 2,
            identifier_segment: 2,
            identifier_prefix_len: 7,
            name_cell: 5,
            admin_cell: 6,
            owned_cell: 7,
            admin_literal: "Yes".to_string(),
            owned_literal: "Gateway".to_string(),
            semantic_fallback: true,
        }
    }
}

impl ListingLayoutConfig {
    /// Smallest number of `td` descendants a record row must carry
    pub fn required_cells(&self) -> usize {
        self.name_cell.max(self.admin_cell).max(self.owned_cell) + 1
    }

    pub fn validate(&self) -> Result<(), ParsingError> {
        if self.row_stride == 0 {
            return Err(ParsingError::ConfigurationError {
                message: "row stride must be at least 1".to_string(),
                field: "row_stride".to_string(),
            });
        }
        if self.extended_table_path.is_empty() || self.standard_table_path.is_empty() {
            return Err(ParsingError::ConfigurationError {
                message: "table paths must name at least one table".to_string(),
                field: "table_path".to_string(),
            });
        }
        if self.extended_marker.trim().is_empty() {
            return Err(ParsingError::ConfigurationError {
                message: "layout marker cannot be empty".to_string(),
                field: "extended_marker".to_string(),
            });
        }
        Ok(())
    }
}
