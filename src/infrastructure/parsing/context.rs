//! Parsing context for listing extraction

use crate::domain::record::ServerCategory;

/// Where the page being parsed came from
#[derive(Debug, Clone)]
pub struct ParseContext {
    pub category: ServerCategory,

    /// Zero-based page offset within the category
    pub page: u32,

    pub query: String,
}

impl ParseContext {
    pub fn new(category: ServerCategory, page: u32) -> Self {
        Self {
            category,
            page,
            query: String::new(),
        }
    }

    pub fn with_query(mut self, query: impl Into<String>) -> Self {
        self.query = query.into();
        self
    }
}
