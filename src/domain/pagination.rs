//! Listing pagination rules.
//!
//! - category table: which query segment each category is listed under
//! - page offset → listing start index (`offset * page_size`)
//! - query string construction for the page source

use serde::{Deserialize, Serialize};

use crate::domain::record::ServerCategory;

pub const DEFAULT_PAGE_SIZE: u32 = 20;

/// One row of the category table iterated by a full sync
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CategoryEntry {
    pub category: ServerCategory,
    pub query_segment: String,
}

impl CategoryEntry {
    pub fn new(category: ServerCategory, query_segment: &str) -> Self {
        Self {
            category,
            query_segment: query_segment.to_string(),
        }
    }
}

/// Categories in sync order
pub fn default_category_table() -> Vec<CategoryEntry> {
    vec![
        CategoryEntry::new(ServerCategory::Public, "pub"),
        CategoryEntry::new(ServerCategory::Private, "priv"),
        CategoryEntry::new(ServerCategory::Secret, "sec"),
    ]
}

#[derive(Debug, Clone)]
pub struct ListingPaginator {
    listing_path: String,
    page_size: u32,
}

impl Default for ListingPaginator {
    fn default() -> Self {
        Self {
            listing_path: "index.php".to_string(),
            page_size: DEFAULT_PAGE_SIZE,
        }
    }
}

impl ListingPaginator {
    pub fn new(listing_path: impl Into<String>, page_size: u32) -> Self {
        Self {
            listing_path: listing_path.into(),
            page_size,
        }
    }

    /// Index of the first listing row shown on a zero-based page offset
    pub const fn start_index(&self, page: u32) -> u32 {
        page.saturating_mul(self.page_size)
    }

    /// Query string the page source is asked for
    pub fn query(&self, entry: &CategoryEntry, page: u32) -> String {
        format!(
            "{}?action=ip_db&a2={}&_o={}",
            self.listing_path,
            entry.query_segment,
            self.start_index(page)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_encodes_segment_and_offset() {
        let paginator = ListingPaginator::default();
        let entry = CategoryEntry::new(ServerCategory::Private, "priv");
        assert_eq!(paginator.query(&entry, 0), "index.php?action=ip_db&a2=priv&_o=0");
        assert_eq!(paginator.query(&entry, 3), "index.php?action=ip_db&a2=priv&_o=60");
    }

    #[test]
    fn test_default_table_order() {
        let table = default_category_table();
        let order: Vec<_> = table.iter().map(|e| e.category).collect();
        assert_eq!(
            order,
            vec![ServerCategory::Public, ServerCategory::Private, ServerCategory::Secret]
        );
        assert_eq!(table[2].query_segment, "sec");
    }

    #[test]
    fn test_start_index_saturates() {
        let paginator = ListingPaginator::new("index.php", 20);
        assert_eq!(paginator.start_index(u32::MAX), u32::MAX);
    }
}
