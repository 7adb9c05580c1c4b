//! Domain module - records, schema and sync rules
//!
//! Each module is its own file in the domain/ directory; the commonly used
//! items are re-exported here.

pub mod errors;
pub mod pagination;
pub mod record;
pub mod repositories;
pub mod schema;
pub mod services;

pub use errors::{SyncError, SyncResult};
pub use pagination::{CategoryEntry, ListingPaginator, default_category_table};
pub use record::{
    CategoryReport, ListingEntry, NOT_AVAILABLE, ObservedRecord, OperationalFields, Record,
    ServerCategory, SyncReport,
};
pub use repositories::RecordRepository;
pub use schema::{Field, FieldEntry, FieldKind, FieldValue, Ownership};
pub use services::PageSource;
