//! ipdb-mirror - local SQLite mirror of a paginated remote IP database listing
//!
//! The listing is walked category by category; every row found is inserted
//! or refreshed in the `servers` table. Caller-owned operational columns are
//! read and written through the typed field schema.

pub mod application;
pub mod domain;
pub mod infrastructure;
#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use application::IpDatabase;
pub use domain::{
    Field, FieldEntry, FieldValue, Record, ServerCategory, SyncError, SyncReport, SyncResult,
};
pub use infrastructure::{AppConfig, ConfigManager};
