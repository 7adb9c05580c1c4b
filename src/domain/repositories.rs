//! Repository interface for the mirrored server records

use async_trait::async_trait;

use crate::domain::errors::SyncResult;
use crate::domain::record::{ObservedRecord, Record};
use crate::domain::schema::{Field, FieldValue};

#[async_trait]
pub trait RecordRepository: Send + Sync {
    async fn exists(&self, ip_address: &str) -> SyncResult<bool>;

    /// Insert a first-seen record with default operational fields
    async fn insert_observed(&self, record: &ObservedRecord) -> SyncResult<()>;

    /// Rewrite the sync-owned columns of an existing record
    async fn update_observed(&self, record: &ObservedRecord) -> SyncResult<()>;

    async fn find(&self, ip_address: &str) -> SyncResult<Option<Record>>;

    /// Values in the order of `fields`; `NotFound` when no row matches
    async fn read_fields(&self, ip_address: &str, fields: &[Field]) -> SyncResult<Vec<FieldValue>>;

    /// Single atomic update; `NotFound` when no row matches
    async fn write_fields(
        &self,
        ip_address: &str,
        assignments: &[(Field, FieldValue)],
    ) -> SyncResult<()>;

    async fn list_identifiers(&self) -> SyncResult<Vec<String>>;
}
