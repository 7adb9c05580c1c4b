//! Per-record reconciliation against the store

use std::sync::Arc;

use tracing::debug;

use crate::domain::errors::SyncResult;
use crate::domain::record::ObservedRecord;
use crate::domain::repositories::RecordRepository;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    Inserted,
    Updated,
    /// Excluded by the identifier filter; the store was not touched
    Skipped,
}

pub struct SyncEngine {
    repository: Arc<dyn RecordRepository>,
}

impl SyncEngine {
    pub fn new(repository: Arc<dyn RecordRepository>) -> Self {
        Self { repository }
    }

    /// Insert a first-seen record or refresh the sync-owned columns of a
    /// known one. Caller-owned columns are never written here.
    pub async fn reconcile(
        &self,
        record: &ObservedRecord,
        identifier_filter: Option<&str>,
    ) -> SyncResult<ReconcileOutcome> {
        if identifier_filter.is_some_and(|filter| filter != record.ip_address) {
            return Ok(ReconcileOutcome::Skipped);
        }

        if self.repository.exists(&record.ip_address).await? {
            self.repository.update_observed(record).await?;
            debug!(
                "Updated {} ({} page {})",
                record.ip_address, record.category, record.source_page
            );
            Ok(ReconcileOutcome::Updated)
        } else {
            self.repository.insert_observed(record).await?;
            debug!(
                "Inserted {} ({} page {})",
                record.ip_address, record.category, record.source_page
            );
            Ok(ReconcileOutcome::Inserted)
        }
    }
}
