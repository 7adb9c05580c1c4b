//! Collaborator interfaces used by the sync engine

use async_trait::async_trait;

use crate::domain::errors::SyncResult;

/// Source of rendered listing pages
#[async_trait]
pub trait PageSource: Send + Sync {
    /// Fetch the markup for a listing query such as
    /// `index.php?action=ip_db&a2=pub&_o=20`
    async fn fetch_page(&self, query: &str) -> SyncResult<String>;
}
