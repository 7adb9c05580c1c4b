//! Production [`PageSource`] backed by [`HttpClient`]

use async_trait::async_trait;
use url::Url;

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::services::PageSource;
use crate::infrastructure::http_client::HttpClient;

pub struct RemoteListingSource {
    client: HttpClient,
    base_url: Url,
}

impl RemoteListingSource {
    pub fn new(client: HttpClient, base_url: &str) -> anyhow::Result<Self> {
        let mut base_url = Url::parse(base_url)?;
        // Treat the base as a directory so queries resolve beneath it
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }
        Ok(Self { client, base_url })
    }

    pub fn resolve(&self, query: &str) -> SyncResult<Url> {
        self.base_url.join(query).map_err(|e| SyncError::Fetch {
            query: query.to_string(),
            reason: e.to_string(),
        })
    }
}

#[async_trait]
impl PageSource for RemoteListingSource {
    async fn fetch_page(&self, query: &str) -> SyncResult<String> {
        let url = self.resolve(query)?;
        self.client
            .get_text(url.as_str())
            .await
            .map_err(|e| SyncError::Fetch {
                query: query.to_string(),
                reason: format!("{e:#}"),
            })
    }
}
