//! Public operations of the mirror
//!
//! Every operation opens its own store connection, runs, and closes it.
//! Field names and values are validated before the store is opened, so a
//! caller error never reaches the database.

use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use crate::application::pagination_driver::PaginationDriver;
use crate::application::sync_engine::SyncEngine;
use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::pagination::ListingPaginator;
use crate::domain::record::{Record, SyncReport};
use crate::domain::repositories::RecordRepository;
use crate::domain::schema::{Field, FieldValue, Ownership};
use crate::domain::services::PageSource;
use crate::infrastructure::config::AppConfig;
use crate::infrastructure::database_connection::DatabaseConnection;
use crate::infrastructure::http_client::{HttpClient, HttpClientConfig};
use crate::infrastructure::parsing::ListingParser;
use crate::infrastructure::record_repository::SqliteRecordRepository;
use crate::infrastructure::remote_listing::RemoteListingSource;

pub struct IpDatabase {
    config: AppConfig,
    parser: ListingParser,
    source: Arc<dyn PageSource>,
}

impl IpDatabase {
    pub fn new(config: AppConfig, source: Arc<dyn PageSource>) -> anyhow::Result<Self> {
        config.validate()?;
        let parser = ListingParser::with_config(config.parsing.clone())
            .context("Failed to build listing parser")?;
        Ok(Self {
            config,
            parser,
            source,
        })
    }

    /// Production wiring: HTTP page source against `remote.base_url`
    pub fn from_config(config: AppConfig) -> anyhow::Result<Self> {
        let client = HttpClient::new(HttpClientConfig::from(&config.http))?;
        let source = RemoteListingSource::new(client, &config.remote.base_url)
            .with_context(|| format!("Invalid base URL {}", config.remote.base_url))?;
        Self::new(config, Arc::new(source))
    }

    async fn open_store(&self) -> SyncResult<(DatabaseConnection, SqliteRecordRepository)> {
        let connection = DatabaseConnection::open(&self.config.database.url).await?;
        let repository = SqliteRecordRepository::new(connection.pool().clone());
        Ok((connection, repository))
    }

    fn build_driver(&self) -> PaginationDriver {
        let paginator = ListingPaginator::new(
            self.config.remote.listing_path.clone(),
            self.config.remote.page_size,
        );
        PaginationDriver::new(
            self.source.clone(),
            self.parser.clone(),
            paginator,
            self.config.remote.categories.clone(),
        )
        .with_page_limit(self.config.remote.max_pages_per_category)
    }

    /// Mirror every category of the listing. With a filter, only the record
    /// carrying that identifier is written, but the whole listing is walked.
    pub async fn sync_all(&self, identifier_filter: Option<&str>) -> SyncResult<SyncReport> {
        let driver = self.build_driver();
        let (connection, repository) = self.open_store().await?;
        let engine = SyncEngine::new(Arc::new(repository));

        let result = driver.sync_all(&engine, identifier_filter).await;
        connection.close().await;

        let report = result?;
        info!(
            "Sync finished: {} pages, {} inserted, {} updated",
            report.total_pages_fetched(),
            report.total_inserted(),
            report.total_updated()
        );
        Ok(report)
    }

    /// Read named fields of one record in the order given; an empty name
    /// list means every field in schema order
    pub async fn get_fields<S: AsRef<str>>(
        &self,
        ip_address: &str,
        field_names: &[S],
    ) -> SyncResult<Vec<(Field, FieldValue)>> {
        let fields = if field_names.is_empty() {
            Field::ALL.to_vec()
        } else {
            Field::parse_all(field_names)?
        };

        let (connection, repository) = self.open_store().await?;
        let result = repository.read_fields(ip_address, &fields).await;
        connection.close().await;

        Ok(fields.into_iter().zip(result?).collect())
    }

    /// Write caller-supplied values in one atomic update. Checks run in
    /// order: counts, names, key immutability, value parsing.
    pub async fn set_fields<S: AsRef<str>, V: AsRef<str>>(
        &self,
        ip_address: &str,
        field_names: &[S],
        values: &[V],
    ) -> SyncResult<()> {
        let assignments = Self::validate_assignments(field_names, values)?;

        let (connection, repository) = self.open_store().await?;
        let result = repository.write_fields(ip_address, &assignments).await;
        connection.close().await;
        result
    }

    fn validate_assignments<S: AsRef<str>, V: AsRef<str>>(
        field_names: &[S],
        values: &[V],
    ) -> SyncResult<Vec<(Field, FieldValue)>> {
        if field_names.len() != values.len() {
            return Err(SyncError::ArityMismatch {
                fields: field_names.len(),
                values: values.len(),
            });
        }

        let fields = Field::parse_all(field_names)?;
        if let Some(key) = fields.iter().find(|f| f.ownership() == Ownership::Key) {
            return Err(SyncError::ImmutableField(key.column()));
        }

        fields
            .into_iter()
            .zip(values)
            .map(|(field, raw)| Ok((field, FieldValue::parse_for(field, raw.as_ref())?)))
            .collect()
    }

    pub async fn list_all_identifiers(&self) -> SyncResult<Vec<String>> {
        let (connection, repository) = self.open_store().await?;
        let result = repository.list_identifiers().await;
        connection.close().await;
        result
    }

    /// Whole typed record; `NotFound` when absent
    pub async fn fetch_record(&self, ip_address: &str) -> SyncResult<Record> {
        let (connection, repository) = self.open_store().await?;
        let result = repository.find(ip_address).await;
        connection.close().await;
        result?.ok_or_else(|| SyncError::NotFound(ip_address.to_string()))
    }
}
