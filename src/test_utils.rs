//! Test utilities for ipdb-mirror
//!
//! In-memory databases, a scripted page source and listing-page fixtures,
//! shared by unit tests and the integration tests under `tests/`.

pub mod fixtures;

use std::collections::{HashMap, HashSet};
use std::sync::{Mutex, PoisonError};

use anyhow::Result;
use async_trait::async_trait;
use sqlx::SqlitePool;

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::services::PageSource;
use crate::infrastructure::DatabaseConnection;

/// Fresh in-memory store with the servers table created
pub struct TestDatabase {
    pub connection: DatabaseConnection,
}

impl TestDatabase {
    pub async fn new() -> Result<Self> {
        let connection = DatabaseConnection::new("sqlite::memory:").await?;
        connection.migrate().await?;
        Ok(Self { connection })
    }

    pub fn pool(&self) -> SqlitePool {
        self.connection.pool().clone()
    }
}

/// Page source serving canned markup by query string.
///
/// Unknown queries get an empty listing page, so a category without
/// scripted pages terminates after one fetch.
#[derive(Default)]
pub struct FakePageSource {
    pages: Mutex<HashMap<String, String>>,
    failures: Mutex<HashSet<String>>,
    fetched: Mutex<Vec<String>>,
}

impl FakePageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_page(&self, query: &str, markup: String) {
        self.pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.to_string(), markup);
    }

    /// Make every fetch of `query` fail
    pub fn fail_on(&self, query: &str) {
        self.failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(query.to_string());
    }

    /// Queries in the order they were fetched
    pub fn fetched(&self) -> Vec<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn clear_fetched(&self) {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

#[async_trait]
impl PageSource for FakePageSource {
    async fn fetch_page(&self, query: &str) -> SyncResult<String> {
        self.fetched
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(query.to_string());

        if self
            .failures
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .contains(query)
        {
            return Err(SyncError::Fetch {
                query: query.to_string(),
                reason: "scripted failure".to_string(),
            });
        }

        let page = self
            .pages
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(query)
            .cloned();
        Ok(page.unwrap_or_else(|| fixtures::standard_page(&[])))
    }
}

#[macro_export]
macro_rules! test_db {
    () => {{
        $crate::test_utils::TestDatabase::new()
            .await
            .expect("Failed to create test database")
    }};
}
