//! Shared setup for the facade integration tests
#![allow(dead_code)]

use std::sync::Arc;

use ipdb_mirror::domain::pagination::{CategoryEntry, ListingPaginator, default_category_table};
use ipdb_mirror::test_utils::FakePageSource;
use ipdb_mirror::{AppConfig, IpDatabase};
use tempfile::TempDir;

pub struct Mirror {
    pub database: IpDatabase,
    pub source: Arc<FakePageSource>,
    pub paginator: ListingPaginator,
    _dir: TempDir,
}

impl Mirror {
    pub fn new() -> Self {
        Self::with_url_fn(|dir| format!("sqlite:{}", dir.path().join("mirror.db").display()))
    }

    pub fn with_url_fn(url: impl FnOnce(&TempDir) -> String) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = AppConfig::default();
        config.database.url = url(&dir);
        let source = Arc::new(FakePageSource::new());
        let database = IpDatabase::new(config, source.clone()).unwrap();
        Self {
            database,
            source,
            paginator: ListingPaginator::default(),
            _dir: dir,
        }
    }

    pub fn category(index: usize) -> CategoryEntry {
        default_category_table()[index].clone()
    }

    /// Script page `page` of category `index`
    pub fn serve(&self, index: usize, page: u32, markup: String) {
        let query = self.paginator.query(&Self::category(index), page);
        self.source.add_page(&query, markup);
    }

    pub fn fail(&self, index: usize, page: u32) {
        let query = self.paginator.query(&Self::category(index), page);
        self.source.fail_on(&query);
    }

    pub fn fetches_for(&self, segment: &str) -> usize {
        let marker = format!("a2={segment}&");
        self.source.fetched().iter().filter(|q| q.contains(&marker)).count()
    }
}
