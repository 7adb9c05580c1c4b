//! Category-by-category, page-by-page walk over the remote listing
//!
//! Each category starts at page 0 and advances until a page yields no
//! records. Pages are fetched, parsed and reconciled strictly in sequence;
//! a failed fetch or a page that does not match the expected structure ends
//! the run with everything reconciled so far left in place.

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use crate::application::sync_engine::{ReconcileOutcome, SyncEngine};
use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::pagination::{CategoryEntry, ListingPaginator};
use crate::domain::record::{CategoryReport, SyncReport};
use crate::domain::services::PageSource;
use crate::infrastructure::parsing::{ListingParser, ParseContext};

pub struct PaginationDriver {
    source: Arc<dyn PageSource>,
    parser: ListingParser,
    paginator: ListingPaginator,
    categories: Vec<CategoryEntry>,
    max_pages_per_category: Option<u32>,
}

impl PaginationDriver {
    pub fn new(
        source: Arc<dyn PageSource>,
        parser: ListingParser,
        paginator: ListingPaginator,
        categories: Vec<CategoryEntry>,
    ) -> Self {
        Self {
            source,
            parser,
            paginator,
            categories,
            max_pages_per_category: None,
        }
    }

    #[must_use]
    pub fn with_page_limit(mut self, max_pages_per_category: Option<u32>) -> Self {
        self.max_pages_per_category = max_pages_per_category;
        self
    }

    pub async fn sync_all(
        &self,
        engine: &SyncEngine,
        identifier_filter: Option<&str>,
    ) -> SyncResult<SyncReport> {
        let started_at = Utc::now();
        let mut categories = Vec::with_capacity(self.categories.len());

        for entry in &self.categories {
            let report = self.sync_category(engine, entry, identifier_filter).await?;
            categories.push((entry.category, report));
        }

        Ok(SyncReport {
            identifier_filter: identifier_filter.map(str::to_string),
            categories,
            started_at,
            finished_at: Utc::now(),
        })
    }

    pub async fn sync_category(
        &self,
        engine: &SyncEngine,
        entry: &CategoryEntry,
        identifier_filter: Option<&str>,
    ) -> SyncResult<CategoryReport> {
        let category = entry.category;
        let mut report = CategoryReport::default();
        let mut page: u32 = 0;

        info!("Syncing {} listing ({})", category, entry.query_segment);
        loop {
            if self.max_pages_per_category.is_some_and(|limit| page >= limit) {
                warn!("Stopping {} after {} pages (page limit reached)", category, page);
                break;
            }

            let query = self.paginator.query(entry, page);
            let markup = self.source.fetch_page(&query).await?;
            report.pages_fetched += 1;

            let context = ParseContext::new(category, page).with_query(query);
            let parsed = self
                .parser
                .parse_markup(&markup, &context)
                .map_err(|source| SyncError::ExtractionStructure {
                    category,
                    page,
                    source,
                })?;

            if parsed.is_terminal() {
                debug!("{} page {} is empty; category complete", category, page);
                break;
            }

            let mut page_changes = 0;
            for listing_entry in parsed.entries {
                let record = listing_entry.observe(category, page);
                report.records_seen += 1;
                match engine.reconcile(&record, identifier_filter).await? {
                    ReconcileOutcome::Inserted => {
                        report.inserted += 1;
                        page_changes += 1;
                    }
                    ReconcileOutcome::Updated => {
                        report.updated += 1;
                        page_changes += 1;
                    }
                    ReconcileOutcome::Skipped => report.skipped += 1,
                }
            }

            info!(
                "{} page {} ({} layout): {} records written",
                category, page, parsed.layout, page_changes
            );
            page += 1;
        }

        info!(
            "{} complete: {} pages, {} inserted, {} updated, {} skipped",
            category, report.pages_fetched, report.inserted, report.updated, report.skipped
        );
        Ok(report)
    }
}
