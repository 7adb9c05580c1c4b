//! Application layer module
//!
//! Orchestrates the domain rules over the store and the page source:
//! per-record reconciliation, the pagination walk, and the public facade.

pub mod pagination_driver;
pub mod sync_engine;
pub mod use_cases;

pub use pagination_driver::PaginationDriver;
pub use sync_engine::{ReconcileOutcome, SyncEngine};
pub use use_cases::IpDatabase;
