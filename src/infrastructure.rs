//! Infrastructure layer: SQLite store, listing parser, HTTP source,
//! configuration and logging

pub mod config;
pub mod database_connection;
pub mod http_client;
pub mod logging;
pub mod parsing;
pub mod parsing_error;
pub mod record_repository;
pub mod remote_listing;

// Re-export commonly used items
pub use config::{AppConfig, ConfigManager};
pub use database_connection::DatabaseConnection;
pub use http_client::{HttpClient, HttpClientConfig};
pub use logging::{get_log_directory, init_logging_with_config};
pub use parsing::{ListingLayoutConfig, ListingParser, ParsedPage, ParsingError, ParsingResult};
pub use record_repository::SqliteRecordRepository;
pub use remote_listing::RemoteListingSource;
