// Database connection and schema management for the servers table
// The store is opened per operation and closed when the operation ends

use std::path::Path;
use std::str::FromStr;

use sqlx::SqlitePool;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use tracing::debug;

use crate::domain::errors::SyncResult;

const CREATE_SERVERS_SQL: &str = r"
    CREATE TABLE IF NOT EXISTS servers (
        ipAddress TEXT PRIMARY KEY,
        name TEXT,
        type TEXT,
        page INTEGER,
        admin BOOLEAN,
        minimum_protect TEXT,
        owned BOOLEAN,
        running TEXT,
        files TEXT,
        cpu TEXT,
        memory TEXT,
        bandwidth TEXT,
        lastlog TEXT,
        lastupdated TEXT
    )
";

pub struct DatabaseConnection {
    pool: SqlitePool,
}

impl DatabaseConnection {
    pub async fn new(database_url: &str) -> SyncResult<Self> {
        let options = SqliteConnectOptions::from_str(database_url)?.create_if_missing(true);

        if let Some(parent) = Path::new(options.get_filename()).parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(sqlx::Error::Io)?;
            }
        }

        // One connection keeps in-memory databases coherent across queries
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await?;

        debug!("Opened record store at {}", database_url);
        Ok(Self { pool })
    }

    /// Open the store and make sure the servers table exists
    pub async fn open(database_url: &str) -> SyncResult<Self> {
        let connection = Self::new(database_url).await?;
        connection.migrate().await?;
        Ok(connection)
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn migrate(&self) -> SyncResult<()> {
        sqlx::query(CREATE_SERVERS_SQL).execute(&self.pool).await?;
        Ok(())
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_database_connection_creates_missing_file() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("servers.db");
        let database_url = format!("sqlite:{}", db_path.display());

        let db = DatabaseConnection::new(&database_url).await.unwrap();
        assert!(!db.pool().is_closed());
        assert!(db_path.exists());
        db.close().await;
    }

    #[tokio::test]
    async fn test_database_migration() {
        let db = DatabaseConnection::new("sqlite::memory:").await.unwrap();
        db.migrate().await.unwrap();
        // Running twice is harmless
        db.migrate().await.unwrap();

        let result =
            sqlx::query("SELECT name FROM sqlite_master WHERE type='table' AND name='servers'")
                .fetch_optional(db.pool())
                .await
                .unwrap();
        assert!(result.is_some());
    }
}
