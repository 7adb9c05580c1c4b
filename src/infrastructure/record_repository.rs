//! SQLite implementation of [`RecordRepository`]
//!
//! Column lists are only ever built from [`Field::column`], so dynamic SQL
//! never carries caller text. Values always travel as bound parameters.

use async_trait::async_trait;
use sqlx::query::Query;
use sqlx::sqlite::{SqliteArguments, SqliteRow};
use sqlx::{Row, Sqlite, SqlitePool};

use crate::domain::errors::{SyncError, SyncResult};
use crate::domain::record::{ObservedRecord, OperationalFields, Record, ServerCategory};
use crate::domain::repositories::RecordRepository;
use crate::domain::schema::{Field, FieldKind, FieldValue, parse_flag};

pub struct SqliteRecordRepository {
    pool: SqlitePool,
}

impl SqliteRecordRepository {
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    fn column_list(fields: &[Field]) -> String {
        fields
            .iter()
            .map(|field| format!("\"{}\"", field.column()))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn row_to_record(row: &SqliteRow) -> SyncResult<Record> {
        let label = Self::decode_text(row, Field::Type.column())?;
        let category = label.parse::<ServerCategory>().map_err(|label| {
            sqlx::Error::Decode(format!("unknown server type '{label}'").into())
        })?;
        let source_page = u32::try_from(Self::decode_integer(row, Field::Page.column())?)
            .map_err(|e| sqlx::Error::Decode(Box::new(e)))?;

        Ok(Record {
            ip_address: row.try_get(Field::IpAddress.column())?,
            name: Self::decode_text(row, Field::Name.column())?,
            category,
            source_page,
            admin: Self::decode_bool(row, Field::Admin.column())?,
            owned: Self::decode_bool(row, Field::Owned.column())?,
            operational: OperationalFields {
                minimum_protect: Self::decode_text(row, Field::MinimumProtect.column())?,
                running: Self::decode_text(row, Field::Running.column())?,
                files: Self::decode_text(row, Field::Files.column())?,
                cpu: Self::decode_text(row, Field::Cpu.column())?,
                memory: Self::decode_text(row, Field::Memory.column())?,
                bandwidth: Self::decode_text(row, Field::Bandwidth.column())?,
                last_log: Self::decode_text(row, Field::LastLog.column())?,
                last_updated: Self::decode_text(row, Field::LastUpdated.column())?,
            },
        })
    }

    fn decode_text<I>(row: &SqliteRow, index: I) -> SyncResult<String>
    where
        I: sqlx::ColumnIndex<SqliteRow>,
    {
        let value: Option<String> = row.try_get(index)?;
        Ok(value.unwrap_or_default())
    }

    /// Older stores may hold flags as `'True'`/`'False'` text
    fn decode_bool<I>(row: &SqliteRow, index: I) -> SyncResult<bool>
    where
        I: sqlx::ColumnIndex<SqliteRow> + Copy,
    {
        match row.try_get::<Option<bool>, _>(index) {
            Ok(value) => Ok(value.unwrap_or(false)),
            Err(_) => {
                let text: Option<String> = row.try_get(index)?;
                let Some(text) = text else {
                    return Ok(false);
                };
                parse_flag(&text).ok_or_else(|| {
                    sqlx::Error::Decode(format!("unrecognized flag value '{text}'").into()).into()
                })
            }
        }
    }

    /// Older stores may hold the page number as text
    fn decode_integer<I>(row: &SqliteRow, index: I) -> SyncResult<i64>
    where
        I: sqlx::ColumnIndex<SqliteRow> + Copy,
    {
        match row.try_get::<Option<i64>, _>(index) {
            Ok(value) => Ok(value.unwrap_or_default()),
            Err(_) => {
                let text: Option<String> = row.try_get(index)?;
                Ok(text.and_then(|t| t.trim().parse().ok()).unwrap_or_default())
            }
        }
    }

    fn decode_value(row: &SqliteRow, index: usize, field: Field) -> SyncResult<FieldValue> {
        Ok(match field.kind() {
            FieldKind::Text | FieldKind::Category => {
                FieldValue::Text(Self::decode_text(row, index)?)
            }
            FieldKind::Integer => FieldValue::Integer(Self::decode_integer(row, index)?),
            FieldKind::Boolean => FieldValue::Boolean(Self::decode_bool(row, index)?),
        })
    }

    fn bind_value<'q>(
        query: Query<'q, Sqlite, SqliteArguments<'q>>,
        value: &'q FieldValue,
    ) -> Query<'q, Sqlite, SqliteArguments<'q>> {
        match value {
            FieldValue::Text(text) => query.bind(text.as_str()),
            FieldValue::Integer(number) => query.bind(*number),
            FieldValue::Boolean(flag) => query.bind(*flag),
        }
    }
}

#[async_trait]
impl RecordRepository for SqliteRecordRepository {
    async fn exists(&self, ip_address: &str) -> SyncResult<bool> {
        let row = sqlx::query("SELECT 1 FROM servers WHERE ipAddress = ?")
            .bind(ip_address)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.is_some())
    }

    async fn insert_observed(&self, record: &ObservedRecord) -> SyncResult<()> {
        let defaults = OperationalFields::default();
        sqlx::query(
            r"
            INSERT INTO servers (
                ipAddress, name, type, page, admin, minimum_protect, owned,
                running, files, cpu, memory, bandwidth, lastlog, lastupdated
            )
            VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
            ",
        )
        .bind(&record.ip_address)
        .bind(&record.name)
        .bind(record.category.label())
        .bind(i64::from(record.source_page))
        .bind(record.admin)
        .bind(&defaults.minimum_protect)
        .bind(record.owned)
        .bind(&defaults.running)
        .bind(&defaults.files)
        .bind(&defaults.cpu)
        .bind(&defaults.memory)
        .bind(&defaults.bandwidth)
        .bind(&defaults.last_log)
        .bind(&defaults.last_updated)
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn update_observed(&self, record: &ObservedRecord) -> SyncResult<()> {
        let result = sqlx::query(
            r"
            UPDATE servers
            SET name = ?, type = ?, page = ?, admin = ?, owned = ?
            WHERE ipAddress = ?
            ",
        )
        .bind(&record.name)
        .bind(record.category.label())
        .bind(i64::from(record.source_page))
        .bind(record.admin)
        .bind(record.owned)
        .bind(&record.ip_address)
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(record.ip_address.clone()));
        }
        Ok(())
    }

    async fn find(&self, ip_address: &str) -> SyncResult<Option<Record>> {
        let sql = format!(
            "SELECT {} FROM servers WHERE ipAddress = ?",
            Self::column_list(&Field::ALL)
        );
        let row = sqlx::query(&sql)
            .bind(ip_address)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(Self::row_to_record).transpose()
    }

    async fn read_fields(&self, ip_address: &str, fields: &[Field]) -> SyncResult<Vec<FieldValue>> {
        if fields.is_empty() {
            return if self.exists(ip_address).await? {
                Ok(Vec::new())
            } else {
                Err(SyncError::NotFound(ip_address.to_string()))
            };
        }

        let sql = format!(
            "SELECT {} FROM servers WHERE ipAddress = ?",
            Self::column_list(fields)
        );
        let row = sqlx::query(&sql)
            .bind(ip_address)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| SyncError::NotFound(ip_address.to_string()))?;

        fields
            .iter()
            .enumerate()
            .map(|(index, field)| Self::decode_value(&row, index, *field))
            .collect()
    }

    async fn write_fields(
        &self,
        ip_address: &str,
        assignments: &[(Field, FieldValue)],
    ) -> SyncResult<()> {
        if assignments.is_empty() {
            return if self.exists(ip_address).await? {
                Ok(())
            } else {
                Err(SyncError::NotFound(ip_address.to_string()))
            };
        }

        let set_clause = assignments
            .iter()
            .map(|(field, _)| format!("\"{}\" = ?", field.column()))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!("UPDATE servers SET {set_clause} WHERE ipAddress = ?");

        let mut query = sqlx::query(&sql);
        for (_, value) in assignments {
            query = Self::bind_value(query, value);
        }
        let result = query.bind(ip_address).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(SyncError::NotFound(ip_address.to_string()));
        }
        Ok(())
    }

    async fn list_identifiers(&self) -> SyncResult<Vec<String>> {
        let identifiers: Vec<String> =
            sqlx::query_scalar("SELECT ipAddress FROM servers ORDER BY rowid")
                .fetch_all(&self.pool)
                .await?;
        Ok(identifiers)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::TestDatabase;

    fn observed(ip: &str, name: &str) -> ObservedRecord {
        ObservedRecord {
            ip_address: ip.to_string(),
            name: name.to_string(),
            category: ServerCategory::Private,
            source_page: 2,
            admin: true,
            owned: false,
        }
    }

    #[tokio::test]
    async fn test_insert_sets_operational_defaults() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());

        repo.insert_observed(&observed("10.0.0.1", "Alpha")).await.unwrap();
        let record = repo.find("10.0.0.1").await.unwrap().unwrap();

        assert_eq!(record.name, "Alpha");
        assert_eq!(record.category, ServerCategory::Private);
        assert_eq!(record.source_page, 2);
        assert!(record.admin);
        assert_eq!(record.operational, OperationalFields::default());
        assert!(record.is_never_updated());
    }

    #[tokio::test]
    async fn test_update_leaves_operational_fields_alone() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        repo.insert_observed(&observed("10.0.0.1", "Alpha")).await.unwrap();
        repo.write_fields("10.0.0.1", &[(Field::Cpu, FieldValue::Text("4 GHz".into()))])
            .await
            .unwrap();

        let mut changed = observed("10.0.0.1", "Alpha Prime");
        changed.category = ServerCategory::Secret;
        changed.owned = true;
        repo.update_observed(&changed).await.unwrap();

        let record = repo.find("10.0.0.1").await.unwrap().unwrap();
        assert_eq!(record.name, "Alpha Prime");
        assert_eq!(record.category, ServerCategory::Secret);
        assert!(record.owned);
        assert_eq!(record.operational.cpu, "4 GHz");
    }

    #[tokio::test]
    async fn test_read_fields_in_requested_order() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        repo.insert_observed(&observed("10.0.0.1", "Alpha")).await.unwrap();

        let values = repo
            .read_fields("10.0.0.1", &[Field::LastUpdated, Field::Page, Field::Admin, Field::Type])
            .await
            .unwrap();
        assert_eq!(
            values,
            vec![
                FieldValue::Text("N/A".into()),
                FieldValue::Integer(2),
                FieldValue::Boolean(true),
                FieldValue::Text("Private".into()),
            ]
        );
    }

    #[tokio::test]
    async fn test_missing_record_is_not_found() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());

        assert!(matches!(
            repo.read_fields("10.9.9.9", &[Field::Name]).await,
            Err(SyncError::NotFound(_))
        ));
        assert!(matches!(
            repo.write_fields("10.9.9.9", &[(Field::Cpu, FieldValue::Text("x".into()))]).await,
            Err(SyncError::NotFound(_))
        ));
        assert!(repo.find("10.9.9.9").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_quotes_are_stored_verbatim() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        repo.insert_observed(&observed("10.0.0.1", "O'Brien's \"box\"")).await.unwrap();
        let hostile = FieldValue::Text("'); DROP TABLE servers; --".into());
        repo.write_fields("10.0.0.1", &[(Field::LastLog, hostile)])
            .await
            .unwrap();

        let record = repo.find("10.0.0.1").await.unwrap().unwrap();
        assert_eq!(record.name, "O'Brien's \"box\"");
        assert_eq!(record.operational.last_log, "'); DROP TABLE servers; --");
        assert_eq!(repo.list_identifiers().await.unwrap(), vec!["10.0.0.1"]);
    }

    #[tokio::test]
    async fn test_list_identifiers_in_insertion_order() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        for ip in ["10.0.0.3", "10.0.0.1", "10.0.0.2"] {
            repo.insert_observed(&observed(ip, "x")).await.unwrap();
        }
        assert_eq!(
            repo.list_identifiers().await.unwrap(),
            vec!["10.0.0.3", "10.0.0.1", "10.0.0.2"]
        );
    }

    #[tokio::test]
    async fn test_text_flags_from_older_stores_decode() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        repo.insert_observed(&observed("10.0.0.1", "Alpha")).await.unwrap();
        sqlx::query(
            "UPDATE servers SET admin = 'False', owned = 'True', page = '7' WHERE ipAddress = ?",
        )
        .bind("10.0.0.1")
        .execute(&db.pool())
        .await
        .unwrap();

        let record = repo.find("10.0.0.1").await.unwrap().unwrap();
        assert!(!record.admin);
        assert!(record.owned);
        assert_eq!(record.source_page, 7);

        let values = repo
            .read_fields("10.0.0.1", &[Field::Owned, Field::Admin])
            .await
            .unwrap();
        assert_eq!(values, vec![FieldValue::Boolean(true), FieldValue::Boolean(false)]);
    }

    #[tokio::test]
    async fn test_unrecognized_text_flag_is_a_decode_error() {
        let db = TestDatabase::new().await.unwrap();
        let repo = SqliteRecordRepository::new(db.pool());
        repo.insert_observed(&observed("10.0.0.1", "Alpha")).await.unwrap();
        sqlx::query("UPDATE servers SET admin = 'sometimes' WHERE ipAddress = ?")
            .bind("10.0.0.1")
            .execute(&db.pool())
            .await
            .unwrap();

        assert!(matches!(
            repo.read_fields("10.0.0.1", &[Field::Admin]).await,
            Err(SyncError::Database(sqlx::Error::Decode(_)))
        ));
    }
}
