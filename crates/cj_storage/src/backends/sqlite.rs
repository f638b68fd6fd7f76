use async_trait::async_trait;
use cj_core::{Error, InsertOutcome, Observation, ObservationStore, Result};
use sqlx::sqlite::{SqliteConnectOptions, SqliteConnection};
use sqlx::{ConnectOptions, Connection};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS data (
        date TEXT,
        time TEXT,
        abbreviation_canton_and_fl TEXT,
        ncumul_tested INTEGER,
        ncumul_conf INTEGER,
        ncumul_hosp INTEGER,
        ncumul_ICU INTEGER,
        ncumul_vent INTEGER,
        ncumul_released INTEGER,
        ncumul_deceased INTEGER,
        source TEXT,
        UNIQUE(date, time, abbreviation_canton_and_fl)
    )
"#;

const INSERT: &str = r#"
    INSERT INTO data (
        date,
        time,
        abbreviation_canton_and_fl,
        ncumul_tested,
        ncumul_conf,
        ncumul_hosp,
        ncumul_ICU,
        ncumul_vent,
        ncumul_released,
        ncumul_deceased,
        source
    )
    VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
"#;

/// Single-connection SQLite store; the connection is owned for the life of the run.
pub struct SQLiteStorage {
    conn: SqliteConnection,
    db_path: PathBuf,
}

fn storage_error(context: &'static str) -> impl FnOnce(sqlx::Error) -> Error {
    move |e| Error::Storage(format!("{}: {}", context, e))
}

impl SQLiteStorage {
    pub async fn new_with_path(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        if let Some(parent) = db_path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)
                .map_err(|e| Error::Storage(format!("Failed to create database directory: {}", e)))?;
        }

        let conn = SqliteConnectOptions::new()
            .filename(&db_path)
            .create_if_missing(true)
            .connect()
            .await
            .map_err(storage_error("Failed to connect to database"))?;

        debug!("Opened SQLite database at {}", db_path.display());
        Ok(Self { conn, db_path })
    }

    pub fn get_db_path(&self) -> &Path {
        &self.db_path
    }
}

#[async_trait]
impl ObservationStore for SQLiteStorage {
    async fn ensure_schema(&mut self) -> Result<()> {
        sqlx::query(SCHEMA)
            .execute(&mut self.conn)
            .await
            .map_err(storage_error("Failed to create table"))?;
        Ok(())
    }

    async fn insert(&mut self, observation: &Observation) -> Result<InsertOutcome> {
        let mut tx = self.conn
            .begin()
            .await
            .map_err(storage_error("Failed to begin transaction"))?;

        let result = sqlx::query(INSERT)
            .bind(observation.date_string())
            .bind(observation.time_string())
            .bind(&observation.region)
            .bind(observation.tested)
            .bind(observation.confirmed)
            .bind(observation.hospitalized)
            .bind(observation.icu)
            .bind(observation.ventilated)
            .bind(observation.released)
            .bind(observation.deceased)
            .bind(&observation.source)
            .execute(&mut *tx)
            .await;

        // Dropping `tx` on an early return rolls it back.
        match result {
            Ok(_) => {
                tx.commit().await.map_err(storage_error("Failed to commit observation"))?;
                info!("💾 Stored {} {} for {}", observation.date_string(), observation.time_string(), observation.region);
                Ok(InsertOutcome::Inserted)
            }
            Err(sqlx::Error::Database(e)) if e.is_unique_violation() => {
                tx.commit().await.map_err(storage_error("Failed to commit transaction"))?;
                warn!(
                    "Data for {} {} ({}) has already been added",
                    observation.date_string(),
                    observation.time_string(),
                    observation.region
                );
                Ok(InsertOutcome::Duplicate)
            }
            Err(e) => {
                tx.rollback().await.map_err(storage_error("Failed to roll back transaction"))?;
                Err(storage_error("Failed to store observation")(e))
            }
        }
    }

    async fn close(self: Box<Self>) -> Result<()> {
        let Self { conn, db_path } = *self;
        conn.close().await.map_err(storage_error("Failed to close database"))?;
        debug!("Closed SQLite database at {}", db_path.display());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{NaiveDate, NaiveTime};
    use tempfile::tempdir;

    fn observation(hour: u32, confirmed: u32) -> Observation {
        Observation::new(
            NaiveDate::from_ymd_opt(2020, 4, 14).unwrap(),
            NaiveTime::from_hms_opt(hour, 0, 0).unwrap(),
            "JU",
            "https://www.jura.ch/",
        )
        .with_confirmed(confirmed)
    }

    async fn row_count(storage: &mut SQLiteStorage) -> i64 {
        sqlx::query_scalar("SELECT COUNT(*) FROM data")
            .fetch_one(&mut storage.conn)
            .await
            .unwrap()
    }

    async fn open(dir: &tempfile::TempDir) -> SQLiteStorage {
        let mut storage = SQLiteStorage::new_with_path(dir.path().join("data.sqlite")).await.unwrap();
        storage.ensure_schema().await.unwrap();
        storage
    }

    #[tokio::test]
    async fn test_ensure_schema_is_idempotent() {
        let temp_dir = tempdir().unwrap();
        let mut storage = open(&temp_dir).await;
        storage.ensure_schema().await.unwrap();

        let tables: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM sqlite_master WHERE type = 'table' AND name = 'data'")
            .fetch_one(&mut storage.conn)
            .await
            .unwrap();
        assert_eq!(tables, 1);
    }

    #[tokio::test]
    async fn test_schema_columns() {
        let temp_dir = tempdir().unwrap();
        let mut storage = open(&temp_dir).await;

        let columns: Vec<String> = sqlx::query_scalar("SELECT name FROM pragma_table_info('data')")
            .fetch_all(&mut storage.conn)
            .await
            .unwrap();
        assert_eq!(
            columns,
            vec![
                "date",
                "time",
                "abbreviation_canton_and_fl",
                "ncumul_tested",
                "ncumul_conf",
                "ncumul_hosp",
                "ncumul_ICU",
                "ncumul_vent",
                "ncumul_released",
                "ncumul_deceased",
                "source",
            ]
        );
    }

    #[tokio::test]
    async fn test_duplicate_insert_is_skipped() {
        let temp_dir = tempdir().unwrap();
        let mut storage = open(&temp_dir).await;

        assert_eq!(storage.insert(&observation(18, 42)).await.unwrap(), InsertOutcome::Inserted);
        assert_eq!(storage.insert(&observation(18, 43)).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(row_count(&mut storage).await, 1);

        let confirmed: i64 = sqlx::query_scalar("SELECT ncumul_conf FROM data")
            .fetch_one(&mut storage.conn)
            .await
            .unwrap();
        assert_eq!(confirmed, 42);
    }

    #[tokio::test]
    async fn test_different_time_is_a_new_row() {
        let temp_dir = tempdir().unwrap();
        let mut storage = open(&temp_dir).await;

        storage.insert(&observation(8, 40)).await.unwrap();
        storage.insert(&observation(18, 42)).await.unwrap();
        assert_eq!(row_count(&mut storage).await, 2);
    }

    #[tokio::test]
    async fn test_stored_row_layout() {
        let temp_dir = tempdir().unwrap();
        let mut storage = open(&temp_dir).await;
        storage.insert(&observation(8, 42)).await.unwrap();

        let (date, time, region, tested, source): (String, String, String, Option<i64>, String) = sqlx::query_as(
            "SELECT date, time, abbreviation_canton_and_fl, ncumul_tested, source FROM data",
        )
        .fetch_one(&mut storage.conn)
        .await
        .unwrap();

        assert_eq!(date, "2020-04-14");
        assert_eq!(time, "08:00");
        assert_eq!(region, "JU");
        assert_eq!(tested, None);
        assert_eq!(source, "https://www.jura.ch/");
    }

    #[tokio::test]
    async fn test_rows_survive_reopen() {
        let temp_dir = tempdir().unwrap();
        let storage = open(&temp_dir).await;
        let mut storage: Box<SQLiteStorage> = Box::new(storage);
        storage.insert(&observation(18, 42)).await.unwrap();
        storage.close().await.unwrap();

        let mut reopened = open(&temp_dir).await;
        assert_eq!(reopened.insert(&observation(18, 42)).await.unwrap(), InsertOutcome::Duplicate);
        assert_eq!(row_count(&mut reopened).await, 1);
    }

    #[tokio::test]
    async fn test_insert_without_schema_is_a_storage_error() {
        let temp_dir = tempdir().unwrap();
        let mut storage = SQLiteStorage::new_with_path(temp_dir.path().join("empty.sqlite")).await.unwrap();
        assert!(matches!(storage.insert(&observation(18, 42)).await, Err(Error::Storage(_))));
    }

    #[tokio::test]
    async fn test_creates_parent_directory() {
        let temp_dir = tempdir().unwrap();
        let db_path = temp_dir.path().join("nested").join("data.sqlite");
        let storage = SQLiteStorage::new_with_path(&db_path).await.unwrap();
        assert_eq!(storage.get_db_path(), db_path.as_path());
        assert!(db_path.exists());
    }
}
