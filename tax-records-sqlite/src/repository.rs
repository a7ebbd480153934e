use std::str::FromStr;

use async_trait::async_trait;
use sqlx::Row;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use tax_core::store::check_update_id;
use tax_core::{IcNumber, RecordStore, StoreError, TaxRecord};
use tracing::info;

use crate::decimal::get_decimal;

pub struct SqliteRecordStore {
    pool: SqlitePool,
}

impl SqliteRecordStore {
    /// Open the database named by `connection_string` and run migrations.
    ///
    /// Accepts a bare file path (created if missing), `:memory:`, or a full
    /// sqlx URL such as `sqlite:records.db?mode=rwc`.
    pub async fn new(connection_string: &str) -> Result<Self, StoreError> {
        let options = connect_options(connection_string)?;
        let pool = SqlitePoolOptions::new()
            // One connection keeps `:memory:` databases alive and serializes writes.
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| StoreError::Connection(e.to_string()))?;

        let store = Self::new_with_pool(pool).await;
        store.run_migrations().await?;
        Ok(store)
    }

    pub async fn new_with_pool(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub async fn run_migrations(&self) -> Result<(), StoreError> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| StoreError::Storage(format!("Failed to run migrations: {e}")))?;
        Ok(())
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }
}

fn connect_options(connection_string: &str) -> Result<SqliteConnectOptions, StoreError> {
    let trimmed = connection_string.trim();
    if trimmed == ":memory:" {
        return SqliteConnectOptions::from_str("sqlite::memory:")
            .map_err(|e| StoreError::Configuration(e.to_string()));
    }
    if trimmed.starts_with("sqlite:") {
        return SqliteConnectOptions::from_str(trimmed)
            .map_err(|e| StoreError::Configuration(e.to_string()));
    }
    if trimmed.is_empty() {
        return Err(StoreError::Configuration(
            "sqlite backend needs a database path".to_string(),
        ));
    }
    Ok(SqliteConnectOptions::new()
        .filename(trimmed)
        .create_if_missing(true))
}

fn storage(e: sqlx::Error) -> StoreError {
    StoreError::Storage(e.to_string())
}

fn row_to_record(row: &SqliteRow) -> Result<TaxRecord, StoreError> {
    let national_identifier: String = row
        .try_get("national_identifier")
        .map_err(storage)?;

    Ok(TaxRecord {
        user_id: row.try_get("id").map_err(storage)?,
        ic_number: IcNumber::from_stored(&national_identifier)
            .map_err(|e| StoreError::Storage(e.to_string()))?,
        annual_income: get_decimal(row, "gross_income")?,
        tax_relief: get_decimal(row, "total_relief")?,
        tax_payable: get_decimal(row, "tax_payable")?,
    })
}

const SELECT_ONE: &str = "SELECT id, national_identifier, gross_income, total_relief, tax_payable
     FROM tax_records WHERE id = ?";

const SELECT_ALL: &str = "SELECT id, national_identifier, gross_income, total_relief, tax_payable
     FROM tax_records ORDER BY seq";

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn exists(
        &self,
        user_id: &str,
    ) -> Result<bool, StoreError> {
        let row = sqlx::query("SELECT 1 FROM tax_records WHERE id = ?")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        Ok(row.is_some())
    }

    async fn get(
        &self,
        user_id: &str,
    ) -> Result<Option<TaxRecord>, StoreError> {
        let row = sqlx::query(SELECT_ONE)
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(storage)?;

        row.as_ref().map(row_to_record).transpose()
    }

    async fn insert(
        &self,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        sqlx::query(
            "INSERT INTO tax_records (
                id, national_identifier, gross_income, total_relief, tax_payable
            ) VALUES (?, ?, ?, ?, ?)",
        )
        .bind(&record.user_id)
        .bind(record.ic_number.as_str())
        .bind(record.annual_income.to_string())
        .bind(record.tax_relief.to_string())
        .bind(record.tax_payable.to_string())
        .execute(&self.pool)
        .await
        .map_err(|e| {
            let duplicate = e
                .as_database_error()
                .is_some_and(|db| db.is_unique_violation());
            if duplicate {
                StoreError::Duplicate(record.user_id.clone())
            } else {
                storage(e)
            }
        })?;

        info!(user_id = %record.user_id, "record inserted");
        Ok(())
    }

    async fn update(
        &self,
        user_id: &str,
        record: &TaxRecord,
    ) -> Result<(), StoreError> {
        check_update_id(user_id, record)?;

        let result = sqlx::query(
            "UPDATE tax_records
             SET national_identifier = ?, gross_income = ?, total_relief = ?, tax_payable = ?
             WHERE id = ?",
        )
        .bind(record.ic_number.as_str())
        .bind(record.annual_income.to_string())
        .bind(record.tax_relief.to_string())
        .bind(record.tax_payable.to_string())
        .bind(user_id)
        .execute(&self.pool)
        .await
        .map_err(storage)?;

        if result.rows_affected() == 0 {
            return Err(StoreError::NotFound(user_id.to_string()));
        }

        info!(user_id, "record updated");
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<TaxRecord>, StoreError> {
        let rows = sqlx::query(SELECT_ALL)
            .fetch_all(&self.pool)
            .await
            .map_err(storage)?;

        rows.iter().map(row_to_record).collect()
    }
}
