//! Diesel-based row store for SQLite.
//!
//! Rows live in a two-column table: the primary key bytes and the full row.
//! SQLite compares BLOBs with `memcmp`, which gives the same byte-lexicographic
//! order as the in-memory store.

use std::path::Path;

use async_trait::async_trait;
use diesel::prelude::*;
use tracing::{debug, info};

use super::diesel_models::{NewRequestRow, RequestRowRecord};
use super::diesel_pool::{create_diesel_pool, run_blocking, SqlitePool};
use super::{RowStore, StoreError, StoreResult};
use crate::hash::HashKey;
use crate::row::RequestRow;
use crate::schema::request_rows;

/// Diesel-based row store with compile-time query checking.
#[derive(Clone)]
pub struct DieselRowStore {
    pool: SqlitePool,
}

impl DieselRowStore {
    /// Create a row store on an existing pool. The table must already exist.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Open (or create) the database at `db_path` and make sure the table exists.
    pub async fn open(db_path: &Path) -> StoreResult<Self> {
        let pool = create_diesel_pool(db_path)?;
        let store = Self::new(pool);
        store.init_schema().await?;
        info!("Opened request row store at {}", db_path.display());
        Ok(store)
    }

    /// Create the row table if it does not exist.
    pub async fn init_schema(&self) -> StoreResult<()> {
        run_blocking(self.pool.clone(), |conn| {
            diesel::sql_query(
                r#"CREATE TABLE IF NOT EXISTS request_rows (
                    url_hash BLOB PRIMARY KEY NOT NULL,
                    row BLOB NOT NULL
                )"#,
            )
            .execute(conn)?;
            Ok(())
        })
        .await?;
        Ok(())
    }

    fn to_row(record: RequestRowRecord) -> StoreResult<RequestRow> {
        let key = String::from_utf8_lossy(&record.url_hash).into_owned();
        let row = RequestRow::try_from(record.row).map_err(|e| StoreError::Corrupt {
            key: key.clone(),
            reason: e.to_string(),
        })?;
        if row.key().as_bytes()[..] != record.url_hash[..] {
            return Err(StoreError::Corrupt {
                key,
                reason: format!("row carries key {}", row.key()),
            });
        }
        Ok(row)
    }
}

#[async_trait]
impl RowStore for DieselRowStore {
    async fn get(&self, key: &HashKey) -> StoreResult<Option<RequestRow>> {
        let key = key.as_bytes().to_vec();
        let record = run_blocking(self.pool.clone(), move |conn| {
            request_rows::table
                .find(&key)
                .select(RequestRowRecord::as_select())
                .first(conn)
                .optional()
        })
        .await?;

        record.map(Self::to_row).transpose()
    }

    async fn put(&self, row: RequestRow) -> StoreResult<()> {
        let key = row.key();
        run_blocking(self.pool.clone(), move |conn| {
            let new_row = NewRequestRow {
                url_hash: key.as_bytes(),
                row: row.as_bytes(),
            };
            // Use replace_into for SQLite upsert
            diesel::replace_into(request_rows::table)
                .values(&new_row)
                .execute(conn)?;
            Ok(())
        })
        .await?;
        debug!("Stored request row {}", key);
        Ok(())
    }

    async fn remove(&self, key: &HashKey) -> StoreResult<bool> {
        let key = key.as_bytes().to_vec();
        let rows = run_blocking(self.pool.clone(), move |conn| {
            diesel::delete(request_rows::table.find(&key)).execute(conn)
        })
        .await?;
        Ok(rows > 0)
    }

    async fn len(&self) -> StoreResult<u64> {
        let count = run_blocking(self.pool.clone(), |conn| {
            use diesel::dsl::count_star;
            request_rows::table.select(count_star()).first::<i64>(conn)
        })
        .await?;
        Ok(count as u64)
    }

    async fn scan(&self, limit: usize) -> StoreResult<Vec<RequestRow>> {
        let limit = i64::try_from(limit).unwrap_or(i64::MAX);
        let records = run_blocking(self.pool.clone(), move |conn| {
            request_rows::table
                .order(request_rows::url_hash.asc())
                .limit(limit)
                .select(RequestRowRecord::as_select())
                .load(conn)
        })
        .await?;

        records.into_iter().map(Self::to_row).collect()
    }
}
