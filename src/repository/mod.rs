//! Persistent sorted storage for request rows.
//!
//! A [`RowStore`] only knows about keys and fixed-width rows and orders rows by
//! the raw bytes of their key. [`RequestStore`] sits on top of any store and is
//! the one place where requests are turned into rows and back.

pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_rows;
pub mod memory;
pub mod request_store;

pub use diesel_rows::DieselRowStore;
pub use memory::MemoryRowStore;
pub use request_store::RequestStore;

use async_trait::async_trait;
use thiserror::Error;

use crate::hash::HashKey;
use crate::row::{RequestRow, RowError};

/// Errors that can occur while reading or writing stored rows.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("Connection pool error: {0}")]
    Pool(#[from] diesel::r2d2::PoolError),

    #[error("Row error: {0}")]
    Row(#[from] RowError),

    #[error("Stored row under key {key} is corrupt: {reason}")]
    Corrupt { key: String, reason: String },
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Key-ordered storage of request rows.
///
/// Rows are keyed by their primary key column and iterated in
/// byte-lexicographic key order.
#[async_trait]
pub trait RowStore: Send + Sync {
    /// Fetch the row stored under `key`.
    async fn get(&self, key: &HashKey) -> StoreResult<Option<RequestRow>>;

    /// Insert or replace a row under its own key.
    async fn put(&self, row: RequestRow) -> StoreResult<()>;

    /// Delete the row under `key`. Returns whether a row was removed.
    async fn remove(&self, key: &HashKey) -> StoreResult<bool>;

    /// Number of stored rows.
    async fn len(&self) -> StoreResult<u64>;

    /// Up to `limit` rows in key order.
    async fn scan(&self, limit: usize) -> StoreResult<Vec<RequestRow>>;

    async fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.len().await? == 0)
    }
}
