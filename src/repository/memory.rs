//! In-memory row store.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{RowStore, StoreResult};
use crate::hash::HashKey;
use crate::row::RequestRow;

/// Row store backed by a `BTreeMap`, for tests and short-lived crawls.
#[derive(Debug, Default)]
pub struct MemoryRowStore {
    rows: RwLock<BTreeMap<HashKey, RequestRow>>,
}

impl MemoryRowStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RowStore for MemoryRowStore {
    async fn get(&self, key: &HashKey) -> StoreResult<Option<RequestRow>> {
        Ok(self.rows.read().await.get(key).cloned())
    }

    async fn put(&self, row: RequestRow) -> StoreResult<()> {
        self.rows.write().await.insert(row.key(), row);
        Ok(())
    }

    async fn remove(&self, key: &HashKey) -> StoreResult<bool> {
        Ok(self.rows.write().await.remove(key).is_some())
    }

    async fn len(&self) -> StoreResult<u64> {
        Ok(self.rows.read().await.len() as u64)
    }

    async fn scan(&self, limit: usize) -> StoreResult<Vec<RequestRow>> {
        Ok(self.rows.read().await.values().take(limit).cloned().collect())
    }
}
