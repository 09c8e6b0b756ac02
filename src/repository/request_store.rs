//! Requests on top of a row store.

use tracing::{debug, warn};

use super::{RowStore, StoreResult};
use crate::hash::HashKey;
use crate::models::Request;
use crate::row::{decode, encode};

/// Stores requests as rows in any [`RowStore`].
///
/// Requests are keyed by their frozen identity, so a redirected request
/// overwrites its own row instead of forking a new one.
pub struct RequestStore<S> {
    rows: S,
}

impl<S: RowStore> RequestStore<S> {
    pub fn new(rows: S) -> Self {
        Self { rows }
    }

    /// The underlying row store.
    pub fn rows(&self) -> &S {
        &self.rows
    }

    /// Insert or replace a request.
    pub async fn put(&self, request: &Request) -> StoreResult<()> {
        let row = encode(request)?;
        debug!("Queueing {} as {}", request.url(), request.url_hash());
        self.rows.put(row).await
    }

    /// Load the request stored under `key`.
    pub async fn get(&self, key: &HashKey) -> StoreResult<Option<Request>> {
        match self.rows.get(key).await? {
            Some(row) => Ok(Some(decode(row.as_bytes())?)),
            None => Ok(None),
        }
    }

    /// Whether a request with this identity is stored.
    pub async fn contains(&self, key: &HashKey) -> StoreResult<bool> {
        Ok(self.rows.get(key).await?.is_some())
    }

    /// Remove a request once its owner has finished with it.
    pub async fn remove(&self, key: &HashKey) -> StoreResult<bool> {
        self.rows.remove(key).await
    }

    pub async fn len(&self) -> StoreResult<u64> {
        self.rows.len().await
    }

    pub async fn is_empty(&self) -> StoreResult<bool> {
        self.rows.is_empty().await
    }

    /// Up to `limit` requests in key order.
    ///
    /// Rows that no longer decode are skipped and logged rather than failing
    /// the whole listing.
    pub async fn list(&self, limit: usize) -> StoreResult<Vec<Request>> {
        let rows = self.rows.scan(limit).await?;
        let mut requests = Vec::with_capacity(rows.len());
        for row in rows {
            match decode(row.as_bytes()) {
                Ok(request) => requests.push(request),
                Err(e) => warn!("Skipping undecodable row {}: {}", row.key(), e),
            }
        }
        Ok(requests)
    }
}
