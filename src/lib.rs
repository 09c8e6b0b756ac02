//! Frontier - crawl frontier request records and their persistent row format.
//!
//! A [`Request`] describes one URL queued for fetching. Requests are stored as
//! fixed-width binary rows (see [`row`]) keyed by a hash of their URL, in any
//! sorted [`RowStore`](repository::RowStore). Compressed downloads are unwrapped
//! by the parsers in [`parsers`] before content dispatch.

pub mod cli;
pub mod config;
pub mod hash;
pub mod models;
pub mod parsers;
pub mod repository;
pub mod row;
pub mod schema;

pub use config::{Config, Settings};
pub use hash::{hash_url, HashKey, HASH_LENGTH};
pub use models::{Flags, Request, RequestSummary, Status, StatusCode};
pub use parsers::{Cancellation, ContentDispatcher, GzipParser, ParseError, Parser};
pub use repository::{DieselRowStore, MemoryRowStore, RequestStore, RowStore, StoreError};
pub use row::{decode, encode, RequestRow, RowError, ROW_WIDTH};
