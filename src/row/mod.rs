//! Fixed-width binary rows for queued requests.
//!
//! [`layout`] describes the columns, [`codec`] maps a [`Request`] to and from a
//! [`RequestRow`]. Neither keeps state or touches I/O.
//!
//! [`Request`]: crate::models::Request

pub mod codec;
pub mod layout;

pub use codec::{decode, decode_cardinal, encode, encode_cardinal};
pub use layout::{Column, Encoding, COLUMN_COUNT, REQUEST_COLUMNS, ROW_WIDTH};

use thiserror::Error;

use crate::hash::HashKey;

/// Errors raised while encoding or decoding a row.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RowError {
    #[error("row is {actual} bytes, expected {expected}")]
    WidthMismatch { expected: usize, actual: usize },

    #[error("required column {0} is null")]
    MissingColumn(&'static str),

    #[error("column {0} is not valid UTF-8")]
    InvalidText(&'static str),

    #[error("invalid url {url:?}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("column {column} holds {width} bytes, value needs {len}")]
    FieldTooLong {
        column: &'static str,
        len: usize,
        width: usize,
    },

    #[error("value {value} does not fit {width}-byte column {column}")]
    Overflow {
        column: &'static str,
        value: u64,
        width: usize,
    },

    #[error("negative value {value} in unsigned column {column}")]
    NegativeValue { column: &'static str, value: i64 },
}

/// One encoded request, exactly [`ROW_WIDTH`] bytes.
#[derive(Clone, PartialEq, Eq)]
pub struct RequestRow(Vec<u8>);

impl RequestRow {
    pub(crate) fn zeroed() -> Self {
        Self(vec![0; ROW_WIDTH])
    }

    /// Primary key of the row.
    pub fn key(&self) -> HashKey {
        HashKey::from_slice(self.column(layout::COL_URL_HASH))
    }

    /// Bytes of column `index`.
    pub fn column(&self, index: usize) -> &[u8] {
        &self.0[layout::range(index)]
    }

    pub(crate) fn column_mut(&mut self, index: usize) -> &mut [u8] {
        &mut self.0[layout::range(index)]
    }

    /// True when column `index` is entirely zero.
    pub fn is_null(&self, index: usize) -> bool {
        self.column(index).iter().all(|&b| b == 0)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.0
    }
}

impl TryFrom<Vec<u8>> for RequestRow {
    type Error = RowError;

    fn try_from(bytes: Vec<u8>) -> Result<Self, Self::Error> {
        if bytes.len() != ROW_WIDTH {
            return Err(RowError::WidthMismatch {
                expected: ROW_WIDTH,
                actual: bytes.len(),
            });
        }
        Ok(Self(bytes))
    }
}

impl TryFrom<&[u8]> for RequestRow {
    type Error = RowError;

    fn try_from(bytes: &[u8]) -> Result<Self, Self::Error> {
        Self::try_from(bytes.to_vec())
    }
}

impl AsRef<[u8]> for RequestRow {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::fmt::Debug for RequestRow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestRow")
            .field("key", &self.key())
            .field("width", &self.0.len())
            .finish()
    }
}
