//! Column layout of a stored request row.
//!
//! Columns are laid out back to back in table order with no separators, so a
//! column's offset is the sum of the widths before it.

use crate::hash::HASH_LENGTH;
use crate::models::FLAGS_WIDTH;

/// How a column's bytes are interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Encoding {
    /// Raw key bytes; all zero means null.
    Bytes,
    /// UTF-8 text, zero padded.
    Utf8,
    /// ASCII text, zero padded.
    Ascii,
    /// Unsigned big-endian (base-256) integer.
    Cardinal,
    /// Packed bit set.
    Bitfield,
    /// Kept for slot compatibility, always zero.
    Reserved,
}

/// One column of the row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Column {
    pub name: &'static str,
    pub width: usize,
    pub encoding: Encoding,
}

const fn column(name: &'static str, width: usize, encoding: Encoding) -> Column {
    Column {
        name,
        width,
        encoding,
    }
}

pub const COL_URL_HASH: usize = 0;
pub const COL_INITIATOR: usize = 1;
pub const COL_URL: usize = 2;
pub const COL_REFERRER: usize = 3;
pub const COL_NAME: usize = 4;
pub const COL_APPEARANCE_DATE: usize = 5;
pub const COL_PROFILE: usize = 6;
pub const COL_DEPTH: usize = 7;
pub const COL_PARENT_ANCHORS: usize = 8;
pub const COL_FORK_FACTOR: usize = 9;
pub const COL_FLAGS: usize = 10;
pub const COL_HANDLE: usize = 11;
pub const COL_LOAD_DATE: usize = 12;
pub const COL_LAST_MODIFIED: usize = 13;
pub const COL_SIZE: usize = 14;

/// Number of columns in a request row.
pub const COLUMN_COUNT: usize = 15;

/// The request row, in storage order. Column 0 is the primary key.
pub const REQUEST_COLUMNS: [Column; COLUMN_COUNT] = [
    column("urlhash", HASH_LENGTH, Encoding::Bytes),
    column("initiator", HASH_LENGTH, Encoding::Bytes),
    column("urlstring", 256, Encoding::Utf8),
    column("refhash", HASH_LENGTH, Encoding::Bytes),
    column("urlname", 80, Encoding::Utf8),
    column("appdate", 8, Encoding::Cardinal),
    column("profile", HASH_LENGTH, Encoding::Ascii),
    column("depth", 2, Encoding::Cardinal),
    column("parentbr", 3, Encoding::Cardinal),
    column("forkfactor", 4, Encoding::Cardinal),
    column("flags", FLAGS_WIDTH, Encoding::Bitfield),
    column("handle", 4, Encoding::Reserved),
    column("loaddate", 8, Encoding::Reserved),
    column("lastmodified", 8, Encoding::Reserved),
    column("size", 8, Encoding::Cardinal),
];

/// Byte offset of column `index`; `offset(COLUMN_COUNT)` is the row width.
pub const fn offset(index: usize) -> usize {
    let mut total = 0;
    let mut i = 0;
    while i < index {
        total += REQUEST_COLUMNS[i].width;
        i += 1;
    }
    total
}

/// Total width of a request row in bytes.
pub const ROW_WIDTH: usize = offset(COLUMN_COUNT);

/// Byte range occupied by column `index`.
pub fn range(index: usize) -> std::ops::Range<usize> {
    let start = offset(index);
    start..start + REQUEST_COLUMNS[index].width
}
