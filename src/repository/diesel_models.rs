//! Diesel models for the `request_rows` table.
//!
//! A record holds the key bytes and the full fixed-width row. Decoding the row
//! happens in [`crate::row`], not here.

use diesel::prelude::*;

use crate::schema;

/// Stored request row from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::request_rows)]
#[diesel(primary_key(url_hash))]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct RequestRowRecord {
    pub url_hash: Vec<u8>,
    pub row: Vec<u8>,
}

/// New request row for insertion.
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::request_rows)]
pub struct NewRequestRow<'a> {
    pub url_hash: &'a [u8],
    pub row: &'a [u8],
}
