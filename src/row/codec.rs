//! Encoding and decoding of request rows.
//!
//! Text that does not fill its column is padded with zero bytes and the first
//! zero byte ends it on the way back. URLs longer than their column are
//! rejected; anchor names are cut to the longest UTF-8 prefix that fits.

use url::Url;

use super::layout::*;
use super::{RequestRow, RowError};
use crate::hash::{canonicalize, HashKey};
use crate::models::request::STATUS_LOADED_ROW;
use crate::models::{Flags, Request, Status, StatusCode, FLAGS_WIDTH};

/// Encode `value` as a `width`-byte big-endian integer.
///
/// Returns `None` if the value needs more than `width` bytes.
pub fn encode_cardinal(value: u64, width: usize) -> Option<Vec<u8>> {
    assert!(width <= 8, "cardinal width {} exceeds 8 bytes", width);
    if width < 8 && value >> (width * 8) != 0 {
        return None;
    }
    Some(value.to_be_bytes()[8 - width..].to_vec())
}

/// Decode a big-endian integer of up to 8 bytes.
pub fn decode_cardinal(bytes: &[u8]) -> u64 {
    bytes.iter().fold(0u64, |acc, &b| (acc << 8) | u64::from(b))
}

fn put_cardinal(row: &mut RequestRow, index: usize, value: u64) -> Result<(), RowError> {
    let column = &REQUEST_COLUMNS[index];
    let bytes = encode_cardinal(value, column.width).ok_or(RowError::Overflow {
        column: column.name,
        value,
        width: column.width,
    })?;
    row.column_mut(index).copy_from_slice(&bytes);
    Ok(())
}

fn put_text(row: &mut RequestRow, index: usize, text: &[u8]) -> Result<(), RowError> {
    let column = &REQUEST_COLUMNS[index];
    if text.len() > column.width {
        return Err(RowError::FieldTooLong {
            column: column.name,
            len: text.len(),
            width: column.width,
        });
    }
    row.column_mut(index)[..text.len()].copy_from_slice(text);
    Ok(())
}

fn put_key(row: &mut RequestRow, index: usize, key: Option<&HashKey>) {
    if let Some(key) = key {
        row.column_mut(index).copy_from_slice(key.as_bytes());
    }
}

/// Longest prefix of `s` that is at most `max` bytes and ends on a char boundary.
fn truncate_utf8(s: &str, max: usize) -> &str {
    if s.len() <= max {
        return s;
    }
    let mut end = max;
    while !s.is_char_boundary(end) {
        end -= 1;
    }
    &s[..end]
}

/// Encode a request into its row.
///
/// The three reserved columns are always written as zero. Fails when a value
/// is negative or too large for its column, or when the URL is longer than
/// the URL column.
pub fn encode(request: &Request) -> Result<RequestRow, RowError> {
    let mut row = RequestRow::zeroed();

    put_key(&mut row, COL_URL_HASH, Some(&request.url_hash));
    put_key(&mut row, COL_INITIATOR, request.initiator.as_ref());
    put_text(&mut row, COL_URL, request.url.as_str().as_bytes())?;
    put_key(&mut row, COL_REFERRER, request.referrer_hash.as_ref());

    let name = truncate_utf8(&request.name, REQUEST_COLUMNS[COL_NAME].width);
    put_text(&mut row, COL_NAME, name.as_bytes())?;

    let appearance = u64::try_from(request.appearance_millis).map_err(|_| {
        RowError::NegativeValue {
            column: REQUEST_COLUMNS[COL_APPEARANCE_DATE].name,
            value: request.appearance_millis,
        }
    })?;
    put_cardinal(&mut row, COL_APPEARANCE_DATE, appearance)?;

    if let Some(handle) = &request.profile_handle {
        put_text(&mut row, COL_PROFILE, handle.as_bytes())?;
    }

    put_cardinal(&mut row, COL_DEPTH, u64::from(request.depth))?;
    put_cardinal(&mut row, COL_PARENT_ANCHORS, u64::from(request.parent_anchor_count))?;
    put_cardinal(&mut row, COL_FORK_FACTOR, u64::from(request.fork_factor))?;
    row.column_mut(COL_FLAGS).copy_from_slice(request.flags.bytes());
    put_cardinal(&mut row, COL_SIZE, request.size)?;

    Ok(row)
}

/// Text up to the first zero byte.
fn text_bytes(bytes: &[u8]) -> &[u8] {
    let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
    &bytes[..end]
}

fn get_key(row: &RequestRow, index: usize) -> Option<HashKey> {
    if row.is_null(index) {
        None
    } else {
        Some(HashKey::from_slice(row.column(index)))
    }
}

fn get_u32(row: &RequestRow, index: usize) -> u32 {
    // Every u32 column is at most 4 bytes wide.
    decode_cardinal(row.column(index)) as u32
}

/// Rebuild a request from its row.
///
/// The identity key is taken from the primary key column rather than derived
/// from the stored URL, so a request persisted after a redirect keeps its
/// original identity. Fails if the key or URL column is null, or if the URL
/// cannot be parsed.
pub fn decode(bytes: &[u8]) -> Result<Request, RowError> {
    let row = RequestRow::try_from(bytes)?;

    let url_hash = get_key(&row, COL_URL_HASH)
        .ok_or(RowError::MissingColumn(REQUEST_COLUMNS[COL_URL_HASH].name))?;

    let url_column = REQUEST_COLUMNS[COL_URL].name;
    let url_bytes = text_bytes(row.column(COL_URL));
    if url_bytes.is_empty() {
        return Err(RowError::MissingColumn(url_column));
    }
    let url_str = std::str::from_utf8(url_bytes).map_err(|_| RowError::InvalidText(url_column))?;
    let url = Url::parse(url_str).map_err(|e| RowError::InvalidUrl {
        url: url_str.to_string(),
        reason: e.to_string(),
    })?;

    let name = String::from_utf8_lossy(text_bytes(row.column(COL_NAME))).into_owned();

    let appearance = decode_cardinal(row.column(COL_APPEARANCE_DATE));
    let appearance_millis = i64::try_from(appearance).map_err(|_| RowError::Overflow {
        column: REQUEST_COLUMNS[COL_APPEARANCE_DATE].name,
        value: appearance,
        width: 8,
    })?;

    let profile_handle =
        String::from_utf8_lossy(text_bytes(row.column(COL_PROFILE))).into_owned();

    let mut flags = [0u8; FLAGS_WIDTH];
    flags.copy_from_slice(row.column(COL_FLAGS));

    Ok(Request {
        url_hash,
        initiator: get_key(&row, COL_INITIATOR),
        url: canonicalize(url),
        referrer_hash: get_key(&row, COL_REFERRER),
        name,
        appearance_millis,
        profile_handle: (!profile_handle.is_empty()).then_some(profile_handle),
        depth: get_u32(&row, COL_DEPTH),
        parent_anchor_count: get_u32(&row, COL_PARENT_ANCHORS),
        fork_factor: get_u32(&row, COL_FORK_FACTOR),
        flags: Flags::from_bytes(flags),
        size: decode_cardinal(row.column(COL_SIZE)),
        status: Status::new(STATUS_LOADED_ROW, StatusCode::INITIATED),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::{hash_url, HASH_LENGTH};
    use chrono::{TimeZone, Utc};

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    fn full_request() -> Request {
        let mut flags = Flags::new();
        flags.set(3, true);
        flags.set(17, true);
        Request::create(
            Some(&b"peerhash0001"[..]),
            url("https://example.com/reading-room/doc.pdf"),
            Some(hash_url(&url("https://example.com/reading-room/"))),
            Some("Annual report"),
            Some(Utc.timestamp_millis_opt(1_700_000_000_000).unwrap()),
            Some("profile00001"),
            4,
            120,
            9_000,
            1_048_576,
        )
        .with_flags(flags)
    }

    #[test]
    fn test_cardinal_big_endian() {
        assert_eq!(encode_cardinal(0x0102, 2), Some(vec![0x01, 0x02]));
        assert_eq!(encode_cardinal(0xFF_FFFF, 3), Some(vec![0xFF, 0xFF, 0xFF]));
        assert_eq!(encode_cardinal(0x100_0000, 3), None);
        assert_eq!(encode_cardinal(u64::MAX, 8), Some(vec![0xFF; 8]));
        assert_eq!(decode_cardinal(&[0x01, 0x02, 0x03]), 0x010203);
        assert_eq!(decode_cardinal(&[]), 0);
    }

    #[test]
    fn test_roundtrip_all_fields() {
        let original = full_request();
        let row = encode(&original).unwrap();
        assert_eq!(row.as_bytes().len(), ROW_WIDTH);

        let decoded = decode(row.as_bytes()).unwrap();
        assert_eq!(decoded.url_hash(), original.url_hash());
        assert_eq!(decoded.initiator(), original.initiator());
        assert_eq!(decoded.url(), original.url());
        assert_eq!(decoded.referrer_hash(), original.referrer_hash());
        assert_eq!(decoded.name(), original.name());
        assert_eq!(decoded.appearance_date(), original.appearance_date());
        assert_eq!(decoded.profile_handle(), original.profile_handle());
        assert_eq!(decoded.depth(), 4);
        assert_eq!(decoded.parent_anchor_count(), 120);
        assert_eq!(decoded.fork_factor(), 9_000);
        assert_eq!(decoded.flags(), original.flags());
        assert_eq!(decoded.size(), 1_048_576);
        assert_eq!(decoded.status().message(), STATUS_LOADED_ROW);
    }

    #[test]
    fn test_roundtrip_minimal_request() {
        let original = Request::new(url("https://example.com/"));
        let decoded = decode(encode(&original).unwrap().as_bytes()).unwrap();
        assert!(decoded.initiator().is_none());
        assert!(decoded.referrer_hash().is_none());
        assert_eq!(decoded.name(), "");
        assert!(decoded.appearance_date().is_none());
        assert!(decoded.try_profile_handle().is_none());
        assert_eq!(decoded.size(), 0);
    }

    #[test]
    fn test_layout_is_bit_exact() {
        let request = full_request();
        let row = encode(&request).unwrap();

        assert_eq!(row.column(COL_URL_HASH), request.url_hash().as_bytes());
        assert_eq!(row.column(COL_INITIATOR), b"peerhash0001");
        assert!(row
            .column(COL_URL)
            .starts_with(b"https://example.com/reading-room/doc.pdf\0"));
        assert_eq!(
            row.column(COL_APPEARANCE_DATE),
            &1_700_000_000_000u64.to_be_bytes()
        );
        assert_eq!(row.column(COL_PROFILE), b"profile00001");
        assert_eq!(row.column(COL_DEPTH), &[0u8, 4]);
        assert_eq!(row.column(COL_PARENT_ANCHORS), &[0u8, 0, 120]);
        assert_eq!(row.column(COL_FORK_FACTOR), &9_000u32.to_be_bytes());
        assert_eq!(row.column(COL_FLAGS), &[0b0000_1000u8, 0, 0b0000_0010, 0]);
        assert_eq!(row.column(COL_SIZE), &1_048_576u64.to_be_bytes());
    }

    #[test]
    fn test_reserved_columns_are_zero() {
        let row = encode(&full_request()).unwrap();
        for index in [COL_HANDLE, COL_LOAD_DATE, COL_LAST_MODIFIED] {
            assert!(row.is_null(index), "{} not zero", REQUEST_COLUMNS[index].name);
        }
    }

    #[test]
    fn test_redirected_request_keeps_identity_through_row() {
        let mut request = Request::new(url("https://example.com/old"));
        let identity = *request.url_hash();
        request.redirect(url("https://example.com/new"));

        let decoded = decode(encode(&request).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.url_hash(), &identity);
        assert_eq!(decoded.url().as_str(), "https://example.com/new");
    }

    #[test]
    fn test_decode_null_url_fails() {
        let mut row = encode(&full_request()).unwrap();
        row.column_mut(COL_URL).fill(0);
        assert_eq!(
            decode(row.as_bytes()).unwrap_err(),
            RowError::MissingColumn("urlstring")
        );
    }

    #[test]
    fn test_decode_null_key_fails() {
        let mut row = encode(&full_request()).unwrap();
        row.column_mut(COL_URL_HASH).fill(0);
        assert_eq!(
            decode(row.as_bytes()).unwrap_err(),
            RowError::MissingColumn("urlhash")
        );
    }

    #[test]
    fn test_decode_wrong_width_fails() {
        let row = encode(&full_request()).unwrap();
        let err = decode(&row.as_bytes()[..ROW_WIDTH - 1]).unwrap_err();
        assert!(matches!(err, RowError::WidthMismatch { .. }));
    }

    #[test]
    fn test_decode_invalid_url_fails() {
        let mut row = encode(&full_request()).unwrap();
        row.column_mut(COL_URL).fill(0);
        row.column_mut(COL_URL)[..10].copy_from_slice(b"not a url!");
        assert!(matches!(
            decode(row.as_bytes()).unwrap_err(),
            RowError::InvalidUrl { .. }
        ));
    }

    #[test]
    fn test_decode_strips_fragment() {
        let mut row = encode(&full_request()).unwrap();
        let text = b"http://x/y#frag";
        row.column_mut(COL_URL).fill(0);
        row.column_mut(COL_URL)[..text.len()].copy_from_slice(text);
        assert_eq!(decode(row.as_bytes()).unwrap().url().as_str(), "http://x/y");
    }

    #[test]
    fn test_encode_rejects_long_url() {
        let long = format!("https://example.com/{}", "a".repeat(300));
        let err = encode(&Request::new(url(&long))).unwrap_err();
        assert!(matches!(
            err,
            RowError::FieldTooLong {
                column: "urlstring",
                ..
            }
        ));
    }

    #[test]
    fn test_encode_truncates_long_name_on_char_boundary() {
        // 79 ASCII bytes followed by a two-byte character straddling the limit.
        let name = format!("{}é tail", "n".repeat(79));
        let request = Request::new(url("https://example.com/")).with_name(name);
        let decoded = decode(encode(&request).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.name(), "n".repeat(79));
    }

    #[test]
    fn test_encode_rejects_overflowing_depth() {
        let request = Request::new(url("https://example.com/")).with_depth(70_000);
        assert_eq!(
            encode(&request).unwrap_err(),
            RowError::Overflow {
                column: "depth",
                value: 70_000,
                width: 2
            }
        );
    }

    #[test]
    fn test_encode_rejects_overflowing_anchor_count() {
        let request = Request::new(url("https://example.com/")).with_parent_anchor_count(1 << 24);
        assert!(matches!(
            encode(&request).unwrap_err(),
            RowError::Overflow {
                column: "parentbr",
                ..
            }
        ));
    }

    #[test]
    fn test_encode_rejects_negative_date() {
        let date = Utc.timestamp_millis_opt(-1_000).unwrap();
        let request = Request::new(url("https://example.com/")).with_appearance_date(date);
        assert_eq!(
            encode(&request).unwrap_err(),
            RowError::NegativeValue {
                column: "appdate",
                value: -1_000
            }
        );
    }

    #[test]
    fn test_encode_rejects_long_profile_handle() {
        let request =
            Request::new(url("https://example.com/")).with_profile_handle("profile-handle-too-long");
        assert!(matches!(
            encode(&request).unwrap_err(),
            RowError::FieldTooLong {
                column: "profile",
                ..
            }
        ));
    }

    #[test]
    fn test_short_profile_handle_survives_but_fails_on_read() {
        let request = Request::new(url("https://example.com/")).with_profile_handle("short");
        let decoded = decode(encode(&request).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.try_profile_handle(), Some("short"));
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            decoded.profile_handle().to_string()
        }));
        assert!(result.is_err());
    }

    #[test]
    fn test_profile_handle_whitespace_roundtrips() {
        let request =
            Request::new(url("https://example.com/")).with_profile_handle(" profile0001");
        assert_eq!(request.profile_handle().len(), HASH_LENGTH);

        let decoded = decode(encode(&request).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.try_profile_handle(), Some(" profile0001"));
        assert_eq!(decoded.profile_handle(), request.profile_handle());

        let trailing =
            Request::new(url("https://example.com/")).with_profile_handle("profile0001 ");
        let decoded = decode(encode(&trailing).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.profile_handle(), "profile0001 ");
    }

    #[test]
    fn test_name_whitespace_roundtrips() {
        let request = Request::new(url("https://example.com/")).with_name("  Annual report ");
        let decoded = decode(encode(&request).unwrap().as_bytes()).unwrap();
        assert_eq!(decoded.name(), "  Annual report ");
    }

    #[test]
    fn test_codec_is_shareable_across_threads() {
        let request = std::sync::Arc::new(full_request());
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let request = request.clone();
                std::thread::spawn(move || encode(&request).unwrap())
            })
            .collect();
        let rows: Vec<RequestRow> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(rows.windows(2).all(|w| w[0] == w[1]));
    }
}
