//! URL identity keys.
//!
//! Every queued URL is identified by a fixed-length key derived from its
//! canonical form. The same key type is used for initiator and referrer
//! hashes, so all of them share one length and one ordering.

use std::fmt;

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use sha2::{Digest, Sha256};
use url::Url;

/// Byte length of every hash key in the system.
pub const HASH_LENGTH: usize = 12;

/// A fixed-length hash key, ordered byte-lexicographically.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct HashKey([u8; HASH_LENGTH]);

impl HashKey {
    /// Build a key from raw bytes.
    ///
    /// Panics when `bytes` is not exactly [`HASH_LENGTH`] long; callers holding
    /// untrusted input should use [`HashKey::try_from_slice`].
    pub fn from_slice(bytes: &[u8]) -> Self {
        assert_eq!(
            bytes.len(),
            HASH_LENGTH,
            "hash key must be {} bytes, got {}",
            HASH_LENGTH,
            bytes.len()
        );
        let mut key = [0u8; HASH_LENGTH];
        key.copy_from_slice(bytes);
        Self(key)
    }

    /// Build a key from raw bytes, returning `None` on a length mismatch.
    pub fn try_from_slice(bytes: &[u8]) -> Option<Self> {
        <[u8; HASH_LENGTH]>::try_from(bytes).ok().map(Self)
    }

    /// Parse a key from either textual form [`Display`](fmt::Display) produces:
    /// the raw 12 characters, or `0x` followed by 24 hex digits.
    pub fn parse(s: &str) -> Option<Self> {
        if let Some(digits) = s.strip_prefix("0x") {
            if digits.len() == HASH_LENGTH * 2 {
                return hex::decode(digits)
                    .ok()
                    .and_then(|bytes| Self::try_from_slice(&bytes));
            }
        }
        Self::try_from_slice(s.as_bytes())
    }

    pub fn as_bytes(&self) -> &[u8; HASH_LENGTH] {
        &self.0
    }

    /// True when every byte is zero, which is how a null key is stored.
    pub fn is_null(&self) -> bool {
        self.0.iter().all(|&b| b == 0)
    }
}

impl AsRef<[u8]> for HashKey {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match std::str::from_utf8(&self.0) {
            Ok(s) if s.bytes().all(|b| b.is_ascii_graphic()) => f.write_str(s),
            _ => write!(f, "0x{}", hex::encode(self.0)),
        }
    }
}

impl fmt::Debug for HashKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HashKey({})", self)
    }
}

/// Strip the fragment component from a URL.
pub fn canonicalize(mut url: Url) -> Url {
    url.set_fragment(None);
    url
}

/// Derive the identity key of a URL.
///
/// The key is the first [`HASH_LENGTH`] characters of the URL-safe base64
/// encoding of the SHA-256 digest of the canonical URL string. It depends on
/// nothing but the URL, so a key derived at construction agrees with one
/// derived later from an equivalent URL.
pub fn hash_url(url: &Url) -> HashKey {
    let canonical = canonicalize(url.clone());
    let digest = Sha256::digest(canonical.as_str().as_bytes());
    let encoded = URL_SAFE_NO_PAD.encode(digest);
    HashKey::from_slice(&encoded.as_bytes()[..HASH_LENGTH])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(s: &str) -> Url {
        Url::parse(s).unwrap()
    }

    #[test]
    fn test_hash_is_fixed_length_ascii() {
        let key = hash_url(&url("https://example.com/a"));
        assert_eq!(key.as_bytes().len(), HASH_LENGTH);
        assert!(key.as_bytes().iter().all(|b| b.is_ascii_graphic()));
    }

    #[test]
    fn test_hash_ignores_fragment() {
        assert_eq!(
            hash_url(&url("https://example.com/a#top")),
            hash_url(&url("https://example.com/a"))
        );
    }

    #[test]
    fn test_hash_differs_per_url() {
        assert_ne!(
            hash_url(&url("https://example.com/a")),
            hash_url(&url("https://example.com/b"))
        );
    }

    #[test]
    fn test_canonicalize_strips_fragment() {
        let canonical = canonicalize(url("http://x/y#frag"));
        assert_eq!(canonical.as_str(), "http://x/y");
    }

    #[test]
    fn test_display_roundtrips_through_parse() {
        let key = hash_url(&url("https://example.com/"));
        assert_eq!(HashKey::parse(&key.to_string()), Some(key));
    }

    #[test]
    fn test_display_falls_back_to_hex() {
        let key = HashKey::from_slice(&[0u8; HASH_LENGTH]);
        assert!(key.is_null());
        assert_eq!(key.to_string(), format!("0x{}", "00".repeat(HASH_LENGTH)));
    }

    #[test]
    fn test_hex_form_roundtrips_through_parse() {
        let key = HashKey::from_slice(&[0xff, 0, 1, 2, 3, 4, 5, 6, 7, 8, 9, 0x80]);
        let text = key.to_string();
        assert!(text.starts_with("0x"));
        assert_eq!(HashKey::parse(&text), Some(key));
        assert_eq!(HashKey::parse(&text.to_uppercase().replacen("0X", "0x", 1)), Some(key));
        assert!(HashKey::parse("0xnothexnothexnothexnothex").is_none());
    }

    #[test]
    fn test_try_from_slice_rejects_wrong_length() {
        assert!(HashKey::try_from_slice(b"short").is_none());
    }

    #[test]
    #[should_panic(expected = "hash key must be")]
    fn test_from_slice_panics_on_wrong_length() {
        HashKey::from_slice(b"short");
    }

    #[test]
    fn test_keys_order_bytewise() {
        let a = HashKey::from_slice(b"AAAAAAAAAAAA");
        let b = HashKey::from_slice(b"AAAAAAAAAAAB");
        let lower = HashKey::from_slice(b"aAAAAAAAAAAA");
        assert!(a < b);
        assert!(b < lower);
    }
}
