//! Parser boundary for fetched content.
//!
//! Content parsing itself lives elsewhere: a [`ContentDispatcher`] picks and
//! runs the right parser for a file. The parsers here only unwrap container
//! formats and hand the inner content back to the dispatcher.

pub mod gzip;

pub use gzip::GzipParser;

use std::io::Read;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use thiserror::Error;
use url::Url;

/// Errors that can occur while parsing content.
#[derive(Debug, Error)]
pub enum ParseError {
    /// Parsing was interrupted on request. Never wrapped in another error.
    #[error("Parsing was cancelled")]
    Cancelled,

    #[error("Unsupported MIME type: {0}")]
    UnsupportedMimeType(String),

    #[error("{message} (at {location})")]
    Content { location: String, message: String },
}

impl ParseError {
    /// A content error tagged with the document it came from.
    pub fn content(location: &Url, message: impl std::fmt::Display) -> Self {
        Self::Content {
            location: location.to_string(),
            message: message.to_string(),
        }
    }
}

/// Cooperative cancellation flag shared between a caller and a parser.
#[derive(Debug, Clone, Default)]
pub struct Cancellation(Arc<AtomicBool>);

impl Cancellation {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this flag to stop.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Return [`ParseError::Cancelled`] once cancellation was requested.
    pub fn check(&self) -> Result<(), ParseError> {
        if self.is_cancelled() {
            Err(ParseError::Cancelled)
        } else {
            Ok(())
        }
    }
}

/// Parses a file by whatever parser fits its content.
pub trait ContentDispatcher {
    type Output;

    /// Parse the file at `path`. `mime_type` is the detected type, if any.
    fn parse_file(
        &self,
        location: &Url,
        mime_type: Option<&str>,
        path: &Path,
        cancel: &Cancellation,
    ) -> Result<Self::Output, ParseError>;
}

/// A parser for one family of MIME types.
pub trait Parser {
    type Output;

    /// Human readable parser name.
    fn name(&self) -> &'static str;

    /// MIME types this parser accepts.
    fn supported_mime_types(&self) -> &'static [&'static str];

    /// File extensions this parser accepts.
    fn supported_extensions(&self) -> &'static [&'static str];

    /// Whether `mime_type` (parameters such as `; charset=` are ignored) is accepted.
    fn supports(&self, mime_type: &str) -> bool {
        let essence = mime_type.split(';').next().unwrap_or_default().trim();
        self.supported_mime_types()
            .iter()
            .any(|m| m.eq_ignore_ascii_case(essence))
    }

    fn parse(
        &self,
        location: &Url,
        mime_type: &str,
        charset: Option<&str>,
        source: &mut dyn Read,
        cancel: &Cancellation,
    ) -> Result<Self::Output, ParseError>;
}
