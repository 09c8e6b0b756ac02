//! Gzip container parser.
//!
//! Inflates the stream into a temporary file, works out what the inner content
//! is and hands it to the dispatcher. The temporary file is removed however
//! parsing ends.

use std::io::{ErrorKind, Read, Write};
use std::path::PathBuf;

use flate2::read::GzDecoder;
use tempfile::NamedTempFile;
use tracing::{debug, warn};
use url::Url;

use super::{Cancellation, ContentDispatcher, ParseError, Parser};

const SUPPORTED_MIME_TYPES: &[&str] = &[
    "application/x-gzip",
    "application/gzip",
    "application/x-gunzip",
    "application/gzipped",
    "application/gzip-compressed",
    "application/x-compressed",
    "application/x-compress",
    "gzip/document",
    "application/octet-stream",
    "application/x-tar",
];

const SUPPORTED_EXTENSIONS: &[&str] = &["gz", "tgz"];

const CHUNK_SIZE: usize = 8 * 1024;

/// Unwraps gzip streams and delegates the inner content.
#[derive(Debug)]
pub struct GzipParser<D> {
    dispatcher: D,
    temp_dir: Option<PathBuf>,
    max_inflated_bytes: Option<u64>,
}

impl<D: ContentDispatcher> GzipParser<D> {
    pub fn new(dispatcher: D) -> Self {
        Self {
            dispatcher,
            temp_dir: None,
            max_inflated_bytes: None,
        }
    }

    /// Create temporary files in `dir` instead of the system temp directory.
    pub fn with_temp_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.temp_dir = Some(dir.into());
        self
    }

    /// Refuse streams that inflate to more than `limit` bytes.
    pub fn with_max_inflated_bytes(mut self, limit: u64) -> Self {
        self.max_inflated_bytes = Some(limit);
        self
    }

    pub fn dispatcher(&self) -> &D {
        &self.dispatcher
    }

    fn create_temp_file(&self) -> std::io::Result<NamedTempFile> {
        let mut builder = tempfile::Builder::new();
        builder.prefix("gunzip").suffix(".tmp");
        match &self.temp_dir {
            Some(dir) => builder.tempfile_in(dir),
            None => builder.tempfile(),
        }
    }

    /// Inflate `source` into a fresh temporary file.
    fn inflate(
        &self,
        location: &Url,
        source: &mut dyn Read,
        cancel: &Cancellation,
    ) -> Result<NamedTempFile, ParseError> {
        let fail = |e: String| {
            ParseError::content(
                location,
                format!("Unexpected error while parsing gzip file: {}", e),
            )
        };

        let mut temp = self.create_temp_file().map_err(|e| fail(e.to_string()))?;
        let mut decoder = GzDecoder::new(source);
        let mut buf = [0u8; CHUNK_SIZE];
        let mut total: u64 = 0;

        loop {
            cancel.check()?;
            let n = match decoder.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(fail(e.to_string())),
            };

            total += n as u64;
            if let Some(limit) = self.max_inflated_bytes {
                if total > limit {
                    return Err(fail(format!("inflated content exceeds {} bytes", limit)));
                }
            }
            temp.write_all(&buf[..n]).map_err(|e| fail(e.to_string()))?;
        }
        temp.flush().map_err(|e| fail(e.to_string()))?;

        debug!(
            "Inflated {} bytes from {} into {}",
            total,
            location,
            temp.path().display()
        );
        Ok(temp)
    }
}

impl<D: ContentDispatcher> Parser for GzipParser<D> {
    type Output = D::Output;

    fn name(&self) -> &'static str {
        "GNU Zip Compressed Archive Parser"
    }

    fn supported_mime_types(&self) -> &'static [&'static str] {
        SUPPORTED_MIME_TYPES
    }

    fn supported_extensions(&self) -> &'static [&'static str] {
        SUPPORTED_EXTENSIONS
    }

    fn parse(
        &self,
        location: &Url,
        mime_type: &str,
        _charset: Option<&str>,
        source: &mut dyn Read,
        cancel: &Cancellation,
    ) -> Result<D::Output, ParseError> {
        if !self.supports(mime_type) {
            return Err(ParseError::UnsupportedMimeType(mime_type.to_string()));
        }

        let temp = self.inflate(location, source, cancel)?;
        cancel.check()?;

        let inner_type = infer::get_from_path(temp.path())
            .map_err(|e| ParseError::content(location, e))?
            .map(|kind| kind.mime_type());
        debug!(
            "Dispatching inner content of {} as {}",
            location,
            inner_type.unwrap_or("unknown")
        );

        let result = self
            .dispatcher
            .parse_file(location, inner_type, temp.path(), cancel);

        let path = temp.path().to_path_buf();
        if let Err(e) = temp.close() {
            warn!("Failed to remove {}: {}", path.display(), e);
        }
        result
    }
}
