//! The crawl frontier request: one URL queued for fetching.

use std::hash::{Hash, Hasher};

use chrono::{DateTime, TimeZone, Utc};
use tracing::debug;
use url::Url;

use super::flags::Flags;
use super::status::{Status, StatusCode};
use crate::hash::{canonicalize, hash_url, HashKey, HASH_LENGTH};

/// Status message for requests built in memory.
pub const STATUS_LOADED_ARGS: &str = "loaded(args)";
/// Status message for requests read back from a row.
pub const STATUS_LOADED_ROW: &str = "loaded(row)";

/// A URL waiting in the crawl frontier.
///
/// The identity key is derived once from the URL given at construction (or
/// read from the stored row) and never changes afterwards, not even when
/// [`Request::redirect`] swaps the current URL. Equality and hashing go
/// through that key only.
#[derive(Debug, Clone)]
pub struct Request {
    pub(crate) url_hash: HashKey,
    pub(crate) initiator: Option<HashKey>,
    pub(crate) url: Url,
    pub(crate) referrer_hash: Option<HashKey>,
    pub(crate) name: String,
    pub(crate) appearance_millis: i64,
    pub(crate) profile_handle: Option<String>,
    pub(crate) depth: u32,
    pub(crate) parent_anchor_count: u32,
    pub(crate) fork_factor: u32,
    pub(crate) flags: Flags,
    pub(crate) size: u64,
    pub(crate) status: Status,
}

impl Request {
    /// Create a request for `url` with every other field at its default.
    ///
    /// A profile handle has to be supplied with [`Request::with_profile_handle`]
    /// before the request is ready to be fetched.
    pub fn new(url: Url) -> Self {
        let url = canonicalize(url);
        Self {
            url_hash: hash_url(&url),
            initiator: None,
            url,
            referrer_hash: None,
            name: String::new(),
            appearance_millis: 0,
            profile_handle: None,
            depth: 0,
            parent_anchor_count: 0,
            fork_factor: 0,
            flags: Flags::new(),
            size: 0,
            status: Status::new(STATUS_LOADED_ARGS, StatusCode::INITIATED),
        }
    }

    /// Create a fully described request.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        initiator: Option<&[u8]>,
        url: Url,
        referrer: Option<HashKey>,
        name: Option<&str>,
        appearance_date: Option<DateTime<Utc>>,
        profile_handle: Option<&str>,
        depth: u32,
        parent_anchor_count: u32,
        fork_factor: u32,
        size: u64,
    ) -> Self {
        let mut request = Self::new(url)
            .with_initiator(initiator.unwrap_or_default())
            .with_referrer(referrer)
            .with_name(name.unwrap_or_default())
            .with_depth(depth)
            .with_parent_anchor_count(parent_anchor_count)
            .with_fork_factor(fork_factor)
            .with_size(size);
        if let Some(date) = appearance_date {
            request = request.with_appearance_date(date);
        }
        if let Some(handle) = profile_handle {
            request = request.with_profile_handle(handle);
        }
        request
    }

    /// Set the initiator hash. An empty slice means "no initiator".
    ///
    /// Panics if `initiator` is neither empty nor [`HASH_LENGTH`] bytes long.
    pub fn with_initiator(mut self, initiator: &[u8]) -> Self {
        self.initiator = if initiator.is_empty() {
            None
        } else {
            Some(HashKey::from_slice(initiator))
        };
        self
    }

    pub fn with_referrer(mut self, referrer: Option<HashKey>) -> Self {
        self.referrer_hash = referrer;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_appearance_date(mut self, date: DateTime<Utc>) -> Self {
        self.appearance_millis = date.timestamp_millis();
        self
    }

    /// Attach the crawl profile. The handle must be [`HASH_LENGTH`] bytes.
    pub fn with_profile_handle(mut self, handle: impl Into<String>) -> Self {
        self.profile_handle = Some(handle.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = depth;
        self
    }

    pub fn with_parent_anchor_count(mut self, count: u32) -> Self {
        self.parent_anchor_count = count;
        self
    }

    pub fn with_fork_factor(mut self, fork_factor: u32) -> Self {
        self.fork_factor = fork_factor;
        self
    }

    pub fn with_flags(mut self, flags: Flags) -> Self {
        self.flags = flags;
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = size;
        self
    }

    /// Replace the current URL after a redirect.
    ///
    /// Only the location changes; the identity key and all other fields stay.
    pub fn redirect(&mut self, url: Url) {
        let url = canonicalize(url);
        debug!("Request {} redirected: {} -> {}", self.url_hash, self.url, url);
        self.url = url;
    }

    pub fn url_hash(&self) -> &HashKey {
        &self.url_hash
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn initiator(&self) -> Option<&HashKey> {
        self.initiator.as_ref()
    }

    /// True when nobody initiated the request (local or proxy traffic).
    pub fn is_proxy(&self) -> bool {
        self.initiator.is_none()
    }

    pub fn referrer_hash(&self) -> Option<&HashKey> {
        self.referrer_hash.as_ref()
    }

    /// Anchor text of the link the URL was found under.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// When the URL first appeared, if known.
    pub fn appearance_date(&self) -> Option<DateTime<Utc>> {
        if self.appearance_millis == 0 {
            return None;
        }
        Utc.timestamp_millis_opt(self.appearance_millis).single()
    }

    /// Raw appearance date in epoch milliseconds, 0 when unknown.
    pub fn appearance_millis(&self) -> i64 {
        self.appearance_millis
    }

    /// Handle of the crawl profile this request belongs to.
    ///
    /// Panics if no handle is set or it is not [`HASH_LENGTH`] bytes long;
    /// either means the request was built incorrectly.
    pub fn profile_handle(&self) -> &str {
        let handle = self
            .profile_handle
            .as_deref()
            .unwrap_or_else(|| panic!("request {} has no profile handle", self.url_hash));
        assert_eq!(
            handle.len(),
            HASH_LENGTH,
            "profile handle {:?} != {}",
            handle,
            HASH_LENGTH
        );
        handle
    }

    /// Profile handle as stored, without length checks.
    pub fn try_profile_handle(&self) -> Option<&str> {
        self.profile_handle.as_deref()
    }

    /// Crawl distance from the seed.
    pub fn depth(&self) -> u32 {
        self.depth
    }

    /// Number of anchors on the referring page.
    pub fn parent_anchor_count(&self) -> u32 {
        self.parent_anchor_count
    }

    /// Sum of anchor counts over all ancestors.
    pub fn fork_factor(&self) -> u32 {
        self.fork_factor
    }

    pub fn flags(&self) -> &Flags {
        &self.flags
    }

    pub fn flags_mut(&mut self) -> &mut Flags {
        &mut self.flags
    }

    /// Resource size in bytes, 0 when unknown.
    pub fn size(&self) -> u64 {
        self.size
    }

    pub fn status(&self) -> &Status {
        &self.status
    }

    pub fn status_mut(&mut self) -> &mut Status {
        &mut self.status
    }

    pub fn status_code(&self) -> StatusCode {
        self.status.code()
    }

    pub fn set_status(&mut self, message: impl Into<String>, code: StatusCode) {
        self.status.set(message, code);
    }
}

impl PartialEq for Request {
    fn eq(&self, other: &Self) -> bool {
        self.url_hash == other.url_hash
    }
}

impl Eq for Request {}

impl Hash for Request {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.url_hash.hash(state);
    }
}
