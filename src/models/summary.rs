//! Serializable view of a queued request.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Request;

/// A request flattened to printable fields, for JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequestSummary {
    pub url_hash: String,
    pub url: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub initiator: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub referrer: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub appearance_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub profile_handle: Option<String>,
    pub depth: u32,
    pub parent_anchor_count: u32,
    pub fork_factor: u32,
    pub flags: String,
    pub size: u64,
    pub status: String,
}

impl From<&Request> for RequestSummary {
    fn from(request: &Request) -> Self {
        Self {
            url_hash: request.url_hash().to_string(),
            url: request.url().to_string(),
            initiator: request.initiator().map(|k| k.to_string()),
            referrer: request.referrer_hash().map(|k| k.to_string()),
            name: request.name().to_string(),
            appearance_date: request.appearance_date(),
            profile_handle: request.try_profile_handle().map(str::to_string),
            depth: request.depth(),
            parent_anchor_count: request.parent_anchor_count(),
            fork_factor: request.fork_factor(),
            flags: hex::encode(request.flags().bytes()),
            size: request.size(),
            status: format!("{} ({})", request.status().message(), request.status_code()),
        }
    }
}
