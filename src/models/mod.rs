//! Domain models for the crawl frontier.

pub mod flags;
pub mod request;
pub mod status;
pub mod summary;

pub use flags::{Flags, FLAGS_WIDTH};
pub use request::Request;
pub use status::{Status, StatusCode, Workflow};
pub use summary::RequestSummary;
