//! Transient workflow status attached to a request.
//!
//! The set of codes and which transitions between them are legal belong to the
//! workflow that drives the crawler. A request only carries the latest
//! (message, code) pair; nothing here persists it.

use std::fmt;

/// Status code issued by the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct StatusCode(pub i32);

impl StatusCode {
    pub const INITIATED: StatusCode = StatusCode(0);
    pub const STARTED: StatusCode = StatusCode(1);
    pub const RUNNING: StatusCode = StatusCode(2);
    pub const FINISHED: StatusCode = StatusCode(3);
    pub const POISON: StatusCode = StatusCode(99);
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::INITIATED => f.write_str("initiated"),
            Self::STARTED => f.write_str("started"),
            Self::RUNNING => f.write_str("running"),
            Self::FINISHED => f.write_str("finished"),
            Self::POISON => f.write_str("poison"),
            StatusCode(other) => write!(f, "{}", other),
        }
    }
}

/// Transition rules owned by the workflow.
pub trait Workflow {
    /// Whether moving from `from` to `to` is allowed.
    fn is_legal(&self, from: StatusCode, to: StatusCode) -> bool;
}

/// Latest status message and code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Status {
    message: String,
    code: StatusCode,
}

impl Status {
    pub fn new(message: impl Into<String>, code: StatusCode) -> Self {
        Self {
            message: message.into(),
            code,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn code(&self) -> StatusCode {
        self.code
    }

    /// Overwrite message and code unconditionally.
    pub fn set(&mut self, message: impl Into<String>, code: StatusCode) {
        self.message = message.into();
        self.code = code;
    }

    /// Apply an update only if `workflow` allows the transition.
    /// Returns whether the status changed.
    pub fn transition(
        &mut self,
        workflow: &impl Workflow,
        message: impl Into<String>,
        code: StatusCode,
    ) -> bool {
        if !workflow.is_legal(self.code, code) {
            return false;
        }
        self.set(message, code);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Forward;

    impl Workflow for Forward {
        fn is_legal(&self, from: StatusCode, to: StatusCode) -> bool {
            to == StatusCode::POISON || to > from
        }
    }

    #[test]
    fn test_set_overwrites() {
        let mut status = Status::new("loaded(args)", StatusCode::INITIATED);
        status.set("fetching", StatusCode::RUNNING);
        assert_eq!(status.message(), "fetching");
        assert_eq!(status.code(), StatusCode::RUNNING);
    }

    #[test]
    fn test_transition_respects_workflow() {
        let mut status = Status::new("loaded(args)", StatusCode::INITIATED);
        assert!(status.transition(&Forward, "started", StatusCode::STARTED));
        assert!(!status.transition(&Forward, "back", StatusCode::INITIATED));
        assert_eq!(status.code(), StatusCode::STARTED);
        assert_eq!(status.message(), "started");
    }

    #[test]
    fn test_display() {
        assert_eq!(StatusCode::FINISHED.to_string(), "finished");
        assert_eq!(StatusCode(42).to_string(), "42");
    }
}
