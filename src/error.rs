//! Error types for the listing walker.
//!
//! Two layers exist: [`BrowserError`] describes failures of the browser
//! capability itself, [`Error`] is what a run surfaces to the host. Only
//! optional metadata failures are swallowed inside the walker; everything
//! else ends up here.

use std::time::Duration;

use thiserror::Error;

use crate::restrictions::RestrictionViolation;

/// Result type alias for walker operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Failures reported by a [`BrowserSession`](crate::browser::BrowserSession).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BrowserError {
    /// The selector matched nothing in the active context.
    #[error("no element matches `{0}`")]
    NoSuchElement(String),

    /// The element handle belongs to a page that is no longer loaded.
    #[error("element handle is stale")]
    StaleElement,

    /// A bounded wait ran out before the selector matched.
    #[error("timed out after {timeout:?} waiting for `{selector}`")]
    Timeout { selector: String, timeout: Duration },

    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },

    /// The page could not be loaded.
    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("no browsing context is active")]
    NoActiveContext,

    #[error("no browsing context at index {0}")]
    NoSuchContext(usize),

    #[error("unsupported browser operation: {0}")]
    Unsupported(String),
}

/// Errors that abort a run.
#[derive(Error, Debug)]
pub enum Error {
    /// A required page structure (listing or article container) never appeared.
    #[error("structural element `{selector}` did not appear within {timeout:?}")]
    StructuralTimeout { selector: String, timeout: Duration },

    #[error("browser error: {0}")]
    Browser(BrowserError),

    #[error("unparseable date label: {label:?}")]
    DateLabel { label: String },

    #[error("extraction failed for {link}: {reason}")]
    Extraction { link: String, reason: String },

    /// A restriction other than the lower date bound was violated.
    #[error("restriction violated: {0}")]
    Restriction(#[from] RestrictionViolation),

    #[error("invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("configuration error: {0}")]
    Config(#[from] serde_yaml::Error),

    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),
}

impl From<BrowserError> for Error {
    /// A run only waits for required structure, so an expired wait is a
    /// structural timeout.
    fn from(err: BrowserError) -> Self {
        match err {
            BrowserError::Timeout { selector, timeout } => {
                Error::StructuralTimeout { selector, timeout }
            }
            other => Error::Browser(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timeout_becomes_structural() {
        let err: Error = BrowserError::Timeout {
            selector: ".index_group".to_string(),
            timeout: Duration::from_secs(20),
        }
        .into();

        match err {
            Error::StructuralTimeout { selector, timeout } => {
                assert_eq!(selector, ".index_group");
                assert_eq!(timeout, Duration::from_secs(20));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_other_browser_errors_wrap() {
        let err: Error = BrowserError::NoSuchElement("h1".to_string()).into();
        assert!(matches!(err, Error::Browser(BrowserError::NoSuchElement(ref s)) if s == "h1"));
        assert!(err.to_string().contains("no element matches `h1`"));
    }
}
