//! Error types and handling for pagehop-core operations.
//!
//! This module covers the failures that can surface from the crate's
//! *construction* boundary: building the HTTP client, parsing a base URL,
//! and mounting a router over an initial document.
//!
//! Failures on the navigation path itself (a prefetch that comes back with a
//! non-success status, a click on a URL that never made it into the cache)
//! are deliberately *not* errors. They are absorbed where they happen: the
//! cache resolves to its no-op sentinel, a failure notification is broadcast,
//! and the host falls back to default browser navigation. Nothing on that
//! path ever reaches a caller as `Err`.

use thiserror::Error;

/// The main error type for pagehop-core operations.
///
/// All fallible public functions in pagehop-core return `Result<T, Error>`.
/// The error type includes automatic conversion from the underlying network
/// and URL errors so `?` works at the seams.
#[derive(Error, Debug)]
pub enum Error {
    /// Network client construction or transport failed.
    ///
    /// Covers building the `reqwest` client and transport-level request
    /// failures (DNS, TLS, timeouts). Non-success HTTP statuses are not
    /// represented here; the document cache treats those as a soft failure.
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// A URL could not be parsed.
    ///
    /// Raised when the base URL handed to [`crate::Router::mount`] is not
    /// an absolute URL. Anchor `href` values that fail to resolve are not
    /// errors; discovery skips them with a debug log.
    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    /// The initial document could not be used to mount a router.
    ///
    /// The HTML parser itself is lenient and never fails, so this only
    /// covers structural problems such as a search scope node that does not
    /// exist in the parsed document.
    #[error("Mount error: {0}")]
    Mount(String),
}

impl Error {
    /// Returns the category of this error as a static string.
    ///
    /// Useful for logging and metrics without matching on variants.
    #[must_use]
    pub const fn category(&self) -> &'static str {
        match self {
            Self::Network(_) => "network",
            Self::Url(_) => "url",
            Self::Mount(_) => "mount",
        }
    }

    /// Returns whether retrying the operation might succeed.
    ///
    /// Network errors are generally transient; URL and mount errors are
    /// caller bugs and will not get better on retry.
    #[must_use]
    pub const fn is_recoverable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}

/// Result type alias for pagehop-core operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn categories_are_stable() {
        let err = Error::Mount("missing scope".into());
        assert_eq!(err.category(), "mount");
        assert!(!err.is_recoverable());
    }

    #[test]
    fn url_errors_convert() {
        let err: Error = url::ParseError::EmptyHost.into();
        assert_eq!(err.category(), "url");
        assert!(matches!(err, Error::Url(_)));
    }
}
