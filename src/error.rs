//! Error taxonomy for the ePaper pipeline.
//!
//! Four failure classes cover the whole run:
//! - [`Error::Auth`]: login/credential failures,
//! - [`Error::Parse`]: unexpected page or JSON shape from the portal,
//! - [`Error::Fetch`] / [`Error::FetchStatus`]: transport or non-success
//!   responses on any index/article/image endpoint,
//! - [`Error::Write`]: disk write failures.
//!
//! Auth, parse and fetch errors during the crawl are fatal and abort the run.
//! Write errors during feed/article persistence are fail-soft: they are
//! logged and the remaining sections and articles still complete.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum Error {
    /// Login failed: network error, non-success response, or an
    /// unparsable login payload.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// The portal returned a page or JSON document that does not match
    /// the expected shape.
    #[error("unexpected portal payload: {0}")]
    Parse(String),

    /// A request could not be completed at the transport level.
    #[error("request to {url} failed: {source}")]
    Fetch {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    /// A request completed but the portal answered with a non-success status.
    #[error("request to {url} returned status {status}")]
    FetchStatus {
        url: String,
        status: reqwest::StatusCode,
    },

    /// A file or directory could not be written.
    #[error("failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl Error {
    /// Shorthand for wrapping an I/O error with the path it happened on.
    pub fn write(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_context() {
        let err = Error::Auth("login endpoint returned 403".to_string());
        assert!(err.to_string().contains("authentication failed"));

        let err = Error::Parse("editions literal not found".to_string());
        assert!(err.to_string().contains("unexpected portal payload"));

        let err = Error::write(
            "/tmp/out/feed.xml",
            std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        );
        let msg = err.to_string();
        assert!(msg.contains("/tmp/out/feed.xml"));
        assert!(msg.contains("denied"));
    }
}
