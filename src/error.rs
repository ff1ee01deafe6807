//! Error types for the host-facing plumbing
//!
//! These never cross the extraction boundary: strategies turn every failure into
//! an `Outcome::Error`. They are used by snapshot loading and the CLI.

/// Result type for host operations
pub type Result<T> = std::result::Result<T, GrabberError>;

#[derive(thiserror::Error, Debug)]
pub enum GrabberError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("{}: {0}", crate::host::RESTRICTED_MESSAGE)]
    RestrictedPage(String),

    #[error("Page request failed with HTTP {status}: {url}")]
    PageStatus { status: u16, url: String },
}
