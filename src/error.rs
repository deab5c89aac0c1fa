//! Error types for fw-updater.

use thiserror::Error;

/// Error type for library operations.
#[derive(Error, Debug)]
pub enum Error {
    /// No usable credentials could be acquired
    #[error("no usable credentials: {0}")]
    Credentials(String),

    /// The firewall API answered with a non-success status
    #[error("{call} returned HTTP {status}: {message}")]
    Api {
        call: String,
        status: reqwest::StatusCode,
        message: String,
    },

    /// The nameserver flag did not parse as an IP address
    #[error("invalid nameserver address: {0}")]
    InvalidNameserver(String),

    /// A TXT query failed; aborts the whole resolution
    #[error("TXT lookup for {domain} failed: {source}")]
    TxtLookup {
        domain: String,
        #[source]
        source: Box<hickory_resolver::error::ResolveError>,
    },

    /// A domain's include chain reaches back to itself
    #[error("include cycle: {0} appears in its own include chain")]
    IncludeCycle(String),

    /// An include chain nested deeper than the cap
    #[error("include chain deeper than {max} levels at {domain}")]
    IncludeDepth { domain: String, max: usize },

    /// HTTP transport error
    #[error("HTTP transport error: {0}")]
    Http(#[from] reqwest::Error),
}

/// Result type alias for library operations.
pub type Result<T> = std::result::Result<T, Error>;
