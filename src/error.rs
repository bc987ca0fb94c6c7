//! Error types for the library layer
//!
//! The command surface wraps these in `anyhow` with context; library code
//! returns [`MirrorError`] so callers can match on the HTTP status.

use thiserror::Error;

/// Result alias used throughout the library
pub type Result<T> = std::result::Result<T, MirrorError>;

/// Everything that can go wrong while talking to the API or the mirror tree
#[derive(Debug, Error)]
pub enum MirrorError {
    /// No credential could be obtained from any source
    #[error("no GitHub authorization available: {0}")]
    Auth(String),

    /// The API answered with something other than 200
    #[error("GitHub API returned status {status} for {url}")]
    Http { status: u16, url: String },

    /// An explicitly named repository does not exist
    #[error("repository {owner}/{name} not found")]
    NotFound { owner: String, name: String },

    /// A record field was requested that the API did not supply
    #[error("repository record has no field '{0}'")]
    MissingField(String),

    /// Malformed `list --format` template
    #[error("invalid format string: {0}")]
    Format(String),

    #[error("HTTP transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("failed to decode API response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl MirrorError {
    /// True when the API reported 404 for the request
    pub fn is_not_found(&self) -> bool {
        matches!(self, MirrorError::Http { status: 404, .. })
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            MirrorError::Http { status, .. } => Some(*status),
            _ => None,
        }
    }
}
