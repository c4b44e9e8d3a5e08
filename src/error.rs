//! Error kinds shared by the token manager, the API client and the tool gateway

use std::path::PathBuf;

/// Failure kinds that cross component boundaries.
///
/// Errors are `Clone` so that one failed refresh can be handed to every
/// caller that was waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// No credentials yet, or the refresh token is gone.
    #[error("not authorized: {0}")]
    NotAuthorized(String),

    /// The authorization code exchange was rejected.
    #[error("authorization failed: {0}")]
    AuthorizationFailed(String),

    /// The refresh token was rejected, expired, or the exchange timed out.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// Transport failure, non-2xx status or unusable body on a resource call.
    #[error("API request failed: {message}")]
    ApiRequestFailed {
        status: Option<u16>,
        message: String,
    },

    #[error("credential store {} is corrupt: {message}", path.display())]
    StorageCorrupt { path: PathBuf, message: String },

    #[error("credential store {} could not be written: {message}", path.display())]
    StorageIo { path: PathBuf, message: String },

    /// Caller-supplied input did not satisfy an operation's contract.
    #[error("invalid arguments: {0}")]
    InvalidArguments(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;

impl Error {
    pub(crate) fn api(status: Option<u16>, message: impl Into<String>) -> Self {
        Self::ApiRequestFailed {
            status,
            message: message.into(),
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        let status = err.status().map(|s| s.as_u16());
        let message = if err.is_timeout() {
            format!("request timed out: {}", err)
        } else {
            err.to_string()
        };
        Self::ApiRequestFailed { status, message }
    }
}
