//! Error types for the collector.

use thiserror::Error;

/// The login handshake did not produce a usable session.
///
/// Fatal for the current collection cycle, never for the process.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    /// No username or password configured.
    #[error("No credentials configured")]
    MissingCredentials,

    /// The panel refused the credentials.
    #[error("Credentials rejected: {0}")]
    Rejected(String),

    /// The handshake could not be completed.
    #[error("Login handshake failed: {0}")]
    Handshake(String),
}

/// Fetching one page from the panel failed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FetchError {
    /// The session is not valid; authenticate first.
    #[error("Session is not authenticated")]
    NotAuthenticated,

    /// The panel answered with its login page or an auth status.
    #[error("Session expired")]
    SessionExpired,

    /// Logging back in after an expired session failed.
    #[error("Re-authentication failed: {0}")]
    Reauth(AuthError),

    /// The panel answered with an unexpected status.
    #[error("HTTP request failed with status {0}")]
    Status(u16),

    /// HTTP request failed.
    #[error("HTTP request failed: {0}")]
    Http(String),

    /// Connection failed.
    #[error("Connection failed: {0}")]
    Connection(String),

    /// Timeout waiting for response.
    #[error("Request timed out")]
    Timeout,
}

impl FetchError {
    /// Whether retrying the same request may succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            FetchError::Timeout | FetchError::Connection(_) | FetchError::Http(_) => true,
            FetchError::Status(status) => *status >= 500 || *status == 429 || *status == 408,
            FetchError::NotAuthenticated | FetchError::SessionExpired | FetchError::Reauth(_) => {
                false
            }
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else if err.is_connect() {
            FetchError::Connection(err.to_string())
        } else if let Some(status) = err.status() {
            FetchError::Status(status.as_u16())
        } else {
            FetchError::Http(err.to_string())
        }
    }
}

/// A collection cycle could not run at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CollectError {
    /// Authentication failed before any page was fetched.
    #[error("Authentication failed: {0}")]
    Auth(#[from] AuthError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transient_classification() {
        assert!(FetchError::Timeout.is_transient());
        assert!(FetchError::Connection("reset".into()).is_transient());
        assert!(FetchError::Status(503).is_transient());
        assert!(FetchError::Status(429).is_transient());
        assert!(!FetchError::Status(404).is_transient());
        assert!(!FetchError::SessionExpired.is_transient());
        assert!(!FetchError::NotAuthenticated.is_transient());
        assert!(!FetchError::Reauth(AuthError::MissingCredentials).is_transient());
    }

    #[test]
    fn auth_error_converts_to_collect_error() {
        let err: CollectError = AuthError::Rejected("bad password".into()).into();
        assert_eq!(err.to_string(), "Authentication failed: Credentials rejected: bad password");
    }
}
