//! Error taxonomy for authentication attempts

/// The user backed out of the external hand-off.
pub const CANCELED: &str = "User Canceled";
/// The external handler returned OK without any payload.
pub const NULL_RESPONSE: &str = "Response not received";
/// The external handler returned a result code nobody expects.
pub const UNKNOWN: &str = "Unknown error occurred";
/// A redirect carried an empty `code` parameter.
pub const AUTH_CODE_INVALID: &str = "Invalid auth code";
/// A redirect carried no `code` parameter.
pub const AUTH_CODE_NOT_PRESENT: &str = "Auth code is not present";
/// `execute` was called while a hand-off was already pending.
pub const ALREADY_IN_PROGRESS: &str = "Authentication already in progress";
/// The optional await timeout elapsed before any result arrived.
pub const TIMED_OUT: &str = "Timed out waiting for authorization response";

/// Classified failure of an authentication attempt.
///
/// Every failure inside the pipeline is normalized into one of these before it
/// reaches the caller of `authenticate()`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    /// The remote returned a failure status for a required call.
    #[error("{0}")]
    Server(String),

    /// Bad local configuration, bad or missing authorization code, user
    /// cancellation, or an unclassified terminal state.
    #[error("{0}")]
    Client(String),

    /// Transport-level failure (connect, TLS, timeout), distinct from an HTTP
    /// error status.
    #[error("{0}")]
    Network(String),
}

impl AuthError {
    pub fn canceled() -> Self {
        AuthError::Client(CANCELED.to_string())
    }

    /// Whether this is the user-cancellation sub-case of `Client`.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::Client(msg) if msg == CANCELED)
    }

    pub fn message(&self) -> &str {
        match self {
            AuthError::Server(msg) | AuthError::Client(msg) | AuthError::Network(msg) => msg,
        }
    }

    /// Label for logging and metrics.
    pub fn kind(&self) -> &'static str {
        match self {
            AuthError::Server(_) => "server_error",
            AuthError::Client(_) => "client_error",
            AuthError::Network(_) => "network_error",
        }
    }
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, AuthError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_is_the_bare_message() {
        assert_eq!(AuthError::canceled().to_string(), "User Canceled");
        assert_eq!(
            AuthError::Server("Bad response 500".into()).to_string(),
            "Bad response 500"
        );
    }

    #[test]
    fn cancellation_is_a_client_sub_case() {
        assert!(AuthError::canceled().is_cancellation());
        assert!(!AuthError::Client(UNKNOWN.into()).is_cancellation());
        assert!(!AuthError::Server(CANCELED.into()).is_cancellation());
    }

    #[test]
    fn kind_labels_are_stable() {
        assert_eq!(AuthError::Server(String::new()).kind(), "server_error");
        assert_eq!(AuthError::Client(String::new()).kind(), "client_error");
        assert_eq!(AuthError::Network(String::new()).kind(), "network_error");
    }

    #[test]
    fn debug_includes_variant_name() {
        let debug = format!("{:?}", AuthError::Network("connection refused".into()));
        assert!(debug.contains("Network"), "got: {debug}");
    }
}
