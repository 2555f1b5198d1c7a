//! Responses produced by an authentication attempt

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::AuthError;

/// Terminal outcome of one attempt: the token set, or a classified failure.
pub type AuthResult = std::result::Result<AuthToken, AuthError>;

/// Credentials returned to the caller on success.
///
/// In the authorization-code flow only `auth_code` is set. In the PKCE flow
/// this is the decoded token endpoint response and `auth_code` stays `None`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthToken {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_code: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub access_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires (delta, not absolute)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scope: Option<String>,
}

impl AuthToken {
    pub fn from_auth_code(code: impl Into<String>) -> Self {
        Self {
            auth_code: Some(code.into()),
            ..Default::default()
        }
    }
}

/// Response from the pushed authorization request endpoint.
///
/// An empty `request_uri` means no PAR was performed (or it was skipped after
/// a failure) and nothing should be forwarded to the authorize endpoint.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParResponse {
    #[serde(default)]
    pub request_uri: String,
    /// Lifetime of `request_uri` in seconds
    #[serde(default, deserialize_with = "lenient_seconds")]
    pub expires_in: Option<u64>,
}

/// Servers send `expires_in` as a number or a numeric string. Anything else
/// is advisory noise and reads as `None`.
fn lenient_seconds<'de, D>(deserializer: D) -> Result<Option<u64>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Seconds {
        Number(u64),
        Text(String),
        Other(serde::de::IgnoredAny),
    }

    Ok(match Option::<Seconds>::deserialize(deserializer)? {
        Some(Seconds::Number(n)) => Some(n),
        Some(Seconds::Text(s)) => s.trim().parse().ok(),
        Some(Seconds::Other(_)) | None => None,
    })
}

impl ParResponse {
    /// The "no PAR performed" sentinel.
    pub fn none() -> Self {
        Self::default()
    }

    pub fn has_request_uri(&self) -> bool {
        !self.request_uri.is_empty()
    }
}

/// HTTP-level outcome of a token service call.
///
/// Transport failures never produce one of these; they surface as
/// `AuthError::Network` instead. `body` is `None` when the server sent an
/// empty body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceResponse<T> {
    pub status: u16,
    pub body: Option<T>,
}

impl<T> ServiceResponse<T> {
    pub fn new(status: u16, body: Option<T>) -> Self {
        Self { status, body }
    }

    /// Whether the status is 2xx.
    pub fn is_successful(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
