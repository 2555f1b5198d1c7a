//! Authorization request URI assembly
//!
//! Pure functions of their inputs: no I/O, no randomness. Per-attempt extras
//! (`code_challenge`, `prompt`, `request_uri`) are layered on afterwards with
//! [`append_query_params`].

use auth_api::{AuthError, QueryParams, Result};
use url::Url;

use crate::constants::{
    AUTHORIZE_PATH, CLIENT_ID_PARAM, DEFAULT_AUTH_HOST, PLATFORM_PARAM, REDIRECT_PARAM,
    RESPONSE_TYPE_PARAM, SCOPE_PARAM, SDK_PLATFORM, SDK_VERSION, SDK_VERSION_PARAM,
    UNIVERSAL_AUTHORIZE_PATH,
};

/// Which authorize endpoint the URI targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AuthorizePath {
    /// `oauth/v2/universal/authorize`, claimed by companion apps
    #[default]
    Universal,
    /// `oauth/v2/authorize`, web only
    Standard,
}

impl AuthorizePath {
    pub fn as_str(self) -> &'static str {
        match self {
            AuthorizePath::Universal => UNIVERSAL_AUTHORIZE_PATH,
            AuthorizePath::Standard => AUTHORIZE_PATH,
        }
    }
}

/// Scheme and host of the auth server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UriConfig {
    auth_host: Url,
}

impl UriConfig {
    /// Point at a non-default auth host (staging, or a local mock in tests).
    pub fn new(auth_host: &str) -> Result<Self> {
        let auth_host = Url::parse(auth_host)
            .map_err(|e| AuthError::Client(format!("Invalid auth host `{auth_host}`: {e}")))?;
        if auth_host.cannot_be_a_base() {
            return Err(AuthError::Client(format!(
                "Invalid auth host `{auth_host}`: not a base URL"
            )));
        }
        Ok(Self { auth_host })
    }

    /// Base URL for the token service endpoints.
    pub fn auth_host(&self) -> &Url {
        &self.auth_host
    }

    /// Build the authorize URI.
    ///
    /// Parameters are emitted in a fixed order: `client_id`, `response_type`,
    /// `redirect_uri`, `scope` (only when present), `sdk_version`, `sdk`.
    pub fn assemble_uri(
        &self,
        client_id: &str,
        response_type: &str,
        redirect_uri: &str,
        scope: Option<&str>,
        path: AuthorizePath,
    ) -> Url {
        let mut uri = self.auth_host.clone();
        uri.set_path(path.as_str());
        uri.set_query(None);
        uri.set_fragment(None);
        {
            let mut query = uri.query_pairs_mut();
            query
                .append_pair(CLIENT_ID_PARAM, client_id)
                .append_pair(RESPONSE_TYPE_PARAM, &response_type.to_lowercase())
                .append_pair(REDIRECT_PARAM, redirect_uri);
            if let Some(scope) = scope {
                query.append_pair(SCOPE_PARAM, scope);
            }
            query
                .append_pair(SDK_VERSION_PARAM, SDK_VERSION)
                .append_pair(PLATFORM_PARAM, SDK_PLATFORM);
        }
        uri
    }
}

impl Default for UriConfig {
    fn default() -> Self {
        Self {
            auth_host: Url::parse(DEFAULT_AUTH_HOST).expect("default auth host is a valid URL"),
        }
    }
}

/// Append per-attempt parameters after the fixed ones.
pub fn append_query_params(uri: &mut Url, params: &QueryParams) {
    if params.is_empty() {
        return;
    }
    let mut query = uri.query_pairs_mut();
    for (key, value) in params {
        query.append_pair(key, value);
    }
}
