//! Token service client
//!
//! Two unauthenticated form POSTs against the auth host:
//! 1. Pushed authorization request (`/oauth/v2/par`), carrying the prefill
//!    `login_hint` so it never appears in the browser URL
//! 2. Authorization code exchange (`/oauth/v2/token`), proving possession of
//!    the PKCE verifier
//!
//! HTTP status is reported, not judged: a non-2xx comes back as a
//! `ServiceResponse` and the caller decides whether it is fatal. Only
//! transport failures and undecodable 2xx bodies are errors here.

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use auth_api::{AuthError, AuthToken, ParResponse, Result, ServiceResponse};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::debug;
use url::Url;

use crate::constants::{PAR_PATH, TOKEN_PATH};
use crate::uri::UriConfig;

/// Request timeout for the default HTTP client
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Form body of a pushed authorization request.
#[derive(Debug, Clone, Serialize)]
pub struct ParRequest<'a> {
    pub client_id: &'a str,
    pub response_type: &'a str,
    pub login_hint: &'a str,
    pub scope: &'a str,
}

/// Form body of an authorization code exchange.
#[derive(Clone, Serialize)]
pub struct TokenRequest<'a> {
    pub client_id: &'a str,
    pub code_verifier: &'a str,
    pub grant_type: &'a str,
    pub redirect_uri: &'a str,
    pub code: &'a str,
}

impl std::fmt::Debug for TokenRequest<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenRequest")
            .field("client_id", &self.client_id)
            .field("code_verifier", &"[REDACTED]")
            .field("grant_type", &self.grant_type)
            .field("redirect_uri", &self.redirect_uri)
            .field("code", &"[REDACTED]")
            .finish()
    }
}

type ServiceFuture<'a, T> = Pin<Box<dyn Future<Output = Result<ServiceResponse<T>>> + Send + 'a>>;

/// Calls to the auth server's token service.
///
/// Boxed futures keep the trait dyn-compatible so the orchestrator can hold
/// an `Arc<dyn AuthService>` and tests can swap in a fake.
pub trait AuthService: Send + Sync {
    fn login_par_request<'a>(&'a self, request: ParRequest<'a>) -> ServiceFuture<'a, ParResponse>;

    fn token<'a>(&'a self, request: TokenRequest<'a>) -> ServiceFuture<'a, AuthToken>;
}

/// `reqwest`-backed token service client.
#[derive(Debug, Clone)]
pub struct HttpAuthService {
    client: reqwest::Client,
    par_endpoint: Url,
    token_endpoint: Url,
}

impl HttpAuthService {
    /// Use a caller-provided client (shared connection pool, custom TLS).
    pub fn new(client: reqwest::Client, uri_config: &UriConfig) -> Result<Self> {
        let host = uri_config.auth_host();
        Ok(Self {
            client,
            par_endpoint: endpoint(host, PAR_PATH)?,
            token_endpoint: endpoint(host, TOKEN_PATH)?,
        })
    }

    /// Client with the default request timeout.
    pub fn with_defaults(uri_config: &UriConfig) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(DEFAULT_REQUEST_TIMEOUT)
            .build()
            .map_err(|e| AuthError::Client(format!("failed to build HTTP client: {e}")))?;
        Self::new(client, uri_config)
    }

    async fn post_form<T, F>(&self, endpoint: &Url, form: &F) -> Result<ServiceResponse<T>>
    where
        T: DeserializeOwned,
        F: Serialize + ?Sized,
    {
        let response = self
            .client
            .post(endpoint.clone())
            .form(form)
            .send()
            .await
            .map_err(|e| AuthError::Network(format!("request to {endpoint} failed: {e}")))?;

        let status = response.status();
        let bytes = response
            .bytes()
            .await
            .map_err(|e| AuthError::Network(format!("reading response from {endpoint}: {e}")))?;
        debug!(endpoint = %endpoint, status = status.as_u16(), body_len = bytes.len(), "token service response");

        if !status.is_success() || bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(ServiceResponse::new(status.as_u16(), None));
        }

        let body = serde_json::from_slice::<T>(&bytes)
            .map_err(|e| AuthError::Server(format!("invalid response from {endpoint}: {e}")))?;
        Ok(ServiceResponse::new(status.as_u16(), Some(body)))
    }
}

impl AuthService for HttpAuthService {
    fn login_par_request<'a>(&'a self, request: ParRequest<'a>) -> ServiceFuture<'a, ParResponse> {
        Box::pin(async move { self.post_form(&self.par_endpoint, &request).await })
    }

    fn token<'a>(&'a self, request: TokenRequest<'a>) -> ServiceFuture<'a, AuthToken> {
        Box::pin(async move { self.post_form(&self.token_endpoint, &request).await })
    }
}

fn endpoint(host: &Url, path: &str) -> Result<Url> {
    host.join(path)
        .map_err(|e| AuthError::Client(format!("invalid endpoint {host}{path}: {e}")))
}
