//! Public surface of the SSO auth SDK
//!
//! Defines the request/response data model, the `AuthError` taxonomy and the
//! traits that decouple the authentication orchestrator from its
//! collaborators:
//! - `AuthProviding` is what the embedding UI calls
//! - `SsoLink` dispatches the hand-off and awaits the redirect
//! - `AppDiscovering` picks an installed companion app
//! - `PkceGenerator` produces verifier/challenge pairs
//!
//! Async methods return `Pin<Box<dyn Future>>` so the traits stay
//! dyn-compatible (`Arc<dyn SsoLink>`).

pub mod error;
pub mod redirect;
pub mod request;
pub mod response;

pub use error::{AuthError, Result};
pub use redirect::{ExternalResult, RedirectParams};
pub use request::{
    AuthContext, AuthDestination, AuthType, CrossApp, DEFAULT_APP_PRIORITY, DEFAULT_GRANT_TYPE,
    PrefillInfo, Prompt, SsoConfig,
};
pub use response::{AuthResult, AuthToken, ParResponse, ServiceResponse};

use std::collections::BTreeMap;
use std::future::Future;
use std::pin::Pin;

use url::Url;

/// Extra per-attempt query parameters layered onto the authorize URI.
pub type QueryParams = BTreeMap<String, String>;

/// Entry point used by the embedding UI.
pub trait AuthProviding: Send + Sync {
    /// Run the whole attempt. Never panics and never returns a raw transport
    /// error: every failure is classified into `AuthError`.
    fn authenticate(&self) -> Pin<Box<dyn Future<Output = AuthResult> + Send + '_>>;

    /// Deliver an authorization code that arrived through a deep link rather
    /// than through the launched handler's result.
    fn handle_auth_code(&self, auth_code: &str);

    /// True between dispatch and the terminal result. Lets the UI tell
    /// "user backed out before anything launched" apart from "external
    /// handler launched and the user came back".
    fn is_auth_in_progress(&self) -> bool;
}

/// Dispatches the authorization request to an external handler and awaits
/// the single terminal result.
pub trait SsoLink: Send + Sync {
    /// Build the authorize URI from `config` plus `query_params`, hand it off
    /// and resolve with the authorization code.
    fn execute<'a>(
        &'a self,
        config: &'a SsoConfig,
        query_params: &'a QueryParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>>;

    /// Complete the pending attempt with a code delivered via deep link.
    /// No-op if the attempt already completed.
    fn handle_auth_code(&self, auth_code: &str);

    fn is_auth_in_progress(&self) -> bool;
}

/// Finds the installed companion app that should handle the SSO hand-off.
pub trait AppDiscovering: Send + Sync {
    /// First package, in `app_priority` order, that can handle `uri`.
    /// `None` is an expected outcome and not an error.
    fn find_app_for_sso(&self, uri: &Url, app_priority: &[CrossApp]) -> Option<String>;
}

/// Source of PKCE material for one attempt.
pub trait PkceGenerator: Send + Sync {
    fn generate_code_verifier(&self) -> String;

    fn generate_code_challenge(&self, code_verifier: &str) -> String;
}
