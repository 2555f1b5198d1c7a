//! Building blocks of the SSO authentication flow
//!
//! Everything here is either pure or a single network round trip; the
//! stateful hand-off and orchestration live in `sso-link`.
//!
//! Flow, per attempt:
//! 1. `SsoConfigProvider::get_sso_config()` resolves client registration
//! 2. `prefill::encode_login_hint()` + `AuthService::login_par_request()`
//!    when the caller supplied prefill data
//! 3. `pkce::generate_code_verifier()` + `pkce::generate_code_challenge()`
//! 4. `UriConfig::assemble_uri()` builds the authorize URI
//! 5. `AppDiscovery::find_app_for_sso()` picks the companion app, if any
//! 6. `AuthService::token()` exchanges the code for tokens (PKCE only)

pub mod config;
pub mod constants;
pub mod discovery;
pub mod pkce;
pub mod prefill;
pub mod service;
pub mod uri;

pub use config::{SsoConfigProvider, parse_sso_config};
pub use discovery::{AppDiscovery, PackageResolver, StaticPackageResolver};
pub use pkce::{S256Generator, generate_code_challenge, generate_code_verifier};
pub use prefill::encode_login_hint;
pub use service::{AuthService, HttpAuthService, ParRequest, TokenRequest};
pub use uri::{AuthorizePath, UriConfig, append_query_params};
