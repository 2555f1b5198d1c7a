//! OAuth endpoint and parameter constants
//!
//! Public client-side protocol values. Nothing here is a secret; client
//! registration (client id, redirect URI) lives in the bundled SSO config.

/// Default auth host for the authorize, PAR and token endpoints
pub const DEFAULT_AUTH_HOST: &str = "https://auth.uber.com";

/// Authorize path served by companion apps and the web (app links)
pub const UNIVERSAL_AUTHORIZE_PATH: &str = "oauth/v2/universal/authorize";

/// Plain web authorize path, used when no companion app is installed
pub const AUTHORIZE_PATH: &str = "oauth/v2/authorize";

/// Pushed authorization request endpoint
pub const PAR_PATH: &str = "/oauth/v2/par";

/// Token endpoint for code exchange
pub const TOKEN_PATH: &str = "/oauth/v2/token";

/// The only response type this SDK requests
pub const RESPONSE_TYPE: &str = "code";

/// Scope sent with PAR when the SSO config has none
pub const DEFAULT_SCOPE: &str = "profile";

/// Platform name reported in the `sdk` query parameter
pub const SDK_PLATFORM: &str = "rust";

/// SDK version reported in the `sdk_version` query parameter
pub const SDK_VERSION: &str = env!("CARGO_PKG_VERSION");

pub const CLIENT_ID_PARAM: &str = "client_id";
pub const REDIRECT_PARAM: &str = "redirect_uri";
pub const RESPONSE_TYPE_PARAM: &str = "response_type";
pub const SCOPE_PARAM: &str = "scope";
pub const PLATFORM_PARAM: &str = "sdk";
pub const SDK_VERSION_PARAM: &str = "sdk_version";
pub const PROMPT_PARAM: &str = "prompt";
pub const REQUEST_URI_PARAM: &str = "request_uri";
pub const CODE_CHALLENGE_PARAM: &str = "code_challenge";
pub const CODE_CHALLENGE_METHOD_PARAM: &str = "code_challenge_method";

/// PKCE challenge method; plain challenges are never sent
pub const CODE_CHALLENGE_METHOD: &str = "S256";
