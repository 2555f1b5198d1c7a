//! Request descriptors for a single authentication attempt
//!
//! An `AuthContext` is built once by the caller and is read-only for the rest
//! of the attempt. The `SsoConfig` comes from the bundled configuration
//! resource and is shared by every attempt made with it.

use serde::{Deserialize, Serialize};

/// Grant type sent to the token endpoint for the PKCE flow.
pub const DEFAULT_GRANT_TYPE: &str = "authorization_code";

const RIDER_APPS: &[&str] = &[
    "com.ubercab",
    "com.ubercab.presidio.development",
    "com.ubercab.rider.internal",
];

const EATS_APPS: &[&str] = &[
    "com.ubercab.eats",
    "com.ubercab.eats.debug",
    "com.ubercab.eats.internal",
];

const DRIVER_APPS: &[&str] = &[
    "com.ubercab.driver",
    "com.ubercab.driver.debug",
    "com.ubercab.driver.internal",
];

/// A companion app family that can service the SSO hand-off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CrossApp {
    Rider,
    Eats,
    Driver,
}

/// Default SSO priority: Rider, then Eats, then Driver.
pub const DEFAULT_APP_PRIORITY: [CrossApp; 3] = [CrossApp::Rider, CrossApp::Eats, CrossApp::Driver];

impl CrossApp {
    /// Installable package identifiers for this app family, most preferred first.
    pub fn packages(self) -> &'static [&'static str] {
        match self {
            CrossApp::Rider => RIDER_APPS,
            CrossApp::Eats => EATS_APPS,
            CrossApp::Driver => DRIVER_APPS,
        }
    }

    /// Label for logging and metrics.
    pub fn label(self) -> &'static str {
        match self {
            CrossApp::Rider => "rider",
            CrossApp::Eats => "eats",
            CrossApp::Driver => "driver",
        }
    }
}

/// Where the user is sent to authenticate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthDestination {
    /// Hand off to the first installed companion app in `app_priority`.
    /// Falls back to the in-app browser when none is installed.
    CrossAppSso { app_priority: Vec<CrossApp> },
    /// Authenticate in a secure browser view owned by the host app.
    InApp,
}

impl AuthDestination {
    pub fn cross_app(app_priority: impl Into<Vec<CrossApp>>) -> Self {
        AuthDestination::CrossAppSso {
            app_priority: app_priority.into(),
        }
    }
}

impl Default for AuthDestination {
    fn default() -> Self {
        AuthDestination::cross_app(DEFAULT_APP_PRIORITY)
    }
}

/// Which OAuth flow to complete after the authorization code arrives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthType {
    /// Return the raw authorization code to the caller.
    AuthCode,
    /// Exchange the code for tokens using the PKCE verifier.
    Pkce { grant_type: String },
}

impl AuthType {
    pub fn pkce() -> Self {
        AuthType::Pkce {
            grant_type: DEFAULT_GRANT_TYPE.to_string(),
        }
    }
}

impl Default for AuthType {
    fn default() -> Self {
        AuthType::pkce()
    }
}

/// OpenID Connect `prompt` hint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Prompt {
    /// Force the user to log in again.
    Login,
    /// Force the consent screen.
    Consent,
}

impl Prompt {
    pub fn as_str(self) -> &'static str {
        match self {
            Prompt::Login => "login",
            Prompt::Consent => "consent",
        }
    }
}

/// Profile hints used to pre-populate the login form.
///
/// Sent to the PAR endpoint as a base64-encoded JSON `login_hint`. Fields that
/// are `None` are left out of the JSON.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PrefillInfo {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(rename = "phone", default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
}

/// Immutable descriptor for one authentication attempt.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AuthContext {
    pub destination: AuthDestination,
    pub auth_type: AuthType,
    pub prefill_info: Option<PrefillInfo>,
    pub prompt: Option<Prompt>,
}

impl AuthContext {
    pub fn new(destination: AuthDestination, auth_type: AuthType) -> Self {
        Self {
            destination,
            auth_type,
            prefill_info: None,
            prompt: None,
        }
    }

    pub fn with_prefill(mut self, prefill_info: PrefillInfo) -> Self {
        self.prefill_info = Some(prefill_info);
        self
    }

    pub fn with_prompt(mut self, prompt: Prompt) -> Self {
        self.prompt = Some(prompt);
        self
    }
}

/// Client registration loaded from the bundled SSO configuration resource.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsoConfig {
    pub client_id: String,
    pub redirect_uri: String,
    pub scope: Option<String>,
}

impl SsoConfig {
    pub fn new(
        client_id: impl Into<String>,
        redirect_uri: impl Into<String>,
        scope: Option<String>,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            redirect_uri: redirect_uri.into(),
            scope,
        }
    }
}
