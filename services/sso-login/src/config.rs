//! Configuration types and loading
//!
//! Config precedence: CLI args > env vars > config file > defaults.
//! Client registration (client id, redirect URI, scope) lives in the separate
//! JSON SSO config referenced by `auth.sso_config_path`, so the TOML holds no
//! credentials.

use auth_api::{AuthContext, AuthDestination, AuthType, CrossApp, DEFAULT_APP_PRIORITY, PrefillInfo, Prompt};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Root configuration
#[derive(Debug, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub callback: CallbackConfig,
    pub auth: AuthConfig,
    #[serde(default)]
    pub log_format: LogFormat,
}

/// Local redirect listener settings
#[derive(Debug, Deserialize)]
pub struct CallbackConfig {
    #[serde(default = "default_listen_addr")]
    pub listen_addr: SocketAddr,
    /// Path the redirect URI points at
    #[serde(default = "default_callback_path")]
    pub path: String,
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            path: default_callback_path(),
        }
    }
}

/// Where the authorize page is opened
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DestinationSetting {
    /// Companion app if one is installed, browser otherwise
    #[default]
    CrossApp,
    /// Always the browser
    InApp,
}

/// Which flow to finish
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthTypeSetting {
    #[default]
    Pkce,
    AuthCode,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
}

/// Authentication attempt settings
#[derive(Debug, Deserialize)]
pub struct AuthConfig {
    /// JSON file with `client_id`, `redirect_uri` and optional `scope`
    pub sso_config_path: PathBuf,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default)]
    pub destination: DestinationSetting,
    #[serde(default = "default_apps")]
    pub apps: Vec<CrossApp>,
    #[serde(default)]
    pub auth_type: AuthTypeSetting,
    #[serde(default)]
    pub prompt: Option<Prompt>,
    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
    /// Companion app packages treated as installed
    #[serde(default)]
    pub installed_packages: Vec<String>,
    /// Browser program for the authorize page. The system URL opener when unset.
    #[serde(default)]
    pub browser: Option<String>,
    #[serde(default)]
    pub prefill: Option<PrefillInfo>,
}

fn default_listen_addr() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 8765))
}

fn default_callback_path() -> String {
    "/callback".to_string()
}

fn default_host() -> String {
    auth_core::constants::DEFAULT_AUTH_HOST.to_string()
}

fn default_apps() -> Vec<CrossApp> {
    DEFAULT_APP_PRIORITY.to_vec()
}

fn default_timeout() -> u64 {
    300
}

impl Config {
    /// Load and validate configuration from a TOML file.
    pub fn load(path: &Path) -> common::Result<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> common::Result<()> {
        if !self.auth.host.starts_with("http://") && !self.auth.host.starts_with("https://") {
            return Err(common::Error::Config(format!(
                "auth.host must start with http:// or https://, got: {}",
                self.auth.host
            )));
        }

        if self.auth.timeout_secs == 0 {
            return Err(common::Error::InvalidValue {
                field: "auth.timeout_secs",
                reason: "must be greater than 0".into(),
            });
        }

        if self.auth.destination == DestinationSetting::CrossApp && self.auth.apps.is_empty() {
            return Err(common::Error::InvalidValue {
                field: "auth.apps",
                reason: "cross_app destination needs at least one app".into(),
            });
        }

        let path = &self.callback.path;
        if !path.starts_with('/') || path == "/" || path == "/health" || path == "/metrics" {
            return Err(common::Error::InvalidValue {
                field: "callback.path",
                reason: format!("must be an absolute path other than /, /health and /metrics, got: {path}"),
            });
        }

        Ok(())
    }

    /// Resolve config file path from CLI arg or SSO_LOGIN_CONFIG env var.
    pub fn resolve_path(cli_path: Option<&str>) -> PathBuf {
        if let Some(p) = cli_path {
            return PathBuf::from(p);
        }
        if let Ok(p) = std::env::var("SSO_LOGIN_CONFIG") {
            return PathBuf::from(p);
        }
        PathBuf::from("sso-login.toml")
    }

    /// Request descriptor for the attempt this config describes.
    pub fn auth_context(&self) -> AuthContext {
        let destination = match self.auth.destination {
            DestinationSetting::CrossApp => AuthDestination::cross_app(self.auth.apps.clone()),
            DestinationSetting::InApp => AuthDestination::InApp,
        };
        let auth_type = match self.auth.auth_type {
            AuthTypeSetting::Pkce => AuthType::pkce(),
            AuthTypeSetting::AuthCode => AuthType::AuthCode,
        };

        let mut context = AuthContext::new(destination, auth_type);
        if let Some(prefill) = &self.auth.prefill {
            context = context.with_prefill(prefill.clone());
        }
        if let Some(prompt) = self.auth.prompt {
            context = context.with_prompt(prompt);
        }
        context
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.auth.timeout_secs)
    }
}
