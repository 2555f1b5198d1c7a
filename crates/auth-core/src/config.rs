//! SSO client configuration loading
//!
//! The configuration document is a flat JSON object:
//!
//! ```json
//! { "client_id": "...", "redirect_uri": "...", "scope": "profile" }
//! ```
//!
//! `client_id` and `redirect_uri` are required. Values are trimmed and a
//! blank `scope` is treated as absent.

use std::path::PathBuf;

use auth_api::{AuthError, Result, SsoConfig};
use serde_json::{Map, Value};
use tracing::debug;

const CLIENT_ID_KEY: &str = "client_id";
const REDIRECT_URI_KEY: &str = "redirect_uri";
const SCOPE_KEY: &str = "scope";

/// Where the SSO configuration comes from.
#[derive(Debug, Clone)]
pub enum SsoConfigProvider {
    /// JSON file on disk, read on every call
    File(PathBuf),
    /// JSON document compiled into the binary with `include_str!`
    Bundled(&'static str),
    /// Already-resolved configuration
    Static(SsoConfig),
}

impl SsoConfigProvider {
    pub async fn get_sso_config(&self) -> Result<SsoConfig> {
        match self {
            SsoConfigProvider::File(path) => {
                let contents = tokio::fs::read_to_string(path)
                    .await
                    .map_err(|e| read_error(format!("{}: {e}", path.display())))?;
                debug!(path = %path.display(), "loaded sso config");
                parse_sso_config(&contents)
            }
            SsoConfigProvider::Bundled(contents) => parse_sso_config(contents),
            SsoConfigProvider::Static(config) => Ok(config.clone()),
        }
    }
}

/// Parse and validate a configuration document.
pub fn parse_sso_config(contents: &str) -> Result<SsoConfig> {
    let value: Value = serde_json::from_str(contents).map_err(|e| read_error(e.to_string()))?;
    let Value::Object(object) = value else {
        return Err(read_error("expected a JSON object".into()));
    };

    let client_id = required(&object, CLIENT_ID_KEY)?;
    let redirect_uri = required(&object, REDIRECT_URI_KEY)?;
    let scope = optional(&object, SCOPE_KEY);

    Ok(SsoConfig {
        client_id,
        redirect_uri,
        scope,
    })
}

fn read_error(detail: String) -> AuthError {
    AuthError::Client(format!("Failed to read configuration: {detail}"))
}

fn optional(object: &Map<String, Value>, key: &str) -> Option<String> {
    object
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn required(object: &Map<String, Value>, key: &str) -> Result<String> {
    optional(object, key).ok_or_else(|| {
        AuthError::Client(format!(
            "{key} is required but not specified in the configuration"
        ))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn parses_all_fields() {
        let config = parse_sso_config(
            r#"{"client_id":"testClientId","redirect_uri":"testRedirectUri","scope":"testScope"}"#,
        )
        .unwrap();
        assert_eq!(config.client_id, "testClientId");
        assert_eq!(config.redirect_uri, "testRedirectUri");
        assert_eq!(config.scope.as_deref(), Some("testScope"));
    }

    #[test]
    fn scope_is_optional() {
        let config =
            parse_sso_config(r#"{"client_id":"id","redirect_uri":"uri"}"#).unwrap();
        assert!(config.scope.is_none());

        let blank =
            parse_sso_config(r#"{"client_id":"id","redirect_uri":"uri","scope":"  "}"#).unwrap();
        assert!(blank.scope.is_none());
    }

    #[test]
    fn values_are_trimmed() {
        let config =
            parse_sso_config(r#"{"client_id":"  id ","redirect_uri":"uri\n"}"#).unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.redirect_uri, "uri");
    }

    #[test]
    fn missing_client_id_is_client_error() {
        let err = parse_sso_config(r#"{"redirect_uri":"uri"}"#).unwrap_err();
        assert_eq!(
            err,
            AuthError::Client("client_id is required but not specified in the configuration".into())
        );
    }

    #[test]
    fn blank_redirect_uri_is_client_error() {
        let err = parse_sso_config(r#"{"client_id":"id","redirect_uri":""}"#).unwrap_err();
        assert_eq!(
            err.message(),
            "redirect_uri is required but not specified in the configuration"
        );
    }

    #[test]
    fn malformed_json_is_client_error() {
        let err = parse_sso_config("{not json").unwrap_err();
        assert!(matches!(err, AuthError::Client(_)));
        assert!(err.message().starts_with("Failed to read configuration:"), "got: {err}");
    }

    #[test]
    fn non_object_document_is_client_error() {
        let err = parse_sso_config(r#"["client_id"]"#).unwrap_err();
        assert!(err.message().starts_with("Failed to read configuration:"));
    }

    #[tokio::test]
    async fn file_provider_reads_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"client_id":"id","redirect_uri":"uri","scope":"profile"}}"#).unwrap();

        let provider = SsoConfigProvider::File(file.path().to_path_buf());
        let config = provider.get_sso_config().await.unwrap();
        assert_eq!(config.client_id, "id");
        assert_eq!(config.scope.as_deref(), Some("profile"));
    }

    #[tokio::test]
    async fn missing_file_is_client_error() {
        let dir = tempfile::tempdir().unwrap();
        let provider = SsoConfigProvider::File(dir.path().join("sso_config.json"));
        let err = provider.get_sso_config().await.unwrap_err();
        assert!(err.message().starts_with("Failed to read configuration:"));
    }

    #[tokio::test]
    async fn bundled_and_static_providers() {
        let bundled = SsoConfigProvider::Bundled(r#"{"client_id":"a","redirect_uri":"b"}"#);
        assert_eq!(bundled.get_sso_config().await.unwrap().client_id, "a");

        let config = SsoConfig::new("c", "d", None);
        let fixed = SsoConfigProvider::Static(config.clone());
        assert_eq!(fixed.get_sso_config().await.unwrap(), config);
    }
}
