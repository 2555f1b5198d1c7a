//! Authentication orchestrator
//!
//! Sequences one attempt:
//! 1. Load the SSO config
//! 2. Push the prefill data (PAR) when the caller supplied any
//! 3. Build the per-attempt query params (request_uri, prompt, PKCE challenge)
//! 4. Hand off through the `SsoLink` and wait for the code
//! 5. Return the code, or exchange it for tokens in the PKCE flow
//!
//! Every failure is folded into the returned `AuthResult`.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use auth_api::{
    AuthContext, AuthError, AuthProviding, AuthResult, AuthToken, AuthType, ParResponse,
    PkceGenerator, PrefillInfo, QueryParams, RedirectParams, Result, SsoConfig, SsoLink,
};
use auth_core::constants::{
    CODE_CHALLENGE_METHOD, CODE_CHALLENGE_METHOD_PARAM, CODE_CHALLENGE_PARAM, DEFAULT_SCOPE,
    PROMPT_PARAM, REQUEST_URI_PARAM, RESPONSE_TYPE,
};
use auth_core::{
    AuthService, ParRequest, S256Generator, SsoConfigProvider, TokenRequest, encode_login_hint,
};
use common::Secret;
use tracing::{Instrument, debug, info, info_span, warn};
use url::Url;
use uuid::Uuid;

use crate::metrics;

/// What to do when the pushed authorization request fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParPolicy {
    /// Log, skip `request_uri` and keep going
    #[default]
    Lenient,
    /// Fail the attempt
    Strict,
}

pub struct AuthProvider {
    context: AuthContext,
    config_provider: SsoConfigProvider,
    sso_link: Arc<dyn SsoLink>,
    auth_service: Arc<dyn AuthService>,
    pkce: Arc<dyn PkceGenerator>,
    par_policy: ParPolicy,
}

impl AuthProvider {
    pub fn new(
        context: AuthContext,
        config_provider: SsoConfigProvider,
        sso_link: Arc<dyn SsoLink>,
        auth_service: Arc<dyn AuthService>,
    ) -> Self {
        Self {
            context,
            config_provider,
            sso_link,
            auth_service,
            pkce: Arc::new(S256Generator),
            par_policy: ParPolicy::default(),
        }
    }

    pub fn with_pkce_generator(mut self, pkce: Arc<dyn PkceGenerator>) -> Self {
        self.pkce = pkce;
        self
    }

    pub fn with_par_policy(mut self, par_policy: ParPolicy) -> Self {
        self.par_policy = par_policy;
        self
    }

    pub fn context(&self) -> &AuthContext {
        &self.context
    }

    /// Deliver a redirect that reached the host as a deep link.
    ///
    /// Only redirects carrying a non-empty `code` are accepted.
    pub fn handle_redirect_uri(&self, uri: &Url) -> Result<()> {
        let params = RedirectParams::from_url(uri);
        let code = params.auth_code()?;
        self.sso_link.handle_auth_code(code);
        Ok(())
    }

    async fn run(&self) -> AuthResult {
        let config = self.config_provider.get_sso_config().await?;

        let par = match &self.context.prefill_info {
            Some(prefill) => self.push_authorization_request(&config, prefill).await?,
            None => ParResponse::none(),
        };

        let code_verifier = Secret::new(self.pkce.generate_code_verifier());
        let query_params = self.query_params(&par, &code_verifier);

        let code = self.sso_link.execute(&config, &query_params).await?;
        debug!("authorization code received");

        match &self.context.auth_type {
            AuthType::AuthCode => Ok(AuthToken::from_auth_code(code)),
            AuthType::Pkce { grant_type } => {
                self.exchange_code(&config, &code_verifier, grant_type, &code)
                    .await
            }
        }
    }

    fn query_params(&self, par: &ParResponse, code_verifier: &Secret<String>) -> QueryParams {
        let mut params = QueryParams::new();
        if par.has_request_uri() {
            params.insert(REQUEST_URI_PARAM.to_string(), par.request_uri.clone());
        }
        if let Some(prompt) = self.context.prompt {
            params.insert(PROMPT_PARAM.to_string(), prompt.as_str().to_string());
        }
        if let AuthType::Pkce { .. } = self.context.auth_type {
            params.insert(
                CODE_CHALLENGE_PARAM.to_string(),
                self.pkce.generate_code_challenge(code_verifier.expose()),
            );
            params.insert(
                CODE_CHALLENGE_METHOD_PARAM.to_string(),
                CODE_CHALLENGE_METHOD.to_string(),
            );
        }
        params
    }

    async fn push_authorization_request(
        &self,
        config: &SsoConfig,
        prefill: &PrefillInfo,
    ) -> Result<ParResponse> {
        match self.try_push_authorization_request(config, prefill).await {
            Ok(par) => {
                debug!(expires_in = par.expires_in, "pushed authorization request accepted");
                Ok(par)
            }
            Err((reason, e)) => {
                metrics::record_par_failure(reason);
                match self.par_policy {
                    ParPolicy::Lenient => {
                        warn!(reason, error = %e, "pushed authorization request failed, continuing without request_uri");
                        Ok(ParResponse::none())
                    }
                    ParPolicy::Strict => Err(e),
                }
            }
        }
    }

    async fn try_push_authorization_request(
        &self,
        config: &SsoConfig,
        prefill: &PrefillInfo,
    ) -> std::result::Result<ParResponse, (&'static str, AuthError)> {
        let login_hint = encode_login_hint(prefill).map_err(|e| ("encoding", e))?;
        let request = ParRequest {
            client_id: &config.client_id,
            response_type: RESPONSE_TYPE,
            login_hint: &login_hint,
            scope: config.scope.as_deref().unwrap_or(DEFAULT_SCOPE),
        };

        let response = self
            .auth_service
            .login_par_request(request)
            .await
            .map_err(|e| (e.kind(), e))?;

        if !response.is_successful() {
            let e = AuthError::Server(format!("Bad response {}", response.status));
            return Err(("bad_status", e));
        }
        response.body.ok_or_else(|| {
            let e = AuthError::Server(format!("Bad response {}", response.status));
            ("empty_body", e)
        })
    }

    async fn exchange_code(
        &self,
        config: &SsoConfig,
        code_verifier: &Secret<String>,
        grant_type: &str,
        code: &str,
    ) -> AuthResult {
        let request = TokenRequest {
            client_id: &config.client_id,
            code_verifier: code_verifier.expose(),
            grant_type,
            redirect_uri: &config.redirect_uri,
            code,
        };
        let response = self.auth_service.token(request).await?;

        if !response.is_successful() {
            return Err(AuthError::Client(format!(
                "Token request failed with code: {}",
                response.status
            )));
        }
        response.body.ok_or_else(|| {
            AuthError::Client("Token request failed with empty response".to_string())
        })
    }
}

impl AuthProviding for AuthProvider {
    fn authenticate(&self) -> Pin<Box<dyn Future<Output = AuthResult> + Send + '_>> {
        let attempt_id = Uuid::new_v4();
        let span = info_span!(
            "authenticate",
            %attempt_id,
            auth_type = match self.context.auth_type {
                AuthType::AuthCode => "auth_code",
                AuthType::Pkce { .. } => "pkce",
            },
        );

        Box::pin(
            async move {
                let result = self.run().await;
                metrics::record_attempt(&result);
                match &result {
                    Ok(_) => info!("authentication succeeded"),
                    Err(e) if e.is_cancellation() => info!("authentication canceled by user"),
                    Err(e) => warn!(error = %e, kind = e.kind(), "authentication failed"),
                }
                result
            }
            .instrument(span),
        )
    }

    fn handle_auth_code(&self, auth_code: &str) {
        self.sso_link.handle_auth_code(auth_code);
    }

    fn is_auth_in_progress(&self) -> bool {
        self.sso_link.is_auth_in_progress()
    }
}
