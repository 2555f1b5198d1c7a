//! Universal SSO link: hand-off to a companion app or the secure browser
//!
//! `execute` builds the authorize URI, launches one external handler and
//! waits for its single result. Cross-app destinations try app discovery
//! first and fall back to the browser on the plain web authorize path.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use auth_api::error::{AUTH_CODE_INVALID, TIMED_OUT};
use auth_api::{AppDiscovering, AuthDestination, AuthError, QueryParams, Result, SsoConfig, SsoLink};
use auth_core::constants::RESPONSE_TYPE;
use auth_core::{AuthorizePath, UriConfig, append_query_params};
use tracing::{debug, info, warn};
use url::Url;

use crate::launcher::{AppLauncher, CustomTabsLauncher};
use crate::metrics;
use crate::result::{AttemptGuard, ResultChannel, ResultReceiver, ResultSender};
use crate::state::{Handler, LinkState};

pub struct UniversalSsoLink {
    destination: AuthDestination,
    uri_config: UriConfig,
    discovery: Arc<dyn AppDiscovering>,
    app_launcher: Arc<dyn AppLauncher>,
    browser_launcher: Arc<dyn CustomTabsLauncher>,
    channel: Arc<ResultChannel>,
    timeout: Option<Duration>,
}

impl UniversalSsoLink {
    pub fn new(
        destination: AuthDestination,
        discovery: Arc<dyn AppDiscovering>,
        app_launcher: Arc<dyn AppLauncher>,
        browser_launcher: Arc<dyn CustomTabsLauncher>,
    ) -> Self {
        Self {
            destination,
            uri_config: UriConfig::default(),
            discovery,
            app_launcher,
            browser_launcher,
            channel: ResultChannel::new(),
            timeout: None,
        }
    }

    pub fn with_uri_config(mut self, uri_config: UriConfig) -> Self {
        self.uri_config = uri_config;
        self
    }

    /// Give up waiting after `timeout`. By default the wait is unbounded.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    pub fn state(&self) -> LinkState {
        self.channel.state()
    }

    fn authorize_uri(&self, config: &SsoConfig, query_params: &QueryParams, path: AuthorizePath) -> Url {
        let mut uri = self.uri_config.assemble_uri(
            &config.client_id,
            RESPONSE_TYPE,
            &config.redirect_uri,
            config.scope.as_deref(),
            path,
        );
        append_query_params(&mut uri, query_params);
        uri
    }

    fn dispatch(
        &self,
        config: &SsoConfig,
        query_params: &QueryParams,
        sender: ResultSender,
    ) -> Result<Handler> {
        let uri = self.authorize_uri(config, query_params, AuthorizePath::Universal);

        let app_priority = match &self.destination {
            AuthDestination::CrossAppSso { app_priority } => app_priority,
            AuthDestination::InApp => {
                self.browser_launcher.launch(&uri, sender)?;
                return Ok(Handler::Browser);
            }
        };

        match self.discovery.find_app_for_sso(&uri, app_priority) {
            Some(package) => {
                info!(package = %package, "handing off to companion app");
                self.app_launcher.launch(&package, &uri, sender)?;
                Ok(Handler::App)
            }
            None => {
                info!("no companion app installed, falling back to browser");
                let fallback = self.authorize_uri(config, query_params, AuthorizePath::Standard);
                self.browser_launcher.launch(&fallback, sender)?;
                Ok(Handler::Browser)
            }
        }
    }

    async fn await_result(&self, attempt: u64, mut receiver: ResultReceiver) -> Result<String> {
        if let Some(timeout) = self.timeout {
            match tokio::time::timeout(timeout, &mut receiver).await {
                Ok(received) => return received.unwrap_or_else(|_| Err(AuthError::canceled())),
                Err(_) => {
                    warn!(timeout_secs = timeout.as_secs(), "timed out waiting for authorization response");
                    // Loses to any result that raced in; the receiver then
                    // yields that one instead.
                    self.channel
                        .resolve(Some(attempt), Err(AuthError::Client(TIMED_OUT.to_string())));
                }
            }
        }
        receiver.await.unwrap_or_else(|_| Err(AuthError::canceled()))
    }

    async fn run(&self, config: &SsoConfig, query_params: &QueryParams) -> Result<String> {
        let (sender, receiver) = self.channel.begin()?;
        let attempt = sender.attempt();
        // Cancels the attempt if this future is dropped before an outcome
        let _guard = AttemptGuard::new(Arc::clone(&self.channel), attempt);

        match self.dispatch(config, query_params, sender.clone()) {
            Ok(handler) => {
                metrics::record_dispatch(handler);
                self.channel.launched(attempt, handler);
                debug!(handler = handler.label(), "awaiting external result");
            }
            Err(e) => {
                warn!(error = %e, "failed to launch external handler");
                sender.complete(Err(e));
            }
        }

        // Only the launcher's clones may keep the attempt open from here
        drop(sender);
        self.await_result(attempt, receiver).await
    }
}

impl SsoLink for UniversalSsoLink {
    fn execute<'a>(
        &'a self,
        config: &'a SsoConfig,
        query_params: &'a QueryParams,
    ) -> Pin<Box<dyn Future<Output = Result<String>> + Send + 'a>> {
        Box::pin(self.run(config, query_params))
    }

    fn handle_auth_code(&self, auth_code: &str) {
        let result = if auth_code.trim().is_empty() {
            Err(AuthError::Client(AUTH_CODE_INVALID.to_string()))
        } else {
            Ok(auth_code.to_string())
        };
        self.channel.resolve(None, result);
    }

    fn is_auth_in_progress(&self) -> bool {
        self.channel.is_in_progress()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    use auth_api::error::{ALREADY_IN_PROGRESS, CANCELED, UNKNOWN};
    use auth_api::{CrossApp, ExternalResult, RedirectParams};
    use auth_core::{AppDiscovery, StaticPackageResolver};

    /// What a fake launcher does with the sender it is given.
    #[derive(Clone)]
    enum Reply {
        Now(ExternalResult),
        Keep,
        Drop,
        Fail(AuthError),
    }

    struct FakeLauncher {
        reply: Reply,
        launches: Mutex<Vec<(Option<String>, Url)>>,
        kept: Mutex<Option<ResultSender>>,
    }

    impl FakeLauncher {
        fn new(reply: Reply) -> Arc<Self> {
            Arc::new(Self {
                reply,
                launches: Mutex::default(),
                kept: Mutex::default(),
            })
        }

        fn record(&self, package: Option<&str>, uri: &Url, sender: ResultSender) -> Result<()> {
            self.launches
                .lock()
                .unwrap()
                .push((package.map(str::to_string), uri.clone()));
            match &self.reply {
                Reply::Now(result) => {
                    sender.send(result.clone());
                }
                Reply::Keep => *self.kept.lock().unwrap() = Some(sender),
                Reply::Drop => drop(sender),
                Reply::Fail(e) => return Err(e.clone()),
            }
            Ok(())
        }

        fn launches(&self) -> Vec<(Option<String>, Url)> {
            self.launches.lock().unwrap().clone()
        }

        fn kept(&self) -> ResultSender {
            self.kept.lock().unwrap().clone().unwrap()
        }

        fn forget_kept(&self) {
            self.kept.lock().unwrap().take();
        }
    }

    impl AppLauncher for FakeLauncher {
        fn launch(&self, package: &str, uri: &Url, sender: ResultSender) -> Result<()> {
            self.record(Some(package), uri, sender)
        }
    }

    impl CustomTabsLauncher for FakeLauncher {
        fn launch(&self, uri: &Url, sender: ResultSender) -> Result<()> {
            self.record(None, uri, sender)
        }
    }

    fn config() -> SsoConfig {
        SsoConfig::new("clientId", "com.example://redirect", Some("profile".into()))
    }

    fn code(code: &str) -> Reply {
        Reply::Now(ExternalResult::from(RedirectParams::with_code(code)))
    }

    fn link(
        destination: AuthDestination,
        installed: &[&str],
        app: &Arc<FakeLauncher>,
        browser: &Arc<FakeLauncher>,
    ) -> UniversalSsoLink {
        UniversalSsoLink::new(
            destination,
            Arc::new(AppDiscovery::new(StaticPackageResolver::new(installed.iter().copied()))),
            app.clone(),
            browser.clone(),
        )
    }

    #[tokio::test]
    async fn cross_app_launches_discovered_package() {
        let app = FakeLauncher::new(code("appCode"));
        let browser = FakeLauncher::new(code("unused"));
        let link = link(
            AuthDestination::cross_app([CrossApp::Rider, CrossApp::Eats]),
            &["com.ubercab.eats"],
            &app,
            &browser,
        );

        let mut extras = QueryParams::new();
        extras.insert("prompt".into(), "login".into());
        let result = link.execute(&config(), &extras).await;

        assert_eq!(result, Ok("appCode".to_string()));
        let launches = app.launches();
        assert_eq!(launches.len(), 1);
        assert_eq!(launches[0].0.as_deref(), Some("com.ubercab.eats"));
        assert_eq!(launches[0].1.path(), "/oauth/v2/universal/authorize");
        assert!(launches[0].1.query().unwrap().ends_with("prompt=login"));
        assert!(browser.launches().is_empty());
        assert_eq!(link.state(), LinkState::Completed);
    }

    #[tokio::test]
    async fn cross_app_without_app_falls_back_to_standard_path() {
        let app = FakeLauncher::new(code("unused"));
        let browser = FakeLauncher::new(code("browserCode"));
        let link = link(AuthDestination::default(), &[], &app, &browser);

        let result = link.execute(&config(), &QueryParams::new()).await;

        assert_eq!(result, Ok("browserCode".to_string()));
        assert!(app.launches().is_empty());
        assert_eq!(browser.launches()[0].1.path(), "/oauth/v2/authorize");
    }

    #[tokio::test]
    async fn in_app_opens_universal_uri_without_discovery() {
        let app = FakeLauncher::new(code("unused"));
        let browser = FakeLauncher::new(code("browserCode"));
        let link = link(AuthDestination::InApp, &["com.ubercab"], &app, &browser);

        let result = link.execute(&config(), &QueryParams::new()).await;

        assert_eq!(result, Ok("browserCode".to_string()));
        assert!(app.launches().is_empty());
        assert_eq!(browser.launches()[0].1.path(), "/oauth/v2/universal/authorize");
    }

    #[tokio::test]
    async fn handler_results_are_classified() {
        let cases = [
            (Reply::Now(ExternalResult::Canceled), CANCELED),
            (Reply::Now(ExternalResult::Unknown(7)), UNKNOWN),
            (
                Reply::Now(RedirectParams::default().into()),
                CANCELED,
            ),
        ];
        for (reply, expected) in cases {
            let browser = FakeLauncher::new(reply);
            let app = FakeLauncher::new(Reply::Keep);
            let link = link(AuthDestination::InApp, &[], &app, &browser);
            let err = link.execute(&config(), &QueryParams::new()).await.unwrap_err();
            assert_eq!(err, AuthError::Client(expected.into()));
            assert!(!link.is_auth_in_progress());
        }

        let browser = FakeLauncher::new(Reply::Now(RedirectParams::with_error("access_denied").into()));
        let app = FakeLauncher::new(Reply::Keep);
        let link = link(AuthDestination::InApp, &[], &app, &browser);
        let err = link.execute(&config(), &QueryParams::new()).await.unwrap_err();
        assert_eq!(err, AuthError::Client("access_denied".into()));
    }

    #[tokio::test]
    async fn launch_failure_fails_attempt() {
        let app = FakeLauncher::new(Reply::Fail(AuthError::Client("no activity".into())));
        let browser = FakeLauncher::new(Reply::Keep);
        let link = link(AuthDestination::default(), &["com.ubercab"], &app, &browser);

        let err = link.execute(&config(), &QueryParams::new()).await.unwrap_err();
        assert_eq!(err, AuthError::Client("no activity".into()));
        assert!(matches!(link.state(), LinkState::Failed(_)));
    }

    #[tokio::test]
    async fn deep_link_completes_pending_attempt_once() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Keep);
        let link = Arc::new(link(AuthDestination::default(), &["com.ubercab"], &app, &browser));
        assert!(!link.is_auth_in_progress());

        let running = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.execute(&config(), &QueryParams::new()).await })
        };
        while !link.is_auth_in_progress() {
            tokio::task::yield_now().await;
        }

        link.handle_auth_code("deepLinkCode");
        // The launched app reporting afterwards must not change the outcome
        assert!(!app.kept().cancel());
        link.handle_auth_code("secondCode");

        assert_eq!(running.await.unwrap(), Ok("deepLinkCode".to_string()));
        assert!(!link.is_auth_in_progress());
        assert_eq!(link.state(), LinkState::Completed);
    }

    #[tokio::test]
    async fn empty_deep_link_code_is_invalid() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Keep);
        let link = Arc::new(link(AuthDestination::InApp, &[], &app, &browser));

        let running = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.execute(&config(), &QueryParams::new()).await })
        };
        while !link.is_auth_in_progress() {
            tokio::task::yield_now().await;
        }
        link.handle_auth_code("");

        assert_eq!(
            running.await.unwrap(),
            Err(AuthError::Client(AUTH_CODE_INVALID.into()))
        );
    }

    #[tokio::test]
    async fn second_execute_while_pending_is_rejected() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Keep);
        let link = Arc::new(link(AuthDestination::InApp, &[], &app, &browser));

        let running = {
            let link = Arc::clone(&link);
            tokio::spawn(async move { link.execute(&config(), &QueryParams::new()).await })
        };
        while !link.is_auth_in_progress() {
            tokio::task::yield_now().await;
        }

        let err = link.execute(&config(), &QueryParams::new()).await.unwrap_err();
        assert_eq!(err, AuthError::Client(ALREADY_IN_PROGRESS.into()));
        assert_eq!(browser.launches().len(), 1, "second call must not launch");

        browser.kept().send_redirect(RedirectParams::with_code("code"));
        assert_eq!(running.await.unwrap(), Ok("code".to_string()));
    }

    #[tokio::test(start_paused = true)]
    async fn timeout_fails_attempt_and_ignores_late_result() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Keep);
        let link = link(AuthDestination::InApp, &[], &app, &browser)
            .with_timeout(Duration::from_secs(300));

        let err = link.execute(&config(), &QueryParams::new()).await.unwrap_err();
        assert_eq!(err, AuthError::Client(TIMED_OUT.into()));

        assert!(!browser.kept().send_redirect(RedirectParams::with_code("late")));
        assert!(matches!(link.state(), LinkState::Failed(_)));
    }

    #[tokio::test]
    async fn early_deep_link_is_ignored() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(code("browserCode"));
        let link = link(AuthDestination::InApp, &[], &app, &browser);

        link.handle_auth_code("tooEarly");
        assert_eq!(link.state(), LinkState::Idle);

        let result = link.execute(&config(), &QueryParams::new()).await;
        assert_eq!(result, Ok("browserCode".to_string()));
    }

    #[tokio::test]
    async fn launcher_dropping_sender_cancels_attempt() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Drop);
        let link = link(AuthDestination::InApp, &[], &app, &browser);

        let result = tokio::time::timeout(
            Duration::from_secs(2),
            link.execute(&config(), &QueryParams::new()),
        )
        .await
        .expect("execute must not hang once every sender is gone");

        assert_eq!(result, Err(AuthError::Client(CANCELED.into())));
        assert!(!link.is_auth_in_progress());
    }

    #[tokio::test]
    async fn dropped_execute_future_frees_the_link() {
        let app = FakeLauncher::new(Reply::Keep);
        let browser = FakeLauncher::new(Reply::Keep);
        let link = link(AuthDestination::InApp, &[], &app, &browser);

        let abandoned = tokio::time::timeout(
            Duration::from_millis(50),
            link.execute(&config(), &QueryParams::new()),
        )
        .await;
        assert!(abandoned.is_err());
        assert!(!link.is_auth_in_progress());

        // The old launcher's sender can no longer complete anything
        assert!(!browser.kept().send_redirect(RedirectParams::with_code("stale")));
        browser.forget_kept();

        let retry = {
            let browser = FakeLauncher::new(code("retryCode"));
            let link = UniversalSsoLink {
                browser_launcher: browser,
                ..link
            };
            link.execute(&config(), &QueryParams::new()).await
        };
        assert_eq!(retry, Ok("retryCode".to_string()));
    }
}
