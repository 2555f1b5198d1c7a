//! SSO login
//!
//! Desktop host for the SSO SDK:
//! 1. Serves the registered redirect URI on a loopback listener
//! 2. Opens the authorize page (companion app link or browser)
//! 3. Waits for the redirect and exchanges the code
//! 4. Prints the resulting token as JSON on stdout

mod callback;
mod config;
mod error;
mod launcher;
mod metrics;

use std::sync::Arc;

use anyhow::{Context, Result};
use auth_api::{AuthProviding, AuthToken};
use auth_core::{AppDiscovery, HttpAuthService, SsoConfigProvider, StaticPackageResolver, UriConfig};
use common::Secret;
use sso_link::{AuthProvider, SecureBrowserLauncher, UniversalSsoLink};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::callback::{AppState, PendingRedirect, build_router};
use crate::config::{Config, LogFormat};
use crate::launcher::SystemOpener;

/// Command-line flags
#[derive(Debug, Default, PartialEq, Eq)]
struct CliArgs {
    config: Option<String>,
    show_tokens: bool,
}

impl CliArgs {
    fn parse(args: &[String]) -> Self {
        Self {
            config: args
                .iter()
                .position(|a| a == "--config")
                .and_then(|i| args.get(i + 1))
                .cloned(),
            show_tokens: args.iter().any(|a| a == "--show-tokens"),
        }
    }
}

/// Initialize tracing with LOG_LEVEL / RUST_LOG support. Logs go to stderr
/// so stdout carries only the token.
fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_env("LOG_LEVEL")
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);
    match format {
        LogFormat::Json => registry
            .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
            .init(),
        LogFormat::Pretty => registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .init(),
    }
}

/// Token as printed on stdout. Secret fields are masked unless `show_secrets`.
fn render_token(token: &AuthToken, show_secrets: bool) -> serde_json::Result<String> {
    let mask = |value: &Option<String>| {
        value.clone().map(|v| {
            if show_secrets {
                v
            } else {
                Secret::new(v).to_string()
            }
        })
    };
    let rendered = AuthToken {
        auth_code: mask(&token.auth_code),
        access_token: mask(&token.access_token),
        refresh_token: mask(&token.refresh_token),
        ..token.clone()
    };
    serde_json::to_string_pretty(&rendered)
}

#[tokio::main]
async fn main() -> Result<()> {
    let args: Vec<String> = std::env::args().collect();
    let cli = CliArgs::parse(&args);

    let config_path = Config::resolve_path(cli.config.as_deref());
    let config = Config::load(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    init_tracing(config.log_format);
    info!(path = %config_path.display(), "starting sso-login");

    // Before the first attempt, so the SDK counters are captured
    let prometheus = metrics::install_recorder().context("failed to install Prometheus recorder")?;

    let addr = config.callback.listen_addr;
    let listener = TcpListener::bind(addr)
        .await
        .map_err(|source| error::Error::ListenerBind { addr, source })?;
    let local_addr = listener.local_addr().context("listener has no local address")?;

    info!(
        listen_addr = %local_addr,
        callback_path = %config.callback.path,
        auth_host = %config.auth.host,
        destination = ?config.auth.destination,
        timeout_secs = config.auth.timeout_secs,
        "configuration loaded"
    );

    let pending = PendingRedirect::default();
    let app = build_router(AppState::new(pending.clone(), prometheus), &config.callback.path);
    let (shutdown_tx, shutdown_rx) = tokio::sync::oneshot::channel::<()>();
    let server = tokio::spawn(async move {
        axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
            })
            .await
    });

    let uri_config = UriConfig::new(&config.auth.host)?;
    let auth_service = Arc::new(HttpAuthService::with_defaults(&uri_config)?);
    let discovery = Arc::new(AppDiscovery::new(StaticPackageResolver::new(
        config.auth.installed_packages.iter().cloned(),
    )));
    let opener = Arc::new(SystemOpener::new(pending).with_browser(config.auth.browser.clone()));
    let browser = Arc::new(SecureBrowserLauncher::new(Arc::clone(&opener)));

    let context = config.auth_context();
    let link = UniversalSsoLink::new(context.destination.clone(), discovery, opener, browser)
        .with_uri_config(uri_config)
        .with_timeout(config.timeout());
    let provider = AuthProvider::new(
        context,
        SsoConfigProvider::File(config.auth.sso_config_path.clone()),
        Arc::new(link),
        auth_service,
    );

    let outcome = tokio::select! {
        result = provider.authenticate() => Some(result),
        _ = shutdown_signal() => None,
    };

    let _ = shutdown_tx.send(());
    match server.await {
        Ok(Err(e)) => warn!(error = %e, "redirect listener failed"),
        Err(e) => warn!(error = %e, "redirect listener task panicked"),
        Ok(Ok(())) => {}
    }

    match outcome {
        Some(Ok(token)) => {
            println!("{}", render_token(&token, cli.show_tokens)?);
            info!("authentication complete");
            Ok(())
        }
        Some(Err(e)) => {
            error!(kind = e.kind(), error = %e, "authentication failed");
            anyhow::bail!("authentication failed: {e}")
        }
        None => anyhow::bail!("interrupted before authentication finished"),
    }
}

/// Wait for SIGTERM or SIGINT. A handler that cannot be installed never fires.
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            warn!(error = %e, "failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                warn!(error = %e, "failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("received SIGINT, shutting down"),
        _ = terminate => info!("received SIGTERM, shutting down"),
    }
}
