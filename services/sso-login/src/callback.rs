//! Local redirect listener
//!
//! The registered redirect URI points here. A browser launch arms the slot
//! with the attempt's `ResultSender`; the first redirect to arrive takes it
//! and completes the attempt.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use auth_api::RedirectParams;
use axum::Router;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::http::header::CONTENT_TYPE;
use axum::response::IntoResponse;
use axum::routing::get;
use metrics_exporter_prometheus::PrometheusHandle;
use sso_link::ResultSender;
use tracing::{info, warn};

use crate::metrics;

/// Slot holding the sender of the attempt waiting for its redirect.
#[derive(Clone, Default)]
pub struct PendingRedirect {
    slot: Arc<Mutex<Option<ResultSender>>>,
}

impl PendingRedirect {
    fn lock(&self) -> MutexGuard<'_, Option<ResultSender>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Route the next redirect to `sender`, replacing any earlier one.
    pub fn arm(&self, sender: ResultSender) {
        if let Some(previous) = self.lock().replace(sender) {
            warn!(attempt = previous.attempt(), "replacing an unused redirect slot");
        }
    }

    pub fn take(&self) -> Option<ResultSender> {
        self.lock().take()
    }

    pub fn is_armed(&self) -> bool {
        self.lock().is_some()
    }
}

/// Shared state for the listener's handlers
#[derive(Clone)]
pub struct AppState {
    pub pending: PendingRedirect,
    pub prometheus: PrometheusHandle,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(pending: PendingRedirect, prometheus: PrometheusHandle) -> Self {
        Self {
            pending,
            prometheus,
            started_at: Instant::now(),
        }
    }
}

/// Build the listener router. `callback_path` must not collide with
/// `/health` or `/metrics`.
pub fn build_router(state: AppState, callback_path: &str) -> Router {
    Router::new()
        .route("/health", get(health_handler))
        .route("/metrics", get(metrics_handler))
        .route(callback_path, get(redirect_handler))
        .with_state(state)
}

async fn redirect_handler(
    State(state): State<AppState>,
    Query(query): Query<HashMap<String, String>>,
) -> impl IntoResponse {
    let params = RedirectParams {
        code: query.get("code").cloned(),
        error: query.get("error").cloned(),
    };

    let Some(sender) = state.pending.take() else {
        warn!("redirect received with no login attempt waiting");
        metrics::record_callback("unsolicited");
        return (
            StatusCode::CONFLICT,
            "No login attempt is waiting for this redirect.\n".to_string(),
        );
    };

    let result = params.into_result();
    let message = match &result {
        Ok(_) => "Login complete. You can close this window.\n".to_string(),
        Err(e) => format!("Login failed: {e}\n"),
    };

    if sender.complete(result) {
        info!(attempt = sender.attempt(), "redirect delivered");
        metrics::record_callback("delivered");
        (StatusCode::OK, message)
    } else {
        info!(attempt = sender.attempt(), "redirect arrived after the attempt finished");
        metrics::record_callback("ignored");
        (
            StatusCode::GONE,
            "This login attempt has already finished.\n".to_string(),
        )
    }
}

async fn health_handler(State(state): State<AppState>) -> impl IntoResponse {
    let body = serde_json::json!({
        "status": "healthy",
        "awaiting_redirect": state.pending.is_armed(),
        "uptime_seconds": state.started_at.elapsed().as_secs(),
    });
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "application/json")],
        body.to_string(),
    )
}

/// Prometheus metrics endpoint in text exposition format.
async fn metrics_handler(State(state): State<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(CONTENT_TYPE, "text/plain; version=0.0.4; charset=utf-8")],
        state.prometheus.render(),
    )
}
