//! Prometheus metrics exposition
//!
//! Serves the `sso_auth_*` counters recorded by the SDK alongside the
//! binary's own:
//!
//! - `sso_login_callbacks_total` (counter): label `outcome`

use metrics_exporter_prometheus::{BuildError, PrometheusBuilder, PrometheusHandle};

/// Install the Prometheus recorder and return a handle for rendering metrics.
///
/// Must run before the first attempt so the SDK counters land in it.
pub fn install_recorder() -> Result<PrometheusHandle, BuildError> {
    PrometheusBuilder::new().install_recorder()
}

/// Record a request on the redirect endpoint.
///
/// `outcome` is `delivered` when it completed the pending attempt, `ignored`
/// when the attempt had already finished, `unsolicited` when none was armed.
pub fn record_callback(outcome: &'static str) {
    metrics::counter!("sso_login_callbacks_total", "outcome" => outcome).increment(1);
}
