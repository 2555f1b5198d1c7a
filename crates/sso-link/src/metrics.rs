//! Counters for authentication attempts
//!
//! Recorded through the `metrics` facade; the embedding application decides
//! whether and how to export them.
//!
//! - `sso_auth_attempts_total` (counter): label `outcome`
//! - `sso_auth_par_failures_total` (counter): label `reason`
//! - `sso_auth_dispatch_total` (counter): label `handler`

use auth_api::AuthResult;

use crate::state::Handler;

/// Record the terminal outcome of an `authenticate()` call.
pub fn record_attempt(result: &AuthResult) {
    let outcome = match result {
        Ok(_) => "success",
        Err(e) => e.kind(),
    };
    metrics::counter!("sso_auth_attempts_total", "outcome" => outcome).increment(1);
}

/// Record a pushed authorization request that did not yield a `request_uri`.
pub fn record_par_failure(reason: &'static str) {
    metrics::counter!("sso_auth_par_failures_total", "reason" => reason).increment(1);
}

/// Record which kind of handler an attempt was handed to.
pub fn record_dispatch(handler: Handler) {
    metrics::counter!("sso_auth_dispatch_total", "handler" => handler.label()).increment(1);
}
