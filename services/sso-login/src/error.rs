//! Service-specific error types

use std::net::SocketAddr;

use auth_api::AuthError;
use thiserror::Error;

/// Host-side failures of the login binary.
///
/// Failures of the attempt itself are `auth_api::AuthError`s and come back
/// through `authenticate`.
#[derive(Error, Debug)]
pub enum Error {
    #[error("failed to launch `{program}`: {source}")]
    BrowserLaunch {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to bind redirect listener on {addr}: {source}")]
    ListenerBind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },
}

impl From<Error> for AuthError {
    fn from(err: Error) -> Self {
        AuthError::Client(err.to_string())
    }
}
