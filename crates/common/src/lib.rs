//! Common types shared by the SSO auth crates and the login binary

mod error;
mod secret;

pub use error::{Error, Result};
pub use secret::Secret;
