//! Launchers that hand the authorize URI to an external handler
//!
//! A launch is fire-and-forget: `Ok(())` means the handler was started, not
//! that the user finished. The handler's outcome comes back later through
//! the `ResultSender`, or through `SsoLink::handle_auth_code` for deep links.

use auth_api::Result;
use url::Url;

use crate::result::ResultSender;

/// Starts a companion app with the authorize URI.
pub trait AppLauncher: Send + Sync {
    fn launch(&self, package: &str, uri: &Url, sender: ResultSender) -> Result<()>;
}

/// Opens the authorize URI in a secure browser view.
pub trait CustomTabsLauncher: Send + Sync {
    fn launch(&self, uri: &Url, sender: ResultSender) -> Result<()>;
}
