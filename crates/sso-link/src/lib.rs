//! SSO hand-off and authentication orchestration
//!
//! `UniversalSsoLink` dispatches the authorize URI to a companion app or a
//! secure browser and turns the asynchronous redirect into a single awaited
//! result. `AuthProvider` drives a whole attempt around it: PAR, query
//! parameters, hand-off, and the PKCE token exchange.
//!
//! Attempt lifecycle:
//! 1. Host builds an `AuthContext` and calls `AuthProvider::authenticate()`
//! 2. Link state `Idle` → `Dispatching`; app discovery picks a handler
//! 3. Launcher starts the handler → `AwaitingExternalResult`
//! 4. Handler result, deep link, launch failure or timeout → `Completed` /
//!    `Failed`; later signals are dropped
//! 5. PKCE attempts exchange the code before returning

pub mod browser;
pub mod launcher;
pub mod link;
pub mod metrics;
pub mod provider;
pub mod result;
pub mod state;

pub use browser::{
    BrowserHost, BrowserInventory, SecureBrowserLauncher, invalidate_preferred_package,
    preferred_package, select_package,
};
pub use launcher::{AppLauncher, CustomTabsLauncher};
pub use link::UniversalSsoLink;
pub use provider::{AuthProvider, ParPolicy};
pub use result::{ResultChannel, ResultReceiver, ResultSender};
pub use state::{Handler, LinkAction, LinkEvent, LinkState, handle_event};
