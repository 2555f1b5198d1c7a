//! Companion app discovery for the SSO hand-off

use std::collections::HashSet;

use auth_api::{AppDiscovering, CrossApp};
use tracing::debug;
use url::Url;

/// Reports which installed packages can open a URI.
///
/// Stands in for the host platform's intent resolution.
pub trait PackageResolver: Send + Sync {
    /// Packages registered to handle `uri`, in no particular order.
    fn handlers_for(&self, uri: &Url) -> Vec<String>;
}

/// Resolver over a fixed set of installed packages, each of which is assumed
/// to handle every authorize URI.
#[derive(Debug, Clone, Default)]
pub struct StaticPackageResolver {
    installed: Vec<String>,
}

impl StaticPackageResolver {
    pub fn new<I, S>(installed: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            installed: installed.into_iter().map(Into::into).collect(),
        }
    }
}

impl PackageResolver for StaticPackageResolver {
    fn handlers_for(&self, _uri: &Url) -> Vec<String> {
        self.installed.clone()
    }
}

/// Picks the first installed companion app, in caller priority order.
pub struct AppDiscovery<R> {
    resolver: R,
}

impl<R: PackageResolver> AppDiscovery<R> {
    pub fn new(resolver: R) -> Self {
        Self { resolver }
    }
}

impl<R: PackageResolver> AppDiscovering for AppDiscovery<R> {
    fn find_app_for_sso(&self, uri: &Url, app_priority: &[CrossApp]) -> Option<String> {
        let handlers: HashSet<String> = self.resolver.handlers_for(uri).into_iter().collect();
        let found = app_priority
            .iter()
            .flat_map(|app| app.packages().iter().copied())
            .find(|package| handlers.contains(*package))
            .map(str::to_string);
        debug!(
            handlers = handlers.len(),
            package = found.as_deref().unwrap_or("none"),
            "resolved sso app"
        );
        found
    }
}
