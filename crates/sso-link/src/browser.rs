//! Secure browser selection
//!
//! Picks the custom-tabs-capable browser to host the authorize page. The
//! choice is memoized for the whole process, since installed browsers rarely
//! change while the host runs. Call [`invalidate_preferred_package`] when they
//! might have (package install/remove events).

use std::sync::{Mutex, MutexGuard, PoisonError};

use auth_api::Result;
use tracing::{debug, info};
use url::Url;

use crate::launcher::CustomTabsLauncher;
use crate::result::ResultSender;

/// Chrome stable
pub const STABLE_PACKAGE: &str = "com.android.chrome";
/// Chrome beta
pub const BETA_PACKAGE: &str = "com.chrome.beta";

/// Browsers as seen by the host platform at selection time.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowserInventory {
    /// The user's default handler for `http(s)` links, if any
    pub default_handler: Option<String>,
    /// Browsers that handle `http(s)` links and expose a custom tabs
    /// service, in resolution order
    pub custom_tabs_capable: Vec<String>,
    /// Whether some non-browser app claims specific web hosts/paths
    pub has_specialized_handlers: bool,
}

/// Platform hooks for browser enumeration and launching.
pub trait BrowserHost: Send + Sync {
    fn inventory(&self) -> BrowserInventory;

    /// Open `uri` in `package`, or in the plain system browser when `None`.
    fn open(&self, package: Option<&str>, uri: &Url, sender: ResultSender) -> Result<()>;
}

impl<T: BrowserHost + ?Sized> BrowserHost for std::sync::Arc<T> {
    fn inventory(&self) -> BrowserInventory {
        (**self).inventory()
    }

    fn open(&self, package: Option<&str>, uri: &Url, sender: ResultSender) -> Result<()> {
        (**self).open(package, uri, sender)
    }
}

/// Choose the browser package for custom tabs. Pure function.
pub fn select_package(inventory: &BrowserInventory) -> Option<String> {
    let capable = &inventory.custom_tabs_capable;
    let contains = |package: &str| capable.iter().any(|p| p == package);

    match capable.as_slice() {
        [] => None,
        [only] => Some(only.clone()),
        [first, ..] => {
            if let Some(default) = inventory.default_handler.as_deref()
                && !default.is_empty()
                && !inventory.has_specialized_handlers
                && contains(default)
            {
                Some(default.to_string())
            } else if contains(STABLE_PACKAGE) {
                Some(STABLE_PACKAGE.to_string())
            } else if contains(BETA_PACKAGE) {
                Some(BETA_PACKAGE.to_string())
            } else {
                Some(first.clone())
            }
        }
    }
}

/// Process-wide memo of the selected package. Only a successful selection is
/// cached; `None` is recomputed on every call.
static PREFERRED_PACKAGE: Mutex<Option<String>> = Mutex::new(None);

fn preferred_slot() -> MutexGuard<'static, Option<String>> {
    PREFERRED_PACKAGE
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
}

/// Cached browser package, computing it from `host` on first use.
pub fn preferred_package<H: BrowserHost + ?Sized>(host: &H) -> Option<String> {
    let mut cached = preferred_slot();
    if let Some(package) = cached.as_ref() {
        return Some(package.clone());
    }
    let selected = select_package(&host.inventory());
    if let Some(package) = &selected {
        debug!(package = %package, "cached preferred browser package");
        *cached = Some(package.clone());
    }
    selected
}

/// Forget the cached browser package.
pub fn invalidate_preferred_package() {
    preferred_slot().take();
}

/// `CustomTabsLauncher` that opens the preferred browser, falling back to
/// the system browser when no custom-tabs browser is installed.
pub struct SecureBrowserLauncher<H> {
    host: H,
}

impl<H: BrowserHost> SecureBrowserLauncher<H> {
    pub fn new(host: H) -> Self {
        Self { host }
    }
}

impl<H: BrowserHost> CustomTabsLauncher for SecureBrowserLauncher<H> {
    fn launch(&self, uri: &Url, sender: ResultSender) -> Result<()> {
        let package = preferred_package(&self.host);
        match package.as_deref() {
            Some(package) => info!(package, "opening authorize page in secure browser"),
            None => info!("no custom tabs browser installed, using system browser"),
        }
        self.host.open(package.as_deref(), uri, sender)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    use auth_api::RedirectParams;

    use crate::result::ResultChannel;

    /// Serializes tests that touch the process-wide package cache
    static CACHE_MUTEX: Mutex<()> = Mutex::new(());

    fn inventory(default: Option<&str>, capable: &[&str], specialized: bool) -> BrowserInventory {
        BrowserInventory {
            default_handler: default.map(str::to_string),
            custom_tabs_capable: capable.iter().map(|p| p.to_string()).collect(),
            has_specialized_handlers: specialized,
        }
    }

    #[derive(Default)]
    struct FakeHost {
        inventory: BrowserInventory,
        inventory_calls: AtomicUsize,
        opened: Mutex<Vec<(Option<String>, String)>>,
    }

    impl BrowserHost for FakeHost {
        fn inventory(&self) -> BrowserInventory {
            self.inventory_calls.fetch_add(1, Ordering::SeqCst);
            self.inventory.clone()
        }

        fn open(&self, package: Option<&str>, uri: &Url, sender: ResultSender) -> Result<()> {
            self.opened
                .lock()
                .unwrap()
                .push((package.map(str::to_string), uri.to_string()));
            sender.send_redirect(RedirectParams::with_code("browserCode"));
            Ok(())
        }
    }

    #[test]
    fn no_capable_browser_selects_nothing() {
        assert_eq!(select_package(&inventory(Some("org.example"), &[], false)), None);
    }

    #[test]
    fn single_capable_browser_is_selected() {
        assert_eq!(
            select_package(&inventory(None, &["org.mozilla.firefox"], false)),
            Some("org.mozilla.firefox".into())
        );
    }

    #[test]
    fn capable_default_wins_without_specialized_handlers() {
        let inv = inventory(
            Some("org.mozilla.firefox"),
            &[STABLE_PACKAGE, "org.mozilla.firefox"],
            false,
        );
        assert_eq!(select_package(&inv), Some("org.mozilla.firefox".into()));
    }

    #[test]
    fn specialized_handlers_skip_default() {
        let inv = inventory(
            Some("org.mozilla.firefox"),
            &["org.mozilla.firefox", STABLE_PACKAGE],
            true,
        );
        assert_eq!(select_package(&inv), Some(STABLE_PACKAGE.into()));
    }

    #[test]
    fn incapable_default_falls_back_to_chrome_then_beta_then_first() {
        let stable = inventory(Some("com.sec.browser"), &["org.example", STABLE_PACKAGE], false);
        assert_eq!(select_package(&stable), Some(STABLE_PACKAGE.into()));

        let beta = inventory(None, &["org.example", BETA_PACKAGE], false);
        assert_eq!(select_package(&beta), Some(BETA_PACKAGE.into()));

        let first = inventory(None, &["org.example", "org.other"], false);
        assert_eq!(select_package(&first), Some("org.example".into()));
    }

    #[test]
    fn empty_default_is_ignored() {
        let inv = inventory(Some(""), &["org.example", "org.other"], false);
        assert_eq!(select_package(&inv), Some("org.example".into()));
    }

    #[test]
    fn selection_is_cached_until_invalidated() {
        let _lock = CACHE_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        invalidate_preferred_package();

        let host = FakeHost {
            inventory: inventory(None, &["org.mozilla.firefox"], false),
            ..Default::default()
        };
        assert_eq!(preferred_package(&host), Some("org.mozilla.firefox".into()));
        assert_eq!(preferred_package(&host), Some("org.mozilla.firefox".into()));
        assert_eq!(host.inventory_calls.load(Ordering::SeqCst), 1);

        invalidate_preferred_package();
        assert_eq!(preferred_package(&host), Some("org.mozilla.firefox".into()));
        assert_eq!(host.inventory_calls.load(Ordering::SeqCst), 2);
        invalidate_preferred_package();
    }

    #[test]
    fn missing_browser_is_not_cached() {
        let _lock = CACHE_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        invalidate_preferred_package();

        let host = FakeHost::default();
        assert_eq!(preferred_package(&host), None);
        assert_eq!(preferred_package(&host), None);
        assert_eq!(host.inventory_calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn launcher_opens_preferred_browser() {
        let _lock = CACHE_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        invalidate_preferred_package();

        let host = Arc::new(FakeHost {
            inventory: inventory(None, &[STABLE_PACKAGE], false),
            ..Default::default()
        });
        let launcher = SecureBrowserLauncher::new(Arc::clone(&host));
        let uri = Url::parse("https://auth.uber.com/oauth/v2/authorize?client_id=c").unwrap();

        let channel = ResultChannel::new();
        let (sender, rx) = channel.begin().unwrap();
        launcher.launch(&uri, sender).unwrap();
        invalidate_preferred_package();

        let opened = host.opened.lock().unwrap().clone();
        assert_eq!(opened, vec![(Some(STABLE_PACKAGE.to_string()), uri.to_string())]);
        assert_eq!(rx.await.unwrap(), Ok("browserCode".to_string()));
    }

    #[test]
    fn launcher_falls_back_to_system_browser() {
        let _lock = CACHE_MUTEX.lock().unwrap_or_else(PoisonError::into_inner);
        invalidate_preferred_package();

        let host = Arc::new(FakeHost::default());
        let launcher = SecureBrowserLauncher::new(Arc::clone(&host));
        let uri = Url::parse("https://auth.uber.com/oauth/v2/authorize").unwrap();

        let channel = ResultChannel::new();
        let (sender, _rx) = channel.begin().unwrap();
        launcher.launch(&uri, sender).unwrap();

        assert_eq!(host.opened.lock().unwrap()[0].0, None);
    }
}
