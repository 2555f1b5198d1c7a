//! Desktop launchers
//!
//! Opens the authorize page with the platform URL opener (or a configured
//! browser program) and arms the redirect listener for the attempt.

use std::process::Command;

use auth_api::Result;
use sso_link::{AppLauncher, BrowserHost, BrowserInventory, ResultSender};
use tracing::{debug, info};
use url::Url;

use crate::callback::PendingRedirect;
use crate::error::Error;

/// Command that opens `uri` with the user's default handler.
pub fn opener_command(uri: &Url) -> Command {
    let mut command = if cfg!(target_os = "macos") {
        Command::new("open")
    } else if cfg!(target_os = "windows") {
        Command::new("explorer")
    } else {
        Command::new("xdg-open")
    };
    command.arg(uri.as_str());
    command
}

/// Launches through local processes and hands redirects to the listener.
pub struct SystemOpener {
    pending: PendingRedirect,
    browser: Option<String>,
}

impl SystemOpener {
    pub fn new(pending: PendingRedirect) -> Self {
        Self {
            pending,
            browser: None,
        }
    }

    /// Use `program` for the authorize page instead of the system opener.
    pub fn with_browser(mut self, program: Option<String>) -> Self {
        self.browser = program.filter(|p| !p.trim().is_empty());
        self
    }

    fn spawn(&self, mut command: Command, sender: ResultSender) -> Result<()> {
        let program = command.get_program().to_string_lossy().into_owned();
        self.pending.arm(sender);

        match command.spawn() {
            Ok(mut child) => {
                debug!(program = %program, pid = child.id(), "opener started");
                std::thread::spawn(move || {
                    if let Err(e) = child.wait() {
                        debug!(error = %e, "failed to reap opener");
                    }
                });
                Ok(())
            }
            Err(source) => {
                self.pending.take();
                Err(Error::BrowserLaunch { program, source }.into())
            }
        }
    }
}

impl BrowserHost for SystemOpener {
    fn inventory(&self) -> BrowserInventory {
        BrowserInventory {
            default_handler: None,
            custom_tabs_capable: self.browser.iter().cloned().collect(),
            has_specialized_handlers: false,
        }
    }

    fn open(&self, package: Option<&str>, uri: &Url, sender: ResultSender) -> Result<()> {
        let command = match package {
            Some(program) => {
                let mut command = Command::new(program);
                command.arg(uri.as_str());
                command
            }
            None => opener_command(uri),
        };
        self.spawn(command, sender)
    }
}

impl AppLauncher for SystemOpener {
    fn launch(&self, package: &str, uri: &Url, sender: ResultSender) -> Result<()> {
        // Companion apps claim the authorize link, so the opener routes it
        info!(package, "handing authorize link to companion app");
        self.spawn(opener_command(uri), sender)
    }
}
