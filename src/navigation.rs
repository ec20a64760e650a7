//! Navigation hand-off to the hosting environment
//!
//! The interpreter requests navigation by producing a [`PendingNavigation`];
//! the host holds it until a [`Navigator`] has acted on it.

use std::path::{Path, PathBuf};
use std::process::{ExitStatus, Stdio};
use std::time::Duration;

use tokio::process::Command;
use tokio::task::JoinHandle;
use url::Url;

use crate::{Error, Result};

/// A one-shot request to open a URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingNavigation {
    url: String,
}

impl PendingNavigation {
    /// Create a navigation request
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self { url: url.into() }
    }

    /// Requested URL
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Parse the requested URL
    ///
    /// # Errors
    ///
    /// Returns error if the URL is not absolute or not valid
    pub fn parse(&self) -> Result<Url> {
        Url::parse(&self.url).map_err(|e| Error::Navigation(format!("{}: {e}", self.url)))
    }
}

/// Opens URLs in a new browsing context
pub trait Navigator {
    /// Open a URL
    ///
    /// # Errors
    ///
    /// Returns error if the URL could not be handed off
    fn open(&mut self, url: &Url) -> Result<()>;
}

/// Opens URLs with the platform's default browser
#[derive(Debug)]
pub struct SystemBrowser {
    opener: PathBuf,
}

/// How long an opener may run before it is left to the OS
const OPENER_TIMEOUT: Duration = Duration::from_secs(30);

impl SystemBrowser {
    /// Locate the platform opener (`xdg-open`, `open` or `explorer`)
    ///
    /// # Errors
    ///
    /// Returns error if no opener is on `PATH`
    pub fn new() -> Result<Self> {
        let candidates: &[&str] = if cfg!(target_os = "macos") {
            &["open"]
        } else if cfg!(windows) {
            &["explorer"]
        } else {
            &["xdg-open", "gio", "sensible-browser"]
        };

        let opener = candidates
            .iter()
            .find_map(|bin| which::which(bin).ok())
            .ok_or_else(|| {
                Error::Navigation(format!("no browser opener found (tried {candidates:?})"))
            })?;

        tracing::debug!(opener = %opener.display(), "system browser opener found");
        Ok(Self { opener })
    }
}

impl Navigator for SystemBrowser {
    fn open(&mut self, url: &Url) -> Result<()> {
        launch(&self.opener, url)?;
        tracing::info!(url = %url, "opened in browser");
        Ok(())
    }
}

/// Spawn the opener and reap it in the background
///
/// The returned handle resolves to the exit status, or `None` if the opener
/// could not be waited on within [`OPENER_TIMEOUT`].
fn launch(opener: &Path, url: &Url) -> Result<JoinHandle<Option<ExitStatus>>> {
    let mut cmd = Command::new(opener);
    if opener.file_stem().is_some_and(|s| s == "gio") {
        cmd.arg("open");
    }

    let mut child = cmd
        .arg(url.as_str())
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| Error::Navigation(e.to_string()))?;

    let opener = opener.display().to_string();
    Ok(tokio::spawn(async move {
        match tokio::time::timeout(OPENER_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) => {
                if !status.success() {
                    tracing::warn!(%opener, %status, "browser opener failed");
                }
                Some(status)
            }
            Ok(Err(e)) => {
                tracing::warn!(%opener, error = %e, "failed to wait on browser opener");
                None
            }
            Err(_) => {
                tracing::debug!(%opener, "browser opener still running");
                None
            }
        }
    }))
}

/// Prints URLs instead of opening them
#[derive(Debug, Default)]
pub struct ConsoleNavigator;

impl Navigator for ConsoleNavigator {
    fn open(&mut self, url: &Url) -> Result<()> {
        println!("-> {url}");
        Ok(())
    }
}
