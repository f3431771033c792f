//! Browser-driver seam.
//!
//! The redemption engine never talks to Chrome directly; it goes through
//! these traits so tests can substitute a scripted fake. The production
//! implementation lives in [`chromium`].

pub mod chromium;

use std::path::PathBuf;

use anyhow::Result;
use thiserror::Error;

use crate::credentials::StoredCookie;

pub use chromium::ChromiumDriver;

/// Fatal failure to bring a browser up at all.
///
/// These are never retried; they surface from engine construction.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Chrome/Chromium executable not found; install Chrome or Chromium")]
    BrowserNotFound,

    #[error("failed to launch browser: {0}")]
    Launch(String),

    #[error("failed to open page: {0}")]
    Page(String),
}

/// How to launch a browser instance.
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    /// Run without a visible window.
    pub headless: bool,

    /// Browser profile directory (cache, local storage).
    pub profile_dir: PathBuf,
}

/// Launches browser instances.
#[async_trait::async_trait]
pub trait Driver: Send + Sync {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PageDriver>, SessionError>;
}

/// A single live browser page.
///
/// The interface is intentionally minimal - exactly the primitives the
/// redemption state machine needs. Buttons are addressed by visible label
/// because the remote DOM carries no stable ids.
#[async_trait::async_trait]
pub trait PageDriver: Send + Sync {
    /// Navigate the page to `url`.
    async fn goto(&self, url: &str) -> Result<()>;

    /// Whether an element matching the CSS selector is present.
    async fn element_exists(&self, selector: &str) -> Result<bool>;

    /// Set the value of the first element matching the CSS selector,
    /// typing it so client-side validation fires.
    async fn fill(&self, selector: &str, value: &str) -> Result<()>;

    /// Full visible text of the page body.
    async fn body_text(&self) -> Result<String>;

    /// Whether a visible, enabled button whose text contains `label`
    /// exists.
    async fn button_clickable(&self, label: &str) -> Result<bool>;

    /// Click the first visible, enabled button whose text contains
    /// `label`. Errors if no such button exists.
    async fn click_button(&self, label: &str) -> Result<()>;

    /// All cookies visible to the page.
    async fn cookies(&self) -> Result<Vec<StoredCookie>>;

    /// Install cookies, scoped to `url`.
    async fn set_cookies(&self, cookies: &[StoredCookie], url: &str) -> Result<()>;
}
