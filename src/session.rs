//! Session acquisition: one authenticated browser page, reused for the
//! whole process.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::config::RedeemConfig;
use crate::credentials::{CookieJar, CookieStore};
use crate::driver::{Driver, LaunchOptions, PageDriver};
use crate::redeem::markers;

/// Cookie jars older than this are treated as absent.
const MAX_COOKIE_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Blocking acknowledgement gate for interactive login.
///
/// Production reads a line from stdin; tests substitute a recording
/// double. Deliberately has no timeout - it waits on a human.
pub trait LoginPrompter: Send + Sync {
    fn wait_for_login(&self, prompt: &str) -> Result<()>;
}

/// Prompter that blocks on stdin.
#[derive(Debug, Default)]
pub struct StdinPrompter;

impl LoginPrompter for StdinPrompter {
    fn wait_for_login(&self, prompt: &str) -> Result<()> {
        println!("\n========================================");
        println!("{prompt}");
        println!("========================================\n");

        let mut input = String::new();
        std::io::stdin()
            .read_line(&mut input)
            .context("Failed to read login acknowledgement")?;
        Ok(())
    }
}

/// An authenticated browser page.
pub struct Session {
    pub page: Box<dyn PageDriver>,
}

/// Produces exactly one authenticated [`Session`] per engine instance.
pub struct SessionManager {
    config: RedeemConfig,
    driver: Arc<dyn Driver>,
    prompter: Arc<dyn LoginPrompter>,
    store: CookieStore,
}

impl SessionManager {
    pub fn new(
        config: RedeemConfig,
        driver: Arc<dyn Driver>,
        prompter: Arc<dyn LoginPrompter>,
    ) -> Self {
        let store = CookieStore::new(&config.cookie_file);
        Self {
            config,
            driver,
            prompter,
            store,
        }
    }

    /// Acquire an authenticated session.
    ///
    /// Tries persisted cookies first; falls back to a visible-window
    /// interactive login that blocks on the prompter. Browser launch
    /// failure is fatal and propagates.
    pub async fn acquire(&self) -> Result<Session> {
        let page = self
            .driver
            .launch(&LaunchOptions {
                headless: self.config.headless,
                profile_dir: self.config.profile_dir.clone(),
            })
            .await?;

        if let Some(jar) = self.load_jar() {
            if self.verify(page.as_ref(), &jar).await {
                info!("Reusing persisted session");
                return Ok(Session { page });
            }
            warn!("Persisted session rejected by service; falling back to login");
        }

        // Interactive login needs a window the operator can see. The
        // headless instance is useless for that, so replace it.
        drop(page);
        self.interactive_login().await
    }

    fn load_jar(&self) -> Option<CookieJar> {
        let jar = match self.store.load() {
            Ok(jar) => jar?,
            Err(e) => {
                warn!("Cookie load failed: {e:#}");
                return None;
            }
        };

        if jar.is_empty() {
            return None;
        }

        if jar.is_stale(MAX_COOKIE_AGE) {
            info!("Persisted cookies are stale; re-login required");
            return None;
        }

        Some(jar)
    }

    /// Install cookies and check the service accepts them. Best-effort:
    /// any failure just means the interactive path runs instead.
    async fn verify(&self, page: &dyn PageDriver, jar: &CookieJar) -> bool {
        let url = self.config.redeem_url();

        if page.goto(&url).await.is_err() {
            return false;
        }
        if page
            .set_cookies(&jar.cookies, &self.config.base_url)
            .await
            .is_err()
        {
            return false;
        }
        // Reload so the cookies take effect.
        if page.goto(&url).await.is_err() {
            return false;
        }

        let body = page.body_text().await.unwrap_or_default();
        !markers::requires_login(&body)
    }

    async fn interactive_login(&self) -> Result<Session> {
        let page = self
            .driver
            .launch(&LaunchOptions {
                headless: false,
                profile_dir: self.config.profile_dir.clone(),
            })
            .await?;

        page.goto(&self.config.redeem_url())
            .await
            .context("Failed to open login page")?;

        self.prompter.wait_for_login(
            "Log in to your account in the browser window.\n\
             Once logged in, press ENTER here to save cookies and continue...",
        )?;

        let cookies = page
            .cookies()
            .await
            .context("Failed to capture cookies after login")?;
        let jar = CookieJar::capture(cookies);
        self.store
            .save(&jar)
            .context("Failed to persist cookies")?;

        info!(cookies = jar.cookies.len(), "Session saved");

        Ok(Session { page })
    }
}
