//! Scripted fakes for the browser-driver seam.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use tempfile::TempDir;

use autoredeem::config::RedeemConfig;
use autoredeem::credentials::{CookieJar, CookieStore, StoredCookie};
use autoredeem::driver::{Driver, LaunchOptions, PageDriver, SessionError};
use autoredeem::session::LoginPrompter;

/// What the fake page currently shows.
#[derive(Debug, Clone, Default)]
pub struct PageState {
    pub body: String,
    pub input_present: bool,
    pub confirm_clickable: bool,
}

impl PageState {
    /// The redemption entry surface: input field, nothing classified.
    pub fn entry() -> Self {
        Self {
            body: "Redeem a gift card or promo code".to_string(),
            input_present: true,
            confirm_clickable: false,
        }
    }

    pub fn with_body(mut self, body: &str) -> Self {
        self.body = body.to_string();
        self
    }

    pub fn confirmable(mut self) -> Self {
        self.confirm_clickable = true;
        self
    }
}

/// How one fill (one submitted code) plays out.
#[derive(Debug, Clone)]
pub struct FillResult {
    pub state: PageState,
    pub after_confirm: Option<PageState>,
}

impl FillResult {
    /// Code accepted; confirm arms; clicking lands on a success page.
    pub fn valid() -> Self {
        Self {
            state: PageState::entry().confirmable(),
            after_confirm: Some(
                PageState::entry().with_body("Item successfully redeemed and added to your account"),
            ),
        }
    }

    pub fn invalid() -> Self {
        Self {
            state: PageState::entry().with_body("That code didn't work. Check it and try again."),
            after_confirm: None,
        }
    }

    pub fn already_used() -> Self {
        Self {
            state: PageState::entry().with_body("This code has already been used."),
            after_confirm: None,
        }
    }

    pub fn login_required() -> Self {
        Self {
            state: PageState::entry().with_body("To continue, verify it's you"),
            after_confirm: None,
        }
    }
}

/// Scripted page with shared counters the test can inspect afterwards.
#[derive(Debug, Default)]
pub struct FakePage {
    entry: Mutex<PageState>,
    current: Mutex<PageState>,
    results: Mutex<VecDeque<FillResult>>,
    pending_confirm: Mutex<Option<PageState>>,
    pub stored_cookies: Mutex<Vec<StoredCookie>>,
    pub installed_cookies: Mutex<Vec<StoredCookie>>,
    pub goto_count: AtomicUsize,
    pub fill_count: AtomicUsize,
    pub confirm_clicks: AtomicUsize,
}

impl FakePage {
    pub fn new() -> Arc<Self> {
        let page = Self::default();
        *page.entry.lock().unwrap() = PageState::entry();
        *page.current.lock().unwrap() = PageState::entry();
        Arc::new(page)
    }

    /// Replace the entry state (e.g. to simulate a logged-out surface).
    pub fn with_entry(self: Arc<Self>, entry: PageState) -> Arc<Self> {
        *self.entry.lock().unwrap() = entry.clone();
        *self.current.lock().unwrap() = entry;
        self
    }

    /// Cookies the page will report when captured after login.
    pub fn with_cookies(self: Arc<Self>, cookies: Vec<StoredCookie>) -> Arc<Self> {
        *self.stored_cookies.lock().unwrap() = cookies;
        self
    }

    /// Queue the outcome of the next fill.
    pub fn script(self: Arc<Self>, result: FillResult) -> Arc<Self> {
        self.results.lock().unwrap().push_back(result);
        self
    }
}

/// Handle the fake driver hands out; shares state with the test's Arc.
pub struct SharedPage(pub Arc<FakePage>);

#[async_trait]
impl PageDriver for SharedPage {
    async fn goto(&self, _url: &str) -> Result<()> {
        self.0.goto_count.fetch_add(1, Ordering::SeqCst);
        let entry = self.0.entry.lock().unwrap().clone();
        *self.0.current.lock().unwrap() = entry;
        *self.0.pending_confirm.lock().unwrap() = None;
        Ok(())
    }

    async fn element_exists(&self, _selector: &str) -> Result<bool> {
        Ok(self.0.current.lock().unwrap().input_present)
    }

    async fn fill(&self, _selector: &str, _value: &str) -> Result<()> {
        self.0.fill_count.fetch_add(1, Ordering::SeqCst);
        if let Some(result) = self.0.results.lock().unwrap().pop_front() {
            *self.0.current.lock().unwrap() = result.state;
            *self.0.pending_confirm.lock().unwrap() = result.after_confirm;
        }
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        Ok(self.0.current.lock().unwrap().body.clone())
    }

    async fn button_clickable(&self, _label: &str) -> Result<bool> {
        Ok(self.0.current.lock().unwrap().confirm_clickable)
    }

    async fn click_button(&self, _label: &str) -> Result<()> {
        self.0.confirm_clicks.fetch_add(1, Ordering::SeqCst);
        if let Some(next) = self.0.pending_confirm.lock().unwrap().take() {
            *self.0.current.lock().unwrap() = next;
        }
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        Ok(self.0.stored_cookies.lock().unwrap().clone())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie], _url: &str) -> Result<()> {
        self.0
            .installed_cookies
            .lock()
            .unwrap()
            .extend(cookies.iter().cloned());
        Ok(())
    }
}

/// Driver that hands out scripted pages, one per launch.
#[derive(Default)]
pub struct FakeDriver {
    pages: Mutex<VecDeque<Arc<FakePage>>>,
    pub launches: AtomicUsize,
    pub launch_headless: Mutex<Vec<bool>>,
}

impl FakeDriver {
    pub fn single(page: Arc<FakePage>) -> Arc<Self> {
        Self::queue(vec![page])
    }

    pub fn queue(pages: Vec<Arc<FakePage>>) -> Arc<Self> {
        let driver = Self::default();
        *driver.pages.lock().unwrap() = pages.into();
        Arc::new(driver)
    }

    /// A driver whose every launch fails, as when Chrome is missing.
    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

#[async_trait]
impl Driver for FakeDriver {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PageDriver>, SessionError> {
        let page = self
            .pages
            .lock()
            .unwrap()
            .pop_front()
            .ok_or(SessionError::BrowserNotFound)?;
        self.launches.fetch_add(1, Ordering::SeqCst);
        self.launch_headless.lock().unwrap().push(options.headless);
        Ok(Box::new(SharedPage(page)))
    }
}

/// Login gate that records invocations instead of blocking.
#[derive(Default)]
pub struct RecordingPrompter {
    pub calls: AtomicUsize,
}

impl RecordingPrompter {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

impl LoginPrompter for RecordingPrompter {
    fn wait_for_login(&self, _prompt: &str) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Config pointed at a temp dir, with waits short enough for tests.
pub fn test_config(dir: &TempDir) -> RedeemConfig {
    RedeemConfig {
        cookie_file: dir.path().join("cookies.json"),
        profile_dir: dir.path().join("profile"),
        timeout: Duration::from_millis(400),
        ..Default::default()
    }
}

/// Persist a fresh cookie jar so construction takes the warm-start path.
pub fn seed_cookies(config: &RedeemConfig) {
    CookieStore::new(&config.cookie_file)
        .save(&CookieJar::capture(vec![StoredCookie::new("SID", "test-session")]))
        .expect("seed cookies");
}
