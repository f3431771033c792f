//! Chrome DevTools Protocol driver implementation.

use anyhow::{Context, Result};
use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::network::CookieParam;
use chromiumoxide::Page;
use futures::StreamExt;
use tokio::task::JoinHandle;

use crate::credentials::StoredCookie;

use super::{Driver, LaunchOptions, PageDriver, SessionError};

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

/// Launches real Chrome/Chromium instances over CDP.
#[derive(Debug, Default)]
pub struct ChromiumDriver;

impl ChromiumDriver {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait::async_trait]
impl Driver for ChromiumDriver {
    async fn launch(&self, options: &LaunchOptions) -> Result<Box<dyn PageDriver>, SessionError> {
        let chrome_path = find_chrome().ok_or(SessionError::BrowserNotFound)?;

        let mut builder = BrowserConfig::builder()
            .chrome_executable(chrome_path)
            .viewport(None)
            .user_data_dir(&options.profile_dir)
            // Anti-automation-detection flags.
            .arg("--disable-blink-features=AutomationControlled")
            .arg("--disable-infobars")
            .arg("--no-first-run")
            .arg("--no-default-browser-check")
            // Constrained hosts (containers, CI) lack a usable GPU and
            // have a tiny /dev/shm.
            .arg("--no-sandbox")
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-extensions")
            .arg("--window-size=1920,1080")
            .arg(format!("--user-agent={USER_AGENT}"));

        if !options.headless {
            builder = builder.with_head();
        }

        let config = builder
            .build()
            .map_err(SessionError::Launch)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| SessionError::Launch(e.to_string()))?;

        // CDP messages stop flowing if nobody drains the handler.
        let handler_task = tokio::spawn(async move { while (handler.next().await).is_some() {} });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| SessionError::Page(e.to_string()))?;

        Ok(Box::new(ChromiumPage {
            _browser: browser,
            handler_task,
            page,
        }))
    }
}

/// One live page plus the browser that owns it.
pub struct ChromiumPage {
    _browser: Browser,
    handler_task: JoinHandle<()>,
    page: Page,
}

impl Drop for ChromiumPage {
    fn drop(&mut self) {
        self.handler_task.abort();
    }
}

#[async_trait::async_trait]
impl PageDriver for ChromiumPage {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .with_context(|| format!("Failed to navigate to {url}"))?;
        Ok(())
    }

    async fn element_exists(&self, selector: &str) -> Result<bool> {
        Ok(self.page.find_element(selector).await.is_ok())
    }

    async fn fill(&self, selector: &str, value: &str) -> Result<()> {
        let element = self
            .page
            .find_element(selector)
            .await
            .with_context(|| format!("Element not found: {selector}"))?;
        element.click().await.context("Failed to focus input")?;
        element
            .type_str(value)
            .await
            .context("Failed to type into input")?;
        Ok(())
    }

    async fn body_text(&self) -> Result<String> {
        let body = self
            .page
            .find_element("body")
            .await
            .context("Page has no body")?;
        Ok(body.inner_text().await?.unwrap_or_default())
    }

    async fn button_clickable(&self, label: &str) -> Result<bool> {
        let js = format!(
            r#"(() => {{
                const label = {label};
                const btn = Array.from(document.querySelectorAll('button'))
                    .find(b => (b.textContent || '').includes(label));
                if (!btn || btn.disabled) return false;
                const r = btn.getBoundingClientRect();
                return r.width > 0 && r.height > 0;
            }})()"#,
            label = serde_json::to_string(label)?,
        );
        let result = self.page.evaluate(js).await.context("Button probe failed")?;
        Ok(result.into_value::<bool>().unwrap_or(false))
    }

    async fn click_button(&self, label: &str) -> Result<()> {
        let js = format!(
            r#"(() => {{
                const label = {label};
                const btn = Array.from(document.querySelectorAll('button'))
                    .find(b => (b.textContent || '').includes(label) && !b.disabled);
                if (!btn) return false;
                btn.click();
                return true;
            }})()"#,
            label = serde_json::to_string(label)?,
        );
        let result = self.page.evaluate(js).await.context("Button click failed")?;
        let clicked = result.into_value::<bool>().unwrap_or(false);
        anyhow::ensure!(clicked, "No clickable button labeled {label:?}");
        Ok(())
    }

    async fn cookies(&self) -> Result<Vec<StoredCookie>> {
        let cookies = self.page.get_cookies().await.context("Failed to read cookies")?;
        Ok(cookies
            .into_iter()
            .map(|c| StoredCookie {
                name: c.name,
                value: c.value,
                domain: Some(c.domain),
                path: Some(c.path),
            })
            .collect())
    }

    async fn set_cookies(&self, cookies: &[StoredCookie], url: &str) -> Result<()> {
        let params: Vec<CookieParam> = cookies
            .iter()
            .map(|c| {
                let mut param = CookieParam::new(c.name.clone(), c.value.clone());
                param.url = Some(url.to_string());
                param
            })
            .collect();

        if !params.is_empty() {
            self.page
                .set_cookies(params)
                .await
                .context("Failed to install cookies")?;
        }
        Ok(())
    }
}

/// Find a Chrome/Chromium executable.
fn find_chrome() -> Option<String> {
    for binary in ["google-chrome", "chromium"] {
        if let Ok(output) = std::process::Command::new("which").arg(binary).output() {
            if output.status.success() {
                let path = String::from_utf8_lossy(&output.stdout).trim().to_string();
                if !path.is_empty() {
                    return Some(path);
                }
            }
        }
    }

    let candidates = [
        "/usr/bin/google-chrome",
        "/usr/bin/google-chrome-stable",
        "/usr/bin/chromium",
        "/usr/bin/chromium-browser",
        "/snap/bin/chromium",
        "/run/current-system/sw/bin/google-chrome",
        "/run/current-system/sw/bin/chromium",
        "/Applications/Google Chrome.app/Contents/MacOS/Google Chrome",
        "/Applications/Chromium.app/Contents/MacOS/Chromium",
    ];

    for candidate in candidates {
        if std::path::Path::new(candidate).exists() {
            return Some(candidate.to_string());
        }
    }
    None
}
