//! On-disk cookie jar for reusing an authenticated browser session.

use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A single cookie captured from the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredCookie {
    pub name: String,
    pub value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
}

impl StoredCookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            domain: None,
            path: None,
        }
    }
}

/// A captured cookie set plus when it was captured.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CookieJar {
    #[serde(default)]
    pub cookies: Vec<StoredCookie>,

    /// When the session was captured (Unix timestamp).
    #[serde(default)]
    pub captured_at: Option<i64>,
}

impl CookieJar {
    /// Wrap freshly captured cookies, stamping the capture time.
    pub fn capture(cookies: Vec<StoredCookie>) -> Self {
        Self {
            cookies,
            captured_at: Some(Utc::now().timestamp()),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.cookies.is_empty()
    }

    /// Whether the jar is older than `max_age`.
    ///
    /// Jars without a capture timestamp are treated as fresh; only a
    /// known-old capture forces re-login.
    pub fn is_stale(&self, max_age: Duration) -> bool {
        match self.captured_at {
            None => false,
            Some(captured_at) => {
                let age_secs = Utc::now().timestamp() - captured_at;
                age_secs > max_age.as_secs() as i64
            }
        }
    }
}

/// Cookie jar storage at a fixed path, local-only.
pub struct CookieStore {
    path: PathBuf,
}

impl CookieStore {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the jar, if one has been persisted.
    pub fn load(&self) -> Result<Option<CookieJar>> {
        if !self.path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(&self.path)
            .with_context(|| format!("Failed to read cookie file: {}", self.path.display()))?;

        let jar: CookieJar = serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse cookie file: {}", self.path.display()))?;

        Ok(Some(jar))
    }

    /// Persist the jar, overwriting any previous content.
    pub fn save(&self, jar: &CookieJar) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create cookie dir: {}", parent.display())
                })?;
            }
        }

        let content = serde_json::to_string_pretty(jar).context("Failed to serialize cookies")?;

        std::fs::write(&self.path, content)
            .with_context(|| format!("Failed to write cookie file: {}", self.path.display()))?;

        Ok(())
    }

    pub fn delete(&self) -> Result<()> {
        if self.path.exists() {
            std::fs::remove_file(&self.path)
                .with_context(|| format!("Failed to delete cookie file: {}", self.path.display()))?;
        }
        Ok(())
    }
}
