use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::duration::deserialize_duration;

/// Default maximum wait for any single UI condition.
fn default_timeout() -> Duration {
    Duration::from_secs(20)
}

fn default_base_url() -> String {
    "https://play.google.com".to_string()
}

fn default_profile_dir() -> PathBuf {
    PathBuf::from("./chrome_profile")
}

fn default_cookie_file() -> PathBuf {
    PathBuf::from("./google_cookies.json")
}

/// Engine configuration, fixed at construction.
///
/// Changing behavior (dry-run, headless, timeout) requires building a new
/// engine; nothing here is mutated between redemption calls.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RedeemConfig {
    /// Perform every step except the final confirm click.
    pub dry_run: bool,

    /// Run the browser without a visible window.
    ///
    /// The interactive login path ignores this and forces a visible
    /// window, since a human has to drive it.
    pub headless: bool,

    /// Maximum wait for any single UI condition (input field, confirm
    /// button, result markers).
    #[serde(
        default = "default_timeout",
        deserialize_with = "deserialize_duration"
    )]
    pub timeout: Duration,

    /// Origin of the redemption service.
    pub base_url: String,

    /// Browser profile directory, reused across runs for faster warm
    /// starts. Safe to delete.
    pub profile_dir: PathBuf,

    /// Serialized cookie jar. Safe to delete to force a fresh login.
    pub cookie_file: PathBuf,
}

impl Default for RedeemConfig {
    fn default() -> Self {
        Self {
            dry_run: false,
            headless: true,
            timeout: default_timeout(),
            base_url: default_base_url(),
            profile_dir: default_profile_dir(),
            cookie_file: default_cookie_file(),
        }
    }
}

impl RedeemConfig {
    /// Load configuration from a TOML file, falling back to defaults when
    /// the file does not exist.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// URL of the redemption entry surface.
    pub fn redeem_url(&self) -> String {
        format!("{}/redeem", self.base_url.trim_end_matches('/'))
    }
}
