//! The per-code redemption state machine and its public facade.

pub mod markers;

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::RedeemConfig;
use crate::driver::{ChromiumDriver, Driver, PageDriver};
use crate::poll::{poll_until, POLL_INTERVAL};
use crate::session::{LoginPrompter, Session, SessionManager, StdinPrompter};

/// Result of one redemption attempt.
///
/// Closed set; call sites match exhaustively. [`Outcome::DryRunOk`] means
/// the confirm action was reachable but deliberately not clicked - it
/// maps to `"SUCCESS"` at the string boundary for compatibility, but the
/// enum keeps it distinguishable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    /// The code was redeemed.
    Success,
    /// Dry run reached the confirm action without clicking it.
    DryRunOk,
    /// The service rejected the code as invalid or expired.
    Invalid,
    /// The code was consumed previously.
    AlreadyUsed,
    /// The session lost authentication mid-run. No re-login is attempted
    /// within the call; that is the caller's decision.
    LoginRequired,
    /// Navigation failure, timeout, or unclassifiable page state.
    Error,
}

impl Outcome {
    /// The external string contract: exactly five values.
    pub fn as_str(&self) -> &'static str {
        match self {
            Outcome::Success | Outcome::DryRunOk => "SUCCESS",
            Outcome::Invalid => "INVALID",
            Outcome::AlreadyUsed => "ALREADY_USED",
            Outcome::LoginRequired => "LOGIN_REQ",
            Outcome::Error => "ERROR",
        }
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Failures internal to one redemption call.
///
/// Never escapes [`RedemptionEngine::redeem`]; everything here folds into
/// [`Outcome::Error`].
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("timed out waiting for {0}")]
    UiTimeout(&'static str),

    #[error("no classification marker matched within the wait")]
    MarkerAmbiguous,

    #[error(transparent)]
    Driver(#[from] anyhow::Error),
}

/// What the classification poll settled on.
enum Classified {
    ReadyToConfirm,
    Terminal(Outcome),
}

/// Executes one code submission end-to-end against an existing session.
pub struct RedemptionEngine {
    config: RedeemConfig,
}

impl RedemptionEngine {
    pub fn new(config: RedeemConfig) -> Self {
        Self { config }
    }

    /// Run the state machine for one code.
    ///
    /// Total for all inputs: ordinary UI and navigation failures come
    /// back as [`Outcome::Error`], never as an `Err`.
    pub async fn redeem(&self, page: &dyn PageDriver, code: &str) -> Outcome {
        let code = code.trim();
        if code.is_empty() {
            warn!("Refusing to submit an empty code");
            return Outcome::Error;
        }

        match self.run(page, code).await {
            Ok(outcome) => outcome,
            Err(e) => {
                warn!("Redemption failed: {e:#}");
                Outcome::Error
            }
        }
    }

    async fn run(&self, page: &dyn PageDriver, code: &str) -> Result<Outcome, EngineError> {
        let timeout = self.config.timeout;

        page.goto(&self.config.redeem_url()).await?;

        // Inject: wait for the entry field, then type the code. Typing
        // is what arms the client-side confirm control.
        let input_ready = poll_until(timeout, POLL_INTERVAL, move || async move {
            page.element_exists(markers::CODE_INPUT)
                .await
                .map(|found| found.then_some(()))
        })
        .await?;
        if input_ready.is_none() {
            return Err(EngineError::UiTimeout("code input field"));
        }
        page.fill(markers::CODE_INPUT, code).await?;
        debug!("Code injected, waiting for the page to settle");

        // Classify: first marker wins.
        let classified = poll_until(timeout, POLL_INTERVAL, move || async move {
            if page.button_clickable(markers::CONFIRM_LABEL).await? {
                return Ok(Some(Classified::ReadyToConfirm));
            }
            let body = page.body_text().await?;
            Ok(markers::classify(&body).map(Classified::Terminal))
        })
        .await?;

        match classified {
            None => Err(EngineError::MarkerAmbiguous),
            Some(Classified::Terminal(outcome)) => Ok(outcome),
            Some(Classified::ReadyToConfirm) => self.confirm(page).await,
        }
    }

    /// The irreversible step. Only reached from ready-to-confirm.
    async fn confirm(&self, page: &dyn PageDriver) -> Result<Outcome, EngineError> {
        if self.config.dry_run {
            info!("Dry run: confirm action reachable, not clicked");
            return Ok(Outcome::DryRunOk);
        }

        page.click_button(markers::CONFIRM_LABEL).await?;
        debug!("Confirm clicked, waiting for the result");

        let settled = poll_until(self.config.timeout, POLL_INTERVAL, move || async move {
            let body = page.body_text().await?;
            if markers::confirms_success(&body) {
                return Ok(Some(Outcome::Success));
            }
            if markers::confirms_failure(&body) {
                return Ok(Some(Outcome::Error));
            }
            Ok(None)
        })
        .await?;

        settled.ok_or(EngineError::UiTimeout("redemption confirmation"))
    }
}

/// One warm authenticated session plus the engine that drives it.
///
/// Construction acquires the session eagerly, including any interactive
/// login, so the first `redeem` call starts from a hot browser. The
/// session is exclusively owned; one instance serves one caller at a
/// time.
pub struct AutoRedeemer {
    engine: RedemptionEngine,
    session: Session,
}

impl AutoRedeemer {
    /// Construct with explicit collaborators (tests inject fakes here).
    pub async fn new(
        config: RedeemConfig,
        driver: Arc<dyn Driver>,
        prompter: Arc<dyn LoginPrompter>,
    ) -> Result<Self> {
        let manager = SessionManager::new(config.clone(), driver, prompter);
        let session = manager.acquire().await?;

        Ok(Self {
            engine: RedemptionEngine::new(config),
            session,
        })
    }

    /// Production wiring: real Chrome, stdin login gate, default paths.
    pub async fn with_defaults(dry_run: bool, headless: bool, timeout: Duration) -> Result<Self> {
        let config = RedeemConfig {
            dry_run,
            headless,
            timeout,
            ..Default::default()
        };
        Self::new(config, Arc::new(ChromiumDriver::new()), Arc::new(StdinPrompter)).await
    }

    /// Redeem one code over the shared session.
    pub async fn redeem(&mut self, code: &str) -> Outcome {
        self.engine.redeem(self.session.page.as_ref(), code).await
    }
}
