//! UI markers the classification step recognizes.
//!
//! The remote service exposes no machine-readable result, so outcomes are
//! inferred from visible text and button state. These phrase tables are
//! the brittle surface; a DOM redesign upstream breaks them, not the
//! state machine around them.

use super::Outcome;

/// CSS selector for the code entry field.
pub const CODE_INPUT: &str = "input[type='text']";

/// Visible label of the final, irreversible confirm action.
pub const CONFIRM_LABEL: &str = "Confirm";

const SUCCESS_PHRASES: &[&str] = &["successfully redeemed", "added to your account"];
const ALREADY_USED_PHRASES: &[&str] = &["already redeemed", "already been used"];
const INVALID_PHRASES: &[&str] = &["code didn't work", "invalid code"];
const LOGIN_PHRASES: &[&str] = &["verify it's you", "you must sign in"];
const FAILURE_PHRASES: &[&str] = &["something went wrong"];

fn contains_any(body: &str, phrases: &[&str]) -> bool {
    phrases.iter().any(|p| body.contains(p))
}

/// Whether the page is asking for authentication.
pub fn requires_login(body: &str) -> bool {
    contains_any(&body.to_lowercase(), LOGIN_PHRASES)
}

/// Map visible page text to a terminal outcome, if any marker matches.
///
/// Checked in the order the service tends to surface them; the first
/// match wins.
pub fn classify(body: &str) -> Option<Outcome> {
    let body = body.to_lowercase();

    if contains_any(&body, SUCCESS_PHRASES) {
        return Some(Outcome::Success);
    }
    if contains_any(&body, ALREADY_USED_PHRASES) {
        return Some(Outcome::AlreadyUsed);
    }
    if contains_any(&body, INVALID_PHRASES) {
        return Some(Outcome::Invalid);
    }
    if contains_any(&body, LOGIN_PHRASES) {
        return Some(Outcome::LoginRequired);
    }
    None
}

/// Whether the page confirms the redemption went through.
pub fn confirms_success(body: &str) -> bool {
    contains_any(&body.to_lowercase(), SUCCESS_PHRASES)
}

/// Whether the page shows an error after the confirm click.
pub fn confirms_failure(body: &str) -> bool {
    let body = body.to_lowercase();
    contains_any(&body, FAILURE_PHRASES) || contains_any(&body, INVALID_PHRASES)
}
