//! Credential persistence.
//!
//! The only credential this crate holds is the browser cookie jar, stored
//! locally as plain JSON. Deleting the file forces a fresh interactive
//! login on the next run.

mod cookie_store;

pub use cookie_store::{CookieJar, CookieStore, StoredCookie};
