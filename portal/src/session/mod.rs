//! Session cookies owned by the auth provider.
//!
//! The edge only ever asks whether a session-shaped cookie is present
//! ([`presence`]). Reading the token back out of the cookie happens in the
//! server layer ([`token`]) right before the provider verifies it.

pub mod presence;
pub mod token;

pub use presence::{has_session_cookie, is_session_cookie_name};
pub use token::{
    expire_session_cookies, read_access_token, session_cookies, store_session, StoredSession,
};
