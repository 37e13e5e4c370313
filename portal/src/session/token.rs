use crate::config::SessionSettings;
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use base64::{engine::general_purpose, Engine as _};
use serde::{Deserialize, Serialize};

use super::presence::is_session_cookie_name;

/// Prefix the provider's SSR helpers put in front of base64url cookie values.
const BASE64_PREFIX: &str = "base64-";

/// Browsers cap a cookie around 4 KiB; larger sessions are split into
/// `name.0`, `name.1`, … chunks of this many bytes.
pub const MAX_CHUNK_SIZE: usize = 3180;

/// Session as the auth provider serializes it into the cookie.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub expires_at: Option<i64>,
}

/// Reassemble the configured session cookie (whole or chunked).
fn raw_cookie_value(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    if let Some(cookie) = jar.get(cookie_name) {
        return Some(cookie.value().to_string());
    }

    let mut combined = String::new();
    for index in 0.. {
        match jar.get(&format!("{}.{}", cookie_name, index)) {
            Some(chunk) => combined.push_str(chunk.value()),
            None => break,
        }
    }

    (!combined.is_empty()).then_some(combined)
}

fn decode_session(raw: &str) -> Option<StoredSession> {
    let json = match raw.strip_prefix(BASE64_PREFIX) {
        Some(encoded) => {
            let encoded = encoded.trim_end_matches('=');
            let bytes = general_purpose::URL_SAFE_NO_PAD
                .decode(encoded)
                .or_else(|_| general_purpose::STANDARD_NO_PAD.decode(encoded))
                .ok()?;
            String::from_utf8(bytes).ok()?
        }
        None => urlencoding::decode(raw).ok()?.into_owned(),
    };

    serde_json::from_str(&json).ok()
}

/// Pull the access token out of the session cookie. Any malformed value is
/// treated as "no session"; the token itself is verified by the provider.
pub fn read_access_token(jar: &CookieJar, cookie_name: &str) -> Option<String> {
    let raw = raw_cookie_value(jar, cookie_name)?;
    let session = decode_session(&raw);
    if session.is_none() {
        tracing::debug!(cookie = %cookie_name, "Session cookie present but unreadable");
    }
    session
        .map(|s| s.access_token)
        .filter(|token| !token.is_empty())
}

pub fn encode_session(session: &StoredSession) -> Result<String, serde_json::Error> {
    let json = serde_json::to_vec(session)?;
    Ok(format!(
        "{}{}",
        BASE64_PREFIX,
        general_purpose::URL_SAFE_NO_PAD.encode(json)
    ))
}

fn base_cookie(name: String, value: String, settings: &SessionSettings) -> Cookie<'static> {
    let mut cookie = Cookie::build((name, value))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies)
        .max_age(time::Duration::days(settings.max_age_days))
        .build();
    if let Some(domain) = &settings.cookie_domain {
        cookie.set_domain(domain.clone());
    }
    cookie
}

/// Cookies carrying `session`, chunked when the encoded value is too large.
pub fn session_cookies(
    session: &StoredSession,
    settings: &SessionSettings,
) -> Result<Vec<Cookie<'static>>, serde_json::Error> {
    let value = encode_session(session)?;

    if value.len() <= MAX_CHUNK_SIZE {
        return Ok(vec![base_cookie(
            settings.cookie_name.clone(),
            value,
            settings,
        )]);
    }

    // The encoded value is ASCII, so byte chunks are valid strings.
    Ok(value
        .as_bytes()
        .chunks(MAX_CHUNK_SIZE)
        .enumerate()
        .map(|(index, chunk)| {
            base_cookie(
                format!("{}.{}", settings.cookie_name, index),
                String::from_utf8_lossy(chunk).into_owned(),
                settings,
            )
        })
        .collect())
}

/// Write `session` into the jar, expiring any session cookie of either form
/// (whole or chunked) that the browser already holds.
pub fn store_session(
    jar: CookieJar,
    session: &StoredSession,
    settings: &SessionSettings,
) -> Result<CookieJar, serde_json::Error> {
    let cookies = session_cookies(session, settings)?;
    let jar = expire_session_cookies(jar, settings);
    Ok(cookies.into_iter().fold(jar, |jar, cookie| jar.add(cookie)))
}

/// Expire every session-shaped cookie the browser sent.
pub fn expire_session_cookies(jar: CookieJar, settings: &SessionSettings) -> CookieJar {
    let names: Vec<String> = jar
        .iter()
        .map(|cookie| cookie.name().to_string())
        .filter(|name| is_session_cookie_name(name))
        .collect();

    names.into_iter().fold(jar, |jar, name| {
        let mut removal = Cookie::build(name).path("/").build();
        if let Some(domain) = &settings.cookie_domain {
            removal.set_domain(domain.clone());
        }
        jar.remove(removal)
    })
}
