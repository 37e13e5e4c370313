use axum_extra::extract::CookieJar;

pub const SESSION_COOKIE_PREFIX: &str = "sb-";
pub const SESSION_COOKIE_MARKER: &str = "auth-token";

/// Name-only heuristic: `sb-` prefix and an `auth-token` substring.
/// Chunked cookies (`…-auth-token.0`) match as well.
pub fn is_session_cookie_name(name: &str) -> bool {
    name.starts_with(SESSION_COOKIE_PREFIX) && name.contains(SESSION_COOKIE_MARKER)
}

/// `true` when at least one cookie looks like a session. The value is never
/// inspected, so an expired or forged token still passes.
pub fn has_session_cookie(jar: &CookieJar) -> bool {
    jar.iter().any(|cookie| is_session_cookie_name(cookie.name()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap, HeaderValue};

    fn jar(cookie_header: &str) -> CookieJar {
        let mut headers = HeaderMap::new();
        headers.insert(header::COOKIE, HeaderValue::from_str(cookie_header).unwrap());
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn matches_provider_cookie_names() {
        assert!(is_session_cookie_name("sb-abcdefgh-auth-token"));
        assert!(is_session_cookie_name("sb-localhost-auth-token.1"));
        assert!(is_session_cookie_name("sb-auth-token"));
    }

    #[test]
    fn rejects_lookalikes() {
        assert!(!is_session_cookie_name("auth-token"));
        assert!(!is_session_cookie_name("xsb-abc-auth-token"));
        assert!(!is_session_cookie_name("sb-abc-refresh"));
        assert!(!is_session_cookie_name("SB-abc-auth-token"));
    }

    #[test]
    fn any_matching_cookie_counts_regardless_of_value() {
        assert!(has_session_cookie(&jar("theme=dark; sb-xyz-auth-token=garbage")));
        assert!(!has_session_cookie(&jar("theme=dark; session=abc")));
        assert!(!has_session_cookie(&CookieJar::new()));
    }
}
