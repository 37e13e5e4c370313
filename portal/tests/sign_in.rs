mod common;

use axum::http::StatusCode;
use common::{body_string, header, set_cookies, token_for, TestApp, COOKIE_NAME, OWNER_PASSWORD};

fn login_form(email: &str, password: &str, next: &str) -> String {
    format!(
        "email={}&password={}&next={}",
        urlencoding::encode(email),
        urlencoding::encode(password),
        urlencoding::encode(next)
    )
}

/// `name=value` pairs from `Set-Cookie` headers, ready for a `Cookie` header.
fn cookie_header(set_cookies: &[String]) -> String {
    set_cookies
        .iter()
        .filter_map(|cookie| cookie.split(';').next())
        .collect::<Vec<_>>()
        .join("; ")
}

#[tokio::test]
async fn login_page_carries_next_through_the_form() {
    let app = TestApp::spawn();

    let response = app
        .get(
            "www.example",
            "/login?next=https%3A%2F%2Fadmin.example%2Forgs%2Facme",
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;
    assert!(body.contains(r#"name="next""#));
    assert!(body.contains("admin.example"));
}

#[tokio::test]
async fn sign_in_sets_session_cookie_and_returns_to_next() {
    let app = TestApp::spawn();

    let response = app
        .post_form(
            "www.example",
            "/login",
            None,
            &login_form("owner@acme.test", OWNER_PASSWORD, "https://admin.example/orgs/acme"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(
        header(&response, "location"),
        Some("https://admin.example/orgs/acme")
    );

    let cookies = set_cookies(&response);
    let session = cookies
        .iter()
        .find(|cookie| cookie.starts_with(&format!("{COOKIE_NAME}=base64-")))
        .expect("session cookie set");
    assert!(session.contains("HttpOnly"));
    assert!(session.contains("Secure"));
    assert!(session.contains("SameSite=Lax"));

    // The same cookie gets the caller through both gates.
    let response = app
        .get("admin.example", "/orgs/acme", Some(&cookie_header(&cookies)))
        .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert!(body_string(response).await.contains("Acme Corp"));
}

#[tokio::test]
async fn foreign_next_falls_back_to_the_app() {
    let app = TestApp::spawn();

    for next in ["https://evil.test/phish", "//evil.test", ""] {
        let response = app
            .post_form(
                "www.example",
                "/login",
                None,
                &login_form("owner@acme.test", OWNER_PASSWORD, next),
            )
            .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER, "next {next:?}");
        assert_eq!(
            header(&response, "location"),
            Some("https://app.example"),
            "next {next:?}"
        );
    }
}

#[tokio::test]
async fn wrong_password_rerenders_the_form() {
    let app = TestApp::spawn();

    let response = app
        .post_form(
            "www.example",
            "/login",
            None,
            &login_form("owner@acme.test", "wrong", "https://app.example/"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(set_cookies(&response).is_empty());
    let body = body_string(response).await;
    assert!(body.contains("Invalid email or password"));
    assert!(body.contains(r#"value="owner@acme.test""#));
}

#[tokio::test]
async fn malformed_email_is_rejected_before_the_provider() {
    let app = TestApp::spawn();

    let response = app
        .post_form(
            "www.example",
            "/login",
            None,
            &login_form("not-an-email", OWNER_PASSWORD, ""),
        )
        .await;

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    assert!(body_string(response)
        .await
        .contains("Enter a valid email address and password"));
}

#[tokio::test]
async fn logout_revokes_token_and_expires_cookie() {
    let app = TestApp::spawn();
    let token = token_for(&app.member);
    let cookie = common::session_cookie(&token);
    assert!(app.auth.is_active(&token));

    let response = app.post_form("www.example", "/logout", Some(&cookie), "").await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&response, "location"), Some("https://www.example"));
    assert!(set_cookies(&response)
        .iter()
        .any(|cookie| cookie.starts_with(&format!("{COOKIE_NAME}=;"))));
    assert!(!app.auth.is_active(&token));

    // The stale cookie still passes the edge, but not the page.
    let response = app.get("app.example", "/", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&response, "location"), Some("/unauthorized"));
}

#[tokio::test]
async fn logout_without_session_just_redirects() {
    let app = TestApp::spawn();

    let response = app.get("www.example", "/logout", None).await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(header(&response, "location"), Some("https://www.example"));
}

#[tokio::test]
async fn sign_in_expires_stale_session_chunks() {
    let app = TestApp::spawn();
    let stale = format!("{COOKIE_NAME}.0=base64-stale; {COOKIE_NAME}.1=more");

    let response = app
        .post_form(
            "www.example",
            "/login",
            Some(&stale),
            &login_form("owner@acme.test", OWNER_PASSWORD, "https://app.example/"),
        )
        .await;

    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    let cookies = set_cookies(&response);
    for chunk in ["0", "1"] {
        assert!(
            cookies
                .iter()
                .any(|cookie| cookie.starts_with(&format!("{COOKIE_NAME}.{chunk}=;"))),
            "chunk {chunk} not expired: {cookies:?}"
        );
    }
    assert!(cookies
        .iter()
        .any(|cookie| cookie.starts_with(&format!("{COOKIE_NAME}=base64-"))));
}
