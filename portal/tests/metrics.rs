mod common;

use axum::http::StatusCode;
use common::{body_string, session_cookie, token_for, TestApp};
use portal::services::metrics::init_metrics;

#[tokio::test]
async fn request_metrics_use_route_templates_and_resolved_domains() {
    init_metrics();
    let app = TestApp::spawn();

    for n in 0..50 {
        let response = app
            .get(&format!("junk{n}.attacker.test"), &format!("/nope/{n}"), None)
            .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
    let cookie = session_cookie(&token_for(&app.owner));
    let response = app.get("admin.example", "/orgs/acme", Some(&cookie)).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = app.get("www.example", "/metrics", None).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_string(response).await;

    assert!(!body.contains("attacker"));
    assert!(!body.contains("/nope/"));
    assert!(body.contains(r#"path="unmatched""#));
    assert!(body.contains(r#"path="/orgs/:slug""#));
    assert!(body.contains(r#"host="admin""#));

    let junk_series = body
        .lines()
        .filter(|line| line.starts_with("http_requests_total{"))
        .filter(|line| line.contains(r#"host="www""#) && line.contains(r#"path="unmatched""#))
        .count();
    assert_eq!(junk_series, 1);
}
