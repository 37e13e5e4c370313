//! Cheap per-domain entry filter.
//!
//! Runs before any page logic and decides on cookie names alone: no token
//! parsing, no auth-provider or database round trip. Role checks happen later
//! in [`crate::guards::role_gate`].

use crate::config::DomainUrls;
use crate::domain::Domain;
use crate::middleware::domain::resolve_request_domain;
use crate::services::metrics::record_gate_decision;
use crate::session::has_session_cookie;
use crate::templates::NotFoundTemplate;
use crate::AppState;
use axum::{
    extract::{Query, Request, State},
    http::{HeaderValue, StatusCode, Uri},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use axum_extra::extract::CookieJar;
use std::collections::HashMap;

/// Query parameter selecting an organization.
pub const ORG_QUERY_PARAM: &str = "org";

/// Header carrying the selected organization downstream.
pub const ORG_SLUG_HEADER: &str = "x-org-slug";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EdgeDecision {
    PassThrough { org_slug: Option<String> },
    RedirectToLogin { location: String },
    /// `?org=` names something no header can carry, so no organization matches.
    UnknownOrganization,
}

fn org_param(uri: &Uri) -> Option<String> {
    let Query(params) = Query::<HashMap<String, String>>::try_from_uri(uri).ok()?;
    params
        .get(ORG_QUERY_PARAM)
        .filter(|slug| !slug.is_empty())
        .cloned()
}

/// The URL the browser asked for, rebuilt on the domain's configured base so
/// the round trip through login lands on the right host.
fn original_url(domain: Domain, uri: &Uri, urls: &DomainUrls) -> String {
    let path_and_query = uri
        .path_and_query()
        .map(|pq| pq.as_str())
        .unwrap_or("/");
    format!("{}{}", urls.base_url(domain), path_and_query)
}

/// Decide on a request from its domain, URI and cookie names.
pub fn evaluate(domain: Domain, uri: &Uri, jar: &CookieJar, urls: &DomainUrls) -> EdgeDecision {
    if domain.requires_session() && !has_session_cookie(jar) {
        return EdgeDecision::RedirectToLogin {
            location: urls.login_url(&original_url(domain, uri, urls)),
        };
    }

    match org_param(uri) {
        Some(slug) if HeaderValue::from_bytes(slug.as_bytes()).is_err() => {
            EdgeDecision::UnknownOrganization
        }
        org_slug => EdgeDecision::PassThrough { org_slug },
    }
}

pub async fn edge_gate_middleware(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Response {
    let domain = request
        .extensions()
        .get::<Domain>()
        .copied()
        .unwrap_or_else(|| resolve_request_domain(request.headers(), request.uri()));

    match evaluate(domain, request.uri(), &jar, &state.settings.domains) {
        EdgeDecision::RedirectToLogin { location } => {
            tracing::debug!(
                domain = %domain,
                path = %request.uri().path(),
                "No session cookie, redirecting to login"
            );
            record_gate_decision("edge", domain.as_str(), "redirect_login");
            Redirect::temporary(&location).into_response()
        }
        EdgeDecision::UnknownOrganization => {
            record_gate_decision("edge", domain.as_str(), "unknown_org");
            (StatusCode::NOT_FOUND, NotFoundTemplate {}).into_response()
        }
        EdgeDecision::PassThrough { org_slug } => {
            record_gate_decision("edge", domain.as_str(), "pass");

            // Only the gate may set the selector header.
            request.headers_mut().remove(ORG_SLUG_HEADER);
            let org_header = org_slug.and_then(|slug| HeaderValue::from_bytes(slug.as_bytes()).ok());
            if let Some(value) = &org_header {
                request.headers_mut().insert(ORG_SLUG_HEADER, value.clone());
            }

            let mut response = next.run(request).await;
            if let Some(value) = org_header {
                response.headers_mut().insert(ORG_SLUG_HEADER, value);
            }
            response
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::{header, HeaderMap};

    fn urls() -> DomainUrls {
        DomainUrls {
            www: "https://www.example".to_string(),
            app: "https://app.example".to_string(),
            admin: "https://admin.example".to_string(),
            ops: "https://ops.example".to_string(),
        }
    }

    fn jar(cookie_header: Option<&str>) -> CookieJar {
        let mut headers = HeaderMap::new();
        if let Some(value) = cookie_header {
            headers.insert(header::COOKIE, HeaderValue::from_str(value).unwrap());
        }
        CookieJar::from_headers(&headers)
    }

    #[test]
    fn missing_session_redirects_with_encoded_next() {
        let uri: Uri = "/orgs/acme?tab=members".parse().unwrap();
        let decision = evaluate(Domain::Admin, &uri, &jar(None), &urls());

        assert_eq!(
            decision,
            EdgeDecision::RedirectToLogin {
                location: "https://www.example/login?next=https%3A%2F%2Fadmin.example%2Forgs%2Facme%3Ftab%3Dmembers"
                    .to_string()
            }
        );
    }

    #[test]
    fn any_session_shaped_cookie_passes() {
        let uri: Uri = "/".parse().unwrap();
        let decision = evaluate(
            Domain::Ops,
            &uri,
            &jar(Some("sb-proj-auth-token=expired-or-forged")),
            &urls(),
        );
        assert_eq!(decision, EdgeDecision::PassThrough { org_slug: None });
    }

    #[test]
    fn org_query_is_forwarded() {
        let uri: Uri = "/?org=acme".parse().unwrap();
        let decision = evaluate(
            Domain::App,
            &uri,
            &jar(Some("sb-proj-auth-token=x")),
            &urls(),
        );
        assert_eq!(
            decision,
            EdgeDecision::PassThrough {
                org_slug: Some("acme".to_string())
            }
        );
    }

    #[test]
    fn org_query_is_forwarded_verbatim() {
        let uri: Uri = "/?org=%20caf%C3%A9".parse().unwrap();
        let decision = evaluate(Domain::Admin, &uri, &jar(Some("sb-p-auth-token=x")), &urls());
        assert_eq!(
            decision,
            EdgeDecision::PassThrough {
                org_slug: Some(" café".to_string())
            }
        );
    }

    #[test]
    fn org_query_that_cannot_be_a_header_is_unknown() {
        let uri: Uri = "/?org=acme%0Aglobex".parse().unwrap();
        let decision = evaluate(Domain::Admin, &uri, &jar(Some("sb-p-auth-token=x")), &urls());
        assert_eq!(decision, EdgeDecision::UnknownOrganization);
    }

    #[test]
    fn empty_org_query_is_ignored() {
        let uri: Uri = "/?org=".parse().unwrap();
        let decision = evaluate(Domain::App, &uri, &jar(Some("sb-p-auth-token=x")), &urls());
        assert_eq!(decision, EdgeDecision::PassThrough { org_slug: None });
    }

    #[test]
    fn public_domain_never_redirects() {
        let uri: Uri = "/pricing".parse().unwrap();
        let decision = evaluate(Domain::Www, &uri, &jar(None), &urls());
        assert_eq!(decision, EdgeDecision::PassThrough { org_slug: None });
    }
}
