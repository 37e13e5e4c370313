//! Pages every gated front-end serves.

use crate::domain::Domain;
use crate::guards::{authorize, GateRejection};
use crate::middleware::ORG_SLUG_HEADER;
use crate::services::{AuthUser, OrgSelector};
use crate::templates::{NotFoundTemplate, OrgOverviewTemplate, UnauthorizedTemplate};
use crate::AppState;
use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Extension,
};

/// Slug forwarded by the edge gate from `?org=`. The header carries the raw
/// UTF-8 bytes, so non-ASCII slugs survive.
pub fn forwarded_org_slug(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(ORG_SLUG_HEADER)
        .and_then(|value| std::str::from_utf8(value.as_bytes()).ok())
}

/// Run the role gate for `domain` and render the organization overview.
pub async fn render_org_overview(
    state: &AppState,
    domain: Domain,
    heading: &'static str,
    caller: Option<&AuthUser>,
    selector: OrgSelector,
) -> Result<Response, GateRejection> {
    let org = authorize(state.directory.as_ref(), domain, caller, &selector).await?;

    let email = caller
        .and_then(|user| user.email.clone())
        .unwrap_or_default();

    Ok(OrgOverviewTemplate {
        domain,
        heading,
        email,
        org,
    }
    .into_response())
}

pub async fn unauthorized(
    State(state): State<AppState>,
    Extension(domain): Extension<Domain>,
) -> impl IntoResponse {
    (
        StatusCode::FORBIDDEN,
        UnauthorizedTemplate {
            domain,
            app_url: state.settings.domains.base_url(Domain::App).to_string(),
        },
    )
}

pub async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, NotFoundTemplate {})
}
