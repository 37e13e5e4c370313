use crate::domain::Domain;
use crate::guards::{CurrentCaller, GateRejection};
use crate::handlers::pages::render_org_overview;
use crate::services::OrgSelector;
use crate::templates::DashboardTemplate;
use crate::AppState;
use axum::{
    extract::{Path, State},
    response::{IntoResponse, Response},
};

/// Lists every organization the caller belongs to. Needs a verified caller
/// but no organization, so a new user with no memberships still lands here.
pub async fn dashboard(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
) -> Result<Response, GateRejection> {
    let Some(caller) = caller else {
        return Err(GateRejection::Unauthorized);
    };

    let memberships = state.directory.list_memberships(caller.id).await?;

    Ok(DashboardTemplate {
        email: caller.email.unwrap_or_default(),
        memberships,
        admin_url: state.settings.domains.base_url(Domain::Admin).to_string(),
    }
    .into_response())
}

pub async fn org_page(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(slug): Path<String>,
) -> Result<Response, GateRejection> {
    let selector = OrgSelector::first_of([Some(slug.as_str())]);
    render_org_overview(&state, Domain::App, "Organization", caller.as_ref(), selector).await
}
