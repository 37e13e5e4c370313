use crate::domain::Domain;
use crate::guards::{CurrentCaller, GateRejection};
use crate::handlers::pages::{forwarded_org_slug, render_org_overview};
use crate::services::OrgSelector;
use crate::AppState;
use axum::{
    extract::{Path, State},
    http::HeaderMap,
    response::Response,
};

const HEADING: &str = "Organization overview";

/// Overview of the organization picked by `?org=` or the caller's default.
pub async fn overview(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    headers: HeaderMap,
) -> Result<Response, GateRejection> {
    let selector = OrgSelector::first_of([forwarded_org_slug(&headers)]);
    render_org_overview(&state, Domain::Admin, HEADING, caller.as_ref(), selector).await
}

pub async fn org_overview(
    State(state): State<AppState>,
    CurrentCaller(caller): CurrentCaller,
    Path(slug): Path<String>,
) -> Result<Response, GateRejection> {
    let selector = OrgSelector::first_of([Some(slug.as_str())]);
    render_org_overview(&state, Domain::Admin, HEADING, caller.as_ref(), selector).await
}
