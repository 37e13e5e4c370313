//! Askama page templates (files under `portal/templates/`).

use crate::domain::Domain;
use crate::models::{MembershipSummary, OrganizationContext};
use askama::Template;

#[derive(Template)]
#[template(path = "index.html")]
pub struct IndexTemplate {
    pub app_url: String,
}

#[derive(Template)]
#[template(path = "login.html")]
pub struct LoginTemplate {
    pub next: String,
    pub email: String,
    pub error: Option<String>,
}

#[derive(Template)]
#[template(path = "dashboard.html")]
pub struct DashboardTemplate {
    pub email: String,
    pub memberships: Vec<MembershipSummary>,
    pub admin_url: String,
}

/// Organization page shared by the app, admin and ops front-ends.
#[derive(Template)]
#[template(path = "org_overview.html")]
pub struct OrgOverviewTemplate {
    pub domain: Domain,
    pub heading: &'static str,
    pub email: String,
    pub org: OrganizationContext,
}

#[derive(Template)]
#[template(path = "unauthorized.html")]
pub struct UnauthorizedTemplate {
    pub domain: Domain,
    pub app_url: String,
}

#[derive(Template)]
#[template(path = "not_found.html")]
pub struct NotFoundTemplate {}
