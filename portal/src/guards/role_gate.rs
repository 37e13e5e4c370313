use crate::domain::Domain;
use crate::models::OrganizationContext;
use crate::services::{metrics::record_gate_decision, AuthUser, Directory, OrgContextLoader, OrgSelector};
use crate::templates::NotFoundTemplate;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use service_core::error::AppError;

/// Where callers without a sufficient role are sent, on the current domain.
pub const UNAUTHORIZED_PATH: &str = "/unauthorized";

/// Why a page refused to render. Not-found and unauthorized stay distinct.
#[derive(Debug)]
pub enum GateRejection {
    /// No verified caller, or their role is outside the domain's allow-set.
    Unauthorized,
    /// Unknown organization, or the caller has no relationship to it.
    NotFound,
    /// A collaborator failed; rendered by the default error handling.
    Backend(AppError),
}

impl From<AppError> for GateRejection {
    fn from(err: AppError) -> Self {
        GateRejection::Backend(err)
    }
}

impl IntoResponse for GateRejection {
    fn into_response(self) -> Response {
        match self {
            GateRejection::Unauthorized => Redirect::to(UNAUTHORIZED_PATH).into_response(),
            GateRejection::NotFound => (StatusCode::NOT_FOUND, NotFoundTemplate {}).into_response(),
            GateRejection::Backend(err) => err.into_response(),
        }
    }
}

/// Allow-set check for an already resolved organization context.
pub fn check_role(domain: Domain, context: &OrganizationContext) -> Result<(), GateRejection> {
    if domain.allow_set().permits(context.role) {
        Ok(())
    } else {
        Err(GateRejection::Unauthorized)
    }
}

/// Resolve the organization for `selector` and admit the caller only if
/// their role there is in `domain`'s allow-set.
pub async fn authorize(
    directory: &dyn Directory,
    domain: Domain,
    caller: Option<&AuthUser>,
    selector: &OrgSelector,
) -> Result<OrganizationContext, GateRejection> {
    let Some(caller) = caller else {
        record_gate_decision("role", domain.as_str(), "unauthenticated");
        return Err(GateRejection::Unauthorized);
    };

    let Some(context) = OrgContextLoader::new(directory).load(caller.id, selector).await? else {
        record_gate_decision("role", domain.as_str(), "not_found");
        return Err(GateRejection::NotFound);
    };

    if let Err(rejection) = check_role(domain, &context) {
        tracing::info!(
            user_id = %caller.id,
            org_id = %context.org_id,
            role = %context.role,
            domain = %domain,
            "Role not permitted on this domain"
        );
        record_gate_decision("role", domain.as_str(), "forbidden_role");
        return Err(rejection);
    }

    record_gate_decision("role", domain.as_str(), "allowed");
    Ok(context)
}
