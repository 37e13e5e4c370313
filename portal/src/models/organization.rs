use super::Role;
use serde::Serialize;
use sqlx::FromRow;
use uuid::Uuid;

/// Organization (tenant) row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Organization {
    pub id: Uuid,
    pub slug: String,
    pub name: String,
}

/// Profile row keyed by the auth provider's user id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromRow)]
pub struct Profile {
    pub id: Uuid,
    pub email: Option<String>,
    pub default_org_id: Option<Uuid>,
}

/// How the organization for a page was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContextSource {
    /// Path segment or forwarded `X-Org-Slug` header.
    Explicit,
    /// The caller's stored default organization.
    Default,
}

/// The resolved tenant for a request together with the caller's role in it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OrganizationContext {
    pub org_id: Uuid,
    pub slug: String,
    pub name: String,
    pub role: Role,
    pub source: ContextSource,
}

impl OrganizationContext {
    pub fn new(organization: Organization, role: Role, source: ContextSource) -> Self {
        Self {
            org_id: organization.id,
            slug: organization.slug,
            name: organization.name,
            role,
            source,
        }
    }
}

/// One of the caller's memberships, as listed on the app dashboard.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MembershipSummary {
    pub org_id: Uuid,
    pub slug: String,
    pub name: String,
    pub role: Role,
}
