use crate::models::{ContextSource, OrganizationContext};
use crate::services::directory::Directory;
use service_core::error::AppError;
use uuid::Uuid;

/// Which organization a page is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OrgSelector {
    /// Slug from the path or the forwarded `X-Org-Slug` header.
    Explicit(String),
    /// The caller's stored default organization.
    Default,
}

impl OrgSelector {
    /// First non-empty slug wins; otherwise fall back to the stored default.
    pub fn first_of<'a>(candidates: impl IntoIterator<Item = Option<&'a str>>) -> Self {
        candidates
            .into_iter()
            .flatten()
            .find(|slug| !slug.is_empty())
            .map(|slug| OrgSelector::Explicit(slug.to_string()))
            .unwrap_or(OrgSelector::Default)
    }
}

/// Resolves the organization for a request and the caller's role in it.
pub struct OrgContextLoader<'a> {
    directory: &'a dyn Directory,
}

impl<'a> OrgContextLoader<'a> {
    pub fn new(directory: &'a dyn Directory) -> Self {
        Self { directory }
    }

    /// `Ok(None)` when the organization does not exist or the caller has no
    /// relationship to it. Callers must render that as not-found.
    pub async fn load(
        &self,
        user_id: Uuid,
        selector: &OrgSelector,
    ) -> Result<Option<OrganizationContext>, AppError> {
        let (organization, source) = match selector {
            OrgSelector::Explicit(slug) => (
                self.directory.find_organization_by_slug(slug).await?,
                ContextSource::Explicit,
            ),
            OrgSelector::Default => {
                let default_org_id = self
                    .directory
                    .find_profile(user_id)
                    .await?
                    .and_then(|profile| profile.default_org_id);

                match default_org_id {
                    Some(org_id) => (
                        self.directory.find_organization_by_id(org_id).await?,
                        ContextSource::Default,
                    ),
                    None => (None, ContextSource::Default),
                }
            }
        };

        let Some(organization) = organization else {
            tracing::debug!(%user_id, ?selector, "Organization not found");
            return Ok(None);
        };

        let role = self
            .directory
            .find_membership_role(user_id, organization.id)
            .await?;

        Ok(role.map(|role| OrganizationContext::new(organization, role, source)))
    }
}
