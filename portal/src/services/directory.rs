//! Read access to organizations, profiles and memberships.

use crate::models::{MembershipSummary, Organization, Profile, Role};
use async_trait::async_trait;
use service_core::error::AppError;
use sqlx::postgres::PgPool;
use std::collections::HashMap;
use std::sync::RwLock;
use uuid::Uuid;

/// The relational store behind the role gate. Every method is a single read.
#[async_trait]
pub trait Directory: Send + Sync {
    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError>;

    async fn find_organization_by_id(&self, org_id: Uuid) -> Result<Option<Organization>, AppError>;

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError>;

    /// The caller's role in `org_id`, if they are a member.
    async fn find_membership_role(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Role>, AppError>;

    async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<MembershipSummary>, AppError>;

    async fn health_check(&self) -> Result<(), AppError>;
}

fn parse_role(user_id: Uuid, org_id: Uuid, label: &str) -> Option<Role> {
    match label.parse::<Role>() {
        Ok(role) => Some(role),
        Err(e) => {
            tracing::warn!(%user_id, %org_id, error = %e, "Ignoring membership with unknown role");
            None
        }
    }
}

/// PostgreSQL-backed directory.
#[derive(Clone)]
pub struct PgDirectory {
    pool: PgPool,
}

impl PgDirectory {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[derive(sqlx::FromRow)]
struct MembershipRow {
    org_id: Uuid,
    slug: String,
    name: String,
    role: String,
}

#[async_trait]
impl Directory for PgDirectory {
    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<_, Organization>("SELECT id, slug, name FROM organizations WHERE slug = $1")
            .bind(slug)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn find_organization_by_id(&self, org_id: Uuid) -> Result<Option<Organization>, AppError> {
        sqlx::query_as::<_, Organization>("SELECT id, slug, name FROM organizations WHERE id = $1")
            .bind(org_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        sqlx::query_as::<_, Profile>("SELECT id, email, default_org_id FROM profiles WHERE id = $1")
            .bind(user_id)
            .fetch_optional(&self.pool)
            .await
            .map_err(AppError::from)
    }

    async fn find_membership_role(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Role>, AppError> {
        let label: Option<String> =
            sqlx::query_scalar("SELECT role FROM memberships WHERE user_id = $1 AND org_id = $2")
                .bind(user_id)
                .bind(org_id)
                .fetch_optional(&self.pool)
                .await?;

        Ok(label.and_then(|label| parse_role(user_id, org_id, &label)))
    }

    async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<MembershipSummary>, AppError> {
        let rows = sqlx::query_as::<_, MembershipRow>(
            r#"
            SELECT o.id AS org_id, o.slug, o.name, m.role
            FROM memberships m
            JOIN organizations o ON o.id = m.org_id
            WHERE m.user_id = $1
            ORDER BY o.name
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let role = parse_role(user_id, row.org_id, &row.role)?;
                Some(MembershipSummary {
                    org_id: row.org_id,
                    slug: row.slug,
                    name: row.name,
                    role,
                })
            })
            .collect())
    }

    async fn health_check(&self) -> Result<(), AppError> {
        sqlx::query("SELECT 1").execute(&self.pool).await.map_err(|e| {
            tracing::error!("Database health check failed: {}", e);
            AppError::DatabaseError(anyhow::anyhow!("Database health check failed: {}", e))
        })?;
        Ok(())
    }
}

#[derive(Default)]
struct DirectoryData {
    organizations: HashMap<Uuid, Organization>,
    profiles: HashMap<Uuid, Profile>,
    memberships: HashMap<(Uuid, Uuid), String>,
}

/// Directory kept in memory, for tests and local demos.
#[derive(Default)]
pub struct InMemoryDirectory {
    data: RwLock<DirectoryData>,
}

fn poisoned() -> AppError {
    AppError::InternalError(anyhow::anyhow!("in-memory directory lock poisoned"))
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_organization(&self, organization: Organization) -> Result<(), AppError> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        data.organizations.insert(organization.id, organization);
        Ok(())
    }

    pub fn insert_profile(&self, profile: Profile) -> Result<(), AppError> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        data.profiles.insert(profile.id, profile);
        Ok(())
    }

    /// Store a membership with a raw role label, as the table would.
    pub fn insert_membership(&self, user_id: Uuid, org_id: Uuid, role: &str) -> Result<(), AppError> {
        let mut data = self.data.write().map_err(|_| poisoned())?;
        data.memberships.insert((user_id, org_id), role.to_string());
        Ok(())
    }
}

#[async_trait]
impl Directory for InMemoryDirectory {
    async fn find_organization_by_slug(&self, slug: &str) -> Result<Option<Organization>, AppError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.organizations.values().find(|org| org.slug == slug).cloned())
    }

    async fn find_organization_by_id(&self, org_id: Uuid) -> Result<Option<Organization>, AppError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.organizations.get(&org_id).cloned())
    }

    async fn find_profile(&self, user_id: Uuid) -> Result<Option<Profile>, AppError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data.profiles.get(&user_id).cloned())
    }

    async fn find_membership_role(&self, user_id: Uuid, org_id: Uuid) -> Result<Option<Role>, AppError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        Ok(data
            .memberships
            .get(&(user_id, org_id))
            .and_then(|label| parse_role(user_id, org_id, label)))
    }

    async fn list_memberships(&self, user_id: Uuid) -> Result<Vec<MembershipSummary>, AppError> {
        let data = self.data.read().map_err(|_| poisoned())?;
        let mut memberships: Vec<MembershipSummary> = data
            .memberships
            .iter()
            .filter(|((member, _), _)| *member == user_id)
            .filter_map(|((_, org_id), label)| {
                let org = data.organizations.get(org_id)?;
                let role = parse_role(user_id, *org_id, label)?;
                Some(MembershipSummary {
                    org_id: org.id,
                    slug: org.slug.clone(),
                    name: org.name.clone(),
                    role,
                })
            })
            .collect();
        memberships.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(memberships)
    }

    async fn health_check(&self) -> Result<(), AppError> {
        self.data.read().map(|_| ()).map_err(|_| poisoned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn unknown_role_labels_are_not_memberships() {
        let directory = InMemoryDirectory::new();
        let user_id = Uuid::new_v4();
        let org = Organization {
            id: Uuid::new_v4(),
            slug: "acme".to_string(),
            name: "Acme".to_string(),
        };
        directory.insert_organization(org.clone()).unwrap();
        directory.insert_membership(user_id, org.id, "superuser").unwrap();

        assert_eq!(directory.find_membership_role(user_id, org.id).await.unwrap(), None);
        assert!(directory.list_memberships(user_id).await.unwrap().is_empty());
    }

    #[test]
    fn seeding_a_poisoned_directory_fails() {
        let directory = std::sync::Arc::new(InMemoryDirectory::new());
        let poisoner = directory.clone();
        let _ = std::thread::spawn(move || {
            let _guard = poisoner.data.write().unwrap();
            panic!("poison the lock");
        })
        .join();

        let result = directory.insert_membership(Uuid::new_v4(), Uuid::new_v4(), "owner");
        assert!(matches!(result, Err(AppError::InternalError(_))));
    }

    #[tokio::test]
    async fn memberships_are_listed_by_name() {
        let directory = InMemoryDirectory::new();
        let user_id = Uuid::new_v4();
        for (slug, name, role) in [("zeta", "Zeta", "member"), ("acme", "Acme", "owner")] {
            let org = Organization {
                id: Uuid::new_v4(),
                slug: slug.to_string(),
                name: name.to_string(),
            };
            directory.insert_membership(user_id, org.id, role).unwrap();
            directory.insert_organization(org).unwrap();
        }

        let names: Vec<_> = directory
            .list_memberships(user_id)
            .await
            .unwrap()
            .into_iter()
            .map(|m| (m.name, m.role))
            .collect();
        assert_eq!(
            names,
            vec![("Acme".to_string(), Role::Owner), ("Zeta".to_string(), Role::Member)]
        );
    }
}
