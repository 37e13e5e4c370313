//! Collaborators behind the pages: the auth provider, the directory, and the
//! organization context built from them.

pub mod auth_client;
pub mod directory;
pub mod metrics;
pub mod org_context;

pub use auth_client::{AuthClient, AuthProvider, AuthUser, MockAuthProvider};
pub use directory::{Directory, InMemoryDirectory, PgDirectory};
pub use org_context::{OrgContextLoader, OrgSelector};
