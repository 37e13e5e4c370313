mod organization;
mod role;

pub use organization::{ContextSource, MembershipSummary, Organization, OrganizationContext, Profile};
pub use role::{Role, UnknownRole};
