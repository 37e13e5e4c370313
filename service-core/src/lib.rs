//! service-core: Shared infrastructure for the portal front-ends.
pub mod config;
pub mod error;
pub mod middleware;
pub mod observability;

