pub mod config;
pub mod domain;
pub mod guards;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod services;
pub mod session;
pub mod startup;
pub mod templates;

use config::Settings;
use services::{AuthProvider, Directory};
use std::sync::Arc;

/// Shared application state: immutable settings plus the two collaborators.
#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    pub auth: Arc<dyn AuthProvider>,
    pub directory: Arc<dyn Directory>,
}

impl AppState {
    pub fn new(
        settings: Settings,
        auth: Arc<dyn AuthProvider>,
        directory: Arc<dyn Directory>,
    ) -> Self {
        Self {
            settings: Arc::new(settings),
            auth,
            directory,
        }
    }
}
