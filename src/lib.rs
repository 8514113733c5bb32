//! Biblioteca
//!
//! A small library catalog server: books can be listed, searched, created,
//! updated and soft-deleted, and lent out and returned through a REST JSON API.

use std::sync::Arc;

pub mod api;
pub mod config;
pub mod error;
pub mod models;
pub mod repository;
pub mod services;

pub use config::AppConfig;
pub use error::{AppError, AppResult};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub services: Arc<services::Services>,
}

impl AppState {
    /// Wire services on top of a repository
    pub fn new(config: AppConfig, repository: repository::Repository) -> Self {
        let services = services::Services::new(repository, config.lending.clone());
        Self {
            config: Arc::new(config),
            services: Arc::new(services),
        }
    }
}
