use std::sync::Arc;

use crate::config::AppConfig;
use crate::database::manager::DatabaseManager;
use crate::database::repository::Repository;
use crate::database::store::DocumentStore;
use crate::database::models::User;
use crate::services::UserService;

/// Shared handler state. Cloned per request; everything inside is an `Arc`.
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub users: UserService,
}

impl AppState {
    pub fn new(config: AppConfig, users: Arc<dyn DocumentStore<User>>) -> Self {
        Self {
            config: Arc::new(config),
            users: UserService::new(Repository::new(users)),
        }
    }

    /// State backed by the MongoDB collections of `database`.
    pub fn from_database(config: AppConfig, database: &DatabaseManager) -> Self {
        Self::new(config, database.store::<User>())
    }
}
