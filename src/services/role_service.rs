use mongodb::bson::doc;
use tracing::info;

use crate::database::manager::DatabaseError;
use crate::database::models::{Role, RoleName};
use crate::database::repository::Repository;

#[derive(Clone)]
pub struct RoleService {
    repository: Repository<Role>,
}

impl RoleService {
    pub fn new(repository: Repository<Role>) -> Self {
        Self { repository }
    }

    /// Inserts every `RoleName` that has no document yet. Returns the names
    /// created by this call; running it twice creates nothing the second time.
    pub async fn seed_defaults(&self) -> Result<Vec<RoleName>, DatabaseError> {
        let mut created = Vec::new();
        for name in RoleName::ALL {
            if self.repository.find_one(doc! { "name": name.as_str() }).await?.is_some() {
                continue;
            }
            self.repository.create(Role::new(name)).await?;
            created.push(name);
        }
        info!(created = created.len(), "Default roles seeded");
        Ok(created)
    }

    pub async fn list(&self) -> Result<Vec<Role>, DatabaseError> {
        self.repository.find_all().await
    }
}
