use mongodb::bson::doc;

use crate::database::manager::DatabaseError;
use crate::database::models::user::normalize_email;
use crate::database::models::User;
use crate::database::repository::Repository;

/// User lookups on top of the generic repository.
#[derive(Clone)]
pub struct UserService {
    repository: Repository<User>,
}

impl UserService {
    pub fn new(repository: Repository<User>) -> Self {
        Self { repository }
    }

    pub fn repository(&self) -> &Repository<User> {
        &self.repository
    }

    /// First user whose stored email equals `email` after normalization.
    /// No match is `Ok(None)`, not an error.
    pub async fn find_by_email(&self, email: &str) -> Result<Option<User>, DatabaseError> {
        self.repository
            .find_one(doc! { "email": normalize_email(email) })
            .await
    }
}
