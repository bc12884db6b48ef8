use mongodb::bson::{oid::ObjectId, DateTime};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{max_chars, trim, trim_opt, Entity, EntityPatch, IndexSpec};

pub static EMAIL_PATTERN: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\S+@\S+\.\S+$").expect("valid email pattern"));

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub organization: ObjectId,
    pub role: ObjectId,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"), custom(function = "name_max"))]
    pub name: String,
    #[validate(regex(path = *EMAIL_PATTERN, message = "Please provide a valid email"))]
    pub email: String,
    #[validate(length(min = 3, message = "Username must be at least 3 characters"), custom(function = "username_max"))]
    pub username: String,
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UserPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organization: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"), custom(function = "name_max"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(regex(path = *EMAIL_PATTERN, message = "Please provide a valid email"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, message = "Username must be at least 3 characters"), custom(function = "username_max"))]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Stored form of an email address: trimmed and lowercased.
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn name_max(name: &str) -> Result<(), ValidationError> {
    max_chars(name, 50, "Name cannot exceed 50 characters")
}

fn username_max(username: &str) -> Result<(), ValidationError> {
    max_chars(username, 30, "Username cannot exceed 30 characters")
}

impl Entity for User {
    type Patch = UserPatch;

    const NAME: &'static str = "User";
    const COLLECTION: &'static str = "users";

    fn id(&self) -> Option<ObjectId> {
        self.id
    }

    fn assign_id(&mut self, id: ObjectId) {
        self.id = Some(id);
    }

    fn stamp_created(&mut self, now: DateTime) {
        self.created_at = Some(now);
        self.updated_at = Some(now);
    }

    fn normalize(&mut self) {
        trim(&mut self.name);
        trim(&mut self.username);
        self.email = normalize_email(&self.email);
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::on("email").unique(), IndexSpec::on("username").unique()]
    }
}

impl EntityPatch for UserPatch {
    fn normalize(&mut self) {
        trim_opt(&mut self.name);
        trim_opt(&mut self.username);
        if let Some(email) = self.email.as_mut() {
            *email = normalize_email(email);
        }
    }
}
