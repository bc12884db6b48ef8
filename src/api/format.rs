use chrono::SecondsFormat;
use mongodb::bson::DateTime;
use serde::Serialize;

use crate::database::models::User;

/// Public wire form of a `User`: hex ids, ISO-8601 timestamps, and no
/// credential fields (`password`, `refreshToken`).
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: Option<String>,
    pub organization: String,
    pub role: String,
    pub name: String,
    pub email: String,
    pub username: String,
    pub created_at: Option<String>,
    pub updated_at: Option<String>,
}

impl From<User> for UserView {
    fn from(user: User) -> Self {
        Self {
            id: user.id.map(|id| id.to_hex()),
            organization: user.organization.to_hex(),
            role: user.role.to_hex(),
            name: user.name,
            email: user.email,
            username: user.username,
            created_at: user.created_at.map(iso_timestamp),
            updated_at: user.updated_at.map(iso_timestamp),
        }
    }
}

/// `2024-05-01T12:00:00.000Z`
pub fn iso_timestamp(value: DateTime) -> String {
    value.to_chrono().to_rfc3339_opts(SecondsFormat::Millis, true)
}
