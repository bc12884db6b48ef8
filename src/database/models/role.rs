use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use super::{Entity, EntityPatch, IndexSpec};

/// The fixed set of role names a `Role` document may carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoleName {
    Admin,
    User,
    Moderator,
    Viewer,
}

impl RoleName {
    pub const ALL: [RoleName; 4] = [RoleName::Admin, RoleName::User, RoleName::Moderator, RoleName::Viewer];

    pub fn as_str(&self) -> &'static str {
        match self {
            RoleName::Admin => "admin",
            RoleName::User => "user",
            RoleName::Moderator => "moderator",
            RoleName::Viewer => "viewer",
        }
    }
}

impl fmt::Display for RoleName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RoleName {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        RoleName::ALL
            .into_iter()
            .find(|r| r.as_str() == s.trim())
            .ok_or_else(|| format!("{} is not a valid role", s))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Role {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub name: RoleName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Role {
    pub fn new(name: RoleName) -> Self {
        Self {
            id: None,
            name,
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct RolePatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<RoleName>,
}

impl Entity for Role {
    type Patch = RolePatch;

    const NAME: &'static str = "Role";
    const COLLECTION: &'static str = "roles";

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

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::on("name").unique()]
    }
}

impl EntityPatch for RolePatch {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_role_names_only() {
        assert_eq!("admin".parse::<RoleName>(), Ok(RoleName::Admin));
        assert_eq!(" viewer ".parse::<RoleName>(), Ok(RoleName::Viewer));
        assert_eq!("root".parse::<RoleName>().unwrap_err(), "root is not a valid role");
    }

    #[test]
    fn rejects_unknown_role_on_deserialize() {
        let ok: Role = serde_json::from_value(serde_json::json!({ "name": "moderator" })).unwrap();
        assert_eq!(ok.name, RoleName::Moderator);

        let bad = serde_json::from_value::<Role>(serde_json::json!({ "name": "superuser" }));
        assert!(bad.is_err());
    }
}
