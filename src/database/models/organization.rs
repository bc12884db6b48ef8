use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{max_chars, trim, trim_opt, Entity, EntityPatch, IndexSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[validate(length(min = 2, message = "Name must be at least 2 characters"), custom(function = "name_max"))]
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

impl Organization {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: None,
            name: name.into(),
            created_at: None,
            updated_at: None,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct OrganizationPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 2, message = "Name must be at least 2 characters"), custom(function = "name_max"))]
    pub name: Option<String>,
}

fn name_max(name: &str) -> Result<(), ValidationError> {
    max_chars(name, 100, "Name cannot exceed 100 characters")
}

impl Entity for Organization {
    type Patch = OrganizationPatch;

    const NAME: &'static str = "Organization";
    const COLLECTION: &'static str = "organizations";

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
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::on("name").unique()]
    }
}

impl EntityPatch for OrganizationPatch {
    fn normalize(&mut self) {
        trim_opt(&mut self.name);
    }
}
