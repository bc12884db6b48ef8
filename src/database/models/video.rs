use mongodb::bson::{oid::ObjectId, DateTime};
use serde::{Deserialize, Serialize};
use validator::{Validate, ValidationError};

use super::{max_chars, trim, trim_opt, Entity, EntityPatch, IndexSpec};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct Video {
    #[serde(rename = "_id", default, skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    #[validate(length(min = 3, message = "Title must be at least 3 characters"), custom(function = "title_max"))]
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[serde(default)]
    pub is_flagged: bool,
    pub user: ObjectId,
    pub org_id: ObjectId,
    #[validate(range(min = 0.0, message = "Duration must be positive"))]
    pub duration: f64,
    #[validate(length(min = 1, message = "Thumbnail path is required"))]
    pub thumbnail: String,
    #[validate(length(min = 1, message = "Storage path is required"))]
    pub storage_path: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<DateTime>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<DateTime>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct VideoPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 3, message = "Title must be at least 3 characters"), custom(function = "title_max"))]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(max = 2000, message = "Description cannot exceed 2000 characters"))]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_flagged: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub org_id: Option<ObjectId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(range(min = 0.0, message = "Duration must be positive"))]
    pub duration: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Thumbnail path is required"))]
    pub thumbnail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, message = "Storage path is required"))]
    pub storage_path: Option<String>,
}

fn title_max(title: &str) -> Result<(), ValidationError> {
    max_chars(title, 200, "Title cannot exceed 200 characters")
}

impl Entity for Video {
    type Patch = VideoPatch;

    const NAME: &'static str = "Video";
    const COLLECTION: &'static str = "videos";

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
        trim(&mut self.title);
        trim_opt(&mut self.description);
    }

    fn indexes() -> Vec<IndexSpec> {
        vec![IndexSpec::compound(&["user", "orgId"]), IndexSpec::on("isFlagged")]
    }
}

impl EntityPatch for VideoPatch {
    fn normalize(&mut self) {
        trim_opt(&mut self.title);
        trim_opt(&mut self.description);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn video() -> Video {
        Video {
            id: None,
            title: "Launch day".into(),
            description: None,
            is_flagged: false,
            user: ObjectId::new(),
            org_id: ObjectId::new(),
            duration: 12.5,
            thumbnail: "thumbs/1.jpg".into(),
            storage_path: "videos/1.mp4".into(),
            created_at: None,
            updated_at: None,
        }
    }

    #[test]
    fn constraints() {
        assert!(video().validate().is_ok());

        let mut v = video();
        v.duration = -1.0;
        v.thumbnail = String::new();
        v.title = "ab".into();
        let errors = v.validate().unwrap_err();
        let fields = errors.field_errors();
        assert!(fields.contains_key("duration"));
        assert!(fields.contains_key("thumbnail"));
        assert!(fields.contains_key("title"));
    }

    #[test]
    fn title_bounds_have_separate_messages() {
        let mut v = video();
        v.title = "ab".into();
        let errors = v.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["title"][0].message.as_deref(),
            Some("Title must be at least 3 characters")
        );

        v.title = "t".repeat(201);
        let errors = v.validate().unwrap_err();
        assert_eq!(
            errors.field_errors()["title"][0].message.as_deref(),
            Some("Title cannot exceed 200 characters")
        );

        let patch = VideoPatch {
            title: Some("t".repeat(201)),
            ..Default::default()
        };
        assert!(patch.validate().unwrap_err().field_errors().contains_key("title"));
    }

    #[test]
    fn is_flagged_defaults_to_false() {
        let doc = mongodb::bson::doc! {
            "title": "Clip",
            "user": ObjectId::new(),
            "orgId": ObjectId::new(),
            "duration": 3.0,
            "thumbnail": "t.jpg",
            "storagePath": "v.mp4"
        };
        let v: Video = mongodb::bson::from_document(doc).unwrap();
        assert!(!v.is_flagged);
    }
}
