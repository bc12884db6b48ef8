pub mod organization;
pub mod processing_log;
pub mod role;
pub mod user;
pub mod video;

pub use organization::{Organization, OrganizationPatch};
pub use processing_log::{
    ContentModerationResult, LogEntry, ProcessingEvent, ProcessingLog, ProcessingLogPatch, ProcessingMetadata,
    ProcessingStatus, SensitivityLevel,
};
pub use role::{Role, RoleName, RolePatch};
pub use user::{User, UserPatch};
pub use video::{Video, VideoPatch};

use mongodb::bson::{oid::ObjectId, DateTime, Document};
use serde::{de::DeserializeOwned, Serialize};
use std::borrow::Cow;
use validator::{Validate, ValidationError};

use crate::types::SortOrder;

/// A persisted record kind stored in its own collection.
///
/// Implementors describe their collection, their secondary indexes and how
/// to normalize raw input before the field constraints are checked.
pub trait Entity: Serialize + DeserializeOwned + Validate + Clone + Send + Sync + Unpin + 'static {
    /// Partial update accepted by `Repository::update`.
    type Patch: EntityPatch;

    /// Human readable name used in log lines and not-found messages.
    const NAME: &'static str;

    const COLLECTION: &'static str;

    fn id(&self) -> Option<ObjectId>;

    fn assign_id(&mut self, id: ObjectId);

    /// Sets both `createdAt` and `updatedAt`.
    fn stamp_created(&mut self, now: DateTime);

    fn normalize(&mut self) {}

    fn indexes() -> Vec<IndexSpec> {
        Vec::new()
    }
}

pub trait EntityPatch: Serialize + Validate + Send + Sync {
    fn normalize(&mut self) {}
}

/// Secondary index declaration for an entity collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IndexSpec {
    pub keys: Vec<(&'static str, SortOrder)>,
    pub unique: bool,
}

impl IndexSpec {
    pub fn on(field: &'static str) -> Self {
        Self::compound(&[field])
    }

    pub fn compound(fields: &[&'static str]) -> Self {
        Self {
            keys: fields.iter().map(|f| (*f, SortOrder::Asc)).collect(),
            unique: false,
        }
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn fields(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.keys.iter().map(|(field, _)| *field)
    }

    pub fn keys_document(&self) -> Document {
        let mut keys = Document::new();
        for (field, order) in &self.keys {
            keys.insert(*field, order.as_i32());
        }
        keys
    }

    /// Driver-style index name, e.g. `user_1_orgId_1`.
    pub fn name(&self) -> String {
        self.keys
            .iter()
            .map(|(field, order)| format!("{}_{}", field, order.as_i32()))
            .collect::<Vec<_>>()
            .join("_")
    }
}

pub(crate) fn trim(value: &mut String) {
    let trimmed = value.trim();
    if trimmed.len() != value.len() {
        *value = trimmed.to_string();
    }
}

pub(crate) fn trim_opt(value: &mut Option<String>) {
    if let Some(v) = value.as_mut() {
        trim(v);
    }
}

pub(crate) fn field_error(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(Cow::Borrowed(message));
    error
}

/// Upper bound for a text field, reported with its own message. Pairs with
/// a `length(min = ..)` rule since a field carries one `length` rule only.
pub(crate) fn max_chars(value: &str, max: usize, message: &'static str) -> Result<(), ValidationError> {
    if value.chars().count() <= max {
        return Ok(());
    }
    let mut error = field_error("length", message);
    error.add_param(Cow::Borrowed("max"), &max);
    Err(error)
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn index_spec_builds_keys_and_name() {
        let spec = IndexSpec::compound(&["user", "orgId"]);
        assert_eq!(spec.keys_document(), doc! { "user": 1, "orgId": 1 });
        assert_eq!(spec.name(), "user_1_orgId_1");
        assert!(!spec.unique);
        assert!(IndexSpec::on("email").unique().unique);
    }

    #[test]
    fn max_chars_counts_characters() {
        assert!(max_chars("héllo", 5, "too long").is_ok());
        let err = max_chars("hello!", 5, "too long").unwrap_err();
        assert_eq!(err.code, "length");
        assert_eq!(err.message.as_deref(), Some("too long"));
    }

    #[test]
    fn trim_leaves_clean_strings_alone() {
        let mut s = "  padded ".to_string();
        trim(&mut s);
        assert_eq!(s, "padded");

        let mut none: Option<String> = None;
        trim_opt(&mut none);
        assert!(none.is_none());
    }
}
