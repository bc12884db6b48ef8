use async_trait::async_trait;
use mongodb::bson::{oid::ObjectId, Document};

use crate::database::manager::DatabaseError;
use crate::database::models::Entity;
use crate::types::SortOrder;

/// Sort, skip and limit applied to a `find_many` call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FindOptions {
    pub sort: Option<(String, SortOrder)>,
    pub skip: u64,
    pub limit: Option<u64>,
}

impl FindOptions {
    pub fn sorted(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.sort = Some((field.into(), order));
        self
    }

    pub fn skip(mut self, skip: u64) -> Self {
        self.skip = skip;
        self
    }

    pub fn limit(mut self, limit: u64) -> Self {
        self.limit = Some(limit);
        self
    }
}

/// The storage capabilities the repository layer is built on, for a single
/// entity collection.
///
/// Filters are equality documents (`{ "email": "a@b.com" }`); dotted paths
/// address embedded fields. `update_by_id` applies `changes` as a `$set`.
#[async_trait]
pub trait DocumentStore<T: Entity>: Send + Sync {
    async fn insert(&self, record: &T) -> Result<(), DatabaseError>;

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError>;

    async fn find_many(&self, filter: Document, options: FindOptions) -> Result<Vec<T>, DatabaseError>;

    async fn update_by_id(&self, id: ObjectId, changes: Document) -> Result<Option<T>, DatabaseError>;

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError>;

    async fn count(&self, filter: Document) -> Result<u64, DatabaseError>;
}
