use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::{doc, oid::ObjectId, Document};
use mongodb::options::{IndexOptions, ReturnDocument};
use mongodb::{Collection, Database, IndexModel};

use crate::database::manager::DatabaseError;
use crate::database::models::{Entity, IndexSpec};
use crate::database::store::{DocumentStore, FindOptions};

/// `DocumentStore` backed by a MongoDB collection.
pub struct MongoStore<T: Entity> {
    collection: Collection<T>,
}

impl<T: Entity> MongoStore<T> {
    pub fn new(database: &Database) -> Self {
        Self {
            collection: database.collection::<T>(T::COLLECTION),
        }
    }

    pub fn index_model(spec: &IndexSpec) -> IndexModel {
        let options = IndexOptions::builder()
            .name(spec.name())
            .unique(spec.unique.then_some(true))
            .build();
        IndexModel::builder().keys(spec.keys_document()).options(options).build()
    }

    fn driver_error(err: mongodb::error::Error) -> DatabaseError {
        DatabaseError::from_driver(T::COLLECTION, err)
    }
}

#[async_trait]
impl<T: Entity> DocumentStore<T> for MongoStore<T> {
    async fn insert(&self, record: &T) -> Result<(), DatabaseError> {
        self.collection.insert_one(record).await.map_err(Self::driver_error)?;
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError> {
        self.collection
            .find_one(doc! { "_id": id })
            .await
            .map_err(Self::driver_error)
    }

    async fn find_many(&self, filter: Document, options: FindOptions) -> Result<Vec<T>, DatabaseError> {
        let mut find = self.collection.find(filter).skip(options.skip);
        if let Some((field, order)) = &options.sort {
            let mut sort = Document::new();
            sort.insert(field.as_str(), order.as_i32());
            find = find.sort(sort);
        }
        if let Some(limit) = options.limit {
            let limit = i64::try_from(limit).map_err(|_| DatabaseError::QueryError(format!("limit {} is too large", limit)))?;
            find = find.limit(limit);
        }

        let cursor = find.await.map_err(Self::driver_error)?;
        cursor.try_collect().await.map_err(Self::driver_error)
    }

    async fn update_by_id(&self, id: ObjectId, changes: Document) -> Result<Option<T>, DatabaseError> {
        self.collection
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": changes })
            .return_document(ReturnDocument::After)
            .await
            .map_err(Self::driver_error)
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError> {
        self.collection
            .find_one_and_delete(doc! { "_id": id })
            .await
            .map_err(Self::driver_error)
    }

    async fn count(&self, filter: Document) -> Result<u64, DatabaseError> {
        self.collection.count_documents(filter).await.map_err(Self::driver_error)
    }
}
