use mongodb::bson::{self, oid::ObjectId, DateTime, Document};
use std::sync::Arc;
use tracing::{error, info};
use validator::Validate;

use crate::database::manager::DatabaseError;
use crate::database::models::{Entity, EntityPatch};
use crate::database::store::{DocumentStore, FindOptions};
use crate::types::{PaginatedResponse, SortOrder};

/// Uniform CRUD and pagination over one entity collection.
///
/// Every operation logs its failure and hands the error back unchanged.
pub struct Repository<T: Entity> {
    store: Arc<dyn DocumentStore<T>>,
}

impl<T: Entity> Clone for Repository<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
        }
    }
}

impl<T: Entity> Repository<T> {
    pub fn new(store: Arc<dyn DocumentStore<T>>) -> Self {
        Self { store }
    }

    /// Normalizes and validates `record`, assigns an id and timestamps, and inserts it.
    pub async fn create(&self, mut record: T) -> Result<T, DatabaseError> {
        let result = async move {
            record.normalize();
            record.validate()?;

            let id = record.id().unwrap_or_else(ObjectId::new);
            record.assign_id(id);
            record.stamp_created(DateTime::now());

            self.store.insert(&record).await?;
            Ok::<_, DatabaseError>((id, record))
        }
        .await;

        match result {
            Ok((id, record)) => {
                info!(id = %id, "{} created successfully", T::NAME);
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, "Error creating {}", T::NAME);
                Err(e)
            }
        }
    }

    pub async fn find_by_id(&self, id: ObjectId) -> Result<T, DatabaseError> {
        let result = match self.store.find_by_id(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(DatabaseError::not_found(T::NAME)),
            Err(e) => Err(e),
        };
        result.inspect_err(|e| error!(error = %e, id = %id, "Error fetching {}", T::NAME))
    }

    /// Every record in store order. Unbounded.
    pub async fn find_all(&self) -> Result<Vec<T>, DatabaseError> {
        self.store
            .find_many(Document::new(), FindOptions::default())
            .await
            .inspect_err(|e| error!(error = %e, "Error fetching {} list", T::NAME))
    }

    /// First record matching `filter`, or `None`.
    pub async fn find_one(&self, filter: Document) -> Result<Option<T>, DatabaseError> {
        self.store
            .find_many(filter, FindOptions::default().limit(1))
            .await
            .map(|records| records.into_iter().next())
            .inspect_err(|e| error!(error = %e, "Error fetching {}", T::NAME))
    }

    /// One page of records matching `filter`, plus the total match count.
    ///
    /// `page` is 1-based; `page` and `limit` below 1 are treated as 1.
    pub async fn find_paginated(
        &self,
        filter: Document,
        page: u64,
        limit: u64,
        sort_by: &str,
        order: SortOrder,
    ) -> Result<PaginatedResponse<T>, DatabaseError> {
        let page = page.max(1);
        let limit = limit.max(1);
        let skip = (page - 1).saturating_mul(limit);

        let options = FindOptions::default().sorted(sort_by, order).skip(skip).limit(limit);
        let fetched = tokio::try_join!(
            self.store.find_many(filter.clone(), options),
            self.store.count(filter),
        );

        match fetched {
            Ok((data, total)) => Ok(PaginatedResponse::new(data, total, page, limit)),
            Err(e) => {
                error!(error = %e, "Error fetching {} list", T::NAME);
                Err(e)
            }
        }
    }

    /// Applies the fields present in `patch` with `$set` and refreshes `updatedAt`.
    pub async fn update(&self, id: ObjectId, mut patch: T::Patch) -> Result<T, DatabaseError> {
        let result = async move {
            patch.normalize();
            patch.validate()?;

            let mut changes = bson::to_document(&patch)?;
            changes.insert("updatedAt", DateTime::now());

            self.store
                .update_by_id(id, changes)
                .await?
                .ok_or_else(|| DatabaseError::not_found(T::NAME))
        }
        .await;

        match result {
            Ok(record) => {
                info!(id = %id, "{} updated successfully", T::NAME);
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, id = %id, "Error updating {}", T::NAME);
                Err(e)
            }
        }
    }

    pub async fn delete(&self, id: ObjectId) -> Result<T, DatabaseError> {
        let result = match self.store.delete_by_id(id).await {
            Ok(Some(record)) => Ok(record),
            Ok(None) => Err(DatabaseError::not_found(T::NAME)),
            Err(e) => Err(e),
        };

        match result {
            Ok(record) => {
                info!(id = %id, "{} deleted successfully", T::NAME);
                Ok(record)
            }
            Err(e) => {
                error!(error = %e, id = %id, "Error deleting {}", T::NAME);
                Err(e)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::database::memory::MemoryStore;
    use crate::database::models::{
        Organization, OrganizationPatch, ProcessingEvent, ProcessingLog, ProcessingStatus, User, Video,
    };
    use mongodb::bson::doc;

    fn repo<T: Entity>() -> Repository<T> {
        Repository::new(Arc::new(MemoryStore::<T>::new()))
    }

    fn user(org: ObjectId, role: ObjectId, n: usize) -> User {
        User {
            id: None,
            organization: org,
            role,
            name: format!("User {}", n),
            email: format!("user{}@example.com", n),
            username: format!("user{}", n),
            password: "secret1".into(),
            refresh_token: None,
            created_at: None,
            updated_at: None,
        }
    }

    #[tokio::test]
    async fn create_then_find_by_id_round_trips() {
        let orgs = repo::<Organization>();
        let created = orgs.create(Organization::new("  Acme Corp  ")).await.unwrap();
        assert!(created.id.is_some());
        assert!(created.created_at.is_some());
        assert_eq!(created.created_at, created.updated_at);
        assert_eq!(created.name, "Acme Corp");

        let found = orgs.find_by_id(created.id.unwrap()).await.unwrap();
        assert_eq!(found, created);

        let users = repo::<User>();
        let created = users.create(user(found.id.unwrap(), ObjectId::new(), 1)).await.unwrap();
        assert_eq!(users.find_by_id(created.id.unwrap()).await.unwrap(), created);

        let videos = repo::<Video>();
        let video = Video {
            id: None,
            title: "Welcome".into(),
            description: Some("First upload".into()),
            is_flagged: false,
            user: created.id.unwrap(),
            org_id: found.id.unwrap(),
            duration: 42.0,
            thumbnail: "thumbs/welcome.jpg".into(),
            storage_path: "videos/welcome.mp4".into(),
            created_at: None,
            updated_at: None,
        };
        let video = videos.create(video).await.unwrap();
        assert_eq!(videos.find_by_id(video.id.unwrap()).await.unwrap(), video);
    }

    #[tokio::test]
    async fn create_rejects_invalid_records() {
        let orgs = repo::<Organization>();
        let err = orgs.create(Organization::new("A")).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Validation(_)));
        assert!(orgs.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn create_reports_unique_conflicts() {
        let users = repo::<User>();
        let (org, role) = (ObjectId::new(), ObjectId::new());
        users.create(user(org, role, 1)).await.unwrap();

        let mut clash = user(org, role, 2);
        clash.email = "USER1@example.com".into();
        let err = users.create(clash).await.unwrap_err();
        assert!(matches!(err, DatabaseError::Duplicate { .. }));
    }

    #[tokio::test]
    async fn paginates_25_records_into_pages_of_10() {
        let users = repo::<User>();
        let (org, role) = (ObjectId::new(), ObjectId::new());
        for n in 0..25 {
            users.create(user(org, role, n)).await.unwrap();
        }

        let page = users
            .find_paginated(Document::new(), 2, 10, "username", SortOrder::Asc)
            .await
            .unwrap();
        assert_eq!(page.data.len(), 10);
        assert_eq!(page.total, 25);
        assert_eq!(page.total_pages, 3);
        assert_eq!(page.page, 2);

        let last = users
            .find_paginated(Document::new(), 3, 10, "createdAt", SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(last.data.len(), 5);
    }

    #[tokio::test]
    async fn pagination_applies_filter_to_data_and_total() {
        let users = repo::<User>();
        let (org_a, org_b, role) = (ObjectId::new(), ObjectId::new(), ObjectId::new());
        for n in 0..4 {
            users.create(user(org_a, role, n)).await.unwrap();
        }
        for n in 4..7 {
            users.create(user(org_b, role, n)).await.unwrap();
        }

        let page = users
            .find_paginated(doc! { "organization": org_b }, 1, 2, "username", SortOrder::Desc)
            .await
            .unwrap();
        assert_eq!(page.total, 3);
        assert_eq!(page.total_pages, 2);
        let names: Vec<_> = page.data.iter().map(|u| u.username.as_str()).collect();
        assert_eq!(names, ["user6", "user5"]);
    }

    #[tokio::test]
    async fn page_zero_is_treated_as_first_page() {
        let orgs = repo::<Organization>();
        orgs.create(Organization::new("Acme")).await.unwrap();
        let page = orgs.find_paginated(Document::new(), 0, 0, "name", SortOrder::Asc).await.unwrap();
        assert_eq!(page.page, 1);
        assert_eq!(page.limit, 1);
        assert_eq!(page.data.len(), 1);
    }

    #[tokio::test]
    async fn update_merges_fields_and_revalidates() {
        let logs = repo::<ProcessingLog>();
        let created = logs
            .create(ProcessingLog::new(ObjectId::new(), ProcessingEvent::IngestStarted))
            .await
            .unwrap();
        let id = created.id.unwrap();

        let patch = crate::database::models::ProcessingLogPatch {
            status: Some(ProcessingStatus::Processing),
            progress: Some(40.0),
            current_step: Some(ProcessingEvent::MediaProcessing),
            ..Default::default()
        };
        let updated = logs.update(id, patch).await.unwrap();
        assert_eq!(updated.status, ProcessingStatus::Processing);
        assert_eq!(updated.progress, 40.0);
        assert_eq!(updated.video_id, created.video_id);
        assert_eq!(updated.created_at, created.created_at);
        assert!(updated.updated_at >= created.updated_at);

        let bad = crate::database::models::ProcessingLogPatch {
            progress: Some(101.0),
            ..Default::default()
        };
        assert!(matches!(logs.update(id, bad).await.unwrap_err(), DatabaseError::Validation(_)));
        assert_eq!(logs.find_by_id(id).await.unwrap().progress, 40.0);
    }

    #[tokio::test]
    async fn missing_ids_are_not_found() {
        let orgs = repo::<Organization>();
        let id = ObjectId::new();

        let err = orgs.find_by_id(id).await.unwrap_err();
        assert_eq!(err.to_string(), "Organization not found");

        let patch = OrganizationPatch {
            name: Some("Renamed".into()),
        };
        assert!(matches!(orgs.update(id, patch).await.unwrap_err(), DatabaseError::NotFound(_)));
        assert!(matches!(orgs.delete(id).await.unwrap_err(), DatabaseError::NotFound(_)));
    }

    #[tokio::test]
    async fn delete_returns_the_removed_record() {
        let orgs = repo::<Organization>();
        let created = orgs.create(Organization::new("Acme")).await.unwrap();
        let removed = orgs.delete(created.id.unwrap()).await.unwrap();
        assert_eq!(removed, created);
        assert!(orgs.find_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn find_one_returns_first_match_or_none() {
        let orgs = repo::<Organization>();
        orgs.create(Organization::new("Acme")).await.unwrap();
        assert!(orgs.find_one(doc! { "name": "Acme" }).await.unwrap().is_some());
        assert!(orgs.find_one(doc! { "name": "Globex" }).await.unwrap().is_none());
    }
}
