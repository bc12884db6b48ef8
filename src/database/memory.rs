use async_trait::async_trait;
use mongodb::bson::{self, oid::ObjectId, Bson, Document};
use std::cmp::Ordering;
use std::marker::PhantomData;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::database::manager::DatabaseError;
use crate::database::models::{Entity, IndexSpec};
use crate::database::store::{DocumentStore, FindOptions};
use crate::types::SortOrder;

/// In-process `DocumentStore` used by tests and local tooling.
///
/// Records are kept as BSON documents in insertion order, which is the
/// natural order returned by unsorted finds. Unique indexes declared by the
/// entity are enforced.
pub struct MemoryStore<T: Entity> {
    documents: Arc<RwLock<Vec<Document>>>,
    unique_indexes: Vec<IndexSpec>,
    _phantom: PhantomData<T>,
}

impl<T: Entity> Default for MemoryStore<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Entity> MemoryStore<T> {
    pub fn new() -> Self {
        Self {
            documents: Arc::new(RwLock::new(Vec::new())),
            unique_indexes: T::indexes().into_iter().filter(|spec| spec.unique).collect(),
            _phantom: PhantomData,
        }
    }

    fn check_unique(&self, documents: &[Document], candidate: &Document) -> Result<(), DatabaseError> {
        let candidate_id = candidate.get("_id");
        for spec in &self.unique_indexes {
            let key: Vec<Option<&Bson>> = spec.fields().map(|f| lookup(candidate, f)).collect();
            let clash = documents
                .iter()
                .filter(|existing| existing.get("_id") != candidate_id)
                .any(|existing| spec.fields().map(|f| lookup(existing, f)).eq(key.iter().copied()));
            if clash {
                return Err(DatabaseError::Duplicate {
                    collection: T::COLLECTION.to_string(),
                    detail: format!("index {} already holds {:?}", spec.name(), key),
                });
            }
        }
        Ok(())
    }
}

fn decode<T: Entity>(document: &Document) -> Result<T, DatabaseError> {
    Ok(bson::from_document(document.clone())?)
}

fn position_of(documents: &[Document], id: ObjectId) -> Option<usize> {
    documents
        .iter()
        .position(|d| matches!(d.get("_id"), Some(Bson::ObjectId(existing)) if *existing == id))
}

/// Resolves a possibly dotted path (`contentModeration.isNSFW`).
fn lookup<'a>(document: &'a Document, path: &str) -> Option<&'a Bson> {
    let mut parts = path.split('.');
    let mut current = document.get(parts.next()?)?;
    for part in parts {
        current = match current {
            Bson::Document(inner) => inner.get(part)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Only plain equality filters are understood.
fn check_filter(filter: &Document) -> Result<(), DatabaseError> {
    for (path, expected) in filter {
        if path.starts_with('$') {
            return Err(DatabaseError::QueryError(format!("unsupported filter operator {}", path)));
        }
        if let Bson::Document(inner) = expected {
            if inner.keys().any(|k| k.starts_with('$')) {
                return Err(DatabaseError::QueryError(format!("unsupported filter on {}", path)));
            }
        }
    }
    Ok(())
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter.iter().all(|(path, expected)| {
        let actual = lookup(document, path).unwrap_or(&Bson::Null);
        values_equal(actual, expected)
    })
}

fn values_equal(a: &Bson, b: &Bson) -> bool {
    match (as_number(a), as_number(b)) {
        (Some(x), Some(y)) => x == y,
        _ => a == b,
    }
}

fn as_number(value: &Bson) -> Option<f64> {
    match value {
        Bson::Int32(v) => Some(f64::from(*v)),
        Bson::Int64(v) => Some(*v as f64),
        Bson::Double(v) => Some(*v),
        _ => None,
    }
}

/// Cross-type ordering in the spirit of the server's BSON comparison order:
/// missing/null < numbers < strings < documents < ids < booleans < dates.
fn type_rank(value: Option<&Bson>) -> u8 {
    match value {
        None | Some(Bson::Null) => 0,
        Some(Bson::Int32(_)) | Some(Bson::Int64(_)) | Some(Bson::Double(_)) => 1,
        Some(Bson::String(_)) => 2,
        Some(Bson::Document(_)) => 3,
        Some(Bson::Array(_)) => 4,
        Some(Bson::ObjectId(_)) => 5,
        Some(Bson::Boolean(_)) => 6,
        Some(Bson::DateTime(_)) => 7,
        Some(_) => 8,
    }
}

fn compare(a: Option<&Bson>, b: Option<&Bson>) -> Ordering {
    let rank = type_rank(a).cmp(&type_rank(b));
    if rank != Ordering::Equal {
        return rank;
    }
    match (a, b) {
        (Some(x), Some(y)) => match (as_number(x), as_number(y)) {
            (Some(l), Some(r)) => l.partial_cmp(&r).unwrap_or(Ordering::Equal),
            _ => match (x, y) {
                (Bson::String(l), Bson::String(r)) => l.cmp(r),
                (Bson::ObjectId(l), Bson::ObjectId(r)) => l.bytes().cmp(&r.bytes()),
                (Bson::Boolean(l), Bson::Boolean(r)) => l.cmp(r),
                (Bson::DateTime(l), Bson::DateTime(r)) => l.cmp(r),
                _ => Ordering::Equal,
            },
        },
        _ => Ordering::Equal,
    }
}

#[async_trait]
impl<T: Entity> DocumentStore<T> for MemoryStore<T> {
    async fn insert(&self, record: &T) -> Result<(), DatabaseError> {
        let document = bson::to_document(record)?;
        let id = match document.get("_id") {
            Some(Bson::ObjectId(id)) => *id,
            _ => return Err(DatabaseError::QueryError("document is missing an _id".to_string())),
        };

        let mut documents = self.documents.write().await;
        if position_of(&documents, id).is_some() {
            return Err(DatabaseError::Duplicate {
                collection: T::COLLECTION.to_string(),
                detail: format!("_id {} already exists", id),
            });
        }
        self.check_unique(&documents, &document)?;
        documents.push(document);
        Ok(())
    }

    async fn find_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError> {
        let documents = self.documents.read().await;
        position_of(&documents, id).map(|i| decode(&documents[i])).transpose()
    }

    async fn find_many(&self, filter: Document, options: FindOptions) -> Result<Vec<T>, DatabaseError> {
        check_filter(&filter)?;
        let documents = self.documents.read().await;
        let mut selected: Vec<&Document> = documents.iter().filter(|d| matches_filter(d, &filter)).collect();

        if let Some((field, order)) = &options.sort {
            selected.sort_by(|a, b| {
                let ordering = compare(lookup(a, field), lookup(b, field));
                match order {
                    SortOrder::Asc => ordering,
                    SortOrder::Desc => ordering.reverse(),
                }
            });
        }

        let skip = usize::try_from(options.skip).unwrap_or(usize::MAX);
        let limit = match options.limit {
            Some(0) | None => usize::MAX,
            Some(n) => usize::try_from(n).unwrap_or(usize::MAX),
        };

        selected.into_iter().skip(skip).take(limit).map(decode).collect()
    }

    async fn update_by_id(&self, id: ObjectId, changes: Document) -> Result<Option<T>, DatabaseError> {
        let mut documents = self.documents.write().await;
        let Some(index) = position_of(&documents, id) else {
            return Ok(None);
        };

        let mut updated = documents[index].clone();
        for (path, value) in changes {
            set_path(&mut updated, &path, value)?;
        }
        // Reject documents that no longer decode before they are stored.
        let record: T = decode(&updated)?;
        self.check_unique(&documents, &updated)?;
        documents[index] = updated;
        Ok(Some(record))
    }

    async fn delete_by_id(&self, id: ObjectId) -> Result<Option<T>, DatabaseError> {
        let mut documents = self.documents.write().await;
        match position_of(&documents, id) {
            Some(index) => decode(&documents.remove(index)).map(Some),
            None => Ok(None),
        }
    }

    async fn count(&self, filter: Document) -> Result<u64, DatabaseError> {
        check_filter(&filter)?;
        let documents = self.documents.read().await;
        Ok(documents.iter().filter(|d| matches_filter(d, &filter)).count() as u64)
    }
}

fn set_path(document: &mut Document, path: &str, value: Bson) -> Result<(), DatabaseError> {
    match path.split_once('.') {
        None => {
            document.insert(path, value);
            Ok(())
        }
        Some((head, tail)) => {
            let entry = document
                .entry(head.to_string())
                .or_insert_with(|| Bson::Document(Document::new()));
            match entry {
                Bson::Document(inner) => set_path(inner, tail, value),
                _ => Err(DatabaseError::QueryError(format!("cannot set {} on a non-document field", path))),
            }
        }
    }
}
