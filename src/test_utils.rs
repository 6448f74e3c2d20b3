//! In-memory document store for unit and integration tests
//!
//! `MemoryStore` implements [`DocumentStore`] over plain vectors of BSON
//! documents. It understands equality filters on top-level fields and
//! `$set` updates, which is everything the maintenance tasks issue, and it
//! can be told to fail specific operations so the error paths can be
//! exercised without a live deployment. Clones share state, so a test can
//! keep one handle while a task consumes another.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use futures::StreamExt;
use mongodb::bson::{oid::ObjectId, Bson, Document};

use crate::db::{DocumentStore, DocumentStream, InsertOutcome, StoreHandle, UpdateOutcome};
use crate::errors::StoreError;

/// Operations recorded by [`MemoryStore`], in call order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    FindOne,
    UpdateMany,
    UpdateOne,
    InsertMany,
    Scan,
}

impl Operation {
    pub fn is_mutation(self) -> bool {
        matches!(
            self,
            Operation::UpdateMany | Operation::UpdateOne | Operation::InsertMany
        )
    }
}

#[derive(Default)]
struct Failures {
    update_many: bool,
    /// `_id` values whose single-document update fails
    update_one: HashSet<String>,
    /// Position in a batch at which inserts start being rejected
    insert_at: Option<usize>,
    /// Scan positions that yield a decode error instead of a document
    scan_decode: HashSet<usize>,
}

#[derive(Clone, Default)]
pub struct MemoryStore {
    collections: Arc<Mutex<HashMap<String, Vec<Document>>>>,
    operations: Arc<Mutex<Vec<Operation>>>,
    failures: Arc<Mutex<Failures>>,
    closed: Arc<AtomicBool>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `document` exactly as given, bypassing failure injection.
    pub fn seed(&self, collection: &str, document: Document) {
        self.collections
            .lock()
            .unwrap()
            .entry(collection.to_string())
            .or_default()
            .push(document);
    }

    pub fn documents(&self, collection: &str) -> Vec<Document> {
        self.collections
            .lock()
            .unwrap()
            .get(collection)
            .cloned()
            .unwrap_or_default()
    }

    pub fn count(&self, collection: &str) -> usize {
        self.documents(collection).len()
    }

    pub fn operations(&self) -> Vec<Operation> {
        self.operations.lock().unwrap().clone()
    }

    pub fn mutation_count(&self) -> usize {
        self.operations().into_iter().filter(|op| op.is_mutation()).count()
    }

    pub fn fail_update_many(&self) {
        self.failures.lock().unwrap().update_many = true;
    }

    pub fn fail_update_one_for(&self, id: impl Into<Bson>) {
        self.failures
            .lock()
            .unwrap()
            .update_one
            .insert(id.into().to_string());
    }

    /// Rejects the batch member at `index`; earlier members are kept.
    pub fn fail_insert_at(&self, index: usize) {
        self.failures.lock().unwrap().insert_at = Some(index);
    }

    pub fn fail_scan_decode_at(&self, position: usize) {
        self.failures.lock().unwrap().scan_decode.insert(position);
    }

    /// Whether any handle to this store has been closed.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn record(&self, operation: Operation) {
        self.operations.lock().unwrap().push(operation);
    }
}

fn matches_filter(document: &Document, filter: &Document) -> bool {
    filter
        .iter()
        .all(|(key, value)| document.get(key) == Some(value))
}

fn set_fields(update: &Document) -> Result<&Document, StoreError> {
    if update.len() != 1 {
        return Err(StoreError::Unsupported {
            message: "only single-operator updates are supported".to_string(),
        });
    }
    update.get_document("$set").map_err(|_| StoreError::Unsupported {
        message: format!("unsupported update document: {}", update),
    })
}

/// Applies `$set` fields and reports whether anything changed.
fn apply_set(document: &mut Document, fields: &Document) -> bool {
    let mut changed = false;
    for (key, value) in fields {
        if document.get(key) != Some(value) {
            document.insert(key.clone(), value.clone());
            changed = true;
        }
    }
    changed
}

#[async_trait]
impl DocumentStore for MemoryStore {
    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        self.record(Operation::FindOne);
        Ok(self
            .documents(collection)
            .into_iter()
            .find(|doc| matches_filter(doc, &filter)))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.record(Operation::UpdateMany);
        if self.failures.lock().unwrap().update_many {
            return Err(StoreError::operation("update_many", collection, "injected failure"));
        }
        let fields = set_fields(&update)?;

        let mut collections = self.collections.lock().unwrap();
        let mut outcome = UpdateOutcome::default();
        for doc in collections.entry(collection.to_string()).or_default().iter_mut() {
            if matches_filter(doc, &filter) {
                outcome.matched += 1;
                if apply_set(doc, fields) {
                    outcome.modified += 1;
                }
            }
        }
        Ok(outcome)
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        self.record(Operation::UpdateOne);
        if let Some(id) = filter.get("_id") {
            if self.failures.lock().unwrap().update_one.contains(&id.to_string()) {
                return Err(StoreError::operation("update_one", collection, "injected failure"));
            }
        }
        let fields = set_fields(&update)?;

        let mut collections = self.collections.lock().unwrap();
        let mut outcome = UpdateOutcome::default();
        if let Some(doc) = collections
            .entry(collection.to_string())
            .or_default()
            .iter_mut()
            .find(|doc| matches_filter(doc, &filter))
        {
            outcome.matched = 1;
            if apply_set(doc, fields) {
                outcome.modified = 1;
            }
        }
        Ok(outcome)
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<InsertOutcome, StoreError> {
        self.record(Operation::InsertMany);
        let fail_at = self.failures.lock().unwrap().insert_at;

        let mut collections = self.collections.lock().unwrap();
        let target = collections.entry(collection.to_string()).or_default();
        let mut outcome = InsertOutcome::default();
        for (index, mut doc) in documents.into_iter().enumerate() {
            if fail_at == Some(index) {
                return Err(StoreError::PartialInsert {
                    collection: collection.to_string(),
                    inserted: outcome.inserted(),
                    message: format!("injected failure at index {}", index),
                });
            }
            let id = match doc.get("_id") {
                Some(id) => id.clone(),
                None => {
                    let id = Bson::ObjectId(ObjectId::new());
                    doc.insert("_id", id.clone());
                    id
                }
            };
            outcome.inserted_ids.push(match id {
                Bson::ObjectId(oid) => oid.to_hex(),
                Bson::String(s) => s,
                other => other.to_string(),
            });
            target.push(doc);
        }
        Ok(outcome)
    }

    async fn scan<'a>(&'a self, collection: &str, filter: Document) -> Result<DocumentStream<'a>, StoreError> {
        self.record(Operation::Scan);
        let decode_failures = self.failures.lock().unwrap().scan_decode.clone();

        let items: Vec<Result<Document, StoreError>> = self
            .documents(collection)
            .into_iter()
            .filter(|doc| matches_filter(doc, &filter))
            .enumerate()
            .map(|(position, doc)| {
                if decode_failures.contains(&position) {
                    Err(StoreError::Decode {
                        message: format!("injected decode failure at position {}", position),
                    })
                } else {
                    Ok(doc)
                }
            })
            .collect();

        Ok(futures::stream::iter(items).boxed())
    }
}

#[async_trait]
impl StoreHandle for MemoryStore {
    async fn close(self) {
        self.closed.store(true, Ordering::SeqCst);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::TryStreamExt;
    use mongodb::bson::doc;

    #[tokio::test]
    async fn test_update_many_counts_matched_and_modified() {
        let store = MemoryStore::new();
        store.seed("articles", doc! { "_id": 1, "authorId": "a" });
        store.seed("articles", doc! { "_id": 2, "authorId": "b" });

        let outcome = store
            .update_many("articles", doc! {}, doc! { "$set": { "authorId": "a" } })
            .await
            .unwrap();
        assert_eq!(outcome, UpdateOutcome { matched: 2, modified: 1 });
        assert_eq!(store.operations(), vec![Operation::UpdateMany]);
    }

    #[tokio::test]
    async fn test_unsupported_update_operator() {
        let store = MemoryStore::new();
        let err = store
            .update_many("articles", doc! {}, doc! { "$inc": { "views": 1 } })
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unsupported { .. }));
    }

    #[tokio::test]
    async fn test_insert_assigns_ids_and_honours_injected_failure() {
        let store = MemoryStore::new();
        let outcome = store
            .insert_many("articles", vec![doc! { "n": 1 }, doc! { "_id": "fixed", "n": 2 }])
            .await
            .unwrap();
        assert_eq!(outcome.inserted(), 2);
        assert_eq!(outcome.inserted_ids[1], "fixed");
        assert!(store.documents("articles")[0].get_object_id("_id").is_ok());

        store.fail_insert_at(1);
        let err = store
            .insert_many("articles", vec![doc! { "n": 3 }, doc! { "n": 4 }])
            .await
            .unwrap_err();
        assert_eq!(err.confirmed_inserts(), Some(1));
        assert_eq!(store.count("articles"), 3);
    }

    #[tokio::test]
    async fn test_scan_yields_injected_decode_errors_in_place() {
        let store = MemoryStore::new();
        for n in 0..3 {
            store.seed("articles", doc! { "n": n });
        }
        store.fail_scan_decode_at(1);

        let items: Vec<_> = store
            .scan("articles", doc! {})
            .await
            .unwrap()
            .collect()
            .await;
        assert_eq!(items.len(), 3);
        assert!(items[0].is_ok());
        assert!(matches!(items[1], Err(StoreError::Decode { .. })));

        store.fail_scan_decode_at(0);
        let result: Result<Vec<Document>, StoreError> =
            store.scan("articles", doc! {}).await.unwrap().try_collect().await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_clones_share_documents_and_close_state() {
        let store = MemoryStore::new();
        let handle = store.clone();
        handle.seed("articles", doc! { "n": 1 });
        assert_eq!(store.count("articles"), 1);

        assert!(!store.is_closed());
        handle.close().await;
        assert!(store.is_closed());
    }
}
