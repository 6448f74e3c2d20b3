use async_trait::async_trait;
use futures::stream::BoxStream;
use mongodb::bson::Document;

use crate::errors::StoreError;

pub mod mongo;

pub use mongo::Database;

/// Lazily fetched documents, one item per document.
pub type DocumentStream<'a> = BoxStream<'a, Result<Document, StoreError>>;

/// Matched/modified counts reported by an update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateOutcome {
    pub matched: u64,
    pub modified: u64,
}

/// Result of a batch insert that the store fully accepted.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InsertOutcome {
    /// Store-assigned identifiers, in insertion order
    pub inserted_ids: Vec<String>,
}

impl InsertOutcome {
    pub fn inserted(&self) -> u64 {
        self.inserted_ids.len() as u64
    }
}

/// The document store primitives the maintenance tasks are built on.
///
/// Every call is atomic per document only; there are no cross-document
/// transactions.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// First document matching `filter` in store-default order.
    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError>;

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError>;

    /// Ordered batch insert. A rejected member fails the call with
    /// [`StoreError::PartialInsert`] carrying the confirmed count.
    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<InsertOutcome, StoreError>;

    /// Forward cursor over the documents matching `filter`.
    async fn scan<'a>(&'a self, collection: &str, filter: Document) -> Result<DocumentStream<'a>, StoreError>;
}

/// A store that owns a connection which must be released once a task is done.
#[async_trait]
pub trait StoreHandle: DocumentStore + Clone + Sized + 'static {
    /// Releases the underlying connection, waiting for in-flight operations.
    async fn close(self);
}
