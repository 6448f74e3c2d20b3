use thiserror::Error;

use crate::reference::UserLookup;

/// Errors raised by a [`DocumentStore`](crate::db::DocumentStore) implementation
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Failed to connect to the database: {message}")]
    Connection { message: String },

    #[error("Database operation '{operation}' on '{collection}' failed: {message}")]
    Operation {
        operation: &'static str,
        collection: String,
        message: String,
    },

    #[error("Batch insert into '{collection}' failed after {inserted} documents: {message}")]
    PartialInsert {
        collection: String,
        inserted: u64,
        message: String,
    },

    #[error("Failed to decode document: {message}")]
    Decode { message: String },

    #[error("Unsupported operation: {message}")]
    Unsupported { message: String },
}

impl StoreError {
    pub fn operation(
        operation: &'static str,
        collection: impl Into<String>,
        err: impl std::fmt::Display,
    ) -> Self {
        StoreError::Operation {
            operation,
            collection: collection.into(),
            message: err.to_string(),
        }
    }

    /// Number of documents the store confirmed before failing, if any were.
    pub fn confirmed_inserts(&self) -> Option<u64> {
        match self {
            StoreError::PartialInsert { inserted, .. } => Some(*inserted),
            _ => None,
        }
    }
}

/// Fatal errors from one maintenance task
#[derive(Error, Debug)]
pub enum TaskError {
    #[error("Could not find {lookup}. {hint}")]
    MissingReference { lookup: UserLookup, hint: &'static str },

    #[error("Image pool is empty; there is nothing to assign")]
    EmptyImagePool,

    #[error(transparent)]
    Store(#[from] StoreError),
}

impl TaskError {
    pub fn is_missing_reference(&self) -> bool {
        matches!(self, TaskError::MissingReference { .. })
    }
}
