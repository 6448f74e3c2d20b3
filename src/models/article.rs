use chrono::{DateTime, Utc};
use mongodb::bson::{self, oid::ObjectId, Document};
use serde::{Deserialize, Serialize};

use crate::errors::StoreError;

/// An article as stored in the `articles` collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Article {
    #[serde(rename = "_id", skip_serializing_if = "Option::is_none")]
    pub id: Option<ObjectId>,
    pub title: String,
    pub content: String,
    pub slug: String,
    pub category: String,
    pub thumbnail: String,
    pub featured: bool,
    /// Identifier of the authoring user, copied at write time
    pub author_id: String,
    pub created_at: bson::DateTime,
    pub updated_at: bson::DateTime,
    /// Whether the article has been handed to the search index
    pub indexed: bool,
}

impl Article {
    pub const COLLECTION: &'static str = "articles";

    pub fn to_document(&self) -> Result<Document, StoreError> {
        bson::to_document(self).map_err(|e| StoreError::Decode {
            message: format!("failed to encode article '{}': {}", self.slug, e),
        })
    }

    pub fn from_document(doc: Document) -> Result<Self, StoreError> {
        bson::from_document(doc).map_err(|e| StoreError::Decode {
            message: format!("failed to decode article: {}", e),
        })
    }

    pub fn created_at_utc(&self) -> DateTime<Utc> {
        to_chrono(self.created_at)
    }

    pub fn updated_at_utc(&self) -> DateTime<Utc> {
        to_chrono(self.updated_at)
    }
}

/// Field names used in filters and update documents.
pub mod fields {
    pub const ID: &str = "_id";
    pub const AUTHOR_ID: &str = "authorId";
    pub const THUMBNAIL: &str = "thumbnail";
}

pub fn to_bson_datetime(dt: DateTime<Utc>) -> bson::DateTime {
    bson::DateTime::from_millis(dt.timestamp_millis())
}

fn to_chrono(dt: bson::DateTime) -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp_millis(dt.timestamp_millis()).unwrap_or_default()
}
