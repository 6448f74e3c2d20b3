use async_trait::async_trait;
use futures::{StreamExt, TryStreamExt};
use mongodb::bson::{doc, Bson, Document};
use mongodb::error::ErrorKind;
use mongodb::options::ClientOptions;
use mongodb::Client;
use tracing::{debug, info};

use super::{DocumentStore, DocumentStream, InsertOutcome, StoreHandle, UpdateOutcome};
use crate::config::Config;
use crate::errors::StoreError;

const APP_NAME: &str = "gravy-tools";

/// Live handle to the MongoDB deployment named in the configuration.
#[derive(Clone)]
pub struct Database {
    client: Client,
    database_name: String,
}

impl Database {
    /// Connects and pings the server so an unreachable deployment fails here
    /// rather than on the first real operation.
    pub async fn connect(config: &Config) -> Result<Self, StoreError> {
        let mut options = ClientOptions::parse(&config.mongodb_uri)
            .await
            .map_err(|e| StoreError::Connection { message: e.to_string() })?;
        // SRV seed lists are resolved by the driver and never rewritten.
        if !config.hosts.is_empty() {
            options.hosts = config.hosts.clone();
        }
        options.server_selection_timeout = Some(config.connect_timeout);
        options.app_name = Some(APP_NAME.to_string());

        let client = Client::with_options(options)
            .map_err(|e| StoreError::Connection { message: e.to_string() })?;

        let db = Self {
            client,
            database_name: config.database_name.clone(),
        };
        db.ping().await?;
        info!("Connected to database '{}'", db.database_name);
        Ok(db)
    }

    pub fn database(&self) -> mongodb::Database {
        self.client.database(&self.database_name)
    }

    pub fn database_name(&self) -> &str {
        &self.database_name
    }

    pub async fn ping(&self) -> Result<(), StoreError> {
        self.database()
            .run_command(doc! { "ping": 1 })
            .await
            .map(|_| ())
            .map_err(|e| StoreError::Connection { message: e.to_string() })
    }

    /// Closes the connection pool, waiting for in-flight operations.
    pub async fn shutdown(self) {
        debug!("Closing database connection");
        self.client.shutdown().await;
    }

    fn collection(&self, name: &str) -> mongodb::Collection<Document> {
        self.database().collection::<Document>(name)
    }
}

fn id_to_string(id: Bson) -> String {
    match id {
        Bson::ObjectId(oid) => oid.to_hex(),
        Bson::String(s) => s,
        other => other.to_string(),
    }
}

fn cursor_error(collection: &str, err: mongodb::error::Error) -> StoreError {
    if matches!(*err.kind, ErrorKind::BsonDeserialization(_)) {
        StoreError::Decode { message: err.to_string() }
    } else {
        StoreError::operation("scan", collection, err)
    }
}

/// With ordered inserts nothing after the first rejected document is
/// written, so the lowest failing index is the confirmed count.
fn insert_error(collection: &str, attempted: usize, err: mongodb::error::Error) -> StoreError {
    match *err.kind {
        ErrorKind::InsertMany(ref failure) => {
            let inserted = failure
                .write_errors
                .as_ref()
                .and_then(|errors| errors.iter().map(|e| e.index).min())
                .unwrap_or(attempted);
            StoreError::PartialInsert {
                collection: collection.to_string(),
                inserted: inserted as u64,
                message: err.to_string(),
            }
        }
        _ => StoreError::operation("insert_many", collection, err),
    }
}

#[async_trait]
impl DocumentStore for Database {
    async fn find_one(&self, collection: &str, filter: Document) -> Result<Option<Document>, StoreError> {
        self.collection(collection)
            .find_one(filter)
            .await
            .map_err(|e| StoreError::operation("find_one", collection, e))
    }

    async fn update_many(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_many(filter, update)
            .await
            .map_err(|e| StoreError::operation("update_many", collection, e))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn update_one(
        &self,
        collection: &str,
        filter: Document,
        update: Document,
    ) -> Result<UpdateOutcome, StoreError> {
        let result = self
            .collection(collection)
            .update_one(filter, update)
            .await
            .map_err(|e| StoreError::operation("update_one", collection, e))?;

        Ok(UpdateOutcome {
            matched: result.matched_count,
            modified: result.modified_count,
        })
    }

    async fn insert_many(&self, collection: &str, documents: Vec<Document>) -> Result<InsertOutcome, StoreError> {
        if documents.is_empty() {
            return Ok(InsertOutcome::default());
        }
        let attempted = documents.len();

        let result = self
            .collection(collection)
            .insert_many(documents)
            .ordered(true)
            .await
            .map_err(|e| insert_error(collection, attempted, e))?;

        let mut ids: Vec<(usize, Bson)> = result.inserted_ids.into_iter().collect();
        ids.sort_by_key(|(index, _)| *index);

        Ok(InsertOutcome {
            inserted_ids: ids.into_iter().map(|(_, id)| id_to_string(id)).collect(),
        })
    }

    async fn scan<'a>(&'a self, collection: &str, filter: Document) -> Result<DocumentStream<'a>, StoreError> {
        let cursor = self
            .collection(collection)
            .find(filter)
            .await
            .map_err(|e| StoreError::operation("find", collection, e))?;

        let collection = collection.to_string();
        Ok(cursor
            .map_err(move |e| cursor_error(&collection, e))
            .boxed())
    }
}

#[async_trait]
impl StoreHandle for Database {
    async fn close(self) {
        self.shutdown().await;
    }
}
