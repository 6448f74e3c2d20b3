use mongodb::bson::{doc, Document};
use tracing::info;

use crate::db::{DocumentStore, UpdateOutcome};
use crate::errors::TaskError;
use crate::models::{fields, Article};
use crate::reference::{resolve_user_id, UserLookup};

/// Applies `update` to every document in `collection` matching `filter`.
/// An empty filter selects the whole collection.
pub async fn bulk_update<S>(
    store: &S,
    collection: &str,
    filter: Document,
    update: Document,
) -> Result<UpdateOutcome, TaskError>
where
    S: DocumentStore + ?Sized,
{
    let outcome = store.update_many(collection, filter, update).await?;
    info!(
        "Bulk update on '{}' matched {} and modified {} documents",
        collection, outcome.matched, outcome.modified
    );
    Ok(outcome)
}

/// Points every article at `author_id`.
pub async fn reassign_article_authors<S>(store: &S, author_id: &str) -> Result<UpdateOutcome, TaskError>
where
    S: DocumentStore + ?Sized,
{
    bulk_update(
        store,
        Article::COLLECTION,
        Document::new(),
        doc! { "$set": { fields::AUTHOR_ID: author_id } },
    )
    .await
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorFixReport {
    pub author_id: String,
    pub outcome: UpdateOutcome,
}

impl AuthorFixReport {
    pub fn already_consistent(&self) -> bool {
        self.outcome.modified == 0
    }
}

/// Resolves the author named by `lookup` and rewrites `authorId` on every
/// article. Nothing is written when the author cannot be found.
pub async fn fix_article_authors<S>(store: &S, lookup: &UserLookup) -> Result<AuthorFixReport, TaskError>
where
    S: DocumentStore + ?Sized,
{
    let author_id = resolve_user_id(store, lookup).await?;
    info!("✅ Found author ID: {}", author_id);

    info!("🛠️  Updating all articles to use this author ID...");
    let outcome = reassign_article_authors(store, &author_id).await?;

    Ok(AuthorFixReport { author_id, outcome })
}
