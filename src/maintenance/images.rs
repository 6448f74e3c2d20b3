use futures::StreamExt;
use mongodb::bson::{doc, Bson, Document};
use rand::Rng;
use tracing::{debug, info, warn};

use crate::db::DocumentStore;
use crate::errors::{StoreError, TaskError};
use crate::models::{fields, Article};

/// Replacement thumbnails. Repeated entries are intentional and weight the pick.
pub const IMAGE_POOL: &[&str] = &[
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284893_n3s1ub.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284907_xifwe2.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284893_n3s1ub.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284893_n3s1ub.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284907_xifwe2.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284893_n3s1ub.jpg",
    "https://res.cloudinary.com/dbxtgjwyv/image/upload/v1768746331/16284907_xifwe2.jpg",
];

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImageReport {
    pub scanned: u64,
    pub updated: u64,
    pub skipped: u64,
}

fn article_id(doc: &Document) -> Result<Bson, StoreError> {
    match doc.get(fields::ID) {
        Some(Bson::ObjectId(oid)) => Ok(Bson::ObjectId(*oid)),
        Some(other) => Err(StoreError::Decode {
            message: format!("article _id is not an ObjectId: {}", other),
        }),
        None => Err(StoreError::Decode {
            message: "article has no _id".to_string(),
        }),
    }
}

/// Gives every article a thumbnail drawn from `pool`, one update per
/// document. Per-document failures are logged and skipped.
pub async fn randomize_thumbnails<S, R>(
    store: &S,
    pool: &[&str],
    rng: &mut R,
) -> Result<ImageReport, TaskError>
where
    S: DocumentStore + ?Sized,
    R: Rng + ?Sized + Send,
{
    if pool.is_empty() {
        return Err(TaskError::EmptyImagePool);
    }

    let mut cursor = store.scan(Article::COLLECTION, Document::new()).await?;
    let mut report = ImageReport::default();

    info!("🔄 Updating article images...");
    while let Some(item) = cursor.next().await {
        report.scanned += 1;

        let id = match item.and_then(|doc| article_id(&doc)) {
            Ok(id) => id,
            Err(StoreError::Decode { message }) => {
                warn!("Skipping doc: {}", message);
                report.skipped += 1;
                continue;
            }
            Err(e) => return Err(e.into()),
        };

        let image = pool[rng.gen_range(0..pool.len())];
        match store
            .update_one(
                Article::COLLECTION,
                doc! { fields::ID: id.clone() },
                doc! { "$set": { fields::THUMBNAIL: image } },
            )
            .await
        {
            Ok(_) => {
                debug!("Set thumbnail of {} to {}", id, image);
                report.updated += 1;
            }
            Err(e) => {
                warn!("Failed to update {}: {}", id, e);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}
