use chrono::{DateTime, Duration, Utc};
use rand::Rng;
use tracing::{error, info};

use crate::db::DocumentStore;
use crate::errors::{StoreError, TaskError};
use crate::models::{to_bson_datetime, Article};
use crate::reference::{resolve_user_id, UserLookup};

pub const DEFAULT_ARTICLE_COUNT: usize = 50;

/// Upper bound (exclusive) of the random slug suffix.
pub const SLUG_SUFFIX_RANGE: u32 = 100_000;

/// Upper bound (exclusive) of how far back `createdAt` is pushed, in hours.
pub const MAX_BACKDATE_HOURS: i64 = 1000;

pub const CATEGORIES: &[&str] = &[
    "Campus Life",
    "Academics",
    "Hostels",
    "Events",
    "Clubs",
    "Departments",
];

pub const TITLES: &[&str] = &[
    "History of Festember",
    "Guide to Garnet Hostel",
    "Life at Octagon",
    "Department of CSE",
    "Nittfest Highlights",
    "Pragyan Events",
    "Sportsfete 2024",
    "First Year Guide",
    "Mess Food Reviews",
    "Library Rules",
    "Hospital Timings",
    "Bus Schedule",
];

pub const THUMBNAILS: &[&str] = &[
    "https://images.unsplash.com/photo-1541339907198-e08756dedf3f",
    "https://images.unsplash.com/photo-1523050854058-8df90110c9f1",
    "https://images.unsplash.com/photo-1562774053-701939374585",
    "https://images.unsplash.com/photo-1592280771800-bcf291d02e0c",
];

/// Lowercases `title` and joins words with dashes.
pub fn slugify(title: &str) -> String {
    title.to_lowercase().replace(' ', "-")
}

/// Slug with a random numeric suffix. Collisions are unlikely, not impossible.
pub fn generate_slug<R: Rng + ?Sized>(title: &str, rng: &mut R) -> String {
    format!("{}-{}", slugify(title), rng.gen_range(0..SLUG_SUFFIX_RANGE))
}

fn article_body(title: &str) -> String {
    format!(
        "# {title}\n\nLorem ipsum dolor sit amet, consectetur adipiscing elit. \n\n## History\nThis is a dummy article about {title}. It contains **markdown** content."
    )
}

/// Pools passed here are the non-empty constants above.
fn pick<'a, R: Rng + ?Sized>(pool: &[&'a str], rng: &mut R) -> &'a str {
    pool[rng.gen_range(0..pool.len())]
}

/// Builds one fixture article; `index` becomes the title suffix.
pub fn generate_article<R: Rng + ?Sized>(
    index: usize,
    author_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Article {
    let title = format!("{} {}", pick(TITLES, rng), index);
    let category = pick(CATEGORIES, rng).to_string();
    let slug = generate_slug(&title, rng);
    let thumbnail = pick(THUMBNAILS, rng).to_string();
    let featured = rng.gen_bool(0.5);
    let age = Duration::hours(rng.gen_range(0..MAX_BACKDATE_HOURS));

    Article {
        id: None,
        content: article_body(&title),
        title,
        slug,
        category,
        thumbnail,
        featured,
        author_id: author_id.to_string(),
        created_at: to_bson_datetime(now - age),
        updated_at: to_bson_datetime(now),
        indexed: true,
    }
}

pub fn generate_articles<R: Rng + ?Sized>(
    count: usize,
    author_id: &str,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Vec<Article> {
    (0..count)
        .map(|index| generate_article(index, author_id, now, rng))
        .collect()
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeedReport {
    pub author_id: String,
    pub requested: usize,
    /// Count confirmed by the store, not the requested count
    pub inserted: u64,
    pub inserted_ids: Vec<String>,
}

/// Inserts `count` generated articles, all attributed to the first user found.
pub async fn seed_articles<S, R>(
    store: &S,
    count: usize,
    now: DateTime<Utc>,
    rng: &mut R,
) -> Result<SeedReport, TaskError>
where
    S: DocumentStore + ?Sized,
    R: Rng + ?Sized + Send,
{
    let author_id = resolve_user_id(store, &UserLookup::Any).await?;
    info!("👤 Assigning articles to Author ID: {}", author_id);

    let documents = generate_articles(count, &author_id, now, rng)
        .iter()
        .map(Article::to_document)
        .collect::<Result<Vec<_>, StoreError>>()?;

    let outcome = match store.insert_many(Article::COLLECTION, documents).await {
        Ok(outcome) => outcome,
        Err(e) => {
            if let Some(confirmed) = e.confirmed_inserts() {
                error!(
                    "❌ Batch insert stopped after {} of {} articles",
                    confirmed, count
                );
            }
            return Err(e.into());
        }
    };

    Ok(SeedReport {
        author_id,
        requested: count,
        inserted: outcome.inserted(),
        inserted_ids: outcome.inserted_ids,
    })
}
