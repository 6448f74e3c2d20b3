#[cfg(test)]
mod tests {
    use chrono::{TimeZone, Utc};
    use gravy_tools::db::UpdateOutcome;
    use gravy_tools::maintenance::{fix_article_authors, randomize_thumbnails, ImageReport, IMAGE_POOL};
    use gravy_tools::models::{Article, USERS_COLLECTION};
    use gravy_tools::reference::UserLookup;
    use gravy_tools::seed::{seed_articles, slugify, DEFAULT_ARTICLE_COUNT};
    use gravy_tools::test_utils::MemoryStore;
    use mongodb::bson::{doc, oid::ObjectId, Document};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn articles(store: &MemoryStore) -> Vec<Article> {
        store
            .documents(Article::COLLECTION)
            .into_iter()
            .map(|doc| Article::from_document(doc).unwrap())
            .collect()
    }

    fn seed_stale_articles(store: &MemoryStore, count: usize) {
        for n in 0..count {
            store.seed(
                Article::COLLECTION,
                doc! { "_id": ObjectId::new(), "slug": format!("stale-{}", n), "authorId": format!("ghost-{}", n % 3) },
            );
        }
    }

    /// Checks `<lowercased-title-with-dashes>-<integer>`.
    fn slug_matches_title(article: &Article) -> bool {
        let prefix = format!("{}-", slugify(&article.title));
        match article.slug.strip_prefix(&prefix) {
            Some(suffix) => !suffix.is_empty() && suffix.chars().all(|c| c.is_ascii_digit()),
            None => false,
        }
    }

    #[tokio::test]
    async fn test_fix_authors_converges_and_is_idempotent() {
        let store = MemoryStore::new();
        let admin_id = ObjectId::new();
        store.seed(USERS_COLLECTION, doc! { "_id": ObjectId::new(), "username": "editor" });
        store.seed(USERS_COLLECTION, doc! { "_id": admin_id, "username": "admin" });
        seed_stale_articles(&store, 7);

        let first = fix_article_authors(&store, &UserLookup::admin()).await.unwrap();
        assert_eq!(first.author_id, admin_id.to_hex());
        assert_eq!(first.outcome, UpdateOutcome { matched: 7, modified: 7 });
        let after_first: Vec<Document> = store.documents(Article::COLLECTION);
        assert!(after_first
            .iter()
            .all(|doc| doc.get_str("authorId").unwrap() == admin_id.to_hex()));

        let second = fix_article_authors(&store, &UserLookup::admin()).await.unwrap();
        assert_eq!(second.outcome, UpdateOutcome { matched: 7, modified: 0 });
        assert!(second.already_consistent());
        assert_eq!(store.documents(Article::COLLECTION), after_first);
    }

    #[tokio::test]
    async fn test_fix_authors_without_admin_stops_before_mutating() {
        let store = MemoryStore::new();
        store.seed(USERS_COLLECTION, doc! { "_id": ObjectId::new(), "username": "editor" });
        seed_stale_articles(&store, 3);
        let before = store.documents(Article::COLLECTION);

        let err = fix_article_authors(&store, &UserLookup::admin()).await.unwrap_err();
        assert!(err.is_missing_reference());
        assert_eq!(store.mutation_count(), 0);
        assert_eq!(store.documents(Article::COLLECTION), before);
    }

    #[tokio::test]
    async fn test_seed_inserts_fifty_articles_for_the_only_user() {
        let store = MemoryStore::new();
        let user_id = ObjectId::new();
        store.seed(USERS_COLLECTION, doc! { "_id": user_id, "username": "admin" });
        let mut rng = StdRng::seed_from_u64(2024);

        let report = seed_articles(&store, DEFAULT_ARTICLE_COUNT, Utc::now(), &mut rng)
            .await
            .unwrap();

        assert_eq!(report.inserted, 50);
        assert_eq!(report.inserted_ids.len(), 50);
        let stored = articles(&store);
        assert_eq!(stored.len(), 50);
        for article in &stored {
            assert!(article.id.is_some());
            assert_eq!(article.author_id, user_id.to_hex());
            assert!(article.indexed);
            assert!(slug_matches_title(article), "bad slug {}", article.slug);
        }
    }

    #[tokio::test]
    async fn test_seed_grows_by_fifty_per_run() {
        let store = MemoryStore::new();
        store.seed(USERS_COLLECTION, doc! { "_id": "only-user", "username": "admin" });
        let mut rng = StdRng::seed_from_u64(1);

        for run in 1..=2 {
            seed_articles(&store, DEFAULT_ARTICLE_COUNT, Utc::now(), &mut rng)
                .await
                .unwrap();
            assert_eq!(store.count(Article::COLLECTION), 50 * run);
        }
    }

    #[tokio::test]
    async fn test_seed_is_reproducible_with_a_seed() {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 0, 0, 0).unwrap();
        let mut runs = Vec::new();
        for _ in 0..2 {
            let store = MemoryStore::new();
            store.seed(USERS_COLLECTION, doc! { "_id": "u", "username": "admin" });
            let mut rng = StdRng::seed_from_u64(77);
            seed_articles(&store, 10, now, &mut rng).await.unwrap();

            let mut stored = articles(&store);
            for article in &mut stored {
                article.id = None;
            }
            runs.push(stored);
        }
        assert_eq!(runs[0], runs[1]);
    }

    #[tokio::test]
    async fn test_seed_without_users_inserts_nothing() {
        let store = MemoryStore::new();
        let mut rng = StdRng::seed_from_u64(0);

        let err = seed_articles(&store, DEFAULT_ARTICLE_COUNT, Utc::now(), &mut rng)
            .await
            .unwrap_err();
        assert!(err.is_missing_reference());
        assert_eq!(store.count(Article::COLLECTION), 0);
        assert_eq!(store.mutation_count(), 0);
    }

    #[tokio::test]
    async fn test_seed_partial_insert_surfaces_confirmed_count() {
        let store = MemoryStore::new();
        store.seed(USERS_COLLECTION, doc! { "_id": "u", "username": "admin" });
        store.fail_insert_at(20);
        let mut rng = StdRng::seed_from_u64(9);

        let err = seed_articles(&store, DEFAULT_ARTICLE_COUNT, Utc::now(), &mut rng)
            .await
            .unwrap_err();
        assert!(err.to_string().contains("after 20 documents"));
        assert_eq!(store.count(Article::COLLECTION), 20);
    }

    #[tokio::test]
    async fn test_randomize_updates_each_of_k_articles() {
        let store = MemoryStore::new();
        seed_stale_articles(&store, 9);
        let mut rng = StdRng::seed_from_u64(31);

        let report = randomize_thumbnails(&store, IMAGE_POOL, &mut rng).await.unwrap();
        assert_eq!(report, ImageReport { scanned: 9, updated: 9, skipped: 0 });

        for doc in store.documents(Article::COLLECTION) {
            assert!(IMAGE_POOL.contains(&doc.get_str("thumbnail").unwrap()));
        }
    }

    #[tokio::test]
    async fn test_randomize_after_seed_keeps_other_fields() {
        let store = MemoryStore::new();
        store.seed(USERS_COLLECTION, doc! { "_id": "u", "username": "admin" });
        let mut rng = StdRng::seed_from_u64(4);
        seed_articles(&store, 5, Utc::now(), &mut rng).await.unwrap();
        let before = articles(&store);

        randomize_thumbnails(&store, IMAGE_POOL, &mut rng).await.unwrap();

        let after = articles(&store);
        for (old, new) in before.iter().zip(after.iter()) {
            assert_eq!(old.slug, new.slug);
            assert_eq!(old.author_id, new.author_id);
            assert_eq!(old.created_at, new.created_at);
            assert!(IMAGE_POOL.contains(&new.thumbnail.as_str()));
        }
    }
}
