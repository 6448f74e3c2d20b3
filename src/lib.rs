pub mod config;
pub mod db;
pub mod errors;
pub mod logging;
pub mod maintenance;
pub mod models;
pub mod reference;
pub mod seed;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

use std::future::Future;

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::info;

use config::Config;
use db::{Database, StoreHandle};

/// Random source for a run: reproducible when a seed is given.
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => {
            info!("🎲 Using random seed {}", seed);
            StdRng::seed_from_u64(seed)
        }
        None => StdRng::from_entropy(),
    }
}

/// Runs `task` on a handle to `store`, then closes the store whether or not
/// the task succeeded. The task's result is returned unchanged.
pub async fn run_and_close<S, T, F, Fut>(store: S, task: F) -> anyhow::Result<T>
where
    S: StoreHandle,
    F: FnOnce(S) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    let result = task(store.clone()).await;
    store.close().await;
    result
}

/// Connects, runs `task`, and closes the connection whether or not the task
/// succeeded.
pub async fn with_database<T, F, Fut>(config: &Config, task: F) -> anyhow::Result<T>
where
    F: FnOnce(Database) -> Fut,
    Fut: Future<Output = anyhow::Result<T>>,
{
    info!("🔌 Connecting to: {}", config.display_hosts());
    let db = Database::connect(config).await?;

    run_and_close(db, task).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TaskError;
    use crate::reference::UserLookup;
    use crate::test_utils::MemoryStore;
    use rand::Rng;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let mut first = rng_from_seed(Some(7));
        let mut second = rng_from_seed(Some(7));

        let a: Vec<u32> = (0..5).map(|_| first.gen()).collect();
        let b: Vec<u32> = (0..5).map(|_| second.gen()).collect();
        assert_eq!(a, b);
    }

    #[tokio::test]
    async fn test_store_is_closed_after_a_failing_task() {
        let store = MemoryStore::new();
        let observer = store.clone();

        let result: anyhow::Result<()> = run_and_close(store, |handle| async move {
            crate::reference::resolve_user_id(&handle, &UserLookup::admin()).await?;
            Ok::<(), anyhow::Error>(())
        })
        .await;

        let err = result.unwrap_err();
        let task_error = err.downcast_ref::<TaskError>().unwrap();
        assert!(task_error.is_missing_reference());
        assert!(observer.is_closed());
    }

    #[tokio::test]
    async fn test_store_is_closed_after_a_successful_task() {
        let store = MemoryStore::new();
        let observer = store.clone();

        let value = run_and_close(store, |handle| async move {
            assert!(!handle.is_closed());
            Ok::<_, anyhow::Error>(42)
        })
        .await
        .unwrap();

        assert_eq!(value, 42);
        assert!(observer.is_closed());
    }
}
