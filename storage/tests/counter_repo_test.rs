//! Integration tests for [`storage::CounterRepository`].

use std::sync::Arc;

use chrono::NaiveDate;
use storage::{CounterRepository, SqlitePoolManager};

fn day(d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 5, d).unwrap()
}

/// **Test: Increments accumulate per chat and per day and return the running total.**
#[tokio::test]
async fn test_increment_returns_running_total() {
    let repo = CounterRepository::new("sqlite::memory:").await.unwrap();

    assert_eq!(repo.increment(1, day(1), 2).await.unwrap(), 2);
    assert_eq!(repo.increment(1, day(1), 3).await.unwrap(), 5);
    assert_eq!(repo.increment(1, day(2), 1).await.unwrap(), 1);
    assert_eq!(repo.increment(2, day(1), 1).await.unwrap(), 1);

    assert_eq!(repo.get(1, day(1)).await.unwrap(), 5);
    assert_eq!(repo.get(3, day(1)).await.unwrap(), 0);
}

#[tokio::test]
async fn test_non_positive_increment_rejected() {
    let repo = CounterRepository::new("sqlite::memory:").await.unwrap();
    assert!(repo.increment(1, day(1), 0).await.is_err());
    assert_eq!(repo.get(1, day(1)).await.unwrap(), 0);
}

/// **Test: N concurrent increments on a file database lose no updates.**
///
/// **Setup:** File-backed DB (several pooled connections), 50 tasks each adding 1 to one counter.
/// **Action:** Join all tasks.
/// **Expected:** Final total is exactly 50 and every returned total is distinct.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_increments_are_atomic() {
    let dir = tempfile::tempdir().unwrap();
    let url = format!("sqlite://{}", dir.path().join("counters.db").display());
    let pool = SqlitePoolManager::new(&url).await.unwrap();
    let repo = Arc::new(CounterRepository::with_pool(pool).await.unwrap());

    let tasks: Vec<_> = (0..50)
        .map(|_| {
            let repo = repo.clone();
            tokio::spawn(async move { repo.increment(7, day(3), 1).await.unwrap() })
        })
        .collect();

    let mut totals = Vec::new();
    for task in tasks {
        totals.push(task.await.unwrap());
    }
    totals.sort_unstable();
    totals.dedup();

    assert_eq!(totals.len(), 50);
    assert_eq!(repo.get(7, day(3)).await.unwrap(), 50);
}
