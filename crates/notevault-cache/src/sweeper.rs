// Periodic TTL sweep for the listing cache
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tracing::debug;

use crate::cache::{HasNoteId, ListingCache};

/// Handle to the background cleanup task.
///
/// The sweep is an explicit scheduled task owned by whoever owns the cache,
/// started on construction and stopped on shutdown - not an ambient timer.
/// Dropping the handle aborts the task, so tying its lifetime to the cache's
/// owner is enough for a clean shutdown.
pub struct Sweeper {
    task: JoinHandle<()>,
}

impl Sweeper {
    /// Spawn a task that runs `cache.cleanup()` every `interval`.
    pub fn spawn<T>(cache: Arc<ListingCache<T>>, interval: Duration) -> Self
    where
        T: Clone + HasNoteId + Send + Sync + 'static,
    {
        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately; skip it so the first
            // sweep happens one full interval after startup.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                let removed = cache.cleanup();
                if removed > 0 {
                    debug!("sweeper removed {} expired listings", removed);
                }
            }
        });

        Self { task }
    }

    pub fn shutdown(self) {
        self.task.abort();
    }

    pub fn is_running(&self) -> bool {
        !self.task.is_finished()
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::{CacheConfig, PageInfo};

    #[derive(Debug, Clone)]
    struct Row(String);

    impl HasNoteId for Row {
        fn note_id(&self) -> &str {
            &self.0
        }
    }

    #[tokio::test]
    async fn test_sweeper_evicts_expired_entries_without_reads() {
        let cache = Arc::new(ListingCache::with_config(CacheConfig {
            ttl: Duration::from_millis(10),
            max_entries: 100,
        }));
        cache.set(
            "u1",
            1,
            "newest",
            vec![Row("a".into())],
            PageInfo::compute(1, 1, 10),
        );

        let sweeper = Sweeper::spawn(Arc::clone(&cache), Duration::from_millis(20));
        tokio::time::sleep(Duration::from_millis(80)).await;

        // Entry is gone even though nobody called get()
        assert_eq!(cache.stats().size, 0);
        assert!(cache.stats().last_cleanup.is_some());
        sweeper.shutdown();
    }

    #[tokio::test]
    async fn test_shutdown_stops_the_task() {
        let cache: Arc<ListingCache<Row>> = Arc::new(ListingCache::new());
        let sweeper = Sweeper::spawn(Arc::clone(&cache), Duration::from_millis(10));

        assert!(sweeper.is_running());
        sweeper.shutdown();

        tokio::time::sleep(Duration::from_millis(20)).await;
        // The cache itself still works after the sweeper is gone
        assert!(cache.get("u1", 1, "newest").is_none());
    }
}
