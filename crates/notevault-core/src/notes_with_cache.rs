// Note listing use case with caching support
use std::sync::Arc;

use notevault_cache::{CacheStats, ListingCache, PageInfo, Sweeper};
use tracing::{debug, info};

use crate::{
    adapter::{PersistenceAdapter, Served},
    config::Config,
    models::{Note, NoteChanges, NoteListing, NoteSummary, SortOrder},
    Result,
};

/// Note management that checks the listing cache before hitting storage.
///
/// Reads go cache-first; writes go straight through the adapter and then
/// invalidate the owner's cached listings synchronously, so the same caller's
/// next read is guaranteed to miss and fetch fresh data. (Other workers hold
/// their own caches; their staleness is bounded by the TTL.)
pub struct CachedNotesService {
    adapter: PersistenceAdapter,
    cache: Arc<ListingCache<NoteSummary>>,
    fetch_limit: u32,
    page_size: usize,
}

impl CachedNotesService {
    pub fn new(adapter: PersistenceAdapter, cache: Arc<ListingCache<NoteSummary>>) -> Self {
        Self {
            adapter,
            cache,
            fetch_limit: 100,
            page_size: 10,
        }
    }

    pub fn with_limits(mut self, fetch_limit: u32, page_size: usize) -> Self {
        self.fetch_limit = fetch_limit;
        self.page_size = page_size;
        self
    }

    /// Wire up the whole stack from config: SQLite direct path, REST
    /// fallback, cache, and its background sweeper. The returned Sweeper
    /// handle stops the sweep task when dropped.
    pub fn from_config(config: &Config) -> Result<(Self, Sweeper)> {
        let direct = crate::backends::SqliteBackend::open(&config.database.path)?;
        let fallback = crate::backends::RestBackend::new(notevault_api::RestNotesClient::new(
            config.fallback.base_url.clone(),
            config.fallback.token.clone(),
        ));

        let adapter = PersistenceAdapter::new(Arc::new(direct), Arc::new(fallback));
        let cache = Arc::new(ListingCache::with_config(config.cache.tuning()));
        let sweeper = Sweeper::spawn(Arc::clone(&cache), config.cache.sweep_interval());

        let service = Self::new(adapter, cache)
            .with_limits(config.listing.fetch_limit, config.listing.page_size);
        Ok((service, sweeper))
    }

    /// One page of a user's notes, cache-first.
    pub async fn list_notes(
        &self,
        user_id: &str,
        page: u32,
        sort: SortOrder,
    ) -> Result<NoteListing> {
        let sort_key = sort.to_string();

        if let Some(hit) = self.cache.get(user_id, page, &sort_key) {
            info!("listing cache hit for {} page {}", user_id, page);
            return Ok(NoteListing {
                notes: hit.notes,
                pagination: hit.page_info,
            });
        }

        // Cache miss - hit storage. A failed fetch caches nothing.
        debug!("listing cache miss for {} page {}, fetching", user_id, page);
        let served = self.adapter.list(user_id, self.fetch_limit).await?;
        info!("listing for {} served by {} path", user_id, served.path);

        let mut notes = served.data;
        sort.apply(&mut notes);

        let pagination = PageInfo::compute(notes.len(), page, self.page_size);
        let rows = page_slice(&notes, page, self.page_size)
            .iter()
            .map(NoteSummary::from)
            .collect::<Vec<_>>();

        self.cache
            .set(user_id, page, &sort_key, rows.clone(), pagination.clone());

        Ok(NoteListing {
            notes: rows,
            pagination,
        })
    }

    /// Invalidate the user's listings first, then fetch - the retry action
    /// after a failure, guaranteed not to be served a stale entry.
    pub async fn refresh_listing(
        &self,
        user_id: &str,
        page: u32,
        sort: SortOrder,
    ) -> Result<NoteListing> {
        self.cache.invalidate_user(user_id);
        self.list_notes(user_id, page, sort).await
    }

    pub async fn create_note(
        &self,
        user_id: &str,
        title: &str,
        content: Option<&str>,
    ) -> Result<Served<Note>> {
        let served = self.adapter.insert(user_id, title, content).await?;
        self.cache.invalidate_user(user_id);
        Ok(served)
    }

    pub async fn update_note(&self, note_id: &str, changes: &NoteChanges) -> Result<Served<Note>> {
        let served = self.adapter.update(note_id, changes).await?;
        // The written row names its owner; drop their cached listings
        self.cache.invalidate_user(&served.data.user_id);
        Ok(served)
    }

    pub async fn delete_note(&self, note_id: &str) -> Result<Served<Note>> {
        let served = self.adapter.soft_delete(note_id).await?;
        self.cache.invalidate_user(&served.data.user_id);
        Ok(served)
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}

fn page_slice(notes: &[Note], page: u32, per_page: usize) -> &[Note] {
    let start = (page.saturating_sub(1) as usize).saturating_mul(per_page);
    if start >= notes.len() {
        return &[];
    }
    let end = (start + per_page).min(notes.len());
    &notes[start..end]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::NotesBackend;
    use crate::models::NewNote;
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{DateTime, Utc};
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::sync::Mutex;

    /// Fake backend over an in-memory Vec so tests can mutate storage
    /// underneath the cache.
    struct MemoryBackend {
        notes: Mutex<Vec<Note>>,
        selects: AtomicU32,
        fail: bool,
    }

    impl MemoryBackend {
        fn new() -> Self {
            Self {
                notes: Mutex::new(Vec::new()),
                selects: AtomicU32::new(0),
                fail: false,
            }
        }

        fn failing() -> Self {
            Self {
                fail: true,
                ..Self::new()
            }
        }

        fn selects(&self) -> u32 {
            self.selects.load(Ordering::SeqCst)
        }

        fn push_note(&self, id: &str, user_id: &str, title: &str, minute: u32) {
            let at = DateTime::<Utc>::UNIX_EPOCH + chrono::Duration::minutes(minute as i64);
            self.notes.lock().unwrap().push(Note {
                id: id.to_string(),
                user_id: user_id.to_string(),
                title: title.to_string(),
                content: None,
                created_at: at,
                updated_at: at,
                deleted_at: None,
            });
        }
    }

    #[async_trait]
    impl NotesBackend for MemoryBackend {
        async fn insert(&self, note: &NewNote) -> Result<Note> {
            if self.fail {
                return Err(Error::DirectPath("backend down".into()));
            }
            let note: Note = note.clone().into();
            self.notes.lock().unwrap().push(note.clone());
            Ok(note)
        }

        async fn select(&self, user_id: &str, limit: u32) -> Result<Vec<Note>> {
            self.selects.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(Error::DirectPath("backend down".into()));
            }
            let notes = self.notes.lock().unwrap();
            Ok(notes
                .iter()
                .filter(|n| n.user_id == user_id && n.deleted_at.is_none())
                .take(limit as usize)
                .cloned()
                .collect())
        }

        async fn update(
            &self,
            note_id: &str,
            changes: &NoteChanges,
            updated_at: DateTime<Utc>,
        ) -> Result<Note> {
            if self.fail {
                return Err(Error::DirectPath("backend down".into()));
            }
            let mut notes = self.notes.lock().unwrap();
            let note = notes
                .iter_mut()
                .find(|n| n.id == note_id)
                .ok_or_else(|| Error::NotFound(note_id.to_string()))?;
            if let Some(ref title) = changes.title {
                note.title = title.clone();
            }
            if let Some(ref content) = changes.content {
                note.content = Some(content.clone());
            }
            note.updated_at = updated_at;
            Ok(note.clone())
        }

        async fn soft_delete(&self, note_id: &str, deleted_at: DateTime<Utc>) -> Result<Note> {
            if self.fail {
                return Err(Error::DirectPath("backend down".into()));
            }
            let mut notes = self.notes.lock().unwrap();
            let note = notes
                .iter_mut()
                .find(|n| n.id == note_id)
                .ok_or_else(|| Error::NotFound(note_id.to_string()))?;
            note.deleted_at = Some(deleted_at);
            note.updated_at = deleted_at;
            Ok(note.clone())
        }
    }

    fn service(backend: &Arc<MemoryBackend>) -> CachedNotesService {
        let adapter = PersistenceAdapter::new(
            Arc::clone(backend) as Arc<dyn NotesBackend>,
            Arc::new(MemoryBackend::failing()) as Arc<dyn NotesBackend>,
        );
        CachedNotesService::new(adapter, Arc::new(ListingCache::new()))
    }

    #[tokio::test]
    async fn test_repeated_listing_is_served_from_cache() {
        let backend = Arc::new(MemoryBackend::new());
        backend.push_note("n1", "u1", "hello", 0);
        let service = service(&backend);

        let first = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        let second = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();

        assert_eq!(first, second);
        assert_eq!(backend.selects(), 1);
        assert_eq!(service.cache_stats().hits, 1);
    }

    #[tokio::test]
    async fn test_writes_invalidate_cached_listings() {
        let backend = Arc::new(MemoryBackend::new());
        backend.push_note("n1", "u1", "hello", 0);
        let service = service(&backend);

        service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        service.create_note("u1", "another", None).await.unwrap();

        let listing = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(listing.notes.len(), 2);
        assert_eq!(backend.selects(), 2);
    }

    #[tokio::test]
    async fn test_update_invalidates_by_written_owner() {
        let backend = Arc::new(MemoryBackend::new());
        backend.push_note("n1", "u1", "before", 0);
        backend.push_note("n2", "u2", "other", 0);
        let service = service(&backend);

        service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        service.list_notes("u2", 1, SortOrder::Newest).await.unwrap();

        service
            .update_note(
                "n1",
                &NoteChanges {
                    title: Some("after".into()),
                    content: None,
                },
            )
            .await
            .unwrap();

        // u1's listing refetches, u2's is still cached
        let listing = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(listing.notes[0].title, "after");
        service.list_notes("u2", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(backend.selects(), 3);
    }

    #[tokio::test]
    async fn test_failed_fetch_caches_nothing() {
        let backend = Arc::new(MemoryBackend::failing());
        let service = service(&backend);

        let err = service.list_notes("u1", 1, SortOrder::Newest).await;
        assert!(matches!(err, Err(Error::StorageUnavailable { .. })));
        assert_eq!(service.cache_stats().size, 0);
    }

    #[tokio::test]
    async fn test_refresh_bypasses_stale_cache() {
        let backend = Arc::new(MemoryBackend::new());
        backend.push_note("n1", "u1", "first", 0);
        let service = service(&backend);

        service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();

        // Mutate storage behind the cache's back
        backend.push_note("n2", "u1", "second", 1);
        let stale = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(stale.notes.len(), 1);

        let fresh = service.refresh_listing("u1", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(fresh.notes.len(), 2);
    }

    #[tokio::test]
    async fn test_pagination_and_sorting() {
        let backend = Arc::new(MemoryBackend::new());
        for i in 0..25 {
            backend.push_note(&format!("n{}", i), "u1", &format!("note {}", i), i);
        }
        let service = service(&backend).with_limits(100, 10);

        let page1 = service.list_notes("u1", 1, SortOrder::Newest).await.unwrap();
        assert_eq!(page1.notes.len(), 10);
        assert_eq!(page1.notes[0].id, "n24");
        assert_eq!(page1.pagination.total_pages, 3);
        assert!(page1.pagination.has_next_page);
        assert!(!page1.pagination.has_prev_page);

        let page3 = service.list_notes("u1", 3, SortOrder::Oldest).await.unwrap();
        assert_eq!(page3.notes.len(), 5);
        assert_eq!(page3.notes[0].id, "n20");
        assert!(!page3.pagination.has_next_page);
    }
}
