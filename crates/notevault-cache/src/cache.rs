use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Anything the cache holds must be able to name the note it came from,
/// so per-note invalidation can find it.
pub trait HasNoteId {
    fn note_id(&self) -> &str;
}

/// Tuning knobs for [`ListingCache`].
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Entries older than this are never served.
    pub ttl: Duration,
    /// Maximum number of cached listings.
    pub max_entries: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl: Duration::from_secs(300), // 5 min - listings go stale fast
            max_entries: 100,
        }
    }
}

/// Pagination block attached to every cached listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageInfo {
    pub current_page: u32,
    pub total_pages: u32,
    pub total_notes: usize,
    pub has_next_page: bool,
    pub has_prev_page: bool,
}

impl PageInfo {
    /// Compute the block for a 1-based page over `total_notes` items.
    pub fn compute(total_notes: usize, page: u32, per_page: usize) -> Self {
        let total_pages = if per_page == 0 {
            0
        } else {
            ((total_notes + per_page - 1) / per_page) as u32
        };

        Self {
            current_page: page,
            total_pages,
            total_notes,
            has_next_page: page < total_pages,
            has_prev_page: page > 1,
        }
    }
}

/// One cached listing, cloned out on every hit.
#[derive(Debug, Clone, PartialEq)]
pub struct CachedListing<T> {
    pub notes: Vec<T>,
    pub page_info: PageInfo,
}

/// Running counters, exposed for operational visibility only.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub size: usize,
    pub last_cleanup: Option<DateTime<Utc>>,
    pub hit_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct CacheKey {
    user_id: String,
    page: u32,
    sort: String,
}

struct CacheEntry<T> {
    notes: Vec<T>,
    page_info: PageInfo,
    saved_at: Instant,
    owner: String,
}

struct CacheInner<T> {
    entries: HashMap<CacheKey, CacheEntry<T>>,
    hits: u64,
    misses: u64,
    last_cleanup: Option<DateTime<Utc>>,
}

/// TTL-bounded cache of paginated note listings, keyed by (user, page, sort).
///
/// Construct one per process and pass it around explicitly - no globals. It is
/// strictly per-process: if the host runs several workers, each holds its own
/// cache, and invalidation in one is invisible to the others. That staleness
/// is bounded by the TTL and is an accepted limitation, not a bug.
///
/// The mutex exists because the host runtime is multi-threaded tokio; every
/// operation is a synchronous lock-scoped map mutation, so no lock is ever
/// held across an await point.
///
/// Eviction policy at capacity: `set` runs a TTL sweep first; if every entry
/// is still fresh afterwards, the new entry is rejected. Deterministic and
/// boring on purpose - no LRU guesswork.
pub struct ListingCache<T> {
    inner: Mutex<CacheInner<T>>,
    ttl: Duration,
    max_entries: usize,
}

impl<T: Clone + HasNoteId> ListingCache<T> {
    pub fn new() -> Self {
        Self::with_config(CacheConfig::default())
    }

    pub fn with_config(config: CacheConfig) -> Self {
        Self {
            inner: Mutex::new(CacheInner {
                entries: HashMap::new(),
                hits: 0,
                misses: 0,
                last_cleanup: None,
            }),
            ttl: config.ttl,
            max_entries: config.max_entries,
        }
    }

    /// Look up a listing. Expired entries are removed on the spot and counted
    /// as misses - a stale listing is never served.
    pub fn get(&self, user_id: &str, page: u32, sort: &str) -> Option<CachedListing<T>> {
        let key = Self::key(user_id, page, sort);
        let mut inner = self.lock();

        let hit = match inner.entries.get(&key) {
            None => None,
            Some(entry) if entry.saved_at.elapsed() > self.ttl => {
                debug!("cache entry expired for {}/{}/{}", user_id, page, sort);
                None
            }
            Some(entry) => Some(CachedListing {
                notes: entry.notes.clone(),
                page_info: entry.page_info.clone(),
            }),
        };

        match hit {
            Some(listing) => {
                inner.hits += 1;
                debug!("cache hit for {}/{}/{}", user_id, page, sort);
                Some(listing)
            }
            None => {
                // Expired or absent either way: drop it and count a miss
                inner.entries.remove(&key);
                inner.misses += 1;
                None
            }
        }
    }

    /// Store a listing. Returns false when the cache is full of fresh entries
    /// and the insert was rejected; overwriting an existing key always works.
    pub fn set(
        &self,
        user_id: &str,
        page: u32,
        sort: &str,
        notes: Vec<T>,
        page_info: PageInfo,
    ) -> bool {
        let key = Self::key(user_id, page, sort);
        let mut inner = self.lock();

        if !inner.entries.contains_key(&key) && inner.entries.len() >= self.max_entries {
            Self::sweep(&mut inner, self.ttl);

            if inner.entries.len() >= self.max_entries {
                debug!(
                    "cache full ({} fresh entries), rejecting {}/{}/{}",
                    inner.entries.len(),
                    user_id,
                    page,
                    sort
                );
                return false;
            }
        }

        inner.entries.insert(
            key,
            CacheEntry {
                notes,
                page_info,
                saved_at: Instant::now(),
                owner: user_id.to_string(),
            },
        );
        true
    }

    /// Drop every listing owned by a user. Called after each successful write
    /// so the next read fetches fresh data. Unknown user is a no-op.
    pub fn invalidate_user(&self, user_id: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.owner != user_id);
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("invalidated {} cached listings for user {}", removed, user_id);
        }
        removed
    }

    /// Drop every listing that contains a given note. Useful when a write
    /// only knows the note id, not the owner.
    pub fn invalidate_note(&self, note_id: &str) -> usize {
        let mut inner = self.lock();
        let before = inner.entries.len();
        inner
            .entries
            .retain(|_, entry| !entry.notes.iter().any(|n| n.note_id() == note_id));
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("invalidated {} cached listings containing note {}", removed, note_id);
        }
        removed
    }

    /// TTL sweep across all owners. Runs lazily from `set` at capacity and
    /// periodically from the [`Sweeper`](crate::Sweeper) task.
    pub fn cleanup(&self) -> usize {
        let mut inner = self.lock();
        Self::sweep(&mut inner, self.ttl)
    }

    pub fn stats(&self) -> CacheStats {
        let inner = self.lock();
        let total = inner.hits + inner.misses;
        CacheStats {
            hits: inner.hits,
            misses: inner.misses,
            size: inner.entries.len(),
            last_cleanup: inner.last_cleanup,
            hit_rate: if total == 0 {
                0.0
            } else {
                inner.hits as f64 / total as f64
            },
        }
    }

    /// Drop everything and zero the counters. Cold-start/testing helper.
    pub fn clear(&self) {
        let mut inner = self.lock();
        inner.entries.clear();
        inner.hits = 0;
        inner.misses = 0;
        inner.last_cleanup = None;
    }

    fn sweep(inner: &mut CacheInner<T>, ttl: Duration) -> usize {
        let before = inner.entries.len();
        inner.entries.retain(|_, entry| entry.saved_at.elapsed() <= ttl);
        inner.last_cleanup = Some(Utc::now());
        let removed = before - inner.entries.len();
        if removed > 0 {
            debug!("cleanup removed {} expired listings", removed);
        }
        removed
    }

    fn key(user_id: &str, page: u32, sort: &str) -> CacheKey {
        CacheKey {
            user_id: user_id.to_string(),
            page,
            sort: sort.to_string(),
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, CacheInner<T>> {
        // A poisoned mutex means a panic mid-mutation; the map is still a
        // valid map, so keep serving rather than cascading the panic.
        match self.inner.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

impl<T: Clone + HasNoteId> Default for ListingCache<T> {
    fn default() -> Self {
        Self::new()
    }
}
