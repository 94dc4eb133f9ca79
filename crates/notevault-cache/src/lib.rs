// In-memory caching layer for note listings
// Keeps storage round-trips down for repeated paginated reads

pub mod cache;
pub mod sweeper;

pub use cache::{CacheConfig, CacheStats, CachedListing, HasNoteId, ListingCache, PageInfo};
pub use sweeper::Sweeper;
