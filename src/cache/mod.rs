// Cache module - two-tier derived-content cache
//
// Provides:
// - deterministic cache key construction for image variants and recipes
// - the CacheStore capability with interchangeable backends
// - an in-process TTL map backend and a shared SQLite-table backend

pub mod key;
pub mod memory;
pub mod sqlite;
pub mod store;

pub use key::ImageOwnerKind;
pub use memory::{CacheCleanupTask, MemoryCacheStore};
pub use sqlite::SqliteCacheStore;
pub use store::CacheStore;
