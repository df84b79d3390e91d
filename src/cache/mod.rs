//! Entity cache.
//!
//! Memoizes lookups of remote entities so repeated runs do not pay a
//! network round-trip per lookup.
//!
//! ```text
//! ensure_assistant ──► EntityCache::ensure ──► CacheBackend (memory, file)
//!                              │ miss / force
//!                              ▼
//!                       find_assistant ──► AssistantDirectory
//! ```

mod assistant;
mod backend;
mod entity;
mod error;

pub use assistant::{
    assistant_cache_key, ensure_assistant, find_assistant, DEFAULT_ASSISTANT_TTL,
};
pub use backend::{CacheBackend, CacheEntry, FileCache, MemoryCache};
pub use entity::EntityCache;
pub use error::{CacheError, CacheErrorKind};
