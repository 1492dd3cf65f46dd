//! Named response caches.
//!
//! A cache store holds any number of named caches, each mapping a request
//! identity (method + URL) to a response snapshot:
//! - last write wins, there is no versioning or TTL
//! - whole caches are deleted by name when a new deployment activates
//! - backends: SQLite for persistence, an in-memory map for tests

mod memory;
mod storage;
mod traits;

pub use memory::MemoryStorage;
pub use storage::SqliteStorage;
pub use traits::{CacheStore, CachedResponse};
