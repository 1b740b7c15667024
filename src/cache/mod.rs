//! Read-through cache for catalog reads.
//!
//! Services consult the cache before the store for single-entity reads and for
//! default-window collection reads, and drop the keys produced by [`policy`] after
//! every committed write:
//!
//! ```toml
//! [cache]
//! enabled = true
//! capacity = 1024
//! ttl_seconds = 3600
//! ```

mod client;
mod config;
mod keys;
mod lock;
pub mod policy;
mod store;

pub use client::{CacheClient, Generation};
pub use config::CacheConfig;
pub use keys::CacheKey;
pub use policy::{Invalidations, Mutation, Operation, keys_for};
pub use store::{CacheError, CacheGateway, MemoryCache};
