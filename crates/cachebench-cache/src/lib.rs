//! # Cachebench Cache
//!
//! Distributed cache gateway for cachebench.
//!
//! Every key is namespaced twice before it reaches the store: by the cached
//! type (`c:<type>`) and by the deployment-wide prefix (`k:<prefix>`). Values
//! are stored as JSON text. Batch writes go through one client-side pipeline.

mod error;
mod gateway;
pub mod keys;
mod memory_store;
mod options;
mod redis_store;
mod store;

pub use error::{CacheError, CacheOperation, CacheResult, StoreError, StoreResult};
pub use gateway::{CacheItem, DistributedCache};
pub use memory_store::InMemoryCacheStore;
pub use options::{CacheEntryOptions, Expiry};
pub use redis_store::{create_pool, RedisCacheStore, RedisCacheStoreParameters};
pub use store::CacheStore;
