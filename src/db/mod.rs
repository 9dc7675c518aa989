pub mod library_store;
pub mod redis;

pub use library_store::{InMemoryLibraryStore, LibraryStore, RedisLibraryStore};
pub use self::redis::create_redis_client;
pub use self::redis::Cache;
pub use self::redis::CacheKey;
pub use self::redis::CacheWriterHandle;
