pub mod backend;
pub mod seen;

pub use backend::{open, FileStorage, MemoryStorage, RedisStorage, SeenStorage, SEEN_KEY};
pub use seen::SeenRegistry;
