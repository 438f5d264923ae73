pub mod fingerprint;
pub mod keyed;

pub use fingerprint::{CacheKey, CacheKeyGenerator};
pub use keyed::{CacheGroup, KeyedCache};
