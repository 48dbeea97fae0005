//! Bounded memoization of per-word region posteriors.

pub mod lru;
pub mod region;

pub use lru::LruCache;
pub use region::{RegionDistCache, RegionPosterior};
