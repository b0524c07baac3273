//! Cache Module
//!
//! Blockstore cache layers: an adaptive replacement cache of presence and
//! size, a bloom filter of absence, and the composition of both.

mod arc;
mod arc_cached;
mod bloom;
mod bloom_cached;
mod cached;
mod list;
mod stats;


// Re-export public types
pub use arc::{ArcCache, Lookup};
pub use arc_cached::ArcCached;
pub use bloom::{BloomFilter, Membership};
pub use bloom_cached::BloomCached;
pub use cached::{cached_blockstore, CachedBlockstore, LayerStats};
pub use stats::{BloomStats, CacheStats};
