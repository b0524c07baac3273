//! blockcache - Caching layers for content-addressed block stores
//!
//! Wraps a block store in an adaptive replacement cache of presence and
//! sizes and a bloom filter of absence, and serves the result over HTTP.

pub mod api;
pub mod block;
pub mod cache;
pub mod config;
pub mod error;
pub mod models;
pub mod store;
pub mod tasks;

pub use api::AppState;
pub use block::{Block, Cid};
pub use cache::{cached_blockstore, ArcCached, BloomCached, CachedBlockstore};
pub use config::{CacheOpts, Config};
pub use error::{BlockstoreError, Result};
pub use store::{Blockstore, MemoryBlockstore};
