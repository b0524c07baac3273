//! Cached Blockstore Composition
//!
//! Builds the layer stack `Bloom -> ARC -> store` from [`CacheOpts`],
//! leaving out disabled layers.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::info;

use super::arc_cached::ArcCached;
use super::bloom_cached::BloomCached;
use super::stats::{BloomStats, CacheStats};
use crate::block::{Block, Cid};
use crate::config::CacheOpts;
use crate::error::{BlockstoreError, Result};
use crate::store::{Blockstore, KeyStream};

/// Statistics of whichever layers are enabled.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct LayerStats {
    pub arc: Option<CacheStats>,
    pub bloom: Option<BloomStats>,
}

// == Cached Blockstore ==
/// A blockstore wrapped in its configured cache layers.
pub struct CachedBlockstore {
    outer: Arc<dyn Blockstore>,
    arc: Option<Arc<ArcCached>>,
    bloom: Option<Arc<BloomCached>>,
}

impl CachedBlockstore {
    /// The exact presence layer, when enabled.
    pub fn arc(&self) -> Option<&ArcCached> {
        self.arc.as_deref()
    }

    /// The bloom layer, when enabled. Waiting for warm-up goes through here.
    pub fn bloom(&self) -> Option<&BloomCached> {
        self.bloom.as_deref()
    }

    pub fn stats(&self) -> LayerStats {
        LayerStats {
            arc: self.arc.as_ref().map(|arc| arc.stats()),
            bloom: self.bloom.as_ref().map(|bloom| bloom.stats()),
        }
    }
}

/// Wraps `store` in the cache layers selected by `opts`.
///
/// # Errors
/// `InvalidConfig` when any option is negative, or from layer construction.
pub fn cached_blockstore(store: Arc<dyn Blockstore>, opts: &CacheOpts) -> Result<CachedBlockstore> {
    if opts.arc_cache_size < 0 || opts.bloom_filter_size < 0 || opts.bloom_filter_hashes < 0 {
        return Err(BlockstoreError::InvalidConfig(
            "all options for cache need to be greater than zero".to_string(),
        ));
    }

    let mut outer = store;

    let arc = if opts.has_arc() {
        let arc = Arc::new(ArcCached::new(outer, opts.arc_cache_size)?);
        outer = arc.clone();
        Some(arc)
    } else {
        None
    };

    let bloom = if opts.has_bloom() {
        let bloom = Arc::new(BloomCached::new(
            outer,
            opts.bloom_filter_size,
            opts.bloom_filter_hashes,
        )?);
        outer = bloom.clone();
        Some(bloom)
    } else {
        None
    };

    info!(
        "Cached blockstore built: arc={}, bloom={}",
        arc.is_some(),
        bloom.is_some()
    );

    Ok(CachedBlockstore { outer, arc, bloom })
}

#[async_trait]
impl Blockstore for CachedBlockstore {
    async fn put(&self, block: &Block) -> Result<()> {
        self.outer.put(block).await
    }

    async fn put_many(&self, blocks: &[Block]) -> Result<()> {
        self.outer.put_many(blocks).await
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        self.outer.get(cid).await
    }

    async fn has(&self, cid: &Cid) -> Result<bool> {
        self.outer.has(cid).await
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        self.outer.get_size(cid).await
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        self.outer.delete_block(cid).await
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        self.outer.all_keys().await
    }
}
