//! ARC Cached Blockstore Module
//!
//! Blockstore layer answering presence and size queries from an
//! [`ArcCache`] and eliding writes of blocks already known to exist.

use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;
use tokio::sync::{RwLock, RwLockWriteGuard};
use tracing::{debug, info, warn};

use super::arc::{ArcCache, Lookup};
use super::stats::CacheStats;
use crate::block::{Block, Cid};
use crate::error::{BlockstoreError, Result};
use crate::store::{Blockstore, KeyStream};

/// Number of per-key lock stripes
const LOCK_STRIPES: usize = 256;

// == ARC Cached ==
/// Presence-caching layer over another blockstore.
///
/// Operations on the same identifier are serialised through one of 256
/// striped locks; the ARC mutex itself is only held for bookkeeping and
/// never across a backend call.
pub struct ArcCached {
    inner: Arc<dyn Blockstore>,
    cache: Mutex<ArcCache>,
    stripes: Vec<RwLock<()>>,
}

impl ArcCached {
    // == Constructor ==
    /// Wraps `inner` with a cache of `capacity` entries.
    ///
    /// A capacity of zero is valid and caches nothing.
    pub fn new(inner: Arc<dyn Blockstore>, capacity: i64) -> Result<Self> {
        let capacity = usize::try_from(capacity).map_err(|_| {
            BlockstoreError::InvalidConfig(format!(
                "arc cache size must not be negative, got {}",
                capacity
            ))
        })?;

        info!("ARC cache layer created with capacity {}", capacity);

        Ok(Self {
            inner,
            cache: Mutex::new(ArcCache::new(capacity)),
            stripes: (0..LOCK_STRIPES).map(|_| RwLock::new(())).collect(),
        })
    }

    // == Stats ==
    /// Returns a snapshot of the cache statistics.
    pub fn stats(&self) -> CacheStats {
        self.cache.lock().stats()
    }

    /// Number of resident cache entries.
    pub fn len(&self) -> usize {
        self.cache.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cache.lock().is_empty()
    }

    // -- Internal helpers --

    fn stripe_index(cid: &Cid) -> usize {
        cid.as_bytes().last().copied().unwrap_or(0) as usize
    }

    fn stripe(&self, cid: &Cid) -> &RwLock<()> {
        &self.stripes[Self::stripe_index(cid)]
    }

    fn lookup(&self, cid: &Cid) -> Lookup {
        self.cache.lock().lookup(cid)
    }

    fn record_present(&self, cid: &Cid, size: Option<usize>) {
        self.cache.lock().record_present(cid, size);
    }

    fn record_absent(&self, cid: &Cid) {
        self.cache.lock().record_absent(cid);
    }

    /// Stores the backend's answer for `cid`, leaving the cache untouched on
    /// errors other than `NotFound`.
    fn record_result<T>(&self, cid: &Cid, result: &Result<T>, size: impl FnOnce(&T) -> usize) {
        match result {
            Ok(value) => self.record_present(cid, Some(size(value))),
            Err(e) if e.is_not_found() => self.record_absent(cid),
            Err(_) => {}
        }
    }
}

#[async_trait]
impl Blockstore for ArcCached {
    async fn put(&self, block: &Block) -> Result<()> {
        let cid = block.cid();
        if !cid.is_defined() {
            warn!("Refusing to cache a block with an undefined identifier");
            return self.inner.put(block).await;
        }

        if let Lookup::Present(_) = self.lookup(cid) {
            debug!("Elided write of {}", cid);
            return Ok(());
        }

        let _guard = self.stripe(cid).write().await;
        self.inner.put(block).await?;
        self.record_present(cid, Some(block.len()));
        Ok(())
    }

    async fn put_many(&self, blocks: &[Block]) -> Result<()> {
        let mut seen = HashSet::with_capacity(blocks.len());
        let mut to_write = Vec::with_capacity(blocks.len());
        for block in blocks {
            if !seen.insert(block.cid().clone()) {
                continue;
            }
            let cached = block.cid().is_defined()
                && matches!(self.lookup(block.cid()), Lookup::Present(_));
            if !cached {
                to_write.push(block.clone());
            }
        }

        if to_write.is_empty() {
            debug!("Elided batch of {} blocks", blocks.len());
            return Ok(());
        }

        // Ascending stripe order keeps concurrent batches deadlock free
        let stripe_ids: BTreeSet<usize> = to_write
            .iter()
            .map(|block| Self::stripe_index(block.cid()))
            .collect();
        let mut guards: Vec<RwLockWriteGuard<'_, ()>> = Vec::with_capacity(stripe_ids.len());
        for idx in stripe_ids {
            guards.push(self.stripes[idx].write().await);
        }

        self.inner.put_many(&to_write).await?;

        let mut cache = self.cache.lock();
        for block in to_write.iter().filter(|b| b.cid().is_defined()) {
            cache.record_present(block.cid(), Some(block.len()));
        }
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        if !cid.is_defined() {
            warn!("Get called with an undefined identifier");
            return Err(BlockstoreError::NotFound(cid.clone()));
        }

        if let Lookup::Absent = self.lookup(cid) {
            return Err(BlockstoreError::NotFound(cid.clone()));
        }

        let _guard = self.stripe(cid).read().await;
        let result = self.inner.get(cid).await;
        self.record_result(cid, &result, Block::len);
        result
    }

    async fn has(&self, cid: &Cid) -> Result<bool> {
        if !cid.is_defined() {
            warn!("Has called with an undefined identifier");
            return Ok(false);
        }

        match self.lookup(cid) {
            Lookup::Present(_) => return Ok(true),
            Lookup::Absent => return Ok(false),
            Lookup::Unknown => {}
        }

        let _guard = self.stripe(cid).read().await;
        let has = self.inner.has(cid).await?;
        if has {
            self.record_present(cid, None);
        } else {
            self.record_absent(cid);
        }
        Ok(has)
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        if !cid.is_defined() {
            warn!("GetSize called with an undefined identifier");
            return Err(BlockstoreError::NotFound(cid.clone()));
        }

        match self.lookup(cid) {
            Lookup::Present(Some(size)) => return Ok(size),
            Lookup::Absent => return Err(BlockstoreError::NotFound(cid.clone())),
            Lookup::Present(None) | Lookup::Unknown => {}
        }

        let _guard = self.stripe(cid).read().await;
        let result = self.inner.get_size(cid).await;
        self.record_result(cid, &result, |size| *size);
        result
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        if !cid.is_defined() {
            return Ok(());
        }

        let _guard = self.stripe(cid).write().await;
        let result = match self.inner.delete_block(cid).await {
            Err(e) if e.is_not_found() => Ok(()),
            other => other,
        };
        self.cache.lock().remove(cid);
        result
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        self.inner.all_keys().await
    }
}
