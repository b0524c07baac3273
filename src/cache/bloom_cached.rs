//! Bloom Cached Blockstore Module
//!
//! Blockstore layer that rejects reads of blocks a bloom filter proves were
//! never stored. The filter is seeded in the background from the backing
//! store and stays inactive until that finishes.

use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::bloom::{BloomFilter, Membership};
use super::stats::BloomStats;
use crate::block::{Block, Cid};
use crate::error::{BlockstoreError, Result};
use crate::store::{Blockstore, KeyStream};
use crate::tasks::{spawn_bloom_warmup, BuildState};

// == Bloom Cached ==
/// Absence-filtering layer over another blockstore.
pub struct BloomCached {
    inner: Arc<dyn Blockstore>,
    filter: Arc<BloomFilter>,
    state: watch::Receiver<BuildState>,
    warmup: JoinHandle<()>,
    hits: AtomicU64,
    total: AtomicU64,
}

impl BloomCached {
    // == Constructor ==
    /// Wraps `inner` with a filter sized for `capacity` keys and `hashes`
    /// probes, and starts warming it up.
    ///
    /// # Errors
    /// `InvalidConfig` when either parameter is not positive or when called
    /// outside a Tokio runtime.
    pub fn new(inner: Arc<dyn Blockstore>, capacity: i64, hashes: i64) -> Result<Self> {
        if capacity <= 0 || hashes <= 0 {
            return Err(BlockstoreError::InvalidConfig(format!(
                "bloom filter size and hash count must be positive, got {} and {}",
                capacity, hashes
            )));
        }
        let capacity = usize::try_from(capacity)
            .map_err(|e| BlockstoreError::InvalidConfig(e.to_string()))?;
        let hashes =
            u32::try_from(hashes).map_err(|e| BlockstoreError::InvalidConfig(e.to_string()))?;

        tokio::runtime::Handle::try_current().map_err(|e| {
            BlockstoreError::InvalidConfig(format!("bloom warm-up needs a tokio runtime: {}", e))
        })?;

        let filter = Arc::new(BloomFilter::new(capacity, hashes)?);
        let (tx, rx) = watch::channel(BuildState::Building);
        let warmup = spawn_bloom_warmup(inner.clone(), filter.clone(), tx);

        info!(
            "Bloom filter layer created for {} keys with {} hashes",
            capacity, hashes
        );

        Ok(Self {
            inner,
            filter,
            state: rx,
            warmup,
            hits: AtomicU64::new(0),
            total: AtomicU64::new(0),
        })
    }

    // == Wait ==
    /// Waits up to `timeout` for warm-up to finish.
    pub async fn wait(&self, timeout: Duration) -> Result<()> {
        self.wait_or(tokio::time::sleep(timeout)).await
    }

    /// Waits until `deadline` for warm-up to finish.
    pub async fn wait_until(&self, deadline: Instant) -> Result<()> {
        self.wait_or(tokio::time::sleep_until(deadline)).await
    }

    /// Waits for warm-up to finish or for `token` to be cancelled.
    pub async fn wait_cancelled(&self, token: &CancellationToken) -> Result<()> {
        self.wait_or(token.cancelled()).await
    }

    /// Resolves with the warm-up outcome, or `DeadlineExceeded` carrying the
    /// number of keys added so far if `expired` completes first. A finished
    /// warm-up wins over an expiry observed at the same time. Expiry does not
    /// stop the warm-up.
    async fn wait_or<F: Future<Output = ()>>(&self, expired: F) -> Result<()> {
        let mut state = self.state.clone();
        let finished = async move {
            state
                .wait_for(BuildState::is_finished)
                .await
                .map(|state| (*state).clone())
        };

        tokio::select! {
            biased;

            outcome = finished => match outcome {
                Ok(BuildState::Failed(e)) => Err(e),
                Ok(_) => Ok(()),
                Err(_) => Err(BlockstoreError::Backend(
                    "bloom warm-up ended without reporting".to_string(),
                )),
            },
            _ = expired => {
                let added = self.filter.elements_added();
                warn!("Bloom filter not ready before deadline, {} keys added", added);
                Err(BlockstoreError::DeadlineExceeded { added })
            }
        }
    }

    // == Introspection ==
    /// True once warm-up has completed successfully.
    pub fn is_ready(&self) -> bool {
        matches!(*self.state.borrow(), BuildState::Ready)
    }

    /// Returns a snapshot of the filter statistics.
    pub fn stats(&self) -> BloomStats {
        BloomStats {
            hits: self.hits.load(Ordering::Relaxed),
            total: self.total.load(Ordering::Relaxed),
            elements_added: self.filter.elements_added(),
            bits: self.filter.bit_len(),
            hashes: self.filter.hash_count(),
            ready: self.is_ready(),
        }
    }

    /// True when `cid` can be answered as absent without the backing store.
    fn definitely_absent(&self, cid: &Cid) -> bool {
        if !cid.is_defined() {
            warn!("Query with an undefined identifier");
            return true;
        }
        if !self.is_ready() {
            return false;
        }

        self.total.fetch_add(1, Ordering::Relaxed);
        if self.filter.test(cid) == Membership::DefinitelyAbsent {
            self.hits.fetch_add(1, Ordering::Relaxed);
            debug!("Bloom filter short-circuited {}", cid);
            true
        } else {
            false
        }
    }
}

impl Drop for BloomCached {
    fn drop(&mut self) {
        self.warmup.abort();
    }
}

#[async_trait]
impl Blockstore for BloomCached {
    async fn put(&self, block: &Block) -> Result<()> {
        self.filter.add(block.cid());
        self.inner.put(block).await
    }

    async fn put_many(&self, blocks: &[Block]) -> Result<()> {
        for block in blocks {
            self.filter.add(block.cid());
        }
        self.inner.put_many(blocks).await
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        if self.definitely_absent(cid) {
            return Err(BlockstoreError::NotFound(cid.clone()));
        }
        self.inner.get(cid).await
    }

    async fn has(&self, cid: &Cid) -> Result<bool> {
        if self.definitely_absent(cid) {
            return Ok(false);
        }
        self.inner.has(cid).await
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        if self.definitely_absent(cid) {
            return Err(BlockstoreError::NotFound(cid.clone()));
        }
        self.inner.get_size(cid).await
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        if !cid.is_defined() {
            return Ok(());
        }
        self.inner.delete_block(cid).await
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        self.inner.all_keys().await
    }
}
