//! Bloom Warm-up Task
//!
//! Background task that seeds a bloom filter with every key of a store.

use std::sync::Arc;

use futures::StreamExt;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tracing::{debug, error, info};

use crate::cache::BloomFilter;
use crate::error::BlockstoreError;
use crate::store::Blockstore;

/// Keys added between scheduler yields
const YIELD_EVERY: u64 = 1024;

// == Build State ==
/// Progress of a filter warm-up, published through a watch channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildState {
    Building,
    Ready,
    Failed(BlockstoreError),
}

impl BuildState {
    /// True once the task has stopped, successfully or not.
    pub fn is_finished(&self) -> bool {
        !matches!(self, BuildState::Building)
    }
}

/// Spawns the task that enumerates `store` and adds each key to `filter`.
///
/// The final state is sent on `state` when enumeration ends. Keys written
/// while the task runs are added by the caller and may be added twice, which
/// is harmless.
///
/// # Returns
/// A JoinHandle for the spawned task, which the owner aborts when dropped.
///
/// # Example
/// ```ignore
/// let (tx, rx) = tokio::sync::watch::channel(BuildState::Building);
/// let handle = spawn_bloom_warmup(store, filter.clone(), tx);
/// ```
pub fn spawn_bloom_warmup(
    store: Arc<dyn Blockstore>,
    filter: Arc<BloomFilter>,
    state: watch::Sender<BuildState>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        info!(
            "Starting bloom filter warm-up ({} bits, {} hashes)",
            filter.bit_len(),
            filter.hash_count()
        );

        let outcome = seed_filter(store.as_ref(), &filter).await;

        match outcome {
            Ok(count) => {
                info!("Bloom filter warm-up complete: {} keys", count);
                state.send_replace(BuildState::Ready);
            }
            Err(e) => {
                error!("Bloom filter warm-up failed: {}", e);
                state.send_replace(BuildState::Failed(e));
            }
        }
    })
}

async fn seed_filter(store: &dyn Blockstore, filter: &BloomFilter) -> Result<u64, BlockstoreError> {
    let mut keys = store.all_keys().await?;
    let mut count = 0u64;

    while let Some(cid) = keys.next().await {
        filter.add(&cid?);
        count += 1;
        if count % YIELD_EVERY == 0 {
            debug!("Bloom filter warm-up: {} keys so far", count);
            tokio::task::yield_now().await;
        }
    }
    Ok(count)
}
