//! Integration Tests for the Bloom Layer
//!
//! Covers warm-up, short-circuiting of absent blocks, and bounded waiting.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::stream::{self, StreamExt};
use tokio::sync::Notify;
use tokio::time::Instant;

use blockcache::store::KeyStream;
use blockcache::{
    cached_blockstore, Block, BloomCached, Blockstore, BlockstoreError, CacheOpts,
    CachedBlockstore, Cid, MemoryBlockstore, Result,
};

// == Helper Functions ==

fn bloom_opts() -> CacheOpts {
    CacheOpts {
        arc_cache_size: 0,
        ..CacheOpts::default()
    }
}

async fn ready_bloom(backend: Arc<MemoryBlockstore>) -> CachedBlockstore {
    let cached = cached_blockstore(backend, &bloom_opts()).unwrap();
    let bloom = cached.bloom().unwrap();
    if let Err(e) = bloom.wait(Duration::from_secs(1)).await {
        panic!(
            "filter failed to build ({} elements added): {}",
            bloom.stats().elements_added,
            e
        );
    }
    cached
}

/// Store whose key scan lists a few keys and then never finishes.
struct StalledScan {
    keys: Vec<Cid>,
}

#[async_trait]
impl Blockstore for StalledScan {
    async fn put(&self, _: &Block) -> Result<()> {
        Ok(())
    }

    async fn put_many(&self, _: &[Block]) -> Result<()> {
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        Err(BlockstoreError::NotFound(cid.clone()))
    }

    async fn has(&self, _: &Cid) -> Result<bool> {
        Ok(false)
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        Err(BlockstoreError::NotFound(cid.clone()))
    }

    async fn delete_block(&self, _: &Cid) -> Result<()> {
        Ok(())
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        let keys = self.keys.clone().into_iter().map(Ok);
        Ok(stream::iter(keys).chain(stream::pending()).boxed())
    }
}

/// Memory store whose key scan snapshots the keys, signals `scanned`, and
/// then holds the snapshot until `release` is notified.
#[derive(Default)]
struct GatedScan {
    inner: MemoryBlockstore,
    scanned: Notify,
    release: Notify,
}

#[async_trait]
impl Blockstore for GatedScan {
    async fn put(&self, block: &Block) -> Result<()> {
        self.inner.put(block).await
    }

    async fn put_many(&self, blocks: &[Block]) -> Result<()> {
        self.inner.put_many(blocks).await
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        self.inner.get(cid).await
    }

    async fn has(&self, cid: &Cid) -> Result<bool> {
        self.inner.has(cid).await
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        self.inner.get_size(cid).await
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        self.inner.delete_block(cid).await
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        let keys = self.inner.all_keys().await?;
        self.scanned.notify_one();
        self.release.notified().await;
        Ok(keys)
    }
}

// == Writes ==

#[tokio::test]
async fn test_put_many_adds_to_bloom() {
    let cached = ready_bloom(Arc::new(MemoryBlockstore::new())).await;

    let block1 = Block::new(&b"foo"[..]);
    let block2 = Block::new(&b"bar"[..]);
    let empty_block = Block::new(&b""[..]);

    cached
        .put_many(&[block1.clone(), empty_block.clone()])
        .await
        .unwrap();

    assert!(cached.has(block1.cid()).await.unwrap());
    assert_eq!(cached.get_size(block1.cid()).await.unwrap(), 3);

    assert!(!cached.has(block2.cid()).await.unwrap());
    assert!(cached.get_size(block2.cid()).await.unwrap_err().is_not_found());

    assert!(cached.has(empty_block.cid()).await.unwrap());
    assert_eq!(cached.get_size(empty_block.cid()).await.unwrap(), 0);
}

#[tokio::test]
async fn test_returns_error_when_size_negative() {
    let backend = Arc::new(MemoryBlockstore::new());
    let result = BloomCached::new(backend, -1, 1);
    assert!(matches!(result, Err(BlockstoreError::InvalidConfig(_))));
}

// == Short-circuiting ==

#[tokio::test]
async fn test_has_is_bloom_cached() {
    let backend = Arc::new(MemoryBlockstore::new());
    for i in 0..1000 {
        backend
            .put(&Block::new(format!("data: {}", i)))
            .await
            .unwrap();
    }
    let cached = ready_bloom(backend.clone()).await;
    assert_eq!(cached.bloom().unwrap().stats().elements_added, 1000);

    let before = backend.calls();
    for i in 0..1000 {
        let cid = Block::new(format!("data: {}", i + 2000)).cid().clone();
        assert!(!cached.has(&cid).await.unwrap());
    }
    let cache_fails = backend.calls() - before;
    assert!(
        cache_fails as f64 / 1000.0 <= 0.05,
        "bloom filter has a miss rate of {} per 1000",
        cache_fails
    );

    let block = Block::new(&b"newBlock"[..]);

    let before = backend.calls();
    cached.put_many(&[block.clone()]).await.unwrap();
    assert_eq!(backend.calls() - before, 1, "expected one backend write");

    cached.put(&block).await.unwrap();
    assert_eq!(backend.calls() - before, 2, "expected a second backend write");

    assert!(cached.has(block.cid()).await.unwrap());
    assert_eq!(cached.get(block.cid()).await.unwrap(), block);
}

#[tokio::test]
async fn test_puts_during_warmup_are_kept() {
    let backend = Arc::new(GatedScan::default());
    let existing = Block::new(&b"stored before start"[..]);
    backend.put(&existing).await.unwrap();

    let cached = BloomCached::new(backend.clone(), 1000, 7).unwrap();
    backend.scanned.notified().await;

    // The scan snapshot is already taken, so only the write path can add these
    let single = Block::new(&b"written mid warm-up"[..]);
    let batch = [Block::new(&b"batch one"[..]), Block::new(&b"batch two"[..])];
    assert!(!cached.is_ready());
    cached.put(&single).await.unwrap();
    cached.put_many(&batch).await.unwrap();
    assert!(!cached.is_ready());

    backend.release.notify_one();
    cached.wait(Duration::from_secs(5)).await.unwrap();
    assert!(cached.is_ready());

    for block in [&existing, &single, &batch[0], &batch[1]] {
        assert!(cached.has(block.cid()).await.unwrap(), "{} lost", block.cid());
        assert_eq!(cached.get(block.cid()).await.unwrap(), *block);
    }
    let stats = cached.stats();
    assert_eq!(stats.total, 8);
    assert_eq!(stats.hits, 0, "filter rejected a stored block");
    assert_eq!(stats.elements_added, 4);
}

#[tokio::test]
async fn test_filter_inactive_until_ready() {
    let backend = Arc::new(StalledScan { keys: vec![] });
    let cached = BloomCached::new(backend, 1000, 7).unwrap();

    assert!(!cached.is_ready());
    assert!(!cached.has(&Cid::of(b"anything")).await.unwrap());
    assert_eq!(cached.stats().total, 0, "inactive filter answered a query");
}

#[tokio::test]
async fn test_deletes_are_not_reflected() {
    let backend = Arc::new(MemoryBlockstore::new());
    let cached = ready_bloom(backend.clone()).await;
    let block = Block::new(&b"short lived"[..]);

    cached.put(&block).await.unwrap();
    cached.delete_block(block.cid()).await.unwrap();

    let before = backend.stats().has;
    assert!(!cached.has(block.cid()).await.unwrap());
    assert_eq!(backend.stats().has, before + 1);
}

// == Waiting ==

#[tokio::test]
async fn test_wait_deadline_reports_partial_count() {
    let keys: Vec<Cid> = (0..10).map(|i| Cid::of(format!("stalled {i}").as_bytes())).collect();
    let backend = Arc::new(StalledScan { keys });
    let cached = BloomCached::new(backend, 1000, 7).unwrap();

    let result = cached.wait(Duration::from_millis(50)).await;

    assert_eq!(result, Err(BlockstoreError::DeadlineExceeded { added: 10 }));
    assert!(!cached.is_ready());
}

#[tokio::test]
async fn test_wait_until_past_deadline() {
    let backend = Arc::new(StalledScan { keys: vec![] });
    let cached = BloomCached::new(backend, 1000, 7).unwrap();

    let result = cached.wait_until(Instant::now()).await;
    assert!(matches!(result, Err(BlockstoreError::DeadlineExceeded { .. })));
}

#[tokio::test]
async fn test_wait_after_ready_is_immediate() {
    let cached = ready_bloom(Arc::new(MemoryBlockstore::new())).await;
    let bloom = cached.bloom().unwrap();

    assert!(bloom.is_ready());
    bloom.wait(Duration::from_millis(1)).await.unwrap();
    bloom.wait_until(Instant::now() + Duration::from_millis(1)).await.unwrap();
}

#[tokio::test]
async fn test_ready_filter_wins_over_expired_deadline() {
    let cached = ready_bloom(Arc::new(MemoryBlockstore::new())).await;
    let bloom = cached.bloom().unwrap();

    for _ in 0..64 {
        assert_eq!(bloom.wait(Duration::ZERO).await, Ok(()));
        assert_eq!(bloom.wait_until(Instant::now()).await, Ok(()));
    }
}
