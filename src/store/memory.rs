//! In-Memory Block Store
//!
//! DashMap-backed store with per-operation call counters.

use std::sync::atomic::{AtomicU64, Ordering};

use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use futures::stream::{self, StreamExt};
use serde::Serialize;

use super::{Blockstore, KeyStream};
use crate::block::{Block, Cid};
use crate::error::{BlockstoreError, Result};

/// Number of calls received per store operation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BackendStats {
    pub puts: u64,
    pub put_batches: u64,
    pub gets: u64,
    pub has: u64,
    pub get_sizes: u64,
    pub deletes: u64,
    pub scans: u64,
    /// Blocks currently stored
    pub block_count: usize,
}

impl BackendStats {
    /// Total calls of any kind.
    pub fn calls(&self) -> u64 {
        self.puts + self.put_batches + self.gets + self.has + self.get_sizes + self.deletes + self.scans
    }

    /// Calls that wrote blocks.
    pub fn writes(&self) -> u64 {
        self.puts + self.put_batches
    }
}

/// In-memory backing store.
/// Uses DashMap for sharded concurrent access instead of a single lock.
#[derive(Default)]
pub struct MemoryBlockstore {
    blocks: DashMap<Cid, Bytes>,
    puts: AtomicU64,
    put_batches: AtomicU64,
    gets: AtomicU64,
    has: AtomicU64,
    get_sizes: AtomicU64,
    deletes: AtomicU64,
    scans: AtomicU64,
}

impl MemoryBlockstore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of the call counters.
    pub fn stats(&self) -> BackendStats {
        BackendStats {
            puts: self.puts.load(Ordering::Relaxed),
            put_batches: self.put_batches.load(Ordering::Relaxed),
            gets: self.gets.load(Ordering::Relaxed),
            has: self.has.load(Ordering::Relaxed),
            get_sizes: self.get_sizes.load(Ordering::Relaxed),
            deletes: self.deletes.load(Ordering::Relaxed),
            scans: self.scans.load(Ordering::Relaxed),
            block_count: self.blocks.len(),
        }
    }

    /// Total calls received so far.
    pub fn calls(&self) -> u64 {
        self.stats().calls()
    }

    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

#[async_trait]
impl Blockstore for MemoryBlockstore {
    async fn put(&self, block: &Block) -> Result<()> {
        self.puts.fetch_add(1, Ordering::Relaxed);
        self.blocks.insert(block.cid().clone(), block.data().clone());
        Ok(())
    }

    async fn put_many(&self, blocks: &[Block]) -> Result<()> {
        self.put_batches.fetch_add(1, Ordering::Relaxed);
        for block in blocks {
            self.blocks.insert(block.cid().clone(), block.data().clone());
        }
        Ok(())
    }

    async fn get(&self, cid: &Cid) -> Result<Block> {
        self.gets.fetch_add(1, Ordering::Relaxed);
        self.blocks
            .get(cid)
            .map(|data| Block::with_cid(data.value().clone(), cid.clone()))
            .ok_or_else(|| BlockstoreError::NotFound(cid.clone()))
    }

    async fn has(&self, cid: &Cid) -> Result<bool> {
        self.has.fetch_add(1, Ordering::Relaxed);
        Ok(self.blocks.contains_key(cid))
    }

    async fn get_size(&self, cid: &Cid) -> Result<usize> {
        self.get_sizes.fetch_add(1, Ordering::Relaxed);
        self.blocks
            .get(cid)
            .map(|data| data.len())
            .ok_or_else(|| BlockstoreError::NotFound(cid.clone()))
    }

    async fn delete_block(&self, cid: &Cid) -> Result<()> {
        self.deletes.fetch_add(1, Ordering::Relaxed);
        self.blocks.remove(cid);
        Ok(())
    }

    async fn all_keys(&self) -> Result<KeyStream> {
        self.scans.fetch_add(1, Ordering::Relaxed);
        let keys: Vec<Cid> = self.blocks.iter().map(|entry| entry.key().clone()).collect();
        Ok(stream::iter(keys.into_iter().map(Ok)).boxed())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_get_roundtrip() {
        let store = MemoryBlockstore::new();
        let block = Block::new(&b"foo"[..]);

        store.put(&block).await.unwrap();

        assert_eq!(store.get(block.cid()).await.unwrap(), block);
        assert!(store.has(block.cid()).await.unwrap());
        assert_eq!(store.get_size(block.cid()).await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_missing_block() {
        let store = MemoryBlockstore::new();
        let cid = Cid::of(b"missing");

        assert!(!store.has(&cid).await.unwrap());
        assert!(store.get(&cid).await.unwrap_err().is_not_found());
        assert!(store.get_size(&cid).await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_delete_is_idempotent() {
        let store = MemoryBlockstore::new();
        let block = Block::new(&b"foo"[..]);
        store.put(&block).await.unwrap();

        store.delete_block(block.cid()).await.unwrap();
        store.delete_block(block.cid()).await.unwrap();

        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_all_keys_lists_everything() {
        let store = MemoryBlockstore::new();
        let blocks: Vec<Block> = (0..10).map(|i| Block::new(format!("data {i}"))).collect();
        store.put_many(&blocks).await.unwrap();

        let keys: Vec<Cid> = store
            .all_keys()
            .await
            .unwrap()
            .map(|cid| cid.unwrap())
            .collect()
            .await;

        assert_eq!(keys.len(), 10);
        for block in &blocks {
            assert!(keys.contains(block.cid()));
        }
    }

    #[tokio::test]
    async fn test_call_counters() {
        let store = MemoryBlockstore::new();
        let block = Block::new(&b"foo"[..]);

        store.put(&block).await.unwrap();
        store.put_many(&[block.clone()]).await.unwrap();
        let _ = store.get(block.cid()).await;
        let _ = store.has(block.cid()).await;
        let _ = store.get_size(block.cid()).await;
        store.delete_block(block.cid()).await.unwrap();

        let stats = store.stats();
        assert_eq!(stats.puts, 1);
        assert_eq!(stats.put_batches, 1);
        assert_eq!(stats.writes(), 2);
        assert_eq!(stats.calls(), 6);
        assert_eq!(stats.block_count, 0);
    }
}
