//! Block Store Module
//!
//! The store contract shared by backing stores and every cache layer.

mod memory;

use async_trait::async_trait;
use futures::stream::BoxStream;

use crate::block::{Block, Cid};
use crate::error::Result;

pub use memory::{BackendStats, MemoryBlockstore};

/// Stream of every identifier held by a store.
pub type KeyStream = BoxStream<'static, Result<Cid>>;

/// Content-addressed block storage.
///
/// Implemented by backing stores and by the cache layers wrapping them, so
/// layers compose by holding the next store as an owned dependency.
#[async_trait]
pub trait Blockstore: Send + Sync {
    /// Stores a block.
    async fn put(&self, block: &Block) -> Result<()>;

    /// Stores a batch of blocks in one write.
    async fn put_many(&self, blocks: &[Block]) -> Result<()>;

    /// Fetches a block, failing with `NotFound` when absent.
    async fn get(&self, cid: &Cid) -> Result<Block>;

    /// Reports whether a block exists.
    async fn has(&self, cid: &Cid) -> Result<bool>;

    /// Size of a block in bytes, failing with `NotFound` when absent.
    async fn get_size(&self, cid: &Cid) -> Result<usize>;

    /// Deletes a block.
    async fn delete_block(&self, cid: &Cid) -> Result<()>;

    /// Enumerates every stored identifier.
    async fn all_keys(&self) -> Result<KeyStream>;
}
