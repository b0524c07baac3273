//! API Handlers
//!
//! HTTP request handlers for each block cache endpoint.

use std::sync::Arc;

use axum::{
    body::Bytes,
    extract::{Path, State},
    http::header,
    response::IntoResponse,
    Json,
};
use tracing::debug;

use crate::block::{Block, Cid};
use crate::cache::{cached_blockstore, CachedBlockstore};
use crate::config::Config;
use crate::error::{BlockstoreError, Result};
use crate::models::{
    BatchPutRequest, BatchPutResponse, DeleteResponse, HasResponse, HealthResponse, PutResponse,
    SizeResponse, StatsResponse,
};
use crate::store::{Blockstore, MemoryBlockstore};

/// Application state shared across all handlers.
///
/// The cached store is internally synchronised, so handlers share it through
/// a plain Arc.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<CachedBlockstore>,
}

impl AppState {
    /// Creates a new AppState around an already built store.
    pub fn new(store: CachedBlockstore) -> Self {
        Self {
            store: Arc::new(store),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// Wraps an in-memory backing store in the configured cache layers;
    /// must run inside a Tokio runtime when the bloom layer is enabled.
    pub fn from_config(config: &Config) -> Result<Self> {
        let backend: Arc<dyn Blockstore> = Arc::new(MemoryBlockstore::new());
        Ok(Self::new(cached_blockstore(backend, &config.cache)?))
    }
}

fn parse_cid(raw: &str) -> Result<Cid> {
    raw.parse()
}

/// Handler for PUT /blocks
///
/// Stores the raw request body as one block.
pub async fn put_block_handler(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<PutResponse>> {
    let block = Block::new(body);
    state.store.put(&block).await?;

    debug!("Stored block {} ({} bytes)", block.cid(), block.len());
    Ok(Json(PutResponse::new(block.cid(), block.len())))
}

/// Handler for POST /blocks/batch
///
/// Stores a batch of UTF-8 payloads in one write.
pub async fn put_batch_handler(
    State(state): State<AppState>,
    Json(req): Json<BatchPutRequest>,
) -> Result<Json<BatchPutResponse>> {
    // Validate request
    if let Some(error_msg) = req.validate() {
        return Err(BlockstoreError::InvalidRequest(error_msg));
    }

    let blocks = req.into_blocks();
    state.store.put_many(&blocks).await?;

    Ok(Json(BatchPutResponse::new(blocks.iter().map(Block::cid))))
}

/// Handler for GET /blocks/:cid
///
/// Returns the raw block bytes.
pub async fn get_block_handler(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<impl IntoResponse> {
    let cid = parse_cid(&cid)?;
    let block = state.store.get(&cid).await?;

    Ok((
        [(header::CONTENT_TYPE, "application/octet-stream")],
        block.into_data(),
    ))
}

/// Handler for GET /blocks/:cid/has
pub async fn has_handler(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<HasResponse>> {
    let cid = parse_cid(&cid)?;
    let has = state.store.has(&cid).await?;

    Ok(Json(HasResponse::new(&cid, has)))
}

/// Handler for GET /blocks/:cid/size
pub async fn size_handler(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<SizeResponse>> {
    let cid = parse_cid(&cid)?;
    let size = state.store.get_size(&cid).await?;

    Ok(Json(SizeResponse::new(&cid, size)))
}

/// Handler for DELETE /blocks/:cid
///
/// Deleting a block that does not exist still succeeds.
pub async fn delete_handler(
    State(state): State<AppState>,
    Path(cid): Path<String>,
) -> Result<Json<DeleteResponse>> {
    let cid = parse_cid(&cid)?;
    state.store.delete_block(&cid).await?;

    Ok(Json(DeleteResponse::new(&cid)))
}

/// Handler for GET /stats
///
/// Returns statistics of every enabled cache layer.
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    Json(state.store.stats().into())
}

/// Handler for GET /health
///
/// Reports whether the bloom filter has finished warming up; a store
/// without a filter is always ready.
pub async fn health_handler(State(state): State<AppState>) -> Json<HealthResponse> {
    let filter_ready = state.store.bloom().map_or(true, |bloom| bloom.is_ready());
    Json(HealthResponse::healthy(filter_ready))
}
