//! Request and Response models for the block cache API
//!
//! This module defines the DTOs (Data Transfer Objects) used for
//! serializing/deserializing HTTP request and response bodies.

pub mod requests;
pub mod responses;

// Re-export commonly used types
pub use requests::{BatchPutRequest, MAX_BATCH_BLOCKS};
pub use responses::{
    ArcStatsResponse, BatchPutResponse, BloomStatsResponse, DeleteResponse, HasResponse,
    HealthResponse, PutResponse, SizeResponse, StatsResponse,
};
