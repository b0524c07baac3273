//! Background Tasks Module
//!
//! Contains background tasks spawned by the cache layers.
//!
//! # Tasks
//! - Bloom warm-up: seeds an absence filter from the backing store's keys

mod warmup;

pub use warmup::{spawn_bloom_warmup, BuildState};
