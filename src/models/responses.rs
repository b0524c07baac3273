//! Response DTOs for the block cache API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::block::Cid;
use crate::cache::{BloomStats, CacheStats, LayerStats};

/// Response body for a single block write (PUT /blocks)
#[derive(Debug, Clone, Serialize)]
pub struct PutResponse {
    /// Identifier of the stored block
    pub cid: String,
    /// Payload size in bytes
    pub size: usize,
}

impl PutResponse {
    pub fn new(cid: &Cid, size: usize) -> Self {
        Self {
            cid: cid.to_string(),
            size,
        }
    }
}

/// Response body for a batch write (POST /blocks/batch)
#[derive(Debug, Clone, Serialize)]
pub struct BatchPutResponse {
    /// Identifiers in request order, duplicates included
    pub cids: Vec<String>,
}

impl BatchPutResponse {
    pub fn new<'a>(cids: impl IntoIterator<Item = &'a Cid>) -> Self {
        Self {
            cids: cids.into_iter().map(Cid::to_string).collect(),
        }
    }
}

/// Response body for GET /blocks/:cid/has
#[derive(Debug, Clone, Serialize)]
pub struct HasResponse {
    pub cid: String,
    pub has: bool,
}

impl HasResponse {
    pub fn new(cid: &Cid, has: bool) -> Self {
        Self {
            cid: cid.to_string(),
            has,
        }
    }
}

/// Response body for GET /blocks/:cid/size
#[derive(Debug, Clone, Serialize)]
pub struct SizeResponse {
    pub cid: String,
    pub size: usize,
}

impl SizeResponse {
    pub fn new(cid: &Cid, size: usize) -> Self {
        Self {
            cid: cid.to_string(),
            size,
        }
    }
}

/// Response body for the DELETE operation (DELETE /blocks/:cid)
#[derive(Debug, Clone, Serialize)]
pub struct DeleteResponse {
    /// Success message
    pub message: String,
    /// The identifier that was deleted
    pub cid: String,
}

impl DeleteResponse {
    /// Creates a new DeleteResponse
    pub fn new(cid: &Cid) -> Self {
        Self {
            message: format!("Block '{}' deleted successfully", cid),
            cid: cid.to_string(),
        }
    }
}

/// ARC statistics with the derived hit rate.
#[derive(Debug, Clone, Serialize)]
pub struct ArcStatsResponse {
    #[serde(flatten)]
    pub stats: CacheStats,
    /// hits / (hits + misses + ghost hits)
    pub hit_rate: f64,
}

/// Bloom statistics with the derived short-circuit rate.
#[derive(Debug, Clone, Serialize)]
pub struct BloomStatsResponse {
    #[serde(flatten)]
    pub stats: BloomStats,
    /// hits / total
    pub hit_rate: f64,
}

/// Response body for the stats endpoint (GET /stats)
///
/// Layers that are disabled serialize as `null`.
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    pub arc: Option<ArcStatsResponse>,
    pub bloom: Option<BloomStatsResponse>,
}

impl From<LayerStats> for StatsResponse {
    fn from(stats: LayerStats) -> Self {
        Self {
            arc: stats.arc.map(|stats| ArcStatsResponse {
                hit_rate: stats.hit_rate(),
                stats,
            }),
            bloom: stats.bloom.map(|stats| BloomStatsResponse {
                hit_rate: stats.hit_rate(),
                stats,
            }),
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// False while the bloom filter is still warming up
    pub filter_ready: bool,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy(filter_ready: bool) -> Self {
        Self {
            status: "healthy".to_string(),
            filter_ready,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}
