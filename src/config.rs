//! Configuration Module
//!
//! Cache layer options and server configuration loaded from environment
//! variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

/// Default exact-cache capacity in entries
pub const DEFAULT_ARC_CACHE_SIZE: i64 = 64 << 10;

/// Default bloom filter element capacity
pub const DEFAULT_BLOOM_FILTER_SIZE: i64 = 64 << 10;

/// Default number of bloom filter hash functions
pub const DEFAULT_BLOOM_FILTER_HASHES: i64 = 7;

// == Cache Options ==
/// Sizes of the cache layers.
///
/// Zero disables a layer (either bloom parameter disables the filter);
/// negative values are rejected when the layers are built.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheOpts {
    /// Exact presence cache capacity
    pub arc_cache_size: i64,
    /// Bloom filter target element count
    pub bloom_filter_size: i64,
    /// Bloom filter hash function count
    pub bloom_filter_hashes: i64,
}

impl CacheOpts {
    /// Options with every layer disabled.
    pub fn disabled() -> Self {
        Self {
            arc_cache_size: 0,
            bloom_filter_size: 0,
            bloom_filter_hashes: 0,
        }
    }

    pub fn has_arc(&self) -> bool {
        self.arc_cache_size != 0
    }

    pub fn has_bloom(&self) -> bool {
        self.bloom_filter_size != 0 && self.bloom_filter_hashes != 0
    }
}

impl Default for CacheOpts {
    fn default() -> Self {
        Self {
            arc_cache_size: DEFAULT_ARC_CACHE_SIZE,
            bloom_filter_size: DEFAULT_BLOOM_FILTER_SIZE,
            bloom_filter_hashes: DEFAULT_BLOOM_FILTER_HASHES,
        }
    }
}

/// Server configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// Cache layer sizes
    pub cache: CacheOpts,
    /// HTTP server port
    pub server_port: u16,
    /// How long startup waits for the bloom filter warm-up
    pub warmup_timeout: Duration,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `ARC_CACHE_SIZE` - Exact cache entries (default: 65536)
    /// - `BLOOM_FILTER_SIZE` - Bloom filter elements (default: 65536)
    /// - `BLOOM_FILTER_HASHES` - Bloom filter hash functions (default: 7)
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `WARMUP_TIMEOUT` - Seconds to wait for filter warm-up (default: 30)
    pub fn from_env() -> Self {
        Self {
            cache: CacheOpts {
                arc_cache_size: env_or("ARC_CACHE_SIZE", DEFAULT_ARC_CACHE_SIZE),
                bloom_filter_size: env_or("BLOOM_FILTER_SIZE", DEFAULT_BLOOM_FILTER_SIZE),
                bloom_filter_hashes: env_or("BLOOM_FILTER_HASHES", DEFAULT_BLOOM_FILTER_HASHES),
            },
            server_port: env_or("SERVER_PORT", 3000),
            warmup_timeout: Duration::from_secs(env_or("WARMUP_TIMEOUT", 30)),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            cache: CacheOpts::default(),
            server_port: 3000,
            warmup_timeout: Duration::from_secs(30),
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
