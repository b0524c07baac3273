//! Bloom Filter Module
//!
//! Grow-only probabilistic set used to prove that a block does not exist.

use std::f64::consts::LN_2;
use std::sync::atomic::{AtomicU64, Ordering};

use ahash::RandomState;
use parking_lot::RwLock;

use crate::block::Cid;
use crate::error::{BlockstoreError, Result};

/// Fixed hasher keys, so every filter built with the same parameters sets
/// the same bits for a key
const PRIMARY_SEEDS: [u64; 4] = [1, 2, 3, 4];
const SECONDARY_SEEDS: [u64; 4] = [5, 6, 7, 8];

/// Minimum bit array size
const MIN_BITS: usize = 64;

// == Membership ==
/// Answer of a filter query.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Membership {
    /// The key was never added.
    DefinitelyAbsent,
    /// The key may have been added.
    MaybePresent,
}

// == Bloom Filter ==
/// Thread-safe bloom filter over block identifiers.
///
/// Sized for `capacity` elements with `hashes` probes each, which gives a
/// false-positive rate of roughly `2^-hashes` at capacity.
#[derive(Debug)]
pub struct BloomFilter {
    words: RwLock<Vec<u64>>,
    bits: usize,
    hashes: u32,
    added: AtomicU64,
    primary: RandomState,
    secondary: RandomState,
}

impl BloomFilter {
    // == Constructor ==
    /// Creates an empty filter.
    ///
    /// # Errors
    /// `InvalidConfig` unless both parameters are positive.
    pub fn new(capacity: usize, hashes: u32) -> Result<Self> {
        if capacity == 0 || hashes == 0 {
            return Err(BlockstoreError::InvalidConfig(format!(
                "bloom filter needs positive size and hash count, got {} and {}",
                capacity, hashes
            )));
        }

        let wanted = (capacity as f64 * hashes as f64 / LN_2).ceil() as usize;
        let words = wanted.max(MIN_BITS).div_ceil(64);

        Ok(Self {
            words: RwLock::new(vec![0; words]),
            bits: words * 64,
            hashes,
            added: AtomicU64::new(0),
            primary: seeded(PRIMARY_SEEDS),
            secondary: seeded(SECONDARY_SEEDS),
        })
    }

    // == Add ==
    /// Adds a key. Adding is irreversible.
    pub fn add(&self, cid: &Cid) {
        let (h1, h2) = self.hash_pair(cid);
        let mut words = self.words.write();
        for i in 0..self.hashes {
            let bit = self.index(h1, h2, i);
            words[bit / 64] |= 1u64 << (bit % 64);
        }
        drop(words);
        self.added.fetch_add(1, Ordering::Relaxed);
    }

    // == Test ==
    /// Tests a key. Never answers `DefinitelyAbsent` for an added key.
    pub fn test(&self, cid: &Cid) -> Membership {
        let (h1, h2) = self.hash_pair(cid);
        let words = self.words.read();
        let all_set = (0..self.hashes).all(|i| {
            let bit = self.index(h1, h2, i);
            words[bit / 64] & (1u64 << (bit % 64)) != 0
        });
        if all_set {
            Membership::MaybePresent
        } else {
            Membership::DefinitelyAbsent
        }
    }

    /// Number of `add` calls so far.
    pub fn elements_added(&self) -> u64 {
        self.added.load(Ordering::Relaxed)
    }

    pub fn bit_len(&self) -> usize {
        self.bits
    }

    pub fn hash_count(&self) -> u32 {
        self.hashes
    }

    // -- Hashing --

    fn index(&self, h1: u64, h2: u64, i: u32) -> usize {
        (h1.wrapping_add((i as u64).wrapping_mul(h2)) % self.bits as u64) as usize
    }

    /// Two independent hashes for double hashing; the second is forced odd
    /// so it is never zero.
    fn hash_pair(&self, cid: &Cid) -> (u64, u64) {
        (self.primary.hash_one(cid), self.secondary.hash_one(cid) | 1)
    }
}

fn seeded([k0, k1, k2, k3]: [u64; 4]) -> RandomState {
    RandomState::with_seeds(k0, k1, k2, k3)
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    fn key(i: usize) -> Cid {
        Cid::of(format!("bloom key {i}").as_bytes())
    }

    #[test]
    fn test_rejects_zero_parameters() {
        assert!(BloomFilter::new(0, 7).is_err());
        assert!(BloomFilter::new(100, 0).is_err());
    }

    #[test]
    fn test_sizing() {
        let filter = BloomFilter::new(1000, 7).unwrap();
        // ceil(7000 / ln 2) = 10099, rounded up to whole words
        assert_eq!(filter.bit_len(), 10112);
        assert_eq!(filter.hash_count(), 7);

        let tiny = BloomFilter::new(1, 1).unwrap();
        assert_eq!(tiny.bit_len(), 64);
    }

    #[test]
    fn test_empty_filter_rejects_everything() {
        let filter = BloomFilter::new(100, 7).unwrap();
        for i in 0..100 {
            assert_eq!(filter.test(&key(i)), Membership::DefinitelyAbsent);
        }
    }

    #[test]
    fn test_no_false_negatives() {
        let filter = BloomFilter::new(1000, 7).unwrap();
        for i in 0..1000 {
            filter.add(&key(i));
        }
        for i in 0..1000 {
            assert_eq!(filter.test(&key(i)), Membership::MaybePresent);
        }
        assert_eq!(filter.elements_added(), 1000);
    }

    #[test]
    fn test_false_positive_rate_at_capacity() {
        let filter = BloomFilter::new(1000, 7).unwrap();
        for i in 0..1000 {
            filter.add(&key(i));
        }

        let false_positives = (1000..11000)
            .filter(|i| filter.test(&key(*i)) == Membership::MaybePresent)
            .count();

        // Expected around 0.8%; allow generous slack
        assert!(false_positives < 500, "{} false positives", false_positives);
    }

    #[test]
    fn test_same_parameters_set_same_bits() {
        let a = BloomFilter::new(100, 5).unwrap();
        let b = BloomFilter::new(100, 5).unwrap();
        for i in 0..50 {
            a.add(&key(i));
            b.add(&key(i));
        }

        assert_eq!(*a.words.read(), *b.words.read());
        assert!(a.words.read().iter().any(|w| *w != 0));
    }

    #[test]
    fn test_undefined_cid_is_hashable() {
        let filter = BloomFilter::new(10, 3).unwrap();
        filter.add(&Cid::default());
        assert_eq!(filter.test(&Cid::default()), Membership::MaybePresent);
    }
}
