//! Adaptive Replacement Cache Module
//!
//! Bounded presence/absence map that tunes itself between recency and
//! frequency (Megiddo & Modha, FAST '03).
//!
//! # Lists
//! - T1: resident entries seen once recently
//! - T2: resident entries seen at least twice
//! - B1: keys recently evicted from T1 (ghosts, no payload)
//! - B2: keys recently evicted from T2 (ghosts, no payload)
//!
//! The adaptive target `p` is the share of capacity T1 aims for. A B1 ghost
//! hit grows it, a B2 ghost hit shrinks it.

use std::collections::HashMap;

use super::list::{SlotIdx, SlotList};
use super::stats::CacheStats;
use crate::block::Cid;

// == Lookup Result ==
/// What the cache knows about an identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lookup {
    /// Block exists; the size is known unless presence came from a `has`.
    Present(Option<usize>),
    /// Block is known not to exist.
    Absent,
    /// Nothing cached; the backing store must be asked.
    Unknown,
}

/// Payload of a resident entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Presence {
    Present(Option<usize>),
    Absent,
}

impl Presence {
    /// Merges a new observation, never forgetting a known size.
    fn merge(self, observed: Presence) -> Presence {
        match (self, observed) {
            (Presence::Present(Some(size)), Presence::Present(None)) => {
                Presence::Present(Some(size))
            }
            (_, observed) => observed,
        }
    }
}

impl From<Presence> for Lookup {
    fn from(presence: Presence) -> Self {
        match presence {
            Presence::Present(size) => Lookup::Present(size),
            Presence::Absent => Lookup::Absent,
        }
    }
}

#[derive(Debug)]
struct Entry {
    cid: Cid,
    presence: Presence,
}

/// Where a key currently lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Location {
    T1(SlotIdx),
    T2(SlotIdx),
    B1(SlotIdx),
    B2(SlotIdx),
}

// == ARC ==
/// Adaptive replacement cache of block presence.
///
/// Not synchronised; the owning layer wraps it in a mutex and holds the lock
/// for one call at a time.
#[derive(Debug)]
pub struct ArcCache {
    capacity: usize,
    /// Target size of T1
    p: usize,
    t1: SlotList<Entry>,
    t2: SlotList<Entry>,
    b1: SlotList<Cid>,
    b2: SlotList<Cid>,
    directory: HashMap<Cid, Location>,
    stats: CacheStats,
}

impl ArcCache {
    // == Constructor ==
    /// Creates a cache holding at most `capacity` resident entries.
    ///
    /// A zero capacity cache retains nothing. Lists and directory grow as
    /// entries arrive, so a huge capacity costs nothing up front.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            p: 0,
            t1: SlotList::new(),
            t2: SlotList::new(),
            b1: SlotList::new(),
            b2: SlotList::new(),
            directory: HashMap::new(),
            stats: CacheStats::new(),
        }
    }

    // == Lookup ==
    /// Returns what is known about `cid`, updating recency and the adaptive
    /// target.
    ///
    /// A T1 hit is promoted to T2 and a T2 hit refreshed. A ghost hit moves
    /// `p` and reports `Unknown`; the ghost stays so that the record which
    /// follows the backend call lands in T2.
    pub fn lookup(&mut self, cid: &Cid) -> Lookup {
        match self.directory.get(cid).copied() {
            Some(Location::T1(idx)) => {
                self.stats.record_hit();
                match self.t1.remove(idx) {
                    Some(entry) => {
                        let presence = entry.presence;
                        let new_idx = self.t2.push_back(entry);
                        self.directory.insert(cid.clone(), Location::T2(new_idx));
                        presence.into()
                    }
                    None => Lookup::Unknown,
                }
            }
            Some(Location::T2(idx)) => {
                self.stats.record_hit();
                self.t2.move_to_back(idx);
                self.t2
                    .get(idx)
                    .map_or(Lookup::Unknown, |entry| entry.presence.into())
            }
            Some(Location::B1(_)) => {
                self.stats.record_ghost_hit();
                let delta = (self.b2.len() / self.b1.len().max(1)).max(1);
                self.p = self.capacity.min(self.p + delta);
                Lookup::Unknown
            }
            Some(Location::B2(_)) => {
                self.stats.record_ghost_hit();
                let delta = (self.b1.len() / self.b2.len().max(1)).max(1);
                self.p = self.p.saturating_sub(delta);
                Lookup::Unknown
            }
            None => {
                self.stats.record_miss();
                Lookup::Unknown
            }
        }
    }

    // == Record ==
    /// Records that `cid` exists, with its size when known.
    pub fn record_present(&mut self, cid: &Cid, size: Option<usize>) {
        self.record(cid, Presence::Present(size));
    }

    /// Records that `cid` does not exist.
    pub fn record_absent(&mut self, cid: &Cid) {
        self.record(cid, Presence::Absent);
    }

    fn record(&mut self, cid: &Cid, presence: Presence) {
        if self.capacity == 0 {
            return;
        }

        match self.directory.get(cid).copied() {
            Some(Location::T1(idx)) => {
                if let Some(mut entry) = self.t1.remove(idx) {
                    entry.presence = entry.presence.merge(presence);
                    let new_idx = self.t2.push_back(entry);
                    self.directory.insert(cid.clone(), Location::T2(new_idx));
                }
            }
            Some(Location::T2(idx)) => {
                if let Some(entry) = self.t2.get_mut(idx) {
                    entry.presence = entry.presence.merge(presence);
                }
                self.t2.move_to_back(idx);
            }
            Some(Location::B1(idx)) => {
                self.b1.remove(idx);
                self.directory.remove(cid);
                if self.resident_len() >= self.capacity {
                    self.replace(false);
                }
                self.insert_t2(cid, presence);
            }
            Some(Location::B2(idx)) => {
                self.b2.remove(idx);
                self.directory.remove(cid);
                if self.resident_len() >= self.capacity {
                    self.replace(true);
                }
                self.insert_t2(cid, presence);
            }
            None => {
                self.make_room_for_new();
                let idx = self.t1.push_back(Entry {
                    cid: cid.clone(),
                    presence,
                });
                self.directory.insert(cid.clone(), Location::T1(idx));
            }
        }

        self.trim_ghosts();
        self.stats.set_total_entries(self.resident_len());
    }

    // == Remove ==
    /// Forgets everything about `cid`, ghosts included.
    pub fn remove(&mut self, cid: &Cid) {
        match self.directory.remove(cid) {
            Some(Location::T1(idx)) => {
                self.t1.remove(idx);
            }
            Some(Location::T2(idx)) => {
                self.t2.remove(idx);
            }
            Some(Location::B1(idx)) => {
                self.b1.remove(idx);
            }
            Some(Location::B2(idx)) => {
                self.b2.remove(idx);
            }
            None => {}
        }
        self.stats.set_total_entries(self.resident_len());
    }

    // == Introspection ==
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Number of resident entries (T1 + T2).
    pub fn len(&self) -> usize {
        self.resident_len()
    }

    pub fn is_empty(&self) -> bool {
        self.resident_len() == 0
    }

    /// Current adaptive target for T1.
    pub fn target_recent(&self) -> usize {
        self.p
    }

    pub fn t1_len(&self) -> usize {
        self.t1.len()
    }

    pub fn t2_len(&self) -> usize {
        self.t2.len()
    }

    pub fn b1_len(&self) -> usize {
        self.b1.len()
    }

    pub fn b2_len(&self) -> usize {
        self.b2.len()
    }

    /// Resident identifiers, least recently used first within each list
    /// (T1 before T2).
    pub fn resident_keys(&self) -> impl Iterator<Item = &Cid> + '_ {
        self.t1.iter().chain(self.t2.iter()).map(|entry| &entry.cid)
    }

    /// Returns a snapshot of the statistics.
    pub fn stats(&self) -> CacheStats {
        let mut stats = self.stats.clone();
        stats.set_total_entries(self.resident_len());
        stats.set_list_sizes(self.t1.len(), self.t2.len(), self.p);
        stats
    }

    // -- Internal eviction machinery --

    fn resident_len(&self) -> usize {
        self.t1.len() + self.t2.len()
    }

    fn insert_t2(&mut self, cid: &Cid, presence: Presence) {
        let idx = self.t2.push_back(Entry {
            cid: cid.clone(),
            presence,
        });
        self.directory.insert(cid.clone(), Location::T2(idx));
    }

    /// Frees a slot for a key absent from all four lists.
    fn make_room_for_new(&mut self) {
        let l1_len = self.t1.len() + self.b1.len();
        if l1_len >= self.capacity {
            if self.t1.len() < self.capacity {
                if let Some(ghost) = self.b1.pop_front() {
                    self.directory.remove(&ghost);
                }
                if self.resident_len() >= self.capacity {
                    self.replace(false);
                }
            } else if let Some(entry) = self.t1.pop_front() {
                // T1 alone fills the cache; drop its LRU without a ghost.
                self.directory.remove(&entry.cid);
                self.stats.record_eviction();
            }
        } else {
            if l1_len + self.t2.len() + self.b2.len() >= self.capacity.saturating_mul(2) {
                if let Some(ghost) = self.b2.pop_front() {
                    self.directory.remove(&ghost);
                }
            }
            if self.resident_len() >= self.capacity {
                self.replace(false);
            }
        }
    }

    /// ARC REPLACE: demotes one resident entry to its ghost list.
    fn replace(&mut self, from_b2: bool) {
        let t1_len = self.t1.len();
        let prefer_t1 = t1_len > 0 && (t1_len > self.p || (from_b2 && t1_len == self.p));

        if prefer_t1 || self.t2.is_empty() {
            self.demote_t1();
        } else {
            self.demote_t2();
        }
    }

    fn demote_t1(&mut self) {
        if let Some(entry) = self.t1.pop_front() {
            let idx = self.b1.push_back(entry.cid.clone());
            self.directory.insert(entry.cid, Location::B1(idx));
            self.stats.record_eviction();
        }
    }

    fn demote_t2(&mut self) {
        if let Some(entry) = self.t2.pop_front() {
            let idx = self.b2.push_back(entry.cid.clone());
            self.directory.insert(entry.cid, Location::B2(idx));
            self.stats.record_eviction();
        }
    }

    fn trim_ghosts(&mut self) {
        while self.b1.len() > self.capacity {
            match self.b1.pop_front() {
                Some(ghost) => {
                    self.directory.remove(&ghost);
                }
                None => break,
            }
        }
        while self.b2.len() > self.capacity {
            match self.b2.pop_front() {
                Some(ghost) => {
                    self.directory.remove(&ghost);
                }
                None => break,
            }
        }
    }

    /// Checks the structural invariants; used by tests.
    #[cfg(test)]
    pub(crate) fn check_invariants(&self) -> Result<(), String> {
        let dir_len = self.t1.len() + self.t2.len() + self.b1.len() + self.b2.len();
        if self.directory.len() != dir_len {
            return Err(format!(
                "directory has {} keys but lists hold {}",
                self.directory.len(),
                dir_len
            ));
        }
        if self.resident_len() > self.capacity {
            return Err(format!(
                "{} resident entries exceed capacity {}",
                self.resident_len(),
                self.capacity
            ));
        }
        if self.b1.len() > self.capacity || self.b2.len() > self.capacity {
            return Err("ghost list exceeds capacity".to_string());
        }
        if self.p > self.capacity {
            return Err(format!("p={} exceeds capacity {}", self.p, self.capacity));
        }
        for cid in self.resident_keys() {
            if !self.directory.contains_key(cid) {
                return Err(format!("{} missing from directory", cid));
            }
        }
        Ok(())
    }
}
