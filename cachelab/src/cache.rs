use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::CacheGeometry;
use crate::error::Error;

/// The two kinds of data access a trace can request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessKind {
    Load,
    Store,
}

/// What happened to a single access
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessOutcome {
    Hit,
    Miss,
    /// A miss into a full set, displacing the least recently used line
    MissEviction,
}

impl fmt::Display for AccessOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessOutcome::Hit => write!(f, "hit"),
            AccessOutcome::Miss => write!(f, "miss"),
            AccessOutcome::MissEviction => write!(f, "miss eviction"),
        }
    }
}

/// The accumulated counters for one simulation run
///
/// `dirty_bytes` counts dirty bytes currently resident in the cache;
/// `dirty_evictions` counts the total bytes that were evicted while dirty.
/// Reset only by building a fresh cache
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Statistics {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub dirty_bytes: u64,
    pub dirty_evictions: u64,
}

/// One cache line. Created invalid and lives for the cache's lifetime
///
/// `recency` is a monotonic counter used for LRU ordering, lower value means
/// more recently used
#[derive(Debug, Default, Clone)]
struct Line {
    valid: bool,
    dirty: bool,
    tag: u64,
    recency: u64,
}

/// A set-associative cache with LRU replacement and write-back dirty-byte
/// accounting
///
/// All lines live in one contiguous allocation; the set with index `k` is the
/// slice `[k * E, (k + 1) * E)`. This keeps O(1) set access without tracking
/// a separate allocation per set
///
/// Accesses operate on whole lines: the caller is expected to treat each
/// record as touching exactly one line, so there is no size argument
pub struct Cache {
    geometry: CacheGeometry,
    lines: Vec<Line>,
    stats: Statistics,
}

impl Cache {
    /// Builds a cache of invalid lines for a geometry
    ///
    /// The line storage is reserved up front so a failed allocation is
    /// reported as an error instead of aborting the process
    pub fn new(geometry: CacheGeometry) -> Result<Self, Error> {
        geometry.validate()?;
        let total = geometry.total_lines().ok_or_else(|| {
            Error::Config(format!(
                "{} sets of {} lines exceed addressable memory",
                geometry.num_sets(),
                geometry.associativity
            ))
        })?;
        let mut lines = Vec::new();
        lines
            .try_reserve_exact(total)
            .map_err(|_| Error::Allocation { lines: total })?;
        lines.resize(total, Line::default());
        Ok(Self {
            geometry,
            lines,
            stats: Statistics::default(),
        })
    }

    pub fn geometry(&self) -> CacheGeometry {
        self.geometry
    }

    pub fn statistics(&self) -> &Statistics {
        &self.stats
    }

    /// Performs one access, updating the targeted set and the statistics
    ///
    /// The address is decomposed into (set index, tag); the block offset
    /// bits play no further part. Recency bookkeeping runs on every line of
    /// the set on every access, whatever the outcome, so the lines of a set
    /// always carry a total recency order
    ///
    /// # Arguments
    ///
    /// * `kind`: Load or Store
    /// * `address`: the accessed address
    ///
    /// returns: AccessOutcome
    pub fn access(&mut self, kind: AccessKind, address: u64) -> AccessOutcome {
        let (set_index, tag) = self.geometry.decompose(address);
        let block = self.geometry.block_size();
        let ways = self.geometry.associativity as usize;
        let base = set_index as usize * ways;
        let set = &mut self.lines[base..base + ways];

        // Hit: a valid line already holds the tag
        if let Some(index) = set.iter().position(|line| line.valid && line.tag == tag) {
            self.stats.hits += 1;
            touch(set, index);
            // Marking an already-dirty line is idempotent
            if kind == AccessKind::Store && !set[index].dirty {
                set[index].dirty = true;
                self.stats.dirty_bytes += block;
            }
            return AccessOutcome::Hit;
        }

        self.stats.misses += 1;

        // Fill: the lowest-index invalid line takes the block, no eviction
        if let Some(index) = set.iter().position(|line| !line.valid) {
            set[index].valid = true;
            set[index].tag = tag;
            touch(set, index);
            if kind == AccessKind::Store {
                set[index].dirty = true;
                self.stats.dirty_bytes += block;
            }
            return AccessOutcome::Miss;
        }

        // Eviction: the set is full, displace the least recently used line
        self.stats.evictions += 1;
        let victim = victim_index(set);
        let was_dirty = set[victim].dirty;
        set[victim].tag = tag;
        touch(set, victim);
        if was_dirty {
            // The displaced block is written back
            self.stats.dirty_evictions += block;
            if kind == AccessKind::Load {
                set[victim].dirty = false;
                self.stats.dirty_bytes -= block;
            }
            // A store leaves the line dirty; its bytes are already counted
        } else if kind == AccessKind::Store {
            set[victim].dirty = true;
            self.stats.dirty_bytes += block;
        }
        AccessOutcome::MissEviction
    }
}

/// Resets the recency of the selected line and ages every other line by one
fn touch(set: &mut [Line], selected: usize) {
    for (index, line) in set.iter_mut().enumerate() {
        if index == selected {
            line.recency = 0;
        } else {
            line.recency += 1;
        }
    }
}

/// Picks the eviction victim: the line with the strictly maximum recency
///
/// The scan keeps the first index that attains a new strict maximum, so on a
/// tie the lower index wins
fn victim_index(set: &[Line]) -> usize {
    let mut victim = 0;
    let mut max_recency = set[0].recency;
    for (index, line) in set.iter().enumerate().skip(1) {
        if line.recency > max_recency {
            max_recency = line.recency;
            victim = index;
        }
    }
    victim
}
