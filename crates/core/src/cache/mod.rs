//! Per-core L1 cache controller.
//!
//! This module implements the private, set-associative, write-back,
//! write-allocate data cache attached to each core. It provides:
//! 1. **Local operations:** `read` and `write` entry points that return
//!    whether the access completed this cycle.
//! 2. **Miss handling:** victim selection, dirty write-back, block fetch over
//!    the bus, and the single-outstanding-miss record with its resolve time.
//! 3. **Snooping:** the reaction to transactions issued by other cores,
//!    driven by the pure MESI transition table.

/// Cache line and MESI state.
pub mod line;

/// MESI snoop transition table.
pub mod mesi;

/// E-way set with LRU replacement.
pub mod set;

pub use line::{CacheLine, MesiState};
pub use mesi::{snoop_transition, SnoopOutcome};
pub use set::CacheSet;

use crate::bus::{Bus, BusTransaction};
use crate::common::{Addr, CacheGeometry};
use crate::config::TimingParams;
use crate::mem::MainMemory;

/// Access and replacement counters for one cache.
#[derive(Clone, Copy, Debug, Default)]
pub struct CacheCounters {
    /// Total accesses (`hits + misses`).
    pub accesses: u64,
    /// Accesses that completed without a bus fetch.
    pub hits: u64,
    /// Accesses that required a block fetch.
    pub misses: u64,
    /// Read accesses.
    pub reads: u64,
    /// Write accesses.
    pub writes: u64,
    /// Valid lines displaced to make room for a fetch.
    pub evictions: u64,
    /// Dirty blocks written back to memory, whether displaced locally or
    /// flushed in response to a snoop.
    pub writebacks: u64,
    /// Coherence transactions this cache has placed on the bus.
    pub coherence_ops: u64,
}

/// The single outstanding miss a cache can carry.
#[derive(Clone, Copy, Debug, Default)]
pub struct PendingMiss {
    /// Whether a miss is in flight; the owning core is blocked while set.
    pub pending: bool,
    /// Cycle at which the miss is considered resolved.
    pub resolve_cycle: u64,
    /// Peer that supplied the block, if it came cache-to-cache.
    pub data_source: Option<usize>,
}

/// Private L1 cache for one core.
pub struct Cache {
    core_id: usize,
    geometry: CacheGeometry,
    sets: Vec<CacheSet>,
    timing: TimingParams,
    counters: CacheCounters,
    miss: PendingMiss,
    current_cycle: u64,
}

/// What a cache reports back after snooping one transaction.
#[derive(Clone, Copy, Debug, Default)]
pub struct SnoopReply {
    /// The cache held a valid copy of the block.
    pub present: bool,
    /// The cache supplies the block to the requester.
    pub provided: bool,
    /// The copy was killed by this transaction.
    pub invalidated: bool,
    /// The dirty block had to be written back to memory.
    pub writeback: bool,
}

impl Cache {
    /// Creates an empty cache for `core_id`.
    pub fn new(
        core_id: usize,
        geometry: CacheGeometry,
        associativity: usize,
        timing: TimingParams,
    ) -> Self {
        let sets = (0..geometry.num_sets())
            .map(|_| CacheSet::new(associativity))
            .collect();
        Self {
            core_id,
            geometry,
            sets,
            timing,
            counters: CacheCounters::default(),
            miss: PendingMiss::default(),
            current_cycle: 0,
        }
    }

    /// Core this cache belongs to.
    pub fn core_id(&self) -> usize {
        self.core_id
    }

    /// Address-split geometry.
    pub fn geometry(&self) -> CacheGeometry {
        self.geometry
    }

    /// Access counters.
    pub fn counters(&self) -> &CacheCounters {
        &self.counters
    }

    /// The outstanding miss record.
    pub fn pending_miss(&self) -> &PendingMiss {
        &self.miss
    }

    /// Current MESI state of the block containing `addr` (Invalid when not
    /// resident).
    pub fn state_of(&self, addr: Addr) -> MesiState {
        let parts = self.geometry.decode(addr);
        match self.sets.get(parts.index) {
            Some(set) => set
                .find(parts.tag)
                .map(|way| set.line(way).state)
                .unwrap_or(MesiState::Invalid),
            None => MesiState::Invalid,
        }
    }

    /// Sets in index order.
    pub fn sets(&self) -> &[CacheSet] {
        &self.sets
    }

    /// Advances this cache's notion of the current cycle. Called by the
    /// scheduler at the top of every cycle.
    pub fn set_cycle(&mut self, cycle: u64) {
        self.current_cycle = cycle;
    }

    /// Attempts a load from `addr`.
    ///
    /// Returns `true` on a hit. On a miss the block is fetched over the bus,
    /// the line is installed (Exclusive when no peer held it, Shared
    /// otherwise), the resolve time is recorded, and `false` tells the caller
    /// to block until [`Cache::check_miss_resolved`] fires.
    pub fn read(
        &mut self,
        addr: Addr,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> bool {
        if self.miss.pending {
            return false;
        }
        self.counters.accesses += 1;
        self.counters.reads += 1;

        let parts = self.geometry.decode(addr);
        if self.index_out_of_range(parts.index) {
            return true;
        }

        if let Some(way) = self.sets[parts.index].find(parts.tag) {
            self.counters.hits += 1;
            self.sets[parts.index].touch(way);
            return true;
        }

        self.counters.misses += 1;
        let (way, writeback_penalty) = self.evict_victim(parts.index, bus, memory);

        let outcome = self.issue(BusTransaction::BusRd, parts.block, bus, peers, memory);
        let state = if outcome.shared {
            MesiState::Shared
        } else {
            MesiState::Exclusive
        };
        self.install(parts.index, way, parts.tag, state);

        let transfer = self.transfer_cycles(outcome.provided);
        self.miss = PendingMiss {
            pending: true,
            resolve_cycle: self.current_cycle + writeback_penalty + transfer,
            data_source: outcome.source,
        };
        false
    }

    /// Attempts a store to `addr`.
    ///
    /// A hit on a Shared line broadcasts an upgrade that kills the other
    /// copies; a hit on Exclusive silently becomes Modified. A miss fetches
    /// the block with intent to modify (peers invalidate, a Modified peer
    /// supplies and writes back) and installs it as Modified. Returns `true`
    /// when the access completed this cycle.
    pub fn write(
        &mut self,
        addr: Addr,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> bool {
        if self.miss.pending {
            return false;
        }
        self.counters.accesses += 1;
        self.counters.writes += 1;

        let parts = self.geometry.decode(addr);
        if self.index_out_of_range(parts.index) {
            return true;
        }

        if let Some(way) = self.sets[parts.index].find(parts.tag) {
            self.counters.hits += 1;
            match self.sets[parts.index].line(way).state {
                MesiState::Modified => {}
                MesiState::Exclusive => {
                    self.sets[parts.index].line_mut(way).state = MesiState::Modified;
                }
                MesiState::Shared => {
                    self.issue(BusTransaction::BusUpgr, parts.block, bus, peers, memory);
                    self.sets[parts.index].line_mut(way).state = MesiState::Modified;
                }
                MesiState::Invalid => unreachable!("find() only returns valid lines"),
            }
            self.sets[parts.index].touch(way);
            return true;
        }

        self.counters.misses += 1;
        let (way, writeback_penalty) = self.evict_victim(parts.index, bus, memory);

        let outcome = self.issue(BusTransaction::BusRdX, parts.block, bus, peers, memory);
        self.install(parts.index, way, parts.tag, MesiState::Modified);

        let transfer = self.transfer_cycles(outcome.provided);
        self.miss = PendingMiss {
            pending: true,
            resolve_cycle: self.current_cycle + writeback_penalty + transfer,
            data_source: outcome.source,
        };
        false
    }

    /// Reports whether the outstanding miss has resolved at the current
    /// cycle, clearing it on success.
    pub fn check_miss_resolved(&mut self) -> bool {
        if !self.miss.pending {
            return false;
        }
        if self.current_cycle >= self.miss.resolve_cycle {
            self.miss.pending = false;
            return true;
        }
        false
    }

    /// Reacts to a transaction another core placed on the bus.
    ///
    /// Looks up the block; if absent, reports nothing to do. Otherwise
    /// applies the MESI snoop table, counts a forced write-back, and tells
    /// the bus whether this cache supplies the data.
    pub fn snoop(&mut self, tx: BusTransaction, addr: Addr) -> SnoopReply {
        let parts = self.geometry.decode(addr);
        let set = match self.sets.get_mut(parts.index) {
            Some(set) => set,
            None => return SnoopReply::default(),
        };
        let way = match set.find(parts.tag) {
            Some(way) => way,
            None => return SnoopReply::default(),
        };

        let line = set.line_mut(way);
        let before = line.state;
        let outcome = mesi::snoop_transition(before, tx);
        line.state = outcome.next;

        if outcome.writeback {
            self.counters.writebacks += 1;
        }
        SnoopReply {
            present: true,
            provided: outcome.provides_data,
            invalidated: outcome.next == MesiState::Invalid,
            writeback: outcome.writeback,
        }
    }

    /// Picks the victim way for a fill into `set_idx` and retires its
    /// occupant: a valid victim counts as an eviction, and a Modified victim
    /// is written back over the bus, returning the extra stall cycles.
    fn evict_victim(
        &mut self,
        set_idx: usize,
        bus: &mut Bus,
        memory: &mut MainMemory,
    ) -> (usize, u64) {
        let way = self.sets[set_idx].find_victim();
        let (valid, dirty, tag) = {
            let line = self.sets[set_idx].line(way);
            (line.is_valid(), line.is_dirty(), line.tag)
        };
        if !valid {
            return (way, 0);
        }

        self.counters.evictions += 1;
        if !dirty {
            return (way, 0);
        }

        self.counters.writebacks += 1;
        let victim_block = self.geometry.reconstruct(tag, set_idx);
        self.issue(BusTransaction::Flush, victim_block, bus, &mut [], memory);
        (way, self.timing.mem_latency)
    }

    fn install(&mut self, set_idx: usize, way: usize, tag: u32, state: MesiState) {
        let line = self.sets[set_idx].line_mut(way);
        line.tag = tag;
        line.state = state;
        self.sets[set_idx].touch(way);
    }

    fn issue(
        &mut self,
        tx: BusTransaction,
        block: Addr,
        bus: &mut Bus,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
    ) -> crate::bus::BusOutcome {
        self.counters.coherence_ops += 1;
        bus.issue(tx, block, self.core_id, peers, memory, self.current_cycle)
    }

    /// Stall cycles to move the missed block in: a word-by-word bus transfer
    /// when a peer supplies it, the full memory latency otherwise.
    fn transfer_cycles(&self, peer_supplied: bool) -> u64 {
        if peer_supplied {
            self.timing
                .block_transfer_cycles(self.geometry.block_bytes())
        } else {
            self.timing.mem_latency
        }
    }

    /// Defensive check; a correct decode cannot produce an out-of-range
    /// index. The offending access is dropped so the core stays live.
    fn index_out_of_range(&self, index: usize) -> bool {
        if index < self.sets.len() {
            return false;
        }
        log::error!(
            "cache {}: set index {} out of range ({} sets), access aborted",
            self.core_id,
            index,
            self.sets.len()
        );
        true
    }
}
