//! The shared memory system: private caches, one bus, one memory.
//!
//! The system owns every cache so that a coherence transaction can visit the
//! requester and all of its peers without shared mutable aliasing: the
//! requesting cache is split out of the slice for the duration of the access
//! and the peers ride along as a borrowed list, in ascending core-id order.

use crate::bus::Bus;
use crate::cache::Cache;
use crate::config::SimConfig;
use crate::mem::MainMemory;
use crate::trace::{AccessKind, TraceOp};

/// Caches, bus, and main memory for one run.
pub struct System {
    /// Per-core private L1 caches, indexed by core id.
    pub caches: Vec<Cache>,
    /// The shared snooping bus.
    pub bus: Bus,
    /// Flat main memory.
    pub memory: MainMemory,
    current_cycle: u64,
}

impl System {
    /// Builds the memory system described by `config`.
    pub fn new(config: &SimConfig) -> Self {
        let geometry = config.cache.geometry();
        let caches = (0..config.num_cores)
            .map(|core| Cache::new(core, geometry, config.cache.associativity, config.timing))
            .collect();
        Self {
            caches,
            bus: Bus::new(config.timing, config.cache.block_bytes()),
            memory: MainMemory::new(config.cache.block_bytes()),
            current_cycle: 0,
        }
    }

    /// Broadcasts the new cycle number to every cache.
    pub fn set_cycle(&mut self, cycle: u64) {
        self.current_cycle = cycle;
        for cache in &mut self.caches {
            cache.set_cycle(cycle);
        }
    }

    /// Current cycle as last broadcast.
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Performs one trace record on behalf of `core`.
    ///
    /// Returns `true` if the access completed this cycle, `false` if the
    /// core must block on a miss.
    pub fn access(&mut self, core: usize, op: TraceOp) -> bool {
        let (cache, mut peers) = split_requester(&mut self.caches, core);
        match op.kind {
            AccessKind::Read => cache.read(op.addr, &mut self.bus, &mut peers, &mut self.memory),
            AccessKind::Write => cache.write(op.addr, &mut self.bus, &mut peers, &mut self.memory),
        }
    }

    /// Polls whether `core`'s outstanding miss resolved at the current
    /// cycle, clearing it if so.
    pub fn poll_miss_resolved(&mut self, core: usize) -> bool {
        self.caches[core].check_miss_resolved()
    }

    /// Borrows one cache.
    pub fn cache(&self, core: usize) -> &Cache {
        &self.caches[core]
    }
}

/// Splits `caches` into the requester and its peers. Peer order is ascending
/// by core id, which fixes the first-responder tie-break and keeps the
/// simulation deterministic.
fn split_requester(caches: &mut [Cache], core: usize) -> (&mut Cache, Vec<&mut Cache>) {
    let (left, rest) = caches.split_at_mut(core);
    let (requester, right) = rest
        .split_first_mut()
        .expect("core id within configured range");
    let peers = left.iter_mut().chain(right.iter_mut()).collect();
    (requester, peers)
}
