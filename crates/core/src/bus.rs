//! Shared snooping bus.
//!
//! This module implements the single serialized bus connecting the four
//! caches and main memory. It provides:
//! 1. **Transactions:** The coherence transaction vocabulary (`BusRd`,
//!    `BusRdX`, `BusUpgr`, `Invalidate`, `Flush`).
//! 2. **Arbitration:** A reservation timestamp; a transaction starts when the
//!    bus is free and occupies it for its full length, so later requests
//!    queue serially.
//! 3. **Snooping:** Every peer cache observes a transaction, in ascending
//!    core-id order, before the requester sees the aggregated outcome.
//! 4. **Accounting:** Invalidation, data-traffic, and cache-to-cache
//!    counters.

use crate::cache::Cache;
use crate::common::Addr;
use crate::config::TimingParams;
use crate::mem::MainMemory;

/// A coherence transaction placed on the shared bus.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BusTransaction {
    /// Read a block with intent to share.
    BusRd,
    /// Read a block with intent to modify; all other copies die.
    BusRdX,
    /// Upgrade an already-held Shared copy to Modified; carries no data.
    BusUpgr,
    /// Kill all other copies of a block; carries no data.
    Invalidate,
    /// Write a dirty block back to memory.
    Flush,
}

impl BusTransaction {
    /// Whether peer caches observe this transaction. Write-backs carry data
    /// to memory only and are invisible to other caches.
    fn snoops(self) -> bool {
        !matches!(self, BusTransaction::Flush)
    }
}

/// Aggregated result of one bus transaction, as seen by the requester.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusOutcome {
    /// At least one peer held a valid copy of the block.
    pub shared: bool,
    /// A peer supplied the block (it held the line in Modified).
    pub provided: bool,
    /// The supplying core, when `provided` is set.
    pub source: Option<usize>,
    /// Cycle at which the transaction began after arbitration.
    pub start: u64,
}

/// The bus arbiter and its global statistics.
pub struct Bus {
    timing: TimingParams,
    block_bytes: usize,
    busy_until: u64,
    invalidations: u64,
    traffic_bytes: u64,
    cache_to_cache: u64,
}

impl Bus {
    /// Creates an idle bus for the given block size and timing.
    pub fn new(timing: TimingParams, block_bytes: usize) -> Self {
        Self {
            timing,
            block_bytes,
            busy_until: 0,
            invalidations: 0,
            traffic_bytes: 0,
            cache_to_cache: 0,
        }
    }

    /// Bus occupancy of one transaction, in cycles.
    ///
    /// Block-bearing reads occupy the bus for one word time per word;
    /// upgrade and invalidate packets for a single word time; a write-back
    /// for the full memory latency.
    pub fn transaction_cycles(&self, tx: BusTransaction) -> u64 {
        match tx {
            BusTransaction::BusRd | BusTransaction::BusRdX => {
                self.timing.block_transfer_cycles(self.block_bytes)
            }
            BusTransaction::BusUpgr | BusTransaction::Invalidate => self.timing.bus_word_latency,
            BusTransaction::Flush => self.timing.mem_latency,
        }
    }

    /// Places a transaction on the bus on behalf of `requester`.
    ///
    /// Reserves the bus from `max(now, busy_until)`, lets every peer snoop
    /// (in the order given, which the system keeps ascending by core id),
    /// performs any memory traffic the transaction implies, and updates the
    /// global counters. When several peers could supply the block, the first
    /// responder is recorded as the source; the transfer is counted once.
    pub fn issue(
        &mut self,
        tx: BusTransaction,
        addr: Addr,
        requester: usize,
        peers: &mut [&mut Cache],
        memory: &mut MainMemory,
        now: u64,
    ) -> BusOutcome {
        let length = self.transaction_cycles(tx);
        let start = now.max(self.busy_until);
        self.busy_until = start + length;

        let mut outcome = BusOutcome {
            start,
            ..BusOutcome::default()
        };

        if tx.snoops() {
            for peer in peers.iter_mut() {
                let reply = peer.snoop(tx, addr);
                if !reply.present {
                    continue;
                }
                outcome.shared = true;
                if reply.invalidated {
                    self.invalidations += 1;
                }
                if reply.writeback {
                    self.write_back(addr, memory);
                }
                if reply.provided && !outcome.provided {
                    outcome.provided = true;
                    outcome.source = Some(peer.core_id());
                    self.cache_to_cache += 1;
                }
            }
        }

        match tx {
            BusTransaction::BusRd | BusTransaction::BusRdX => {
                // One block moves to the requester whichever agent sourced it.
                self.traffic_bytes += self.block_bytes as u64;
                if !outcome.provided {
                    let _ = memory.read_block(addr);
                }
            }
            BusTransaction::Flush => {
                self.traffic_bytes += self.block_bytes as u64;
                self.write_back(addr, memory);
            }
            BusTransaction::BusUpgr | BusTransaction::Invalidate => {}
        }

        log::debug!(
            "bus: core {} {:?} {} start={} len={} shared={} provided={:?}",
            requester,
            tx,
            addr,
            start,
            length,
            outcome.shared,
            outcome.source,
        );

        outcome
    }

    fn write_back(&mut self, addr: Addr, memory: &mut MainMemory) {
        // Payloads are nominal; an all-zero block keeps the size bookkeeping
        // honest.
        let block = vec![0u8; self.block_bytes];
        if let Err(e) = memory.write_block(addr, &block) {
            log::error!("bus: write-back of {} failed: {}", addr, e);
        }
    }

    /// Cycle until which the bus is reserved.
    pub fn busy_until(&self) -> u64 {
        self.busy_until
    }

    /// Total copies killed in peer caches by exclusive requests, upgrades,
    /// and invalidates.
    pub fn invalidations(&self) -> u64 {
        self.invalidations
    }

    /// Total data moved across the bus, in bytes.
    pub fn traffic_bytes(&self) -> u64 {
        self.traffic_bytes
    }

    /// Number of transactions whose block came from a peer cache rather than
    /// memory.
    pub fn cache_to_cache(&self) -> u64 {
        self.cache_to_cache
    }
}
