//! Bus Arbiter Unit Tests.
//!
//! Verifies serialization (reservation timestamps), per-transaction
//! occupancy, snooping aggregation, invalidation and traffic accounting, and
//! memory sourcing when no peer supplies the block.
//!
//! Geometry: 16-byte blocks, 2-cycle words, so a block occupies the bus for
//! 8 cycles; control packets for 2; a write-back for 100.

use l1sim_core::bus::{Bus, BusTransaction};
use l1sim_core::cache::{Cache, MesiState};
use l1sim_core::common::{Addr, CacheGeometry};
use l1sim_core::config::TimingParams;
use l1sim_core::mem::MainMemory;

const BLOCK: usize = 16;

fn rig() -> (Bus, MainMemory) {
    let timing = TimingParams::default();
    (Bus::new(timing, BLOCK), MainMemory::new(BLOCK))
}

fn cache(id: usize) -> Cache {
    Cache::new(id, CacheGeometry::new(2, 4), 2, TimingParams::default())
}

/// Puts a block into `cache` in Exclusive via a cold read.
fn fill_exclusive(cache: &mut Cache, bus: &mut Bus, mem: &mut MainMemory, addr: u32) {
    let at = bus.busy_until() + 1;
    cache.set_cycle(at);
    assert!(!cache.read(Addr(addr), bus, &mut [], mem));
    cache.set_cycle(at + 1000);
    assert!(cache.check_miss_resolved());
}

/// Puts a block into `cache` in Modified via a cold write.
fn fill_modified(cache: &mut Cache, bus: &mut Bus, mem: &mut MainMemory, addr: u32) {
    let at = bus.busy_until() + 1;
    cache.set_cycle(at);
    assert!(!cache.write(Addr(addr), bus, &mut [], mem));
    cache.set_cycle(at + 1000);
    assert!(cache.check_miss_resolved());
}

// ══════════════════════════════════════════════════════════
// 1. Arbitration
// ══════════════════════════════════════════════════════════

/// A free bus grants immediately: start == now.
#[test]
fn free_bus_starts_immediately() {
    let (mut bus, mut mem) = rig();
    let outcome = bus.issue(BusTransaction::BusUpgr, Addr(0x100), 0, &mut [], &mut mem, 5);
    assert_eq!(outcome.start, 5);
    assert_eq!(bus.busy_until(), 7);
}

/// A busy bus defers the next transaction to its reservation end.
#[test]
fn busy_bus_defers_next_transaction() {
    let (mut bus, mut mem) = rig();
    bus.issue(BusTransaction::BusRd, Addr(0x100), 0, &mut [], &mut mem, 1);
    assert_eq!(bus.busy_until(), 9); // 1 + 2*(16/4)

    let outcome = bus.issue(BusTransaction::BusUpgr, Addr(0x200), 1, &mut [], &mut mem, 3);
    assert_eq!(outcome.start, 9, "queued behind the in-flight block");
    assert_eq!(bus.busy_until(), 11);
}

/// Occupancy per transaction type.
#[test]
fn transaction_occupancy() {
    let (bus, _) = rig();
    assert_eq!(bus.transaction_cycles(BusTransaction::BusRd), 8);
    assert_eq!(bus.transaction_cycles(BusTransaction::BusRdX), 8);
    assert_eq!(bus.transaction_cycles(BusTransaction::BusUpgr), 2);
    assert_eq!(bus.transaction_cycles(BusTransaction::Invalidate), 2);
    assert_eq!(bus.transaction_cycles(BusTransaction::Flush), 100);
}

// ══════════════════════════════════════════════════════════
// 2. Sourcing: memory vs. peer
// ══════════════════════════════════════════════════════════

/// With no holder anywhere, the block comes from memory and one block of
/// traffic is accounted.
#[test]
fn unserviced_read_fetches_from_memory() {
    let (mut bus, mut mem) = rig();
    let outcome = bus.issue(BusTransaction::BusRd, Addr(0x100), 0, &mut [], &mut mem, 1);

    assert!(!outcome.shared);
    assert!(!outcome.provided);
    assert_eq!(outcome.source, None);
    assert_eq!(mem.reads(), 1);
    assert_eq!(bus.traffic_bytes(), BLOCK as u64);
    assert_eq!(bus.cache_to_cache(), 0);
}

/// An Exclusive peer indicates sharing but does not supply; memory sources
/// the block and the peer demotes to Shared.
#[test]
fn exclusive_peer_shares_but_memory_supplies() {
    let (mut bus, mut mem) = rig();
    let mut peer = cache(1);
    fill_exclusive(&mut peer, &mut bus, &mut mem, 0x100);
    let reads_before = mem.reads();

    let now = bus.busy_until() + 1;
    let outcome = bus.issue(
        BusTransaction::BusRd,
        Addr(0x100),
        0,
        &mut [&mut peer],
        &mut mem,
        now,
    );

    assert!(outcome.shared);
    assert!(!outcome.provided);
    assert_eq!(mem.reads(), reads_before + 1);
    assert_eq!(peer.state_of(Addr(0x100)), MesiState::Shared);
    assert_eq!(bus.cache_to_cache(), 0);
    assert_eq!(bus.invalidations(), 0);
}

/// A Modified peer supplies the block, writes it back, and is recorded as
/// the source; memory serves no read.
#[test]
fn modified_peer_supplies_block() {
    let (mut bus, mut mem) = rig();
    let mut peer = cache(2);
    fill_modified(&mut peer, &mut bus, &mut mem, 0x100);
    let reads_before = mem.reads();

    let now = bus.busy_until() + 1;
    let outcome = bus.issue(
        BusTransaction::BusRd,
        Addr(0x100),
        0,
        &mut [&mut peer],
        &mut mem,
        now,
    );

    assert!(outcome.shared);
    assert!(outcome.provided);
    assert_eq!(outcome.source, Some(2));
    assert_eq!(mem.reads(), reads_before, "no memory fetch when supplied");
    assert_eq!(mem.writes(), 1, "dirty block written back");
    assert_eq!(bus.cache_to_cache(), 1);
    assert_eq!(peer.state_of(Addr(0x100)), MesiState::Shared);
}

// ══════════════════════════════════════════════════════════
// 3. Invalidation accounting
// ══════════════════════════════════════════════════════════

/// An exclusive request kills every holder and counts each one.
#[test]
fn rdx_invalidates_all_sharers() {
    let (mut bus, mut mem) = rig();
    let mut c1 = cache(1);
    let mut c2 = cache(2);

    // c1 takes the block Exclusive, then c2's read demotes both to Shared.
    fill_exclusive(&mut c1, &mut bus, &mut mem, 0x100);
    let at = bus.busy_until() + 1;
    c2.set_cycle(at);
    c2.read(Addr(0x100), &mut bus, &mut [&mut c1], &mut mem);
    c2.set_cycle(at + 1000);
    c2.check_miss_resolved();
    assert_eq!(c1.state_of(Addr(0x100)), MesiState::Shared);
    assert_eq!(c2.state_of(Addr(0x100)), MesiState::Shared);

    let now = bus.busy_until() + 1;
    let outcome = bus.issue(
        BusTransaction::BusRdX,
        Addr(0x100),
        0,
        &mut [&mut c1, &mut c2],
        &mut mem,
        now,
    );

    assert!(outcome.shared);
    assert_eq!(bus.invalidations(), 2);
    assert_eq!(c1.state_of(Addr(0x100)), MesiState::Invalid);
    assert_eq!(c2.state_of(Addr(0x100)), MesiState::Invalid);
}

/// An upgrade is a 2-cycle control packet: it kills sharers but moves no
/// data.
#[test]
fn upgrade_kills_sharers_without_traffic() {
    let (mut bus, mut mem) = rig();
    let mut peer = cache(1);
    fill_exclusive(&mut peer, &mut bus, &mut mem, 0x200);
    let traffic_before = bus.traffic_bytes();

    let now = bus.busy_until() + 1;
    bus.issue(
        BusTransaction::BusUpgr,
        Addr(0x200),
        0,
        &mut [&mut peer],
        &mut mem,
        now,
    );

    assert_eq!(bus.invalidations(), 1);
    assert_eq!(bus.traffic_bytes(), traffic_before, "control packets carry no data");
    assert_eq!(peer.state_of(Addr(0x200)), MesiState::Invalid);
}

/// An explicit invalidate behaves like an upgrade for accounting.
#[test]
fn invalidate_counts_per_peer() {
    let (mut bus, mut mem) = rig();
    let mut peer = cache(3);
    fill_exclusive(&mut peer, &mut bus, &mut mem, 0x300);

    let now = bus.busy_until() + 1;
    bus.issue(
        BusTransaction::Invalidate,
        Addr(0x300),
        0,
        &mut [&mut peer],
        &mut mem,
        now,
    );
    assert_eq!(bus.invalidations(), 1);
    assert_eq!(peer.state_of(Addr(0x300)), MesiState::Invalid);
}

// ══════════════════════════════════════════════════════════
// 4. Write-backs
// ══════════════════════════════════════════════════════════

/// A flush occupies the bus for the memory latency, moves one block, and
/// never snoops.
#[test]
fn flush_writes_through_to_memory() {
    let (mut bus, mut mem) = rig();
    let mut peer = cache(1);
    fill_exclusive(&mut peer, &mut bus, &mut mem, 0x400);
    let state_before = peer.state_of(Addr(0x400));

    let now = bus.busy_until() + 1;
    let outcome = bus.issue(
        BusTransaction::Flush,
        Addr(0x400),
        0,
        &mut [&mut peer],
        &mut mem,
        now,
    );

    assert_eq!(bus.busy_until(), now + 100);
    assert_eq!(mem.writes(), 1);
    assert_eq!(bus.traffic_bytes(), 2 * BLOCK as u64); // fill + flush
    assert!(!outcome.shared, "flushes are invisible to peers");
    assert_eq!(peer.state_of(Addr(0x400)), state_before);
}
