//! Cycle-level simulator of a small multiprocessor's L1 data caches under
//! MESI snooping coherence.
//!
//! Four cores replay prerecorded memory-reference traces against private,
//! set-associative, write-back, write-allocate L1 caches that share one
//! serialized bus and a flat main memory. This crate implements:
//! 1. **Caches:** MESI lines, LRU sets, per-core controllers with
//!    single-outstanding-miss timing.
//! 2. **Bus:** A serializing arbiter that snoops every peer cache and
//!    accounts invalidations and data traffic.
//! 3. **Scheduling:** A cooperative cycle loop that interleaves the cores
//!    deterministically and stalls them on misses.
//! 4. **Reporting:** Per-core access/latency statistics and global bus
//!    statistics.

/// Shared snooping bus and transaction types.
pub mod bus;
/// Per-core L1 cache: lines, sets, MESI table, controller.
pub mod cache;
/// Common types: addresses and errors.
pub mod common;
/// Run configuration and validation.
pub mod config;
/// Flat main memory.
pub mod mem;
/// Processors, the shared system, and the cycle scheduler.
pub mod sim;
/// Statistics collection and the text report.
pub mod stats;
/// Trace records and sources.
pub mod trace;

/// Run configuration; build from CLI flags or deserialize from JSON.
pub use crate::config::SimConfig;
/// Top-level simulation; construct with `Simulator::from_app` or
/// `Simulator::new`.
pub use crate::sim::Simulator;
/// Final statistics report.
pub use crate::stats::SimReport;
