//! Cycle-stepping scheduler.
//!
//! The simulator owns the processors and the shared memory system side by
//! side and interleaves the cores cooperatively: every cycle it broadcasts
//! the new time to the caches, lets each unfinished core attempt one access
//! in ascending core-id order, then unblocks the cores whose miss timing has
//! elapsed. Because the cores always run in id order, the bus sees their
//! transactions in a fixed order and the whole run is deterministic for a
//! given set of traces and configuration.

use crate::config::SimConfig;
use crate::stats::{BusStats, CoreStats, SimReport};
use crate::trace::{self, TraceSource};

use super::processor::Processor;
use super::system::System;

use crate::common::SimError;

/// Top-level simulation: processors plus the shared memory system.
pub struct Simulator {
    /// Trace-driven cores, indexed by core id.
    pub processors: Vec<Processor>,
    /// Caches, bus, and memory.
    pub system: System,
    current_cycle: u64,
    max_cycles: u64,
}

impl Simulator {
    /// Builds a simulation from explicit per-core trace sources.
    ///
    /// The number of sources must match `config.num_cores`.
    pub fn new(config: &SimConfig, traces: Vec<Box<dyn TraceSource>>) -> Self {
        assert_eq!(
            traces.len(),
            config.num_cores,
            "one trace source per core required"
        );
        let processors = traces
            .into_iter()
            .enumerate()
            .map(|(core, trace)| Processor::new(core, trace))
            .collect();
        Self {
            processors,
            system: System::new(config),
            current_cycle: 0,
            max_cycles: config.max_cycles,
        }
    }

    /// Builds a simulation reading `{app}_proc{N}.trace` for every core.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceOpenFailed`] if any per-core trace file is
    /// missing.
    pub fn from_app(config: &SimConfig) -> Result<Self, SimError> {
        let traces = trace::open_core_traces(&config.app_name, config.num_cores)?;
        Ok(Self::new(config, traces))
    }

    /// Runs the simulation to completion (all traces exhausted and no core
    /// blocked), or until the configured cycle cap.
    pub fn run(&mut self) {
        while !self.done() {
            if self.current_cycle >= self.max_cycles {
                log::warn!(
                    "cycle cap of {} reached, abandoning simulation",
                    self.max_cycles
                );
                break;
            }
            self.step_cycle();
        }
    }

    /// Advances the whole machine by one cycle.
    pub fn step_cycle(&mut self) {
        self.current_cycle += 1;
        self.system.set_cycle(self.current_cycle);

        for processor in self.processors.iter_mut() {
            processor.step(&mut self.system, self.current_cycle);
        }

        for (core, processor) in self.processors.iter_mut().enumerate() {
            if processor.is_blocked() && self.system.poll_miss_resolved(core) {
                processor.unblock();
            }
        }
    }

    /// Whether every core has drained its trace and nothing is in flight.
    pub fn done(&self) -> bool {
        self.processors
            .iter()
            .all(|p| p.is_finished() && !p.is_blocked())
    }

    /// Cycles simulated so far.
    pub fn current_cycle(&self) -> u64 {
        self.current_cycle
    }

    /// Assembles the final statistics report.
    pub fn report(&self) -> SimReport {
        let cores = self
            .processors
            .iter()
            .map(|p| {
                let counters = self.system.cache(p.core_id()).counters();
                let finish_cycle = p.finish_cycle().unwrap_or(self.current_cycle);
                CoreStats {
                    core_id: p.core_id(),
                    reads: counters.reads,
                    writes: counters.writes,
                    accesses: counters.accesses,
                    hits: counters.hits,
                    misses: counters.misses,
                    instructions: p.instructions_executed(),
                    idle_cycles: p.cycles_blocked(),
                    execution_cycles: finish_cycle.saturating_sub(p.cycles_blocked()),
                    evictions: counters.evictions,
                    writebacks: counters.writebacks,
                    finish_cycle,
                }
            })
            .collect();

        SimReport {
            cores,
            bus: BusStats {
                invalidations: self.system.bus.invalidations(),
                traffic_bytes: self.system.bus.traffic_bytes(),
                cache_to_cache: self.system.bus.cache_to_cache(),
            },
            total_cycles: self.current_cycle,
        }
    }
}
