//! Simulation statistics collection and reporting.
//!
//! This module assembles the final per-core and global metrics and renders
//! them as a sectioned text report. It provides:
//! 1. **Per-core:** reads, writes, execution and idle cycles, miss rate,
//!    evictions, and write-backs.
//! 2. **Global:** bus invalidations, bus data traffic, cache-to-cache
//!    transfers, total cycles, and the maximum execution time across cores.
//!
//! The report writes to any `io::Write`, so it can go to stdout or be
//! redirected to a file.

use std::io;

/// Final statistics for one core.
#[derive(Clone, Copy, Debug, Default)]
pub struct CoreStats {
    /// Core id.
    pub core_id: usize,
    /// Read accesses issued by the core.
    pub reads: u64,
    /// Write accesses issued by the core.
    pub writes: u64,
    /// Total cache accesses (`hits + misses`).
    pub accesses: u64,
    /// Cache hits.
    pub hits: u64,
    /// Cache misses.
    pub misses: u64,
    /// Instructions completed.
    pub instructions: u64,
    /// Cycles the core spent stalled on misses.
    pub idle_cycles: u64,
    /// Cycles the core spent executing (`finish_cycle - idle_cycles`).
    pub execution_cycles: u64,
    /// Valid lines displaced by fills.
    pub evictions: u64,
    /// Dirty blocks written back to memory.
    pub writebacks: u64,
    /// Cycle at which the core drained its trace.
    pub finish_cycle: u64,
}

impl CoreStats {
    /// Miss rate in `[0, 1]`; zero when the core made no accesses.
    pub fn miss_rate(&self) -> f64 {
        if self.accesses == 0 {
            0.0
        } else {
            self.misses as f64 / self.accesses as f64
        }
    }
}

/// Global bus statistics.
#[derive(Clone, Copy, Debug, Default)]
pub struct BusStats {
    /// Copies killed in peer caches.
    pub invalidations: u64,
    /// Data moved across the bus, in bytes.
    pub traffic_bytes: u64,
    /// Blocks supplied cache-to-cache instead of from memory.
    pub cache_to_cache: u64,
}

/// The complete report for one run.
#[derive(Clone, Debug, Default)]
pub struct SimReport {
    /// Per-core statistics in core-id order.
    pub cores: Vec<CoreStats>,
    /// Global bus statistics.
    pub bus: BusStats,
    /// Cycles simulated.
    pub total_cycles: u64,
}

impl SimReport {
    /// Instructions completed across all cores.
    pub fn total_instructions(&self) -> u64 {
        self.cores.iter().map(|c| c.instructions).sum()
    }

    /// Largest per-core execution time.
    pub fn max_execution_cycles(&self) -> u64 {
        self.cores
            .iter()
            .map(|c| c.execution_cycles)
            .max()
            .unwrap_or(0)
    }

    /// Writes the sectioned text report.
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        let cycles = self.total_cycles.max(1);
        let instructions = self.total_instructions();
        let ipc = instructions as f64 / cycles as f64;

        writeln!(out, "==========================================================")?;
        writeln!(out, "L1 CACHE COHERENCE SIMULATION STATISTICS")?;
        writeln!(out, "==========================================================")?;
        writeln!(out, "sim_cycles               {}", self.total_cycles)?;
        writeln!(out, "sim_insts                {}", instructions)?;
        writeln!(out, "sim_ipc                  {:.4}", ipc)?;
        writeln!(out, "----------------------------------------------------------")?;

        for core in &self.cores {
            writeln!(out, "CORE {}", core.core_id)?;
            writeln!(out, "  reads                  {}", core.reads)?;
            writeln!(out, "  writes                 {}", core.writes)?;
            writeln!(out, "  instructions           {}", core.instructions)?;
            writeln!(out, "  execution_cycles       {}", core.execution_cycles)?;
            writeln!(out, "  idle_cycles            {}", core.idle_cycles)?;
            writeln!(
                out,
                "  miss_rate              {:.4}%",
                core.miss_rate() * 100.0
            )?;
            writeln!(out, "  evictions              {}", core.evictions)?;
            writeln!(out, "  writebacks             {}", core.writebacks)?;
            writeln!(out, "----------------------------------------------------------")?;
        }

        writeln!(out, "BUS")?;
        writeln!(out, "  invalidations          {}", self.bus.invalidations)?;
        writeln!(out, "  traffic_bytes          {}", self.bus.traffic_bytes)?;
        writeln!(out, "  cache_to_cache         {}", self.bus.cache_to_cache)?;
        writeln!(
            out,
            "  max_execution_cycles   {}",
            self.max_execution_cycles()
        )?;
        writeln!(out, "==========================================================")?;
        Ok(())
    }

    /// Writes the report to stdout.
    pub fn print(&self) {
        let _ = self.write_to(&mut io::stdout());
    }
}
