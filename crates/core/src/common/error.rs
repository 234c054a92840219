//! Error definitions for the simulator.
//!
//! This module defines the error cases the core distinguishes:
//! 1. **Configuration errors:** rejected before a simulation is built.
//! 2. **Startup errors:** a per-core trace file that cannot be opened.
//! 3. **Internal bugs:** a block write whose payload does not match the
//!    configured block size.
//!
//! Malformed trace lines are deliberately not represented here: they are
//! skipped with a warning so an imperfect trace cannot wedge the run. No
//! error propagates through the cycle loop.

use std::fmt;
use std::io;
use std::path::PathBuf;

/// Errors reported by the simulator core.
#[derive(Debug)]
pub enum SimError {
    /// A configuration parameter is missing or out of range.
    ///
    /// Fatal: reported to stderr by the caller, which exits with status 1.
    ConfigInvalid(String),

    /// A per-core trace file could not be opened at startup.
    TraceOpenFailed {
        /// Path of the trace file that failed to open.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A block write carried a payload whose length does not match the
    /// configured block size. Indicates a logic bug; the write is skipped.
    BlockSizeMismatch {
        /// Configured block size in bytes.
        expected: usize,
        /// Length of the rejected payload.
        actual: usize,
    },
}

impl fmt::Display for SimError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimError::ConfigInvalid(msg) => write!(f, "invalid configuration: {}", msg),
            SimError::TraceOpenFailed { path, source } => {
                write!(f, "could not open trace file {}: {}", path.display(), source)
            }
            SimError::BlockSizeMismatch { expected, actual } => {
                write!(
                    f,
                    "block size mismatch: expected {} bytes, got {}",
                    expected, actual
                )
            }
        }
    }
}

impl std::error::Error for SimError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SimError::TraceOpenFailed { source, .. } => Some(source),
            _ => None,
        }
    }
}
