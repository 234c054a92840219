//! Memory-reference traces.
//!
//! This module supplies the prerecorded instruction streams the cores
//! execute. It provides:
//! 1. **Records:** `TraceOp`, a read or write of a 32-bit byte address.
//! 2. **Sources:** the `TraceSource` seam, with a lazy file-backed reader for
//!    `{app}_proc{N}.trace` files and a scripted source for tests and
//!    programmatic runs.
//!
//! Trace lines are `R <addr>` or `W <addr>` with the address in hex
//! (optionally `0x`-prefixed). Malformed lines are skipped with a warning so
//! an imperfect trace cannot stall the run; end of file marks the core's
//! completion.

use std::collections::VecDeque;
use std::fs::File;
use std::io::{self, BufRead, BufReader};
use std::path::{Path, PathBuf};

use crate::common::{Addr, SimError};

/// Kind of memory access a trace record requests.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessKind {
    /// Load.
    Read,
    /// Store.
    Write,
}

/// One prerecorded memory reference.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TraceOp {
    /// Whether the reference is a load or a store.
    pub kind: AccessKind,
    /// Byte address referenced.
    pub addr: Addr,
}

impl TraceOp {
    /// A load of `addr`.
    pub fn read(addr: u32) -> Self {
        Self {
            kind: AccessKind::Read,
            addr: Addr(addr),
        }
    }

    /// A store to `addr`.
    pub fn write(addr: u32) -> Self {
        Self {
            kind: AccessKind::Write,
            addr: Addr(addr),
        }
    }
}

/// A stream of trace records for one core.
///
/// `None` marks the end of the trace; the core is finished.
pub trait TraceSource {
    /// Yields the next record, or `None` at end of trace.
    fn next_op(&mut self) -> Option<TraceOp>;
}

/// Parses one non-empty trace line into a record.
///
/// Accepts `R`/`W` in either case followed by a hex address with an optional
/// `0x` prefix. Returns `None` for anything else.
pub fn parse_line(line: &str) -> Option<TraceOp> {
    let mut fields = line.split_whitespace();
    let op = fields.next()?;
    let addr_str = fields.next()?;

    let kind = match op {
        "R" | "r" => AccessKind::Read,
        "W" | "w" => AccessKind::Write,
        _ => return None,
    };

    let digits = addr_str
        .strip_prefix("0x")
        .or_else(|| addr_str.strip_prefix("0X"))
        .unwrap_or(addr_str);
    let addr = u32::from_str_radix(digits, 16).ok()?;

    Some(TraceOp {
        kind,
        addr: Addr(addr),
    })
}

/// Lazy, line-by-line reader of one core's trace file.
#[derive(Debug)]
pub struct FileTrace {
    path: PathBuf,
    lines: io::Lines<BufReader<File>>,
    line_no: usize,
}

impl FileTrace {
    /// Opens a trace file.
    ///
    /// # Errors
    ///
    /// Returns [`SimError::TraceOpenFailed`] if the file cannot be opened.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, SimError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| SimError::TraceOpenFailed {
            path: path.clone(),
            source,
        })?;
        Ok(Self {
            path,
            lines: BufReader::new(file).lines(),
            line_no: 0,
        })
    }
}

impl TraceSource for FileTrace {
    fn next_op(&mut self) -> Option<TraceOp> {
        loop {
            let line = match self.lines.next()? {
                Ok(line) => line,
                Err(e) => {
                    log::warn!(
                        "{}: read error after line {}, treating as end of trace: {}",
                        self.path.display(),
                        self.line_no,
                        e
                    );
                    return None;
                }
            };
            self.line_no += 1;

            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            match parse_line(trimmed) {
                Some(op) => return Some(op),
                None => {
                    log::warn!(
                        "{}:{}: malformed trace line {:?}, skipped",
                        self.path.display(),
                        self.line_no,
                        trimmed
                    );
                }
            }
        }
    }
}

/// Fixed, in-memory trace. Used by tests and programmatic experiments.
pub struct ScriptedTrace {
    ops: VecDeque<TraceOp>,
}

impl ScriptedTrace {
    /// Creates a trace that yields `ops` in order.
    pub fn new(ops: impl IntoIterator<Item = TraceOp>) -> Self {
        Self {
            ops: ops.into_iter().collect(),
        }
    }

    /// An immediately-exhausted trace.
    pub fn empty() -> Self {
        Self::new([])
    }
}

impl TraceSource for ScriptedTrace {
    fn next_op(&mut self) -> Option<TraceOp> {
        self.ops.pop_front()
    }
}

/// Opens the per-core trace files `{app}_proc{0..n-1}.trace`.
///
/// # Errors
///
/// Returns the first [`SimError::TraceOpenFailed`] encountered; the run does
/// not start unless every core has a trace.
pub fn open_core_traces(app: &str, num_cores: usize) -> Result<Vec<Box<dyn TraceSource>>, SimError> {
    let mut sources: Vec<Box<dyn TraceSource>> = Vec::with_capacity(num_cores);
    for core in 0..num_cores {
        let path = format!("{}_proc{}.trace", app, core);
        sources.push(Box::new(FileTrace::open(path)?));
    }
    Ok(sources)
}
