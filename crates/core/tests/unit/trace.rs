//! Trace Parsing and Source Unit Tests.
//!
//! Verifies line parsing, the lazy file reader (including skipping of
//! malformed lines), the per-core file naming scheme, and the scripted
//! source.

use std::fs;

use l1sim_core::common::{Addr, SimError};
use l1sim_core::trace::{
    open_core_traces, parse_line, AccessKind, FileTrace, ScriptedTrace, TraceOp, TraceSource,
};

use crate::common::init_logging;

// ══════════════════════════════════════════════════════════
// 1. Line parsing
// ══════════════════════════════════════════════════════════

#[test]
fn parses_read_and_write() {
    assert_eq!(parse_line("R 0x1000"), Some(TraceOp::read(0x1000)));
    assert_eq!(parse_line("W 0x2000"), Some(TraceOp::write(0x2000)));
}

/// The `0x` prefix is optional and case-insensitive, as are the op letters.
#[test]
fn parses_prefix_and_case_variants() {
    assert_eq!(parse_line("r abc"), Some(TraceOp::read(0xabc)));
    assert_eq!(parse_line("w 0XDEAD"), Some(TraceOp::write(0xdead)));
    assert_eq!(parse_line("R DEADBEEF"), Some(TraceOp::read(0xdead_beef)));
}

#[test]
fn parses_extra_whitespace() {
    assert_eq!(parse_line("  R\t 0x10  "), Some(TraceOp::read(0x10)));
}

/// Unknown op letters and unparsable addresses are rejected.
#[test]
fn rejects_malformed_lines() {
    assert_eq!(parse_line("X 0x10"), None);
    assert_eq!(parse_line("READ 0x10"), None);
    assert_eq!(parse_line("R"), None);
    assert_eq!(parse_line("R zz"), None);
    assert_eq!(parse_line("R 0x"), None);
    assert_eq!(parse_line(""), None);
}

/// Addresses larger than 32 bits do not parse.
#[test]
fn rejects_oversized_address() {
    assert_eq!(parse_line("R 0x100000000"), None);
}

// ══════════════════════════════════════════════════════════
// 2. File-backed traces
// ══════════════════════════════════════════════════════════

/// Good lines stream through; malformed and empty lines are skipped.
#[test]
fn file_trace_skips_bad_lines() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("app_proc0.trace");
    fs::write(&path, "R 0x10\n\nX nope\nW 20\nR zz\nw 0x30\n").unwrap();

    let mut trace = FileTrace::open(&path).unwrap();
    assert_eq!(trace.next_op(), Some(TraceOp::read(0x10)));
    assert_eq!(trace.next_op(), Some(TraceOp::write(0x20)));
    assert_eq!(trace.next_op(), Some(TraceOp::write(0x30)));
    assert_eq!(trace.next_op(), None);
    assert_eq!(trace.next_op(), None, "stays exhausted");
}

#[test]
fn missing_file_reports_path() {
    let err = FileTrace::open("no_such_app_proc0.trace").unwrap_err();
    match err {
        SimError::TraceOpenFailed { path, .. } => {
            assert!(path.to_string_lossy().contains("no_such_app"));
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

/// `open_core_traces` opens `{app}_proc{N}.trace` for every core.
#[test]
fn opens_one_trace_per_core() {
    init_logging();
    let dir = tempfile::tempdir().unwrap();
    for core in 0..4 {
        let path = dir.path().join(format!("app1_proc{}.trace", core));
        fs::write(&path, format!("R 0x{:x}\n", core * 0x10)).unwrap();
    }

    let prefix = dir.path().join("app1");
    let mut traces = open_core_traces(prefix.to_str().unwrap(), 4).unwrap();
    assert_eq!(traces.len(), 4);
    for (core, trace) in traces.iter_mut().enumerate() {
        assert_eq!(
            trace.next_op(),
            Some(TraceOp::read((core as u32) * 0x10)),
            "core {} reads its own file",
            core
        );
    }
}

/// One missing core file fails the whole startup.
#[test]
fn any_missing_core_trace_fails() {
    let dir = tempfile::tempdir().unwrap();
    for core in 0..3 {
        let path = dir.path().join(format!("app2_proc{}.trace", core));
        fs::write(&path, "R 0x0\n").unwrap();
    }

    let prefix = dir.path().join("app2");
    assert!(matches!(
        open_core_traces(prefix.to_str().unwrap(), 4),
        Err(SimError::TraceOpenFailed { .. })
    ));
}

// ══════════════════════════════════════════════════════════
// 3. Scripted traces
// ══════════════════════════════════════════════════════════

#[test]
fn scripted_trace_yields_in_order() {
    let mut trace = ScriptedTrace::new([TraceOp::read(1), TraceOp::write(2)]);
    assert_eq!(
        trace.next_op(),
        Some(TraceOp {
            kind: AccessKind::Read,
            addr: Addr(1)
        })
    );
    assert_eq!(trace.next_op(), Some(TraceOp::write(2)));
    assert_eq!(trace.next_op(), None);
}

#[test]
fn empty_scripted_trace_is_exhausted() {
    assert_eq!(ScriptedTrace::empty().next_op(), None);
}
