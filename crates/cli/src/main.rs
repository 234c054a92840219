//! L1 cache coherence simulator CLI.
//!
//! Runs four trace-driven cores against private MESI caches and prints the
//! final statistics report. Traces are read from `{app}_proc{0..3}.trace` in
//! the working directory.

use clap::error::ErrorKind;
use clap::Parser;
use std::fs::File;
use std::path::PathBuf;
use std::process;

use l1sim_core::config::{CacheParams, SimConfig};
use l1sim_core::Simulator;

#[derive(Parser, Debug)]
#[command(
    name = "l1sim",
    about = "Quad-core L1 cache simulator with MESI snooping coherence",
    long_about = "Replays per-core memory-reference traces against private, set-associative,\n\
                  write-back L1 caches kept coherent over a shared snooping bus, and reports\n\
                  per-core access statistics plus global bus traffic.\n\n\
                  Example:\n  l1sim -t app1 -s 6 -E 2 -b 5 -o results.txt"
)]
struct Cli {
    /// Application name; core N reads <APP>_procN.trace.
    #[arg(short = 't', value_name = "APP")]
    trace_prefix: String,

    /// Number of set index bits (sets = 2^s).
    #[arg(short = 's', value_name = "S")]
    set_bits: u32,

    /// Associativity (cache lines per set).
    #[arg(short = 'E', value_name = "E")]
    associativity: usize,

    /// Number of block offset bits (block size = 2^b bytes).
    #[arg(short = 'b', value_name = "B")]
    block_bits: u32,

    /// Write the statistics report to a file instead of stdout.
    #[arg(short = 'o', value_name = "FILE")]
    output: Option<PathBuf>,
}

fn main() {
    env_logger::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        // Help and version are not errors; everything else exits 1.
        Err(e) if matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            e.exit()
        }
        Err(e) => {
            let _ = e.print();
            process::exit(1);
        }
    };

    let config = SimConfig {
        app_name: cli.trace_prefix,
        cache: CacheParams {
            set_bits: cli.set_bits,
            associativity: cli.associativity,
            block_bits: cli.block_bits,
        },
        output_file: cli.output,
        ..SimConfig::default()
    };

    if let Err(e) = config.validate() {
        eprintln!("Error: {}", e);
        process::exit(1);
    }

    let mut sim = match Simulator::from_app(&config) {
        Ok(sim) => sim,
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    };

    sim.run();
    let report = sim.report();

    match &config.output_file {
        Some(path) => match File::create(path) {
            Ok(mut file) => {
                if let Err(e) = report.write_to(&mut file) {
                    eprintln!("Error: could not write report to {}: {}", path.display(), e);
                    process::exit(1);
                }
                println!("Results written to {}", path.display());
            }
            Err(e) => {
                eprintln!(
                    "Warning: could not open output file {}: {}",
                    path.display(),
                    e
                );
                report.print();
            }
        },
        None => report.print(),
    }
}
