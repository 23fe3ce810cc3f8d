use std::fs::File;
use std::time::Instant;

use clap::Parser;

use cachelab::cache::{AccessKind, Cache};
use cachelab::config::CacheGeometry;
use cachelab::io::get_reader;
use cachelab::replay::Replayer;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator with write-back dirty-byte accounting"))]
struct Args {
    /// Number of set index bits (S = 2^s is the number of sets)
    #[arg(short = 's')]
    set_bits: u32,

    /// Associativity (number of lines per set)
    #[arg(short = 'E')]
    associativity: u32,

    /// Number of block bits (B = 2^b is the block size)
    #[arg(short = 'b')]
    block_bits: u32,

    /// Name of the memory trace to replay
    #[arg(short = 't')]
    trace: String,

    /// Display each access and its outcome while replaying
    #[arg(short, long)]
    verbose: bool,

    /// Print the summary as JSON instead of plain text
    #[arg(long)]
    json: bool,

    /// Report wall-clock simulation and total times
    #[arg(short, long)]
    performance: bool,
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let geometry = CacheGeometry::new(args.set_bits, args.associativity, args.block_bits)
        .map_err(|e| e.to_string())?;
    let cache = Cache::new(geometry).map_err(|e| e.to_string())?;
    let trace_file = File::open(&args.trace)
        .map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let reader = get_reader(trace_file).map_err(|e| e.to_string())?;
    let mut replayer = Replayer::new(cache);
    let verbose = args.verbose;
    let stats = replayer
        .replay(reader, |record, outcome| {
            if verbose {
                let op = match record.kind {
                    AccessKind::Load => 'L',
                    AccessKind::Store => 'S',
                };
                println!("{op} {:x},{} {outcome}", record.address, record.size);
            }
        })
        .map_err(|e| e.to_string())?;
    if args.json {
        let rendered = serde_json::to_string_pretty(&stats)
            .map_err(|e| format!("Couldn't serialise the summary: {e}"))?;
        println!("{rendered}");
    } else {
        println!(
            "hits: {} misses: {} evictions: {} dirty bytes in cache: {} dirty bytes evicted: {}",
            stats.hits, stats.misses, stats.evictions, stats.dirty_bytes, stats.dirty_evictions
        );
    }
    if args.performance {
        let total = start.elapsed();
        println!(
            "Simulation time: {}s",
            replayer.execution_time().as_nanos() as f64 / 1e9
        );
        println!(
            "Total execution time (includes argument parsing, configuration, and output): {}s",
            total.as_nanos() as f64 / 1e9
        );
    }
    Ok(())
}
