use std::fs::File;
use std::io::BufReader;

use clap::Parser;

use cachemodel::cache::Cache;
use cachemodel::config::SimConfig;
use cachemodel::io::{get_reader, parse_trace};
use cachemodel::memory::BackingStore;
use cachemodel::simulator::Simulator;

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

#[derive(Parser, Debug)]
#[command(about = String::from("Set-associative cache simulator"))]
struct Args {
    /// JSON cache/memory configuration
    config: String,
    /// Trace file with one access per line: R <hex-addr> | W <hex-addr> [value]
    trace: String,

    /// Print a JSON record for every access as it is simulated
    #[arg(short, long)]
    records: bool,

    /// Write the final statistics as CSV to this path
    #[arg(short, long)]
    csv: Option<String>,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

fn main() -> Result<(), String> {
    let args = Args::parse();
    let config_file = File::open(&args.config)
        .map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config: SimConfig = serde_json::from_reader(BufReader::new(config_file))
        .map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    let cache = Cache::from_config(&config.cache).map_err(|e| e.to_string())?;
    let memory = config
        .memory
        .as_ref()
        .map(|m| BackingStore::new(m.size_bytes, cache.line_size()));
    let mut simulator = Simulator::new(cache, memory);

    let trace_file = File::open(&args.trace)
        .map_err(|e| format!("Couldn't open the trace file at path {}: {e}", args.trace))?;
    let accesses = parse_trace(get_reader(trace_file)?)?;
    simulator.load_accesses(accesses);

    let print_records = args.records;
    simulator
        .run_all_with(|record| {
            if print_records {
                match serde_json::to_string(record) {
                    Ok(line) => println!("{line}"),
                    Err(e) => eprintln!("Couldn't serialise a record: {e}"),
                }
            }
        })
        .map_err(|e| e.to_string())?;

    let stats = simulator.stats().snapshot();
    println!(
        "{}",
        serde_json::to_string_pretty(&stats).map_err(|e| format!("Couldn't serialise the output {e}"))?
    );
    if let Some(path) = &args.csv {
        let file = File::create(path).map_err(|e| format!("Couldn't create {path}: {e}"))?;
        stats
            .write_csv(file)
            .map_err(|e| format!("Couldn't write the CSV to {path}: {e}"))?;
    }
    if args.debug {
        #[cfg(debug_assertions)]
        println!("Running the debug binary. If benchmarking, re-compile with --release");
        let cache = simulator.cache();
        println!(
            "Geometry: {} blocks, {} byte lines, {}-way, {} sets",
            cache.num_blocks(),
            cache.line_size(),
            cache.associativity(),
            cache.num_sets()
        );
        let valid = (0..cache.num_sets())
            .flat_map(|s| (0..cache.associativity()).map(move |w| (s, w)))
            .filter(|(s, w)| cache.block(*s, *w).valid)
            .count();
        println!("Valid cache lines at exit: {valid}/{}", cache.num_blocks());
    }
    Ok(())
}
