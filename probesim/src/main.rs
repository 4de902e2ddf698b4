use std::fs::File;
use std::io::BufReader;
use std::time::Instant;
use clap::{Parser, ValueEnum};
use serde::Serialize;
use tracing::debug;
use tracing_subscriber::EnvFilter;
use probelib::cache::CacheTrait;
use probelib::config::{CacheConfig, EngineConfig};
use probelib::inference::{infer, InferredParameters, Mask};
use probelib::simulator::{EngineSlot, Simulator};

#[cfg(debug_assertions)]
const DEBUG_DEFAULT: bool = true;

#[cfg(not(debug_assertions))]
const DEBUG_DEFAULT: bool = false;

/// A configuration field which can be hidden from the inference engine
#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
enum Field {
    BlockSize,
    Associativity,
    SetCount,
    ReplacementPolicy,
    WritePolicy,
    All,
}

#[derive(Parser, Debug)]
#[command(about = String::from("Infers the configuration of a simulated cache from its oracles"))]
struct Args {
    /// JSON cache configuration, including the oracle budgets
    config: String,

    /// Test cases 1-8 binary search the block size, 9-11 estimate it from a single read
    #[arg(short, long, default_value_t = 1)]
    test_case: u32,

    /// Fields to hide from the inference engine, may be repeated. Hides everything when omitted
    #[arg(long, value_enum)]
    hide: Vec<Field>,

    #[arg(short, long)]
    performance: bool,

    #[arg(short, long, default_value_t = DEBUG_DEFAULT)]
    debug: bool,
}

/// What was inferred, next to what the cache really is
#[derive(Debug, Serialize)]
struct InferenceReport {
    inferred: InferredParameters,
    actual: CacheConfig,
    reads_used: u32,
    writes_used: u32,
}

fn mask(hidden: &[Field]) -> Mask {
    if hidden.is_empty() || hidden.contains(&Field::All) {
        return Mask::ALL;
    }
    Mask {
        block_size: hidden.contains(&Field::BlockSize),
        associativity: hidden.contains(&Field::Associativity),
        set_count: hidden.contains(&Field::SetCount),
        replacement_policy: hidden.contains(&Field::ReplacementPolicy),
        write_policy: hidden.contains(&Field::WritePolicy),
    }
}

fn main() -> Result<(), String> {
    let start = Instant::now();
    let args = Args::parse();
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(if args.debug { "debug" } else { "warn" }));
    tracing_subscriber::fmt().with_env_filter(filter).with_writer(std::io::stderr).init();

    let config_file = File::open(&args.config).map_err(|e| format!("Couldn't open the config file at path {}: {e}", args.config))?;
    let config: EngineConfig = serde_json::from_reader(BufReader::new(config_file)).map_err(|e| format!("Couldn't parse the config file: {e}"))?;
    debug!(?config, "parsed input configuration");
    let engine = Simulator::from_config(&config).map_err(|e| format!("Invalid cache configuration: {e}"))?;
    let actual = *engine.config();

    let mut params = InferredParameters::masked(&actual, mask(&args.hide));
    let mut slot = EngineSlot::new();
    slot.install(engine);
    infer(&mut slot, args.test_case, &mut params).map_err(|e| format!("Inference failed: {e}"))?;
    let engine = slot.take().ok_or_else(|| "The engine was removed during inference".to_string())?;

    let report = InferenceReport {
        inferred: params,
        actual,
        reads_used: engine.budget().reads_used(),
        writes_used: engine.budget().writes_used(),
    };
    println!("{}", serde_json::to_string_pretty(&report).map_err(|e| format!("Couldn't serialise the output {e}"))?);
    if args.performance {
        let simulation_time = engine.get_execution_time();
        let total_time = start.elapsed();
        println!("Simulation time: {}s", simulation_time.as_nanos() as f64 / 1e9);
        println!("Total execution time (includes initial parsing, configuration, and output): {}s", total_time.as_nanos() as f64 / 1e9)
    }
    if args.debug {
        #[cfg(debug_assertions)]
        debug!("running the debug binary, debug mode is enabled by default. If benchmarking, re-compile with --release");
        debug!(valid_lines = engine.cache().get_valid_line_count(), "cache state after inference");
    }
    Ok(())
}
