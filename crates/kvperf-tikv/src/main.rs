//! Drive the TiKV benchmark plugin from the command line.
//!
//! Runs the given command `--requests` times against the built-in
//! in-memory store and reports throughput.
//!
//! ```text
//! kvperf-tikv --raw -n 100 --requests 10000 set key-__seq_int__ value
//! ```

use std::sync::Arc;
use std::time::Instant;

use clap::Parser;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use kvperf_core::{Expander, KeygenConfig, KvError, MemDriver, Options};
use kvperf_tikv::{BenchClient, Client, DESCRIPTION, NAME};

/// CLI arguments for the plugin driver.
#[derive(Parser, Debug)]
#[command(name = "kvperf-tikv", about = DESCRIPTION)]
struct Args {
    /// Use the raw client; raw and txn clients must not be used together
    #[arg(long)]
    raw: bool,

    /// Scan limit
    #[arg(short = 'n', default_value_t = 0)]
    limit: usize,

    /// Verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Cluster address; `;` separates raw endpoints
    #[arg(long, default_value = "127.0.0.1:2379")]
    addr: String,

    /// Number of requests to issue
    #[arg(long, default_value_t = 1)]
    requests: u64,

    /// Seed for `__rand_int__` values
    #[arg(long)]
    seed: Option<u64>,

    /// First `__seq_int__` value
    #[arg(long, default_value_t = 0)]
    seq_start: u64,

    /// Command and its arguments: set|get|delete|scan ...
    #[arg(required = true, trailing_var_arg = true, allow_hyphen_values = true)]
    command: Vec<String>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    let options = Options {
        raw: args.raw,
        verbose: args.verbose,
        limit: args.limit,
    };
    let keygen = KeygenConfig {
        seq_start: args.seq_start,
        seed: args.seed,
        ..KeygenConfig::default()
    };

    // One expander for the whole process, shared by every client.
    let expander = Arc::new(Expander::from_config(&keygen)?);
    let mut client = Client::new(MemDriver::default(), options, args.command)?
        .with_expander(Arc::clone(&expander));
    client.dial(&args.addr)?;

    let start = Instant::now();
    let mut failed = 0u64;
    for _ in 0..args.requests {
        if let Err(e) = BenchClient::request(&mut client) {
            if e.is_usage() || matches!(e, KvError::SequenceExhausted { .. }) {
                return Err(e.into());
            }
            failed += 1;
            warn!(error = %e, "request failed");
        }
    }
    let elapsed = start.elapsed();

    let secs = elapsed.as_secs_f64();
    let rate = if secs > 0.0 { args.requests as f64 / secs } else { 0.0 };
    info!(
        plugin = NAME,
        requests = args.requests,
        failed,
        elapsed_ms = elapsed.as_millis() as u64,
        ops_per_sec = rate as u64,
        "benchmark finished"
    );

    client.close()?;
    Ok(())
}
