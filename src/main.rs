//! mergebench - time bottom-up merge sort of linked lists across list sizes.

use std::io::{self, Write};

use anyhow::{Context, Result};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use mergebench::bench::{self, AllocMode, BenchConfig};
use mergebench::list::ListShape;
use mergebench::report;

/// Sort linked lists of growing size and report per-size timings.
#[derive(Parser)]
#[command(name = "mergebench")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Starting list size
    #[arg(short = 'b', long, default_value_t = 1000)]
    begin: usize,

    /// List size increment per step
    #[arg(short = 'i', long, default_value_t = 200_000)]
    increment: usize,

    /// Stop before reaching this list size
    #[arg(short = 'u', long, default_value_t = 18_000_000)]
    until: usize,

    /// Preallocate an arena for each size instead of recycling freed nodes
    #[arg(short = 'p', long)]
    preallocate: bool,

    /// Build lists already in ascending order
    #[arg(short = 's', long, conflicts_with = "reversed")]
    presorted: bool,

    /// Build lists in descending order
    #[arg(short = 'S', long)]
    reversed: bool,

    /// Link random-key nodes in ascending memory order
    #[arg(short = 'm', long, conflicts_with_all = ["presorted", "reversed"])]
    address_ordered: bool,

    /// Build one list per size and re-randomize it between trials
    #[arg(short = 'R', long)]
    reuse_list: bool,

    /// Trials per size; the first is a warm-up and not timed
    #[arg(short = 't', long, default_value_t = bench::DEFAULT_TRIALS)]
    trials: usize,

    /// Seed for reproducible keys
    #[arg(long)]
    seed: Option<u64>,

    /// Increase verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    fn config(&self) -> BenchConfig {
        let shape = if self.presorted {
            ListShape::Presorted
        } else if self.reversed {
            ListShape::Reversed
        } else if self.address_ordered {
            ListShape::AddressOrdered
        } else {
            ListShape::Random
        };
        BenchConfig {
            begin: self.begin,
            increment: self.increment,
            until: self.until,
            mode: if self.preallocate {
                AllocMode::Arena
            } else {
                AllocMode::Recycling
            },
            shape,
            trials: self.trials,
            seed: self.seed,
            reuse_list: self.reuse_list,
        }
    }
}

fn init_tracing(verbose: u8) -> Result<()> {
    let level = match verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().with_writer(io::stderr).with_target(false))
        .try_init()
        .context("Failed to initialize tracing subscriber")
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose)?;

    let config = cli.config();
    config.validate()?;

    let host = report::hostname();
    let stdout = io::stdout();
    let mut out = stdout.lock();

    report::write_header(&mut out, &config, &report::timestamp(), &host)
        .context("Failed to write report header")?;
    out.flush().context("Failed to write report header")?;

    let summary = bench::run_sweep(&config, |size| report::write_size_line(&mut out, size))?;

    report::write_footer(&mut out, &report::timestamp(), &host)
        .context("Failed to write report footer")?;

    if summary.violations > 0 {
        warn!(
            violations = summary.violations,
            "sorted output failed validation; see errors above"
        );
    }
    Ok(())
}
