//! Sweep driver: build, sort, validate and release lists of growing size,
//! timing only the sort.

use std::fmt;
use std::io;
use std::time::{Duration, Instant};

use rand::SeedableRng;
use rand::rngs::StdRng;
use tracing::{debug, error, info};

use crate::list::{self, List, ListShape, Node};
use crate::memory::alloc::{AllocError, NodeAllocator};
use crate::memory::node_arena::ArenaAllocator;
use crate::memory::recycling::RecyclingAllocator;
use crate::memory::stats::AllocatorStats;

/// Trials per size, the first one untimed.
pub const DEFAULT_TRIALS: usize = 11;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum AllocMode {
    /// Free-list allocator; released nodes are reused.
    #[default]
    Recycling,
    /// Arena grown up front to each size and wiped after every trial.
    Arena,
}

impl AllocMode {
    #[must_use]
    pub fn describe(self) -> &'static str {
        match self {
            AllocMode::Recycling => "recycled free-list",
            AllocMode::Arena => "preallocated arena",
        }
    }
}

/// Parameters of one sweep.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BenchConfig {
    /// First list size.
    pub begin: usize,
    /// Size step between rounds.
    pub increment: usize,
    /// Exclusive upper bound on list size.
    pub until: usize,
    pub mode: AllocMode,
    pub shape: ListShape,
    /// Trials per size, including the untimed warm-up trial.
    pub trials: usize,
    /// Fixed seed for reproducible keys; OS entropy when `None`.
    pub seed: Option<u64>,
    /// Build one list per size and give it fresh random keys between trials
    /// instead of releasing and rebuilding it.
    pub reuse_list: bool,
}

impl Default for BenchConfig {
    fn default() -> Self {
        Self {
            begin: 1000,
            increment: 200_000,
            until: 18_000_000,
            mode: AllocMode::default(),
            shape: ListShape::default(),
            trials: DEFAULT_TRIALS,
            seed: None,
            reuse_list: false,
        }
    }
}

impl BenchConfig {
    /// # Errors
    ///
    /// Returns `BenchError::InvalidConfig` for a zero increment or fewer than
    /// two trials.
    pub fn validate(&self) -> Result<(), BenchError> {
        if self.increment == 0 {
            return Err(BenchError::InvalidConfig(
                "size increment must be greater than zero".to_string(),
            ));
        }
        if self.trials < 2 {
            return Err(BenchError::InvalidConfig(format!(
                "need at least 2 trials per size (one is warm-up), got {}",
                self.trials
            )));
        }
        Ok(())
    }

    /// List sizes of the sweep, in order.
    pub fn sizes(&self) -> impl Iterator<Item = usize> + use<> {
        (self.begin..self.until).step_by(self.increment.max(1))
    }
}

#[derive(Debug)]
pub enum BenchError {
    InvalidConfig(String),
    Alloc(AllocError),
    Report(io::Error),
}

impl fmt::Display for BenchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BenchError::InvalidConfig(msg) => write!(f, "invalid benchmark configuration: {msg}"),
            BenchError::Alloc(e) => write!(f, "benchmark aborted: {e}"),
            BenchError::Report(e) => write!(f, "failed to write report: {e}"),
        }
    }
}

impl std::error::Error for BenchError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            BenchError::InvalidConfig(_) => None,
            BenchError::Alloc(e) => Some(e),
            BenchError::Report(e) => Some(e),
        }
    }
}

impl From<AllocError> for BenchError {
    fn from(e: AllocError) -> Self {
        BenchError::Alloc(e)
    }
}

/// Running min/max/total over timed trials.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TrialTimes {
    pub count: u32,
    pub total: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl TrialTimes {
    pub fn record(&mut self, elapsed: Duration) {
        if self.count == 0 {
            self.min = elapsed;
            self.max = elapsed;
        } else {
            self.min = self.min.min(elapsed);
            self.max = self.max.max(elapsed);
        }
        self.total += elapsed;
        self.count += 1;
    }

    #[must_use]
    pub fn average(&self) -> Duration {
        if self.count == 0 {
            Duration::ZERO
        } else {
            self.total / self.count
        }
    }
}

/// Result of all trials at one list size.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SizeReport {
    pub nodes: usize,
    pub times: TrialTimes,
    /// Trials whose sorted output failed validation.
    pub violations: usize,
    pub alloc: AllocatorStats,
}

/// Totals for a finished sweep.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SweepSummary {
    pub sizes: usize,
    pub violations: usize,
    pub alloc: AllocatorStats,
}

/// Run the sweep described by `config`, handing each finished size to
/// `on_size`.
///
/// # Errors
///
/// Returns `BenchError` for an invalid configuration, a fatal allocation
/// error, or a failure from `on_size`. Sort validation failures are logged
/// and counted, never returned.
pub fn run_sweep<F>(config: &BenchConfig, on_size: F) -> Result<SweepSummary, BenchError>
where
    F: FnMut(&SizeReport) -> io::Result<()>,
{
    run_sweep_with(config, list::sort, on_size)
}

/// [`run_sweep`] with a caller-supplied sort routine.
///
/// # Errors
///
/// As for [`run_sweep`].
pub fn run_sweep_with<S, F>(
    config: &BenchConfig,
    mut sorter: S,
    on_size: F,
) -> Result<SweepSummary, BenchError>
where
    S: FnMut(&mut [Node], List) -> List,
    F: FnMut(&SizeReport) -> io::Result<()>,
{
    config.validate()?;

    let mut rng = match config.seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };

    info!(
        mode = config.mode.describe(),
        shape = config.shape.describe(),
        begin = config.begin,
        until = config.until,
        increment = config.increment,
        trials = config.trials,
        reuse_list = config.reuse_list,
        "starting sweep"
    );

    match config.mode {
        AllocMode::Recycling => sweep(
            config,
            &mut RecyclingAllocator::new(),
            &mut rng,
            &mut sorter,
            on_size,
        ),
        AllocMode::Arena => sweep(
            config,
            &mut ArenaAllocator::new(),
            &mut rng,
            &mut sorter,
            on_size,
        ),
    }
}

fn sweep<A, S, F>(
    config: &BenchConfig,
    alloc: &mut A,
    rng: &mut StdRng,
    sorter: &mut S,
    mut on_size: F,
) -> Result<SweepSummary, BenchError>
where
    A: NodeAllocator + ?Sized,
    S: FnMut(&mut [Node], List) -> List,
    F: FnMut(&SizeReport) -> io::Result<()>,
{
    let mut summary = SweepSummary::default();
    for nodes in config.sizes() {
        alloc.prepare(nodes)?;
        let report = run_size(alloc, rng, config, nodes, sorter)?;
        debug!(nodes, alloc = %report.alloc, "size complete");

        on_size(&report).map_err(BenchError::Report)?;
        summary.sizes += 1;
        summary.violations += report.violations;
    }
    summary.alloc = alloc.stats();
    info!(sizes = summary.sizes, violations = summary.violations, "sweep complete");
    Ok(summary)
}

/// Run `config.trials` build/sort/validate/release rounds of `nodes` nodes
/// through `sorter`. The first round warms the caches and is not timed.
///
/// With `config.reuse_list` the list is built once, re-keyed before every
/// later round, and released after the last one.
///
/// # Errors
///
/// Returns `AllocError` if a list cannot be built.
pub fn run_size<A, R, S>(
    alloc: &mut A,
    rng: &mut R,
    config: &BenchConfig,
    nodes: usize,
    sorter: &mut S,
) -> Result<SizeReport, AllocError>
where
    A: NodeAllocator + ?Sized,
    R: rand::Rng + ?Sized,
    S: FnMut(&mut [Node], List) -> List,
{
    let mut times = TrialTimes::default();
    let mut violations = 0;
    let mut kept: Option<List> = None;

    for trial in 0..config.trials {
        let input = match kept.take() {
            Some(list) => list::rerandomize(alloc.nodes_mut(), list, rng),
            None => list::build_shaped(config.shape, nodes, alloc, rng)?,
        };

        let start = Instant::now();
        let sorted = sorter(alloc.nodes_mut(), input);
        let elapsed = start.elapsed();

        if let Err(violation) = list::audit(alloc.nodes(), &sorted, nodes) {
            error!(nodes, trial, %violation, "sorted list failed validation");
            violations += 1;
        }
        if trial > 0 {
            times.record(elapsed);
        }
        if config.reuse_list {
            kept = Some(sorted);
        } else {
            alloc.release(sorted);
        }
    }
    if let Some(list) = kept {
        alloc.release(list);
    }

    Ok(SizeReport {
        nodes,
        times,
        violations,
        alloc: alloc.stats(),
    })
}
