//! DRAM trace harness CLI.
//!
//! This binary provides a single entry point for the harness. It performs:
//! 1. **Run:** Load configuration and trace, distribute, simulate and print statistics.
//! 2. **Generate:** Write an element-indexed stride trace file.
//! 3. **Sweep:** Simulate every start address of a stage-wise transform pattern and average the results.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use dramtrace_core::common::{HarnessError, SimError};
use dramtrace_core::config::Config;
use dramtrace_core::memory::build_memory;
use dramtrace_core::remap::remap_all;
use dramtrace_core::sim::{self, EventLogger, PreprocessStrategy, Verbosity};
use dramtrace_core::stats::{self, RunStats};
use dramtrace_core::trace::generator::indexed_stride;
use dramtrace_core::trace::stage::{StageVariant, stage_start_addresses};
use dramtrace_core::trace::write_trace;

const DEFAULT_CONFIG: &str = "configs/hbm2.json";
const DEFAULT_TRACE: &str = "traces/test.trace";
const GENERATE_ELEMENT_SIZE: u64 = 32;

#[derive(Parser, Debug)]
#[command(
    name = "dramtrace",
    author,
    version,
    about = "Cycle-driven DRAM trace injection harness",
    long_about = "Inject synthetic or file-based access traces into a memory timing model and report latency.\n\nExamples:\n  dramtrace -D all\n  dramtrace run -D issue\n  dramtrace run --trace traces/ntt.trace --strategy row-locality\n  dramtrace generate 0 4 512 0\n  dramtrace sweep ic-wise-first-half --limit 64"
)]
#[command(args_conflicts_with_subcommands = true)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Options of the implicit `run`, so `dramtrace -D all` works without a subcommand.
    #[command(flatten)]
    run: RunArgs,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Simulate the configured workload (the default when no subcommand is given).
    Run(RunArgs),

    /// Write an element-indexed stride trace: address = (start_idx + i * 2^stride_exp) * 32.
    Generate {
        /// First element index.
        start_idx: u64,
        /// Stride exponent.
        stride_exp: u32,
        /// Number of requests.
        count: u64,
        /// 1 for writes, 0 for reads.
        #[arg(value_parser = clap::value_parser!(u8).range(0..=1))]
        is_write: u8,
        /// Output trace file.
        #[arg(long, default_value = DEFAULT_TRACE)]
        out: PathBuf,
    },

    /// Simulate every start address of a stage sweep and report the mean.
    Sweep {
        /// Stage generator.
        #[arg(value_enum)]
        variant: VariantArg,
        /// Parallel butterfly units.
        #[arg(short = 'B', long, default_value_t = 1)]
        butterfly_units: u64,
        /// Simulate at most this many start addresses.
        #[arg(long)]
        limit: Option<usize>,
        /// Configuration file.
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(clap::Args, Debug)]
struct RunArgs {
    /// Console echo of issue and return events.
    #[arg(short = 'D', long = "debug", value_enum)]
    debug: Option<VerbosityArg>,

    /// Configuration file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Trace file, overriding the configured one.
    #[arg(short, long)]
    trace: Option<PathBuf>,

    /// Directory for log.txt, issue.txt and return.txt.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Channel distribution strategy.
    #[arg(long, value_enum)]
    strategy: Option<StrategyArg>,

    /// Statistics sections to print (summary, latency, channels); all when omitted.
    #[arg(long, value_delimiter = ',')]
    stats: Vec<String>,

    /// Also print each transaction's latency.
    #[arg(long)]
    transactions: bool,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VerbosityArg {
    None,
    Issue,
    Return,
    All,
}

impl From<VerbosityArg> for Verbosity {
    fn from(arg: VerbosityArg) -> Self {
        match arg {
            VerbosityArg::None => Self::None,
            VerbosityArg::Issue => Self::Issue,
            VerbosityArg::Return => Self::Return,
            VerbosityArg::All => Self::All,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StrategyArg {
    RoundRobin,
    RowLocality,
    BankParallel,
}

impl From<StrategyArg> for PreprocessStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::RoundRobin => Self::RoundRobin,
            StrategyArg::RowLocality => Self::RowLocality,
            StrategyArg::BankParallel => Self::BankParallel,
        }
    }
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum VariantArg {
    IcWiseFirstHalf,
    IcWiseSecondHalf,
    IrWiseFirstHalf,
    IrWiseSecondHalf,
}

impl From<VariantArg> for StageVariant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::IcWiseFirstHalf => Self::IcWiseFirstHalf,
            VariantArg::IcWiseSecondHalf => Self::IcWiseSecondHalf,
            VariantArg::IrWiseFirstHalf => Self::IrWiseFirstHalf,
            VariantArg::IrWiseSecondHalf => Self::IrWiseSecondHalf,
        }
    }
}

fn main() {
    let cli = Cli::parse();
    init_tracing();

    let result = match cli.command {
        Some(Commands::Run(args)) => cmd_run(&args),
        None => cmd_run(&cli.run),
        Some(Commands::Generate {
            start_idx,
            stride_exp,
            count,
            is_write,
            out,
        }) => cmd_generate(start_idx, stride_exp, count, is_write == 1, &out),
        Some(Commands::Sweep {
            variant,
            butterfly_units,
            limit,
            config,
        }) => cmd_sweep(variant.into(), butterfly_units, limit, config.as_deref()),
    };

    if let Err(e) = result {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Installs the diagnostics subscriber; `RUST_LOG` overrides the `info` default.
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// Loads `path`, or the defaults when the implicit default config file is absent.
fn load_config(path: Option<&Path>) -> Result<Config, HarnessError> {
    match path {
        Some(path) => Ok(Config::from_json_file(path)?),
        None if Path::new(DEFAULT_CONFIG).exists() => Ok(Config::from_json_file(DEFAULT_CONFIG)?),
        None => {
            tracing::warn!(path = DEFAULT_CONFIG, "config not found, using built-in defaults");
            Ok(Config::default())
        }
    }
}

fn cmd_run(args: &RunArgs) -> Result<(), HarnessError> {
    let mut config = load_config(args.config.as_deref())?;
    if let Some(trace) = &args.trace {
        config.general.trace_path.clone_from(trace);
    }
    if let Some(output) = &args.output {
        config.general.output_dir.clone_from(output);
    }
    if let Some(debug) = args.debug {
        config.general.debug = debug.into();
    }
    if let Some(strategy) = args.strategy {
        config.preprocess.strategy = strategy.into();
    }

    let trace = sim::prepare_trace(&config)?;

    let mut mem = build_memory(&config.memory);
    println!("{}", stats::memory_banner(mem.as_ref()));
    println!(
        "[*] Trace: {} transactions  Strategy: {}  Output: {}",
        trace.len(),
        config.preprocess.strategy.name(),
        config.general.output_dir.display()
    );

    let mut logger = EventLogger::create(&config.general.output_dir, config.general.debug)
        .map_err(SimError::from)?;
    let report = sim::simulate_trace(
        &trace,
        mem.as_mut(),
        config.preprocess.strategy,
        Some(&mut logger),
    )?;

    println!();
    if args.transactions {
        stats::print_transactions(&report);
    }
    RunStats::from_report(&report).print_sections(&args.stats);
    println!("{}", report.memory_stats);
    Ok(())
}

fn cmd_generate(
    start_idx: u64,
    stride_exp: u32,
    count: u64,
    is_write: bool,
    out: &Path,
) -> Result<(), HarnessError> {
    let trace = indexed_stride(start_idx, stride_exp, count, GENERATE_ELEMENT_SIZE, is_write)?;
    write_trace(out, &trace)?;
    println!("[*] Wrote {} requests to {}", trace.len(), out.display());
    Ok(())
}

fn cmd_sweep(
    variant: StageVariant,
    butterfly_units: u64,
    limit: Option<usize>,
    config_path: Option<&Path>,
) -> Result<(), HarnessError> {
    let config = load_config(config_path)?;
    let geometry = config.workload.stage_geometry().unwrap_or_default();
    let table = config.remap_table()?;
    let starts = stage_start_addresses(variant, butterfly_units, &geometry)?;
    let runs = limit.map_or(starts.len(), |n| n.min(starts.len()));

    tracing::info!(?variant, butterfly_units, runs, "stage sweep");
    let mut total_cycles = 0u64;
    let mut total_latency = 0.0f64;
    for &start in starts.iter().take(runs) {
        let raw = variant.generate(start, &geometry)?;
        let trace = match &table {
            Some(table) => remap_all(&raw, table),
            None => raw,
        };
        let mut mem = build_memory(&config.memory);
        let report = sim::simulate_trace(&trace, mem.as_mut(), config.preprocess.strategy, None)?;
        total_cycles += report.cycles;
        total_latency += report.average_latency();
    }

    let n = runs.max(1) as f64;
    println!("[*] Sweep {variant:?}: {runs} runs, butterfly units {butterfly_units}");
    println!("    mean cycles        {:.2}", total_cycles as f64 / n);
    println!("    mean latency       {:.2} cycles", total_latency / n);
    Ok(())
}
