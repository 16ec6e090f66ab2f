//! Tomasulo simulator CLI.
//!
//! This binary runs one machine image to completion. It performs:
//! 1. **Load:** Reads the JSON machine image (configuration, registers, memory, program).
//! 2. **Run:** Ticks the CPU until the program drains or the cycle budget is spent.
//! 3. **Report:** Prints the timing table, non-zero registers and memory, and statistics,
//!    optionally writing the same report to a file.

use std::path::PathBuf;
use std::{fs, process};

use clap::Parser;
use tracing_subscriber::EnvFilter;

use tomasim_core::common::error::SimResult;
use tomasim_core::sim::{MachineImage, Simulator};
use tomasim_core::stats::STATS_SECTIONS;

#[derive(Parser, Debug)]
#[command(
    name = "tomasim",
    author,
    version,
    about = "Cycle-accurate Tomasulo pipeline simulator",
    long_about = "Run a machine image through a single-issue Tomasulo pipeline with a reorder buffer, \
                  load/store queue and one-bit branch prediction.\n\nExamples:\n  \
                  tomasim program.json\n  \
                  tomasim program.json --stats summary --stats branch\n  \
                  RUST_LOG=tomasim_core=trace tomasim program.json"
)]
struct Cli {
    /// Machine image (JSON) to run.
    image: PathBuf,

    /// Override the configured cycle budget.
    #[arg(long)]
    max_cycles: Option<u64>,

    /// Also write the report to this file.
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// Statistics sections to print (default: all).
    #[arg(long = "stats", value_parser = clap::builder::PossibleValuesParser::new(STATS_SECTIONS.iter().copied()))]
    stats: Vec<String>,

    /// Log issue, broadcast, commit and rollback events.
    #[arg(long)]
    trace: bool,
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(&cli) {
        eprintln!("\n[!] FATAL: {e}");
        process::exit(1);
    }
}

/// Loads, runs and reports one machine image.
fn run(cli: &Cli) -> SimResult<()> {
    let mut image = MachineImage::from_file(&cli.image)?;
    if let Some(limit) = cli.max_cycles {
        image.config.general.max_cycles = limit;
    }
    init_tracing(cli.trace || image.config.general.trace);

    let mut sim = Simulator::from_image(&image)?;
    println!("[*] Running {}", cli.image.display());
    let result = sim.run();

    let report = sim.render_report(&cli.stats);
    print!("{report}");
    if let Some(path) = &cli.output {
        fs::write(path, &report)?;
        println!("[*] Report written to {}", path.display());
    }

    let cycles = result?;
    println!("[*] Finished in {cycles} cycles");
    Ok(())
}

/// Installs the log subscriber. `RUST_LOG` wins over `--trace`.
fn init_tracing(trace: bool) {
    let default = if trace { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .try_init();
}
