//! Manus command line
//!
//! Runs routines, manual moves and HOME against the simulated relay board.

use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::{Parser, Subcommand};
use manus_controller::{load_config, Notifier, RestReport, SimHand, TracingSink};
use manus_core::config::HandConfig;
use manus_core::routine::clamp_secs;
use manus_core::state::RunOutcome;
use manus_core::Direction;
use manus_hal::SimBoard;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(
    name = "manus",
    about = "Relay-driven hand actuator controller",
    version,
    propagate_version = true
)]
struct Cli {
    /// Hand configuration (default: reference five-finger layout)
    #[arg(long, short, global = true, env = "MANUS_CONFIG")]
    config: Option<PathBuf>,

    /// Log status messages instead of printing them
    #[arg(long, short, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List routines and their groups
    List,

    /// Run a routine by name or 1-based index
    Run {
        /// Routine name or index
        routine: String,

        /// Number of cycles
        #[arg(long, short = 'n', default_value_t = 1)]
        cycles: u32,

        /// Stop and HOME after this many seconds
        #[arg(long)]
        stop_after: Option<f64>,
    },

    /// Drive one actuator in one direction
    Move {
        /// Actuator number (1-based)
        actuator: u8,

        /// Duration in seconds
        seconds: f64,

        /// open or close
        direction: Direction,
    },

    /// Close every actuator, then turn everything off
    Home {
        /// Close pulse in seconds (default: configured)
        #[arg(long)]
        close: Option<f64>,
    },
}

fn main() {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    if let Err(e) = run(cli) {
        eprintln!("error: {e:#}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = match &cli.config {
        Some(path) => load_config(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => HandConfig::default(),
    };

    if let Commands::List = cli.command {
        return list(&config);
    }

    let notifier = if cli.quiet {
        Notifier::new(TracingSink)
    } else {
        Notifier::new(|message: &str| println!("{message}"))
    };
    let board = SimBoard::new();
    let hand = SimHand::simulated(&config, &board, notifier)?;

    let result = match cli.command {
        Commands::List => Ok(()),
        Commands::Run {
            routine,
            cycles,
            stop_after,
        } => run_routine(&hand, &routine, cycles, stop_after),
        Commands::Move {
            actuator,
            seconds,
            direction,
        } => hand
            .manual(actuator, seconds, direction)
            .map(|_| ())
            .map_err(Into::into),
        Commands::Home { close } => {
            let report = match close {
                Some(secs) => hand.bank().home_now(clamp_secs(secs)),
                None => hand.home(),
            };
            rest_result(&report)
        }
    };

    let shutdown = rest_result(&hand.shutdown()).context("shutting down");
    result.and(shutdown)
}

fn rest_result(report: &RestReport) -> anyhow::Result<()> {
    if report.is_clean() {
        Ok(())
    } else {
        Err(anyhow::anyhow!(
            "{} actuator(s) did not reach rest",
            report.faults.len()
        ))
    }
}

fn run_routine(
    hand: &SimHand,
    routine: &str,
    cycles: u32,
    stop_after: Option<f64>,
) -> anyhow::Result<()> {
    let report = match stop_after {
        Some(secs) => hand.run_routine_with_limit(routine, cycles, clamp_secs(secs))?,
        None => hand.run_routine(routine, cycles)?,
    };

    println!(
        "{}: {} ({}/{} cycles, {} groups)",
        report.routine,
        report.outcome,
        report.cycles_completed,
        report.cycles_requested,
        report.groups_executed
    );

    if report.outcome == RunOutcome::Failed {
        bail!("{} move(s) failed", report.failures.len());
    }
    Ok(())
}

fn list(config: &HandConfig) -> anyhow::Result<()> {
    let library = manus_controller::config::validate(config)?;
    let deadtime = config.timing.deadtime();

    for (index, routine) in library.iter().enumerate() {
        println!(
            "{}. {} (~{:.1}s per cycle)",
            index + 1,
            routine.name(),
            routine.cycle_duration(deadtime).as_secs_f64()
        );
        for (g, group) in routine.groups().iter().enumerate() {
            let ids: Vec<String> = group.actuators().map(|id| id.to_string()).collect();
            println!("   group {}: actuators {}", g + 1, ids.join(", "));
        }
    }
    Ok(())
}
