use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use lapse_core::LapseConfig;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;

#[derive(Parser)]
#[command(name = "lapse", about = "Sequential dispatcher and timing wheel demo")]
struct Cli {
    /// JSON config file (dispatcher + wheel)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log at debug/trace instead of RUST_LOG
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Post numbered jobs into a dispatcher and print its stats
    Dispatch {
        /// Number of jobs to post
        #[arg(long, default_value_t = 10)]
        count: u64,

        /// Fail every K-th job (0 = never)
        #[arg(long, default_value_t = 0)]
        fail_every: u64,

        /// Reject posts once more than D jobs are pending (0 = unbounded)
        #[arg(long, default_value_t = 0)]
        max_depth: usize,

        /// Halt on the first failure
        #[arg(long)]
        interrupt_on_error: bool,
    },
    /// Schedule one timer per delay and report when each fired
    Wheel {
        /// Delay in seconds (fractions allowed)
        #[arg(long = "delay", required = true, value_parser = parse_delay)]
        delays: Vec<Duration>,
    },
}

fn parse_delay(raw: &str) -> Result<Duration, String> {
    let secs: f64 = raw.parse().map_err(|e| format!("{raw}: {e}"))?;
    Duration::try_from_secs_f64(secs).map_err(|e| format!("{raw}: {e}"))
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug,lapse_core=trace")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| "info,lapse_core=debug".into())
    };
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => LapseConfig::load(path)
            .with_context(|| format!("loading config from {}", path.display()))?,
        None => LapseConfig::default(),
    };

    let report = match cli.command {
        Command::Dispatch {
            count,
            fail_every,
            max_depth,
            interrupt_on_error,
        } => {
            let mut options = config.dispatcher;
            if interrupt_on_error {
                options = options.with_interrupt_on_error(true);
            }
            commands::run_dispatch(options, count, fail_every, max_depth).await?
        }
        Command::Wheel { delays } => commands::run_wheel(config.wheel, &delays).await?,
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}
