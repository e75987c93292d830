use std::fs::File;
use std::io::{self, BufRead, BufReader};

use clap::{Parser, Subcommand};
use scaleline::config::SessionConfig;
use scaleline::error::MeasureError;
use scaleline::replay::{ReplayError, replay};
use scaleline::units::{Precision, Scale, Unit};

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Measure(#[from] MeasureError),
    #[error("failed to open {path}: {source}")]
    Open { path: String, source: io::Error },
    #[error("replay failed: {0}")]
    Replay(#[from] ReplayError),
    #[error("failed to encode report: {0}")]
    Encode(#[from] serde_json::Error),
}

#[derive(Parser, Debug)]
#[command(name = "scaleline", about = "Calibrated measurement overlay: replay sessions and format lengths")]
struct Cli {
    /// Disable horizontal/vertical snapping while drawing.
    #[arg(long, global = true)]
    no_axis_lock: bool,

    #[arg(long, global = true, env = "SCALELINE_PRECISION")]
    precision: Option<Precision>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Play a JSON-lines event script and print the final report.
    Replay {
        /// Script path, or `-` for stdin.
        #[arg(long, default_value = "-")]
        input: String,
        #[arg(long)]
        pretty: bool,
    },
    /// Format a pixel length the way a segment label would.
    Format {
        #[arg(long)]
        pixels: f64,
        #[arg(long, default_value = "px")]
        unit: Unit,
        /// Calibrated pixel multiplier.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,
    },
}

fn main() {
    tracing_subscriber::fmt().with_writer(io::stderr).init();

    if let Err(err) = run(Cli::parse()) {
        tracing::error!(%err, "scaleline failed");
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = SessionConfig::from_env()?;
    if cli.no_axis_lock {
        config.axis_lock = false;
    }
    if let Some(precision) = cli.precision {
        config.precision = precision;
    }

    match cli.command {
        Command::Replay { input, pretty } => run_replay(&input, config, pretty),
        Command::Format { pixels, unit, scale } => {
            let scale = Scale { factor: scale, unit, precision: config.precision };
            println!("{}", scale.display(pixels)?);
            Ok(())
        }
    }
}

fn run_replay(input: &str, config: SessionConfig, pretty: bool) -> Result<(), CliError> {
    let reader: Box<dyn BufRead> = if input == "-" {
        Box::new(io::stdin().lock())
    } else {
        let file = File::open(input).map_err(|source| CliError::Open { path: input.to_owned(), source })?;
        Box::new(BufReader::new(file))
    };

    let report = replay(reader, config)?;
    for rejection in &report.rejected {
        eprintln!("line {}: rejected: {}", rejection.line, rejection.error);
    }
    let rendered = if pretty { serde_json::to_string_pretty(&report)? } else { serde_json::to_string(&report)? };
    println!("{rendered}");
    Ok(())
}
