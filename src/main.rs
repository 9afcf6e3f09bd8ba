use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use eso_reader::config::get_config;
use eso_reader::driver::{count_lines, parse_eso};
use eso_reader::logging;
use eso_reader::progress::{NullProgressSink, ProgressSink};
#[cfg(feature = "progress")]
use eso_reader::progress::ConsoleProgressSink;
use std::fs::File;
use std::io::BufReader;
use std::path::PathBuf;
use tracing::error;

#[derive(Parser)]
#[command(name = "eso-reader")]
#[command(about = "Streaming parser for EnergyPlus .eso simulation result files")]
#[command(version = env!("CARGO_PKG_VERSION"))]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Parse a .eso file and print a summary of every environment found
    Parse {
        file: PathBuf,
        /// Keep peak (min/max-at-timestamp) records instead of discarding them
        #[arg(long)]
        keep_peaks: bool,
        /// Output in JSON format
        #[arg(long)]
        json: bool,
        /// Lines between progress-sink ticks
        #[arg(long, default_value_t = 10_000)]
        chunk_size: usize,
    },
    /// List variables in the file's Data Dictionary, optionally filtered
    Lookup {
        file: PathBuf,
        #[arg(long)]
        interval: Option<String>,
        #[arg(long)]
        key: Option<String>,
        #[arg(long = "type")]
        var_type: Option<String>,
        #[arg(long)]
        units: Option<String>,
    },
}

fn main() -> Result<()> {
    get_config();
    logging::init_logging();

    let cli = Cli::parse();

    match cli.command {
        Commands::Parse { file, keep_peaks, json, chunk_size } => {
            run_parse(file, !keep_peaks, json, chunk_size)
        }
        Commands::Lookup { file, interval, key, var_type, units } => {
            run_lookup(file, interval, key, var_type, units)
        }
    }
    .map_err(|e| {
        error!(error = %e, "command failed");
        e
    })
}

fn run_parse(path: PathBuf, ignore_peaks: bool, json: bool, chunk_size: usize) -> Result<()> {
    let line_count = {
        let file = File::open(&path)
            .with_context(|| format!("failed to open {}", path.display()))?;
        count_lines(BufReader::new(file))?
    };

    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;

    #[cfg(feature = "progress")]
    let mut sink: Box<dyn ProgressSink> = if json {
        Box::new(NullProgressSink::default())
    } else {
        Box::new(ConsoleProgressSink::new())
    };
    #[cfg(not(feature = "progress"))]
    let mut sink: Box<dyn ProgressSink> = Box::new(NullProgressSink::default());

    sink.set_maximum(line_count);

    let parsed = parse_eso(file, chunk_size, ignore_peaks, sink.as_mut())
        .with_context(|| format!("failed to parse {}", path.display()))?;

    if json {
        let summary: Vec<_> = parsed
            .environments
            .iter()
            .map(|env| {
                serde_json::json!({
                    "name": env.name,
                    "intervals": env.dates.keys().collect::<Vec<_>>(),
                })
            })
            .collect();
        let pretty = get_config().output.json_pretty;
        if pretty {
            println!("{}", serde_json::to_string_pretty(&summary)?);
        } else {
            println!("{}", serde_json::to_string(&summary)?);
        }
    } else {
        println!("version: {}", parsed.version.version);
        for env in &parsed.environments {
            println!("environment: {}", env.name);
            for (interval, stamps) in &env.dates {
                println!("  {interval}: {} timestamps", stamps.len());
            }
        }
    }

    Ok(())
}

fn run_lookup(
    path: PathBuf,
    interval: Option<String>,
    key: Option<String>,
    var_type: Option<String>,
    units: Option<String>,
) -> Result<()> {
    let file = File::open(&path).with_context(|| format!("failed to open {}", path.display()))?;
    let mut sink = NullProgressSink::default();
    let parsed = parse_eso(file, 10_000, true, &mut sink)
        .with_context(|| format!("failed to parse {}", path.display()))?;

    let index = parsed
        .indices
        .first()
        .context("file contains no environments to look up variables in")?;

    let results = index.lookup(
        interval.as_deref(),
        key.as_deref(),
        var_type.as_deref(),
        units.as_deref(),
    );

    for (id, variable) in results {
        println!(
            "{id}\t{}\t{}\t{}\t{}",
            variable.interval, variable.key, variable.var_type, variable.units
        );
    }

    Ok(())
}
