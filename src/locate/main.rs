//! Command-line front end for region lookups.
//!
//! Resolves a single coordinate, or a CSV of `lng,lat` rows in parallel,
//! and prints JSON results on stdout. Logs go to stderr.

use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use geo::Coord;
use serde_json::json;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use region_locator::{Config, DetailErrorPolicy, LoadMode, RegionIndex, Resolver};

#[derive(Parser, Debug)]
#[command(name = "locate")]
#[command(about = "Resolve coordinates to province and district")]
struct Args {
    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Boundary data directory (overrides config)
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Skip level1 regions whose boundary data cannot be read
    #[arg(long)]
    skip_unreadable: bool,

    /// Load all boundary data at startup
    #[arg(long)]
    eager: bool,

    /// Debug logging (RUST_LOG takes precedence)
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Resolve one coordinate
    Point {
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
    },
    /// Resolve `lng,lat` rows from a CSV file ("-" for stdin)
    Batch {
        input: PathBuf,

        /// First row is a header
        #[arg(long)]
        header: bool,
    },
}

fn main() -> Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)?;

    let mut config = match &args.config {
        Some(path) => Config::load_from_file(path)
            .with_context(|| format!("Failed to load config {}", path.display()))?,
        None => Config::default(),
    };
    if let Some(dir) = &args.data_dir {
        config.index.data_dir = dir.clone();
    }
    if args.skip_unreadable {
        config.index.on_detail_error = DetailErrorPolicy::Skip;
    }
    if args.eager {
        config.index.load_mode = LoadMode::Eager;
    }

    info!("Loading boundary data from {}", config.index.data_dir.display());
    let index = RegionIndex::from_config(&config.index).context("Failed to build region index")?;
    info!("Region index ready with {} level1 regions", index.len());

    let resolver = Resolver::new(Arc::new(index));

    match args.command {
        Command::Point { lat, lng } => {
            let result = resolver.resolve(lng, lat)?;
            println!("{}", serde_json::to_string(&result)?);
        }
        Command::Batch { input, header } => run_batch(&resolver, input, header)?,
    }

    Ok(())
}

fn parse_row(record: &csv::StringRecord) -> Result<Coord<f64>, String> {
    if record.len() < 2 {
        return Err(format!("expected lng,lat but got {} field(s)", record.len()));
    }
    let lng = record[0]
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad longitude '{}': {}", &record[0], e))?;
    let lat = record[1]
        .trim()
        .parse::<f64>()
        .map_err(|e| format!("bad latitude '{}': {}", &record[1], e))?;
    Ok(Coord { x: lng, y: lat })
}

fn run_batch(resolver: &Resolver, input: PathBuf, header: bool) -> Result<()> {
    let reader: Box<dyn Read> = if input.as_os_str() == "-" {
        Box::new(io::stdin())
    } else {
        Box::new(
            File::open(&input)
                .with_context(|| format!("Failed to open {}", input.display()))?,
        )
    };

    let mut csv_reader = csv::ReaderBuilder::new()
        .has_headers(header)
        .flexible(true)
        .from_reader(reader);

    let rows: Vec<Result<Coord<f64>, String>> = csv_reader
        .records()
        .map(|record| record.map_err(|e| e.to_string()).and_then(|r| parse_row(&r)))
        .collect();

    let points: Vec<Coord<f64>> = rows.iter().filter_map(|row| row.as_ref().ok().copied()).collect();
    info!("Resolving {} of {} rows", points.len(), rows.len());

    let mut results = resolver.resolve_many(&points).into_iter();

    let stdout = io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    for row in rows {
        let line = match row {
            Ok(_) => match results.next() {
                Some(Ok(result)) => serde_json::to_value(&result)?,
                Some(Err(e)) => json!({ "error": e.to_string() }),
                None => anyhow::bail!("Batch results ended early"),
            },
            Err(e) => json!({ "error": e }),
        };
        writeln!(out, "{}", line)?;
    }
    out.flush()?;

    Ok(())
}
