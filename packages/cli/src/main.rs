#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! CLI entry point for police map aggregation.
//!
//! Fetches street-level crime and stop-and-search records from the police
//! API for every KML boundary region and month, caching each response so
//! re-runs are free, and writes the merged collections as JSON or CSV.
//!
//! Uses `indicatif-log-bridge` (via [`police_map_cli_utils::init_logger`])
//! to route `log` output through `indicatif::MultiProgress` so that log
//! lines and progress bars never fight for the terminal.

mod args;
mod commands;
mod interactive;
mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::args::ConfigArgs;
use crate::output::OutputFormat;

#[derive(Parser)]
#[command(
    name = "police_map",
    about = "Police crime and stop-and-search aggregation over KML boundaries"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch every region for every month and write the merged records
    Run {
        #[command(flatten)]
        config: ConfigArgs,
        /// Directory the merged collections are written to
        #[arg(long, default_value = "output")]
        output_dir: PathBuf,
        /// Output file format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Fetch records around a single point for the configured months
    Point {
        /// Latitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lat: f64,
        /// Longitude in decimal degrees
        #[arg(long, allow_negative_numbers = true)]
        lng: f64,
        #[command(flatten)]
        config: ConfigArgs,
        /// Directory the records are written to; printed only when omitted
        #[arg(long)]
        output_dir: Option<PathBuf>,
        /// Output file format
        #[arg(long, value_enum, default_value_t = OutputFormat::Json)]
        format: OutputFormat,
    },
    /// Print the API polygon string for one KML boundary file
    Polygon {
        /// KML file to parse
        file: PathBuf,
    },
    /// List the regions found in the boundaries directory
    Regions {
        #[command(flatten)]
        config: ConfigArgs,
    },
    /// Report which cache entries a run would need and which exist
    CacheStatus {
        #[command(flatten)]
        config: ConfigArgs,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let multi = police_map_cli_utils::init_logger();
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        return interactive::run(&multi);
    };

    match command {
        Commands::Run {
            config,
            output_dir,
            format,
        } => commands::run(&multi, config.resolve()?, &output_dir, format)?,
        Commands::Point {
            lat,
            lng,
            config,
            output_dir,
            format,
        } => commands::point(
            &multi,
            config.resolve()?,
            lat,
            lng,
            output_dir.as_deref(),
            format,
        )?,
        Commands::Polygon { file } => commands::polygon(&file)?,
        Commands::Regions { config } => commands::regions(&config.resolve()?)?,
        Commands::CacheStatus { config } => commands::cache_status(config.resolve()?)?,
    }

    Ok(())
}
