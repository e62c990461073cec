//! Subcommand bodies, shared by the flag-driven and interactive modes.

use std::path::Path;

use police_map_aggregate::{AggregateError, Aggregator, discover_regions, open_cache, summarize};
use police_map_aggregate_models::{AggregateConfig, AggregateOutput, Summary};
use police_map_cli_utils::{IndicatifProgress, MultiProgress};
use police_map_source::HttpPoliceApi;

use crate::output::{OutputFormat, records_json, write_output};

/// Runs a full aggregation and writes the merged collections.
///
/// A run where every region came back empty is reported and treated as
/// success; nothing is written.
///
/// # Errors
///
/// Returns an error for setup failures or if output cannot be written.
pub fn run(
    multi: &MultiProgress,
    config: AggregateConfig,
    output_dir: &Path,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    log::debug!("Effective config:\n{}", config.to_toml_string()?);

    let api = HttpPoliceApi::new(&config.api_base_url, config.timeout())?;
    let cache = open_cache(&config)?;
    let aggregator = Aggregator::new(config, api, cache);

    let progress = IndicatifProgress::steps_bar(multi, "Discovering regions");
    let output = match aggregator.run(Some(progress)) {
        Ok(output) => output,
        Err(AggregateError::NoData) => {
            println!("No data found for any region and period. Nothing written.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let paths = write_output(output_dir, format, &output)?;

    print_report(&output);
    print_summary(&summarize(&output));

    println!();
    for path in &paths {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Fetches records around one point for every configured month.
///
/// Records are printed as JSON when no output directory is given.
///
/// # Errors
///
/// Returns an error for invalid coordinates, setup failures, or if output
/// cannot be written.
pub fn point(
    multi: &MultiProgress,
    config: AggregateConfig,
    lat: f64,
    lng: f64,
    output_dir: Option<&Path>,
    format: OutputFormat,
) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpPoliceApi::new(&config.api_base_url, config.timeout())?;
    let cache = open_cache(&config)?;
    let aggregator = Aggregator::new(config, api, cache);

    let progress = IndicatifProgress::steps_bar(multi, "Querying point");
    let output = match aggregator.run_point(lat, lng, Some(progress)) {
        Ok(output) => output,
        Err(AggregateError::NoData) => {
            println!("No data found at {lat},{lng}. Nothing written.");
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    let Some(dir) = output_dir else {
        println!("{}", records_json(&output)?);
        return Ok(());
    };

    let paths = write_output(dir, format, &output)?;
    print_report(&output);
    print_summary(&summarize(&output));

    println!();
    for path in &paths {
        println!("Wrote {}", path.display());
    }

    Ok(())
}

/// Prints the API polygon string for one boundary file.
///
/// # Errors
///
/// Returns an error if the file cannot be parsed.
pub fn polygon(path: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let polygon = police_map_boundary::parse_kml_file(path)?;
    log::info!("{} vertices", polygon.len());
    println!("{polygon}");
    Ok(())
}

/// Lists the regions the configured layout discovers.
///
/// # Errors
///
/// Returns an error if the boundaries directory cannot be read.
pub fn regions(config: &AggregateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let regions = discover_regions(&config.boundaries_dir, config.layout)?;
    if regions.is_empty() {
        println!(
            "No boundary files found in {} (layout: {}).",
            config.boundaries_dir.display(),
            config.layout
        );
        return Ok(());
    }

    println!("{:<20} {:<32} PATH", "FORCE", "REGION");
    println!("{}", "-".repeat(80));
    for region in &regions {
        println!(
            "{:<20} {:<32} {}",
            region.force.as_deref().unwrap_or("-"),
            region.name,
            region.path.display()
        );
    }
    println!();
    println!("{} region(s)", regions.len());

    Ok(())
}

/// Reports how many of the cache entries a run needs already exist.
///
/// # Errors
///
/// Returns an error if no periods are configured, or the boundaries or
/// cache directory cannot be read.
pub fn cache_status(config: AggregateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let api = HttpPoliceApi::new(&config.api_base_url, config.timeout())?;
    let cache = open_cache(&config)?;
    let cache_dir = config.cache_dir.clone();
    let status = Aggregator::new(config, api, cache).cache_status()?;

    println!(
        "{}/{} cache entries present in {}",
        status.present,
        status.expected,
        cache_dir.display()
    );
    if status.is_complete() {
        println!("A run would make no API calls.");
    } else {
        println!("Missing:");
        for key in &status.missing {
            println!("  {key}");
        }
    }

    Ok(())
}

fn print_report(output: &AggregateOutput) {
    let report = &output.report;
    println!();
    println!("Run report");
    println!("{}", "-".repeat(40));
    println!("{:<28} {}", "Regions discovered", report.regions_discovered);
    println!("{:<28} {}", "Region-months processed", report.regions_processed);
    println!("{:<28} {}", "Region-months skipped", report.regions_skipped);
    println!("{:<28} {}", "API calls", report.live_calls);
    println!("{:<28} {}", "Cache hits", report.cache_hits);
    println!("{:<28} {}", "Pauses", report.pauses);
    println!("{:<28} {}", "Rows without location", report.rows_dropped);
    println!("{:<28} {}", "Duplicates removed", report.duplicates_removed);
    println!("{:<28} {}", "Crimes", output.crimes.len());
    println!("{:<28} {}", "Stop and search", output.stop_searches.len());
}

fn print_summary(summary: &Summary) {
    print_counts("Crimes by type", &summary.crimes_by_type);
    print_counts("Crimes by month", &summary.crimes_by_month);
    print_counts("Stop and search by object", &summary.stops_by_object);
}

fn print_counts(title: &str, counts: &std::collections::BTreeMap<String, u64>) {
    if counts.is_empty() {
        return;
    }
    println!();
    println!("{title}");
    println!("{}", "-".repeat(40));
    for (key, count) in counts {
        println!("{key:<32} {count:>7}");
    }
}

