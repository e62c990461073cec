//! Menu-driven mode for when no subcommand is given.

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};
use police_map_aggregate_models::{AggregateConfig, PeriodRange, RegionLayout};
use police_map_cli_utils::MultiProgress;
use police_map_records_models::{InvalidPeriodError, Period};

use crate::args::ConfigArgs;
use crate::commands;
use crate::output::OutputFormat;

/// Top-level actions available in the interactive menu.
enum Action {
    Run,
    Regions,
    CacheStatus,
    Point,
    Polygon,
}

impl Action {
    const ALL: &[Self] = &[
        Self::Run,
        Self::Regions,
        Self::CacheStatus,
        Self::Point,
        Self::Polygon,
    ];

    #[must_use]
    const fn label(&self) -> &'static str {
        match self {
            Self::Run => "Fetch and merge records",
            Self::Regions => "List regions",
            Self::CacheStatus => "Show cache status",
            Self::Point => "Fetch records around a point",
            Self::Polygon => "Print polygon for a KML file",
        }
    }
}

/// Prompts for an action and its settings, then runs it. Defaults come
/// from the config file named by `$POLICE_MAP_CONFIG`, if any.
///
/// # Errors
///
/// Returns an error if a prompt fails or the selected action fails.
pub fn run(multi: &MultiProgress) -> Result<(), Box<dyn std::error::Error>> {
    println!("Police Map");
    println!();

    let labels: Vec<&str> = Action::ALL.iter().map(Action::label).collect();
    let idx = Select::new()
        .with_prompt("What would you like to do?")
        .items(&labels)
        .default(0)
        .interact()?;

    let mut config = ConfigArgs::default().resolve()?;

    match Action::ALL[idx] {
        Action::Run => {
            prompt_tree(&mut config)?;
            prompt_periods(&mut config)?;
            config.dedupe = Confirm::new()
                .with_prompt("Remove duplicate records?")
                .default(config.dedupe)
                .interact()?;

            let output_dir: String = Input::new()
                .with_prompt("Output directory")
                .default("output".to_string())
                .interact_text()?;
            let formats = ["json", "csv"];
            let format = match Select::new()
                .with_prompt("Output format")
                .items(&formats)
                .default(0)
                .interact()?
            {
                0 => OutputFormat::Json,
                _ => OutputFormat::Csv,
            };

            commands::run(multi, config, &PathBuf::from(output_dir), format)?;
        }
        Action::Regions => {
            prompt_tree(&mut config)?;
            commands::regions(&config)?;
        }
        Action::CacheStatus => {
            prompt_tree(&mut config)?;
            prompt_periods(&mut config)?;
            commands::cache_status(config)?;
        }
        Action::Point => {
            let lat: f64 = Input::new().with_prompt("Latitude").interact_text()?;
            let lng: f64 = Input::new().with_prompt("Longitude").interact_text()?;
            prompt_periods(&mut config)?;
            commands::point(multi, config, lat, lng, None, OutputFormat::Json)?;
        }
        Action::Polygon => {
            let path: String = Input::new().with_prompt("KML file").interact_text()?;
            commands::polygon(&PathBuf::from(path))?;
        }
    }

    Ok(())
}

fn prompt_tree(config: &mut AggregateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let dir: String = Input::new()
        .with_prompt("Boundaries directory")
        .default(config.boundaries_dir.display().to_string())
        .interact_text()?;
    config.boundaries_dir = PathBuf::from(dir);

    let layouts = [RegionLayout::Auto, RegionLayout::Flat, RegionLayout::ByForce];
    let labels: Vec<String> = layouts.iter().map(ToString::to_string).collect();
    let current = layouts.iter().position(|l| *l == config.layout).unwrap_or(0);
    let idx = Select::new()
        .with_prompt("Layout")
        .items(&labels)
        .default(current)
        .interact()?;
    config.layout = layouts[idx];

    Ok(())
}

fn prompt_periods(config: &mut AggregateConfig) -> Result<(), Box<dyn std::error::Error>> {
    let current: Vec<String> = config
        .resolved_periods()
        .iter()
        .map(ToString::to_string)
        .collect();

    let text: String = Input::new()
        .with_prompt("Months (e.g. 2025-01,2025-02 or 2024-01..2024-12)")
        .default(current.join(","))
        .validate_with(|input: &String| parse_period_input(input).map(|_| ()))
        .interact_text()?;

    let (periods, range) = parse_period_input(&text)?;
    config.periods = periods;
    config.period_range = range;
    Ok(())
}

/// Parses either a comma-separated list of months or a single
/// `start..end` range.
fn parse_period_input(
    input: &str,
) -> Result<(Vec<Period>, Option<PeriodRange>), InvalidPeriodError> {
    let input = input.trim();
    if let Some((from, to)) = input.split_once("..") {
        let range = PeriodRange {
            from: from.trim().parse()?,
            to: to.trim().parse()?,
        };
        return Ok((Vec::new(), Some(range)));
    }

    let periods = input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse)
        .collect::<Result<Vec<Period>, _>>()?;
    Ok((periods, None))
}
