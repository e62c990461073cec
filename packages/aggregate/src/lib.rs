#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Multi-region, multi-period aggregation.
//!
//! Walks every boundary file for every configured month, fetches crimes
//! and stop-and-search records through the cache, and merges everything
//! into two collections. Regions are processed strictly one after another
//! and the run pauses after each region that reached the network, so a
//! fully cached re-run is both free and instant.

pub mod regions;
pub mod summary;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::Arc;

use police_map_aggregate_models::{AggregateConfig, AggregateOutput, CacheStatus, Region, RunReport};
use police_map_boundary::BoundaryError;
use police_map_cache::{CacheError, CacheKey, FileCache, RegionCache};
use police_map_records_models::{
    CrimeRecord, Period, PoliceRecord, RecordKind, StopSearchRecord,
};
use police_map_source::{FromRaw, IngestClient, PoliceApi, ProgressCallback, QueryArea};

pub use regions::{discover_regions, region_name};
pub use summary::summarize;

/// Errors that can end an aggregation run.
#[derive(Debug, thiserror::Error)]
pub enum AggregateError {
    /// No months were configured.
    #[error("No periods configured")]
    NoPeriods,

    /// The boundaries directory could not be read.
    #[error("Cannot read boundaries directory {}: {source}", path.display())]
    BoundariesDir {
        /// Directory that failed.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The cache could not be opened.
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),

    /// Every region produced nothing. A normal outcome, not a crash.
    #[error("No data found for any region")]
    NoData,

    /// A point query outside the valid coordinate range.
    #[error("Invalid point {lat},{lng}: latitude must be within ±90 and longitude within ±180")]
    InvalidPoint {
        /// Requested latitude.
        lat: f64,
        /// Requested longitude.
        lng: f64,
    },
}

/// Region name used to cache the results of a point query.
#[must_use]
pub fn point_region_name(lat: f64, lng: f64) -> String {
    format!("point_{lat}_{lng}")
}

/// Opens the file cache named by the configuration, creating it if needed.
///
/// # Errors
///
/// Returns [`AggregateError::Cache`] if the directory cannot be created.
pub fn open_cache(config: &AggregateConfig) -> Result<FileCache, AggregateError> {
    Ok(FileCache::open(&config.cache_dir)?)
}

/// How one `(period, region)` step ended.
#[derive(Debug)]
enum RegionOutcome {
    /// The boundary did not parse; nothing was fetched.
    ParseFailed(BoundaryError),
    /// Both kinds were fetched and any records appended.
    Merged {
        crimes: usize,
        stop_searches: usize,
        live_calls: u64,
    },
}

/// Records accumulated across a run, in processing order.
#[derive(Default)]
struct Merged {
    crimes: Vec<CrimeRecord>,
    stop_searches: Vec<StopSearchRecord>,
}

/// Drives a run over every region and period.
#[derive(Debug)]
pub struct Aggregator<A, C> {
    config: AggregateConfig,
    client: IngestClient<A, C>,
}

impl<A: PoliceApi, C: RegionCache> Aggregator<A, C> {
    /// Creates an aggregator.
    pub const fn new(config: AggregateConfig, api: A, cache: C) -> Self {
        Self {
            config,
            client: IngestClient::new(api, cache),
        }
    }

    /// The configuration this aggregator runs with.
    pub const fn config(&self) -> &AggregateConfig {
        &self.config
    }

    /// Regions the configured layout finds, in processing order.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::BoundariesDir`] if the tree cannot be read.
    pub fn regions(&self) -> Result<Vec<Region>, AggregateError> {
        discover_regions(&self.config.boundaries_dir, self.config.layout).map_err(|source| {
            AggregateError::BoundariesDir {
                path: self.config.boundaries_dir.clone(),
                source,
            }
        })
    }

    /// Reports which cache entries a run would need and which exist.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError`] if no periods are configured or the
    /// boundaries directory cannot be read.
    pub fn cache_status(&self) -> Result<CacheStatus, AggregateError> {
        let periods = self.periods()?;
        let regions = self.regions()?;

        let mut status = CacheStatus::default();
        for period in &periods {
            for region in &regions {
                for &kind in RecordKind::ALL {
                    let key = CacheKey::new(&region.name, *period, kind);
                    status.expected += 1;
                    if self.client.cache().contains(&key) {
                        status.present += 1;
                    } else {
                        status.missing.push(key.to_string());
                    }
                }
            }
        }

        Ok(status)
    }

    /// Runs the aggregation.
    ///
    /// Periods are the outer loop and regions the inner loop. Regions whose
    /// boundary fails to parse are logged and skipped. Rows without a
    /// location are dropped once at the end, then duplicates if configured.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::NoData`] when every region produced
    /// nothing, or another [`AggregateError`] for setup problems.
    pub fn run(
        &self,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<AggregateOutput, AggregateError> {
        let progress = progress.unwrap_or_else(police_map_source::null_progress);
        let periods = self.periods()?;
        let regions = self.regions()?;

        log::info!(
            "Aggregating {} region(s) over {} period(s)",
            regions.len(),
            periods.len()
        );

        let mut report = RunReport {
            regions_discovered: regions.len() as u64,
            ..RunReport::default()
        };
        let mut merged = Merged::default();

        progress.set_total((periods.len() * regions.len()) as u64);

        for &period in &periods {
            for region in &regions {
                progress.set_message(format!("{} {period}", region.name));

                match self.process_region(region, period, &mut merged) {
                    RegionOutcome::ParseFailed(e) => {
                        log::warn!("Skipping {} ({}): {e}", region.name, region.path.display());
                        report.regions_skipped += 1;
                    }
                    RegionOutcome::Merged {
                        crimes,
                        stop_searches,
                        live_calls,
                    } => {
                        log::info!(
                            "{} {period}: {crimes} crime(s), {stop_searches} stop-and-search",
                            region.name
                        );
                        report.regions_processed += 1;
                        report.live_calls += live_calls;
                        report.cache_hits += RecordKind::ALL.len() as u64 - live_calls;

                        if live_calls > 0 {
                            self.pause();
                            report.pauses += 1;
                        }
                    }
                }

                progress.inc(1);
            }
        }

        self.finish(merged, report, progress.as_ref())
    }

    /// Runs every configured period for a single point instead of the
    /// boundary tree.
    ///
    /// Results are cached under [`point_region_name`] like any region, so
    /// repeating a point query is free. Each period counts as one processed
    /// region in the report.
    ///
    /// # Errors
    ///
    /// Returns [`AggregateError::InvalidPoint`] for coordinates out of
    /// range, [`AggregateError::NoData`] when nothing came back, or
    /// [`AggregateError::NoPeriods`].
    pub fn run_point(
        &self,
        lat: f64,
        lng: f64,
        progress: Option<Arc<dyn ProgressCallback>>,
    ) -> Result<AggregateOutput, AggregateError> {
        if !((-90.0..=90.0).contains(&lat) && (-180.0..=180.0).contains(&lng)) {
            return Err(AggregateError::InvalidPoint { lat, lng });
        }
        let progress = progress.unwrap_or_else(police_map_source::null_progress);
        let periods = self.periods()?;
        let name = point_region_name(lat, lng);
        let area = QueryArea::Point { lat, lng };

        log::info!("Querying point {lat},{lng} over {} period(s)", periods.len());

        let mut report = RunReport::default();
        let mut merged = Merged::default();
        progress.set_total(periods.len() as u64);

        for &period in &periods {
            progress.set_message(format!("{name} {period}"));

            let mut live_calls = 0;
            let crimes = self.fetch_into(&area, period, &name, &mut merged.crimes, &mut live_calls);
            let stop_searches = self.fetch_into(
                &area,
                period,
                &name,
                &mut merged.stop_searches,
                &mut live_calls,
            );
            log::info!("{name} {period}: {crimes} crime(s), {stop_searches} stop-and-search");

            report.regions_processed += 1;
            report.live_calls += live_calls;
            report.cache_hits += RecordKind::ALL.len() as u64 - live_calls;
            if live_calls > 0 {
                self.pause();
                report.pauses += 1;
            }

            progress.inc(1);
        }

        self.finish(merged, report, progress.as_ref())
    }

    /// Applies the location gate and optional dedupe to a finished run.
    fn finish(
        &self,
        mut merged: Merged,
        mut report: RunReport,
        progress: &dyn ProgressCallback,
    ) -> Result<AggregateOutput, AggregateError> {
        if merged.crimes.is_empty() && merged.stop_searches.is_empty() {
            progress.finish("No data".to_string());
            return Err(AggregateError::NoData);
        }

        report.rows_dropped =
            drop_unlocated(&mut merged.crimes) + drop_unlocated(&mut merged.stop_searches);

        if self.config.dedupe {
            report.duplicates_removed =
                dedupe(&mut merged.crimes) + dedupe(&mut merged.stop_searches);
        }

        progress.finish(format!(
            "{} crime(s), {} stop-and-search",
            merged.crimes.len(),
            merged.stop_searches.len()
        ));

        log::info!(
            "Done: {} crime(s), {} stop-and-search, {} live call(s), {} cache hit(s), {} row(s) without location dropped",
            merged.crimes.len(),
            merged.stop_searches.len(),
            report.live_calls,
            report.cache_hits,
            report.rows_dropped
        );

        Ok(AggregateOutput {
            crimes: merged.crimes,
            stop_searches: merged.stop_searches,
            report,
        })
    }

    fn periods(&self) -> Result<Vec<Period>, AggregateError> {
        let periods = self.config.resolved_periods();
        if periods.is_empty() {
            return Err(AggregateError::NoPeriods);
        }
        Ok(periods)
    }

    fn process_region(&self, region: &Region, period: Period, merged: &mut Merged) -> RegionOutcome {
        let polygon = match police_map_boundary::parse_kml_file(&region.path) {
            Ok(polygon) => polygon,
            Err(e) => return RegionOutcome::ParseFailed(e),
        };
        let area = QueryArea::Polygon(polygon);

        let mut live_calls = 0;
        let crimes = self.fetch_into(&area, period, &region.name, &mut merged.crimes, &mut live_calls);
        let stop_searches = self.fetch_into(
            &area,
            period,
            &region.name,
            &mut merged.stop_searches,
            &mut live_calls,
        );

        RegionOutcome::Merged {
            crimes,
            stop_searches,
            live_calls,
        }
    }

    fn fetch_into<R: FromRaw>(
        &self,
        area: &QueryArea,
        period: Period,
        region: &str,
        into: &mut Vec<R>,
        live_calls: &mut u64,
    ) -> usize {
        let fetched = self.client.fetch::<R>(area, period, region);
        if fetched.was_live {
            *live_calls += 1;
        }
        let count = fetched.records.len();
        into.extend(fetched.records);
        count
    }

    fn pause(&self) {
        let delay = self.config.request_delay();
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
    }
}

/// Removes rows missing either coordinate, returning how many were removed.
fn drop_unlocated<R: PoliceRecord>(records: &mut Vec<R>) -> u64 {
    let before = records.len();
    records.retain(PoliceRecord::has_location);
    (before - records.len()) as u64
}

/// Removes rows whose dedupe key was already seen, keeping the first.
/// Rows without a key are always kept.
fn dedupe<R: PoliceRecord>(records: &mut Vec<R>) -> u64 {
    let before = records.len();
    let mut seen = HashSet::new();
    records.retain(|record| record.dedupe_key().is_none_or(|key| seen.insert(key)));
    (before - records.len()) as u64
}

#[cfg(test)]
mod tests {
    use std::cell::{Cell, RefCell};
    use std::path::Path;

    use police_map_aggregate_models::RegionLayout;
    use police_map_cache::MemoryCache;
    use police_map_source::SourceError;
    use serde_json::{Value, json};

    use super::*;

    type Responder = Box<dyn Fn(RecordKind, Period) -> Result<Vec<Value>, SourceError>>;

    /// Answers queries from a closure and records each call.
    struct FakeApi {
        respond: Responder,
        calls: Cell<u64>,
        log: RefCell<Vec<(RecordKind, Period, String)>>,
    }

    impl FakeApi {
        fn new(
            respond: impl Fn(RecordKind, Period) -> Result<Vec<Value>, SourceError> + 'static,
        ) -> Self {
            Self {
                respond: Box::new(respond),
                calls: Cell::new(0),
                log: RefCell::new(Vec::new()),
            }
        }
    }

    impl PoliceApi for FakeApi {
        fn query(
            &self,
            kind: RecordKind,
            area: &QueryArea,
            period: Period,
        ) -> Result<Vec<Value>, SourceError> {
            self.calls.set(self.calls.get() + 1);
            let poly = match area {
                QueryArea::Polygon(polygon) => polygon.to_api_string(),
                QueryArea::Point { lat, lng } => format!("{lat},{lng}"),
            };
            self.log.borrow_mut().push((kind, period, poly));
            (self.respond)(kind, period)
        }
    }

    fn kml(coordinates: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml xmlns="http://www.opengis.net/kml/2.2">
  <Placemark>
    <Polygon>
      <outerBoundaryIs>
        <LinearRing>
          <coordinates>{coordinates}</coordinates>
        </LinearRing>
      </outerBoundaryIs>
    </Polygon>
  </Placemark>
</kml>"#
        )
    }

    const RING: &str = "0.543,52.268 0.238,52.794 0.478,52.130 0.543,52.268";

    fn write(dir: &Path, name: &str, contents: &str) {
        std::fs::write(dir.join(name), contents).unwrap();
    }

    fn period(s: &str) -> Period {
        s.parse().unwrap()
    }

    fn config(dir: &Path, periods: &[&str]) -> AggregateConfig {
        AggregateConfig {
            boundaries_dir: dir.to_path_buf(),
            periods: periods.iter().map(|p| period(p)).collect(),
            layout: RegionLayout::Flat,
            request_delay_ms: 0,
            ..AggregateConfig::default()
        }
    }

    fn located_crime(id: i64) -> Value {
        json!({
            "category": "burglary",
            "id": id,
            "month": "2025-01",
            "location": {"latitude": "52.4", "longitude": "0.4"}
        })
    }

    fn one_crime_each(kind: RecordKind, _period: Period) -> Result<Vec<Value>, SourceError> {
        Ok(match kind {
            RecordKind::Crime => vec![located_crime(1)],
            RecordKind::StopAndSearch => vec![json!({
                "type": "Person search",
                "datetime": "2025-01-10T10:00:00+00:00",
                "object_of_search": "Controlled drugs",
                "location": {"latitude": 52.4, "longitude": 0.4}
            })],
        })
    }

    #[test]
    fn second_run_makes_no_remote_calls() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));
        write(dir.path(), "b.kml", &kml(RING));

        let api = FakeApi::new(one_crime_each);
        let cache = MemoryCache::new();
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01"]), &api, &cache);

        let first = aggregator.run(None).unwrap();
        assert_eq!(first.report.live_calls, 4);
        assert_eq!(first.report.pauses, 2);
        assert_eq!(api.calls.get(), 4);

        let second = aggregator.run(None).unwrap();
        assert_eq!(second.report.live_calls, 0);
        assert_eq!(second.report.cache_hits, 4);
        assert_eq!(second.report.pauses, 0);
        assert_eq!(api.calls.get(), 4);
        assert_eq!(second.crimes, first.crimes);
        assert_eq!(second.stop_searches, first.stop_searches);
    }

    #[test]
    fn sends_closed_ring_as_open_polygon() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));

        let api = FakeApi::new(one_crime_each);
        Aggregator::new(config(dir.path(), &["2025-01"]), &api, MemoryCache::new())
            .run(None)
            .unwrap();

        let log = api.log.borrow();
        assert_eq!(log[0].2, "52.268,0.543:52.794,0.238:52.130,0.478");
    }

    #[test]
    fn unparseable_regions_yield_no_data() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "broken.kml", "<kml><Placemark>");
        write(dir.path(), "empty.kml", "<kml/>");

        let api = FakeApi::new(one_crime_each);
        let result = Aggregator::new(config(dir.path(), &["2025-01"]), &api, MemoryCache::new())
            .run(None);

        assert!(matches!(result, Err(AggregateError::NoData)));
        assert_eq!(api.calls.get(), 0);
    }

    #[test]
    fn bad_region_is_skipped_and_others_continue() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a_broken.kml", "not xml at all");
        write(dir.path(), "b_good.kml", &kml(RING));

        let api = FakeApi::new(one_crime_each);
        let output = Aggregator::new(config(dir.path(), &["2025-01"]), &api, MemoryCache::new())
            .run(None)
            .unwrap();

        assert_eq!(output.report.regions_discovered, 2);
        assert_eq!(output.report.regions_skipped, 1);
        assert_eq!(output.report.regions_processed, 1);
        assert_eq!(output.crimes.len(), 1);
        assert_eq!(output.crimes[0].region, "b_good");
    }

    #[test]
    fn empty_first_results_are_cached() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));

        let api = FakeApi::new(|_, _| Ok(Vec::new()));
        let cache = MemoryCache::new();
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01"]), &api, &cache);

        assert!(matches!(aggregator.run(None), Err(AggregateError::NoData)));
        assert!(matches!(aggregator.run(None), Err(AggregateError::NoData)));
        assert_eq!(api.calls.get(), 2);
        assert_eq!(cache.len(), 2);
    }

    #[test]
    fn failed_fetches_are_not_retried() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));

        let api = FakeApi::new(|kind, _| match kind {
            RecordKind::Crime => Ok(vec![located_crime(9)]),
            RecordKind::StopAndSearch => Err(SourceError::UnexpectedBody {
                message: "rate limited".to_string(),
            }),
        });
        let cache = MemoryCache::new();
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01"]), &api, &cache);

        let first = aggregator.run(None).unwrap();
        assert_eq!(first.crimes.len(), 1);
        assert!(first.stop_searches.is_empty());

        aggregator.run(None).unwrap();
        assert_eq!(api.calls.get(), 2);
    }

    #[test]
    fn rows_without_location_are_dropped_once() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));

        let api = FakeApi::new(|kind, _| {
            Ok(match kind {
                RecordKind::Crime => vec![
                    located_crime(1),
                    json!({"category": "arson", "location": null}),
                    json!({"category": "drugs", "location": {"latitude": "52.1", "longitude": ""}}),
                ],
                RecordKind::StopAndSearch => vec![json!({"type": "Vehicle search"})],
            })
        });
        let cache = MemoryCache::new();
        let output = Aggregator::new(config(dir.path(), &["2025-01"]), &api, &cache)
            .run(None)
            .unwrap();

        assert_eq!(output.crimes.len(), 1);
        assert!(output.stop_searches.is_empty());
        assert_eq!(output.report.rows_dropped, 3);

        // The cache keeps the unfiltered collection.
        let key = CacheKey::new("a", period("2025-01"), RecordKind::Crime);
        let cached: Vec<CrimeRecord> = cache.lookup(&key).unwrap().unwrap();
        assert_eq!(cached.len(), 3);
    }

    #[test]
    fn periods_outer_regions_inner() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "north.kml", &kml(RING));
        write(dir.path(), "south.kml", &kml(RING));

        let api = FakeApi::new(one_crime_each);
        let output = Aggregator::new(
            config(dir.path(), &["2025-02", "2025-01"]),
            &api,
            MemoryCache::new(),
        )
        .run(None)
        .unwrap();

        let order: Vec<(String, String)> = output
            .crimes
            .iter()
            .map(|c| (c.period.to_string(), c.region.clone()))
            .collect();
        assert_eq!(
            order,
            vec![
                ("2025-02".to_string(), "north".to_string()),
                ("2025-02".to_string(), "south".to_string()),
                ("2025-01".to_string(), "north".to_string()),
                ("2025-01".to_string(), "south".to_string()),
            ]
        );
    }

    #[test]
    fn dedupe_removes_overlapping_records() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));
        write(dir.path(), "b.kml", &kml(RING));

        let mut cfg = config(dir.path(), &["2025-01"]);
        let api = FakeApi::new(one_crime_each);
        let kept = Aggregator::new(cfg.clone(), &api, MemoryCache::new())
            .run(None)
            .unwrap();
        assert_eq!(kept.crimes.len(), 2);
        assert_eq!(kept.report.duplicates_removed, 0);

        cfg.dedupe = true;
        let deduped = Aggregator::new(cfg, &api, MemoryCache::new())
            .run(None)
            .unwrap();
        assert_eq!(deduped.crimes.len(), 1);
        assert_eq!(deduped.crimes[0].region, "a");
        assert_eq!(deduped.stop_searches.len(), 1);
        assert_eq!(deduped.report.duplicates_removed, 2);
    }

    #[test]
    fn no_periods_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(one_crime_each);
        let result = Aggregator::new(config(dir.path(), &[]), &api, MemoryCache::new()).run(None);
        assert!(matches!(result, Err(AggregateError::NoPeriods)));
    }

    #[test]
    fn missing_boundaries_dir_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(one_crime_each);
        let cfg = config(&dir.path().join("absent"), &["2025-01"]);
        let result = Aggregator::new(cfg, &api, MemoryCache::new()).run(None);
        assert!(matches!(result, Err(AggregateError::BoundariesDir { .. })));
    }

    #[test]
    fn point_queries_use_point_area_and_cache() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(one_crime_each);
        let cache = MemoryCache::new();
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01", "2025-02"]), &api, &cache);

        let first = aggregator.run_point(51.07, -1.79, None).unwrap();
        assert_eq!(first.crimes.len(), 2);
        assert_eq!(first.stop_searches.len(), 2);
        assert_eq!(first.crimes[0].region, "point_51.07_-1.79");
        assert_eq!(first.report.regions_processed, 2);
        assert_eq!(first.report.live_calls, 4);
        assert_eq!(first.report.pauses, 2);

        {
            let log = api.log.borrow();
            assert_eq!(log.len(), 4);
            assert!(log.iter().all(|(_, _, area)| area == "51.07,-1.79"));
            assert_eq!(log[1].0, RecordKind::StopAndSearch);
            assert_eq!(log[2].1, period("2025-02"));
        }

        let second = aggregator.run_point(51.07, -1.79, None).unwrap();
        assert_eq!(second.report.cache_hits, 4);
        assert_eq!(api.calls.get(), 4);
        assert!(cache.contains(&CacheKey::new(
            point_region_name(51.07, -1.79),
            period("2025-01"),
            RecordKind::Crime
        )));
    }

    #[test]
    fn point_out_of_range_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(one_crime_each);
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01"]), &api, MemoryCache::new());

        for (lat, lng) in [(91.0, 0.0), (0.0, -180.5), (f64::NAN, 0.0)] {
            assert!(matches!(
                aggregator.run_point(lat, lng, None),
                Err(AggregateError::InvalidPoint { .. })
            ));
        }
        assert_eq!(api.calls.get(), 0);
    }

    #[test]
    fn empty_point_query_is_no_data() {
        let dir = tempfile::tempdir().unwrap();
        let api = FakeApi::new(|_, _| Ok(Vec::new()));
        let result = Aggregator::new(config(dir.path(), &["2025-01"]), &api, MemoryCache::new())
            .run_point(51.0, -1.0, None);
        assert!(matches!(result, Err(AggregateError::NoData)));
    }

    #[test]
    fn cache_status_tracks_progress() {
        let dir = tempfile::tempdir().unwrap();
        write(dir.path(), "a.kml", &kml(RING));
        write(dir.path(), "b.kml", "broken");

        let api = FakeApi::new(one_crime_each);
        let cache = MemoryCache::new();
        let aggregator = Aggregator::new(config(dir.path(), &["2025-01"]), &api, &cache);

        let before = aggregator.cache_status().unwrap();
        assert_eq!(before.expected, 4);
        assert_eq!(before.present, 0);

        aggregator.run(None).unwrap();

        let after = aggregator.cache_status().unwrap();
        assert_eq!(after.present, 2);
        assert!(!after.is_complete());
        assert_eq!(after.missing, vec!["b/2025-01/crime", "b/2025-01/stop_and_search"]);
    }
}
