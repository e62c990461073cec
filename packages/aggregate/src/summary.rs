//! Counts over merged output.

use std::collections::BTreeMap;

use police_map_aggregate_models::{AggregateOutput, Summary};

const UNKNOWN: &str = "unknown";

/// Counts crimes by type and month, and stop-and-search events by object
/// of search.
#[must_use]
pub fn summarize(output: &AggregateOutput) -> Summary {
    let mut summary = Summary::default();

    for crime in &output.crimes {
        bump(&mut summary.crimes_by_type, Some(crime.crime_type.as_str()));
        let month = crime
            .month
            .clone()
            .unwrap_or_else(|| crime.period.to_string());
        bump(&mut summary.crimes_by_month, Some(month.as_str()));
    }

    for stop in &output.stop_searches {
        bump(&mut summary.stops_by_object, stop.object_of_search.as_deref());
    }

    summary
}

fn bump(counts: &mut BTreeMap<String, u64>, key: Option<&str>) {
    let key = key.filter(|k| !k.is_empty()).unwrap_or(UNKNOWN);
    *counts.entry(key.to_string()).or_default() += 1;
}
