//! Raw API entry → typed record conversion.
//!
//! Both endpoints nest coordinates under `location`, usually as strings
//! (`"51.069"`) but occasionally as numbers. Anything missing, null, or
//! unparseable becomes `None` and the row is kept; rows without a location
//! are filtered later, once, by the aggregator.

use police_map_records_models::{CrimeRecord, Period, PoliceRecord, StopSearchRecord};
use serde_json::{Map, Value};

/// Records that can be built from one raw API entry.
pub trait FromRaw: PoliceRecord {
    /// Builds a record tagged with `region` and `period`. Returns `None`
    /// when `raw` is not a JSON object.
    fn from_raw(raw: &Value, region: &str, period: Period) -> Option<Self>;
}

impl FromRaw for CrimeRecord {
    fn from_raw(raw: &Value, region: &str, period: Period) -> Option<Self> {
        let entry = raw.as_object()?;
        let location = entry.get("location").and_then(Value::as_object);
        let (latitude, longitude) = coordinates(location);
        let outcome = entry.get("outcome_status").and_then(Value::as_object);

        Some(Self {
            crime_type: text(Some(entry), "category").unwrap_or_default(),
            month: text(Some(entry), "month"),
            latitude,
            longitude,
            id: entry.get("id").and_then(Value::as_i64),
            persistent_id: text(Some(entry), "persistent_id"),
            street: street_name(location),
            location_type: text(Some(entry), "location_type"),
            location_subtype: text(Some(entry), "location_subtype"),
            context: text(Some(entry), "context"),
            outcome_status: text(outcome, "category"),
            outcome_date: text(outcome, "date"),
            region: region.to_string(),
            period,
        })
    }
}

impl FromRaw for StopSearchRecord {
    fn from_raw(raw: &Value, region: &str, period: Period) -> Option<Self> {
        let entry = raw.as_object()?;
        let location = entry.get("location").and_then(Value::as_object);
        let (latitude, longitude) = coordinates(location);

        Some(Self {
            search_type: text(Some(entry), "type"),
            date: text(Some(entry), "datetime"),
            gender: text(Some(entry), "gender"),
            age_range: text(Some(entry), "age_range"),
            object_of_search: text(Some(entry), "object_of_search"),
            latitude,
            longitude,
            self_defined_ethnicity: text(Some(entry), "self_defined_ethnicity"),
            officer_defined_ethnicity: text(Some(entry), "officer_defined_ethnicity"),
            legislation: text(Some(entry), "legislation"),
            outcome: text(Some(entry), "outcome"),
            involved_person: entry.get("involved_person").and_then(Value::as_bool),
            operation: entry.get("operation").and_then(Value::as_bool),
            operation_name: text(Some(entry), "operation_name"),
            removal_of_more_than_outer_clothing: entry
                .get("removal_of_more_than_outer_clothing")
                .and_then(Value::as_bool),
            street: street_name(location),
            region: region.to_string(),
            period,
        })
    }
}

/// Normalizes a whole response, skipping entries that are not objects.
#[must_use]
pub fn normalize_all<R: FromRaw>(raw: &[Value], region: &str, period: Period) -> Vec<R> {
    let records: Vec<R> = raw
        .iter()
        .filter_map(|entry| R::from_raw(entry, region, period))
        .collect();

    let skipped = raw.len() - records.len();
    if skipped > 0 {
        log::warn!("{region} {period}: skipped {skipped} malformed entries");
    }

    records
}

/// Parses a coordinate given as a JSON string or number.
///
/// Zero is a valid coordinate (the prime meridian runs through the
/// region); only non-finite or non-numeric values are rejected.
#[must_use]
pub fn parse_coordinate(value: &Value) -> Option<f64> {
    let parsed = match value {
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        Value::Number(n) => n.as_f64()?,
        _ => return None,
    };
    parsed.is_finite().then_some(parsed)
}

fn coordinates(location: Option<&Map<String, Value>>) -> (Option<f64>, Option<f64>) {
    let Some(location) = location else {
        return (None, None);
    };
    (
        location.get("latitude").and_then(parse_coordinate),
        location.get("longitude").and_then(parse_coordinate),
    )
}

fn street_name(location: Option<&Map<String, Value>>) -> Option<String> {
    let street = location?.get("street")?.as_object();
    text(street, "name")
}

/// A non-empty string field.
fn text(object: Option<&Map<String, Value>>, key: &str) -> Option<String> {
    object?
        .get(key)?
        .as_str()
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}
