#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! Record kinds, reporting periods, and the normalized record types.
//!
//! Every region/month query against the police API produces a collection of
//! either [`CrimeRecord`]s or [`StopSearchRecord`]s. Both implement
//! [`PoliceRecord`], which is what the cache, the ingestion client, and the
//! aggregator are generic over.

pub mod period;

pub use period::{InvalidPeriodError, Period};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumString};

/// Base URL of the public police data API.
pub const DEFAULT_API_BASE_URL: &str = "https://data.police.uk/api/";

/// The two record categories published by the police API.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    AsRefStr,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum RecordKind {
    /// Street-level crimes.
    Crime,
    /// Stop-and-search events.
    StopAndSearch,
}

impl RecordKind {
    /// Both kinds, in the order the aggregator fetches them.
    pub const ALL: &[Self] = &[Self::Crime, Self::StopAndSearch];

    /// The tag used in cache file names (`street` or `stop_and_search`).
    #[must_use]
    pub const fn cache_tag(self) -> &'static str {
        match self {
            Self::Crime => "street",
            Self::StopAndSearch => "stop_and_search",
        }
    }

    /// The API endpoint path, relative to the API base URL.
    #[must_use]
    pub const fn endpoint(self) -> &'static str {
        match self {
            Self::Crime => "crimes-street/all-crime",
            Self::StopAndSearch => "stops-street",
        }
    }

    /// Human-readable label for log messages.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Crime => "street crimes",
            Self::StopAndSearch => "stop and searches",
        }
    }
}

/// A normalized row of either kind.
///
/// Coordinates are optional all the way from the API to the cache. Rows
/// without both are only removed when the unified collections are built.
pub trait PoliceRecord: Clone + Serialize + DeserializeOwned {
    /// Which kind of record this is.
    const KIND: RecordKind;

    /// Latitude (WGS84), if the source provided a usable one.
    fn latitude(&self) -> Option<f64>;

    /// Longitude (WGS84), if the source provided a usable one.
    fn longitude(&self) -> Option<f64>;

    /// Whether both coordinates are present.
    fn has_location(&self) -> bool {
        self.latitude().is_some() && self.longitude().is_some()
    }

    /// Identity used to drop repeated rows when de-duplication is enabled.
    ///
    /// `None` means the row has no usable identity and is always kept.
    fn dedupe_key(&self) -> Option<String>;
}

/// A street-level crime.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrimeRecord {
    /// Crime category slug from the API (`category`), e.g. `"burglary"`.
    pub crime_type: String,
    /// Month the crime was recorded in, as reported by the API.
    pub month: Option<String>,
    /// Latitude (WGS84). `None` when the API location was missing or
    /// unparseable.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when the API location was missing or
    /// unparseable.
    pub longitude: Option<f64>,
    /// API crime identifier.
    pub id: Option<i64>,
    /// Persistent identifier shared with outcome records.
    pub persistent_id: Option<String>,
    /// Anonymised street name (e.g. `"On or near Station Road"`).
    pub street: Option<String>,
    /// `Force` or `BTP`.
    pub location_type: Option<String>,
    /// Location subtype (British Transport Police locations only).
    pub location_subtype: Option<String>,
    /// Extra free-text context.
    pub context: Option<String>,
    /// Latest outcome category, if any.
    pub outcome_status: Option<String>,
    /// Month of the latest outcome, if any.
    pub outcome_date: Option<String>,
    /// Region the record was fetched for.
    pub region: String,
    /// Period the record was fetched for.
    pub period: Period,
}

impl PoliceRecord for CrimeRecord {
    const KIND: RecordKind = RecordKind::Crime;

    fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    fn dedupe_key(&self) -> Option<String> {
        self.id.map(|id| id.to_string())
    }
}

/// A stop-and-search event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StopSearchRecord {
    /// Search type (`type`), e.g. `"Person search"`.
    pub search_type: Option<String>,
    /// When the search took place (`datetime`).
    pub date: Option<String>,
    /// Gender of the person searched.
    pub gender: Option<String>,
    /// Age range of the person searched.
    pub age_range: Option<String>,
    /// What the officer was searching for.
    pub object_of_search: Option<String>,
    /// Latitude (WGS84). `None` when the API location was missing or
    /// unparseable.
    pub latitude: Option<f64>,
    /// Longitude (WGS84). `None` when the API location was missing or
    /// unparseable.
    pub longitude: Option<f64>,
    /// Ethnicity as described by the person searched.
    pub self_defined_ethnicity: Option<String>,
    /// Ethnicity as recorded by the officer.
    pub officer_defined_ethnicity: Option<String>,
    /// Legislation the search was carried out under.
    pub legislation: Option<String>,
    /// Outcome of the search.
    pub outcome: Option<String>,
    /// Whether a person (rather than only a vehicle) was involved.
    pub involved_person: Option<bool>,
    /// Whether the search was part of a policing operation.
    pub operation: Option<bool>,
    /// Name of the operation, if any.
    pub operation_name: Option<String>,
    /// Whether more than outer clothing was removed.
    pub removal_of_more_than_outer_clothing: Option<bool>,
    /// Anonymised street name.
    pub street: Option<String>,
    /// Region the record was fetched for.
    pub region: String,
    /// Period the record was fetched for.
    pub period: Period,
}

impl PoliceRecord for StopSearchRecord {
    const KIND: RecordKind = RecordKind::StopAndSearch;

    fn latitude(&self) -> Option<f64> {
        self.latitude
    }

    fn longitude(&self) -> Option<f64> {
        self.longitude
    }

    fn dedupe_key(&self) -> Option<String> {
        // Stop-and-search rows carry no identifier of their own.
        let date = self.date.as_deref()?;
        let (lat, lng) = (self.latitude?, self.longitude?);
        Some(format!(
            "{date}|{lat}|{lng}|{}|{}|{}|{}",
            self.search_type.as_deref().unwrap_or_default(),
            self.gender.as_deref().unwrap_or_default(),
            self.age_range.as_deref().unwrap_or_default(),
            self.object_of_search.as_deref().unwrap_or_default(),
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crime(id: Option<i64>, lat: Option<f64>) -> CrimeRecord {
        CrimeRecord {
            crime_type: "burglary".to_string(),
            month: Some("2025-04".to_string()),
            latitude: lat,
            longitude: Some(-1.79),
            id,
            persistent_id: None,
            street: None,
            location_type: None,
            location_subtype: None,
            context: None,
            outcome_status: None,
            outcome_date: None,
            region: "salisbury".to_string(),
            period: "2025-04".parse().unwrap(),
        }
    }

    #[test]
    fn cache_tags_match_file_naming_contract() {
        assert_eq!(RecordKind::Crime.cache_tag(), "street");
        assert_eq!(RecordKind::StopAndSearch.cache_tag(), "stop_and_search");
    }

    #[test]
    fn kind_round_trips_through_strum() {
        for kind in RecordKind::ALL {
            let parsed: RecordKind = kind.as_ref().parse().unwrap();
            assert_eq!(parsed, *kind);
        }
    }

    #[test]
    fn has_location_requires_both_coordinates() {
        assert!(crime(Some(1), Some(51.07)).has_location());
        assert!(!crime(Some(1), None).has_location());
    }

    #[test]
    fn crime_dedupe_key_uses_api_id() {
        assert_eq!(crime(Some(42), None).dedupe_key().as_deref(), Some("42"));
        assert!(crime(None, None).dedupe_key().is_none());
    }
}
