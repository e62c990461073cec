//! The remote query seam.

use police_map_boundary::Polygon;
use police_map_records_models::{Period, RecordKind};

use crate::SourceError;

/// Where a query is centred.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryArea {
    /// Custom area; sent as the `poly` form field.
    Polygon(Polygon),
    /// One-mile radius around a point; sent as `lat`/`lng` query parameters.
    Point {
        /// Latitude in decimal degrees.
        lat: f64,
        /// Longitude in decimal degrees.
        lng: f64,
    },
}

impl From<Polygon> for QueryArea {
    fn from(polygon: Polygon) -> Self {
        Self::Polygon(polygon)
    }
}

/// A source of raw police records.
///
/// One call is one remote request. Implementations do not retry and do
/// not cache; [`crate::IngestClient`] handles caching.
pub trait PoliceApi {
    /// Returns the raw JSON entries for `kind` within `area` during `period`.
    ///
    /// # Errors
    ///
    /// Returns [`SourceError`] on transport failure, a non-success status,
    /// or a body that is not a JSON array.
    fn query(
        &self,
        kind: RecordKind,
        area: &QueryArea,
        period: Period,
    ) -> Result<Vec<serde_json::Value>, SourceError>;
}

impl<T: PoliceApi + ?Sized> PoliceApi for &T {
    fn query(
        &self,
        kind: RecordKind,
        area: &QueryArea,
        period: Period,
    ) -> Result<Vec<serde_json::Value>, SourceError> {
        (**self).query(kind, area, period)
    }
}
