//! Polygon vertex types and the police API wire format.

use std::fmt;
use std::num::ParseFloatError;

/// A single WGS84 vertex, latitude first.
///
/// Vertices parsed from a boundary file keep the coordinate text exactly as
/// it was written (`52.130` stays `52.130`), so the API string reproduces
/// the source digits. Equality is numeric.
#[derive(Debug, Clone)]
pub struct Vertex {
    lat: f64,
    lng: f64,
    lat_text: String,
    lng_text: String,
}

impl Vertex {
    /// Parses a vertex from its longitude and latitude text, in KML order.
    ///
    /// # Errors
    ///
    /// Returns [`ParseFloatError`] if either component is not a number.
    pub fn parse(lng_text: &str, lat_text: &str) -> Result<Self, ParseFloatError> {
        Ok(Self {
            lat: lat_text.parse()?,
            lng: lng_text.parse()?,
            lat_text: lat_text.to_string(),
            lng_text: lng_text.to_string(),
        })
    }

    /// Creates a vertex from numeric degrees.
    #[must_use]
    pub fn from_degrees(lat: f64, lng: f64) -> Self {
        Self {
            lat,
            lng,
            lat_text: format_coordinate(lat),
            lng_text: format_coordinate(lng),
        }
    }

    /// Latitude in degrees.
    #[must_use]
    pub const fn lat(&self) -> f64 {
        self.lat
    }

    /// Longitude in degrees.
    #[must_use]
    pub const fn lng(&self) -> f64 {
        self.lng
    }

    /// Whether both components are finite numbers.
    #[must_use]
    pub fn is_finite(&self) -> bool {
        self.lat.is_finite() && self.lng.is_finite()
    }
}

impl PartialEq for Vertex {
    #[allow(clippy::float_cmp)]
    fn eq(&self, other: &Self) -> bool {
        self.lat == other.lat && self.lng == other.lng
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.lat_text, self.lng_text)
    }
}

/// An open polygon ring in source order.
///
/// The closing vertex of a KML ring (a repeat of the first) is never
/// stored; the police API closes the ring itself.
#[derive(Debug, Clone, PartialEq)]
pub struct Polygon {
    vertices: Vec<Vertex>,
}

impl Polygon {
    /// Builds a polygon from ring vertices, dropping the closing vertex if
    /// the ring repeats its first point exactly.
    #[must_use]
    pub fn from_ring(mut vertices: Vec<Vertex>) -> Self {
        if vertices.len() > 1 && vertices.first() == vertices.last() {
            vertices.pop();
        }
        Self { vertices }
    }

    /// The stored vertices.
    #[must_use]
    pub fn vertices(&self) -> &[Vertex] {
        &self.vertices
    }

    /// Number of stored vertices.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vertices.len()
    }

    /// Whether the polygon has no vertices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// The `poly` parameter expected by the police API:
    /// `lat,lng:lat,lng:...`.
    #[must_use]
    pub fn to_api_string(&self) -> String {
        self.to_string()
    }
}

impl fmt::Display for Polygon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, vertex) in self.vertices.iter().enumerate() {
            if i > 0 {
                f.write_str(":")?;
            }
            write!(f, "{vertex}")?;
        }
        Ok(())
    }
}

/// Shortest round-trip decimal form; whole numbers keep one decimal place
/// (`52.0`, not `52`).
fn format_coordinate(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}
