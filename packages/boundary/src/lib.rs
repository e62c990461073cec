#![cfg_attr(feature = "fail-on-warnings", deny(warnings))]
#![warn(clippy::all, clippy::pedantic, clippy::nursery, clippy::cargo)]
#![allow(clippy::multiple_crate_versions, clippy::cargo_common_metadata)]

//! KML boundary parsing.
//!
//! Turns a region's boundary file into the open polygon ring the police API
//! accepts as its `poly` parameter. Parsing never panics and never returns a
//! partial polygon: every failure is a [`BoundaryError`] naming the stage
//! that failed, and callers decide whether to skip the region.

pub mod kml;
pub mod polygon;

use std::path::{Path, PathBuf};

pub use polygon::{Polygon, Vertex};

use kml::{Element, KML_21_NS, KML_22_NS};

/// Fewest vertices a usable polygon can have once the ring is opened.
pub const MIN_VERTICES: usize = 3;

/// Namespace lookups in the order they are tried.
const NAMESPACES: [Option<&str>; 3] = [Some(KML_22_NS), Some(KML_21_NS), None];

/// Errors that can occur while extracting a polygon from a boundary file.
#[derive(Debug, thiserror::Error)]
pub enum BoundaryError {
    /// The boundary file does not exist.
    #[error("KML file not found: {}", path.display())]
    NotFound {
        /// Path that was requested.
        path: PathBuf,
    },

    /// The boundary file exists but could not be read.
    #[error("I/O error reading KML file: {0}")]
    Io(#[from] std::io::Error),

    /// The document is not well-formed XML.
    #[error("Error parsing KML file: {message}")]
    Parse {
        /// Parser diagnostic.
        message: String,
    },

    /// No `Polygon` element was found under any supported namespace.
    #[error("No polygon found in KML file")]
    NoPolygon,

    /// The polygon has no outer-boundary coordinates, or they contain no
    /// usable points.
    #[error("No coordinates found in polygon")]
    NoCoordinates,

    /// A coordinate component is not a finite number.
    #[error("Invalid coordinate {token:?} in polygon")]
    InvalidCoordinate {
        /// The offending `lon,lat[,alt]` token.
        token: String,
    },

    /// Fewer than [`MIN_VERTICES`] distinct vertices remain.
    #[error("Polygon has {count} vertices, need at least {MIN_VERTICES}")]
    TooFewVertices {
        /// Vertices left after closing-vertex removal.
        count: usize,
    },
}

/// Reads a KML file and extracts its first polygon.
///
/// The file is decoded per its XML declaration, so boundary files saved
/// as ISO-8859-1 or windows-1252 read the same as UTF-8 ones.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the file is missing or unreadable, is not
/// well-formed XML, or contains no usable polygon.
pub fn parse_kml_file(path: &Path) -> Result<Polygon, BoundaryError> {
    let bytes = std::fs::read(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BoundaryError::NotFound {
            path: path.to_path_buf(),
        },
        _ => BoundaryError::Io(e),
    })?;

    let root = kml::parse_document_bytes(&bytes).map_err(|e| BoundaryError::Parse {
        message: format!("{}: {}", path.display(), e.message),
    })?;
    extract_polygon(&root)
}

/// Extracts the first polygon from KML text.
///
/// # Errors
///
/// Returns [`BoundaryError`] if the text is not well-formed XML or contains
/// no usable polygon.
pub fn parse_kml_str(text: &str) -> Result<Polygon, BoundaryError> {
    let root = kml::parse_document(text).map_err(|e| BoundaryError::Parse { message: e.message })?;
    extract_polygon(&root)
}

/// Extracts the first polygon from an already-parsed KML document.
///
/// Polygons are searched for in this order, and the first non-empty match
/// wins: KML 2.2 `Polygon`, KML 2.1 `Polygon`, 2.2 `MultiGeometry/Polygon`,
/// 2.1 `MultiGeometry/Polygon`, unnamespaced `Polygon`. The outer ring of
/// that polygon is then looked up as
/// `outerBoundaryIs/LinearRing/coordinates` under 2.2, 2.1, and no
/// namespace.
///
/// # Errors
///
/// Returns [`BoundaryError`] if no polygon or coordinates are found, a
/// coordinate is not numeric, or too few vertices remain.
pub fn extract_polygon(root: &Element) -> Result<Polygon, BoundaryError> {
    let polygon = find_polygon(root).ok_or(BoundaryError::NoPolygon)?;
    let coordinates = find_outer_coordinates(polygon).ok_or(BoundaryError::NoCoordinates)?;

    let vertices = parse_coordinates(&coordinates.text)?;
    if vertices.is_empty() {
        return Err(BoundaryError::NoCoordinates);
    }

    let polygon = Polygon::from_ring(vertices);
    if polygon.len() < MIN_VERTICES {
        return Err(BoundaryError::TooFewVertices {
            count: polygon.len(),
        });
    }

    Ok(polygon)
}

fn find_polygon(root: &Element) -> Option<&Element> {
    let direct = |ns: &str| root.descendants_named(Some(ns), "Polygon").into_iter().next();
    let wrapped = |ns: &str| {
        root.descendants_named(Some(ns), "MultiGeometry")
            .into_iter()
            .find_map(|multi| multi.children_named(Some(ns), "Polygon").into_iter().next())
    };

    direct(KML_22_NS)
        .or_else(|| direct(KML_21_NS))
        .or_else(|| wrapped(KML_22_NS))
        .or_else(|| wrapped(KML_21_NS))
        .or_else(|| root.descendants_named(None, "Polygon").into_iter().next())
}

fn find_outer_coordinates(polygon: &Element) -> Option<&Element> {
    NAMESPACES.iter().find_map(|&ns| {
        polygon
            .descendants_named(ns, "outerBoundaryIs")
            .into_iter()
            .flat_map(|boundary| boundary.children_named(ns, "LinearRing"))
            .flat_map(|ring| ring.children_named(ns, "coordinates"))
            .next()
    })
}

/// Parses KML coordinate text (`lon,lat[,alt]` tuples separated by
/// whitespace) into latitude-first vertices.
///
/// Tuples with fewer than two components are skipped; altitude is ignored.
///
/// # Errors
///
/// Returns [`BoundaryError::InvalidCoordinate`] if a longitude or latitude
/// is not a finite number.
pub fn parse_coordinates(text: &str) -> Result<Vec<Vertex>, BoundaryError> {
    let mut vertices = Vec::new();

    for token in text.split_whitespace() {
        let mut parts = token.split(',');
        let (Some(lng), Some(lat)) = (parts.next(), parts.next()) else {
            log::trace!("Skipping malformed coordinate {token:?}");
            continue;
        };

        let vertex = Vertex::parse(lng, lat)
            .ok()
            .filter(Vertex::is_finite)
            .ok_or_else(|| BoundaryError::InvalidCoordinate {
                token: token.to_string(),
            })?;
        vertices.push(vertex);
    }

    Ok(vertices)
}

#[cfg(test)]
mod tests {
    use super::*;

    const RING: &str = "
        0.543,52.268,0
        0.238,52.794,0
        0.478,52.130,0
        0.543,52.268,0
    ";

    fn kml(ns_attr: &str, body: &str) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<kml{ns_attr}>
  <Document>
    <Placemark>
      <name>Test Polygon</name>
      {body}
    </Placemark>
  </Document>
</kml>"#
        )
    }

    fn polygon_body(coords: &str) -> String {
        format!(
            "<Polygon><outerBoundaryIs><LinearRing><coordinates>{coords}</coordinates>\
             </LinearRing></outerBoundaryIs></Polygon>"
        )
    }

    #[test]
    fn extracts_api_string_from_kml_22() {
        let doc = kml(
            r#" xmlns="http://www.opengis.net/kml/2.2""#,
            &polygon_body(RING),
        );
        let polygon = parse_kml_str(&doc).unwrap();
        assert_eq!(
            polygon.to_api_string(),
            "52.268,0.543:52.794,0.238:52.130,0.478"
        );
    }

    #[test]
    fn closing_point_is_removed() {
        let doc = kml("", &polygon_body(RING));
        let polygon = parse_kml_str(&doc).unwrap();
        let raw_points = RING.split_whitespace().count();
        assert_eq!(polygon.len(), raw_points - 1);
        let first = polygon.vertices().first().unwrap();
        assert_eq!(
            polygon.vertices().iter().filter(|v| *v == first).count(),
            1
        );
    }

    #[test]
    fn extracts_from_kml_21_namespace() {
        let doc = kml(
            r#" xmlns="http://earth.google.com/kml/2.1""#,
            &polygon_body(RING),
        );
        assert_eq!(parse_kml_str(&doc).unwrap().len(), 3);
    }

    #[test]
    fn extracts_from_multi_geometry() {
        let body = format!(
            "<MultiGeometry>{}{}</MultiGeometry>",
            polygon_body(RING),
            polygon_body("9,9 8,8 7,7")
        );
        let doc = kml(r#" xmlns="http://www.opengis.net/kml/2.2""#, &body);
        let polygon = parse_kml_str(&doc).unwrap();
        assert_eq!(
            polygon.to_api_string(),
            "52.268,0.543:52.794,0.238:52.130,0.478"
        );
    }

    #[test]
    fn first_polygon_wins() {
        let body = format!("{}{}", polygon_body("1,2 3,4 5,6"), polygon_body(RING));
        let polygon = parse_kml_str(&kml("", &body)).unwrap();
        assert_eq!(polygon.to_api_string(), "2,1:4,3:6,5");
    }

    #[test]
    fn namespaced_polygon_preferred_over_unnamespaced() {
        let doc = format!(
            r#"<root xmlns:k="http://www.opengis.net/kml/2.2">
                {}
                <k:Polygon><k:outerBoundaryIs><k:LinearRing><k:coordinates>{RING}</k:coordinates></k:LinearRing></k:outerBoundaryIs></k:Polygon>
            </root>"#,
            polygon_body("1,2 3,4 5,6")
        );
        let polygon = parse_kml_str(&doc).unwrap();
        assert_eq!(
            polygon.to_api_string(),
            "52.268,0.543:52.794,0.238:52.130,0.478"
        );
    }

    #[test]
    fn altitude_is_optional() {
        let doc = kml("", &polygon_body("0.1,50.1 0.2,50.2 0.3,50.3"));
        assert_eq!(
            parse_kml_str(&doc).unwrap().to_api_string(),
            "50.1,0.1:50.2,0.2:50.3,0.3"
        );
    }

    #[test]
    fn malformed_point_is_skipped() {
        let coords = "0.543,52.268,0 0.543 0.238,52.794,0 0.478,52.130,0";
        let doc = kml("", &polygon_body(coords));
        assert_eq!(
            parse_kml_str(&doc).unwrap().to_api_string(),
            "52.268,0.543:52.794,0.238:52.130,0.478"
        );
    }

    #[test]
    fn non_numeric_coordinate_rejects_file() {
        let doc = kml("", &polygon_body("0.5,north 0.2,50.2 0.3,50.3"));
        assert!(matches!(
            parse_kml_str(&doc),
            Err(BoundaryError::InvalidCoordinate { token }) if token == "0.5,north"
        ));
    }

    #[test]
    fn missing_polygon_is_reported() {
        let doc = kml("", "<Point><coordinates>0.1,50.1</coordinates></Point>");
        assert!(matches!(parse_kml_str(&doc), Err(BoundaryError::NoPolygon)));
    }

    #[test]
    fn polygon_in_other_namespace_is_not_found() {
        let doc = kml(
            r#" xmlns="http://www.opengis.net/kml/2.3""#,
            &polygon_body(RING),
        );
        assert!(matches!(parse_kml_str(&doc), Err(BoundaryError::NoPolygon)));
    }

    #[test]
    fn missing_outer_boundary_is_reported() {
        let doc = kml(
            "",
            "<Polygon><innerBoundaryIs><LinearRing><coordinates>1,2 3,4 5,6</coordinates>\
             </LinearRing></innerBoundaryIs></Polygon>",
        );
        assert!(matches!(
            parse_kml_str(&doc),
            Err(BoundaryError::NoCoordinates)
        ));
    }

    #[test]
    fn empty_coordinates_are_reported() {
        for coords in ["", "   ", "0.5 0.6 0.7"] {
            let doc = kml("", &polygon_body(coords));
            assert!(
                matches!(parse_kml_str(&doc), Err(BoundaryError::NoCoordinates)),
                "{coords:?}"
            );
        }
    }

    #[test]
    fn degenerate_ring_is_rejected() {
        let doc = kml("", &polygon_body("1,2 3,4 1,2"));
        assert!(matches!(
            parse_kml_str(&doc),
            Err(BoundaryError::TooFewVertices { count: 2 })
        ));
    }

    #[test]
    fn malformed_xml_is_a_parse_error() {
        let err = parse_kml_str("<kml><Document></kml>").unwrap_err();
        assert!(matches!(err, BoundaryError::Parse { .. }));
        assert!(err.to_string().starts_with("Error parsing KML file"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nowhere.kml");
        let err = parse_kml_file(&path).unwrap_err();
        assert!(matches!(err, BoundaryError::NotFound { .. }));
        assert!(err.to_string().starts_with("KML file not found"));
    }

    #[test]
    fn reads_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.kml");
        std::fs::write(&path, kml("", &polygon_body(RING))).unwrap();
        assert_eq!(parse_kml_file(&path).unwrap().len(), 3);
    }

    #[test]
    fn reads_latin1_file_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("cafe.kml");
        let doc = kml("", &polygon_body(RING)).replace("UTF-8", "ISO-8859-1");
        let mut bytes = doc.into_bytes();
        let name_at = bytes.windows(4).position(|w| w == b"Test").unwrap();
        bytes.splice(name_at..name_at + 4, b"Caf\xe9".iter().copied());
        std::fs::write(&path, bytes).unwrap();

        let polygon = parse_kml_file(&path).unwrap();
        assert_eq!(
            polygon.to_api_string(),
            "52.268,0.543:52.794,0.238:52.130,0.478"
        );
    }

    #[test]
    fn undecodable_file_is_a_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("area.kml");
        let mut bytes = b"<kml><name>Caf\xe9</name>".to_vec();
        bytes.extend_from_slice(polygon_body(RING).as_bytes());
        bytes.extend_from_slice(b"</kml>");
        std::fs::write(&path, bytes).unwrap();

        let err = parse_kml_file(&path).unwrap_err();
        assert!(matches!(err, BoundaryError::Parse { .. }));
    }
}
