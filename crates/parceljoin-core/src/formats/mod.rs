//! Input format readers.
//!
//! Footprint sources implement the `FootprintReader` trait, and the
//! `FormatRegistry` picks a reader from the file extension. Parcels come
//! from a single GeoJSON layout and have their own reader in [`parcels`].

use async_trait::async_trait;
use geojson::Feature;
use serde_json::Value;
use std::path::Path;

use crate::error::{ParceljoinError, Result};
use crate::models::{FootprintDataset, SkipReason};

pub mod buildings;
pub mod osm;
pub mod overpass;
pub mod parcels;
pub mod properties;

/// Reader for a building footprint source
#[async_trait]
pub trait FootprintReader: Send + Sync {
    /// Read footprints from the given path
    ///
    /// Individual bad records are skipped and counted in the dataset report;
    /// only an unreadable or structurally invalid document is an error.
    async fn read(&self, path: &Path) -> Result<FootprintDataset>;

    /// Get supported file extensions (e.g., ["osm", "xml"])
    fn supported_extensions(&self) -> &[&str];

    /// Get human-readable format name (e.g., "OSM XML")
    fn format_name(&self) -> &str;
}

/// Central registry for footprint readers
pub struct FormatRegistry {
    readers: Vec<Box<dyn FootprintReader>>,
}

impl FormatRegistry {
    /// Create a new empty format registry
    pub fn new() -> Self {
        Self { readers: Vec::new() }
    }

    /// Registry with every built-in footprint reader
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(Box::new(osm::OsmXmlReader));
        registry.register(Box::new(overpass::OverpassJsonReader));
        registry.register(Box::new(buildings::BuildingsGeoJsonReader));
        registry
    }

    /// Register a format reader
    pub fn register(&mut self, reader: Box<dyn FootprintReader>) {
        self.readers.push(reader);
    }

    /// Detect format and return appropriate reader
    pub fn detect_format(&self, path: &Path) -> Result<&dyn FootprintReader> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        self.readers
            .iter()
            .find(|r| r.supported_extensions().contains(&extension.as_str()))
            .map(|r| r.as_ref())
            .ok_or_else(|| ParceljoinError::UnsupportedFormat {
                path: path.to_path_buf(),
                supported: self.supported_formats().join(", "),
            })
    }

    /// Detect the format and read the file
    pub async fn read(&self, path: &Path) -> Result<FootprintDataset> {
        let reader = self.detect_format(path)?;
        tracing::debug!(path = %path.display(), format = reader.format_name(), "Reading footprints");
        reader.read(path).await
    }

    /// Get list of all supported format extensions
    pub fn supported_formats(&self) -> Vec<String> {
        self.readers
            .iter()
            .flat_map(|r| r.supported_extensions())
            .map(|s| s.to_string())
            .collect()
    }

    /// Get all registered readers
    pub fn readers(&self) -> &[Box<dyn FootprintReader>] {
        &self.readers
    }
}

impl Default for FormatRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

/// Read a whole input file, reporting a missing file as such
pub(crate) async fn read_input(path: &Path) -> Result<String> {
    match tokio::fs::read_to_string(path).await {
        Ok(content) => Ok(content),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(ParceljoinError::InputNotFound { path: path.to_path_buf() })
        }
        Err(e) => Err(ParceljoinError::Io(e)),
    }
}

/// Dataset name from the file stem
pub(crate) fn dataset_name(path: &Path) -> String {
    path.file_stem().and_then(|s| s.to_str()).unwrap_or("unnamed").to_string()
}

/// Geometry type names defined by GeoJSON
const GEOMETRY_TYPES: &[&str] = &[
    "Point",
    "MultiPoint",
    "LineString",
    "MultiLineString",
    "Polygon",
    "MultiPolygon",
    "GeometryCollection",
];

/// Split a GeoJSON FeatureCollection into individually decoded features.
///
/// Only the document root is fatal: invalid JSON, a root that is not a
/// FeatureCollection, or a missing `features` array. A member that does not
/// decode as a feature becomes a skip reason in its slot.
pub(crate) fn decode_feature_collection(
    content: &str,
    format: &str,
) -> Result<Vec<std::result::Result<Feature, SkipReason>>> {
    let root: Value =
        serde_json::from_str(content).map_err(|e| ParceljoinError::invalid(format, e.to_string()))?;

    if root.get("type").and_then(Value::as_str) != Some("FeatureCollection") {
        return Err(ParceljoinError::invalid(format, "expected a FeatureCollection"));
    }
    let Some(Value::Array(members)) = root.get("features") else {
        return Err(ParceljoinError::invalid(format, "FeatureCollection has no features array"));
    };

    Ok(members.iter().map(decode_feature).collect())
}

fn decode_feature(member: &Value) -> std::result::Result<Feature, SkipReason> {
    Feature::try_from(member.clone()).map_err(|e| {
        let reason = undecodable_reason(member);
        tracing::debug!(error = %e, reason = %reason, "Undecodable feature");
        reason
    })
}

/// Unknown geometry types are unsupported; anything else that fails to
/// decode is missing or malformed coordinates.
fn undecodable_reason(member: &Value) -> SkipReason {
    match member.pointer("/geometry/type").and_then(Value::as_str) {
        Some(kind) if !GEOMETRY_TYPES.contains(&kind) => SkipReason::UnsupportedGeometry,
        _ => SkipReason::MissingGeometry,
    }
}
