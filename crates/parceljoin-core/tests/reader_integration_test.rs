//! Integration tests for reading footprint and parcel files from disk

use parceljoin_core::formats::parcels::ParcelReader;
use parceljoin_core::formats::FormatRegistry;
use parceljoin_core::models::{BoundingBox, Fallback, RawHeight, SkipReason};
use parceljoin_core::ParceljoinError;
use std::fs;
use tempfile::TempDir;

const OSM_XML: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<osm version="0.6" generator="test">
  <node id="1" lat="51.0450" lon="-114.0700"/>
  <node id="2" lat="51.0450" lon="-114.0690"/>
  <node id="3" lat="51.0460" lon="-114.0690"/>
  <node id="4" lat="51.0460" lon="-114.0700"/>
  <way id="10">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/><nd ref="4"/><nd ref="1"/>
    <tag k="building" v="yes"/>
    <tag k="height" v="45 ft"/>
  </way>
  <way id="11">
    <nd ref="1"/><nd ref="2"/><nd ref="3"/>
    <tag k="highway" v="residential"/>
  </way>
</osm>
"#;

const OVERPASS_JSON: &str = r#"{
  "elements": [
    {"type": "node", "id": 1, "lat": 51.0450, "lon": -114.0700},
    {"type": "node", "id": 2, "lat": 51.0450, "lon": -114.0690},
    {"type": "node", "id": 3, "lat": 51.0460, "lon": -114.0690},
    {"type": "way", "id": 10, "nodes": [1, 2, 3, 99, 1],
     "tags": {"building": "commercial", "height": "tall"}}
  ]
}"#;

const BUILDINGS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [{
    "type": "Feature",
    "geometry": {"type": "Polygon", "coordinates": [[
      [-114.07, 51.045], [-114.069, 51.045], [-114.069, 51.046], [-114.07, 51.045]
    ]]},
    "properties": {"struct_id": "S-1", "stage": "CONSTRUCTED",
                   "grd_elev_min_z": 1040.0, "rooftop_elev_z": 1043.0}
  }]
}"#;

const PARCELS_GEOJSON: &str = r#"{
  "type": "FeatureCollection",
  "features": [
    {
      "type": "Feature",
      "geometry": {"type": "Polygon", "coordinates": [[
        [-114.071, 51.044], [-114.068, 51.044], [-114.068, 51.047], [-114.071, 51.047], [-114.071, 51.044]
      ]]},
      "properties": {"assessed_value": 2500000, "comm_name": "BELTLINE", "roll_number": "201000001"}
    },
    {
      "type": "Feature",
      "geometry": {"type": "Polygon", "coordinates": [[
        [-113.90, 50.90], [-113.89, 50.90], [-113.89, 50.91], [-113.90, 50.90]
      ]]},
      "properties": {"assessed_value": 400000}
    }
  ]
}"#;

fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, content).unwrap();
    path
}

#[tokio::test]
async fn test_read_osm_xml_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "downtown.osm", OSM_XML);

    let dataset = FormatRegistry::with_defaults().read(&path).await.unwrap();

    assert_eq!(dataset.name, "downtown");
    assert_eq!(dataset.format_name, "OSM XML");
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.footprints[0].source_id, "10");
    assert_eq!(dataset.footprints[0].ring.len(), 5);
    match dataset.footprints[0].height {
        RawHeight::Measured(h) => assert!((h - 13.716).abs() < 1e-9),
        ref other => panic!("expected measured height, got {:?}", other),
    }
}

#[tokio::test]
async fn test_read_overpass_json_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "downtown.json", OVERPASS_JSON);

    let dataset = FormatRegistry::with_defaults().read(&path).await.unwrap();

    assert_eq!(dataset.format_name, "Overpass JSON");
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.footprints[0].ring.len(), 4);
    assert_eq!(dataset.footprints[0].height, RawHeight::Missing);
    assert_eq!(dataset.report.fallbacks_for(Fallback::MissingPointRef), 1);
    assert_eq!(dataset.report.fallbacks_for(Fallback::UnparsableHeightTag), 1);
}

#[tokio::test]
async fn test_read_buildings_geojson_through_registry() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "buildings_3d.geojson", BUILDINGS_GEOJSON);

    let dataset = FormatRegistry::with_defaults().read(&path).await.unwrap();

    assert_eq!(dataset.format_name, "3D Buildings GeoJSON");
    assert_eq!(dataset.footprints[0].source_id, "S-1");
    assert_eq!(
        dataset.footprints[0].height,
        RawHeight::Elevations { roof: Some(1043.0), ground: Some(1040.0) }
    );
}

#[tokio::test]
async fn test_missing_footprint_file() {
    let dir = TempDir::new().unwrap();
    let err = FormatRegistry::with_defaults()
        .read(&dir.path().join("absent.osm"))
        .await
        .unwrap_err();

    assert!(matches!(err, ParceljoinError::InputNotFound { .. }));
}

#[tokio::test]
async fn test_malformed_osm_is_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "broken.osm", "<osm><node id=\"1\" lat=\"51\" lon=\"-114\"><way></osm>");

    let err = FormatRegistry::with_defaults().read(&path).await.unwrap_err();

    assert!(matches!(err, ParceljoinError::FormatValidation { .. }));
}

#[tokio::test]
async fn test_read_parcels_with_reference_region() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "parcels.geojson", PARCELS_GEOJSON);
    let reference = BoundingBox::new(-114.07, 51.045, -114.069, 51.046);

    let dataset = ParcelReader.read(&path, Some(reference)).await.unwrap();

    assert_eq!(dataset.name, "parcels");
    assert_eq!(dataset.len(), 1);
    assert_eq!(dataset.parcels[0].attributes.community.as_deref(), Some("BELTLINE"));
    assert_eq!(dataset.report.filtered, 1);
    assert_eq!(dataset.report.skipped_total(), 0);
    assert_eq!(dataset.reference, Some(reference));
}

#[tokio::test]
async fn test_read_parcels_without_reference_region() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "parcels.geojson", PARCELS_GEOJSON);

    let dataset = ParcelReader.read(&path, None).await.unwrap();

    assert_eq!(dataset.len(), 2);
    assert_eq!(dataset.parcels[1].id, 1);
    assert_eq!(dataset.report.skipped_for(SkipReason::TooFewVertices), 0);
}

const VALID_POLYGON: &str = r#"{
  "type": "Feature",
  "geometry": {"type": "Polygon", "coordinates": [[
    [-114.071, 51.044], [-114.068, 51.044], [-114.068, 51.047], [-114.071, 51.044]
  ]]},
  "properties": {"assessed_value": 2500000, "struct_id": "S-1"}
}"#;

/// One feature per way a geometry can fail to decode, with the reason it
/// should be reported under
const UNDECODABLE_FEATURES: [(&str, SkipReason); 5] = [
    (
        r#"{"type": "Feature", "geometry": {"type": "Polygon"}, "properties": {}}"#,
        SkipReason::MissingGeometry,
    ),
    (
        r#"{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": null}, "properties": {}}"#,
        SkipReason::MissingGeometry,
    ),
    (
        r#"{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": []}, "properties": {}}"#,
        SkipReason::MissingGeometry,
    ),
    (
        r#"{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[-114.07], [-114.06, 51.04], [-114.06, 51.05]]]}, "properties": {}}"#,
        SkipReason::MissingGeometry,
    ),
    (
        r#"{"type": "Feature", "geometry": {"type": "Circle", "coordinates": [-114.07, 51.04], "radius": 10}, "properties": {}}"#,
        SkipReason::UnsupportedGeometry,
    ),
];

fn collection_with(bad_feature: &str) -> String {
    format!(
        r#"{{"type": "FeatureCollection", "features": [{}, {}]}}"#,
        bad_feature, VALID_POLYGON
    )
}

#[tokio::test]
async fn test_parcels_skip_undecodable_features() {
    let dir = TempDir::new().unwrap();

    for (bad_feature, reason) in UNDECODABLE_FEATURES {
        let path = write(&dir, "parcels.geojson", &collection_with(bad_feature));

        let dataset = ParcelReader.read(&path, None).await.unwrap();

        assert_eq!(dataset.len(), 1, "{}", bad_feature);
        assert_eq!(dataset.parcels[0].id, 0);
        assert_eq!(dataset.report.kept, 1);
        assert_eq!(dataset.report.skipped_for(reason), 1, "{}", bad_feature);
        assert_eq!(dataset.report.skipped_total(), 1);
    }
}

#[tokio::test]
async fn test_buildings_skip_undecodable_features() {
    let dir = TempDir::new().unwrap();

    for (bad_feature, reason) in UNDECODABLE_FEATURES {
        let path = write(&dir, "buildings_3d.geojson", &collection_with(bad_feature));

        let dataset = FormatRegistry::with_defaults().read(&path).await.unwrap();

        assert_eq!(dataset.len(), 1, "{}", bad_feature);
        assert_eq!(dataset.footprints[0].source_id, "S-1");
        assert_eq!(dataset.report.kept, 1);
        assert_eq!(dataset.report.skipped_for(reason), 1, "{}", bad_feature);
        assert_eq!(dataset.report.skipped_total(), 1);
    }
}

#[tokio::test]
async fn test_parcels_without_feature_collection_are_fatal() {
    let dir = TempDir::new().unwrap();
    let path = write(&dir, "parcels.geojson", VALID_POLYGON);

    let err = ParcelReader.read(&path, None).await.unwrap_err();

    assert!(matches!(err, ParceljoinError::FormatValidation { .. }));
}
