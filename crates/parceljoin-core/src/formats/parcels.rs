//! Parcel assessment reader and normalizer.
//!
//! Turns a cadastral feature collection into flat [`Parcel`] records: outer
//! rings only, one record per feature even for MultiPolygons, bounding box
//! precomputed, attributes coerced.

use geojson::Feature;
use serde_json::Value;
use std::path::Path;

use super::buildings::positions_to_ring;
use super::properties::{coerce_f64, coerce_string};
use crate::error::Result;
use crate::formats::{dataset_name, decode_feature_collection, read_input};
use crate::models::geometry::validate_ring;
use crate::models::{
    BoundingBox, Fallback, Parcel, ParcelAttributes, ParcelDataset, Ring, SkipReason, StageReport,
};

const FORMAT_NAME: &str = "Parcel GeoJSON";

/// Parcel assessment GeoJSON reader
pub struct ParcelReader;

impl ParcelReader {
    /// Read and normalize parcels, dropping those outside `reference` when given
    pub async fn read(&self, path: &Path, reference: Option<BoundingBox>) -> Result<ParcelDataset> {
        let content = read_input(path).await?;
        let (parcels, report) = normalize_parcels(&content, reference.as_ref())?;

        tracing::info!(
            path = %path.display(),
            parcels = parcels.len(),
            outside_reference = report.filtered,
            skipped = report.skipped_total(),
            "Normalized parcels"
        );

        Ok(ParcelDataset { name: dataset_name(path), parcels, reference, report })
    }

    pub fn format_name(&self) -> &str {
        FORMAT_NAME
    }
}

/// Normalize a parcel feature collection.
///
/// Features are processed in order; ids are assigned densely to the parcels
/// that survive, so the output order is the feature order. A feature that
/// cannot be decoded is skipped like any other bad geometry.
pub fn normalize_parcels(
    content: &str,
    reference: Option<&BoundingBox>,
) -> Result<(Vec<Parcel>, StageReport)> {
    let members = decode_feature_collection(content, FORMAT_NAME)?;

    let mut report = StageReport::new();
    let mut parcels = Vec::new();

    for (idx, member) in members.iter().enumerate() {
        let outcome = member.as_ref().map_err(|reason| *reason).and_then(|feature| {
            outer_rings(feature).map(|(rings, degenerate)| (feature, rings, degenerate))
        });
        let (feature, rings, degenerate) = match outcome {
            Ok(decoded) => decoded,
            Err(reason) => {
                tracing::debug!(feature = idx, reason = %reason, "Skipping parcel feature");
                report.record_skip(reason);
                continue;
            }
        };

        let attributes = parcel_attributes(feature);
        let Some(parcel) = Parcel::new(parcels.len(), rings, attributes) else {
            report.record_skip(SkipReason::MissingGeometry);
            continue;
        };

        if let Some(reference) = reference {
            if !parcel.bbox.intersects(reference) {
                report.record_filtered();
                continue;
            }
        }

        report.record_fallbacks(Fallback::DegenerateRing, degenerate);
        if parcel.attributes.assessed_value.is_none() {
            report.record_fallback(Fallback::MissingAssessedValue);
        }
        parcels.push(parcel);
        report.record_kept();
    }

    Ok((parcels, report))
}

/// Outer ring of a Polygon, or of every member of a MultiPolygon.
///
/// Returns the usable rings and how many degenerate rings were dropped.
fn outer_rings(feature: &Feature) -> std::result::Result<(Vec<Ring>, usize), SkipReason> {
    let geometry = feature.geometry.as_ref().ok_or(SkipReason::MissingGeometry)?;

    let candidates: Vec<&Vec<Vec<f64>>> = match &geometry.value {
        geojson::Value::Polygon(rings) => rings.first().into_iter().collect(),
        geojson::Value::MultiPolygon(polygons) => {
            polygons.iter().filter_map(|rings| rings.first()).collect()
        }
        _ => return Err(SkipReason::UnsupportedGeometry),
    };
    if candidates.is_empty() {
        return Err(SkipReason::MissingGeometry);
    }

    let mut rings = Vec::with_capacity(candidates.len());
    let mut degenerate = 0;
    let mut last_error = SkipReason::TooFewVertices;
    for positions in candidates {
        match positions_to_ring(positions).and_then(|ring| validate_ring(&ring).map(|_| ring)) {
            Ok(ring) => rings.push(ring),
            Err(reason) => {
                degenerate += 1;
                last_error = reason;
            }
        }
    }

    if rings.is_empty() {
        return Err(last_error);
    }
    Ok((rings, degenerate))
}

fn parcel_attributes(feature: &Feature) -> ParcelAttributes {
    let prop = |key: &str| -> Option<&Value> { feature.property(key) };

    ParcelAttributes {
        assessed_value: coerce_f64(prop("assessed_value")),
        address: coerce_string(prop("address")),
        community: coerce_string(prop("comm_name")),
        land_use_designation: coerce_string(prop("land_use_designation")),
        property_type: coerce_string(prop("property_type")),
        sub_property_use: coerce_string(prop("sub_property_use")),
        land_size_sm: coerce_f64(prop("land_size_sm")),
        land_size_ac: coerce_f64(prop("land_size_ac")),
        roll_number: coerce_string(prop("roll_number")),
        assessment_class: coerce_string(prop("assessment_class")),
        assessment_class_description: coerce_string(prop("assessment_class_description")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn collection(features: &str) -> String {
        format!(r#"{{"type": "FeatureCollection", "features": [{}]}}"#, features)
    }

    const POLYGON: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "Polygon", "coordinates": [
            [[0.0, 0.0], [2.0, 0.0], [2.0, 2.0], [0.0, 2.0], [0.0, 0.0]],
            [[0.5, 0.5], [1.0, 0.5], [1.0, 1.0], [0.5, 0.5]]
        ]},
        "properties": {
            "assessed_value": "100000",
            "address": "100 1 ST SW",
            "comm_name": "DOWNTOWN COMMERCIAL CORE",
            "land_use_designation": "CR20-C20/R20",
            "property_type": "LI",
            "sub_property_use": "CM0201",
            "land_size_sm": 650.5,
            "land_size_ac": "0.16",
            "roll_number": 68123456,
            "assessment_class": "NR",
            "assessment_class_description": "Non-residential"
        }
    }"#;

    const MULTI_POLYGON: &str = r#"{
        "type": "Feature",
        "geometry": {"type": "MultiPolygon", "coordinates": [
            [[[10.0, 10.0], [11.0, 10.0], [11.0, 11.0], [10.0, 11.0], [10.0, 10.0]]],
            [[[20.0, 20.0], [21.0, 20.0], [21.0, 21.0], [20.0, 21.0], [20.0, 20.0]]]
        ]},
        "properties": {"assessed_value": null, "comm_name": "SUNALTA"}
    }"#;

    #[test]
    fn test_polygon_keeps_outer_ring_only() {
        let (parcels, report) = normalize_parcels(&collection(POLYGON), None).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].rings.len(), 1);
        assert_eq!(parcels[0].bbox, BoundingBox::new(0.0, 0.0, 2.0, 2.0));
        assert_eq!(report.kept, 1);
    }

    #[test]
    fn test_attributes_are_coerced() {
        let (parcels, _) = normalize_parcels(&collection(POLYGON), None).unwrap();
        let attributes = &parcels[0].attributes;

        assert_eq!(attributes.assessed_value, Some(100_000.0));
        assert_eq!(attributes.community.as_deref(), Some("DOWNTOWN COMMERCIAL CORE"));
        assert_eq!(attributes.land_size_sm, Some(650.5));
        assert_eq!(attributes.land_size_ac, Some(0.16));
        assert_eq!(attributes.roll_number.as_deref(), Some("68123456"));
        assert_eq!(attributes.assessment_class_description.as_deref(), Some("Non-residential"));
    }

    #[test]
    fn test_multipolygon_is_one_parcel_with_many_rings() {
        let reference = BoundingBox::new(5.0, 5.0, 25.0, 25.0);
        let (parcels, report) =
            normalize_parcels(&collection(MULTI_POLYGON), Some(&reference)).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].rings.len(), 2);
        assert_eq!(parcels[0].bbox, BoundingBox::new(10.0, 10.0, 21.0, 21.0));
        assert_eq!(parcels[0].attributes.assessed_value, None);
        assert_eq!(report.fallbacks_for(Fallback::MissingAssessedValue), 1);
    }

    #[test]
    fn test_reference_bbox_prunes_parcels() {
        let features = format!("{},{}", POLYGON, MULTI_POLYGON);
        let reference = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);
        let (parcels, report) = normalize_parcels(&collection(&features), Some(&reference)).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].id, 0);
        assert_eq!(report.filtered, 1);
    }

    #[test]
    fn test_ids_are_dense_after_filtering() {
        let features = format!("{},{}", MULTI_POLYGON, POLYGON);
        let reference = BoundingBox::new(-1.0, -1.0, 1.0, 1.0);
        let (parcels, _) = normalize_parcels(&collection(&features), Some(&reference)).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].id, 0);
        assert_eq!(parcels[0].attributes.assessed_value, Some(100_000.0));
    }

    #[test]
    fn test_unsupported_and_empty_geometries_are_skipped() {
        let features = r#"
            {"type": "Feature", "geometry": {"type": "LineString", "coordinates": [[0,0],[1,1]]}, "properties": {}},
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": []}, "properties": {}},
            {"type": "Feature", "geometry": null, "properties": {}},
            {"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[0,0],[1,1],[0,0]]]}, "properties": {}}
        "#;
        let (parcels, report) = normalize_parcels(&collection(features), None).unwrap();

        assert!(parcels.is_empty());
        assert_eq!(report.skipped_for(SkipReason::UnsupportedGeometry), 1);
        assert_eq!(report.skipped_for(SkipReason::MissingGeometry), 2);
        assert_eq!(report.skipped_for(SkipReason::TooFewVertices), 1);
    }

    #[test]
    fn test_degenerate_member_ring_is_dropped() {
        let feature = r#"{
            "type": "Feature",
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0.0, 0.0], [1.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [5.0, 5.0]]]
            ]},
            "properties": {"assessed_value": 5}
        }"#;
        let (parcels, report) = normalize_parcels(&collection(feature), None).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].rings.len(), 1);
        assert_eq!(report.fallbacks_for(Fallback::DegenerateRing), 1);
    }

    #[test]
    fn test_undecodable_features_are_skipped() {
        let bad = [
            (r#"{"type": "Feature", "geometry": {"type": "Polygon"}, "properties": {}}"#, SkipReason::MissingGeometry),
            (r#"{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": null}, "properties": {}}"#, SkipReason::MissingGeometry),
            (r#"{"type": "Feature", "geometry": {"type": "Polygon", "coordinates": [[[1.0], [2.0, 0.0], [2.0, 2.0]]]}, "properties": {}}"#, SkipReason::MissingGeometry),
            (r#"{"type": "Feature", "geometry": {"type": "Circle", "coordinates": [0.0, 0.0]}, "properties": {}}"#, SkipReason::UnsupportedGeometry),
        ];

        for (feature, reason) in bad {
            let features = format!("{},{}", POLYGON, feature);
            let (parcels, report) = normalize_parcels(&collection(&features), None).unwrap();

            assert_eq!(parcels.len(), 1, "{}", feature);
            assert_eq!(report.kept, 1);
            assert_eq!(report.skipped_for(reason), 1, "{}", feature);
            assert_eq!(report.skipped_total(), 1);
        }
    }

    #[test]
    fn test_non_collection_root_is_fatal() {
        let err = normalize_parcels(r#"{"type": "Feature", "geometry": null, "properties": {}}"#, None)
            .unwrap_err();
        assert!(matches!(err, crate::error::ParceljoinError::FormatValidation { .. }));
    }

    #[test]
    fn test_degenerate_rings_counted_only_for_emitted_parcels() {
        let all_degenerate = r#"{
            "type": "Feature",
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[0.0, 0.0], [1.0, 1.0], [0.0, 0.0]]],
                [[[5.0, 5.0], [5.0, 5.0]]]
            ]},
            "properties": {"assessed_value": 1}
        }"#;
        let far_away = r#"{
            "type": "Feature",
            "geometry": {"type": "MultiPolygon", "coordinates": [
                [[[50.0, 50.0], [51.0, 50.0], [51.0, 51.0], [50.0, 50.0]]],
                [[[60.0, 60.0], [60.0, 60.0]]]
            ]},
            "properties": {"assessed_value": 1}
        }"#;
        let features = format!("{},{},{}", all_degenerate, far_away, POLYGON);
        let reference = BoundingBox::new(-1.0, -1.0, 3.0, 3.0);

        let (parcels, report) = normalize_parcels(&collection(&features), Some(&reference)).unwrap();

        assert_eq!(parcels.len(), 1);
        assert_eq!(report.skipped_for(SkipReason::TooFewVertices), 1);
        assert_eq!(report.filtered, 1);
        assert_eq!(report.fallbacks_for(Fallback::DegenerateRing), 0);
    }
}
