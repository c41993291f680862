//! 3D building footprint reader (`.geojson`).
//!
//! Citywide building exports ship each structure as a Polygon feature with
//! roof and ground elevations instead of a height tag.

use async_trait::async_trait;
use geojson::Feature;
use std::path::Path;

use super::properties::{coerce_f64, coerce_string};
use crate::error::Result;
use crate::formats::{dataset_name, decode_feature_collection, read_input, FootprintReader};
use crate::models::geometry::validate_ring;
use crate::models::{Coord, FootprintDataset, RawFootprint, RawHeight, Ring, SkipReason, StageReport};

const FORMAT_NAME: &str = "3D Buildings GeoJSON";

/// 3D building GeoJSON reader
pub struct BuildingsGeoJsonReader;

#[async_trait]
impl FootprintReader for BuildingsGeoJsonReader {
    async fn read(&self, path: &Path) -> Result<FootprintDataset> {
        let content = read_input(path).await?;
        let (footprints, report) = footprints_from_geojson(&content)?;

        tracing::info!(
            path = %path.display(),
            footprints = footprints.len(),
            skipped = report.skipped_total(),
            "Parsed 3D building footprints"
        );

        Ok(FootprintDataset {
            name: dataset_name(path),
            format_name: FORMAT_NAME.to_string(),
            footprints,
            report,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["geojson"]
    }

    fn format_name(&self) -> &str {
        FORMAT_NAME
    }
}

/// Extract footprints from a building feature collection.
///
/// Only a document that is not a feature collection is fatal; features that
/// fail to decode are skipped.
pub fn footprints_from_geojson(content: &str) -> Result<(Vec<RawFootprint>, StageReport)> {
    let members = decode_feature_collection(content, FORMAT_NAME)?;

    let mut report = StageReport::new();
    let mut footprints = Vec::new();

    for (idx, member) in members.iter().enumerate() {
        let outcome = member.as_ref().map_err(|reason| *reason);
        match outcome.and_then(|feature| footprint_from_feature(feature, idx)) {
            Ok(footprint) => {
                footprints.push(footprint);
                report.record_kept();
            }
            Err(reason) => {
                tracing::debug!(feature = idx, reason = %reason, "Skipping building feature");
                report.record_skip(reason);
            }
        }
    }

    Ok((footprints, report))
}

fn footprint_from_feature(feature: &Feature, idx: usize) -> std::result::Result<RawFootprint, SkipReason> {
    let geometry = feature.geometry.as_ref().ok_or(SkipReason::MissingGeometry)?;
    let ring = match &geometry.value {
        geojson::Value::Polygon(rings) => {
            let outer = rings.first().ok_or(SkipReason::MissingGeometry)?;
            positions_to_ring(outer)?
        }
        _ => return Err(SkipReason::UnsupportedGeometry),
    };
    validate_ring(&ring)?;

    let ground = coerce_f64(feature.property("grd_elev_min_z"));
    let roof = coerce_f64(feature.property("rooftop_elev_z"));
    let height = if roof.is_none() && ground.is_none() {
        RawHeight::Missing
    } else {
        RawHeight::Elevations { roof, ground }
    };

    let source_id = coerce_string(feature.property("struct_id"))
        .or_else(|| feature.id.as_ref().map(feature_id_string))
        .unwrap_or_else(|| idx.to_string());

    Ok(RawFootprint::new(source_id, ring)
        .with_height(height)
        .with_stage(coerce_string(feature.property("stage"))))
}

/// Convert GeoJSON positions to `[lon, lat]`, ignoring any Z component
pub(crate) fn positions_to_ring(positions: &[Vec<f64>]) -> std::result::Result<Ring, SkipReason> {
    if positions.is_empty() {
        return Err(SkipReason::MissingGeometry);
    }
    positions
        .iter()
        .map(|p| match p.as_slice() {
            [lon, lat, ..] => Ok::<Coord, SkipReason>([*lon, *lat]),
            _ => Err(SkipReason::MissingGeometry),
        })
        .collect()
}

fn feature_id_string(id: &geojson::feature::Id) -> String {
    match id {
        geojson::feature::Id::String(s) => s.clone(),
        geojson::feature::Id::Number(n) => n.to_string(),
    }
}
