use parceljoin_core::models::{BoundingBox, StageReport};
use parceljoin_pipeline::{MatchCounts, RunReport};
use serde::Serialize;
use std::collections::BTreeMap;

/// Output for build command
#[derive(Debug, Serialize)]
pub struct BuildOutput {
    pub output: String,
    pub report: String,
    pub building_count: usize,
    pub duration_ms: i64,
    pub origin: [f64; 2],
    pub matching: MatchCounts,
    pub footprints: StageReport,
    pub parcels: StageReport,
    pub buildings: StageReport,
}

impl BuildOutput {
    pub fn new(output: String, report_path: String, report: &RunReport) -> Self {
        Self {
            output,
            report: report_path,
            building_count: report.output_count(),
            duration_ms: report.duration_ms(),
            origin: report.origin,
            matching: report.matching,
            footprints: report.footprints.clone(),
            parcels: report.parcels.clone(),
            buildings: report.buildings.clone(),
        }
    }
}

/// Output for inspect footprints command
#[derive(Debug, Serialize)]
pub struct InspectFootprintsOutput {
    pub path: String,
    pub format: String,
    pub footprint_count: usize,
    pub with_height: usize,
    pub extent: Option<BoundingBox>,
    pub report: StageReport,
}

/// Output for inspect parcels command
#[derive(Debug, Serialize)]
pub struct InspectParcelsOutput {
    pub path: String,
    pub parcel_count: usize,
    pub multi_ring_count: usize,
    pub extent: Option<BoundingBox>,
    pub report: StageReport,
}

/// Output for config command
#[derive(Debug, Serialize)]
pub struct InspectConfigOutput {
    pub config_file: Option<String>,
    pub values: BTreeMap<String, ConfigValue<String>>,
}

#[derive(Debug, Serialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: String,
}
