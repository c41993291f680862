use chrono::{DateTime, Utc};
use parceljoin_core::config::{ConfigSource, LayeredConfig};
use parceljoin_core::models::{
    BuildingDataset, Coord, RepresentativePoint, StageReport, UnmatchedPolicy,
};
use parceljoin_geo::spatial::MatchSummary;
use parceljoin_geo::transform::HeightPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Input files for one run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineInputs {
    /// Street-map extract or 3D building export
    pub footprints: PathBuf,

    /// Parcel assessment feature collection
    pub parcels: PathBuf,
}

impl PipelineInputs {
    pub fn new(footprints: impl Into<PathBuf>, parcels: impl Into<PathBuf>) -> Self {
        Self { footprints: footprints.into(), parcels: parcels.into() }
    }
}

/// Effective settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineOptions {
    /// Degrees to local meters
    pub scale: f64,

    /// Fixed origin; the first vertex of the first footprint when absent
    pub origin: Option<Coord>,

    pub height: HeightPolicy,

    pub unmatched: UnmatchedPolicy,

    /// Where the unmatched policy came from, for the run log
    pub unmatched_source: ConfigSource,

    pub representative_point: RepresentativePoint,

    /// Prune parcels against the footprint extent before matching
    pub prefilter_parcels: bool,

    /// Matching threads; 0 uses the rayon default
    pub workers: usize,
}

impl PipelineOptions {
    /// Options from a validated layered configuration
    pub fn from_config(config: &LayeredConfig) -> Self {
        Self {
            scale: config.scale.value,
            origin: config.origin.value,
            height: HeightPolicy::new(config.fallback_height.value, config.min_height.value),
            unmatched: config.unmatched.value,
            unmatched_source: config.unmatched.source,
            representative_point: config.representative_point.value,
            prefilter_parcels: config.prefilter_parcels.value,
            workers: config.workers.value,
        }
    }

    pub fn with_unmatched(mut self, policy: UnmatchedPolicy) -> Self {
        self.unmatched = policy;
        self
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_origin(mut self, origin: Coord) -> Self {
        self.origin = Some(origin);
        self
    }

    pub fn with_representative_point(mut self, point: RepresentativePoint) -> Self {
        self.representative_point = point;
        self
    }
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self::from_config(&LayeredConfig::with_defaults())
    }
}

/// Progress information for a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineProgress {
    pub phase: PipelinePhase,
    pub current: usize,
    pub total: usize,
    pub message: String,
}

/// Current phase of a pipeline run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PipelinePhase {
    ParsingFootprints,
    NormalizingParcels,
    Matching,
    Enriching,
    Finalizing,
}

impl PipelinePhase {
    pub fn label(&self) -> &'static str {
        match self {
            PipelinePhase::ParsingFootprints => "Parsing footprints",
            PipelinePhase::NormalizingParcels => "Normalizing parcels",
            PipelinePhase::Matching => "Matching buildings",
            PipelinePhase::Enriching => "Enriching buildings",
            PipelinePhase::Finalizing => "Finalizing",
        }
    }
}

/// Matching counters for the run report
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchCounts {
    pub matched: usize,
    pub unmatched: usize,
    /// Matches decided by the assessed-value tie-break
    pub ties: usize,
    /// Unmatched buildings removed under the drop policy
    pub dropped_unmatched: usize,
}

impl MatchCounts {
    pub fn new(summary: MatchSummary, dropped_unmatched: usize) -> Self {
        Self {
            matched: summary.matched,
            unmatched: summary.unmatched,
            ties: summary.ties,
            dropped_unmatched,
        }
    }
}

/// Audit record written next to the output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,

    pub inputs: PipelineInputs,

    /// Origin of the local frame, `[lon, lat]`
    pub origin: Coord,
    pub scale: f64,
    pub unmatched_policy: UnmatchedPolicy,
    pub representative_point: RepresentativePoint,
    pub prefilter_parcels: bool,

    pub footprints: StageReport,
    pub parcels: StageReport,
    pub matching: MatchCounts,

    /// Enrichment counters: kept buildings, dropped unmatched, height fallbacks
    pub buildings: StageReport,
}

impl RunReport {
    /// Output buildings
    pub fn output_count(&self) -> usize {
        self.buildings.kept
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Result of a pipeline run
#[derive(Debug, Clone)]
pub struct PipelineRunResult {
    pub dataset: BuildingDataset,
    pub report: RunReport,
}

/// Report path for an output file: `<output>.report.json`
pub fn report_path_for(output: &Path) -> PathBuf {
    let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(".report.json");
    output.with_file_name(name)
}
