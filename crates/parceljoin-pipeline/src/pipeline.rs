use chrono::Utc;
use parceljoin_core::error::{ParceljoinError, Result};
use parceljoin_core::formats::parcels::ParcelReader;
use parceljoin_core::formats::FormatRegistry;
use parceljoin_core::models::{BuildingDataset, FootprintDataset, Parcel, ParcelDataset, RawFootprint};
use parceljoin_geo::spatial::{MatchResult, MatchSummary, ParcelMatcher};
use parceljoin_geo::transform::LocalFrame;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use crate::enrich::Enricher;
use crate::models::{
    report_path_for, MatchCounts, PipelineInputs, PipelineOptions, PipelinePhase,
    PipelineProgress, PipelineRunResult, RunReport,
};

/// Batch pipeline: parse, normalize, match, enrich
pub struct BuildPipeline {
    registry: FormatRegistry,
    parcel_reader: ParcelReader,
    options: PipelineOptions,
}

impl BuildPipeline {
    /// Create a pipeline with the default footprint readers
    pub fn new(options: PipelineOptions) -> Self {
        Self::with_registry(FormatRegistry::with_defaults(), options)
    }

    pub fn with_registry(registry: FormatRegistry, options: PipelineOptions) -> Self {
        Self { registry, parcel_reader: ParcelReader, options }
    }

    pub fn options(&self) -> &PipelineOptions {
        &self.options
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Run the pipeline without progress reporting
    pub async fn run(&self, inputs: &PipelineInputs) -> Result<PipelineRunResult> {
        self.run_with_progress(inputs, |_| {}).await
    }

    /// Run the pipeline with progress reporting
    ///
    /// This performs the following steps:
    /// 1. Parse footprints (fatal when none survive)
    /// 2. Normalize parcels, pruned to the footprint extent
    /// 3. Fix the local frame origin
    /// 4. Match every building on the rayon pool
    /// 5. Enrich in building order
    pub async fn run_with_progress<F>(
        &self,
        inputs: &PipelineInputs,
        mut progress: F,
    ) -> Result<PipelineRunResult>
    where
        F: FnMut(PipelineProgress),
    {
        let started_at = Utc::now();
        let options = &self.options;

        tracing::info!(
            unmatched = %options.unmatched,
            source = ?options.unmatched_source,
            representative_point = %options.representative_point,
            scale = options.scale,
            "Starting building enrichment run"
        );

        // Phase 1: Footprints
        progress(PipelineProgress {
            phase: PipelinePhase::ParsingFootprints,
            current: 0,
            total: 1,
            message: format!("Reading {}", inputs.footprints.display()),
        });

        let footprints = self.registry.read(&inputs.footprints).await?;
        if footprints.is_empty() {
            return Err(ParceljoinError::EmptyDataset {
                what: format!("footprints in {}", inputs.footprints.display()),
            });
        }
        log_footprints(&footprints);

        // Phase 2: Parcels
        progress(PipelineProgress {
            phase: PipelinePhase::NormalizingParcels,
            current: 0,
            total: 1,
            message: format!("Reading {}", inputs.parcels.display()),
        });

        let reference = if options.prefilter_parcels {
            footprints.extent()
        } else {
            tracing::warn!("Parcel prefilter disabled; matching against every parcel");
            None
        };
        let parcels = self.parcel_reader.read(&inputs.parcels, reference).await?;
        log_parcels(&parcels);

        // Phase 3: Frame
        let frame = match options.origin {
            Some(origin) => LocalFrame::new(origin, options.scale),
            None => LocalFrame::from_first_vertex(&footprints.footprints, options.scale)
                .ok_or_else(|| ParceljoinError::EmptyDataset {
                    what: "footprint vertices for the frame origin".to_string(),
                })?,
        };
        tracing::info!(origin = ?frame.origin(), scale = frame.scale(), "Local frame fixed");

        // Phase 4: Matching
        progress(PipelineProgress {
            phase: PipelinePhase::Matching,
            current: 0,
            total: footprints.len(),
            message: format!(
                "Matching {} buildings against {} parcels",
                footprints.len(),
                parcels.len()
            ),
        });

        let results = match_buildings(&footprints.footprints, &parcels.parcels, options)?;
        let summary = MatchSummary::from_results(&results);

        progress(PipelineProgress {
            phase: PipelinePhase::Matching,
            current: footprints.len(),
            total: footprints.len(),
            message: format!("Matched {}/{} buildings", summary.matched, footprints.len()),
        });

        // Phase 5: Enrichment
        progress(PipelineProgress {
            phase: PipelinePhase::Enriching,
            current: 0,
            total: footprints.len(),
            message: "Merging parcel attributes".to_string(),
        });

        let enricher = Enricher::new(frame, options.height, options.unmatched);
        let (buildings, building_report) = enricher.enrich_all(&footprints.footprints, &results);

        if buildings.is_empty() {
            tracing::warn!("No buildings left after enrichment; output will be empty");
        }
        tracing::info!(
            kept = building_report.kept,
            dropped_unmatched = building_report.filtered,
            fallbacks = ?building_report.fallbacks,
            "Enriched buildings"
        );

        progress(PipelineProgress {
            phase: PipelinePhase::Finalizing,
            current: 1,
            total: 1,
            message: format!("Prepared {} buildings", buildings.len()),
        });

        let report = RunReport {
            started_at,
            finished_at: Utc::now(),
            inputs: inputs.clone(),
            origin: frame.origin(),
            scale: frame.scale(),
            unmatched_policy: options.unmatched,
            representative_point: options.representative_point,
            prefilter_parcels: options.prefilter_parcels,
            matching: MatchCounts::new(summary, building_report.filtered),
            footprints: footprints.report,
            parcels: parcels.report,
            buildings: building_report,
        };

        Ok(PipelineRunResult { dataset: BuildingDataset::new(buildings), report })
    }
}

/// Match on a dedicated pool when a worker count is configured
fn match_buildings<'a>(
    footprints: &[RawFootprint],
    parcels: &'a [Parcel],
    options: &PipelineOptions,
) -> Result<Vec<MatchResult<'a>>> {
    let matcher = ParcelMatcher::new(parcels, options.representative_point);

    if options.workers == 0 {
        return Ok(matcher.match_all(footprints));
    }

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(options.workers)
        .build()
        .map_err(|e| ParceljoinError::ConfigInvalid {
            key: "workers".to_string(),
            reason: format!("Failed to build thread pool: {}", e),
        })?;

    Ok(pool.install(|| matcher.match_all(footprints)))
}

fn log_footprints(dataset: &FootprintDataset) {
    tracing::info!(
        format = %dataset.format_name,
        kept = dataset.report.kept,
        skipped = ?dataset.report.skipped,
        fallbacks = ?dataset.report.fallbacks,
        "Footprints ready"
    );
}

fn log_parcels(dataset: &ParcelDataset) {
    if dataset.is_empty() {
        tracing::warn!(
            name = %dataset.name,
            "No parcels to match against; every building will be unmatched"
        );
    }
    tracing::info!(
        kept = dataset.report.kept,
        outside_reference = dataset.report.filtered,
        skipped = ?dataset.report.skipped,
        fallbacks = ?dataset.report.fallbacks,
        "Parcels ready"
    );
}

/// Write the dataset and its run report; returns the report path
pub fn persist(result: &PipelineRunResult, output: &Path) -> Result<PathBuf> {
    result.dataset.write_to(output)?;

    let report_path = report_path_for(output);
    let mut writer = BufWriter::new(fs::File::create(&report_path)?);
    serde_json::to_writer_pretty(&mut writer, &result.report)?;
    writer.flush()?;

    tracing::info!(
        output = %output.display(),
        report = %report_path.display(),
        buildings = result.dataset.len(),
        "Wrote building dataset"
    );

    Ok(report_path)
}
