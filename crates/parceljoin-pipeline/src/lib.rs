//! Parceljoin Pipeline - Batch orchestration and enrichment
//!
//! This crate sequences the run: footprints and parcels are read, every
//! building is matched and enriched, and the dataset is persisted together
//! with its run report.

pub mod enrich;
pub mod models;
pub mod pipeline;

pub use enrich::Enricher;
pub use models::{
    report_path_for, MatchCounts, PipelineInputs, PipelineOptions, PipelinePhase,
    PipelineProgress, PipelineRunResult, RunReport,
};
pub use pipeline::{persist, BuildPipeline};
