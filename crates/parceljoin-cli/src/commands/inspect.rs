//! Inspect command implementation

use crate::cli::{InspectArgs, InspectTarget};
use crate::output::OutputWriter;
use crate::output_types::{InspectFootprintsOutput, InspectParcelsOutput};
use crate::progress::{create_spinner, finish_success};
use anyhow::{Context, Result};
use parceljoin_core::formats::parcels::ParcelReader;
use parceljoin_core::formats::FormatRegistry;
use parceljoin_core::models::{BoundingBox, RawHeight};
use std::path::Path;

use super::counter_rows;

pub async fn execute(args: InspectArgs, output: &OutputWriter) -> Result<()> {
    match args.target {
        InspectTarget::Footprints { path } => inspect_footprints(&path, output).await,
        InspectTarget::Parcels { path } => inspect_parcels(&path, output).await,
    }
}

async fn inspect_footprints(path: &Path, output: &OutputWriter) -> Result<()> {
    let spinner = (!output.is_json()).then(|| create_spinner("Parsing footprints..."));

    let dataset = FormatRegistry::with_defaults()
        .read(path)
        .await
        .with_context(|| format!("Failed to read footprints from {}", path.display()))?;

    if let Some(spinner) = &spinner {
        finish_success(spinner, &format!("Parsed {} footprints", dataset.len()));
    }

    let with_height = dataset
        .footprints
        .iter()
        .filter(|f| !matches!(f.height, RawHeight::Missing))
        .count();
    let extent = dataset.extent();

    if output.is_json() {
        return output.result(InspectFootprintsOutput {
            path: path.display().to_string(),
            format: dataset.format_name.clone(),
            footprint_count: dataset.len(),
            with_height,
            extent,
            report: dataset.report,
        });
    }

    output.section(format!("Footprints: {}", dataset.name));
    output.kv("Format", &dataset.format_name);
    output.kv("Footprints", dataset.len());
    output.kv("With height", with_height);
    output.kv("Extent", format_extent(extent));
    output.table(counter_rows("footprints", &dataset.report));

    Ok(())
}

async fn inspect_parcels(path: &Path, output: &OutputWriter) -> Result<()> {
    let spinner = (!output.is_json()).then(|| create_spinner("Normalizing parcels..."));

    let dataset = ParcelReader
        .read(path, None)
        .await
        .with_context(|| format!("Failed to read parcels from {}", path.display()))?;

    if let Some(spinner) = &spinner {
        finish_success(spinner, &format!("Normalized {} parcels", dataset.len()));
    }

    let multi_ring_count = dataset.parcels.iter().filter(|p| p.rings.len() > 1).count();
    let extent = dataset.extent();

    if output.is_json() {
        return output.result(InspectParcelsOutput {
            path: path.display().to_string(),
            parcel_count: dataset.len(),
            multi_ring_count,
            extent,
            report: dataset.report,
        });
    }

    output.section(format!("Parcels: {}", dataset.name));
    output.kv("Parcels", dataset.len());
    output.kv("Multi-ring parcels", multi_ring_count);
    output.kv("Extent", format_extent(extent));
    output.table(counter_rows("parcels", &dataset.report));

    Ok(())
}

fn format_extent(extent: Option<BoundingBox>) -> String {
    match extent {
        Some(b) => format!("[{}, {}] to [{}, {}]", b.min_lon, b.min_lat, b.max_lon, b.max_lat),
        None => "empty".to_string(),
    }
}
