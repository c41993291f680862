use crate::cli::BuildArgs;
use crate::config::{build_overrides, load_config_with_overrides};
use crate::dry_run::{display_planned_actions, ActionType, PlannedAction};
use crate::output::OutputWriter;
use crate::output_types::BuildOutput;
use crate::progress::BuildProgress;
use anyhow::{Context, Result};
use parceljoin_core::config::LayeredConfig;
use parceljoin_pipeline::{
    persist, report_path_for, BuildPipeline, PipelineInputs, PipelineOptions,
};
use std::path::Path;

use super::counter_rows;

pub async fn execute(
    args: BuildArgs,
    config_path: Option<&Path>,
    output: &OutputWriter,
    dry_run: bool,
) -> Result<()> {
    let config = load_config_with_overrides(config_path, build_overrides(&args))?;
    let options = PipelineOptions::from_config(&config);
    let inputs = PipelineInputs::new(&args.footprints, &args.parcels);
    let pipeline = BuildPipeline::new(options);

    if dry_run {
        let actions = plan(&pipeline, &config, &inputs, &args.output)?;
        return display_planned_actions(output, &actions);
    }

    output.info(format!(
        "Joining {} to {}",
        inputs.footprints.display(),
        inputs.parcels.display()
    ));

    let run = if output.is_json() {
        pipeline.run(&inputs).await
    } else {
        let mut progress = BuildProgress::new();
        let run = pipeline.run_with_progress(&inputs, |p| progress.update(&p)).await;
        match run {
            Ok(_) => progress.finish(),
            Err(_) => progress.fail(),
        }
        run
    };
    let result = run.context("Build failed")?;

    let report_path = persist(&result, &args.output)
        .with_context(|| format!("Failed to write {}", args.output.display()))?;

    let report = &result.report;
    if report.output_count() == 0 {
        output.warning("No buildings were written; check the unmatched policy and inputs");
    }

    if output.is_json() {
        return output.result(BuildOutput::new(
            args.output.display().to_string(),
            report_path.display().to_string(),
            report,
        ));
    }

    output.success(format!(
        "Wrote {} buildings to {}",
        report.output_count(),
        args.output.display()
    ));

    output.section("Matching");
    output.kv("Matched", report.matching.matched);
    output.kv("Unmatched", report.matching.unmatched);
    output.kv("Decided by assessed value", report.matching.ties);
    if report.matching.dropped_unmatched > 0 {
        output.kv("Dropped (unmatched)", report.matching.dropped_unmatched);
    }

    output.section("Frame");
    output.kv("Origin", format!("[{}, {}]", report.origin[0], report.origin[1]));
    output.kv("Scale", report.scale);

    output.section("Counters");
    let mut rows = counter_rows("footprints", &report.footprints);
    rows.extend(counter_rows("parcels", &report.parcels));
    rows.extend(counter_rows("buildings", &report.buildings));
    output.table(rows);

    output.section("Run");
    output.kv("Duration", format!("{} ms", report.duration_ms()));
    output.kv("Report", report_path.display());

    Ok(())
}

/// Actions a build would take, without reading parcels or writing anything
fn plan(
    pipeline: &BuildPipeline,
    config: &LayeredConfig,
    inputs: &PipelineInputs,
    output_path: &Path,
) -> Result<Vec<PlannedAction>> {
    let reader = pipeline
        .registry()
        .detect_format(&inputs.footprints)
        .context("Cannot read footprints")?;

    let options = pipeline.options();
    let mut actions = vec![
        PlannedAction::new(
            ActionType::ReadFile,
            format!("Parse footprints from {}", inputs.footprints.display()),
        )
        .with_detail(format!("Format: {}", reader.format_name())),
        PlannedAction::new(
            ActionType::ReadFile,
            format!("Normalize parcels from {}", inputs.parcels.display()),
        )
        .with_detail(if options.prefilter_parcels {
            "Pruned to the footprint extent".to_string()
        } else {
            "Prefilter disabled; every parcel is a candidate".to_string()
        }),
        PlannedAction::new(ActionType::MatchBuildings, "Match each building to one parcel")
            .with_detail(format!("Representative point: {}", options.representative_point))
            .with_detail(format!(
                "Unmatched policy: {} (from {:?})",
                options.unmatched, config.unmatched.source
            ))
            .with_detail(match options.workers {
                0 => "Workers: one per core".to_string(),
                n => format!("Workers: {}", n),
            }),
    ];

    if let Some(parent) = output_path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if !parent.exists() {
            actions.push(PlannedAction::new(
                ActionType::CreateDirectory,
                format!("Create {}", parent.display()),
            ));
        }
    }

    actions.push(
        PlannedAction::new(ActionType::WriteFile, format!("Write {}", output_path.display()))
            .with_detail(match options.origin {
                Some([lon, lat]) => format!("Frame origin: [{}, {}]", lon, lat),
                None => "Frame origin: first vertex of the first footprint".to_string(),
            })
            .with_detail(format!("Scale: {}", options.scale)),
    );
    actions.push(PlannedAction::new(
        ActionType::WriteFile,
        format!("Write {}", report_path_for(output_path).display()),
    ));

    Ok(actions)
}
