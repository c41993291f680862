use crate::config::{load_config, resolve_config_path};
use crate::output::OutputWriter;
use crate::output_types::{ConfigValue, InspectConfigOutput};
use anyhow::{Context, Result};
use std::collections::BTreeMap;
use std::path::Path;
use tabled::Tabled;

/// Show the effective layered configuration
pub fn execute(config_path: Option<&Path>, output: &OutputWriter) -> Result<()> {
    let file = resolve_config_path(config_path)?;
    let config = load_config(config_path)?;
    config.validate().context("Configuration loaded but is invalid")?;

    let values: BTreeMap<String, ConfigValue<String>> = config
        .to_inspection_map()
        .into_iter()
        .map(|(key, (value, source))| (key, ConfigValue { value, source: format!("{:?}", source) }))
        .collect();

    if output.is_json() {
        return output.result(InspectConfigOutput {
            config_file: file.map(|p| p.display().to_string()),
            values,
        });
    }

    output.section("Configuration");
    match &file {
        Some(path) => output.kv("File", path.display()),
        None => output.kv("File", "none (defaults and environment only)"),
    }

    #[derive(Tabled)]
    struct ConfigRow {
        #[tabled(rename = "Key")]
        key: String,
        #[tabled(rename = "Value")]
        value: String,
        #[tabled(rename = "Source")]
        source: String,
    }

    let rows: Vec<ConfigRow> = values
        .into_iter()
        .map(|(key, v)| ConfigRow { key, value: v.value, source: v.source })
        .collect();
    output.table(rows);

    Ok(())
}
