//! Configuration loading for CLI commands

use anyhow::{Context, Result};
use parceljoin_core::config::{CliConfigOverrides, LayeredConfig, CONFIG_FILE_NAME};
use parceljoin_core::ParceljoinError;
use std::path::{Path, PathBuf};

use crate::cli::BuildArgs;

/// Config file to read: the explicit path, else `parceljoin.toml` when present
pub fn resolve_config_path(explicit: Option<&Path>) -> Result<Option<PathBuf>> {
    if let Some(path) = explicit {
        if !path.is_file() {
            return Err(ParceljoinError::ConfigMissing {
                key: format!("config file {}", path.display()),
            }
            .into());
        }
        return Ok(Some(path.to_path_buf()));
    }

    let default = std::env::current_dir()
        .context("Failed to read the working directory")?
        .join(CONFIG_FILE_NAME);
    Ok(default.is_file().then_some(default))
}

/// Load file and environment layers
pub fn load_config(explicit: Option<&Path>) -> Result<LayeredConfig> {
    let mut config = LayeredConfig::with_defaults();

    if let Some(path) = resolve_config_path(explicit)? {
        tracing::debug!(path = %path.display(), "Loading configuration file");
        config = config
            .load_from_file(&path)
            .with_context(|| format!("Failed to load configuration file {}", path.display()))?;
    }

    Ok(config.load_from_env())
}

/// Load every layer, apply CLI overrides, and validate the result
pub fn load_config_with_overrides(
    explicit: Option<&Path>,
    overrides: CliConfigOverrides,
) -> Result<LayeredConfig> {
    let mut config = load_config(explicit)?;
    config.update_from_cli(overrides);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// CLI overrides carried by the build flags
pub fn build_overrides(args: &BuildArgs) -> CliConfigOverrides {
    CliConfigOverrides {
        scale: args.scale,
        fallback_height: args.fallback_height,
        min_height: args.min_height,
        unmatched: args.unmatched,
        representative_point: args.representative_point,
        prefilter_parcels: args.no_prefilter.then_some(false),
        origin: args.origin,
        workers: args.workers,
    }
}
