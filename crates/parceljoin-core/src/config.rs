use crate::error::{ParceljoinError, Result};
use crate::models::{Coord, RepresentativePoint, UnmatchedPolicy};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;

/// Degrees to approximate meters at the dataset's latitude
pub const DEFAULT_SCALE: f64 = 90_000.0;

/// Height used when the source has no usable height, in meters
pub const DEFAULT_FALLBACK_HEIGHT: f64 = 5.0;

/// Floor applied to heights derived from elevations, in meters
pub const DEFAULT_MIN_HEIGHT: f64 = 5.0;

/// Configuration file looked up in the working directory
pub const CONFIG_FILE_NAME: &str = "parceljoin.toml";

/// Configuration source for tracking where values come from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Default value
    Default,
    /// Loaded from config file
    File,
    /// Loaded from environment variable
    Environment,
    /// Provided via CLI argument
    Cli,
}

impl ConfigSource {
    /// Returns the precedence level (higher = higher priority)
    pub fn precedence(&self) -> u8 {
        match self {
            ConfigSource::Default => 0,
            ConfigSource::File => 1,
            ConfigSource::Environment => 2,
            ConfigSource::Cli => 3,
        }
    }
}

/// A configuration value with its source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigValue<T> {
    pub value: T,
    pub source: ConfigSource,
}

impl<T> ConfigValue<T> {
    pub fn new(value: T, source: ConfigSource) -> Self {
        Self { value, source }
    }

    /// Update the value if the new source has higher precedence
    pub fn update(&mut self, value: T, source: ConfigSource) {
        if source.precedence() > self.source.precedence() {
            self.value = value;
            self.source = source;
        }
    }
}

/// Layered configuration for a pipeline run
#[derive(Debug, Clone)]
pub struct LayeredConfig {
    pub scale: ConfigValue<f64>,
    pub fallback_height: ConfigValue<f64>,
    pub min_height: ConfigValue<f64>,
    pub unmatched: ConfigValue<UnmatchedPolicy>,
    pub representative_point: ConfigValue<RepresentativePoint>,
    pub prefilter_parcels: ConfigValue<bool>,
    pub origin: ConfigValue<Option<Coord>>,
    pub workers: ConfigValue<usize>,
}

impl LayeredConfig {
    /// Create a new configuration with default values
    pub fn with_defaults() -> Self {
        Self {
            scale: ConfigValue::new(DEFAULT_SCALE, ConfigSource::Default),
            fallback_height: ConfigValue::new(DEFAULT_FALLBACK_HEIGHT, ConfigSource::Default),
            min_height: ConfigValue::new(DEFAULT_MIN_HEIGHT, ConfigSource::Default),
            unmatched: ConfigValue::new(UnmatchedPolicy::Keep, ConfigSource::Default),
            representative_point: ConfigValue::new(
                RepresentativePoint::FirstVertex,
                ConfigSource::Default,
            ),
            prefilter_parcels: ConfigValue::new(true, ConfigSource::Default),
            origin: ConfigValue::new(None, ConfigSource::Default),
            workers: ConfigValue::new(0, ConfigSource::Default),
        }
    }

    /// Load configuration from a TOML file
    pub fn load_from_file<P: AsRef<Path>>(mut self, path: P) -> Result<Self> {
        let content =
            fs::read_to_string(path.as_ref()).map_err(|e| ParceljoinError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to read config file: {}", e),
            })?;

        let file_config: FileConfig =
            toml::from_str(&content).map_err(|e| ParceljoinError::ConfigInvalid {
                key: "file".to_string(),
                reason: format!("Failed to parse TOML: {}", e),
            })?;

        if let Some(scale) = file_config.scale {
            self.scale.update(scale, ConfigSource::File);
        }

        if let Some(fallback_height) = file_config.fallback_height {
            self.fallback_height.update(fallback_height, ConfigSource::File);
        }

        if let Some(min_height) = file_config.min_height {
            self.min_height.update(min_height, ConfigSource::File);
        }

        if let Some(unmatched) = file_config.unmatched {
            self.unmatched.update(unmatched, ConfigSource::File);
        }

        if let Some(point) = file_config.representative_point {
            self.representative_point.update(point, ConfigSource::File);
        }

        if let Some(prefilter) = file_config.prefilter_parcels {
            self.prefilter_parcels.update(prefilter, ConfigSource::File);
        }

        if let Some(origin) = file_config.origin {
            self.origin.update(Some(origin), ConfigSource::File);
        }

        if let Some(workers) = file_config.workers {
            self.workers.update(workers, ConfigSource::File);
        }

        Ok(self)
    }

    /// Load configuration from environment variables
    pub fn load_from_env(mut self) -> Self {
        // PARCELJOIN_SCALE
        if let Ok(raw) = env::var("PARCELJOIN_SCALE") {
            match raw.parse::<f64>() {
                Ok(scale) => self.scale.update(scale, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_SCALE value '{}': expected a number",
                    raw
                ),
            }
        }

        // PARCELJOIN_FALLBACK_HEIGHT
        if let Ok(raw) = env::var("PARCELJOIN_FALLBACK_HEIGHT") {
            match raw.parse::<f64>() {
                Ok(height) => self.fallback_height.update(height, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_FALLBACK_HEIGHT value '{}': expected a number",
                    raw
                ),
            }
        }

        // PARCELJOIN_MIN_HEIGHT
        if let Ok(raw) = env::var("PARCELJOIN_MIN_HEIGHT") {
            match raw.parse::<f64>() {
                Ok(height) => self.min_height.update(height, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_MIN_HEIGHT value '{}': expected a number",
                    raw
                ),
            }
        }

        // PARCELJOIN_UNMATCHED
        if let Ok(raw) = env::var("PARCELJOIN_UNMATCHED") {
            match parse_unmatched_policy(&raw) {
                Ok(policy) => self.unmatched.update(policy, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_UNMATCHED value '{}': expected keep or drop",
                    raw
                ),
            }
        }

        // PARCELJOIN_REPRESENTATIVE_POINT
        if let Ok(raw) = env::var("PARCELJOIN_REPRESENTATIVE_POINT") {
            match parse_representative_point(&raw) {
                Ok(point) => self.representative_point.update(point, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_REPRESENTATIVE_POINT value '{}': expected first_vertex or centroid",
                    raw
                ),
            }
        }

        // PARCELJOIN_PREFILTER
        if let Ok(raw) = env::var("PARCELJOIN_PREFILTER") {
            match parse_bool(&raw) {
                Ok(prefilter) => self.prefilter_parcels.update(prefilter, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_PREFILTER value '{}': expected true or false",
                    raw
                ),
            }
        }

        // PARCELJOIN_WORKERS
        if let Ok(raw) = env::var("PARCELJOIN_WORKERS") {
            match raw.parse::<usize>() {
                Ok(workers) => self.workers.update(workers, ConfigSource::Environment),
                Err(_) => tracing::warn!(
                    "Invalid PARCELJOIN_WORKERS value '{}': expected a non-negative integer",
                    raw
                ),
            }
        }

        self
    }

    /// Update configuration from CLI arguments
    pub fn update_from_cli(&mut self, overrides: CliConfigOverrides) {
        if let Some(scale) = overrides.scale {
            self.scale.update(scale, ConfigSource::Cli);
        }

        if let Some(fallback_height) = overrides.fallback_height {
            self.fallback_height.update(fallback_height, ConfigSource::Cli);
        }

        if let Some(min_height) = overrides.min_height {
            self.min_height.update(min_height, ConfigSource::Cli);
        }

        if let Some(unmatched) = overrides.unmatched {
            self.unmatched.update(unmatched, ConfigSource::Cli);
        }

        if let Some(point) = overrides.representative_point {
            self.representative_point.update(point, ConfigSource::Cli);
        }

        if let Some(prefilter) = overrides.prefilter_parcels {
            self.prefilter_parcels.update(prefilter, ConfigSource::Cli);
        }

        if let Some(origin) = overrides.origin {
            self.origin.update(Some(origin), ConfigSource::Cli);
        }

        if let Some(workers) = overrides.workers {
            self.workers.update(workers, ConfigSource::Cli);
        }
    }

    /// Reject values the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        check_positive("scale", self.scale.value)?;
        check_positive("fallback_height", self.fallback_height.value)?;
        check_positive("min_height", self.min_height.value)?;

        if let Some(origin) = self.origin.value {
            if !origin[0].is_finite() || !origin[1].is_finite() {
                return Err(ParceljoinError::ConfigInvalid {
                    key: "origin".to_string(),
                    reason: "Origin coordinates must be finite".to_string(),
                });
            }
        }

        Ok(())
    }

    /// Get all configuration values as a map for inspection
    pub fn to_inspection_map(&self) -> HashMap<String, (String, ConfigSource)> {
        let mut map = HashMap::new();

        map.insert("scale".to_string(), (self.scale.value.to_string(), self.scale.source));

        map.insert(
            "fallback_height".to_string(),
            (format!("{} m", self.fallback_height.value), self.fallback_height.source),
        );

        map.insert(
            "min_height".to_string(),
            (format!("{} m", self.min_height.value), self.min_height.source),
        );

        map.insert(
            "unmatched".to_string(),
            (self.unmatched.value.to_string(), self.unmatched.source),
        );

        map.insert(
            "representative_point".to_string(),
            (self.representative_point.value.to_string(), self.representative_point.source),
        );

        map.insert(
            "prefilter_parcels".to_string(),
            (self.prefilter_parcels.value.to_string(), self.prefilter_parcels.source),
        );

        let origin = match self.origin.value {
            Some([lon, lat]) => format!("[{}, {}]", lon, lat),
            None => "first vertex of first footprint".to_string(),
        };
        map.insert("origin".to_string(), (origin, self.origin.source));

        let workers = match self.workers.value {
            0 => "auto".to_string(),
            n => n.to_string(),
        };
        map.insert("workers".to_string(), (workers, self.workers.source));

        map
    }
}

fn check_positive(key: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ParceljoinError::ConfigInvalid {
            key: key.to_string(),
            reason: format!("Expected a positive number, got {}", value),
        })
    }
}

/// Configuration loaded from TOML file
#[derive(Debug, Deserialize, Serialize)]
struct FileConfig {
    scale: Option<f64>,
    fallback_height: Option<f64>,
    min_height: Option<f64>,
    unmatched: Option<UnmatchedPolicy>,
    representative_point: Option<RepresentativePoint>,
    prefilter_parcels: Option<bool>,
    origin: Option<Coord>,
    workers: Option<usize>,
}

/// CLI configuration overrides
#[derive(Debug, Default)]
pub struct CliConfigOverrides {
    pub scale: Option<f64>,
    pub fallback_height: Option<f64>,
    pub min_height: Option<f64>,
    pub unmatched: Option<UnmatchedPolicy>,
    pub representative_point: Option<RepresentativePoint>,
    pub prefilter_parcels: Option<bool>,
    pub origin: Option<Coord>,
    pub workers: Option<usize>,
}

/// Parse unmatched-building policy from string
pub fn parse_unmatched_policy(s: &str) -> Result<UnmatchedPolicy> {
    match s.trim().to_lowercase().as_str() {
        "keep" | "keep_with_nulls" => Ok(UnmatchedPolicy::Keep),
        "drop" => Ok(UnmatchedPolicy::Drop),
        _ => Err(ParceljoinError::ConfigInvalid {
            key: "unmatched".to_string(),
            reason: format!("Invalid unmatched policy: {}. Use keep or drop", s),
        }),
    }
}

/// Parse representative point mode from string
pub fn parse_representative_point(s: &str) -> Result<RepresentativePoint> {
    match s.trim().to_lowercase().replace('-', "_").as_str() {
        "first_vertex" | "first" => Ok(RepresentativePoint::FirstVertex),
        "centroid" => Ok(RepresentativePoint::Centroid),
        _ => Err(ParceljoinError::ConfigInvalid {
            key: "representative_point".to_string(),
            reason: format!("Invalid representative point: {}. Use first_vertex or centroid", s),
        }),
    }
}

fn parse_bool(s: &str) -> Result<bool> {
    match s.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ParceljoinError::ConfigInvalid {
            key: "prefilter_parcels".to_string(),
            reason: format!("Invalid boolean: {}", s),
        }),
    }
}
