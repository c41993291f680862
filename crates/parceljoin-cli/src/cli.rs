use clap::{Parser, Subcommand};
use parceljoin_core::config::{parse_representative_point, parse_unmatched_policy};
use parceljoin_core::models::{Coord, RepresentativePoint, UnmatchedPolicy};
use std::path::PathBuf;

/// Parceljoin - Building footprint to cadastral parcel enrichment
#[derive(Parser, Debug)]
#[command(name = "parceljoin")]
#[command(about = "Join building footprints to cadastral parcels", long_about = None)]
#[command(version)]
pub struct Cli {
    /// Output results in JSON format
    #[arg(long, global = true)]
    pub json: bool,

    /// Show planned actions without executing them
    #[arg(long, global = true)]
    pub dry_run: bool,

    /// Configuration file (defaults to ./parceljoin.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Match footprints to parcels and write the enriched building dataset
    Build(BuildArgs),

    /// Parse one input file and report what survived
    Inspect(InspectArgs),

    /// Show the effective configuration and where each value came from
    Config,
}

#[derive(Parser, Debug)]
pub struct BuildArgs {
    /// Building footprints (.osm, .json Overpass export, or .geojson)
    #[arg(long)]
    pub footprints: PathBuf,

    /// Parcel assessment GeoJSON
    #[arg(long)]
    pub parcels: PathBuf,

    /// Output path for the building dataset
    #[arg(long, short, default_value = "buildings.json")]
    pub output: PathBuf,

    /// What to do with buildings on no parcel (keep or drop)
    #[arg(long, value_parser = parse_unmatched)]
    pub unmatched: Option<UnmatchedPolicy>,

    /// Point tested against parcels (first_vertex or centroid)
    #[arg(long, value_parser = parse_point)]
    pub representative_point: Option<RepresentativePoint>,

    /// Degrees to local meters
    #[arg(long)]
    pub scale: Option<f64>,

    /// Height for buildings without a usable height, in meters
    #[arg(long)]
    pub fallback_height: Option<f64>,

    /// Floor for heights derived from elevations, in meters
    #[arg(long)]
    pub min_height: Option<f64>,

    /// Local frame origin as "lon,lat"
    #[arg(long, value_parser = parse_origin, allow_hyphen_values = true)]
    pub origin: Option<Coord>,

    /// Match against every parcel instead of those near the footprints
    #[arg(long)]
    pub no_prefilter: bool,

    /// Matching threads (0 = one per core)
    #[arg(long)]
    pub workers: Option<usize>,
}

#[derive(Parser, Debug)]
pub struct InspectArgs {
    #[command(subcommand)]
    pub target: InspectTarget,
}

#[derive(Subcommand, Debug)]
pub enum InspectTarget {
    /// Parse a footprint file
    Footprints {
        path: PathBuf,
    },

    /// Normalize a parcel file without a reference region
    Parcels {
        path: PathBuf,
    },
}

fn parse_unmatched(s: &str) -> Result<UnmatchedPolicy, String> {
    parse_unmatched_policy(s).map_err(|e| e.to_string())
}

fn parse_point(s: &str) -> Result<RepresentativePoint, String> {
    parse_representative_point(s).map_err(|e| e.to_string())
}

fn parse_origin(s: &str) -> Result<Coord, String> {
    let parts: Vec<&str> = s.trim_matches(|c| c == '[' || c == ']').split(',').collect();
    if parts.len() != 2 {
        return Err(format!("Expected \"lon,lat\", got {}", s));
    }

    let lon = parts[0].trim().parse::<f64>().map_err(|e| format!("Invalid longitude: {}", e))?;
    let lat = parts[1].trim().parse::<f64>().map_err(|e| format!("Invalid latitude: {}", e))?;
    Ok([lon, lat])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_origin() {
        assert_eq!(parse_origin("-114.07,51.04").unwrap(), [-114.07, 51.04]);
        assert_eq!(parse_origin("[-114.07, 51.04]").unwrap(), [-114.07, 51.04]);
        assert!(parse_origin("-114.07").is_err());
        assert!(parse_origin("a,b").is_err());
    }

    #[test]
    fn test_build_args() {
        let cli = Cli::try_parse_from([
            "parceljoin",
            "build",
            "--footprints",
            "downtown.osm",
            "--parcels",
            "parcels.geojson",
            "--unmatched",
            "drop",
            "--origin",
            "-114.07,51.04",
            "--no-prefilter",
            "--json",
        ])
        .unwrap();

        assert!(cli.json);
        match cli.command {
            Commands::Build(args) => {
                assert_eq!(args.output, PathBuf::from("buildings.json"));
                assert_eq!(args.unmatched, Some(UnmatchedPolicy::Drop));
                assert_eq!(args.origin, Some([-114.07, 51.04]));
                assert!(args.no_prefilter);
                assert_eq!(args.representative_point, None);
            }
            other => panic!("unexpected command: {:?}", other),
        }
    }

    #[test]
    fn test_invalid_policy_rejected() {
        let result = Cli::try_parse_from([
            "parceljoin",
            "build",
            "--footprints",
            "a.osm",
            "--parcels",
            "p.geojson",
            "--unmatched",
            "maybe",
        ]);
        assert!(result.is_err());
    }

    #[test]
    fn test_inspect_target() {
        let cli = Cli::try_parse_from(["parceljoin", "inspect", "parcels", "parcels.geojson"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Inspect(InspectArgs { target: InspectTarget::Parcels { .. } })
        ));
    }
}
