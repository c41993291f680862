//! Overpass API JSON reader (`.json`)

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::Value;
use std::collections::HashMap;
use std::path::Path;

use super::osm::{OsmExtract, OsmWay};
use super::properties::coerce_f64;
use crate::error::{ParceljoinError, Result};
use crate::formats::{dataset_name, read_input, FootprintReader};
use crate::models::FootprintDataset;

const FORMAT_NAME: &str = "Overpass JSON";

#[derive(Debug, Deserialize)]
struct OverpassDocument {
    elements: Vec<OverpassElement>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum OverpassElement {
    /// Coordinates are decoded leniently: some exporters write them as strings
    Node {
        id: i64,
        lat: Option<Value>,
        lon: Option<Value>,
    },
    Way {
        id: i64,
        #[serde(default)]
        nodes: Vec<i64>,
        #[serde(default)]
        tags: HashMap<String, String>,
    },
    #[serde(other)]
    Other,
}

/// Overpass API JSON reader
pub struct OverpassJsonReader;

#[async_trait]
impl FootprintReader for OverpassJsonReader {
    async fn read(&self, path: &Path) -> Result<FootprintDataset> {
        let content = read_input(path).await?;
        let extract = parse_overpass_json(&content)?;
        let (footprints, report) = extract.into_footprints();

        tracing::info!(
            path = %path.display(),
            footprints = footprints.len(),
            skipped = report.skipped_total(),
            "Parsed Overpass JSON extract"
        );

        Ok(FootprintDataset {
            name: dataset_name(path),
            format_name: FORMAT_NAME.to_string(),
            footprints,
            report,
        })
    }

    fn supported_extensions(&self) -> &[&str] {
        &["json"]
    }

    fn format_name(&self) -> &str {
        FORMAT_NAME
    }
}

/// Decode an Overpass JSON document into points and ways
pub fn parse_overpass_json(content: &str) -> Result<OsmExtract> {
    let document: OverpassDocument = serde_json::from_str(content)
        .map_err(|e| ParceljoinError::invalid(FORMAT_NAME, e.to_string()))?;

    let mut extract = OsmExtract::default();
    for element in document.elements {
        match element {
            OverpassElement::Node { id, lat, lon } => {
                match (coerce_f64(lat.as_ref()), coerce_f64(lon.as_ref())) {
                    (Some(lat), Some(lon)) => {
                        extract.points.insert(id.to_string(), [lon, lat]);
                    }
                    _ => extract.invalid_points += 1,
                }
            }
            OverpassElement::Way { id, nodes, tags } => extract.ways.push(OsmWay {
                id: id.to_string(),
                refs: nodes.iter().map(|n| n.to_string()).collect(),
                tags,
            }),
            OverpassElement::Other => {}
        }
    }

    Ok(extract)
}
