use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use super::parcel::ParcelAttributes;
use crate::error::{ParceljoinError, Result};

/// A render-ready building with its parcel attributes.
///
/// This is the persisted record. Field order is the output order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichedBuilding {
    /// Position in the output collection
    pub id: u64,

    /// Outline in the shared local frame, `[x, z]` meters
    pub footprint: Vec<[f64; 2]>,

    /// Height in meters, always > 0
    pub height: f64,

    /// Lifecycle stage
    pub stage: Option<String>,

    /// Matched parcel attributes, all null when unmatched
    #[serde(flatten)]
    pub attributes: ParcelAttributes,

    /// Identifier in the footprint source
    pub source_id: Option<String>,

    /// Matched parcel id for buildings enriched in this run; not persisted
    #[serde(skip)]
    pub parcel_id: Option<usize>,
}

impl EnrichedBuilding {
    /// Whether the building was joined to a parcel.
    ///
    /// Records loaded from disk carry no parcel id, so for them this falls
    /// back to whether any parcel attribute is present.
    pub fn is_matched(&self) -> bool {
        self.parcel_id.is_some() || self.attributes != ParcelAttributes::default()
    }
}

/// The finished, immutable building collection.
///
/// Built once by the pipeline (or loaded from disk) and handed to consumers
/// by value or reference.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BuildingDataset {
    buildings: Vec<EnrichedBuilding>,
}

impl BuildingDataset {
    pub fn new(buildings: Vec<EnrichedBuilding>) -> Self {
        Self { buildings }
    }

    pub fn buildings(&self) -> &[EnrichedBuilding] {
        &self.buildings
    }

    pub fn iter(&self) -> impl Iterator<Item = &EnrichedBuilding> {
        self.buildings.iter()
    }

    pub fn get(&self, id: u64) -> Option<&EnrichedBuilding> {
        usize::try_from(id).ok().and_then(|idx| self.buildings.get(idx)).filter(|b| b.id == id)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }

    pub fn into_inner(self) -> Vec<EnrichedBuilding> {
        self.buildings
    }

    /// Serialize to the compact JSON array written to disk
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        Ok(serde_json::to_vec(&self.buildings)?)
    }

    /// Write the collection as a JSON array
    pub fn write_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let file = fs::File::create(path)?;
        let mut writer = BufWriter::new(file);
        serde_json::to_writer(&mut writer, &self.buildings)?;
        writer.flush()?;
        Ok(())
    }

    /// Load a previously written collection
    pub fn load(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ParceljoinError::InputNotFound { path: path.to_path_buf() });
        }
        let file = fs::File::open(path)?;
        let buildings: Vec<EnrichedBuilding> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| ParceljoinError::invalid("building dataset", e.to_string()))?;
        Ok(Self { buildings })
    }
}
