use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Ring};
use super::report::StageReport;

/// Assessment attributes carried by a parcel and copied onto buildings.
///
/// Field names are the output names. Every field is optional and serializes
/// as `null` when absent, so the enriched schema is uniform.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ParcelAttributes {
    pub assessed_value: Option<f64>,
    pub address: Option<String>,
    pub community: Option<String>,
    pub land_use_designation: Option<String>,
    pub property_type: Option<String>,
    pub sub_property_use: Option<String>,
    pub land_size_sm: Option<f64>,
    pub land_size_ac: Option<f64>,
    pub roll_number: Option<String>,
    pub assessment_class: Option<String>,
    pub assessment_class_description: Option<String>,
}

/// A cadastral parcel with one or more outer rings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    /// Position in the normalized parcel sequence
    pub id: usize,

    /// Outer rings; a MultiPolygon parcel owns several
    pub rings: Vec<Ring>,

    /// Extent over all rings
    pub bbox: BoundingBox,

    /// Assessment attributes
    pub attributes: ParcelAttributes,
}

impl Parcel {
    /// Build a parcel, computing its bounding box. `None` when there are no vertices.
    pub fn new(id: usize, rings: Vec<Ring>, attributes: ParcelAttributes) -> Option<Self> {
        let bbox = BoundingBox::from_rings(&rings)?;
        Some(Self { id, rings, bbox, attributes })
    }

    /// Assessed value for ranking; a missing value ranks as zero
    pub fn ranking_value(&self) -> f64 {
        self.attributes.assessed_value.unwrap_or(0.0)
    }
}

/// Normalized parcels from one feature collection
#[derive(Debug, Clone)]
pub struct ParcelDataset {
    /// Dataset name (file stem)
    pub name: String,

    /// Parcels in feature order, ids dense from 0
    pub parcels: Vec<Parcel>,

    /// Region the parcels were pruned against, if any
    pub reference: Option<BoundingBox>,

    /// Normalization counters
    pub report: StageReport,
}

impl ParcelDataset {
    pub fn len(&self) -> usize {
        self.parcels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.parcels.is_empty()
    }

    /// Extent of all parcels
    pub fn extent(&self) -> Option<BoundingBox> {
        self.parcels.iter().map(|p| p.bbox).reduce(|a, b| a.union(&b))
    }
}
