use serde::{Deserialize, Serialize};

use super::geometry::{BoundingBox, Coord, Ring};
use super::report::StageReport;

/// Height information as found in the source, before normalization
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum RawHeight {
    /// A direct height in meters (from a height tag)
    Measured(f64),

    /// Roof and ground elevations; either may be absent
    Elevations { roof: Option<f64>, ground: Option<f64> },

    /// No usable height in the source
    Missing,
}

/// A building outline as parsed from a map extract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawFootprint {
    /// Identifier in the source document (way id, struct id, ...)
    pub source_id: String,

    /// Outline in `[lon, lat]`, at least three distinct vertices
    pub ring: Ring,

    /// Raw height
    pub height: RawHeight,

    /// Lifecycle stage, when the source has one
    pub stage: Option<String>,
}

impl RawFootprint {
    pub fn new(source_id: impl Into<String>, ring: Ring) -> Self {
        Self { source_id: source_id.into(), ring, height: RawHeight::Missing, stage: None }
    }

    pub fn with_height(mut self, height: RawHeight) -> Self {
        self.height = height;
        self
    }

    pub fn with_stage(mut self, stage: Option<String>) -> Self {
        self.stage = stage;
        self
    }

    pub fn first_vertex(&self) -> Option<Coord> {
        self.ring.first().copied()
    }

    pub fn bbox(&self) -> Option<BoundingBox> {
        BoundingBox::from_coords(&self.ring)
    }
}

/// Footprints read from one source document
#[derive(Debug, Clone)]
pub struct FootprintDataset {
    /// Dataset name (file stem)
    pub name: String,

    /// Reader that produced it (e.g. "OSM XML")
    pub format_name: String,

    /// Footprints in document order
    pub footprints: Vec<RawFootprint>,

    /// Parse counters
    pub report: StageReport,
}

impl FootprintDataset {
    /// Extent of every footprint vertex, used as the parcel prefilter region
    pub fn extent(&self) -> Option<BoundingBox> {
        BoundingBox::from_coords(self.footprints.iter().flat_map(|f| f.ring.iter()))
    }

    pub fn len(&self) -> usize {
        self.footprints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.footprints.is_empty()
    }
}
