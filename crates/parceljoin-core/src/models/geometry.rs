//! Canonical geometry primitives shared by every parceljoin crate.
//!
//! Coordinates are plain `[lon, lat]` pairs, matching the GeoJSON position
//! layout, so readers can move data in without conversion.

use serde::{Deserialize, Serialize};

use super::report::SkipReason;

/// A `[longitude, latitude]` position
pub type Coord = [f64; 2];

/// An ordered ring of positions; closure is implicit
pub type Ring = Vec<Coord>;

/// Minimum number of distinct vertices for a usable ring
pub const MIN_RING_VERTICES: usize = 3;

/// Count the distinct vertices of a ring.
///
/// Consecutive repeats and an explicit closing vertex (last == first) are
/// not counted twice.
pub fn distinct_vertex_count(ring: &[Coord]) -> usize {
    let mut distinct: Vec<Coord> = Vec::with_capacity(ring.len());
    for coord in ring {
        if distinct.last() != Some(coord) {
            distinct.push(*coord);
        }
    }
    if distinct.len() > 1 && distinct.first() == distinct.last() {
        distinct.pop();
    }
    distinct.len()
}

/// Check that a ring can take part in matching and rendering
pub fn validate_ring(ring: &[Coord]) -> Result<(), SkipReason> {
    if ring.iter().any(|c| !c[0].is_finite() || !c[1].is_finite()) {
        return Err(SkipReason::NonFiniteCoordinate);
    }
    if distinct_vertex_count(ring) < MIN_RING_VERTICES {
        return Err(SkipReason::TooFewVertices);
    }
    Ok(())
}

/// Axis-aligned bounding box in lon/lat degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl BoundingBox {
    pub fn new(min_lon: f64, min_lat: f64, max_lon: f64, max_lat: f64) -> Self {
        Self { min_lon, min_lat, max_lon, max_lat }
    }

    /// Bounding box of a set of positions, `None` when empty
    pub fn from_coords<'a>(coords: impl IntoIterator<Item = &'a Coord>) -> Option<Self> {
        let mut iter = coords.into_iter();
        let first = iter.next()?;
        let mut bbox = Self::new(first[0], first[1], first[0], first[1]);
        for c in iter {
            bbox.min_lon = bbox.min_lon.min(c[0]);
            bbox.min_lat = bbox.min_lat.min(c[1]);
            bbox.max_lon = bbox.max_lon.max(c[0]);
            bbox.max_lat = bbox.max_lat.max(c[1]);
        }
        Some(bbox)
    }

    /// Bounding box over several rings
    pub fn from_rings(rings: &[Ring]) -> Option<Self> {
        Self::from_coords(rings.iter().flatten())
    }

    /// Point containment, inclusive on all four edges
    pub fn contains_point(&self, point: Coord) -> bool {
        self.min_lon <= point[0]
            && point[0] <= self.max_lon
            && self.min_lat <= point[1]
            && point[1] <= self.max_lat
    }

    /// Two boxes intersect if they overlap in both dimensions; touching edges count
    pub fn intersects(&self, other: &BoundingBox) -> bool {
        let lon_overlap = self.min_lon <= other.max_lon && self.max_lon >= other.min_lon;
        let lat_overlap = self.min_lat <= other.max_lat && self.max_lat >= other.min_lat;

        lon_overlap && lat_overlap
    }

    /// Smallest box covering both
    pub fn union(&self, other: &BoundingBox) -> BoundingBox {
        BoundingBox {
            min_lon: self.min_lon.min(other.min_lon),
            min_lat: self.min_lat.min(other.min_lat),
            max_lon: self.max_lon.max(other.max_lon),
            max_lat: self.max_lat.max(other.max_lat),
        }
    }
}
