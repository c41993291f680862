//! Conversions between parceljoin rings and `geo` crate types.

use geo::algorithm::centroid::Centroid;
use geo::{LineString, Point, Polygon};

pub use parceljoin_core::models::{Coord, Parcel, RawFootprint, Ring};

/// Convert a ring of `[lon, lat]` vertices to a geo::LineString
pub fn to_line_string(ring: &[Coord]) -> LineString<f64> {
    LineString::new(ring.iter().map(|c| geo::Coord { x: c[0], y: c[1] }).collect())
}

/// Convert a single outer ring to a geo::Polygon without holes
pub fn to_polygon(ring: &[Coord]) -> Polygon<f64> {
    Polygon::new(to_line_string(ring), vec![])
}

pub fn to_coord(point: Point<f64>) -> Coord {
    [point.x(), point.y()]
}

/// Extension trait for footprints with geo-crate operations
pub trait FootprintExt {
    /// Convert the outline to a geo::Polygon
    fn to_geo(&self) -> Polygon<f64>;

    /// Planar centroid of the outline; `None` for an outline with no area
    fn centroid_coords(&self) -> Option<Coord>;
}

impl FootprintExt for RawFootprint {
    fn to_geo(&self) -> Polygon<f64> {
        to_polygon(&self.ring)
    }

    fn centroid_coords(&self) -> Option<Coord> {
        let centroid = self.to_geo().centroid().map(to_coord)?;
        (centroid[0].is_finite() && centroid[1].is_finite()).then_some(centroid)
    }
}
