//! Local planar frame and height normalization.
//!
//! The frame is a fixed linear scale around one origin per run, which is
//! only accurate at city-block extents.

use parceljoin_core::models::{Coord, Fallback, RawFootprint, RawHeight};

/// Shared planar frame: `x` east and `z` north of the origin
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LocalFrame {
    origin: Coord,
    scale: f64,
}

impl LocalFrame {
    pub fn new(origin: Coord, scale: f64) -> Self {
        Self { origin, scale }
    }

    /// Frame whose origin is the first vertex of the first footprint
    pub fn from_first_vertex(footprints: &[RawFootprint], scale: f64) -> Option<Self> {
        let origin = footprints.first()?.first_vertex()?;
        Some(Self::new(origin, scale))
    }

    pub fn origin(&self) -> Coord {
        self.origin
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    /// Project one `[lon, lat]` vertex to `[x, z]`
    pub fn project(&self, coord: Coord) -> [f64; 2] {
        [
            (coord[0] - self.origin[0]) * self.scale,
            (coord[1] - self.origin[1]) * self.scale,
        ]
    }

    pub fn project_ring(&self, ring: &[Coord]) -> Vec<[f64; 2]> {
        ring.iter().map(|c| self.project(*c)).collect()
    }
}

/// How a building's height was obtained
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HeightSource {
    /// A usable height tag
    Measured,
    /// Roof minus ground elevation
    Elevations,
    /// Roof minus ground elevation, raised to the minimum
    Clamped,
    /// No usable height
    Fallback,
}

impl HeightSource {
    /// Report counter for this source, if it is a fallback
    pub fn fallback(&self) -> Option<Fallback> {
        match self {
            HeightSource::Measured | HeightSource::Elevations => None,
            HeightSource::Clamped => Some(Fallback::ClampedHeight),
            HeightSource::Fallback => Some(Fallback::DefaultHeight),
        }
    }
}

/// Fallback and minimum heights, in meters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HeightPolicy {
    pub fallback: f64,
    pub min: f64,
}

impl HeightPolicy {
    pub fn new(fallback: f64, min: f64) -> Self {
        Self { fallback, min }
    }

    /// Resolve a raw height to meters, rounded to centimeters.
    ///
    /// A measurement or elevation span that is not finite once rounded
    /// resolves to the fallback.
    pub fn resolve(&self, raw: &RawHeight) -> (f64, HeightSource) {
        let (meters, source) = match *raw {
            RawHeight::Elevations { roof: Some(roof), ground: Some(ground) } => {
                match centimeters(roof - ground) {
                    Some(span) if span >= self.min => (span, HeightSource::Elevations),
                    Some(_) => (self.min, HeightSource::Clamped),
                    None => (self.fallback, HeightSource::Fallback),
                }
            }
            RawHeight::Measured(h) => match centimeters(h) {
                Some(h) if h > 0.0 => (h, HeightSource::Measured),
                _ => (self.fallback, HeightSource::Fallback),
            },
            _ => (self.fallback, HeightSource::Fallback),
        };

        (round_centimeters(meters), source)
    }
}

fn round_centimeters(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

fn centimeters(value: f64) -> Option<f64> {
    Some(round_centimeters(value)).filter(|rounded| rounded.is_finite())
}
