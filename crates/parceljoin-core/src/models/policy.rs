use serde::{Deserialize, Serialize};
use std::fmt;

/// What happens to a building that sits on no parcel
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum UnmatchedPolicy {
    /// Keep the building; every parcel attribute is null
    #[default]
    Keep,
    /// Remove the building from the output
    Drop,
}

impl fmt::Display for UnmatchedPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnmatchedPolicy::Keep => f.write_str("keep"),
            UnmatchedPolicy::Drop => f.write_str("drop"),
        }
    }
}

/// Which point of a footprint is tested against parcels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RepresentativePoint {
    /// First vertex of the outline
    #[default]
    FirstVertex,
    /// Planar centroid of the outline
    Centroid,
}

impl fmt::Display for RepresentativePoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepresentativePoint::FirstVertex => f.write_str("first_vertex"),
            RepresentativePoint::Centroid => f.write_str("centroid"),
        }
    }
}
