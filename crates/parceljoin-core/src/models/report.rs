//! Per-stage audit counters.
//!
//! Every record a stage sees ends up in exactly one of `kept`, `filtered` or
//! `skipped`. Fallbacks are orthogonal: a kept record may also have used one.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Why a single record was dropped
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Fewer than three distinct vertices after resolution
    TooFewVertices,
    /// A vertex has a NaN or infinite component
    NonFiniteCoordinate,
    /// Geometry type other than Polygon/MultiPolygon
    UnsupportedGeometry,
    /// Geometry missing or with an empty coordinate list
    MissingGeometry,
    /// A map point whose lat/lon could not be parsed
    InvalidPointCoordinates,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::TooFewVertices => "too_few_vertices",
            SkipReason::NonFiniteCoordinate => "non_finite_coordinate",
            SkipReason::UnsupportedGeometry => "unsupported_geometry",
            SkipReason::MissingGeometry => "missing_geometry",
            SkipReason::InvalidPointCoordinates => "invalid_point_coordinates",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A documented default that replaced missing or unusable input
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Fallback {
    /// Way referenced a point id that is not in the extract
    MissingPointRef,
    /// Height tag present but not a number with a known unit
    UnparsableHeightTag,
    /// Fixed fallback height used during normalization
    DefaultHeight,
    /// Measured or derived height raised to the minimum
    ClampedHeight,
    /// Parcel carried no usable assessed value
    MissingAssessedValue,
    /// Parcel ring dropped for degenerate geometry, parcel kept
    DegenerateRing,
    /// Building without a parcel kept with null attributes
    UnmatchedKept,
}

impl Fallback {
    pub fn as_str(&self) -> &'static str {
        match self {
            Fallback::MissingPointRef => "missing_point_ref",
            Fallback::UnparsableHeightTag => "unparsable_height_tag",
            Fallback::DefaultHeight => "default_height",
            Fallback::ClampedHeight => "clamped_height",
            Fallback::MissingAssessedValue => "missing_assessed_value",
            Fallback::DegenerateRing => "degenerate_ring",
            Fallback::UnmatchedKept => "unmatched_kept",
        }
    }
}

impl fmt::Display for Fallback {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Counters for one pipeline stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StageReport {
    /// Records that survived the stage
    pub kept: usize,

    /// Records removed on purpose (prefilter, drop policy)
    pub filtered: usize,

    /// Records dropped for bad input, by reason
    pub skipped: BTreeMap<SkipReason, usize>,

    /// Documented defaults applied, by kind
    pub fallbacks: BTreeMap<Fallback, usize>,
}

impl StageReport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_kept(&mut self) {
        self.kept += 1;
    }

    pub fn record_filtered(&mut self) {
        self.filtered += 1;
    }

    pub fn record_skip(&mut self, reason: SkipReason) {
        *self.skipped.entry(reason).or_insert(0) += 1;
    }

    pub fn record_fallback(&mut self, fallback: Fallback) {
        self.record_fallbacks(fallback, 1);
    }

    pub fn record_fallbacks(&mut self, fallback: Fallback, count: usize) {
        if count > 0 {
            *self.fallbacks.entry(fallback).or_insert(0) += count;
        }
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, reason: SkipReason) -> usize {
        self.skipped.get(&reason).copied().unwrap_or(0)
    }

    pub fn fallbacks_for(&self, fallback: Fallback) -> usize {
        self.fallbacks.get(&fallback).copied().unwrap_or(0)
    }

    /// Total records seen by the stage
    pub fn seen(&self) -> usize {
        self.kept + self.filtered + self.skipped_total()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters_add_up() {
        let mut report = StageReport::new();
        report.record_kept();
        report.record_kept();
        report.record_filtered();
        report.record_skip(SkipReason::TooFewVertices);
        report.record_skip(SkipReason::TooFewVertices);
        report.record_skip(SkipReason::MissingGeometry);
        report.record_fallback(Fallback::DefaultHeight);

        assert_eq!(report.seen(), 6);
        assert_eq!(report.skipped_for(SkipReason::TooFewVertices), 2);
        assert_eq!(report.skipped_for(SkipReason::UnsupportedGeometry), 0);
        assert_eq!(report.fallbacks_for(Fallback::DefaultHeight), 1);
    }

    #[test]
    fn test_zero_fallbacks_leave_no_entry() {
        let mut report = StageReport::new();
        report.record_fallbacks(Fallback::MissingPointRef, 0);
        assert!(report.fallbacks.is_empty());
    }

    #[test]
    fn test_report_serializes_reason_keys() {
        let mut report = StageReport::new();
        report.record_skip(SkipReason::UnsupportedGeometry);
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["skipped"]["unsupported_geometry"], 1);
    }
}
