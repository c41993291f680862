//! Enrichment merger.
//!
//! Joins each footprint with its match result into the persisted record:
//! projected outline, resolved height, and the parcel's attribute set (all
//! null when unmatched).

use parceljoin_core::models::{
    EnrichedBuilding, Fallback, ParcelAttributes, RawFootprint, StageReport, UnmatchedPolicy,
};
use parceljoin_geo::spatial::MatchResult;
use parceljoin_geo::transform::{HeightPolicy, LocalFrame};

/// Merges footprints and match results into enriched buildings
#[derive(Debug, Clone, Copy)]
pub struct Enricher {
    frame: LocalFrame,
    height: HeightPolicy,
    unmatched: UnmatchedPolicy,
}

impl Enricher {
    pub fn new(frame: LocalFrame, height: HeightPolicy, unmatched: UnmatchedPolicy) -> Self {
        Self { frame, height, unmatched }
    }

    /// Enrich one building; `None` when the unmatched policy drops it
    pub fn enrich_one(
        &self,
        id: u64,
        footprint: &RawFootprint,
        result: &MatchResult<'_>,
        report: &mut StageReport,
    ) -> Option<EnrichedBuilding> {
        let attributes = match result.parcel {
            Some(parcel) => parcel.attributes.clone(),
            None => match self.unmatched {
                UnmatchedPolicy::Drop => {
                    report.record_filtered();
                    return None;
                }
                UnmatchedPolicy::Keep => {
                    report.record_fallback(Fallback::UnmatchedKept);
                    ParcelAttributes::default()
                }
            },
        };

        let (height, source) = self.height.resolve(&footprint.height);
        if let Some(fallback) = source.fallback() {
            report.record_fallback(fallback);
        }

        report.record_kept();
        Some(EnrichedBuilding {
            id,
            footprint: self.frame.project_ring(&footprint.ring),
            height,
            stage: footprint.stage.clone(),
            attributes,
            source_id: Some(footprint.source_id.clone()),
            parcel_id: result.parcel.map(|parcel| parcel.id),
        })
    }

    /// Enrich a batch in footprint order.
    ///
    /// Ids are the positions in the returned collection, so they stay dense
    /// when unmatched buildings are dropped.
    pub fn enrich_all(
        &self,
        footprints: &[RawFootprint],
        results: &[MatchResult<'_>],
    ) -> (Vec<EnrichedBuilding>, StageReport) {
        let mut report = StageReport::new();
        let mut buildings = Vec::with_capacity(footprints.len());

        for (footprint, result) in footprints.iter().zip(results) {
            let id = buildings.len() as u64;
            if let Some(building) = self.enrich_one(id, footprint, result, &mut report) {
                buildings.push(building);
            }
        }

        (buildings, report)
    }
}
