//! Building to parcel matching.
//!
//! Every building is reduced to one representative point, pruned against
//! parcel bounding boxes, then tested exactly with even-odd ray casting. When
//! several parcels contain the point the one with the greatest assessed value
//! wins, and the scan order breaks remaining ties.

use crate::models::FootprintExt;
use parceljoin_core::models::{Coord, Parcel, RawFootprint, RepresentativePoint};
use rayon::prelude::*;
use serde::Serialize;

/// Even-odd ray cast toward +x.
///
/// An edge counts when exactly one endpoint lies strictly above `point`'s y
/// and the crossing lies strictly right of `point`'s x. Horizontal edges never
/// count and a ray through a shared vertex counts once. Closed and unclosed
/// rings give the same answer.
pub fn point_in_ring(point: Coord, ring: &[Coord]) -> bool {
    let [x, y] = point;
    let mut inside = false;
    let mut j = match ring.len() {
        0 => return false,
        n => n - 1,
    };

    for i in 0..ring.len() {
        let [xi, yi] = ring[i];
        let [xj, yj] = ring[j];
        if (yi > y) != (yj > y) {
            let x_cross = (xj - xi) * (y - yi) / (yj - yi) + xi;
            if x < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

/// Whether any of the parcel's rings contains the point
pub fn parcel_contains(parcel: &Parcel, point: Coord) -> bool {
    parcel.bbox.contains_point(point) && parcel.rings.iter().any(|ring| point_in_ring(point, ring))
}

/// The point of a footprint that is tested against parcels
pub fn representative_point(footprint: &RawFootprint, mode: RepresentativePoint) -> Option<Coord> {
    match mode {
        RepresentativePoint::FirstVertex => footprint.first_vertex(),
        RepresentativePoint::Centroid => {
            footprint.centroid_coords().or_else(|| footprint.first_vertex())
        }
    }
}

/// Outcome of matching one building
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchResult<'a> {
    /// Winning parcel, if any contained the point
    pub parcel: Option<&'a Parcel>,

    /// Parcels whose rings contained the point
    pub candidates: usize,
}

impl<'a> MatchResult<'a> {
    pub fn unmatched() -> Self {
        Self { parcel: None, candidates: 0 }
    }

    pub fn is_matched(&self) -> bool {
        self.parcel.is_some()
    }

    /// More than one parcel contained the point
    pub fn is_tie(&self) -> bool {
        self.candidates > 1
    }
}

/// Match a point against parcels in order.
///
/// Candidates replace the current best only on a strictly greater assessed
/// value, so among equals the earliest parcel wins.
pub fn match_point(point: Coord, parcels: &[Parcel]) -> MatchResult<'_> {
    let mut best: Option<&Parcel> = None;
    let mut candidates = 0;

    for parcel in parcels.iter().filter(|p| parcel_contains(p, point)) {
        candidates += 1;
        best = match best {
            Some(current) if parcel.ranking_value() > current.ranking_value() => Some(parcel),
            Some(current) => Some(current),
            None => Some(parcel),
        };
    }

    MatchResult { parcel: best, candidates }
}

/// Best parcel for a point, if any
pub fn find_parcel(point: Coord, parcels: &[Parcel]) -> Option<&Parcel> {
    match_point(point, parcels).parcel
}

/// Matches buildings against a shared, read-only parcel slice
#[derive(Debug, Clone, Copy)]
pub struct ParcelMatcher<'a> {
    parcels: &'a [Parcel],
    representative: RepresentativePoint,
}

impl<'a> ParcelMatcher<'a> {
    pub fn new(parcels: &'a [Parcel], representative: RepresentativePoint) -> Self {
        Self { parcels, representative }
    }

    pub fn parcels(&self) -> &'a [Parcel] {
        self.parcels
    }

    pub fn match_building(&self, footprint: &RawFootprint) -> MatchResult<'a> {
        match representative_point(footprint, self.representative) {
            Some(point) => match_point(point, self.parcels),
            None => MatchResult::unmatched(),
        }
    }

    /// Match every footprint on the current rayon pool.
    ///
    /// Results are in footprint order regardless of the number of workers.
    pub fn match_all(&self, footprints: &[RawFootprint]) -> Vec<MatchResult<'a>> {
        let results: Vec<MatchResult<'a>> =
            footprints.par_iter().map(|footprint| self.match_building(footprint)).collect();

        let summary = MatchSummary::from_results(&results);
        tracing::info!(
            buildings = footprints.len(),
            parcels = self.parcels.len(),
            matched = summary.matched,
            unmatched = summary.unmatched,
            ties = summary.ties,
            "Matched buildings to parcels"
        );

        results
    }
}

/// Counters over a batch of match results
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct MatchSummary {
    pub matched: usize,
    pub unmatched: usize,
    /// Matches decided by the tie-break
    pub ties: usize,
}

impl MatchSummary {
    pub fn from_results(results: &[MatchResult<'_>]) -> Self {
        results.iter().fold(Self::default(), |mut summary, result| {
            if result.is_matched() {
                summary.matched += 1;
            } else {
                summary.unmatched += 1;
            }
            if result.is_tie() {
                summary.ties += 1;
            }
            summary
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use parceljoin_core::models::ParcelAttributes;
    use proptest::prelude::*;

    fn square(min: f64, max: f64) -> Vec<Coord> {
        vec![[min, min], [max, min], [max, max], [min, max], [min, min]]
    }

    fn parcel(id: usize, rings: Vec<Vec<Coord>>, value: Option<f64>) -> Parcel {
        let attributes = ParcelAttributes { assessed_value: value, ..Default::default() };
        Parcel::new(id, rings, attributes).unwrap()
    }

    fn footprint_at(point: Coord) -> RawFootprint {
        let [x, y] = point;
        RawFootprint::new("b", vec![[x, y], [x + 0.1, y], [x + 0.1, y + 0.1], [x, y]])
    }

    /// L-shaped outline with only axis-aligned edges
    fn l_shape() -> Vec<Coord> {
        vec![[0.0, 0.0], [6.0, 0.0], [6.0, 2.0], [2.0, 2.0], [2.0, 6.0], [0.0, 6.0], [0.0, 0.0]]
    }

    #[test]
    fn test_point_in_square() {
        let ring = square(0.0, 10.0);
        assert!(point_in_ring([5.0, 5.0], &ring));
        assert!(!point_in_ring([15.0, 5.0], &ring));
        assert!(!point_in_ring([5.0, -0.5], &ring));
    }

    #[test]
    fn test_point_in_concave_ring() {
        let ring = l_shape();
        assert!(point_in_ring([1.0, 5.0], &ring));
        assert!(point_in_ring([5.0, 1.0], &ring));
        assert!(!point_in_ring([4.0, 4.0], &ring));
    }

    #[test]
    fn test_ray_through_vertex_counts_once() {
        // Ray from (0, 1) passes exactly through the apex (2, 1)
        let diamond = vec![[1.0, 0.0], [2.0, 1.0], [1.0, 2.0], [0.5, 1.0]];
        assert!(point_in_ring([1.0, 1.0], &diamond));
        assert!(!point_in_ring([0.0, 1.0], &diamond));
    }

    #[test]
    fn test_empty_ring() {
        assert!(!point_in_ring([0.0, 0.0], &[]));
    }

    #[test]
    fn test_overlapping_parcels_pick_highest_value() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], Some(100_000.0)),
            parcel(1, vec![square(1.0, 3.0)], Some(250_000.0)),
        ];

        let result = match_point([1.5, 1.5], &parcels);

        assert_eq!(result.parcel.map(|p| p.id), Some(1));
        assert_eq!(result.candidates, 2);
        assert!(result.is_tie());
    }

    #[test]
    fn test_point_outside_every_bbox() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], Some(100_000.0)),
            parcel(1, vec![square(1.0, 3.0)], Some(250_000.0)),
        ];

        let result = match_point([10.0, 10.0], &parcels);

        assert!(result.parcel.is_none());
        assert_eq!(result.candidates, 0);
    }

    #[test]
    fn test_equal_values_keep_first_parcel() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], Some(500.0)),
            parcel(1, vec![square(0.0, 2.0)], Some(500.0)),
        ];

        assert_eq!(find_parcel([1.0, 1.0], &parcels).map(|p| p.id), Some(0));
    }

    #[test]
    fn test_null_value_loses_to_positive() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], None),
            parcel(1, vec![square(0.0, 2.0)], Some(1.0)),
        ];

        assert_eq!(find_parcel([1.0, 1.0], &parcels).map(|p| p.id), Some(1));
    }

    #[test]
    fn test_null_values_tie_to_first() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], None),
            parcel(1, vec![square(0.0, 2.0)], Some(0.0)),
        ];

        assert_eq!(find_parcel([1.0, 1.0], &parcels).map(|p| p.id), Some(0));
    }

    #[test]
    fn test_bbox_corner_passes_prune() {
        let p = parcel(0, vec![square(0.0, 2.0)], None);
        assert!(p.bbox.contains_point([0.0, 0.0]));
        assert!(p.bbox.contains_point([2.0, 2.0]));
        assert!(!p.bbox.contains_point([2.0 + 1e-9, 2.0]));
    }

    #[test]
    fn test_multipolygon_parcel_matches_either_ring() {
        let parcels = vec![parcel(0, vec![square(0.0, 1.0), square(5.0, 6.0)], Some(10.0))];
        let matcher = ParcelMatcher::new(&parcels, RepresentativePoint::FirstVertex);

        assert!(matcher.match_building(&footprint_at([0.5, 0.5])).is_matched());
        assert!(matcher.match_building(&footprint_at([5.5, 5.5])).is_matched());
        // Inside the combined bbox but between the rings
        assert!(!matcher.match_building(&footprint_at([3.0, 3.0])).is_matched());
    }

    #[test]
    fn test_centroid_representative_point() {
        // First vertex sits outside the parcel, centroid sits inside
        let parcels = vec![parcel(0, vec![square(1.0, 3.0)], Some(10.0))];
        let footprint =
            RawFootprint::new("b", vec![[0.5, 0.5], [3.5, 0.5], [3.5, 3.5], [0.5, 3.5], [0.5, 0.5]]);

        let first = ParcelMatcher::new(&parcels, RepresentativePoint::FirstVertex);
        let centroid = ParcelMatcher::new(&parcels, RepresentativePoint::Centroid);

        assert!(!first.match_building(&footprint).is_matched());
        assert!(centroid.match_building(&footprint).is_matched());
    }

    #[test]
    fn test_match_all_preserves_order() {
        let parcels = vec![
            parcel(0, vec![square(0.0, 2.0)], Some(1.0)),
            parcel(1, vec![square(10.0, 12.0)], Some(2.0)),
        ];
        let footprints: Vec<RawFootprint> = (0..200)
            .map(|i| match i % 3 {
                0 => footprint_at([1.0, 1.0]),
                1 => footprint_at([11.0, 11.0]),
                _ => footprint_at([50.0, 50.0]),
            })
            .collect();

        let matcher = ParcelMatcher::new(&parcels, RepresentativePoint::FirstVertex);
        let results = matcher.match_all(&footprints);

        assert_eq!(results.len(), 200);
        for (i, result) in results.iter().enumerate() {
            let expected = match i % 3 {
                0 => Some(0),
                1 => Some(1),
                _ => None,
            };
            assert_eq!(result.parcel.map(|p| p.id), expected);
        }

        let summary = MatchSummary::from_results(&results);
        assert_eq!(summary.matched, 134);
        assert_eq!(summary.unmatched, 66);
        assert_eq!(summary.ties, 0);
    }

    proptest! {
        #[test]
        fn prop_winding_direction_is_irrelevant(
            qx in -4i32..28, qy in -4i32..28, shift in 0usize..6
        ) {
            let point = [qx as f64 * 0.25, qy as f64 * 0.25];
            let ring = l_shape();

            let mut reversed = ring.clone();
            reversed.reverse();

            let mut open: Vec<Coord> = ring[..ring.len() - 1].to_vec();
            open.rotate_left(shift);

            let expected = point_in_ring(point, &ring);
            prop_assert_eq!(point_in_ring(point, &reversed), expected);
            prop_assert_eq!(point_in_ring(point, &open), expected);
        }

        #[test]
        fn prop_strict_interior_of_rectangle(
            x0 in -100i32..100, y0 in -100i32..100,
            w in 1i32..50, h in 1i32..50,
            px in -200i32..200, py in -200i32..200
        ) {
            let (x0, y0, x1, y1) = (x0 as f64, y0 as f64, (x0 + w) as f64, (y0 + h) as f64);
            let ring = vec![[x0, y0], [x1, y0], [x1, y1], [x0, y1]];
            // Half-integer points never land on an edge
            let point = [px as f64 + 0.5, py as f64 + 0.5];

            let strictly_inside = point[0] > x0 && point[0] < x1 && point[1] > y0 && point[1] < y1;
            prop_assert_eq!(point_in_ring(point, &ring), strictly_inside);
        }
    }
}
