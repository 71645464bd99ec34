// ===========================================================================
// Intersection Splitting
// ===========================================================================
//
// Merging pulls pass-through chains into long lines; this stage cuts them
// back apart wherever they genuinely cross something else. Per merged line:
//
// 1. Ask the spatial index for candidates whose extent intersects ours,
//    then close the relation symmetrically - if A lists B, B checks A too.
// 2. Discard the line itself and every pair the dual graph already connects:
//    those meetings were consumed by the merge and must not cut.
// 3. For what remains, shared points are exact coincidences of quantized
//    vertices; each maps to its first vertex index in the line being split.
// 4. Index 0 and the last index are always cut points, so a line with no
//    true intersections passes through as one whole fragment.
//
// Fragments inherit the parent's attributes. Re-running the splitter over
// its own output with an empty candidate provider reproduces it unchanged.
// ===========================================================================

use crate::dual::DualGraph;
use crate::error::SimplifyError;
use crate::feature::{AttrBag, FeatId};
use crate::geometry::polyline_bbox;
use crate::merge::{MergedFeature, MergedId};
use crate::provider::SpatialIndex;
use crate::snap::{SnappedPoint, snap_point};
use ahash::{AHashMap, AHashSet};
use geo::Coord;

/// A fragment of a merged feature between two cut points.
#[derive(Debug, Clone, PartialEq)]
pub struct BrokenFeature {
    pub parent: MergedId,
    pub geometry: Vec<Coord>,
    pub attrs: AttrBag,
}

/// Pairs of merged features already connected through the dual graph. Their
/// shared points are junction endpoints, not crossings to cut at.
#[derive(Debug, Default)]
pub struct MergedAdjacency {
    pairs: AHashSet<(MergedId, MergedId)>,
}

fn ordered(a: MergedId, b: MergedId) -> (MergedId, MergedId) {
    if a <= b { (a, b) } else { (b, a) }
}

impl MergedAdjacency {
    /// Lift dual-graph adjacency between member features onto the merged
    /// features that own them.
    pub fn from_dual(dual: &DualGraph, merged: &[MergedFeature]) -> MergedAdjacency {
        let mut owner: AHashMap<FeatId, MergedId> = AHashMap::new();
        for m in merged {
            for &member in &m.members {
                owner.insert(member, m.id);
            }
        }
        let mut pairs = AHashSet::new();
        for (a, neighbors) in &dual.adjacency {
            for b in neighbors {
                if let (Some(&ma), Some(&mb)) = (owner.get(a), owner.get(b)) {
                    if ma != mb {
                        pairs.insert(ordered(ma, mb));
                    }
                }
            }
        }
        MergedAdjacency { pairs }
    }

    pub fn connected(&self, a: MergedId, b: MergedId) -> bool {
        self.pairs.contains(&ordered(a, b))
    }
}

/// Cut every merged feature at its true intersections.
pub fn split_merged(
    merged: &[MergedFeature],
    index: &impl SpatialIndex,
    adjacency: &MergedAdjacency,
    number_decimals: u32,
) -> Result<Vec<BrokenFeature>, SimplifyError> {
    // candidate sets from the index, then symmetric closure
    let mut candidates: AHashMap<MergedId, AHashSet<MergedId>> = AHashMap::new();
    for m in merged {
        let found = index.intersecting(polyline_bbox(&m.geometry));
        candidates.insert(m.id, found.into_iter().collect());
    }
    let reverse: Vec<(MergedId, MergedId)> = candidates
        .iter()
        .flat_map(|(&id, found)| found.iter().map(move |&other| (other, id)))
        .collect();
    for (other, id) in reverse {
        candidates.entry(other).or_default().insert(id);
    }

    // quantized vertices per feature, once
    let mut snapped: AHashMap<MergedId, Vec<SnappedPoint>> = AHashMap::new();
    for m in merged {
        let verts = m
            .geometry
            .iter()
            .map(|&c| snap_point(c, number_decimals))
            .collect::<Result<Vec<_>, _>>()?;
        snapped.insert(m.id, verts);
    }
    let vertex_sets: AHashMap<MergedId, AHashSet<SnappedPoint>> = snapped
        .iter()
        .map(|(&id, verts)| (id, verts.iter().copied().collect()))
        .collect();

    let mut broken: Vec<BrokenFeature> = Vec::new();
    for m in merged {
        let verts = &snapped[&m.id];
        let Some(last) = verts.len().checked_sub(1).filter(|&l| l > 0) else {
            return Err(SimplifyError::InternalInconsistency {
                detail: format!("merged feature {} has a degenerate geometry", m.id),
            });
        };

        // first occurrence per vertex value; closed rings revisit points
        let mut first_index: AHashMap<SnappedPoint, usize> = AHashMap::new();
        for (i, &p) in verts.iter().enumerate() {
            first_index.entry(p).or_insert(i);
        }

        let mut cut_indices: Vec<usize> = vec![0, last];
        if let Some(found) = candidates.get(&m.id) {
            for &other in found {
                if other == m.id || adjacency.connected(m.id, other) {
                    continue;
                }
                let Some(other_set) = vertex_sets.get(&other) else {
                    continue;
                };
                for (point, &i) in &first_index {
                    if other_set.contains(point) {
                        cut_indices.push(i);
                    }
                }
            }
        }
        cut_indices.sort_unstable();
        cut_indices.dedup();

        for pair in cut_indices.windows(2) {
            broken.push(BrokenFeature {
                parent: m.id,
                geometry: m.geometry[pair[0]..=pair[1]].to_vec(),
                attrs: m.attrs.clone(),
            });
        }
    }
    Ok(broken)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::BBox;
    use crate::provider::RTreeIndex;

    fn line(pts: &[(f64, f64)]) -> Vec<Coord> {
        pts.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn merged(id: MergedId, members: Vec<FeatId>, pts: &[(f64, f64)]) -> MergedFeature {
        MergedFeature {
            id,
            members,
            geometry: line(pts),
            attrs: AttrBag::new(),
        }
    }

    /// Index that reports nothing, for pass-through and idempotence tests.
    struct EmptyIndex;
    impl SpatialIndex for EmptyIndex {
        fn intersecting(&self, _bbox: BBox) -> Vec<MergedId> {
            Vec::new()
        }
    }

    #[test]
    fn feature_with_no_candidates_passes_through_whole() {
        let m = vec![merged(0, vec![1], &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])];
        let broken = split_merged(&m, &EmptyIndex, &MergedAdjacency::default(), 6).unwrap();
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].geometry, m[0].geometry);
    }

    #[test]
    fn crossing_vertex_cuts_the_line_in_two() {
        // 5-vertex line crossed at vertex index 2 by an unrelated line
        let m = vec![
            merged(
                0,
                vec![1],
                &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
            ),
            merged(1, vec![2], &[(2.0, -5.0), (2.0, 0.0), (2.0, 5.0)]),
        ];
        let index = RTreeIndex::build(&m);
        let broken = split_merged(&m, &index, &MergedAdjacency::default(), 6).unwrap();

        let of_first: Vec<&BrokenFeature> = broken.iter().filter(|b| b.parent == 0).collect();
        assert_eq!(of_first.len(), 2);
        assert_eq!(
            of_first[0].geometry,
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
        );
        assert_eq!(
            of_first[1].geometry,
            line(&[(2.0, 0.0), (3.0, 0.0), (4.0, 0.0)])
        );

        // the crossing line is cut at its own middle vertex as well
        let of_second: Vec<&BrokenFeature> = broken.iter().filter(|b| b.parent == 1).collect();
        assert_eq!(of_second.len(), 2);
    }

    #[test]
    fn one_way_candidate_reports_still_cut_both_lines() {
        // index only ever reports {1} for feature 0's extent; symmetry must
        // still cut feature 1 at the shared vertex
        struct OneWay {
            bbox_of_zero: BBox,
        }
        impl SpatialIndex for OneWay {
            fn intersecting(&self, bbox: BBox) -> Vec<MergedId> {
                if bbox == self.bbox_of_zero { vec![1] } else { Vec::new() }
            }
        }

        let m = vec![
            merged(0, vec![1], &[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)]),
            merged(1, vec![2], &[(2.0, -5.0), (2.0, 0.0), (2.0, 5.0)]),
        ];
        let index = OneWay {
            bbox_of_zero: polyline_bbox(&m[0].geometry),
        };
        let broken = split_merged(&m, &index, &MergedAdjacency::default(), 6).unwrap();
        assert_eq!(broken.iter().filter(|b| b.parent == 0).count(), 2);
        assert_eq!(broken.iter().filter(|b| b.parent == 1).count(), 2);
    }

    #[test]
    fn dual_adjacent_features_are_not_cut_against_each_other() {
        use crate::dual::DualGraph;
        use ahash::{AHashMap, AHashSet};

        // the meeting point (2, 0) sits mid-line in feature 0; without the
        // subtraction it would be cut there
        let m = vec![
            merged(0, vec![1], &[(0.0, 0.0), (2.0, 0.0), (4.0, 0.0)]),
            merged(1, vec![2], &[(2.0, 0.0), (2.0, 1.0), (2.0, 2.0)]),
        ];
        // features 1 and 2 meet at (2, 0) in the dual graph
        let mut adjacency: AHashMap<FeatId, AHashSet<FeatId>> = AHashMap::new();
        adjacency.entry(1).or_default().insert(2);
        adjacency.entry(2).or_default().insert(1);
        let dual = DualGraph { adjacency };
        let consumed = MergedAdjacency::from_dual(&dual, &m);
        assert!(consumed.connected(0, 1));

        let index = RTreeIndex::build(&m);
        let broken = split_merged(&m, &index, &consumed, 6).unwrap();
        // shared point is an existing junction: both lines stay whole
        assert_eq!(broken.len(), 2);
        assert_eq!(broken[0].geometry, m[0].geometry);
        assert_eq!(broken[1].geometry, m[1].geometry);
    }

    #[test]
    fn resplitting_fragments_changes_nothing() {
        let m = vec![
            merged(
                0,
                vec![1],
                &[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0), (3.0, 0.0), (4.0, 0.0)],
            ),
            merged(1, vec![2], &[(2.0, -5.0), (2.0, 0.0), (2.0, 5.0)]),
        ];
        let index = RTreeIndex::build(&m);
        let broken = split_merged(&m, &index, &MergedAdjacency::default(), 6).unwrap();

        let again: Vec<MergedFeature> = broken
            .iter()
            .enumerate()
            .map(|(i, b)| MergedFeature {
                id: i,
                members: Vec::new(),
                geometry: b.geometry.clone(),
                attrs: b.attrs.clone(),
            })
            .collect();
        let rebroken =
            split_merged(&again, &EmptyIndex, &MergedAdjacency::default(), 6).unwrap();

        assert_eq!(rebroken.len(), broken.len());
        for (a, b) in rebroken.iter().zip(broken.iter()) {
            assert_eq!(a.geometry, b.geometry);
        }
    }
}
