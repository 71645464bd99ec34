// ===========================================================================
// Dual Graph
// ===========================================================================
//
// The dual graph flips the primal view: nodes are road-segment features,
// edges say "these two segments meet at an unbroken topological point".
//
// Two construction modes:
// - all connections: every primal node contributes the full set of
//   2-combinations of its incident features (a degree-3 node yields three
//   dual edges).
// - interior-only: a primal node contributes dual edges only when exactly
//   two features meet there, i.e. a pure pass-through junction. This is the
//   mode that governs merge eligibility.
//
// Every feature id present in the primal graph is a dual node, including
// features connected to nothing (isolated lines).
// ===========================================================================

use crate::feature::FeatId;
use crate::primal::PrimalGraph;
use ahash::{AHashMap, AHashSet};
use itertools::Itertools;

#[derive(Debug, Default)]
pub struct DualGraph {
    /// Feature id -> dual neighbors. Parallel dual edges carry no extra
    /// information for components, degree, or path search, so adjacency is
    /// stored deduplicated.
    pub adjacency: AHashMap<FeatId, AHashSet<FeatId>>,
}

impl DualGraph {
    pub fn from_primal(primal: &PrimalGraph, interior_only: bool) -> DualGraph {
        let mut adjacency: AHashMap<FeatId, AHashSet<FeatId>> = AHashMap::new();

        for incident in primal.adjacency.values() {
            if interior_only && incident.len() != 2 {
                continue;
            }
            for (a, b) in incident.iter().copied().tuple_combinations::<(FeatId, FeatId)>() {
                adjacency.entry(a).or_default().insert(b);
                adjacency.entry(b).or_default().insert(a);
            }
        }

        // Some lines are not connected to others; they still get a node.
        for &feat_id in primal.edges.keys() {
            adjacency.entry(feat_id).or_default();
        }

        DualGraph { adjacency }
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.values().map(|n| n.len()).sum::<usize>() / 2
    }

    /// Distinct-neighbor degree of a dual node.
    pub fn degree(&self, feat_id: FeatId) -> usize {
        self.adjacency.get(&feat_id).map_or(0, |n| n.len())
    }

    pub fn has_edge(&self, a: FeatId, b: FeatId) -> bool {
        self.adjacency.get(&a).is_some_and(|n| n.contains(&b))
    }

    pub fn nodes_sorted(&self) -> Vec<FeatId> {
        let mut ids: Vec<FeatId> = self.adjacency.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Neighbors in ascending id order, the fixed iteration order for every
    /// traversal over this graph.
    pub fn neighbors_sorted(&self, feat_id: FeatId) -> Vec<FeatId> {
        let mut ids: Vec<FeatId> = self
            .adjacency
            .get(&feat_id)
            .map(|n| n.iter().copied().collect())
            .unwrap_or_default();
        ids.sort_unstable();
        ids
    }
}
