// ===========================================================================
// Primal Graph
// ===========================================================================
//
// Undirected multigraph of the raw network: nodes are quantized endpoint
// coordinates, edges are the input line features. Only the first and last
// vertex of a feature define connectivity; interior vertices ride along as
// geometry payload. Parallel edges (same endpoint pair) and self-loops
// (identical snapped endpoints) are kept as distinct edges.
// ===========================================================================

use crate::error::SimplifyError;
use crate::feature::{AttrBag, FeatId, Feature};
use crate::snap::{SnappedPoint, snap_point};
use ahash::AHashMap;
use geo::Coord;

/// One input feature as an edge of the primal graph, keeping its original
/// (non-quantized) vertex sequence and attribute bag.
#[derive(Debug, Clone)]
pub struct PrimalEdge {
    pub feat_id: FeatId,
    pub from: SnappedPoint,
    pub to: SnappedPoint,
    pub geometry: Vec<Coord>,
    pub attrs: AttrBag,
}

#[derive(Debug, Default)]
pub struct PrimalGraph {
    /// Snapped node -> ids of incident edges. A self-loop lists its feature
    /// once at the shared node.
    pub adjacency: AHashMap<SnappedPoint, Vec<FeatId>>,
    /// Edge table keyed by feature id.
    pub edges: AHashMap<FeatId, PrimalEdge>,
}

impl PrimalGraph {
    /// Build the primal graph from the feature snapshot, consuming it.
    ///
    /// Fails on duplicate feature ids (the id is the correlation key for the
    /// whole pipeline) and on non-finite endpoint coordinates.
    pub fn build(
        features: Vec<Feature>,
        number_decimals: u32,
    ) -> Result<PrimalGraph, SimplifyError> {
        let mut graph = PrimalGraph::default();
        for feature in features {
            if graph.edges.contains_key(&feature.feat_id) {
                return Err(SimplifyError::DuplicateFeatureId {
                    feat_id: feature.feat_id,
                });
            }
            let (Some(&first), Some(&last)) = (feature.geometry.first(), feature.geometry.last())
            else {
                return Err(SimplifyError::InternalInconsistency {
                    detail: format!("feature {} has an empty geometry", feature.feat_id),
                });
            };
            let from = snap_point(first, number_decimals)?;
            let to = snap_point(last, number_decimals)?;

            graph.adjacency.entry(from).or_default().push(feature.feat_id);
            if to != from {
                graph.adjacency.entry(to).or_default().push(feature.feat_id);
            }
            graph.edges.insert(
                feature.feat_id,
                PrimalEdge {
                    feat_id: feature.feat_id,
                    from,
                    to,
                    geometry: feature.geometry,
                    attrs: feature.attrs,
                },
            );
        }
        Ok(graph)
    }

    pub fn node_count(&self) -> usize {
        self.adjacency.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// Feature ids in ascending order. Downstream traversal seeds from this
    /// list so results never depend on hash-map iteration order.
    pub fn feat_ids_sorted(&self) -> Vec<FeatId> {
        let mut ids: Vec<FeatId> = self.edges.keys().copied().collect();
        ids.sort_unstable();
        ids
    }
}
