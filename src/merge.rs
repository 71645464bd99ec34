// ===========================================================================
// Geometry Merging
// ===========================================================================
//
// Turns each resolved chain into one feature. The chain order is trusted:
// geometries are combined strictly between adjacent members, folding left to
// right, and a pair that shares no endpoint is a fatal upstream mismatch.
//
// Attribute policy is deliberately lossy: the merged feature carries the
// attribute bag of the chain's first member and nothing else.
//
// Chains are independent of each other, so the fold runs per-chain in
// parallel; indexed collection keeps the output order identical to the
// sequential result.
// ===========================================================================

use crate::chains::MergeSet;
use crate::error::SimplifyError;
use crate::feature::{AttrBag, FeatId};
use crate::geometry::combine_polylines;
use crate::primal::PrimalGraph;
use geo::Coord;
use rayon::prelude::*;

/// Identifier of a merged feature, sequential per run.
pub type MergedId = usize;

/// One merged chain, not yet re-split at intersections.
#[derive(Debug, Clone)]
pub struct MergedFeature {
    pub id: MergedId,
    /// Chain members in travel order.
    pub members: Vec<FeatId>,
    pub geometry: Vec<Coord>,
    pub attrs: AttrBag,
}

/// Merge every chain against the primal edge table.
pub fn merge_chains(
    chains: &[MergeSet],
    primal: &PrimalGraph,
    number_decimals: u32,
) -> Result<Vec<MergedFeature>, SimplifyError> {
    chains
        .par_iter()
        .enumerate()
        .map(|(id, chain)| merge_chain(id, chain, primal, number_decimals))
        .collect()
}

fn merge_chain(
    id: MergedId,
    chain: &MergeSet,
    primal: &PrimalGraph,
    number_decimals: u32,
) -> Result<MergedFeature, SimplifyError> {
    let lookup = |feat_id: FeatId| {
        primal
            .edges
            .get(&feat_id)
            .ok_or_else(|| SimplifyError::InternalInconsistency {
                detail: format!("chain references unknown feature {feat_id}"),
            })
    };

    let Some(&first_id) = chain.first() else {
        return Err(SimplifyError::InternalInconsistency {
            detail: "empty merge set".to_string(),
        });
    };
    let first = lookup(first_id)?;
    let mut geometry = first.geometry.clone();

    for pair in chain.windows(2) {
        let next = lookup(pair[1])?;
        geometry = combine_polylines(&geometry, &next.geometry, pair[0], pair[1], number_decimals)?;
    }

    Ok(MergedFeature {
        id,
        members: chain.clone(),
        geometry,
        attrs: first.attrs.clone(),
    })
}
