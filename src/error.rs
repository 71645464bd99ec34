use crate::feature::FeatId;
use thiserror::Error;

/// Fatal pipeline errors. Every variant is a deterministic re-derivation of
/// bad input or an internal invariant breach, so there is no retry path: the
/// run aborts and no partial network is emitted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum SimplifyError {
    /// Non-finite value handed to the coordinate quantizer.
    #[error("cannot quantize non-finite coordinate {value}")]
    InvalidCoordinate { value: f64 },

    /// Two input features carry the same feature id. The id is the sole
    /// correlation key between primal edges and dual nodes, so uniqueness is
    /// a hard precondition.
    #[error("duplicate feature id {feat_id}")]
    DuplicateFeatureId { feat_id: FeatId },

    /// The resolver produced a chain whose consecutive members do not share
    /// an endpoint. Signals an upstream graph/geometry mismatch.
    #[error("features {first} and {second} share no endpoint, cannot merge")]
    DisjointMerge { first: FeatId, second: FeatId },

    /// Connectivity/path-search contradiction. A programming or data defect,
    /// never a recoverable input condition.
    #[error("internal inconsistency: {detail}")]
    InternalInconsistency { detail: String },
}
