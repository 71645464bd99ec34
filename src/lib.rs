//! Topological simplification of planar road networks.
//!
//! A road layer digitized segment-by-segment carries far more features than
//! the network has real links: long streets arrive chopped into pass-through
//! pieces, and crossings hide inside line interiors. This crate rebuilds the
//! minimal topology in five stages:
//!
//! 1. snap endpoint coordinates to a fixed decimal precision ([`snap`])
//! 2. build the primal graph of snapped points and segments ([`primal`])
//! 3. flip it into the dual graph of segments-meeting-at-points ([`dual`])
//! 4. resolve dual components into ordered merge chains ([`chains`])
//! 5. merge chain geometries ([`merge`]) and re-split the result at genuine
//!    intersections ([`split`])
//!
//! Layer I/O, spatial indexing and schema handling stay behind the traits in
//! [`provider`]; [`pipeline`] wires the stages together.

#![deny(
    clippy::mutable_key_type,
    clippy::map_entry,
    clippy::redundant_allocation,
    clippy::bool_comparison,
    clippy::let_unit_value,
    clippy::let_and_return,
    clippy::cmp_owned
)]

pub mod chains;
pub mod dual;
pub mod error;
pub mod feature;
pub mod geometry;
pub mod merge;
pub mod pipeline;
pub mod primal;
pub mod provider;
pub mod snap;
pub mod split;

pub use error::SimplifyError;
pub use pipeline::{SimplifyConfig, simplify_features, simplify_layer};
