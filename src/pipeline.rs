// ===========================================================================
// Pipeline
// ===========================================================================
//
// Stage order is fixed: primal build -> dual transform -> chain resolution
// -> geometry merge -> intersection split. Each stage consumes the complete
// output of the previous one and returns a new structure; nothing mutates
// shared state, so a failed precondition anywhere aborts the run with no
// partial network emitted.
// ===========================================================================

use crate::chains::resolve_chains;
use crate::dual::DualGraph;
use crate::error::SimplifyError;
use crate::feature::Feature;
use crate::merge::merge_chains;
use crate::primal::PrimalGraph;
use crate::provider::{FeatureSource, OutputSink, RTreeIndex};
use crate::snap::DEFAULT_NUMBER_DECIMALS;
use crate::split::{BrokenFeature, MergedAdjacency, split_merged};
use log::info;

#[derive(Debug, Clone, Copy)]
pub struct SimplifyConfig {
    /// Fractional digits kept when snapping coordinates.
    pub number_decimals: u32,
    /// Restrict dual edges to pass-through (degree 2) primal nodes. This is
    /// the merge-eligibility mode; all-connections mode is mostly useful for
    /// topology inspection.
    pub interior_only: bool,
}

impl Default for SimplifyConfig {
    fn default() -> Self {
        SimplifyConfig {
            number_decimals: DEFAULT_NUMBER_DECIMALS,
            interior_only: true,
        }
    }
}

/// Run the whole simplification over a feature snapshot.
pub fn simplify_features(
    features: Vec<Feature>,
    config: &SimplifyConfig,
) -> Result<Vec<BrokenFeature>, SimplifyError> {
    let primal = PrimalGraph::build(features, config.number_decimals)?;
    info!(
        "primal graph: {} nodes, {} edges",
        primal.node_count(),
        primal.edge_count()
    );

    let dual = DualGraph::from_primal(&primal, config.interior_only);
    info!(
        "dual graph: {} nodes, {} edges (interior_only: {})",
        dual.node_count(),
        dual.edge_count(),
        config.interior_only
    );

    let chains = resolve_chains(&dual)?;
    info!("resolved {} chains", chains.len());

    let merged = merge_chains(&chains, &primal, config.number_decimals)?;
    info!("merged into {} features", merged.len());

    let consumed = MergedAdjacency::from_dual(&dual, &merged);
    let index = RTreeIndex::build(&merged);
    let broken = split_merged(&merged, &index, &consumed, config.number_decimals)?;
    info!("re-split into {} features", broken.len());

    Ok(broken)
}

/// Simplify a source layer into a sink, propagating the source schema.
pub fn simplify_layer(
    source: &impl FeatureSource,
    sink: &mut impl OutputSink,
    config: &SimplifyConfig,
) -> Result<(), SimplifyError> {
    let schema = source.schema();
    let broken = simplify_features(source.features(), config)?;
    sink.write(
        &schema,
        broken.into_iter().map(|b| (b.geometry, b.attrs)).collect(),
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::{AttrBag, AttrValue};
    use crate::provider::MemoryLayer;
    use geo::Coord;

    fn line(pts: &[(f64, f64)]) -> Vec<Coord> {
        pts.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    fn named(name: &str) -> AttrBag {
        let mut attrs = AttrBag::new();
        attrs.set("name", AttrValue::Str(name.to_string()));
        attrs
    }

    #[test]
    fn two_segment_chain_round_trips_to_one_feature() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), named("a"));
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), named("b"));

        let broken =
            simplify_features(layer.features(), &SimplifyConfig::default()).unwrap();
        assert_eq!(broken.len(), 1);
        // concatenation minus the duplicated shared endpoint
        assert_eq!(
            broken[0].geometry,
            line(&[(0.0, 0.0), (1.0, 0.0), (2.0, 0.0)])
        );
        assert_eq!(broken[0].attrs.get("name"), Some(&AttrValue::Str("a".into())));
    }

    #[test]
    fn four_segment_chain_becomes_one_continuous_line() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), named("s1"));
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), named("s2"));
        layer.add_feature(line(&[(2.0, 0.0), (3.0, 0.0)]), named("s3"));
        layer.add_feature(line(&[(3.0, 0.0), (4.0, 0.0)]), named("s4"));

        let broken =
            simplify_features(layer.features(), &SimplifyConfig::default()).unwrap();
        assert_eq!(broken.len(), 1);
        assert_eq!(
            broken[0].geometry,
            line(&[
                (0.0, 0.0),
                (1.0, 0.0),
                (2.0, 0.0),
                (3.0, 0.0),
                (4.0, 0.0)
            ])
        );
    }

    #[test]
    fn t_junction_interior_only_passes_segments_through() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), named("s1"));
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), named("s2"));
        layer.add_feature(line(&[(1.0, 0.0), (1.0, 1.0)]), named("s3"));

        let broken =
            simplify_features(layer.features(), &SimplifyConfig::default()).unwrap();
        // degree-3 junction: nothing merges, every shared point is already
        // an endpoint, so the three segments survive unchanged
        assert_eq!(broken.len(), 3);
        for b in &broken {
            assert_eq!(b.geometry.len(), 2);
        }
    }

    #[test]
    fn closed_loop_survives_without_crashing() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), named("s1"));
        layer.add_feature(line(&[(1.0, 0.0), (1.0, 1.0)]), named("s2"));
        layer.add_feature(line(&[(1.0, 1.0), (0.0, 1.0)]), named("s3"));
        layer.add_feature(line(&[(0.0, 1.0), (0.0, 0.0)]), named("s4"));

        let broken =
            simplify_features(layer.features(), &SimplifyConfig::default()).unwrap();
        // degenerate fallback keeps a single loop member
        assert_eq!(broken.len(), 1);
        assert_eq!(broken[0].geometry.len(), 2);
    }

    #[test]
    fn layer_to_layer_run_carries_the_schema() {
        let mut source = MemoryLayer::default();
        source.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), named("a"));
        source.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), named("b"));
        source.schema = crate::provider::infer_schema(&source.features);

        let mut sink = MemoryLayer::default();
        simplify_layer(&source, &mut sink, &SimplifyConfig::default()).unwrap();

        assert_eq!(sink.schema, source.schema);
        assert_eq!(sink.features.len(), 1);
    }
}
