// ===========================================================================
// External collaborators
// ===========================================================================
//
// The core never reads or writes geographic layers itself; it talks to a
// feature source, a spatial index, and an output sink through the narrow
// traits below. The in-memory implementations here back the tests and the
// CLI; a real GIS provider would slot in behind the same traits.
//
// Ingestion normalization also lives here: feature-id assignment, multi-part
// explosion, and the degenerate/duplicate geometry sweep all happen before
// the graph ever sees a feature.
// ===========================================================================

use crate::error::SimplifyError;
use crate::feature::{AttrBag, AttrValue, FeatId, Feature, FieldKind, FieldSpec, Schema};
use crate::geometry::{BBox, polyline_bbox, snap_polyline};
use crate::merge::{MergedFeature, MergedId};
use crate::snap::SnappedPoint;
use ahash::{AHashMap, AHashSet};
use geo::Coord;
use rstar::{AABB, RTree, RTreeObject};

/// Read-only source of raw features and their attribute schema.
pub trait FeatureSource {
    fn schema(&self) -> Schema;

    /// Snapshot of every feature. The core owns the returned data; later
    /// source mutations are invisible to a running pipeline.
    fn features(&self) -> Vec<Feature>;

    /// Filter the snapshot by feature id.
    fn features_by_id(&self, ids: &AHashSet<FeatId>) -> Vec<Feature> {
        self.features()
            .into_iter()
            .filter(|f| ids.contains(&f.feat_id))
            .collect()
    }
}

/// Candidate lookup by bounding extent. False positives are fine (they are
/// filtered by exact vertex comparison downstream); false negatives are not.
pub trait SpatialIndex {
    fn intersecting(&self, bbox: BBox) -> Vec<MergedId>;
}

/// The only write-capable collaborator: materializes a derived feature
/// collection under a given schema.
pub trait OutputSink {
    fn write(&mut self, schema: &Schema, features: Vec<(Vec<Coord>, AttrBag)>);
}

// ---------------------------------------------------------------------------
// In-memory layer
// ---------------------------------------------------------------------------

/// A feature collection held in memory, usable as both source and sink.
#[derive(Debug, Default)]
pub struct MemoryLayer {
    pub schema: Schema,
    pub features: Vec<Feature>,
    next_feat_id: FeatId,
}

impl MemoryLayer {
    pub fn new(schema: Schema) -> MemoryLayer {
        MemoryLayer {
            schema,
            features: Vec::new(),
            next_feat_id: 0,
        }
    }

    /// Append a feature under a freshly assigned id. The id is also recorded
    /// in the attribute bag as `feat_id`, mirroring how the source layers
    /// this tool grew up with carry their id column.
    pub fn add_feature(&mut self, geometry: Vec<Coord>, mut attrs: AttrBag) -> FeatId {
        let feat_id = self.next_feat_id;
        self.next_feat_id += 1;
        attrs.set("feat_id", AttrValue::Int(feat_id));
        self.features.push(Feature::new(feat_id, geometry, attrs));
        feat_id
    }

    /// Explode a multi-part line into one single-part feature per part, each
    /// under its own id with the parent's attributes.
    pub fn add_multipart(&mut self, parts: Vec<Vec<Coord>>, attrs: AttrBag) -> Vec<FeatId> {
        parts
            .into_iter()
            .map(|part| self.add_feature(part, attrs.clone()))
            .collect()
    }

    /// Ids of features the graph stages cannot digest: fewer than two
    /// vertices, or any non-finite coordinate.
    pub fn find_degenerate(&self) -> Vec<FeatId> {
        self.features
            .iter()
            .filter(|f| {
                f.geometry.len() < 2
                    || f.geometry.iter().any(|c| !c.x.is_finite() || !c.y.is_finite())
            })
            .map(|f| f.feat_id)
            .collect()
    }

    /// Ids of features whose snapped vertex sequence duplicates an earlier
    /// feature's, in either direction (a segment digitized backwards is the
    /// same road). The first occurrence is kept out of the report.
    pub fn find_duplicate_geometries(
        &self,
        number_decimals: u32,
    ) -> Result<Vec<FeatId>, SimplifyError> {
        let mut seen: AHashSet<Vec<SnappedPoint>> = AHashSet::new();
        let mut duplicates = Vec::new();
        for f in &self.features {
            let snapped = snap_polyline(&f.geometry, number_decimals)?;
            let mut reversed = snapped.clone();
            reversed.reverse();
            let canonical = snapped.min(reversed);
            if !seen.insert(canonical) {
                duplicates.push(f.feat_id);
            }
        }
        Ok(duplicates)
    }

    pub fn drop_features(&mut self, ids: &AHashSet<FeatId>) {
        self.features.retain(|f| !ids.contains(&f.feat_id));
    }
}

impl FeatureSource for MemoryLayer {
    fn schema(&self) -> Schema {
        self.schema.clone()
    }

    fn features(&self) -> Vec<Feature> {
        self.features.clone()
    }
}

impl OutputSink for MemoryLayer {
    fn write(&mut self, schema: &Schema, features: Vec<(Vec<Coord>, AttrBag)>) {
        self.schema = schema.clone();
        self.features.clear();
        self.next_feat_id = 0;
        for (geometry, attrs) in features {
            self.add_feature(geometry, attrs);
        }
    }
}

/// Derive a schema from the features themselves: fields in order of first
/// appearance, typed by their first non-null value.
pub fn infer_schema(features: &[Feature]) -> Schema {
    let mut order: Vec<String> = Vec::new();
    let mut kinds: AHashMap<String, FieldKind> = AHashMap::new();
    for f in features {
        for (name, value) in &f.attrs.0 {
            if kinds.get(name).is_some() {
                continue;
            }
            if !order.contains(name) {
                order.push(name.clone());
            }
            if let Some(kind) = value.kind() {
                kinds.insert(name.clone(), kind);
            }
        }
    }
    order
        .into_iter()
        .map(|name| {
            let kind = kinds.get(&name).copied().unwrap_or(FieldKind::Str);
            FieldSpec { name, kind }
        })
        .collect()
}

// ---------------------------------------------------------------------------
// R-tree spatial index
// ---------------------------------------------------------------------------

#[derive(Debug)]
struct BBoxEntry {
    id: MergedId,
    envelope: AABB<[f64; 2]>,
}

impl RTreeObject for BBoxEntry {
    type Envelope = AABB<[f64; 2]>;

    fn envelope(&self) -> Self::Envelope {
        self.envelope
    }
}

fn to_aabb(bbox: BBox) -> AABB<[f64; 2]> {
    AABB::from_corners([bbox.0, bbox.1], [bbox.2, bbox.3])
}

/// Bbox index over the merged network, the default `SpatialIndex` provider.
#[derive(Debug)]
pub struct RTreeIndex {
    tree: RTree<BBoxEntry>,
}

impl RTreeIndex {
    pub fn build(merged: &[MergedFeature]) -> RTreeIndex {
        let entries = merged
            .iter()
            .map(|m| BBoxEntry {
                id: m.id,
                envelope: to_aabb(polyline_bbox(&m.geometry)),
            })
            .collect();
        RTreeIndex {
            tree: RTree::bulk_load(entries),
        }
    }
}

impl SpatialIndex for RTreeIndex {
    fn intersecting(&self, bbox: BBox) -> Vec<MergedId> {
        self.tree
            .locate_in_envelope_intersecting(&to_aabb(bbox))
            .map(|entry| entry.id)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::feature::AttrBag;

    fn line(pts: &[(f64, f64)]) -> Vec<Coord> {
        pts.iter().map(|&(x, y)| Coord { x, y }).collect()
    }

    #[test]
    fn layer_assigns_sequential_ids_and_records_them() {
        let mut layer = MemoryLayer::default();
        let a = layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), AttrBag::new());
        let b = layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), AttrBag::new());
        assert_eq!((a, b), (0, 1));
        assert_eq!(layer.features[1].attrs.get("feat_id"), Some(&AttrValue::Int(1)));
    }

    #[test]
    fn multipart_features_explode_into_parts() {
        let mut layer = MemoryLayer::default();
        let mut attrs = AttrBag::new();
        attrs.set("name", AttrValue::Str("split road".into()));
        let ids = layer.add_multipart(
            vec![line(&[(0.0, 0.0), (1.0, 0.0)]), line(&[(5.0, 0.0), (6.0, 0.0)])],
            attrs,
        );
        assert_eq!(ids.len(), 2);
        assert_eq!(layer.features.len(), 2);
        for f in &layer.features {
            assert_eq!(f.attrs.get("name"), Some(&AttrValue::Str("split road".into())));
        }
    }

    #[test]
    fn degenerate_and_duplicate_sweeps_report_offenders() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), AttrBag::new()); // 0
        layer.add_feature(line(&[(5.0, 5.0)]), AttrBag::new()); // 1: too short
        layer.add_feature(line(&[(0.0, f64::NAN), (1.0, 0.0)]), AttrBag::new()); // 2
        layer.add_feature(line(&[(1.0, 0.0), (0.0, 0.0)]), AttrBag::new()); // 3: 0 reversed

        assert_eq!(layer.find_degenerate(), vec![1, 2]);

        let degenerate: AHashSet<FeatId> = layer.find_degenerate().into_iter().collect();
        layer.drop_features(&degenerate);
        assert_eq!(layer.find_duplicate_geometries(6).unwrap(), vec![3]);
    }

    #[test]
    fn features_by_id_filters_the_snapshot() {
        let mut layer = MemoryLayer::default();
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), AttrBag::new());
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), AttrBag::new());
        let wanted: AHashSet<FeatId> = [1].into_iter().collect();
        let got = layer.features_by_id(&wanted);
        assert_eq!(got.len(), 1);
        assert_eq!(got[0].feat_id, 1);
    }

    #[test]
    fn schema_inference_keeps_field_order_and_types() {
        let mut layer = MemoryLayer::default();
        let mut attrs = AttrBag::new();
        attrs.set("name", AttrValue::Null);
        attrs.set("lanes", AttrValue::Int(2));
        layer.add_feature(line(&[(0.0, 0.0), (1.0, 0.0)]), attrs);
        let mut attrs = AttrBag::new();
        attrs.set("name", AttrValue::Str("A road".into()));
        layer.add_feature(line(&[(1.0, 0.0), (2.0, 0.0)]), attrs);

        let schema = infer_schema(&layer.features());
        let names: Vec<&str> = schema.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["name", "lanes", "feat_id"]);
        assert_eq!(schema[0].kind, FieldKind::Str);
        assert_eq!(schema[1].kind, FieldKind::Int);
    }

    #[test]
    fn rtree_index_finds_touching_extents() {
        let merged = vec![
            MergedFeature {
                id: 0,
                members: vec![1],
                geometry: line(&[(0.0, 0.0), (1.0, 0.0)]),
                attrs: AttrBag::new(),
            },
            MergedFeature {
                id: 1,
                members: vec![2],
                geometry: line(&[(1.0, 0.0), (1.0, 5.0)]),
                attrs: AttrBag::new(),
            },
            MergedFeature {
                id: 2,
                members: vec![3],
                geometry: line(&[(40.0, 40.0), (41.0, 40.0)]),
                attrs: AttrBag::new(),
            },
        ];
        let index = RTreeIndex::build(&merged);
        let mut found = index.intersecting(polyline_bbox(&merged[0].geometry));
        found.sort_unstable();
        // itself plus the line touching at (1, 0); never the far one
        assert_eq!(found, vec![0, 1]);
    }
}
