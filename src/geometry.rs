// ===========================================================================
// Polyline helpers
// ===========================================================================
//
// Small geometric primitives shared by the merger and the splitter. All
// endpoint comparisons go through coordinate quantization so that geometric
// decisions agree exactly with the graph topology built on snapped keys.
// ===========================================================================

use crate::error::SimplifyError;
use crate::feature::FeatId;
use crate::snap::{SnappedPoint, snap_point};
use geo::Coord;

/// Bounding box in the format (min_x, min_y, max_x, max_y)
pub type BBox = (f64, f64, f64, f64);

/// Compute the bounding box of a vertex sequence.
pub fn polyline_bbox(coords: &[Coord]) -> BBox {
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for pt in coords {
        min_x = min_x.min(pt.x);
        min_y = min_y.min(pt.y);
        max_x = max_x.max(pt.x);
        max_y = max_y.max(pt.y);
    }
    (min_x, min_y, max_x, max_y)
}

/// Quantize every vertex of a polyline.
pub fn snap_polyline(
    coords: &[Coord],
    number_decimals: u32,
) -> Result<Vec<SnappedPoint>, SimplifyError> {
    coords
        .iter()
        .map(|&c| snap_point(c, number_decimals))
        .collect()
}

/// Concatenate two polylines at their shared endpoint into one line.
///
/// All four orientation pairings are checked in a fixed order; the shared
/// vertex appears once in the output. The endpoint match uses the same
/// quantization as graph construction. Two lines with no shared endpoint are
/// a contract violation: the resolver only emits adjacent chain members.
pub fn combine_polylines(
    a: &[Coord],
    b: &[Coord],
    a_id: FeatId,
    b_id: FeatId,
    number_decimals: u32,
) -> Result<Vec<Coord>, SimplifyError> {
    if a.len() < 2 || b.len() < 2 {
        return Err(SimplifyError::InternalInconsistency {
            detail: format!("combine of degenerate geometry ({a_id}, {b_id})"),
        });
    }
    let a_start = snap_point(a[0], number_decimals)?;
    let a_end = snap_point(a[a.len() - 1], number_decimals)?;
    let b_start = snap_point(b[0], number_decimals)?;
    let b_end = snap_point(b[b.len() - 1], number_decimals)?;

    let (mut head, tail) = if a_end == b_start {
        (a.to_vec(), b.to_vec())
    } else if a_end == b_end {
        let mut rev = b.to_vec();
        rev.reverse();
        (a.to_vec(), rev)
    } else if a_start == b_start {
        let mut rev = a.to_vec();
        rev.reverse();
        (rev, b.to_vec())
    } else if a_start == b_end {
        (b.to_vec(), a.to_vec())
    } else {
        return Err(SimplifyError::DisjointMerge {
            first: a_id,
            second: b_id,
        });
    };

    head.extend_from_slice(&tail[1..]);
    Ok(head)
}
