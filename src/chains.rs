// ===========================================================================
// Chain Resolution
// ===========================================================================
//
// Partitions the dual graph into connected components ("merge sets") and
// determines the linear visiting order of each component's members:
//
// 1. Connected components via BFS.
// 2. Components of size 1 or 2 need no ordering.
// 3. Larger components: find boundary nodes (dual degree 1 or > 2 - a chain
//    endpoint or a branch point), then enumerate all simple paths between
//    the two chosen boundary nodes and keep the longest. Ties go to the
//    first path found.
//
// Every traversal iterates in ascending feature-id order, so the output is
// deterministic by construction. Traversals use explicit queues/stacks and
// visited sets rather than recursion; component sizes are unbounded.
//
// A component with no boundary node is a closed pass-through loop. There is
// no defensible cut point, so the resolver falls back to a degenerate
// single-member chain and the remaining loop members are dropped. Known
// limitation.
// ===========================================================================

use crate::dual::DualGraph;
use crate::error::SimplifyError;
use crate::feature::FeatId;
use ahash::AHashSet;
use std::collections::VecDeque;

/// Ordered feature ids forming one maximal chain to merge.
pub type MergeSet = Vec<FeatId>;

/// Partition the dual graph into ordered merge sets.
pub fn resolve_chains(dual: &DualGraph) -> Result<Vec<MergeSet>, SimplifyError> {
    let mut chains: Vec<MergeSet> = Vec::new();
    let mut visited: AHashSet<FeatId> = AHashSet::new();

    for seed in dual.nodes_sorted() {
        if visited.contains(&seed) {
            continue;
        }

        let mut component: Vec<FeatId> = Vec::new();
        let mut queue: VecDeque<FeatId> = VecDeque::new();
        queue.push_back(seed);
        visited.insert(seed);

        while let Some(curr) = queue.pop_front() {
            component.push(curr);
            for neighbor in dual.neighbors_sorted(curr) {
                if visited.insert(neighbor) {
                    queue.push_back(neighbor);
                }
            }
        }

        // singletons and pairs carry no order ambiguity
        if component.len() <= 2 {
            chains.push(component);
        } else {
            chains.push(order_component(dual, &component)?);
        }
    }

    Ok(chains)
}

/// Resolve the travel order of a component with more than two members.
fn order_component(dual: &DualGraph, component: &[FeatId]) -> Result<MergeSet, SimplifyError> {
    let mut members: Vec<FeatId> = component.to_vec();
    members.sort_unstable();

    let boundary: Vec<FeatId> = members
        .iter()
        .copied()
        .filter(|&f| {
            let d = dual.degree(f);
            d == 1 || d > 2
        })
        .collect();

    // Policy: of the qualifying nodes, the two smallest ids become the path
    // endpoints. With no boundary node (closed loop) or a single one, the
    // path request degenerates to identical endpoints.
    let (source, sink) = match boundary.as_slice() {
        [] => (members[0], members[0]),
        [only] => (*only, *only),
        [a, b, ..] => (*a, *b),
    };

    let mut paths = all_simple_paths(dual, &members, source, sink);
    if paths.is_empty() {
        return Err(SimplifyError::InternalInconsistency {
            detail: format!(
                "no simple path between {source} and {sink} inside a connected component"
            ),
        });
    }

    // longest wins; ties keep the first one found
    let mut best = 0;
    for (i, path) in paths.iter().enumerate().skip(1) {
        if path.len() > paths[best].len() {
            best = i;
        }
    }
    let mut chain = paths.swap_remove(best);

    // a cycle path revisits its source as the sink; drop the duplicate so
    // the boundary node is not merged twice
    if chain.len() > 1 && chain.first() == chain.last() {
        chain.pop();
    }

    Ok(chain)
}

/// Enumerate every simple path from `source` to `sink` within the induced
/// subgraph of `members`, iterative DFS, neighbors visited in ascending id
/// order. An identical-endpoint request yields the single length-1 path.
fn all_simple_paths(
    dual: &DualGraph,
    members: &[FeatId],
    source: FeatId,
    sink: FeatId,
) -> Vec<Vec<FeatId>> {
    if source == sink {
        return vec![vec![source]];
    }

    let allowed: AHashSet<FeatId> = members.iter().copied().collect();
    let mut paths: Vec<Vec<FeatId>> = Vec::new();
    let mut path: Vec<FeatId> = vec![source];
    let mut on_path: AHashSet<FeatId> = AHashSet::new();
    on_path.insert(source);
    // stack frame: (sorted neighbors of the frame's node, next index to try)
    let mut stack: Vec<(Vec<FeatId>, usize)> = vec![(dual.neighbors_sorted(source), 0)];

    while let Some((neighbors, next)) = stack.last_mut() {
        if *next >= neighbors.len() {
            stack.pop();
            if let Some(done) = path.pop() {
                on_path.remove(&done);
            }
            continue;
        }
        let candidate = neighbors[*next];
        *next += 1;

        if !allowed.contains(&candidate) || on_path.contains(&candidate) {
            continue;
        }
        if candidate == sink {
            let mut found = path.clone();
            found.push(sink);
            paths.push(found);
            continue;
        }
        path.push(candidate);
        on_path.insert(candidate);
        stack.push((dual.neighbors_sorted(candidate), 0));
    }

    paths
}
