use std::collections::BTreeMap;

use log::{debug, trace};

use super::error::LayoutError;
use super::types::{Bundle, LayoutNode};

/// A pass that moves nothing further than this has converged. Half a pixel
/// is invisible at any marker size.
const MOVEMENT_EPSILON: f32 = 0.5;

/// Snapshot of every horizontal position. Passes map one snapshot to the
/// next; the caller compares and swaps, so termination is observable from
/// the outside instead of being threaded through mutation flags.
#[derive(Debug, Clone, PartialEq)]
struct Positions {
    node_x: Vec<f32>,
    bundle_x: Vec<f32>,
}

impl Positions {
    fn capture(nodes: &[LayoutNode], bundles: &[Bundle]) -> Self {
        Self {
            node_x: nodes.iter().map(|node| node.x).collect(),
            bundle_x: bundles.iter().map(|bundle| bundle.x).collect(),
        }
    }

    fn min_node_x(&self) -> f32 {
        self.node_x.iter().copied().fold(f32::INFINITY, f32::min)
    }

    fn translate(&mut self, dx: f32) {
        for x in &mut self.node_x {
            *x += dx;
        }
        for x in &mut self.bundle_x {
            *x += dx;
        }
    }

    fn max_delta(&self, other: &Self) -> f32 {
        let nodes = self
            .node_x
            .iter()
            .zip(&other.node_x)
            .map(|(a, b)| (a - b).abs());
        let bundles = self
            .bundle_x
            .iter()
            .zip(&other.bundle_x)
            .map(|(a, b)| (a - b).abs());
        nodes.chain(bundles).fold(0.0, f32::max)
    }
}

/// Runs centering + rebalance passes until a full pass moves nothing, then
/// writes the converged positions back. Exceeding the iteration cap is a
/// layout failure, never a partially-settled tree.
pub(super) fn run(
    nodes: &mut [LayoutNode],
    bundles: &mut [Bundle],
    levels: &[Vec<usize>],
    h_spacing: f32,
    max_iterations: u32,
) -> Result<u32, LayoutError> {
    if bundles.is_empty() {
        return Ok(0);
    }

    let bundles_by_level = group_bundles_by_level(bundles, levels.len());

    let mut current = Positions::capture(nodes, bundles);
    for iteration in 1..=max_iterations {
        let mut next = pass(nodes, bundles, levels, &bundles_by_level, &current, h_spacing);
        // The centering and push dynamics are translation-invariant, and on
        // some shapes (remarriage fans especially) a pass reproduces the
        // chart exactly, shifted sideways. Cancel the drift so the movement
        // test measures shape change, not net translation.
        let drift = next.min_node_x() - current.min_node_x();
        if drift != 0.0 && drift.is_finite() {
            next.translate(-drift);
        }
        let moved = next.max_delta(&current);
        trace!("centering pass {iteration}: max movement {moved:.3}px");
        current = next;
        if moved < MOVEMENT_EPSILON {
            for (node, &x) in nodes.iter_mut().zip(&current.node_x) {
                node.x = x;
            }
            for (bundle, &x) in bundles.iter_mut().zip(&current.bundle_x) {
                bundle.x = x;
            }
            debug!("layout converged after {iteration} passes");
            return Ok(iteration);
        }
    }

    Err(LayoutError::Unresolved {
        iterations: max_iterations,
    })
}

fn group_bundles_by_level(bundles: &[Bundle], level_count: usize) -> Vec<Vec<usize>> {
    let mut grouped = vec![Vec::new(); level_count];
    for (idx, bundle) in bundles.iter().enumerate() {
        if bundle.level < level_count {
            grouped[bundle.level].push(idx);
        }
    }
    grouped
}

/// One full pass: center every bundle over its children (deepest levels
/// first, pulling the parents along), then re-space each level left to
/// right.
fn pass(
    nodes: &[LayoutNode],
    bundles: &[Bundle],
    levels: &[Vec<usize>],
    bundles_by_level: &[Vec<usize>],
    current: &Positions,
    h_spacing: f32,
) -> Positions {
    let mut next = current.clone();

    for level_bundles in bundles_by_level.iter().rev() {
        for &bundle_idx in level_bundles {
            let bundle = &bundles[bundle_idx];
            let mut min_x = f32::INFINITY;
            let mut max_x = f32::NEG_INFINITY;
            for &child in &bundle.children {
                min_x = min_x.min(next.node_x[child]);
                max_x = max_x.max(next.node_x[child]);
            }
            if !min_x.is_finite() {
                continue;
            }
            let target = (min_x + max_x) / 2.0;
            let delta = target - next.bundle_x[bundle_idx];
            if delta.abs() <= f32::EPSILON {
                continue;
            }
            next.bundle_x[bundle_idx] = target;
            for &parent in &bundle.parents {
                next.node_x[parent] += delta;
            }
        }
    }

    rebalance(nodes, bundles, levels, &mut next, h_spacing);
    next
}

/// Re-sorts every level by current x and pushes any node sitting closer than
/// `h_spacing` to its left neighbour rightward, cascading the push through
/// the node's bundles to their children so subtrees travel with their
/// parents. A bundle moves by the pushed parent's share of the deficit, not
/// the whole of it: the bundle tracks its parents' centroid, so a push that
/// reaches it through both parents adds up to exactly one deficit. Summing
/// full deficits instead leaves shared descendants creeping sideways every
/// pass and the loop never settles.
fn rebalance(
    nodes: &[LayoutNode],
    bundles: &[Bundle],
    levels: &[Vec<usize>],
    positions: &mut Positions,
    h_spacing: f32,
) {
    for level in levels {
        let mut ordered: Vec<usize> = level.clone();
        ordered.sort_by(|&a, &b| {
            positions.node_x[a]
                .partial_cmp(&positions.node_x[b])
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| nodes[b].height.cmp(&nodes[a].height))
                .then_with(|| nodes[a].id.cmp(&nodes[b].id))
        });
        for pair in ordered.windows(2) {
            let (left, right) = (pair[0], pair[1]);
            let gap = positions.node_x[right] - positions.node_x[left];
            if gap + 1e-3 < h_spacing {
                push_right(right, h_spacing - gap, nodes, bundles, positions);
            }
        }
    }
}

fn push_right(
    start: usize,
    dx: f32,
    nodes: &[LayoutNode],
    bundles: &[Bundle],
    positions: &mut Positions,
) {
    // Pending shifts keyed by (level, node) and applied shallowest first, so
    // a descendant reachable along several lines gets one merged move with
    // its contributions summed.
    let mut pending: BTreeMap<(usize, usize), f32> = BTreeMap::new();
    pending.insert((nodes[start].level, start), dx);
    while let Some(((_, node_idx), dx)) = pending.pop_first() {
        positions.node_x[node_idx] += dx;
        for &bundle_idx in &nodes[node_idx].bundles {
            let bundle = &bundles[bundle_idx];
            let share = dx / bundle.parents.len() as f32;
            positions.bundle_x[bundle_idx] += share;
            for &child in &bundle.children {
                *pending.entry((nodes[child].level, child)).or_insert(0.0) += share;
            }
        }
    }
}
