mod convergence;
mod error;
pub(crate) mod types;

pub use error::LayoutError;
pub use types::*;

use std::collections::HashMap;

use log::debug;

use crate::config::LayoutConfig;
use crate::hierarchy::{Hierarchy, build_hierarchy};
use crate::records::PedigreeRecord;

/// Computes the full pedigree layout for one flat record list.
///
/// Pure transform: same records + options always produce the same geometry.
/// Empty input is an empty layout, not an error; the only failure mode is a
/// centering loop that will not settle within the iteration cap.
pub fn compute_layout(
    records: &[PedigreeRecord],
    config: &LayoutConfig,
) -> Result<Layout, LayoutError> {
    let hierarchy = build_hierarchy(records);
    compute_hierarchy_layout(&hierarchy, config)
}

/// Layout from an already-built hierarchy, for callers that want the level
/// structure as well.
pub fn compute_hierarchy_layout(
    hierarchy: &Hierarchy,
    config: &LayoutConfig,
) -> Result<Layout, LayoutError> {
    let mut layout = Layout {
        row_height: config.row_height(),
        dropped: hierarchy.dropped.clone(),
        ..Layout::default()
    };
    if hierarchy.is_empty() {
        return Ok(layout);
    }

    let h_spacing = config.h_spacing();
    let v_spacing = config.v_spacing();

    let levels = build_arena(hierarchy, &mut layout, h_spacing, v_spacing);
    form_bundles(&mut layout);
    pull_parents(&mut layout, &levels);

    let passes = convergence::run(
        &mut layout.nodes,
        &mut layout.bundles,
        &levels,
        h_spacing,
        config.max_iterations,
    )?;
    debug!(
        "pedigree layout: {} nodes, {} bundles, {} passes",
        layout.nodes.len(),
        layout.bundles.len(),
        passes
    );

    layout.bounding_box = bounding_box(&layout.nodes, config.node_diameter);
    route_links(&mut layout, v_spacing);
    Ok(layout)
}

/// Flattens the level structure into the node arena. Initial placement is
/// input order: `x = position * h_spacing`, `y = level * v_spacing`.
fn build_arena(
    hierarchy: &Hierarchy,
    layout: &mut Layout,
    h_spacing: f32,
    v_spacing: f32,
) -> Vec<Vec<usize>> {
    let mut levels: Vec<Vec<usize>> = Vec::with_capacity(hierarchy.levels.len());
    for (level, entries) in hierarchy.levels.iter().enumerate() {
        let mut row = Vec::with_capacity(entries.len());
        for (position, entry) in entries.iter().enumerate() {
            let idx = layout.nodes.len();
            layout.nodes.push(LayoutNode {
                id: entry.id.clone(),
                level,
                x: position as f32 * h_spacing,
                y: level as f32 * v_spacing,
                parents: Vec::new(),
                bundle: None,
                bundles: Vec::new(),
                height: 0,
            });
            layout.node_index.insert(entry.id.clone(), idx);
            row.push(idx);
        }
        levels.push(row);
    }

    // Second sweep: resolve parent ids now that every node has an index.
    for entry in hierarchy.levels.iter().flatten() {
        let node_idx = layout.node_index[&entry.id];
        for parent_id in &entry.parents {
            let Some(&parent_idx) = layout.node_index.get(parent_id) else {
                continue;
            };
            if parent_idx != node_idx && !layout.nodes[node_idx].parents.contains(&parent_idx) {
                layout.nodes[node_idx].parents.push(parent_idx);
            }
        }
    }
    levels
}

/// Groups each level's nodes by their parent set. Every distinct set gets
/// one bundle at the parent centroid; siblings point at it via `.bundle`,
/// parents list it in `.bundles`.
fn form_bundles(layout: &mut Layout) {
    let node_count = layout.nodes.len();
    let mut by_key: HashMap<(usize, String), usize> = HashMap::new();

    for node_idx in 0..node_count {
        if layout.nodes[node_idx].parents.is_empty() {
            continue;
        }
        let level = layout.nodes[node_idx].level;

        let mut parent_pairs: Vec<(String, usize)> = layout.nodes[node_idx]
            .parents
            .iter()
            .map(|&parent| (layout.nodes[parent].id.clone(), parent))
            .collect();
        parent_pairs.sort();
        let key = parent_pairs
            .iter()
            .map(|(id, _)| id.as_str())
            .collect::<Vec<_>>()
            .join("+");

        let bundle_idx = match by_key.get(&(level, key.clone())) {
            Some(&idx) => idx,
            None => {
                let idx = layout.bundles.len();
                let parents: Vec<usize> = parent_pairs.iter().map(|&(_, p)| p).collect();
                let count = parents.len() as f32;
                let x = parents.iter().map(|&p| layout.nodes[p].x).sum::<f32>() / count;
                let y = parents.iter().map(|&p| layout.nodes[p].y).sum::<f32>() / count;
                layout.bundles.push(Bundle {
                    key: key.clone(),
                    level,
                    x,
                    y,
                    parents: parents.clone(),
                    children: Vec::new(),
                    links: Vec::new(),
                });
                for parent in parents {
                    layout.nodes[parent].bundles.push(idx);
                }
                by_key.insert((level, key), idx);
                idx
            }
        };
        layout.bundles[bundle_idx].children.push(node_idx);
        layout.nodes[node_idx].bundle = Some(bundle_idx);
    }

    for node in &mut layout.nodes {
        node.height = node.bundles.len();
    }
}

/// Bottom-up pre-pass: a bundle whose parent centroid sits left of its
/// earliest child drags its parents right by the deficit, carrying every
/// later node on the parents' rows along so the left-to-right order keeps
/// its spacing.
fn pull_parents(layout: &mut Layout, levels: &[Vec<usize>]) {
    for level in (0..levels.len()).rev() {
        for bundle_idx in 0..layout.bundles.len() {
            if layout.bundles[bundle_idx].level != level {
                continue;
            }
            let bundle = &layout.bundles[bundle_idx];
            let count = bundle.parents.len() as f32;
            let centroid = bundle.parents.iter().map(|&p| layout.nodes[p].x).sum::<f32>() / count;
            let earliest = bundle
                .children
                .iter()
                .map(|&c| layout.nodes[c].x)
                .fold(f32::INFINITY, f32::min);
            if centroid + 1e-3 >= earliest {
                continue;
            }
            let shift = earliest - centroid;

            // A bundle's parents normally share one row, but repair-attached
            // kin can straddle rows; shift each row from its own threshold.
            let mut row_thresholds: HashMap<usize, f32> = HashMap::new();
            for &parent in &layout.bundles[bundle_idx].parents {
                let row = layout.nodes[parent].level;
                let x = layout.nodes[parent].x;
                row_thresholds
                    .entry(row)
                    .and_modify(|threshold| *threshold = threshold.min(x))
                    .or_insert(x);
            }
            for (&row, &threshold) in &row_thresholds {
                for &node_idx in &levels[row] {
                    if layout.nodes[node_idx].x + 1e-3 >= threshold {
                        layout.nodes[node_idx].x += shift;
                    }
                }
            }
            layout.bundles[bundle_idx].x += shift;
        }
    }
}

fn bounding_box(nodes: &[LayoutNode], node_diameter: f32) -> BoundingBox {
    let mut min_x = f32::INFINITY;
    let mut min_y = f32::INFINITY;
    let mut max_x = f32::NEG_INFINITY;
    let mut max_y = f32::NEG_INFINITY;
    for node in nodes {
        min_x = min_x.min(node.x);
        min_y = min_y.min(node.y);
        max_x = max_x.max(node.x);
        max_y = max_y.max(node.y);
    }
    if !min_x.is_finite() {
        return BoundingBox::default();
    }
    let pad = node_diameter / 2.0;
    BoundingBox {
        min_x: min_x - pad,
        min_y: min_y - pad,
        width: (max_x - min_x) + node_diameter,
        height: (max_y - min_y) + node_diameter,
    }
}

/// Builds every child-to-parent connector from the converged positions. The
/// elbow row sits midway between the bundle (parent centroid) and the child
/// row, so all siblings of one bundle share a trunk at the bundle's x.
fn route_links(layout: &mut Layout, v_spacing: f32) {
    for bundle_idx in 0..layout.bundles.len() {
        let bundle = &layout.bundles[bundle_idx];
        let child_row_y = bundle.level as f32 * v_spacing;
        let elbow_y = (bundle.y + child_row_y) / 2.0;

        let children = bundle.children.clone();
        let parents = bundle.parents.clone();
        let bundle_x = bundle.x;
        for &child in &children {
            for &parent in &parents {
                let (child_x, child_y) = (layout.nodes[child].x, layout.nodes[child].y);
                let (parent_x, parent_y) = (layout.nodes[parent].x, layout.nodes[parent].y);
                let link_idx = layout.links.len();
                layout.links.push(Link {
                    child,
                    parent,
                    bundle: bundle_idx,
                    points: [
                        (child_x, child_y),
                        (child_x, elbow_y),
                        (bundle_x, elbow_y),
                        (parent_x, elbow_y),
                        (parent_x, parent_y),
                    ],
                });
                layout.bundles[bundle_idx].links.push(link_idx);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::records::PedigreeRecord;

    fn record(id: &str) -> PedigreeRecord {
        PedigreeRecord::new("FAM1", id)
    }

    #[test]
    fn empty_input_is_an_empty_layout() {
        let layout = compute_layout(&[], &LayoutConfig::default()).expect("empty is fine");
        assert!(layout.is_empty());
        assert_eq!(layout.bounding_box, BoundingBox::default());
        assert!(layout.links.is_empty());
    }

    #[test]
    fn singleton_sits_at_origin() {
        let layout = compute_layout(&[record("only")], &LayoutConfig::default()).expect("layout");
        let node = layout.node("only").expect("placed");
        assert_eq!((node.x, node.y), (0.0, 0.0));
        assert_eq!(node.level, 0);
        assert_eq!(layout.bounding_box.min_x, -20.0);
        assert_eq!(layout.bounding_box.width, 40.0);
        assert_eq!(layout.row_height, 55.0);
    }

    #[test]
    fn links_are_axis_aligned_five_point_polylines() {
        let records = vec![
            record("f"),
            record("m"),
            record("c").with_parents("f", "m"),
        ];
        let layout = compute_layout(&records, &LayoutConfig::default()).expect("layout");
        assert_eq!(layout.links.len(), 2);
        for link in &layout.links {
            let p = link.points;
            // vertical, horizontal, horizontal, vertical segments
            assert_eq!(p[0].0, p[1].0);
            assert_eq!(p[1].1, p[2].1);
            assert_eq!(p[2].1, p[3].1);
            assert_eq!(p[3].0, p[4].0);
            assert_eq!(p[0].1, layout.nodes[link.child].y);
            assert_eq!(p[4].1, layout.nodes[link.parent].y);
        }
        let bundle = &layout.bundles[0];
        assert_eq!(bundle.links.len(), 2);
    }

    /// A parent feeding two bundles used to pick up the full rebalance
    /// deficit once per bundle, so the subtree under the second marriage
    /// crept sideways on every pass and the loop ran into the cap.
    #[test]
    fn remarried_parent_settles_instead_of_oscillating() {
        let records = vec![
            record("gf"),
            record("gm"),
            record("p").with_parents("gf", "gm"),
            record("s1"),
            record("s2"),
            record("c1").with_parents("p", "s1"),
            record("c2").with_parents("p", "s1"),
            record("c3").with_parents("p", "s2"),
            record("sp"),
            record("g1").with_parents("c1", "sp"),
        ];
        let layout = compute_layout(&records, &LayoutConfig::default()).expect("converges");
        assert_eq!(layout.nodes.len(), 10);
        // converged fixed point: every bundle is centred over its children
        for bundle in &layout.bundles {
            let mut min_x = f32::INFINITY;
            let mut max_x = f32::NEG_INFINITY;
            for &child in &bundle.children {
                min_x = min_x.min(layout.nodes[child].x);
                max_x = max_x.max(layout.nodes[child].x);
            }
            assert!(
                (bundle.x - (min_x + max_x) / 2.0).abs() < 1.0,
                "bundle {} at {:.1}, children span {:.1}..{:.1}",
                bundle.key,
                bundle.x,
                min_x,
                max_x
            );
        }
    }

    #[test]
    fn half_siblings_get_distinct_bundles() {
        let records = vec![
            record("f"),
            record("m1"),
            record("m2"),
            record("c1").with_parents("f", "m1"),
            record("c2").with_parents("f", "m2"),
        ];
        let layout = compute_layout(&records, &LayoutConfig::default()).expect("layout");
        assert_eq!(layout.bundles.len(), 2);
        let c1 = layout.node("c1").expect("c1");
        let c2 = layout.node("c2").expect("c2");
        assert_ne!(c1.bundle, c2.bundle);
        let shared = layout.node("f").expect("f");
        assert_eq!(shared.bundles.len(), 2);
        assert_eq!(shared.height, 2);
    }
}
