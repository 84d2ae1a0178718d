use std::collections::HashMap;

/// One placed individual. Cross-references (`parents`, `bundle`, `bundles`)
/// are indices into the owning `Layout`'s flat vectors.
#[derive(Debug, Clone)]
pub struct LayoutNode {
    pub id: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
    /// Indices of this node's parent nodes (0, 1 or 2).
    pub parents: Vec<usize>,
    /// Bundle this node belongs to as a child.
    pub bundle: Option<usize>,
    /// Bundles this node feeds as a parent.
    pub bundles: Vec<usize>,
    /// Number of bundles fed as a parent; ordering tie-break.
    pub height: usize,
}

/// Synthetic merge point for a full-sibling group: all children at one level
/// that share the same parent set. Positioned at the parent centroid, it
/// carries the trunk all sibling connectors converge into.
#[derive(Debug, Clone)]
pub struct Bundle {
    /// Sorted, `+`-joined parent ids; unique per level.
    pub key: String,
    /// Level of the member children.
    pub level: usize,
    pub x: f32,
    pub y: f32,
    pub parents: Vec<usize>,
    pub children: Vec<usize>,
    pub links: Vec<usize>,
}

/// One child-to-parent connector: five control points forming an
/// axis-aligned polyline (child centre, child elbow, bundle elbow, parent
/// elbow, parent centre).
#[derive(Debug, Clone)]
pub struct Link {
    pub child: usize,
    pub parent: usize,
    pub bundle: usize,
    pub points: [(f32, f32); 5],
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct BoundingBox {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

/// The computed geometry for one pedigree: pure derived data, rebuilt from
/// scratch on every call. Node/bundle/link ownership lives in the flat
/// vectors here; everything else is an index.
#[derive(Debug, Clone, Default)]
pub struct Layout {
    pub nodes: Vec<LayoutNode>,
    pub node_index: HashMap<String, usize>,
    pub bundles: Vec<Bundle>,
    pub links: Vec<Link>,
    pub bounding_box: BoundingBox,
    /// Row height the renderer should reserve per generation.
    pub row_height: f32,
    /// Individuals that survived neither the spine nor the repair pass.
    pub dropped: Vec<String>,
}

impl Layout {
    pub fn node(&self, id: &str) -> Option<&LayoutNode> {
        self.node_index.get(id).map(|&idx| &self.nodes[idx])
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}
