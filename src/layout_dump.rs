use crate::layout::Layout;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

/// JSON mirror of the geometry a renderer consumes: node positions, bundle
/// trunks, five-point connector polylines, and the padded bounding box.
#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub nodes: Vec<NodeDump>,
    pub bundles: Vec<BundleDump>,
    pub links: Vec<LinkDump>,
    pub bounding_box: BoundingBoxDump,
    pub row_height: f32,
    pub dropped: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: String,
    pub level: usize,
    pub x: f32,
    pub y: f32,
}

#[derive(Debug, Serialize)]
pub struct BundleDump {
    pub key: String,
    pub x: f32,
    pub y: f32,
    pub links: Vec<usize>,
}

#[derive(Debug, Serialize)]
pub struct LinkDump {
    pub child: String,
    pub parent: String,
    pub points: Vec<[f32; 2]>,
}

#[derive(Debug, Serialize)]
pub struct BoundingBoxDump {
    pub min_x: f32,
    pub min_y: f32,
    pub width: f32,
    pub height: f32,
}

impl LayoutDump {
    pub fn from_layout(layout: &Layout) -> Self {
        let nodes = layout
            .nodes
            .iter()
            .map(|node| NodeDump {
                id: node.id.clone(),
                level: node.level,
                x: node.x,
                y: node.y,
            })
            .collect();

        let bundles = layout
            .bundles
            .iter()
            .map(|bundle| BundleDump {
                key: bundle.key.clone(),
                x: bundle.x,
                y: bundle.y,
                links: bundle.links.clone(),
            })
            .collect();

        let links = layout
            .links
            .iter()
            .map(|link| LinkDump {
                child: layout.nodes[link.child].id.clone(),
                parent: layout.nodes[link.parent].id.clone(),
                points: link.points.iter().map(|&(x, y)| [x, y]).collect(),
            })
            .collect();

        LayoutDump {
            nodes,
            bundles,
            links,
            bounding_box: BoundingBoxDump {
                min_x: layout.bounding_box.min_x,
                min_y: layout.bounding_box.min_y,
                width: layout.bounding_box.width,
                height: layout.bounding_box.height,
            },
            row_height: layout.row_height,
            dropped: layout.dropped.clone(),
        }
    }

    pub fn to_json_string(&self) -> anyhow::Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

pub fn write_layout_dump(path: &Path, layout: &Layout) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_layout(layout);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
