use serde::{Deserialize, Serialize};
use std::path::Path;

/// Layout knobs. Spacing values left unset derive from the node diameter,
/// matching the marker size the renderer draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LayoutConfig {
    pub node_diameter: f32,
    pub horizontal_spacing: Option<f32>,
    pub vertical_spacing: Option<f32>,
    pub max_iterations: u32,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            node_diameter: 40.0,
            horizontal_spacing: None,
            vertical_spacing: None,
            max_iterations: 1000,
        }
    }
}

impl LayoutConfig {
    pub fn h_spacing(&self) -> f32 {
        self.horizontal_spacing
            .unwrap_or(self.node_diameter * 2.5)
            .max(1.0)
    }

    pub fn v_spacing(&self) -> f32 {
        self.vertical_spacing
            .unwrap_or((self.node_diameter * 1.7).max(50.0))
            .max(1.0)
    }

    pub fn row_height(&self) -> f32 {
        self.node_diameter + 15.0
    }
}

#[derive(Debug, Clone, Default)]
pub struct Config {
    pub layout: LayoutConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ConfigFile {
    node_diameter: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    max_iterations: Option<u32>,
}

pub fn load_config(path: Option<&Path>) -> anyhow::Result<Config> {
    let mut config = Config::default();
    let Some(path) = path else {
        return Ok(config);
    };

    let contents = std::fs::read_to_string(path)?;
    let parsed: ConfigFile = serde_json::from_str(&contents)?;
    apply_file(&mut config.layout, &parsed);
    Ok(config)
}

fn apply_file(layout: &mut LayoutConfig, file: &ConfigFile) {
    if let Some(v) = file.node_diameter {
        layout.node_diameter = v;
    }
    if let Some(v) = file.horizontal_spacing {
        layout.horizontal_spacing = Some(v);
    }
    if let Some(v) = file.vertical_spacing {
        layout.vertical_spacing = Some(v);
    }
    if let Some(v) = file.max_iterations {
        layout.max_iterations = v;
    }
}

/// Applies an inline `#!{...}` directive (parsed to a JSON value) on top of
/// the current options. Unknown keys are ignored.
pub fn apply_overrides(layout: &mut LayoutConfig, value: &serde_json::Value) {
    let Some(map) = value.as_object() else {
        return;
    };
    if let Some(v) = map.get("nodeDiameter").and_then(|v| v.as_f64()) {
        layout.node_diameter = v as f32;
    }
    if let Some(v) = map.get("horizontalSpacing").and_then(|v| v.as_f64()) {
        layout.horizontal_spacing = Some(v as f32);
    }
    if let Some(v) = map.get("verticalSpacing").and_then(|v| v.as_f64()) {
        layout.vertical_spacing = Some(v as f32);
    }
    // json5 hands numbers over as floats, so accept either representation.
    if let Some(v) = map
        .get("maxIterations")
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f as u64)))
    {
        layout.max_iterations = v as u32;
    }
}
