use pedigree_layout::layout_dump::LayoutDump;
use pedigree_layout::{LayoutConfig, PedigreeRecord, compute_layout};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct WasmLayoutOptions {
    node_diameter: Option<f32>,
    horizontal_spacing: Option<f32>,
    vertical_spacing: Option<f32>,
    max_iterations: Option<u32>,
}

fn build_layout_config(options: WasmLayoutOptions) -> LayoutConfig {
    let mut config = LayoutConfig::default();
    if let Some(diameter) = options.node_diameter {
        config.node_diameter = diameter;
    }
    if let Some(spacing) = options.horizontal_spacing {
        config.horizontal_spacing = Some(spacing);
    }
    if let Some(spacing) = options.vertical_spacing {
        config.vertical_spacing = Some(spacing);
    }
    if let Some(cap) = options.max_iterations {
        config.max_iterations = cap;
    }
    config
}

/// Takes a JSON array of pedigree records plus optional layout options and
/// returns the layout dump JSON the browser-side renderer draws from.
#[wasm_bindgen]
pub fn layout_pedigree(records_json: &str, options_json: Option<String>) -> Result<String, JsValue> {
    let records: Vec<PedigreeRecord> = serde_json::from_str(records_json)
        .map_err(|error| JsValue::from_str(&error.to_string()))?;
    let options = if let Some(raw_options) = options_json {
        serde_json::from_str::<WasmLayoutOptions>(&raw_options)
            .map_err(|error| JsValue::from_str(&error.to_string()))?
    } else {
        WasmLayoutOptions::default()
    };

    let config = build_layout_config(options);
    let layout =
        compute_layout(&records, &config).map_err(|error| JsValue::from_str(&error.to_string()))?;
    serde_json::to_string(&LayoutDump::from_layout(&layout))
        .map_err(|error| JsValue::from_str(&error.to_string()))
}
