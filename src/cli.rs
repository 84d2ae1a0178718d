use crate::config::{apply_overrides, load_config};
use crate::layout::compute_layout;
use crate::layout_dump::{LayoutDump, write_layout_dump};
use crate::parser::parse_pedigree;
use crate::records::PedigreeRecord;
use anyhow::Result;
use clap::Parser;
use log::warn;
use std::io::{self, Read};
use std::path::{Path, PathBuf};

#[derive(Parser, Debug)]
#[command(
    name = "pedlay",
    version,
    about = "Pedigree chart layout: PED or JSON records in, layout geometry JSON out"
)]
pub struct Args {
    /// Input file (.ped or .json) or '-' for stdin
    #[arg(short = 'i', long = "input")]
    pub input: Option<PathBuf>,

    /// Output file for the layout JSON. Defaults to stdout.
    #[arg(short = 'o', long = "output")]
    pub output: Option<PathBuf>,

    /// Config JSON file with layout options
    #[arg(short = 'c', long = "configFile")]
    pub config: Option<PathBuf>,

    /// Family to lay out when the input holds several. Defaults to the first
    /// family id seen.
    #[arg(short = 'f', long = "family")]
    pub family: Option<String>,

    /// Marker diameter in pixels; spacing defaults derive from it
    #[arg(short = 'd', long = "nodeDiameter")]
    pub node_diameter: Option<f32>,
}

pub fn run() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default()).init();
    let args = Args::parse();
    let mut config = load_config(args.config.as_deref())?;

    let input = read_input(args.input.as_deref())?;
    let parsed = parse_pedigree(&input)?;
    if let Some(overrides) = &parsed.overrides {
        apply_overrides(&mut config.layout, overrides);
    }
    if let Some(diameter) = args.node_diameter {
        config.layout.node_diameter = diameter;
    }

    let records = select_family(parsed.records, args.family.as_deref())?;
    let layout = compute_layout(&records, &config.layout)?;
    if !layout.dropped.is_empty() {
        warn!(
            "{} individual(s) could not be placed: {}",
            layout.dropped.len(),
            layout.dropped.join(", ")
        );
    }

    match &args.output {
        Some(path) => write_layout_dump(path, &layout)?,
        None => println!("{}", LayoutDump::from_layout(&layout).to_json_string()?),
    }
    Ok(())
}

fn read_input(path: Option<&Path>) -> Result<String> {
    if let Some(path) = path
        && path != Path::new("-")
    {
        return Ok(std::fs::read_to_string(path)?);
    }
    let mut buf = String::new();
    io::stdin().read_to_string(&mut buf)?;
    Ok(buf)
}

/// One layout call covers one family. Records from other families are
/// filtered out up front so their ids cannot dangle into this pedigree.
fn select_family(
    records: Vec<PedigreeRecord>,
    family: Option<&str>,
) -> Result<Vec<PedigreeRecord>> {
    let Some(first) = records.first() else {
        return Ok(records);
    };
    let chosen = family.unwrap_or(first.family_id.as_str()).to_string();
    let selected: Vec<PedigreeRecord> = records
        .into_iter()
        .filter(|record| record.family_id == chosen)
        .collect();
    if selected.is_empty() {
        anyhow::bail!("no records found for family {chosen:?}");
    }
    Ok(selected)
}
