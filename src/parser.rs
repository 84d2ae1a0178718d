use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Deserialize;

use crate::records::{AffectedStatus, PedigreeRecord, Sex};

/// Inline option directive, e.g. `#!{nodeDiameter: 30}`. JSON5 so bare keys
/// and trailing commas work.
static DIRECTIVE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"^#!\s*(\{.*\})\s*$").unwrap());
/// Column header some exports carry as the first row.
static HEADER_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)^\s*fam(ily)?(_?id)?\b").unwrap());
static FIELD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,\s]+").unwrap());

#[derive(Debug, Clone, Default)]
pub struct ParsedPedigree {
    pub records: Vec<PedigreeRecord>,
    /// Raw JSON value from a `#!{...}` directive or a JSON document's
    /// `options` member; applied via `config::apply_overrides`.
    pub overrides: Option<serde_json::Value>,
}

/// Parses pedigree records from either linkage-PED style text
/// (`family individual father mother sex affected [deceased]`, whitespace or
/// comma separated, `0`/`-` for a missing parent, `#` comments) or a JSON
/// document (an array of records, or `{"records": [...], "options": {...}}`).
pub fn parse_pedigree(input: &str) -> Result<ParsedPedigree> {
    let trimmed = input.trim_start();
    if trimmed.starts_with('[') || trimmed.starts_with('{') {
        return parse_json(trimmed);
    }
    parse_ped(input)
}

#[derive(Debug, Deserialize)]
struct JsonDocument {
    records: Vec<PedigreeRecord>,
    #[serde(default)]
    options: Option<serde_json::Value>,
}

fn parse_json(input: &str) -> Result<ParsedPedigree> {
    if input.starts_with('[') {
        let records: Vec<PedigreeRecord> =
            serde_json::from_str(input).context("invalid pedigree record array")?;
        return Ok(ParsedPedigree {
            records,
            overrides: None,
        });
    }
    let document: JsonDocument = serde_json::from_str(input).context("invalid pedigree document")?;
    Ok(ParsedPedigree {
        records: document.records,
        overrides: document.options,
    })
}

fn parse_ped(input: &str) -> Result<ParsedPedigree> {
    let mut parsed = ParsedPedigree::default();
    for (line_no, raw) in input.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }
        if let Some(caps) = DIRECTIVE_RE.captures(line) {
            let value: serde_json::Value = json5::from_str(&caps[1])
                .with_context(|| format!("line {}: invalid option directive", line_no + 1))?;
            parsed.overrides = Some(value);
            continue;
        }
        if line.starts_with('#') || HEADER_RE.is_match(line) {
            continue;
        }

        let fields: Vec<&str> = FIELD_RE.split(line).filter(|f| !f.is_empty()).collect();
        if fields.len() < 2 {
            bail!(
                "line {}: expected at least family and individual ids, got {line:?}",
                line_no + 1
            );
        }
        let mut record = PedigreeRecord::new(fields[0], fields[1]);
        record.paternal_id = parse_parent(fields.get(2));
        record.maternal_id = parse_parent(fields.get(3));
        record.sex = fields.get(4).map_or(Sex::Unknown, |f| parse_sex(f));
        record.affected = fields
            .get(5)
            .map_or(AffectedStatus::Unknown, |f| parse_affected(f));
        record.deceased = fields.get(6).map(|f| parse_flag(f));
        parsed.records.push(record);
    }
    Ok(parsed)
}

fn parse_parent(field: Option<&&str>) -> Option<String> {
    let field = *field?;
    if matches!(field, "0" | "-" | ".") {
        return None;
    }
    Some(field.to_string())
}

fn parse_sex(field: &str) -> Sex {
    if let Ok(code) = field.parse::<u8>() {
        return Sex::from_code(code);
    }
    match field.to_ascii_lowercase().as_str() {
        "m" | "male" => Sex::Male,
        "f" | "female" => Sex::Female,
        _ => Sex::Unknown,
    }
}

fn parse_affected(field: &str) -> AffectedStatus {
    if let Ok(code) = field.parse::<u8>() {
        return AffectedStatus::from_code(code);
    }
    AffectedStatus::Unknown
}

fn parse_flag(field: &str) -> bool {
    matches!(
        field.to_ascii_lowercase().as_str(),
        "1" | "y" | "yes" | "true"
    )
}
