use crate::output::{print_json, Progress};
use anyhow::Context;
use ecc_core::fragment::load_fragment;
use ecc_core::preserve::PreservationRule;
use ecc_core::ConfigMerger;
use std::path::Path;

/// Parse `NAME=VALUE` into the `${NAME}` token and its replacement.
pub fn parse_var(s: &str) -> Result<(String, String), String> {
    let (name, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{s}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("variable name is empty in '{s}'"));
    }
    Ok((format!("${{{name}}}"), value.to_string()))
}

pub fn run(
    fragment_path: &Path,
    destination: &Path,
    keys: Vec<String>,
    preserve: Vec<PreservationRule>,
    vars: &[(String, String)],
    json: bool,
) -> anyhow::Result<()> {
    let fragment = load_fragment(fragment_path, vars)?;

    let mut merger = ConfigMerger::new(destination).preserve(preserve);
    if !keys.is_empty() {
        merger = merger.only_keys(keys);
    }
    let outcome = merger
        .merge(&fragment)
        .with_context(|| format!("failed to merge into {}", destination.display()))?;

    if json {
        print_json(&outcome)?;
    } else {
        let out = Progress::new(false);
        out.merged(&fragment_path.display().to_string(), &outcome);
        out.preserved(&outcome);
    }

    Ok(())
}
