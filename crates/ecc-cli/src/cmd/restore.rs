use crate::output::print_json;
use anyhow::Context;
use ecc_core::io;
use std::path::Path;

pub fn run(destination: &Path, json: bool) -> anyhow::Result<()> {
    let backup = io::restore_backup(destination)
        .with_context(|| format!("cannot restore {}", destination.display()))?;

    if json {
        print_json(&serde_json::json!({
            "destination": destination,
            "backup": backup,
        }))?;
    } else {
        println!(
            "Restored {} from {}",
            destination.display(),
            backup.display()
        );
    }

    Ok(())
}
