use ecc_core::placeholder::PlaceholderStatus;
use ecc_core::preserve::PreservationStatus;
use ecc_core::MergeOutcome;
use serde::Serialize;
use std::fmt::Display;

pub fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(value)?;
    println!("{}", json);
    Ok(())
}

/// Human-readable progress lines; silent in `--json` mode so stdout stays parseable.
#[derive(Clone, Copy)]
pub struct Progress {
    quiet: bool,
}

impl Progress {
    pub fn new(json: bool) -> Self {
        Self { quiet: json }
    }

    pub fn line(&self, msg: impl Display) {
        if !self.quiet {
            println!("{msg}");
        }
    }

    pub fn section(&self, title: &str) {
        if !self.quiet {
            println!("\n=== {title} ===");
        }
    }

    /// Backup and write lines for one merge.
    pub fn merged(&self, what: &str, outcome: &MergeOutcome) {
        let dest = outcome.destination.display();
        match &outcome.backup {
            Some(bak) => self.line(format!("  Backed up: {dest} -> {}", bak.display())),
            None => self.line(format!("  Created: {dest}")),
        }
        self.line(format!("  Merged {what} into: {dest}"));
    }

    pub fn placeholders(&self, outcome: &MergeOutcome) {
        for report in &outcome.placeholders {
            match report.status {
                PlaceholderStatus::Filled { .. } => self.line(format!(
                    "  Auto-filled {} from {}",
                    report.token, report.source
                )),
                PlaceholderStatus::Unresolved => self.line(format!(
                    "  TIP: {} is still a placeholder ({} gave no value)",
                    report.token, report.source
                )),
                PlaceholderStatus::NotPresent => {}
            }
        }
    }

    pub fn preserved(&self, outcome: &MergeOutcome) {
        for report in &outcome.preserved {
            match &report.status {
                PreservationStatus::Restored { value } => {
                    self.line(format!("  Preserved {}: {value}", report.path))
                }
                PreservationStatus::Invalid { previous } => self.line(format!(
                    "  Not preserved {}: previous value {previous} failed its check",
                    report.path
                )),
                PreservationStatus::Absent => {}
            }
        }
    }
}
