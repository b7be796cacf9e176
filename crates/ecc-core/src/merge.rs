//! Backup-protected deep merge of a JSON fragment into a config document.
//!
//! Sequence for an existing destination:
//!   1. copy it to `<path>.bak` and verify the copy (abort on failure)
//!   2. parse, capture preserved values, deep-merge, resolve placeholders
//!   3. write through a temp file in the same directory, rename into place
//!   4. put preserved values back and persist again if anything changed
//!
//! A failure in 2-4 restores the destination from the backup. The backup is
//! never removed.

use crate::error::{EccError, Result};
use crate::io;
use crate::json_path::JsonPath;
use crate::placeholder::{resolve_placeholders, Placeholder, PlaceholderReport};
use crate::preserve::{
    apply_preserved, PreservationReport, PreservationRule, PreservationStatus,
};
use serde::Serialize;
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Objects merge key by key; anything else in `overlay` replaces `base`.
/// Arrays are replaced, never appended.
pub fn deep_merge(base: &Value, overlay: &Value) -> Value {
    match (base, overlay) {
        (Value::Object(base_obj), Value::Object(overlay_obj)) => {
            let mut merged = base_obj.clone();
            for (key, value) in overlay_obj {
                let next = match base_obj.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), next);
            }
            Value::Object(merged)
        }
        _ => overlay.clone(),
    }
}

#[derive(Debug, Serialize)]
pub struct MergeOutcome {
    pub destination: PathBuf,
    /// The destination did not exist and was written from the fragment.
    pub created: bool,
    pub backup: Option<PathBuf>,
    pub preserved: Vec<PreservationReport>,
    pub placeholders: Vec<PlaceholderReport>,
}

impl MergeOutcome {
    pub fn preservation(&self, path: &JsonPath) -> Option<&PreservationStatus> {
        self.preserved
            .iter()
            .find(|r| &r.path == path)
            .map(|r| &r.status)
    }
}

#[derive(Debug)]
pub struct ConfigMerger {
    destination: PathBuf,
    only_keys: Vec<String>,
    rules: Vec<PreservationRule>,
    placeholders: Vec<Placeholder>,
}

impl ConfigMerger {
    pub fn new(destination: impl Into<PathBuf>) -> Self {
        Self {
            destination: destination.into(),
            only_keys: Vec::new(),
            rules: Vec::new(),
            placeholders: Vec::new(),
        }
    }

    /// Merge only these top-level keys of the fragment.
    pub fn only_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.only_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn preserve(mut self, rules: Vec<PreservationRule>) -> Self {
        self.rules = rules;
        self
    }

    pub fn placeholders(mut self, placeholders: Vec<Placeholder>) -> Self {
        self.placeholders = placeholders;
        self
    }

    pub fn merge(&self, fragment: &Value) -> Result<MergeOutcome> {
        let Some(fragment_obj) = fragment.as_object() else {
            return Err(EccError::FragmentInvalid {
                path: PathBuf::from("<inline>"),
                reason: "root must be a JSON object".to_string(),
            });
        };
        let incoming = Value::Object(self.project(fragment_obj));

        if !self.destination.exists() {
            return self.create(incoming);
        }

        let original = std::fs::read(&self.destination).map_err(|e| EccError::BackupFailed {
            path: self.destination.clone(),
            reason: format!("cannot read destination: {e}"),
        })?;
        let backup = io::create_backup(&self.destination, &original)?;
        tracing::debug!(destination = %self.destination.display(), "backup created");

        match self.merge_existing(&original, &incoming) {
            Ok((preserved, placeholders)) => Ok(MergeOutcome {
                destination: self.destination.clone(),
                created: false,
                backup: Some(backup),
                preserved,
                placeholders,
            }),
            Err(e) => {
                let mut reason = match e {
                    EccError::MergeFailed { reason, .. } => reason,
                    other => other.to_string(),
                };
                if let Err(restore) = io::restore_backup(&self.destination) {
                    reason.push_str(&format!("; restoring from backup also failed: {restore}"));
                } else {
                    tracing::warn!(destination = %self.destination.display(), "merge failed, restored from backup");
                }
                Err(EccError::MergeFailed {
                    path: self.destination.clone(),
                    reason,
                })
            }
        }
    }

    fn project(&self, fragment: &Map<String, Value>) -> Map<String, Value> {
        if self.only_keys.is_empty() {
            return fragment.clone();
        }
        fragment
            .iter()
            .filter(|(k, _)| self.only_keys.iter().any(|only| only == *k))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    fn create(&self, mut doc: Value) -> Result<MergeOutcome> {
        let placeholders = resolve_placeholders(&mut doc, &self.placeholders);
        let preserved = self
            .rules
            .iter()
            .map(|rule| PreservationReport {
                path: rule.path.clone(),
                status: PreservationStatus::Absent,
            })
            .collect();

        io::write_json(&self.destination, &doc).map_err(|e| EccError::MergeFailed {
            path: self.destination.clone(),
            reason: e.to_string(),
        })?;
        tracing::debug!(destination = %self.destination.display(), "created from fragment");

        Ok(MergeOutcome {
            destination: self.destination.clone(),
            created: true,
            backup: None,
            preserved,
            placeholders,
        })
    }

    fn merge_existing(
        &self,
        original: &[u8],
        incoming: &Value,
    ) -> Result<(Vec<PreservationReport>, Vec<PlaceholderReport>)> {
        let existing = io::parse_document(original).map_err(|e| EccError::MergeFailed {
            path: self.destination.clone(),
            reason: format!("existing document is not valid JSON: {e}"),
        })?;
        if !existing.is_object() {
            return Err(EccError::MergeFailed {
                path: self.destination.clone(),
                reason: "existing document root is not a JSON object".to_string(),
            });
        }

        let preserved: Vec<PreservationReport> = self
            .rules
            .iter()
            .map(|rule| PreservationReport {
                path: rule.path.clone(),
                status: rule.evaluate(&existing),
            })
            .collect();

        let mut merged = deep_merge(&existing, incoming);
        let placeholders = resolve_placeholders(&mut merged, &self.placeholders);
        io::write_json(&self.destination, &merged)?;

        if apply_preserved(&mut merged, &preserved)? {
            io::write_json(&self.destination, &merged)?;
            tracing::debug!(destination = %self.destination.display(), "preserved fields restored");
        }

        Ok((preserved, placeholders))
    }
}
