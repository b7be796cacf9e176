use crate::error::{EccError, Result};
use crate::json_path::JsonPath;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::path::Path;
use std::str::FromStr;

/// Validity check a pre-merge value must pass to survive a merge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Check {
    /// A string naming an existing directory.
    ExistingDir,
    /// A string naming an existing regular file.
    ExistingFile,
    /// Not null, and not an empty string, array or object.
    NonEmpty,
    #[default]
    Any,
}

impl Check {
    pub fn accepts(&self, value: &Value) -> bool {
        match self {
            Check::ExistingDir => value.as_str().is_some_and(|s| Path::new(s).is_dir()),
            Check::ExistingFile => value.as_str().is_some_and(|s| Path::new(s).is_file()),
            Check::NonEmpty => match value {
                Value::Null => false,
                Value::String(s) => !s.is_empty(),
                Value::Array(a) => !a.is_empty(),
                Value::Object(o) => !o.is_empty(),
                _ => true,
            },
            Check::Any => true,
        }
    }
}

impl std::fmt::Display for Check {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Check::ExistingDir => write!(f, "existing_dir"),
            Check::ExistingFile => write!(f, "existing_file"),
            Check::NonEmpty => write!(f, "non_empty"),
            Check::Any => write!(f, "any"),
        }
    }
}

impl FromStr for Check {
    type Err = EccError;
    fn from_str(s: &str) -> Result<Self> {
        match s {
            "existing_dir" | "dir" => Ok(Check::ExistingDir),
            "existing_file" | "file" => Ok(Check::ExistingFile),
            "non_empty" => Ok(Check::NonEmpty),
            "any" => Ok(Check::Any),
            _ => Err(EccError::InvalidRule(s.to_string())),
        }
    }
}

/// Keep the destination's pre-merge value at `path` when it passes `check`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PreservationRule {
    pub path: JsonPath,
    #[serde(default)]
    pub check: Check,
    /// Values that never count as valid, e.g. the fragment's own placeholder.
    #[serde(default)]
    pub unless: Vec<String>,
}

impl PreservationRule {
    pub fn new(path: JsonPath, check: Check) -> Self {
        Self {
            path,
            check,
            unless: Vec::new(),
        }
    }

    pub fn unless(mut self, value: impl Into<String>) -> Self {
        self.unless.push(value.into());
        self
    }

    /// Decide, from the pre-merge document, what the post-merge pass must do.
    pub fn evaluate(&self, pre_merge: &Value) -> PreservationStatus {
        let Some(previous) = self.path.get(pre_merge) else {
            return PreservationStatus::Absent;
        };
        let excluded = previous
            .as_str()
            .is_some_and(|s| self.unless.iter().any(|u| u == s));
        if excluded || !self.check.accepts(previous) {
            return PreservationStatus::Invalid {
                previous: previous.clone(),
            };
        }
        PreservationStatus::Restored {
            value: previous.clone(),
        }
    }
}

/// `PATH` or `PATH=CHECK`, as accepted on the command line.
impl FromStr for PreservationRule {
    type Err = EccError;
    fn from_str(s: &str) -> Result<Self> {
        let (path, check) = match s.split_once('=') {
            Some((path, check)) => (path, check.parse::<Check>()?),
            None => (s, Check::Any),
        };
        let path = path
            .parse::<JsonPath>()
            .map_err(|_| EccError::InvalidRule(s.to_string()))?;
        Ok(Self::new(path, check))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PreservationStatus {
    Restored { value: Value },
    /// Nothing at the path before the merge.
    Absent,
    /// A previous value existed but failed the rule's check.
    Invalid { previous: Value },
}

impl PreservationStatus {
    pub fn is_skipped(&self) -> bool {
        !matches!(self, PreservationStatus::Restored { .. })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct PreservationReport {
    pub path: JsonPath,
    #[serde(flatten)]
    pub status: PreservationStatus,
}

/// Write every `Restored` value back into `doc`. Returns whether anything changed.
pub fn apply_preserved(doc: &mut Value, reports: &[PreservationReport]) -> Result<bool> {
    let mut changed = false;
    for report in reports {
        if let PreservationStatus::Restored { value } = &report.status {
            if report.path.get(doc) != Some(value) {
                report.path.set(doc, value.clone())?;
                changed = true;
            }
        }
    }
    Ok(changed)
}
