//! Placeholder tokens and fragment variables.
//!
//! Placeholders (`YOUR_GITHUB_PAT_HERE`) are resolved after a merge: only
//! string values equal to the token are replaced, never keys or substrings.
//! Variables (`${CLAUDE_PLUGIN_ROOT}`) are expanded inside fragment strings
//! when the fragment is loaded.

use crate::credentials::CredentialSource;
use crate::json_path::JsonPath;
use serde::Serialize;
use serde_json::Value;

pub const GITHUB_TOKEN_PLACEHOLDER: &str = "YOUR_GITHUB_PAT_HERE";
pub const FILESYSTEM_PATH_PLACEHOLDER: &str = "YOUR_FILESYSTEM_PATH_HERE";
pub const PLUGIN_ROOT_VAR: &str = "${CLAUDE_PLUGIN_ROOT}";

pub struct Placeholder {
    pub token: String,
    pub source: Box<dyn CredentialSource>,
    /// When non-empty, only these subtrees are searched.
    pub paths: Vec<JsonPath>,
}

impl Placeholder {
    pub fn new(token: impl Into<String>, source: impl CredentialSource + 'static) -> Self {
        Self {
            token: token.into(),
            source: Box::new(source),
            paths: Vec::new(),
        }
    }

    pub fn scoped_to(mut self, paths: Vec<JsonPath>) -> Self {
        self.paths = paths;
        self
    }
}

impl std::fmt::Debug for Placeholder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Placeholder")
            .field("token", &self.token)
            .field("source", &self.source.describe())
            .field("paths", &self.paths)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PlaceholderStatus {
    NotPresent,
    Filled { replaced: usize },
    Unresolved,
}

#[derive(Debug, Clone, Serialize)]
pub struct PlaceholderReport {
    pub token: String,
    pub source: String,
    #[serde(flatten)]
    pub status: PlaceholderStatus,
}

/// Resolve every placeholder in `doc`. Lookups happen only for tokens that
/// are actually present, and a failed lookup leaves the token in place.
pub fn resolve_placeholders(doc: &mut Value, placeholders: &[Placeholder]) -> Vec<PlaceholderReport> {
    placeholders
        .iter()
        .map(|p| {
            let status = resolve_one(doc, p);
            PlaceholderReport {
                token: p.token.clone(),
                source: p.source.describe(),
                status,
            }
        })
        .collect()
}

fn resolve_one(doc: &mut Value, placeholder: &Placeholder) -> PlaceholderStatus {
    if count_in_scope(doc, placeholder) == 0 {
        return PlaceholderStatus::NotPresent;
    }

    let value = match placeholder.source.lookup() {
        Ok(Some(value)) => value,
        Ok(None) => {
            tracing::debug!(token = %placeholder.token, "no credential available");
            return PlaceholderStatus::Unresolved;
        }
        Err(e) => {
            tracing::warn!(token = %placeholder.token, error = %e, "credential lookup failed");
            return PlaceholderStatus::Unresolved;
        }
    };

    if placeholder.paths.is_empty() {
        let replaced = replace_exact(doc, &placeholder.token, &value);
        return PlaceholderStatus::Filled { replaced };
    }
    let mut replaced = 0;
    for path in &placeholder.paths {
        if let Some(subtree) = path.get_mut(doc) {
            replaced += replace_exact(subtree, &placeholder.token, &value);
        }
    }
    PlaceholderStatus::Filled { replaced }
}

fn count_in_scope(doc: &Value, placeholder: &Placeholder) -> usize {
    if placeholder.paths.is_empty() {
        return count_exact(doc, &placeholder.token);
    }
    placeholder
        .paths
        .iter()
        .filter_map(|path| path.get(doc))
        .map(|subtree| count_exact(subtree, &placeholder.token))
        .sum()
}

fn count_exact(value: &Value, token: &str) -> usize {
    match value {
        Value::String(s) => usize::from(s == token),
        Value::Array(items) => items.iter().map(|v| count_exact(v, token)).sum(),
        Value::Object(obj) => obj.values().map(|v| count_exact(v, token)).sum(),
        _ => 0,
    }
}

fn replace_exact(value: &mut Value, token: &str, replacement: &str) -> usize {
    match value {
        Value::String(s) if s == token => {
            *s = replacement.to_string();
            1
        }
        Value::Array(items) => items
            .iter_mut()
            .map(|v| replace_exact(v, token, replacement))
            .sum(),
        Value::Object(obj) => obj
            .values_mut()
            .map(|v| replace_exact(v, token, replacement))
            .sum(),
        _ => 0,
    }
}

/// Expand `(name, value)` variables inside every string value of `fragment`.
pub fn expand_variables(fragment: &mut Value, vars: &[(String, String)]) {
    match fragment {
        Value::String(s) => {
            for (name, value) in vars {
                if s.contains(name.as_str()) {
                    *s = s.replace(name.as_str(), value);
                }
            }
        }
        Value::Array(items) => items.iter_mut().for_each(|v| expand_variables(v, vars)),
        Value::Object(obj) => obj.values_mut().for_each(|v| expand_variables(v, vars)),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credentials::StaticCredential;
    use crate::error::{EccError, Result};
    use serde_json::json;

    struct FailingSource;

    impl CredentialSource for FailingSource {
        fn describe(&self) -> String {
            "failing".into()
        }

        fn lookup(&self) -> Result<Option<String>> {
            Err(EccError::CredentialLookupFailed {
                source_name: "failing".into(),
                reason: "boom".into(),
            })
        }
    }

    struct PanicSource;

    impl CredentialSource for PanicSource {
        fn describe(&self) -> String {
            "panic".into()
        }

        fn lookup(&self) -> Result<Option<String>> {
            panic!("lookup must not run when the token is absent");
        }
    }

    fn github(value: Option<&str>) -> Placeholder {
        Placeholder::new(
            GITHUB_TOKEN_PLACEHOLDER,
            StaticCredential(value.map(String::from)),
        )
    }

    #[test]
    fn fills_exact_matches_everywhere() {
        let mut doc = json!({
            "mcpServers": {"github": {"env": {"GITHUB_PERSONAL_ACCESS_TOKEN": "YOUR_GITHUB_PAT_HERE"}}},
            "notes": ["YOUR_GITHUB_PAT_HERE"]
        });
        let reports = resolve_placeholders(&mut doc, &[github(Some("ghp_test123"))]);

        assert_eq!(reports[0].status, PlaceholderStatus::Filled { replaced: 2 });
        assert_eq!(
            doc["mcpServers"]["github"]["env"]["GITHUB_PERSONAL_ACCESS_TOKEN"],
            "ghp_test123"
        );
        assert_eq!(doc["notes"][0], "ghp_test123");
    }

    #[test]
    fn never_touches_substrings_or_keys() {
        let mut doc = json!({
            "YOUR_GITHUB_PAT_HERE": "key stays",
            "comment": "replace YOUR_GITHUB_PAT_HERE with a token"
        });
        let before = doc.clone();
        let reports = resolve_placeholders(&mut doc, &[github(Some("ghp_test123"))]);

        assert_eq!(reports[0].status, PlaceholderStatus::NotPresent);
        assert_eq!(doc, before);
    }

    #[test]
    fn scoped_placeholder_only_touches_its_paths() {
        let mut doc = json!({
            "mcpServers": {"github": {"env": {"TOKEN": "YOUR_GITHUB_PAT_HERE"}}},
            "unrelated": "YOUR_GITHUB_PAT_HERE"
        });
        let placeholder = github(Some("ghp_scoped"))
            .scoped_to(vec!["mcpServers.github".parse().unwrap()]);
        let reports = resolve_placeholders(&mut doc, &[placeholder]);

        assert_eq!(reports[0].status, PlaceholderStatus::Filled { replaced: 1 });
        assert_eq!(doc["mcpServers"]["github"]["env"]["TOKEN"], "ghp_scoped");
        assert_eq!(doc["unrelated"], "YOUR_GITHUB_PAT_HERE");
    }

    #[test]
    fn missing_credential_leaves_token() {
        let mut doc = json!({"token": "YOUR_GITHUB_PAT_HERE"});
        let reports = resolve_placeholders(&mut doc, &[github(None)]);
        assert_eq!(reports[0].status, PlaceholderStatus::Unresolved);
        assert_eq!(doc["token"], "YOUR_GITHUB_PAT_HERE");
    }

    #[test]
    fn failed_lookup_is_not_fatal() {
        let mut doc = json!({"token": "YOUR_GITHUB_PAT_HERE"});
        let reports = resolve_placeholders(
            &mut doc,
            &[Placeholder::new(GITHUB_TOKEN_PLACEHOLDER, FailingSource)],
        );
        assert_eq!(reports[0].status, PlaceholderStatus::Unresolved);
        assert_eq!(doc["token"], "YOUR_GITHUB_PAT_HERE");
    }

    #[test]
    fn absent_token_skips_lookup() {
        let mut doc = json!({"token": "already-set"});
        let reports = resolve_placeholders(
            &mut doc,
            &[Placeholder::new(GITHUB_TOKEN_PLACEHOLDER, PanicSource)],
        );
        assert_eq!(reports[0].status, PlaceholderStatus::NotPresent);
    }

    #[test]
    fn expands_variables_inside_strings() {
        let mut fragment = json!({
            "hooks": {"PreToolUse": [{"hooks": [{"command": "node \"${CLAUDE_PLUGIN_ROOT}/scripts/test.js\""}]}]}
        });
        expand_variables(
            &mut fragment,
            &[(PLUGIN_ROOT_VAR.to_string(), "/opt/ecc".to_string())],
        );
        assert_eq!(
            fragment["hooks"]["PreToolUse"][0]["hooks"][0]["command"],
            "node \"/opt/ecc/scripts/test.js\""
        );
    }

    #[test]
    fn expanded_windows_path_stays_valid_json() {
        let mut fragment = json!({"command": "${CLAUDE_PLUGIN_ROOT}\\run.js"});
        expand_variables(
            &mut fragment,
            &[(PLUGIN_ROOT_VAR.to_string(), r"C:\Users\dev\ecc".to_string())],
        );
        let text = serde_json::to_string(&fragment).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(back["command"], r"C:\Users\dev\ecc\run.js");
    }
}
