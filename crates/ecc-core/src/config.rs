//! Bundle manifest: optional `ecc.yaml` at the root of the source directory.
//!
//! Every field has a default matching the stock bundle, so a missing file or
//! a partial one is fine.

use crate::credentials::{CommandCredential, EnvCredential, DEFAULT_LOOKUP_TIMEOUT};
use crate::error::{EccError, Result};
use crate::json_path::JsonPath;
use crate::paths;
use crate::placeholder::{
    Placeholder, FILESYSTEM_PATH_PLACEHOLDER, GITHUB_TOKEN_PLACEHOLDER, PLUGIN_ROOT_VAR,
};
use crate::preserve::{Check, PreservationRule};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

// ---------------------------------------------------------------------------
// CredentialConfig
// ---------------------------------------------------------------------------

/// Where a placeholder's value comes from. Exactly one field must be set.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CredentialConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub command: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub env: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

// ---------------------------------------------------------------------------
// PlaceholderConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceholderConfig {
    pub token: String,
    pub source: CredentialConfig,
    /// Restrict replacement to these subtrees. Empty means the whole document.
    #[serde(default)]
    pub paths: Vec<JsonPath>,
}

impl PlaceholderConfig {
    pub fn build(&self) -> Result<Placeholder> {
        let invalid =
            |reason: &str| EccError::InvalidConfig(format!("placeholder '{}': {reason}", self.token));
        let placeholder = match (&self.source.command, &self.source.env) {
            (Some(command), None) => {
                let (program, args) = command
                    .split_first()
                    .ok_or_else(|| invalid("command must not be empty"))?;
                let timeout = self
                    .source
                    .timeout_secs
                    .map(Duration::from_secs)
                    .unwrap_or(DEFAULT_LOOKUP_TIMEOUT);
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                Placeholder::new(
                    self.token.clone(),
                    CommandCredential::new(program.clone(), &args).with_timeout(timeout),
                )
            }
            (None, Some(var)) => {
                Placeholder::new(self.token.clone(), EnvCredential { var: var.clone() })
            }
            _ => return Err(invalid("source needs exactly one of `command` or `env`")),
        };
        Ok(placeholder.scoped_to(self.paths.clone()))
    }
}

// ---------------------------------------------------------------------------
// BundleConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BundleConfig {
    /// Hook definitions merged into `settings.json`, relative to the source dir.
    pub hooks_fragment: PathBuf,
    /// MCP server definitions merged into `~/.claude.json`.
    pub mcp_fragment: PathBuf,
    /// Variable expanded to the source directory inside fragment strings.
    pub plugin_root_var: String,
    /// Tools that must be on PATH before anything is merged.
    pub requires: Vec<String>,
    pub placeholders: Vec<PlaceholderConfig>,
    /// Applied to the MCP merge.
    pub preserve: Vec<PreservationRule>,
    /// Where the filesystem MCP server takes its directory argument.
    pub filesystem_path: JsonPath,
}

impl Default for BundleConfig {
    fn default() -> Self {
        let filesystem_path = default_filesystem_path();
        Self {
            hooks_fragment: PathBuf::from(paths::HOOKS_FRAGMENT),
            mcp_fragment: PathBuf::from(paths::MCP_FRAGMENT),
            plugin_root_var: PLUGIN_ROOT_VAR.to_string(),
            requires: Vec::new(),
            placeholders: vec![PlaceholderConfig {
                token: GITHUB_TOKEN_PLACEHOLDER.to_string(),
                source: CredentialConfig {
                    command: Some(vec!["gh".into(), "auth".into(), "token".into()]),
                    ..CredentialConfig::default()
                },
                paths: vec![builtin_path(paths::MCP_SERVERS_KEY)],
            }],
            preserve: vec![PreservationRule::new(filesystem_path.clone(), Check::ExistingDir)
                .unless(FILESYSTEM_PATH_PLACEHOLDER)],
            filesystem_path,
        }
    }
}

fn default_filesystem_path() -> JsonPath {
    builtin_path(paths::FILESYSTEM_ARG_PATH)
}

fn builtin_path(raw: &str) -> JsonPath {
    raw.parse()
        .unwrap_or_else(|e| unreachable!("built-in path must parse: {e}"))
}

impl BundleConfig {
    /// Load `<src>/ecc.yaml`, or the defaults when it does not exist.
    pub fn load(src: &Path) -> Result<Self> {
        let path = paths::bundle_config_path(src);
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(&path)?;
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(&content)?)
    }

    pub fn hooks_fragment_path(&self, src: &Path) -> PathBuf {
        src.join(&self.hooks_fragment)
    }

    pub fn mcp_fragment_path(&self, src: &Path) -> PathBuf {
        src.join(&self.mcp_fragment)
    }

    pub fn build_placeholders(&self) -> Result<Vec<Placeholder>> {
        self.placeholders.iter().map(PlaceholderConfig::build).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_gives_defaults() {
        let dir = TempDir::new().unwrap();
        let config = BundleConfig::load(dir.path()).unwrap();
        assert_eq!(config.hooks_fragment, PathBuf::from("hooks/hooks.json"));
        assert_eq!(config.mcp_fragment, PathBuf::from("mcp-configs/mcp-servers.json"));
        assert_eq!(config.plugin_root_var, "${CLAUDE_PLUGIN_ROOT}");
        assert!(config.requires.is_empty());
        assert_eq!(config.placeholders[0].token, "YOUR_GITHUB_PAT_HERE");
        assert_eq!(config.preserve[0].check, Check::ExistingDir);
        assert_eq!(config.filesystem_path.to_string(), "mcpServers.filesystem.args[-1]");
    }

    #[test]
    fn default_placeholder_uses_gh_cli() {
        let placeholders = BundleConfig::default().build_placeholders().unwrap();
        assert_eq!(placeholders[0].source.describe(), "gh auth token");
    }

    #[test]
    fn default_placeholder_is_scoped_to_mcp_servers() {
        let config = BundleConfig::default();
        let scope: Vec<String> = config.placeholders[0]
            .paths
            .iter()
            .map(ToString::to_string)
            .collect();
        assert_eq!(scope, vec!["mcpServers"]);

        let placeholders = config.build_placeholders().unwrap();
        assert_eq!(placeholders[0].paths, config.placeholders[0].paths);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ecc.yaml"),
            "requires: [jq]\nplaceholders:\n  - token: YOUR_API_KEY\n    source:\n      env: MY_API_KEY\n    paths: [mcpServers.api]\n",
        )
        .unwrap();

        let config = BundleConfig::load(dir.path()).unwrap();
        assert_eq!(config.requires, vec!["jq".to_string()]);
        assert_eq!(config.placeholders.len(), 1);
        assert_eq!(config.placeholders[0].source.env.as_deref(), Some("MY_API_KEY"));
        assert_eq!(config.hooks_fragment, PathBuf::from("hooks/hooks.json"));

        let built = config.build_placeholders().unwrap();
        assert_eq!(built[0].source.describe(), "$MY_API_KEY");
        assert_eq!(built[0].paths.len(), 1);
    }

    #[test]
    fn preserve_rules_parse_from_yaml() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("ecc.yaml"),
            "preserve:\n  - path: model\n    check: non_empty\n",
        )
        .unwrap();

        let config = BundleConfig::load(dir.path()).unwrap();
        assert_eq!(config.preserve[0].path.to_string(), "model");
        assert_eq!(config.preserve[0].check, Check::NonEmpty);
    }

    #[test]
    fn placeholder_with_two_sources_is_rejected() {
        let config = PlaceholderConfig {
            token: "T".into(),
            source: CredentialConfig {
                command: Some(vec!["gh".into()]),
                env: Some("X".into()),
                timeout_secs: None,
            },
            paths: Vec::new(),
        };
        assert!(config.build().is_err());
    }

    #[test]
    fn bad_yaml_is_an_error() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("ecc.yaml"), "requires: {not: [a list").unwrap();
        assert!(BundleConfig::load(dir.path()).is_err());
    }
}
