//! The bundle's two merges: hook definitions into `settings.json` and MCP
//! server definitions into `~/.claude.json`.

use crate::config::BundleConfig;
use crate::error::Result;
use crate::fragment::load_fragment;
use crate::io;
use crate::json_path::JsonPath;
use crate::merge::{ConfigMerger, MergeOutcome};
use crate::paths;
use crate::placeholder::FILESYSTEM_PATH_PLACEHOLDER;
use crate::preserve::PreservationStatus;
use serde_json::Value;
use std::path::Path;

fn fragment_vars(src: &Path, config: &BundleConfig) -> Vec<(String, String)> {
    vec![(
        config.plugin_root_var.clone(),
        src.to_string_lossy().into_owned(),
    )]
}

/// Merge the hooks fragment into `<dest>/settings.json`.
/// Returns `None` when the bundle has no hooks fragment.
pub fn merge_hooks(src: &Path, dest: &Path, config: &BundleConfig) -> Result<Option<MergeOutcome>> {
    let fragment_path = config.hooks_fragment_path(src);
    if !fragment_path.is_file() {
        tracing::debug!(path = %fragment_path.display(), "no hooks fragment");
        return Ok(None);
    }
    let fragment = load_fragment(&fragment_path, &fragment_vars(src, config))?;
    ConfigMerger::new(paths::settings_path(dest))
        .merge(&fragment)
        .map(Some)
}

/// Merge the fragment's `mcpServers` into `claude_json`, leaving every other
/// top-level key alone. Returns `None` when the bundle has no MCP fragment.
pub fn merge_mcp_servers(
    src: &Path,
    claude_json: &Path,
    config: &BundleConfig,
) -> Result<Option<MergeOutcome>> {
    let fragment_path = config.mcp_fragment_path(src);
    if !fragment_path.is_file() {
        tracing::debug!(path = %fragment_path.display(), "no MCP fragment");
        return Ok(None);
    }
    let fragment = load_fragment(&fragment_path, &fragment_vars(src, config))?;
    ConfigMerger::new(claude_json)
        .only_keys([paths::MCP_SERVERS_KEY])
        .preserve(config.preserve.clone())
        .placeholders(config.build_placeholders()?)
        .merge(&fragment)
        .map(Some)
}

/// What the MCP merge found at the filesystem server's directory argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FilesystemPath {
    /// A previously configured directory that still exists and was kept.
    Preserved(String),
    /// A previously configured directory that no longer exists.
    Stale(String),
    Unset,
}

pub fn filesystem_state(outcome: &MergeOutcome, path: &JsonPath) -> FilesystemPath {
    match outcome.preservation(path) {
        Some(PreservationStatus::Restored { value }) => match value {
            Value::String(s) => FilesystemPath::Preserved(s.clone()),
            other => FilesystemPath::Preserved(other.to_string()),
        },
        Some(PreservationStatus::Invalid { previous }) => match previous.as_str() {
            Some(s) if s != FILESYSTEM_PATH_PLACEHOLDER && !s.is_empty() => {
                FilesystemPath::Stale(s.to_string())
            }
            _ => FilesystemPath::Unset,
        },
        _ => FilesystemPath::Unset,
    }
}

/// Point the filesystem MCP server at `dir`: replaces the last argument,
/// appending when there are none and creating the entry if needed.
pub fn set_filesystem_path(claude_json: &Path, path: &JsonPath, dir: &Path) -> Result<()> {
    let mut doc = io::read_json(claude_json)?;
    path.set(&mut doc, Value::String(dir.to_string_lossy().into_owned()))?;
    io::write_json(claude_json, &doc)
}
