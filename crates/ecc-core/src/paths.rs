use crate::error::{EccError, Result};
use std::path::{Path, PathBuf};

// ---------------------------------------------------------------------------
// Bundle layout (relative to the source directory)
// ---------------------------------------------------------------------------

pub const BUNDLE_CONFIG_FILE: &str = "ecc.yaml";
pub const HOOKS_DIR: &str = "hooks";
pub const HOOKS_FRAGMENT: &str = "hooks/hooks.json";
pub const MCP_FRAGMENT: &str = "mcp-configs/mcp-servers.json";

// ---------------------------------------------------------------------------
// User configuration layout
// ---------------------------------------------------------------------------

pub const CLAUDE_DIR: &str = ".claude";
pub const CLAUDE_JSON: &str = ".claude.json";
pub const SETTINGS_FILE: &str = "settings.json";

pub const MCP_SERVERS_KEY: &str = "mcpServers";
pub const FILESYSTEM_ARG_PATH: &str = "mcpServers.filesystem.args[-1]";

// ---------------------------------------------------------------------------
// Path helpers
// ---------------------------------------------------------------------------

pub fn bundle_config_path(src: &Path) -> PathBuf {
    src.join(BUNDLE_CONFIG_FILE)
}

pub fn settings_path(dest: &Path) -> PathBuf {
    dest.join(SETTINGS_FILE)
}

pub fn home_dir() -> Result<PathBuf> {
    home::home_dir().ok_or(EccError::HomeNotFound)
}

/// `~/.claude`
pub fn default_dest() -> Result<PathBuf> {
    Ok(home_dir()?.join(CLAUDE_DIR))
}

/// `~/.claude.json`
pub fn default_claude_json() -> Result<PathBuf> {
    Ok(home_dir()?.join(CLAUDE_JSON))
}

/// Expand a leading `~` to the home directory.
pub fn expand_tilde(input: &str) -> Result<PathBuf> {
    if input == "~" {
        return home_dir();
    }
    match input.strip_prefix("~/") {
        Some(rest) => Ok(home_dir()?.join(rest)),
        None => Ok(PathBuf::from(input)),
    }
}

/// Expand `~`, make absolute, and return the path only if it is a directory.
pub fn resolve_existing_dir(input: &str) -> Result<Option<PathBuf>> {
    let expanded = expand_tilde(input.trim())?;
    match expanded.canonicalize() {
        Ok(resolved) if resolved.is_dir() => Ok(Some(resolved)),
        _ => Ok(None),
    }
}

/// Walk upward from `start` looking for a directory that contains `hooks/`.
pub fn find_bundle_root(start: &Path) -> Option<PathBuf> {
    let mut dir = start.to_path_buf();
    loop {
        if dir.join(HOOKS_DIR).is_dir() {
            return Some(dir);
        }
        match dir.parent() {
            Some(p) => dir = p.to_path_buf(),
            None => return None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn path_helpers() {
        assert_eq!(
            settings_path(Path::new("/home/u/.claude")),
            PathBuf::from("/home/u/.claude/settings.json")
        );
        assert_eq!(
            bundle_config_path(Path::new("/opt/ecc")),
            PathBuf::from("/opt/ecc/ecc.yaml")
        );
    }

    #[test]
    fn expand_tilde_leaves_plain_paths() {
        assert_eq!(expand_tilde("/tmp/x").unwrap(), PathBuf::from("/tmp/x"));
        assert_eq!(expand_tilde("rel/x").unwrap(), PathBuf::from("rel/x"));
    }

    #[test]
    fn expand_tilde_uses_home() {
        let home = home_dir().unwrap();
        assert_eq!(expand_tilde("~/code").unwrap(), home.join("code"));
        assert_eq!(expand_tilde("~").unwrap(), home);
    }

    #[test]
    fn resolve_existing_dir_checks_existence() {
        let dir = TempDir::new().unwrap();
        let resolved = resolve_existing_dir(dir.path().to_str().unwrap()).unwrap();
        assert_eq!(resolved, Some(dir.path().canonicalize().unwrap()));

        let missing = dir.path().join("missing");
        assert_eq!(resolve_existing_dir(missing.to_str().unwrap()).unwrap(), None);

        let file = dir.path().join("file.txt");
        std::fs::write(&file, "x").unwrap();
        assert_eq!(resolve_existing_dir(file.to_str().unwrap()).unwrap(), None);
    }

    #[test]
    fn find_bundle_root_walks_upward() {
        let dir = TempDir::new().unwrap();
        std::fs::create_dir_all(dir.path().join("hooks")).unwrap();
        let deep = dir.path().join("skills/deep");
        std::fs::create_dir_all(&deep).unwrap();

        assert_eq!(find_bundle_root(&deep), Some(dir.path().to_path_buf()));
    }
}
