use ecc_core::{paths, EccError};
use std::path::{Path, PathBuf};

/// Resolve the bundle source directory.
///
/// Priority:
/// 1. `--src` flag / `ECC_SRC` env var (passed in as `explicit`)
/// 2. Walk upward from `cwd` looking for a `hooks/` directory
/// 3. Walk upward from the executable's directory
pub fn resolve_src(explicit: Option<&Path>) -> Result<PathBuf, EccError> {
    if let Some(p) = explicit {
        if !p.is_dir() {
            return Err(EccError::SourceNotFound(p.display().to_string()));
        }
        return Ok(p.canonicalize()?);
    }

    let cwd = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    if let Some(found) = paths::find_bundle_root(&cwd) {
        return Ok(found.canonicalize()?);
    }

    let exe_dir = std::env::current_exe()
        .ok()
        .and_then(|exe| exe.parent().map(Path::to_path_buf));
    if let Some(found) = exe_dir.as_deref().and_then(paths::find_bundle_root) {
        return Ok(found.canonicalize()?);
    }

    let tried = match exe_dir {
        Some(exe) => format!("{} and {}", cwd.display(), exe.display()),
        None => cwd.display().to_string(),
    };
    Err(EccError::SourceNotFound(tried))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn explicit_src_wins() {
        let dir = TempDir::new().unwrap();
        let result = resolve_src(Some(dir.path())).unwrap();
        assert_eq!(result, dir.path().canonicalize().unwrap());
    }

    #[test]
    fn explicit_src_must_exist() {
        let dir = TempDir::new().unwrap();
        let missing = dir.path().join("nope");
        assert!(matches!(
            resolve_src(Some(&missing)),
            Err(EccError::SourceNotFound(_))
        ));
    }
}
