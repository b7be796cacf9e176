use crate::error::{EccError, Result};
use serde_json::Value;
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;

/// Atomically write `data` to `path` using a tempfile in the same directory.
/// Prevents partial writes from corrupting config files.
///
/// A symlinked `path` is written through: the link stays and its target is
/// replaced. An existing file keeps its permissions.
pub fn atomic_write(path: &Path, data: &[u8]) -> Result<()> {
    let target = write_target(path)?;
    if let Some(parent) = target.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }
    let dir = match target.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(data)?;
    if let Ok(existing) = std::fs::metadata(&target) {
        tmp.as_file().set_permissions(existing.permissions())?;
    }
    tmp.as_file().sync_all()?;
    tmp.persist(&target).map_err(|e| e.error)?;
    Ok(())
}

/// The file a write to `path` should replace.
fn write_target(path: &Path) -> Result<PathBuf> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) if meta.file_type().is_symlink() => match std::fs::canonicalize(path) {
            Ok(real) => Ok(real),
            // Dangling link: create the file it points at.
            Err(_) => {
                let link = std::fs::read_link(path)?;
                Ok(match path.parent() {
                    Some(parent) if link.is_relative() => parent.join(link),
                    _ => link,
                })
            }
        },
        _ => Ok(path.to_path_buf()),
    }
}

/// `settings.json` -> `settings.json.bak`.
pub fn backup_path(path: &Path) -> PathBuf {
    let mut name: OsString = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".bak");
    path.with_file_name(name)
}

/// Copy `original` (the bytes just read from `path`) to the `.bak` sibling and
/// read it back. Any mismatch is a failed backup.
pub fn create_backup(path: &Path, original: &[u8]) -> Result<PathBuf> {
    let bak = backup_path(path);
    let failed = |reason: String| EccError::BackupFailed {
        path: path.to_path_buf(),
        reason,
    };

    std::fs::copy(path, &bak).map_err(|e| failed(e.to_string()))?;
    let written = std::fs::read(&bak).map_err(|e| failed(e.to_string()))?;
    if written != original {
        return Err(failed(format!(
            "{} does not match the original ({} vs {} bytes)",
            bak.display(),
            written.len(),
            original.len()
        )));
    }
    tracing::debug!(backup = %bak.display(), "backup verified");
    Ok(bak)
}

/// Put the `.bak` sibling back in place of `path`.
pub fn restore_backup(path: &Path) -> Result<PathBuf> {
    let bak = backup_path(path);
    if !bak.is_file() {
        return Err(EccError::BackupMissing(bak));
    }
    let data = std::fs::read(&bak)?;
    atomic_write(path, &data)?;
    Ok(bak)
}

/// Parse document bytes. Empty or whitespace-only content is an empty object.
pub fn parse_document(bytes: &[u8]) -> std::result::Result<Value, serde_json::Error> {
    if bytes.iter().all(|b| b.is_ascii_whitespace()) {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    serde_json::from_slice(bytes)
}

/// Pretty-printed JSON with a trailing newline.
pub fn to_document_bytes(value: &Value) -> Result<Vec<u8>> {
    let mut out = serde_json::to_vec_pretty(value)?;
    out.push(b'\n');
    Ok(out)
}

/// Read a JSON document, treating a missing or empty file as `{}`.
pub fn read_json(path: &Path) -> Result<Value> {
    if !path.is_file() {
        return Ok(Value::Object(serde_json::Map::new()));
    }
    let bytes = std::fs::read(path)?;
    Ok(parse_document(&bytes)?)
}

pub fn write_json(path: &Path, value: &Value) -> Result<()> {
    atomic_write(path, &to_document_bytes(value)?)
}
