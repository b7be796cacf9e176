use crate::error::{EccError, Result};
use std::path::PathBuf;

/// Look up every required tool on PATH. The first missing one is an error,
/// reported before any file is touched.
pub fn check_required_tools<S: AsRef<str>>(tools: &[S]) -> Result<Vec<PathBuf>> {
    tools
        .iter()
        .map(|tool| {
            let tool = tool.as_ref();
            which::which(tool).map_err(|_| EccError::DependencyMissing(tool.to_string()))
        })
        .collect()
}
