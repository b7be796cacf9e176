use crate::error::{EccError, Result};
use crate::placeholder::expand_variables;
use serde_json::Value;
use std::path::Path;

/// Load a fragment file. It must exist and hold a single JSON object.
/// `vars` are expanded inside its string values.
pub fn load_fragment(path: &Path, vars: &[(String, String)]) -> Result<Value> {
    let invalid = |reason: String| EccError::FragmentInvalid {
        path: path.to_path_buf(),
        reason,
    };

    let bytes = std::fs::read(path).map_err(|e| invalid(e.to_string()))?;
    let mut fragment: Value =
        serde_json::from_slice(&bytes).map_err(|e| invalid(format!("not valid JSON: {e}")))?;
    if !fragment.is_object() {
        return Err(invalid("root must be a JSON object".to_string()));
    }

    expand_variables(&mut fragment, vars);
    Ok(fragment)
}
