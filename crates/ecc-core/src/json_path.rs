//! Minimal JSON paths: dot-separated object keys with optional `[N]` array
//! indices. Negative indices count from the end, so
//! `mcpServers.filesystem.args[-1]` is the last argument.

use crate::error::{EccError, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Key(String),
    Index(isize),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct JsonPath {
    raw: String,
    segments: Vec<Segment>,
}

impl JsonPath {
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    pub fn get<'a>(&self, root: &'a Value) -> Option<&'a Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(k), Value::Object(obj)) => obj.get(k)?,
                (Segment::Index(i), Value::Array(arr)) => arr.get(resolve_index(*i, arr.len())?)?,
                _ => return None,
            };
        }
        Some(current)
    }

    pub fn get_mut<'a>(&self, root: &'a mut Value) -> Option<&'a mut Value> {
        let mut current = root;
        for segment in &self.segments {
            current = match (segment, current) {
                (Segment::Key(k), Value::Object(obj)) => obj.get_mut(k)?,
                (Segment::Index(i), Value::Array(arr)) => {
                    let idx = resolve_index(*i, arr.len())?;
                    arr.get_mut(idx)?
                }
                _ => return None,
            };
        }
        Some(current)
    }

    /// Set the value at this path, creating missing objects and arrays.
    ///
    /// Non-container values in the way are replaced. An index one past the
    /// end, or any index into an empty array, appends.
    pub fn set(&self, root: &mut Value, value: Value) -> Result<()> {
        set_in(root, &self.segments, value, &self.raw)
    }
}

fn resolve_index(index: isize, len: usize) -> Option<usize> {
    let resolved = if index < 0 {
        len.checked_sub(index.unsigned_abs())?
    } else {
        index as usize
    };
    (resolved < len).then_some(resolved)
}

fn set_in(current: &mut Value, segments: &[Segment], value: Value, raw: &str) -> Result<()> {
    let Some((first, rest)) = segments.split_first() else {
        *current = value;
        return Ok(());
    };

    match first {
        Segment::Key(key) => {
            if !current.is_object() {
                *current = Value::Object(Map::new());
            }
            let Value::Object(obj) = current else {
                unreachable!("replaced with an object above");
            };
            let child = obj.entry(key.clone()).or_insert(Value::Null);
            set_in(child, rest, value, raw)
        }
        Segment::Index(index) => {
            if !current.is_array() {
                *current = Value::Array(Vec::new());
            }
            let Value::Array(arr) = current else {
                unreachable!("replaced with an array above");
            };
            let slot = match resolve_index(*index, arr.len()) {
                Some(i) => i,
                None if arr.is_empty() || *index == arr.len() as isize => {
                    arr.push(Value::Null);
                    arr.len() - 1
                }
                None => {
                    return Err(EccError::InvalidJsonPath {
                        path: raw.to_string(),
                        reason: format!("index {index} out of range for {} elements", arr.len()),
                    })
                }
            };
            set_in(&mut arr[slot], rest, value, raw)
        }
    }
}

impl FromStr for JsonPath {
    type Err = EccError;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = |reason: &str| EccError::InvalidJsonPath {
            path: s.to_string(),
            reason: reason.to_string(),
        };
        if s.trim().is_empty() {
            return Err(invalid("path is empty"));
        }

        let mut segments = Vec::new();
        for part in s.split('.') {
            let (key, mut rest) = match part.find('[') {
                Some(pos) => (&part[..pos], &part[pos..]),
                None => (part, ""),
            };
            if key.is_empty() && rest.is_empty() {
                return Err(invalid("empty key"));
            }
            if !key.is_empty() {
                segments.push(Segment::Key(key.to_string()));
            }
            while !rest.is_empty() {
                let inner = rest
                    .strip_prefix('[')
                    .and_then(|r| r.split_once(']'))
                    .ok_or_else(|| invalid("expected [index]"))?;
                let index = inner
                    .0
                    .trim()
                    .parse::<isize>()
                    .map_err(|_| invalid("array index must be an integer"))?;
                segments.push(Segment::Index(index));
                rest = inner.1;
            }
        }

        Ok(Self {
            raw: s.to_string(),
            segments,
        })
    }
}

impl TryFrom<String> for JsonPath {
    type Error = EccError;

    fn try_from(s: String) -> Result<Self> {
        s.parse()
    }
}

impl From<JsonPath> for String {
    fn from(path: JsonPath) -> Self {
        path.raw
    }
}

impl fmt::Display for JsonPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn path(s: &str) -> JsonPath {
        s.parse().unwrap()
    }

    #[test]
    fn parses_keys_and_indices() {
        assert_eq!(
            path("mcpServers.filesystem.args[-1]").segments(),
            &[
                Segment::Key("mcpServers".into()),
                Segment::Key("filesystem".into()),
                Segment::Key("args".into()),
                Segment::Index(-1),
            ]
        );
        assert_eq!(
            path("grid[0][2]").segments(),
            &[
                Segment::Key("grid".into()),
                Segment::Index(0),
                Segment::Index(2)
            ]
        );
    }

    #[test]
    fn rejects_malformed_paths() {
        for bad in ["", "a..b", "a[x]", "a[1", "a[1]b", "."] {
            assert!(bad.parse::<JsonPath>().is_err(), "expected invalid: {bad}");
        }
    }

    #[test]
    fn get_follows_negative_index() {
        let doc = json!({"fs": {"args": ["-y", "server", "/code"]}});
        assert_eq!(path("fs.args[-1]").get(&doc), Some(&json!("/code")));
        assert_eq!(path("fs.args[0]").get(&doc), Some(&json!("-y")));
        assert_eq!(path("fs.args[5]").get(&doc), None);
        assert_eq!(path("fs.args[-4]").get(&doc), None);
        assert_eq!(path("fs.missing").get(&doc), None);
    }

    #[test]
    fn set_replaces_last_element() {
        let mut doc = json!({"fs": {"args": ["-y", "server", "PLACEHOLDER"]}});
        path("fs.args[-1]").set(&mut doc, json!("/home/user/code")).unwrap();
        assert_eq!(doc, json!({"fs": {"args": ["-y", "server", "/home/user/code"]}}));
    }

    #[test]
    fn set_appends_to_empty_array() {
        let mut doc = json!({"fs": {"args": []}});
        path("fs.args[-1]").set(&mut doc, json!("/tmp")).unwrap();
        assert_eq!(doc, json!({"fs": {"args": ["/tmp"]}}));
    }

    #[test]
    fn set_creates_missing_structure() {
        let mut doc = json!({});
        path("mcpServers.filesystem.args[-1]")
            .set(&mut doc, json!("/tmp"))
            .unwrap();
        assert_eq!(doc, json!({"mcpServers": {"filesystem": {"args": ["/tmp"]}}}));
    }

    #[test]
    fn set_out_of_range_index_fails() {
        let mut doc = json!({"a": [1, 2]});
        assert!(path("a[7]").set(&mut doc, json!(3)).is_err());
        assert_eq!(doc, json!({"a": [1, 2]}));
    }

    #[test]
    fn serde_uses_string_form() {
        let p: JsonPath = serde_json::from_value(json!("a.b[0]")).unwrap();
        assert_eq!(p.to_string(), "a.b[0]");
        assert_eq!(serde_json::to_value(&p).unwrap(), json!("a.b[0]"));
    }
}
