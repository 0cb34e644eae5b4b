//! Argument validation against a tool's [`ArgSpec`]s.

use std::collections::BTreeMap;

use serde_json::{Map, Value};
use tracing::debug;

use crate::catalogue::ArgSpec;
use crate::error::{Result, ToolError};

/// Arguments that passed validation, coerced to strings.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Arguments {
    values: BTreeMap<&'static str, String>,
}

impl Arguments {
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    /// Value of an argument validation guarantees, or `""` if the
    /// descriptor does not declare it.
    pub fn text(&self, name: &str) -> &str {
        self.get(name).unwrap_or_default()
    }
}

/// Check `raw` against `specs` without touching the network.
///
/// Absent, `null` and blank strings count as missing. Numbers and booleans
/// are accepted and stringified. Arguments the tool does not declare are
/// ignored.
pub fn validate(specs: &[ArgSpec], raw: &Map<String, Value>) -> Result<Arguments> {
    let mut values = BTreeMap::new();

    for spec in specs {
        let value = match raw.get(spec.name) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(s.trim().to_string()).filter(|s| !s.is_empty()),
            Some(Value::Number(n)) => Some(n.to_string()),
            Some(Value::Bool(b)) => Some(b.to_string()),
            Some(Value::Array(_) | Value::Object(_)) => {
                return Err(ToolError::InvalidArgument {
                    name: spec.label(),
                    reason: "must be a string".to_string(),
                });
            }
        };

        let value = match (value, spec.default) {
            (Some(value), _) => value,
            (None, _) if spec.required => return Err(ToolError::MissingArgument(spec.label())),
            (None, Some(default)) => default.to_string(),
            (None, None) => continue,
        };

        if !spec.allowed.is_empty() && !spec.allowed.contains(&value.as_str()) {
            return Err(ToolError::InvalidArgument {
                name: spec.label(),
                reason: format!("must be one of: {}", spec.allowed.join(", ")),
            });
        }

        values.insert(spec.name, value);
    }

    for name in raw.keys() {
        if !specs.iter().any(|spec| spec.name == name) {
            debug!(argument = %name, "ignoring undeclared argument");
        }
    }

    Ok(Arguments { values })
}
