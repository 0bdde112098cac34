//! Attribute Normalization
//!
//! IDD attribute values arrive from the dictionary parser as JSON values
//! whose shape shifts with cardinality: a bare string, or a list wrapping
//! one string, or (for the handful of genuinely multi-valued attributes)
//! a list of several strings. These rules collapse that into typed data
//! once, at ingestion, so everything downstream sees strict models.
//!
//! Each rule returns a plain `NormalizeError` reason; callers attach the
//! offending type and field names when converting to `SchemaError`.

use serde_json::Value;

/// Reason a raw attribute value failed normalization
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NormalizeError(pub String);

impl std::fmt::Display for NormalizeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn as_str(value: &Value) -> Result<&str, NormalizeError> {
    value
        .as_str()
        .ok_or_else(|| NormalizeError(format!("expected a string value, got {value}")))
}

/// Collapse a bare string or singleton list to one string.
///
/// Lists longer than one element are tolerated only when every element is
/// identical; the dictionary source occasionally duplicates values like
/// `units: ["W", "W"]`.
pub fn singleton(value: &Value) -> Result<String, NormalizeError> {
    match value {
        Value::Array(items) => {
            let mut strs = Vec::with_capacity(items.len());
            for item in items {
                strs.push(as_str(item)?);
            }
            match strs.split_first() {
                None => Err(NormalizeError("list must hold exactly 1 item, not 0".into())),
                Some((first, rest)) => {
                    if rest.iter().all(|s| s == first) {
                        Ok((*first).to_string())
                    } else {
                        Err(NormalizeError(format!(
                            "list must hold exactly 1 item, not {} distinct items",
                            items.len()
                        )))
                    }
                }
            }
        }
        other => Ok(as_str(other)?.to_string()),
    }
}

/// Normalize a boolean-flag attribute.
///
/// A flag is encoded in the source as present-with-empty-string when true
/// and absent when false; the caller maps absence to `false`, this rule
/// maps presence. Any non-empty value on a flag is a validation failure.
pub fn flag(value: &Value) -> Result<bool, NormalizeError> {
    let v = singleton(value)?;
    if v.is_empty() {
        Ok(true)
    } else {
        Err(NormalizeError(format!(
            "boolean flag must carry an empty string, not '{v}'"
        )))
    }
}

/// Normalize a true multi-valued attribute (`key`, `object-list`,
/// `reference`, `validobjects`) to a list of strings. A bare string is
/// promoted to a one-element list.
pub fn string_list(value: &Value) -> Result<Vec<String>, NormalizeError> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(|item| as_str(item).map(str::to_string))
            .collect(),
        other => Ok(vec![as_str(other)?.to_string()]),
    }
}

/// Join a multi-line text attribute (`memo`, `note`) with spaces.
pub fn joined(value: &Value) -> Result<String, NormalizeError> {
    Ok(string_list(value)?.join(" "))
}
