use serde_json::{Map, Value};

use super::error::FilterError;

/// Validates a dotted field path such as `stats.points`.
///
/// Every segment must start with a letter or underscore and contain only
/// ASCII alphanumerics or underscores. Paths are inlined into generated SQL,
/// so nothing else is accepted.
pub fn validate_field_path(path: &str) -> Result<(), FilterError> {
    if path.is_empty() {
        return Err(FilterError::InvalidField("Field path cannot be empty".to_string()));
    }
    for segment in path.split('.') {
        let mut chars = segment.chars();
        let valid_start = matches!(chars.next(), Some(c) if c.is_ascii_alphabetic() || c == '_');
        if !valid_start || !chars.all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(FilterError::InvalidField(format!("Invalid field path format: {}", path)));
        }
    }
    Ok(())
}

/// Resolves a dotted path inside a JSON document.
pub fn lookup<'a>(doc: &'a Value, path: &str) -> Option<&'a Value> {
    path.split('.').try_fold(doc, |current, segment| current.get(segment))
}

/// Writes `value` at a dotted path, creating intermediate objects as needed.
pub fn set_path(doc: &mut Map<String, Value>, path: &str, value: Value) {
    let mut segments = path.split('.').peekable();
    let mut current = doc;
    while let Some(segment) = segments.next() {
        if segments.peek().is_none() {
            current.insert(segment.to_string(), value);
            return;
        }
        let entry = current
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
        if !entry.is_object() {
            *entry = Value::Object(Map::new());
        }
        current = match entry {
            Value::Object(map) => map,
            _ => unreachable!("entry was just made an object"),
        };
    }
}

/// Renders a validated path as a PostgreSQL text-array path literal: `{stats,points}`.
pub fn to_pg_path(path: &str) -> String {
    format!("{{{}}}", path.split('.').collect::<Vec<_>>().join(","))
}
