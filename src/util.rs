use serde_json::Value;

use crate::error::{Error, Result};
use crate::pagination::Record;

/// Collects the values of `field` across `records`, flattening arrays.
///
/// Non-string scalars are kept as their JSON text; nulls are skipped.
pub(crate) fn id_values(records: &[Record], field: &str) -> Result<Vec<String>> {
    let mut out = Vec::with_capacity(records.len());
    for record in records {
        let value = record.get(field).ok_or_else(|| Error::MissingField {
            field: field.to_string(),
        })?;
        match value {
            Value::Array(items) => out.extend(items.iter().filter_map(scalar_string)),
            other => out.extend(scalar_string(other)),
        }
    }
    Ok(out)
}

fn scalar_string(v: &Value) -> Option<String> {
    match v {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}
