//! Shape checks for JSON input

use crate::converters::errors::ConversionError;
use serde_json::Value;

/// Measure keys that may hold the event list, in lookup order
pub const EVENT_KEYS: [&str; 3] = ["events", "notes", "contents"];

/// Check the top-level JSON shape before conversion
///
/// The root must be an object with a `metadata` object and a `parts` array;
/// every part needs `id` or `name` and a `measures` array, and every measure
/// one of [`EVENT_KEYS`].
pub fn validate_json(value: &Value) -> Result<(), ConversionError> {
    let fail = |message: String| Err(ConversionError::Validation(message));

    let Some(root) = value.as_object() else {
        return fail("JSON root must be an object".to_string());
    };
    match root.get("metadata") {
        None => return fail("Missing required 'metadata' field".to_string()),
        Some(m) if !m.is_object() => return fail("'metadata' field must be an object".to_string()),
        Some(_) => {}
    }
    let parts = match root.get("parts") {
        None => return fail("Missing required 'parts' field".to_string()),
        Some(Value::Array(parts)) => parts,
        Some(_) => return fail("'parts' field must be an array".to_string()),
    };

    for (p, part) in parts.iter().enumerate() {
        let Some(part) = part.as_object() else {
            return fail(format!("Part at index {} must be an object", p));
        };
        if !part.contains_key("id") && !part.contains_key("name") {
            return fail(format!("Part at index {} must have 'id' or 'name'", p));
        }
        let Some(measures) = part.get("measures").and_then(Value::as_array) else {
            return fail(format!("Part at index {} must have 'measures' array", p));
        };
        for (m, measure) in measures.iter().enumerate() {
            let Some(measure) = measure.as_object() else {
                return fail(format!("Measure at index {} in part {} must be an object", m, p));
            };
            if !EVENT_KEYS.iter().any(|k| measure.contains_key(*k)) {
                return fail(format!(
                    "Measure at index {} in part {} must have 'events', 'notes', or 'contents' field",
                    m, p
                ));
            }
        }
    }
    Ok(())
}
