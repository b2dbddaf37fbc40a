//! JSON ↔ CMME / MEI
//!
//! The JSON codec converts directly between `serde_json::Value` and XML
//! without going through the document model, so it accepts looser input than
//! the dialect readers: scalar shorthand for clef, key and time, either
//! dialect's note vocabulary, and numbers where strings are expected.
//!
//! Two output layouts exist (see [`JsonLayout`]). Flat input is regrouped
//! into parts and measures before validation.

pub mod from_xml;
pub mod to_xml;
pub mod validate;

pub use from_xml::{cmme_to_json, cmme_to_json_with_warnings, mei_to_json, mei_to_json_with_warnings};
pub use to_xml::{json_to_cmme, json_to_mei};
pub use validate::validate_json;

use crate::converters::errors::{ConversionError, ParseError};
use crate::converters::ReaderContext;
use crate::models::{Dialect, DurationSpec, DurationValue};
use crate::transform::{JsonLayout, TransformSettings, TransformWarning};
use serde_json::{Map, Value};

/// Per-conversion state for JSON → XML
pub struct CodecContext {
    counts: ReaderContext,
    default_unknown_durations: bool,
    pub warnings: Vec<TransformWarning>,
}

impl CodecContext {
    pub fn new(default_unknown_durations: bool) -> Self {
        Self {
            counts: ReaderContext::default(),
            default_unknown_durations,
            warnings: Vec::new(),
        }
    }

    pub(crate) fn next_note(&mut self) -> usize {
        self.counts.next_note()
    }

    pub(crate) fn next_rest(&mut self) -> usize {
        self.counts.next_rest()
    }

    pub(crate) fn next_chord(&mut self) -> usize {
        self.counts.next_chord()
    }

    /// Quarter note plus a warning, or an error when defaulting is off.
    /// Only for values that are present but unrecognized; a missing
    /// duration is always an error.
    pub(crate) fn unknown_duration(
        &mut self,
        element: &str,
        index: usize,
        value: &str,
    ) -> Result<DurationSpec, ParseError> {
        if !self.default_unknown_durations {
            return Err(ParseError::invalid_attribute(element, index, "duration", value));
        }
        self.warnings.push(
            TransformWarning::DefaultedDuration {
                element: element.to_string(),
                index,
                value: value.to_string(),
            }
            .logged(),
        );
        Ok(DurationSpec::new(DurationValue::Quarter))
    }

    pub(crate) fn skipped(&mut self, element: &str, index: usize, reason: &str) {
        self.warnings.push(
            TransformWarning::SkippedEvent {
                element: element.to_string(),
                index,
                reason: reason.to_string(),
            }
            .logged(),
        );
    }
}

pub fn parse_json(text: &str) -> Result<Value, ParseError> {
    serde_json::from_str(text).map_err(ParseError::from)
}

/// Two-space indented JSON text
pub fn to_pretty_json(value: &Value) -> Result<String, ConversionError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| ConversionError::Internal(format!("JSON serialization failed: {}", e)))
}

/// Parse, regroup flat input and validate
pub fn read_input(text: &str) -> Result<Value, ConversionError> {
    let value = regroup_flat(parse_json(text)?);
    validate_json(&value)?;
    Ok(value)
}

/// JSON text → pretty-printed XML in `target`
pub fn json_to_xml(
    text: &str,
    target: Dialect,
    settings: &TransformSettings,
    warnings: &mut Vec<TransformWarning>,
) -> Result<String, ConversionError> {
    let value = read_input(text)?;
    let mut ctx = CodecContext::new(settings.default_unknown_durations);
    let root = match target {
        Dialect::Cmme => json_to_cmme(&value, &mut ctx)?,
        Dialect::Mei => json_to_mei(&value, &mut ctx)?,
    };
    warnings.append(&mut ctx.warnings);
    root.to_pretty_string(settings.indent)
}

/// XML text in `source` → JSON text in the configured layout
pub fn xml_to_json(
    text: &str,
    source: Dialect,
    settings: &TransformSettings,
    warnings: &mut Vec<TransformWarning>,
) -> Result<String, ConversionError> {
    let (value, mut found) = match source {
        Dialect::Cmme => cmme_to_json_with_warnings(text)?,
        Dialect::Mei => mei_to_json_with_warnings(text)?,
    };
    warnings.append(&mut found);
    to_pretty_json(&apply_layout(value, settings.json_layout))
}

/// `json-to-json`: validate and re-print in the configured layout
pub fn normalize_json(text: &str, settings: &TransformSettings) -> Result<String, ConversionError> {
    let value = read_input(text)?;
    to_pretty_json(&apply_layout(value, settings.json_layout))
}

pub fn apply_layout(value: Value, layout: JsonLayout) -> Value {
    match layout {
        JsonLayout::Structured => value,
        JsonLayout::Flat => flatten(value),
    }
}

/// Structured → flat: one `notes` list, each event tagged with `part` and `measure`
pub fn flatten(value: Value) -> Value {
    let mut root = match value {
        Value::Object(root) => root,
        other => return other,
    };
    let Some(Value::Array(parts)) = root.remove("parts") else {
        return Value::Object(root);
    };

    let mut notes = Vec::new();
    for (p, part) in parts.into_iter().enumerate() {
        let Value::Object(mut part) = part else { continue };
        let part_id = scalar_field(&part, "id").unwrap_or_else(|| (p + 1).to_string());
        let measures = match part.remove("measures") {
            Some(Value::Array(measures)) => measures,
            _ => Vec::new(),
        };
        for (m, measure) in measures.into_iter().enumerate() {
            let Value::Object(mut measure) = measure else { continue };
            let number = scalar_field(&measure, "number")
                .or_else(|| scalar_field(&measure, "n"))
                .unwrap_or_else(|| (m + 1).to_string());
            for event in take_events(&mut measure) {
                let Value::Object(mut event) = event else { continue };
                event.insert("part".to_string(), Value::String(part_id.clone()));
                event.insert("measure".to_string(), Value::String(number.clone()));
                notes.push(Value::Object(event));
            }
        }
    }

    root.insert("notes".to_string(), Value::Array(notes));
    Value::Object(root)
}

/// Flat → structured; anything else is returned unchanged
pub fn regroup_flat(value: Value) -> Value {
    let mut root = match value {
        Value::Object(root) => root,
        other => return other,
    };
    if root.contains_key("parts") {
        return Value::Object(root);
    }
    let Some(Value::Array(notes)) = root.remove("notes") else {
        return Value::Object(root);
    };

    // (part id, [(measure number, events)]) in first-seen order
    let mut parts: Vec<(String, Vec<(String, Vec<Value>)>)> = Vec::new();
    for event in notes {
        let Value::Object(mut event) = event else { continue };
        let part_id = event
            .remove("part")
            .as_ref()
            .and_then(scalar)
            .unwrap_or_else(|| "1".to_string());
        let number = event
            .remove("measure")
            .as_ref()
            .and_then(scalar)
            .unwrap_or_else(|| "1".to_string());

        let part = match parts.iter().position(|(id, _)| *id == part_id) {
            Some(i) => &mut parts[i],
            None => {
                parts.push((part_id, Vec::new()));
                let last = parts.len() - 1;
                &mut parts[last]
            }
        };
        match part.1.iter_mut().find(|(n, _)| *n == number) {
            Some((_, events)) => events.push(Value::Object(event)),
            None => part.1.push((number, vec![Value::Object(event)])),
        }
    }

    let parts = parts
        .into_iter()
        .map(|(id, measures)| {
            let measures = measures
                .into_iter()
                .map(|(number, events)| {
                    let mut m = Map::new();
                    m.insert("number".to_string(), Value::String(number));
                    m.insert("events".to_string(), Value::Array(events));
                    Value::Object(m)
                })
                .collect();
            let mut part = Map::new();
            part.insert("id".to_string(), Value::String(id));
            part.insert("measures".to_string(), Value::Array(measures));
            Value::Object(part)
        })
        .collect();

    root.entry("metadata").or_insert_with(|| Value::Object(Map::new()));
    root.insert("parts".to_string(), Value::Array(parts));
    Value::Object(root)
}

/// The first non-empty event list of a measure
pub(crate) fn events_of(measure: &Map<String, Value>) -> &[Value] {
    validate::EVENT_KEYS
        .iter()
        .filter_map(|k| measure.get(*k).and_then(Value::as_array))
        .find(|events| !events.is_empty())
        .map(Vec::as_slice)
        .unwrap_or(&[])
}

fn take_events(measure: &mut Map<String, Value>) -> Vec<Value> {
    for key in validate::EVENT_KEYS {
        if let Some(Value::Array(events)) = measure.remove(key) {
            if !events.is_empty() {
                return events;
            }
        }
    }
    Vec::new()
}

/// Strings, numbers and booleans as attribute text
pub(crate) fn scalar(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

pub(crate) fn scalar_field(obj: &Map<String, Value>, key: &str) -> Option<String> {
    obj.get(key).and_then(scalar)
}

/// Dialect named by a top-level `format` key
pub(crate) fn source_dialect(root: &Value) -> Option<Dialect> {
    match root.get("format").and_then(Value::as_str) {
        Some("cmme") => Some(Dialect::Cmme),
        Some("mei") => Some(Dialect::Mei),
        _ => None,
    }
}
