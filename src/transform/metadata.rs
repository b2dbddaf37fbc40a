//! Format-specific metadata extraction

use crate::converters::errors::{ConversionError, ParseError};
use crate::converters::json::{parse_json, scalar};
use crate::converters::xml::{local_name, parse_xml};
use crate::converters::{cmme, mei};
use crate::models::{Format, Metadata};
use crate::transform::preprocess::{preprocess, preprocess_xml};
use serde_json::Value;

/// Read title, composer and the other header fields of `content`
///
/// The XML readers only require a parsable document with the right root;
/// the score itself is not inspected.
pub fn extract_metadata(content: &str, format: Format) -> Result<Metadata, ConversionError> {
    match format {
        Format::Json => {
            let value = parse_json(&preprocess(content))?;
            Ok(json_metadata(&value))
        }
        Format::Cmme | Format::Mei => {
            let text = preprocess_xml(content);
            let doc = parse_xml(&text)?;
            let root = doc.root_element();
            let expected = format.as_str();
            if local_name(root) != expected {
                return Err(ParseError::UnexpectedRoot {
                    expected: expected.to_string(),
                    found: local_name(root).to_string(),
                }
                .into());
            }
            Ok(match format {
                Format::Cmme => cmme::read_metadata(root),
                _ => mei::read_metadata(root),
            })
        }
    }
}

/// Scalar entries of the top-level `metadata` object, in document order
pub fn json_metadata(value: &Value) -> Metadata {
    value
        .get("metadata")
        .and_then(Value::as_object)
        .map(|fields| {
            fields
                .iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}
