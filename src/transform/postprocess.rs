//! Output normalization after transcoding

use crate::converters::errors::ConversionError;
use crate::converters::json::{parse_json, to_pretty_json};
use crate::models::{Format, Metadata, MEI_NS};
use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

pub const XML_DECLARATION: &str = r#"<?xml version="1.0" encoding="UTF-8"?>"#;

lazy_static! {
    static ref LEADING_DECLARATION: Regex =
        Regex::new(r"^<\?xml[^>]*\?>\s*").expect("static declaration pattern");
    static ref BARE_MEI_ROOT: Regex =
        Regex::new(r"^<mei(\s[^>]*)?(/?)>").expect("static root pattern");
}

/// Bring a transcoded result into its final shape for `target`
pub fn finish(output: String, target: Format, metadata: &Metadata) -> Result<String, ConversionError> {
    match target {
        Format::Json => finish_json(output, metadata),
        Format::Cmme | Format::Mei => Ok(finish_xml(&output, target)),
    }
}

/// Exactly one UTF-8 declaration, and an MEI root bound to the MEI namespace
pub fn finish_xml(output: &str, target: Format) -> String {
    let body = LEADING_DECLARATION.replace(output.trim(), "");
    let body = if target == Format::Mei {
        with_mei_namespace(&body)
    } else {
        body.into_owned()
    };
    format!("{}\n{}", XML_DECLARATION, body)
}

fn with_mei_namespace(body: &str) -> String {
    let Some(root) = BARE_MEI_ROOT.captures(body) else {
        return body.to_string();
    };
    let attributes = root.get(1).map_or("", |m| m.as_str());
    if attributes.contains("xmlns=") {
        return body.to_string();
    }
    let close = root.get(2).map_or("", |m| m.as_str());
    let end = root.get(0).map_or(0, |m| m.end());
    format!(
        "<mei xmlns=\"{}\"{}{}>{}",
        MEI_NS,
        attributes,
        close,
        &body[end..]
    )
}

/// Fill a missing or empty `metadata` object from the extracted source metadata
pub fn finish_json(output: String, metadata: &Metadata) -> Result<String, ConversionError> {
    if metadata.is_empty() {
        return Ok(output);
    }
    let mut value = parse_json(&output)?;
    let Some(root) = value.as_object_mut() else {
        return Ok(output);
    };
    let has_metadata = root
        .get("metadata")
        .and_then(Value::as_object)
        .map_or(false, |m| !m.is_empty());
    if has_metadata {
        return Ok(output);
    }

    let fields: Map<String, Value> = metadata
        .iter()
        .map(|(k, v)| (k.to_string(), Value::String(v.to_string())))
        .collect();
    root.insert("metadata".to_string(), Value::Object(fields));
    to_pretty_json(&value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_declaration() {
        let out = finish_xml("<?xml version=\"1.0\"?>\n<cmme/>\n", Format::Cmme);
        assert_eq!(out, format!("{}\n<cmme/>", XML_DECLARATION));
    }

    #[test]
    fn test_injects_mei_namespace() {
        let out = finish_xml("<mei meiversion=\"5.0\">\n  <music/>\n</mei>", Format::Mei);
        assert_eq!(
            out,
            format!(
                "{}\n<mei xmlns=\"{}\" meiversion=\"5.0\">\n  <music/>\n</mei>",
                XML_DECLARATION, MEI_NS
            )
        );
        let declared = format!("<mei xmlns=\"{}\"/>", MEI_NS);
        assert!(finish_xml(&declared, Format::Mei).ends_with(&declared));
    }

    #[test]
    fn test_json_metadata_filled_only_when_missing() {
        let md: Metadata = [("title", "Agnus Dei")].into_iter().collect();
        let out = finish_json(r#"{"metadata": {}, "parts": []}"#.to_string(), &md).unwrap();
        let value: Value = serde_json::from_str(&out).unwrap();
        assert_eq!(value["metadata"]["title"], "Agnus Dei");

        let kept = r#"{"metadata": {"title": "Gloria"}, "parts": []}"#.to_string();
        assert_eq!(finish_json(kept.clone(), &md).unwrap(), kept);
    }
}
