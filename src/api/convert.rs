//! Conversion operations for the WASM API

use crate::api::helpers::{deserialize, js_error, parse_format, serialize};
use crate::models::Format;
use crate::transform::{self, TransformSettings, Transformer};
use crate::wasm_info;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ============================================================================
// Transformation
// ============================================================================

/// Convert `content` according to a `source-to-target` token
///
/// # Returns
/// The converted text; warnings are logged but not returned
#[wasm_bindgen(js_name = transform)]
pub fn transform_content(content: &str, conversion_type: &str) -> Result<String, JsValue> {
    wasm_info!("transform called: {} ({} bytes)", conversion_type, content.len());
    transform::transform(content, conversion_type)
        .map(|result| result.output)
        .map_err(js_error)
}

/// Convert with optional settings and return `{ output, warnings }`
///
/// `settings` may be `undefined`/`null` for the defaults, or an object with
/// any subset of the settings fields.
#[wasm_bindgen(js_name = transformWithReport)]
pub fn transform_with_report(
    content: &str,
    conversion_type: &str,
    settings: JsValue,
) -> Result<JsValue, JsValue> {
    let settings: TransformSettings = if settings.is_undefined() || settings.is_null() {
        TransformSettings::default()
    } else {
        deserialize(settings, "Invalid transform settings")?
    };
    wasm_info!("transformWithReport called: {}", conversion_type);

    let result = Transformer::new(settings)
        .validate_and_transform(content, conversion_type)
        .map_err(js_error)?;
    serialize(&result, "Failed to serialize transform result")
}

// ============================================================================
// Inspection
// ============================================================================

/// Structural check without conversion; rejects with the first problem found
#[wasm_bindgen(js_name = validateContent)]
pub fn validate_content(content: &str, format: &str) -> Result<(), JsValue> {
    let format = parse_format(format)?;
    transform::validate(content, format).map_err(js_error)
}

/// Header fields as a plain object
#[wasm_bindgen(js_name = extractMetadata)]
pub fn extract_metadata(content: &str, format: &str) -> Result<JsValue, JsValue> {
    let format = parse_format(format)?;
    let metadata = transform::extract_metadata(content, format).map_err(js_error)?;
    serialize(&metadata, "Failed to serialize metadata")
}

/// `"cmme"`, `"mei"`, or `null` when inconclusive
#[wasm_bindgen(js_name = detectXmlFormat)]
pub fn detect_xml_format(content: &str) -> JsValue {
    match transform::detect_xml_format(content) {
        Some(format) => JsValue::from_str(format.as_str()),
        None => JsValue::NULL,
    }
}

#[derive(Serialize)]
struct FormatInfo {
    name: &'static str,
    extensions: &'static [&'static str],
    mime: &'static str,
}

/// Every supported format with its file extensions and MIME type
#[wasm_bindgen(js_name = supportedFormats)]
pub fn supported_formats() -> Result<JsValue, JsValue> {
    let formats: Vec<FormatInfo> = Format::ALL
        .iter()
        .map(|f| FormatInfo {
            name: f.as_str(),
            extensions: f.extensions(),
            mime: f.mime_type(),
        })
        .collect();
    serialize(&formats, "Failed to serialize supported formats")
}
