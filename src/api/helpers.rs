//! Shared helpers for the WASM API
//!
//! Errors cross the boundary as plain strings; structured values go through
//! `serde-wasm-bindgen` with the JSON-compatible serializer so maps arrive as
//! plain objects.

use crate::converters::ConversionError;
use crate::models::Format;
use serde::de::DeserializeOwned;
use serde::Serialize;
use wasm_bindgen::prelude::*;

// ============================================================================
// Logging Macros
// ============================================================================

/// Log an info message with [WASM] prefix
#[macro_export]
macro_rules! wasm_info {
    ($($arg:tt)*) => {
        log::info!("[WASM] {}", format!($($arg)*))
    };
}

/// Log an error message with [WASM] prefix
#[macro_export]
macro_rules! wasm_error {
    ($($arg:tt)*) => {
        log::error!("[WASM] {}", format!($($arg)*))
    };
}

// ============================================================================
// Serialization/Deserialization Helpers
// ============================================================================

/// Deserialize a value from JavaScript with automatic error handling
pub fn deserialize<T: DeserializeOwned>(value: JsValue, error_context: &str) -> Result<T, JsValue> {
    serde_wasm_bindgen::from_value(value).map_err(|e| {
        let msg = format!("{}: {}", error_context, e);
        crate::wasm_error!("{}", msg);
        JsValue::from_str(&msg)
    })
}

/// Serialize a value to JavaScript with automatic error handling
pub fn serialize<T: Serialize>(value: &T, error_context: &str) -> Result<JsValue, JsValue> {
    value
        .serialize(&serde_wasm_bindgen::Serializer::json_compatible())
        .map_err(|e| {
            let msg = format!("{}: {}", error_context, e);
            crate::wasm_error!("{}", msg);
            JsValue::from_str(&msg)
        })
}

// ============================================================================
// Result Conversion Helpers
// ============================================================================

/// Convert an engine error to a JsValue
pub fn js_error(err: ConversionError) -> JsValue {
    crate::wasm_error!("{}", err);
    JsValue::from_str(&err.to_string())
}

/// Resolve a format label passed from JavaScript
pub fn parse_format(label: &str) -> Result<Format, JsValue> {
    label.parse::<Format>().map_err(|format| {
        js_error(ConversionError::UnsupportedFormat {
            format,
            supported: Format::supported_list(),
        })
    })
}
