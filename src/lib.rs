//! Notation Bridge
//!
//! Transcoding engine between CMME, MEI and a JSON intermediate form. The
//! native API lives in [`transform`]; [`api`] exposes the same operations to
//! JavaScript through `wasm-bindgen`.

pub mod api;
pub mod converters;
pub mod mappings;
pub mod models;
pub mod transform;

// Re-export commonly used types
pub use converters::{ConversionError, ParseError};
pub use models::{Document, Format, Metadata};
pub use transform::{
    detect_xml_format, extract_metadata, transform, validate, validate_and_transform, ConversionType,
    JsonLayout, TransformSettings, TransformWarning, Transformed, Transformer,
};

use wasm_bindgen::prelude::*;

// This is like the `main` function, but for WASM modules.
#[wasm_bindgen(start)]
pub fn main() {
    #[cfg(feature = "console_error_panic_hook")]
    console_error_panic_hook::set_once();

    init_logging();
    log::info!("Notation Bridge WASM module initialized");
}

#[cfg(feature = "console_log")]
fn init_logging() {
    if console_log::init_with_level(log::Level::Debug).is_err() {
        log::debug!("logger already initialized");
    }
}

#[cfg(not(feature = "console_log"))]
fn init_logging() {}
