//! JavaScript-facing API
//!
//! Thin `wasm-bindgen` wrappers over [`crate::transform`]. Every function is
//! stateless; nothing is kept on the Rust side between calls.
//!
//! # Module Structure
//!
//! - `helpers`: serialization, error conversion and logging macros
//! - `convert`: transform, validate, metadata and detection entry points

pub mod convert;
pub mod helpers;

pub use convert::{
    detect_xml_format, extract_metadata, supported_formats, transform_content, transform_with_report,
    validate_content,
};
