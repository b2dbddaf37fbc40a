//! Data model for the transcoding engine
//!
//! `format` names what can be converted, `document` is the normalized score
//! that readers produce and writers consume, and `duration` / `pitch_spec`
//! hold the two value types every note carries.

pub mod document;
pub mod duration;
pub mod format;
pub mod pitch_spec;

pub use document::*;
pub use duration::{DurationSpec, DurationValue};
pub use format::{Dialect, Format, CMME_NS, MEI_NS, XML_NS};
pub use pitch_spec::{Accidental, PitchSpec};
