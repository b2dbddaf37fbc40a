//! Engine configuration
//!
//! Settings are plain serde data, so they load from YAML (or any other serde
//! format) and cross the WASM boundary unchanged. Missing fields take their
//! defaults.

use crate::converters::ConversionError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Shape of JSON output
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JsonLayout {
    /// `metadata` + `parts[].measures[].events`
    #[default]
    Structured,
    /// `metadata` + a single `notes` list, each event tagged with `part` and `measure`
    Flat,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformSettings {
    /// Spaces per nesting level in XML output
    pub indent: usize,

    /// Check the output against the target format's structural rules
    pub validate_output: bool,

    /// Map unknown JSON durations to quarter notes instead of failing
    pub default_unknown_durations: bool,

    pub json_layout: JsonLayout,

    /// Compare note/rest/chord counts between source and output
    pub report_data_loss: bool,

    /// Let `validate_and_transform` override a declared XML source format
    pub auto_detect_source: bool,
}

impl Default for TransformSettings {
    fn default() -> Self {
        Self {
            indent: 2,
            validate_output: true,
            default_unknown_durations: true,
            json_layout: JsonLayout::Structured,
            report_data_loss: true,
            auto_detect_source: false,
        }
    }
}

impl TransformSettings {
    pub fn from_yaml(text: &str) -> Result<Self, ConversionError> {
        serde_yaml::from_str(text)
            .map_err(|e| ConversionError::Validation(format!("invalid settings: {}", e)))
    }

    pub fn from_yaml_file(path: impl AsRef<Path>) -> Result<Self, ConversionError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConversionError::Internal(format!("cannot read settings {}: {}", path.display(), e))
        })?;
        log::info!("Loading transform settings from {}", path.display());
        Self::from_yaml(&text)
    }
}
