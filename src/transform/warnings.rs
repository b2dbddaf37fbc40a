//! Recoverable issues reported alongside a conversion result

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A problem that did not stop the conversion
///
/// Every warning is also logged at `warn` level where it is raised.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TransformWarning {
    /// The generated output failed the target format's structural checks
    #[error("output validation failed: {message}")]
    OutputValidation { message: String },

    /// The source failed structural checks but was still converted
    #[error("source validation failed: {message}")]
    SourceValidation { message: String },

    #[error("metadata extraction failed: {message}")]
    MetadataExtraction { message: String },

    /// An unrecognized duration was replaced by a quarter note
    #[error("{element} {index}: unknown duration '{value}' replaced by quarter")]
    DefaultedDuration {
        element: String,
        index: usize,
        value: String,
    },

    /// A JSON event could not be placed in the output
    #[error("{element} {index}: {reason}")]
    SkippedEvent {
        element: String,
        index: usize,
        reason: String,
    },

    /// Events between or around a staff's measures were merged into the nearest one
    #[error("staff {staff}: {count} event(s) outside <measure> merged into the neighbouring measure")]
    LooseEvents { staff: String, count: usize },

    /// A `<staff>` without `@n` was given a free staff number
    #[error("{place}: <staff> without @n read as staff {assigned}")]
    UnnumberedStaff { place: String, assigned: String },

    /// Fewer elements of a kind in the output than in the source
    #[error("data loss: {before} {element} element(s) in source, {after} in output")]
    DataLoss {
        element: String,
        before: usize,
        after: usize,
    },

    /// The declared source format was replaced by the detected one
    #[error("source declared as {declared} but detected as {detected}")]
    FormatDetected { declared: String, detected: String },
}

impl TransformWarning {
    /// Log the warning and hand it back, for `warnings.push(w.logged())`
    pub fn logged(self) -> Self {
        log::warn!("{}", self);
        self
    }
}
