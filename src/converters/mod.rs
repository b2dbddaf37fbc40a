//! Format converters
//!
//! `cmme` and `mei` read and write their dialect through the shared
//! [`Document`](crate::models::Document) model. `json` converts between JSON
//! and either dialect directly on the XML tree.

pub mod cmme;
pub mod errors;
pub mod json;
pub mod mei;
pub mod xml;

pub use errors::{ConversionError, ParseError};

use crate::transform::TransformWarning;

/// Running per-kind element indices, used to locate errors, plus the
/// recoverable issues met while reading
#[derive(Debug, Default)]
pub(crate) struct ReaderContext {
    notes: usize,
    rests: usize,
    chords: usize,
    pub(crate) warnings: Vec<TransformWarning>,
}

impl ReaderContext {
    pub(crate) fn next_note(&mut self) -> usize {
        self.notes += 1;
        self.notes - 1
    }

    pub(crate) fn next_rest(&mut self) -> usize {
        self.rests += 1;
        self.rests - 1
    }

    pub(crate) fn next_chord(&mut self) -> usize {
        self.chords += 1;
        self.chords - 1
    }

    pub(crate) fn warn(&mut self, warning: TransformWarning) {
        self.warnings.push(warning.logged());
    }

    pub(crate) fn notes(&self) -> usize {
        self.notes
    }

    pub(crate) fn rests(&self) -> usize {
        self.rests
    }
}
