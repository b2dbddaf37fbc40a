//! Mapping tables shared by readers, writers and the JSON codec
//!
//! The tables are built once per process and never mutated, so every
//! conversion can read them concurrently.

pub mod tables;

use crate::models::format::Dialect;
use lazy_static::lazy_static;
use std::borrow::Cow;
use std::collections::HashMap;

pub use tables::{DOT_SUFFIXES, DURATION_SYNONYMS, MENSURATION_SIGNS};

/// Bidirectional CMME ↔ MEI lookup
pub struct BiTable {
    to_mei: HashMap<&'static str, &'static str>,
    to_cmme: HashMap<&'static str, &'static str>,
}

impl BiTable {
    fn from_pairs(pairs: &[(&'static str, &'static str)]) -> Self {
        let mut to_mei = HashMap::with_capacity(pairs.len());
        let mut to_cmme = HashMap::with_capacity(pairs.len());
        for &(cmme, mei) in pairs {
            to_mei.insert(cmme, mei);
            to_cmme.insert(mei, cmme);
        }
        Self { to_mei, to_cmme }
    }

    pub fn to_mei(&self, cmme: &str) -> Option<&'static str> {
        self.to_mei.get(cmme).copied()
    }

    pub fn to_cmme(&self, mei: &str) -> Option<&'static str> {
        self.to_cmme.get(mei).copied()
    }

    /// Translate a name read from `from` into the other dialect
    pub fn translate(&self, name: &str, from: Dialect) -> Option<&'static str> {
        match from {
            Dialect::Cmme => self.to_mei(name),
            Dialect::Mei => self.to_cmme(name),
        }
    }

    /// Translate into `to`, passing unknown names through unchanged
    pub fn convert<'a>(&self, name: &'a str, from: Dialect, to: Dialect) -> Cow<'a, str> {
        if from == to {
            return Cow::Borrowed(name);
        }
        match self.translate(name, from) {
            Some(mapped) => Cow::Borrowed(mapped),
            None => Cow::Borrowed(name),
        }
    }
}

lazy_static! {
    pub static ref ELEMENT_NAMES: BiTable = BiTable::from_pairs(tables::ELEMENT_PAIRS);
    pub static ref ATTRIBUTE_NAMES: BiTable = BiTable::from_pairs(tables::ATTRIBUTE_PAIRS);
    pub static ref ARTICULATIONS: BiTable = BiTable::from_pairs(tables::ARTICULATION_PAIRS);
    pub static ref LIGATURE_FORMS: BiTable = BiTable::from_pairs(tables::LIGATURE_PAIRS);
}

/// Element name to use in `to` for an element read from `from`
pub fn element_name<'a>(tag: &'a str, from: Dialect, to: Dialect) -> Cow<'a, str> {
    ELEMENT_NAMES.convert(tag, from, to)
}

/// Attribute name to write in `target` for an attribute read from `origin`
///
/// Same-dialect attributes keep their bare name. Across dialects the
/// attribute table is consulted first; anything unmapped is qualified with
/// the origin prefix so it survives the trip. `xml:*` names are universal.
pub fn attribute_name<'a>(name: &'a str, origin: Dialect, target: Dialect) -> Cow<'a, str> {
    if origin == target || name.starts_with("xml:") {
        return Cow::Borrowed(name);
    }
    match ATTRIBUTE_NAMES.translate(name, origin) {
        Some(mapped) => Cow::Borrowed(mapped),
        None => Cow::Owned(format!("{}:{}", origin.prefix(), name)),
    }
}

/// Conventional reading of a mensuration sign, if it is one of the known signs
pub fn mensuration_meaning(sign: &str) -> Option<&'static str> {
    MENSURATION_SIGNS
        .iter()
        .find(|(s, _)| *s == sign)
        .map(|(_, meaning)| *meaning)
}
