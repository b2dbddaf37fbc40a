//! Note and rest durations
//!
//! CMME spells durations as words with an optional dot suffix
//! (`"half double-dot"`), MEI as a numeric or symbolic `dur` code plus a
//! separate `dots` attribute. Both map onto [`DurationSpec`].

use crate::mappings::{DOT_SUFFIXES, DURATION_SYNONYMS};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Maximum number of augmentation dots either dialect can express
pub const MAX_DOTS: u8 = 3;

/// Named duration vocabulary shared by both dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DurationValue {
    Maxima,
    Longa,
    Brevis,
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    #[serde(rename = "32nd")]
    ThirtySecond,
    #[serde(rename = "64th")]
    SixtyFourth,
    #[serde(rename = "128th")]
    HundredTwentyEighth,
}

impl DurationValue {
    pub const ALL: [DurationValue; 11] = [
        DurationValue::Maxima,
        DurationValue::Longa,
        DurationValue::Brevis,
        DurationValue::Whole,
        DurationValue::Half,
        DurationValue::Quarter,
        DurationValue::Eighth,
        DurationValue::Sixteenth,
        DurationValue::ThirtySecond,
        DurationValue::SixtyFourth,
        DurationValue::HundredTwentyEighth,
    ];

    /// CMME `duration` word
    pub fn cmme_name(&self) -> &'static str {
        match self {
            DurationValue::Maxima => "maxima",
            DurationValue::Longa => "longa",
            DurationValue::Brevis => "brevis",
            DurationValue::Whole => "whole",
            DurationValue::Half => "half",
            DurationValue::Quarter => "quarter",
            DurationValue::Eighth => "eighth",
            DurationValue::Sixteenth => "sixteenth",
            DurationValue::ThirtySecond => "32nd",
            DurationValue::SixtyFourth => "64th",
            DurationValue::HundredTwentyEighth => "128th",
        }
    }

    /// MEI `dur` code
    pub fn mei_code(&self) -> &'static str {
        match self {
            DurationValue::Maxima => "maxima",
            DurationValue::Longa => "long",
            DurationValue::Brevis => "breve",
            DurationValue::Whole => "1",
            DurationValue::Half => "2",
            DurationValue::Quarter => "4",
            DurationValue::Eighth => "8",
            DurationValue::Sixteenth => "16",
            DurationValue::ThirtySecond => "32",
            DurationValue::SixtyFourth => "64",
            DurationValue::HundredTwentyEighth => "128",
        }
    }

    /// Look up a CMME word, accepting the mensural synonyms (`minima`, `fusa`, ...)
    pub fn from_cmme_name(name: &str) -> Option<Self> {
        let name = DURATION_SYNONYMS
            .iter()
            .find(|(synonym, _)| *synonym == name)
            .map(|(_, canonical)| *canonical)
            .unwrap_or(name);
        Self::ALL.iter().copied().find(|d| d.cmme_name() == name)
    }

    pub fn from_mei_code(code: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|d| d.mei_code() == code)
    }

    /// Either spelling; used where the source dialect is not known
    pub fn from_any(text: &str) -> Option<Self> {
        Self::from_cmme_name(text).or_else(|| Self::from_mei_code(text))
    }
}

/// A duration value with its augmentation dots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct DurationSpec {
    pub value: DurationValue,
    pub dots: u8,
}

impl DurationSpec {
    pub fn new(value: DurationValue) -> Self {
        Self { value, dots: 0 }
    }

    /// Returns `None` when `dots` exceeds [`MAX_DOTS`]
    pub fn with_dots(value: DurationValue, dots: u8) -> Option<Self> {
        (dots <= MAX_DOTS).then_some(Self { value, dots })
    }

    /// Parse a CMME duration string such as `"half dot"` or `"brevis"`
    pub fn parse_cmme(text: &str) -> Option<Self> {
        let text = text.trim();
        let (base, dots) = split_dot_suffix(text);
        let value = DurationValue::from_cmme_name(base.trim_end())?;
        Some(Self { value, dots })
    }

    /// Build from MEI `dur` / `dots` attribute values
    pub fn from_mei(dur: &str, dots: Option<&str>) -> Option<Self> {
        let value = DurationValue::from_mei_code(dur.trim())?;
        let dots = match dots.map(str::trim) {
            None | Some("") => 0,
            Some(d) => d.parse::<u8>().ok()?,
        };
        Self::with_dots(value, dots)
    }

    /// CMME spelling, dot suffix included
    pub fn to_cmme(&self) -> String {
        let suffix = DOT_SUFFIXES
            .get(self.dots as usize)
            .copied()
            .unwrap_or_default();
        format!("{}{}", self.value.cmme_name(), suffix)
    }

    pub fn mei_dur(&self) -> &'static str {
        self.value.mei_code()
    }

    /// MEI `dots` value; absent for undotted durations
    pub fn mei_dots(&self) -> Option<String> {
        (self.dots > 0).then(|| self.dots.to_string())
    }
}

impl fmt::Display for DurationSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cmme())
    }
}

/// Split `"half double-dot"` into `("half", 2)`
pub fn split_dot_suffix(text: &str) -> (&str, u8) {
    // Longest suffix first: " dot" is a suffix of " double-dot" and " triple-dot"
    for dots in (1..DOT_SUFFIXES.len()).rev() {
        if let Some(base) = text.strip_suffix(DOT_SUFFIXES[dots]) {
            return (base, dots as u8);
        }
    }
    (text, 0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_cmme_with_dots() {
        let d = DurationSpec::parse_cmme("half dot").unwrap();
        assert_eq!(d.value, DurationValue::Half);
        assert_eq!(d.dots, 1);

        let d = DurationSpec::parse_cmme("half double-dot").unwrap();
        assert_eq!(d.dots, 2);
        assert_eq!(d.mei_dur(), "2");
        assert_eq!(d.mei_dots().as_deref(), Some("2"));

        let d = DurationSpec::parse_cmme("quarter triple-dot").unwrap();
        assert_eq!(d.dots, 3);
        assert_eq!(d.to_cmme(), "quarter triple-dot");
    }

    #[test]
    fn test_parse_cmme_plain_and_synonyms() {
        let d = DurationSpec::parse_cmme("brevis").unwrap();
        assert_eq!(d.mei_dur(), "breve");
        assert_eq!(d.mei_dots(), None);

        assert_eq!(
            DurationSpec::parse_cmme("minima").unwrap().value,
            DurationValue::Half
        );
        assert_eq!(
            DurationSpec::parse_cmme("semifusa dot").unwrap().to_cmme(),
            "sixteenth dot"
        );
    }

    #[test]
    fn test_unknown_duration_is_rejected() {
        assert!(DurationSpec::parse_cmme("crotchet").is_none());
        assert!(DurationSpec::from_mei("3", None).is_none());
        assert!(DurationSpec::from_mei("4", Some("4")).is_none());
        assert!(DurationSpec::from_mei("4", Some("x")).is_none());
    }

    #[test]
    fn test_from_mei() {
        let d = DurationSpec::from_mei("long", None).unwrap();
        assert_eq!(d.to_cmme(), "longa");
        let d = DurationSpec::from_mei("2", Some("1")).unwrap();
        assert_eq!(d.to_cmme(), "half dot");
        let d = DurationSpec::from_mei("128", Some("0")).unwrap();
        assert_eq!(d.to_cmme(), "128th");
    }

    #[test]
    fn test_every_value_maps_both_ways() {
        for value in DurationValue::ALL {
            assert_eq!(DurationValue::from_cmme_name(value.cmme_name()), Some(value));
            assert_eq!(DurationValue::from_mei_code(value.mei_code()), Some(value));
        }
    }
}
