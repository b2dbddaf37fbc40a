//! `source-to-target` conversion tokens

use crate::converters::errors::ConversionError;
use crate::models::Format;
use std::fmt;
use std::str::FromStr;

const SEPARATOR: &str = "-to-";

/// A parsed conversion token such as `cmme-to-mei`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConversionType {
    pub source: Format,
    pub target: Format,
}

impl ConversionType {
    pub fn new(source: Format, target: Format) -> Self {
        Self { source, target }
    }

    /// Split on the literal `-to-` and resolve both sides
    pub fn parse(token: &str) -> Result<Self, ConversionError> {
        let Some((source, target)) = token.trim().split_once(SEPARATOR) else {
            return Err(ConversionError::TokenFormat(token.to_string()));
        };
        if source.is_empty() || target.is_empty() || target.contains(SEPARATOR) {
            return Err(ConversionError::TokenFormat(token.to_string()));
        }
        Ok(Self {
            source: resolve(source)?,
            target: resolve(target)?,
        })
    }
}

fn resolve(label: &str) -> Result<Format, ConversionError> {
    label
        .parse::<Format>()
        .map_err(|format| ConversionError::UnsupportedFormat {
            format,
            supported: Format::supported_list(),
        })
}

impl FromStr for ConversionType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for ConversionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}{}", self.source, SEPARATOR, self.target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_valid_tokens() {
        let t = ConversionType::parse("cmme-to-mei").unwrap();
        assert_eq!(t, ConversionType::new(Format::Cmme, Format::Mei));
        assert_eq!(t.to_string(), "cmme-to-mei");
        assert_eq!(
            "json-to-json".parse::<ConversionType>().unwrap(),
            ConversionType::new(Format::Json, Format::Json)
        );
    }

    #[test]
    fn test_wrong_separator_is_token_error() {
        assert_eq!(
            ConversionType::parse("cmme_to_mei"),
            Err(ConversionError::TokenFormat("cmme_to_mei".to_string()))
        );
        assert!(matches!(ConversionType::parse("-to-mei"), Err(ConversionError::TokenFormat(_))));
        assert!(matches!(
            ConversionType::parse("cmme-to-mei-to-json"),
            Err(ConversionError::TokenFormat(_))
        ));
    }

    #[test]
    fn test_unknown_format_lists_supported() {
        match ConversionType::parse("cmme-to-xyz") {
            Err(ConversionError::UnsupportedFormat { format, supported }) => {
                assert_eq!(format, "xyz");
                assert_eq!(supported, "cmme, mei, json");
            }
            other => panic!("expected UnsupportedFormat, got {:?}", other),
        }
    }
}
