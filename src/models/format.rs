//! Notation formats handled by the engine
//!
//! `Format` covers everything a conversion token may name. `Dialect` is the
//! XML-only subset that readers, writers and attribute provenance deal with.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// MEI namespace URI
pub const MEI_NS: &str = "http://www.music-encoding.org/ns/mei";

/// Namespace bound to the `cmme:` prefix for passthrough attributes on MEI output
pub const CMME_NS: &str = "http://www.cmme.org/ns/passthrough";

/// The implicit `xml:` namespace
pub const XML_NS: &str = "http://www.w3.org/XML/1998/namespace";

/// A convertible format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    Cmme,
    Mei,
    Json,
}

impl Format {
    pub const ALL: [Format; 3] = [Format::Cmme, Format::Mei, Format::Json];

    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Cmme => "cmme",
            Format::Mei => "mei",
            Format::Json => "json",
        }
    }

    /// Comma separated list of every supported format label
    pub fn supported_list() -> String {
        Self::ALL
            .iter()
            .map(|f| f.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// File extensions conventionally used for this format
    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Format::Cmme => &[".xml", ".cmme"],
            Format::Mei => &[".xml", ".mei"],
            Format::Json => &[".json"],
        }
    }

    pub fn mime_type(&self) -> &'static str {
        match self {
            Format::Cmme | Format::Mei => "text/xml",
            Format::Json => "application/json",
        }
    }

    /// Check whether a file name carries an extension accepted for this format
    pub fn accepts_file_name(&self, file_name: &str) -> bool {
        let lower = file_name.to_ascii_lowercase();
        match lower.rfind('.') {
            Some(pos) => self.extensions().contains(&&lower[pos..]),
            None => false,
        }
    }

    /// The XML dialect behind this format, if it is one
    pub fn dialect(&self) -> Option<Dialect> {
        match self {
            Format::Cmme => Some(Dialect::Cmme),
            Format::Mei => Some(Dialect::Mei),
            Format::Json => None,
        }
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "cmme" => Ok(Format::Cmme),
            "mei" => Ok(Format::Mei),
            "json" => Ok(Format::Json),
            other => Err(other.to_string()),
        }
    }
}

/// One of the two XML dialects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Dialect {
    Cmme,
    Mei,
}

impl Dialect {
    /// Prefix used when an attribute of this dialect is carried into the other one
    pub fn prefix(&self) -> &'static str {
        match self {
            Dialect::Cmme => "cmme",
            Dialect::Mei => "mei",
        }
    }

    /// Namespace URI bound to [`Dialect::prefix`]
    pub fn namespace(&self) -> &'static str {
        match self {
            Dialect::Cmme => CMME_NS,
            Dialect::Mei => MEI_NS,
        }
    }

    pub fn other(&self) -> Dialect {
        match self {
            Dialect::Cmme => Dialect::Mei,
            Dialect::Mei => Dialect::Cmme,
        }
    }

    pub fn format(&self) -> Format {
        match self {
            Dialect::Cmme => Format::Cmme,
            Dialect::Mei => Format::Mei,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_format_labels() {
        assert_eq!("cmme".parse::<Format>(), Ok(Format::Cmme));
        assert_eq!(" MEI ".parse::<Format>(), Ok(Format::Mei));
        assert_eq!("json".parse::<Format>(), Ok(Format::Json));
        assert_eq!("xyz".parse::<Format>(), Err("xyz".to_string()));
    }

    #[test]
    fn test_supported_list() {
        assert_eq!(Format::supported_list(), "cmme, mei, json");
    }

    #[test]
    fn test_accepts_file_name() {
        assert!(Format::Cmme.accepts_file_name("motet.CMME"));
        assert!(Format::Mei.accepts_file_name("mass.xml"));
        assert!(!Format::Json.accepts_file_name("mass.xml"));
        assert!(!Format::Json.accepts_file_name("README"));
    }
}
