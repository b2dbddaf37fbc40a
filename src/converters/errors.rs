//! Error types for notation conversion
//!
//! Fatal, input-related failures are `ParseError`; everything the
//! orchestrator can reject is a `ConversionError`. Recoverable issues are not
//! errors at all and travel as warnings next to the result.

use thiserror::Error;

/// Top-level conversion error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConversionError {
    /// Conversion token is not of the form `source-to-target`
    #[error("Malformed conversion type '{0}': expected 'source-to-target'")]
    TokenFormat(String),

    /// Source or target format is not one of the supported formats
    #[error("Unsupported format '{format}'; supported formats: {supported}")]
    UnsupportedFormat { format: String, supported: String },

    /// Input could not be read
    #[error("{0}")]
    Parse(#[from] ParseError),

    /// Input was read but fails structural checks
    #[error("Validation failed: {0}")]
    Validation(String),

    /// Serializing the output failed
    #[error("Failed to write XML: {0}")]
    XmlWrite(String),

    /// Internal conversion error (should be rare, indicates a bug)
    #[error("Internal conversion error: {0}")]
    Internal(String),
}

/// Fatal input errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    XmlSyntax(String),

    #[error("Invalid JSON: {0}")]
    JsonSyntax(String),

    #[error("Root element must be <{expected}>, found <{found}>")]
    UnexpectedRoot { expected: String, found: String },

    /// Required structural element is missing
    #[error("Missing required element: {0}")]
    MissingRequiredElement(String),

    /// `index` is 0-based and counted per element kind in document order
    #[error("{element} {index}: missing required attribute '{attribute}'")]
    MissingAttribute {
        element: String,
        index: usize,
        attribute: String,
    },

    #[error("{element} {index}: invalid {attribute} '{value}'")]
    InvalidAttribute {
        element: String,
        index: usize,
        attribute: String,
        value: String,
    },
}

impl ParseError {
    pub fn missing_attribute(element: &str, index: usize, attribute: &str) -> Self {
        ParseError::MissingAttribute {
            element: element.to_string(),
            index,
            attribute: attribute.to_string(),
        }
    }

    pub fn invalid_attribute(element: &str, index: usize, attribute: &str, value: &str) -> Self {
        ParseError::InvalidAttribute {
            element: element.to_string(),
            index,
            attribute: attribute.to_string(),
            value: value.to_string(),
        }
    }
}

impl From<roxmltree::Error> for ParseError {
    fn from(e: roxmltree::Error) -> Self {
        ParseError::XmlSyntax(e.to_string())
    }
}

impl From<serde_json::Error> for ParseError {
    fn from(e: serde_json::Error) -> Self {
        ParseError::JsonSyntax(e.to_string())
    }
}

impl From<quick_xml::Error> for ConversionError {
    fn from(e: quick_xml::Error) -> Self {
        ConversionError::XmlWrite(e.to_string())
    }
}
