//! Conversion orchestrator
//!
//! # Overview
//!
//! A conversion runs in six stages:
//! 1. **Token**: resolve `source-to-target`
//! 2. **Preprocess**: BOM, line endings, declaration, DOCTYPE, namespace repair
//! 3. **Metadata**: best-effort header read of the source
//! 4. **Transcode**: reader → [`Document`](crate::models::Document) → writer
//!    for CMME/MEI pairs, the JSON codec for anything involving JSON
//! 5. **Postformat**: declaration, MEI namespace, JSON metadata fill-in
//! 6. **Validate**: the output is checked against the target's rules
//!
//! Only the first and fourth stages can fail. Everything else that goes wrong
//! is reported as a [`TransformWarning`] next to the output.
//!
//! # Basic Usage
//!
//! ```ignore
//! use notation_bridge::transform;
//!
//! let cmme = r#"<cmme><score><staff><measure>
//!   <note pitch="C4" duration="quarter"/>
//! </measure></staff></score></cmme>"#;
//!
//! let result = transform(cmme, "cmme-to-mei")?;
//! println!("{}", result.output);
//! ```

pub mod detect;
pub mod metadata;
pub mod postprocess;
pub mod preprocess;
pub mod settings;
pub mod token;
pub mod validation;
pub mod warnings;

pub use detect::detect_xml_format;
pub use settings::{JsonLayout, TransformSettings};
pub use token::ConversionType;
pub use validation::validate;
pub use warnings::TransformWarning;

use crate::converters::errors::ConversionError;
use crate::converters::xml::{local_name, parse_xml};
use crate::converters::{cmme, json, mei};
use crate::models::{Dialect, Document, Format, Metadata};
use serde::Serialize;

/// Element kinds compared by the data-loss report
const COUNTED_ELEMENTS: [&str; 3] = ["note", "rest", "chord"];

/// A finished conversion
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Transformed {
    pub output: String,
    pub warnings: Vec<TransformWarning>,
}

/// Conversion engine configured by [`TransformSettings`]
///
/// Holds no state besides its settings; one instance can serve any number
/// of conversions.
#[derive(Debug, Clone, Default)]
pub struct Transformer {
    settings: TransformSettings,
}

impl Transformer {
    pub fn new(settings: TransformSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TransformSettings {
        &self.settings
    }

    /// Convert `content` as described by a `source-to-target` token
    pub fn transform(&self, content: &str, conversion_type: &str) -> Result<Transformed, ConversionError> {
        let conversion = ConversionType::parse(conversion_type)?;
        self.run(content, conversion, Vec::new())
    }

    /// Validate the source first, then convert
    ///
    /// Source validation failures become warnings. With `auto_detect_source`
    /// a declared XML source format is replaced by the detected one.
    pub fn validate_and_transform(
        &self,
        content: &str,
        conversion_type: &str,
    ) -> Result<Transformed, ConversionError> {
        let mut conversion = ConversionType::parse(conversion_type)?;
        let mut warnings = Vec::new();

        if conversion.source.dialect().is_some() {
            if let Some(detected) = detect_xml_format(content) {
                if detected != conversion.source {
                    if self.settings.auto_detect_source {
                        warnings.push(
                            TransformWarning::FormatDetected {
                                declared: conversion.source.to_string(),
                                detected: detected.to_string(),
                            }
                            .logged(),
                        );
                        conversion.source = detected;
                    } else {
                        log::info!(
                            "source declared as {} looks like {}; keeping the declared format",
                            conversion.source,
                            detected
                        );
                    }
                }
            }
        }

        if let Err(e) = validate(content, conversion.source) {
            warnings.push(TransformWarning::SourceValidation { message: e.to_string() }.logged());
        }

        self.run(content, conversion, warnings)
    }

    pub fn validate(&self, content: &str, format: Format) -> Result<(), ConversionError> {
        validate(content, format)
    }

    pub fn extract_metadata(&self, content: &str, format: Format) -> Result<Metadata, ConversionError> {
        metadata::extract_metadata(content, format)
    }

    pub fn detect_xml_format(&self, content: &str) -> Option<Format> {
        detect_xml_format(content)
    }

    fn run(
        &self,
        content: &str,
        conversion: ConversionType,
        mut warnings: Vec<TransformWarning>,
    ) -> Result<Transformed, ConversionError> {
        let ConversionType { source, target } = conversion;
        log::info!("Starting transformation from {} to {}", source, target);

        let input = match source {
            Format::Json => preprocess::preprocess(content),
            Format::Cmme | Format::Mei => preprocess::preprocess_xml(content),
        };

        let extracted = match metadata::extract_metadata(&input, source) {
            Ok(md) => md,
            Err(e) => {
                warnings.push(TransformWarning::MetadataExtraction { message: e.to_string() }.logged());
                Metadata::new()
            }
        };

        let output = self.transcode(&input, conversion, &mut warnings)?;
        let output = postprocess::finish(output, target, &extracted)?;

        if self.settings.report_data_loss && source.dialect().is_some() && target.dialect().is_some() {
            warnings.extend(data_loss(&input, &output));
        }

        if self.settings.validate_output {
            if let Err(e) = validate(&output, target) {
                warnings.push(TransformWarning::OutputValidation { message: e.to_string() }.logged());
            }
        }

        log::info!(
            "Finished transformation from {} to {} with {} warning(s)",
            source,
            target,
            warnings.len()
        );
        Ok(Transformed { output, warnings })
    }

    fn transcode(
        &self,
        input: &str,
        conversion: ConversionType,
        warnings: &mut Vec<TransformWarning>,
    ) -> Result<String, ConversionError> {
        let settings = &self.settings;
        match (conversion.source.dialect(), conversion.target.dialect()) {
            (Some(from), Some(to)) => {
                let doc = read_document(input, from, warnings)?;
                write_document(&doc, to, settings.indent)
            }
            (Some(from), None) => json::xml_to_json(input, from, settings, warnings),
            (None, Some(to)) => json::json_to_xml(input, to, settings, warnings),
            (None, None) => json::normalize_json(input, settings),
        }
    }
}

fn read_document(
    xml: &str,
    dialect: Dialect,
    warnings: &mut Vec<TransformWarning>,
) -> Result<Document, ConversionError> {
    let (doc, mut read_warnings) = match dialect {
        Dialect::Cmme => cmme::parse_with_warnings(xml)?,
        Dialect::Mei => mei::parse_with_warnings(xml)?,
    };
    warnings.append(&mut read_warnings);
    Ok(doc)
}

fn write_document(doc: &Document, dialect: Dialect, indent: usize) -> Result<String, ConversionError> {
    match dialect {
        Dialect::Cmme => cmme::build(doc, indent),
        Dialect::Mei => mei::build(doc, indent),
    }
}

/// Counts of [`COUNTED_ELEMENTS`] anywhere in the tree, or `None` if unparsable
fn element_counts(xml: &str) -> Option<[usize; 3]> {
    let doc = parse_xml(xml).ok()?;
    let mut counts = [0; 3];
    for node in doc.descendants().filter(|n| n.is_element()) {
        if let Some(i) = COUNTED_ELEMENTS.iter().position(|k| *k == local_name(node)) {
            counts[i] += 1;
        }
    }
    Some(counts)
}

fn data_loss(source: &str, output: &str) -> Vec<TransformWarning> {
    let (Some(before), Some(after)) = (element_counts(source), element_counts(output)) else {
        log::warn!("could not count elements for the data-loss report");
        return Vec::new();
    };
    COUNTED_ELEMENTS
        .iter()
        .zip(before.iter().zip(after.iter()))
        .filter(|(_, (b, a))| a < b)
        .map(|(element, (b, a))| {
            TransformWarning::DataLoss {
                element: element.to_string(),
                before: *b,
                after: *a,
            }
            .logged()
        })
        .collect()
}

/// [`Transformer::transform`] with default settings
pub fn transform(content: &str, conversion_type: &str) -> Result<Transformed, ConversionError> {
    Transformer::default().transform(content, conversion_type)
}

/// [`Transformer::validate_and_transform`] with default settings
pub fn validate_and_transform(content: &str, conversion_type: &str) -> Result<Transformed, ConversionError> {
    Transformer::default().validate_and_transform(content, conversion_type)
}

/// Best-effort header fields of `content`
pub fn extract_metadata(content: &str, format: Format) -> Result<Metadata, ConversionError> {
    metadata::extract_metadata(content, format)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MEI_NS;

    const CMME: &str = r#"<cmme>
        <metadata><title>Kyrie</title></metadata>
        <score><staff id="1"><measure number="1">
            <note pitch="C4" duration="quarter"/>
            <rest duration="half"/>
        </measure></staff></score>
    </cmme>"#;

    #[test]
    fn test_cmme_to_mei_has_declaration_and_namespace() {
        let result = transform(CMME, "cmme-to-mei").unwrap();
        assert!(result.output.starts_with(postprocess::XML_DECLARATION), "{}", result.output);
        assert!(result.output.contains(&format!("<mei xmlns=\"{}\"", MEI_NS)), "{}", result.output);
        assert!(result.warnings.is_empty(), "{:?}", result.warnings);
    }

    #[test]
    fn test_fatal_errors_stop_the_pipeline() {
        assert!(matches!(transform(CMME, "cmme_to_mei"), Err(ConversionError::TokenFormat(_))));
        assert!(matches!(
            transform("<cmme><score><staff><measure><note pitch=\"C4\"/></measure></staff></score></cmme>", "cmme-to-mei"),
            Err(ConversionError::Parse(_))
        ));
    }

    #[test]
    fn test_json_output_gets_source_metadata() {
        let result = transform(CMME, "cmme-to-json").unwrap();
        let value: serde_json::Value = serde_json::from_str(&result.output).unwrap();
        assert_eq!(value["metadata"]["title"], "Kyrie");
        assert_eq!(value["parts"][0]["measures"][0]["events"][1]["type"], "rest");
    }

    #[test]
    fn test_data_loss_counts() {
        let source = "<cmme><note/><note/><rest/></cmme>";
        let output = "<mei><note/><rest/></mei>";
        let warnings = data_loss(source, output);
        assert_eq!(
            warnings,
            vec![TransformWarning::DataLoss {
                element: "note".to_string(),
                before: 2,
                after: 1,
            }]
        );
    }

    #[test]
    fn test_source_validation_is_a_warning() {
        let xml = r#"<cmme><score><staff><measure>
            <note pitch="C4" duration="quarter"><ligature position="oblique"/></note>
        </measure></staff></score></cmme>"#;
        let result = validate_and_transform(xml, "cmme-to-mei").unwrap();
        assert!(result
            .warnings
            .iter()
            .any(|w| matches!(w, TransformWarning::SourceValidation { .. })));
    }

    #[test]
    fn test_auto_detect_source() {
        let settings = TransformSettings {
            auto_detect_source: true,
            ..Default::default()
        };
        let result = Transformer::new(settings)
            .validate_and_transform(CMME, "mei-to-json")
            .unwrap();
        assert_eq!(
            result.warnings[0],
            TransformWarning::FormatDetected {
                declared: "mei".to_string(),
                detected: "cmme".to_string(),
            }
        );
        assert!(result.output.contains("\"format\": \"cmme\""), "{}", result.output);

        assert!(validate_and_transform(CMME, "mei-to-json").is_err());
    }
}
