//! Structural checks for each format
//!
//! XML formats are checked by running the dialect reader (root element,
//! well-formedness, pitch and duration on every note and rest) and then
//! applying the value rules the reader is lenient about.

use crate::converters::errors::{ConversionError, ParseError};
use crate::converters::json::read_input;
use crate::converters::xml::{get_child, parse_xml};
use crate::converters::{cmme, mei};
use crate::mappings::mensuration_meaning;
use crate::models::{Document, Format, LigaturePosition};
use crate::transform::preprocess::{preprocess, preprocess_xml};

/// MEI containers every score must be nested in, outermost first
const MEI_SECTIONS: [&str; 4] = ["music", "body", "mdiv", "score"];

/// Check `content` against the structural rules of `format`
pub fn validate(content: &str, format: Format) -> Result<(), ConversionError> {
    match format {
        Format::Json => read_input(&preprocess(content)).map(|_| ()),
        Format::Cmme => {
            let doc = cmme::parse(&preprocess_xml(content))?;
            check_notes(&doc)
        }
        Format::Mei => {
            let text = preprocess_xml(content);
            let doc = mei::parse(&text)?;
            check_mei_sections(&text)?;
            check_notes(&doc)
        }
    }
}

fn check_mei_sections(text: &str) -> Result<(), ConversionError> {
    let doc = parse_xml(text)?;
    let mut node = doc.root_element();
    for section in MEI_SECTIONS {
        node = get_child(node, section)
            .ok_or_else(|| ParseError::MissingRequiredElement(section.to_string()))?;
    }
    Ok(())
}

/// Ligature positions and mensuration signs must come from the fixed vocabularies
fn check_notes(doc: &Document) -> Result<(), ConversionError> {
    for (index, note) in doc.notes().into_iter().enumerate() {
        if let Some(LigaturePosition::Other(value)) =
            note.ligature.as_ref().and_then(|l| l.position.as_ref())
        {
            return Err(ConversionError::Validation(format!(
                "note {}: invalid ligature position '{}'",
                index, value
            )));
        }
        if let Some(sign) = note.mensuration.as_ref().and_then(|m| m.cmme_sign()) {
            if mensuration_meaning(&sign).is_none() {
                return Err(ConversionError::Validation(format!(
                    "note {}: invalid mensuration sign '{}'",
                    index, sign
                )));
            }
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_valid_cmme() {
        let xml = r#"<cmme><score><staff><measure>
            <note pitch="C4" duration="quarter"><ligature position="start"/><mensuration sign="C."/></note>
        </measure></staff></score></cmme>"#;
        assert_eq!(validate(xml, Format::Cmme), Ok(()));
    }

    #[test]
    fn test_cmme_value_rules() {
        let xml = r#"<cmme><score><staff><measure>
            <note pitch="C4" duration="quarter"/>
            <note pitch="D4" duration="quarter"><ligature position="oblique"/></note>
        </measure></staff></score></cmme>"#;
        assert_eq!(
            validate(xml, Format::Cmme),
            Err(ConversionError::Validation("note 1: invalid ligature position 'oblique'".to_string()))
        );

        let xml = r#"<cmme><score><staff><measure>
            <note pitch="C4" duration="quarter"><mensuration sign="Q"/></note>
        </measure></staff></score></cmme>"#;
        assert!(matches!(validate(xml, Format::Cmme), Err(ConversionError::Validation(_))));
    }

    #[test]
    fn test_cmme_missing_duration() {
        let xml = r#"<cmme><score><staff><measure><note pitch="C4"/></measure></staff></score></cmme>"#;
        assert_eq!(
            validate(xml, Format::Cmme),
            Err(ConversionError::from(ParseError::missing_attribute("note", 0, "duration")))
        );
    }

    #[test]
    fn test_mei_requires_score_sections() {
        let ok = r#"<mei xmlns="http://www.music-encoding.org/ns/mei"><music><body><mdiv><score>
            <section><measure n="1"><staff n="1"><layer n="1"><note pname="c" oct="4" dur="4"/></layer></staff></measure></section>
        </score></mdiv></body></music></mei>"#;
        assert_eq!(validate(ok, Format::Mei), Ok(()));

        let missing = "<mei><music><body/></music></mei>";
        assert_eq!(
            validate(missing, Format::Mei),
            Err(ConversionError::from(ParseError::MissingRequiredElement("mdiv".to_string())))
        );
    }

    #[test]
    fn test_json_shape() {
        assert_eq!(validate(r#"{"metadata": {}, "parts": []}"#, Format::Json), Ok(()));
        assert!(matches!(
            validate(r#"{"parts": []}"#, Format::Json),
            Err(ConversionError::Validation(_))
        ));
        assert!(matches!(
            validate("{", Format::Json),
            Err(ConversionError::Parse(ParseError::JsonSyntax(_)))
        ));
    }
}
