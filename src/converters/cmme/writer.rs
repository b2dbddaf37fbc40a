//! Document → CMME XML

use crate::converters::errors::ConversionError;
use crate::converters::xml::{sanitize_element_name, XmlElement};
use crate::mappings::element_name;
use crate::models::{Dialect, Document, Event, Note, OtherElement, Part, Rest};

const TARGET: Dialect = Dialect::Cmme;

/// Build pretty-printed CMME XML (no declaration)
pub fn build(doc: &Document, indent: usize) -> Result<String, ConversionError> {
    to_element(doc).to_pretty_string(indent)
}

/// Build the `<cmme>` element tree
pub fn to_element(doc: &Document) -> XmlElement {
    let mut root = XmlElement::new("cmme");

    let fields: Vec<XmlElement> = doc
        .metadata
        .iter()
        .filter(|(_, v)| !v.is_empty())
        .map(|(k, v)| XmlElement::new(sanitize_element_name(k)).with_text(v))
        .collect();
    if !fields.is_empty() {
        let mut metadata = XmlElement::new("metadata");
        metadata.children = fields;
        root.push(metadata);
    }

    let mut score = XmlElement::new("score");
    for part in &doc.parts {
        score.push(staff_element(part));
    }
    root.push(score);

    root.declare_passthrough_namespaces();
    root
}

fn staff_element(part: &Part) -> XmlElement {
    let mut staff = XmlElement::new("staff").attr("name", part.name.as_str());
    if !part.id.is_empty() {
        staff.set_attr("id", part.id.as_str());
    }

    if let Some(clef) = &part.clef {
        staff.push(
            XmlElement::new("clef")
                .attr("shape", clef.shape.as_str())
                .attr("line", clef.line.as_str()),
        );
    }
    if let Some(key) = &part.key {
        staff.push(XmlElement::new("key").attr("signature", key.signature.as_str()));
    }
    if let Some(time) = &part.time {
        staff.push(XmlElement::new("time").attr("signature", time.signature.as_str()));
    }

    for measure in &part.measures {
        let mut el = XmlElement::new("measure").attr("number", measure.number.as_str());
        el.children = measure.events.iter().map(event_element).collect();
        staff.push(el);
    }
    staff
}

fn event_element(event: &Event) -> XmlElement {
    match event {
        Event::Note(note) => note_element(note),
        Event::Rest(rest) => rest_element(rest),
        Event::Chord(chord) => {
            let mut el = XmlElement::new("chord");
            el.set_foreign_attrs(&chord.extra, TARGET);
            el.children = chord.notes.iter().map(note_element).collect();
            el.children.extend(chord.children.iter().map(other_element));
            el
        }
        Event::Other(other) => other_element(other),
    }
}

fn note_element(note: &Note) -> XmlElement {
    let mut el = XmlElement::new("note")
        .attr("pitch", note.pitch.to_cmme())
        .attr("duration", note.duration.to_cmme());
    if let Some(id) = &note.xml_id {
        el.set_attr("id", id.as_str());
    }
    el.set_foreign_attrs(&note.extra, TARGET);

    for articulation in &note.articulations {
        let mut artic = XmlElement::new("articulation");
        if !articulation.kind.is_empty() {
            artic.set_attr("type", articulation.kind.as_str());
        }
        artic.set_foreign_attrs(&articulation.attrs, TARGET);
        el.push(artic);
    }

    if let Some(ligature) = &note.ligature {
        let mut lig = XmlElement::new("ligature");
        if let Some(position) = &ligature.position {
            lig.set_attr("position", position.cmme_position());
        }
        lig.set_foreign_attrs(&ligature.attrs, TARGET);
        el.push(lig);
    }

    if let Some(mensuration) = &note.mensuration {
        let mut mens = XmlElement::new("mensuration");
        if let Some(sign) = mensuration.cmme_sign() {
            mens.set_attr("sign", sign);
        }
        mens.set_foreign_attrs(&mensuration.attrs, TARGET);
        el.push(mens);
    }

    if let Some(coloration) = &note.coloration {
        let mut color = XmlElement::new("coloration")
            .attr("type", coloration.kind.as_deref().unwrap_or("blackened"));
        color.set_foreign_attrs(&coloration.attrs, TARGET);
        el.push(color);
    }

    if let Some(editorial) = &note.editorial {
        let mut ed = XmlElement::new("editorial");
        for (name, value) in [
            ("type", &editorial.kind),
            ("source", &editorial.source),
            ("certainty", &editorial.certainty),
        ] {
            if let Some(value) = value {
                ed.set_attr(name, value.as_str());
            }
        }
        ed.set_foreign_attrs(&editorial.attrs, TARGET);
        el.push(ed);
    }

    for child in &note.children {
        el.push(other_element(child));
    }
    el
}

fn rest_element(rest: &Rest) -> XmlElement {
    let mut el = XmlElement::new("rest").attr("duration", rest.duration.to_cmme());
    if let Some(id) = &rest.xml_id {
        el.set_attr("id", id.as_str());
    }
    el.set_foreign_attrs(&rest.extra, TARGET);
    el
}

fn other_element(other: &OtherElement) -> XmlElement {
    let mut el = XmlElement::new(element_name(&other.tag, other.origin, TARGET));
    el.set_foreign_attrs(&other.attrs, TARGET);
    el.text = other.text.clone();
    el.children = other.children.iter().map(event_element).collect();
    el
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::converters::cmme::reader;

    #[test]
    fn test_metadata_and_staff_layout() {
        let mut doc = Document::default();
        doc.metadata.insert("title", "Kyrie");
        doc.metadata.insert("source library", "Trent");
        doc.parts.push(Part {
            id: "1".to_string(),
            name: "Tenor".to_string(),
            ..Default::default()
        });
        let out = build(&doc, 2).unwrap();
        assert!(out.contains("<title>Kyrie</title>"), "{}", out);
        assert!(out.contains("<source_library>Trent</source_library>"), "{}", out);
        assert!(out.contains(r#"<staff name="Tenor" id="1"/>"#), "{}", out);
    }

    #[test]
    fn test_round_trip_through_reader() {
        let xml = r#"<cmme><score><staff name="T" id="1"><clef shape="C" line="4"/>
            <measure number="1">
                <note pitch="C.#4" duration="half double-dot" id="n1">
                    <articulation type="accent"/>
                    <ligature position="end"/>
                    <mensuration sign="C."/>
                    <coloration type="red"/>
                </note>
                <chord><note pitch="E4" duration="whole"/><note pitch="G4" duration="whole"/></chord>
                <rest duration="brevis"/>
            </measure></staff></score></cmme>"#;
        let doc = reader::parse(xml).unwrap();
        let out = build(&doc, 2).unwrap();
        let again = reader::parse(&out).unwrap();
        assert_eq!(doc, again);
        assert!(out.contains(r#"<note pitch="C.#4" duration="half double-dot" id="n1">"#), "{}", out);
        assert!(out.contains(r#"<mensuration sign="C."/>"#), "{}", out);
    }
}
