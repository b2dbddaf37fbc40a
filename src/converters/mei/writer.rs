//! Document → MEI XML

use crate::converters::errors::ConversionError;
use crate::converters::xml::{sanitize_element_name, XmlElement};
use crate::mappings::{element_name, ARTICULATIONS};
use crate::models::{Dialect, Document, Event, Mensuration, Note, OtherElement, Part, Rest, MEI_NS};

const TARGET: Dialect = Dialect::Mei;

/// Build pretty-printed MEI XML (no declaration)
pub fn build(doc: &Document, indent: usize) -> Result<String, ConversionError> {
    to_element(doc).to_pretty_string(indent)
}

/// Build the `<mei>` element tree
pub fn to_element(doc: &Document) -> XmlElement {
    let mut root = XmlElement::new("mei").attr("xmlns", MEI_NS);
    root.push(header(doc));

    let mut score = XmlElement::new("score");
    score.push(score_def(&doc.parts));
    score.push(section(&doc.parts));

    root.push(
        XmlElement::new("music").child(
            XmlElement::new("body").child(XmlElement::new("mdiv").child(score)),
        ),
    );

    root.declare_passthrough_namespaces();
    root
}

fn header(doc: &Document) -> XmlElement {
    let title = doc.metadata.get("title").unwrap_or_default();
    let mut title_stmt = XmlElement::new("titleStmt").child(XmlElement::new("title").with_text(title));
    if let Some(composer) = doc.metadata.get("composer").filter(|c| !c.is_empty()) {
        title_stmt.push(XmlElement::new("composer").with_text(composer));
    }

    let mut file_desc = XmlElement::new("fileDesc").child(title_stmt);
    let others: Vec<XmlElement> = doc
        .metadata
        .iter()
        .filter(|(k, v)| !matches!(*k, "title" | "composer") && !v.is_empty())
        .map(|(k, v)| XmlElement::new(sanitize_element_name(k)).with_text(v))
        .collect();
    if !others.is_empty() {
        let mut pub_stmt = XmlElement::new("pubStmt");
        pub_stmt.children = others;
        file_desc.push(pub_stmt);
    }

    XmlElement::new("meiHead").child(file_desc)
}

fn staff_n(part: &Part, index: usize) -> String {
    if part.id.is_empty() {
        (index + 1).to_string()
    } else {
        part.id.clone()
    }
}

fn score_def(parts: &[Part]) -> XmlElement {
    let mut grp = XmlElement::new("staffGrp");
    for (index, part) in parts.iter().enumerate() {
        let mut def = XmlElement::new("staffDef")
            .attr("n", staff_n(part, index))
            .attr("lines", "5");
        if let Some(clef) = &part.clef {
            def.set_attr("clef.shape", clef.shape.as_str());
            def.set_attr("clef.line", clef.line.as_str());
        }
        if let Some(key) = &part.key {
            def.set_attr("key.sig", key.signature.as_str());
        }
        if let Some(time) = &part.time {
            set_time_attributes(&mut def, &time.signature);
        }
        if !part.name.is_empty() {
            def.push(XmlElement::new("label").with_text(part.name.as_str()));
        }
        grp.push(def);
    }
    XmlElement::new("scoreDef").child(grp)
}

/// `N/M` meter, a mensuration sign, or a symbol such as `C`
pub(crate) fn set_time_attributes(def: &mut XmlElement, signature: &str) {
    if let Some((count, unit)) = signature.split_once('/') {
        if !count.is_empty() && !unit.is_empty() && unit.chars().all(|c| c.is_ascii_digit()) {
            def.set_attr("meter.count", count);
            def.set_attr("meter.unit", unit);
            return;
        }
    }
    if crate::mappings::mensuration_meaning(signature).is_some() {
        let mensuration = Mensuration::from_cmme_sign(signature);
        set_mensur_attributes(def, &mensuration, "mensur.");
        return;
    }
    def.set_attr("meter.sym", signature);
}

pub(crate) fn set_mensur_attributes(el: &mut XmlElement, mensuration: &Mensuration, prefix: &str) {
    if let Some(sign) = &mensuration.sign {
        el.set_attr(format!("{}sign", prefix), sign.as_str());
    }
    if mensuration.dot {
        el.set_attr(format!("{}dot", prefix), "true");
    }
    if mensuration.slash {
        el.set_attr(format!("{}slash", prefix), "true");
    }
}

/// Measures are aligned by index across parts
fn section(parts: &[Part]) -> XmlElement {
    let mut section = XmlElement::new("section");
    let count = parts.iter().map(|p| p.measures.len()).max().unwrap_or(0);

    for index in 0..count {
        let number = parts
            .iter()
            .find_map(|p| p.measures.get(index))
            .map(|m| m.number.clone())
            .unwrap_or_else(|| (index + 1).to_string());
        let mut measure = XmlElement::new("measure").attr("n", number);

        for (part_index, part) in parts.iter().enumerate() {
            let Some(source) = part.measures.get(index) else { continue };
            let mut layer = XmlElement::new("layer").attr("n", "1");
            layer.children = source.events.iter().map(event_element).collect();
            measure.push(
                XmlElement::new("staff")
                    .attr("n", staff_n(part, part_index))
                    .child(layer),
            );
        }
        section.push(measure);
    }
    section
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
    let mut el = XmlElement::new("note");
    if let Some(id) = &note.xml_id {
        el.set_attr("xml:id", id.as_str());
    }
    for (name, value) in note.pitch.mei_attributes() {
        el.set_attr(name, value);
    }
    el.set_attr("dur", note.duration.mei_dur());
    if let Some(dots) = note.duration.mei_dots() {
        el.set_attr("dots", dots);
    }
    if let Some(coloration) = &note.coloration {
        el.set_attr("colored", "true");
        if let Some(kind) = &coloration.kind {
            el.set_attr("color", kind.as_str());
        }
    }
    el.set_foreign_attrs(&note.extra, TARGET);
    if let Some(coloration) = &note.coloration {
        el.set_foreign_attrs(&coloration.attrs, TARGET);
    }

    for articulation in &note.articulations {
        let mut artic = XmlElement::new("artic");
        if !articulation.kind.is_empty() {
            let kind = articulation.kind.as_str();
            artic.set_attr("artic", ARTICULATIONS.to_mei(kind).unwrap_or(kind));
        }
        artic.set_foreign_attrs(&articulation.attrs, TARGET);
        el.push(artic);
    }

    if let Some(ligature) = &note.ligature {
        let mut lig = XmlElement::new("ligature");
        if let Some(position) = &ligature.position {
            lig.set_attr("form", position.mei_form());
        }
        lig.set_foreign_attrs(&ligature.attrs, TARGET);
        el.push(lig);
    }

    if let Some(mensuration) = &note.mensuration {
        let mut mensur = XmlElement::new("mensur");
        set_mensur_attributes(&mut mensur, mensuration, "");
        mensur.set_foreign_attrs(&mensuration.attrs, TARGET);
        el.push(mensur);
    }

    if let Some(editorial) = &note.editorial {
        let mut supplied = XmlElement::new("supplied");
        for (name, value) in [
            ("reason", &editorial.kind),
            ("source", &editorial.source),
            ("cert", &editorial.certainty),
        ] {
            if let Some(value) = value {
                supplied.set_attr(name, value.as_str());
            }
        }
        supplied.set_foreign_attrs(&editorial.attrs, TARGET);
        el.push(supplied);
    }

    for child in &note.children {
        el.push(other_element(child));
    }
    el
}

fn rest_element(rest: &Rest) -> XmlElement {
    let mut el = XmlElement::new("rest");
    if let Some(id) = &rest.xml_id {
        el.set_attr("xml:id", id.as_str());
    }
    el.set_attr("dur", rest.duration.mei_dur());
    if let Some(dots) = rest.duration.mei_dots() {
        el.set_attr("dots", dots);
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
