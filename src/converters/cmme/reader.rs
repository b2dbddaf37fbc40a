//! CMME XML → Document
//!
//! Accepts `<cmme>` roots with or without an explicit `<score>`, staves
//! directly under the score or wrapped in `<parts>`, and staves without
//! measure boundaries.

use crate::converters::errors::ParseError;
use crate::converters::ReaderContext;
use crate::converters::xml::{
    attr, child_elements, children_named, foreign_attributes, get_child, is_named, local_name,
    parse_xml, text_of,
};
use crate::models::{
    Articulation, Chord, Clef, Coloration, Dialect, Document, DurationSpec, Editorial, Event,
    KeySig, Ligature, LigaturePosition, Measure, Mensuration, Metadata, Note, OtherElement, Part,
    PitchSpec, Rest, TimeSig,
};
use crate::transform::TransformWarning;
use roxmltree::Node;
use std::collections::HashMap;

const OWN: Dialect = Dialect::Cmme;

/// Staff-level setup elements, never events
const STAFF_SETUP: [&str; 3] = ["clef", "key", "time"];

/// Parse CMME XML into a Document
pub fn parse(xml: &str) -> Result<Document, ParseError> {
    parse_with_warnings(xml).map(|(doc, _)| doc)
}

/// [`parse`], also returning the recoverable issues met on the way
pub fn parse_with_warnings(xml: &str) -> Result<(Document, Vec<TransformWarning>), ParseError> {
    let doc = parse_xml(xml)?;
    let root = doc.root_element();
    if local_name(root) != "cmme" {
        return Err(ParseError::UnexpectedRoot {
            expected: "cmme".to_string(),
            found: local_name(root).to_string(),
        });
    }

    let metadata = read_metadata(root);
    let score = get_child(root, "score").unwrap_or(root);
    let defaults = ScoreDefaults::collect(score);

    let mut ctx = ReaderContext::default();
    let mut parts = Vec::new();

    for (index, staff) in staves_of(score).into_iter().enumerate() {
        parts.push(read_staff(staff, index, &defaults, &mut ctx)?);
    }

    log::debug!(
        "Parsed CMME document: {} parts, {} notes, {} rests",
        parts.len(),
        ctx.notes(),
        ctx.rests()
    );

    Ok((Document { metadata, parts }, ctx.warnings))
}

/// `<metadata>` children as an ordered map, empty values skipped
pub fn read_metadata(root: Node) -> Metadata {
    let mut metadata = Metadata::new();
    if let Some(block) = get_child(root, "metadata") {
        for field in child_elements(block) {
            if let Some(value) = text_of(field) {
                metadata.insert(local_name(field), value);
            }
        }
    }
    metadata
}

/// Staves of a score: direct `<staff>` children, else those in `<parts>`,
/// else the score itself as one implicit staff when it holds loose content
pub(crate) fn staves_of<'a, 'i>(score: Node<'a, 'i>) -> Vec<Node<'a, 'i>> {
    let mut staves: Vec<Node> = children_named(score, "staff").collect();
    if staves.is_empty() {
        if let Some(parts) = get_child(score, "parts") {
            staves = children_named(parts, "staff").collect();
        }
    }
    if staves.is_empty() && has_loose_content(score) {
        log::debug!("CMME score has no <staff>; reading it as a single implicit staff");
        staves.push(score);
    }
    staves
}

/// `<clef|key|time staff="id">` placed directly under the score
pub(crate) struct ScoreDefaults<'a, 'i> {
    by_staff: HashMap<String, Vec<Node<'a, 'i>>>,
}

impl<'a, 'i> ScoreDefaults<'a, 'i> {
    pub(crate) fn collect(score: Node<'a, 'i>) -> Self {
        let mut by_staff: HashMap<String, Vec<Node<'a, 'i>>> = HashMap::new();
        for node in child_elements(score) {
            if STAFF_SETUP.contains(&local_name(node)) {
                if let Some(staff) = attr(node, "staff") {
                    by_staff.entry(staff.to_string()).or_default().push(node);
                }
            }
        }
        Self { by_staff }
    }

    fn get(&self, tag: &str, staff_id: &str) -> Option<Node<'a, 'i>> {
        self.by_staff
            .get(staff_id)?
            .iter()
            .find(|n| local_name(**n) == tag)
            .copied()
    }

    /// The staff's own `<clef|key|time>`, else the score-level one for `staff_id`
    pub(crate) fn setup(&self, staff: Node<'a, 'i>, tag: &str, staff_id: &str) -> Option<Node<'a, 'i>> {
        get_child(staff, tag).or_else(|| self.get(tag, staff_id))
    }
}

fn has_loose_content(score: Node) -> bool {
    child_elements(score).any(|n| {
        let tag = local_name(n);
        tag != "metadata" && tag != "parts" && !STAFF_SETUP.contains(&tag)
    })
}

/// Children of a staff that are measures or events
pub(crate) fn staff_content<'a, 'i: 'a>(staff: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    child_elements(staff).filter(|n| {
        let tag = local_name(*n);
        !STAFF_SETUP.contains(&tag) && !matches!(tag, "metadata" | "parts" | "staff")
    })
}

pub(crate) fn staff_id(staff: Node, index: usize) -> String {
    attr(staff, "id")
        .map(str::to_string)
        .unwrap_or_else(|| (index + 1).to_string())
}

pub(crate) fn measure_number(measure: Node, index: usize) -> String {
    attr(measure, "number")
        .or_else(|| attr(measure, "n"))
        .map(str::to_string)
        .unwrap_or_else(|| (index + 1).to_string())
}

/// Events of a staff grouped by measure
///
/// Events outside any `<measure>` join the nearest one: those before the
/// first measure are prepended to it, later ones are appended to the measure
/// they follow. A staff with no measures at all becomes measure "1". The
/// second value counts the merged events when measures do exist.
pub(crate) fn group_staff<'a, 'i: 'a, E, F>(
    staff: Node<'a, 'i>,
    mut read: F,
) -> Result<(Vec<(String, Vec<E>)>, usize), ParseError>
where
    F: FnMut(Node<'a, 'i>) -> Result<E, ParseError>,
{
    let mut measures: Vec<(String, Vec<E>)> = Vec::new();
    let mut leading: Vec<E> = Vec::new();
    let mut loose = 0;

    for node in staff_content(staff) {
        if is_named(node, "measure") {
            let number = measure_number(node, measures.len());
            let mut events = Vec::new();
            if measures.is_empty() {
                events.append(&mut leading);
            }
            for child in child_elements(node) {
                events.push(read(child)?);
            }
            measures.push((number, events));
        } else {
            let event = read(node)?;
            loose += 1;
            match measures.last_mut() {
                Some((_, events)) => events.push(event),
                None => leading.push(event),
            }
        }
    }

    if measures.is_empty() {
        if !leading.is_empty() {
            measures.push(("1".to_string(), leading));
        }
        loose = 0;
    }
    Ok((measures, loose))
}

fn read_staff<'a, 'i>(
    staff: Node<'a, 'i>,
    index: usize,
    defaults: &ScoreDefaults<'a, 'i>,
    ctx: &mut ReaderContext,
) -> Result<Part, ParseError> {
    let id = staff_id(staff, index);
    let setup = |tag: &str| defaults.setup(staff, tag, &id);

    let clef = setup("clef").map(|n| Clef {
        shape: attr(n, "shape").unwrap_or("G").to_string(),
        line: attr(n, "line").unwrap_or("2").to_string(),
    });
    let key = setup("key").map(|n| KeySig {
        signature: attr(n, "signature").unwrap_or("0").to_string(),
    });
    let time = setup("time").map(|n| TimeSig {
        signature: attr(n, "signature").unwrap_or("4/4").to_string(),
    });

    let (grouped, loose) = group_staff(staff, |n| read_event(n, ctx))?;
    if loose > 0 {
        ctx.warn(TransformWarning::LooseEvents {
            staff: id.clone(),
            count: loose,
        });
    }
    let measures = grouped
        .into_iter()
        .map(|(number, events)| Measure { number, events })
        .collect();

    Ok(Part {
        id,
        name: attr(staff, "name").unwrap_or_default().to_string(),
        clef,
        key,
        time,
        measures,
    })
}

fn read_events<'a, 'i: 'a>(
    nodes: impl Iterator<Item = Node<'a, 'i>>,
    ctx: &mut ReaderContext,
) -> Result<Vec<Event>, ParseError> {
    nodes.map(|n| read_event(n, ctx)).collect()
}

fn read_event(node: Node, ctx: &mut ReaderContext) -> Result<Event, ParseError> {
    match local_name(node) {
        "note" => read_note(node, ctx).map(Event::Note),
        "rest" => read_rest(node, ctx).map(Event::Rest),
        "chord" => {
            ctx.next_chord();
            let mut notes = Vec::new();
            let mut children = Vec::new();
            for child in child_elements(node) {
                if is_named(child, "note") {
                    notes.push(read_note(child, ctx)?);
                } else {
                    children.push(read_other(child, ctx)?);
                }
            }
            Ok(Event::Chord(Chord {
                notes,
                extra: foreign_attributes(node, OWN, &[]),
                children,
            }))
        }
        _ => read_other(node, ctx).map(Event::Other),
    }
}

fn read_other(node: Node, ctx: &mut ReaderContext) -> Result<OtherElement, ParseError> {
    Ok(OtherElement {
        origin: OWN,
        tag: local_name(node).to_string(),
        attrs: foreign_attributes(node, OWN, &[]),
        text: text_of(node),
        children: read_events(child_elements(node), ctx)?,
    })
}

fn read_note(node: Node, ctx: &mut ReaderContext) -> Result<Note, ParseError> {
    let index = ctx.next_note();

    let pitch_text =
        attr(node, "pitch").ok_or_else(|| ParseError::missing_attribute("note", index, "pitch"))?;
    let duration_text = attr(node, "duration")
        .ok_or_else(|| ParseError::missing_attribute("note", index, "duration"))?;

    let pitch = PitchSpec::parse_cmme(pitch_text)
        .ok_or_else(|| ParseError::invalid_attribute("note", index, "pitch", pitch_text))?;
    let duration = DurationSpec::parse_cmme(duration_text)
        .ok_or_else(|| ParseError::invalid_attribute("note", index, "duration", duration_text))?;

    let mut note = Note::new(pitch, duration);
    note.xml_id = attr(node, "id").map(str::to_string);
    note.extra = foreign_attributes(node, OWN, &["pitch", "duration", "id"]);

    for child in child_elements(node) {
        match local_name(child) {
            "articulation" => note.articulations.push(Articulation {
                kind: attr(child, "type").unwrap_or_default().to_string(),
                attrs: foreign_attributes(child, OWN, &["type"]),
            }),
            "ligature" => {
                note.ligature = Some(Ligature {
                    position: attr(child, "position").map(LigaturePosition::from_cmme),
                    attrs: foreign_attributes(child, OWN, &["position"]),
                })
            }
            "mensuration" => {
                let mut mensuration = match attr(child, "sign") {
                    Some(sign) => Mensuration::from_cmme_sign(sign),
                    None => Mensuration {
                        sign: None,
                        dot: false,
                        slash: false,
                        attrs: Default::default(),
                    },
                };
                mensuration.attrs = foreign_attributes(child, OWN, &["sign"]);
                note.mensuration = Some(mensuration);
            }
            "coloration" => {
                note.coloration = Some(Coloration {
                    kind: attr(child, "type").map(str::to_string),
                    attrs: foreign_attributes(child, OWN, &["type"]),
                })
            }
            "editorial" => {
                note.editorial = Some(Editorial {
                    kind: attr(child, "type").map(str::to_string),
                    source: attr(child, "source").map(str::to_string),
                    certainty: attr(child, "certainty").map(str::to_string),
                    attrs: foreign_attributes(child, OWN, &["type", "source", "certainty"]),
                })
            }
            _ => note.children.push(read_other(child, ctx)?),
        }
    }

    Ok(note)
}

fn read_rest(node: Node, ctx: &mut ReaderContext) -> Result<Rest, ParseError> {
    let index = ctx.next_rest();
    let duration_text = attr(node, "duration")
        .ok_or_else(|| ParseError::missing_attribute("rest", index, "duration"))?;
    let duration = DurationSpec::parse_cmme(duration_text)
        .ok_or_else(|| ParseError::invalid_attribute("rest", index, "duration", duration_text))?;

    Ok(Rest {
        duration,
        xml_id: attr(node, "id").map(str::to_string),
        extra: foreign_attributes(node, OWN, &["duration", "id"]),
    })
}
