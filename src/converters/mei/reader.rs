//! MEI XML → Document
//!
//! Elements are matched by local name, so namespaced (`<mei xmlns=...>`,
//! `<mei:mei>`) and bare documents read the same way.

use crate::converters::errors::ParseError;
use crate::converters::xml::{
    attr, child_elements, find_descendant, foreign_attributes, is_named, local_name, parse_xml,
    text_of, xml_id,
};
use crate::converters::ReaderContext;
use crate::mappings::ARTICULATIONS;
use crate::models::pitch_spec::is_gestural_accidental;
use crate::models::{
    Accidental, Articulation, AttrMap, Chord, Clef, Coloration, Dialect, Document, DurationSpec,
    Editorial, Event, KeySig, Ligature, LigaturePosition, Measure, Mensuration, Metadata, Note,
    OtherElement, Part, PitchSpec, Rest, TimeSig,
};
use crate::transform::TransformWarning;
use roxmltree::Node;

const OWN: Dialect = Dialect::Mei;

/// Header elements that are containers, or read separately, never metadata fields
const HEADER_SKIP: [&str; 7] = [
    "meiHead",
    "fileDesc",
    "titleStmt",
    "pubStmt",
    "encodingDesc",
    "title",
    "composer",
];

/// Parse MEI XML into a Document
pub fn parse(xml: &str) -> Result<Document, ParseError> {
    parse_with_warnings(xml).map(|(doc, _)| doc)
}

/// [`parse`], also returning the recoverable issues met on the way
pub fn parse_with_warnings(xml: &str) -> Result<(Document, Vec<TransformWarning>), ParseError> {
    let doc = parse_xml(xml)?;
    let root = doc.root_element();
    if local_name(root) != "mei" {
        return Err(ParseError::UnexpectedRoot {
            expected: "mei".to_string(),
            found: local_name(root).to_string(),
        });
    }

    let metadata = read_metadata(root);
    let score = find_score(root);
    let mut parts = read_staff_defs(score);

    if parts.is_empty() {
        parts = infer_parts(score);
    }

    let mut ctx = ReaderContext::default();
    let measures: Vec<Node> = score
        .descendants()
        .filter(|n| is_named(*n, "measure"))
        .collect();

    if measures.is_empty() {
        read_unmeasured(score, &mut parts, &mut ctx)?;
    } else {
        for (index, measure) in measures.into_iter().enumerate() {
            let number = attr(measure, "n")
                .map(str::to_string)
                .unwrap_or_else(|| (index + 1).to_string());
            let staves: Vec<Node> = measure
                .descendants()
                .filter(|n| is_named(*n, "staff"))
                .collect();
            let known: Vec<&str> = parts.iter().map(|p| p.id.as_str()).collect();
            let numbers = number_staves(&staves, &known, &format!("measure {}", number), &mut ctx.warnings);
            for (staff, staff_n) in staves.into_iter().zip(numbers) {
                let events = read_staff_content(staff, &mut ctx)?;
                part_for(&mut parts, &staff_n).measures.push(Measure {
                    number: number.clone(),
                    events,
                });
            }
        }
    }

    log::debug!(
        "Parsed MEI document: {} parts, {} notes, {} rests",
        parts.len(),
        ctx.notes(),
        ctx.rests()
    );

    Ok((Document { metadata, parts }, ctx.warnings))
}

/// Title and composer first, then every other header field with text
pub fn read_metadata(root: Node) -> Metadata {
    let mut metadata = Metadata::new();
    let Some(head) = root.descendants().find(|n| is_named(*n, "meiHead")) else {
        return metadata;
    };

    for key in ["title", "composer"] {
        if let Some(value) = find_descendant(head, key).and_then(text_of) {
            metadata.insert(key, value);
        }
    }
    for node in head.descendants().filter(|n| n.is_element()) {
        let tag = local_name(node);
        if HEADER_SKIP.contains(&tag) {
            continue;
        }
        if let Some(value) = text_of(node) {
            metadata.insert(tag, value);
        }
    }
    metadata
}

/// `score`, else `mdiv`, else `body`, else the root itself
pub(crate) fn find_score<'a, 'i>(root: Node<'a, 'i>) -> Node<'a, 'i> {
    ["score", "mdiv", "body"]
        .iter()
        .find_map(|name| root.descendants().find(|n| is_named(*n, name)))
        .unwrap_or(root)
}

pub(crate) fn read_staff_defs(score: Node) -> Vec<Part> {
    let mut parts: Vec<Part> = Vec::new();
    for def in score.descendants().filter(|n| is_named(*n, "staffDef")) {
        let Some(n) = attr(def, "n") else { continue };
        if parts.iter().any(|p| p.id == n) {
            // Later scoreDefs restate or change a staff; the first one defines the part
            continue;
        }

        let name = attr(def, "label")
            .map(str::to_string)
            .or_else(|| find_descendant(def, "label").and_then(text_of))
            .unwrap_or_default();

        let shape = attr(def, "clef.shape");
        let line = attr(def, "clef.line");
        let clef = (shape.is_some() || line.is_some()).then(|| Clef {
            shape: shape.unwrap_or("G").to_string(),
            line: line.unwrap_or("2").to_string(),
        });

        parts.push(Part {
            id: n.to_string(),
            name,
            clef,
            key: attr(def, "key.sig").map(|sig| KeySig {
                signature: sig.to_string(),
            }),
            time: staff_def_time(def),
            measures: Vec::new(),
        });
    }
    parts
}

/// `meter.count/meter.unit`, else `mensur.*` reassembled, else `meter.sym`
fn staff_def_time(def: Node) -> Option<TimeSig> {
    if let (Some(count), Some(unit)) = (attr(def, "meter.count"), attr(def, "meter.unit")) {
        return Some(TimeSig {
            signature: format!("{}/{}", count, unit),
        });
    }
    if let Some(sign) = attr(def, "mensur.sign") {
        let mensuration = Mensuration {
            sign: Some(sign.to_string()),
            dot: attr(def, "mensur.dot") == Some("true"),
            slash: attr(def, "mensur.slash") == Some("true"),
            attrs: AttrMap::new(),
        };
        return mensuration.cmme_sign().map(|signature| TimeSig { signature });
    }
    attr(def, "meter.sym").map(|sym| TimeSig {
        signature: sym.to_string(),
    })
}

/// One part per distinct `staff@n`, in numeric order where possible
pub(crate) fn infer_parts(score: Node) -> Vec<Part> {
    let mut numbers: Vec<&str> = Vec::new();
    for staff in score.descendants().filter(|n| is_named(*n, "staff")) {
        if let Some(n) = attr(staff, "n") {
            if !numbers.contains(&n) {
                numbers.push(n);
            }
        }
    }
    numbers.sort_by(|a, b| match (a.parse::<u32>(), b.parse::<u32>()) {
        (Ok(x), Ok(y)) => x.cmp(&y),
        _ => a.cmp(b),
    });
    numbers.into_iter().map(new_part).collect()
}

/// `@n` of every staff, in order
///
/// A staff without `@n` takes the first of `known` not otherwise used in
/// `staves`, else the lowest free number, and a warning is recorded.
pub(crate) fn number_staves(
    staves: &[Node],
    known: &[&str],
    place: &str,
    warnings: &mut Vec<TransformWarning>,
) -> Vec<String> {
    let mut used: Vec<String> = staves
        .iter()
        .filter_map(|s| attr(*s, "n"))
        .map(str::to_string)
        .collect();
    let mut numbers = Vec::with_capacity(staves.len());
    for staff in staves {
        if let Some(n) = attr(*staff, "n") {
            numbers.push(n.to_string());
            continue;
        }
        let assigned = known
            .iter()
            .find(|id| !used.iter().any(|u| u == *id))
            .map(|id| id.to_string())
            .or_else(|| {
                (1..)
                    .map(|k: usize| k.to_string())
                    .find(|k| !used.contains(k) && !known.contains(&k.as_str()))
            })
            .unwrap_or_default();
        warnings.push(
            TransformWarning::UnnumberedStaff {
                place: place.to_string(),
                assigned: assigned.clone(),
            }
            .logged(),
        );
        used.push(assigned.clone());
        numbers.push(assigned);
    }
    numbers
}

fn new_part(n: &str) -> Part {
    Part {
        id: n.to_string(),
        name: format!("Staff {}", n),
        ..Default::default()
    }
}

fn part_for<'p>(parts: &'p mut Vec<Part>, staff_n: &str) -> &'p mut Part {
    match parts.iter().position(|p| p.id == staff_n) {
        Some(i) => &mut parts[i],
        None => {
            log::debug!("staff {} has no staffDef; adding a part for it", staff_n);
            parts.push(new_part(staff_n));
            let last = parts.len() - 1;
            &mut parts[last]
        }
    }
}

/// No `<measure>` anywhere: synthesize measure "1" per staff, or for the whole score
fn read_unmeasured(score: Node, parts: &mut Vec<Part>, ctx: &mut ReaderContext) -> Result<(), ParseError> {
    let staves: Vec<Node> = score
        .descendants()
        .filter(|n| is_named(*n, "staff"))
        .collect();

    if !staves.is_empty() {
        let known: Vec<&str> = parts.iter().map(|p| p.id.as_str()).collect();
        let numbers = number_staves(&staves, &known, "score", &mut ctx.warnings);
        for (staff, staff_n) in staves.into_iter().zip(numbers) {
            let events = read_staff_content(staff, ctx)?;
            let part = part_for(parts, &staff_n);
            match part.measures.first_mut() {
                Some(measure) => measure.events.extend(events),
                None => part.measures.push(Measure {
                    number: "1".to_string(),
                    events,
                }),
            }
        }
        return Ok(());
    }

    let layers: Vec<Node> = score
        .descendants()
        .filter(|n| is_named(*n, "layer"))
        .collect();
    let events = if layers.is_empty() {
        let container = find_descendant(score, "section").unwrap_or(score);
        read_events(
            child_elements(container).filter(|n| {
                !matches!(local_name(*n), "scoreDef" | "staffDef" | "staffGrp" | "meiHead")
            }),
            ctx,
        )?
    } else {
        merge_layers(&layers, ctx)?
    };

    if events.is_empty() {
        return Ok(());
    }
    if parts.is_empty() {
        parts.push(new_part("1"));
    }
    parts[0].measures.push(Measure {
        number: "1".to_string(),
        events,
    });
    Ok(())
}

/// Events of one staff in one measure, layers merged
fn read_staff_content(staff: Node, ctx: &mut ReaderContext) -> Result<Vec<Event>, ParseError> {
    let layers: Vec<Node> = staff
        .descendants()
        .filter(|n| is_named(*n, "layer"))
        .collect();
    if layers.is_empty() {
        read_events(child_elements(staff), ctx)
    } else {
        merge_layers(&layers, ctx)
    }
}

/// Bucket layer contents by `@n` in first-seen order, then concatenate
fn merge_layers(layers: &[Node], ctx: &mut ReaderContext) -> Result<Vec<Event>, ParseError> {
    let mut buckets: Vec<(String, Vec<Event>)> = Vec::new();
    for layer in layers {
        let n = attr(*layer, "n").unwrap_or("1");
        let events = read_events(child_elements(*layer), ctx)?;
        match buckets.iter_mut().find(|(k, _)| k == n) {
            Some((_, bucket)) => bucket.extend(events),
            None => buckets.push((n.to_string(), events)),
        }
    }
    Ok(buckets.into_iter().flat_map(|(_, events)| events).collect())
}

fn read_events<'a, 'i: 'a>(
    nodes: impl Iterator<Item = Node<'a, 'i>>,
    ctx: &mut ReaderContext,
) -> Result<Vec<Event>, ParseError> {
    nodes.map(|n| read_event(n, ctx)).collect()
}

fn read_event(node: Node, ctx: &mut ReaderContext) -> Result<Event, ParseError> {
    match local_name(node) {
        "note" => read_note(node, ctx, None).map(Event::Note),
        "rest" => read_rest(node, ctx).map(Event::Rest),
        "chord" => {
            ctx.next_chord();
            let inherited = attr(node, "dur").map(|dur| (dur, attr(node, "dots")));
            let notes = node
                .descendants()
                .filter(|n| is_named(*n, "note"))
                .map(|n| read_note(n, ctx, inherited))
                .collect::<Result<Vec<_>, _>>()?;
            // Wrappers around notes are flattened above; anything else is kept
            let children = chord_extras(node)
                .map(|n| read_other(n, ctx))
                .collect::<Result<Vec<_>, _>>()?;
            let mut consumed = vec![];
            if inherited.is_some() {
                consumed.extend(["dur", "dots"]);
            }
            Ok(Event::Chord(Chord {
                notes,
                extra: foreign_attributes(node, OWN, &consumed),
                children,
            }))
        }
        _ => read_other(node, ctx).map(Event::Other),
    }
}

/// Chord children that hold no notes
pub(crate) fn chord_extras<'a, 'i: 'a>(chord: Node<'a, 'i>) -> impl Iterator<Item = Node<'a, 'i>> {
    child_elements(chord).filter(|n| !n.descendants().any(|d| is_named(d, "note")))
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

fn read_note(
    node: Node,
    ctx: &mut ReaderContext,
    inherited: Option<(&str, Option<&str>)>,
) -> Result<Note, ParseError> {
    let index = ctx.next_note();
    let required = |name: &str| {
        attr(node, name).ok_or_else(|| ParseError::missing_attribute("note", index, name))
    };

    let pname = required("pname")?;
    let oct = required("oct")?;
    let (dur, dots) = match attr(node, "dur") {
        Some(dur) => (dur, attr(node, "dots")),
        None => inherited.ok_or_else(|| ParseError::missing_attribute("note", index, "dur"))?,
    };

    let mut consumed = vec!["pname", "oct", "dur", "dots", "xml:id"];

    let accid_attr = attr(node, "accid");
    let accid = accid_attr.and_then(Accidental::from_mei_code);
    if accid.is_some() {
        consumed.push("accid");
    }
    let accid_ges = match (accid_attr, attr(node, "accid.ges")) {
        (None, Some(ges)) if is_gestural_accidental(ges) => {
            consumed.push("accid.ges");
            Some(ges)
        }
        _ => None,
    };

    let pitch = PitchSpec::from_mei(pname, oct, accid, accid_ges).ok_or_else(|| {
        if PitchSpec::from_mei(pname, "0", None, None).is_none() {
            ParseError::invalid_attribute("note", index, "pname", pname)
        } else {
            ParseError::invalid_attribute("note", index, "oct", oct)
        }
    })?;
    let duration = DurationSpec::from_mei(dur, dots).ok_or_else(|| match dots {
        Some(d) if DurationSpec::from_mei(dur, None).is_some() => {
            ParseError::invalid_attribute("note", index, "dots", d)
        }
        _ => ParseError::invalid_attribute("note", index, "dur", dur),
    })?;

    let mut note = Note::new(pitch, duration);
    note.xml_id = xml_id(node).map(str::to_string);

    if attr(node, "colored") == Some("true") {
        note.coloration = Some(Coloration {
            kind: attr(node, "color").map(str::to_string),
            attrs: AttrMap::new(),
        });
        consumed.extend(["colored", "color"]);
    }

    if let Some(values) = attr(node, "artic") {
        note.articulations.extend(values.split_whitespace().map(|v| Articulation {
            kind: ARTICULATIONS.to_cmme(v).unwrap_or(v).to_string(),
            attrs: AttrMap::new(),
        }));
        consumed.push("artic");
    }

    note.extra = foreign_attributes(node, OWN, &consumed);

    for child in child_elements(node) {
        match local_name(child) {
            "artic" => {
                let value = attr(child, "artic").or_else(|| attr(child, "type"));
                note.articulations.push(Articulation {
                    kind: value
                        .map(|v| ARTICULATIONS.to_cmme(v).unwrap_or(v))
                        .unwrap_or_default()
                        .to_string(),
                    attrs: foreign_attributes(child, OWN, &["artic", "type"]),
                });
            }
            "ligature" => {
                note.ligature = Some(Ligature {
                    position: attr(child, "form").map(LigaturePosition::from_mei),
                    attrs: foreign_attributes(child, OWN, &["form"]),
                })
            }
            "mensur" => {
                note.mensuration = Some(Mensuration {
                    sign: attr(child, "sign").map(str::to_string),
                    dot: attr(child, "dot") == Some("true"),
                    slash: attr(child, "slash") == Some("true"),
                    attrs: foreign_attributes(child, OWN, &["sign", "dot", "slash"]),
                })
            }
            "supplied" => {
                note.editorial = Some(Editorial {
                    kind: attr(child, "reason").map(str::to_string),
                    source: attr(child, "source").map(str::to_string),
                    certainty: attr(child, "cert").map(str::to_string),
                    attrs: foreign_attributes(child, OWN, &["reason", "source", "cert"]),
                })
            }
            _ => note.children.push(read_other(child, ctx)?),
        }
    }

    Ok(note)
}

fn read_rest(node: Node, ctx: &mut ReaderContext) -> Result<Rest, ParseError> {
    let index = ctx.next_rest();
    let dur = attr(node, "dur").ok_or_else(|| ParseError::missing_attribute("rest", index, "dur"))?;
    let duration = DurationSpec::from_mei(dur, attr(node, "dots"))
        .ok_or_else(|| ParseError::invalid_attribute("rest", index, "dur", dur))?;

    Ok(Rest {
        duration,
        xml_id: xml_id(node).map(str::to_string),
        extra: foreign_attributes(node, OWN, &["dur", "dots", "xml:id"]),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{DurationValue, MEI_NS};

    fn sample() -> String {
        format!(
            r#"<mei xmlns="{ns}">
              <meiHead><fileDesc>
                <titleStmt><title>Missa Prolationum</title><composer>Ockeghem</composer></titleStmt>
                <pubStmt><date>1490</date></pubStmt>
              </fileDesc></meiHead>
              <music><body><mdiv><score>
                <scoreDef><staffGrp>
                  <staffDef n="1" lines="5" clef.shape="C" clef.line="1" mensur.sign="O" mensur.dot="true"><label>Superius</label></staffDef>
                  <staffDef n="2" lines="5" meter.count="3" meter.unit="2"/>
                </staffGrp></scoreDef>
                <section>
                  <measure n="1">
                    <staff n="1">
                      <layer n="1"><note xml:id="a" pname="c" oct="4" dur="4" accid.ges="s"/></layer>
                      <layer n="2"><rest dur="2" dots="1"/></layer>
                      <layer n="1"><note pname="e" oct="4" dur="breve" colored="true"/></layer>
                    </staff>
                    <staff n="2"><layer n="1">
                      <chord dur="1"><note pname="f" oct="3"/><note pname="a" oct="3" accid="f"/></chord>
                    </layer></staff>
                  </measure>
                </section>
              </score></mdiv></body></music>
            </mei>"#,
            ns = MEI_NS
        )
    }

    #[test]
    fn test_metadata_order() {
        let doc = parse(&sample()).unwrap();
        let fields: Vec<_> = doc.metadata.iter().collect();
        assert_eq!(
            fields,
            vec![("title", "Missa Prolationum"), ("composer", "Ockeghem"), ("date", "1490")]
        );
    }

    #[test]
    fn test_staff_defs_become_parts() {
        let doc = parse(&sample()).unwrap();
        assert_eq!(doc.parts.len(), 2);
        assert_eq!(doc.parts[0].name, "Superius");
        assert_eq!(doc.parts[0].clef.as_ref().unwrap().shape, "C");
        assert_eq!(doc.parts[0].time.as_ref().unwrap().signature, "O.");
        assert_eq!(doc.parts[1].time.as_ref().unwrap().signature, "3/2");
    }

    #[test]
    fn test_layers_merge_in_first_seen_order() {
        let doc = parse(&sample()).unwrap();
        let events = &doc.parts[0].measures[0].events;
        let kinds: Vec<_> = events.iter().map(Event::kind).collect();
        // layer 1 (both blocks), then layer 2
        assert_eq!(kinds, vec!["note", "note", "rest"]);
        match &events[0] {
            Event::Note(n) => {
                assert_eq!(n.pitch.to_cmme(), "C.#4");
                assert_eq!(n.xml_id.as_deref(), Some("a"));
            }
            other => panic!("expected note, got {:?}", other),
        }
        match &events[1] {
            Event::Note(n) => assert!(n.coloration.is_some()),
            other => panic!("expected note, got {:?}", other),
        }
    }

    #[test]
    fn test_chord_duration_is_inherited() {
        let doc = parse(&sample()).unwrap();
        match &doc.parts[1].measures[0].events[0] {
            Event::Chord(chord) => {
                assert_eq!(chord.notes.len(), 2);
                assert!(chord.notes.iter().all(|n| n.duration.value == DurationValue::Whole));
                assert_eq!(chord.notes[1].pitch.to_cmme(), "Ab3");
                assert!(chord.extra.is_empty());
            }
            other => panic!("expected chord, got {:?}", other),
        }
    }

    #[test]
    fn test_parts_inferred_without_staff_defs() {
        let xml = r#"<mei><music><body><mdiv><score><section>
            <measure n="1"><staff n="2"><layer><note pname="g" oct="3" dur="1"/></layer></staff>
                           <staff n="1"><layer><rest dur="1"/></layer></staff></measure>
        </section></score></mdiv></body></music></mei>"#;
        let doc = parse(xml).unwrap();
        let ids: Vec<_> = doc.parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(doc.parts[0].name, "Staff 1");
        assert_eq!(doc.parts[1].measures[0].events.len(), 1);
    }

    #[test]
    fn test_unmeasured_content_is_kept() {
        let xml = r#"<mei><music><body><mdiv><score><section>
            <note pname="d" oct="4" dur="2"/><rest dur="4"/>
        </section></score></mdiv></body></music></mei>"#;
        let doc = parse(xml).unwrap();
        assert_eq!(doc.parts.len(), 1);
        assert_eq!(doc.parts[0].measures[0].number, "1");
        assert_eq!(doc.parts[0].measures[0].events.len(), 2);
    }

    #[test]
    fn test_missing_pname_reports_index() {
        let xml = r#"<mei><music><body><mdiv><score><section><measure n="1"><staff n="1"><layer>
            <note pname="c" oct="4" dur="4"/><note oct="4" dur="4"/>
        </layer></staff></measure></section></score></mdiv></body></music></mei>"#;
        let err = parse(xml).unwrap_err();
        assert_eq!(err, ParseError::missing_attribute("note", 1, "pname"));
    }

    #[test]
    fn test_note_children_and_attributes() {
        let xml = r#"<mei><music><body><mdiv><score><section><measure n="1"><staff n="1"><layer>
            <note pname="b" oct="3" dur="2" accid="n" stem.dir="up" artic="stacc">
                <artic artic="acc"/>
                <ligature form="initial"/>
                <mensur sign="C" slash="true"/>
                <supplied reason="ficta" cert="high"/>
                <verse><syl>Ky</syl></verse>
            </note>
        </layer></staff></measure></section></score></mdiv></body></music></mei>"#;
        let doc = parse(xml).unwrap();
        let note = doc.notes()[0].clone();
        assert_eq!(note.pitch.to_cmme(), "B3");
        assert_eq!(note.extra.get("accid"), Some("n"));
        assert_eq!(note.extra.get("stem.dir"), Some("up"));
        let kinds: Vec<_> = note.articulations.iter().map(|a| a.kind.as_str()).collect();
        assert_eq!(kinds, vec!["staccato", "accent"]);
        assert_eq!(note.ligature.unwrap().position, Some(LigaturePosition::Start));
        assert_eq!(note.mensuration.unwrap().cmme_sign().as_deref(), Some("C/"));
        assert_eq!(note.editorial.unwrap().kind.as_deref(), Some("ficta"));
        assert_eq!(note.children[0].tag, "verse");
    }

    #[test]
    fn test_unnumbered_staff_takes_a_free_number() {
        let xml = r#"<mei><music><body><mdiv><score>
            <scoreDef><staffGrp><staffDef n="1"/><staffDef n="2"/></staffGrp></scoreDef>
            <section><measure n="1">
                <staff n="1"><layer><note pname="c" oct="4" dur="1"/></layer></staff>
                <staff><layer><note pname="g" oct="3" dur="1"/></layer></staff>
            </measure></section>
        </score></mdiv></body></music></mei>"#;
        let (doc, warnings) = parse_with_warnings(xml).unwrap();
        assert_eq!(doc.parts.len(), 2);
        assert_eq!(doc.parts[1].measures[0].events.len(), 1);
        assert_eq!(doc.notes()[1].pitch.to_cmme(), "G3");
        assert_eq!(
            warnings,
            vec![TransformWarning::UnnumberedStaff {
                place: "measure 1".to_string(),
                assigned: "2".to_string(),
            }]
        );
    }

    #[test]
    fn test_unnumbered_staff_beyond_known_parts() {
        let xml = r#"<mei><music><body><mdiv><score><section><measure n="4">
            <staff n="1"><layer><rest dur="1"/></layer></staff>
            <staff><layer><rest dur="2"/></layer></staff>
        </measure></section></score></mdiv></body></music></mei>"#;
        let (doc, warnings) = parse_with_warnings(xml).unwrap();
        let ids: Vec<_> = doc.parts.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "2"]);
        assert_eq!(doc.parts[1].measures[0].number, "4");
        assert_eq!(warnings.len(), 1);
    }

    #[test]
    fn test_chord_keeps_non_note_children() {
        let xml = r#"<mei><music><body><mdiv><score><section><measure n="1"><staff n="1"><layer>
            <chord dur="2"><note pname="c" oct="4"/><artic artic="acc"/></chord>
        </layer></staff></measure></section></score></mdiv></body></music></mei>"#;
        let doc = parse(xml).unwrap();
        match &doc.parts[0].measures[0].events[0] {
            Event::Chord(chord) => {
                assert_eq!(chord.notes.len(), 1);
                assert_eq!(chord.children.len(), 1);
                assert_eq!(chord.children[0].tag, "artic");
            }
            other => panic!("expected chord, got {:?}", other),
        }
    }
}
