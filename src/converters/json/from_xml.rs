//! CMME / MEI XML → JSON
//!
//! Events keep their dialect's own attribute names (`pitch`/`duration` for
//! CMME, `pname`/`oct`/`dur` for MEI). Ligature, mensuration, coloration and
//! editorial children use one shared vocabulary in both flavors so they
//! survive a trip through JSON into either dialect.

use crate::converters::cmme::reader::{group_staff, staff_id, staves_of, ScoreDefaults};
use crate::converters::errors::ParseError;
use crate::converters::mei::reader::{chord_extras, find_score, infer_parts, number_staves, read_staff_defs};
use crate::converters::xml::{
    attr, child_elements, children_named, find_descendant, foreign_attributes, get_child,
    is_named, local_name, parse_xml, text_of,
};
use crate::converters::{cmme, mei};
use crate::models::{Dialect, LigaturePosition, Mensuration, Metadata, Part};
use crate::transform::TransformWarning;
use roxmltree::Node;
use serde_json::{Map, Value};

type Object = Map<String, Value>;

fn string(value: impl Into<String>) -> Value {
    Value::String(value.into())
}

fn metadata_object(metadata: &Metadata) -> Value {
    Value::Object(
        metadata
            .iter()
            .map(|(k, v)| (k.to_string(), string(v)))
            .collect(),
    )
}

/// Attributes not in `skip`, keyed by their name in `own` (`prefix:name` for the other dialect)
fn copy_attributes(node: Node, own: Dialect, skip: &[&str], into: &mut Object) {
    for a in &foreign_attributes(node, own, skip) {
        let key = if a.origin == own {
            a.name.clone()
        } else {
            format!("{}:{}", a.origin.prefix(), a.name)
        };
        into.insert(key, string(a.value.as_str()));
    }
}

fn root_of<'a, 'i>(doc: &'a roxmltree::Document<'i>, expected: &str) -> Result<Node<'a, 'i>, ParseError> {
    let root = doc.root_element();
    if local_name(root) != expected {
        return Err(ParseError::UnexpectedRoot {
            expected: expected.to_string(),
            found: local_name(root).to_string(),
        });
    }
    Ok(root)
}

// ============================================================================
// CMME
// ============================================================================

pub fn cmme_to_json(xml: &str) -> Result<Value, ParseError> {
    cmme_to_json_with_warnings(xml).map(|(value, _)| value)
}

/// [`cmme_to_json`], also returning the recoverable issues met on the way
pub fn cmme_to_json_with_warnings(xml: &str) -> Result<(Value, Vec<TransformWarning>), ParseError> {
    let doc = parse_xml(xml)?;
    let root = root_of(&doc, "cmme")?;
    let score = get_child(root, "score").unwrap_or(root);
    let defaults = ScoreDefaults::collect(score);

    let mut warnings = Vec::new();
    let parts: Vec<Value> = staves_of(score)
        .into_iter()
        .enumerate()
        .map(|(index, staff)| cmme_part(staff, index, &defaults, &mut warnings).map(Value::Object))
        .collect::<Result<_, _>>()?;

    let mut out = Object::new();
    out.insert("format".to_string(), string("cmme"));
    out.insert("metadata".to_string(), metadata_object(&cmme::read_metadata(root)));
    out.insert("parts".to_string(), Value::Array(parts));
    log::debug!("CMME → JSON: {} parts", out["parts"].as_array().map_or(0, Vec::len));
    Ok((Value::Object(out), warnings))
}

fn cmme_part<'a, 'i>(
    staff: Node<'a, 'i>,
    index: usize,
    defaults: &ScoreDefaults<'a, 'i>,
    warnings: &mut Vec<TransformWarning>,
) -> Result<Object, ParseError> {
    let id = staff_id(staff, index);
    let mut part = Object::new();
    part.insert("id".to_string(), string(id.as_str()));
    part.insert(
        "name".to_string(),
        string(attr(staff, "name").map(str::to_string).unwrap_or_else(|| format!("Staff {}", index + 1))),
    );

    if let Some(clef) = defaults.setup(staff, "clef", &id) {
        let mut c = Object::new();
        c.insert("shape".to_string(), string(attr(clef, "shape").unwrap_or("G")));
        c.insert("line".to_string(), string(attr(clef, "line").unwrap_or("2")));
        part.insert("clef".to_string(), Value::Object(c));
    }
    for (tag, default) in [("key", "0"), ("time", "4/4")] {
        if let Some(node) = defaults.setup(staff, tag, &id) {
            let mut sig = Object::new();
            sig.insert("signature".to_string(), string(attr(node, "signature").unwrap_or(default)));
            part.insert(tag.to_string(), Value::Object(sig));
        }
    }

    let (grouped, loose) = group_staff(staff, |n| Ok(cmme_event(n)))?;
    if loose > 0 {
        warnings.push(TransformWarning::LooseEvents { staff: id, count: loose }.logged());
    }
    let measures = grouped
        .into_iter()
        .map(|(number, events)| measure_object(number, events))
        .collect();
    part.insert("measures".to_string(), Value::Array(measures));
    Ok(part)
}

fn measure_object(number: String, events: Vec<Value>) -> Value {
    let mut m = Object::new();
    m.insert("number".to_string(), string(number));
    m.insert("events".to_string(), Value::Array(events));
    Value::Object(m)
}

fn cmme_event(node: Node) -> Value {
    match local_name(node) {
        "note" => Value::Object(cmme_note(node, true, false)),
        "rest" => {
            let mut rest = Object::new();
            rest.insert("type".to_string(), string("rest"));
            rest.insert("duration".to_string(), string(attr(node, "duration").unwrap_or_default()));
            copy_attributes(node, Dialect::Cmme, &["duration"], &mut rest);
            Value::Object(rest)
        }
        "chord" => {
            let notes: Vec<Node> = children_named(node, "note").collect();
            let extras: Vec<Value> = child_elements(node)
                .filter(|n| !is_named(*n, "note"))
                .map(|n| Value::Object(other_event(n, Dialect::Cmme)))
                .collect();
            // A duration shared by every member moves up to the chord
            let shared = notes
                .first()
                .and_then(|n| attr(*n, "duration"))
                .filter(|d| notes.iter().all(|n| attr(*n, "duration") == Some(*d)));

            let mut chord = Object::new();
            chord.insert("type".to_string(), string("chord"));
            if let Some(duration) = shared {
                chord.insert("duration".to_string(), string(duration));
            }
            copy_attributes(node, Dialect::Cmme, &[], &mut chord);
            chord.insert(
                "notes".to_string(),
                Value::Array(
                    notes
                        .into_iter()
                        .map(|n| Value::Object(cmme_note(n, false, shared.is_some())))
                        .collect(),
                ),
            );
            if !extras.is_empty() {
                chord.insert("children".to_string(), Value::Array(extras));
            }
            Value::Object(chord)
        }
        _ => Value::Object(other_event(node, Dialect::Cmme)),
    }
}

fn cmme_note(node: Node, typed: bool, omit_duration: bool) -> Object {
    let mut note = Object::new();
    if typed {
        note.insert("type".to_string(), string("note"));
    }
    note.insert("pitch".to_string(), string(attr(node, "pitch").unwrap_or_default()));
    if !omit_duration {
        note.insert("duration".to_string(), string(attr(node, "duration").unwrap_or_default()));
    }
    copy_attributes(node, Dialect::Cmme, &["pitch", "duration"], &mut note);

    let mut articulations = Vec::new();
    let mut children = Vec::new();
    for child in child_elements(node) {
        match local_name(child) {
            "articulation" => {
                let mut a = Object::new();
                a.insert("type".to_string(), string(attr(child, "type").unwrap_or_default()));
                copy_attributes(child, Dialect::Cmme, &["type"], &mut a);
                articulations.push(Value::Object(a));
            }
            "ligature" => {
                if let Some(position) = attr(child, "position") {
                    note.insert("ligature".to_string(), string(position));
                }
            }
            "mensuration" => {
                if let Some(sign) = attr(child, "sign") {
                    note.insert("mensuration".to_string(), string(sign));
                }
            }
            "coloration" => {
                let mut extra = Object::new();
                copy_attributes(child, Dialect::Cmme, &["type"], &mut extra);
                let value = match attr(child, "type") {
                    Some(kind) if !extra.is_empty() => {
                        let mut c = Object::new();
                        c.insert("type".to_string(), string(kind));
                        c.extend(extra);
                        Value::Object(c)
                    }
                    None if !extra.is_empty() => Value::Object(extra),
                    Some(kind) => string(kind),
                    None => Value::Bool(true),
                };
                note.insert("coloration".to_string(), value);
            }
            "editorial" => {
                note.insert(
                    "editorial".to_string(),
                    editorial_object(child, [("type", "type"), ("source", "source"), ("certainty", "certainty")]),
                );
            }
            _ => children.push(Value::Object(other_event(child, Dialect::Cmme))),
        }
    }
    if !articulations.is_empty() {
        note.insert("articulations".to_string(), Value::Array(articulations));
    }
    if !children.is_empty() {
        note.insert("children".to_string(), Value::Array(children));
    }
    note
}

/// `[(json key, attribute)]`
fn editorial_object(node: Node, keys: [(&str, &str); 3]) -> Value {
    let mut ed = Object::new();
    for (key, name) in keys {
        if let Some(value) = attr(node, name) {
            ed.insert(key.to_string(), string(value));
        }
    }
    Value::Object(ed)
}

/// Generic element: tag as `type`, attributes, text and nested events
fn other_event(node: Node, own: Dialect) -> Object {
    let mut event = Object::new();
    event.insert("type".to_string(), string(local_name(node)));
    let mut attrs = Object::new();
    copy_attributes(node, own, &[], &mut attrs);
    for (key, value) in attrs {
        // `type` holds the tag, so a `type` attribute keeps its prefix
        let key = if key == "type" {
            format!("{}:type", own.prefix())
        } else {
            key
        };
        event.insert(key, value);
    }
    if let Some(text) = text_of(node) {
        event.insert("text".to_string(), string(text));
    }
    let children: Vec<Value> = child_elements(node)
        .map(|child| match own {
            Dialect::Cmme => cmme_event(child),
            Dialect::Mei => mei_event(child, None),
        })
        .collect();
    if !children.is_empty() {
        event.insert("children".to_string(), Value::Array(children));
    }
    event
}

// ============================================================================
// MEI
// ============================================================================

struct JsonPart {
    header: Object,
    id: String,
    /// (source measure index, number, events)
    measures: Vec<(usize, String, Vec<Value>)>,
}

impl JsonPart {
    fn from_part(part: &Part) -> Self {
        let mut header = Object::new();
        header.insert("id".to_string(), string(part.id.as_str()));
        let name = if part.name.is_empty() {
            format!("Staff {}", part.id)
        } else {
            part.name.clone()
        };
        header.insert("name".to_string(), string(name));
        if let Some(clef) = &part.clef {
            let mut c = Object::new();
            c.insert("shape".to_string(), string(clef.shape.as_str()));
            c.insert("line".to_string(), string(clef.line.as_str()));
            header.insert("clef".to_string(), Value::Object(c));
        }
        if let Some(key) = &part.key {
            let mut k = Object::new();
            k.insert("signature".to_string(), string(key.signature.as_str()));
            header.insert("key".to_string(), Value::Object(k));
        }
        if let Some(time) = &part.time {
            let mut t = Object::new();
            t.insert("signature".to_string(), string(time.signature.as_str()));
            header.insert("time".to_string(), Value::Object(t));
        }
        Self {
            header,
            id: part.id.clone(),
            measures: Vec::new(),
        }
    }

    fn add(&mut self, measure_index: usize, number: &str, events: Vec<Value>) {
        match self.measures.last_mut() {
            Some((index, _, existing)) if *index == measure_index => existing.extend(events),
            _ => self.measures.push((measure_index, number.to_string(), events)),
        }
    }

    fn into_value(self) -> Value {
        let mut header = self.header;
        let measures = self
            .measures
            .into_iter()
            .map(|(_, number, events)| measure_object(number, events))
            .collect();
        header.insert("measures".to_string(), Value::Array(measures));
        Value::Object(header)
    }
}

fn part_ids(parts: &[JsonPart]) -> Vec<String> {
    parts.iter().map(|p| p.id.clone()).collect()
}

fn json_part_for<'p>(parts: &'p mut Vec<JsonPart>, staff_n: &str) -> &'p mut JsonPart {
    match parts.iter().position(|p| p.id == staff_n) {
        Some(i) => &mut parts[i],
        None => {
            parts.push(JsonPart::from_part(&Part {
                id: staff_n.to_string(),
                ..Default::default()
            }));
            let last = parts.len() - 1;
            &mut parts[last]
        }
    }
}

pub fn mei_to_json(xml: &str) -> Result<Value, ParseError> {
    mei_to_json_with_warnings(xml).map(|(value, _)| value)
}

/// [`mei_to_json`], also returning the recoverable issues met on the way
pub fn mei_to_json_with_warnings(xml: &str) -> Result<(Value, Vec<TransformWarning>), ParseError> {
    let doc = parse_xml(xml)?;
    let root = root_of(&doc, "mei")?;
    let score = find_score(root);

    let mut defs = read_staff_defs(score);
    if defs.is_empty() {
        defs = infer_parts(score);
    }
    let mut parts: Vec<JsonPart> = defs.iter().map(JsonPart::from_part).collect();
    let mut warnings = Vec::new();

    let measures: Vec<Node> = score
        .descendants()
        .filter(|n| is_named(*n, "measure"))
        .collect();

    if measures.is_empty() {
        let staves: Vec<Node> = score
            .descendants()
            .filter(|n| is_named(*n, "staff"))
            .collect();
        let known = part_ids(&parts);
        let known: Vec<&str> = known.iter().map(String::as_str).collect();
        let numbers = number_staves(&staves, &known, "score", &mut warnings);
        for (staff, n) in staves.into_iter().zip(numbers) {
            json_part_for(&mut parts, &n).add(0, "1", staff_events(staff));
        }
        if parts.iter().all(|p| p.measures.is_empty()) {
            let container = find_descendant(score, "section").unwrap_or(score);
            let events: Vec<Value> = child_elements(container)
                .filter(|n| !matches!(local_name(*n), "scoreDef" | "staffDef" | "staffGrp"))
                .map(|n| mei_event(n, None))
                .collect();
            if !events.is_empty() {
                if parts.is_empty() {
                    parts.push(JsonPart::from_part(&Part {
                        id: "1".to_string(),
                        ..Default::default()
                    }));
                }
                parts[0].add(0, "1", events);
            }
        }
    }

    for (index, measure) in measures.into_iter().enumerate() {
        let number = attr(measure, "n")
            .map(str::to_string)
            .unwrap_or_else(|| (index + 1).to_string());
        let staves: Vec<Node> = measure
            .descendants()
            .filter(|n| is_named(*n, "staff"))
            .collect();
        let known = part_ids(&parts);
        let known: Vec<&str> = known.iter().map(String::as_str).collect();
        let numbers = number_staves(&staves, &known, &format!("measure {}", number), &mut warnings);
        for (staff, n) in staves.into_iter().zip(numbers) {
            json_part_for(&mut parts, &n).add(index, &number, staff_events(staff));
        }
    }

    let mut out = Object::new();
    out.insert("format".to_string(), string("mei"));
    out.insert("metadata".to_string(), metadata_object(&mei::read_metadata(root)));
    out.insert(
        "parts".to_string(),
        Value::Array(parts.into_iter().map(JsonPart::into_value).collect()),
    );
    Ok((Value::Object(out), warnings))
}

/// Layer contents tagged with their layer number
fn staff_events(staff: Node) -> Vec<Value> {
    let layers: Vec<Node> = staff
        .descendants()
        .filter(|n| is_named(*n, "layer"))
        .collect();
    if layers.is_empty() {
        return child_elements(staff).map(|n| mei_event(n, None)).collect();
    }
    layers
        .into_iter()
        .flat_map(|layer| {
            let n = attr(layer, "n").unwrap_or("1");
            child_elements(layer).map(move |child| mei_event(child, Some(n)))
        })
        .collect()
}

fn mei_event(node: Node, layer: Option<&str>) -> Value {
    let tag = local_name(node);
    let mut event = match tag {
        "note" => mei_note(node),
        "rest" | "chord" => {
            let mut e = Object::new();
            copy_attributes(node, Dialect::Mei, &[], &mut e);
            if tag == "chord" {
                let notes = node
                    .descendants()
                    .filter(|n| is_named(*n, "note"))
                    .map(|n| Value::Object(mei_note(n)))
                    .collect();
                e.insert("notes".to_string(), Value::Array(notes));
                let extras: Vec<Value> = chord_extras(node)
                    .map(|n| Value::Object(other_event(n, Dialect::Mei)))
                    .collect();
                if !extras.is_empty() {
                    e.insert("children".to_string(), Value::Array(extras));
                }
            }
            e
        }
        _ => other_event(node, Dialect::Mei),
    };
    // `type` and `layer` lead the object
    let mut out = Object::new();
    out.insert("type".to_string(), string(tag));
    if let Some(n) = layer {
        out.insert("layer".to_string(), string(n));
    }
    event.remove("type");
    out.extend(event);
    Value::Object(out)
}

fn mei_note(node: Node) -> Object {
    let mut note = Object::new();
    let colored = attr(node, "colored") == Some("true");
    let skip: &[&str] = if colored {
        &["artic", "colored", "color"]
    } else {
        &["artic"]
    };
    copy_attributes(node, Dialect::Mei, skip, &mut note);

    let mut artic: Vec<Value> = attr(node, "artic")
        .map(|v| v.split_whitespace().map(string).collect())
        .unwrap_or_default();
    let mut children = Vec::new();
    for child in child_elements(node) {
        match local_name(child) {
            "artic" => {
                if let Some(value) = attr(child, "artic").or_else(|| attr(child, "type")) {
                    artic.push(string(value));
                }
            }
            "ligature" => {
                if let Some(form) = attr(child, "form") {
                    let position = LigaturePosition::from_mei(form);
                    note.insert("ligature".to_string(), string(position.cmme_position()));
                }
            }
            "mensur" => {
                let mensuration = Mensuration {
                    sign: attr(child, "sign").map(str::to_string),
                    dot: attr(child, "dot") == Some("true"),
                    slash: attr(child, "slash") == Some("true"),
                    attrs: Default::default(),
                };
                if let Some(sign) = mensuration.cmme_sign() {
                    note.insert("mensuration".to_string(), string(sign));
                }
            }
            "supplied" => {
                note.insert(
                    "editorial".to_string(),
                    editorial_object(child, [("type", "reason"), ("source", "source"), ("certainty", "cert")]),
                );
            }
            _ => children.push(Value::Object(other_event(child, Dialect::Mei))),
        }
    }
    if colored {
        let value = attr(node, "color").map_or(Value::Bool(true), string);
        note.insert("coloration".to_string(), value);
    }
    if !artic.is_empty() {
        note.insert("artic".to_string(), Value::Array(artic));
    }
    if !children.is_empty() {
        note.insert("children".to_string(), Value::Array(children));
    }
    note
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MEI_NS;

    #[test]
    fn test_cmme_note_shape() {
        let xml = r#"<cmme><metadata><title>Credo</title></metadata><score>
            <staff name="Tenor" id="T"><clef shape="C" line="4"/><time signature="C"/>
            <measure number="1">
                <note pitch="F.#3" duration="brevis dot" id="n1">
                    <articulation type="accent"/>
                    <ligature position="start"/>
                    <coloration/>
                </note>
                <chord><note pitch="A3" duration="half"/><note pitch="C4" duration="half"/></chord>
            </measure></staff></score></cmme>"#;
        let json = cmme_to_json(xml).unwrap();
        assert_eq!(json["format"], "cmme");
        assert_eq!(json["metadata"]["title"], "Credo");
        let part = &json["parts"][0];
        assert_eq!(part["id"], "T");
        assert_eq!(part["clef"]["line"], "4");
        assert_eq!(part["time"]["signature"], "C");

        let note = &part["measures"][0]["events"][0];
        assert_eq!(note["type"], "note");
        assert_eq!(note["pitch"], "F.#3");
        assert_eq!(note["duration"], "brevis dot");
        assert_eq!(note["id"], "n1");
        assert_eq!(note["articulations"][0]["type"], "accent");
        assert_eq!(note["ligature"], "start");
        assert_eq!(note["coloration"], true);

        let chord = &part["measures"][0]["events"][1];
        assert_eq!(chord["duration"], "half");
        assert!(chord["notes"][0].get("duration").is_none());
    }

    #[test]
    fn test_mei_layers_are_tagged() {
        let xml = format!(
            r#"<mei xmlns="{}"><music><body><mdiv><score>
              <scoreDef><staffGrp><staffDef n="1" key.sig="1f" meter.count="2" meter.unit="2"/></staffGrp></scoreDef>
              <section><measure n="7"><staff n="1">
                <layer n="1"><note pname="g" oct="4" dur="1" colored="true" color="red"><artic artic="stacc"/></note></layer>
                <layer n="2"><rest dur="1"/></layer>
              </staff></measure></section>
            </score></mdiv></body></music></mei>"#,
            MEI_NS
        );
        let json = mei_to_json(&xml).unwrap();
        let part = &json["parts"][0];
        assert_eq!(part["name"], "Staff 1");
        assert_eq!(part["key"]["signature"], "1f");
        assert_eq!(part["time"]["signature"], "2/2");
        let measure = &part["measures"][0];
        assert_eq!(measure["number"], "7");
        let events = measure["events"].as_array().unwrap();
        assert_eq!(events[0]["type"], "note");
        assert_eq!(events[0]["layer"], "1");
        assert_eq!(events[0]["pname"], "g");
        assert_eq!(events[0]["coloration"], "red");
        assert!(events[0].get("colored").is_none());
        assert_eq!(events[0]["artic"][0], "stacc");
        assert_eq!(events[1]["type"], "rest");
        assert_eq!(events[1]["layer"], "2");
    }

    #[test]
    fn test_chord_extras_and_coloration_attributes() {
        let xml = r#"<cmme><score><staff id="1"><measure>
            <chord><note pitch="C4" duration="whole"/><articulation type="accent"/></chord>
            <note pitch="D4" duration="whole"><coloration type="red" style="full"/></note>
        </measure></staff></score></cmme>"#;
        let json = cmme_to_json(xml).unwrap();
        let events = &json["parts"][0]["measures"][0]["events"];
        assert_eq!(events[0]["children"][0]["type"], "articulation");
        assert_eq!(events[0]["children"][0]["cmme:type"], "accent");
        assert_eq!(events[0]["notes"].as_array().map(Vec::len), Some(1));
        assert_eq!(events[1]["coloration"]["type"], "red");
        assert_eq!(events[1]["coloration"]["style"], "full");

        let mei = format!(
            r#"<mei xmlns="{}"><music><body><mdiv><score><section><measure n="1"><staff n="1"><layer>
              <chord dur="1"><note pname="c" oct="4"/><artic artic="acc"/></chord>
            </layer></staff></measure></section></score></mdiv></body></music></mei>"#,
            MEI_NS
        );
        let json = mei_to_json(&mei).unwrap();
        let chord = &json["parts"][0]["measures"][0]["events"][0];
        assert_eq!(chord["notes"].as_array().map(Vec::len), Some(1));
        assert_eq!(chord["children"][0]["type"], "artic");
        assert_eq!(chord["children"][0]["artic"], "acc");
    }

    #[test]
    fn test_wrong_root_is_rejected() {
        let err = mei_to_json("<cmme/>").unwrap_err();
        assert_eq!(
            err,
            ParseError::UnexpectedRoot {
                expected: "mei".to_string(),
                found: "cmme".to_string()
            }
        );
    }
}
