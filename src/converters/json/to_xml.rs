//! JSON → CMME / MEI XML
//!
//! Input is assumed to have passed [`super::validate_json`]. Notes may use
//! either vocabulary (`pitch`/`duration` or `pname`/`oct`/`dur`/`dots`);
//! values are normalized to the target dialect. Keys without a meaning here
//! are copied as attributes under the passthrough naming policy.

use super::{events_of, scalar, scalar_field, source_dialect, CodecContext};
use crate::converters::errors::{ConversionError, ParseError};
use crate::converters::mei::writer::{set_mensur_attributes, set_time_attributes};
use crate::converters::xml::{sanitize_element_name, XmlElement};
use crate::mappings::{attribute_name, element_name, ARTICULATIONS, LIGATURE_FORMS};
use crate::models::pitch_spec::is_gestural_accidental;
use crate::models::{Accidental, Dialect, DurationSpec, LigaturePosition, Mensuration, PitchSpec, MEI_NS};
use serde_json::{Map, Value};
use std::borrow::Cow;

type Object = Map<String, Value>;

/// Keys interpreted by the codec, never copied as attributes
const STRUCTURAL_KEYS: [&str; 16] = [
    "type",
    "layer",
    "part",
    "measure",
    "pitch",
    "duration",
    "pname",
    "oct",
    "dur",
    "dots",
    "artic",
    "articulations",
    "ligature",
    "mensuration",
    "coloration",
    "editorial",
];

/// Conversion direction and naming policy for one document
#[derive(Clone, Copy)]
struct Scope {
    target: Dialect,
    /// Dialect unprefixed keys are assumed to come from
    origin: Dialect,
}

impl Scope {
    fn new(root: &Value, target: Dialect) -> Self {
        Self {
            target,
            origin: source_dialect(root).unwrap_or(target),
        }
    }

    /// Output name for a JSON key, honoring `cmme:`/`mei:` prefixes and `id` ↔ `xml:id`
    fn attribute<'a>(&self, key: &'a str) -> Cow<'a, str> {
        let (origin, name) = match key.split_once(':') {
            Some(("cmme", name)) => (Dialect::Cmme, name),
            Some(("mei", name)) => (Dialect::Mei, name),
            _ => (self.origin, key),
        };
        match (name, self.target) {
            ("id", Dialect::Mei) if origin == Dialect::Cmme => Cow::Borrowed("xml:id"),
            ("xml:id", Dialect::Cmme) => Cow::Borrowed("id"),
            _ => attribute_name(name, origin, self.target),
        }
    }

    /// Element name for an unrecognized event type
    fn element(&self, tag: &str) -> String {
        let from = if self.origin == self.target {
            self.target.other()
        } else {
            self.origin
        };
        sanitize_element_name(&element_name(tag, from, self.target))
    }
}

// ============================================================================
// PART HEADERS (shared by both targets)
// ============================================================================

/// `{shape, line}` or shorthand such as `"G2"`
fn clef_of(part: &Object) -> Option<(String, String)> {
    match part.get("clef")? {
        Value::Object(c) => Some((
            scalar_field(c, "shape").unwrap_or_else(|| "G".to_string()),
            scalar_field(c, "line").unwrap_or_else(|| "2".to_string()),
        )),
        Value::String(s) => {
            let mut chars = s.chars();
            let shape = chars.next().filter(|c| matches!(c, 'G' | 'F' | 'C'))?;
            let line: String = chars.collect();
            (!line.is_empty() && line.chars().all(|c| c.is_ascii_digit()))
                .then(|| (shape.to_string(), line))
        }
        _ => None,
    }
}

/// `{signature}`, `{sig}` or a scalar
fn key_of(part: &Object) -> Option<String> {
    match part.get("key")? {
        Value::Object(k) => scalar_field(k, "signature").or_else(|| scalar_field(k, "sig")),
        Value::Null => None,
        other => scalar(other),
    }
}

/// `{signature}`, `{count, unit}` or a string; `meter` as a fallback
fn time_of(part: &Object) -> Option<String> {
    let count_unit = |o: &Object| match (scalar_field(o, "count"), scalar_field(o, "unit")) {
        (Some(c), Some(u)) => Some(format!("{}/{}", c, u)),
        _ => None,
    };
    match part.get("time") {
        Some(Value::Object(t)) => {
            if let Some(sig) = scalar_field(t, "signature").or_else(|| count_unit(t)) {
                return Some(sig);
            }
        }
        Some(Value::String(s)) if !s.is_empty() => return Some(s.clone()),
        _ => {}
    }
    match part.get("meter") {
        Some(Value::Object(m)) => count_unit(m)
            .or_else(|| scalar_field(m, "sym"))
            .or_else(|| scalar_field(m, "signature")),
        _ => None,
    }
}

fn part_id(part: &Object, index: usize) -> String {
    scalar_field(part, "id").unwrap_or_else(|| (index + 1).to_string())
}

fn measure_number(measure: &Object) -> Option<String> {
    scalar_field(measure, "number").or_else(|| scalar_field(measure, "n"))
}

fn parts_of(root: &Value) -> impl Iterator<Item = &Object> {
    root.get("parts")
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
}

fn measures_of(part: &Object) -> Vec<&Object> {
    part.get("measures")
        .and_then(Value::as_array)
        .map(|ms| ms.iter().filter_map(Value::as_object).collect())
        .unwrap_or_default()
}

fn metadata_fields(root: &Value) -> Vec<(String, String)> {
    root.get("metadata")
        .and_then(Value::as_object)
        .map(|m| {
            m.iter()
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect()
        })
        .unwrap_or_default()
}

// ============================================================================
// DOCUMENT ROOTS
// ============================================================================

pub fn json_to_cmme(root: &Value, ctx: &mut CodecContext) -> Result<XmlElement, ConversionError> {
    let scope = Scope::new(root, Dialect::Cmme);
    let mut cmme = XmlElement::new("cmme");

    let fields = metadata_fields(root);
    if !fields.is_empty() {
        let mut metadata = XmlElement::new("metadata");
        for (key, value) in fields {
            metadata.push(XmlElement::new(sanitize_element_name(&key)).with_text(value));
        }
        cmme.push(metadata);
    }

    let mut score = XmlElement::new("score");
    for (index, part) in parts_of(root).enumerate() {
        let mut staff = XmlElement::new("staff");
        if let Some(name) = scalar_field(part, "name") {
            staff.set_attr("name", name);
        }
        staff.set_attr("id", part_id(part, index));

        if let Some((shape, line)) = clef_of(part) {
            staff.push(XmlElement::new("clef").attr("shape", shape).attr("line", line));
        }
        if let Some(key) = key_of(part) {
            staff.push(XmlElement::new("key").attr("signature", key));
        }
        if let Some(time) = time_of(part) {
            staff.push(XmlElement::new("time").attr("signature", time));
        }

        for (m, measure) in measures_of(part).into_iter().enumerate() {
            let number = measure_number(measure).unwrap_or_else(|| (m + 1).to_string());
            let mut el = XmlElement::new("measure").attr("number", number);
            for event in events_of(measure) {
                if let Some(child) = event_element(event, scope, ctx)? {
                    el.push(child);
                }
            }
            staff.push(el);
        }
        score.push(staff);
    }
    cmme.push(score);

    cmme.declare_passthrough_namespaces();
    Ok(cmme)
}

pub fn json_to_mei(root: &Value, ctx: &mut CodecContext) -> Result<XmlElement, ConversionError> {
    let scope = Scope::new(root, Dialect::Mei);
    let mut mei = XmlElement::new("mei").attr("xmlns", MEI_NS);

    let fields = metadata_fields(root);
    if !fields.is_empty() {
        let mut title_stmt = XmlElement::new("titleStmt");
        let mut pub_stmt = XmlElement::new("pubStmt");
        for key in ["title", "composer"] {
            if let Some((_, value)) = fields.iter().find(|(k, _)| k == key) {
                title_stmt.push(XmlElement::new(key).with_text(value.as_str()));
            }
        }
        for (key, value) in fields.iter().filter(|(k, _)| k != "title" && k != "composer") {
            pub_stmt.push(XmlElement::new(sanitize_element_name(key)).with_text(value.as_str()));
        }
        let mut file_desc = XmlElement::new("fileDesc").child(title_stmt);
        if !pub_stmt.children.is_empty() {
            file_desc.push(pub_stmt);
        }
        mei.push(XmlElement::new("meiHead").child(file_desc));
    }

    let parts: Vec<&Object> = parts_of(root).collect();

    let mut staff_grp = XmlElement::new("staffGrp");
    for (index, part) in parts.iter().enumerate() {
        let lines = scalar_field(part, "lines").unwrap_or_else(|| "5".to_string());
        let mut def = XmlElement::new("staffDef")
            .attr("n", part_id(part, index))
            .attr("lines", lines);
        if let Some((shape, line)) = clef_of(part) {
            def.set_attr("clef.shape", shape);
            def.set_attr("clef.line", line);
        }
        if let Some(key) = key_of(part) {
            def.set_attr("key.sig", key);
        }
        if let Some(time) = time_of(part) {
            set_time_attributes(&mut def, &time);
        }
        if let Some(name) = scalar_field(part, "name").filter(|n| !n.is_empty()) {
            def.push(XmlElement::new("label").with_text(name));
        }
        staff_grp.push(def);
    }

    let all_measures: Vec<Vec<&Object>> = parts.iter().map(|p| measures_of(p)).collect();
    let count = all_measures.iter().map(Vec::len).max().unwrap_or(0);

    let mut section = XmlElement::new("section");
    for m in 0..count {
        let number = all_measures
            .iter()
            .find_map(|ms| ms.get(m).and_then(|measure| measure_number(measure)))
            .unwrap_or_else(|| (m + 1).to_string());
        let mut measure_el = XmlElement::new("measure").attr("n", number);

        for (index, part) in parts.iter().enumerate() {
            let Some(measure) = all_measures[index].get(m) else { continue };
            let mut layers: Vec<(String, XmlElement)> =
                vec![("1".to_string(), XmlElement::new("layer").attr("n", "1"))];
            for event in events_of(measure) {
                let layer_n = event
                    .get("layer")
                    .and_then(scalar)
                    .unwrap_or_else(|| "1".to_string());
                let Some(child) = event_element(event, scope, ctx)? else { continue };
                match layers.iter_mut().find(|(n, _)| *n == layer_n) {
                    Some((_, layer)) => layer.push(child),
                    None => {
                        let layer = XmlElement::new("layer").attr("n", layer_n.as_str()).child(child);
                        layers.push((layer_n, layer));
                    }
                }
            }
            let mut staff = XmlElement::new("staff").attr("n", part_id(part, index));
            staff.children = layers.into_iter().map(|(_, layer)| layer).collect();
            measure_el.push(staff);
        }
        section.push(measure_el);
    }

    let score = XmlElement::new("score")
        .child(XmlElement::new("scoreDef").child(staff_grp))
        .child(section);
    mei.push(
        XmlElement::new("music")
            .child(XmlElement::new("body").child(XmlElement::new("mdiv").child(score))),
    );

    mei.declare_passthrough_namespaces();
    Ok(mei)
}

// ============================================================================
// EVENTS
// ============================================================================

enum EventKind<'a> {
    Note,
    Rest,
    Chord,
    Other(&'a str),
}

fn kind_of(event: &Object) -> Option<EventKind<'_>> {
    let tag = event.get("type").and_then(Value::as_str).unwrap_or_default();
    match tag.to_ascii_lowercase().as_str() {
        "note" => Some(EventKind::Note),
        "rest" => Some(EventKind::Rest),
        "chord" => Some(EventKind::Chord),
        _ if event.contains_key("pitch") || event.contains_key("pname") => Some(EventKind::Note),
        "" => None,
        _ => Some(EventKind::Other(tag)),
    }
}

/// `None` when the event carries no usable type
fn event_element(
    event: &Value,
    scope: Scope,
    ctx: &mut CodecContext,
) -> Result<Option<XmlElement>, ConversionError> {
    let Some(event) = event.as_object() else {
        log::debug!("non-object JSON event ignored");
        return Ok(None);
    };
    let Some(kind) = kind_of(event) else {
        ctx.skipped("event", 0, "event has no 'type'");
        return Ok(None);
    };

    let el = match kind {
        EventKind::Note => note_element(event, None, scope, ctx)?,
        EventKind::Rest => {
            let index = ctx.next_rest();
            let duration = duration_of(event, "rest", index, ctx)?
                .ok_or_else(|| ParseError::missing_attribute("rest", index, "duration"))?;
            let mut el = XmlElement::new("rest");
            set_duration(&mut el, &duration, scope.target);
            copy_attributes(&mut el, event, &[], scope);
            el
        }
        EventKind::Chord => chord_element(event, scope, ctx)?,
        EventKind::Other(tag) => other_element(tag, event, scope, ctx)?,
    };
    Ok(Some(el))
}

fn chord_element(event: &Object, scope: Scope, ctx: &mut CodecContext) -> Result<XmlElement, ConversionError> {
    let index = ctx.next_chord();
    let chord_duration = duration_of(event, "chord", index, ctx)?;
    let mut el = XmlElement::new("chord");
    if scope.target == Dialect::Mei {
        if let Some(d) = &chord_duration {
            set_duration(&mut el, d, Dialect::Mei);
        }
    }
    copy_attributes(&mut el, event, &["notes", "children"], scope);

    let members = event
        .get("notes")
        .and_then(Value::as_array)
        .map(|ns| ns.iter().filter_map(Value::as_object).collect::<Vec<_>>())
        .unwrap_or_default();
    for note in members {
        el.push(note_element(note, chord_duration, scope, ctx)?);
    }
    push_children(&mut el, event, scope, ctx)?;
    Ok(el)
}

fn note_element(
    event: &Object,
    inherited: Option<DurationSpec>,
    scope: Scope,
    ctx: &mut CodecContext,
) -> Result<XmlElement, ConversionError> {
    let index = ctx.next_note();
    let (pitch, consumed) = pitch_of(event, index)?;

    let own = duration_of(event, "note", index, ctx)?;
    let duration = match (own, inherited, scope.target) {
        (Some(d), _, _) => Some(d),
        // MEI chord members take the chord's @dur
        (None, Some(_), Dialect::Mei) => None,
        (None, Some(d), Dialect::Cmme) => Some(d),
        (None, None, _) => return Err(ParseError::missing_attribute("note", index, "duration").into()),
    };

    let mut el = XmlElement::new("note");
    match scope.target {
        Dialect::Cmme => {
            el.set_attr("pitch", pitch.to_cmme());
        }
        Dialect::Mei => {
            for (name, value) in pitch.mei_attributes() {
                el.set_attr(name, value);
            }
        }
    }
    if let Some(d) = &duration {
        set_duration(&mut el, d, scope.target);
    }

    let (coloration, coloration_extra) = coloration_of(event);
    if scope.target == Dialect::Mei {
        if let Some(kind) = &coloration {
            el.set_attr("colored", "true");
            if let Some(kind) = kind {
                el.set_attr("color", kind.as_str());
            }
        }
        // MEI has no coloration element; its extra attributes go on the note
        for (k, v) in &coloration_extra {
            el.set_attr(scope.attribute(k), v.as_str());
        }
    }

    copy_attributes(&mut el, event, &consumed, scope);

    for (kind, extra) in articulations_of(event) {
        let (tag, name, value) = match scope.target {
            Dialect::Cmme => ("articulation", "type", ARTICULATIONS.to_cmme(&kind).unwrap_or(kind.as_str()).to_string()),
            Dialect::Mei => ("artic", "artic", ARTICULATIONS.to_mei(&kind).unwrap_or(kind.as_str()).to_string()),
        };
        let mut artic = XmlElement::new(tag).attr(name, value);
        for (k, v) in extra {
            artic.set_attr(scope.attribute(&k), v);
        }
        el.push(artic);
    }

    if let Some(value) = scalar_field(event, "ligature") {
        let position = if LIGATURE_FORMS.to_cmme(&value).is_some() {
            LigaturePosition::from_mei(&value)
        } else {
            LigaturePosition::from_cmme(&value)
        };
        el.push(match scope.target {
            Dialect::Cmme => XmlElement::new("ligature").attr("position", position.cmme_position()),
            Dialect::Mei => XmlElement::new("ligature").attr("form", position.mei_form()),
        });
    }

    if let Some(sign) = scalar_field(event, "mensuration") {
        el.push(match scope.target {
            Dialect::Cmme => XmlElement::new("mensuration").attr("sign", sign),
            Dialect::Mei => {
                let mut mensur = XmlElement::new("mensur");
                set_mensur_attributes(&mut mensur, &Mensuration::from_cmme_sign(&sign), "");
                mensur
            }
        });
    }

    if scope.target == Dialect::Cmme {
        if let Some(kind) = coloration {
            let mut c = XmlElement::new("coloration").attr("type", kind.unwrap_or_else(|| "blackened".to_string()));
            for (k, v) in coloration_extra {
                c.set_attr(scope.attribute(&k), v);
            }
            el.push(c);
        }
    }

    if let Some(Value::Object(ed)) = event.get("editorial") {
        let names = match scope.target {
            Dialect::Cmme => ("editorial", ["type", "source", "certainty"]),
            Dialect::Mei => ("supplied", ["reason", "source", "cert"]),
        };
        let mut supplied = XmlElement::new(names.0);
        for (i, keys) in [["type", "reason"], ["source", "source"], ["certainty", "cert"]]
            .iter()
            .enumerate()
        {
            if let Some(value) = keys.iter().find_map(|k| scalar_field(ed, k)) {
                supplied.set_attr(names.1[i], value);
            }
        }
        el.push(supplied);
    }

    push_children(&mut el, event, scope, ctx)?;
    Ok(el)
}

fn other_element(
    tag: &str,
    event: &Object,
    scope: Scope,
    ctx: &mut CodecContext,
) -> Result<XmlElement, ConversionError> {
    let mut el = XmlElement::new(scope.element(tag));
    copy_attributes(&mut el, event, &["text", "children"], scope);
    el.text = scalar_field(event, "text");
    push_children(&mut el, event, scope, ctx)?;
    Ok(el)
}

fn push_children(
    el: &mut XmlElement,
    event: &Object,
    scope: Scope,
    ctx: &mut CodecContext,
) -> Result<(), ConversionError> {
    if let Some(children) = event.get("children").and_then(Value::as_array) {
        for child in children {
            if let Some(child) = event_element(child, scope, ctx)? {
                el.push(child);
            }
        }
    }
    Ok(())
}

/// Pitch from `pitch`, or from `pname`/`oct` with `accid`/`accid.ges`
///
/// Also returns the keys it consumed beyond [`STRUCTURAL_KEYS`].
fn pitch_of(event: &Object, index: usize) -> Result<(PitchSpec, Vec<&'static str>), ParseError> {
    if let Some(text) = scalar_field(event, "pitch") {
        let pitch = PitchSpec::parse_cmme(&text)
            .ok_or_else(|| ParseError::invalid_attribute("note", index, "pitch", &text))?;
        return Ok((pitch, Vec::new()));
    }

    let pname = scalar_field(event, "pname")
        .ok_or_else(|| ParseError::missing_attribute("note", index, "pitch"))?;
    let oct = scalar_field(event, "oct")
        .ok_or_else(|| ParseError::missing_attribute("note", index, "oct"))?;

    let mut consumed = Vec::new();
    let accid_text = scalar_field(event, "accid");
    let accid = accid_text.as_deref().and_then(Accidental::from_mei_code);
    if accid.is_some() {
        consumed.push("accid");
    }
    let accid_ges = match (&accid_text, scalar_field(event, "accid.ges")) {
        (None, Some(ges)) if is_gestural_accidental(&ges) => {
            consumed.push("accid.ges");
            Some(ges)
        }
        _ => None,
    };

    let pitch = PitchSpec::from_mei(&pname, &oct, accid, accid_ges.as_deref())
        .ok_or_else(|| ParseError::invalid_attribute("note", index, "pname", &pname))?;
    Ok((pitch, consumed))
}

/// `duration` (either vocabulary) or `dur` + `dots`; `None` when neither is present
fn duration_of(
    event: &Object,
    element: &str,
    index: usize,
    ctx: &mut CodecContext,
) -> Result<Option<DurationSpec>, ParseError> {
    let parsed = if let Some(text) = scalar_field(event, "duration") {
        DurationSpec::parse_cmme(&text)
            .or_else(|| DurationSpec::from_mei(&text, None))
            .ok_or(text)
    } else if let Some(dur) = scalar_field(event, "dur") {
        let dots = scalar_field(event, "dots");
        DurationSpec::from_mei(&dur, dots.as_deref())
            .or_else(|| {
                DurationSpec::parse_cmme(&dur).and_then(|d| match dots.as_deref() {
                    None => Some(d),
                    Some(n) => DurationSpec::with_dots(d.value, n.parse().ok()?),
                })
            })
            .ok_or(dur)
    } else {
        return Ok(None);
    };

    match parsed {
        Ok(d) => Ok(Some(d)),
        Err(text) if text.trim().is_empty() => Err(ParseError::missing_attribute(element, index, "duration")),
        Err(text) => ctx.unknown_duration(element, index, &text).map(Some),
    }
}

fn set_duration(el: &mut XmlElement, duration: &DurationSpec, target: Dialect) {
    match target {
        Dialect::Cmme => {
            el.set_attr("duration", duration.to_cmme());
        }
        Dialect::Mei => {
            el.set_attr("dur", duration.mei_dur());
            if let Some(dots) = duration.mei_dots() {
                el.set_attr("dots", dots);
            }
        }
    }
}

/// `true`, a color string, or an object with `type` and extra attributes
fn coloration_of(event: &Object) -> (Option<Option<String>>, Vec<(String, String)>) {
    match event.get("coloration") {
        Some(Value::Bool(true)) => (Some(None), Vec::new()),
        Some(Value::String(s)) => (Some((!s.is_empty()).then(|| s.clone())), Vec::new()),
        Some(Value::Object(c)) => {
            let extra = c
                .iter()
                .filter(|(k, _)| *k != "type")
                .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                .collect();
            (Some(scalar_field(c, "type")), extra)
        }
        _ => (None, Vec::new()),
    }
}

/// `artic` (string or list) and `articulations` (strings or `{type, ...}` objects)
fn articulations_of(event: &Object) -> Vec<(String, Vec<(String, String)>)> {
    let mut out = Vec::new();
    for key in ["artic", "articulations"] {
        let items: Vec<&Value> = match event.get(key) {
            Some(Value::Array(items)) => items.iter().collect(),
            Some(v @ Value::String(_)) => vec![v],
            _ => continue,
        };
        for item in items {
            match item {
                Value::Object(a) => {
                    let Some(kind) = scalar_field(a, "type").or_else(|| scalar_field(a, "artic")) else {
                        continue;
                    };
                    let extra = a
                        .iter()
                        .filter(|(k, _)| *k != "type" && *k != "artic")
                        .filter_map(|(k, v)| scalar(v).map(|v| (k.clone(), v)))
                        .collect();
                    out.push((kind, extra));
                }
                other => {
                    if let Some(kind) = scalar(other) {
                        out.push((kind, Vec::new()));
                    }
                }
            }
        }
    }
    out
}

/// Copy scalar keys not interpreted elsewhere
fn copy_attributes(el: &mut XmlElement, event: &Object, also_skip: &[&str], scope: Scope) {
    for (key, value) in event {
        if STRUCTURAL_KEYS.contains(&key.as_str()) || also_skip.contains(&key.as_str()) {
            continue;
        }
        match scalar(value) {
            Some(value) => {
                el.set_attr(scope.attribute(key), value);
            }
            None if !value.is_null() => {
                log::debug!("<{}>: non-scalar JSON key '{}' ignored", el.name, key);
            }
            None => {}
        }
    }
}
