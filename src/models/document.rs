//! Normalized score model shared by the structural readers and writers
//!
//! A `Document` is built fresh by a reader, handed to a writer and dropped.
//! Nothing in here is mutated after construction.

use crate::models::duration::DurationSpec;
use crate::models::format::Dialect;
use crate::models::pitch_spec::PitchSpec;
use crate::mappings::LIGATURE_FORMS;
use serde::ser::{Serialize, SerializeMap, Serializer};

// ============================================================================
// METADATA
// ============================================================================

/// Ordered string map; insertion order is document order
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Metadata(Vec<(String, String)>);

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace in place, keeping the original position
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.0.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.0.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Fill keys that are missing or empty here from `other`
    pub fn merge(&mut self, other: &Metadata) {
        for (key, value) in other.iter() {
            let missing = self.get(key).map_or(true, str::is_empty);
            if missing {
                self.insert(key, value);
            }
        }
    }

    /// Normalized copy: keys lowercased, trimmed and snake-cased; empty values dropped
    pub fn cleaned(&self) -> Metadata {
        let mut out = Metadata::new();
        for (key, value) in self.iter() {
            let value = value.trim();
            if value.is_empty() {
                continue;
            }
            let key = key.trim().to_lowercase().replace(' ', "_");
            out.insert(key, value);
        }
        out
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Metadata {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut md = Metadata::new();
        for (k, v) in iter {
            md.insert(k, v);
        }
        md
    }
}

impl Serialize for Metadata {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (k, v) in &self.0 {
            map.serialize_entry(k, v)?;
        }
        map.end()
    }
}

// ============================================================================
// ATTRIBUTES WITH PROVENANCE
// ============================================================================

/// An attribute the model does not interpret, tagged with the dialect it was read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignAttr {
    pub origin: Dialect,
    /// Bare name as it appeared in `origin`, or an `xml:*` name
    pub name: String,
    pub value: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttrMap(Vec<ForeignAttr>);

impl AttrMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, origin: Dialect, name: impl Into<String>, value: impl Into<String>) {
        self.0.push(ForeignAttr {
            origin,
            name: name.into(),
            value: value.into(),
        });
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|a| a.name == name)
            .map(|a| a.value.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ForeignAttr> {
        self.0.iter()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl<'a> IntoIterator for &'a AttrMap {
    type Item = &'a ForeignAttr;
    type IntoIter = std::slice::Iter<'a, ForeignAttr>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

// ============================================================================
// SCORE STRUCTURE
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    pub metadata: Metadata,
    pub parts: Vec<Part>,
}

impl Document {
    /// All notes in document order, chord members and nested notes included
    pub fn notes(&self) -> Vec<&Note> {
        let mut out = Vec::new();
        for part in &self.parts {
            for measure in &part.measures {
                collect_notes(&measure.events, &mut out);
            }
        }
        out
    }
}

fn collect_notes<'a>(events: &'a [Event], out: &mut Vec<&'a Note>) {
    for event in events {
        match event {
            Event::Note(note) => out.push(note),
            Event::Chord(chord) => {
                out.extend(chord.notes.iter());
                for child in &chord.children {
                    collect_notes(&child.children, out);
                }
            }
            Event::Other(other) => collect_notes(&other.children, out),
            Event::Rest(_) => {}
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Clef {
    pub shape: String,
    pub line: String,
}

impl Default for Clef {
    fn default() -> Self {
        Self {
            shape: "G".to_string(),
            line: "2".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeySig {
    pub signature: String,
}

/// Time signature: `N/M`, a mensuration sign, or a free symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSig {
    pub signature: String,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Part {
    pub id: String,
    pub name: String,
    pub clef: Option<Clef>,
    pub key: Option<KeySig>,
    pub time: Option<TimeSig>,
    pub measures: Vec<Measure>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Measure {
    pub number: String,
    pub events: Vec<Event>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Event {
    Note(Note),
    Rest(Rest),
    Chord(Chord),
    Other(OtherElement),
}

impl Event {
    pub fn kind(&self) -> &'static str {
        match self {
            Event::Note(_) => "note",
            Event::Rest(_) => "rest",
            Event::Chord(_) => "chord",
            Event::Other(_) => "other",
        }
    }
}

// ============================================================================
// EVENTS
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct Note {
    pub pitch: PitchSpec,
    pub duration: DurationSpec,
    pub articulations: Vec<Articulation>,
    pub ligature: Option<Ligature>,
    pub mensuration: Option<Mensuration>,
    pub coloration: Option<Coloration>,
    pub editorial: Option<Editorial>,
    /// CMME `id` / MEI `xml:id`
    pub xml_id: Option<String>,
    pub extra: AttrMap,
    /// Child elements with no dedicated field
    pub children: Vec<OtherElement>,
}

impl Note {
    pub fn new(pitch: PitchSpec, duration: DurationSpec) -> Self {
        Self {
            pitch,
            duration,
            articulations: Vec::new(),
            ligature: None,
            mensuration: None,
            coloration: None,
            editorial: None,
            xml_id: None,
            extra: AttrMap::new(),
            children: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Rest {
    pub duration: DurationSpec,
    pub xml_id: Option<String>,
    pub extra: AttrMap,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Chord {
    pub notes: Vec<Note>,
    pub extra: AttrMap,
    /// Non-note children, written after the notes
    pub children: Vec<OtherElement>,
}

/// Articulation mark, stored in CMME vocabulary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Articulation {
    pub kind: String,
    pub attrs: AttrMap,
}

/// Position of a note inside a ligature
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LigaturePosition {
    Start,
    Middle,
    End,
    /// Unmapped value, passed through unchanged
    Other(String),
}

impl LigaturePosition {
    /// From CMME `position`
    pub fn from_cmme(position: &str) -> Self {
        match position {
            "start" => LigaturePosition::Start,
            "middle" => LigaturePosition::Middle,
            "end" => LigaturePosition::End,
            other => LigaturePosition::Other(other.to_string()),
        }
    }

    /// From MEI `form`
    pub fn from_mei(form: &str) -> Self {
        match LIGATURE_FORMS.to_cmme(form) {
            Some(position) => Self::from_cmme(position),
            None => LigaturePosition::Other(form.to_string()),
        }
    }

    pub fn cmme_position(&self) -> &str {
        match self {
            LigaturePosition::Start => "start",
            LigaturePosition::Middle => "middle",
            LigaturePosition::End => "end",
            LigaturePosition::Other(v) => v,
        }
    }

    pub fn mei_form(&self) -> &str {
        match LIGATURE_FORMS.to_mei(self.cmme_position()) {
            Some(form) => form,
            None => self.cmme_position(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ligature {
    pub position: Option<LigaturePosition>,
    pub attrs: AttrMap,
}

/// Mensuration sign decomposed the MEI way
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mensuration {
    /// Base sign (`C`, `O`, ...), without dot or slash
    pub sign: Option<String>,
    pub dot: bool,
    pub slash: bool,
    pub attrs: AttrMap,
}

impl Mensuration {
    /// Split a CMME sign such as `"O/"` or `"C."`
    pub fn from_cmme_sign(sign: &str) -> Self {
        Self {
            sign: Some(sign.chars().filter(|c| *c != '.' && *c != '/').collect()),
            dot: sign.contains('.'),
            slash: sign.contains('/'),
            attrs: AttrMap::new(),
        }
    }

    /// Reassemble the CMME sign: `sign` + `.` if dotted + `/` if slashed
    pub fn cmme_sign(&self) -> Option<String> {
        let base = self.sign.as_deref()?;
        let mut out = base.to_string();
        if self.dot {
            out.push('.');
        }
        if self.slash {
            out.push('/');
        }
        Some(out)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coloration {
    /// CMME `type` / MEI `color`
    pub kind: Option<String>,
    /// Other `<coloration>` attributes; MEI has no element for them, so they
    /// travel on the note there
    pub attrs: AttrMap,
}

/// Editorial intervention: CMME `<editorial>` / MEI `<supplied>`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Editorial {
    /// CMME `type` / MEI `reason`
    pub kind: Option<String>,
    pub source: Option<String>,
    /// CMME `certainty` / MEI `cert`
    pub certainty: Option<String>,
    pub attrs: AttrMap,
}

/// Any element without a dedicated model, kept with its subtree
#[derive(Debug, Clone, PartialEq)]
pub struct OtherElement {
    pub origin: Dialect,
    /// Tag in `origin` vocabulary
    pub tag: String,
    pub attrs: AttrMap,
    pub text: Option<String>,
    pub children: Vec<Event>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metadata_insert_keeps_position() {
        let mut md = Metadata::new();
        md.insert("title", "Missa");
        md.insert("composer", "Josquin");
        md.insert("title", "Missa Pange lingua");
        let keys: Vec<_> = md.iter().map(|(k, _)| k).collect();
        assert_eq!(keys, vec!["title", "composer"]);
        assert_eq!(md.get("title"), Some("Missa Pange lingua"));
    }

    #[test]
    fn test_metadata_merge_fills_gaps_only() {
        let mut target: Metadata = vec![("title", "Kyrie"), ("composer", "")].into_iter().collect();
        let source: Metadata = vec![("title", "Gloria"), ("composer", "Dufay"), ("date", "1450")]
            .into_iter()
            .collect();
        target.merge(&source);
        assert_eq!(target.get("title"), Some("Kyrie"));
        assert_eq!(target.get("composer"), Some("Dufay"));
        assert_eq!(target.get("date"), Some("1450"));
    }

    #[test]
    fn test_metadata_cleaned() {
        let md: Metadata = vec![(" Source Library ", " Trent 88 "), ("Empty", "  ")]
            .into_iter()
            .collect();
        let cleaned = md.cleaned();
        assert_eq!(cleaned.get("source_library"), Some("Trent 88"));
        assert!(!cleaned.contains_key("empty"));
    }

    #[test]
    fn test_metadata_serializes_in_order() {
        let md: Metadata = vec![("title", "A"), ("composer", "B")].into_iter().collect();
        let json = serde_json::to_string(&md).unwrap();
        assert_eq!(json, r#"{"title":"A","composer":"B"}"#);
    }

    #[test]
    fn test_ligature_position_bijection() {
        for (cmme, mei) in [("start", "initial"), ("middle", "medial"), ("end", "terminal")] {
            assert_eq!(LigaturePosition::from_cmme(cmme).mei_form(), mei);
            assert_eq!(LigaturePosition::from_mei(mei).cmme_position(), cmme);
        }
        let odd = LigaturePosition::from_mei("obliqua");
        assert_eq!(odd.mei_form(), "obliqua");
        assert_eq!(odd.cmme_position(), "obliqua");
    }

    #[test]
    fn test_mensuration_sign_decomposition() {
        let m = Mensuration::from_cmme_sign("C.");
        assert_eq!(m.sign.as_deref(), Some("C"));
        assert!(m.dot && !m.slash);
        assert_eq!(m.cmme_sign().as_deref(), Some("C."));

        let m = Mensuration::from_cmme_sign("O/");
        assert_eq!(m.sign.as_deref(), Some("O"));
        assert!(m.slash && !m.dot);
        assert_eq!(m.cmme_sign().as_deref(), Some("O/"));
    }
}
