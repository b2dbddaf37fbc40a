//! XML dialect detection

use crate::converters::xml::{local_name, parse_xml};
use crate::models::{Format, MEI_NS};
use crate::transform::preprocess::preprocess_xml;

const MEI_INDICATORS: [&str; 6] = [
    "<mei:",
    "<staffDef",
    "<scoreDef",
    "<meiHead",
    "<measure n=",
    "<layer n=",
];

const CMME_INDICATORS: [&str; 4] = ["<staff name=", "<measure number=", "<metadata>", "<clef shape="];

/// Guess whether `content` is CMME or MEI
///
/// A parsable document is decided by its root element or the MEI default
/// namespace. Otherwise each dialect scores one point per occurrence of its
/// indicator substrings; a tie is inconclusive.
pub fn detect_xml_format(content: &str) -> Option<Format> {
    let text = preprocess_xml(content);
    if text.is_empty() {
        return None;
    }

    if let Ok(doc) = parse_xml(&text) {
        let root = doc.root_element();
        match local_name(root) {
            "mei" => return Some(Format::Mei),
            "cmme" => return Some(Format::Cmme),
            _ => {}
        }
        if root.tag_name().namespace() == Some(MEI_NS) {
            return Some(Format::Mei);
        }
    }

    let mei = score(&text, &MEI_INDICATORS);
    let cmme = score(&text, &CMME_INDICATORS);
    log::debug!("format detection scores: mei={} cmme={}", mei, cmme);
    match mei.cmp(&cmme) {
        std::cmp::Ordering::Greater => Some(Format::Mei),
        std::cmp::Ordering::Less => Some(Format::Cmme),
        std::cmp::Ordering::Equal => None,
    }
}

fn score(text: &str, indicators: &[&str]) -> usize {
    indicators.iter().map(|i| text.matches(i).count()).sum()
}
