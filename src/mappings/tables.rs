//! Constant CMME ↔ MEI vocabulary tables
//!
//! Every pair is `(cmme, mei)`. The tables are bijective; lookups in either
//! direction go through [`super::BiTable`].

/// Element names
pub const ELEMENT_PAIRS: &[(&str, &str)] = &[
    // Basic music elements
    ("note", "note"),
    ("rest", "rest"),
    ("chord", "chord"),
    ("measure", "measure"),
    ("staff", "staff"),
    // Structural elements
    ("clef", "clef"),
    ("key", "keySig"),
    ("time", "meterSig"),
    ("barline", "barLine"),
    ("score", "score"),
    ("part", "part"),
    // Performance markings
    ("articulation", "artic"),
    ("dynamics", "dynam"),
    ("slur", "slur"),
    ("tie", "tie"),
    ("beam", "beam"),
    ("tuplet", "tuplet"),
    ("fermata", "fermata"),
    // Text
    ("lyrics", "verse"),
    ("text", "text"),
    ("direction", "dir"),
    // Early music
    ("ligature", "ligature"),
    ("mensuration", "mensur"),
    ("proportion", "proport"),
    ("custos", "custos"),
    ("accidental", "accid"),
    // Editorial
    ("editorial", "supplied"),
    ("variant", "app"),
    ("critical", "annot"),
    ("metadata", "meiHead"),
];

/// Note/rest attribute names with a direct counterpart
///
/// `id` ↔ `xml:id` is not listed here: identifiers are carried in a dedicated
/// field and never prefixed.
pub const ATTRIBUTE_PAIRS: &[(&str, &str)] = &[
    ("stem-direction", "stem.dir"),
    ("beam", "beam"),
    ("slur", "slur"),
    ("tie", "tie"),
    ("fermata", "fermata"),
    ("ligature-position", "ligature.form"),
    ("velocity", "vel"),
    ("responsibility", "resp"),
];

/// Articulation vocabulary
pub const ARTICULATION_PAIRS: &[(&str, &str)] = &[
    ("staccato", "stacc"),
    ("accent", "acc"),
    ("tenuto", "ten"),
    ("marcato", "marc"),
    ("staccatissimo", "stacciss"),
    ("spiccato", "spicc"),
    ("portato", "port"),
    ("legato", "leg"),
    ("mordent", "mord"),
    ("turn", "turn"),
    ("trill", "trill"),
];

/// Ligature `position` ↔ MEI `form`
pub const LIGATURE_PAIRS: &[(&str, &str)] = &[
    ("start", "initial"),
    ("middle", "medial"),
    ("end", "terminal"),
];

/// Mensuration signs and their conventional reading
pub const MENSURATION_SIGNS: &[(&str, &str)] = &[
    ("C", "tempus_imperfectum"),
    ("O", "tempus_perfectum"),
    ("C.", "tempus_imperfectum_prolatio_perfecta"),
    ("O.", "tempus_perfectum_prolatio_perfecta"),
    ("C/", "tempus_imperfectum_diminutum"),
    ("O/", "tempus_perfectum_diminutum"),
];

/// Mensural duration names accepted on read, with the vocabulary entry they stand for
pub const DURATION_SYNONYMS: &[(&str, &str)] = &[
    ("semibrevis", "whole"),
    ("minima", "half"),
    ("semiminima", "quarter"),
    ("fusa", "eighth"),
    ("semifusa", "sixteenth"),
];

/// CMME dot suffixes, indexed by dot count
pub const DOT_SUFFIXES: [&str; 4] = ["", " dot", " double-dot", " triple-dot"];
