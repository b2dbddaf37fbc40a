//! Pitch spelling in both dialects
//!
//! CMME: `LETTER[.][#|b]OCTAVE`, where `.` marks musica ficta.
//! MEI: `pname` + `oct`, with `accid` for a written accidental and
//! `accid.ges` for an editorial one.

use lazy_static::lazy_static;
use regex::Regex;
use std::fmt;

lazy_static! {
    static ref CMME_PITCH: Regex = Regex::new(r"^([A-G])(\.)?([#b])?(\d+)$")
        .expect("static pitch pattern");
}

/// Written or editorial accidental
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn cmme_symbol(&self) -> char {
        match self {
            Accidental::Sharp => '#',
            Accidental::Flat => 'b',
        }
    }

    pub fn mei_code(&self) -> &'static str {
        match self {
            Accidental::Sharp => "s",
            Accidental::Flat => "f",
        }
    }

    pub fn from_cmme_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "#" => Some(Accidental::Sharp),
            "b" => Some(Accidental::Flat),
            _ => None,
        }
    }

    pub fn from_mei_code(code: &str) -> Option<Self> {
        match code {
            "s" => Some(Accidental::Sharp),
            "f" => Some(Accidental::Flat),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PitchSpec {
    /// Uppercase letter `A`..=`G`
    pub letter: char,
    pub accidental: Option<Accidental>,
    /// Musica ficta: the accidental (or natural) is editorial
    pub ficta: bool,
    pub octave: String,
}

impl PitchSpec {
    pub fn parse_cmme(text: &str) -> Option<Self> {
        let caps = CMME_PITCH.captures(text.trim())?;
        let letter = caps.get(1)?.as_str().chars().next()?;
        Some(Self {
            letter,
            ficta: caps.get(2).is_some(),
            accidental: caps
                .get(3)
                .and_then(|m| Accidental::from_cmme_symbol(m.as_str())),
            octave: caps.get(4)?.as_str().to_string(),
        })
    }

    pub fn to_cmme(&self) -> String {
        let mut out = String::with_capacity(4);
        out.push(self.letter);
        if self.ficta {
            out.push('.');
        }
        if let Some(acc) = self.accidental {
            out.push(acc.cmme_symbol());
        }
        out.push_str(&self.octave);
        out
    }

    /// Build from MEI attributes
    ///
    /// `accid` must already be known to be `s` or `f` (or absent); callers
    /// keep any other value as a passthrough attribute. `accid_ges` is only
    /// consulted when no written accidental is present.
    pub fn from_mei(
        pname: &str,
        oct: &str,
        accid: Option<Accidental>,
        accid_ges: Option<&str>,
    ) -> Option<Self> {
        let mut letters = pname.trim().chars();
        let letter = letters.next()?.to_ascii_uppercase();
        if letters.next().is_some() || !('A'..='G').contains(&letter) {
            return None;
        }
        let octave = oct.trim();
        if octave.is_empty() || !octave.chars().all(|c| c.is_ascii_digit()) {
            return None;
        }

        let (accidental, ficta) = match (accid, accid_ges) {
            (Some(written), _) => (Some(written), false),
            (None, Some(ges)) => (Accidental::from_mei_code(ges), true),
            (None, None) => (None, false),
        };

        Some(Self {
            letter,
            accidental,
            ficta,
            octave: octave.to_string(),
        })
    }

    /// MEI attributes in output order: `pname`, `oct`, then `accid` or `accid.ges`
    pub fn mei_attributes(&self) -> Vec<(&'static str, String)> {
        let mut attrs = vec![
            ("pname", self.letter.to_ascii_lowercase().to_string()),
            ("oct", self.octave.clone()),
        ];
        match (self.ficta, self.accidental) {
            (false, Some(acc)) => attrs.push(("accid", acc.mei_code().to_string())),
            (true, Some(acc)) => attrs.push(("accid.ges", acc.mei_code().to_string())),
            (true, None) => attrs.push(("accid.ges", "n".to_string())),
            (false, None) => {}
        }
        attrs
    }
}

impl fmt::Display for PitchSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_cmme())
    }
}

/// `accid.ges` values the pitch model absorbs
pub fn is_gestural_accidental(value: &str) -> bool {
    matches!(value, "s" | "f" | "n")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mei(p: &PitchSpec) -> Vec<(&'static str, String)> {
        p.mei_attributes()
    }

    #[test]
    fn test_plain_pitch() {
        let p = PitchSpec::parse_cmme("C4").unwrap();
        assert_eq!(mei(&p), vec![("pname", "c".to_string()), ("oct", "4".to_string())]);
        assert_eq!(p.to_cmme(), "C4");
    }

    #[test]
    fn test_written_accidentals() {
        let sharp = PitchSpec::parse_cmme("C#4").unwrap();
        assert_eq!(mei(&sharp)[2], ("accid", "s".to_string()));
        let flat = PitchSpec::parse_cmme("Cb4").unwrap();
        assert_eq!(mei(&flat)[2], ("accid", "f".to_string()));
    }

    #[test]
    fn test_musica_ficta() {
        let natural = PitchSpec::parse_cmme("C.4").unwrap();
        assert!(natural.ficta);
        assert_eq!(mei(&natural)[2], ("accid.ges", "n".to_string()));
        assert!(!mei(&natural).iter().any(|(k, _)| *k == "accid"));

        let sharp = PitchSpec::parse_cmme("C.#4").unwrap();
        assert_eq!(mei(&sharp)[2], ("accid.ges", "s".to_string()));
    }

    #[test]
    fn test_from_mei_reinserts_ficta_marker() {
        let p = PitchSpec::from_mei("c", "4", None, Some("n")).unwrap();
        assert_eq!(p.to_cmme(), "C.4");
        let p = PitchSpec::from_mei("c", "4", None, Some("s")).unwrap();
        assert_eq!(p.to_cmme(), "C.#4");
        let p = PitchSpec::from_mei("c", "4", Some(Accidental::Sharp), Some("s")).unwrap();
        assert_eq!(p.to_cmme(), "C#4");
        let p = PitchSpec::from_mei("E", "3", Some(Accidental::Flat), None).unwrap();
        assert_eq!(p.to_cmme(), "Eb3");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!(PitchSpec::parse_cmme("H4").is_none());
        assert!(PitchSpec::parse_cmme("C").is_none());
        assert!(PitchSpec::parse_cmme("C#.4").is_none());
        assert!(PitchSpec::from_mei("x", "4", None, None).is_none());
        assert!(PitchSpec::from_mei("c", "", None, None).is_none());
    }
}
