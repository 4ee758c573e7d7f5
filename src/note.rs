//! Note names — pitch classes, the `<letter><accidental><octave>` grammar,
//! and octave transposition on note strings.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ChordError;

/// One of the 12 equal-tempered semitone classes, in chromatic order from C.
///
/// Serialized by sharp spelling (`"C#"`); deserialization also accepts the
/// five flat aliases and the `s` spelling used by chord ids (`"Cs"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(into = "&'static str", try_from = "String")]
pub enum PitchClass {
    C,
    Cs,
    D,
    Ds,
    E,
    F,
    Fs,
    G,
    Gs,
    A,
    As,
    B,
}

impl PitchClass {
    /// All pitch classes in chromatic order.
    pub const ALL: [PitchClass; 12] = [
        PitchClass::C,
        PitchClass::Cs,
        PitchClass::D,
        PitchClass::Ds,
        PitchClass::E,
        PitchClass::F,
        PitchClass::Fs,
        PitchClass::G,
        PitchClass::Gs,
        PitchClass::A,
        PitchClass::As,
        PitchClass::B,
    ];

    /// Semitones above C.
    pub fn index(self) -> i32 {
        self as i32
    }

    /// Pitch class `semitones` above C, wrapping in both directions.
    pub fn from_index(semitones: i32) -> PitchClass {
        Self::ALL[semitones.rem_euclid(12) as usize]
    }

    /// Canonical sharp spelling (`"C#"`, `"D"`, ...).
    pub fn sharp_name(self) -> &'static str {
        match self {
            PitchClass::C => "C",
            PitchClass::Cs => "C#",
            PitchClass::D => "D",
            PitchClass::Ds => "D#",
            PitchClass::E => "E",
            PitchClass::F => "F",
            PitchClass::Fs => "F#",
            PitchClass::G => "G",
            PitchClass::Gs => "G#",
            PitchClass::A => "A",
            PitchClass::As => "A#",
            PitchClass::B => "B",
        }
    }

    /// Flat alias for the five black keys, `None` for naturals.
    pub fn flat_name(self) -> Option<&'static str> {
        match self {
            PitchClass::Cs => Some("Db"),
            PitchClass::Ds => Some("Eb"),
            PitchClass::Fs => Some("Gb"),
            PitchClass::Gs => Some("Ab"),
            PitchClass::As => Some("Bb"),
            _ => None,
        }
    }

    /// Display label with proper accidental glyph (`"C♯"`).
    pub fn display(self) -> &'static str {
        match self {
            PitchClass::Cs => "C♯",
            PitchClass::Ds => "D♯",
            PitchClass::Fs => "F♯",
            PitchClass::Gs => "G♯",
            PitchClass::As => "A♯",
            other => other.sharp_name(),
        }
    }

    /// Normalize a spelled name (`"Bb"`, `"A#"`, `"E"`) to its pitch class.
    ///
    /// Only the five common flat aliases are recognized; spellings such as
    /// `"Cb"` or `"E#"` yield `UnknownPitchClass`.
    pub fn from_name(name: &str) -> Result<PitchClass, ChordError> {
        let sharp = match name {
            "Db" => "C#",
            "Eb" => "D#",
            "Gb" => "F#",
            "Ab" => "G#",
            "Bb" => "A#",
            other => other,
        };
        Self::ALL
            .iter()
            .copied()
            .find(|pc| pc.sharp_name() == sharp)
            .ok_or_else(|| ChordError::UnknownPitchClass(name.to_string()))
    }
}

impl From<PitchClass> for &'static str {
    fn from(pc: PitchClass) -> Self {
        pc.sharp_name()
    }
}

impl TryFrom<String> for PitchClass {
    type Error = ChordError;

    fn try_from(name: String) -> Result<Self, Self::Error> {
        match name.strip_suffix('s') {
            Some(letter) if letter.len() == 1 => PitchClass::from_name(&format!("{letter}#")),
            _ => PitchClass::from_name(&name),
        }
    }
}

impl fmt::Display for PitchClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.sharp_name())
    }
}

/// Accidental as written in a note string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Accidental {
    Natural,
    Sharp,
    Flat,
}

/// A spelled note: letter, accidental and octave, e.g. `Eb4`.
///
/// The spelling is kept as written so that transposition round-trips
/// (`Gb4` stays `Gb5`, never `F#5`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Note {
    pub letter: char,
    pub accidental: Accidental,
    pub octave: i32,
}

impl Note {
    /// Sharp-spelled note for a pitch class.
    pub fn new(pitch_class: PitchClass, octave: i32) -> Note {
        let name = pitch_class.sharp_name();
        let letter = name.chars().next().unwrap_or('C');
        let accidental = if name.len() > 1 {
            Accidental::Sharp
        } else {
            Accidental::Natural
        };
        Note {
            letter,
            accidental,
            octave,
        }
    }

    /// Parse `<A-G>[#|b]<digits>`.
    pub fn parse(s: &str) -> Result<Note, ChordError> {
        let invalid = || ChordError::InvalidNoteFormat(s.to_string());
        let mut chars = s.chars();

        let letter = chars.next().ok_or_else(invalid)?;
        if !('A'..='G').contains(&letter) {
            return Err(invalid());
        }

        let rest = chars.as_str();
        let (accidental, digits) = match rest.chars().next() {
            Some('#') => (Accidental::Sharp, &rest[1..]),
            Some('b') => (Accidental::Flat, &rest[1..]),
            _ => (Accidental::Natural, rest),
        };

        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(invalid());
        }
        let octave: i32 = digits.parse().map_err(|_| invalid())?;

        Ok(Note {
            letter,
            accidental,
            octave,
        })
    }

    /// The name without octave, as spelled (`"Eb"`).
    pub fn name(&self) -> String {
        match self.accidental {
            Accidental::Natural => self.letter.to_string(),
            Accidental::Sharp => format!("{}#", self.letter),
            Accidental::Flat => format!("{}b", self.letter),
        }
    }

    /// Normalized pitch class of this spelling.
    pub fn pitch_class(&self) -> Result<PitchClass, ChordError> {
        PitchClass::from_name(&self.name())
    }

    /// Semitone distance from A4 (A4 = 0, C4 = -9).
    ///
    /// Octaves too large for an `i32` semitone count are `InvalidNoteFormat`.
    pub fn semitones_from_a4(&self) -> Result<i32, ChordError> {
        let pc = self.pitch_class()?;
        self.octave
            .checked_sub(4)
            .and_then(|o| o.checked_mul(12))
            .and_then(|s| s.checked_add(pc.index() - PitchClass::A.index()))
            .ok_or_else(|| ChordError::InvalidNoteFormat(self.to_string()))
    }

    /// MIDI note number (C4 = 60, A4 = 69).
    pub fn midi(&self) -> Result<i32, ChordError> {
        self.semitones_from_a4()?
            .checked_add(69)
            .ok_or_else(|| ChordError::InvalidNoteFormat(self.to_string()))
    }

    /// Same spelling, octave moved by `shift`. `None` if the octave overflows.
    pub fn transposed(&self, shift: i32) -> Option<Note> {
        Some(Note {
            octave: self.octave.checked_add(shift)?,
            ..*self
        })
    }
}

impl fmt::Display for Note {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.name(), self.octave)
    }
}

impl FromStr for Note {
    type Err = ChordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Note::parse(s)
    }
}

/// Move a note string by `shift` octaves, keeping its spelling.
///
/// Strings that do not parse as notes, or whose octave would overflow, are
/// returned unchanged. Catalog data is trusted at this layer; a malformed note
/// surfaces later when its frequency is looked up.
pub fn transpose_octave(note: &str, shift: i32) -> String {
    match Note::parse(note).ok().and_then(|n| n.transposed(shift)) {
        Some(n) => n.to_string(),
        None => note.to_string(),
    }
}

/// Root pitch-class spelling of a plain major or minor chord identity.
///
/// Accepts `C`, `Bb`, `F#`, `Fs`, `Am`, `Csm`, `Ebm`; returns `None` for anything
/// carrying an extension (`C7`, `Gsus4`, `Bdim`).
pub fn plain_triad_root(identity: &str) -> Option<(&str, bool)> {
    let bytes = identity.as_bytes();
    if bytes.is_empty() || !(b'A'..=b'G').contains(&bytes[0]) {
        return None;
    }
    let mut idx = 1;
    if idx < bytes.len() && matches!(bytes[idx], b'#' | b'b' | b's') {
        idx += 1;
    }
    let root = &identity[..idx];
    match &identity[idx..] {
        "" => Some((root, false)),
        "m" => Some((root, true)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_basic_notes() {
        let n = Note::parse("C4").unwrap();
        assert_eq!(n.letter, 'C');
        assert_eq!(n.accidental, Accidental::Natural);
        assert_eq!(n.octave, 4);

        let n = Note::parse("Bb3").unwrap();
        assert_eq!(n.accidental, Accidental::Flat);
        assert_eq!(n.octave, 3);

        let n = Note::parse("F#10").unwrap();
        assert_eq!(n.accidental, Accidental::Sharp);
        assert_eq!(n.octave, 10);
    }

    #[test]
    fn parse_rejects_bad_grammar() {
        for bad in ["", "H4", "C", "C#", "c4", "C-1", "C4x", "Cb#4", "4C"] {
            assert!(
                matches!(Note::parse(bad), Err(ChordError::InvalidNoteFormat(_))),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn flats_normalize_to_sharps() {
        assert_eq!(PitchClass::from_name("Db").unwrap(), PitchClass::Cs);
        assert_eq!(PitchClass::from_name("Bb").unwrap(), PitchClass::As);
        assert_eq!(PitchClass::from_name("A#").unwrap(), PitchClass::As);
        assert_eq!(PitchClass::from_name("E").unwrap(), PitchClass::E);
    }

    #[test]
    fn unusual_spellings_are_unknown() {
        let note = Note::parse("Cb4").unwrap();
        assert!(matches!(
            note.pitch_class(),
            Err(ChordError::UnknownPitchClass(_))
        ));
    }

    #[test]
    fn midi_numbers() {
        assert_eq!(Note::parse("C4").unwrap().midi().unwrap(), 60);
        assert_eq!(Note::parse("A4").unwrap().midi().unwrap(), 69);
        assert_eq!(Note::parse("Db4").unwrap().midi().unwrap(), 61);
        assert_eq!(Note::parse("C0").unwrap().midi().unwrap(), 12);
    }

    #[test]
    fn transpose_keeps_spelling() {
        assert_eq!(transpose_octave("Gb4", 1), "Gb5");
        assert_eq!(transpose_octave("C4", -2), "C2");
        assert_eq!(transpose_octave("A#3", 0), "A#3");
    }

    #[test]
    fn transpose_passes_through_garbage() {
        assert_eq!(transpose_octave("not-a-note", 1), "not-a-note");
        assert_eq!(transpose_octave("", -1), "");
    }

    #[test]
    fn huge_octaves_do_not_overflow() {
        let note = Note::parse("C999999999").unwrap();
        assert!(matches!(
            note.semitones_from_a4(),
            Err(ChordError::InvalidNoteFormat(_))
        ));
        assert!(note.midi().is_err());

        let top = Note::parse("C2147483647").unwrap();
        assert_eq!(top.transposed(1), None);
        assert_eq!(top.transposed(-1).unwrap().octave, 2147483646);
        assert_eq!(transpose_octave("C2147483647", 1), "C2147483647");
    }

    #[test]
    fn plain_triad_identities() {
        assert_eq!(plain_triad_root("C"), Some(("C", false)));
        assert_eq!(plain_triad_root("Bbm"), Some(("Bb", true)));
        assert_eq!(plain_triad_root("Fsm"), Some(("Fs", true)));
        assert_eq!(plain_triad_root("F#"), Some(("F#", false)));
        assert_eq!(plain_triad_root("C7"), None);
        assert_eq!(plain_triad_root("Gsus4"), None);
        assert_eq!(plain_triad_root("Bdim"), None);
        assert_eq!(plain_triad_root(""), None);
    }

    #[test]
    fn serde_uses_note_spelling() {
        assert_eq!(serde_json::to_string(&PitchClass::Cs).unwrap(), r#""C#""#);
        assert_eq!(serde_json::to_string(&PitchClass::B).unwrap(), r#""B""#);

        for (json, pc) in [
            (r#""F#""#, PitchClass::Fs),
            (r#""Gb""#, PitchClass::Fs),
            (r#""Fs""#, PitchClass::Fs),
            (r#""E""#, PitchClass::E),
        ] {
            assert_eq!(serde_json::from_str::<PitchClass>(json).unwrap(), pc, "{json}");
        }
        assert!(serde_json::from_str::<PitchClass>(r#""H""#).is_err());
        assert!(serde_json::from_str::<PitchClass>(r#""Es""#).is_err());
    }

    #[test]
    fn from_index_wraps() {
        assert_eq!(PitchClass::from_index(12), PitchClass::C);
        assert_eq!(PitchClass::from_index(-1), PitchClass::B);
        assert_eq!(PitchClass::from_index(7), PitchClass::G);
    }
}
