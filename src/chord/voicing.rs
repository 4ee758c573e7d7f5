//! Chord Voicing Engine — derive spread, rich, bass, root-bass and inverted
//! voicings from a chord's standard (root-position) notes.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::note::{plain_triad_root, transpose_octave};

/// Named voicings a player can pick for chord playback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Voicing {
    #[default]
    Standard,
    Spread,
    Rich,
    Bass,
    RootBass,
}

impl Voicing {
    pub const ALL: [Voicing; 5] = [
        Voicing::Standard,
        Voicing::Spread,
        Voicing::Rich,
        Voicing::Bass,
        Voicing::RootBass,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Voicing::Standard => "standard",
            Voicing::Spread => "spread",
            Voicing::Rich => "rich",
            Voicing::Bass => "bass",
            Voicing::RootBass => "rootBass",
        }
    }
}

impl fmt::Display for Voicing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Voicing {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Voicing::ALL
            .iter()
            .copied()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| format!("unknown voicing '{s}'"))
    }
}

/// First and second inversion of a plain triad.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Inversions {
    pub first: Vec<String>,
    pub second: Vec<String>,
}

/// A chord's standard notes plus every voicing derived from them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChordDefinition {
    pub standard: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub spread: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rich: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bass: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub root_bass: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inversions: Option<Inversions>,
}

impl ChordDefinition {
    /// A definition with no derived voicings.
    pub fn standard_only(standard: Vec<String>) -> Self {
        ChordDefinition {
            standard,
            spread: None,
            rich: None,
            bass: None,
            root_bass: None,
            inversions: None,
        }
    }

    /// Derive every applicable voicing from `standard`.
    ///
    /// Returns `None` when the first note does not start with a pitch class,
    /// in which case no enhancement exists for the identity.
    pub fn derive(identity: &str, standard: &[String]) -> Option<Self> {
        let root = standard.first()?;
        if !starts_with_pitch_class(root) {
            return None;
        }

        let plain = plain_triad_root(identity).is_some();
        let mut def = ChordDefinition::standard_only(standard.to_vec());

        if standard.len() >= 3 {
            def.spread = Some(vec![
                transpose_octave(&standard[0], -1),
                standard[1].clone(),
                transpose_octave(&standard[2], 1),
            ]);
        }

        let mut bass = Vec::with_capacity(standard.len() + 1);
        bass.push(transpose_octave(root, -2));
        bass.extend(standard.iter().cloned());
        def.bass = Some(bass);

        if plain && standard.len() >= 3 {
            def.rich = Some(vec![
                transpose_octave(root, -2),
                transpose_octave(root, -1),
                standard[1].clone(),
                standard[2].clone(),
                transpose_octave(root, 1),
            ]);
        }

        if standard.len() == 3 {
            def.root_bass = Some(vec![
                transpose_octave(root, -1),
                standard[1].clone(),
                standard[2].clone(),
                transpose_octave(root, 1),
            ]);

            if plain {
                def.inversions = Some(Inversions {
                    first: vec![
                        standard[1].clone(),
                        standard[2].clone(),
                        transpose_octave(&standard[0], 1),
                    ],
                    second: vec![
                        standard[2].clone(),
                        transpose_octave(&standard[0], 1),
                        transpose_octave(&standard[1], 1),
                    ],
                });
            }
        }

        Some(def)
    }

    /// Notes of a named voicing, if this chord has it.
    pub fn voicing(&self, voicing: Voicing) -> Option<&[String]> {
        match voicing {
            Voicing::Standard => Some(&self.standard),
            Voicing::Spread => self.spread.as_deref(),
            Voicing::Rich => self.rich.as_deref(),
            Voicing::Bass => self.bass.as_deref(),
            Voicing::RootBass => self.root_bass.as_deref(),
        }
    }

    /// Notes of a named voicing, falling back to the standard voicing.
    pub fn voicing_or_standard(&self, voicing: Voicing) -> &[String] {
        self.voicing(voicing).unwrap_or(&self.standard)
    }
}

fn starts_with_pitch_class(note: &str) -> bool {
    note.chars().next().is_some_and(|c| ('A'..='G').contains(&c))
}

/// Derive definitions for a whole chord map.
///
/// Identities whose notes are empty or start with something other than a
/// pitch class are left out; callers fall back to their standard notes.
pub fn generate_chord_enhancements(
    standard_chords: &BTreeMap<String, Vec<String>>,
) -> BTreeMap<String, ChordDefinition> {
    standard_chords
        .iter()
        .filter_map(|(identity, notes)| {
            ChordDefinition::derive(identity, notes).map(|def| (identity.clone(), def))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::note::Note;

    fn notes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    fn pitch_classes(list: &[String]) -> Vec<crate::note::PitchClass> {
        let mut pcs: Vec<_> = list
            .iter()
            .map(|n| Note::parse(n).unwrap().pitch_class().unwrap())
            .collect();
        pcs.sort();
        pcs
    }

    #[test]
    fn c_major_voicings() {
        let def = ChordDefinition::derive("C", &notes(&["C4", "E4", "G4"])).unwrap();
        assert_eq!(def.standard, notes(&["C4", "E4", "G4"]));
        assert_eq!(def.spread.unwrap(), notes(&["C3", "E4", "G5"]));
        assert_eq!(def.bass.unwrap(), notes(&["C2", "C4", "E4", "G4"]));
        assert_eq!(def.rich.unwrap(), notes(&["C2", "C3", "E4", "G4", "C5"]));
        assert_eq!(def.root_bass.unwrap(), notes(&["C3", "E4", "G4", "C5"]));
        let inv = def.inversions.unwrap();
        assert_eq!(inv.first, notes(&["E4", "G4", "C5"]));
        assert_eq!(inv.second, notes(&["G4", "C5", "E5"]));
    }

    #[test]
    fn flat_spelling_survives() {
        let def = ChordDefinition::derive("Gb", &notes(&["Gb4", "Bb4", "Db5"])).unwrap();
        assert_eq!(def.spread.unwrap(), notes(&["Gb3", "Bb4", "Db6"]));
    }

    #[test]
    fn sharp_minor_identity_is_plain() {
        let def = ChordDefinition::derive("Fsm", &notes(&["Gb4", "A4", "Db5"])).unwrap();
        assert!(def.rich.is_some());
        assert!(def.inversions.is_some());
    }

    #[test]
    fn extended_chords_skip_rich_and_inversions() {
        let def = ChordDefinition::derive("G7", &notes(&["G4", "B4", "D5", "F5"])).unwrap();
        assert!(def.rich.is_none());
        assert!(def.inversions.is_none());
        assert!(def.root_bass.is_none());
        assert_eq!(def.spread.unwrap(), notes(&["G3", "B4", "D6"]));
        assert_eq!(def.bass.unwrap().len(), 5);

        let def = ChordDefinition::derive("Bdim", &notes(&["B4", "D5", "F5"])).unwrap();
        assert!(def.rich.is_none());
        assert!(def.inversions.is_none());
        assert!(def.root_bass.is_some());
    }

    #[test]
    fn dyads_only_get_bass() {
        let def = ChordDefinition::derive("C5", &notes(&["C4", "G4"])).unwrap();
        assert!(def.spread.is_none());
        assert!(def.rich.is_none());
        assert_eq!(def.bass.unwrap(), notes(&["C2", "C4", "G4"]));
    }

    #[test]
    fn first_inversion_keeps_pitch_classes() {
        for (id, triad) in [
            ("C", ["C4", "E4", "G4"]),
            ("Am", ["A4", "C5", "E5"]),
            ("Bb", ["Bb4", "D5", "F5"]),
            ("Csm", ["Db4", "E4", "Ab4"]),
        ] {
            let standard = notes(&triad);
            let def = ChordDefinition::derive(id, &standard).unwrap();
            let inv = def.inversions.unwrap();
            assert_eq!(inv.first.len(), 3);
            assert_eq!(pitch_classes(&inv.first), pitch_classes(&standard));
            assert_eq!(pitch_classes(&inv.second), pitch_classes(&standard));
        }
    }

    #[test]
    fn derivation_is_pure() {
        let mut map = BTreeMap::new();
        map.insert("C".to_string(), notes(&["C4", "E4", "G4"]));
        map.insert("Am".to_string(), notes(&["A4", "C5", "E5"]));
        let snapshot = map.clone();

        let a = generate_chord_enhancements(&map);
        let b = generate_chord_enhancements(&map);
        assert_eq!(a, b);
        assert_eq!(map, snapshot);
    }

    #[test]
    fn unusable_root_is_skipped() {
        let mut map = BTreeMap::new();
        map.insert("X".to_string(), notes(&["x4", "E4", "G4"]));
        map.insert("Empty".to_string(), vec![]);
        map.insert("C".to_string(), notes(&["C4", "E4", "G4"]));
        let out = generate_chord_enhancements(&map);
        assert_eq!(out.len(), 1);
        assert!(out.contains_key("C"));
    }

    #[test]
    fn voicing_fallback() {
        let def = ChordDefinition::standard_only(notes(&["C4", "E4", "G4"]));
        assert!(def.voicing(Voicing::Rich).is_none());
        assert_eq!(def.voicing_or_standard(Voicing::Rich), &def.standard[..]);
    }

    #[test]
    fn voicing_names_round_trip() {
        for v in Voicing::ALL {
            assert_eq!(v.as_str().parse::<Voicing>().unwrap(), v);
        }
        assert_eq!(
            serde_json::to_string(&Voicing::RootBass).unwrap(),
            "\"rootBass\""
        );
    }

    #[test]
    fn definition_serializes_camel_case() {
        let def = ChordDefinition::derive("C", &notes(&["C4", "E4", "G4"])).unwrap();
        let json = serde_json::to_value(&def).unwrap();
        assert!(json.get("rootBass").is_some());
        assert_eq!(json["inversions"]["first"][2], "C5");
    }
}
