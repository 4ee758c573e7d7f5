//! Chord Catalog / Key Wheel Resolver — joins the 12 circle-of-fifths positions
//! with their chord definitions and frequency lists.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::chord::{ChordDefinition, Voicing, generate_chord_enhancements};
use crate::error::ChordError;
use crate::frequency::FrequencyTable;
use crate::note::{Note, PitchClass};

/// Octave range of the frequency table used to resolve catalog notes.
pub const CATALOG_OCTAVES: (i32, i32) = (1, 7);

/// One position on the key wheel: a major key and its relative minor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyWheelEntry {
    pub major_id: String,
    pub major_display: String,
    pub minor_id: String,
    pub minor_display: String,
    pub key_signature: String,
}

/// Which chord of a key wheel entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChordSide {
    Major,
    Minor,
}

/// Frequency list per selectable voicing. Never empty: a voicing a chord lacks
/// carries the standard frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoicingFrequencies {
    pub standard: Vec<f64>,
    pub spread: Vec<f64>,
    pub rich: Vec<f64>,
    pub bass: Vec<f64>,
    pub root_bass: Vec<f64>,
}

impl VoicingFrequencies {
    fn resolve(def: &ChordDefinition, table: &FrequencyTable) -> Result<Self, ChordError> {
        let standard = table.frequencies(&def.standard)?;
        let pick = |voicing: Voicing| -> Result<Vec<f64>, ChordError> {
            match def.voicing(voicing) {
                Some(notes) => table.frequencies(notes),
                None => Ok(standard.clone()),
            }
        };
        Ok(VoicingFrequencies {
            spread: pick(Voicing::Spread)?,
            rich: pick(Voicing::Rich)?,
            bass: pick(Voicing::Bass)?,
            root_bass: pick(Voicing::RootBass)?,
            standard,
        })
    }

    pub fn get(&self, voicing: Voicing) -> &[f64] {
        match voicing {
            Voicing::Standard => &self.standard,
            Voicing::Spread => &self.spread,
            Voicing::Rich => &self.rich,
            Voicing::Bass => &self.bass,
            Voicing::RootBass => &self.root_bass,
        }
    }
}

/// A key wheel entry joined with notes and frequencies for both chords.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolvedChord {
    #[serde(flatten)]
    pub entry: KeyWheelEntry,
    pub major_notes: Vec<String>,
    pub major_frequencies: Vec<f64>,
    pub minor_notes: Vec<String>,
    pub minor_frequencies: Vec<f64>,
    pub major_voicings: VoicingFrequencies,
    pub minor_voicings: VoicingFrequencies,
}

impl ResolvedChord {
    pub fn notes(&self, side: ChordSide) -> &[String] {
        match side {
            ChordSide::Major => &self.major_notes,
            ChordSide::Minor => &self.minor_notes,
        }
    }

    pub fn frequencies(&self, side: ChordSide, voicing: Voicing) -> &[f64] {
        match side {
            ChordSide::Major => self.major_voicings.get(voicing),
            ChordSide::Minor => self.minor_voicings.get(voicing),
        }
    }

    pub fn identity(&self, side: ChordSide) -> &str {
        match side {
            ChordSide::Major => &self.entry.major_id,
            ChordSide::Minor => &self.entry.minor_id,
        }
    }
}

/// Raw catalog input: chord identity → standard notes, plus the wheel layout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CatalogData {
    pub chords: BTreeMap<String, Vec<String>>,
    pub circle: Vec<KeyWheelEntry>,
}

impl CatalogData {
    /// Parse the `chords.json` and circle-of-fifths JSON documents.
    pub fn from_json(chords_json: &str, circle_json: &str) -> Result<Self, ChordError> {
        Ok(CatalogData {
            chords: serde_json::from_str(chords_json)?,
            circle: serde_json::from_str(circle_json)?,
        })
    }

    /// The standard 24-chord catalog laid out clockwise from C.
    pub fn builtin() -> Self {
        let chords = BUILTIN_CHORDS
            .iter()
            .map(|(id, notes)| {
                (
                    id.to_string(),
                    notes.iter().map(|n| n.to_string()).collect(),
                )
            })
            .collect();

        let circle = BUILTIN_CIRCLE
            .iter()
            .map(|&(major_id, major_display, minor_id, minor_display, key_signature)| {
                KeyWheelEntry {
                    major_id: major_id.to_string(),
                    major_display: major_display.to_string(),
                    minor_id: minor_id.to_string(),
                    minor_display: minor_display.to_string(),
                    key_signature: key_signature.to_string(),
                }
            })
            .collect();

        CatalogData { chords, circle }
    }
}

/// The resolved key wheel. Built once, read-only afterwards.
#[derive(Debug, Clone)]
pub struct Catalog {
    entries: Vec<ResolvedChord>,
    definitions: BTreeMap<String, ChordDefinition>,
    table: FrequencyTable,
}

impl Catalog {
    /// Resolve every wheel entry against the chord data and frequency table.
    pub fn resolve(data: &CatalogData, table: FrequencyTable) -> Result<Self, ChordError> {
        let enhanced = generate_chord_enhancements(&data.chords);

        let definition = |id: &str| -> Result<ChordDefinition, ChordError> {
            if let Some(def) = enhanced.get(id) {
                return Ok(def.clone());
            }
            data.chords
                .get(id)
                .map(|notes| ChordDefinition::standard_only(notes.clone()))
                .ok_or_else(|| ChordError::UnknownChordIdentity(id.to_string()))
        };

        let mut definitions = BTreeMap::new();
        let mut entries = Vec::with_capacity(data.circle.len());
        for entry in &data.circle {
            let major = definition(&entry.major_id)?;
            let minor = definition(&entry.minor_id)?;

            let major_voicings = VoicingFrequencies::resolve(&major, &table)?;
            let minor_voicings = VoicingFrequencies::resolve(&minor, &table)?;

            entries.push(ResolvedChord {
                entry: entry.clone(),
                major_notes: major.standard.clone(),
                major_frequencies: major_voicings.standard.clone(),
                minor_notes: minor.standard.clone(),
                minor_frequencies: minor_voicings.standard.clone(),
                major_voicings,
                minor_voicings,
            });

            definitions.insert(entry.major_id.clone(), major);
            definitions.insert(entry.minor_id.clone(), minor);
        }

        log::debug!(
            "resolved key wheel with {} positions, {} chord definitions",
            entries.len(),
            definitions.len()
        );

        Ok(Catalog {
            entries,
            definitions,
            table,
        })
    }

    /// The built-in catalog over octaves 1..=7 with enharmonic aliases.
    pub fn builtin() -> Result<Self, ChordError> {
        let (low, high) = CATALOG_OCTAVES;
        Catalog::resolve(&CatalogData::builtin(), FrequencyTable::new(low, high, true))
    }

    /// Entries in circle order (position 0 first).
    pub fn entries(&self) -> &[ResolvedChord] {
        &self.entries
    }

    pub fn get(&self, position: usize) -> Option<&ResolvedChord> {
        self.entries.get(position)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Full definition (including inversions) of a chord on the wheel.
    pub fn definition(&self, identity: &str) -> Option<&ChordDefinition> {
        self.definitions.get(identity)
    }

    pub fn frequency_table(&self) -> &FrequencyTable {
        &self.table
    }
}

/// A single chromatic note for notes mode.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionNote {
    /// Label with accidental glyph, e.g. `"C♯"`.
    pub display: String,
    /// Identifier with `s` for sharp, e.g. `"Cs"`.
    pub id: String,
    pub frequency: f64,
    pub note_with_octave: String,
}

/// The chromatic note at a wheel position in notes mode (0 = C … 11 = B).
pub fn note_for_position(position: usize, octave: i32) -> Option<PositionNote> {
    if position >= PitchClass::ALL.len() {
        return None;
    }
    let pc = PitchClass::from_index(position as i32);
    let note = Note::new(pc, octave).to_string();
    let frequency = FrequencyTable::new(octave, octave, false).get(&note)?;

    Some(PositionNote {
        display: pc.display().to_string(),
        id: pc.sharp_name().replace('#', "s"),
        frequency,
        note_with_octave: note,
    })
}

const BUILTIN_CHORDS: &[(&str, &[&str])] = &[
    ("C", &["C4", "E4", "G4"]),
    ("Cm", &["C4", "Eb4", "G4"]),
    ("Db", &["Db4", "F4", "Ab4"]),
    ("Csm", &["Db4", "E4", "Ab4"]),
    ("D", &["D4", "Gb4", "A4"]),
    ("Dm", &["D4", "F4", "A4"]),
    ("Eb", &["Eb4", "G4", "Bb4"]),
    ("Dsm", &["Eb4", "Gb4", "Bb4"]),
    ("Ebm", &["Eb4", "Gb4", "Bb4"]),
    ("E", &["E4", "Ab4", "B4"]),
    ("Em", &["E4", "G4", "B4"]),
    ("F", &["F4", "A4", "C5"]),
    ("Fm", &["F4", "Ab4", "C5"]),
    ("Gb", &["Gb4", "Bb4", "Db5"]),
    ("Fsm", &["Gb4", "A4", "Db5"]),
    ("G", &["G4", "B4", "D5"]),
    ("Gm", &["G4", "Bb4", "D5"]),
    ("Ab", &["Ab4", "C5", "Eb5"]),
    ("Gsm", &["Ab4", "B4", "Eb5"]),
    ("A", &["A4", "Db5", "E5"]),
    ("Am", &["A4", "C5", "E5"]),
    ("Bb", &["Bb4", "D5", "F5"]),
    ("Bbm", &["Bb4", "Db5", "F5"]),
    ("B", &["B4", "Eb5", "Gb5"]),
    ("Bm", &["B4", "D5", "Gb5"]),
];

// (major id, major label, minor id, minor label, key signature)
const BUILTIN_CIRCLE: &[(&str, &str, &str, &str, &str)] = &[
    ("C", "C", "Am", "Am", "0"),
    ("G", "G", "Em", "Em", "1♯"),
    ("D", "D", "Bm", "Bm", "2♯"),
    ("A", "A", "Fsm", "F♯m", "3♯"),
    ("E", "E", "Csm", "C♯m", "4♯"),
    ("B", "B", "Gsm", "G♯m", "5♯"),
    ("Gb", "G♭", "Ebm", "E♭m", "6♭"),
    ("Db", "D♭", "Bbm", "B♭m", "5♭"),
    ("Ab", "A♭", "Fm", "Fm", "4♭"),
    ("Eb", "E♭", "Cm", "Cm", "3♭"),
    ("Bb", "B♭", "Gm", "Gm", "2♭"),
    ("F", "F", "Dm", "Dm", "1♭"),
];
