//! Frequency Engine — equal-temperament pitch frequencies based on A4 = 440 Hz.

use std::collections::HashMap;

use serde::ser::{Serialize, SerializeMap, Serializer};

use crate::error::ChordError;
use crate::note::{Note, PitchClass};

/// Reference pitch for A4 in Hz.
pub const A4_FREQUENCY: f64 = 440.0;

const SEMITONES_PER_OCTAVE: f64 = 12.0;

/// Frequency of a note string such as `"C4"`, `"A#5"` or `"Db3"`.
///
/// Flat spellings are normalized to their sharp equivalent before the semitone
/// distance from A4 is taken, so enharmonic spellings give identical results.
pub fn calculate_frequency(note: &str) -> Result<f64, ChordError> {
    let parsed = Note::parse(note)?;
    let semitones = parsed.semitones_from_a4()?;
    Ok(semitones_to_frequency(semitones))
}

fn semitones_to_frequency(semitones_from_a4: i32) -> f64 {
    A4_FREQUENCY * 2.0_f64.powf(semitones_from_a4 as f64 / SEMITONES_PER_OCTAVE)
}

fn pitch_frequency(pc: PitchClass, octave: i32) -> f64 {
    // f64 so that extreme octave ranges cannot overflow.
    let semitones = (octave as f64 - 4.0) * SEMITONES_PER_OCTAVE
        + f64::from(pc.index() - PitchClass::A.index());
    A4_FREQUENCY * 2.0_f64.powf(semitones / SEMITONES_PER_OCTAVE)
}

/// Round half away from zero at `decimal_places`.
pub fn round_frequency(frequency: f64, decimal_places: u32) -> f64 {
    let factor = 10.0_f64.powi(decimal_places as i32);
    (frequency * factor).round() / factor
}

/// Transpose a frequency by whole octaves.
pub fn shift_octave(frequency: f64, octaves: i32) -> f64 {
    frequency * 2.0_f64.powi(octaves)
}

/// Convert a MIDI note number to frequency using the given A4 tuning pitch.
pub fn midi_to_frequency(midi: i32, tuning_pitch: f64) -> f64 {
    tuning_pitch * 2.0_f64.powf((midi as f64 - 69.0) / SEMITONES_PER_OCTAVE)
}

/// Note name → frequency mapping over a closed octave range.
///
/// Entries keep chromatic insertion order (sharp spelling first, then its flat
/// alias when enharmonics are included). Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct FrequencyTable {
    start_octave: i32,
    end_octave: i32,
    entries: Vec<(String, f64)>,
    index: HashMap<String, usize>,
}

impl FrequencyTable {
    /// Build the table for octaves `start_octave..=end_octave`, rounding each
    /// frequency to 2 decimals.
    pub fn new(start_octave: i32, end_octave: i32, include_enharmonics: bool) -> Self {
        let mut table = FrequencyTable {
            start_octave,
            end_octave,
            entries: Vec::new(),
            index: HashMap::new(),
        };

        for octave in start_octave..=end_octave {
            for pc in PitchClass::ALL {
                let freq = round_frequency(pitch_frequency(pc, octave), 2);
                table.insert(format!("{}{}", pc.sharp_name(), octave), freq);

                // Aliases copy the sharp value so both spellings compare equal.
                if include_enharmonics {
                    if let Some(flat) = pc.flat_name() {
                        table.insert(format!("{flat}{octave}"), freq);
                    }
                }
            }
        }

        table
    }

    fn insert(&mut self, name: String, freq: f64) {
        self.index.insert(name.clone(), self.entries.len());
        self.entries.push((name, freq));
    }

    /// Rounded frequency of a note name, if it lies inside the table.
    pub fn get(&self, note: &str) -> Option<f64> {
        self.index.get(note).map(|&i| self.entries[i].1)
    }

    /// Frequency from the table, or computed and rounded when the note lies
    /// outside the table's range.
    pub fn frequency(&self, note: &str) -> Result<f64, ChordError> {
        match self.get(note) {
            Some(f) => Ok(f),
            None => Ok(round_frequency(calculate_frequency(note)?, 2)),
        }
    }

    /// Frequencies for a note sequence, in order.
    pub fn frequencies(&self, notes: &[String]) -> Result<Vec<f64>, ChordError> {
        notes.iter().map(|n| self.frequency(n)).collect()
    }

    pub fn octave_range(&self) -> (i32, i32) {
        (self.start_octave, self.end_octave)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Entries in chromatic insertion order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(n, f)| (n.as_str(), *f))
    }
}

impl Default for FrequencyTable {
    fn default() -> Self {
        FrequencyTable::new(0, 8, true)
    }
}

impl Serialize for FrequencyTable {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, freq) in &self.entries {
            map.serialize_entry(name, freq)?;
        }
        map.end()
    }
}

/// Build a note → frequency table. Equivalent to [`FrequencyTable::new`].
pub fn generate_frequency_map(
    start_octave: i32,
    end_octave: i32,
    include_enharmonics: bool,
) -> FrequencyTable {
    FrequencyTable::new(start_octave, end_octave, include_enharmonics)
}

/// Comparison of a stored frequency against the exact equal-tempered value.
#[derive(Debug, Clone, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrecisionReport {
    pub note: String,
    pub stored: f64,
    pub calculated: f64,
    pub difference: f64,
    pub percent_error: f64,
}

/// Measure how far each stored frequency is from its exact value.
pub fn analyze_precision<'a, I>(stored: I) -> Result<Vec<PrecisionReport>, ChordError>
where
    I: IntoIterator<Item = (&'a str, f64)>,
{
    stored
        .into_iter()
        .map(|(note, stored)| {
            let calculated = calculate_frequency(note)?;
            let difference = (stored - calculated).abs();
            Ok(PrecisionReport {
                note: note.to_string(),
                stored,
                calculated,
                difference,
                percent_error: difference / calculated * 100.0,
            })
        })
        .collect()
}
