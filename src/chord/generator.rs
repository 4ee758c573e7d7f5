//! Interval-based chord construction: build chords from a root note and a
//! quality instead of a stored note list.

use serde::{Deserialize, Serialize};

use crate::error::ChordError;
use crate::frequency::{calculate_frequency, shift_octave};
use crate::note::{Note, PitchClass};

/// Chord qualities as semitone offsets from the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ChordQuality {
    Major,
    Minor,
    Diminished,
    Augmented,
    Maj7,
    Min7,
    Dom7,
    Sus2,
    Sus4,
}

impl ChordQuality {
    pub fn intervals(self) -> &'static [i32] {
        match self {
            ChordQuality::Major => &[0, 4, 7],
            ChordQuality::Minor => &[0, 3, 7],
            ChordQuality::Diminished => &[0, 3, 6],
            ChordQuality::Augmented => &[0, 4, 8],
            ChordQuality::Maj7 => &[0, 4, 7, 11],
            ChordQuality::Min7 => &[0, 3, 7, 10],
            ChordQuality::Dom7 => &[0, 4, 7, 10],
            ChordQuality::Sus2 => &[0, 2, 7],
            ChordQuality::Sus4 => &[0, 5, 7],
        }
    }
}

/// Per-note octave offsets applied on top of the chord's intervals.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum VoicingPattern {
    #[default]
    Root,
    FirstInversion,
    SecondInversion,
    Spread,
    Drop2,
    Close,
}

impl VoicingPattern {
    fn shifts(self) -> &'static [i32] {
        match self {
            VoicingPattern::Root => &[0, 0, 0],
            VoicingPattern::FirstInversion => &[0, 0, 1],
            VoicingPattern::SecondInversion => &[0, 1, 1],
            VoicingPattern::Spread => &[0, 1, 1],
            VoicingPattern::Drop2 => &[0, -1, 0, 0],
            VoicingPattern::Close => &[0, 0, 0, 0],
        }
    }
}

/// Parameters for [`generate_chord`].
#[derive(Debug, Clone, PartialEq)]
pub struct ChordOptions {
    /// Root note with octave, e.g. `"C4"`.
    pub root: String,
    pub quality: ChordQuality,
    pub pattern: VoicingPattern,
    /// Shift the whole chord by this many octaves.
    pub octave_shift: i32,
    /// Extra octaves between successive notes (note `i` moves up `spread * i`).
    pub spread: i32,
}

impl ChordOptions {
    pub fn new(root: impl Into<String>, quality: ChordQuality) -> Self {
        ChordOptions {
            root: root.into(),
            quality,
            pattern: VoicingPattern::Root,
            octave_shift: 0,
            spread: 0,
        }
    }

    pub fn with_pattern(mut self, pattern: VoicingPattern) -> Self {
        self.pattern = pattern;
        self
    }

    pub fn with_octave_shift(mut self, shift: i32) -> Self {
        self.octave_shift = shift;
        self
    }

    pub fn with_spread(mut self, spread: i32) -> Self {
        self.spread = spread;
        self
    }
}

/// Notes of a chord built from its root and quality, sharp-spelled.
pub fn chord_notes(options: &ChordOptions) -> Result<Vec<Note>, ChordError> {
    let root = Note::parse(&options.root)?;
    let root_offset = root.pitch_class()?.index();
    let shifts = options.pattern.shifts();

    options
        .quality
        .intervals()
        .iter()
        .enumerate()
        .map(|(i, interval)| {
            let total = root_offset + interval;
            let carry = total.div_euclid(12);
            let pattern_shift = shifts.get(i).copied().unwrap_or(0);
            let octave = options
                .spread
                .checked_mul(i as i32)
                .and_then(|spread| spread.checked_add(root.octave))
                .and_then(|o| o.checked_add(carry + pattern_shift))
                .and_then(|o| o.checked_add(options.octave_shift))
                .ok_or_else(|| ChordError::InvalidNoteFormat(options.root.clone()))?;
            Ok(Note::new(PitchClass::from_index(total), octave))
        })
        .collect()
}

/// Frequencies of a chord built from its root and quality (unrounded).
pub fn generate_chord(options: &ChordOptions) -> Result<Vec<f64>, ChordError> {
    chord_notes(options)?
        .iter()
        .map(|n| calculate_frequency(&n.to_string()))
        .collect()
}

/// Frequencies for a list of chord symbols such as `["C4", "Am3", "F#m5", "G"]`.
///
/// The trailing number is the root octave; `default_octave` is used when it is
/// missing. A lowercase `m` selects a minor triad, otherwise major.
pub fn generate_progression(
    progression: &[&str],
    default_octave: i32,
) -> Result<Vec<Vec<f64>>, ChordError> {
    progression
        .iter()
        .map(|symbol| {
            let (root, minor, octave) = parse_chord_symbol(symbol)?;
            let quality = if minor {
                ChordQuality::Minor
            } else {
                ChordQuality::Major
            };
            let root_note = format!("{root}{}", octave.unwrap_or(default_octave));
            generate_chord(&ChordOptions::new(root_note, quality))
        })
        .collect()
}

fn parse_chord_symbol(symbol: &str) -> Result<(&str, bool, Option<i32>), ChordError> {
    let invalid = || ChordError::InvalidChordSymbol(symbol.to_string());
    let bytes = symbol.as_bytes();
    if bytes.is_empty() || !(b'A'..=b'G').contains(&bytes[0]) {
        return Err(invalid());
    }

    let mut idx = 1;
    if idx < bytes.len() && matches!(bytes[idx], b'#' | b'b') {
        idx += 1;
    }
    let root = &symbol[..idx];

    let minor = idx < bytes.len() && bytes[idx] == b'm';
    if minor {
        idx += 1;
    }

    let digits = &symbol[idx..];
    let octave = if digits.is_empty() {
        None
    } else if digits.bytes().all(|b| b.is_ascii_digit()) {
        Some(digits.parse().map_err(|_| invalid())?)
    } else {
        return Err(invalid());
    };

    Ok((root, minor, octave))
}

/// Options for [`generate_rich_chord`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RichChordOptions {
    /// Prepend the root one octave below.
    pub bass_octave_down: bool,
    /// Append the root one octave above.
    pub double_root: bool,
    /// Use the spread pattern instead of close root position.
    pub spread: bool,
    /// Build a major seventh instead of a major triad.
    pub add_seventh: bool,
}

/// Multi-octave major chord built around `root`.
pub fn generate_rich_chord(root: &str, options: RichChordOptions) -> Result<Vec<f64>, ChordError> {
    let quality = if options.add_seventh {
        ChordQuality::Maj7
    } else {
        ChordQuality::Major
    };
    let pattern = if options.spread {
        VoicingPattern::Spread
    } else {
        VoicingPattern::Root
    };

    let chord = generate_chord(&ChordOptions::new(root, quality).with_pattern(pattern))?;
    let root_freq = chord[0];

    let mut frequencies = Vec::with_capacity(chord.len() + 2);
    if options.bass_octave_down {
        frequencies.push(shift_octave(root_freq, -1));
    }
    frequencies.extend_from_slice(&chord);
    if options.double_root {
        frequencies.push(shift_octave(root_freq, 1));
    }

    Ok(frequencies)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(notes: &[Note]) -> Vec<String> {
        notes.iter().map(|n| n.to_string()).collect()
    }

    #[test]
    fn c_major_root_position() {
        let notes = chord_notes(&ChordOptions::new("C4", ChordQuality::Major)).unwrap();
        assert_eq!(names(&notes), ["C4", "E4", "G4"]);
    }

    #[test]
    fn intervals_carry_into_next_octave() {
        let notes = chord_notes(&ChordOptions::new("A4", ChordQuality::Minor)).unwrap();
        assert_eq!(names(&notes), ["A4", "C5", "E5"]);

        let notes = chord_notes(&ChordOptions::new("Bb3", ChordQuality::Dom7)).unwrap();
        assert_eq!(names(&notes), ["A#3", "D4", "F4", "G#4"]);
    }

    #[test]
    fn octave_overflow_is_an_error() {
        let opts = ChordOptions::new("C2147483647", ChordQuality::Major).with_octave_shift(1);
        assert!(matches!(
            chord_notes(&opts),
            Err(ChordError::InvalidNoteFormat(_))
        ));
        assert!(generate_chord(&ChordOptions::new("C999999999", ChordQuality::Minor)).is_err());
    }

    #[test]
    fn patterns_and_shifts() {
        let opts = ChordOptions::new("C4", ChordQuality::Major)
            .with_pattern(VoicingPattern::FirstInversion);
        assert_eq!(names(&chord_notes(&opts).unwrap()), ["C4", "E4", "G5"]);

        let opts = ChordOptions::new("C4", ChordQuality::Maj7).with_pattern(VoicingPattern::Drop2);
        assert_eq!(names(&chord_notes(&opts).unwrap()), ["C4", "E3", "G4", "B4"]);

        let opts = ChordOptions::new("C4", ChordQuality::Major)
            .with_octave_shift(-1)
            .with_spread(1);
        assert_eq!(names(&chord_notes(&opts).unwrap()), ["C3", "E4", "G5"]);
    }

    #[test]
    fn seventh_beyond_pattern_length_is_unshifted() {
        let opts = ChordOptions::new("G4", ChordQuality::Dom7).with_pattern(VoicingPattern::Spread);
        assert_eq!(names(&chord_notes(&opts).unwrap()), ["G4", "B5", "D6", "F5"]);
    }

    #[test]
    fn generate_chord_frequencies() {
        let freqs = generate_chord(&ChordOptions::new("A4", ChordQuality::Major)).unwrap();
        assert_eq!(freqs[0], 440.0);
        assert!((freqs[1] - 554.365).abs() < 0.01);
        assert!((freqs[2] - 659.255).abs() < 0.01);
    }

    #[test]
    fn invalid_root_errors() {
        assert!(matches!(
            generate_chord(&ChordOptions::new("H4", ChordQuality::Major)),
            Err(ChordError::InvalidNoteFormat(_))
        ));
    }

    #[test]
    fn progression_symbols() {
        let prog = generate_progression(&["C4", "Am3", "F#m5", "G"], 4).unwrap();
        assert_eq!(prog.len(), 4);
        assert!((prog[0][0] - 261.63).abs() < 0.01);
        assert!((prog[1][0] - 220.0).abs() < 1e-9);
        assert!((prog[1][1] - 261.63).abs() < 0.01);
        assert!((prog[3][0] - 392.0).abs() < 0.01);
        assert_eq!(prog[2].len(), 3);
    }

    #[test]
    fn progression_rejects_bad_symbols() {
        for bad in ["", "H", "Cmaj7", "Am-1", "c4"] {
            assert!(
                matches!(
                    generate_progression(&[bad], 4),
                    Err(ChordError::InvalidChordSymbol(_))
                ),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn rich_chord_layers() {
        let plain = generate_rich_chord("C4", RichChordOptions::default()).unwrap();
        assert_eq!(plain.len(), 3);

        let rich = generate_rich_chord(
            "C4",
            RichChordOptions {
                bass_octave_down: true,
                double_root: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(rich.len(), 5);
        assert!((rich[0] * 2.0 - rich[1]).abs() < 1e-9);
        assert!((rich[4] - rich[1] * 2.0).abs() < 1e-9);

        let seventh = generate_rich_chord(
            "C4",
            RichChordOptions {
                add_seventh: true,
                ..Default::default()
            },
        )
        .unwrap();
        assert_eq!(seventh.len(), 4);
    }
}
