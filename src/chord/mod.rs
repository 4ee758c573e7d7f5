//! Chords — voicings derived from stored note lists, and chords built from
//! intervals.

pub mod generator;
pub mod voicing;

pub use generator::{
    ChordOptions, ChordQuality, RichChordOptions, VoicingPattern, chord_notes, generate_chord,
    generate_progression, generate_rich_chord,
};
pub use voicing::{ChordDefinition, Inversions, Voicing, generate_chord_enhancements};
