//! Player settings and engine tuning — plain data the core reads.

use serde::{Deserialize, Serialize};

use crate::chord::Voicing;
use crate::dsp::oscillator::Waveform;
use crate::note::PitchClass;

/// What the wheel plays when a position is pressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlayMode {
    #[default]
    Chords,
    Notes,
}

/// Where the key center sits on the rendered wheel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyCenterPosition {
    Top,
    #[default]
    Bottom,
}

/// User-facing playback preferences.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PlayerSettings {
    pub waveform: Waveform,
    pub voicing: Voicing,
    pub mode: PlayMode,
    /// Octave used for single notes in notes mode.
    pub note_octave: i32,
    pub key_center: PitchClass,
    pub key_center_position: KeyCenterPosition,
}

impl Default for PlayerSettings {
    fn default() -> Self {
        PlayerSettings {
            waveform: Waveform::Sine,
            voicing: Voicing::Standard,
            mode: PlayMode::Chords,
            note_octave: 4,
            key_center: PitchClass::C,
            key_center_position: KeyCenterPosition::Bottom,
        }
    }
}

/// Timing and level constants of the voice engine. All times in seconds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EngineConfig {
    /// Linear attack applied to every note.
    pub attack: f64,
    /// Delay before a non-immediate continuous stop takes effect.
    pub stop_debounce: f64,
    /// Exponential fade applied when a continuous chord stops.
    pub release: f64,
    /// Extra time after a one-shot ends before its group gain is disconnected.
    pub group_cleanup_delay: f64,
    /// Chord level before normalization; divided by `sqrt(note_count)`.
    pub chord_level: f64,
    /// Initial master volume [0, 1].
    pub master_volume: f64,
    /// Target of exponential fades (must be > 0).
    pub fade_floor: f64,
    /// Octave range of the table used to play chords by note name.
    pub lookup_octaves: (i32, i32),
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            attack: 0.01,
            stop_debounce: 0.05,
            release: 0.05,
            group_cleanup_delay: 0.1,
            chord_level: 0.3,
            master_volume: 0.8,
            fade_floor: 0.001,
            lookup_octaves: (1, 7),
        }
    }
}

impl EngineConfig {
    /// Per-chord gain for `note_count` simultaneous notes.
    pub fn chord_gain(&self, note_count: usize) -> f64 {
        if note_count == 0 {
            return 0.0;
        }
        self.chord_level / (note_count as f64).sqrt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let s = PlayerSettings::default();
        assert_eq!(s.waveform, Waveform::Sine);
        assert_eq!(s.voicing, Voicing::Standard);
        assert_eq!(s.note_octave, 4);
    }

    #[test]
    fn partial_json_fills_defaults() {
        let s: PlayerSettings =
            serde_json::from_str(r#"{"waveform": "square", "voicing": "rootBass"}"#).unwrap();
        assert_eq!(s.waveform, Waveform::Square);
        assert_eq!(s.voicing, Voicing::RootBass);
        assert_eq!(s.mode, PlayMode::Chords);

        let s: PlayerSettings = serde_json::from_str(r#"{"keyCenter": "C#"}"#).unwrap();
        assert_eq!(s.key_center, PitchClass::Cs);
        assert_eq!(s.note_octave, 4);

        let json = serde_json::to_value(&PlayerSettings::default()).unwrap();
        assert_eq!(json["keyCenter"], "C");

        let c: EngineConfig = serde_json::from_str(r#"{"stopDebounce": 0.08}"#).unwrap();
        assert_eq!(c.stop_debounce, 0.08);
        assert_eq!(c.attack, 0.01);
    }

    #[test]
    fn chord_gain_is_equal_power() {
        let c = EngineConfig::default();
        assert!((c.chord_gain(1) - 0.3).abs() < 1e-12);
        assert!((c.chord_gain(4) - 0.15).abs() < 1e-12);
        assert_eq!(c.chord_gain(0), 0.0);
    }
}
