pub mod catalog;
pub mod chord;
pub mod dsp;
pub mod error;
pub mod frequency;
pub mod note;
pub mod settings;

pub use catalog::{Catalog, CatalogData, ChordSide, KeyWheelEntry, ResolvedChord};
pub use chord::{ChordDefinition, Voicing};
pub use dsp::device::{AudioHost, DeviceState, OutputDevice, PullHost};
pub use dsp::engine::{EngineStatus, VoiceEngine};
pub use dsp::oscillator::Waveform;
pub use error::{ChordError, DeviceError};
pub use frequency::{FrequencyTable, calculate_frequency};
pub use settings::{EngineConfig, PlayMode, PlayerSettings};

use wasm_bindgen::prelude::*;

/// The crate version, read from Cargo.toml at compile time.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// WASM-exposed: return the chordwheel-core version string.
#[wasm_bindgen]
pub fn core_version() -> String {
    VERSION.to_string()
}

fn js_err(e: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&format!("{e}"))
}

/// WASM-exposed: equal-tempered frequency of a note such as `"C#4"`,
/// rounded to two decimals.
#[wasm_bindgen]
pub fn frequency_of(note: &str) -> Result<f64, JsValue> {
    calculate_frequency(note)
        .map(|f| frequency::round_frequency(f, 2))
        .map_err(js_err)
}

/// WASM-exposed: note → frequency table as a JSON object.
#[wasm_bindgen]
pub fn frequency_map_json(
    start_octave: i32,
    end_octave: i32,
    include_enharmonics: bool,
) -> Result<String, JsValue> {
    let table = frequency::generate_frequency_map(start_octave, end_octave, include_enharmonics);
    serde_json::to_string(&table).map_err(js_err)
}

/// WASM-exposed: the resolved built-in key wheel as a JSON array.
#[wasm_bindgen]
pub fn catalog_json() -> Result<String, JsValue> {
    let catalog = Catalog::builtin().map_err(js_err)?;
    serde_json::to_string(catalog.entries()).map_err(js_err)
}

/// WASM-exposed: render a one-shot chord to a 16-bit mono WAV byte array.
#[wasm_bindgen]
pub fn render_chord_wav(
    frequencies: Vec<f64>,
    waveform: &str,
    duration: f64,
    sample_rate: u32,
) -> Result<Vec<u8>, JsValue> {
    let waveform: Waveform = waveform.parse().map_err(js_err)?;
    Ok(dsp::renderer::render_one_shot_wav(
        &frequencies,
        waveform,
        duration,
        sample_rate,
    ))
}

/// WASM-exposed: render a one-shot chord to mono f32 samples.
#[wasm_bindgen]
pub fn render_chord_samples(
    frequencies: Vec<f64>,
    waveform: &str,
    duration: f64,
    sample_rate: u32,
) -> Result<Vec<f32>, JsValue> {
    let waveform: Waveform = waveform.parse().map_err(js_err)?;
    Ok(dsp::renderer::render_one_shot_samples(
        &frequencies,
        waveform,
        duration,
        sample_rate,
        &EngineConfig::default(),
    ))
}

/// WASM-exposed chord player. The embedder pulls audio through `process`,
/// typically from an AudioWorklet, and forwards gestures and visibility.
#[wasm_bindgen]
pub struct ChordPlayer {
    engine: VoiceEngine<PullHost>,
    catalog: Catalog,
    settings: PlayerSettings,
}

#[wasm_bindgen]
impl ChordPlayer {
    #[wasm_bindgen(constructor)]
    pub fn new(sample_rate: f64) -> Result<ChordPlayer, JsValue> {
        ChordPlayer::with_config(sample_rate, EngineConfig::default()).map_err(js_err)
    }

    /// Call from a user gesture before the first sound.
    pub fn resume(&mut self) -> Result<(), JsValue> {
        self.engine.ensure_running().map_err(js_err)
    }

    /// The host finished resuming the audio output.
    pub fn device_resumed(&mut self) {
        self.engine.device_resumed();
    }

    /// One-shot the chord at a wheel position using the current voicing and
    /// waveform. Returns whether anything was scheduled.
    pub fn play_chord(&mut self, position: usize, minor: bool, duration: f64) -> bool {
        let Some(frequencies) = self.chord_frequencies(position, minor) else {
            return false;
        };
        let waveform = self.settings.waveform;
        self.engine
            .play_one_shot(&frequencies, waveform, duration)
            .is_some()
    }

    /// Hold the chord at a wheel position until `stop`.
    pub fn start_chord(&mut self, position: usize, minor: bool) -> bool {
        let Some(frequencies) = self.chord_frequencies(position, minor) else {
            return false;
        };
        let waveform = self.settings.waveform;
        self.engine.start_continuous(&frequencies, waveform)
    }

    /// One-shot the chromatic note at a wheel position (notes mode).
    pub fn play_note(&mut self, position: usize, duration: f64) -> bool {
        let Some(note) = catalog::note_for_position(position, self.settings.note_octave) else {
            return false;
        };
        let waveform = self.settings.waveform;
        self.engine
            .play_one_shot(&[note.frequency], waveform, duration)
            .is_some()
    }

    pub fn play_frequencies(
        &mut self,
        frequencies: Vec<f64>,
        waveform: &str,
        duration: f64,
    ) -> Result<bool, JsValue> {
        let waveform: Waveform = waveform.parse().map_err(js_err)?;
        Ok(self
            .engine
            .play_one_shot(&frequencies, waveform, duration)
            .is_some())
    }

    pub fn start_frequencies(&mut self, frequencies: Vec<f64>, waveform: &str) -> Result<bool, JsValue> {
        let waveform: Waveform = waveform.parse().map_err(js_err)?;
        Ok(self.engine.start_continuous(&frequencies, waveform))
    }

    pub fn stop(&mut self, immediate: bool) {
        self.engine.stop_continuous(immediate);
    }

    pub fn set_master_volume(&mut self, volume: f64) {
        self.engine.set_master_volume(volume);
    }

    pub fn set_waveform(&mut self, waveform: &str) -> Result<(), JsValue> {
        self.settings.waveform = waveform.parse().map_err(js_err)?;
        Ok(())
    }

    pub fn set_voicing(&mut self, voicing: &str) -> Result<(), JsValue> {
        self.settings.voicing = voicing.parse().map_err(js_err)?;
        Ok(())
    }

    pub fn set_note_octave(&mut self, octave: i32) {
        self.settings.note_octave = octave;
    }

    /// Replace all settings from a `PlayerSettings`-shaped JS object.
    pub fn set_settings(&mut self, settings: JsValue) -> Result<(), JsValue> {
        self.settings = serde_wasm_bindgen::from_value(settings).map_err(js_err)?;
        Ok(())
    }

    pub fn teardown(&mut self) {
        self.engine.teardown_all();
    }

    pub fn visibility_changed(&mut self, hidden: bool) {
        self.engine.visibility_changed(hidden);
    }

    /// Fill `buffer` with the next block of mono output.
    pub fn process(&mut self, buffer: &mut [f32]) {
        self.engine.process(buffer);
    }

    pub fn status(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.status()).map_err(js_err)
    }
}

impl ChordPlayer {
    pub fn with_config(sample_rate: f64, config: EngineConfig) -> Result<ChordPlayer, ChordError> {
        Ok(ChordPlayer {
            engine: VoiceEngine::new(PullHost::new(sample_rate), config),
            catalog: Catalog::builtin()?,
            settings: PlayerSettings::default(),
        })
    }

    fn chord_frequencies(&self, position: usize, minor: bool) -> Option<Vec<f64>> {
        let side = if minor { ChordSide::Minor } else { ChordSide::Major };
        let chord = self.catalog.get(position)?;
        Some(chord.frequencies(side, self.settings.voicing).to_vec())
    }

    pub fn settings(&self) -> &PlayerSettings {
        &self.settings
    }

    pub fn engine(&self) -> &VoiceEngine<PullHost> {
        &self.engine
    }

    pub fn engine_mut(&mut self) -> &mut VoiceEngine<PullHost> {
        &mut self.engine
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }
}
