//! End-to-end tests: catalog data through frequencies into the voice engine.

use chordwheel_core::chord::{ChordOptions, ChordQuality, generate_progression};
use chordwheel_core::frequency::analyze_precision;
use chordwheel_core::{
    Catalog, CatalogData, ChordError, ChordSide, EngineConfig, FrequencyTable, PullHost,
    VoiceEngine, Voicing, Waveform, calculate_frequency,
};

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() <= 0.01
}

fn engine() -> VoiceEngine<PullHost> {
    let mut engine = VoiceEngine::new(PullHost::new(8000.0), EngineConfig::default());
    engine.ensure_running().expect("pull host never denies by default");
    engine
}

#[test]
fn position_zero_resolves_to_c_major_and_a_minor() {
    let catalog = Catalog::builtin().unwrap();
    let c = catalog.get(0).unwrap();

    assert_eq!(c.identity(ChordSide::Major), "C");
    assert_eq!(c.identity(ChordSide::Minor), "Am");
    assert_eq!(c.notes(ChordSide::Major), ["C4", "E4", "G4"]);

    let expected = [261.63, 329.63, 392.0];
    let standard = c.frequencies(ChordSide::Major, Voicing::Standard);
    assert_eq!(standard.len(), 3);
    for (got, want) in standard.iter().zip(expected) {
        assert!(close(*got, want), "expected {want}, got {got}");
    }

    let bass = c.frequencies(ChordSide::Major, Voicing::Bass);
    assert_eq!(bass.len(), 4);
    assert!(close(bass[0], 65.41), "bass root should be C2, got {}", bass[0]);
    assert_eq!(&bass[1..], standard);

    let def = catalog.definition("C").unwrap();
    assert_eq!(def.bass.as_deref().unwrap()[0], "C2");
}

#[test]
fn octave_doubles_frequency() {
    for pc in ["C", "C#", "Db", "E", "F#", "Ab", "B"] {
        for octave in 1..7 {
            let low = calculate_frequency(&format!("{pc}{octave}")).unwrap();
            let high = calculate_frequency(&format!("{pc}{}", octave + 1)).unwrap();
            assert!(
                (high - 2.0 * low).abs() < 0.01,
                "{pc}{octave}: {high} != 2 * {low}"
            );
        }
    }
    assert_eq!(calculate_frequency("A4").unwrap(), 440.0);
}

#[test]
fn enharmonic_pairs_share_frequencies() {
    let table = FrequencyTable::new(0, 8, true);
    for (sharp, flat) in [("C#", "Db"), ("D#", "Eb"), ("F#", "Gb"), ("G#", "Ab"), ("A#", "Bb")] {
        for octave in 0..=8 {
            assert_eq!(
                table.get(&format!("{sharp}{octave}")),
                table.get(&format!("{flat}{octave}")),
                "{sharp}{octave} vs {flat}{octave}"
            );
        }
    }
}

#[test]
fn stored_table_is_precise() {
    let table = FrequencyTable::new(1, 7, true);
    let report = analyze_precision(table.iter()).unwrap();
    assert_eq!(report.len(), table.len());
    assert!(report.iter().all(|r| r.difference <= 0.005 + 1e-9));
}

#[test]
fn catalog_from_json_with_missing_identity_fails() {
    let chords = r#"{"C": ["C4", "E4", "G4"]}"#;
    let circle = r#"[{"majorId": "C", "majorDisplay": "C", "minorId": "Am",
                      "minorDisplay": "Am", "keySignature": "0"}]"#;
    let data = CatalogData::from_json(chords, circle).unwrap();
    let err = Catalog::resolve(&data, FrequencyTable::new(1, 7, true)).unwrap_err();
    assert!(matches!(err, ChordError::UnknownChordIdentity(ref id) if id == "Am"));

    assert!(matches!(
        CatalogData::from_json("not json", "[]"),
        Err(ChordError::Catalog(_))
    ));
}

#[test]
fn wheel_chord_plays_through_engine() {
    let catalog = Catalog::builtin().unwrap();
    let mut engine = engine();

    let g_major = catalog.get(1).unwrap().frequencies(ChordSide::Major, Voicing::Rich);
    assert_eq!(g_major.len(), 5);
    engine.play_one_shot(g_major, Waveform::Triangle, 1.0).unwrap();
    assert_eq!(engine.active_voice_count(), 5);

    let audio = engine.render(4000);
    assert!(audio.iter().any(|s| s.abs() > 0.01));
    assert!(audio.iter().all(|s| s.abs() <= 1.0));

    engine.advance(0.7);
    assert_eq!(engine.active_voice_count(), 0);
    assert_eq!(engine.graph_node_counts(), (0, 1));
}

#[test]
fn sliding_across_the_wheel_leaves_one_chord() {
    let catalog = Catalog::builtin().unwrap();
    let mut engine = engine();

    for position in 0..catalog.len() {
        let chord = catalog.get(position).unwrap();
        engine.start_continuous(chord.frequencies(ChordSide::Major, Voicing::Standard), Waveform::Sine);
        engine.advance(0.01);
        engine.stop_continuous(false);
        engine.advance(0.02);
    }
    let last = catalog.get(catalog.len() - 1).unwrap();
    engine.start_continuous(last.frequencies(ChordSide::Minor, Voicing::Standard), Waveform::Sine);

    engine.advance(0.5);
    assert_eq!(engine.active_voice_count(), 3);
    assert_eq!(engine.group_count(), 1);
    assert_eq!(
        engine.continuous_frequencies(),
        Some(last.frequencies(ChordSide::Minor, Voicing::Standard))
    );

    engine.stop_continuous(false);
    engine.advance(0.3);
    assert_eq!(engine.active_voice_count(), 0);
    assert_eq!(engine.graph_node_counts(), (0, 1));
}

#[test]
fn progression_plays_by_note_name() {
    let chords = generate_progression(&["C4", "Am3", "F#m5"], 4).unwrap();
    assert_eq!(chords.len(), 3);

    let notes = chordwheel_core::chord::chord_notes(&ChordOptions::new("G3", ChordQuality::Dom7))
        .unwrap()
        .iter()
        .map(|n| n.to_string())
        .collect::<Vec<_>>();

    let mut engine = engine();
    for chord in &chords {
        assert!(engine.play_one_shot(chord, Waveform::Sawtooth, 0.25).is_some());
    }
    assert!(engine.play_notes(&notes, Waveform::Square, 0.25).is_some());
    assert_eq!(engine.active_voice_count(), 13);

    engine.advance(0.5);
    assert_eq!(engine.active_voice_count(), 0);
}

#[test]
fn teardown_then_reuse() {
    let mut engine = engine();
    engine.start_continuous(&[261.63, 329.63, 392.0], Waveform::Sine);
    engine.teardown_all();
    engine.teardown_all();
    assert!(!engine.status().is_initialized);

    assert!(engine.play_notes(&["A4"], Waveform::Sine, 0.1).is_some());
    assert!(engine.status().is_initialized);
    assert_eq!(engine.host().opened(), 2);
}
