//! Offline renderer — plays a one-shot chord through a pull-driven voice
//! engine and captures the result as samples or a WAV byte buffer.

use crate::settings::EngineConfig;

use super::device::PullHost;
use super::engine::VoiceEngine;
use super::oscillator::Waveform;

/// Render a one-shot chord to mono f32 samples covering `duration` seconds.
/// Invalid input yields an empty buffer.
pub fn render_one_shot_samples(
    frequencies: &[f64],
    waveform: Waveform,
    duration: f64,
    sample_rate: u32,
    config: &EngineConfig,
) -> Vec<f32> {
    let mut engine = VoiceEngine::new(PullHost::new(sample_rate as f64), config.clone());
    if engine.play_one_shot(frequencies, waveform, duration).is_none() {
        return Vec::new();
    }
    let frames = (duration * sample_rate as f64).ceil() as usize;
    let samples = engine.render(frames);
    engine.teardown_all();
    samples
}

/// Render a one-shot chord to a WAV file as bytes (16-bit mono PCM).
pub fn render_one_shot_wav(
    frequencies: &[f64],
    waveform: Waveform,
    duration: f64,
    sample_rate: u32,
) -> Vec<u8> {
    let samples = render_one_shot_samples(
        frequencies,
        waveform,
        duration,
        sample_rate,
        &EngineConfig::default(),
    );
    let pcm: Vec<i16> = samples
        .iter()
        .map(|&s| (s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)
        .collect();
    encode_wav(&pcm, sample_rate, 1)
}

/// Encode interleaved i16 PCM samples to a WAV byte buffer.
fn encode_wav(samples: &[i16], sample_rate: u32, channels: u16) -> Vec<u8> {
    let bits_per_sample: u16 = 16;
    let byte_rate = sample_rate * channels as u32 * (bits_per_sample as u32 / 8);
    let block_align = channels * (bits_per_sample / 8);
    let data_size = (samples.len() * 2) as u32;

    let mut buf = Vec::with_capacity(44 + data_size as usize);

    buf.extend_from_slice(b"RIFF");
    buf.extend_from_slice(&(36 + data_size).to_le_bytes());
    buf.extend_from_slice(b"WAVE");

    buf.extend_from_slice(b"fmt ");
    buf.extend_from_slice(&16u32.to_le_bytes());
    buf.extend_from_slice(&1u16.to_le_bytes()); // PCM
    buf.extend_from_slice(&channels.to_le_bytes());
    buf.extend_from_slice(&sample_rate.to_le_bytes());
    buf.extend_from_slice(&byte_rate.to_le_bytes());
    buf.extend_from_slice(&block_align.to_le_bytes());
    buf.extend_from_slice(&bits_per_sample.to_le_bytes());

    buf.extend_from_slice(b"data");
    buf.extend_from_slice(&data_size.to_le_bytes());
    for &sample in samples {
        buf.extend_from_slice(&sample.to_le_bytes());
    }

    buf
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wav_header_valid() {
        let wav = render_one_shot_wav(&[261.63, 329.63, 392.0], Waveform::Triangle, 0.25, 22050);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(&wav[36..40], b"data");

        let sr = u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]);
        assert_eq!(sr, 22050);
        let ch = u16::from_le_bytes([wav[22], wav[23]]);
        assert_eq!(ch, 1);
    }

    #[test]
    fn wav_size_matches_duration() {
        let wav = render_one_shot_wav(&[440.0], Waveform::Sine, 0.5, 44100);
        // 0.5s = 22050 frames * 2 bytes
        let data_size = u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]);
        assert_eq!(data_size, 44100);
        assert_eq!(wav.len(), 44 + 44100);
    }

    #[test]
    fn chord_is_audible_then_fades() {
        let samples = render_one_shot_samples(
            &[440.0],
            Waveform::Sine,
            1.0,
            8000,
            &EngineConfig::default(),
        );
        assert_eq!(samples.len(), 8000);

        let peak = |range: std::ops::Range<usize>| {
            samples[range].iter().fold(0.0f32, |m, s| m.max(s.abs()))
        };
        let early = peak(1000..2000);
        let late = peak(7600..8000);
        assert!(early > 0.2, "expected an audible chord, got peak {early}");
        assert!(late < early * 0.1, "expected a fade, got {late} vs {early}");
    }

    #[test]
    fn invalid_input_renders_nothing() {
        let samples =
            render_one_shot_samples(&[], Waveform::Sine, 1.0, 8000, &EngineConfig::default());
        assert!(samples.is_empty());
        let wav = render_one_shot_wav(&[440.0], Waveform::Sine, -1.0, 8000);
        assert_eq!(wav.len(), 44);
    }
}
