//! Element tests against the real `ebur128` meter
//!
//! Fixtures are 48 kHz stereo. The waveform generator mirrors the classic
//! reference check: a 500 Hz ramp at 1/8 of full scale measures just under
//! -19 LUFS momentary loudness.

use loudwatch_analyzer::{AnalyzerSettings, LoudnessAnalyzer, LoudnessMessage};
use loudwatch_core::{AudioBuffer, AudioInfo, ClockTime, SampleFormat};

const RATE: u32 = 48000;
const CHANNELS: u32 = 2;

// ========== Helper Functions ==========

fn setup(format: SampleFormat, settings: AnalyzerSettings) -> LoudnessAnalyzer {
    let mut analyzer = LoudnessAnalyzer::new(settings).unwrap();
    analyzer
        .configure(AudioInfo::new(format, RATE, CHANNELS).unwrap())
        .unwrap();
    analyzer
}

fn num_frames(num_msecs: u32) -> usize {
    (RATE * num_msecs / 1000) as usize
}

/// All-zero buffer with pts 0
fn silent_buffer(format: SampleFormat, num_msecs: u32) -> AudioBuffer {
    AudioBuffer::silence(
        num_frames(num_msecs),
        format.bytes_per_sample() * CHANNELS as usize,
    )
    .with_pts(ClockTime::ZERO)
}

/// 500 Hz wave at 1/8 full scale, same value on every channel
fn triangle_buffer(format: SampleFormat, num_msecs: u32) -> AudioBuffer {
    let samples_per_wave = RATE / 500;
    let mut data = Vec::new();

    for frame in 0..num_frames(num_msecs) {
        let step = frame as u32 % samples_per_wave;
        let sample: Vec<u8> = match format {
            SampleFormat::S16 => {
                let slope = i32::from(i16::MAX) / samples_per_wave as i32 * 2;
                let value = (i32::from(i16::MIN) + step as i32 * slope) as i16;
                (value / 8).to_ne_bytes().to_vec()
            }
            SampleFormat::S32 => {
                let slope = i64::from(i32::MAX) / i64::from(samples_per_wave) * 2;
                let value = (i64::from(i32::MIN) + i64::from(step) * slope) as i32;
                (value / 8).to_ne_bytes().to_vec()
            }
            SampleFormat::F32 => {
                let value = step as f32 * (1.0 / samples_per_wave as f32 * 2.0) + 1.0;
                (value / 8.0).to_ne_bytes().to_vec()
            }
            SampleFormat::F64 => {
                let value = f64::from(step) * (1.0 / f64::from(samples_per_wave) * 2.0) + 1.0;
                (value / 8.0).to_ne_bytes().to_vec()
            }
        };
        for _ in 0..CHANNELS {
            data.extend_from_slice(&sample);
        }
    }

    AudioBuffer::new(data).with_pts(ClockTime::ZERO)
}

fn only_message(analyzer: &mut LoudnessAnalyzer) -> LoudnessMessage {
    let mut messages = analyzer.drain_messages();
    assert_eq!(messages.len(), 1, "expected exactly one record");
    messages.remove(0)
}

// ========== Emission ==========

#[test]
fn test_emits_message() {
    let mut analyzer = setup(SampleFormat::S16, AnalyzerSettings::default());
    analyzer
        .process_buffer(&silent_buffer(SampleFormat::S16, 100))
        .unwrap();

    let message = only_message(&mut analyzer);
    assert_eq!(LoudnessMessage::NAME, "loudness");
    assert!(message.momentary.is_some());
}

#[test]
fn test_timestamps() {
    let mut analyzer = setup(SampleFormat::S16, AnalyzerSettings::default());

    for iteration in 0..3u64 {
        analyzer
            .process_buffer(&silent_buffer(SampleFormat::S16, 100))
            .unwrap();

        let message = only_message(&mut analyzer);
        let expectation = ClockTime::from_mseconds((iteration + 1) * 100);
        assert!(message.has_field("timestamp"));
        assert!(message.has_field("stream-time"));
        assert!(message.has_field("running-time"));
        assert_eq!(message.timestamp, expectation);
        assert_eq!(message.stream_time, expectation);
        assert_eq!(message.running_time, expectation);
    }
}

#[test]
fn test_long_buffer_emits_every_interval() {
    let mut analyzer = setup(SampleFormat::S16, AnalyzerSettings::default());
    analyzer
        .process_buffer(&silent_buffer(SampleFormat::S16, 1000))
        .unwrap();

    let timestamps: Vec<u64> = analyzer
        .drain_messages()
        .iter()
        .map(|message| message.timestamp.mseconds())
        .collect();
    assert_eq!(
        timestamps,
        vec![100, 200, 300, 400, 500, 600, 700, 800, 900, 1000]
    );
}

#[test]
fn test_per_channel_array() {
    let mut analyzer = setup(
        SampleFormat::S16,
        AnalyzerSettings {
            sample_peak: true,
            true_peak: true,
            ..AnalyzerSettings::default()
        },
    );
    analyzer
        .process_buffer(&silent_buffer(SampleFormat::S16, 100))
        .unwrap();

    let message = only_message(&mut analyzer);
    assert_eq!(message.sample_peak.as_ref().map(Vec::len), Some(2));
    assert_eq!(message.true_peak.as_ref().map(Vec::len), Some(2));
}

#[test]
fn test_mode_change() {
    let mut analyzer = setup(SampleFormat::S16, AnalyzerSettings::default());

    analyzer
        .process_buffer(&silent_buffer(SampleFormat::S16, 100))
        .unwrap();
    let message = only_message(&mut analyzer);
    assert_eq!(message.n_fields(), 4);
    assert!(message.has_field("momentary"));

    analyzer
        .set_settings(AnalyzerSettings {
            window: 200,
            sample_peak: true,
            ..AnalyzerSettings::default()
        })
        .unwrap();
    analyzer
        .process_buffer(&silent_buffer(SampleFormat::S16, 100))
        .unwrap();

    let message = only_message(&mut analyzer);
    assert_eq!(message.n_fields(), 6);
    for field in [
        "timestamp",
        "stream-time",
        "running-time",
        "momentary",
        "window",
        "sample-peak",
    ] {
        assert!(message.has_field(field), "missing {}", field);
    }
}

// ========== Formats ==========

fn assert_accepts(format: SampleFormat) {
    let mut analyzer = setup(
        format,
        AnalyzerSettings {
            interval: ClockTime::from_mseconds(1000),
            ..AnalyzerSettings::default()
        },
    );
    analyzer
        .process_buffer(&triangle_buffer(format, 1000))
        .unwrap();

    let momentary = only_message(&mut analyzer).momentary.unwrap();
    assert!(
        -20.0 < momentary && momentary < -19.0,
        "{}: momentary {} outside (-20, -19)",
        format,
        momentary
    );
}

#[test]
fn test_accepts_s16() {
    assert_accepts(SampleFormat::S16);
}

#[test]
fn test_accepts_s32() {
    assert_accepts(SampleFormat::S32);
}

#[test]
fn test_accepts_f32() {
    assert_accepts(SampleFormat::F32);
}

#[test]
fn test_accepts_f64() {
    assert_accepts(SampleFormat::F64);
}

#[test]
fn test_silence_is_negative_infinity() {
    let mut analyzer = setup(SampleFormat::F32, AnalyzerSettings::default());
    analyzer
        .process_buffer(&silent_buffer(SampleFormat::F32, 500))
        .unwrap();

    let last = analyzer.drain_messages().pop().unwrap();
    assert_eq!(last.momentary, Some(f64::NEG_INFINITY));
}
