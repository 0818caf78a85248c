//! Loudness meter seam
//!
//! The elements never talk to `ebur128` directly. They own a
//! `Box<dyn LoudnessMeter>` created by a [`MeterFactory`], which lets the
//! scheduling logic run against a scripted meter in tests.

use crate::error::{CoreError, Result};
use ebur128::EbuR128;
use tracing::debug;

pub use ebur128::Mode;

/// Parameters a meter is created with
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MeterSpec {
    pub channels: u32,
    pub sample_rate: u32,
    pub mode: Mode,
    /// Longest window that can be queried, in ms (0 keeps the meter default)
    pub max_window_ms: u32,
    /// Longest history kept for integrated loudness and LRA, in ms
    pub max_history_ms: u32,
}

impl MeterSpec {
    pub fn new(channels: u32, sample_rate: u32, mode: Mode) -> Self {
        Self {
            channels,
            sample_rate,
            mode,
            max_window_ms: 0,
            max_history_ms: u32::MAX,
        }
    }
}

/// Accumulates PCM frames and answers loudness queries
///
/// Frames are interleaved; every slice holds a whole number of frames.
pub trait LoudnessMeter {
    fn channels(&self) -> u32;

    fn add_frames_i16(&mut self, frames: &[i16]) -> Result<()>;
    fn add_frames_i32(&mut self, frames: &[i32]) -> Result<()>;
    fn add_frames_f32(&mut self, frames: &[f32]) -> Result<()>;
    fn add_frames_f64(&mut self, frames: &[f64]) -> Result<()>;

    /// Loudness of the last 400 ms in LUFS
    fn loudness_momentary(&self) -> Result<f64>;
    /// Loudness of the last 3 s in LUFS
    fn loudness_shortterm(&self) -> Result<f64>;
    /// Gated integrated loudness in LUFS
    fn loudness_global(&self) -> Result<f64>;
    /// Loudness of the last `window_ms` milliseconds in LUFS
    fn loudness_window(&self, window_ms: u32) -> Result<f64>;
    /// Loudness range in LU
    fn loudness_range(&self) -> Result<f64>;
    /// Highest absolute sample value seen on `channel` (1.0 is full scale)
    fn sample_peak(&self, channel: u32) -> Result<f64>;
    /// Highest oversampled peak seen on `channel` (1.0 is full scale)
    fn true_peak(&self, channel: u32) -> Result<f64>;
}

/// Creates meters for a negotiated stream
pub trait MeterFactory {
    fn create(&self, spec: &MeterSpec) -> Result<Box<dyn LoudnessMeter>>;
}

/// [`LoudnessMeter`] backed by the `ebur128` crate
pub struct EbuR128Meter {
    inner: EbuR128,
    channels: u32,
}

impl EbuR128Meter {
    /// Create a meter for `spec`
    ///
    /// # Errors
    /// Returns error if `ebur128` rejects the channel count, rate or mode
    pub fn new(spec: &MeterSpec) -> Result<Self> {
        let mut inner = EbuR128::new(spec.channels, spec.sample_rate, spec.mode)
            .map_err(CoreError::meter("ebur128_init"))?;

        if spec.max_window_ms > 0 {
            inner
                .set_max_window(spec.max_window_ms)
                .map_err(CoreError::meter("ebur128_set_max_window"))?;
        }
        inner
            .set_max_history(spec.max_history_ms)
            .map_err(CoreError::meter("ebur128_set_max_history"))?;

        debug!(
            "Initialized ebur128: rate={} channels={} mode={:?} max_window={} max_history={}",
            spec.sample_rate, spec.channels, spec.mode, spec.max_window_ms, spec.max_history_ms
        );

        Ok(Self {
            inner,
            channels: spec.channels,
        })
    }
}

impl LoudnessMeter for EbuR128Meter {
    fn channels(&self) -> u32 {
        self.channels
    }

    fn add_frames_i16(&mut self, frames: &[i16]) -> Result<()> {
        self.inner
            .add_frames_i16(frames)
            .map_err(CoreError::meter("add_frames_i16"))
    }

    fn add_frames_i32(&mut self, frames: &[i32]) -> Result<()> {
        self.inner
            .add_frames_i32(frames)
            .map_err(CoreError::meter("add_frames_i32"))
    }

    fn add_frames_f32(&mut self, frames: &[f32]) -> Result<()> {
        self.inner
            .add_frames_f32(frames)
            .map_err(CoreError::meter("add_frames_f32"))
    }

    fn add_frames_f64(&mut self, frames: &[f64]) -> Result<()> {
        self.inner
            .add_frames_f64(frames)
            .map_err(CoreError::meter("add_frames_f64"))
    }

    fn loudness_momentary(&self) -> Result<f64> {
        self.inner
            .loudness_momentary()
            .map_err(CoreError::meter("loudness_momentary"))
    }

    fn loudness_shortterm(&self) -> Result<f64> {
        self.inner
            .loudness_shortterm()
            .map_err(CoreError::meter("loudness_shortterm"))
    }

    fn loudness_global(&self) -> Result<f64> {
        self.inner
            .loudness_global()
            .map_err(CoreError::meter("loudness_global"))
    }

    fn loudness_window(&self, window_ms: u32) -> Result<f64> {
        self.inner
            .loudness_window(window_ms)
            .map_err(CoreError::meter("loudness_window"))
    }

    fn loudness_range(&self) -> Result<f64> {
        self.inner
            .loudness_range()
            .map_err(CoreError::meter("loudness_range"))
    }

    fn sample_peak(&self, channel: u32) -> Result<f64> {
        self.inner
            .sample_peak(channel)
            .map_err(CoreError::meter("sample_peak"))
    }

    fn true_peak(&self, channel: u32) -> Result<f64> {
        self.inner
            .true_peak(channel)
            .map_err(CoreError::meter("true_peak"))
    }
}

/// Factory for [`EbuR128Meter`]
#[derive(Debug, Clone, Copy, Default)]
pub struct EbuR128Factory;

impl MeterFactory for EbuR128Factory {
    fn create(&self, spec: &MeterSpec) -> Result<Box<dyn LoudnessMeter>> {
        Ok(Box::new(EbuR128Meter::new(spec)?))
    }
}

/// Convert a linear peak (1.0 = full scale) to dB
pub fn linear_to_db(linear: f64) -> f64 {
    if linear <= 0.0 {
        return f64::NEG_INFINITY;
    }
    20.0 * linear.log10()
}
