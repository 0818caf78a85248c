//! Sample formats and the frame format adapter
//!
//! The meter exposes one typed ingestion entry point per sample format. The
//! adapter owns a typed scratch buffer for the negotiated format, decodes raw
//! native-endian bytes into it and calls the matching entry point.

use crate::error::{CoreError, Result};
use crate::meter::LoudnessMeter;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::trace;

/// Channel counts the meter accepts
pub const SUPPORTED_CHANNELS: [u32; 3] = [1, 2, 5];

/// Interleaved native-endian sample encodings
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum SampleFormat {
    /// 16-bit signed integer
    S16,
    /// 32-bit signed integer
    S32,
    /// 32-bit float
    F32,
    /// 64-bit float
    F64,
}

impl SampleFormat {
    pub const ALL: [Self; 4] = [Self::S16, Self::S32, Self::F32, Self::F64];

    pub fn bytes_per_sample(self) -> usize {
        match self {
            Self::S16 => 2,
            Self::S32 | Self::F32 => 4,
            Self::F64 => 8,
        }
    }

    /// Format name with the host's endianness suffix, e.g. `S16LE`
    pub fn native_name(self) -> String {
        let suffix = if cfg!(target_endian = "little") {
            "LE"
        } else {
            "BE"
        };
        format!("{}{}", self, suffix)
    }
}

impl fmt::Display for SampleFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::S16 => "S16",
            Self::S32 => "S32",
            Self::F32 => "F32",
            Self::F64 => "F64",
        };
        f.write_str(name)
    }
}

impl FromStr for SampleFormat {
    type Err = CoreError;

    /// Accepts bare names (`F32`) and native-endian names (`F32LE` on little-endian hosts)
    fn from_str(s: &str) -> Result<Self> {
        let upper = s.trim().to_ascii_uppercase();
        Self::ALL
            .into_iter()
            .find(|format| upper == format.to_string() || upper == format.native_name())
            .ok_or_else(|| CoreError::UnsupportedFormat(s.to_string()))
    }
}

/// Negotiated audio stream description
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AudioInfo {
    format: SampleFormat,
    sample_rate: u32,
    channels: u32,
}

impl AudioInfo {
    /// Validate and build a stream description
    ///
    /// # Errors
    /// Returns error on a zero sample rate or a channel count other than 1, 2 or 5
    pub fn new(format: SampleFormat, sample_rate: u32, channels: u32) -> Result<Self> {
        if sample_rate == 0 {
            return Err(CoreError::InvalidSampleRate(sample_rate));
        }
        if !SUPPORTED_CHANNELS.contains(&channels) {
            return Err(CoreError::UnsupportedChannels(channels));
        }
        Ok(Self {
            format,
            sample_rate,
            channels,
        })
    }

    pub fn format(&self) -> SampleFormat {
        self.format
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn channels(&self) -> u32 {
        self.channels
    }

    /// Bytes per frame (one sample for every channel)
    pub fn bpf(&self) -> usize {
        self.format.bytes_per_sample() * self.channels as usize
    }

    /// Number of whole frames in `bytes` bytes
    ///
    /// # Errors
    /// Returns [`CoreError::PartialFrame`] when the length does not divide evenly
    pub fn frames_in(&self, bytes: usize) -> Result<usize> {
        let bpf = self.bpf();
        if bytes % bpf != 0 {
            return Err(CoreError::PartialFrame {
                bytes,
                bytes_per_frame: bpf,
            });
        }
        Ok(bytes / bpf)
    }
}

impl fmt::Display for AudioInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} Hz {} ch",
            self.format.native_name(),
            self.sample_rate,
            self.channels
        )
    }
}

#[derive(Debug)]
enum Scratch {
    S16(Vec<i16>),
    S32(Vec<i32>),
    F32(Vec<f32>),
    F64(Vec<f64>),
}

/// Decode fixed-width native-endian values into `out`, reusing its allocation
fn decode_into<T, const N: usize>(data: &[u8], out: &mut Vec<T>, from_bytes: fn([u8; N]) -> T) {
    out.clear();
    out.extend(data.chunks_exact(N).map(|chunk| {
        let mut bytes = [0u8; N];
        bytes.copy_from_slice(chunk);
        from_bytes(bytes)
    }));
}

/// Routes raw frame bytes to the meter's typed ingestion call
#[derive(Debug)]
pub struct FrameAdapter {
    info: AudioInfo,
    scratch: Scratch,
}

impl FrameAdapter {
    pub fn new(info: AudioInfo) -> Self {
        let scratch = match info.format() {
            SampleFormat::S16 => Scratch::S16(Vec::new()),
            SampleFormat::S32 => Scratch::S32(Vec::new()),
            SampleFormat::F32 => Scratch::F32(Vec::new()),
            SampleFormat::F64 => Scratch::F64(Vec::new()),
        };
        Self { info, scratch }
    }

    pub fn info(&self) -> &AudioInfo {
        &self.info
    }

    /// Feed whole frames of raw bytes to `meter`
    ///
    /// # Errors
    /// Returns error if `data` holds a partial frame or the meter rejects the samples
    pub fn feed(&mut self, meter: &mut dyn LoudnessMeter, data: &[u8]) -> Result<()> {
        let frames = self.info.frames_in(data.len())?;
        if frames == 0 {
            return Ok(());
        }
        trace!("Adding {} {} frames to meter", frames, self.info.format());

        match &mut self.scratch {
            Scratch::S16(samples) => {
                decode_into::<i16, 2>(data, samples, i16::from_ne_bytes);
                meter.add_frames_i16(samples)
            }
            Scratch::S32(samples) => {
                decode_into::<i32, 4>(data, samples, i32::from_ne_bytes);
                meter.add_frames_i32(samples)
            }
            Scratch::F32(samples) => {
                decode_into::<f32, 4>(data, samples, f32::from_ne_bytes);
                meter.add_frames_f32(samples)
            }
            Scratch::F64(samples) => {
                decode_into::<f64, 8>(data, samples, f64::from_ne_bytes);
                meter.add_frames_f64(samples)
            }
        }
    }
}
