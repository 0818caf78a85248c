//! Error types for the loudwatch engine

use thiserror::Error;

/// Result type for engine operations
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors raised while configuring or feeding the engine
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// Sample format tag outside S16/S32/F32/F64 (native endian)
    #[error("Unsupported sample format: {0}")]
    UnsupportedFormat(String),

    /// Channel layout the meter cannot handle
    #[error("Unsupported channel count: {0} (must be 1, 2 or 5)")]
    UnsupportedChannels(u32),

    /// Zero sample rate
    #[error("Invalid sample rate: {0} Hz")]
    InvalidSampleRate(u32),

    /// Buffer length is not a whole number of frames
    #[error("Buffer of {bytes} bytes is not a multiple of the {bytes_per_frame}-byte frame size")]
    PartialFrame { bytes: usize, bytes_per_frame: usize },

    /// A call into the loudness meter reported failure
    #[error("Loudness meter call {call} failed: {details}")]
    Meter { call: &'static str, details: String },

    /// An interval cannot be derived from the given inputs
    #[error("Invalid interval: {0}")]
    InvalidInterval(String),

    /// History ring sized to zero slots
    #[error("History ring capacity must be at least 1")]
    InvalidCapacity,
}

impl CoreError {
    /// Build a mapper that tags an `ebur128` failure with the call that raised it
    pub fn meter(call: &'static str) -> impl FnOnce(ebur128::Error) -> Self {
        move |err| Self::Meter {
            call,
            details: format!("{:?}", err),
        }
    }
}

impl From<ebur128::Error> for CoreError {
    fn from(err: ebur128::Error) -> Self {
        Self::Meter {
            call: "ebur128",
            details: format!("{:?}", err),
        }
    }
}
