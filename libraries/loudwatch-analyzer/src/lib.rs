//! Loudness message element
//!
//! Passes audio through untouched while feeding it to an EBU R128 meter, and
//! queues a `loudness` record every `interval` of stream time:
//!
//! ```text
//! AudioBuffer ──► LoudnessAnalyzer ──► (buffer unchanged)
//!                       │
//!                       ▼
//!               outbox: LoudnessMessage { timestamp, stream-time,
//!                                         running-time, momentary, ... }
//! ```
//!
//! # Example
//!
//! ```ignore
//! use loudwatch_analyzer::{AnalyzerSettings, LoudnessAnalyzer};
//! use loudwatch_core::{AudioBuffer, AudioInfo, SampleFormat};
//!
//! let mut analyzer = LoudnessAnalyzer::new(AnalyzerSettings::default())?;
//! analyzer.configure(AudioInfo::new(SampleFormat::S16, 48000, 2)?)?;
//! analyzer.process_buffer(&buffer)?;
//! for message in analyzer.drain_messages() {
//!     println!("{} momentary={:?}", message.timestamp, message.momentary);
//! }
//! ```

#![deny(unsafe_code)]

mod analyzer;
mod error;
mod message;
mod settings;

pub use analyzer::LoudnessAnalyzer;
pub use error::{AnalyzerError, Result};
pub use message::LoudnessMessage;
pub use settings::{reconfigure, AnalyzerSettings, DEFAULT_INTERVAL};
