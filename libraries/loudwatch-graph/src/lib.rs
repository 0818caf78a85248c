//! Loudness graph element
//!
//! Consumes interleaved PCM audio and produces packed 32-bit video frames
//! showing a scrolling history of short-term (or momentary) loudness, a scale
//! in LUFS or LU relative to a target, a header line with the current values
//! and optional level gauges.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │        TARGET: -23 LUFS | M: ... | S: ... | I: ... | LRA   │
//! │ +9 ┌──────────────────────────────────────────────────┐ ┌┐ │
//! │    │                     ___/\__                      │ ││ │
//! │ +0 │────────────────────/───────\──────────────────── │ ││ │
//! │    │ _______/\_________/         \___                 │ ██ │
//! │-45 └──────────────────────────────────────────────────┘ └┘ │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```ignore
//! use loudwatch_graph::{GraphElement, GraphSettings, VideoInfo};
//! use loudwatch_core::{AudioBuffer, AudioInfo, SampleFormat};
//!
//! let mut element = GraphElement::new(GraphSettings::default())?;
//! element.configure(AudioInfo::new(SampleFormat::S16, 48000, 2)?, VideoInfo::default())?;
//! element.submit_buffer(buffer)?;
//! while let Some(frame) = element.generate_output()? {
//!     std::fs::write(format!("frame-{:06}.png", frame.offset), frame.to_png()?)?;
//! }
//! ```

#![deny(unsafe_code)]

mod color;
mod element;
mod error;
mod font;
mod frame;
mod layout;
mod render;
mod settings;

pub use color::ArgbColor;
pub use element::GraphElement;
pub use error::{GraphError, Result};
pub use frame::{VideoFormat, VideoFrame, VideoInfo};
pub use layout::{Layout, Region};
pub use render::{linearize_db, GraphReadings, GraphRenderer, SkiaRenderer};
pub use settings::{GraphMeasurement, GraphSettings, ScaleMode};
