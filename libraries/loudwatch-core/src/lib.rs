//! Shared engine for the loudwatch elements
//!
//! This crate provides:
//! - Clock and segment arithmetic (nanosecond clock values, frame/time conversion)
//! - Sample formats and the frame format adapter that feeds raw bytes to a meter
//! - The [`LoudnessMeter`] seam with an EBU R128 implementation backed by `ebur128`
//! - Interval accounting for one or two cadences driven by the same frame counter
//! - The measurement history ring used by the graph renderer
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────┐     ┌───────────────┐     ┌────────────────┐
//! │ AudioBuffer │ ──► │ FrameAdapter  │ ──► │ LoudnessMeter  │
//! └─────────────┘     └───────────────┘     └────────────────┘
//!        │                    ▲                      │
//!        ▼                    │ chunk sizes          ▼
//! ┌─────────────┐     ┌───────────────┐     ┌────────────────┐
//! │ StreamClock │ ◄── │   Interval    │ ──► │  HistoryRing   │
//! └─────────────┘     └───────────────┘     └────────────────┘
//! ```
//!
//! The elements themselves live in `loudwatch-analyzer` (messages) and
//! `loudwatch-graph` (video frames).

#![deny(unsafe_code)]

mod buffer;
mod clock;
mod error;
mod format;
mod history;
mod interval;
mod meter;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use buffer::AudioBuffer;
pub use clock::{ClockTime, Segment, StreamClock};
pub use error::{CoreError, Result};
pub use format::{AudioInfo, FrameAdapter, SampleFormat, SUPPORTED_CHANNELS};
pub use history::{HistoryIter, HistoryRing};
pub use interval::{DualCadence, Interval};
pub use meter::{
    linear_to_db, EbuR128Factory, EbuR128Meter, LoudnessMeter, MeterFactory, MeterSpec, Mode,
};
