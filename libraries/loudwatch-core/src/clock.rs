//! Clock values, segments and stream position tracking
//!
//! All times are unsigned nanoseconds. `ClockTime::NONE` (all bits set) marks
//! an unknown or out-of-segment time, the same sentinel media frameworks use
//! on the wire.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

/// A point in time or a duration in nanoseconds
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct ClockTime(u64);

impl ClockTime {
    pub const ZERO: Self = Self(0);
    pub const NONE: Self = Self(u64::MAX);
    pub const SECOND: Self = Self(1_000_000_000);
    pub const MSECOND: Self = Self(1_000_000);

    pub const fn from_nseconds(nseconds: u64) -> Self {
        Self(nseconds)
    }

    pub const fn from_mseconds(mseconds: u64) -> Self {
        Self(mseconds.saturating_mul(1_000_000))
    }

    pub const fn from_seconds(seconds: u64) -> Self {
        Self(seconds.saturating_mul(1_000_000_000))
    }

    pub const fn nseconds(self) -> u64 {
        self.0
    }

    pub const fn mseconds(self) -> u64 {
        self.0 / 1_000_000
    }

    pub const fn is_none(self) -> bool {
        self.0 == u64::MAX
    }

    /// Duration of `frames` audio frames at `sample_rate`, rounded to the nearest nanosecond
    pub fn from_frames(frames: u64, sample_rate: u32) -> Self {
        Self(scale_round(frames, Self::SECOND.0, u64::from(sample_rate)))
    }

    /// Number of frames at `sample_rate` covered by this duration, rounded to the nearest frame
    pub fn to_frames(self, sample_rate: u32) -> u64 {
        scale_round(self.0, u64::from(sample_rate), Self::SECOND.0)
    }

    #[must_use]
    pub fn saturating_add(self, other: Self) -> Self {
        if self.is_none() || other.is_none() {
            return Self::NONE;
        }
        Self(self.0.saturating_add(other.0).min(u64::MAX - 1))
    }

    #[must_use]
    pub fn saturating_sub(self, other: Self) -> Self {
        Self(self.0.saturating_sub(other.0))
    }

    pub fn checked_sub(self, other: Self) -> Option<Self> {
        self.0.checked_sub(other.0).map(Self)
    }

    /// Divide a duration into `parts` equal pieces, truncating
    pub fn divide(self, parts: u64) -> Option<Self> {
        self.0.checked_div(parts).map(Self)
    }
}

impl fmt::Display for ClockTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_none() {
            return write!(f, "--:--:--.---------");
        }
        let total_seconds = self.0 / 1_000_000_000;
        write!(
            f,
            "{}:{:02}:{:02}.{:09}",
            total_seconds / 3600,
            (total_seconds / 60) % 60,
            total_seconds % 60,
            self.0 % 1_000_000_000
        )
    }
}

/// `val * num / denom` rounded to nearest, without intermediate overflow
fn scale_round(val: u64, num: u64, denom: u64) -> u64 {
    if denom == 0 {
        return u64::MAX;
    }
    let scaled = (u128::from(val) * u128::from(num) + u128::from(denom) / 2) / u128::from(denom);
    u64::try_from(scaled).unwrap_or(u64::MAX)
}

/// Timeline mapping supplied by the host
///
/// Projects buffer timestamps to running-time (time since the pipeline started
/// playing this segment) and stream-time (position within the media).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub start: ClockTime,
    pub stop: Option<ClockTime>,
    pub time: ClockTime,
    pub base: ClockTime,
    pub rate: f64,
    pub applied_rate: f64,
}

impl Default for Segment {
    fn default() -> Self {
        Self {
            start: ClockTime::ZERO,
            stop: None,
            time: ClockTime::ZERO,
            base: ClockTime::ZERO,
            rate: 1.0,
            applied_rate: 1.0,
        }
    }
}

impl Segment {
    fn contains(&self, position: ClockTime) -> bool {
        if position.is_none() || position < self.start {
            return false;
        }
        self.stop.map_or(true, |stop| position <= stop)
    }

    /// Running-time of `position`, or `None` when it lies outside the segment
    pub fn to_running_time(&self, position: ClockTime) -> Option<ClockTime> {
        if !self.contains(position) || self.rate == 0.0 {
            return None;
        }
        let offset = if self.rate > 0.0 {
            position.saturating_sub(self.start)
        } else {
            self.stop?.saturating_sub(position)
        };
        Some(
            self.base
                .saturating_add(scale_by(offset, 1.0 / self.rate.abs())),
        )
    }

    /// Stream-time of `position`, or `None` when it lies outside the segment
    pub fn to_stream_time(&self, position: ClockTime) -> Option<ClockTime> {
        if !self.contains(position) {
            return None;
        }
        let offset = scale_by(
            position.saturating_sub(self.start),
            self.applied_rate.abs(),
        );
        if self.applied_rate >= 0.0 {
            Some(self.time.saturating_add(offset))
        } else {
            self.time.checked_sub(offset)
        }
    }
}

fn scale_by(value: ClockTime, factor: f64) -> ClockTime {
    if factor == 1.0 {
        return value;
    }
    ClockTime::from_nseconds((value.nseconds() as f64 * factor).round() as u64)
}

/// Position of the element within its audio stream
///
/// Counts every frame fed to the meter and anchors that count to the
/// timestamp of the first buffer (or the latest discontinuity).
#[derive(Debug, Clone, PartialEq)]
pub struct StreamClock {
    sample_rate: u32,
    frames_processed: u64,
    /// Timestamp and frame count at the last reference point
    reference: Option<(ClockTime, u64)>,
}

impl StreamClock {
    pub fn new(sample_rate: u32) -> Self {
        Self {
            sample_rate,
            frames_processed: 0,
            reference: None,
        }
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn frames_processed(&self) -> u64 {
        self.frames_processed
    }

    /// Take the timing of an incoming buffer into account
    ///
    /// The first buffer anchors the clock; a discontinuity re-anchors it to
    /// the buffer's own timestamp.
    pub fn observe_buffer(&mut self, pts: Option<ClockTime>, discont: bool) {
        match (self.reference, pts) {
            (None, pts) => {
                let start = pts.unwrap_or(ClockTime::ZERO);
                debug!("Anchoring stream clock at {} (frame {})", start, self.frames_processed);
                self.reference = Some((start, self.frames_processed));
            }
            (Some(_), Some(pts)) if discont => {
                debug!(
                    "Discontinuity: re-anchoring stream clock at {} (frame {})",
                    pts, self.frames_processed
                );
                self.reference = Some((pts, self.frames_processed));
            }
            _ => {}
        }
    }

    /// Account for frames that were fed to the meter
    pub fn advance(&mut self, frames: u64) {
        self.frames_processed += frames;
    }

    /// Timestamp of the frame boundary the clock currently sits on
    pub fn timestamp(&self) -> ClockTime {
        let (start, anchor_frame) = self.reference.unwrap_or((ClockTime::ZERO, 0));
        start.saturating_add(ClockTime::from_frames(
            self.frames_processed - anchor_frame,
            self.sample_rate,
        ))
    }

    /// Stream duration covered by all frames processed so far
    pub fn elapsed(&self) -> ClockTime {
        ClockTime::from_frames(self.frames_processed, self.sample_rate)
    }

    /// Forget position and anchor
    pub fn reset(&mut self) {
        self.frames_processed = 0;
        self.reference = None;
    }
}
