//! Frame-counted cadences
//!
//! An [`Interval`] fires after a fixed number of audio frames. Elements feed
//! the meter in chunks no larger than [`Interval::frames_until_due`], so a
//! boundary always lands exactly between two chunks regardless of how the
//! host sized its buffers.

use crate::clock::ClockTime;
use crate::error::{CoreError, Result};
use tracing::warn;

/// One cadence: a period in frames and the frames accumulated toward it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    period_frames: u64,
    elapsed_frames: u64,
}

impl Interval {
    /// Interval of `period_frames` frames; zero is clamped to one frame
    pub fn from_frames(period_frames: u64) -> Self {
        if period_frames == 0 {
            warn!("Interval of 0 frames is not possible, clamping to 1 frame");
        }
        Self {
            period_frames: period_frames.max(1),
            elapsed_frames: 0,
        }
    }

    /// Interval lasting `period` at `sample_rate`, rounded to the nearest frame
    ///
    /// A period shorter than half a frame rounds to zero and is clamped to a
    /// single frame with a warning.
    pub fn from_duration(period: ClockTime, sample_rate: u32) -> Self {
        let frames = period.to_frames(sample_rate);
        if frames == 0 {
            warn!(
                "Interval {} is too small, it is shorter than one frame at {} Hz ({}); clamping to 1 frame",
                period,
                sample_rate,
                ClockTime::from_frames(1, sample_rate)
            );
            return Self::from_frames(1);
        }
        Self::from_frames(frames)
    }

    /// Interval of one video frame at `fps_n / fps_d` frames per second
    ///
    /// # Errors
    /// Returns error if the frame rate numerator is zero
    pub fn from_frame_rate(fps_n: u32, fps_d: u32, sample_rate: u32) -> Result<Self> {
        if fps_n == 0 {
            return Err(CoreError::InvalidInterval(format!(
                "frame rate {}/{} has no frame interval",
                fps_n, fps_d
            )));
        }
        let frames = u64::from(sample_rate) * u64::from(fps_d) / u64::from(fps_n);
        if frames == 0 {
            warn!(
                "Frame rate {}/{} is faster than the {} Hz sample rate; clamping to 1 frame",
                fps_n, fps_d, sample_rate
            );
        }
        Ok(Self::from_frames(frames))
    }

    pub fn period_frames(&self) -> u64 {
        self.period_frames
    }

    pub fn elapsed_frames(&self) -> u64 {
        self.elapsed_frames
    }

    /// Frames left before this cadence fires (0 when already due)
    pub fn frames_until_due(&self) -> u64 {
        self.period_frames.saturating_sub(self.elapsed_frames)
    }

    pub fn advance(&mut self, frames: u64) {
        self.elapsed_frames += frames;
    }

    pub fn is_due(&self) -> bool {
        self.elapsed_frames >= self.period_frames
    }

    /// Start counting toward the next event
    pub fn restart(&mut self) {
        self.elapsed_frames = 0;
    }

    /// Consume one period, keeping frames accumulated beyond it
    ///
    /// After the period shrank below the elapsed count the cadence stays due
    /// until every whole period has been consumed.
    pub fn complete_period(&mut self) {
        self.elapsed_frames = self.elapsed_frames.saturating_sub(self.period_frames);
    }

    /// Change the period, keeping frames already accumulated
    pub fn set_period_frames(&mut self, period_frames: u64) {
        let elapsed = self.elapsed_frames;
        *self = Self::from_frames(period_frames);
        self.elapsed_frames = elapsed;
    }
}

/// Two cadences clocked by the same frame counter
///
/// The measurement cadence drives the history ring, the video cadence drives
/// frame output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DualCadence {
    pub measurement: Interval,
    pub video: Interval,
}

impl DualCadence {
    pub fn new(measurement: Interval, video: Interval) -> Self {
        Self { measurement, video }
    }

    /// Largest chunk that does not step over either boundary
    pub fn next_chunk(&self, remaining_frames: u64) -> u64 {
        self.measurement
            .frames_until_due()
            .min(self.video.frames_until_due())
            .min(remaining_frames)
    }

    pub fn advance(&mut self, frames: u64) {
        self.measurement.advance(frames);
        self.video.advance(frames);
    }
}
