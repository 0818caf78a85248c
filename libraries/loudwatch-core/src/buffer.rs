//! Audio buffers as delivered by the host

use crate::clock::ClockTime;

/// One chunk of interleaved PCM bytes
///
/// Frame count is derived from the stream's [`AudioInfo`](crate::AudioInfo);
/// the buffer itself carries only bytes and timing flags.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioBuffer {
    /// Interleaved native-endian sample bytes
    pub data: Vec<u8>,
    /// Presentation timestamp of the first frame, if the host knows it
    pub pts: Option<ClockTime>,
    /// Set when this buffer does not follow the previous one on the timeline
    pub discont: bool,
}

impl AudioBuffer {
    pub fn new(data: Vec<u8>) -> Self {
        Self {
            data,
            pts: None,
            discont: false,
        }
    }

    /// A buffer of `num_frames` frames of digital silence
    pub fn silence(num_frames: usize, bytes_per_frame: usize) -> Self {
        Self::new(vec![0; num_frames * bytes_per_frame])
    }

    #[must_use]
    pub fn with_pts(mut self, pts: ClockTime) -> Self {
        self.pts = Some(pts);
        self
    }

    #[must_use]
    pub fn with_discont(mut self) -> Self {
        self.discont = true;
        self
    }

    pub fn len_bytes(&self) -> usize {
        self.data.len()
    }
}
