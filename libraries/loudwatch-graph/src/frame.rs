//! Video output description and frames

use crate::error::{GraphError, Result};
use loudwatch_core::ClockTime;
use std::fmt;
use std::str::FromStr;
use tiny_skia::{IntSize, Pixmap};

/// Packed 32-bit output layouts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum VideoFormat {
    /// Blue, green, red, padding byte (always 0xFF)
    #[default]
    Bgrx,
    /// Blue, green, red, premultiplied alpha
    Bgra,
}

impl VideoFormat {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bgrx => "BGRx",
            Self::Bgra => "BGRA",
        }
    }
}

impl fmt::Display for VideoFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for VideoFormat {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "BGRx" => Ok(Self::Bgrx),
            "BGRA" => Ok(Self::Bgra),
            other => Err(GraphError::InvalidSettings(format!(
                "unsupported video format {:?}, expected BGRx or BGRA",
                other
            ))),
        }
    }
}

/// Negotiated video output
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VideoInfo {
    pub width: u32,
    pub height: u32,
    pub fps_n: u32,
    pub fps_d: u32,
    pub format: VideoFormat,
}

impl Default for VideoInfo {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps_n: 30,
            fps_d: 1,
            format: VideoFormat::Bgrx,
        }
    }
}

impl VideoInfo {
    pub fn new(width: u32, height: u32, fps_n: u32, fps_d: u32) -> Self {
        Self {
            width,
            height,
            fps_n,
            fps_d,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_format(mut self, format: VideoFormat) -> Self {
        self.format = format;
        self
    }

    /// Bytes per row
    pub fn stride(&self) -> usize {
        self.width as usize * 4
    }

    /// Bytes per frame
    pub fn frame_size(&self) -> usize {
        self.stride() * self.height as usize
    }
}

impl fmt::Display for VideoInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}x{} {} @ {}/{} fps",
            self.width, self.height, self.format, self.fps_n, self.fps_d
        )
    }
}

/// One rendered output frame
#[derive(Debug, Clone, PartialEq)]
pub struct VideoFrame {
    pub info: VideoInfo,
    /// Pixels in `info.format`, `info.stride()` bytes per row
    pub data: Vec<u8>,
    /// Stream time of the first audio frame this video frame covers
    pub timestamp: ClockTime,
    pub duration: ClockTime,
    /// Index of this frame in the output stream
    pub offset: u64,
    pub offset_end: u64,
}

impl VideoFrame {
    /// Convert a rendered RGBA surface to the output byte order
    pub(crate) fn pack(surface: &Pixmap, format: VideoFormat, out: &mut Vec<u8>) {
        out.clear();
        out.reserve(surface.data().len());
        for pixel in surface.data().chunks_exact(4) {
            let alpha = match format {
                VideoFormat::Bgrx => 0xFF,
                VideoFormat::Bgra => pixel[3],
            };
            out.extend_from_slice(&[pixel[2], pixel[1], pixel[0], alpha]);
        }
    }

    /// Encode the frame as PNG
    pub fn to_png(&self) -> Result<Vec<u8>> {
        let size = IntSize::from_wh(self.info.width, self.info.height).ok_or(GraphError::Surface {
            width: self.info.width,
            height: self.info.height,
        })?;

        let rgba: Vec<u8> = self
            .data
            .chunks_exact(4)
            .flat_map(|pixel| match self.info.format {
                VideoFormat::Bgrx => [pixel[2], pixel[1], pixel[0], 0xFF],
                VideoFormat::Bgra => [pixel[2], pixel[1], pixel[0], pixel[3]],
            })
            .collect();

        let pixmap = Pixmap::from_vec(rgba, size).ok_or(GraphError::Surface {
            width: self.info.width,
            height: self.info.height,
        })?;
        pixmap
            .encode_png()
            .map_err(|e| GraphError::Png(e.to_string()))
    }
}
