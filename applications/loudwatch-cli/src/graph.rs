//! `graph`: loudness graph frames as PNG files

use crate::input::WavInput;
use anyhow::{bail, Context, Result};
use loudwatch_graph::{GraphElement, GraphSettings, VideoFrame, VideoInfo};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Where and how often frames are written
#[derive(Debug, Clone)]
pub struct FrameSink {
    pub dir: PathBuf,
    /// Write every n-th frame, starting with the first
    pub every: u64,
}

impl FrameSink {
    pub fn new(dir: impl Into<PathBuf>, every: u64) -> Self {
        Self {
            dir: dir.into(),
            every: every.max(1),
        }
    }

    /// File name of frame `offset`
    pub fn frame_path(&self, offset: u64) -> PathBuf {
        self.dir.join(format!("frame-{:06}.png", offset))
    }

    fn write(&self, frame: &VideoFrame) -> Result<bool> {
        if frame.offset % self.every != 0 {
            return Ok(false);
        }
        let path = self.frame_path(frame.offset);
        fs::write(&path, frame.to_png()?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        Ok(true)
    }
}

/// Render `input` as a graph video, writing frames to `sink`
///
/// Returns the number of files written.
pub fn run(
    input: &mut WavInput,
    settings: GraphSettings,
    video: VideoInfo,
    sink: &FrameSink,
) -> Result<usize> {
    fs::create_dir_all(&sink.dir)
        .with_context(|| format!("Failed to create {}", sink.dir.display()))?;

    let mut element = GraphElement::new(settings).context("Invalid graph settings")?;
    element
        .configure(input.info(), video)
        .context("Failed to set up the graph")?;

    let mut written = 0;
    while let Some(buffer) = input.next_buffer()? {
        element.submit_buffer(buffer)?;
        loop {
            match element.generate_output() {
                Ok(Some(frame)) => written += usize::from(sink.write(&frame)?),
                Ok(None) => break,
                // The element resumes after a failed measurement and drops
                // the buffer after a failed feed
                Err(e) => warn!("Graph element reported: {}", e),
            }
        }
    }

    info!(
        "Rendered {} frames from {} audio frames, wrote {} to {}",
        element.frames_emitted(),
        element.frames_processed(),
        written,
        sink.dir.display()
    );
    Ok(written)
}

/// Refuse to mix frames of two runs in one directory
pub fn check_output_dir(dir: &Path) -> Result<()> {
    if dir.is_file() {
        bail!("{} is a file, expected a directory", dir.display());
    }
    if dir.join("frame-000000.png").exists() {
        bail!("{} already holds rendered frames", dir.display());
    }
    Ok(())
}
