//! Loudwatch command-line harness
//!
//! Reads WAV files and drives the loudness elements over them:
//! `analyze` prints loudness records as JSON lines, `graph` writes rendered
//! graph frames as PNG files.
//!
//! This library exposes the commands for testing purposes.

pub mod analyze;
pub mod config;
pub mod graph;
pub mod input;

// Re-export commonly used types for convenience
pub use config::{CliConfig, InputSettings, VideoSettings};
pub use graph::FrameSink;
pub use input::WavInput;
