//! CLI configuration
//!
//! Layered with the `config` crate: an optional TOML file, then `LOUDWATCH_*`
//! environment variables, then command-line flags (applied by `main`).
//!
//! ```toml
//! [analyzer]
//! interval = 250000000   # ns
//! global = true
//!
//! [graph]
//! color-background = "#FF101010"
//! timebase = 30000000000
//!
//! [video]
//! width = 1280
//! height = 720
//!
//! [input]
//! buffer-frames = 2048
//! ```
//!
//! Environment variables use `_` as the section separator, so only
//! single-word keys can be set that way (`LOUDWATCH_ANALYZER_INTERVAL`,
//! `LOUDWATCH_GRAPH_GUTTER`, `LOUDWATCH_VIDEO_FPS`, ...).

use anyhow::{bail, Context, Result};
use loudwatch_analyzer::AnalyzerSettings;
use loudwatch_graph::{GraphSettings, VideoInfo};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// File picked up from the working directory when no `--config` is given
pub const DEFAULT_CONFIG_FILE: &str = "loudwatch.toml";

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct CliConfig {
    pub analyzer: AnalyzerSettings,
    pub graph: GraphSettings,
    pub video: VideoSettings,
    pub input: InputSettings,
}

/// Output video of the `graph` command
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct VideoSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for VideoSettings {
    fn default() -> Self {
        let info = VideoInfo::default();
        Self {
            width: info.width,
            height: info.height,
            fps: info.fps_n,
        }
    }
}

impl VideoSettings {
    pub fn video_info(&self) -> VideoInfo {
        VideoInfo::new(self.width, self.height, self.fps, 1)
    }
}

/// How the WAV input is cut into buffers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct InputSettings {
    pub buffer_frames: usize,
}

impl Default for InputSettings {
    fn default() -> Self {
        Self {
            buffer_frames: 1024,
        }
    }
}

impl CliConfig {
    /// Load configuration from file and environment
    ///
    /// `path` must exist when given; otherwise `loudwatch.toml` is read if
    /// present.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading variables from `env` instead of the process
    pub fn load_with_env(
        path: Option<&Path>,
        env: Option<config::Map<String, String>>,
    ) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) => {
                settings = settings.add_source(config::File::from(path).required(true));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with LOUDWATCH_)
        settings = settings.add_source(
            config::Environment::with_prefix("LOUDWATCH")
                .separator("_")
                .try_parsing(true)
                .source(env),
        );

        let config: Self = settings
            .build()
            .context("Failed to read configuration")?
            .try_deserialize()
            .context("Invalid configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        self.analyzer
            .validate()
            .context("Invalid analyzer settings")?;
        self.graph.validate().context("Invalid graph settings")?;

        if self.input.buffer_frames == 0 {
            bail!("input buffer-frames must be at least 1");
        }
        if self.video.fps == 0 {
            bail!("video fps must be at least 1");
        }
        Ok(())
    }
}
