//! Analyzer configuration
//!
//! Field names serialize with the same kebab-case names the element exposes
//! as properties (`sample-peak`, `post-messages`, ...).

use crate::error::{AnalyzerError, Result};
use loudwatch_core::{AudioInfo, ClockTime, MeterSpec, Mode};
use serde::{Deserialize, Serialize};

/// Default time between two records
pub const DEFAULT_INTERVAL: ClockTime = ClockTime::from_mseconds(100);

/// Which measurements to report, and how often
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct AnalyzerSettings {
    /// Momentary loudness (last 400 ms) in LUFS
    pub momentary: bool,
    /// Short-term loudness (last 3 s) in LUFS
    pub shortterm: bool,
    /// Integrated loudness in LUFS
    pub global: bool,
    /// Loudness of the last `window` ms in LUFS; 0 disables
    pub window: u32,
    /// Loudness range in LU
    pub range: bool,
    /// Per-channel sample peak (1.0 is 0 dBFS)
    pub sample_peak: bool,
    /// Per-channel true peak (1.0 is 0 dBTP)
    pub true_peak: bool,
    /// History kept for integrated loudness and LRA, in ms
    pub max_history: u32,
    /// Queue records at all
    pub post_messages: bool,
    /// Stream time between two records, in ns
    pub interval: ClockTime,
}

impl Default for AnalyzerSettings {
    fn default() -> Self {
        Self {
            momentary: true,
            shortterm: false,
            global: false,
            window: 0,
            range: false,
            sample_peak: false,
            true_peak: false,
            max_history: u32::MAX,
            post_messages: true,
            interval: DEFAULT_INTERVAL,
        }
    }
}

impl AnalyzerSettings {
    /// Every measurement enabled (the window stays disabled)
    pub fn all_measurements() -> Self {
        Self {
            momentary: true,
            shortterm: true,
            global: true,
            range: true,
            sample_peak: true,
            true_peak: true,
            ..Self::default()
        }
    }

    /// Only the timestamp fields will be reported
    pub fn no_measurements() -> Self {
        Self {
            momentary: false,
            ..Self::default()
        }
    }

    /// Meter mode needed to answer the enabled queries
    ///
    /// Momentary is always included since every other measurement builds on it.
    pub fn meter_mode(&self) -> Mode {
        let mut mode = Mode::M;
        if self.shortterm {
            mode |= Mode::S;
        }
        if self.global {
            mode |= Mode::I;
        }
        if self.range {
            mode |= Mode::LRA;
        }
        if self.sample_peak {
            mode |= Mode::SAMPLE_PEAK;
        }
        if self.true_peak {
            mode |= Mode::TRUE_PEAK;
        }
        mode
    }

    pub fn meter_spec(&self, info: &AudioInfo) -> MeterSpec {
        MeterSpec {
            max_window_ms: self.window,
            max_history_ms: self.max_history,
            ..MeterSpec::new(info.channels(), info.sample_rate(), self.meter_mode())
        }
    }

    /// Number of measurement fields a record will carry
    pub fn enabled_measurements(&self) -> usize {
        [
            self.momentary,
            self.shortterm,
            self.global,
            self.window > 0,
            self.range,
            self.sample_peak,
            self.true_peak,
        ]
        .into_iter()
        .filter(|enabled| *enabled)
        .count()
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.interval == ClockTime::ZERO || self.interval.is_none() {
            return Err(AnalyzerError::InvalidSettings(format!(
                "interval must be a positive duration, got {}",
                self.interval.nseconds()
            )));
        }
        Ok(())
    }
}

/// Whether moving from `old` to `new` requires a fresh meter
///
/// The meter is created with its mode, max window and max history, so a
/// change to any of them cannot be applied to a running instance.
pub fn reconfigure(old: &AnalyzerSettings, new: &AnalyzerSettings) -> bool {
    old.meter_mode() != new.meter_mode()
        || old.window != new.window
        || old.max_history != new.max_history
}
