//! Graph element configuration
//!
//! Serialized names match the element's property names (`color-background`,
//! `scale-from`, `gauge-peak`, ...).

use crate::color::ArgbColor;
use crate::error::{GraphError, Result};
use loudwatch_core::{ClockTime, Mode};
use serde::{Deserialize, Serialize};

/// How scale labels and header values are expressed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ScaleMode {
    /// LU relative to the target
    #[default]
    Relative,
    /// LUFS
    Absolute,
}

/// Which loudness value feeds the scrolling graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum GraphMeasurement {
    #[default]
    ShortTerm,
    Momentary,
}

/// Colors, sizes, scale and gauges of the rendered graph
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct GraphSettings {
    pub color_background: ArgbColor,
    pub color_border: ArgbColor,
    pub color_scale: ArgbColor,
    pub color_scale_lines: ArgbColor,
    pub color_header: ArgbColor,
    pub color_graph: ArgbColor,
    pub color_too_loud: ArgbColor,
    pub color_loudness_ok: ArgbColor,
    pub color_not_loud_enough: ArgbColor,
    pub color_gauge_short_term: ArgbColor,
    pub color_gauge_momentary: ArgbColor,
    pub color_gauge_peak: ArgbColor,

    /// Space between all regions, in px
    pub gutter: u32,
    /// Width of the scale labels column, in px
    pub scale_w: u32,
    /// Width of each gauge, in px
    pub gauge_w: u32,

    /// Top of the scale, relative to the target
    pub scale_from: i32,
    /// Bottom of the scale, relative to the target
    pub scale_to: i32,
    pub scale_mode: ScaleMode,
    /// Target loudness in LUFS
    pub scale_target: i32,

    pub font_size_header: f64,
    pub font_size_scale: f64,

    pub measurement: GraphMeasurement,
    /// Stream time covered by the full graph width, in ns
    pub timebase: ClockTime,

    pub gauge_short_term: bool,
    pub gauge_momentary: bool,
    pub gauge_peak: bool,
    /// Peak gauge: top of the ok band, in dBTP
    pub gauge_peak_too_loud_db: f64,
    /// Peak gauge: bottom of the ok band, in dBTP
    pub gauge_peak_not_loud_enough_db: f64,
}

impl Default for GraphSettings {
    fn default() -> Self {
        Self {
            color_background: ArgbColor::new(0xFF00_0000),
            color_border: ArgbColor::new(0xFF00_CC00),
            color_scale: ArgbColor::new(0xFF00_9999),
            color_scale_lines: ArgbColor::new(0x4CFF_FFFF),
            color_header: ArgbColor::new(0xFFFF_FF00),
            color_graph: ArgbColor::new(0x9900_0000),
            color_too_loud: ArgbColor::new(0xFFDB_6666),
            color_loudness_ok: ArgbColor::new(0xFF66_DB66),
            color_not_loud_enough: ArgbColor::new(0xFF66_66DB),
            color_gauge_short_term: ArgbColor::new(0x9900_FF00),
            color_gauge_momentary: ArgbColor::new(0x9900_0000),
            color_gauge_peak: ArgbColor::new(0x9900_FFFF),
            gutter: 5,
            scale_w: 20,
            gauge_w: 20,
            scale_from: 18,
            scale_to: -36,
            scale_mode: ScaleMode::Relative,
            scale_target: -23,
            font_size_header: 12.0,
            font_size_scale: 8.0,
            measurement: GraphMeasurement::ShortTerm,
            timebase: ClockTime::from_seconds(60),
            gauge_short_term: false,
            gauge_momentary: true,
            gauge_peak: false,
            gauge_peak_too_loud_db: -2.5,
            gauge_peak_not_loud_enough_db: -20.0,
        }
    }
}

impl GraphSettings {
    /// Meter mode needed by the header, graph and gauges
    pub fn meter_mode(&self) -> Mode {
        let mode = Mode::M | Mode::S | Mode::I | Mode::LRA;
        if self.gauge_peak {
            mode | Mode::TRUE_PEAK
        } else {
            mode
        }
    }

    /// Number of gauges left of the scale
    pub fn gauges_left(&self) -> u32 {
        u32::from(self.gauge_peak)
    }

    /// Number of gauges right of the graph
    pub fn gauges_right(&self) -> u32 {
        u32::from(self.gauge_short_term) + u32::from(self.gauge_momentary)
    }

    /// Validate settings
    pub fn validate(&self) -> Result<()> {
        if self.scale_from <= self.scale_to {
            return Err(GraphError::InvalidSettings(format!(
                "scale-from ({}) must be above scale-to ({})",
                self.scale_from, self.scale_to
            )));
        }

        if self.timebase == ClockTime::ZERO || self.timebase.is_none() {
            return Err(GraphError::InvalidSettings(
                "timebase must be a positive duration".to_string(),
            ));
        }

        for (name, size) in [
            ("font-size-header", self.font_size_header),
            ("font-size-scale", self.font_size_scale),
        ] {
            if !size.is_finite() || size <= 0.0 {
                return Err(GraphError::InvalidSettings(format!(
                    "{} must be positive, got {}",
                    name, size
                )));
            }
        }

        let too_loud = self.gauge_peak_too_loud_db;
        let not_loud_enough = self.gauge_peak_not_loud_enough_db;
        if !too_loud.is_finite() || !not_loud_enough.is_finite() || not_loud_enough >= too_loud {
            return Err(GraphError::InvalidSettings(format!(
                "peak gauge limits must satisfy not-loud-enough ({}) < too-loud ({})",
                not_loud_enough, too_loud
            )));
        }

        Ok(())
    }
}
