//! The `loudness` record
//!
//! A sparse record: the three time fields are always present, each
//! measurement field only when its setting is enabled. Field names are kept
//! bit-exact (`stream-time`, `sample-peak`, ...) for consumers that match on
//! them.

use crate::settings::AnalyzerSettings;
use loudwatch_core::{ClockTime, LoudnessMeter, Result, Segment};
use serde::Serialize;

/// One loudness report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LoudnessMessage {
    pub timestamp: ClockTime,
    #[serde(rename = "stream-time")]
    pub stream_time: ClockTime,
    #[serde(rename = "running-time")]
    pub running_time: ClockTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub momentary: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortterm: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub window: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<f64>,
    #[serde(rename = "sample-peak", skip_serializing_if = "Option::is_none")]
    pub sample_peak: Option<Vec<f64>>,
    #[serde(rename = "true-peak", skip_serializing_if = "Option::is_none")]
    pub true_peak: Option<Vec<f64>>,
}

impl LoudnessMessage {
    /// Structure name consumers filter on
    pub const NAME: &'static str = "loudness";

    /// Query every enabled measurement from `meter`
    ///
    /// Any failing query aborts the whole record so that no partially filled
    /// record is ever produced.
    pub(crate) fn collect(
        settings: &AnalyzerSettings,
        segment: &Segment,
        meter: &dyn LoudnessMeter,
        timestamp: ClockTime,
    ) -> Result<Self> {
        Ok(Self {
            timestamp,
            stream_time: segment
                .to_stream_time(timestamp)
                .unwrap_or(ClockTime::NONE),
            running_time: segment
                .to_running_time(timestamp)
                .unwrap_or(ClockTime::NONE),
            momentary: settings
                .momentary
                .then(|| meter.loudness_momentary())
                .transpose()?,
            shortterm: settings
                .shortterm
                .then(|| meter.loudness_shortterm())
                .transpose()?,
            global: settings
                .global
                .then(|| meter.loudness_global())
                .transpose()?,
            window: (settings.window > 0)
                .then(|| meter.loudness_window(settings.window))
                .transpose()?,
            range: settings
                .range
                .then(|| meter.loudness_range())
                .transpose()?,
            sample_peak: settings
                .sample_peak
                .then(|| per_channel(meter, |channel| meter.sample_peak(channel)))
                .transpose()?,
            true_peak: settings
                .true_peak
                .then(|| per_channel(meter, |channel| meter.true_peak(channel)))
                .transpose()?,
        })
    }

    /// Names of the fields present, in record order
    pub fn field_names(&self) -> Vec<&'static str> {
        let optional = [
            ("momentary", self.momentary.is_some()),
            ("shortterm", self.shortterm.is_some()),
            ("global", self.global.is_some()),
            ("window", self.window.is_some()),
            ("range", self.range.is_some()),
            ("sample-peak", self.sample_peak.is_some()),
            ("true-peak", self.true_peak.is_some()),
        ];
        ["timestamp", "stream-time", "running-time"]
            .into_iter()
            .chain(
                optional
                    .into_iter()
                    .filter(|(_, present)| *present)
                    .map(|(name, _)| name),
            )
            .collect()
    }

    pub fn n_fields(&self) -> usize {
        self.field_names().len()
    }

    pub fn has_field(&self, name: &str) -> bool {
        self.field_names().contains(&name)
    }
}

fn per_channel(
    meter: &dyn LoudnessMeter,
    query: impl Fn(u32) -> Result<f64>,
) -> Result<Vec<f64>> {
    (0..meter.channels()).map(query).collect()
}
