//! Scriptable meter for exercising the schedulers without real DSP
//!
//! [`RecordingMeter`] logs every ingestion call (format and frame count),
//! answers queries with fixed readings and can be told to fail a named call
//! a number of times. Meters created by one [`RecordingMeterFactory`] share
//! its log, so a test can hand the factory to an element and still inspect
//! what reached the meter.

use crate::error::{CoreError, Result};
use crate::meter::{LoudnessMeter, MeterFactory, MeterSpec};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Sample type of one ingestion call
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SampleKind {
    I16,
    I32,
    F32,
    F64,
}

/// Fixed values answered by every query
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Readings {
    pub momentary: f64,
    pub shortterm: f64,
    pub global: f64,
    pub window: f64,
    pub range: f64,
    pub sample_peak: f64,
    pub true_peak: f64,
}

impl Default for Readings {
    fn default() -> Self {
        Self {
            momentary: -20.0,
            shortterm: -21.0,
            global: -22.0,
            window: -23.0,
            range: 4.5,
            sample_peak: 0.5,
            true_peak: 0.55,
        }
    }
}

/// Everything the recording meters observed
#[derive(Debug, Default)]
pub struct MeterLog {
    /// One entry per ingestion call: sample type and frame count
    pub feeds: Vec<(SampleKind, usize)>,
    /// Samples of the most recent 16-bit ingestion
    pub last_i16: Vec<i16>,
    /// Specs of every meter created through the factory
    pub created: Vec<MeterSpec>,
    /// Names of every call, in order
    pub calls: Vec<&'static str>,
    pub readings: Readings,
    failures: HashMap<&'static str, usize>,
}

impl MeterLog {
    pub fn total_frames(&self) -> u64 {
        self.feeds.iter().map(|(_, frames)| *frames as u64).sum()
    }

    /// Make the next `times` invocations of `call` fail
    pub fn fail_next(&mut self, call: &'static str, times: usize) {
        self.failures.insert(call, times);
    }

    fn check(&mut self, call: &'static str) -> Result<()> {
        self.calls.push(call);
        match self.failures.get_mut(call) {
            Some(remaining) if *remaining > 0 => {
                *remaining -= 1;
                Err(CoreError::Meter {
                    call,
                    details: "injected failure".to_string(),
                })
            }
            _ => Ok(()),
        }
    }
}

/// Logs ingestion and answers fixed readings
#[derive(Debug, Clone)]
pub struct RecordingMeter {
    channels: u32,
    log: Arc<Mutex<MeterLog>>,
}

impl RecordingMeter {
    pub fn new(channels: u32) -> Self {
        Self::with_log(channels, Arc::default())
    }

    pub fn with_log(channels: u32, log: Arc<Mutex<MeterLog>>) -> Self {
        Self { channels, log }
    }

    fn log(&self) -> MutexGuard<'_, MeterLog> {
        self.log.lock().unwrap()
    }

    pub fn feeds(&self) -> Vec<(SampleKind, usize)> {
        self.log().feeds.clone()
    }

    pub fn last_i16(&self) -> Vec<i16> {
        self.log().last_i16.clone()
    }

    pub fn total_frames(&self) -> u64 {
        self.log().total_frames()
    }

    pub fn fail_next(&self, call: &'static str, times: usize) {
        self.log().fail_next(call, times);
    }

    fn ingest(&self, call: &'static str, kind: SampleKind, samples: usize) -> Result<()> {
        let mut log = self.log();
        log.check(call)?;
        log.feeds.push((kind, samples / self.channels as usize));
        Ok(())
    }

    fn query(&self, call: &'static str, pick: fn(&Readings) -> f64) -> Result<f64> {
        let mut log = self.log();
        log.check(call)?;
        Ok(pick(&log.readings))
    }
}

impl LoudnessMeter for RecordingMeter {
    fn channels(&self) -> u32 {
        self.channels
    }

    fn add_frames_i16(&mut self, frames: &[i16]) -> Result<()> {
        self.ingest("add_frames_i16", SampleKind::I16, frames.len())?;
        self.log().last_i16 = frames.to_vec();
        Ok(())
    }

    fn add_frames_i32(&mut self, frames: &[i32]) -> Result<()> {
        self.ingest("add_frames_i32", SampleKind::I32, frames.len())
    }

    fn add_frames_f32(&mut self, frames: &[f32]) -> Result<()> {
        self.ingest("add_frames_f32", SampleKind::F32, frames.len())
    }

    fn add_frames_f64(&mut self, frames: &[f64]) -> Result<()> {
        self.ingest("add_frames_f64", SampleKind::F64, frames.len())
    }

    fn loudness_momentary(&self) -> Result<f64> {
        self.query("loudness_momentary", |r| r.momentary)
    }

    fn loudness_shortterm(&self) -> Result<f64> {
        self.query("loudness_shortterm", |r| r.shortterm)
    }

    fn loudness_global(&self) -> Result<f64> {
        self.query("loudness_global", |r| r.global)
    }

    fn loudness_window(&self, _window_ms: u32) -> Result<f64> {
        self.query("loudness_window", |r| r.window)
    }

    fn loudness_range(&self) -> Result<f64> {
        self.query("loudness_range", |r| r.range)
    }

    fn sample_peak(&self, _channel: u32) -> Result<f64> {
        self.query("sample_peak", |r| r.sample_peak)
    }

    fn true_peak(&self, _channel: u32) -> Result<f64> {
        self.query("true_peak", |r| r.true_peak)
    }
}

/// Hands out [`RecordingMeter`]s that share one log
#[derive(Debug, Clone, Default)]
pub struct RecordingMeterFactory {
    log: Arc<Mutex<MeterLog>>,
}

impl RecordingMeterFactory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn log(&self) -> MutexGuard<'_, MeterLog> {
        self.log.lock().unwrap()
    }

    pub fn total_frames(&self) -> u64 {
        self.log().total_frames()
    }

    pub fn fail_next(&self, call: &'static str, times: usize) {
        self.log().fail_next(call, times);
    }

    pub fn set_readings(&self, readings: Readings) {
        self.log().readings = readings;
    }

    /// Number of meters created so far
    pub fn created(&self) -> usize {
        self.log().created.len()
    }
}

impl MeterFactory for RecordingMeterFactory {
    fn create(&self, spec: &MeterSpec) -> Result<Box<dyn LoudnessMeter>> {
        self.log().check("create")?;
        self.log().created.push(*spec);
        Ok(Box::new(RecordingMeter::with_log(
            spec.channels,
            Arc::clone(&self.log),
        )))
    }
}
