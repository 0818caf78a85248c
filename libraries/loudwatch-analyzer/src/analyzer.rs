//! The loudness message element
//!
//! Single-cadence scheduling: every incoming buffer is fed to the meter in
//! chunks that end exactly on interval boundaries. At each boundary a record
//! is built from readings taken after the boundary frame, then feeding
//! continues with the rest of the buffer. Frames past the last boundary carry
//! over toward the next interval.

use crate::error::{AnalyzerError, Result};
use crate::message::LoudnessMessage;
use crate::settings::{reconfigure, AnalyzerSettings};
use loudwatch_core::{
    AudioBuffer, AudioInfo, ClockTime, CoreError, EbuR128Factory, FrameAdapter, Interval,
    LoudnessMeter, MeterFactory, Segment, StreamClock,
};
use std::collections::VecDeque;
use tracing::{debug, error, info};

/// Per-stream state, rebuilt by `configure`
struct StreamState {
    adapter: FrameAdapter,
    meter: Box<dyn LoudnessMeter>,
    clock: StreamClock,
    interval: Interval,
}

/// Audio pass-through element that reports EBU R128 loudness
///
/// Buffers are processed synchronously and never modified. Records land in an
/// outbox that the host drains with [`drain_messages`](Self::drain_messages).
pub struct LoudnessAnalyzer {
    settings: AnalyzerSettings,
    factory: Box<dyn MeterFactory>,
    segment: Segment,
    stream: Option<StreamState>,
    outbox: VecDeque<LoudnessMessage>,
}

impl LoudnessAnalyzer {
    /// Create an analyzer backed by the `ebur128` meter
    ///
    /// # Errors
    /// Returns error if the settings are invalid
    pub fn new(settings: AnalyzerSettings) -> Result<Self> {
        Self::with_meter_factory(settings, Box::new(EbuR128Factory))
    }

    /// Create an analyzer whose meters come from `factory`
    pub fn with_meter_factory(
        settings: AnalyzerSettings,
        factory: Box<dyn MeterFactory>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            factory,
            segment: Segment::default(),
            stream: None,
            outbox: VecDeque::new(),
        })
    }

    pub fn settings(&self) -> &AnalyzerSettings {
        &self.settings
    }

    /// Negotiated format, if configured
    pub fn audio_info(&self) -> Option<&AudioInfo> {
        self.stream.as_ref().map(|stream| stream.adapter.info())
    }

    /// Accept a new stream format
    ///
    /// Creates a fresh meter and resets the stream clock and interval
    /// accounting.
    pub fn configure(&mut self, info: AudioInfo) -> Result<()> {
        let meter = self.factory.create(&self.settings.meter_spec(&info))?;
        let interval = Interval::from_duration(self.settings.interval, info.sample_rate());

        info!(
            "Configured for {}: interval={} ({} frames)",
            info,
            self.settings.interval,
            interval.period_frames()
        );

        self.stream = Some(StreamState {
            adapter: FrameAdapter::new(info),
            meter,
            clock: StreamClock::new(info.sample_rate()),
            interval,
        });
        Ok(())
    }

    /// Apply new settings between buffers
    ///
    /// Recreates the meter when its mode, window or history changed and
    /// re-derives the interval; frame position and carry-over are kept.
    pub fn set_settings(&mut self, settings: AnalyzerSettings) -> Result<()> {
        settings.validate()?;

        if let Some(stream) = self.stream.as_mut() {
            let info = *stream.adapter.info();
            if reconfigure(&self.settings, &settings) {
                debug!(
                    "Meter mode changed from {:?} to {:?}, recreating meter",
                    self.settings.meter_mode(),
                    settings.meter_mode()
                );
                stream.meter = self.factory.create(&settings.meter_spec(&info))?;
            }
            if settings.interval != self.settings.interval {
                let period =
                    Interval::from_duration(settings.interval, info.sample_rate()).period_frames();
                debug!(
                    "Interval changed to {} ({} frames)",
                    settings.interval, period
                );
                stream.interval.set_period_frames(period);
            }
        }

        self.settings = settings;
        Ok(())
    }

    /// Timeline used to derive stream-time and running-time
    pub fn set_segment(&mut self, segment: Segment) {
        self.segment = segment;
    }

    /// Total frames fed to the meter since `configure`
    pub fn frames_processed(&self) -> u64 {
        self.stream
            .as_ref()
            .map_or(0, |stream| stream.clock.frames_processed())
    }

    /// Frames accumulated toward the next record
    pub fn pending_frames(&self) -> u64 {
        self.stream
            .as_ref()
            .map_or(0, |stream| stream.interval.elapsed_frames())
    }

    /// Measure one buffer
    ///
    /// Returns an error if the buffer cannot be fed (partial frame, meter
    /// rejection), in which case the rest of the buffer is dropped. A failed
    /// query only drops that one record; the buffer is still fully accounted
    /// and the first such error is returned afterwards.
    pub fn process_buffer(&mut self, buffer: &AudioBuffer) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(AnalyzerError::NotConfigured)?;
        let bpf = stream.adapter.info().bpf();
        let num_frames = stream.adapter.info().frames_in(buffer.len_bytes())?;

        stream.clock.observe_buffer(buffer.pts, buffer.discont);

        debug!(
            "Got buffer of {} bytes representing {} frames ({} already pending of {})",
            buffer.len_bytes(),
            num_frames,
            stream.interval.elapsed_frames(),
            stream.interval.period_frames()
        );

        let mut offset = 0usize;
        let mut remaining = num_frames as u64;
        let mut first_error: Option<CoreError> = None;

        loop {
            let chunk = stream.interval.frames_until_due().min(remaining);
            if chunk > 0 {
                let end = offset + chunk as usize * bpf;
                stream
                    .adapter
                    .feed(stream.meter.as_mut(), &buffer.data[offset..end])?;
                stream.clock.advance(chunk);
                stream.interval.advance(chunk);
                offset = end;
                remaining -= chunk;
            }

            while stream.interval.is_due() {
                stream.interval.complete_period();
                if let Err(err) = post_message(
                    &self.settings,
                    &self.segment,
                    stream,
                    &mut self.outbox,
                ) {
                    first_error.get_or_insert(err);
                }
            }

            if remaining == 0 {
                break;
            }
        }

        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(()),
        }
    }

    /// End of stream: report the final state once more
    pub fn handle_eos(&mut self) -> Result<()> {
        let stream = self.stream.as_mut().ok_or(AnalyzerError::NotConfigured)?;
        debug!("Received EOS, emitting last message");
        post_message(&self.settings, &self.segment, stream, &mut self.outbox)?;
        Ok(())
    }

    /// Drop the stream state (meter, clock, carry-over) and pending records
    pub fn stop(&mut self) {
        self.stream = None;
        self.outbox.clear();
    }

    pub fn pop_message(&mut self) -> Option<LoudnessMessage> {
        self.outbox.pop_front()
    }

    /// Take all queued records, oldest first
    pub fn drain_messages(&mut self) -> Vec<LoudnessMessage> {
        self.outbox.drain(..).collect()
    }
}

/// Build and queue one record at the stream's current position
fn post_message(
    settings: &AnalyzerSettings,
    segment: &Segment,
    stream: &StreamState,
    outbox: &mut VecDeque<LoudnessMessage>,
) -> std::result::Result<(), CoreError> {
    if !settings.post_messages {
        return Ok(());
    }

    let timestamp: ClockTime = stream.clock.timestamp();
    match LoudnessMessage::collect(settings, segment, stream.meter.as_ref(), timestamp) {
        Ok(message) => {
            info!("Emitting loudness message at {}", timestamp);
            outbox.push_back(message);
            Ok(())
        }
        Err(err) => {
            error!(
                "Error getting the requested measurements at {}: {}",
                timestamp, err
            );
            Err(err)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use loudwatch_core::test_utils::RecordingMeterFactory;
    use loudwatch_core::SampleFormat;

    fn analyzer(settings: AnalyzerSettings) -> (LoudnessAnalyzer, RecordingMeterFactory) {
        let factory = RecordingMeterFactory::new();
        let mut analyzer =
            LoudnessAnalyzer::with_meter_factory(settings, Box::new(factory.clone())).unwrap();
        analyzer
            .configure(AudioInfo::new(SampleFormat::S16, 48000, 2).unwrap())
            .unwrap();
        (analyzer, factory)
    }

    fn frames(count: usize) -> AudioBuffer {
        AudioBuffer::silence(count, 4)
    }

    #[test]
    fn test_not_configured() {
        let mut analyzer = LoudnessAnalyzer::new(AnalyzerSettings::default()).unwrap();
        assert_eq!(
            analyzer.process_buffer(&frames(10)),
            Err(AnalyzerError::NotConfigured)
        );
        assert_eq!(analyzer.handle_eos(), Err(AnalyzerError::NotConfigured));
    }

    #[test]
    fn test_partial_frame_rejected_before_feeding() {
        let (mut analyzer, factory) = analyzer(AnalyzerSettings::default());
        let buffer = AudioBuffer::new(vec![0; 4801 * 4 + 2]);
        assert!(matches!(
            analyzer.process_buffer(&buffer),
            Err(AnalyzerError::Core(CoreError::PartialFrame { .. }))
        ));
        assert_eq!(factory.total_frames(), 0);
        assert!(analyzer.drain_messages().is_empty());
    }

    #[test]
    fn test_carry_over_after_split() {
        let (mut analyzer, factory) = analyzer(AnalyzerSettings::default());

        analyzer.process_buffer(&frames(1920)).unwrap();
        analyzer.process_buffer(&frames(1920)).unwrap();
        assert!(analyzer.pop_message().is_none());
        assert_eq!(analyzer.pending_frames(), 3840);

        analyzer.process_buffer(&frames(1920)).unwrap();
        let message = analyzer.pop_message().unwrap();
        assert_eq!(message.timestamp, ClockTime::from_mseconds(100));
        assert_eq!(analyzer.pending_frames(), 960);
        assert_eq!(factory.total_frames(), 5760);
        assert_eq!(analyzer.frames_processed(), 5760);
    }

    #[test]
    fn test_post_messages_disabled() {
        let (mut analyzer, factory) = analyzer(AnalyzerSettings {
            post_messages: false,
            ..AnalyzerSettings::default()
        });
        analyzer.process_buffer(&frames(48000)).unwrap();
        analyzer.handle_eos().unwrap();
        assert!(analyzer.drain_messages().is_empty());
        assert_eq!(factory.total_frames(), 48000);
        assert!(!factory.log().calls.contains(&"loudness_momentary"));
    }

    #[test]
    fn test_mode_change_recreates_meter() {
        let (mut analyzer, factory) = analyzer(AnalyzerSettings::default());
        assert_eq!(factory.created(), 1);

        analyzer
            .set_settings(AnalyzerSettings {
                interval: ClockTime::from_mseconds(200),
                ..AnalyzerSettings::default()
            })
            .unwrap();
        assert_eq!(factory.created(), 1);

        analyzer
            .set_settings(AnalyzerSettings {
                shortterm: true,
                ..AnalyzerSettings::default()
            })
            .unwrap();
        assert_eq!(factory.created(), 2);
    }

    #[test]
    fn test_shorter_interval_catches_up() {
        let (mut analyzer, _factory) = analyzer(AnalyzerSettings::default());
        analyzer.process_buffer(&frames(3000)).unwrap();

        analyzer
            .set_settings(AnalyzerSettings {
                interval: ClockTime::from_mseconds(50),
                ..AnalyzerSettings::default()
            })
            .unwrap();

        // 3000 frames pending against a 2400-frame interval: fires first
        analyzer.process_buffer(&frames(0)).unwrap();
        let message = analyzer.pop_message().unwrap();
        assert_eq!(message.timestamp, ClockTime::from_nseconds(62_500_000));
        assert_eq!(analyzer.pending_frames(), 600);

        // The 600 excess frames count toward the next record at 100 ms
        analyzer.process_buffer(&frames(1800)).unwrap();
        let message = analyzer.pop_message().unwrap();
        assert_eq!(message.timestamp, ClockTime::from_mseconds(100));
        assert_eq!(analyzer.pending_frames(), 0);
        assert!(analyzer.pop_message().is_none());
    }

    #[test]
    fn test_interval_shrunk_below_pending_fires_per_period() {
        let (mut analyzer, _factory) = analyzer(AnalyzerSettings::default());
        analyzer.process_buffer(&frames(3000)).unwrap();

        analyzer
            .set_settings(AnalyzerSettings {
                interval: ClockTime::from_mseconds(25),
                ..AnalyzerSettings::default()
            })
            .unwrap();

        // 3000 pending frames hold two whole 1200-frame periods
        analyzer.process_buffer(&frames(0)).unwrap();
        assert_eq!(analyzer.drain_messages().len(), 2);
        assert_eq!(analyzer.pending_frames(), 600);

        analyzer.process_buffer(&frames(600)).unwrap();
        let message = analyzer.pop_message().unwrap();
        assert_eq!(message.timestamp, ClockTime::from_mseconds(75));
    }

    #[test]
    fn test_stop_forgets_stream() {
        let (mut analyzer, _factory) = analyzer(AnalyzerSettings::default());
        analyzer.process_buffer(&frames(4800)).unwrap();
        analyzer.stop();
        assert!(analyzer.audio_info().is_none());
        assert!(analyzer.pop_message().is_none());
        assert_eq!(analyzer.frames_processed(), 0);
    }
}
