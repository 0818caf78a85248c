//! The loudness graph element
//!
//! Audio goes in with [`GraphElement::submit_buffer`], video comes out of
//! [`GraphElement::generate_output`]. Two cadences share one frame counter:
//! the measurement cadence (one history column per `timebase / graph width`)
//! and the video cadence (one frame per `1 / fps`). Each output call consumes
//! the pending input until a video frame is due, so one audio buffer may
//! need several calls.

use crate::error::{GraphError, Result};
use crate::frame::{VideoFrame, VideoInfo};
use crate::layout::Layout;
use crate::render::{GraphReadings, GraphRenderer, SkiaRenderer};
use crate::settings::{GraphMeasurement, GraphSettings};
use loudwatch_core::{
    linear_to_db, AudioBuffer, AudioInfo, ClockTime, DualCadence, EbuR128Factory, FrameAdapter,
    HistoryRing, Interval, LoudnessMeter, MeterFactory, MeterSpec, StreamClock,
};
use tiny_skia::Pixmap;
use tracing::{debug, error, info, trace};

/// Partially consumed input buffer
struct InputCursor {
    buffer: AudioBuffer,
    total_frames: u64,
    remaining_frames: u64,
    offset: usize,
}

/// Everything derived from the negotiated formats and settings
struct GraphStream {
    audio: AudioInfo,
    video: VideoInfo,
    adapter: FrameAdapter,
    meter: Box<dyn LoudnessMeter>,
    layout: Layout,
    background: Pixmap,
    canvas: Pixmap,
    cadence: DualCadence,
    history: HistoryRing,
    readings: GraphReadings,
    clock: StreamClock,
    last_video_timestamp: ClockTime,
    video_frames: u64,
}

/// Audio to video element rendering a scrolling loudness graph
pub struct GraphElement {
    settings: GraphSettings,
    factory: Box<dyn MeterFactory>,
    renderer: Box<dyn GraphRenderer>,
    stream: Option<GraphStream>,
    cursor: Option<InputCursor>,
}

impl GraphElement {
    /// Create an element with the `ebur128` meter and the raster renderer
    ///
    /// # Errors
    /// Returns error if the settings are invalid
    pub fn new(settings: GraphSettings) -> Result<Self> {
        Self::with_parts(settings, Box::new(EbuR128Factory), Box::new(SkiaRenderer))
    }

    /// Create an element with a custom meter factory and renderer
    pub fn with_parts(
        settings: GraphSettings,
        factory: Box<dyn MeterFactory>,
        renderer: Box<dyn GraphRenderer>,
    ) -> Result<Self> {
        settings.validate()?;
        Ok(Self {
            settings,
            factory,
            renderer,
            stream: None,
            cursor: None,
        })
    }

    pub fn settings(&self) -> &GraphSettings {
        &self.settings
    }

    /// Negotiate audio input and video output
    ///
    /// Recreates the meter, surfaces, layout, cadences and history, and
    /// restarts frame and timestamp counting.
    ///
    /// # Errors
    /// Returns [`GraphError::CursorActive`] while input is still pending, or a
    /// configuration error; the previous configuration is dropped in that case.
    pub fn configure(&mut self, audio: AudioInfo, video: VideoInfo) -> Result<()> {
        if self.cursor.is_some() {
            return Err(GraphError::CursorActive);
        }
        self.stream = None;
        self.stream = Some(self.setup(audio, video)?);
        Ok(())
    }

    /// Apply new settings, re-running setup when configured
    ///
    /// On error the previous settings stay in place.
    pub fn set_settings(&mut self, settings: GraphSettings) -> Result<()> {
        if self.cursor.is_some() {
            return Err(GraphError::CursorActive);
        }
        settings.validate()?;

        let previous = std::mem::replace(&mut self.settings, settings);
        if let Some((audio, video)) = self.stream.as_ref().map(|s| (s.audio, s.video)) {
            match self.setup(audio, video) {
                Ok(stream) => self.stream = Some(stream),
                Err(e) => {
                    self.settings = previous;
                    return Err(e);
                }
            }
        }
        Ok(())
    }

    fn setup(&self, audio: AudioInfo, video: VideoInfo) -> Result<GraphStream> {
        let settings = &self.settings;
        let layout = Layout::compute(settings, video.width, video.height)?;

        let spec = MeterSpec::new(audio.channels(), audio.sample_rate(), settings.meter_mode());
        let meter = self.factory.create(&spec)?;

        let surface_error = || GraphError::Surface {
            width: video.width,
            height: video.height,
        };
        let mut background = Pixmap::new(video.width, video.height).ok_or_else(surface_error)?;
        let canvas = Pixmap::new(video.width, video.height).ok_or_else(surface_error)?;
        self.renderer
            .paint_background(&mut background, &layout, settings);

        let graph_w = u64::try_from(layout.graph.w).unwrap_or(1);
        let measurement_period = settings.timebase.divide(graph_w).unwrap_or(settings.timebase);
        let measurement = Interval::from_duration(measurement_period, audio.sample_rate());
        let video_interval = Interval::from_frame_rate(video.fps_n, video.fps_d, audio.sample_rate())?;

        info!(
            "timebase={} for a graph of w={} at sample_rate={} results in measurement_interval={} ({} frames)",
            settings.timebase,
            layout.graph.w,
            audio.sample_rate(),
            measurement_period,
            measurement.period_frames()
        );
        info!(
            "framerate={}/{} at sample_rate={} results in video_interval={} frames",
            video.fps_n,
            video.fps_d,
            audio.sample_rate(),
            video_interval.period_frames()
        );

        let history = HistoryRing::new(layout.history_capacity())?;
        debug!("Configured for {} -> {}", audio, video);

        Ok(GraphStream {
            audio,
            video,
            adapter: FrameAdapter::new(audio),
            meter,
            background,
            canvas,
            cadence: DualCadence::new(measurement, video_interval),
            history,
            readings: GraphReadings::default(),
            clock: StreamClock::new(audio.sample_rate()),
            last_video_timestamp: ClockTime::ZERO,
            video_frames: 0,
            layout,
        })
    }

    /// Queue an audio buffer for consumption by [`generate_output`](Self::generate_output)
    ///
    /// # Errors
    /// Returns error if not configured, if the previous buffer is not fully
    /// consumed, or if the buffer does not hold whole frames.
    pub fn submit_buffer(&mut self, buffer: AudioBuffer) -> Result<()> {
        let stream = self.stream.as_ref().ok_or(GraphError::NotConfigured)?;
        if self.cursor.is_some() {
            return Err(GraphError::CursorActive);
        }

        let total_frames = stream.audio.frames_in(buffer.len_bytes())? as u64;
        debug!(
            "Got buffer of {} bytes representing {} frames",
            buffer.len_bytes(),
            total_frames
        );
        if total_frames > 0 {
            self.cursor = Some(InputCursor {
                buffer,
                total_frames,
                remaining_frames: total_frames,
                offset: 0,
            });
        }
        Ok(())
    }

    /// Consume pending input until one video frame is due
    ///
    /// Returns `Ok(None)` once the input is exhausted without reaching the
    /// next frame. A meter feed failure drops the rest of the buffer; a failed
    /// measurement stores −∞ for that column and can be resumed by calling
    /// again.
    pub fn generate_output(&mut self) -> Result<Option<VideoFrame>> {
        let stream = self.stream.as_mut().ok_or(GraphError::NotConfigured)?;

        // A frame that became due together with a failed measurement
        if stream.cadence.video.is_due() {
            return Ok(Some(stream.emit_frame(&self.settings, self.renderer.as_ref())));
        }

        let Some(cursor) = self.cursor.as_mut() else {
            return Ok(None);
        };

        while cursor.remaining_frames > 0 {
            let chunk = stream.cadence.next_chunk(cursor.remaining_frames);
            let end = cursor.offset + chunk as usize * stream.audio.bpf();

            trace!(
                "Feeding {} of {} remaining frames (buffer of {})",
                chunk,
                cursor.remaining_frames,
                cursor.total_frames
            );
            if let Err(e) = stream
                .adapter
                .feed(stream.meter.as_mut(), &cursor.buffer.data[cursor.offset..end])
            {
                error!("Dropping the rest of the input buffer: {}", e);
                self.cursor = None;
                return Err(e.into());
            }

            cursor.offset = end;
            cursor.remaining_frames -= chunk;
            stream.clock.advance(chunk);
            stream.cadence.advance(chunk);
            let drained = cursor.remaining_frames == 0;

            if stream.cadence.measurement.is_due() {
                stream.cadence.measurement.restart();
                if let Err(e) = stream.take_measurement(&self.settings) {
                    if drained {
                        self.cursor = None;
                    }
                    return Err(e);
                }
            }

            if stream.cadence.video.is_due() {
                if drained {
                    self.cursor = None;
                }
                return Ok(Some(stream.emit_frame(&self.settings, self.renderer.as_ref())));
            }
        }

        debug!("Input buffer consumed completely");
        self.cursor = None;
        Ok(None)
    }

    /// Forget all stream state and pending input
    pub fn stop(&mut self) {
        self.cursor = None;
        self.stream = None;
    }

    pub fn audio_info(&self) -> Option<&AudioInfo> {
        self.stream.as_ref().map(|stream| &stream.audio)
    }

    pub fn video_info(&self) -> Option<&VideoInfo> {
        self.stream.as_ref().map(|stream| &stream.video)
    }

    pub fn layout(&self) -> Option<&Layout> {
        self.stream.as_ref().map(|stream| &stream.layout)
    }

    pub fn history(&self) -> Option<&HistoryRing> {
        self.stream.as_ref().map(|stream| &stream.history)
    }

    pub fn readings(&self) -> Option<&GraphReadings> {
        self.stream.as_ref().map(|stream| &stream.readings)
    }

    /// Audio frames fed to the meter since `configure`
    pub fn frames_processed(&self) -> u64 {
        self.stream
            .as_ref()
            .map_or(0, |stream| stream.clock.frames_processed())
    }

    /// Video frames emitted since `configure`
    pub fn frames_emitted(&self) -> u64 {
        self.stream.as_ref().map_or(0, |stream| stream.video_frames)
    }

    /// Whether a submitted buffer is still being consumed
    pub fn has_pending_input(&self) -> bool {
        self.cursor.is_some()
    }
}

impl GraphStream {
    /// Query the meter and append one history column
    ///
    /// On failure the column is −∞ and the previous readings are kept.
    fn take_measurement(&mut self, settings: &GraphSettings) -> Result<()> {
        match self.read_meter(settings) {
            Ok(readings) => {
                let value = match settings.measurement {
                    GraphMeasurement::ShortTerm => readings.short_term,
                    GraphMeasurement::Momentary => readings.momentary,
                };
                trace!(
                    "Writing measurement {} into ring of size {} at head {}",
                    value,
                    self.history.capacity(),
                    self.history.head()
                );
                self.history.write(value);
                self.readings = readings;
                Ok(())
            }
            Err(e) => {
                error!("Error taking measurement at {}: {}", self.clock.elapsed(), e);
                self.history.write(f64::NEG_INFINITY);
                Err(e)
            }
        }
    }

    fn read_meter(&self, settings: &GraphSettings) -> Result<GraphReadings> {
        let meter = self.meter.as_ref();
        let true_peak_db = if settings.gauge_peak {
            (0..meter.channels())
                .map(|channel| meter.true_peak(channel).map(linear_to_db))
                .collect::<loudwatch_core::Result<Vec<_>>>()?
        } else {
            Vec::new()
        };

        Ok(GraphReadings {
            momentary: meter.loudness_momentary()?,
            short_term: meter.loudness_shortterm()?,
            range: meter.loudness_range()?,
            global: meter.loudness_global()?,
            true_peak_db,
        })
    }

    /// Render the current state and stamp it with the video time it covers
    fn emit_frame(&mut self, settings: &GraphSettings, renderer: &dyn GraphRenderer) -> VideoFrame {
        self.cadence.video.restart();

        self.canvas
            .data_mut()
            .copy_from_slice(self.background.data());
        renderer.paint_foreground(
            &mut self.canvas,
            &self.layout,
            settings,
            &self.readings,
            self.history.read_chronological(),
        );

        let mut data = Vec::with_capacity(self.video.frame_size());
        VideoFrame::pack(&self.canvas, self.video.format, &mut data);

        let end = self.clock.elapsed();
        let frame = VideoFrame {
            info: self.video,
            data,
            timestamp: self.last_video_timestamp,
            duration: end.saturating_sub(self.last_video_timestamp),
            offset: self.video_frames,
            offset_end: self.video_frames + 1,
        };
        self.last_video_timestamp = end;
        self.video_frames += 1;

        debug!(
            "Emitting video frame {}: timestamp={} duration={}",
            frame.offset, frame.timestamp, frame.duration
        );
        frame
    }
}
