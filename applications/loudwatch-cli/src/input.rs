//! WAV input cut into fixed-size audio buffers

use anyhow::{bail, Context, Result};
use hound::{WavReader, WavSpec};
use loudwatch_core::{AudioBuffer, AudioInfo, ClockTime, SampleFormat};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;
use tracing::{debug, info};

/// Reads a WAV file as a sequence of [`AudioBuffer`]s
///
/// 16-bit integer samples map to S16, 24- and 32-bit integer samples to
/// left-aligned S32, 32-bit float samples to F32. Every buffer carries the
/// timestamp of its first frame; the first one is flagged DISCONT.
pub struct WavInput {
    reader: WavReader<BufReader<File>>,
    info: AudioInfo,
    bits_per_sample: u16,
    buffer_frames: usize,
    position: u64,
}

fn sample_format(spec: &WavSpec) -> Result<SampleFormat> {
    match (spec.sample_format, spec.bits_per_sample) {
        (hound::SampleFormat::Int, 16) => Ok(SampleFormat::S16),
        (hound::SampleFormat::Int, 24 | 32) => Ok(SampleFormat::S32),
        (hound::SampleFormat::Float, 32) => Ok(SampleFormat::F32),
        (format, bits) => bail!("unsupported WAV sample format: {:?} {}-bit", format, bits),
    }
}

/// Read up to `count` samples, appending their native-endian bytes to `out`
fn read_samples<S, const N: usize>(
    reader: &mut WavReader<BufReader<File>>,
    count: usize,
    out: &mut Vec<u8>,
    encode: impl Fn(S) -> [u8; N],
) -> Result<usize>
where
    S: hound::Sample,
{
    let mut read = 0;
    for sample in reader.samples::<S>().take(count) {
        out.extend_from_slice(&encode(sample.context("Failed to decode WAV sample")?));
        read += 1;
    }
    Ok(read)
}

impl WavInput {
    pub fn open(path: &Path, buffer_frames: usize) -> Result<Self> {
        if buffer_frames == 0 {
            bail!("buffer size must be at least one frame");
        }

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file {}", path.display()))?;
        let spec = reader.spec();
        let info = AudioInfo::new(
            sample_format(&spec)?,
            spec.sample_rate,
            u32::from(spec.channels),
        )
        .with_context(|| format!("Unsupported WAV layout in {}", path.display()))?;

        info!(
            "Opened {}: {} ({} frames, {}-bit)",
            path.display(),
            info,
            reader.duration(),
            spec.bits_per_sample
        );

        Ok(Self {
            reader,
            info,
            bits_per_sample: spec.bits_per_sample,
            buffer_frames,
            position: 0,
        })
    }

    pub fn info(&self) -> AudioInfo {
        self.info
    }

    /// Total length in frames as stated by the WAV header
    pub fn duration_frames(&self) -> u64 {
        u64::from(self.reader.duration())
    }

    /// Next buffer of up to `buffer_frames` frames, `None` at end of file
    pub fn next_buffer(&mut self) -> Result<Option<AudioBuffer>> {
        let channels = self.info.channels() as usize;
        let wanted = self.buffer_frames * channels;
        let mut data = Vec::with_capacity(self.buffer_frames * self.info.bpf());

        let samples = match (self.info.format(), self.bits_per_sample) {
            (SampleFormat::S16, _) => {
                read_samples(&mut self.reader, wanted, &mut data, i16::to_ne_bytes)?
            }
            // 24-bit samples arrive right-aligned in an i32
            (SampleFormat::S32, 24) => read_samples(&mut self.reader, wanted, &mut data, |s: i32| {
                (s << 8).to_ne_bytes()
            })?,
            (SampleFormat::S32, _) => {
                read_samples(&mut self.reader, wanted, &mut data, i32::to_ne_bytes)?
            }
            (SampleFormat::F32, _) => {
                read_samples(&mut self.reader, wanted, &mut data, f32::to_ne_bytes)?
            }
            (SampleFormat::F64, _) => bail!("WAV input never produces F64"),
        };

        let frames = samples / channels;
        if frames == 0 {
            return Ok(None);
        }
        // A truncated file can end inside a frame
        data.truncate(frames * self.info.bpf());

        let pts = ClockTime::from_frames(self.position, self.info.sample_rate());
        let mut buffer = AudioBuffer::new(data).with_pts(pts);
        if self.position == 0 {
            buffer = buffer.with_discont();
        }
        debug!("Read {} frames at {}", frames, pts);

        self.position += frames as u64;
        Ok(Some(buffer))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_wav(path: &Path, spec: WavSpec, frames: usize, sample: impl Fn(usize) -> i32) {
        let mut writer = hound::WavWriter::create(path, spec).unwrap();
        for i in 0..frames * spec.channels as usize {
            match spec.bits_per_sample {
                16 => writer.write_sample(sample(i) as i16).unwrap(),
                _ => writer.write_sample(sample(i)).unwrap(),
            }
        }
        writer.finalize().unwrap();
    }

    fn int_spec(channels: u16, bits: u16) -> WavSpec {
        WavSpec {
            channels,
            sample_rate: 48000,
            bits_per_sample: bits,
            sample_format: hound::SampleFormat::Int,
        }
    }

    #[test]
    fn test_buffers_carry_positions() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tone.wav");
        write_wav(&path, int_spec(2, 16), 2500, |i| (i % 100) as i32);

        let mut input = WavInput::open(&path, 1024).unwrap();
        assert_eq!(input.info().format(), SampleFormat::S16);
        assert_eq!(input.duration_frames(), 2500);

        let first = input.next_buffer().unwrap().unwrap();
        assert!(first.discont);
        assert_eq!(first.pts, Some(ClockTime::ZERO));
        assert_eq!(first.len_bytes(), 1024 * 4);

        let second = input.next_buffer().unwrap().unwrap();
        assert!(!second.discont);
        assert_eq!(second.pts, Some(ClockTime::from_frames(1024, 48000)));

        let third = input.next_buffer().unwrap().unwrap();
        assert_eq!(third.len_bytes(), 452 * 4);
        assert!(input.next_buffer().unwrap().is_none());
    }

    #[test]
    fn test_24_bit_left_aligned() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("deep.wav");
        write_wav(&path, int_spec(1, 24), 4, |_| 0x12_3456);

        let mut input = WavInput::open(&path, 16).unwrap();
        assert_eq!(input.info().format(), SampleFormat::S32);
        let buffer = input.next_buffer().unwrap().unwrap();
        let first = i32::from_ne_bytes(buffer.data[..4].try_into().unwrap());
        assert_eq!(first, 0x1234_5600);
    }

    #[test]
    fn test_float_input() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("float.wav");
        let spec = WavSpec {
            channels: 1,
            sample_rate: 44100,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        writer.write_sample(0.25f32).unwrap();
        writer.finalize().unwrap();

        let mut input = WavInput::open(&path, 16).unwrap();
        assert_eq!(input.info().format(), SampleFormat::F32);
        let buffer = input.next_buffer().unwrap().unwrap();
        assert_eq!(buffer.data, 0.25f32.to_ne_bytes().to_vec());
    }

    #[test]
    fn test_unsupported_layouts() {
        let dir = tempfile::tempdir().unwrap();

        let path = dir.path().join("eight.wav");
        let mut writer = hound::WavWriter::create(&path, int_spec(1, 8)).unwrap();
        writer.write_sample(1i8).unwrap();
        writer.finalize().unwrap();
        assert!(WavInput::open(&path, 1024).is_err());

        let path = dir.path().join("quad.wav");
        write_wav(&path, int_spec(4, 16), 10, |_| 0);
        assert!(WavInput::open(&path, 1024).is_err());
    }
}
