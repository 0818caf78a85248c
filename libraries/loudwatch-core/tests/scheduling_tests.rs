//! Property tests for interval accounting and the history ring
//!
//! The chunk loops below mirror how the elements drive their cadences, with
//! the meter replaced by a plain frame counter.

use loudwatch_core::{ClockTime, DualCadence, HistoryRing, Interval};
use proptest::prelude::*;

// ========== Helper Functions ==========

/// Drive a single cadence over a sequence of buffers
///
/// Returns the fed chunk sizes and the frame offsets at which events fired.
fn run_single(period: u64, buffers: &[u64]) -> (Vec<u64>, Vec<u64>, Interval) {
    let mut interval = Interval::from_frames(period);
    let mut fed = Vec::new();
    let mut events = Vec::new();
    let mut position = 0u64;

    for &buffer in buffers {
        let mut remaining = buffer;
        loop {
            let chunk = interval.frames_until_due().min(remaining);
            if chunk > 0 {
                fed.push(chunk);
                position += chunk;
                remaining -= chunk;
                interval.advance(chunk);
            }
            if interval.is_due() {
                interval.restart();
                events.push(position);
            }
            if remaining == 0 {
                break;
            }
        }
    }

    (fed, events, interval)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Event {
    Measurement(u64),
    Video(u64),
}

/// Drive two cadences over one buffer, measurement checked before video
fn run_dual(measurement: u64, video: u64, frames: u64) -> (u64, Vec<Event>) {
    let mut cadence = DualCadence::new(Interval::from_frames(measurement), Interval::from_frames(video));
    let mut remaining = frames;
    let mut position = 0u64;
    let mut fed = 0u64;
    let mut events = Vec::new();

    while remaining > 0 {
        let chunk = cadence.next_chunk(remaining);
        assert!(chunk > 0, "scheduler stalled at frame {}", position);
        fed += chunk;
        position += chunk;
        remaining -= chunk;
        cadence.advance(chunk);

        assert!(cadence.measurement.elapsed_frames() <= cadence.measurement.period_frames());
        assert!(cadence.video.elapsed_frames() <= cadence.video.period_frames());

        if cadence.measurement.is_due() {
            cadence.measurement.restart();
            events.push(Event::Measurement(position));
        }
        if cadence.video.is_due() {
            cadence.video.restart();
            events.push(Event::Video(position));
        }
    }

    (fed, events)
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 {
        a
    } else {
        gcd(b, a % b)
    }
}

// ========== Single Cadence ==========

#[test]
fn test_three_40ms_buffers_fire_once_at_100ms() {
    let interval_frames = ClockTime::from_mseconds(100).to_frames(48000);
    let buffer = ClockTime::from_mseconds(40).to_frames(48000);

    let (_, events, interval) = run_single(interval_frames, &[buffer, buffer]);
    assert!(events.is_empty());
    assert_eq!(interval.elapsed_frames(), 3840);

    let (fed, events, interval) = run_single(interval_frames, &[buffer, buffer, buffer]);
    assert_eq!(events, vec![4800]);
    assert_eq!(interval.elapsed_frames(), 960);
    assert_eq!(fed, vec![1920, 1920, 960, 960]);
    assert_eq!(
        ClockTime::from_frames(events[0], 48000),
        ClockTime::from_mseconds(100)
    );
}

#[test]
fn test_exact_boundary_fires_without_split() {
    let (fed, events, interval) = run_single(100, &[50, 50]);
    assert_eq!(fed, vec![50, 50]);
    assert_eq!(events, vec![100]);
    assert_eq!(interval.elapsed_frames(), 0);
}

#[test]
fn test_huge_buffer_fires_every_interval() {
    let (fed, events, _) = run_single(4800, &[48000]);
    assert_eq!(events.len(), 10);
    assert_eq!(events, (1..=10).map(|k| k * 4800).collect::<Vec<_>>());
    assert_eq!(fed.iter().sum::<u64>(), 48000);
}

// ========== Dual Cadence ==========

#[test]
fn test_coinciding_boundaries_measure_before_video() {
    let (_, events) = run_dual(4, 6, 12);
    assert_eq!(
        events,
        vec![
            Event::Measurement(4),
            Event::Video(6),
            Event::Measurement(8),
            Event::Measurement(12),
            Event::Video(12),
        ]
    );
}

// ========== Property-Based Tests ==========

proptest! {
    #![proptest_config(ProptestConfig::with_cases(50))]

    /// Every frame handed in is fed exactly once, whatever the buffer sizes
    #[test]
    fn frame_conservation(
        period in 1u64..5000,
        buffers in prop::collection::vec(0u64..20_000, 0..20),
    ) {
        let (fed, events, interval) = run_single(period, &buffers);
        let total: u64 = buffers.iter().sum();

        prop_assert_eq!(fed.iter().sum::<u64>(), total);
        prop_assert_eq!(events.len() as u64, total / period);
        prop_assert_eq!(interval.elapsed_frames(), total % period);
    }

    /// A buffer of k*P + r frames fires k events at P, 2P, ..., kP
    #[test]
    fn interval_exactness(
        period in 1u64..10_000,
        k in 0u64..20,
        r_seed in 0u64..10_000,
    ) {
        let r = r_seed % period;
        let (_, events, interval) = run_single(period, &[k * period + r]);

        let expected: Vec<u64> = (1..=k).map(|i| i * period).collect();
        prop_assert_eq!(events, expected);
        prop_assert_eq!(interval.elapsed_frames(), r);
    }

    /// Over 3 * lcm(M, V) frames both cadences fire their exact share
    #[test]
    fn dual_cadence_counts(measurement in 1u64..400, video in 1u64..400) {
        let lcm = measurement / gcd(measurement, video) * video;
        let total = lcm * 3;
        let (fed, events) = run_dual(measurement, video, total);

        prop_assert_eq!(fed, total);

        let measurements: Vec<u64> = events.iter().filter_map(|e| match e {
            Event::Measurement(at) => Some(*at),
            Event::Video(_) => None,
        }).collect();
        let videos: Vec<u64> = events.iter().filter_map(|e| match e {
            Event::Video(at) => Some(*at),
            Event::Measurement(_) => None,
        }).collect();

        prop_assert_eq!(measurements.len() as u64, total / measurement);
        prop_assert_eq!(videos.len() as u64, total / video);
        prop_assert!(measurements.iter().all(|at| at % measurement == 0));
        prop_assert!(videos.iter().all(|at| at % video == 0));

        // Where both fire at the same offset, the measurement comes first
        for pair in events.windows(2) {
            if let [Event::Video(a), Event::Measurement(b)] = pair {
                prop_assert_ne!(a, b);
            }
        }
    }

    /// Writing capacity + k values keeps exactly the last `capacity` of them
    #[test]
    fn ring_wraparound(capacity in 1usize..64, k in 1usize..200) {
        let mut ring = HistoryRing::new(capacity).unwrap();
        let total = capacity + k;
        for value in 0..total {
            ring.write(value as f64);
        }

        prop_assert_eq!(ring.head(), k % capacity);
        let expected: Vec<f64> = (k..total).map(|v| v as f64).collect();
        let actual: Vec<f64> = ring.read_chronological().collect();
        prop_assert_eq!(actual, expected);
    }
}
