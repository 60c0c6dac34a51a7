//! Motion event classifier
//!
//! Consumes raw 3-axis acceleration and rotation-rate samples, classifies
//! discrete driving-behavior events against configured thresholds, and
//! suppresses duplicate detections within a per-category cooldown window.
//! Magnitude tracking is independent of event detection: every
//! accelerometer sample lands in the magnitude history whether or not
//! anything fires.

use std::sync::atomic::{AtomicI64, AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::MotionConfig;
use crate::source::{InertialSource, MotionStream, SampleSink};
use crate::stats::{magnitude, RunningStats};
use crate::types::{InertialSample, MotionEvent, MotionEventKind, MotionStats};

/// Sentinel for "no event of this category accepted yet".
///
/// Distinct from 0 so that a sample at t = 0 on a fresh detector is never
/// suppressed by an event that never happened.
const NO_EVENT_YET: i64 = i64::MIN;

/// Detection state owned by a single classifier.
///
/// Counters and last-accepted timestamps are atomics so concurrent stat
/// reads stay consistent per field without a lock; the magnitude history is
/// locked only to append or snapshot. Counters only grow; the timestamps
/// advance only when an event is accepted.
#[derive(Debug)]
struct MotionState {
    harsh_brakes: AtomicU32,
    rapid_accelerations: AtomicU32,
    sharp_turns: AtomicU32,
    last_brake_ms: AtomicI64,
    last_accel_ms: AtomicI64,
    last_turn_ms: AtomicI64,
    magnitude_samples: Mutex<Vec<f32>>,
}

impl Default for MotionState {
    fn default() -> Self {
        Self {
            harsh_brakes: AtomicU32::new(0),
            rapid_accelerations: AtomicU32::new(0),
            sharp_turns: AtomicU32::new(0),
            last_brake_ms: AtomicI64::new(NO_EVENT_YET),
            last_accel_ms: AtomicI64::new(NO_EVENT_YET),
            last_turn_ms: AtomicI64::new(NO_EVENT_YET),
            magnitude_samples: Mutex::new(Vec::new()),
        }
    }
}

impl MotionState {
    /// Whether a category may fire at `now_ms`.
    ///
    /// Plain integer arithmetic; a non-positive delta (duplicate or
    /// out-of-order timestamp) counts as within cooldown. `saturating_sub`
    /// keeps clock-skewed replays from overflowing.
    fn cooldown_elapsed(last: &AtomicI64, now_ms: i64, cooldown_ms: i64) -> bool {
        let last = last.load(Ordering::Relaxed);
        last == NO_EVENT_YET || now_ms.saturating_sub(last) > cooldown_ms
    }

    fn accept(
        &self,
        counter: &AtomicU32,
        last: &AtomicI64,
        kind: MotionEventKind,
        event_magnitude: f32,
        now_ms: i64,
    ) -> MotionEvent {
        counter.fetch_add(1, Ordering::Relaxed);
        last.store(now_ms, Ordering::Relaxed);
        MotionEvent {
            kind,
            magnitude: event_magnitude,
            timestamp_ms: now_ms,
        }
    }

    /// Classify one sample, returning zero or more accepted events.
    ///
    /// The three accelerometer conditions are evaluated independently in
    /// brake → acceleration → lateral-turn order, so a single sample can
    /// emit up to three events. The gyroscope path shares the sharp-turn
    /// counter and cooldown with the lateral-force path.
    fn classify(&self, config: &MotionConfig, sample: &InertialSample) -> Vec<MotionEvent> {
        let mut events = Vec::new();
        match *sample {
            InertialSample::Accelerometer { x, y, z, timestamp_ms } => {
                self.magnitude_samples
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .push(magnitude(x, y, z));

                if y < config.harsh_brake_threshold
                    && Self::cooldown_elapsed(
                        &self.last_brake_ms,
                        timestamp_ms,
                        config.event_cooldown_ms,
                    )
                {
                    events.push(self.accept(
                        &self.harsh_brakes,
                        &self.last_brake_ms,
                        MotionEventKind::HarshBrake,
                        y.abs(),
                        timestamp_ms,
                    ));
                }

                if y > config.rapid_accel_threshold
                    && Self::cooldown_elapsed(
                        &self.last_accel_ms,
                        timestamp_ms,
                        config.event_cooldown_ms,
                    )
                {
                    events.push(self.accept(
                        &self.rapid_accelerations,
                        &self.last_accel_ms,
                        MotionEventKind::RapidAcceleration,
                        y,
                        timestamp_ms,
                    ));
                }

                if x.abs() > config.sharp_turn_threshold
                    && Self::cooldown_elapsed(
                        &self.last_turn_ms,
                        timestamp_ms,
                        config.event_cooldown_ms,
                    )
                {
                    events.push(self.accept(
                        &self.sharp_turns,
                        &self.last_turn_ms,
                        MotionEventKind::SharpTurn,
                        x.abs(),
                        timestamp_ms,
                    ));
                }
            }
            InertialSample::Gyroscope { x, y, z, timestamp_ms } => {
                let rotation_rate = magnitude(x, y, z);
                if rotation_rate > config.gyro_turn_threshold
                    && Self::cooldown_elapsed(
                        &self.last_turn_ms,
                        timestamp_ms,
                        config.event_cooldown_ms,
                    )
                {
                    events.push(self.accept(
                        &self.sharp_turns,
                        &self.last_turn_ms,
                        MotionEventKind::SharpTurn,
                        rotation_rate,
                        timestamp_ms,
                    ));
                }
            }
        }
        events
    }

    fn magnitude_snapshot(&self) -> Vec<f32> {
        self.magnitude_samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset(&self) {
        self.harsh_brakes.store(0, Ordering::Relaxed);
        self.rapid_accelerations.store(0, Ordering::Relaxed);
        self.sharp_turns.store(0, Ordering::Relaxed);
        self.last_brake_ms.store(NO_EVENT_YET, Ordering::Relaxed);
        self.last_accel_ms.store(NO_EVENT_YET, Ordering::Relaxed);
        self.last_turn_ms.store(NO_EVENT_YET, Ordering::Relaxed);
        self.magnitude_samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Motion event classifier.
///
/// Push interface: [`MotionDetector::process_sample`] accepts one inertial
/// sample and returns the accepted events (zero to three).
/// [`MotionDetector::start_listening`] bridges an inertial source into a
/// cancellable event stream while [`MotionDetector::stats`] keeps serving
/// cumulative counters.
pub struct MotionDetector {
    config: MotionConfig,
    state: Arc<MotionState>,
}

impl Default for MotionDetector {
    fn default() -> Self {
        Self::new(MotionConfig::default())
    }
}

impl MotionDetector {
    pub fn new(config: MotionConfig) -> Self {
        Self {
            config,
            state: Arc::new(MotionState::default()),
        }
    }

    pub fn config(&self) -> &MotionConfig {
        &self.config
    }

    /// Classify one sample and return the accepted events
    pub fn process_sample(&self, sample: &InertialSample) -> Vec<MotionEvent> {
        self.state.classify(&self.config, sample)
    }

    /// Subscribe to `source` and return the stream of accepted events.
    ///
    /// The stream is lazy and unbounded; dropping or cancelling it releases
    /// the source registration. Counters keep accumulating on this detector
    /// while the stream is live.
    pub fn start_listening(&self, source: &dyn InertialSource) -> MotionStream {
        let (sender, receiver) = mpsc::channel();
        let state = Arc::clone(&self.state);
        let config = self.config;
        let sink: SampleSink = Box::new(move |sample| {
            for event in state.classify(&config, &sample) {
                // Receiver may already be gone; state still accumulates.
                let _ = sender.send(event);
            }
        });
        let subscription = source.register(sink);
        MotionStream::new(receiver, subscription)
    }

    /// Accepted harsh-brake events so far
    pub fn harsh_brakes(&self) -> u32 {
        self.state.harsh_brakes.load(Ordering::Relaxed)
    }

    /// Accepted rapid-acceleration events so far
    pub fn rapid_accelerations(&self) -> u32 {
        self.state.rapid_accelerations.load(Ordering::Relaxed)
    }

    /// Accepted sharp-turn events so far, both trigger paths combined
    pub fn sharp_turns(&self) -> u32 {
        self.state.sharp_turns.load(Ordering::Relaxed)
    }

    /// Counters plus the accelerometer magnitude distribution
    pub fn stats(&self) -> MotionStats {
        let running = RunningStats::from_samples(&self.state.magnitude_snapshot());
        MotionStats {
            harsh_brakes: self.harsh_brakes(),
            rapid_accelerations: self.rapid_accelerations(),
            sharp_turns: self.sharp_turns(),
            avg_magnitude: running.mean(),
            max_magnitude: running.max(),
        }
    }

    /// Number of accelerometer samples seen (event-independent)
    pub fn magnitude_sample_count(&self) -> usize {
        self.state.magnitude_snapshot().len()
    }

    /// Clear all detection state; the next sample behaves like the first of
    /// a fresh detector
    pub fn reset(&self) {
        self.state.reset();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn accel(x: f32, y: f32, z: f32, timestamp_ms: i64) -> InertialSample {
        InertialSample::Accelerometer { x, y, z, timestamp_ms }
    }

    fn gyro(x: f32, y: f32, z: f32, timestamp_ms: i64) -> InertialSample {
        InertialSample::Gyroscope { x, y, z, timestamp_ms }
    }

    #[test]
    fn test_harsh_brake_detection_and_magnitude() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&accel(0.0, -7.0, 0.0, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MotionEventKind::HarshBrake);
        // Reported as absolute value
        assert_eq!(events[0].magnitude, 7.0);
        assert_eq!(events[0].timestamp_ms, 0);
        assert_eq!(detector.harsh_brakes(), 1);
    }

    #[test]
    fn test_cooldown_suppresses_then_releases() {
        let detector = MotionDetector::default();

        // Accepted at t=0
        assert_eq!(detector.process_sample(&accel(0.0, -7.0, 0.0, 0)).len(), 1);
        // Within the 3000 ms window: suppressed entirely
        assert_eq!(detector.process_sample(&accel(0.0, -7.0, 0.0, 2000)).len(), 0);
        assert_eq!(detector.harsh_brakes(), 1);
        // 3500 ms after the *accepted* event: accepted again
        assert_eq!(detector.process_sample(&accel(0.0, -7.0, 0.0, 3500)).len(), 1);
        assert_eq!(detector.harsh_brakes(), 2);
    }

    #[test]
    fn test_suppression_does_not_advance_cooldown_clock() {
        let detector = MotionDetector::default();

        detector.process_sample(&accel(0.0, -7.0, 0.0, 0));
        // Suppressed candidates at t=2000 and t=2900 must not push the
        // window forward
        detector.process_sample(&accel(0.0, -7.0, 0.0, 2000));
        detector.process_sample(&accel(0.0, -7.0, 0.0, 2900));
        // 3001 ms after acceptance at t=0: fires
        let events = detector.process_sample(&accel(0.0, -7.0, 0.0, 3001));
        assert_eq!(events.len(), 1);
        assert_eq!(detector.harsh_brakes(), 2);
    }

    #[test]
    fn test_rapid_acceleration_reports_raw_value() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&accel(0.0, 4.5, 0.0, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MotionEventKind::RapidAcceleration);
        assert_eq!(events[0].magnitude, 4.5);
        assert_eq!(detector.rapid_accelerations(), 1);
    }

    #[test]
    fn test_lateral_turn_uses_absolute_x() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&accel(-6.0, 0.0, 0.0, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MotionEventKind::SharpTurn);
        assert_eq!(events[0].magnitude, 6.0);
        assert_eq!(detector.sharp_turns(), 1);
    }

    #[test]
    fn test_single_sample_can_fire_multiple_categories() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&accel(6.0, 5.0, 0.0, 0));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, MotionEventKind::RapidAcceleration);
        assert_eq!(events[1].kind, MotionEventKind::SharpTurn);
        assert_eq!(detector.rapid_accelerations(), 1);
        assert_eq!(detector.sharp_turns(), 1);
    }

    #[test]
    fn test_brake_and_lateral_slide_together() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&accel(-5.5, -6.5, 0.0, 0));

        assert_eq!(events.len(), 2);
        assert_eq!(events[0].kind, MotionEventKind::HarshBrake);
        assert_eq!(events[0].magnitude, 6.5);
        assert_eq!(events[1].kind, MotionEventKind::SharpTurn);
        assert_eq!(events[1].magnitude, 5.5);
    }

    #[test]
    fn test_gyro_turn_detection() {
        let detector = MotionDetector::default();
        let events = detector.process_sample(&gyro(1.5, 1.5, 1.5, 0));

        assert_eq!(events.len(), 1);
        assert_eq!(events[0].kind, MotionEventKind::SharpTurn);
        // Rotation-rate magnitude: sqrt(3 * 1.5²) ≈ 2.598
        assert!((events[0].magnitude - 2.598).abs() < 0.001);
        assert_eq!(detector.sharp_turns(), 1);
    }

    #[test]
    fn test_gyro_and_lateral_share_turn_cooldown() {
        let detector = MotionDetector::default();

        // Lateral-force turn accepted at t=0
        assert_eq!(detector.process_sample(&accel(6.0, 0.0, 0.0, 0)).len(), 1);
        // Gyro candidate within the shared window: suppressed
        assert_eq!(detector.process_sample(&gyro(3.0, 0.0, 0.0, 1000)).len(), 0);
        assert_eq!(detector.sharp_turns(), 1);

        // Gyro turn accepted once the window opens, and resets the shared
        // clock for the lateral path
        assert_eq!(detector.process_sample(&gyro(3.0, 0.0, 0.0, 3500)).len(), 1);
        assert_eq!(detector.process_sample(&accel(6.0, 0.0, 0.0, 4000)).len(), 0);
        assert_eq!(detector.sharp_turns(), 2);
    }

    #[test]
    fn test_gyro_below_threshold_is_quiet() {
        let detector = MotionDetector::default();
        assert!(detector.process_sample(&gyro(1.0, 1.0, 1.0, 0)).is_empty());
        assert_eq!(detector.sharp_turns(), 0);
    }

    #[test]
    fn test_magnitude_tracking_is_event_independent() {
        let detector = MotionDetector::default();

        // Quiet, loud, and suppressed samples all land in the history
        detector.process_sample(&accel(0.1, 0.2, 0.1, 0));
        detector.process_sample(&accel(0.0, -7.0, 0.0, 1000));
        detector.process_sample(&accel(0.0, -7.0, 0.0, 2000)); // suppressed
        // Gyroscope samples do not
        detector.process_sample(&gyro(3.0, 0.0, 0.0, 2500));

        assert_eq!(detector.magnitude_sample_count(), 3);
    }

    #[test]
    fn test_stats_on_empty_detector() {
        let detector = MotionDetector::default();
        let stats = detector.stats();
        assert_eq!(stats.harsh_brakes, 0);
        assert_eq!(stats.rapid_accelerations, 0);
        assert_eq!(stats.sharp_turns, 0);
        assert_eq!(stats.avg_magnitude, 0.0);
        assert_eq!(stats.max_magnitude, 0.0);
    }

    #[test]
    fn test_stats_magnitudes() {
        let detector = MotionDetector::default();
        detector.process_sample(&accel(3.0, 4.0, 0.0, 0)); // magnitude 5
        detector.process_sample(&accel(0.0, 3.0, 0.0, 1000)); // magnitude 3

        let stats = detector.stats();
        assert_eq!(stats.avg_magnitude, 4.0);
        assert_eq!(stats.max_magnitude, 5.0);
    }

    #[test]
    fn test_duplicate_and_backward_timestamps_do_not_panic() {
        let detector = MotionDetector::default();

        detector.process_sample(&accel(0.0, -7.0, 0.0, 5000));
        // Duplicate timestamp: zero delta is within cooldown
        assert!(detector.process_sample(&accel(0.0, -7.0, 0.0, 5000)).is_empty());
        // Backward timestamp: negative delta is within cooldown
        assert!(detector.process_sample(&accel(0.0, -7.0, 0.0, 1000)).is_empty());
        assert_eq!(detector.harsh_brakes(), 1);
    }

    #[test]
    fn test_event_at_time_zero_on_fresh_detector() {
        let detector = MotionDetector::default();
        // No prior accepted event; t=0 must not look "within cooldown" of
        // an initial zero timestamp
        assert_eq!(detector.process_sample(&accel(0.0, -7.0, 0.0, 0)).len(), 1);
    }

    #[test]
    fn test_reset_restores_fresh_behavior() {
        let detector = MotionDetector::default();
        detector.process_sample(&accel(6.0, -7.0, 0.0, 0));
        detector.process_sample(&gyro(3.0, 0.0, 0.0, 4000));
        assert!(detector.stats().harsh_brakes > 0);

        detector.reset();
        let stats = detector.stats();
        assert_eq!(stats.harsh_brakes, 0);
        assert_eq!(stats.rapid_accelerations, 0);
        assert_eq!(stats.sharp_turns, 0);
        assert_eq!(detector.magnitude_sample_count(), 0);

        // Same first-sample behavior as a fresh detector, including t=0
        let events = detector.process_sample(&accel(0.0, -7.0, 0.0, 0));
        assert_eq!(events.len(), 1);
        assert_eq!(detector.harsh_brakes(), 1);
    }

    #[test]
    fn test_custom_thresholds() {
        let detector = MotionDetector::new(MotionConfig {
            harsh_brake_threshold: -2.0,
            rapid_accel_threshold: 1.0,
            sharp_turn_threshold: 1.5,
            gyro_turn_threshold: 0.5,
            event_cooldown_ms: 100,
        });

        assert_eq!(detector.process_sample(&accel(0.0, -2.5, 0.0, 0)).len(), 1);
        assert_eq!(detector.process_sample(&accel(0.0, 1.5, 0.0, 200)).len(), 1);
        assert_eq!(detector.process_sample(&gyro(1.0, 0.0, 0.0, 400)).len(), 1);
    }
}
