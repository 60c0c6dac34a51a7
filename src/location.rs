//! Location stream processor
//!
//! Consumes raw position fixes and derives cumulative trip distance,
//! converted speed, running maxima, and a speed distribution. One `GpsData`
//! snapshot is emitted per fix; nothing is filtered here (displacement and
//! interval filtering belong to the fix source).

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, PoisonError};

use crate::config::LocationConfig;
use crate::geo::fix_distance_m;
use crate::source::{FixSink, FixSource, GpsStream};
use crate::stats::RunningStats;
use crate::types::{GpsData, LocationFix, TripSpeedStats};

/// m/s to km/h conversion factor
const MPS_TO_KMH: f32 = 3.6;

/// Trip-scoped speed and distance state.
///
/// Exactly one writer mutates this (the processing path); accessor reads may
/// come from other threads. Scalars live in atomics (f32 stored as bits) so
/// each individual read is consistent without a full lock; the sample
/// history is locked only to append or snapshot.
#[derive(Debug, Default)]
struct TripState {
    previous_fix: Mutex<Option<LocationFix>>,
    total_distance_bits: AtomicU32,
    max_speed_bits: AtomicU32,
    speed_samples: Mutex<Vec<f32>>,
}

fn load_f32(bits: &AtomicU32) -> f32 {
    f32::from_bits(bits.load(Ordering::Relaxed))
}

fn store_f32(bits: &AtomicU32, value: f32) {
    bits.store(value.to_bits(), Ordering::Relaxed);
}

impl TripState {
    /// Fold one fix into the trip state and derive its snapshot.
    ///
    /// The first fix after construction or reset contributes zero distance.
    /// Fixes are taken in arrival order, most-recent-wins; the processor
    /// never reorders.
    fn apply_fix(&self, fix: &LocationFix) -> GpsData {
        {
            let mut previous = self
                .previous_fix
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if let Some(prev) = previous.as_ref() {
                let total = load_f32(&self.total_distance_bits) + fix_distance_m(prev, fix);
                store_f32(&self.total_distance_bits, total);
            }
            *previous = Some(*fix);
        }

        let speed_kmh = fix.speed.map(|mps| mps * MPS_TO_KMH).unwrap_or(0.0);
        if speed_kmh > load_f32(&self.max_speed_bits) {
            store_f32(&self.max_speed_bits, speed_kmh);
        }
        self.speed_samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(speed_kmh);

        GpsData {
            latitude: fix.latitude,
            longitude: fix.longitude,
            speed_mps: fix.speed.unwrap_or(0.0),
            speed_kmh,
            altitude: fix.altitude,
            bearing: fix.bearing,
            accuracy: fix.accuracy,
            timestamp_ms: fix.timestamp_ms,
        }
    }

    fn sample_snapshot(&self) -> Vec<f32> {
        self.speed_samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn reset(&self) {
        *self
            .previous_fix
            .lock()
            .unwrap_or_else(PoisonError::into_inner) = None;
        store_f32(&self.total_distance_bits, 0.0);
        store_f32(&self.max_speed_bits, 0.0);
        self.speed_samples
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clear();
    }
}

/// Location stream processor.
///
/// Push interface: [`GpsTracker::process_fix`] accepts one fix and returns
/// its derived snapshot. [`GpsTracker::start_tracking`] bridges a fix source
/// into a cancellable stream of snapshots while the same accessors keep
/// serving cumulative statistics.
pub struct GpsTracker {
    config: LocationConfig,
    state: Arc<TripState>,
}

impl Default for GpsTracker {
    fn default() -> Self {
        Self::new(LocationConfig::default())
    }
}

impl GpsTracker {
    pub fn new(config: LocationConfig) -> Self {
        Self {
            config,
            state: Arc::new(TripState::default()),
        }
    }

    pub fn config(&self) -> &LocationConfig {
        &self.config
    }

    /// Process one raw fix and return the derived snapshot
    pub fn process_fix(&self, fix: &LocationFix) -> GpsData {
        self.state.apply_fix(fix)
    }

    /// Subscribe to `source` and return the stream of per-fix snapshots.
    ///
    /// The stream is lazy and unbounded; dropping or cancelling it releases
    /// the source registration. Statistics keep accumulating on this tracker
    /// while the stream is live.
    pub fn start_tracking(&self, source: &dyn FixSource) -> GpsStream {
        let (sender, receiver) = mpsc::channel();
        let state = Arc::clone(&self.state);
        let sink: FixSink = Box::new(move |fix| {
            let data = state.apply_fix(&fix);
            // Receiver may already be gone; state still accumulates.
            let _ = sender.send(data);
        });
        let subscription = source.request_updates(&self.config, sink);
        GpsStream::new(receiver, subscription)
    }

    /// Cumulative geodesic distance in meters (monotonically non-decreasing)
    pub fn total_distance_m(&self) -> f32 {
        load_f32(&self.state.total_distance_bits)
    }

    /// Running maximum speed in km/h (monotonically non-decreasing)
    pub fn max_speed_kmh(&self) -> f32 {
        load_f32(&self.state.max_speed_bits)
    }

    /// Mean of recorded speeds in km/h (0 if no fixes yet)
    pub fn average_speed_kmh(&self) -> f32 {
        RunningStats::from_samples(&self.state.sample_snapshot()).mean()
    }

    /// Population standard deviation of recorded speeds in km/h
    /// (0 for fewer than two fixes)
    pub fn speed_stddev_kmh(&self) -> f32 {
        RunningStats::from_samples(&self.state.sample_snapshot()).population_std_dev()
    }

    /// Snapshot of every speed sample recorded this trip, in arrival order
    pub fn speed_samples(&self) -> Vec<f32> {
        self.state.sample_snapshot()
    }

    /// One consistent summary of the trip speed state
    pub fn stats(&self) -> TripSpeedStats {
        let samples = self.state.sample_snapshot();
        let running = RunningStats::from_samples(&samples);
        TripSpeedStats {
            sample_count: samples.len(),
            total_distance_m: self.total_distance_m(),
            max_speed_kmh: self.max_speed_kmh(),
            average_speed_kmh: running.mean(),
            speed_stddev_kmh: running.population_std_dev(),
        }
    }

    /// Clear all trip state; the next fix behaves like the first of a fresh
    /// tracker
    pub fn reset(&self) {
        self.state.reset();
    }
}
