//! Recorded-trip replay source
//!
//! A [`RecordedTrip`] is the JSON interchange format for captured fixes and
//! inertial samples; a [`ReplaySource`] plays one back through the same
//! source traits a live provider would implement, which makes it the
//! reference provider for tests and the CLI.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use std::{fs, thread};

use serde::{Deserialize, Serialize};

use crate::config::LocationConfig;
use crate::error::ProfilerError;
use crate::source::{FixSink, FixSource, InertialSource, SampleSink, Subscription};
use crate::types::{InertialSample, LocationFix};

/// A captured trip: location fixes and inertial samples in recorded order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedTrip {
    #[serde(default)]
    pub fixes: Vec<LocationFix>,
    #[serde(default)]
    pub samples: Vec<InertialSample>,
}

impl RecordedTrip {
    pub fn from_json(json: &str) -> Result<Self, ProfilerError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn from_file(path: &Path) -> Result<Self, ProfilerError> {
        let text = fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> Result<String, ProfilerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn is_empty(&self) -> bool {
        self.fixes.is_empty() && self.samples.is_empty()
    }

    /// Fail on trips with nothing to replay
    pub fn validate(&self) -> Result<(), ProfilerError> {
        if self.is_empty() {
            return Err(ProfilerError::EmptyTrip);
        }
        Ok(())
    }

    /// Span between the earliest and latest recorded timestamp, in ms
    /// (0 for empty trips)
    pub fn duration_ms(&self) -> i64 {
        let timestamps = self
            .fixes
            .iter()
            .map(|fix| fix.timestamp_ms)
            .chain(self.samples.iter().map(InertialSample::timestamp_ms));

        let (min, max) = timestamps.fold((i64::MAX, i64::MIN), |(min, max), ts| {
            (min.min(ts), max.max(ts))
        });
        if min > max {
            0
        } else {
            max - min
        }
    }
}

/// Source that replays a recorded trip from a background thread.
///
/// Each registration spawns its own delivery thread; items go out in
/// recorded order, optionally paced. Cancellation raises a flag and joins
/// the thread, so no item is delivered after cancel returns.
pub struct ReplaySource {
    trip: RecordedTrip,
    pacing: Option<Duration>,
}

impl ReplaySource {
    pub fn new(trip: RecordedTrip) -> Self {
        Self { trip, pacing: None }
    }

    /// Sleep `per_item` between deliveries instead of replaying as fast as
    /// possible
    pub fn with_pacing(mut self, per_item: Duration) -> Self {
        self.pacing = Some(per_item);
        self
    }

    fn deliver<T: Send + 'static>(
        items: Vec<T>,
        pacing: Option<Duration>,
        mut sink: Box<dyn FnMut(T) + Send>,
    ) -> Subscription {
        let cancelled = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&cancelled);
        let handle = thread::spawn(move || {
            for item in items {
                if flag.load(Ordering::Relaxed) {
                    break;
                }
                if let Some(pause) = pacing {
                    thread::sleep(pause);
                }
                sink(item);
            }
        });
        Subscription::new(move || {
            cancelled.store(true, Ordering::Relaxed);
            let _ = handle.join();
        })
    }
}

impl FixSource for ReplaySource {
    // The recorded interval/displacement filtering already happened at
    // capture time, so the config is not re-applied here.
    fn request_updates(&self, _config: &LocationConfig, sink: FixSink) -> Subscription {
        Self::deliver(self.trip.fixes.clone(), self.pacing, sink)
    }
}

impl InertialSource for ReplaySource {
    fn register(&self, sink: SampleSink) -> Subscription {
        Self::deliver(self.trip.samples.clone(), self.pacing, sink)
    }
}
