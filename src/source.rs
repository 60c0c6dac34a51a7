//! Capability-abstracted sample sources and cancellable output streams
//!
//! A source is anything that can deliver timestamped fixes or inertial
//! samples to a sink until told to stop: a real GPS chip behind a platform
//! binding, a recorded-trip replay, or a test double. Registration hands
//! back a [`Subscription`] guard; dropping it (or calling `cancel`) releases
//! the upstream registration on every exit path, so no samples are delivered
//! after cancellation completes.
//!
//! The processors stay runtime-free push interfaces; this module is the thin
//! adapter that bridges them into lazy, unbounded, cancellable sequences.

use std::fmt;
use std::sync::mpsc::Receiver;

use uuid::Uuid;

use crate::config::LocationConfig;
use crate::types::{GpsData, InertialSample, LocationFix, MotionEvent};

/// Callback receiving location fixes from a source
pub type FixSink = Box<dyn FnMut(LocationFix) + Send>;

/// Callback receiving inertial samples from a source
pub type SampleSink = Box<dyn FnMut(InertialSample) + Send>;

/// A provider of location fixes.
///
/// Implementations deliver fixes to `sink`, honoring the configured interval
/// and displacement filter as best they can, until the returned subscription
/// is cancelled.
pub trait FixSource {
    fn request_updates(&self, config: &LocationConfig, sink: FixSink) -> Subscription;
}

/// A provider of inertial sensor samples.
///
/// A device without a gyroscope simply never delivers gyroscope samples;
/// the classifier degrades to accelerometer-only detection.
pub trait InertialSource {
    fn register(&self, sink: SampleSink) -> Subscription;
}

/// Guard for an active source registration.
///
/// The cancel action runs exactly once: on explicit [`Subscription::cancel`]
/// or when the guard is dropped, whichever comes first. After it returns,
/// the source must not invoke the sink again.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// A subscription with nothing to release (e.g. a source that delivered
    /// everything synchronously at registration time)
    pub fn noop() -> Self {
        Self { cancel: None }
    }

    /// Release the registration now instead of at drop time
    pub fn cancel(mut self) {
        self.run_cancel();
    }

    fn run_cancel(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.run_cancel();
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.cancel.is_some())
            .finish()
    }
}

/// A lazy, unbounded, cancellable sequence of processor output.
///
/// Iteration blocks until the next item arrives and ends when the upstream
/// source stops delivering. Dropping the stream cancels the underlying
/// subscription.
pub struct EventStream<T> {
    session_id: Uuid,
    receiver: Receiver<T>,
    subscription: Subscription,
}

impl<T> EventStream<T> {
    pub(crate) fn new(receiver: Receiver<T>, subscription: Subscription) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            receiver,
            subscription,
        }
    }

    /// Identifier for this streaming session, for provenance in logs and
    /// reports
    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Non-blocking poll for the next item
    pub fn try_next(&self) -> Option<T> {
        self.receiver.try_recv().ok()
    }

    /// Cancel the upstream subscription and consume the stream.
    ///
    /// Items already queued but not yet read are discarded with the stream.
    pub fn cancel(self) {
        self.subscription.cancel();
    }
}

impl<T> Iterator for EventStream<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        self.receiver.recv().ok()
    }
}

impl<T> fmt::Debug for EventStream<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventStream")
            .field("session_id", &self.session_id)
            .field("subscription", &self.subscription)
            .finish()
    }
}

/// Stream of per-fix GPS snapshots
pub type GpsStream = EventStream<GpsData>;

/// Stream of accepted driving-behavior events
pub type MotionStream = EventStream<MotionEvent>;
