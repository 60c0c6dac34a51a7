//! Smartdriver Core - on-device compute core for driving telemetry
//!
//! The core turns continuous streams of raw location fixes and inertial
//! samples into running trip statistics and de-duplicated driving-behavior
//! events through two independent push-based processors:
//!
//! - **Location Stream Processor** ([`GpsTracker`]): cumulative distance,
//!   converted speed, running maxima, speed distribution
//! - **Motion Event Classifier** ([`MotionDetector`]): harsh brakes, rapid
//!   accelerations, sharp turns, with per-category cooldown suppression
//!
//! Both are leaf components; a downstream aggregator subscribes to their
//! output streams and reads their accumulated statistics. The core itself
//! performs no I/O, no persistence, and no scoring.

pub mod config;
pub mod error;
pub mod geo;
pub mod location;
pub mod motion;
pub mod replay;
pub mod source;
pub mod stats;
pub mod types;

pub use config::{LocationConfig, MotionConfig};
pub use error::ProfilerError;
pub use location::GpsTracker;
pub use motion::MotionDetector;
pub use replay::{RecordedTrip, ReplaySource};
pub use source::{FixSource, GpsStream, InertialSource, MotionStream, Subscription};
pub use types::{
    GpsData, InertialSample, LocationFix, MotionEvent, MotionEventKind, MotionStats,
    TripSpeedStats,
};

/// Core version embedded in reports
pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Producer name for report provenance
pub const PRODUCER_NAME: &str = "smartdriver-core";
