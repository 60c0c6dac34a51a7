//! Core types for the Smartdriver pipeline
//!
//! This module defines the data structures that flow through the two stream
//! processors: raw location fixes and inertial samples on the way in, derived
//! GPS snapshots, behavior events, and on-demand statistics on the way out.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single raw position fix as delivered by a location provider.
///
/// Fixes are externally produced and already validated; the core never
/// rejects one. `speed` is optional because not every provider reports a
/// reliable Doppler speed with every fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationFix {
    /// Latitude in decimal degrees
    pub latitude: f64,
    /// Longitude in decimal degrees
    pub longitude: f64,
    /// Ground speed in m/s, when the provider reports one
    pub speed: Option<f32>,
    /// Altitude in meters above the WGS84 ellipsoid
    pub altitude: f64,
    /// Direction of travel in degrees
    pub bearing: f32,
    /// Horizontal accuracy estimate in meters
    pub accuracy: f32,
    /// Fix timestamp in epoch milliseconds
    pub timestamp_ms: i64,
}

/// Derived read-only snapshot emitted once per processed fix.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GpsData {
    pub latitude: f64,
    pub longitude: f64,
    /// Raw speed in m/s (0 when the fix carried no speed)
    pub speed_mps: f32,
    /// Converted speed in km/h (0 when the fix carried no speed)
    pub speed_kmh: f32,
    pub altitude: f64,
    pub bearing: f32,
    pub accuracy: f32,
    pub timestamp_ms: i64,
}

impl GpsData {
    /// Fix timestamp as a UTC datetime, when representable
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// A single raw inertial sensor sample.
///
/// Accelerometer samples carry linear acceleration (gravity removed) with
/// x = lateral, y = forward/back, z = vertical. Gyroscope samples carry
/// rotation rate in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "sensor", rename_all = "snake_case")]
pub enum InertialSample {
    Accelerometer {
        x: f32,
        y: f32,
        z: f32,
        timestamp_ms: i64,
    },
    Gyroscope {
        x: f32,
        y: f32,
        z: f32,
        timestamp_ms: i64,
    },
}

impl InertialSample {
    /// Sample timestamp in epoch milliseconds
    pub fn timestamp_ms(&self) -> i64 {
        match *self {
            InertialSample::Accelerometer { timestamp_ms, .. } => timestamp_ms,
            InertialSample::Gyroscope { timestamp_ms, .. } => timestamp_ms,
        }
    }
}

/// Discrete driving-behavior event category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MotionEventKind {
    HarshBrake,
    RapidAcceleration,
    SharpTurn,
}

impl MotionEventKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MotionEventKind::HarshBrake => "harsh_brake",
            MotionEventKind::RapidAcceleration => "rapid_acceleration",
            MotionEventKind::SharpTurn => "sharp_turn",
        }
    }
}

/// A de-duplicated driving-behavior event
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionEvent {
    /// Event category
    pub kind: MotionEventKind,
    /// Magnitude of the triggering signal (always ≥ 0)
    pub magnitude: f32,
    /// Timestamp of the triggering sample in epoch milliseconds
    pub timestamp_ms: i64,
}

impl MotionEvent {
    /// Event timestamp as a UTC datetime, when representable
    pub fn timestamp_utc(&self) -> Option<DateTime<Utc>> {
        DateTime::from_timestamp_millis(self.timestamp_ms)
    }
}

/// On-demand summary of detected behavior events and acceleration magnitudes
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionStats {
    /// Accepted harsh-brake events
    pub harsh_brakes: u32,
    /// Accepted rapid-acceleration events
    pub rapid_accelerations: u32,
    /// Accepted sharp-turn events (accelerometer and gyroscope paths combined)
    pub sharp_turns: u32,
    /// Mean accelerometer magnitude (0 if no samples yet)
    pub avg_magnitude: f32,
    /// Maximum accelerometer magnitude (0 if no samples yet)
    pub max_magnitude: f32,
}

/// On-demand summary of the running trip speed state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripSpeedStats {
    /// Number of speed samples recorded so far
    pub sample_count: usize,
    /// Cumulative geodesic distance in meters
    pub total_distance_m: f32,
    /// Running maximum speed in km/h
    pub max_speed_kmh: f32,
    /// Mean speed in km/h (0 if no samples yet)
    pub average_speed_kmh: f32,
    /// Population standard deviation of speed in km/h (0 for < 2 samples)
    pub speed_stddev_kmh: f32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_inertial_sample_serde_tagging() {
        let sample = InertialSample::Accelerometer {
            x: 0.5,
            y: -6.5,
            z: 0.1,
            timestamp_ms: 1000,
        };
        let json = serde_json::to_string(&sample).unwrap();
        assert!(json.contains(r#""sensor":"accelerometer""#));

        let back: InertialSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
        assert_eq!(back.timestamp_ms(), 1000);
    }

    #[test]
    fn test_location_fix_missing_speed() {
        let json = r#"{
            "latitude": 59.33,
            "longitude": 18.06,
            "speed": null,
            "altitude": 12.0,
            "bearing": 90.0,
            "accuracy": 5.0,
            "timestamp_ms": 1700000000000
        }"#;
        let fix: LocationFix = serde_json::from_str(json).unwrap();
        assert_eq!(fix.speed, None);
    }

    #[test]
    fn test_motion_event_kind_names() {
        assert_eq!(MotionEventKind::HarshBrake.as_str(), "harsh_brake");
        assert_eq!(MotionEventKind::SharpTurn.as_str(), "sharp_turn");
    }

    #[test]
    fn test_timestamp_utc_conversion() {
        let event = MotionEvent {
            kind: MotionEventKind::HarshBrake,
            magnitude: 7.0,
            timestamp_ms: 0,
        };
        let utc = event.timestamp_utc().unwrap();
        assert_eq!(utc.timestamp_millis(), 0);
    }
}
