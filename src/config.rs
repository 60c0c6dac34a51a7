//! Processor configuration
//!
//! Thresholds and update preferences are explicit data passed at
//! construction, not compiled-in constants, so the processors stay testable
//! with arbitrary threshold sets. The defaults reproduce the production
//! tuning.

use serde::{Deserialize, Serialize};

/// Default location update interval (ms)
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 1000;

/// Default minimum displacement between reported fixes (m)
pub const DEFAULT_MIN_DISPLACEMENT_M: f32 = 5.0;

/// Configuration for the location stream processor.
///
/// Fixed at `start`; not mutable mid-stream. The interval and displacement
/// filter are forwarded to the fix source, which is responsible for honoring
/// them.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LocationConfig {
    /// Desired update interval in milliseconds
    pub update_interval_ms: u64,
    /// Minimum displacement in meters before a new fix is reported
    pub min_displacement_m: f32,
    /// Favor positional precision over delivery latency
    pub high_accuracy: bool,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            update_interval_ms: DEFAULT_UPDATE_INTERVAL_MS,
            min_displacement_m: DEFAULT_MIN_DISPLACEMENT_M,
            high_accuracy: true,
        }
    }
}

/// Configuration for the motion event classifier.
///
/// Accelerometer thresholds are in m/s², the gyroscope threshold in rad/s.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotionConfig {
    /// Forward-axis deceleration below this value is a harsh brake
    pub harsh_brake_threshold: f32,
    /// Forward-axis acceleration above this value is a rapid acceleration
    pub rapid_accel_threshold: f32,
    /// Absolute lateral acceleration above this value is a sharp turn
    pub sharp_turn_threshold: f32,
    /// Rotation-rate magnitude above this value is a sharp turn
    pub gyro_turn_threshold: f32,
    /// Minimum gap between accepted events of the same category (ms)
    pub event_cooldown_ms: i64,
}

impl Default for MotionConfig {
    fn default() -> Self {
        Self {
            harsh_brake_threshold: -6.0,
            rapid_accel_threshold: 4.0,
            sharp_turn_threshold: 5.0,
            gyro_turn_threshold: 2.5,
            event_cooldown_ms: 3000,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_location_defaults() {
        let config = LocationConfig::default();
        assert_eq!(config.update_interval_ms, 1000);
        assert_eq!(config.min_displacement_m, 5.0);
        assert!(config.high_accuracy);
    }

    #[test]
    fn test_motion_defaults() {
        let config = MotionConfig::default();
        assert_eq!(config.harsh_brake_threshold, -6.0);
        assert_eq!(config.rapid_accel_threshold, 4.0);
        assert_eq!(config.sharp_turn_threshold, 5.0);
        assert_eq!(config.gyro_turn_threshold, 2.5);
        assert_eq!(config.event_cooldown_ms, 3000);
    }

    #[test]
    fn test_config_serde_round_trip() {
        let config = MotionConfig {
            harsh_brake_threshold: -8.0,
            ..Default::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        let back: MotionConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back, config);
    }
}
