//! Showcase configuration.
//!
//! Every section has a `Default` and deserializes with missing fields filled
//! from it, so a config file only needs the values it changes. Parsed
//! configs are validated before use: ranges must be ordered, tunables
//! finite, and every millisecond value at most [`MAX_CONFIG_MS`].

use crate::animator::{AnimatorConfig, MotionPreference};
use crate::camera::CameraConfig;
use crate::collectibles::CollectibleConfig;
use crate::error::NavError;
use crate::manual::ManualConfig;
use crate::path::PathConfig;
use crate::proximity;
use crate::tour::TourConfig;
use serde::{Deserialize, Serialize};

/// Upper bound for any millisecond value in a config (one hour).
pub const MAX_CONFIG_MS: u64 = 3_600_000;

/// Upper bound for tour resolution retries.
pub const MAX_RETRIES: u32 = 1000;

/// Top-level configuration of a [`NavigationController`](crate::NavigationController).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShowcaseConfig {
    pub path: PathConfig,
    pub camera: CameraConfig,
    pub manual: ManualConfig,
    pub animator: AnimatorConfig,
    pub tour: TourConfig,
    pub motion: MotionPreference,
    pub collectibles: CollectibleConfig,

    /// Radius of the proximity info panel (default: 30)
    pub info_radius: f64,
}

impl Default for ShowcaseConfig {
    fn default() -> Self {
        Self {
            path: PathConfig::default(),
            camera: CameraConfig::default(),
            manual: ManualConfig::default(),
            animator: AnimatorConfig::default(),
            tour: TourConfig::default(),
            motion: MotionPreference::default(),
            collectibles: CollectibleConfig::default(),
            info_radius: proximity::DEFAULT_RADIUS,
        }
    }
}

impl ShowcaseConfig {
    /// Parses and validates a JSON config document.
    pub fn from_json(json: &str) -> Result<Self, NavError> {
        let config: Self = serde_json::from_str(json).map_err(|e| NavError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks every section for values the controller cannot run with.
    pub fn validate(&self) -> Result<(), NavError> {
        let path = &self.path;
        ordered("path.min_duration_ms", path.min_duration_ms as f64, path.max_duration_ms as f64)?;
        millis("path.max_duration_ms", path.max_duration_ms)?;
        for (name, v) in [
            ("path.ms_per_unit", path.ms_per_unit),
            ("path.min_backoff", path.min_backoff),
            ("path.max_backoff", path.max_backoff),
            ("path.backoff_factor", path.backoff_factor),
            ("path.arc_factor", path.arc_factor),
            ("path.max_arc", path.max_arc),
            ("path.lift_factor", path.lift_factor),
            ("path.min_lift", path.min_lift),
        ] {
            non_negative(name, v)?;
        }
        ordered("path.min_backoff", path.min_backoff, path.max_backoff)?;
        if !(path.look_ahead > 0.0 && path.look_ahead <= 1.0) {
            return Err(invalid("path.look_ahead", "must be in (0, 1]"));
        }

        let cam = &self.camera;
        for (name, v) in [
            ("camera.chase_distance", cam.chase_distance),
            ("camera.chase_height", cam.chase_height),
            ("camera.chase_look_ahead", cam.chase_look_ahead),
            ("camera.drive_distance", cam.drive_distance),
            ("camera.drive_height", cam.drive_height),
            ("camera.look_height", cam.look_height),
            ("camera.snap_offset", cam.snap_offset[0]),
            ("camera.snap_offset", cam.snap_offset[1]),
            ("camera.snap_offset", cam.snap_offset[2]),
        ] {
            finite(name, v)?;
        }
        unit("camera.chase_blend", cam.chase_blend)?;
        unit("camera.drive_blend", cam.drive_blend)?;

        let manual = &self.manual;
        for (name, v) in [
            ("manual.turn_speed", manual.turn_speed),
            ("manual.steer_angle", manual.steer_angle),
            ("manual.kmh_factor", manual.kmh_factor),
        ] {
            finite(name, v)?;
        }
        non_negative("manual.acceleration", manual.acceleration)?;
        unit("manual.friction", manual.friction)?;
        positive("manual.max_speed", manual.max_speed)?;

        let anim = &self.animator;
        millis("animator.settle_ms", anim.settle_ms)?;
        finite("animator.settle_amplitude", anim.settle_amplitude)?;
        finite("animator.wheel_spin", anim.wheel_spin)?;
        unit("animator.min_spin_progress", anim.min_spin_progress)?;
        finite("animator.marker_offset", anim.marker_offset)?;

        let tour = &self.tour;
        millis("tour.dwell_ms", tour.dwell_ms)?;
        millis("tour.stop_duration_ms", tour.stop_duration_ms)?;
        millis("tour.retry.delay_ms", tour.retry.delay_ms)?;
        if tour.retry.max_retries > MAX_RETRIES {
            return Err(invalid("tour.retry.max_retries", &format!("must be at most {}", MAX_RETRIES)));
        }

        let pick = &self.collectibles;
        non_negative("collectibles.hit_radius", pick.hit_radius)?;
        for (name, v) in [
            ("collectibles.bob_height", pick.bob_height),
            ("collectibles.bob_rate", pick.bob_rate),
            ("collectibles.idle_spin", pick.idle_spin),
            ("collectibles.rise", pick.rise),
            ("collectibles.hit_spin", pick.hit_spin),
        ] {
            finite(name, v)?;
        }
        if !(pick.shrink >= 0.0 && pick.shrink < 1.0) {
            return Err(invalid("collectibles.shrink", "must be in [0, 1)"));
        }
        positive("collectibles.hide_below", pick.hide_below)?;

        non_negative("info_radius", self.info_radius)
    }

    /// Serializes the config to pretty JSON.
    pub fn to_json(&self) -> Result<String, NavError> {
        serde_json::to_string_pretty(self).map_err(|e| NavError::Config(e.to_string()))
    }

    /// Sets the motion preference.
    pub fn with_motion(mut self, motion: MotionPreference) -> Self {
        self.motion = motion;
        self
    }

    /// Sets the tour configuration.
    pub fn with_tour(mut self, tour: TourConfig) -> Self {
        self.tour = tour;
        self
    }
}

fn invalid(field: &str, why: &str) -> NavError {
    NavError::Config(format!("{} {}", field, why))
}

fn finite(field: &str, v: f64) -> Result<(), NavError> {
    if v.is_finite() {
        Ok(())
    } else {
        Err(invalid(field, "must be finite"))
    }
}

fn non_negative(field: &str, v: f64) -> Result<(), NavError> {
    finite(field, v)?;
    if v < 0.0 {
        return Err(invalid(field, "must not be negative"));
    }
    Ok(())
}

fn positive(field: &str, v: f64) -> Result<(), NavError> {
    finite(field, v)?;
    if v <= 0.0 {
        return Err(invalid(field, "must be positive"));
    }
    Ok(())
}

fn unit(field: &str, v: f64) -> Result<(), NavError> {
    if !(0.0..=1.0).contains(&v) {
        return Err(invalid(field, "must be in [0, 1]"));
    }
    Ok(())
}

fn ordered(field: &str, lo: f64, hi: f64) -> Result<(), NavError> {
    if lo > hi {
        return Err(invalid(field, "exceeds its upper bound"));
    }
    Ok(())
}

fn millis(field: &str, v: u64) -> Result<(), NavError> {
    if v > MAX_CONFIG_MS {
        return Err(invalid(field, &format!("must be at most {} ms", MAX_CONFIG_MS)));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_fills_defaults() {
        let cfg = ShowcaseConfig::from_json(r#"{ "path": { "max_duration_ms": 4000 }, "motion": { "prefers_reduced": true } }"#)
            .unwrap();

        assert_eq!(cfg.path.max_duration_ms, 4000);
        assert_eq!(cfg.path.min_duration_ms, 2400);
        assert!(cfg.motion.prefers_reduced);
        assert_eq!(cfg.tour, TourConfig::default());
        assert_eq!(cfg.info_radius, 30.0);
    }

    #[test]
    fn test_empty_object_is_default() {
        assert_eq!(ShowcaseConfig::from_json("{}").unwrap(), ShowcaseConfig::default());
    }

    #[test]
    fn test_malformed_json_is_config_error() {
        let err = ShowcaseConfig::from_json("{ path: ").unwrap_err();
        assert!(matches!(err, NavError::Config(_)));
    }

    fn rejected(json: &str) -> String {
        match ShowcaseConfig::from_json(json) {
            Err(NavError::Config(msg)) => msg,
            other => panic!("expected a config error, got {:?}", other),
        }
    }

    #[test]
    fn test_default_config_validates() {
        assert_eq!(ShowcaseConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_inverted_duration_range_is_rejected() {
        let msg = rejected(r#"{ "path": { "min_duration_ms": 5000, "max_duration_ms": 100 } }"#);
        assert!(msg.contains("path.min_duration_ms"));
    }

    #[test]
    fn test_inverted_backoff_range_is_rejected() {
        let msg = rejected(r#"{ "path": { "min_backoff": 20.0, "max_backoff": 1.0 } }"#);
        assert!(msg.contains("path.min_backoff"));
    }

    #[test]
    fn test_non_positive_max_speed_is_rejected() {
        assert!(rejected(r#"{ "manual": { "max_speed": -1.0 } }"#).contains("manual.max_speed"));
        assert!(rejected(r#"{ "manual": { "max_speed": 0.0 } }"#).contains("manual.max_speed"));
    }

    #[test]
    fn test_out_of_range_blend_and_look_ahead_are_rejected() {
        assert!(rejected(r#"{ "camera": { "drive_blend": 1.5 } }"#).contains("camera.drive_blend"));
        assert!(rejected(r#"{ "path": { "look_ahead": 0.0 } }"#).contains("path.look_ahead"));
    }

    #[test]
    fn test_huge_millisecond_values_are_rejected() {
        assert!(rejected(r#"{ "tour": { "dwell_ms": 18446744073709551615 } }"#).contains("tour.dwell_ms"));
        assert!(rejected(r#"{ "tour": { "retry": { "delay_ms": 18446744073709551615 } } }"#)
            .contains("tour.retry.delay_ms"));
        assert!(rejected(r#"{ "animator": { "settle_ms": 3600001 } }"#).contains("animator.settle_ms"));
        assert!(rejected(r#"{ "tour": { "retry": { "max_retries": 5000 } } }"#).contains("max_retries"));
    }

    #[test]
    fn test_non_finite_values_are_rejected() {
        let mut cfg = ShowcaseConfig::default();
        cfg.camera.chase_height = f64::NAN;
        assert!(matches!(cfg.validate(), Err(NavError::Config(m)) if m.contains("camera.chase_height")));

        let mut cfg = ShowcaseConfig::default();
        cfg.path.ms_per_unit = f64::INFINITY;
        assert!(matches!(cfg.validate(), Err(NavError::Config(m)) if m.contains("path.ms_per_unit")));

        let mut cfg = ShowcaseConfig::default();
        cfg.info_radius = f64::NAN;
        assert!(matches!(cfg.validate(), Err(NavError::Config(m)) if m.contains("info_radius")));
    }

    #[test]
    fn test_collectible_shrink_must_converge() {
        assert!(rejected(r#"{ "collectibles": { "shrink": 1.0 } }"#).contains("collectibles.shrink"));
        assert!(rejected(r#"{ "collectibles": { "hit_radius": -2.0 } }"#).contains("collectibles.hit_radius"));
    }
}
