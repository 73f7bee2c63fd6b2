//! The path planner: banked quadratic Bézier drives.
//!
//! A drive is a single quadratic Bézier from the subject's position to a
//! stop point short of the target. The control point sits above the
//! midpoint, pushed sideways, so the car swings out in an arc that keeps
//! the destination in frame instead of ploughing straight at it.
//!
//! ```text
//!                 control (lifted + lateral)
//!                    *
//!                  /   \
//!                /       \
//!   start  *               *  stop ---- backoff ---- target
//! ```
//!
//! Everything here is pure: no scene, no clock.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Tuning for the path planner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathConfig {
    /// Shortest derived drive duration in ms (default: 2400)
    pub min_duration_ms: u64,

    /// Longest derived drive duration in ms (default: 6000)
    pub max_duration_ms: u64,

    /// Derived duration per unit of straight-line distance (default: 70 ms)
    pub ms_per_unit: f64,

    /// Backoff clamp and scale: `clamp(distance * backoff_factor, min, max)`
    pub min_backoff: f64,
    pub max_backoff: f64,
    pub backoff_factor: f64,

    /// Lateral arc: `min(max_arc, distance * arc_factor)`
    pub arc_factor: f64,
    pub max_arc: f64,

    /// Control point elevation: `max(min_lift, distance * lift_factor)`
    pub lift_factor: f64,
    pub min_lift: f64,

    /// Parameter offset of the look-ahead sample used for heading
    pub look_ahead: f64,
}

impl Default for PathConfig {
    fn default() -> Self {
        Self {
            min_duration_ms: 2400,
            max_duration_ms: 6000,
            ms_per_unit: 70.0,
            min_backoff: 6.0,
            max_backoff: 14.0,
            backoff_factor: 0.14,
            arc_factor: 0.28,
            max_arc: 60.0,
            lift_factor: 0.14,
            min_lift: 6.0,
            look_ahead: 0.02,
        }
    }
}

/// Per-request overrides for a drive.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DriveOptions {
    /// Explicit animation duration
    pub duration: Option<Duration>,

    /// Explicit distance to stop short of the target
    pub stop_backoff: Option<f64>,

    /// Stop title; triggers arrival confetti when set
    pub stop_label: Option<String>,
}

impl DriveOptions {
    /// Sets an explicit duration.
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = Some(duration);
        self
    }

    /// Sets an explicit stop backoff.
    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.stop_backoff = Some(backoff);
        self
    }

    /// Labels the drive with a stop title.
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.stop_label = Some(label.into());
        self
    }
}

// ============================================================================
// PLANNING
// ============================================================================

/// A fully planned drive.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedPath {
    pub start: Vector3<f64>,
    pub control: Vector3<f64>,
    pub stop: Vector3<f64>,
    pub duration: Duration,
}

impl PlannedPath {
    /// Position on the curve at eased parameter `e`.
    pub fn point_at(&self, e: f64) -> Vector3<f64> {
        quad_bezier(&self.start, &self.control, &self.stop, e)
    }

    /// Heading at eased parameter `e`, from a look-ahead sample rather than
    /// a derivative of the (already eased) position signal.
    ///
    /// Falls back to `fallback` when the sample collapses onto the current
    /// point (end of curve, zero-length path).
    pub fn heading_at(&self, e: f64, look_ahead: f64, fallback: f64) -> f64 {
        let here = self.point_at(e);
        let ahead = self.point_at((e + look_ahead).min(1.0));
        let forward = ahead - here;
        let flat = Vector3::new(forward.x, 0.0, forward.z);
        if flat.norm_squared() < 1e-18 {
            return fallback;
        }
        forward.x.atan2(forward.z)
    }
}

/// Plans a curved drive from `start` toward `target`.
///
/// The stop position is pulled back along the start→target direction.
/// When start and target coincide the direction is zero and the stop lands
/// on the target itself.
pub fn plan(start: Vector3<f64>, target: Vector3<f64>, opts: &DriveOptions, cfg: &PathConfig) -> PlannedPath {
    let delta = target - start;
    let distance = delta.norm();

    let duration = opts.duration.unwrap_or_else(|| {
        // max/min rather than clamp: an inverted range must not panic
        let ms = (distance * cfg.ms_per_unit)
            .max(cfg.min_duration_ms as f64)
            .min(cfg.max_duration_ms as f64);
        Duration::from_millis(ms.round() as u64)
    });

    let backoff = opts
        .stop_backoff
        .unwrap_or_else(|| (distance * cfg.backoff_factor).max(cfg.min_backoff).min(cfg.max_backoff));
    let dir = delta.try_normalize(1e-9).unwrap_or_else(Vector3::zeros);
    let stop = target - dir * backoff;

    let mid = start.lerp(&target, 0.5);
    let lateral = Vector3::new(-delta.z, 0.0, delta.x)
        .try_normalize(1e-9)
        .unwrap_or_else(Vector3::zeros);
    let arc = (distance * cfg.arc_factor).min(cfg.max_arc);
    let mut control = mid + lateral * arc;
    control.y += (distance * cfg.lift_factor).max(cfg.min_lift);

    PlannedPath {
        start,
        control,
        stop,
        duration,
    }
}

// ============================================================================
// PURE CURVE MATH
// ============================================================================

/// Quadratic Bézier through `p0`, control `c`, `p1` at parameter `t`.
pub fn quad_bezier(p0: &Vector3<f64>, c: &Vector3<f64>, p1: &Vector3<f64>, t: f64) -> Vector3<f64> {
    let u = 1.0 - t;
    p0 * (u * u) + c * (2.0 * u * t) + p1 * (t * t)
}

/// Symmetric cubic ease: accelerate through the first half, decelerate
/// through the second.
pub fn ease_in_out_cubic(t: f64) -> f64 {
    if t < 0.5 {
        4.0 * t * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(3) / 2.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    fn v(x: f64, y: f64, z: f64) -> Vector3<f64> {
        Vector3::new(x, y, z)
    }

    #[test]
    fn test_ease_endpoints_and_midpoint() {
        assert_eq!(ease_in_out_cubic(0.0), 0.0);
        assert_eq!(ease_in_out_cubic(1.0), 1.0);
        assert_relative_eq!(ease_in_out_cubic(0.5), 0.5, epsilon = 1e-12);
        assert_relative_eq!(ease_in_out_cubic(0.25), 0.0625, epsilon = 1e-12);
    }

    #[test]
    fn test_bezier_endpoints_are_exact() {
        let p0 = v(80.0, 0.0, 10.0);
        let c = v(10.0, 20.0, -30.0);
        let p1 = v(-40.5, 0.0, 12.25);
        assert_eq!(quad_bezier(&p0, &c, &p1, 0.0), p0);
        assert_eq!(quad_bezier(&p0, &c, &p1, 1.0), p1);
    }

    #[test]
    fn test_plan_short_hop_uses_floors() {
        // 10 units: duration floors at 2400, backoff at 6, lift at 6
        let path = plan(v(0.0, 0.0, 0.0), v(10.0, 0.0, 0.0), &DriveOptions::default(), &PathConfig::default());

        assert_eq!(path.duration, Duration::from_millis(2400));
        assert_relative_eq!(path.stop.x, 4.0, epsilon = 1e-9);
        assert_relative_eq!(path.control.y, 6.0, epsilon = 1e-9);
        // Lateral of +x travel is +z, arc = 10 * 0.28
        assert_relative_eq!(path.control.z, 2.8, epsilon = 1e-9);
        assert_relative_eq!(path.control.x, 5.0, epsilon = 1e-9);
    }

    #[test]
    fn test_plan_long_drive_uses_caps() {
        let path = plan(v(0.0, 0.0, 0.0), v(0.0, 0.0, 300.0), &DriveOptions::default(), &PathConfig::default());

        assert_eq!(path.duration, Duration::from_millis(6000));
        assert_relative_eq!(path.stop.z, 286.0, epsilon = 1e-9);
        // lateral of +z travel is -x, arc capped at 60
        assert_relative_eq!(path.control.x, -60.0, epsilon = 1e-9);
        assert_relative_eq!(path.control.y, 42.0, epsilon = 1e-9);
    }

    #[test]
    fn test_plan_overrides() {
        let opts = DriveOptions::default()
            .with_duration(Duration::from_millis(1600))
            .with_backoff(0.0);
        let target = v(50.0, 0.0, -20.0);
        let path = plan(v(0.0, 0.0, 0.0), target, &opts, &PathConfig::default());

        assert_eq!(path.duration, Duration::from_millis(1600));
        assert_eq!(path.stop, target);
    }

    #[test]
    fn test_plan_zero_length_drive() {
        let p = v(3.0, 0.0, 4.0);
        let path = plan(p, p, &DriveOptions::default(), &PathConfig::default());

        assert_eq!(path.stop, p);
        assert!(path.control.iter().all(|c| c.is_finite()));
        assert_eq!(path.heading_at(1.0, 0.02, 1.25), 1.25);
    }

    #[test]
    fn test_heading_points_along_travel() {
        // Straight run along +x with no arc or lift
        let cfg = PathConfig {
            arc_factor: 0.0,
            min_lift: 0.0,
            lift_factor: 0.0,
            ..PathConfig::default()
        };
        let path = plan(v(0.0, 0.0, 0.0), v(100.0, 0.0, 0.0), &DriveOptions::default(), &cfg);
        assert_relative_eq!(path.heading_at(0.3, 0.02, 0.0), std::f64::consts::FRAC_PI_2, epsilon = 1e-9);
    }

    #[test]
    fn test_plan_inverted_ranges_do_not_panic() {
        let cfg = PathConfig {
            min_duration_ms: 6000,
            max_duration_ms: 2400,
            min_backoff: 14.0,
            max_backoff: 6.0,
            ..PathConfig::default()
        };
        let path = plan(v(0.0, 0.0, 0.0), v(40.0, 0.0, 0.0), &DriveOptions::default(), &cfg);

        // The upper bound wins when a range is inverted
        assert_eq!(path.duration, Duration::from_millis(2400));
        assert_relative_eq!(path.stop.x, 34.0, epsilon = 1e-9);
    }

    proptest! {
        #[test]
        fn prop_ease_is_monotonic_and_bounded(a in 0.0f64..=1.0, b in 0.0f64..=1.0) {
            let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
            let (el, eh) = (ease_in_out_cubic(lo), ease_in_out_cubic(hi));
            prop_assert!(el <= eh + 1e-12);
            prop_assert!((0.0..=1.0).contains(&el));
            prop_assert!((0.0..=1.0).contains(&eh));
        }

        #[test]
        fn prop_plan_respects_clamps(
            sx in -200.0f64..200.0, sz in -200.0f64..200.0,
            tx in -200.0f64..200.0, tz in -200.0f64..200.0,
        ) {
            let cfg = PathConfig::default();
            let start = v(sx, 0.0, sz);
            let target = v(tx, 0.0, tz);
            let path = plan(start, target, &DriveOptions::default(), &cfg);

            let ms = path.duration.as_millis() as u64;
            prop_assert!(ms >= cfg.min_duration_ms && ms <= cfg.max_duration_ms);

            let backoff = (target - path.stop).norm();
            let distance = (target - start).norm();
            if distance > 1e-6 {
                prop_assert!(backoff >= cfg.min_backoff - 1e-9 && backoff <= cfg.max_backoff + 1e-9);
            }
            prop_assert!(path.control.y >= cfg.min_lift - 1e-9);
        }
    }
}
