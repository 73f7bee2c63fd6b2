//! Manual driving: a forward/friction/turn integrator.
//!
//! Not a vehicle dynamics model. Speed ramps with the throttle keys,
//! decays by a constant friction factor, and the heading only turns while
//! the car is actually moving.

use serde::{Deserialize, Serialize};
use trackside_env::{DriveControls, Pose};

/// Integrator tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ManualConfig {
    pub acceleration: f64,
    pub friction: f64,
    pub max_speed: f64,
    pub turn_speed: f64,
    /// Front wheel steering angle while a turn key is held
    pub steer_angle: f64,
    /// Speed to km/h factor for the speedometer
    pub kmh_factor: f64,
}

impl Default for ManualConfig {
    fn default() -> Self {
        Self {
            acceleration: 0.02,
            friction: 0.98,
            max_speed: 1.2,
            turn_speed: 0.04,
            steer_angle: 0.3,
            kmh_factor: 150.0,
        }
    }
}

/// What one manual step produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManualStep {
    /// New pose, `None` when the autopilot owns the subject
    pub pose: Option<Pose>,

    /// Wheel spin to apply this frame
    pub wheel_spin: f64,

    /// Front wheel steering angle
    pub steer: f64,

    /// Speedometer reading
    pub speed_kmh: u32,
}

/// Keyboard integrator state.
#[derive(Debug, Clone, PartialEq)]
pub struct ManualDrive {
    config: ManualConfig,
    pose: Pose,
    speed: f64,
}

impl ManualDrive {
    /// Creates an integrator at rest at `pose`.
    pub fn new(config: ManualConfig, pose: Pose) -> Self {
        Self {
            config,
            pose,
            speed: 0.0,
        }
    }

    /// Current integrator pose.
    pub fn pose(&self) -> Pose {
        self.pose
    }

    /// Current signed speed (units per frame).
    pub fn speed(&self) -> f64 {
        self.speed
    }

    /// Takes over a pose written by someone else (the autopilot), at rest.
    pub fn adopt(&mut self, pose: Pose) {
        self.pose = pose;
        self.speed = 0.0;
    }

    /// Integrates one frame.
    ///
    /// While `driving` is set the integrator writes nothing and reports zero
    /// speed: the autopilot owns the pose.
    pub fn step(&mut self, controls: &DriveControls, driving: bool) -> ManualStep {
        if driving {
            return ManualStep {
                pose: None,
                wheel_spin: 0.0,
                steer: 0.0,
                speed_kmh: 0,
            };
        }

        let cfg = &self.config;
        if controls.forward {
            self.speed += cfg.acceleration;
        }
        if controls.back {
            self.speed -= cfg.acceleration;
        }
        self.speed *= cfg.friction;
        // A non-positive cap pins the car instead of inverting the range
        let cap = cfg.max_speed.max(0.0);
        self.speed = self.speed.max(-cap / 2.0).min(cap);

        if self.speed.abs() > 0.01 {
            let dir = self.speed.signum();
            if controls.left {
                self.pose.heading += cfg.turn_speed * dir;
            }
            if controls.right {
                self.pose.heading -= cfg.turn_speed * dir;
            }
        }

        let fwd = self.pose.forward();
        self.pose.position.x += fwd.x * self.speed;
        self.pose.position.z += fwd.z * self.speed;
        self.pose.position.y = 0.0;

        let steer = match (controls.left, controls.right) {
            (true, false) => cfg.steer_angle,
            (false, true) => -cfg.steer_angle,
            _ => 0.0,
        };

        ManualStep {
            pose: Some(self.pose),
            wheel_spin: self.speed,
            steer,
            speed_kmh: (self.speed * cfg.kmh_factor).round().abs() as u32,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;

    fn car() -> ManualDrive {
        ManualDrive::new(ManualConfig::default(), Pose::new(Vector3::new(80.0, 0.0, 10.0), 0.0))
    }

    #[test]
    fn test_throttle_moves_forward() {
        let mut m = car();
        let step = m.step(&DriveControls::accelerate(), false);

        assert_relative_eq!(m.speed(), 0.02 * 0.98, epsilon = 1e-12);
        let pose = step.pose.unwrap();
        assert_relative_eq!(pose.position.z, 10.0 + 0.0196, epsilon = 1e-12);
        assert_eq!(step.speed_kmh, 3);
    }

    #[test]
    fn test_speed_caps() {
        let mut m = car();
        for _ in 0..1000 {
            m.step(&DriveControls::accelerate(), false);
        }
        assert!(m.speed() <= 1.2 + 1e-12);

        let back = DriveControls {
            back: true,
            ..DriveControls::default()
        };
        for _ in 0..2000 {
            m.step(&back, false);
        }
        assert!(m.speed() >= -0.6 - 1e-12);
    }

    #[test]
    fn test_no_turning_at_rest() {
        let mut m = car();
        let left = DriveControls {
            left: true,
            ..DriveControls::default()
        };
        let step = m.step(&left, false);
        assert_eq!(step.pose.unwrap().heading, 0.0);
        assert_eq!(step.steer, 0.3);
    }

    #[test]
    fn test_driving_flag_suspends_integration() {
        let mut m = car();
        let before = m.pose();
        let step = m.step(&DriveControls::accelerate(), true);

        assert!(step.pose.is_none());
        assert_eq!(step.speed_kmh, 0);
        assert_eq!(m.pose(), before);
        assert_eq!(m.speed(), 0.0);
    }

    #[test]
    fn test_adopt_resets_speed() {
        let mut m = car();
        for _ in 0..10 {
            m.step(&DriveControls::accelerate(), false);
        }
        let handed_back = Pose::new(Vector3::new(1.0, 2.0, 3.0), 1.0);
        m.adopt(handed_back);
        assert_eq!(m.pose(), handed_back);
        assert_eq!(m.speed(), 0.0);
    }

    #[test]
    fn test_negative_max_speed_pins_the_car() {
        let cfg = ManualConfig {
            max_speed: -1.0,
            ..ManualConfig::default()
        };
        let mut m = ManualDrive::new(cfg, Pose::new(Vector3::new(80.0, 0.0, 10.0), 0.0));
        let step = m.step(&DriveControls::accelerate(), false);

        assert_eq!(m.speed(), 0.0);
        assert_eq!(step.pose.unwrap().position, Vector3::new(80.0, 0.0, 10.0));
    }
}
