//! Camera follow rules.
//!
//! The camera is never snapped while moving: every frame it moves a fixed
//! fraction of the way toward its target, a first-order low-pass filter.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use trackside_env::{Pose, SceneHost};

/// Camera offsets and blend factors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraConfig {
    /// Manual chase: distance behind the subject (default: 18)
    pub chase_distance: f64,

    /// Manual chase: height above the subject (default: 9)
    pub chase_height: f64,

    /// Manual chase: per-frame blend (default: 0.1)
    pub chase_blend: f64,

    /// Manual chase: look-at distance ahead of the subject (default: 10)
    pub chase_look_ahead: f64,

    /// Autopilot: horizontal offset along the heading (default: 12)
    pub drive_distance: f64,

    /// Autopilot: height above the curve (default: 6)
    pub drive_height: f64,

    /// Autopilot: per-frame blend (default: 0.18)
    pub drive_blend: f64,

    /// Look-at height above the subject during drives and snaps (default: 2)
    pub look_height: f64,

    /// Reduced-motion snap offset from the target (default: 12, 6, 18)
    pub snap_offset: [f64; 3],
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            chase_distance: 18.0,
            chase_height: 9.0,
            chase_blend: 0.1,
            chase_look_ahead: 10.0,
            drive_distance: 12.0,
            drive_height: 6.0,
            drive_blend: 0.18,
            look_height: 2.0,
            snap_offset: [12.0, 6.0, 18.0],
        }
    }
}

/// Moves `current` a fraction `blend` of the way toward `target`.
pub fn smooth_toward(current: &Vector3<f64>, target: &Vector3<f64>, blend: f64) -> Vector3<f64> {
    current.lerp(target, blend)
}

/// Chase camera for manual driving.
pub fn follow_manual<S: SceneHost>(scene: &mut S, cfg: &CameraConfig, pose: &Pose) {
    let fwd = pose.forward();
    let p = pose.position;
    let target = p - fwd * cfg.chase_distance + Vector3::new(0.0, cfg.chase_height, 0.0);
    let position = smooth_toward(&scene.camera_position(), &target, cfg.chase_blend);
    let look_at = p + fwd * cfg.chase_look_ahead;
    scene.set_camera(position, look_at);
}

/// Cinematic camera while the autopilot owns the subject.
pub fn follow_drive<S: SceneHost>(scene: &mut S, cfg: &CameraConfig, p: &Vector3<f64>, heading: f64) {
    let offset = Vector3::new(
        heading.sin() * cfg.drive_distance,
        cfg.drive_height,
        heading.cos() * cfg.drive_distance,
    );
    let position = smooth_toward(&scene.camera_position(), &(p + offset), cfg.drive_blend);
    scene.set_camera(position, p + Vector3::new(0.0, cfg.look_height, 0.0));
}

/// Snaps the camera next to `target` (reduced motion).
pub fn snap_to<S: SceneHost>(scene: &mut S, cfg: &CameraConfig, target: &Vector3<f64>) {
    let [ox, oy, oz] = cfg.snap_offset;
    let position = Vector3::new(target.x + ox, oy, target.z + oz);
    scene.set_camera(position, target + Vector3::new(0.0, cfg.look_height, 0.0));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestScene;
    use approx::assert_relative_eq;

    #[test]
    fn test_smooth_is_first_order() {
        let mut cam = Vector3::zeros();
        let target = Vector3::new(10.0, 0.0, 0.0);
        cam = smooth_toward(&cam, &target, 0.18);
        assert_relative_eq!(cam.x, 1.8, epsilon = 1e-12);
        cam = smooth_toward(&cam, &target, 0.18);
        assert_relative_eq!(cam.x, 1.8 + 8.2 * 0.18, epsilon = 1e-12);
    }

    #[test]
    fn test_snap_offsets_target() {
        let mut scene = TestScene::with_subject();
        snap_to(&mut scene, &CameraConfig::default(), &Vector3::new(5.0, 0.0, -5.0));
        assert_eq!(scene.camera, Vector3::new(17.0, 6.0, 13.0));
        assert_eq!(scene.look_at, Vector3::new(5.0, 2.0, -5.0));
    }

    #[test]
    fn test_manual_chase_sits_behind_subject() {
        let mut scene = TestScene::with_subject();
        let cfg = CameraConfig {
            chase_blend: 1.0,
            ..CameraConfig::default()
        };
        follow_manual(&mut scene, &cfg, &Pose::new(Vector3::zeros(), 0.0));
        assert_relative_eq!(scene.camera.z, -18.0, epsilon = 1e-12);
        assert_relative_eq!(scene.camera.y, 9.0, epsilon = 1e-12);
        assert_relative_eq!(scene.look_at.z, 10.0, epsilon = 1e-12);
    }
}
