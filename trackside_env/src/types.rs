//! Common types shared between the navigation core and its collaborators.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

/// Pose of the drivable subject.
///
/// Heading follows the track convention: travelling forward moves the
/// subject by `(sin(heading), 0, cos(heading))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Pose {
    /// World position
    pub position: Vector3<f64>,

    /// Heading angle in radians
    pub heading: f64,
}

impl Pose {
    /// Creates a pose from a position and heading.
    pub fn new(position: Vector3<f64>, heading: f64) -> Self {
        Self { position, heading }
    }

    /// Unit forward vector on the ground plane.
    pub fn forward(&self) -> Vector3<f64> {
        Vector3::new(self.heading.sin(), 0.0, self.heading.cos())
    }
}

impl Default for Pose {
    fn default() -> Self {
        Self::new(Vector3::zeros(), 0.0)
    }
}

/// A named point of interest (billboard, social monolith, hub).
///
/// Produced by scene construction; the navigation core only reads them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Waypoint {
    /// Display title, used for resolution (not guaranteed unique)
    pub title: String,

    /// Short description shown on the info panel
    pub description: String,

    /// World position of the point of interest
    pub position: Vector3<f64>,
}

impl Waypoint {
    /// Creates a new waypoint.
    pub fn new(title: impl Into<String>, description: impl Into<String>, position: Vector3<f64>) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            position,
        }
    }
}

/// A skill pickup placed along the track.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pickup {
    /// Short label printed on the cube ("JS", "PY", ...)
    pub label: String,

    /// Cube color as 0xRRGGBB
    pub color: u32,

    /// Resting position of the cube center
    pub position: Vector3<f64>,
}

impl Pickup {
    pub fn new(label: impl Into<String>, color: u32, position: Vector3<f64>) -> Self {
        Self {
            label: label.into(),
            color,
            position,
        }
    }
}

/// Transform of a pickup for the current frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PickupState {
    pub position: Vector3<f64>,

    /// Rotation about the vertical axis (radians)
    pub spin: f64,

    /// Uniform scale
    pub scale: f64,

    pub visible: bool,
}

/// Boolean key/button states read by the manual integrator.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DriveControls {
    pub forward: bool,
    pub back: bool,
    pub left: bool,
    pub right: bool,
}

impl DriveControls {
    /// No keys pressed.
    pub fn idle() -> Self {
        Self::default()
    }

    /// Only the forward key pressed.
    pub fn accelerate() -> Self {
        Self {
            forward: true,
            ..Self::default()
        }
    }
}

/// Handle to a transient marker owned by the scene.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerId(pub u64);

impl std::fmt::Display for MarkerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "marker#{}", self.0)
    }
}

/// Cosmetic pulse parameters applied to an arrival marker each frame.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MarkerPulse {
    /// Uniform scale of the whole marker group
    pub scale: f64,

    /// Opacity of the ground ring
    pub ring_opacity: f64,

    /// Vertical bob of the marker head
    pub head_offset: f64,

    /// Emissive intensity of the marker head
    pub glow: f64,
}

/// UI affordances the tour sequencer shows and hides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Control {
    /// "Cancel tour" button
    CancelTour,

    /// "Continue to next stop" button
    NextStop,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pose_forward_follows_heading() {
        let pose = Pose::new(Vector3::zeros(), 0.0);
        assert_eq!(pose.forward(), Vector3::new(0.0, 0.0, 1.0));

        let pose = Pose::new(Vector3::zeros(), std::f64::consts::FRAC_PI_2);
        let fwd = pose.forward();
        assert!((fwd.x - 1.0).abs() < 1e-12);
        assert!(fwd.z.abs() < 1e-12);
    }

    #[test]
    fn test_marker_id_display() {
        assert_eq!(MarkerId(7).to_string(), "marker#7");
    }
}
