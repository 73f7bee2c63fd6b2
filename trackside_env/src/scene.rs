//! Collaborator abstractions for the renderer and the HUD.

use crate::error::EnvError;
use crate::types::{Control, MarkerId, MarkerPulse, Pickup, PickupState, Pose, Waypoint};
use nalgebra::Vector3;

/// Abstraction over the 3D scene the navigation core drives.
///
/// # Implementations
///
/// - **Production**: a thin adapter over the real-time engine's scene graph
/// - **Simulation**: `SimScene`, an in-memory recording scene
///
/// The core only issues commands and queries; it never owns the render
/// pipeline. All calls happen from the frame callback, so implementations
/// need no interior locking.
///
/// ```text
/// NavigationController             SceneHost
///   |-- waypoints() ------------------>|   (billboards, monoliths)
///   |-- set_subject_pose(pose) ------->|   (car group transform)
///   |-- set_camera(pos, look_at) ----->|
///   |-- add_marker(pos) -------------->|-- MarkerId
///   |-- pulse_marker(id, pulse) ------>|
///   |-- remove_marker(id) ------------>|
///   |-- update_pickup(i, state) ------>|   (skill cubes)
/// ```
pub trait SceneHost {
    /// Returns the live waypoint set. May be empty while the scene is still
    /// being constructed.
    fn waypoints(&self) -> &[Waypoint];

    /// Returns the subject pose, or `None` if the subject does not exist yet.
    fn subject_pose(&self) -> Option<Pose>;

    /// Moves and rotates the subject.
    fn set_subject_pose(&mut self, pose: Pose);

    /// Sets the subject's uniform scale (used by the settle pulse).
    fn set_subject_scale(&mut self, scale: f64);

    /// Advances the wheel spin by `amount` radians.
    fn spin_wheels(&mut self, amount: f64);

    /// Sets the steering angle of the front wheels.
    fn steer_wheels(&mut self, angle: f64);

    /// Returns the current camera position.
    fn camera_position(&self) -> Vector3<f64>;

    /// Moves the camera and orients it toward `look_at`.
    fn set_camera(&mut self, position: Vector3<f64>, look_at: Vector3<f64>);

    /// Adds a transient arrival marker at `position`.
    ///
    /// # Returns
    /// * `Ok(MarkerId)` - Marker created
    /// * `Err(EnvError)` - The renderer could not build the marker
    fn add_marker(&mut self, position: Vector3<f64>) -> Result<MarkerId, EnvError>;

    /// Applies a cosmetic pulse to a marker. Unknown ids are ignored.
    fn pulse_marker(&mut self, id: MarkerId, pulse: MarkerPulse);

    /// Removes a marker. Unknown ids are ignored.
    fn remove_marker(&mut self, id: MarkerId);

    /// Returns the skill pickups, in placement order. May grow while the
    /// scene is being constructed.
    fn pickups(&self) -> &[Pickup];

    /// Applies the frame transform of pickup `index`. Unknown indices are
    /// ignored.
    fn update_pickup(&mut self, index: usize, state: PickupState);
}

/// Abstraction over the HUD / overlay.
///
/// Purely observational from the core's perspective: no business logic
/// lives behind these calls.
pub trait StatusSurface {
    /// Sets the route announcement text.
    fn set_status(&mut self, text: &str);

    /// Shows or hides a control.
    fn set_visible(&mut self, control: Control, visible: bool);

    /// Marks the route button for `stop` as active/inactive.
    fn set_active(&mut self, stop: &str, active: bool);

    /// Marks every route button inactive.
    fn clear_active(&mut self);

    /// Updates the speedometer readout.
    fn set_speed(&mut self, kmh: u32);

    /// Shows the info panel with `(title, description)`, or hides it.
    fn show_info(&mut self, info: Option<(&str, &str)>);
}
