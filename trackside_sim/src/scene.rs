//! In-memory scene and HUD for simulation runs.
//!
//! Both record what the navigation core asked of them so scenarios can make
//! assertions afterwards and the exporter can dump frames.

use nalgebra::Vector3;
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;
use trackside_env::{
    Control, EnvError, MarkerId, MarkerPulse, Pickup, PickupState, Pose, SceneHost, StatusSurface, Waypoint,
};

// ============================================================================
// SCENE
// ============================================================================

/// A live arrival marker.
#[derive(Debug, Clone, PartialEq)]
pub struct SimMarker {
    pub position: Vector3<f64>,
    pub pulse: Option<MarkerPulse>,
}

/// Recording scene.
#[derive(Debug, Clone, Default)]
pub struct SimScene {
    waypoints: Vec<Waypoint>,
    subject: Option<Pose>,
    scale: f64,
    wheel_spin: f64,
    steer: f64,
    camera: Vector3<f64>,
    look_at: Vector3<f64>,
    markers: BTreeMap<MarkerId, SimMarker>,
    next_marker: u64,
    markers_created: u64,
    fail_markers: bool,
    pose_writes: u64,
    max_height: f64,
    pickups: Vec<Pickup>,
    pickup_states: BTreeMap<usize, PickupState>,
}

impl SimScene {
    /// Creates a scene with the given waypoints and no subject.
    pub fn new(waypoints: Vec<Waypoint>) -> Self {
        Self {
            waypoints,
            scale: 1.0,
            camera: Vector3::new(0.0, 20.0, -30.0),
            ..Self::default()
        }
    }

    /// Places the subject (the car finished loading).
    pub fn with_subject(mut self, pose: Pose) -> Self {
        self.spawn_subject(pose);
        self
    }

    /// Makes every marker creation fail.
    pub fn with_failing_markers(mut self) -> Self {
        self.fail_markers = true;
        self
    }

    pub fn spawn_subject(&mut self, pose: Pose) {
        debug!(position = ?pose.position, "subject spawned");
        self.subject = Some(pose);
    }

    /// Places skill pickups on the road.
    pub fn with_pickups(mut self, pickups: Vec<Pickup>) -> Self {
        self.place_pickups(pickups);
        self
    }

    pub fn place_pickups(&mut self, pickups: Vec<Pickup>) {
        debug!(count = pickups.len(), "pickups placed");
        self.pickups.extend(pickups);
    }

    /// Latest transform of pickup `index`, once the core has touched it.
    pub fn pickup_state(&self, index: usize) -> Option<PickupState> {
        self.pickup_states.get(&index).copied()
    }

    /// Replaces the waypoint set (billboards finished building).
    pub fn populate(&mut self, waypoints: Vec<Waypoint>) {
        debug!(count = waypoints.len(), "waypoints populated");
        self.waypoints = waypoints;
    }

    pub fn subject(&self) -> Option<Pose> {
        self.subject
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn wheel_spin(&self) -> f64 {
        self.wheel_spin
    }

    pub fn steer(&self) -> f64 {
        self.steer
    }

    pub fn camera(&self) -> (Vector3<f64>, Vector3<f64>) {
        (self.camera, self.look_at)
    }

    pub fn markers(&self) -> &BTreeMap<MarkerId, SimMarker> {
        &self.markers
    }

    /// Markers created over the whole run.
    pub fn markers_created(&self) -> u64 {
        self.markers_created
    }

    pub fn pose_writes(&self) -> u64 {
        self.pose_writes
    }

    /// Highest subject elevation seen (drives arc above the ground).
    pub fn max_height(&self) -> f64 {
        self.max_height
    }
}

impl SceneHost for SimScene {
    fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    fn subject_pose(&self) -> Option<Pose> {
        self.subject
    }

    fn set_subject_pose(&mut self, pose: Pose) {
        self.max_height = self.max_height.max(pose.position.y);
        self.subject = Some(pose);
        self.pose_writes += 1;
    }

    fn set_subject_scale(&mut self, scale: f64) {
        self.scale = scale;
    }

    fn spin_wheels(&mut self, amount: f64) {
        self.wheel_spin += amount;
    }

    fn steer_wheels(&mut self, angle: f64) {
        self.steer = angle;
    }

    fn camera_position(&self) -> Vector3<f64> {
        self.camera
    }

    fn set_camera(&mut self, position: Vector3<f64>, look_at: Vector3<f64>) {
        self.camera = position;
        self.look_at = look_at;
    }

    fn add_marker(&mut self, position: Vector3<f64>) -> Result<MarkerId, EnvError> {
        if self.fail_markers {
            return Err(EnvError::marker("marker geometry unavailable"));
        }
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers_created += 1;
        self.markers.insert(id, SimMarker { position, pulse: None });
        Ok(id)
    }

    fn pulse_marker(&mut self, id: MarkerId, pulse: MarkerPulse) {
        if let Some(marker) = self.markers.get_mut(&id) {
            marker.pulse = Some(pulse);
        }
    }

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    fn update_pickup(&mut self, index: usize, state: PickupState) {
        if index < self.pickups.len() {
            self.pickup_states.insert(index, state);
        }
    }
}

// ============================================================================
// HUD
// ============================================================================

/// Recording HUD.
#[derive(Debug, Clone, Default)]
pub struct RecordingSurface {
    status: String,
    history: Vec<String>,
    visible: BTreeSet<String>,
    active: BTreeSet<String>,
    speed: u32,
    top_speed: u32,
    info: Option<(String, String)>,
    info_updates: u64,
}

fn control_name(control: Control) -> &'static str {
    match control {
        Control::CancelTour => "cancel_tour",
        Control::NextStop => "next_stop",
    }
}

impl RecordingSurface {
    pub fn new() -> Self {
        Self::default()
    }

    /// Latest status text.
    pub fn status(&self) -> &str {
        &self.status
    }

    /// Every status text in order.
    pub fn history(&self) -> &[String] {
        &self.history
    }

    pub fn is_visible(&self, control: Control) -> bool {
        self.visible.contains(control_name(control))
    }

    pub fn active(&self) -> &BTreeSet<String> {
        &self.active
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Highest speedometer reading of the run.
    pub fn top_speed(&self) -> u32 {
        self.top_speed
    }

    pub fn info(&self) -> Option<&(String, String)> {
        self.info.as_ref()
    }

    /// Number of times the info panel changed.
    pub fn info_updates(&self) -> u64 {
        self.info_updates
    }
}

impl StatusSurface for RecordingSurface {
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.history.push(text.to_string());
    }

    fn set_visible(&mut self, control: Control, visible: bool) {
        let name = control_name(control).to_string();
        if visible {
            self.visible.insert(name);
        } else {
            self.visible.remove(&name);
        }
    }

    fn set_active(&mut self, stop: &str, active: bool) {
        if active {
            self.active.insert(stop.to_string());
        } else {
            self.active.remove(stop);
        }
    }

    fn clear_active(&mut self) {
        self.active.clear();
    }

    fn set_speed(&mut self, kmh: u32) {
        self.speed = kmh;
        self.top_speed = self.top_speed.max(kmh);
    }

    fn show_info(&mut self, info: Option<(&str, &str)>) {
        self.info = info.map(|(t, d)| (t.to_string(), d.to_string()));
        self.info_updates += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_marker_lifecycle() {
        let mut scene = SimScene::new(Vec::new());
        let id = scene.add_marker(Vector3::new(1.0, 0.0, 0.0)).unwrap();
        scene.pulse_marker(
            id,
            MarkerPulse {
                scale: 1.0,
                ring_opacity: 0.1,
                head_offset: 0.0,
                glow: 0.6,
            },
        );
        assert!(scene.markers()[&id].pulse.is_some());

        scene.remove_marker(id);
        assert!(scene.markers().is_empty());
        assert_eq!(scene.markers_created(), 1);

        // Unknown ids are ignored
        scene.remove_marker(MarkerId(99));
    }

    #[test]
    fn test_failing_markers() {
        let mut scene = SimScene::new(Vec::new()).with_failing_markers();
        assert!(scene.add_marker(Vector3::zeros()).is_err());
        assert_eq!(scene.markers_created(), 0);
    }

    #[test]
    fn test_pose_writes_track_height() {
        let mut scene = SimScene::new(Vec::new()).with_subject(Pose::default());
        scene.set_subject_pose(Pose::new(Vector3::new(0.0, 7.5, 0.0), 0.0));
        scene.set_subject_pose(Pose::new(Vector3::new(0.0, 2.0, 0.0), 0.0));
        assert_eq!(scene.pose_writes(), 2);
        assert_eq!(scene.max_height(), 7.5);
    }

    #[test]
    fn test_pickup_updates_ignore_unknown_indices() {
        let mut scene = SimScene::new(Vec::new()).with_pickups(vec![Pickup::new("JS", 0xf7df1e, Vector3::zeros())]);
        let state = PickupState {
            position: Vector3::new(0.0, 2.0, 0.0),
            spin: 0.1,
            scale: 0.5,
            visible: true,
        };
        scene.update_pickup(0, state);
        scene.update_pickup(7, state);

        assert_eq!(scene.pickup_state(0), Some(state));
        assert_eq!(scene.pickup_state(7), None);
    }

    #[test]
    fn test_surface_records_history_and_controls() {
        let mut ui = RecordingSurface::new();
        ui.set_status("Driving...");
        ui.set_status("Destination reached");
        ui.set_visible(Control::CancelTour, true);
        ui.set_active("SKILLS", true);
        ui.set_speed(40);
        ui.set_speed(10);

        assert_eq!(ui.history(), ["Driving...", "Destination reached"]);
        assert!(ui.is_visible(Control::CancelTour));
        assert!(!ui.is_visible(Control::NextStop));
        assert!(ui.active().contains("SKILLS"));
        assert_eq!(ui.top_speed(), 40);

        ui.clear_active();
        assert!(ui.active().is_empty());
    }
}
