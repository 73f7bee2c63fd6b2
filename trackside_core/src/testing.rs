//! In-crate test doubles: a hand-cranked clock, a recording scene and a
//! recording HUD.

use async_trait::async_trait;
use nalgebra::Vector3;
use std::collections::{BTreeMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;
use trackside_env::{
    Control, EnvError, MarkerId, MarkerPulse, Pickup, PickupState, Pose, SceneHost, ShowcaseContext, StatusSurface,
    Waypoint,
};

/// Clock that only moves when told to. `sleep` advances it instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Mutex<Duration>,
    seed: u64,
}

impl ManualClock {
    pub fn seeded(seed: u64) -> Self {
        Self {
            now: Mutex::new(Duration::ZERO),
            seed,
        }
    }

    pub fn advance(&self, by: Duration) {
        *self.now.lock().unwrap() += by;
    }

    pub fn set(&self, at: Duration) {
        *self.now.lock().unwrap() = at;
    }
}

#[async_trait]
impl ShowcaseContext for ManualClock {
    fn now(&self) -> Duration {
        *self.now.lock().unwrap()
    }

    async fn sleep(&self, duration: Duration) {
        self.advance(duration);
    }

    fn seed(&self) -> u64 {
        self.seed
    }
}

/// Scene that records every command.
#[derive(Debug, Default)]
pub struct TestScene {
    pub waypoints: Vec<Waypoint>,
    pub pose: Option<Pose>,
    pub pose_writes: usize,
    pub scale: f64,
    pub wheel_spin: f64,
    pub steer: f64,
    pub camera: Vector3<f64>,
    pub look_at: Vector3<f64>,
    pub markers: BTreeMap<MarkerId, Vector3<f64>>,
    pub fail_markers: bool,
    pub pickups: Vec<Pickup>,
    pub pickup_states: BTreeMap<usize, PickupState>,
    pub pickup_writes: usize,
    next_marker: u64,
}

impl TestScene {
    /// A scene whose subject rests at the grid, with no waypoints yet.
    pub fn with_subject() -> Self {
        Self {
            pose: Some(Pose::new(Vector3::new(80.0, 0.0, 0.0), 0.0)),
            scale: 1.0,
            camera: Vector3::new(0.0, 20.0, -30.0),
            ..Self::default()
        }
    }

    /// Adds the billboards used across the controller tests.
    pub fn with_boards(mut self) -> Self {
        self.waypoints = vec![
            Waypoint::new("SKILLS", "Rust, TypeScript", Vector3::new(-60.0, 0.0, 40.0)),
            Waypoint::new("EXPERIENCIA", "Five years shipping", Vector3::new(-20.0, 0.0, -70.0)),
            Waypoint::new("PROYECTO 1", "A racing game", Vector3::new(50.0, 0.0, -50.0)),
            Waypoint::new("CONTACTO", "Say hi", Vector3::new(70.0, 0.0, 45.0)),
        ];
        self
    }
}

impl SceneHost for TestScene {
    fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    fn subject_pose(&self) -> Option<Pose> {
        self.pose
    }

    fn set_subject_pose(&mut self, pose: Pose) {
        self.pose = Some(pose);
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
            return Err(EnvError::marker("test scene refuses markers"));
        }
        let id = MarkerId(self.next_marker);
        self.next_marker += 1;
        self.markers.insert(id, position);
        Ok(id)
    }

    fn pulse_marker(&mut self, _id: MarkerId, _pulse: MarkerPulse) {}

    fn remove_marker(&mut self, id: MarkerId) {
        self.markers.remove(&id);
    }

    fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    fn update_pickup(&mut self, index: usize, state: PickupState) {
        self.pickup_states.insert(index, state);
        self.pickup_writes += 1;
    }
}

/// HUD that records its latest state and the status history.
#[derive(Debug, Default)]
pub struct TestSurface {
    pub status: String,
    pub history: Vec<String>,
    pub visible: HashSet<Control>,
    pub active: HashSet<String>,
    pub speed: u32,
    pub info: Option<(String, String)>,
}

impl TestSurface {
    pub fn is_visible(&self, control: Control) -> bool {
        self.visible.contains(&control)
    }
}

impl StatusSurface for TestSurface {
    fn set_status(&mut self, text: &str) {
        self.status = text.to_string();
        self.history.push(text.to_string());
    }

    fn set_visible(&mut self, control: Control, visible: bool) {
        if visible {
            self.visible.insert(control);
        } else {
            self.visible.remove(&control);
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
    }

    fn show_info(&mut self, info: Option<(&str, &str)>) {
        self.info = info.map(|(t, d)| (t.to_string(), d.to_string()));
    }
}
