//! Skill pickups.
//!
//! Labelled cubes placed on the road near the SKILLS billboard. While
//! waiting they bob and spin in place; the first frame the subject comes
//! within the hit radius the cube is collected, then lifts, spins faster
//! and shrinks every frame until it is small enough to hide.
//!
//! ```text
//!   Waiting ──(subject within hit_radius)──► Collected ──(scale < hide_below)──► Hidden
//! ```

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info};
use trackside_env::{PickupState, SceneHost};

/// Pickup tuning. Per-frame values assume the display rate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CollectibleConfig {
    /// Subject-to-cube distance that collects a cube (default: 3.5)
    pub hit_radius: f64,

    /// Bob amplitude around the resting height (default: 0.5)
    pub bob_height: f64,

    /// Bob phase per millisecond of clock time (default: 0.003)
    pub bob_rate: f64,

    /// Spin per frame while waiting (default: 0.02)
    pub idle_spin: f64,

    /// Lift per frame once collected (default: 0.5)
    pub rise: f64,

    /// Spin per frame once collected (default: 0.2)
    pub hit_spin: f64,

    /// Scale multiplier per frame once collected (default: 0.9)
    pub shrink: f64,

    /// Scale under which a collected cube is hidden (default: 0.05)
    pub hide_below: f64,
}

impl Default for CollectibleConfig {
    fn default() -> Self {
        Self {
            hit_radius: 3.5,
            bob_height: 0.5,
            bob_rate: 0.003,
            idle_spin: 0.02,
            rise: 0.5,
            hit_spin: 0.2,
            shrink: 0.9,
            hide_below: 0.05,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Waiting,
    Collected,
    Hidden,
}

#[derive(Debug, Clone)]
struct Tracked {
    label: String,
    rest: Vector3<f64>,
    state: PickupState,
    phase: Phase,
}

/// Every pickup the scene has placed, updated once per frame.
#[derive(Debug, Clone)]
pub struct CollectibleField {
    config: CollectibleConfig,
    pickups: Vec<Tracked>,
}

impl CollectibleField {
    pub fn new(config: CollectibleConfig) -> Self {
        Self {
            config,
            pickups: Vec::new(),
        }
    }

    /// Pickups seen so far.
    pub fn len(&self) -> usize {
        self.pickups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pickups.is_empty()
    }

    /// Labels of the collected pickups, in placement order.
    pub fn collected(&self) -> Vec<&str> {
        self.pickups
            .iter()
            .filter(|p| p.phase != Phase::Waiting)
            .map(|p| p.label.as_str())
            .collect()
    }

    /// Number of pickups still visible.
    pub fn visible(&self) -> usize {
        self.pickups.iter().filter(|p| p.state.visible).count()
    }

    /// Advances every pickup by one frame.
    ///
    /// Does nothing until the subject exists. Pickups the scene added since
    /// the last frame join the field first.
    ///
    /// # Returns
    /// Labels collected during this frame
    pub fn update<S: SceneHost>(&mut self, scene: &mut S, subject: Option<Vector3<f64>>, now: Duration) -> Vec<String> {
        let Some(subject) = subject else {
            return Vec::new();
        };

        for pickup in scene.pickups().iter().skip(self.pickups.len()) {
            debug!(label = %pickup.label, position = ?pickup.position, "pickup placed");
            self.pickups.push(Tracked {
                label: pickup.label.clone(),
                rest: pickup.position,
                state: PickupState {
                    position: pickup.position,
                    spin: 0.0,
                    scale: 1.0,
                    visible: true,
                },
                phase: Phase::Waiting,
            });
        }

        let cfg = &self.config;
        let bob = (now.as_secs_f64() * 1000.0 * cfg.bob_rate).sin() * cfg.bob_height;
        let mut picked = Vec::new();

        for (index, p) in self.pickups.iter_mut().enumerate() {
            match p.phase {
                Phase::Hidden => continue,
                Phase::Collected => {
                    p.state.position.y += cfg.rise;
                    p.state.spin += cfg.hit_spin;
                    p.state.scale *= cfg.shrink;
                    if p.state.scale < cfg.hide_below {
                        p.state.visible = false;
                        p.phase = Phase::Hidden;
                    }
                }
                Phase::Waiting => {
                    p.state.spin += cfg.idle_spin;
                    p.state.position.y = p.rest.y + bob;
                    if (subject - p.state.position).norm() < cfg.hit_radius {
                        info!(label = %p.label, "skill collected");
                        p.phase = Phase::Collected;
                        picked.push(p.label.clone());
                    }
                }
            }
            scene.update_pickup(index, p.state);
        }
        picked
    }
}
