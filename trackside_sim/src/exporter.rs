//! JSON exporter for offline inspection of a run.
//!
//! Exports sampled frames (subject, camera, markers, HUD) plus the tour
//! event log, so a run can be replayed or plotted outside the harness.

use crate::context::SimContext;
use crate::scene::{RecordingSurface, SimScene};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use trackside_core::{NavigationController, TourEvent};
use trackside_env::ShowcaseContext;

/// A single sampled frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimFrame {
    /// Simulation time in seconds
    pub time_sec: f64,

    /// Subject pose, absent until the car exists
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subject: Option<SubjectFrame>,

    /// Camera position and look-at target
    pub camera: [f64; 3],
    pub look_at: [f64; 3],

    /// Live marker positions
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub markers: Vec<[f64; 3]>,

    /// HUD status text
    pub status: String,

    pub driving: bool,

    /// Completed stops of the running tour
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tour_index: Option<usize>,

    /// Live confetti particles
    pub particles: usize,

    /// Skill pickups still visible
    #[serde(default)]
    pub pickups: usize,
}

/// Subject pose in a frame.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SubjectFrame {
    pub x: f64,
    pub y: f64,
    pub z: f64,
    pub heading: f64,
    pub scale: f64,
}

impl SimFrame {
    /// Samples the controller state.
    pub fn capture(nav: &NavigationController<SimContext, SimScene, RecordingSurface>) -> Self {
        let scene = nav.scene();
        let (camera, look_at) = scene.camera();
        Self {
            time_sec: nav.context().now().as_secs_f64(),
            subject: scene.subject().map(|p| SubjectFrame {
                x: p.position.x,
                y: p.position.y,
                z: p.position.z,
                heading: p.heading,
                scale: scene.scale(),
            }),
            camera: [camera.x, camera.y, camera.z],
            look_at: [look_at.x, look_at.y, look_at.z],
            markers: scene
                .markers()
                .values()
                .map(|m| [m.position.x, m.position.y, m.position.z])
                .collect(),
            status: nav.ui().status().to_string(),
            driving: nav.is_driving(),
            tour_index: nav.tour_index(),
            particles: nav.confetti().len(),
            pickups: nav.collectibles().visible(),
        }
    }
}

/// A tour event with the time it was drained.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedEvent {
    pub time_sec: f64,
    pub event: TourEvent,
}

/// Complete simulation export.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimExport {
    /// Scenario name
    pub scenario: String,

    /// Seed used
    pub seed: u64,

    /// Duration in seconds
    pub duration_sec: f64,

    /// Sampled frames
    pub frames: Vec<SimFrame>,

    /// Tour events in order
    pub events: Vec<TimedEvent>,

    /// Final results
    pub passed: bool,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure_reason: Option<String>,
}

impl SimExport {
    /// Creates a new export container.
    pub fn new(scenario: &str, seed: u64) -> Self {
        Self {
            scenario: scenario.to_string(),
            seed,
            duration_sec: 0.0,
            frames: Vec::new(),
            events: Vec::new(),
            passed: false,
            failure_reason: None,
        }
    }

    /// Adds a frame.
    pub fn add_frame(&mut self, frame: SimFrame) {
        self.duration_sec = frame.time_sec;
        self.frames.push(frame);
    }

    /// Adds tour events drained at `time_sec`.
    pub fn add_events(&mut self, time_sec: f64, events: &[TourEvent]) {
        self.events.extend(events.iter().cloned().map(|event| TimedEvent { time_sec, event }));
    }

    /// Finalizes the export.
    pub fn finalize(&mut self, passed: bool, failure_reason: Option<String>) {
        self.passed = passed;
        self.failure_reason = failure_reason;
    }

    /// Writes to a JSON file.
    pub fn write_to_file(&self, path: &str) -> std::io::Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        let mut file = File::create(path)?;
        file.write_all(json.as_bytes())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_tracks_duration_and_events() {
        let mut export = SimExport::new("grand_tour", 42);
        export.add_frame(SimFrame {
            time_sec: 1.5,
            subject: None,
            camera: [0.0; 3],
            look_at: [0.0; 3],
            markers: Vec::new(),
            status: String::new(),
            driving: false,
            tour_index: None,
            particles: 0,
            pickups: 0,
        });
        export.add_events(1.5, &[TourEvent::Finished]);
        export.finalize(true, None);

        assert_eq!(export.duration_sec, 1.5);
        assert_eq!(export.events.len(), 1);

        let json = serde_json::to_value(&export).unwrap();
        assert_eq!(json["scenario"], "grand_tour");
        assert!(json.get("failure_reason").is_none());
        assert!(json["frames"][0].get("subject").is_none());
    }
}
