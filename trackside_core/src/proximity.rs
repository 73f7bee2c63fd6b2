//! Info panel for the nearest point of interest.

use nalgebra::Vector3;
use trackside_env::{StatusSurface, Waypoint};

/// Default radius inside which a waypoint's info is shown.
pub const DEFAULT_RADIUS: f64 = 30.0;

/// Returns the index of the waypoint nearest to `position` within `radius`.
pub fn nearest_within(waypoints: &[Waypoint], position: &Vector3<f64>, radius: f64) -> Option<usize> {
    waypoints
        .iter()
        .enumerate()
        .map(|(i, w)| (i, (w.position - position).norm()))
        .filter(|(_, d)| *d <= radius)
        .min_by(|a, b| a.1.total_cmp(&b.1))
        .map(|(i, _)| i)
}

/// Tracks what the info panel currently shows and pushes only changes.
#[derive(Debug, Clone, PartialEq)]
pub struct ProximityPanel {
    radius: f64,
    shown: Option<String>,
}

impl ProximityPanel {
    pub fn new(radius: f64) -> Self {
        Self { radius, shown: None }
    }

    /// Title currently on the panel.
    pub fn shown(&self) -> Option<&str> {
        self.shown.as_deref()
    }

    pub fn update<U: StatusSurface>(&mut self, waypoints: &[Waypoint], position: Option<Vector3<f64>>, ui: &mut U) {
        let nearest = position
            .and_then(|p| nearest_within(waypoints, &p, self.radius))
            .map(|i| &waypoints[i]);

        match nearest {
            Some(w) if self.shown.as_deref() != Some(w.title.as_str()) => {
                ui.show_info(Some((&w.title, &w.description)));
                self.shown = Some(w.title.clone());
            }
            None if self.shown.is_some() => {
                ui.show_info(None);
                self.shown = None;
            }
            _ => {}
        }
    }
}

impl Default for ProximityPanel {
    fn default() -> Self {
        Self::new(DEFAULT_RADIUS)
    }
}
