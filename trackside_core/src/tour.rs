//! The tour sequencer.
//!
//! A tour walks a suffix of the [`TourTemplate`], driving to each stop in
//! turn. In auto-advance mode it dwells briefly at every stop and carries
//! on by itself; in single-step mode it pauses after every arrival until
//! [`continue_sequence`](NavigationController::continue_sequence) is called.
//!
//! # Phases
//!
//! ```text
//!   Resolving ──► Departing ──► Driving ──► (last stop) ──► finished
//!       │             ▲            │
//!       │             │            ├──► Dwelling ──┘ (auto-advance, 900 ms)
//!       ▼             │            │
//!    aborted          └── Paused ◄─┘ (single-step, waits for continue)
//! ```
//!
//! The tour lives entirely inside `tick()`: each phase is polled once per
//! frame against the context clock.

use crate::animator::{DriveId, DriveReport, DriveStart};
use crate::controller::NavigationController;
use crate::error::{DriveOutcome, NavError};
use crate::path::DriveOptions;
use crate::waypoint::{self, BoundedRetry, RetryPoll, RetryPolicy};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use trackside_env::{Control, SceneHost, ShowcaseContext, StatusSurface};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Ordered stop titles a tour can be started from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TourTemplate {
    stops: Vec<String>,
}

impl TourTemplate {
    pub fn new<I, T>(stops: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<String>,
    {
        Self {
            stops: stops.into_iter().map(Into::into).collect(),
        }
    }

    pub fn stops(&self) -> &[String] {
        &self.stops
    }

    /// The stops from `title` (case-insensitive) to the end of the template.
    pub fn suffix_from(&self, title: &str) -> Option<&[String]> {
        let wanted = title.to_lowercase();
        self.stops
            .iter()
            .position(|s| s.to_lowercase() == wanted)
            .map(|i| &self.stops[i..])
    }
}

impl Default for TourTemplate {
    fn default() -> Self {
        Self::new(["SKILLS", "EXPERIENCIA", "PROYECTO 1", "CONTACTO", "redes"])
    }
}

/// Tour tuning.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TourConfig {
    pub template: TourTemplate,

    /// Waypoint resolution retries at tour start
    pub retry: RetryPolicy,

    /// Pause at each stop before auto-advancing, in ms (default: 900)
    pub dwell_ms: u64,

    /// Drive duration used for every tour leg, in ms (default: 1600)
    pub stop_duration_ms: u64,
}

impl Default for TourConfig {
    fn default() -> Self {
        Self {
            template: TourTemplate::default(),
            retry: RetryPolicy::default(),
            dwell_ms: 900,
            stop_duration_ms: 1600,
        }
    }
}

/// How a tour should run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TourOptions {
    /// Carry on to the next stop without waiting for `continue_sequence`
    pub auto_advance: bool,

    /// Replace a running tour instead of refusing
    pub force_override: bool,
}

impl TourOptions {
    /// Auto-advancing tour (the "start tour" button).
    pub fn auto() -> Self {
        Self {
            auto_advance: true,
            force_override: false,
        }
    }

    /// Single-step tour (a timeline item).
    pub fn single_step() -> Self {
        Self {
            auto_advance: false,
            force_override: false,
        }
    }

    pub fn with_override(mut self) -> Self {
        self.force_override = true;
        self
    }
}

impl Default for TourOptions {
    fn default() -> Self {
        Self::auto()
    }
}

/// Result of a successful `start_tour` call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TourStart {
    /// Stops resolved; the first leg is under way or queued
    Started { stops: usize },
    /// Nothing resolved yet; retrying on later frames
    Resolving,
}

/// Observable tour transitions, queued until drained.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum TourEvent {
    Started { stops: Vec<String> },
    Departed { index: usize, stop: String },
    Arrived { index: usize, stop: String },
    Paused { index: usize },
    Finished,
    Aborted { reason: String },
    Canceled,
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug)]
pub(crate) enum TourPhase {
    Resolving { titles: Vec<String>, retry: BoundedRetry },
    Departing,
    Driving { drive: Option<DriveId> },
    Dwelling { until: Duration },
    Paused,
}

#[derive(Debug)]
pub(crate) struct TourSession {
    stops: Vec<(String, Vector3<f64>)>,
    /// Completed stops
    index: usize,
    auto_advance: bool,
    phase: TourPhase,
}

impl TourSession {
    fn current(&self) -> Option<&(String, Vector3<f64>)> {
        self.stops.get(self.index)
    }
}

/// Display name of a stop in status texts.
fn display_name(stop: &str) -> &str {
    if waypoint::is_hub(stop) {
        "social hub"
    } else {
        stop
    }
}

/// Resolves `titles`, dropping the unresolved ones. `None` if none resolve.
fn resolve_stops(waypoints: &[trackside_env::Waypoint], titles: &[String]) -> Option<Vec<(String, Vector3<f64>)>> {
    let stops: Vec<_> = titles
        .iter()
        .zip(waypoint::resolve_all(waypoints, titles))
        .filter_map(|(title, pos)| pos.map(|p| (title.clone(), p)))
        .collect();
    (!stops.is_empty()).then_some(stops)
}

// ============================================================================
// SEQUENCER
// ============================================================================

impl<Ctx: ShowcaseContext, S: SceneHost, U: StatusSurface> NavigationController<Ctx, S, U> {
    /// Starts a tour from `from` to the end of the template.
    ///
    /// # Arguments
    /// * `from` - Template title to start at (case-insensitive)
    /// * `opts` - Auto-advance and override flags
    ///
    /// # Returns
    /// * `Ok(TourStart)` - The tour owns `tour_running` now
    /// * `Err(NavError::TourRunning)` - A tour is running and no override was asked
    /// * `Err(NavError::UnknownStop)` - `from` is not in the template
    pub fn start_tour(&mut self, from: &str, opts: TourOptions) -> Result<TourStart, NavError> {
        if self.guard.is_touring() {
            if !opts.force_override {
                warn!(from, "a tour is already running, ignoring start");
                return Err(NavError::TourRunning);
            }
            info!(from, "replacing the running tour");
            self.cancel_drive();
        }

        let titles = self
            .config
            .tour
            .template
            .suffix_from(from)
            .map(<[String]>::to_vec)
            .ok_or_else(|| {
                warn!(from, "unknown tour start");
                NavError::UnknownStop(from.to_string())
            })?;

        self.guard.try_begin_tour()?;

        let now = self.ctx.now();
        let mut retry = self.config.tour.retry.start(now);
        let waypoints = self.scene.waypoints();
        match retry.poll(now, || resolve_stops(waypoints, &titles)) {
            RetryPoll::Ready(stops) => {
                let count = stops.len();
                self.tour = Some(TourSession {
                    stops,
                    index: 0,
                    auto_advance: opts.auto_advance,
                    phase: TourPhase::Departing,
                });
                self.on_tour_resolved();
                self.depart(now);
                Ok(TourStart::Started { stops: count })
            }
            RetryPoll::Pending => {
                debug!(?titles, "tour stops not in the scene yet, retrying");
                self.tour = Some(TourSession {
                    stops: Vec::new(),
                    index: 0,
                    auto_advance: opts.auto_advance,
                    phase: TourPhase::Resolving { titles, retry },
                });
                Ok(TourStart::Resolving)
            }
            RetryPoll::Exhausted => {
                let reason = NavError::UnresolvedWaypoint(titles.join(", "));
                self.abort_tour(&reason);
                Err(reason)
            }
        }
    }

    /// Departs a paused single-step tour toward its next stop.
    ///
    /// Returns false, leaving the tour untouched, when no tour is paused.
    pub fn continue_sequence(&mut self) -> bool {
        let paused = matches!(
            self.tour.as_ref().map(|t| &t.phase),
            Some(TourPhase::Paused)
        );
        if !paused {
            if self.tour.is_none() {
                self.ui.set_status("No more stops");
                self.ui.set_visible(Control::NextStop, false);
            } else {
                debug!("continue requested while the tour is not paused");
            }
            return false;
        }

        self.ui.set_visible(Control::NextStop, false);
        if let Some(tour) = self.tour.as_mut() {
            tour.phase = TourPhase::Departing;
        }
        let now = self.ctx.now();
        self.depart(now);
        true
    }

    /// Takes the queued tour events.
    pub fn drain_events(&mut self) -> Vec<TourEvent> {
        std::mem::take(&mut self.events)
    }

    /// True while a tour session exists.
    pub fn is_touring(&self) -> bool {
        self.tour.is_some()
    }

    /// Number of stops the running tour has completed.
    pub fn tour_index(&self) -> Option<usize> {
        self.tour.as_ref().map(|t| t.index)
    }

    /// Stops of the running tour, in driving order.
    pub fn tour_stops(&self) -> Vec<String> {
        self.tour
            .as_ref()
            .map(|t| t.stops.iter().map(|(s, _)| s.clone()).collect())
            .unwrap_or_default()
    }

    /// True while a single-step tour waits for `continue_sequence`.
    pub fn is_paused(&self) -> bool {
        matches!(self.tour.as_ref().map(|t| &t.phase), Some(TourPhase::Paused))
    }

    // ------------------------------------------------------------------------

    /// Polls the tour phase once per frame.
    pub(crate) fn advance_tour(&mut self, now: Duration, reports: &[DriveReport]) {
        let Some(tour) = self.tour.as_mut() else {
            return;
        };

        match &mut tour.phase {
            TourPhase::Resolving { titles, retry } => {
                let waypoints = self.scene.waypoints();
                match retry.poll(now, || resolve_stops(waypoints, titles)) {
                    RetryPoll::Ready(stops) => {
                        tour.stops = stops;
                        tour.phase = TourPhase::Departing;
                        self.on_tour_resolved();
                        self.depart(now);
                    }
                    RetryPoll::Pending => {}
                    RetryPoll::Exhausted => {
                        let reason = NavError::UnresolvedWaypoint(titles.join(", "));
                        self.abort_tour(&reason);
                    }
                }
            }
            TourPhase::Departing => self.depart(now),
            TourPhase::Driving { drive } => {
                let drive = *drive;
                let settled = reports
                    .iter()
                    .find(|r| Some(r.id) == drive)
                    .map(|r| r.outcome);
                match settled {
                    Some(DriveOutcome::Done) => self.arrive(now),
                    Some(outcome) => {
                        warn!(%outcome, "tour leg did not arrive, ending tour");
                        self.teardown_tour();
                    }
                    None => {}
                }
            }
            TourPhase::Dwelling { until } => {
                if now >= *until {
                    tour.phase = TourPhase::Departing;
                    self.depart(now);
                }
            }
            TourPhase::Paused => {}
        }
    }

    fn on_tour_resolved(&mut self) {
        let stops = self.tour_stops();
        info!(?stops, "tour started");
        self.ui.set_visible(Control::CancelTour, true);
        self.events.push(TourEvent::Started { stops });
    }

    /// Issues the drive for the current stop. A busy animator keeps the stop
    /// queued for the next frame.
    fn depart(&mut self, now: Duration) {
        if self.guard.is_driving() {
            debug!("animator busy, tour departure deferred");
            return;
        }
        let Some((stop, target)) = self.tour.as_ref().and_then(|t| t.current()).cloned() else {
            return;
        };
        let index = self.tour.as_ref().map(|t| t.index).unwrap_or(0);

        self.ui.clear_active();
        self.ui.set_active(&stop, true);
        self.ui.set_status(&format!("Driving to {}", display_name(&stop)));

        let opts = DriveOptions::default()
            .with_duration(Duration::from_millis(self.config.tour.stop_duration_ms))
            .with_label(stop.clone());

        match self.begin_drive(target, opts, None) {
            DriveStart::Started { id, .. } => {
                info!(%id, index, stop = %stop, "tour leg departed");
                if let Some(tour) = self.tour.as_mut() {
                    tour.phase = TourPhase::Driving { drive: Some(id) };
                }
                self.events.push(TourEvent::Departed { index, stop });
            }
            DriveStart::Settled(DriveOutcome::Done) => {
                // Reduced motion: the subject is already there
                self.events.push(TourEvent::Departed { index, stop });
                if let Some(tour) = self.tour.as_mut() {
                    tour.phase = TourPhase::Driving { drive: None };
                }
                self.arrive(now);
            }
            DriveStart::Settled(DriveOutcome::Busy) => {}
            DriveStart::Settled(_) => self.abort_tour(&NavError::NoSubject),
        }
    }

    fn arrive(&mut self, now: Duration) {
        let dwell = Duration::from_millis(self.config.tour.dwell_ms);
        let Some(tour) = self.tour.as_mut() else {
            return;
        };
        let Some((stop, _)) = tour.current().cloned() else {
            return;
        };
        tour.index += 1;
        let index = tour.index;
        let next = tour.current().map(|(s, _)| s.clone());
        let auto = tour.auto_advance;

        info!(index, stop = %stop, "tour stop reached");
        self.events.push(TourEvent::Arrived { index, stop: stop.clone() });

        let Some(next) = next else {
            self.finish_tour();
            return;
        };

        if auto {
            self.ui.set_status(&format!(
                "Arrived at {}. Next: {}.",
                display_name(&stop),
                display_name(&next)
            ));
            self.ui.set_active(&next, true);
            if let Some(tour) = self.tour.as_mut() {
                tour.phase = TourPhase::Dwelling {
                    until: now.saturating_add(dwell),
                };
            }
        } else {
            self.ui.set_status(&format!(
                "Arrived at {}. Press Continue for the next stop.",
                display_name(&stop)
            ));
            self.ui.clear_active();
            self.ui.set_active(&next, true);
            self.ui.set_visible(Control::NextStop, true);
            if let Some(tour) = self.tour.as_mut() {
                tour.phase = TourPhase::Paused;
            }
            self.events.push(TourEvent::Paused { index });
        }
    }

    fn finish_tour(&mut self) {
        info!("tour finished");
        self.tour = None;
        self.guard.end_tour();
        self.ui.set_status("Tour finished");
        self.ui.set_visible(Control::CancelTour, false);
        self.ui.set_visible(Control::NextStop, false);
        self.ui.clear_active();
        self.events.push(TourEvent::Finished);
    }

    /// Drops the tour session and its controls. Returns false when no tour
    /// was running.
    pub(crate) fn teardown_tour(&mut self) -> bool {
        if self.tour.take().is_none() {
            return false;
        }
        self.guard.end_tour();
        self.ui.set_visible(Control::CancelTour, false);
        self.ui.set_visible(Control::NextStop, false);
        self.ui.clear_active();
        self.events.push(TourEvent::Canceled);
        true
    }

    fn abort_tour(&mut self, reason: &NavError) {
        warn!(%reason, "tour aborted");
        self.tour = None;
        self.guard.end_tour();
        if matches!(reason, NavError::UnresolvedWaypoint(_)) {
            self.ui.set_status("Destination not available yet, try again in a moment.");
        }
        self.ui.set_visible(Control::CancelTour, false);
        self.ui.set_visible(Control::NextStop, false);
        self.events.push(TourEvent::Aborted {
            reason: reason.to_string(),
        });
    }
}
