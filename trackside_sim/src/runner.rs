//! Scenario runner - executes navigation scenarios on the virtual clock.

use crate::context::SimContext;
use crate::exporter::{SimExport, SimFrame};
use crate::scenarios::ScenarioId;
use crate::scene::{RecordingSurface, SimScene};
use crate::track::TrackLayout;

use nalgebra::Vector3;
use rand::Rng;
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, info, warn};
use trackside_core::animator::MotionPreference;
use trackside_core::tour::TourConfig;
use trackside_core::waypoint;
use trackside_core::{
    DriveOptions, DriveOutcome, FrameLoop, NavError, NavigationController, ShowcaseConfig, TourEvent, TourOptions,
    TourStart, TourTemplate,
};
use trackside_env::{Control, DriveControls, SceneHost, ShowcaseContext};

/// Controller type every scenario runs.
pub type SimNav = NavigationController<SimContext, SimScene, RecordingSurface>;

/// Results from running a scenario.
#[derive(Debug, Clone)]
pub struct ScenarioResult {
    /// Scenario that was run
    pub scenario: ScenarioId,

    /// Seed used
    pub seed: u64,

    /// Whether scenario passed all assertions
    pub passed: bool,

    /// Total frames ticked
    pub total_frames: u64,

    /// Final simulation time in seconds
    pub final_time_secs: f64,

    /// First failed assertion, if any
    pub failure_reason: Option<String>,

    /// Metrics collected during run
    pub metrics: ScenarioMetrics,
}

/// Metrics collected during scenario execution.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ScenarioMetrics {
    /// Drives that arrived
    pub drives_done: u64,

    /// Drives that were canceled
    pub drives_canceled: u64,

    /// Drive requests rejected (busy or no subject)
    pub drives_rejected: u64,

    /// Tour stops reached
    pub tour_arrivals: u64,

    /// Arrival markers created
    pub markers_created: u64,

    /// Highest subject elevation (m)
    pub max_height: f64,

    /// Highest speedometer reading (km/h)
    pub top_speed_kmh: u32,

    /// Most confetti particles alive at once
    pub confetti_peak: usize,

    /// Status texts shown
    pub status_updates: usize,

    /// Skill pickups collected
    pub skills_collected: usize,
}

/// Runs navigation scenarios.
pub struct ScenarioRunner {
    /// Configuration seed
    seed: u64,

    /// Frame rate in Hz
    fps: u32,

    /// Maximum duration in seconds
    max_duration_secs: f64,

    /// Base controller configuration
    config: ShowcaseConfig,

    /// Export every Nth frame
    export_every: u64,
}

impl ScenarioRunner {
    /// Creates a new scenario runner.
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            fps: 60,
            max_duration_secs: 60.0,
            config: ShowcaseConfig::default(),
            export_every: 6,
        }
    }

    /// Sets the frame rate.
    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    /// Sets the maximum duration.
    pub fn with_duration(mut self, secs: f64) -> Self {
        self.max_duration_secs = secs;
        self
    }

    /// Sets the base controller configuration.
    pub fn with_config(mut self, config: ShowcaseConfig) -> Self {
        self.config = config;
        self
    }

    /// Samples one export frame every `n` frames.
    pub fn with_export_every(mut self, n: u64) -> Self {
        self.export_every = n.max(1);
        self
    }

    /// Runs a scenario and returns the result.
    pub async fn run(&self, scenario: ScenarioId) -> ScenarioResult {
        self.execute(scenario, false).await.0
    }

    /// Runs a scenario and also returns its frame export.
    pub async fn run_with_export(&self, scenario: ScenarioId) -> (ScenarioResult, SimExport) {
        let (result, export) = self.execute(scenario, true).await;
        let export = export.unwrap_or_else(|| SimExport::new(scenario.name(), self.seed));
        (result, export)
    }

    async fn execute(&self, scenario: ScenarioId, record: bool) -> (ScenarioResult, Option<SimExport>) {
        info!("Starting scenario: {} (seed={})", scenario.name(), self.seed);
        debug!("  {}", scenario.description());

        let harness = match scenario {
            ScenarioId::GrandTour => self.run_grand_tour(record).await,
            ScenarioId::StepThrough => self.run_step_through(record).await,
            ScenarioId::CancelMidDrive => self.run_cancel_mid_drive(record).await,
            ScenarioId::LateScene => self.run_late_scene(record).await,
            ScenarioId::ReducedMotion => self.run_reduced_motion(record).await,
            ScenarioId::BusyRejection => self.run_busy_rejection(record).await,
            ScenarioId::ManualHandoff => self.run_manual_handoff(record).await,
            ScenarioId::Unreachable => self.run_unreachable(record).await,
            ScenarioId::SkillPickups => self.run_skill_pickups(record).await,
        };
        harness.finish(scenario, self.seed)
    }

    fn harness(&self, scenario: ScenarioId, scene: SimScene, config: ShowcaseConfig, record: bool) -> Harness {
        let ctx = SimContext::shared(self.seed);
        let nav = NavigationController::new(ctx, scene, RecordingSurface::new(), config);
        let budget = (self.max_duration_secs * self.fps as f64) as u64;
        Harness {
            nav,
            frame_loop: FrameLoop::new(self.fps),
            budget,
            frames: 0,
            export: record.then(|| SimExport::new(scenario.name(), self.seed)),
            export_every: self.export_every,
            events: Vec::new(),
            metrics: ScenarioMetrics::default(),
            failure: None,
        }
    }

    fn standard_scene() -> SimScene {
        let track = TrackLayout::generate();
        SimScene::new(track.waypoints().to_vec())
            .with_pickups(track.pickups().to_vec())
            .with_subject(TrackLayout::spawn_pose())
    }

    /// Auto tour over the whole template.
    ///
    /// **Assertion**: every stop reached in template order, tour finished,
    /// no marker left behind, confetti fired.
    async fn run_grand_tour(&self, record: bool) -> Harness {
        let mut h = self.harness(ScenarioId::GrandTour, Self::standard_scene(), self.config.clone(), record);
        let expected = self.config.tour.template.stops().to_vec();

        let start = h.nav.start_tour("SKILLS", TourOptions::auto());
        h.check(matches!(start, Ok(TourStart::Started { .. })), || format!("tour did not start: {:?}", start));
        h.idle_until(|n| !n.is_touring()).await;

        let arrivals = h.arrivals();
        h.check(arrivals == expected, || format!("visited {:?}, expected {:?}", arrivals, expected));
        let status = h.nav.ui().status().to_string();
        h.check(status == "Tour finished", || format!("final status {:?}", status));
        let leftover = h.nav.scene().markers().len();
        h.check(leftover == 0, || format!("{} markers left behind", leftover));
        h.check(!h.nav.is_driving(), || "still driving after the tour".to_string());
        h.check(h.metrics.confetti_peak > 0, || "no arrival confetti".to_string());

        info!("✓ GrandTour complete: {} stops in {:.1}s", arrivals.len(), h.now_secs());
        h
    }

    /// Single-step tour with explicit continues.
    ///
    /// **Assertion**: paused with index 1, 2, 3 in turn, stays paused until
    /// continued, finishes after the fourth stop.
    async fn run_step_through(&self, record: bool) -> Harness {
        let mut h = self.harness(ScenarioId::StepThrough, Self::standard_scene(), self.config.clone(), record);

        let start = h.nav.start_tour("EXPERIENCIA", TourOptions::single_step());
        let stops = match start {
            Ok(TourStart::Started { stops }) => stops,
            other => {
                h.fail(format!("tour did not start: {:?}", other));
                return h;
            }
        };

        let mut expected = 1;
        while h.nav.is_touring() {
            if !h.idle_until(|n| n.is_paused() || !n.is_touring()).await || !h.nav.is_touring() {
                break;
            }
            let index = h.nav.tour_index();
            h.check(index == Some(expected), || format!("paused at {:?}, expected {}", index, expected));
            let next_visible = h.nav.ui().is_visible(Control::NextStop);
            h.check(next_visible, || "continue control hidden while paused".to_string());

            // Nobody presses continue for a while
            h.idle_for(Duration::from_millis(500)).await;
            let still = h.nav.is_paused() && h.nav.tour_index() == Some(expected);
            h.check(still, || "tour moved without continue".to_string());

            let continued = h.nav.continue_sequence();
            h.check(continued, || "continue refused while paused".to_string());
            expected += 1;
        }

        h.check(expected == stops, || format!("paused {} times over {} stops", expected - 1, stops));
        let arrivals = h.arrivals().len();
        h.check(arrivals == stops, || format!("{} of {} stops reached", arrivals, stops));
        h.check(!h.nav.is_paused(), || "paused after the tour ended".to_string());
        let continued = h.nav.continue_sequence();
        h.check(!continued, || "continue accepted with no tour".to_string());
        h
    }

    /// Cancel one second into a drive.
    ///
    /// **Assertion**: canceled outcome on the next frame, flags and marker
    /// cleared, and the next drive still arrives.
    async fn run_cancel_mid_drive(&self, record: bool) -> Harness {
        let mut h = self.harness(ScenarioId::CancelMidDrive, Self::standard_scene(), self.config.clone(), record);
        let Some(target) = h.resolve("CONTACTO") else {
            h.fail("CONTACTO not on the track".to_string());
            return h;
        };

        let mut handle = h.nav.drive_to(target, DriveOptions::default().with_label("CONTACTO"));
        h.idle_for(Duration::from_secs(1)).await;
        h.check(h.nav.is_driving(), || "drive ended before the cancel".to_string());
        let markers = h.nav.scene().markers().len();
        h.check(markers == 1, || format!("{} markers during the drive", markers));

        h.nav.cancel_drive();
        h.step_frames(1).await;

        let outcome = handle.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Canceled), || format!("outcome {:?}", outcome));
        h.check(!h.nav.is_driving(), || "driving flag stuck after cancel".to_string());
        h.check(h.nav.scene().markers().is_empty(), || "marker left after cancel".to_string());
        h.check(h.nav.confetti().is_empty(), || "confetti for a canceled drive".to_string());

        let Some(next) = h.resolve("SKILLS") else {
            h.fail("SKILLS not on the track".to_string());
            return h;
        };
        let mut again = h.nav.drive_to(next, DriveOptions::default());
        h.idle_until(|_| again.try_outcome().is_some()).await;
        let outcome = again.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Done), || format!("follow-up drive {:?}", outcome));
        h
    }

    /// Requests issued before the scene is ready.
    ///
    /// **Assertion**: a drive before the car exists is rejected, a tour
    /// started before the billboards exist waits and then runs.
    async fn run_late_scene(&self, record: bool) -> Harness {
        let config = self.config.clone().with_tour(TourConfig {
            template: TourTemplate::new(["SKILLS", "EXPERIENCIA", "PROYECTO 1", "CONTACTO"]),
            ..self.config.tour.clone()
        });
        let mut h = self.harness(ScenarioId::LateScene, SimScene::new(Vec::new()), config, record);

        let mut early = h.nav.drive_to(Vector3::zeros(), DriveOptions::default());
        let outcome = early.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::NoSubject), || format!("drive without car: {:?}", outcome));

        h.nav.scene_mut().spawn_subject(TrackLayout::spawn_pose());
        let start = h.nav.start_tour("SKILLS", TourOptions::auto());
        h.check(start == Ok(TourStart::Resolving), || format!("tour start {:?}", start));

        h.idle_for(Duration::from_secs(1)).await;
        h.check(h.nav.is_touring(), || "tour gave up too early".to_string());
        h.check(!h.nav.is_driving(), || "drove before the stops existed".to_string());

        h.nav.scene_mut().populate(TrackLayout::generate().waypoints().to_vec());
        h.idle_until(|n| !n.is_touring()).await;

        let arrivals = h.arrivals();
        h.check(arrivals.len() == 4, || format!("late tour reached {:?}", arrivals));
        h
    }

    /// Reduced motion.
    ///
    /// **Assertion**: drives settle in the call, exactly on target, with no
    /// arc, marker or drive frames.
    async fn run_reduced_motion(&self, record: bool) -> Harness {
        let config = self.config.clone().with_motion(MotionPreference {
            prefers_reduced: true,
            force_animate: false,
        });
        let mut h = self.harness(ScenarioId::ReducedMotion, Self::standard_scene(), config, record);
        let Some(target) = h.resolve("CONTACTO") else {
            h.fail("CONTACTO not on the track".to_string());
            return h;
        };

        let mut handle = h.nav.drive_to(target, DriveOptions::default());
        let outcome = handle.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Done), || format!("teleport outcome {:?}", outcome));
        let at = h.nav.scene().subject().map(|p| p.position);
        h.check(at == Some(target), || format!("subject at {:?}, target {:?}", at, target));

        let start = h.nav.start_tour("SKILLS", TourOptions::single_step());
        h.check(start.is_ok(), || format!("tour start {:?}", start));
        let mut continues = 0;
        while h.nav.is_paused() && continues < 10 {
            h.nav.continue_sequence();
            continues += 1;
        }
        h.step_frames(5).await;

        h.check(!h.nav.is_touring(), || "reduced-motion tour did not finish".to_string());
        let arrivals = h.arrivals().len();
        h.check(arrivals == 5, || format!("{} stops reached", arrivals));
        h.check(h.nav.scene().markers_created() == 0, || "marker created under reduced motion".to_string());
        h.check(h.nav.scene().max_height() == 0.0, || "subject left the ground".to_string());
        h
    }

    /// Overlapping requests.
    ///
    /// **Assertion**: the second drive is busy without touching the pose, a
    /// second tour is refused unless it overrides, and cancel clears all.
    async fn run_busy_rejection(&self, record: bool) -> Harness {
        let mut h = self.harness(ScenarioId::BusyRejection, Self::standard_scene(), self.config.clone(), record);
        let (Some(a), Some(b)) = (h.resolve("SKILLS"), h.resolve("CONTACTO")) else {
            h.fail("billboards missing".to_string());
            return h;
        };

        let mut first = h.nav.drive_to(a, DriveOptions::default());
        h.step_frames(10).await;

        let before = h.nav.scene().subject();
        let writes = h.nav.scene().pose_writes();
        let mut second = h.nav.drive_to(b, DriveOptions::default());
        let outcome = second.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Busy), || format!("overlapping drive {:?}", outcome));
        let untouched = h.nav.scene().subject() == before && h.nav.scene().pose_writes() == writes;
        h.check(untouched, || "busy request moved the subject".to_string());

        h.idle_until(|_| first.try_outcome().is_some()).await;
        let outcome = first.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Done), || format!("first drive {:?}", outcome));

        let mut third = h.nav.drive_to(b, DriveOptions::default());
        h.idle_until(|_| third.try_outcome().is_some()).await;
        let outcome = third.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Done), || format!("drive after release {:?}", outcome));

        let started = h.nav.start_tour("SKILLS", TourOptions::auto());
        h.check(started.is_ok(), || format!("tour start {:?}", started));
        let refused = h.nav.start_tour("CONTACTO", TourOptions::auto());
        h.check(refused == Err(NavError::TourRunning), || format!("second tour {:?}", refused));
        let first_stop = h.nav.tour_stops().first().cloned();
        h.check(first_stop.as_deref() == Some("SKILLS"), || "refused tour changed the session".to_string());

        let replaced = h.nav.start_tour("CONTACTO", TourOptions::single_step().with_override());
        h.check(replaced.is_ok(), || format!("override {:?}", replaced));
        let stops = h.nav.tour_stops();
        h.check(stops == ["CONTACTO", "redes"], || format!("override stops {:?}", stops));

        h.idle_until(|n| n.is_paused()).await;
        h.nav.cancel_drive();
        h.step_frames(1).await;

        h.check(!h.nav.is_touring(), || "tour survived cancel".to_string());
        h.check(!h.nav.guard().is_touring(), || "tour flag stuck".to_string());
        let cancels = h.events.iter().filter(|e| **e == TourEvent::Canceled).count();
        h.check(cancels == 2, || format!("{} tour cancellations", cancels));
        h
    }

    /// Keyboard, autopilot, keyboard.
    ///
    /// **Assertion**: manual input is ignored while driving, the drive runs
    /// without markers when the scene refuses them, and manual driving
    /// resumes from where the drive stopped.
    async fn run_manual_handoff(&self, record: bool) -> Harness {
        let scene = Self::standard_scene().with_failing_markers();
        let mut h = self.harness(ScenarioId::ManualHandoff, scene, self.config.clone(), record);
        let mut rng = h.nav.context().derive_rng(7);

        let until = h.nav.context().now() + Duration::from_secs(3);
        h.run_until(
            |_| DriveControls {
                forward: rng.gen_bool(0.8),
                back: rng.gen_bool(0.05),
                left: rng.gen_bool(0.3),
                right: rng.gen_bool(0.3),
            },
            |n| n.context().now() >= until,
        )
        .await;
        let top = h.nav.ui().top_speed();
        h.check(top > 0, || "keyboard never moved the car".to_string());

        let Some(target) = h.resolve("SKILLS") else {
            h.fail("SKILLS not on the track".to_string());
            return h;
        };
        let mut handle = h.nav.drive_to(target, DriveOptions::default());
        let mut entering_drive = false;
        let mut leaked = false;
        h.run_until(
            |n| {
                if entering_drive && n.ui().speed() != 0 {
                    leaked = true;
                }
                entering_drive = n.is_driving();
                DriveControls::accelerate()
            },
            |_| handle.try_outcome().is_some(),
        )
        .await;

        let outcome = handle.try_outcome();
        h.record(outcome);
        h.check(outcome == Some(DriveOutcome::Done), || format!("drive {:?}", outcome));
        h.check(!leaked, || "keyboard speed shown during the drive".to_string());
        h.check(h.nav.scene().markers_created() == 0, || "marker despite failing scene".to_string());

        let Some(stop) = h.nav.scene().subject().map(|p| p.position) else {
            h.fail("subject vanished".to_string());
            return h;
        };
        let until = h.nav.context().now() + Duration::from_secs(1);
        h.run_until(|_| DriveControls::accelerate(), |n| n.context().now() >= until)
            .await;
        let moved = h
            .nav
            .scene()
            .subject()
            .map(|p| (p.position - stop).norm())
            .unwrap_or_default();
        h.check(moved > 1.0 && moved < 80.0, || format!("moved {:.1} after hand-back", moved));
        h
    }

    /// Nothing ever resolves.
    ///
    /// **Assertion**: the tour aborts once the retry budget is spent, with
    /// no drive issued.
    async fn run_unreachable(&self, record: bool) -> Harness {
        let config = self.config.clone().with_tour(TourConfig {
            template: TourTemplate::new(["SKILLS", "EXPERIENCIA", "CONTACTO"]),
            ..self.config.tour.clone()
        });
        let scene = SimScene::new(Vec::new()).with_subject(TrackLayout::spawn_pose());
        let mut h = self.harness(ScenarioId::Unreachable, scene, config, record);
        let bound = h.nav.config().tour.retry.worst_case();

        let start = h.nav.start_tour("SKILLS", TourOptions::auto());
        h.check(start == Ok(TourStart::Resolving), || format!("tour start {:?}", start));
        h.idle_until(|n| !n.is_touring()).await;

        let elapsed = h.nav.context().now();
        let frame = h.frame_loop.interval();
        h.check(elapsed >= bound && elapsed <= bound + frame * 2, || {
            format!("gave up after {:?}, bound {:?}", elapsed, bound)
        });
        let status = h.nav.ui().status().to_string();
        h.check(status.starts_with("Destination not available"), || format!("status {:?}", status));
        h.check(h.nav.scene().markers_created() == 0, || "drive issued for an unresolved tour".to_string());
        let aborted = matches!(h.events.last(), Some(TourEvent::Aborted { .. }));
        h.check(aborted, || "no abort event".to_string());
        h
    }

    /// Skill pickups along the SKILLS stretch.
    ///
    /// **Assertion**: nothing is collected at spawn, landing on each pickup
    /// collects exactly that one, and every collected cube shrinks out.
    async fn run_skill_pickups(&self, record: bool) -> Harness {
        let config = self.config.clone().with_motion(MotionPreference {
            prefers_reduced: true,
            force_animate: false,
        });
        let mut h = self.harness(ScenarioId::SkillPickups, Self::standard_scene(), config, record);
        let pickups = h.nav.scene().pickups().to_vec();
        h.check(pickups.len() == 4, || format!("{} pickups on the track", pickups.len()));

        h.step_frames(1).await;
        let early = h.nav.collectibles().collected().len();
        h.check(early == 0, || format!("{} pickups collected at spawn", early));

        for (k, pickup) in pickups.iter().enumerate() {
            let target = Vector3::new(pickup.position.x, 0.0, pickup.position.z);
            let mut handle = h.nav.drive_to(target, DriveOptions::default());
            h.record(handle.try_outcome());
            h.step_frames(1).await;

            let collected = h.nav.collectibles().collected().len();
            h.check(collected == k + 1, || {
                format!("{} collected after landing on {}", collected, pickup.label)
            });
        }

        h.step_frames(40).await;
        let visible = h.nav.collectibles().visible();
        h.check(visible == 0, || format!("{} pickups still visible", visible));
        let hidden = (0..pickups.len()).all(|i| h.nav.scene().pickup_state(i).is_some_and(|s| !s.visible));
        h.check(hidden, || "scene still shows a collected pickup".to_string());
        h
    }
}

// ============================================================================
// HARNESS
// ============================================================================

struct Harness {
    nav: SimNav,
    frame_loop: FrameLoop,
    budget: u64,
    frames: u64,
    export: Option<SimExport>,
    export_every: u64,
    events: Vec<TourEvent>,
    metrics: ScenarioMetrics,
    failure: Option<String>,
}

impl Harness {
    /// Ticks until `done`, feeding `input`. False when the frame budget ran out.
    async fn run_until<I, D>(&mut self, mut input: I, done: D) -> bool
    where
        I: FnMut(&SimNav) -> DriveControls,
        D: FnMut(&SimNav) -> bool,
    {
        let frame_loop = self.frame_loop.with_max_frames(self.budget);
        let export = &mut self.export;
        let metrics = &mut self.metrics;
        let export_every = self.export_every;
        let mut counter = self.frames;

        let exit = frame_loop
            .run_until(
                &mut self.nav,
                |nav: &SimNav| {
                    metrics.confetti_peak = metrics.confetti_peak.max(nav.confetti().len());
                    if let Some(export) = export.as_mut() {
                        if counter % export_every == 0 {
                            export.add_frame(SimFrame::capture(nav));
                        }
                    }
                    counter += 1;
                    input(nav)
                },
                done,
            )
            .await;

        self.frames += exit.frames();
        self.budget = self.budget.saturating_sub(exit.frames());
        self.drain();
        if !exit.completed() {
            self.fail(format!("frame budget exhausted after {} frames", self.frames));
        }
        exit.completed()
    }

    async fn idle_until<D>(&mut self, done: D) -> bool
    where
        D: FnMut(&SimNav) -> bool,
    {
        self.run_until(|_| DriveControls::idle(), done).await
    }

    async fn idle_for(&mut self, duration: Duration) -> bool {
        let until = self.nav.context().now() + duration;
        self.idle_until(|n| n.context().now() >= until).await
    }

    async fn step_frames(&mut self, count: u64) -> bool {
        let mut seen = 0;
        self.idle_until(|_| {
            seen += 1;
            seen > count
        })
        .await
    }

    fn drain(&mut self) {
        let events = self.nav.drain_events();
        if events.is_empty() {
            return;
        }
        let now = self.now_secs();
        if let Some(export) = self.export.as_mut() {
            export.add_events(now, &events);
        }
        self.events.extend(events);
    }

    fn resolve(&self, title: &str) -> Option<Vector3<f64>> {
        waypoint::resolve(self.nav.scene().waypoints(), title)
    }

    fn arrivals(&self) -> Vec<String> {
        self.events
            .iter()
            .filter_map(|e| match e {
                TourEvent::Arrived { stop, .. } => Some(stop.clone()),
                _ => None,
            })
            .collect()
    }

    fn now_secs(&self) -> f64 {
        self.nav.context().now().as_secs_f64()
    }

    fn record(&mut self, outcome: Option<DriveOutcome>) {
        let Some(outcome) = outcome else {
            return;
        };
        if outcome.is_rejected() {
            self.metrics.drives_rejected += 1;
            return;
        }
        match outcome {
            DriveOutcome::Done => self.metrics.drives_done += 1,
            DriveOutcome::Canceled => self.metrics.drives_canceled += 1,
            _ => {}
        }
    }

    fn check(&mut self, condition: bool, reason: impl FnOnce() -> String) {
        if !condition {
            self.fail(reason());
        }
    }

    fn fail(&mut self, reason: String) {
        warn!("assertion failed: {}", reason);
        if self.failure.is_none() {
            self.failure = Some(reason);
        }
    }

    fn finish(mut self, scenario: ScenarioId, seed: u64) -> (ScenarioResult, Option<SimExport>) {
        self.drain();
        let scene = self.nav.scene();
        let ui = self.nav.ui();
        self.metrics.tour_arrivals = self.arrivals().len() as u64;
        self.metrics.markers_created = scene.markers_created();
        self.metrics.max_height = scene.max_height();
        self.metrics.top_speed_kmh = ui.top_speed();
        self.metrics.status_updates = ui.history().len();
        self.metrics.skills_collected = self.nav.collectibles().collected().len();

        let passed = self.failure.is_none();
        let final_time_secs = self.now_secs();
        if let Some(export) = self.export.as_mut() {
            export.add_frame(SimFrame::capture(&self.nav));
            export.finalize(passed, self.failure.clone());
        }

        let result = ScenarioResult {
            scenario,
            seed,
            passed,
            total_frames: self.frames,
            final_time_secs,
            failure_reason: self.failure,
            metrics: self.metrics,
        };
        (result, self.export)
    }
}
