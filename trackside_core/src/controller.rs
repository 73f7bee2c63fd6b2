//! The navigation controller: the single context object a host drives.
//!
//! # Architecture
//!
//! ```text
//!   host frame callback
//!          │  tick(controls)
//!          ▼
//!   ┌──────────────────────── NavigationController ────────────────────────┐
//!   │  ManualDrive ──► DriveAnimator ──► Tour ──► Confetti ──► Info ──► Pickups │
//!   │       ▲               │  MotionGuard { driving, tour_running }          │
//!   └───────┼───────────────┼─────────────────────────────────────────────────┘
//!           │               ▼
//!      DriveControls   SceneHost / StatusSurface
//! ```
//!
//! Everything advances inside `tick()`, once per displayed frame. Nothing
//! blocks: drives, settle pulses, tour dwell and resolver retries are all
//! deadlines on the context clock checked at frame boundaries.

use crate::animator::{DriveAnimator, DriveHandle, DriveReport, DriveStart, MotionPreference};
use crate::camera;
use crate::collectibles::CollectibleField;
use crate::config::ShowcaseConfig;
use crate::confetti::ConfettiField;
use crate::error::DriveOutcome;
use crate::guard::MotionGuard;
use crate::manual::ManualDrive;
use crate::path::DriveOptions;
use crate::proximity::ProximityPanel;
use crate::tour::{TourEvent, TourSession};

use nalgebra::Vector3;
use std::sync::Arc;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use trackside_env::{Control, DriveControls, SceneHost, ShowcaseContext, StatusSurface};

pub(crate) const STATUS_DRIVING: &str = "Driving...";
pub(crate) const STATUS_REACHED: &str = "Destination reached";
pub(crate) const STATUS_CANCELED: &str = "Drive canceled";

/// Guided navigation controller.
///
/// Owns the guard flags, the drive animator, the tour session and the
/// cosmetic effects, plus the scene and HUD collaborators it commands.
///
/// # Type Parameters
///
/// * `Ctx` - Clock (`TokioContext` in production, `SimContext` in simulation)
/// * `S` - The 3D scene
/// * `U` - The HUD
pub struct NavigationController<Ctx: ShowcaseContext, S: SceneHost, U: StatusSurface> {
    pub(crate) ctx: Arc<Ctx>,
    pub(crate) scene: S,
    pub(crate) ui: U,
    pub(crate) config: ShowcaseConfig,
    pub(crate) guard: MotionGuard,
    pub(crate) animator: DriveAnimator,
    pub(crate) tour: Option<TourSession>,
    pub(crate) events: Vec<TourEvent>,
    manual: Option<ManualDrive>,
    confetti: ConfettiField,
    proximity: ProximityPanel,
    collectibles: CollectibleField,
    motion: MotionPreference,
    frames: u64,
}

impl<Ctx: ShowcaseContext, S: SceneHost, U: StatusSurface> NavigationController<Ctx, S, U> {
    /// Creates a controller over the given collaborators.
    ///
    /// # Arguments
    /// * `ctx` - Shared clock
    /// * `scene` - Scene the controller commands
    /// * `ui` - HUD the controller reports to
    /// * `config` - Tuning; `config.motion` seeds the motion preference
    pub fn new(ctx: Arc<Ctx>, scene: S, ui: U, config: ShowcaseConfig) -> Self {
        let animator = DriveAnimator::new(config.animator.clone(), config.path.clone(), config.camera.clone());
        let manual = scene
            .subject_pose()
            .map(|pose| ManualDrive::new(config.manual.clone(), pose));
        let confetti = ConfettiField::new(ctx.seed());
        let proximity = ProximityPanel::new(config.info_radius);
        let collectibles = CollectibleField::new(config.collectibles.clone());
        let motion = config.motion;

        Self {
            ctx,
            scene,
            ui,
            config,
            guard: MotionGuard::new(),
            animator,
            tour: None,
            events: Vec::new(),
            manual,
            confetti,
            proximity,
            collectibles,
            motion,
            frames: 0,
        }
    }

    // ========================================================================
    // DRIVES
    // ========================================================================

    /// Requests an autopilot drive toward `target`.
    ///
    /// The returned handle resolves to exactly one [`DriveOutcome`]:
    /// `NoSubject` or `Busy` immediately, `Done` immediately under reduced
    /// motion, otherwise `Done` or `Canceled` from a later `tick()`.
    pub fn drive_to(&mut self, target: Vector3<f64>, opts: DriveOptions) -> DriveHandle {
        let (tx, rx) = oneshot::channel();
        let start = self.begin_drive(target, opts, Some(tx));
        DriveHandle::new(&start, rx)
    }

    pub(crate) fn begin_drive(
        &mut self,
        target: Vector3<f64>,
        opts: DriveOptions,
        notify: Option<oneshot::Sender<DriveOutcome>>,
    ) -> DriveStart {
        let now = self.ctx.now();
        let start = self.animator.begin(
            &mut self.guard,
            &mut self.scene,
            target,
            opts,
            self.motion,
            now,
            notify,
        );

        match &start {
            DriveStart::Started { .. } => self.ui.set_status(STATUS_DRIVING),
            DriveStart::Settled(DriveOutcome::Done) => {
                // Teleported: the integrator continues from the new pose
                if let (Some(manual), Some(pose)) = (self.manual.as_mut(), self.scene.subject_pose()) {
                    manual.adopt(pose);
                }
                self.ui.set_status(STATUS_REACHED);
            }
            DriveStart::Settled(outcome) if outcome.is_rejected() => {
                warn!(%outcome, target = ?target, "drive request rejected")
            }
            DriveStart::Settled(outcome) => debug!(%outcome, "drive settled on request"),
        }
        start
    }

    /// Cancels the in-flight drive and tears down any tour.
    ///
    /// The drive itself settles as `Canceled` on the next frame; the tour
    /// state, controls and active stops are cleared right away. Returns
    /// true if a drive or a tour was interrupted.
    pub fn cancel_drive(&mut self) -> bool {
        let had_drive = self.animator.cancel();
        let had_tour = self.teardown_tour();
        if had_drive || had_tour {
            debug!(had_drive, had_tour, "cancel requested");
        }

        self.ui.set_visible(Control::CancelTour, false);
        self.ui.set_visible(Control::NextStop, false);
        self.ui.clear_active();
        self.ui.set_status(STATUS_CANCELED);
        had_drive || had_tour
    }

    // ========================================================================
    // FRAME
    // ========================================================================

    /// Advances everything by one frame.
    ///
    /// Order: manual integrator and chase camera (skipped while driving),
    /// drive animator, tour sequencer, confetti, info panel, skill pickups.
    ///
    /// # Returns
    /// Drives that settled during this frame
    pub fn tick(&mut self, controls: DriveControls) -> Vec<DriveReport> {
        let now = self.ctx.now();
        self.frames += 1;

        self.step_manual(&controls);

        let out = self.animator.frame(&mut self.guard, &mut self.scene, now);
        if let (Some(pose), Some(manual)) = (out.pose, self.manual.as_mut()) {
            manual.adopt(pose);
        }
        for report in &out.reports {
            self.on_drive_settled(report, now);
        }

        self.advance_tour(now, &out.reports);

        self.confetti.update(now);
        let position = self.scene.subject_pose().map(|p| p.position);
        self.proximity.update(self.scene.waypoints(), position, &mut self.ui);
        self.collectibles.update(&mut self.scene, position, now);

        out.reports
    }

    fn step_manual(&mut self, controls: &DriveControls) {
        if self.manual.is_none() {
            // The subject may appear after the controller was built
            if let Some(pose) = self.scene.subject_pose() {
                self.manual = Some(ManualDrive::new(self.config.manual.clone(), pose));
            }
        }
        let Some(manual) = self.manual.as_mut() else {
            return;
        };

        let step = manual.step(controls, self.guard.is_driving());
        if let Some(pose) = step.pose {
            self.scene.set_subject_pose(pose);
            self.scene.spin_wheels(step.wheel_spin);
            self.scene.steer_wheels(step.steer);
            camera::follow_manual(&mut self.scene, &self.config.camera, &pose);
        }
        self.ui.set_speed(step.speed_kmh);
    }

    fn on_drive_settled(&mut self, report: &DriveReport, now: std::time::Duration) {
        // A muted arrival was canceled during its settle pulse
        if report.outcome != DriveOutcome::Done || report.muted {
            return;
        }
        self.ui.set_status(STATUS_REACHED);
        if let Some(label) = &report.stop_label {
            let palette = self.confetti.palette_for(label);
            debug!(stop = %label, ?palette, "arrival confetti");
            self.confetti.burst(palette, now);
        }
    }

    // ========================================================================
    // ACCESSORS
    // ========================================================================

    /// Shared clock.
    pub fn context(&self) -> &Arc<Ctx> {
        &self.ctx
    }

    pub fn scene(&self) -> &S {
        &self.scene
    }

    /// Mutable scene access, for hosts that populate it after construction.
    pub fn scene_mut(&mut self) -> &mut S {
        &mut self.scene
    }

    pub fn ui(&self) -> &U {
        &self.ui
    }

    pub fn ui_mut(&mut self) -> &mut U {
        &mut self.ui
    }

    pub fn config(&self) -> &ShowcaseConfig {
        &self.config
    }

    pub fn guard(&self) -> &MotionGuard {
        &self.guard
    }

    /// True while the autopilot owns the subject.
    pub fn is_driving(&self) -> bool {
        self.guard.is_driving()
    }

    /// True while a drive is animating or still settling.
    pub fn is_drive_active(&self) -> bool {
        self.animator.is_busy()
    }

    pub fn confetti(&self) -> &ConfettiField {
        &self.confetti
    }

    /// Skill pickups seen so far and their collection state.
    pub fn collectibles(&self) -> &CollectibleField {
        &self.collectibles
    }

    pub fn motion_preference(&self) -> MotionPreference {
        self.motion
    }

    /// Changes the motion preference; takes effect on the next drive request.
    pub fn set_motion_preference(&mut self, motion: MotionPreference) {
        self.motion = motion;
    }

    /// Frames ticked so far.
    pub fn frames(&self) -> u64 {
        self.frames
    }
}
