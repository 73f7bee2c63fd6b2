//! The drive animator: one cancellable autopilot drive at a time.
//!
//! # State Machine
//!
//! ```text
//!            begin()                 t == 1                 420 ms
//!   Idle ─────────────► Animating ─────────────► Settling ──────────► Done
//!     │                     │
//!     │ reduced motion      │ cancel token observed on next frame
//!     ▼                     ▼
//!   Done (teleport)      Canceled
//! ```
//!
//! `driving` is claimed on entry to Animating and released on leaving it,
//! either way. The settle pulse runs with `driving` already released so
//! manual control comes back without waiting for the cosmetic effect.

use crate::camera::{self, CameraConfig};
use crate::error::DriveOutcome;
use crate::guard::MotionGuard;
use crate::path::{self, DriveOptions, PathConfig, PlannedPath};

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::Duration;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use trackside_env::{MarkerId, MarkerPulse, Pose, SceneHost};

// ============================================================================
// CONFIGURATION
// ============================================================================

/// Accessibility preference, consulted once per drive request.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MotionPreference {
    /// The platform asks for reduced motion
    pub prefers_reduced: bool,

    /// The user explicitly asked to animate anyway
    pub force_animate: bool,
}

impl MotionPreference {
    /// True when drives should teleport instead of animating.
    pub fn reduce_motion(&self) -> bool {
        self.prefers_reduced && !self.force_animate
    }
}

/// Cosmetic tuning of a drive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimatorConfig {
    /// Settle pulse length in ms (default: 420)
    pub settle_ms: u64,

    /// Settle pulse scale amplitude (default: 0.04)
    pub settle_amplitude: f64,

    /// Wheel spin per frame at full progress (default: 1.4)
    pub wheel_spin: f64,

    /// Progress floor for wheel spin so wheels never stop mid-curve (default: 0.08)
    pub min_spin_progress: f64,

    /// Outward offset of the arrival marker from the hub axis (default: 1.2)
    pub marker_offset: f64,
}

impl Default for AnimatorConfig {
    fn default() -> Self {
        Self {
            settle_ms: 420,
            settle_amplitude: 0.04,
            wheel_spin: 1.4,
            min_spin_progress: 0.08,
            marker_offset: 1.2,
        }
    }
}

// ============================================================================
// HANDLES
// ============================================================================

/// Identifier of one drive request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct DriveId(pub u64);

impl std::fmt::Display for DriveId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "drive#{}", self.0)
    }
}

/// Cooperative cancellation token, checked once per frame.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Requests cancellation. Takes effect on the next frame.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_canceled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Caller-side handle of a drive request.
///
/// Resolves to exactly one [`DriveOutcome`]. Await it from async code or
/// poll `try_outcome()` from the frame loop.
#[derive(Debug)]
pub struct DriveHandle {
    id: Option<DriveId>,
    cancel: Option<CancelToken>,
    rx: oneshot::Receiver<DriveOutcome>,
    resolved: Option<DriveOutcome>,
}

impl DriveHandle {
    pub(crate) fn new(start: &DriveStart, rx: oneshot::Receiver<DriveOutcome>) -> Self {
        let (id, cancel) = match start {
            DriveStart::Started { id, cancel } => (Some(*id), Some(cancel.clone())),
            DriveStart::Settled(_) => (None, None),
        };
        Self {
            id,
            cancel,
            rx,
            resolved: None,
        }
    }

    /// Id of the animation, `None` when the request settled immediately.
    pub fn id(&self) -> Option<DriveId> {
        self.id
    }

    /// Cancels this drive. A no-op once it has settled.
    pub fn cancel(&self) {
        if let Some(token) = &self.cancel {
            token.cancel();
        }
    }

    /// Returns the outcome if the drive has settled.
    pub fn try_outcome(&mut self) -> Option<DriveOutcome> {
        if self.resolved.is_none() {
            match self.rx.try_recv() {
                Ok(outcome) => self.resolved = Some(outcome),
                Err(oneshot::error::TryRecvError::Closed) => self.resolved = Some(DriveOutcome::Canceled),
                Err(oneshot::error::TryRecvError::Empty) => {}
            }
        }
        self.resolved
    }
}

impl Future for DriveHandle {
    type Output = DriveOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<DriveOutcome> {
        let this = self.get_mut();
        if let Some(outcome) = this.resolved {
            return Poll::Ready(outcome);
        }
        match Pin::new(&mut this.rx).poll(cx) {
            Poll::Ready(result) => {
                // A dropped controller ends the drive like a cancellation.
                let outcome = result.unwrap_or(DriveOutcome::Canceled);
                this.resolved = Some(outcome);
                Poll::Ready(outcome)
            }
            Poll::Pending => Poll::Pending,
        }
    }
}

/// Result of asking the animator to begin a drive.
#[derive(Debug, Clone)]
pub enum DriveStart {
    /// Animating; the outcome arrives in a later frame's reports
    Started { id: DriveId, cancel: CancelToken },
    /// Settled without entering Animating
    Settled(DriveOutcome),
}

/// A drive that settled during a frame.
#[derive(Debug, Clone, PartialEq)]
pub struct DriveReport {
    pub id: DriveId,
    pub outcome: DriveOutcome,
    pub stop_label: Option<String>,

    /// Cancellation was requested; arrival feedback is suppressed
    pub muted: bool,
}

/// What the animator did during one frame.
#[derive(Debug, Clone, Default)]
pub struct FrameOutput {
    /// Pose written to the subject this frame, if any
    pub pose: Option<Pose>,

    /// Drives that settled this frame
    pub reports: Vec<DriveReport>,
}

// ============================================================================
// ANIMATOR
// ============================================================================

#[derive(Debug)]
struct DriveSession {
    id: DriveId,
    path: PlannedPath,
    started_at: Duration,
    cancel: CancelToken,
    marker: Option<MarkerId>,
    stop_label: Option<String>,
    heading: f64,
    notify: Option<oneshot::Sender<DriveOutcome>>,
}

impl DriveSession {
    fn settle(mut self, outcome: DriveOutcome) -> DriveReport {
        if let Some(tx) = self.notify.take() {
            // The caller may have dropped its handle
            let _ = tx.send(outcome);
        }
        DriveReport {
            id: self.id,
            outcome,
            stop_label: self.stop_label,
            muted: self.cancel.is_canceled(),
        }
    }
}

#[derive(Debug)]
struct Settling {
    session: DriveSession,
    since: Duration,
}

/// Owns the in-flight drive session and any settle pulses.
#[derive(Debug)]
pub struct DriveAnimator {
    config: AnimatorConfig,
    path_config: PathConfig,
    camera: CameraConfig,
    active: Option<DriveSession>,
    settling: Vec<Settling>,
    next_id: u64,
}

impl DriveAnimator {
    pub fn new(config: AnimatorConfig, path_config: PathConfig, camera: CameraConfig) -> Self {
        Self {
            config,
            path_config,
            camera,
            active: None,
            settling: Vec::new(),
            next_id: 0,
        }
    }

    /// True while a session is in the Animating state.
    pub fn is_animating(&self) -> bool {
        self.active.is_some()
    }

    /// True while a drive is animating or settling.
    pub fn is_busy(&self) -> bool {
        self.active.is_some() || !self.settling.is_empty()
    }

    /// Id of the animating drive.
    pub fn active_id(&self) -> Option<DriveId> {
        self.active.as_ref().map(|s| s.id)
    }

    /// The planned path of the animating drive.
    pub fn active_path(&self) -> Option<&PlannedPath> {
        self.active.as_ref().map(|s| &s.path)
    }

    /// Requests a drive toward `target`.
    ///
    /// Rejections and the reduced-motion teleport settle immediately; the
    /// outcome is also sent on `notify` so a handle resolves either way.
    #[allow(clippy::too_many_arguments)]
    pub fn begin<S: SceneHost>(
        &mut self,
        guard: &mut MotionGuard,
        scene: &mut S,
        target: Vector3<f64>,
        opts: DriveOptions,
        preference: MotionPreference,
        now: Duration,
        notify: Option<oneshot::Sender<DriveOutcome>>,
    ) -> DriveStart {
        let settled = |outcome: DriveOutcome, notify: Option<oneshot::Sender<DriveOutcome>>| {
            if let Some(tx) = notify {
                let _ = tx.send(outcome);
            }
            DriveStart::Settled(outcome)
        };

        let Some(subject) = scene.subject_pose() else {
            warn!("drive requested before the subject exists");
            return settled(DriveOutcome::NoSubject, notify);
        };

        if guard.is_driving() {
            debug!("drive requested while another is animating, returning busy");
            return settled(DriveOutcome::Busy, notify);
        }

        if preference.reduce_motion() {
            debug!(target = ?target, "reduced motion active, teleporting");
            scene.set_subject_pose(Pose::new(target, subject.heading));
            camera::snap_to(scene, &self.camera, &target);
            return settled(DriveOutcome::Done, notify);
        }

        if guard.try_begin_drive().is_err() {
            return settled(DriveOutcome::Busy, notify);
        }

        let path = path::plan(subject.position, target, &opts, &self.path_config);
        let marker = match scene.add_marker(self.marker_anchor(&path.stop)) {
            Ok(id) => Some(id),
            Err(e) => {
                warn!("drive continues without arrival marker: {}", e);
                None
            }
        };

        let id = DriveId(self.next_id);
        self.next_id += 1;
        let cancel = CancelToken::new();

        debug!(
            %id,
            start = ?path.start,
            stop = ?path.stop,
            control = ?path.control,
            duration_ms = path.duration.as_millis() as u64,
            "drive started"
        );

        self.active = Some(DriveSession {
            id,
            path,
            started_at: now,
            cancel: cancel.clone(),
            marker,
            stop_label: opts.stop_label,
            heading: subject.heading,
            notify,
        });

        DriveStart::Started { id, cancel }
    }

    /// Flags the animating drive and any settling ones for cancellation.
    ///
    /// Returns false when nothing is animating or settling. An animating
    /// drive settles as `Canceled` on the next frame. A settling drive has
    /// already arrived: its pulse plays out and it settles as a muted `Done`.
    pub fn cancel(&self) -> bool {
        let sessions = self.active.iter().chain(self.settling.iter().map(|s| &s.session));
        let mut flagged = false;
        for session in sessions {
            session.cancel.cancel();
            flagged = true;
        }
        flagged
    }

    /// Advances the animating drive and the settle pulses by one frame.
    pub fn frame<S: SceneHost>(&mut self, guard: &mut MotionGuard, scene: &mut S, now: Duration) -> FrameOutput {
        let mut out = FrameOutput::default();

        if let Some(mut session) = self.active.take() {
            if session.cancel.is_canceled() {
                if let Some(marker) = session.marker.take() {
                    scene.remove_marker(marker);
                }
                guard.end_drive();
                debug!(id = %session.id, "drive canceled");
                out.reports.push(session.settle(DriveOutcome::Canceled));
            } else {
                let (pose, t) = self.advance(&mut session, scene, now);
                out.pose = Some(pose);
                if t >= 1.0 {
                    // Hand back control before the cosmetic pulse
                    guard.end_drive();
                    self.settling.push(Settling { session, since: now });
                } else {
                    self.active = Some(session);
                }
            }
        }

        out.reports.extend(self.pulse_settling(scene, now));
        out
    }

    fn advance<S: SceneHost>(&self, session: &mut DriveSession, scene: &mut S, now: Duration) -> (Pose, f64) {
        let elapsed = now.saturating_sub(session.started_at);
        let t = if session.path.duration.is_zero() {
            1.0
        } else {
            (elapsed.as_secs_f64() / session.path.duration.as_secs_f64()).clamp(0.0, 1.0)
        };
        let e = path::ease_in_out_cubic(t);

        let p = session.path.point_at(e);
        let heading = session
            .path
            .heading_at(e, self.path_config.look_ahead, session.heading);
        session.heading = heading;

        let pose = Pose::new(p, heading);
        scene.set_subject_pose(pose);
        scene.spin_wheels(self.config.wheel_spin * e.max(self.config.min_spin_progress));
        camera::follow_drive(scene, &self.camera, &p, heading);

        if let Some(marker) = session.marker {
            scene.pulse_marker(marker, marker_pulse(elapsed, t));
        }

        (pose, t)
    }

    fn pulse_settling<S: SceneHost>(&mut self, scene: &mut S, now: Duration) -> Vec<DriveReport> {
        let settle = Duration::from_millis(self.config.settle_ms);
        let amplitude = self.config.settle_amplitude;
        let mut reports = Vec::new();

        let mut still = Vec::with_capacity(self.settling.len());
        for mut s in self.settling.drain(..) {
            let q = if settle.is_zero() {
                1.0
            } else {
                now.saturating_sub(s.since).as_secs_f64() / settle.as_secs_f64()
            };
            if q < 1.0 {
                scene.set_subject_scale(1.0 + (q * std::f64::consts::PI).sin() * amplitude);
                still.push(s);
            } else {
                scene.set_subject_scale(1.0);
                if let Some(marker) = s.session.marker.take() {
                    scene.remove_marker(marker);
                }
                debug!(
                    id = %s.session.id,
                    stop = ?s.session.path.stop,
                    muted = s.session.cancel.is_canceled(),
                    "drive arrived"
                );
                reports.push(s.session.settle(DriveOutcome::Done));
            }
        }
        self.settling = still;
        reports
    }

    /// Marker position: nudged outward so it does not sit inside the
    /// billboard posts or the hub monoliths.
    fn marker_anchor(&self, stop: &Vector3<f64>) -> Vector3<f64> {
        if stop.norm() > 0.1 {
            stop + stop.normalize() * self.config.marker_offset
        } else {
            *stop
        }
    }
}

/// Breathing pulse of the arrival marker.
pub fn marker_pulse(elapsed: Duration, t: f64) -> MarkerPulse {
    let ms = elapsed.as_secs_f64() * 1000.0;
    MarkerPulse {
        scale: 0.98 + 0.03 * (ms * 0.006).sin(),
        ring_opacity: 0.06 + 0.06 * (1.0 - (0.5 - t).abs()),
        head_offset: (ms * 0.005).sin() * 0.04,
        glow: 0.6 + 0.3 * (ms * 0.008).sin(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::TestScene;
    use approx::assert_relative_eq;

    const FRAME: Duration = Duration::from_millis(16);

    fn animator() -> DriveAnimator {
        DriveAnimator::new(AnimatorConfig::default(), PathConfig::default(), CameraConfig::default())
    }

    fn run_until_reports(
        anim: &mut DriveAnimator,
        guard: &mut MotionGuard,
        scene: &mut TestScene,
        now: &mut Duration,
    ) -> Vec<DriveReport> {
        for _ in 0..2000 {
            *now += FRAME;
            let out = anim.frame(guard, scene, *now);
            if !out.reports.is_empty() {
                return out.reports;
            }
        }
        panic!("drive never settled");
    }

    #[test]
    fn test_completed_drive_lands_on_stop() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let target = Vector3::new(-40.0, 0.0, 30.0);
        let mut now = Duration::ZERO;

        let start = anim.begin(&mut guard, &mut scene, target, DriveOptions::default(), MotionPreference::default(), now, None);
        assert!(matches!(start, DriveStart::Started { .. }));
        assert!(guard.is_driving());
        let stop = anim.active_path().unwrap().stop;
        assert_eq!(scene.markers.len(), 1);

        let reports = run_until_reports(&mut anim, &mut guard, &mut scene, &mut now);

        assert_eq!(reports.len(), 1);
        assert_eq!(reports[0].outcome, DriveOutcome::Done);
        assert!(!guard.is_driving());
        assert_relative_eq!(scene.pose.unwrap().position, stop, epsilon = 1e-9);
        assert!(scene.markers.is_empty());
        assert_eq!(scene.scale, 1.0);
    }

    #[test]
    fn test_driving_released_before_settle_pulse() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let opts = DriveOptions::default().with_duration(Duration::from_millis(160));

        anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), opts, MotionPreference::default(), Duration::ZERO, None);
        let out = anim.frame(&mut guard, &mut scene, Duration::from_millis(160));

        assert!(out.reports.is_empty());
        assert!(!guard.is_driving());
        assert!(anim.is_busy());
        assert!(!anim.is_animating());

        // Mid-pulse the subject is scaled up
        anim.frame(&mut guard, &mut scene, Duration::from_millis(370));
        assert!(scene.scale > 1.0);

        let out = anim.frame(&mut guard, &mut scene, Duration::from_millis(580));
        assert_eq!(out.reports[0].outcome, DriveOutcome::Done);
    }

    #[test]
    fn test_busy_leaves_pose_untouched() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, None);
        let before = scene.pose;
        let writes = scene.pose_writes;

        let second = anim.begin(&mut guard, &mut scene, Vector3::new(-30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, None);

        assert!(matches!(second, DriveStart::Settled(DriveOutcome::Busy)));
        assert_eq!(scene.pose, before);
        assert_eq!(scene.pose_writes, writes);
    }

    #[test]
    fn test_cancel_is_observed_next_frame() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, None);
        anim.frame(&mut guard, &mut scene, FRAME);

        assert!(anim.cancel());
        // Cooperative: still driving until the next frame runs
        assert!(guard.is_driving());

        let out = anim.frame(&mut guard, &mut scene, FRAME * 2);
        assert_eq!(out.reports[0].outcome, DriveOutcome::Canceled);
        assert!(out.pose.is_none());
        assert!(!guard.is_driving());
        assert!(scene.markers.is_empty());
        assert!(!anim.is_busy());
    }

    #[test]
    fn test_cancel_without_drive_is_noop() {
        let anim = animator();
        assert!(!anim.cancel());
    }

    #[test]
    fn test_cancel_during_settle_pulse_mutes_arrival() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let opts = DriveOptions::default()
            .with_duration(Duration::from_millis(160))
            .with_label("SKILLS");
        anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), opts, MotionPreference::default(), Duration::ZERO, None);
        anim.frame(&mut guard, &mut scene, Duration::from_millis(160));
        anim.frame(&mut guard, &mut scene, Duration::from_millis(300));
        assert!(scene.scale > 1.0);
        assert!(!anim.is_animating());

        assert!(anim.cancel());
        // The pulse is not interrupted
        let out = anim.frame(&mut guard, &mut scene, Duration::from_millis(316));
        assert!(out.reports.is_empty());
        assert!(scene.scale > 1.0);

        let out = anim.frame(&mut guard, &mut scene, Duration::from_millis(580));
        assert_eq!(out.reports.len(), 1);
        assert_eq!(out.reports[0].outcome, DriveOutcome::Done);
        assert!(out.reports[0].muted);
        assert_eq!(scene.scale, 1.0);
        assert!(scene.markers.is_empty());
        assert!(!anim.is_busy());
    }

    #[test]
    fn test_uncanceled_arrival_is_not_muted() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let mut now = Duration::ZERO;
        anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), now, None);

        let reports = run_until_reports(&mut anim, &mut guard, &mut scene, &mut now);
        assert!(!reports[0].muted);
    }

    #[test]
    fn test_reduced_motion_teleports() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let target = Vector3::new(12.0, 0.0, -7.0);
        let prefs = MotionPreference {
            prefers_reduced: true,
            force_animate: false,
        };

        let start = anim.begin(&mut guard, &mut scene, target, DriveOptions::default(), prefs, Duration::ZERO, None);

        assert!(matches!(start, DriveStart::Settled(DriveOutcome::Done)));
        assert_eq!(scene.pose.unwrap().position, target);
        assert!(!guard.is_driving());
        assert!(scene.markers.is_empty());
    }

    #[test]
    fn test_force_animate_overrides_preference() {
        let prefs = MotionPreference {
            prefers_reduced: true,
            force_animate: true,
        };
        assert!(!prefs.reduce_motion());
    }

    #[test]
    fn test_no_subject() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::default();
        let start = anim.begin(&mut guard, &mut scene, Vector3::zeros(), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, None);
        assert!(matches!(start, DriveStart::Settled(DriveOutcome::NoSubject)));
        assert!(!guard.is_driving());
    }

    #[test]
    fn test_marker_failure_does_not_block_drive() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        scene.fail_markers = true;

        let start = anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, None);
        assert!(matches!(start, DriveStart::Started { .. }));
        assert!(scene.markers.is_empty());
    }

    #[test]
    fn test_handle_resolves_from_notify() {
        let mut anim = animator();
        let mut guard = MotionGuard::new();
        let mut scene = TestScene::with_subject();
        let (tx, rx) = oneshot::channel();
        let start = anim.begin(&mut guard, &mut scene, Vector3::new(30.0, 0.0, 0.0), DriveOptions::default(), MotionPreference::default(), Duration::ZERO, Some(tx));
        let mut handle = DriveHandle::new(&start, rx);

        assert_eq!(handle.try_outcome(), None);
        handle.cancel();
        anim.frame(&mut guard, &mut scene, FRAME);
        assert_eq!(handle.try_outcome(), Some(DriveOutcome::Canceled));
        // Cached after the first read
        assert_eq!(handle.try_outcome(), Some(DriveOutcome::Canceled));
    }

    #[test]
    fn test_marker_pulse_ranges() {
        for ms in (0..5000).step_by(37) {
            let t = ms as f64 / 5000.0;
            let pulse = marker_pulse(Duration::from_millis(ms), t);
            assert!(pulse.scale >= 0.95 && pulse.scale <= 1.01 + 1e-12);
            assert!(pulse.ring_opacity >= 0.09 - 1e-12 && pulse.ring_opacity <= 0.12 + 1e-12);
            assert!(pulse.head_offset.abs() <= 0.04);
        }
    }
}
