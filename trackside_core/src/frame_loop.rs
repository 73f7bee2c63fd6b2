//! Async frame driver.
//!
//! Stands in for the engine's render callback: sleep one frame interval on
//! the context clock, then tick the controller. Under `TokioContext` this
//! runs in real time; under a virtual clock it runs as fast as the CPU
//! allows and stays deterministic.

use crate::controller::NavigationController;
use std::time::Duration;
use tracing::trace;
use trackside_env::{DriveControls, SceneHost, ShowcaseContext, StatusSurface};

/// Why a frame loop returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoopExit {
    /// The stop predicate held after `frames` ticks
    Completed { frames: u64 },
    /// The frame budget ran out first
    FrameLimit { frames: u64 },
}

impl LoopExit {
    pub fn frames(&self) -> u64 {
        match self {
            LoopExit::Completed { frames } | LoopExit::FrameLimit { frames } => *frames,
        }
    }

    pub fn completed(&self) -> bool {
        matches!(self, LoopExit::Completed { .. })
    }
}

/// Fixed-rate frame loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameLoop {
    interval: Duration,
    max_frames: u64,
}

impl FrameLoop {
    /// Creates a loop ticking at `fps` (at least 1) with no frame budget.
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            max_frames: u64::MAX,
        }
    }

    /// Caps the number of ticks per `run_until` call.
    pub fn with_max_frames(mut self, max_frames: u64) -> Self {
        self.max_frames = max_frames;
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks `nav` until `done` holds, feeding it `input` each frame.
    ///
    /// `done` is checked before every tick, so a predicate that already
    /// holds returns without ticking.
    pub async fn run_until<Ctx, S, U, I, D>(
        &self,
        nav: &mut NavigationController<Ctx, S, U>,
        mut input: I,
        mut done: D,
    ) -> LoopExit
    where
        Ctx: ShowcaseContext,
        S: SceneHost,
        U: StatusSurface,
        I: FnMut(&NavigationController<Ctx, S, U>) -> DriveControls,
        D: FnMut(&NavigationController<Ctx, S, U>) -> bool,
    {
        let ctx = nav.context().clone();
        let mut frames = 0;
        loop {
            if done(nav) {
                return LoopExit::Completed { frames };
            }
            if frames >= self.max_frames {
                return LoopExit::FrameLimit { frames };
            }
            ctx.sleep(self.interval).await;
            let controls = input(nav);
            nav.tick(controls);
            frames += 1;
            trace!(frames, now_ms = ctx.now().as_millis() as u64, "frame");
        }
    }
}

impl Default for FrameLoop {
    fn default() -> Self {
        Self::new(60)
    }
}
