//! Trackside Core - Guided Navigation Controller
//!
//! Drives a showcase car around a procedurally generated track:
//! 1. **Autopilot drives**: banked quadratic Bézier paths with eased timing,
//!    cooperative cancellation and a single in-flight drive at a time
//! 2. **Tours**: ordered multi-stop sequences, auto-advancing or single-step
//!    with explicit continue
//! 3. **Manual hand-off**: the keyboard integrator yields to the autopilot and
//!    picks up wherever the last drive left the car
//! 4. **Skill pickups**: cubes near the SKILLS billboard collected by
//!    driving through them
//!
//! Everything runs inside [`NavigationController::tick`], called once per
//! frame. Time comes from a [`ShowcaseContext`](trackside_env::ShowcaseContext),
//! so the same controller runs under tokio or in the deterministic
//! simulation harness.

pub mod animator;
pub mod camera;
pub mod collectibles;
pub mod config;
pub mod confetti;
pub mod controller;
pub mod error;
pub mod frame_loop;
pub mod guard;
pub mod manual;
pub mod path;
pub mod proximity;
pub mod tour;
pub mod waypoint;

#[cfg(test)]
pub(crate) mod testing;

// Re-export key types for convenience
pub use animator::{CancelToken, DriveHandle, DriveId, DriveReport, MotionPreference};
pub use collectibles::{CollectibleConfig, CollectibleField};
pub use config::ShowcaseConfig;
pub use controller::NavigationController;
pub use error::{DriveOutcome, NavError};
pub use frame_loop::{FrameLoop, LoopExit};
pub use path::{DriveOptions, PlannedPath};
pub use tour::{TourEvent, TourOptions, TourStart, TourTemplate};
pub use waypoint::RetryPolicy;
