//! Trackside Environment Abstraction Layer
//!
//! This crate provides the "Sans-IO" abstraction allowing the Trackside
//! navigation core to run against a real-time engine **or** inside the
//! deterministic simulation harness.
//!
//! # Core Concept: The Reactor Pattern
//!
//! The navigation core never touches the outside world directly:
//! - Time (`now()`, `sleep()`) goes through [`ShowcaseContext`]
//! - The 3D scene (subject, camera, markers) goes through [`SceneHost`]
//! - The HUD (status text, buttons, speedometer) goes through [`StatusSurface`]
//!
//! Swapping these three collaborators is all it takes to replay a tour
//! frame-by-frame in a test.
//!
//! # Example
//!
//! ```ignore
//! use trackside_env::{ShowcaseContext, DriveControls};
//!
//! async fn frame_loop<Ctx: ShowcaseContext>(ctx: &Ctx, nav: &mut Controller) {
//!     loop {
//!         ctx.sleep(Duration::from_millis(16)).await;
//!         nav.tick(DriveControls::idle());
//!     }
//! }
//! ```

mod context;
mod error;
mod scene;
mod tokio_impl;
mod types;

pub use context::ShowcaseContext;
pub use error::EnvError;
pub use scene::{SceneHost, StatusSurface};
pub use tokio_impl::TokioContext;
pub use types::{Control, DriveControls, MarkerId, MarkerPulse, Pickup, PickupState, Pose, Waypoint};
