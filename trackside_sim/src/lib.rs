//! Trackside Deterministic Simulation Harness
//!
//! Runs the navigation controller against an in-memory scene on a virtual
//! clock, so every drive, tour and retry plays out identically for a seed.
//!
//! # Core Principle: The Reactor Pattern
//!
//! All sources of non-determinism are intercepted and controlled:
//! - **Time**: Virtual clock advances one frame interval per tick
//! - **Scene**: Waypoints and the subject appear when the scenario says so
//! - **Randomness**: Keyboard input and confetti derive from a single 64-bit seed
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │                    ScenarioRunner                        │
//! │  ┌───────────────────────────────────────────────────┐   │
//! │  │ FrameLoop (SimContext virtual clock)              │   │
//! │  └───────────────────────────────────────────────────┘   │
//! │                         │ tick                           │
//! │               ┌─────────▼──────────┐                     │
//! │               │ NavigationController│                    │
//! │               └──┬──────────────┬──┘                     │
//! │          ┌───────▼────┐   ┌─────▼─────────────┐          │
//! │          │  SimScene  │   │ RecordingSurface  │          │
//! │          │ (TrackLayout)│ │      (HUD)        │          │
//! │          └────────────┘   └───────────────────┘          │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use trackside_sim::{ScenarioRunner, scenarios::ScenarioId};
//!
//! let result = ScenarioRunner::new(42).run(ScenarioId::GrandTour).await;
//! assert!(result.passed);
//! ```

mod context;
mod exporter;
mod runner;
mod scene;
pub mod scenarios;
pub mod track;

pub use context::SimContext;
pub use exporter::{SimExport, SimFrame, SubjectFrame, TimedEvent};
pub use runner::{ScenarioMetrics, ScenarioResult, ScenarioRunner, SimNav};
pub use scene::{RecordingSurface, SimMarker, SimScene};
pub use track::TrackLayout;
