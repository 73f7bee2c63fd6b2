//! Core environment context trait for Trackside controllers.

use async_trait::async_trait;
use std::time::Duration;

/// The central interface for time and entropy.
///
/// This trait abstracts the "real world" clock so that the navigation core
/// can run inside a browser-like frame loop (tokio) or inside the
/// deterministic simulation harness.
///
/// # Implementations
///
/// - **Production**: `TokioContext` - wraps `std::time::Instant` and `tokio::time`
/// - **Simulation**: `SimContext` - a virtual clock advanced by the harness
///
/// # Determinism
///
/// Everything the navigation core does with time goes through `now()`.
/// Drive interpolation, settle pulses, tour dwell and resolver retries are
/// all expressed as deadlines on this clock, never as wall-clock timers.
#[async_trait]
pub trait ShowcaseContext: Send + Sync + 'static {
    /// Returns the current monotonic time since context creation.
    ///
    /// In simulation, this is the virtual clock time.
    fn now(&self) -> Duration;

    /// Suspends execution for the given duration.
    ///
    /// In production: wraps `tokio::time::sleep`
    /// In simulation: advances the virtual clock
    async fn sleep(&self, duration: Duration);

    /// Returns the context's seed.
    ///
    /// Cosmetic randomness (confetti palettes and scatter) is derived from it.
    /// In production, returns 0 (not seeded).
    fn seed(&self) -> u64;
}
