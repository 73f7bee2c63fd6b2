//! Waypoint resolution and the bounded retry combinator.
//!
//! The scene populates its billboards asynchronously, so a tour started
//! right after load may find nothing to resolve yet. Resolution inside a
//! tour start is therefore wrapped in a [`BoundedRetry`]: one immediate
//! attempt, then a fixed number of retries spaced by a fixed delay.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use trackside_env::Waypoint;

/// Titles that always resolve to the hub at the origin.
pub const HUB_TITLES: [&str; 2] = ["redes", "hub"];

/// Returns true if `title` names the central hub.
pub fn is_hub(title: &str) -> bool {
    HUB_TITLES.iter().any(|h| h.eq_ignore_ascii_case(title))
}

/// Resolves a stop title to a world position.
///
/// Case-insensitive; when several waypoints share a title the first one in
/// iteration order wins. Hub titles resolve to the origin regardless of the
/// waypoint set.
pub fn resolve(waypoints: &[Waypoint], title: &str) -> Option<Vector3<f64>> {
    if is_hub(title) {
        return Some(Vector3::zeros());
    }
    let wanted = title.to_lowercase();
    waypoints
        .iter()
        .find(|w| w.title.to_lowercase() == wanted)
        .map(|w| w.position)
}

/// Resolves every title, keeping unresolved ones as `None`.
pub fn resolve_all(waypoints: &[Waypoint], titles: &[String]) -> Vec<Option<Vector3<f64>>> {
    titles.iter().map(|t| resolve(waypoints, t)).collect()
}

// ============================================================================
// BOUNDED RETRY
// ============================================================================

/// Retry policy: one immediate attempt plus `max_retries` delayed ones.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RetryPolicy {
    /// Retries after the first attempt (default: 6)
    pub max_retries: u32,

    /// Delay between attempts in ms (default: 350)
    pub delay_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 6,
            delay_ms: 350,
        }
    }
}

impl RetryPolicy {
    /// Delay between attempts.
    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }

    /// Time from the first attempt to the last one. Saturates instead of
    /// overflowing.
    pub fn worst_case(&self) -> Duration {
        self.delay().saturating_mul(self.max_retries)
    }

    /// Starts a frame-stepped retry whose first attempt is due at `now`.
    pub fn start(&self, now: Duration) -> BoundedRetry {
        BoundedRetry {
            policy: *self,
            retries: 0,
            next_at: now,
            exhausted: false,
        }
    }
}

/// Result of polling a [`BoundedRetry`].
#[derive(Debug, Clone, PartialEq)]
pub enum RetryPoll<T> {
    /// The attempt produced a value
    Ready(T),
    /// Not due yet, or due and failed with retries left
    Pending,
    /// Every attempt failed
    Exhausted,
}

/// Frame-stepped retry state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundedRetry {
    policy: RetryPolicy,
    retries: u32,
    next_at: Duration,
    exhausted: bool,
}

impl BoundedRetry {
    /// Runs `attempt` if one is due at `now`.
    ///
    /// Deadlines are scheduled from the previous deadline, not from `now`,
    /// so coarse frame timing does not stretch the total bound.
    pub fn poll<T>(&mut self, now: Duration, mut attempt: impl FnMut() -> Option<T>) -> RetryPoll<T> {
        if self.exhausted {
            return RetryPoll::Exhausted;
        }
        if now < self.next_at {
            return RetryPoll::Pending;
        }
        if let Some(value) = attempt() {
            return RetryPoll::Ready(value);
        }
        if self.retries >= self.policy.max_retries {
            self.exhausted = true;
            return RetryPoll::Exhausted;
        }
        self.retries += 1;
        self.next_at = self.next_at.saturating_add(self.policy.delay());
        RetryPoll::Pending
    }

    /// Retries consumed so far.
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Time left until the next attempt is due.
    pub fn wait_from(&self, now: Duration) -> Duration {
        self.next_at.saturating_sub(now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn board(title: &str, x: f64) -> Waypoint {
        Waypoint::new(title, "", Vector3::new(x, 0.0, 0.0))
    }

    #[test]
    fn test_resolve_is_case_insensitive_first_match() {
        let set = vec![board("SKILLS", 1.0), board("Skills", 2.0), board("CONTACTO", 3.0)];
        assert_eq!(resolve(&set, "skills"), Some(Vector3::new(1.0, 0.0, 0.0)));
        assert_eq!(resolve(&set, "Contacto"), Some(Vector3::new(3.0, 0.0, 0.0)));
        assert_eq!(resolve(&set, "BLOG"), None);
    }

    #[test]
    fn test_hub_resolves_without_waypoints() {
        assert_eq!(resolve(&[], "redes"), Some(Vector3::zeros()));
        assert_eq!(resolve(&[], "HUB"), Some(Vector3::zeros()));
    }

    #[test]
    fn test_resolve_all_keeps_gaps() {
        let set = vec![board("A", 1.0)];
        let titles = vec!["A".to_string(), "B".to_string()];
        let out = resolve_all(&set, &titles);
        assert!(out[0].is_some());
        assert!(out[1].is_none());
    }

    #[test]
    fn test_bounded_retry_attempt_schedule() {
        let policy = RetryPolicy::default();
        let mut retry = policy.start(Duration::ZERO);
        let mut attempts = 0;

        let mut now = Duration::ZERO;
        let step = Duration::from_millis(50);
        let outcome = loop {
            match retry.poll(now, || {
                attempts += 1;
                None::<()>
            }) {
                RetryPoll::Pending => now += step,
                other => break other,
            }
        };

        assert_eq!(outcome, RetryPoll::Exhausted);
        assert_eq!(attempts, 7);
        assert_eq!(retry.retries(), 6);
        assert_eq!(now, Duration::from_millis(2100));
        assert_eq!(policy.worst_case(), Duration::from_millis(2100));

        // Exhaustion is sticky
        assert_eq!(retry.poll(now, || Some(())), RetryPoll::Exhausted);
    }

    #[test]
    fn test_bounded_retry_succeeds_late() {
        let mut retry = RetryPolicy::default().start(Duration::ZERO);
        assert_eq!(retry.poll(Duration::ZERO, || None::<u8>), RetryPoll::Pending);
        assert_eq!(retry.poll(Duration::from_millis(100), || Some(1u8)), RetryPoll::Pending);
        assert_eq!(retry.poll(Duration::from_millis(350), || Some(2u8)), RetryPoll::Ready(2));
    }

    #[test]
    fn test_bounded_retry_huge_delay_saturates() {
        let policy = RetryPolicy {
            max_retries: 3,
            delay_ms: u64::MAX,
        };
        assert_eq!(policy.worst_case(), Duration::MAX);

        let mut retry = policy.start(Duration::from_secs(5));
        assert_eq!(retry.poll(Duration::from_secs(5), || None::<u8>), RetryPoll::Pending);
        assert_eq!(retry.poll(Duration::from_secs(5), || None::<u8>), RetryPoll::Pending);
        assert_eq!(retry.wait_from(Duration::from_secs(5)), Duration::MAX - Duration::from_secs(5));

        // Past the saturated deadline the next failure still counts
        assert_eq!(retry.poll(Duration::MAX, || None::<u8>), RetryPoll::Pending);
        assert_eq!(retry.retries(), 2);
    }
}
