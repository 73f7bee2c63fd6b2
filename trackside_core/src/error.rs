//! Error taxonomy and terminal drive outcomes.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Recoverable navigation errors.
///
/// None of these are fatal to the showcase: every failure is transient and
/// re-attemptable by invoking the operation again.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NavError {
    /// A drive was requested before the subject exists
    #[error("no subject in the scene")]
    NoSubject,

    /// A drive was requested while another one is animating
    #[error("a drive is already in progress")]
    Busy,

    /// No named stop could be resolved after all retries
    #[error("unresolved waypoint(s): {0}")]
    UnresolvedWaypoint(String),

    /// The requested tour start is not part of the tour template
    #[error("unknown stop: {0}")]
    UnknownStop(String),

    /// A tour is already running and no override was requested
    #[error("a tour is already running")]
    TourRunning,

    /// Configuration could not be parsed
    #[error("invalid configuration: {0}")]
    Config(String),
}

/// Terminal result of a single drive request.
///
/// Exactly one outcome is produced per request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DriveOutcome {
    /// Arrived (animated or teleported)
    Done,
    /// Interrupted mid-animation; a clean termination, not a failure
    Canceled,
    /// Rejected because another drive is animating
    Busy,
    /// Rejected because the subject does not exist yet
    NoSubject,
}

impl DriveOutcome {
    /// Returns true when the request was rejected without moving the subject.
    pub fn is_rejected(&self) -> bool {
        matches!(self, DriveOutcome::Busy | DriveOutcome::NoSubject)
    }

    /// Returns the outcome name used in logs and exports.
    pub fn name(&self) -> &'static str {
        match self {
            DriveOutcome::Done => "done",
            DriveOutcome::Canceled => "canceled",
            DriveOutcome::Busy => "busy",
            DriveOutcome::NoSubject => "no-subject",
        }
    }
}

impl std::fmt::Display for DriveOutcome {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
