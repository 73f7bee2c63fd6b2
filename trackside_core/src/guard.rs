//! Mutual exclusion between manual input, autopilot drives and tours.
//!
//! Two independent flags with controlled mutation:
//! - `driving`: true for exactly one autonomous animation
//! - `tour_running`: true for one tour, spanning many drives with gaps
//!
//! There is no finer-grained lock. The subject pose has one writer at a time
//! and both writers consult `driving` every frame before touching it.

use crate::error::NavError;

/// Guard flags owned by the navigation controller.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MotionGuard {
    driving: bool,
    tour_running: bool,
}

impl MotionGuard {
    /// Creates an idle guard.
    pub fn new() -> Self {
        Self::default()
    }

    /// True while an autopilot animation owns the subject pose.
    pub fn is_driving(&self) -> bool {
        self.driving
    }

    /// True while a tour session exists.
    pub fn is_touring(&self) -> bool {
        self.tour_running
    }

    /// Claims the subject for an autopilot drive.
    ///
    /// # Returns
    /// * `Ok(())` - The caller now owns the pose until `end_drive()`
    /// * `Err(NavError::Busy)` - Another drive is animating
    pub fn try_begin_drive(&mut self) -> Result<(), NavError> {
        if self.driving {
            return Err(NavError::Busy);
        }
        self.driving = true;
        Ok(())
    }

    /// Hands the subject back to manual control. Idempotent.
    pub fn end_drive(&mut self) {
        self.driving = false;
    }

    /// Claims the tour slot.
    ///
    /// Does not look at `driving`: a tour may be started while a single
    /// drive is still animating, its first departure simply waits.
    pub fn try_begin_tour(&mut self) -> Result<(), NavError> {
        if self.tour_running {
            return Err(NavError::TourRunning);
        }
        self.tour_running = true;
        Ok(())
    }

    /// Releases the tour slot. Idempotent.
    pub fn end_tour(&mut self) {
        self.tour_running = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_second_drive_is_busy() {
        let mut guard = MotionGuard::new();
        assert!(guard.try_begin_drive().is_ok());
        assert_eq!(guard.try_begin_drive(), Err(NavError::Busy));
        assert!(guard.is_driving());

        guard.end_drive();
        assert!(!guard.is_driving());
        assert!(guard.try_begin_drive().is_ok());
    }

    #[test]
    fn test_tour_does_not_block_drive() {
        let mut guard = MotionGuard::new();
        guard.try_begin_tour().unwrap();
        assert!(guard.try_begin_drive().is_ok());
        assert_eq!(guard.try_begin_tour(), Err(NavError::TourRunning));
    }

    #[test]
    fn test_end_is_idempotent() {
        let mut guard = MotionGuard::new();
        guard.end_drive();
        guard.end_tour();
        guard.end_tour();
        assert_eq!(guard, MotionGuard::default());
    }
}
