//! Scenario catalogue for the simulation harness.

/// Scenario identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScenarioId {
    /// Auto-advancing tour over every stop of the default template
    GrandTour,

    /// Single-step tour driven with explicit continues
    StepThrough,

    /// A drive canceled half way, then a fresh drive
    CancelMidDrive,

    /// Tour and drive requests issued before the scene finished loading
    LateScene,

    /// Reduced-motion preference: teleports instead of drives
    ReducedMotion,

    /// Overlapping drive and tour requests
    BusyRejection,

    /// Manual driving before and after an autopilot drive
    ManualHandoff,

    /// Tour over stops that never appear
    Unreachable,

    /// Skill pickups collected by landing on them
    SkillPickups,
}

impl ScenarioId {
    /// Returns a list of all scenarios.
    pub fn all() -> Vec<ScenarioId> {
        vec![
            ScenarioId::GrandTour,
            ScenarioId::StepThrough,
            ScenarioId::CancelMidDrive,
            ScenarioId::LateScene,
            ScenarioId::ReducedMotion,
            ScenarioId::BusyRejection,
            ScenarioId::ManualHandoff,
            ScenarioId::Unreachable,
            ScenarioId::SkillPickups,
        ]
    }

    /// Returns the scenario name.
    pub fn name(&self) -> &'static str {
        match self {
            ScenarioId::GrandTour => "grand_tour",
            ScenarioId::StepThrough => "step_through",
            ScenarioId::CancelMidDrive => "cancel_mid_drive",
            ScenarioId::LateScene => "late_scene",
            ScenarioId::ReducedMotion => "reduced_motion",
            ScenarioId::BusyRejection => "busy_rejection",
            ScenarioId::ManualHandoff => "manual_handoff",
            ScenarioId::Unreachable => "unreachable",
            ScenarioId::SkillPickups => "skill_pickups",
        }
    }

    /// Returns a description of the scenario.
    pub fn description(&self) -> &'static str {
        match self {
            ScenarioId::GrandTour => "Auto tour SKILLS to the hub, every stop in order",
            ScenarioId::StepThrough => "Single-step tour from EXPERIENCIA, continue after each pause",
            ScenarioId::CancelMidDrive => "Cancel a drive one second in, marker and flags must clear",
            ScenarioId::LateScene => "Billboards appear 1 s after the tour starts, subject after the first request",
            ScenarioId::ReducedMotion => "Reduced motion: every drive lands on its target in the same call",
            ScenarioId::BusyRejection => "Second drive and second tour are refused while the first runs",
            ScenarioId::ManualHandoff => "Random keyboard driving, autopilot drive, keyboard again",
            ScenarioId::Unreachable => "No stop ever resolves, tour gives up after the retry budget",
            ScenarioId::SkillPickups => "Land on each skill cube near SKILLS, every cube collected and hidden",
        }
    }
}

impl std::fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl std::str::FromStr for ScenarioId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "grand_tour" | "grandtour" => Ok(ScenarioId::GrandTour),
            "step_through" | "stepthrough" => Ok(ScenarioId::StepThrough),
            "cancel_mid_drive" | "cancel" => Ok(ScenarioId::CancelMidDrive),
            "late_scene" | "latescene" => Ok(ScenarioId::LateScene),
            "reduced_motion" | "reducedmotion" => Ok(ScenarioId::ReducedMotion),
            "busy_rejection" | "busy" => Ok(ScenarioId::BusyRejection),
            "manual_handoff" | "manual" => Ok(ScenarioId::ManualHandoff),
            "unreachable" => Ok(ScenarioId::Unreachable),
            "skill_pickups" | "skills" => Ok(ScenarioId::SkillPickups),
            _ => Err(format!("Unknown scenario: {}", s)),
        }
    }
}
