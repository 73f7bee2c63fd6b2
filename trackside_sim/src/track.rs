//! Procedural track layout.
//!
//! A closed ring whose radius breathes three times per lap, billboards
//! placed at fixed segment intervals outside the road, a row of skill
//! pickups on the road just before the SKILLS billboard, and a hub of
//! social monoliths at the center. Only the navigation-relevant part of the scene
//! is generated: where things are and what they are called.

use nalgebra::Vector3;
use std::f64::consts::{PI, TAU};
use trackside_env::{Pickup, Pose, Waypoint};

/// Road segments per lap.
pub const SEGMENTS: usize = 150;

/// Road width.
pub const TRACK_WIDTH: f64 = 14.0;

/// Distance of the social monoliths from the hub center.
pub const HUB_RADIUS: f64 = 15.0;

/// Billboard content, in lap order.
pub const BILLBOARDS: [(&str, &str); 6] = [
    ("HOLA MUNDO", "Creative developer"),
    ("SKILLS", "Run over the icons to learn more"),
    ("EXPERIENCIA", "Five years building for the web"),
    ("PROYECTO 1", "Immersive 3D storefront"),
    ("PROYECTO 2", "Finance app with AI"),
    ("CONTACTO", "hello@trackside.dev"),
];

/// Billboard whose stretch of road carries the skill pickups.
pub const PICKUP_BILLBOARD: usize = 1;

/// Skill pickups: label and cube color.
pub const SKILL_PICKUPS: [(&str, u32); 4] = [
    ("JS", 0xf7df1e),
    ("RE", 0x61dafb),
    ("PY", 0x3776ab),
    ("H5", 0xe34c26),
];

/// Angular spacing between consecutive pickups.
const PICKUP_SPACING: f64 = 0.08;

/// Sideways offset of a pickup from the middle of the road.
const PICKUP_LANE: f64 = 3.0;

/// Resting height of a pickup's center.
pub const PICKUP_HEIGHT: f64 = 1.5;

/// Social monoliths and their angle around the hub.
pub const SOCIALS: [(&str, f64); 5] = [
    ("GitHub", -0.6),
    ("LinkedIn", -0.3),
    ("YouTube", 0.0),
    ("Facebook", 0.3),
    ("TikTok", 0.6),
];

/// Generated track.
#[derive(Debug, Clone)]
pub struct TrackLayout {
    waypoints: Vec<Waypoint>,
    pickups: Vec<Pickup>,
    centerline: Vec<Vector3<f64>>,
}

impl TrackLayout {
    /// Builds the standard layout.
    pub fn generate() -> Self {
        let interval = SEGMENTS / BILLBOARDS.len();
        let mut centerline = Vec::with_capacity(SEGMENTS);
        let mut waypoints = Vec::new();
        let mut pickups = Vec::new();

        for i in 0..SEGMENTS {
            let angle = i as f64 / SEGMENTS as f64 * TAU;
            let radius = ring_radius(angle);
            centerline.push(Vector3::new(angle.cos() * radius, 0.0, angle.sin() * radius));

            if i % interval == 0 {
                let board = (i / interval) % BILLBOARDS.len();
                let (title, description) = BILLBOARDS[board];
                let dist = radius + TRACK_WIDTH + 12.0;
                waypoints.push(Waypoint::new(
                    title,
                    description,
                    Vector3::new(angle.cos() * dist, 0.0, angle.sin() * dist),
                ));
                if board == PICKUP_BILLBOARD {
                    pickups.extend(skill_pickups(angle, radius));
                }
            }
        }

        for (name, offset) in SOCIALS {
            let angle = offset + PI;
            waypoints.push(Waypoint::new(
                name,
                format!("Follow me on {}", name),
                Vector3::new(angle.sin() * HUB_RADIUS, 0.0, angle.cos() * HUB_RADIUS),
            ));
        }

        Self {
            waypoints,
            pickups,
            centerline,
        }
    }

    pub fn waypoints(&self) -> &[Waypoint] {
        &self.waypoints
    }

    /// Skill pickups, in placement order.
    pub fn pickups(&self) -> &[Pickup] {
        &self.pickups
    }

    /// Road centerline, one point per segment.
    pub fn centerline(&self) -> &[Vector3<f64>] {
        &self.centerline
    }

    /// Where the car is placed when the scene loads.
    pub fn spawn_pose() -> Pose {
        Pose::new(Vector3::new(80.0, 0.0, 10.0), 0.0)
    }
}

/// Pickups trailing back from the billboard at `angle`, alternating
/// between the inner and outer half of the road.
fn skill_pickups(angle: f64, radius: f64) -> impl Iterator<Item = Pickup> {
    let mid = radius + TRACK_WIDTH / 2.0;
    SKILL_PICKUPS.iter().enumerate().map(move |(k, (label, color))| {
        let a = angle - (k + 1) as f64 * PICKUP_SPACING;
        let r = if k % 2 == 0 { mid - PICKUP_LANE } else { mid + PICKUP_LANE };
        Pickup::new(*label, *color, Vector3::new(a.cos() * r, PICKUP_HEIGHT, a.sin() * r))
    })
}

/// Centerline radius at `angle`.
pub fn ring_radius(angle: f64) -> f64 {
    60.0 + (angle * 3.0).cos() * 20.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use trackside_core::waypoint;

    #[test]
    fn test_layout_counts() {
        let track = TrackLayout::generate();
        assert_eq!(track.centerline().len(), SEGMENTS);
        assert_eq!(track.waypoints().len(), BILLBOARDS.len() + SOCIALS.len());
    }

    #[test]
    fn test_every_tour_stop_resolves() {
        let track = TrackLayout::generate();
        for stop in trackside_core::TourTemplate::default().stops() {
            assert!(
                waypoint::resolve(track.waypoints(), stop).is_some(),
                "stop {} did not resolve",
                stop
            );
        }
    }

    #[test]
    fn test_first_billboard_sits_outside_the_road() {
        let track = TrackLayout::generate();
        let first = &track.waypoints()[0];
        assert_eq!(first.title, "HOLA MUNDO");
        // Segment 0: angle 0, radius 80, billboard at 80 + 26
        assert!((first.position.x - 106.0).abs() < 1e-9);
        assert!(first.position.z.abs() < 1e-9);
    }

    #[test]
    fn test_monoliths_ring_the_hub() {
        let track = TrackLayout::generate();
        for w in &track.waypoints()[BILLBOARDS.len()..] {
            assert!((w.position.norm() - HUB_RADIUS).abs() < 1e-9);
            assert!(w.description.starts_with("Follow me on"));
        }
    }

    #[test]
    fn test_pickups_line_the_road_before_skills() {
        let track = TrackLayout::generate();
        let labels: Vec<_> = track.pickups().iter().map(|p| p.label.as_str()).collect();
        assert_eq!(labels, ["JS", "RE", "PY", "H5"]);

        // SKILLS sits on segment 25; its road radius is 60 + cos(pi) * 20
        let skills = angle_of(25);
        let mid = 40.0 + TRACK_WIDTH / 2.0;
        for (k, pickup) in track.pickups().iter().enumerate() {
            let p = pickup.position;
            assert_eq!(p.y, PICKUP_HEIGHT);
            let a = p.z.atan2(p.x);
            assert!((a - (skills - (k + 1) as f64 * 0.08)).abs() < 1e-9);
            let lane = if k % 2 == 0 { -3.0 } else { 3.0 };
            assert!((p.xz().norm() - (mid + lane)).abs() < 1e-9);
        }
        assert_eq!(track.pickups()[1].color, 0x61dafb);
    }

    fn angle_of(segment: usize) -> f64 {
        segment as f64 / SEGMENTS as f64 * TAU
    }

    proptest! {
        #[test]
        fn prop_ring_radius_bounded(angle in 0.0f64..TAU) {
            let r = ring_radius(angle);
            prop_assert!((40.0 - 1e-9..=80.0 + 1e-9).contains(&r));
        }
    }
}
