//! Arrival confetti.
//!
//! Short-lived particles spawned above the hub when a tour stop is reached.
//! Each particle integrates its own velocity and spin under a constant
//! per-frame gravity and is dropped once its life runs out.

use nalgebra::Vector3;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Particles per burst.
pub const BURST_SIZE: usize = 80;

/// Particle lifetime.
pub const PARTICLE_LIFE: Duration = Duration::from_millis(2800);

/// Downward velocity change per frame.
const GRAVITY_PER_FRAME: f64 = 0.0008;

/// Fraction of life after which a particle starts fading.
const FADE_START: f64 = 0.75;

/// Color schemes, named after the social networks on the hub monoliths.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Palette {
    TikTok,
    Instagram,
    YouTube,
    Facebook,
    LinkedIn,
    GitHub,
}

impl Palette {
    /// Networks picked at random for hub arrivals.
    pub const SOCIAL: [Palette; 5] = [
        Palette::TikTok,
        Palette::Instagram,
        Palette::YouTube,
        Palette::Facebook,
        Palette::LinkedIn,
    ];

    /// RGB colors of the palette.
    pub fn colors(&self) -> &'static [u32] {
        match self {
            Palette::TikTok => &[0x000000, 0x00f2ea, 0xff0050],
            Palette::Instagram => &[0xe1306c, 0xfd1d1d, 0xf77737, 0xfcaf45],
            Palette::YouTube => &[0xff0000, 0xffffff, 0x282828],
            Palette::Facebook => &[0x1877f2, 0x0a66c2, 0xffffff],
            Palette::LinkedIn => &[0x0077b5, 0x0a66c2, 0xffffff],
            Palette::GitHub => &[0x171515, 0xffffff, 0xff6600],
        }
    }
}

/// A single confetti piece.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub position: Vector3<f64>,
    pub velocity: Vector3<f64>,
    pub rotation: Vector3<f64>,
    pub spin: Vector3<f64>,
    pub color: u32,
    pub opacity: f64,
    pub born_at: Duration,
}

/// All live confetti, updated once per frame.
#[derive(Debug, Clone)]
pub struct ConfettiField {
    rng: ChaCha8Rng,
    particles: Vec<Particle>,
    origin: Vector3<f64>,
}

impl ConfettiField {
    /// Creates an empty field with a deterministic RNG.
    pub fn new(seed: u64) -> Self {
        Self {
            rng: ChaCha8Rng::seed_from_u64(seed),
            particles: Vec::new(),
            origin: Vector3::new(0.0, 5.0, 0.0),
        }
    }

    /// Live particles.
    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    /// Number of live particles.
    pub fn len(&self) -> usize {
        self.particles.len()
    }

    /// True when no particle is alive.
    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    /// Picks the palette celebrating arrival at `stop`.
    ///
    /// The hub celebrates with a random social network; every other stop
    /// uses the neutral palette.
    pub fn palette_for(&mut self, stop: &str) -> Palette {
        if crate::waypoint::is_hub(stop) {
            Palette::SOCIAL[self.rng.gen_range(0..Palette::SOCIAL.len())]
        } else {
            Palette::GitHub
        }
    }

    /// Spawns one burst of [`BURST_SIZE`] particles.
    pub fn burst(&mut self, palette: Palette, now: Duration) {
        let colors = palette.colors();
        for _ in 0..BURST_SIZE {
            let rng = &mut self.rng;
            let angle = rng.gen::<f64>() * std::f64::consts::TAU;
            let radius = 2.0 + rng.gen::<f64>() * 3.0;
            let position = self.origin
                + Vector3::new(angle.cos() * radius, rng.gen::<f64>() * 2.0, angle.sin() * radius);
            let rotation = Vector3::new(
                rng.gen::<f64>() * std::f64::consts::PI,
                rng.gen::<f64>() * std::f64::consts::PI,
                rng.gen::<f64>() * std::f64::consts::PI,
            );
            let velocity = Vector3::new(
                (rng.gen::<f64>() - 0.5) * 0.06,
                0.03 + rng.gen::<f64>() * 0.06,
                (rng.gen::<f64>() - 0.5) * 0.06,
            );
            let spin = Vector3::new(
                (rng.gen::<f64>() - 0.5) * 0.12,
                (rng.gen::<f64>() - 0.5) * 0.12,
                (rng.gen::<f64>() - 0.5) * 0.12,
            );
            let color = colors[rng.gen_range(0..colors.len())];

            self.particles.push(Particle {
                position,
                velocity,
                rotation,
                spin,
                color,
                opacity: 1.0,
                born_at: now,
            });
        }
    }

    /// Advances every particle one frame and drops the expired ones.
    pub fn update(&mut self, now: Duration) {
        let life = PARTICLE_LIFE.as_secs_f64();
        self.particles.retain_mut(|p| {
            let age = now.saturating_sub(p.born_at).as_secs_f64();
            if age > life {
                return false;
            }
            p.velocity.y -= GRAVITY_PER_FRAME;
            p.position += p.velocity;
            p.rotation += p.spin;

            let fade_from = life * FADE_START;
            if age > fade_from {
                p.opacity = 1.0 - (age - fade_from) / (life - fade_from);
            }
            true
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_burst_spawns_around_hub() {
        let mut field = ConfettiField::new(7);
        field.burst(Palette::GitHub, Duration::ZERO);

        assert_eq!(field.len(), BURST_SIZE);
        for p in field.particles() {
            let flat = Vector3::new(p.position.x, 0.0, p.position.z).norm();
            assert!((2.0..=5.0).contains(&flat));
            assert!(p.position.y >= 5.0 && p.position.y <= 7.0);
            assert!(Palette::GitHub.colors().contains(&p.color));
        }
    }

    #[test]
    fn test_particles_fall_fade_and_expire() {
        let mut field = ConfettiField::new(7);
        field.burst(Palette::TikTok, Duration::ZERO);
        let vy0 = field.particles()[0].velocity.y;

        field.update(Duration::from_millis(16));
        assert!(field.particles()[0].velocity.y < vy0);
        assert_eq!(field.particles()[0].opacity, 1.0);

        field.update(Duration::from_millis(2450));
        let opacity = field.particles()[0].opacity;
        assert!(opacity < 1.0 && opacity > 0.0);

        field.update(Duration::from_millis(2801));
        assert!(field.is_empty());
    }

    #[test]
    fn test_palette_choice() {
        let mut field = ConfettiField::new(42);
        assert_eq!(field.palette_for("SKILLS"), Palette::GitHub);
        for _ in 0..20 {
            assert!(Palette::SOCIAL.contains(&field.palette_for("redes")));
        }
    }

    #[test]
    fn test_same_seed_same_burst() {
        let mut a = ConfettiField::new(99);
        let mut b = ConfettiField::new(99);
        a.burst(Palette::YouTube, Duration::ZERO);
        b.burst(Palette::YouTube, Duration::ZERO);
        assert_eq!(a.particles(), b.particles());
    }
}
