//! Cosmetic state: particles and skid marks. These share the simulation
//! tick for decay but carry no gameplay or network relevance.

use rand::Rng;
use serde::{Deserialize, Serialize};

use mazerush_core::car::Car;

pub const COLOR_GRAY: i32 = 0xFF88_8888_u32 as i32;
pub const COLOR_CYAN: i32 = 0xFF00_FFFF_u32 as i32;
pub const COLOR_YELLOW: i32 = 0xFFFF_FF00_u32 as i32;
pub const COLOR_RED: i32 = 0xFFFF_0000_u32 as i32;
pub const COLOR_MAGENTA: i32 = 0xFFFF_00FF_u32 as i32;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Particle {
    pub x: f32,
    pub y: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    pub life: i32,
    pub max_life: i32,
    pub color: i32,
    pub size: f32,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkidMark {
    pub x: f32,
    pub y: f32,
    pub alpha: i32,
}

/// Advance and prune both effect pools by one tick.
pub fn decay(particles: &mut Vec<Particle>, skid_marks: &mut Vec<SkidMark>) {
    for p in particles.iter_mut() {
        p.x += p.vel_x;
        p.y += p.vel_y;
        p.life -= 1;
    }
    particles.retain(|p| p.life > 0);

    for mark in skid_marks.iter_mut() {
        mark.alpha -= 2;
    }
    skid_marks.retain(|mark| mark.alpha > 0);
}

/// Exhaust puff behind an accelerating car; cyan while nitro burns.
pub fn exhaust(rng: &mut impl Rng, car: &Car, nitro: bool) -> Option<Particle> {
    if rng.random::<f32>() >= 0.4 {
        return None;
    }
    let rear = (car.angle + 180.0).to_radians();
    let spread = (car.angle + 180.0 + rng.random_range(-20.0..20.0)).to_radians();
    let speed = rng.random::<f32>() * 2.0 + 1.0;
    Some(Particle {
        x: car.x + 20.0 * rear.cos(),
        y: car.y + 20.0 * rear.sin(),
        vel_x: speed * spread.cos(),
        vel_y: speed * spread.sin(),
        life: 20,
        max_life: 20,
        color: if nitro { COLOR_CYAN } else { COLOR_GRAY },
        size: 4.0,
    })
}

/// Big red/yellow burst when a car explodes.
pub fn explosion_burst(rng: &mut impl Rng, x: f32, y: f32) -> Vec<Particle> {
    radial_burst(rng, x, y, 40, 2.0..14.0, 30, 6.0, &[COLOR_RED, COLOR_YELLOW])
}

/// Small yellow burst for a survivable wall hit.
pub fn bump_burst(rng: &mut impl Rng, x: f32, y: f32) -> Vec<Particle> {
    radial_burst(rng, x, y, 5, 1.0..5.0, 15, 3.0, &[COLOR_YELLOW])
}

/// Magenta poof at a teleport destination.
pub fn teleport_poof(rng: &mut impl Rng, x: f32, y: f32) -> Vec<Particle> {
    radial_burst(rng, x, y, 20, 3.0..3.001, 20, 5.0, &[COLOR_MAGENTA])
}

fn radial_burst(
    rng: &mut impl Rng,
    x: f32,
    y: f32,
    count: usize,
    speed: std::ops::Range<f32>,
    life: i32,
    size: f32,
    palette: &[i32],
) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let angle = rng.random::<f32>() * std::f32::consts::TAU;
            let s = rng.random_range(speed.clone());
            Particle {
                x,
                y,
                vel_x: s * angle.cos(),
                vel_y: s * angle.sin(),
                life,
                max_life: life,
                color: palette[rng.random_range(0..palette.len())],
                size,
            }
        })
        .collect()
}
