use rand::Rng;
use rand::seq::SliceRandom;
use rand::rngs::StdRng;

use mazerush_core::car::{CAR_HALF, Car, MAX_HP};
use mazerush_core::geom::Rect;

use crate::config::SimConfig;
use crate::effects::{self, Particle, SkidMark};
use crate::maze::{ItemKind, World, ZoneKind};
use crate::{EffectTimers, InputState, SimEvent};

/// Outcome of advancing one car by one tick.
#[derive(Debug, Clone, Copy, Default)]
pub struct TickResult {
    /// The car touched the finish line while the exit was open. The
    /// caller resolves the winner across all tracked cars.
    pub reached_exit: bool,
}

/// Advance one locally-owned car by one fixed step.
///
/// `now_ms` is sampled once per tick by the caller; every temporary
/// effect (nitro, teleport charge, respawn) is a deadline against it, so
/// tests can drive the clock explicitly.
#[allow(clippy::too_many_arguments)]
pub fn tick_car(
    car: &mut Car,
    timers: &mut EffectTimers,
    input: InputState,
    world: &mut World,
    particles: &mut Vec<Particle>,
    skid_marks: &mut Vec<SkidMark>,
    rng: &mut StdRng,
    now_ms: u64,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) -> TickResult {
    // Dead cars freeze until the respawn deadline; they still report
    // their state outward so remote peers see the wreck position.
    if car.dead {
        if timers.respawn_at != 0 && now_ms >= timers.respawn_at {
            timers.respawn_at = 0;
            car.respawn();
        }
        return TickResult::default();
    }

    // A charged teleport resolves here rather than via a scheduled
    // callback; dying during the charge cancels it (see kill_car).
    if timers.teleport_at != 0 && now_ms >= timers.teleport_at {
        timers.teleport_at = 0;
        warp_to_random_cell(car, world, particles, rng, config);
    }

    if input.left {
        car.angle -= config.turn_step;
    }
    if input.right {
        car.angle += config.turn_step;
    }
    car.angle = car.angle.rem_euclid(360.0);

    // Physical profile for this tick: zone overrides, then nitro wins
    // on max speed only.
    let mut max_speed = config.max_speed;
    let mut acceleration = config.acceleration;
    let mut friction = config.friction;
    let zone_probe = Rect::around(car.x, car.y, 10.0);
    for zone in &world.zones {
        if zone.rect.intersects(&zone_probe) {
            match zone.kind {
                ZoneKind::Ice => {
                    friction = config.ice_friction;
                    acceleration = config.ice_acceleration;
                    max_speed += config.ice_speed_bonus;
                },
                ZoneKind::Mud => {
                    friction = config.mud_friction;
                    max_speed = config.mud_max_speed;
                },
            }
        }
    }
    if timers.nitro_active(now_ms) {
        max_speed = config.nitro_max_speed;
    }

    if input.accelerate {
        let rad = car.angle.to_radians();
        car.vel_x += acceleration * rad.cos();
        car.vel_y += acceleration * rad.sin();

        let speed_sq = car.speed_sq();
        if speed_sq > max_speed * max_speed {
            let speed = speed_sq.sqrt();
            car.vel_x = car.vel_x / speed * max_speed;
            car.vel_y = car.vel_y / speed * max_speed;
        }

        if let Some(p) = effects::exhaust(rng, car, timers.nitro_active(now_ms)) {
            particles.push(p);
        }
    } else {
        car.vel_x *= friction;
        car.vel_y *= friction;
    }

    // Snap sub-epsilon components to zero so cars actually stop.
    if car.vel_x.abs() < config.velocity_epsilon {
        car.vel_x = 0.0;
    }
    if car.vel_y.abs() < config.velocity_epsilon {
        car.vel_y = 0.0;
    }

    emit_skid_marks(car, skid_marks, config);

    let next_x = car.x + car.vel_x;
    let next_y = car.y + car.vel_y;

    // Per-axis candidate boxes so the free axis keeps sliding along a wall.
    let rect_x = Rect::new(
        next_x - CAR_HALF,
        car.y - CAR_HALF,
        next_x + CAR_HALF,
        car.y + CAR_HALF,
    );
    let rect_y = Rect::new(
        car.x - CAR_HALF,
        next_y - CAR_HALF,
        car.x + CAR_HALF,
        next_y + CAR_HALF,
    );
    let rect_both = Rect::around(next_x, next_y, CAR_HALF);

    let mut hit_x = false;
    let mut hit_y = false;
    let mut hit_corner = false;
    for wall in world.solid_walls(now_ms, config) {
        if wall.intersects(&rect_x) {
            hit_x = true;
        }
        if wall.intersects(&rect_y) {
            hit_y = true;
        }
        if wall.intersects(&rect_both) {
            hit_corner = true;
        }
    }

    if hit_x || hit_y || hit_corner {
        let speed_sq = car.speed_sq();
        if speed_sq > config.damage_threshold {
            car.hp -= (speed_sq / config.damage_divisor) as i32;
            if car.hp <= 0 {
                kill_car(car, timers, world, rng, now_ms, config, events);
                particles.extend(effects::explosion_burst(rng, car.x, car.y));
                return TickResult::default();
            }
            particles.extend(effects::bump_burst(rng, car.x, car.y));
        }
    }

    // Bounce on the colliding axis at half speed, advance the free one.
    if hit_x {
        car.vel_x = -car.vel_x * 0.5;
    } else {
        car.x = next_x;
    }
    if hit_y {
        car.vel_y = -car.vel_y * 0.5;
    } else {
        car.y = next_y;
    }
    if !hit_x && !hit_y && hit_corner {
        car.vel_x = -car.vel_x * 0.5;
        car.vel_y = -car.vel_y * 0.5;
    }

    pickup_items(car, timers, world, now_ms, config, events);

    finish_line_check(car, world, config)
}

/// Transition a car to dead: coin penalty, coin reactivation, respawn
/// deadline. Shared by the player and bot paths.
pub(crate) fn kill_car(
    car: &mut Car,
    timers: &mut EffectTimers,
    world: &mut World,
    rng: &mut StdRng,
    now_ms: u64,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) {
    car.dead = true;
    timers.teleport_at = 0;
    timers.nitro_until = 0;
    timers.respawn_at = now_ms + config.respawn_delay_ms;

    let lost = car.coins.min(config.death_coin_penalty);
    car.coins -= lost;

    // Dropped coins respawn onto the map as reactivated coin items,
    // bounded by how many are currently inactive.
    if lost > 0 {
        let mut inactive: Vec<u32> = world
            .items
            .iter()
            .filter(|item| item.kind == ItemKind::Coin && !item.active)
            .map(|item| item.id)
            .collect();
        inactive.shuffle(rng);
        for &id in inactive.iter().take(lost as usize) {
            world.set_item_active(id, true);
            events.push(SimEvent::ItemRestored(id));
        }
    }
}

/// Move a car to a uniformly random wall-free cell center.
pub(crate) fn warp_to_random_cell(
    car: &mut Car,
    world: &World,
    particles: &mut Vec<Particle>,
    rng: &mut StdRng,
    config: &SimConfig,
) {
    let cells = world.open_cells(config);
    if cells.is_empty() {
        return;
    }
    let (cx, cy) = cells[rng.random_range(0..cells.len())];
    car.x = cx;
    car.y = cy;
    car.vel_x = 0.0;
    car.vel_y = 0.0;
    particles.extend(effects::teleport_poof(rng, cx, cy));
}

fn pickup_items(
    car: &mut Car,
    timers: &mut EffectTimers,
    world: &mut World,
    now_ms: u64,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) {
    let car_rect = car.bounds();
    let mut picked: Vec<(u32, ItemKind)> = Vec::new();
    for item in &mut world.items {
        if item.active && item.bounds(config.item_pickup_half).intersects(&car_rect) {
            item.active = false;
            picked.push((item.id, item.kind));
        }
    }
    for (id, kind) in picked {
        match kind {
            ItemKind::Nitro => timers.nitro_until = now_ms + config.nitro_duration_ms,
            ItemKind::Teleport => timers.teleport_at = now_ms + config.teleport_charge_ms,
            ItemKind::Health => car.hp = (car.hp + config.health_pack_hp).min(MAX_HP),
            ItemKind::Coin => car.coins += 1,
        }
        events.push(SimEvent::ItemPickedUp(id));
    }
}

fn finish_line_check(car: &mut Car, world: &World, config: &SimConfig) -> TickResult {
    if !world.finish_line.intersects(&car.bounds()) {
        return TickResult::default();
    }
    if world.exit_open() {
        return TickResult { reached_exit: true };
    }
    // Locked exit: push the car back out once.
    car.vel_x = -car.vel_x * config.finish_bounce;
    car.vel_y = -car.vel_y * config.finish_bounce;
    car.x += car.vel_x;
    car.y += car.vel_y;
    TickResult::default()
}

fn emit_skid_marks(car: &Car, skid_marks: &mut Vec<SkidMark>, config: &SimConfig) {
    let speed_sq = car.speed_sq();
    if speed_sq <= config.skid_speed_sq {
        return;
    }
    let vel_angle = car.vel_y.atan2(car.vel_x).to_degrees();
    let d = (car.angle - vel_angle).abs() % 360.0;
    let diff = if d > 180.0 { 360.0 - d } else { d };
    if diff <= config.skid_angle_deg {
        return;
    }
    let rear = (car.angle + 180.0).to_radians();
    let rear_x = car.x + 20.0 * rear.cos();
    let rear_y = car.y + 20.0 * rear.sin();
    let side = (car.angle + 90.0).to_radians();
    for sign in [1.0f32, -1.0] {
        skid_marks.push(SkidMark {
            x: rear_x + sign * 10.0 * side.cos(),
            y: rear_y + sign * 10.0 * side.sin(),
            alpha: 200,
        });
    }
}
