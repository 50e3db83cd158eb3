//! Host-side bot controller. Bots chase the nearest coin (or a health
//! pack when hurt), dodge walls with a forward probe box, and share the
//! player's death, respawn and finish-line rules. They ignore zones and
//! nitro entirely.

use rand::rngs::StdRng;

use mazerush_core::car::{CAR_HALF, Car, MAX_HP};
use mazerush_core::geom::Rect;

use crate::config::SimConfig;
use crate::effects::{self, Particle};
use crate::maze::{ItemKind, World};
use crate::physics::{self, TickResult};
use crate::{EffectTimers, SimEvent};

pub struct BotCar {
    pub car: Car,
    pub timers: EffectTimers,
    /// Per-tick acceleration, set by the host's difficulty choice.
    pub speed_mult: f32,
}

impl BotCar {
    pub fn new(car: Car, speed_mult: f32) -> Self {
        BotCar {
            car,
            timers: EffectTimers::default(),
            speed_mult,
        }
    }

    /// Slow bots get shorter probes and gentler avoidance turns.
    fn is_slow(&self, config: &SimConfig) -> bool {
        self.speed_mult < config.bot_slow_tier
    }
}

pub fn tick_bot(
    bot: &mut BotCar,
    world: &mut World,
    particles: &mut Vec<Particle>,
    rng: &mut StdRng,
    now_ms: u64,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) -> TickResult {
    if bot.car.dead {
        if bot.timers.respawn_at != 0 && now_ms >= bot.timers.respawn_at {
            bot.timers.respawn_at = 0;
            bot.car.respawn();
        }
        return TickResult::default();
    }

    if bot.timers.teleport_at != 0 && now_ms >= bot.timers.teleport_at {
        bot.timers.teleport_at = 0;
        physics::warp_to_random_cell(&mut bot.car, world, particles, rng, config);
    }

    let (target_x, target_y) = pick_target(&bot.car, world, config);
    let desired = (target_y - bot.car.y)
        .atan2(target_x - bot.car.x)
        .to_degrees();
    let diff = (desired - bot.car.angle + 180.0).rem_euclid(360.0) - 180.0;

    // Forward probe; a blocked bot turns away instead of chasing.
    let slow = bot.is_slow(config);
    let probe_len = if slow {
        config.bot_slow_probe_len
    } else {
        config.bot_fast_probe_len
    };
    let rad = bot.car.angle.to_radians();
    let probe = Rect::around(
        bot.car.x + rad.cos() * probe_len,
        bot.car.y + rad.sin() * probe_len,
        config.bot_probe_half,
    );
    let blocked = world
        .solid_walls(now_ms, config)
        .any(|wall| wall.intersects(&probe));

    if blocked {
        bot.car.angle += if slow {
            config.bot_avoid_turn_slow
        } else {
            config.bot_avoid_turn_fast
        };
    } else if diff > config.turn_step {
        bot.car.angle += config.turn_step;
    } else if diff < -config.turn_step {
        bot.car.angle -= config.turn_step;
    }
    bot.car.angle = bot.car.angle.rem_euclid(360.0);

    let accel = if blocked {
        config.bot_blocked_accel
    } else {
        bot.speed_mult
    };
    let rad = bot.car.angle.to_radians();
    bot.car.vel_x = (bot.car.vel_x + accel * rad.cos()) * config.friction;
    bot.car.vel_y = (bot.car.vel_y + accel * rad.sin()) * config.friction;

    let next_x = bot.car.x + bot.car.vel_x;
    let next_y = bot.car.y + bot.car.vel_y;
    let rect_x = Rect::new(
        next_x - CAR_HALF,
        bot.car.y - CAR_HALF,
        next_x + CAR_HALF,
        bot.car.y + CAR_HALF,
    );
    let rect_y = Rect::new(
        bot.car.x - CAR_HALF,
        next_y - CAR_HALF,
        bot.car.x + CAR_HALF,
        next_y + CAR_HALF,
    );

    let mut hit_x = false;
    let mut hit_y = false;
    for wall in world.solid_walls(now_ms, config) {
        if wall.intersects(&rect_x) {
            hit_x = true;
        }
        if wall.intersects(&rect_y) {
            hit_y = true;
        }
    }

    // Flat scrape damage per colliding axis, no energy threshold.
    if hit_x {
        bot.car.vel_x = -bot.car.vel_x * 0.5;
        bot.car.hp -= config.bot_collision_damage;
    } else {
        bot.car.x = next_x;
    }
    if hit_y {
        bot.car.vel_y = -bot.car.vel_y * 0.5;
        bot.car.hp -= config.bot_collision_damage;
    } else {
        bot.car.y = next_y;
    }

    pickup_items(bot, world, now_ms, config, events);

    if bot.car.hp <= 0 {
        physics::kill_car(&mut bot.car, &mut bot.timers, world, rng, now_ms, config, events);
        particles.extend(effects::explosion_burst(rng, bot.car.x, bot.car.y));
        return TickResult::default();
    }

    if world.finish_line.intersects(&bot.car.bounds()) && world.exit_open() {
        return TickResult { reached_exit: true };
    }
    TickResult::default()
}

/// Nearest active coin, or nearest active health pack when hurt; the
/// finish line once every coin is gone.
fn pick_target(car: &Car, world: &World, config: &SimConfig) -> (f32, f32) {
    if world.exit_open() {
        return (world.finish_line.center_x(), world.finish_line.center_y());
    }
    let mut target = (world.finish_line.center_x(), world.finish_line.center_y());
    let mut best_dist = f32::MAX;
    for item in &world.items {
        if !item.active {
            continue;
        }
        let wanted = item.kind == ItemKind::Coin
            || (item.kind == ItemKind::Health && car.hp <= config.bot_low_hp);
        if !wanted {
            continue;
        }
        let dist = (item.x - car.x).hypot(item.y - car.y);
        if dist < best_dist {
            best_dist = dist;
            target = (item.x, item.y);
        }
    }
    target
}

fn pickup_items(
    bot: &mut BotCar,
    world: &mut World,
    now_ms: u64,
    config: &SimConfig,
    events: &mut Vec<SimEvent>,
) {
    let bot_rect = bot.car.bounds();
    for item in &mut world.items {
        if !item.active || !item.bounds(config.item_pickup_half).intersects(&bot_rect) {
            continue;
        }
        item.active = false;
        match item.kind {
            ItemKind::Coin => bot.car.coins += 1,
            ItemKind::Health => bot.car.hp = (bot.car.hp + config.health_pack_hp).min(MAX_HP),
            ItemKind::Teleport => {
                bot.timers.teleport_at = now_ms + config.teleport_charge_ms;
            },
            // Bots have no use for a speed cap they never reach.
            ItemKind::Nitro => {},
        }
        events.push(SimEvent::ItemPickedUp(item.id));
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;

    use super::*;
    use crate::maze::Item;

    fn empty_world(config: &SimConfig) -> World {
        let mut world = World::generate(0, config);
        world.walls.truncate(4);
        world.blinking_walls.clear();
        world.zones.clear();
        world.items.clear();
        world.finish_line = Rect::around(900.0, 1400.0, config.finish_half);
        world
    }

    fn coin(id: u32, x: f32, y: f32) -> Item {
        Item {
            id,
            x,
            y,
            kind: ItemKind::Coin,
            active: true,
        }
    }

    fn test_bot(x: f32, y: f32) -> BotCar {
        BotCar::new(Car::new("BOT_1", x, y, 0, "Bot 1"), 0.45)
    }

    fn run_tick(
        bot: &mut BotCar,
        world: &mut World,
        now_ms: u64,
        config: &SimConfig,
    ) -> (TickResult, Vec<SimEvent>) {
        let mut particles = Vec::new();
        let mut rng = StdRng::seed_from_u64(3);
        let mut events = Vec::new();
        let result = tick_bot(bot, world, &mut particles, &mut rng, now_ms, config, &mut events);
        (result, events)
    }

    #[test]
    fn targets_nearest_coin() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 800.0, 500.0));
        world.items.push(coin(1, 520.0, 500.0));

        let bot = test_bot(500.0, 500.0);
        let (tx, ty) = pick_target(&bot.car, &world, &config);
        assert_eq!((tx, ty), (520.0, 500.0));
    }

    #[test]
    fn hurt_bot_prefers_health() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 520.0, 500.0));
        world.items.push(Item {
            id: 1,
            x: 800.0,
            y: 500.0,
            kind: ItemKind::Health,
            active: true,
        });

        let mut bot = test_bot(500.0, 500.0);
        bot.car.hp = 50;
        let (tx, _) = pick_target(&bot.car, &world, &config);
        // Both are candidates; the coin is closer and still wins.
        assert_eq!(tx, 520.0);

        // With the coin gone, the health pack is the only candidate.
        world.items[0].active = false;
        let (tx, _) = pick_target(&bot.car, &world, &config);
        assert_eq!(tx, 800.0);
    }

    #[test]
    fn heads_for_exit_once_coins_are_gone() {
        let config = SimConfig::default();
        let world = empty_world(&config);
        let bot = test_bot(500.0, 500.0);
        let (tx, ty) = pick_target(&bot.car, &world, &config);
        assert_eq!(tx, world.finish_line.center_x());
        assert_eq!(ty, world.finish_line.center_y());
    }

    #[test]
    fn turns_toward_target_with_deadband() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 500.0, 800.0)); // straight down, 90 degrees

        let mut bot = test_bot(500.0, 500.0);
        bot.car.angle = 0.0;
        run_tick(&mut bot, &mut world, 0, &config);
        assert_eq!(bot.car.angle, 5.0, "one steering step toward the coin");

        // Within the deadband, heading holds.
        bot.car.angle = 88.0;
        bot.car.vel_x = 0.0;
        bot.car.vel_y = 0.0;
        run_tick(&mut bot, &mut world, 16, &config);
        assert_eq!(bot.car.angle, 88.0);
    }

    #[test]
    fn blocked_probe_turns_away_and_crawls() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 900.0, 500.0));
        // Wall directly ahead, inside the 35-unit probe reach.
        world.walls.push(Rect::new(530.0, 400.0, 560.0, 600.0));

        let mut bot = test_bot(500.0, 500.0);
        bot.car.angle = 0.0;
        run_tick(&mut bot, &mut world, 0, &config);
        assert_eq!(bot.car.angle, config.bot_avoid_turn_fast);
        // Blocked accel is tiny; friction applies on top.
        let speed = bot.car.speed_sq().sqrt();
        assert!(
            speed <= config.bot_blocked_accel,
            "crawl speed {speed} while blocked"
        );
    }

    #[test]
    fn slow_tier_uses_short_probe_and_gentle_turn() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 900.0, 500.0));
        // Inside the fast probe (35) but beyond the slow probe (22).
        world.walls.push(Rect::new(545.0, 400.0, 575.0, 600.0));

        let mut slow = BotCar::new(Car::new("BOT_1", 500.0, 500.0, 0, "Bot 1"), 0.25);
        run_tick(&mut slow, &mut world, 0, &config);
        assert_eq!(slow.car.angle, 0.0, "slow probe stops short of the wall");

        let mut fast = test_bot(500.0, 500.0);
        run_tick(&mut fast, &mut world, 0, &config);
        assert_eq!(fast.car.angle, config.bot_avoid_turn_fast);
    }

    #[test]
    fn wall_scrape_costs_flat_hp_per_axis() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 100.0, 1200.0)); // keep the exit shut
        world.walls.push(Rect::new(520.0, 0.0, 540.0, 1500.0));

        let mut bot = test_bot(500.0, 500.0);
        bot.car.vel_x = 2.0;
        bot.car.angle = 90.0; // probe points away from the wall
        run_tick(&mut bot, &mut world, 0, &config);
        assert_eq!(bot.car.hp, MAX_HP - config.bot_collision_damage);
        assert!(bot.car.vel_x < 0.0, "bounced off the wall");
    }

    #[test]
    fn bot_death_reuses_player_rules() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        for id in 0..4u32 {
            world.items.push(Item {
                id,
                x: 100.0 + id as f32,
                y: 1200.0,
                kind: ItemKind::Coin,
                active: false,
            });
        }
        world.walls.push(Rect::new(520.0, 0.0, 540.0, 1500.0));

        let mut bot = test_bot(500.0, 500.0);
        bot.car.hp = config.bot_collision_damage;
        bot.car.coins = 5;
        bot.car.vel_x = 2.0;
        bot.car.angle = 90.0;

        let (_, events) = run_tick(&mut bot, &mut world, 1000, &config);
        assert!(bot.car.dead);
        assert_eq!(bot.car.coins, 2, "death drops min(coins, 3)");
        let restored = events
            .iter()
            .filter(|e| matches!(e, SimEvent::ItemRestored(_)))
            .count();
        assert_eq!(restored, 3);
        assert_eq!(bot.timers.respawn_at, 1000 + config.respawn_delay_ms);

        run_tick(&mut bot, &mut world, 1000 + config.respawn_delay_ms, &config);
        assert!(!bot.car.dead);
        assert_eq!(bot.car.hp, MAX_HP);
    }

    #[test]
    fn pickup_and_open_exit_win() {
        let config = SimConfig::default();
        let mut world = empty_world(&config);
        world.items.push(coin(0, 510.0, 500.0));
        world.finish_line = Rect::around(505.0, 500.0, config.finish_half);

        let mut bot = test_bot(500.0, 500.0);
        let (result, events) = run_tick(&mut bot, &mut world, 0, &config);
        assert_eq!(bot.car.coins, 1);
        assert!(events.contains(&SimEvent::ItemPickedUp(0)));
        // The coin it just grabbed was the last one, so touching the
        // line in the same tick wins.
        assert!(result.reached_exit);
    }
}
