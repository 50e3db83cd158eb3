//! Deterministic maze-race simulation: world generation, car physics,
//! items, bots. Everything here is driven by an injected millisecond
//! clock and a seeded RNG; networking lives in `mazerush-net`.

pub mod bot;
pub mod config;
pub mod effects;
pub mod maze;
pub mod physics;

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;

use mazerush_core::car::Car;
use mazerush_core::palette;

use crate::bot::BotCar;
use crate::config::SimConfig;
use crate::effects::{Particle, SkidMark};
use crate::maze::World;

/// Steering and throttle state for the locally-owned car, sampled once
/// per tick.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InputState {
    pub left: bool,
    pub right: bool,
    pub accelerate: bool,
}

/// Deadline clocks for a car's temporary effects. Zero means idle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EffectTimers {
    /// Nitro boost active until this instant.
    pub nitro_until: u64,
    /// A charged teleport fires at this instant.
    pub teleport_at: u64,
    /// A dead car comes back at this instant.
    pub respawn_at: u64,
}

impl EffectTimers {
    pub fn nitro_active(&self, now_ms: u64) -> bool {
        now_ms < self.nitro_until
    }
}

/// Outward-facing simulation events; the caller translates these into
/// wire messages.
#[derive(Debug, Clone, PartialEq)]
pub enum SimEvent {
    /// A locally-owned car changed this tick (player, or bots on the
    /// host). Emitted every tick so peers always hold a fresh snapshot.
    CarChanged(Car),
    /// An item left the map. Relayed so peers deactivate it too.
    ItemPickedUp(u32),
    /// A previously-collected coin returned to the map.
    ItemRestored(u32),
    /// The race ended with this winner name.
    Win(String),
}

/// One peer's view of the race: the world, its own car, the last-known
/// snapshot of every remote car, and (on the host) the bots.
pub struct RaceSim {
    pub world: World,
    pub player: Car,
    pub player_timers: EffectTimers,
    /// Last-write-wins snapshots keyed by car id.
    pub remote_cars: HashMap<String, Car>,
    pub bots: Vec<BotCar>,
    pub particles: Vec<Particle>,
    pub skid_marks: Vec<SkidMark>,
    pub is_host: bool,
    pub game_over: bool,
    pub winner: Option<String>,
    input: InputState,
    config: SimConfig,
    rng: StdRng,
}

impl RaceSim {
    pub fn new(seed: u64, id: &str, name: &str, is_host: bool, config: SimConfig) -> Self {
        Self::with_rng(seed, id, name, is_host, config, StdRng::from_os_rng)
    }

    /// Like [`new`](Self::new) but with a caller-supplied gameplay RNG,
    /// so tests can pin teleport and coin-drop outcomes.
    pub fn with_rng(
        seed: u64,
        id: &str,
        name: &str,
        is_host: bool,
        config: SimConfig,
        make_rng: impl FnOnce() -> StdRng,
    ) -> Self {
        let world = World::generate(seed, &config);
        let color = if is_host {
            palette::HOST_RED
        } else {
            palette::CLIENT_BLUE
        };
        // Host spawns one row above the client row so peers never stack
        // on the same point.
        let spawn_y = if is_host { 80.0 } else { 150.0 };
        RaceSim {
            world,
            player: Car::new(id, 100.0, spawn_y, color, name),
            player_timers: EffectTimers::default(),
            remote_cars: HashMap::new(),
            bots: Vec::new(),
            particles: Vec::new(),
            skid_marks: Vec::new(),
            is_host,
            game_over: false,
            winner: None,
            input: InputState::default(),
            config,
            rng: make_rng(),
        }
    }

    pub fn config(&self) -> &SimConfig {
        &self.config
    }

    pub fn set_input(&mut self, input: InputState) {
        self.input = input;
    }

    /// Host-side only. Bots line up down the start column in 50-unit
    /// steps, alternating colors.
    pub fn spawn_bots(&mut self, count: u32, speed_mult: f32) {
        for i in 0..count {
            let color = if i % 2 == 0 {
                palette::BOT_ORANGE
            } else {
                palette::BOT_PURPLE
            };
            let id = format!("BOT_{}", i + 1);
            let name = format!("Bot {}", i + 1);
            let car = Car::new(&id, 100.0, 150.0 + i as f32 * 50.0, color, &name);
            self.bots.push(BotCar::new(car, speed_mult));
        }
    }

    /// Advance everything this peer owns by one step. Returns the
    /// events to push to the network.
    pub fn tick(&mut self, now_ms: u64) -> Vec<SimEvent> {
        if self.game_over {
            return Vec::new();
        }
        let mut events = Vec::new();

        let result = physics::tick_car(
            &mut self.player,
            &mut self.player_timers,
            self.input,
            &mut self.world,
            &mut self.particles,
            &mut self.skid_marks,
            &mut self.rng,
            now_ms,
            &self.config,
            &mut events,
        );
        if result.reached_exit {
            self.declare_winner(&mut events);
        }

        if self.is_host && !self.game_over {
            for i in 0..self.bots.len() {
                let result = bot::tick_bot(
                    &mut self.bots[i],
                    &mut self.world,
                    &mut self.particles,
                    &mut self.rng,
                    now_ms,
                    &self.config,
                    &mut events,
                );
                if result.reached_exit {
                    self.declare_winner(&mut events);
                    break;
                }
            }
        }

        effects::decay(&mut self.particles, &mut self.skid_marks);

        events.push(SimEvent::CarChanged(self.player.clone()));
        if self.is_host {
            for bot in &self.bots {
                events.push(SimEvent::CarChanged(bot.car.clone()));
            }
        }
        events
    }

    /// Best coin count wins regardless of who crossed the line:
    /// local car, then remote cars, then bots, replaced only on a
    /// strictly greater count.
    pub fn resolve_winner(&self) -> String {
        let mut best_name = self.player.name.as_str();
        let mut best_coins = self.player.coins;
        for car in self.remote_cars.values() {
            if car.coins > best_coins {
                best_name = car.name.as_str();
                best_coins = car.coins;
            }
        }
        for bot in &self.bots {
            if bot.car.coins > best_coins {
                best_name = bot.car.name.as_str();
                best_coins = bot.car.coins;
            }
        }
        best_name.to_owned()
    }

    fn declare_winner(&mut self, events: &mut Vec<SimEvent>) {
        let winner = self.resolve_winner();
        self.game_over = true;
        self.winner = Some(winner.clone());
        events.push(SimEvent::Win(winner));
    }

    /// Ingest a remote snapshot. Updates carrying our own id are echoes
    /// and dropped; otherwise last write wins.
    pub fn apply_remote_update(&mut self, car: Car) {
        if car.id == self.player.id {
            return;
        }
        self.remote_cars.insert(car.id.clone(), car);
    }

    pub fn disable_item(&mut self, id: u32) {
        self.world.set_item_active(id, false);
    }

    pub fn enable_item(&mut self, id: u32) {
        self.world.set_item_active(id, true);
    }

    /// A peer announced the race result.
    pub fn apply_win(&mut self, winner: &str) {
        self.game_over = true;
        self.winner = Some(winner.to_owned());
    }

    /// Start a fresh match on a new seed. Cars keep their identity but
    /// lose progress; remote snapshots stay registered so the roster
    /// survives the reset.
    pub fn reset(&mut self, seed: u64) {
        self.world = World::generate(seed, &self.config);
        self.player.reset_for_match();
        self.player_timers = EffectTimers::default();
        for bot in &mut self.bots {
            bot.car.reset_for_match();
            bot.timers = EffectTimers::default();
        }
        for car in self.remote_cars.values_mut() {
            car.reset_for_match();
        }
        self.particles.clear();
        self.skid_marks.clear();
        self.game_over = false;
        self.winner = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixed_rng() -> StdRng {
        StdRng::seed_from_u64(42)
    }

    fn test_sim(is_host: bool) -> RaceSim {
        RaceSim::with_rng(12345, "p1", "Alice", is_host, SimConfig::default(), fixed_rng)
    }

    fn remote(id: &str, name: &str, coins: u32) -> Car {
        let mut car = Car::new(id, 300.0, 300.0, 0, name);
        car.coins = coins;
        car
    }

    #[test]
    fn win_goes_to_highest_coin_count() {
        let mut sim = test_sim(true);
        sim.player.coins = 5;
        sim.apply_remote_update(remote("p2", "Bob", 7));
        sim.spawn_bots(1, 0.45);
        sim.bots[0].car.coins = 7;

        // Remote checked before bots, so a tie keeps the remote.
        assert_eq!(sim.resolve_winner(), "Bob");
    }

    #[test]
    fn win_keeps_local_on_tie() {
        let mut sim = test_sim(false);
        sim.player.coins = 4;
        sim.apply_remote_update(remote("p2", "Bob", 4));
        assert_eq!(sim.resolve_winner(), "Alice");
    }

    #[test]
    fn own_echo_is_ignored() {
        let mut sim = test_sim(false);
        sim.apply_remote_update(remote("p1", "Alice", 99));
        assert!(sim.remote_cars.is_empty());

        sim.apply_remote_update(remote("p2", "Bob", 1));
        sim.apply_remote_update(remote("p2", "Bob", 1));
        assert_eq!(sim.remote_cars.len(), 1, "re-applying is idempotent");
    }

    #[test]
    fn remote_update_is_last_write_wins() {
        let mut sim = test_sim(false);
        sim.apply_remote_update(remote("p2", "Bob", 1));
        sim.apply_remote_update(remote("p2", "Bob", 6));
        assert_eq!(sim.remote_cars["p2"].coins, 6);
    }

    #[test]
    fn tick_reports_player_snapshot_every_step() {
        let mut sim = test_sim(false);
        let events = sim.tick(0);
        let snapshots = events
            .iter()
            .filter(|e| matches!(e, SimEvent::CarChanged(_)))
            .count();
        assert_eq!(snapshots, 1);
    }

    #[test]
    fn host_tick_reports_bot_snapshots() {
        let mut sim = test_sim(true);
        sim.spawn_bots(2, 0.45);
        let events = sim.tick(0);
        let snapshots = events
            .iter()
            .filter(|e| matches!(e, SimEvent::CarChanged(_)))
            .count();
        assert_eq!(snapshots, 3, "player plus two bots");
    }

    #[test]
    fn game_over_freezes_the_sim() {
        let mut sim = test_sim(false);
        sim.apply_win("Bob");
        assert!(sim.tick(16).is_empty());
        assert_eq!(sim.winner.as_deref(), Some("Bob"));
    }

    #[test]
    fn reset_rebuilds_world_and_clears_progress() {
        let mut sim = test_sim(true);
        sim.spawn_bots(1, 0.45);
        sim.player.coins = 4;
        sim.player.hp = 10;
        sim.bots[0].car.coins = 2;
        sim.apply_remote_update(remote("p2", "Bob", 9));
        sim.apply_win("Bob");

        sim.reset(777);

        assert_eq!(sim.world.seed, 777);
        assert_eq!(sim.player.coins, 0);
        assert_eq!(sim.player.hp, mazerush_core::car::MAX_HP);
        assert_eq!(sim.bots[0].car.coins, 0);
        assert_eq!(sim.remote_cars["p2"].coins, 0, "roster kept, progress wiped");
        assert!(!sim.game_over);
        assert!(sim.winner.is_none());

        let same = World::generate(777, sim.config());
        assert_eq!(sim.world.walls, same.walls, "reset world matches a fresh build");
    }

    #[test]
    fn bot_colors_alternate() {
        let mut sim = test_sim(true);
        sim.spawn_bots(3, 0.45);
        assert_eq!(sim.bots[0].car.color, palette::BOT_ORANGE);
        assert_eq!(sim.bots[1].car.color, palette::BOT_PURPLE);
        assert_eq!(sim.bots[2].car.color, palette::BOT_ORANGE);
        assert_eq!(sim.bots[0].car.y, 150.0);
        assert_eq!(sim.bots[1].car.y, 200.0);
    }

    #[test]
    fn host_and_client_spawn_on_different_rows() {
        let host = test_sim(true);
        let client = RaceSim::with_rng(12345, "p2", "Bob", false, SimConfig::default(), fixed_rng);
        assert_eq!((host.player.x, host.player.y), (100.0, 80.0));
        assert_eq!((client.player.x, client.player.y), (100.0, 150.0));
        assert_eq!(
            (host.player.spawn_x, host.player.spawn_y),
            (100.0, 80.0),
            "respawn returns the host to its own row"
        );
    }
}
