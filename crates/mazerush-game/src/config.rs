use serde::{Deserialize, Serialize};

/// Data-driven simulation constants.
///
/// Every peer in a match must run identical values: the maze layout, the
/// physics profile, and every deadline are derived from these, so a
/// mismatch desynchronizes the simulations even with a shared seed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Virtual space width, shared by all peers regardless of display size.
    pub virtual_width: f32,
    /// Virtual space height (the maze is taller than wide).
    pub virtual_height: f32,
    /// Maze grid columns.
    pub grid_cols: u32,
    /// Maze grid rows.
    pub grid_rows: u32,
    /// Wall segment thickness in virtual units.
    pub wall_thickness: f32,
    /// Default max speed (virtual units per tick).
    pub max_speed: f32,
    /// Default acceleration per tick while the accelerate input is held.
    pub acceleration: f32,
    /// Default per-tick velocity multiplier when coasting.
    pub friction: f32,
    /// Ice zones: near-zero decay, hard to stop.
    pub ice_friction: f32,
    /// Ice zones: hard to get moving.
    pub ice_acceleration: f32,
    /// Ice zones raise the speed cap by this much.
    pub ice_speed_bonus: f32,
    /// Mud zones: aggressive decay, stops fast.
    pub mud_friction: f32,
    /// Mud zones cap speed at this value.
    pub mud_max_speed: f32,
    /// Speed cap while a nitro pickup is active; wins over zone caps.
    pub nitro_max_speed: f32,
    /// Nitro effect duration.
    pub nitro_duration_ms: u64,
    /// Delay between a teleport pickup and the actual warp.
    pub teleport_charge_ms: u64,
    /// Steering step per tick, degrees.
    pub turn_step: f32,
    /// Velocity components below this snap to zero to kill drift.
    pub velocity_epsilon: f32,
    /// Squared speed above which a wall hit deals damage.
    pub damage_threshold: f32,
    /// Damage = squared speed / this divisor, truncated.
    pub damage_divisor: f32,
    /// Coins dropped on death (clamped to the coins held).
    pub death_coin_penalty: u32,
    /// Delay between explosion and respawn at spawn coordinates.
    pub respawn_delay_ms: u64,
    /// HP restored by a health pickup (capped at max HP).
    pub health_pack_hp: i32,
    /// Half-extent of the finish-line square.
    pub finish_half: f32,
    /// Velocity reflection factor when touching a locked finish line.
    pub finish_bounce: f32,
    /// Blinking wall cycle period.
    pub blink_period_ms: u64,
    /// Solid portion of the blink cycle.
    pub blink_solid_ms: u64,
    /// Upper bound for the per-wall random phase offset at generation.
    pub blink_phase_max_ms: u64,
    /// Coins placed per world (fewer if the maze lacks open cells).
    pub target_coins: usize,
    /// Half-extent of an item's pickup box.
    pub item_pickup_half: f32,
    /// Clearance half-extent when testing a cell center against walls.
    pub cell_probe_half: f32,
    /// Squared speed above which drifting leaves skid marks.
    pub skid_speed_sq: f32,
    /// Heading-vs-velocity divergence (degrees) that counts as drifting.
    pub skid_angle_deg: f32,
    /// Half-extent of the bot's forward obstacle probe.
    pub bot_probe_half: f32,
    /// Probe distance for slow bots.
    pub bot_slow_probe_len: f32,
    /// Probe distance for normal/fast bots.
    pub bot_fast_probe_len: f32,
    /// Speed multipliers below this use the short probe and gentle turns.
    pub bot_slow_tier: f32,
    /// Avoidance turn per tick for slow bots, degrees.
    pub bot_avoid_turn_slow: f32,
    /// Avoidance turn per tick for normal/fast bots, degrees.
    pub bot_avoid_turn_fast: f32,
    /// Bot acceleration while its probe is blocked.
    pub bot_blocked_accel: f32,
    /// Flat HP loss per colliding axis for bots.
    pub bot_collision_damage: i32,
    /// Bots divert to health packs at or below this HP.
    pub bot_low_hp: i32,
}

impl Default for SimConfig {
    fn default() -> Self {
        Self {
            virtual_width: 1000.0,
            virtual_height: 1500.0,
            grid_cols: 5,
            grid_rows: 8,
            wall_thickness: 30.0,
            max_speed: 8.0,
            acceleration: 0.5,
            friction: 0.95,
            ice_friction: 0.995,
            ice_acceleration: 0.15,
            ice_speed_bonus: 2.0,
            mud_friction: 0.70,
            mud_max_speed: 3.5,
            nitro_max_speed: 15.0,
            nitro_duration_ms: 3000,
            teleport_charge_ms: 2000,
            turn_step: 5.0,
            velocity_epsilon: 0.1,
            damage_threshold: 5.0,
            damage_divisor: 3.0,
            death_coin_penalty: 3,
            respawn_delay_ms: 3000,
            health_pack_hp: 40,
            finish_half: 60.0,
            finish_bounce: 0.8,
            blink_period_ms: 4000,
            blink_solid_ms: 2000,
            blink_phase_max_ms: 3000,
            target_coins: 10,
            item_pickup_half: 20.0,
            cell_probe_half: 15.0,
            skid_speed_sq: 10.0,
            skid_angle_deg: 20.0,
            bot_probe_half: 15.0,
            bot_slow_probe_len: 22.0,
            bot_fast_probe_len: 35.0,
            bot_slow_tier: 0.40,
            bot_avoid_turn_slow: 6.0,
            bot_avoid_turn_fast: 12.0,
            bot_blocked_accel: 0.15,
            bot_collision_damage: 2,
            bot_low_hp: 50,
        }
    }
}

impl SimConfig {
    /// Load config from `MAZERUSH_CONFIG` or `config/mazerush.toml`,
    /// falling back to defaults.
    pub fn load() -> Self {
        let path = std::env::var("MAZERUSH_CONFIG")
            .unwrap_or_else(|_| "config/mazerush.toml".to_string());
        match std::fs::read_to_string(&path) {
            Ok(contents) => match toml::from_str::<Self>(&contents) {
                Ok(config) => {
                    tracing::info!(%path, "loaded simulation config");
                    config
                },
                Err(e) => {
                    tracing::warn!(%path, error = %e, "bad simulation config, using defaults");
                    Self::default()
                },
            },
            Err(_) => Self::default(),
        }
    }

    pub fn cell_width(&self) -> f32 {
        self.virtual_width / self.grid_cols as f32
    }

    pub fn cell_height(&self) -> f32 {
        self.virtual_height / self.grid_rows as f32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_shared_contract() {
        let c = SimConfig::default();
        assert_eq!(c.grid_cols, 5);
        assert_eq!(c.grid_rows, 8);
        assert_eq!(c.cell_width(), 200.0);
        assert_eq!(c.cell_height(), 187.5);
        assert_eq!(c.target_coins, 10);
    }

    #[test]
    fn partial_toml_overrides_merge_with_defaults() {
        let c: SimConfig = toml::from_str("max_speed = 12.0").unwrap();
        assert_eq!(c.max_speed, 12.0);
        assert_eq!(c.friction, SimConfig::default().friction);
    }
}
