use serde::{Deserialize, Serialize};

use crate::geom::Rect;

/// Half-extent of a car's collision box in virtual units.
pub const CAR_HALF: f32 = 20.0;

/// Hit point ceiling for every car.
pub const MAX_HP: i32 = 100;

/// A car in the race.
///
/// Ownership follows the car's role: the local player's car is mutated
/// only by the local simulation tick, remote cars are a cache overwritten
/// by inbound state snapshots, and bots are mutated only by the bot
/// controller on the host peer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Car {
    pub id: String,
    pub x: f32,
    pub y: f32,
    /// Heading in degrees, wrapped to [0, 360).
    pub angle: f32,
    pub vel_x: f32,
    pub vel_y: f32,
    /// Packed ARGB display color. Wire metadata only, never behavioral.
    pub color: i32,
    pub name: String,
    pub coins: u32,
    pub hp: i32,
    pub dead: bool,
    /// Spawn coordinates the car returns to after death or match reset.
    pub spawn_x: f32,
    pub spawn_y: f32,
}

impl Car {
    pub fn new(id: impl Into<String>, x: f32, y: f32, color: i32, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            x,
            y,
            angle: 0.0,
            vel_x: 0.0,
            vel_y: 0.0,
            color,
            name: name.into(),
            coins: 0,
            hp: MAX_HP,
            dead: false,
            spawn_x: x,
            spawn_y: y,
        }
    }

    /// Restore spawn defaults after a death: spawn position, zero
    /// velocity, facing right, full HP, alive. Coins are kept; the death
    /// penalty is applied at explosion time, not here.
    pub fn respawn(&mut self) {
        self.x = self.spawn_x;
        self.y = self.spawn_y;
        self.angle = 0.0;
        self.vel_x = 0.0;
        self.vel_y = 0.0;
        self.hp = MAX_HP;
        self.dead = false;
    }

    /// Full reset at match start, which additionally clears the coin count.
    pub fn reset_for_match(&mut self) {
        self.respawn();
        self.coins = 0;
    }

    pub fn bounds(&self) -> Rect {
        Rect::around(self.x, self.y, CAR_HALF)
    }

    /// Squared velocity magnitude, the kinetic-energy proxy used by
    /// collision damage and skid checks.
    pub fn speed_sq(&self) -> f32 {
        self.vel_x * self.vel_x + self.vel_y * self.vel_y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_car_spawns_alive_at_full_hp() {
        let car = Car::new("p1", 100.0, 80.0, 0, "Alice");
        assert!(!car.dead);
        assert_eq!(car.hp, MAX_HP);
        assert_eq!(car.coins, 0);
        assert_eq!((car.spawn_x, car.spawn_y), (100.0, 80.0));
    }

    #[test]
    fn respawn_restores_spawn_defaults_but_keeps_coins() {
        let mut car = Car::new("p1", 100.0, 80.0, 0, "Alice");
        car.x = 500.0;
        car.y = 700.0;
        car.vel_x = 4.0;
        car.angle = 90.0;
        car.hp = 0;
        car.dead = true;
        car.coins = 7;

        car.respawn();

        assert_eq!((car.x, car.y), (100.0, 80.0));
        assert_eq!((car.vel_x, car.vel_y), (0.0, 0.0));
        assert_eq!(car.hp, MAX_HP);
        assert!(!car.dead);
        assert_eq!(car.coins, 7);
    }

    #[test]
    fn reset_for_match_clears_coins() {
        let mut car = Car::new("p1", 100.0, 80.0, 0, "Alice");
        car.coins = 9;
        car.reset_for_match();
        assert_eq!(car.coins, 0);
    }
}
