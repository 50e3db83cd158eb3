use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use mazerush_core::geom::Rect;

use crate::config::SimConfig;

/// Hazard zone flavor. Zones override the physical profile while a car's
/// box intersects them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ZoneKind {
    Ice,
    Mud,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Zone {
    pub rect: Rect,
    pub kind: ZoneKind,
}

/// A wall that toggles solid/open on a fixed period with a per-wall
/// phase offset drawn at generation time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlinkingWall {
    pub rect: Rect,
    pub offset_ms: u64,
}

impl BlinkingWall {
    pub fn is_solid(&self, now_ms: u64, config: &SimConfig) -> bool {
        (now_ms + self.offset_ms) % config.blink_period_ms < config.blink_solid_ms
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemKind {
    Nitro,
    Teleport,
    Coin,
    Health,
}

/// A collectible. Items are created with the world and only ever toggle
/// their active flag afterwards; the id (generation order) is the unit of
/// network synchronization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Item {
    pub id: u32,
    pub x: f32,
    pub y: f32,
    pub kind: ItemKind,
    pub active: bool,
}

impl Item {
    pub fn bounds(&self, half: f32) -> Rect {
        Rect::around(self.x, self.y, half)
    }
}

/// The static match geometry plus the item set.
///
/// Fully determined by (seed, config); regenerated wholesale on match
/// start and reset so only the seed ever travels over the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    pub seed: u64,
    pub walls: Vec<Rect>,
    pub blinking_walls: Vec<BlinkingWall>,
    pub zones: Vec<Zone>,
    pub finish_line: Rect,
    pub items: Vec<Item>,
}

impl World {
    /// Deterministic generation: the same seed yields structurally
    /// identical worlds on every peer. The draw order below (exit cell,
    /// grid pass, candidate shuffle) is part of that contract and must
    /// not be reordered.
    pub fn generate(seed: u64, config: &SimConfig) -> World {
        let mut rng = StdRng::seed_from_u64(seed);
        let t = config.wall_thickness;
        let w = config.virtual_width;
        let h = config.virtual_height;
        let cols = config.grid_cols;
        let rows = config.grid_rows;
        let cell_w = config.cell_width();
        let cell_h = config.cell_height();

        // Outer boundaries
        let mut walls = vec![
            Rect::new(0.0, 0.0, w, t),
            Rect::new(0.0, h - t, w, h),
            Rect::new(0.0, 0.0, t, h),
            Rect::new(w - t, 0.0, w, h),
        ];

        // Exit cell: any column, row biased to the lower half of the grid.
        let exit_col = rng.random_range(0..cols);
        let exit_row = rows / 2 + rng.random_range(0..rows - rows / 2);
        let exit_x = exit_col as f32 * cell_w + cell_w / 2.0;
        let exit_y = exit_row as f32 * cell_h + cell_h / 2.0;
        let finish_line = Rect::around(exit_x, exit_y, config.finish_half);

        let mut blinking_walls = Vec::new();
        let mut zones = Vec::new();
        let mut items = Vec::new();

        for i in 0..cols {
            for j in 0..rows {
                // Keep the start block (top left 2x2) and the exit clear.
                if (i <= 1 && j <= 1) || (i == exit_col && j == exit_row) {
                    continue;
                }
                let x = i as f32 * cell_w;
                let y = j as f32 * cell_h;
                let cx = x + cell_w / 2.0;
                let cy = y + cell_h / 2.0;

                let roll: f32 = rng.random();
                if roll < 0.25 {
                    walls.push(match rng.random_range(0..3) {
                        0 => Rect::new(x, y, x + t, y + cell_h * 0.8),
                        1 => Rect::new(x, y, x + cell_w * 0.8, y + t),
                        _ => Rect::around(cx, cy, 50.0),
                    });
                } else if roll < 0.35 {
                    let rect = if rng.random_range(0..2) == 0 {
                        Rect::new(x, y, x + cell_w * 0.6, y + t)
                    } else {
                        Rect::new(x, y, x + t, y + cell_h * 0.6)
                    };
                    blinking_walls.push(BlinkingWall {
                        rect,
                        offset_ms: rng.random_range(0..config.blink_phase_max_ms),
                    });
                } else if roll < 0.50 {
                    let kind = if rng.random_bool(0.5) {
                        ZoneKind::Ice
                    } else {
                        ZoneKind::Mud
                    };
                    zones.push(Zone {
                        rect: Rect::new(x + 10.0, y + 10.0, x + cell_w - 10.0, y + cell_h - 10.0),
                        kind,
                    });
                } else if roll < 0.60 {
                    let kind = match rng.random_range(0..3) {
                        0 => ItemKind::Nitro,
                        1 => ItemKind::Teleport,
                        _ => ItemKind::Health,
                    };
                    items.push(Item {
                        id: items.len() as u32,
                        x: cx,
                        y: cy,
                        kind,
                        active: true,
                    });
                }
            }
        }

        // Second phase: coins go on shuffled wall-free cell centers. Fewer
        // than target_coins candidates just means fewer coins; the win
        // condition counts active coins, not a fixed total.
        let mut spots: Vec<(f32, f32)> = Vec::new();
        for i in 0..cols {
            for j in 0..rows {
                if (i <= 1 && j <= 1) || (i == exit_col && j == exit_row) {
                    continue;
                }
                let cx = i as f32 * cell_w + cell_w / 2.0;
                let cy = j as f32 * cell_h + cell_h / 2.0;
                let probe = Rect::around(cx, cy, config.cell_probe_half);
                if !walls.iter().any(|wall| wall.intersects(&probe)) {
                    spots.push((cx, cy));
                }
            }
        }
        spots.shuffle(&mut rng);
        let coin_count = config.target_coins.min(spots.len());
        for &(cx, cy) in &spots[..coin_count] {
            items.push(Item {
                id: items.len() as u32,
                x: cx,
                y: cy,
                kind: ItemKind::Coin,
                active: true,
            });
        }

        World {
            seed,
            walls,
            blinking_walls,
            zones,
            finish_line,
            items,
        }
    }

    /// Walls that block movement right now: all static walls plus
    /// blinking walls in the solid half of their cycle.
    pub fn solid_walls<'a>(
        &'a self,
        now_ms: u64,
        config: &'a SimConfig,
    ) -> impl Iterator<Item = &'a Rect> {
        self.walls.iter().chain(
            self.blinking_walls
                .iter()
                .filter(move |bw| bw.is_solid(now_ms, config))
                .map(|bw| &bw.rect),
        )
    }

    /// The exit unlocks once no active coin remains.
    pub fn exit_open(&self) -> bool {
        !self
            .items
            .iter()
            .any(|item| item.kind == ItemKind::Coin && item.active)
    }

    pub fn active_coin_count(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.kind == ItemKind::Coin && item.active)
            .count()
    }

    pub fn set_item_active(&mut self, id: u32, active: bool) {
        if let Some(item) = self.items.iter_mut().find(|item| item.id == id) {
            item.active = active;
        }
    }

    /// All grid-cell centers clear of static walls; teleport destinations
    /// are drawn uniformly from this list.
    pub fn open_cells(&self, config: &SimConfig) -> Vec<(f32, f32)> {
        let cell_w = config.cell_width();
        let cell_h = config.cell_height();
        let mut cells = Vec::new();
        for i in 0..config.grid_cols {
            for j in 0..config.grid_rows {
                let cx = i as f32 * cell_w + cell_w / 2.0;
                let cy = j as f32 * cell_h + cell_h / 2.0;
                let probe = Rect::around(cx, cy, config.cell_probe_half);
                if !self.walls.iter().any(|wall| wall.intersects(&probe)) {
                    cells.push((cx, cy));
                }
            }
        }
        cells
    }
}
