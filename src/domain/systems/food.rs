use crate::domain::state::{FoodItem, Player, Vec2};
use crate::domain::tuning::GameConfig;
use rand::Rng;

#[derive(Debug, Clone, Copy)]
pub struct FoodConfig {
    pub food_radius: f64,
    pub growth_increment: f64,
    pub respawn_floor: f64, // food_count * respawn_threshold
    pub respawn_batch: usize,
    pub half_width: f64,
    pub half_height: f64,
}

impl From<&GameConfig> for FoodConfig {
    fn from(cfg: &GameConfig) -> Self {
        Self {
            food_radius: cfg.food_radius,
            growth_increment: cfg.growth_increment,
            respawn_floor: cfg.respawn_floor(),
            respawn_batch: cfg.respawn_batch,
            half_width: cfg.map_half_width,
            half_height: cfg.map_half_height,
        }
    }
}

/// One pickup (or one respawned item) to report to observers.
///
/// `eaten` is always the position that was just picked up, so clients can
/// reconcile one-for-one even for the events that carry `new_food`.
#[derive(Debug, Clone, PartialEq)]
pub struct FoodEvent {
    pub eaten: Vec2,
    pub by: u64,
    pub new_food: Option<FoodItem>,
}

pub fn random_food<R: Rng + ?Sized>(rng: &mut R, cfg: FoodConfig) -> FoodItem {
    FoodItem {
        pos: Vec2::new(
            rng.random_range(-cfg.half_width..=cfg.half_width),
            rng.random_range(-cfg.half_height..=cfg.half_height),
        ),
    }
}

pub fn scatter_food<R: Rng + ?Sized>(count: usize, rng: &mut R, cfg: FoodConfig) -> Vec<FoodItem> {
    (0..count).map(|_| random_food(rng, cfg)).collect()
}

// Naive O(players * food) scan; fine at ~100-150 items and a handful of players.
//
// Items spawned during a pass are only added once every player has been
// checked, so no one can eat food that appeared in the same tick.
pub fn tick_food<R: Rng + ?Sized>(
    players: &mut [Player],
    food: &mut Vec<FoodItem>,
    rng: &mut R,
    cfg: FoodConfig,
) -> Vec<FoodEvent> {
    let mut events = Vec::new();
    let mut spawned = Vec::new();

    for p in players.iter_mut() {
        let mut i = 0;
        while i < food.len() {
            if p.pos.distance(food[i].pos) >= p.size + cfg.food_radius {
                i += 1;
                continue;
            }

            p.size += cfg.growth_increment;
            let eaten = food.swap_remove(i).pos;
            events.push(FoodEvent {
                eaten,
                by: p.id,
                new_food: None,
            });

            if ((food.len() + spawned.len()) as f64) < cfg.respawn_floor {
                for _ in 0..cfg.respawn_batch {
                    let item = random_food(rng, cfg);
                    spawned.push(item);
                    events.push(FoodEvent {
                        eaten,
                        by: p.id,
                        new_food: Some(item),
                    });
                }
            }
            // swap_remove moved an unchecked item into slot `i`; re-test it.
        }
    }

    food.append(&mut spawned);
    events
}
