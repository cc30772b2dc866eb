use crate::domain::state::{Player, Vec2};
use crate::domain::tuning::GameConfig;

#[derive(Debug, Clone, Copy)]
pub struct MovementConfig {
    pub force_magnitude: f64, // speed at size 1.0, units/s

    pub half_width: f64,
    pub half_height: f64,
    pub boundary_distance: f64,
    pub bounce_factor: f64, // 0.0..=1.0
}

impl From<&GameConfig> for MovementConfig {
    fn from(cfg: &GameConfig) -> Self {
        Self {
            force_magnitude: cfg.force_magnitude,
            half_width: cfg.map_half_width,
            half_height: cfg.map_half_height,
            boundary_distance: cfg.boundary_distance,
            bounce_factor: cfg.bounce_factor,
        }
    }
}

/// Bigger players move slower.
pub fn speed_for_size(size: f64, dt: f64, cfg: MovementConfig) -> f64 {
    cfg.force_magnitude * size.powf(-0.5) * dt
}

pub fn tick_player(p: &mut Player, dt: f64, cfg: MovementConfig) {
    if !p.input.is_zero() {
        // Inputs arrive normalized, but edge bounces shrink the stored vector.
        let dir = p.input.normalized();
        let speed = speed_for_size(p.size, dt, cfg);
        p.pos = p.pos.add(dir.scale(speed));
    }

    bounce_off_edges(p, cfg);
}

// Soft bounce: clamp inside the edge band and reflect the stored input inward.
// The damped input persists until the client sends a new one.
fn bounce_off_edges(p: &mut Player, cfg: MovementConfig) {
    let max_x = cfg.half_width - cfg.boundary_distance;
    let max_y = cfg.half_height - cfg.boundary_distance;

    if p.pos.x > max_x {
        p.pos.x = max_x;
        p.input.x = -p.input.x.abs() * cfg.bounce_factor;
    } else if p.pos.x < -max_x {
        p.pos.x = -max_x;
        p.input.x = p.input.x.abs() * cfg.bounce_factor;
    }

    if p.pos.y > max_y {
        p.pos.y = max_y;
        p.input.y = -p.input.y.abs() * cfg.bounce_factor;
    } else if p.pos.y < -max_y {
        p.pos.y = -max_y;
        p.input.y = p.input.y.abs() * cfg.bounce_factor;
    }
}

/// Evenly spaced slot on the spawn circle for player `index` of `count`.
pub fn spawn_slot(index: usize, count: usize, radius: f64) -> Vec2 {
    let angle = std::f64::consts::TAU * index as f64 / count.max(1) as f64;
    Vec2::new(radius * angle.cos(), radius * angle.sin())
}
