use crate::domain::state::{Player, Vec2};
use crate::domain::tuning::GameConfig;

#[derive(Debug, Clone, Copy)]
pub struct CollisionConfig {
    pub absorption_threshold: f64,
    pub absorb_momentum_damping: f64,
    pub collision_damping: f64,
}

impl From<&GameConfig> for CollisionConfig {
    fn from(cfg: &GameConfig) -> Self {
        Self {
            absorption_threshold: cfg.absorption_threshold,
            absorb_momentum_damping: cfg.absorb_momentum_damping,
            collision_damping: cfg.collision_damping,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PairOutcome {
    Apart,
    Bounced,
    // The left player of the pair absorbed the right one.
    LeftAbsorbed,
    RightAbsorbed,
}

/// A player removed by absorption during a collision pass.
#[derive(Debug, Clone)]
pub struct Absorption {
    pub eater_id: u64,
    pub eaten: Player,
}

/// Resolves one touching pair. Exactly one outcome applies per pair per tick.
pub fn resolve_pair(a: &mut Player, b: &mut Player, cfg: CollisionConfig) -> PairOutcome {
    let dist = a.pos.distance(b.pos);
    if dist >= a.size + b.size {
        return PairOutcome::Apart;
    }

    if a.size > b.size * cfg.absorption_threshold {
        absorb(a, b, cfg);
        return PairOutcome::LeftAbsorbed;
    }
    if b.size > a.size * cfg.absorption_threshold {
        absorb(b, a, cfg);
        return PairOutcome::RightAbsorbed;
    }

    bounce(a, b, dist, cfg);
    PairOutcome::Bounced
}

// Mass is not conserved: the eater keeps half of the victim's size.
fn absorb(eater: &mut Player, eaten: &Player, cfg: CollisionConfig) {
    let ratio = eaten.size / eater.size;
    eater.input = eater
        .input
        .add(eaten.input.scale(cfg.absorb_momentum_damping * ratio));
    eater.size += 0.5 * eaten.size;
}

// Stylized elastic response, not exact momentum conservation.
fn bounce(a: &mut Player, b: &mut Player, dist: f64, cfg: CollisionConfig) {
    let overlap = a.size + b.size - dist;
    let normal = if dist <= f64::EPSILON {
        Vec2::new(1.0, 0.0)
    } else {
        Vec2::new((b.pos.x - a.pos.x) / dist, (b.pos.y - a.pos.y) / dist)
    };

    // Heavier side moves less; together they cover half the overlap.
    let total = a.size + b.size;
    let push = overlap * 0.5;
    a.pos = a.pos.add(normal.scale(-push * b.size / total));
    b.pos = b.pos.add(normal.scale(push * a.size / total));

    let (m1, m2) = (a.size, b.size);
    let (v1, v2) = (a.input, b.input);
    let blend = |va: f64, vb: f64, ma: f64, mb: f64| {
        (va * (ma - mb) + 2.0 * mb * vb) / (ma + mb) * cfg.collision_damping
    };
    a.input = Vec2::new(blend(v1.x, v2.x, m1, m2), blend(v1.y, v2.y, m1, m2));
    b.input = Vec2::new(blend(v2.x, v1.x, m2, m1), blend(v2.y, v1.y, m2, m1));
}

/// Runs every unordered pair once, in roster order, and removes absorbed players.
pub fn tick_collisions(players: &mut Vec<Player>, cfg: CollisionConfig) -> Vec<Absorption> {
    let n = players.len();
    let mut eaten_by: Vec<Option<u64>> = vec![None; n];

    for i in 0..n {
        for j in (i + 1)..n {
            if eaten_by[i].is_some() || eaten_by[j].is_some() {
                continue;
            }
            let (left, right) = players.split_at_mut(j);
            let (a, b) = (&mut left[i], &mut right[0]);
            match resolve_pair(a, b, cfg) {
                PairOutcome::LeftAbsorbed => eaten_by[j] = Some(a.id),
                PairOutcome::RightAbsorbed => eaten_by[i] = Some(b.id),
                PairOutcome::Apart | PairOutcome::Bounced => {}
            }
        }
    }

    let mut absorptions = Vec::new();
    let mut survivors = Vec::with_capacity(n);
    for (p, eater) in players.drain(..).zip(eaten_by) {
        match eater {
            Some(eater_id) => absorptions.push(Absorption { eater_id, eaten: p }),
            None => survivors.push(p),
        }
    }
    *players = survivors;
    absorptions
}
