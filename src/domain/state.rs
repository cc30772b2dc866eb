// Domain-level simulation entities and snapshot types.

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vec2 {
    pub x: f64,
    pub y: f64,
}

impl Vec2 {
    pub const ZERO: Vec2 = Vec2 { x: 0.0, y: 0.0 };

    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn length(self) -> f64 {
        self.x.hypot(self.y)
    }

    pub fn distance(self, other: Vec2) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }

    pub fn is_zero(self) -> bool {
        self.x == 0.0 && self.y == 0.0
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// Unit vector in the same direction, or zero for a zero-length vector.
    pub fn normalized(self) -> Vec2 {
        let len = self.length();
        if len <= f64::EPSILON {
            Vec2::ZERO
        } else {
            Vec2::new(self.x / len, self.y / len)
        }
    }

    pub fn scale(self, k: f64) -> Vec2 {
        Vec2::new(self.x * k, self.y * k)
    }

    pub fn add(self, other: Vec2) -> Vec2 {
        Vec2::new(self.x + other.x, self.y + other.y)
    }
}

/// Lobby lifecycle phase. Game end is an action, not a stored phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyPhase {
    Lobby,
    Countdown,
    Playing,
}

impl LobbyPhase {
    pub fn as_str(self) -> &'static str {
        match self {
            LobbyPhase::Lobby => "lobby",
            LobbyPhase::Countdown => "countdown",
            LobbyPhase::Playing => "playing",
        }
    }
}

#[derive(Debug, Clone)]
pub struct Player {
    pub id: u64,
    pub connection_id: u64,
    pub name: String,
    pub color: &'static str,
    pub pos: Vec2,
    pub size: f64,
    pub ready: bool,

    // Movement-only state (do not serialize to clients)
    pub input: Vec2,             // unit length or zero; edge bounces damp it
    pub last_activity: Duration, // monotonic clock reading
}

impl Player {
    pub fn new(
        id: u64,
        connection_id: u64,
        name: String,
        color: &'static str,
        start_size: f64,
        now: Duration,
    ) -> Self {
        Self {
            id,
            connection_id,
            name,
            color,
            pos: Vec2::ZERO,
            size: start_size,
            ready: false,
            input: Vec2::ZERO,
            last_activity: now,
        }
    }

    /// Back to pre-game defaults, as used by a lobby reset.
    pub fn reset(&mut self, start_size: f64) {
        self.pos = Vec2::ZERO;
        self.size = start_size;
        self.ready = false;
        self.input = Vec2::ZERO;
    }

    pub fn is_finite(&self) -> bool {
        self.pos.is_finite() && self.input.is_finite() && self.size.is_finite()
    }
}

/// A static pickup; its position doubles as its identity on the wire.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FoodItem {
    pub pos: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RosterEntry {
    pub id: u64,
    pub name: String,
    pub ready: bool,
    pub color: &'static str,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PlayerSnapshot {
    pub id: u64,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl From<&Player> for RosterEntry {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            name: p.name.clone(),
            ready: p.ready,
            color: p.color,
        }
    }
}

impl From<&Player> for PlayerSnapshot {
    fn from(p: &Player) -> Self {
        Self {
            id: p.id,
            x: p.pos.x,
            y: p.pos.y,
            size: p.size,
        }
    }
}
