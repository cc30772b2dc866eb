use std::time::Duration;

/// Gameplay tuning for the arena simulation.
///
/// Keep this separate from runtime/server configuration (bind address, seeds, etc.).
/// Values are fixed at startup and shared read-only between every lobby.
#[derive(Debug, Clone)]
pub struct GameConfig {
    /// Target number of food items on the map at game start.
    pub food_count: usize,

    /// Size every player starts with; sizes never drop below this.
    pub player_start_size: f64,

    /// World-space pickup radius of a food item.
    pub food_radius: f64,

    /// Size gained per food item eaten.
    pub growth_increment: f64,

    /// A player absorbs another when its size exceeds `other * absorption_threshold`.
    pub absorption_threshold: f64,

    /// Movement force; actual speed is `force * size^-0.5`.
    pub force_magnitude: f64,

    /// Fraction of `food_count` below which a respawn batch is spawned.
    pub respawn_threshold: f64,

    /// Number of food items spawned per respawn batch.
    pub respawn_batch: usize,

    pub map_half_width: f64,
    pub map_half_height: f64,

    /// Distance from an edge at which the bounce-back kicks in.
    pub boundary_distance: f64,

    /// Damping applied to the input component reflected off an edge.
    pub bounce_factor: f64,

    /// Share of the eaten player's input the eater inherits (scaled by size ratio).
    pub absorb_momentum_damping: f64,

    /// Damping applied to the exchanged inputs of two bouncing players.
    pub collision_damping: f64,

    pub max_players: usize,
    pub min_players_to_start: usize,
    pub countdown_seconds: u32,

    /// Simulation ticks per second while a lobby is playing.
    pub tick_rate: u32,

    /// Players without activity for longer than this are reaped mid-game.
    pub inactivity_timeout: Duration,

    /// Delay between `game_over` and lobby teardown.
    pub game_over_delay: Duration,

    /// Delay between an elimination notice and the `force_lobby` follow-up.
    pub elimination_notice_delay: Duration,

    /// A created lobby nobody joins within this window is discarded.
    pub unclaimed_lobby_timeout: Duration,

    /// Player colours; a joiner gets the first one not already taken in the lobby.
    pub palette: Vec<&'static str>,

    pub max_name_len: usize,
    pub lobby_code_len: usize,
}

impl GameConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.tick_rate.max(1)))
    }

    /// Radius of the circle players are placed on at game start.
    pub fn spawn_radius(&self) -> f64 {
        self.map_half_width.min(self.map_half_height) / 3.0
    }

    /// Food count below which a respawn batch is triggered.
    pub fn respawn_floor(&self) -> f64 {
        self.food_count as f64 * self.respawn_threshold
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            food_count: 120,
            player_start_size: 1.0,
            food_radius: 0.3,
            growth_increment: 0.05,
            absorption_threshold: 1.2,
            force_magnitude: 8.0,
            respawn_threshold: 0.8,
            respawn_batch: 10,
            map_half_width: 25.0,
            map_half_height: 25.0,
            boundary_distance: 0.5,
            bounce_factor: 0.5,
            absorb_momentum_damping: 0.5,
            collision_damping: 0.8,
            max_players: 5,
            min_players_to_start: 2,
            countdown_seconds: 3,
            tick_rate: 30,
            inactivity_timeout: Duration::from_secs(30),
            game_over_delay: Duration::from_secs(5),
            elimination_notice_delay: Duration::from_secs(3),
            unclaimed_lobby_timeout: Duration::from_secs(60),
            palette: vec!["#ff6b6b", "#4ecdc4", "#ffd93d", "#6c5ce7", "#a8e6cf"],
            max_name_len: 16,
            lobby_code_len: 6,
        }
    }
}
