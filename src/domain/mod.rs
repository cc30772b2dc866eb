// Domain layer: core simulation types and rules.

pub mod errors;
pub mod ports;
pub mod state;
pub mod systems;
pub mod tuning;

pub use errors::{LobbyError, SimFault};
pub use ports::{Clock, SystemClock};
pub use state::{FoodItem, LobbyPhase, Player, PlayerSnapshot, RosterEntry, Vec2};
pub use tuning::GameConfig;
