// Use cases layer: lobby lifecycle, timers and session routing.

pub mod lobby;
pub mod registry;
pub mod scheduler;
pub mod session;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;

pub use lobby::Lobby;
pub use registry::{Connection, normalize_code};
pub use scheduler::TimerKey;
pub use session::SessionManager;
pub use types::{ClientCommand, ConnectionId, Delivery, LobbyTimer, Outbound, PlayerId, ServerEvent};
