// Use-case level inputs/outputs for the session engine.

use crate::domain::systems::food::FoodEvent;
use crate::domain::{FoodItem, PlayerSnapshot, RosterEntry, Vec2};
use std::time::Duration;

pub type ConnectionId = u64;
pub type PlayerId = u64;

/// Validated client requests, decoded by the protocol adapter.
#[derive(Debug, Clone, PartialEq)]
pub enum ClientCommand {
    CreateLobby,
    JoinLobby {
        lobby_id: String,
        name: Option<String>,
    },
    ToggleReady,
    PlayerInput {
        lobby_id: String,
        input: Vec2,
    },
    RequestLobby,
}

/// Everything the engine reports to clients, before wire encoding.
#[derive(Debug, Clone, PartialEq)]
pub enum ServerEvent {
    Welcome {
        client_id: ConnectionId,
        player_id: PlayerId,
        lobby_id: String,
    },
    LobbyCreated {
        lobby_id: String,
    },
    LobbyUpdate {
        players: Vec<RosterEntry>,
    },
    Countdown {
        count: u32,
    },
    GameStart {
        players: Vec<PlayerSnapshot>,
        food: Vec<FoodItem>,
    },
    GameUpdate {
        players: Vec<PlayerSnapshot>,
    },
    FoodEaten(FoodEvent),
    PlayerEaten {
        eaten: PlayerId,
        by: PlayerId,
    },
    YouWereEliminated,
    PlayerDisconnected {
        player_id: PlayerId,
    },
    GameOver {
        winner: Option<PlayerId>,
        size: Option<f64>,
    },
    ForceLobby,
    PrepareReconnect,
    Error {
        message: String,
    },
}

/// One event addressed to a resolved set of connections.
#[derive(Debug, Clone, PartialEq)]
pub struct Delivery {
    pub to: Vec<ConnectionId>,
    pub event: ServerEvent,
}

/// Instructions for the transport, in the order they must be carried out.
#[derive(Debug, Clone, PartialEq)]
pub enum Outbound {
    Deliver(Delivery),
    Close(ConnectionId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum LobbyTimer {
    Countdown,
    Tick,
    Teardown,
    // Removes a created lobby if nobody has joined it yet.
    Unclaimed,
}

/// Side effects a lobby asks its owner to carry out.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    Deliver(Delivery),
    // Player was absorbed: unbind the player, keep the lobby binding until the notice expires.
    Eliminated(ConnectionId),
    // Player was dropped without a transport close: unbind player and lobby.
    Released(ConnectionId),
    Arm {
        timer: LobbyTimer,
        delay: Duration,
        period: Option<Duration>,
    },
    Disarm(LobbyTimer),
}
