// Wire protocol DTOs and conversions for the public WebSocket API.
//
// Every frame is a JSON object with a `type` discriminator (snake_case) and
// camelCase fields. Ids travel as strings.

use crate::domain::{FoodItem, PlayerSnapshot, RosterEntry, Vec2};
use crate::use_cases::{ClientCommand, ServerEvent};
use axum::extract::ws::Utf8Bytes;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

pub const PROTOCOL_VERSION: u64 = 1;

const CLIENT_TYPES: &[&str] = &[
    "create_lobby",
    "join_lobby",
    "toggle_ready",
    "player_input",
    "request_lobby",
];

/// Messages the client sends to the server over the WebSocket.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    CreateLobby,
    JoinLobby {
        lobby_id: String,
        #[serde(default)]
        name: Option<String>,
    },
    ToggleReady,
    PlayerInput {
        lobby_id: String,
        input: InputDto,
    },
    RequestLobby,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct InputDto {
    pub x: f64,
    pub y: f64,
}

impl From<ClientMessage> for ClientCommand {
    fn from(msg: ClientMessage) -> Self {
        match msg {
            ClientMessage::CreateLobby => ClientCommand::CreateLobby,
            ClientMessage::JoinLobby { lobby_id, name } => ClientCommand::JoinLobby { lobby_id, name },
            ClientMessage::ToggleReady => ClientCommand::ToggleReady,
            ClientMessage::PlayerInput { lobby_id, input } => ClientCommand::PlayerInput {
                lobby_id,
                input: Vec2::new(input.x, input.y),
            },
            ClientMessage::RequestLobby => ClientCommand::RequestLobby,
        }
    }
}

/// Why an inbound frame was refused. Reported to the sender as `error`.
#[derive(Debug, Clone, PartialEq)]
pub enum ProtocolError {
    InvalidJson,
    NotAnObject,
    MissingType,
    UnknownType(String),
    UnsupportedVersion,
    InvalidShape(String),
    NonFiniteInput,
    BinaryFrame,
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProtocolError::InvalidJson => f.write_str("invalid JSON"),
            ProtocolError::NotAnObject => f.write_str("message must be a JSON object"),
            ProtocolError::MissingType => f.write_str("missing message type"),
            ProtocolError::UnknownType(kind) => write!(f, "unknown message type: {kind}"),
            ProtocolError::UnsupportedVersion => write!(
                f,
                "unsupported protocol version (expected {PROTOCOL_VERSION})"
            ),
            ProtocolError::InvalidShape(detail) => write!(f, "invalid message: {detail}"),
            ProtocolError::NonFiniteInput => f.write_str("input must be finite"),
            ProtocolError::BinaryFrame => f.write_str("binary messages not supported"),
        }
    }
}

/// Validates envelope and shape, then converts to a use-case command.
pub fn decode_client_message(text: &str) -> Result<ClientCommand, ProtocolError> {
    let value: Value = serde_json::from_str(text).map_err(|_| ProtocolError::InvalidJson)?;
    let object = value.as_object().ok_or(ProtocolError::NotAnObject)?;

    let kind = match object.get("type") {
        Some(Value::String(kind)) => kind.as_str(),
        Some(_) | None => return Err(ProtocolError::MissingType),
    };
    if !CLIENT_TYPES.contains(&kind) {
        return Err(ProtocolError::UnknownType(kind.to_string()));
    }
    if let Some(version) = object.get("v") {
        if version.as_u64() != Some(PROTOCOL_VERSION) {
            return Err(ProtocolError::UnsupportedVersion);
        }
    }

    let msg: ClientMessage =
        serde_json::from_value(value).map_err(|e| ProtocolError::InvalidShape(e.to_string()))?;
    if let ClientMessage::PlayerInput { input, .. } = &msg {
        if !input.x.is_finite() || !input.y.is_finite() {
            return Err(ProtocolError::NonFiniteInput);
        }
    }
    Ok(msg.into())
}

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    Welcome {
        client_id: String,
        player_id: String,
        lobby_id: String,
    },
    LobbyCreated {
        lobby_id: String,
    },
    LobbyUpdate {
        players: Vec<RosterEntryDto>,
    },
    Countdown {
        count: u32,
    },
    GameStart {
        players: Vec<PlayerStateDto>,
        food: Vec<FoodDto>,
    },
    GameUpdate {
        players: Vec<PlayerStateDto>,
    },
    FoodEaten {
        x: f64,
        y: f64,
        by: String,
        #[serde(skip_serializing_if = "Option::is_none")]
        new_food: Option<FoodDto>,
    },
    PlayerEaten {
        eaten: String,
        by: String,
    },
    YouWereEliminated,
    PlayerDisconnected {
        player_id: String,
    },
    GameOver {
        winner: Option<String>,
        size: Option<f64>,
    },
    ForceLobby,
    PrepareReconnect,
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, Serialize)]
pub struct RosterEntryDto {
    pub id: String,
    pub name: String,
    pub ready: bool,
    pub color: String,
}

impl From<&RosterEntry> for RosterEntryDto {
    fn from(entry: &RosterEntry) -> Self {
        Self {
            id: entry.id.to_string(),
            name: entry.name.clone(),
            ready: entry.ready,
            color: entry.color.to_string(),
        }
    }
}

/// Flattened player state for game_start / game_update.
#[derive(Debug, Clone, Serialize)]
pub struct PlayerStateDto {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub size: f64,
}

impl From<&PlayerSnapshot> for PlayerStateDto {
    fn from(p: &PlayerSnapshot) -> Self {
        Self {
            id: p.id.to_string(),
            x: p.x,
            y: p.y,
            size: p.size,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct FoodDto {
    pub x: f64,
    pub y: f64,
}

impl From<&FoodItem> for FoodDto {
    fn from(item: &FoodItem) -> Self {
        Self {
            x: item.pos.x,
            y: item.pos.y,
        }
    }
}

impl From<ServerEvent> for ServerMessage {
    fn from(event: ServerEvent) -> Self {
        match event {
            ServerEvent::Welcome {
                client_id,
                player_id,
                lobby_id,
            } => ServerMessage::Welcome {
                client_id: client_id.to_string(),
                player_id: player_id.to_string(),
                lobby_id,
            },
            ServerEvent::LobbyCreated { lobby_id } => ServerMessage::LobbyCreated { lobby_id },
            ServerEvent::LobbyUpdate { players } => ServerMessage::LobbyUpdate {
                players: players.iter().map(RosterEntryDto::from).collect(),
            },
            ServerEvent::Countdown { count } => ServerMessage::Countdown { count },
            ServerEvent::GameStart { players, food } => ServerMessage::GameStart {
                players: players.iter().map(PlayerStateDto::from).collect(),
                food: food.iter().map(FoodDto::from).collect(),
            },
            ServerEvent::GameUpdate { players } => ServerMessage::GameUpdate {
                players: players.iter().map(PlayerStateDto::from).collect(),
            },
            ServerEvent::FoodEaten(ev) => ServerMessage::FoodEaten {
                x: ev.eaten.x,
                y: ev.eaten.y,
                by: ev.by.to_string(),
                new_food: ev.new_food.as_ref().map(FoodDto::from),
            },
            ServerEvent::PlayerEaten { eaten, by } => ServerMessage::PlayerEaten {
                eaten: eaten.to_string(),
                by: by.to_string(),
            },
            ServerEvent::YouWereEliminated => ServerMessage::YouWereEliminated,
            ServerEvent::PlayerDisconnected { player_id } => ServerMessage::PlayerDisconnected {
                player_id: player_id.to_string(),
            },
            ServerEvent::GameOver { winner, size } => ServerMessage::GameOver {
                winner: winner.map(|id| id.to_string()),
                size,
            },
            ServerEvent::ForceLobby => ServerMessage::ForceLobby,
            ServerEvent::PrepareReconnect => ServerMessage::PrepareReconnect,
            ServerEvent::Error { message } => ServerMessage::Error { message },
        }
    }
}

/// Serializes one event into a shareable text frame payload.
pub fn encode_event(event: ServerEvent) -> Result<Utf8Bytes, serde_json::Error> {
    let msg = ServerMessage::from(event);
    serde_json::to_string(&msg).map(Utf8Bytes::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::systems::food::FoodEvent;
    use serde_json::json;

    fn encoded(event: ServerEvent) -> Value {
        let bytes = encode_event(event).expect("event should encode");
        serde_json::from_str(bytes.as_str()).expect("encoded event should be JSON")
    }

    #[test]
    fn decodes_every_client_message() {
        assert_eq!(
            decode_client_message(r#"{"type":"create_lobby"}"#),
            Ok(ClientCommand::CreateLobby)
        );
        assert_eq!(
            decode_client_message(r#"{"type":"join_lobby","lobbyId":"ABC234","name":"Ada","v":1}"#),
            Ok(ClientCommand::JoinLobby {
                lobby_id: "ABC234".to_string(),
                name: Some("Ada".to_string()),
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"join_lobby","lobbyId":"ABC234"}"#),
            Ok(ClientCommand::JoinLobby {
                lobby_id: "ABC234".to_string(),
                name: None,
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"toggle_ready"}"#),
            Ok(ClientCommand::ToggleReady)
        );
        assert_eq!(
            decode_client_message(
                r#"{"type":"player_input","lobbyId":"ABC234","input":{"x":0.5,"y":-1}}"#
            ),
            Ok(ClientCommand::PlayerInput {
                lobby_id: "ABC234".to_string(),
                input: Vec2::new(0.5, -1.0),
            })
        );
        assert_eq!(
            decode_client_message(r#"{"type":"request_lobby"}"#),
            Ok(ClientCommand::RequestLobby)
        );
    }

    #[test]
    fn rejects_malformed_envelopes() {
        assert_eq!(decode_client_message("{nope"), Err(ProtocolError::InvalidJson));
        assert_eq!(decode_client_message("[1,2]"), Err(ProtocolError::NotAnObject));
        assert_eq!(
            decode_client_message(r#"{"lobbyId":"X"}"#),
            Err(ProtocolError::MissingType)
        );
        assert_eq!(
            decode_client_message(r#"{"type":7}"#),
            Err(ProtocolError::MissingType)
        );
        assert_eq!(
            decode_client_message(r#"{"type":"teleport"}"#),
            Err(ProtocolError::UnknownType("teleport".to_string()))
        );
        assert_eq!(
            decode_client_message(r#"{"type":"create_lobby","v":2}"#),
            Err(ProtocolError::UnsupportedVersion)
        );
    }

    #[test]
    fn rejects_bad_field_shapes() {
        let missing = decode_client_message(r#"{"type":"join_lobby"}"#);
        assert!(matches!(missing, Err(ProtocolError::InvalidShape(_))));

        let wrong = decode_client_message(r#"{"type":"player_input","lobbyId":"A","input":[1,0]}"#);
        assert!(matches!(wrong, Err(ProtocolError::InvalidShape(_))));

        let numeric_id = decode_client_message(r#"{"type":"join_lobby","lobbyId":42}"#);
        assert!(matches!(numeric_id, Err(ProtocolError::InvalidShape(_))));
    }

    #[test]
    fn welcome_uses_camel_case_string_ids() {
        let value = encoded(ServerEvent::Welcome {
            client_id: 3,
            player_id: 9,
            lobby_id: "ABC234".to_string(),
        });
        assert_eq!(
            value,
            json!({"type":"welcome","clientId":"3","playerId":"9","lobbyId":"ABC234"})
        );
    }

    #[test]
    fn food_eaten_omits_absent_new_food() {
        let plain = encoded(ServerEvent::FoodEaten(FoodEvent {
            eaten: Vec2::new(1.0, 2.0),
            by: 4,
            new_food: None,
        }));
        assert_eq!(plain, json!({"type":"food_eaten","x":1.0,"y":2.0,"by":"4"}));

        let respawn = encoded(ServerEvent::FoodEaten(FoodEvent {
            eaten: Vec2::new(1.0, 2.0),
            by: 4,
            new_food: Some(FoodItem {
                pos: Vec2::new(-3.0, 5.5),
            }),
        }));
        assert_eq!(respawn["newFood"], json!({"x":-3.0,"y":5.5}));
    }

    #[test]
    fn game_over_without_winner_sends_nulls() {
        let value = encoded(ServerEvent::GameOver {
            winner: None,
            size: None,
        });
        assert_eq!(value, json!({"type":"game_over","winner":null,"size":null}));

        let value = encoded(ServerEvent::GameOver {
            winner: Some(2),
            size: Some(2.5),
        });
        assert_eq!(value, json!({"type":"game_over","winner":"2","size":2.5}));
    }

    #[test]
    fn unit_events_carry_only_their_type() {
        assert_eq!(
            encoded(ServerEvent::YouWereEliminated),
            json!({"type":"you_were_eliminated"})
        );
        assert_eq!(
            encoded(ServerEvent::PlayerDisconnected { player_id: 5 }),
            json!({"type":"player_disconnected","playerId":"5"})
        );
    }
}
