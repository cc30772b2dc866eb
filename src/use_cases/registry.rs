// Lobby and connection registries. Owned by the session manager; only the
// session loop ever touches them, so no locking is involved.

use super::lobby::Lobby;
use super::types::{ConnectionId, PlayerId};
use crate::domain::{GameConfig, LobbyError};
use rand::Rng;
use std::collections::HashMap;
use std::sync::Arc;

// Uppercase letters and digits minus the easily confused ones (0/O, 1/I).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const MAX_CODE_ATTEMPTS: usize = 32;

/// Canonical form of a user-typed lobby code.
pub fn normalize_code(raw: &str) -> String {
    raw.trim().to_ascii_uppercase()
}

#[derive(Debug)]
pub struct LobbyRegistry {
    config: Arc<GameConfig>,
    lobbies: HashMap<String, Lobby>,
}

impl LobbyRegistry {
    pub fn new(config: Arc<GameConfig>) -> Self {
        Self {
            config,
            lobbies: HashMap::new(),
        }
    }

    /// Creates an empty lobby under a fresh code, retrying on collisions.
    pub fn create<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<String, LobbyError> {
        for _ in 0..MAX_CODE_ATTEMPTS {
            let code = generate_code(rng, self.config.lobby_code_len);
            if self.lobbies.contains_key(&code) {
                continue;
            }
            self.lobbies
                .insert(code.clone(), Lobby::new(code.clone(), self.config.clone()));
            return Ok(code);
        }
        Err(LobbyError::CodeSpaceExhausted)
    }

    pub fn get(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    pub fn get_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn remove(&mut self, code: &str) -> Option<Lobby> {
        self.lobbies.remove(code)
    }

    pub fn len(&self) -> usize {
        self.lobbies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lobbies.is_empty()
    }
}

fn generate_code<R: Rng + ?Sized>(rng: &mut R, len: usize) -> String {
    (0..len)
        .map(|_| CODE_ALPHABET[rng.random_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

/// Session identity of one live transport link.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Connection {
    pub id: ConnectionId,
    pub player: Option<PlayerId>,
    pub lobby: Option<String>,
}

#[derive(Debug)]
pub struct ConnectionRegistry {
    connections: HashMap<ConnectionId, Connection>,
    next_id: ConnectionId,
}

impl ConnectionRegistry {
    pub fn new() -> Self {
        Self {
            connections: HashMap::new(),
            next_id: 1,
        }
    }

    pub fn open(&mut self) -> ConnectionId {
        let id = self.next_id;
        self.next_id += 1;
        self.connections.insert(
            id,
            Connection {
                id,
                player: None,
                lobby: None,
            },
        );
        id
    }

    pub fn close(&mut self, id: ConnectionId) -> Option<Connection> {
        self.connections.remove(&id)
    }

    pub fn get(&self, id: ConnectionId) -> Option<&Connection> {
        self.connections.get(&id)
    }

    pub fn get_mut(&mut self, id: ConnectionId) -> Option<&mut Connection> {
        self.connections.get_mut(&id)
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Connection> {
        self.connections.values_mut()
    }

    pub fn ids(&self) -> Vec<ConnectionId> {
        let mut ids: Vec<ConnectionId> = self.connections.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }
}

impl Default for ConnectionRegistry {
    fn default() -> Self {
        Self::new()
    }
}
