use std::fmt;

// State-precondition failures reported back to the requesting connection.
// No state is mutated when one of these is returned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LobbyError {
    NotFound,
    NotJoinable,
    Full,
    AlreadyInLobby,
    NotInLobby,
    GameInProgress,
    CodeSpaceExhausted,
}

impl fmt::Display for LobbyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            LobbyError::NotFound => "lobby not found",
            LobbyError::NotJoinable => "lobby is not accepting players",
            LobbyError::Full => "lobby is full",
            LobbyError::AlreadyInLobby => "already in a lobby",
            LobbyError::NotInLobby => "not in a lobby",
            LobbyError::GameInProgress => "game already in progress",
            LobbyError::CodeSpaceExhausted => "could not allocate lobby code",
        };
        f.write_str(message)
    }
}

// Faults raised while simulating one lobby tick.
// Recovery is chosen by category; the loop never stops for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SimFault {
    // A single player ended up with non-finite position, size, or input.
    InvalidEntity { player_id: u64 },
    // Lobby-wide state is inconsistent (e.g. ticking outside of a game).
    InvalidState,
    // The tick panicked; state may be partially updated.
    Panicked,
}

impl fmt::Display for SimFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SimFault::InvalidEntity { player_id } => write!(f, "invalid entity {player_id}"),
            SimFault::InvalidState => f.write_str("invalid lobby state"),
            SimFault::Panicked => f.write_str("tick panicked"),
        }
    }
}
