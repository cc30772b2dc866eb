// Session manager: the one owner of every connection, lobby and timer.
//
// All mutation funnels through here from a single task, so nothing below is
// shared or locked. Each entry point returns the `Outbound` list the transport
// must carry out, in order.

use super::lobby::Lobby;
use super::registry::{Connection, ConnectionRegistry, LobbyRegistry, normalize_code};
use super::scheduler::{Scheduler, TimerKey};
use super::types::{
    ClientCommand, ConnectionId, Delivery, Effect, LobbyTimer, Outbound, PlayerId, ServerEvent,
};
use crate::domain::{Clock, GameConfig, LobbyError, LobbyPhase, SimFault, Vec2};
use rand::rngs::StdRng;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub struct SessionManager<C: Clock> {
    config: Arc<GameConfig>,
    clock: C,
    rng: StdRng,
    connections: ConnectionRegistry,
    lobbies: LobbyRegistry,
    scheduler: Scheduler,
    next_player_id: PlayerId,
}

impl<C: Clock> SessionManager<C> {
    pub fn new(config: GameConfig, clock: C, rng: StdRng) -> Self {
        let config = Arc::new(config);
        Self {
            lobbies: LobbyRegistry::new(config.clone()),
            config,
            clock,
            rng,
            connections: ConnectionRegistry::new(),
            scheduler: Scheduler::new(),
            next_player_id: 1,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn now(&self) -> Duration {
        self.clock.now()
    }

    pub fn connect(&mut self) -> ConnectionId {
        let id = self.connections.open();
        debug!(conn = id, total = self.connections.len(), "connection registered");
        id
    }

    /// Refreshes the inactivity clock of whatever player `conn` owns.
    pub fn touch(&mut self, conn: ConnectionId) {
        let now = self.clock.now();
        let Some(connection) = self.connections.get(conn) else {
            return;
        };
        if let (Some(player_id), Some(code)) = (connection.player, connection.lobby.as_deref()) {
            if let Some(lobby) = self.lobbies.get_mut(code) {
                lobby.touch(player_id, now);
            }
        }
    }

    pub fn handle(&mut self, conn: ConnectionId, command: ClientCommand) -> Vec<Outbound> {
        let mut out = Vec::new();
        if self.connections.get(conn).is_none() {
            warn!(conn, "command from unknown connection dropped");
            return out;
        }
        self.touch(conn);
        let now = self.clock.now();

        let result = match command {
            ClientCommand::CreateLobby => self.create_lobby(conn, &mut out),
            ClientCommand::JoinLobby { lobby_id, name } => {
                self.join_lobby(conn, &lobby_id, name.as_deref(), now, &mut out)
            }
            ClientCommand::ToggleReady => self.toggle_ready(conn, now, &mut out),
            ClientCommand::PlayerInput { lobby_id, input } => {
                self.player_input(conn, &lobby_id, input)
            }
            ClientCommand::RequestLobby => self.request_lobby(conn, now, &mut out),
        };

        if let Err(err) = result {
            debug!(conn, error = %err, "command rejected");
            out.push(reply(conn, ServerEvent::Error {
                message: err.to_string(),
            }));
        }
        out
    }

    fn create_lobby(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) -> Result<(), LobbyError> {
        let lobby_id = self.lobbies.create(&mut self.rng)?;
        info!(conn, lobby = %lobby_id, lobbies = self.lobbies.len(), "lobby created");
        self.scheduler.arm(
            TimerKey::lobby(&lobby_id, LobbyTimer::Unclaimed),
            self.clock.now(),
            self.config.unclaimed_lobby_timeout,
            None,
        );
        out.push(reply(conn, ServerEvent::LobbyCreated { lobby_id }));
        Ok(())
    }

    fn join_lobby(
        &mut self,
        conn: ConnectionId,
        raw_code: &str,
        name: Option<&str>,
        now: Duration,
        out: &mut Vec<Outbound>,
    ) -> Result<(), LobbyError> {
        let connection = self.connections.get(conn).ok_or(LobbyError::NotInLobby)?;
        if connection.player.is_some() {
            return Err(LobbyError::AlreadyInLobby);
        }

        let code = normalize_code(raw_code);
        let lobby = self.lobbies.get_mut(&code).ok_or(LobbyError::NotFound)?;
        lobby.check_joinable()?;

        let player_id = self.next_player_id;
        let name = sanitize_name(name, player_id, self.config.max_name_len);
        lobby.add_player(player_id, conn, name, now)?;
        self.next_player_id += 1;

        let mut effects = Vec::new();
        lobby.broadcast_roster(&mut effects);

        if let Some(connection) = self.connections.get_mut(conn) {
            connection.player = Some(player_id);
            connection.lobby = Some(code.clone());
        }
        // Rejoining cancels a pending return-to-lobby notice from a previous game.
        self.scheduler.disarm(&TimerKey::EliminationNotice(conn));
        self.scheduler.disarm(&TimerKey::lobby(&code, LobbyTimer::Unclaimed));

        out.push(reply(conn, ServerEvent::Welcome {
            client_id: conn,
            player_id,
            lobby_id: code.clone(),
        }));
        self.apply(&code, effects, now, out);
        Ok(())
    }

    fn toggle_ready(
        &mut self,
        conn: ConnectionId,
        now: Duration,
        out: &mut Vec<Outbound>,
    ) -> Result<(), LobbyError> {
        let (code, player_id) = self.bound_player(conn)?;
        let lobby = self.lobbies.get_mut(&code).ok_or(LobbyError::NotFound)?;
        let mut effects = Vec::new();
        lobby.toggle_ready(player_id, &mut effects)?;
        self.apply(&code, effects, now, out);
        Ok(())
    }

    fn player_input(
        &mut self,
        conn: ConnectionId,
        raw_code: &str,
        input: Vec2,
    ) -> Result<(), LobbyError> {
        let (code, player_id) = self.bound_player(conn)?;
        if normalize_code(raw_code) != code {
            return Err(LobbyError::NotInLobby);
        }
        let lobby = self.lobbies.get_mut(&code).ok_or(LobbyError::NotFound)?;
        lobby.set_input(player_id, input)
    }

    fn request_lobby(
        &mut self,
        conn: ConnectionId,
        now: Duration,
        out: &mut Vec<Outbound>,
    ) -> Result<(), LobbyError> {
        let (code, _) = self.bound_player(conn)?;
        let lobby = self.lobbies.get_mut(&code).ok_or(LobbyError::NotFound)?;
        let mut effects = Vec::new();
        lobby.reset_to_lobby(&mut effects);
        self.apply(&code, effects, now, out);
        Ok(())
    }

    fn bound_player(&self, conn: ConnectionId) -> Result<(String, PlayerId), LobbyError> {
        let connection = self.connections.get(conn).ok_or(LobbyError::NotInLobby)?;
        match (connection.lobby.as_ref(), connection.player) {
            (Some(code), Some(player_id)) => Ok((code.clone(), player_id)),
            _ => Err(LobbyError::NotInLobby),
        }
    }

    /// Transport went away: drop the player and release whatever it held.
    pub fn disconnect(&mut self, conn: ConnectionId) -> Vec<Outbound> {
        let mut out = Vec::new();
        let Some(connection) = self.connections.close(conn) else {
            return out;
        };
        self.scheduler.disarm(&TimerKey::EliminationNotice(conn));
        debug!(conn, total = self.connections.len(), "connection released");

        let Connection {
            player: Some(player_id),
            lobby: Some(code),
            ..
        } = connection
        else {
            return out;
        };
        let Some(lobby) = self.lobbies.get_mut(&code) else {
            return out;
        };

        let now = self.clock.now();
        let mut effects = Vec::new();
        lobby.remove_player(player_id, &mut effects);
        let abandoned = lobby.is_empty() && lobby.phase() != LobbyPhase::Playing;
        self.apply(&code, effects, now, &mut out);

        if abandoned {
            info!(lobby = %code, "last player left; removing lobby");
            self.remove_lobby(&code);
        }
        out
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.scheduler.next_deadline()
    }

    /// Fires every timer due at the current clock reading.
    pub fn run_due_timers(&mut self) -> Vec<Outbound> {
        let now = self.clock.now();
        let mut out = Vec::new();
        while let Some(key) = self.scheduler.pop_due(now) {
            match key {
                TimerKey::Lobby { code, timer } => self.fire_lobby_timer(&code, timer, now, &mut out),
                TimerKey::EliminationNotice(conn) => self.fire_elimination_notice(conn, &mut out),
            }
        }
        out
    }

    fn fire_lobby_timer(
        &mut self,
        code: &str,
        timer: LobbyTimer,
        now: Duration,
        out: &mut Vec<Outbound>,
    ) {
        match timer {
            LobbyTimer::Teardown => return self.teardown(code, out),
            LobbyTimer::Unclaimed => return self.expire_unclaimed(code),
            LobbyTimer::Countdown | LobbyTimer::Tick => {}
        }
        let Some(lobby) = self.lobbies.get_mut(code) else {
            warn!(lobby = %code, ?timer, "timer fired for missing lobby");
            self.scheduler.disarm_lobby(code);
            return;
        };

        let mut effects = Vec::new();
        match timer {
            LobbyTimer::Countdown => lobby.countdown_tick(now, &mut self.rng, &mut effects),
            LobbyTimer::Tick => {
                let rng = &mut self.rng;
                let outcome =
                    panic::catch_unwind(AssertUnwindSafe(|| lobby.tick(now, rng, &mut effects)));
                let fault = match outcome {
                    Ok(Ok(())) => None,
                    Ok(Err(fault)) => Some(fault),
                    Err(_) => Some(SimFault::Panicked),
                };
                if let Some(fault) = fault {
                    error!(lobby = %code, %fault, "simulation tick failed; recovering");
                    lobby.recover(fault, now, &mut effects);
                }
            }
            LobbyTimer::Teardown | LobbyTimer::Unclaimed => {}
        }
        self.apply(code, effects, now, out);
    }

    fn expire_unclaimed(&mut self, code: &str) {
        let unclaimed = self
            .lobbies
            .get(code)
            .is_some_and(|l| l.is_empty() && l.phase() == LobbyPhase::Lobby);
        if unclaimed {
            info!(lobby = %code, "nobody joined; removing lobby");
            self.remove_lobby(code);
        }
    }

    fn fire_elimination_notice(&mut self, conn: ConnectionId, out: &mut Vec<Outbound>) {
        let Some(connection) = self.connections.get_mut(conn) else {
            return;
        };
        if connection.player.is_some() {
            return;
        }
        connection.lobby = None;
        out.push(reply(conn, ServerEvent::ForceLobby));
    }

    // Post-game: everyone still seated is told to reconnect and is closed.
    fn teardown(&mut self, code: &str, out: &mut Vec<Outbound>) {
        let Some(lobby) = self.lobbies.get(code) else {
            self.scheduler.disarm_lobby(code);
            return;
        };
        let seated = lobby.connection_ids();
        info!(lobby = %code, players = seated.len(), "tearing down finished lobby");

        if !seated.is_empty() {
            out.push(Outbound::Deliver(Delivery {
                to: seated.clone(),
                event: ServerEvent::PrepareReconnect,
            }));
        }
        out.extend(seated.into_iter().map(Outbound::Close));
        self.remove_lobby(code);
    }

    fn remove_lobby(&mut self, code: &str) {
        self.lobbies.remove(code);
        self.scheduler.disarm_lobby(code);
        for connection in self.connections.iter_mut() {
            if connection.lobby.as_deref() == Some(code) {
                connection.player = None;
                connection.lobby = None;
            }
        }
    }

    fn apply(&mut self, code: &str, effects: Vec<Effect>, now: Duration, out: &mut Vec<Outbound>) {
        for effect in effects {
            match effect {
                Effect::Deliver(delivery) => out.push(Outbound::Deliver(delivery)),
                Effect::Eliminated(conn) => {
                    if let Some(connection) = self.connections.get_mut(conn) {
                        connection.player = None;
                    }
                    self.scheduler.arm(
                        TimerKey::EliminationNotice(conn),
                        now,
                        self.config.elimination_notice_delay,
                        None,
                    );
                }
                Effect::Released(conn) => {
                    if let Some(connection) = self.connections.get_mut(conn) {
                        connection.player = None;
                        connection.lobby = None;
                    }
                }
                Effect::Arm {
                    timer,
                    delay,
                    period,
                } => self
                    .scheduler
                    .arm(TimerKey::lobby(code, timer), now, delay, period),
                Effect::Disarm(timer) => {
                    self.scheduler.disarm(&TimerKey::lobby(code, timer));
                }
            }
        }
    }

    /// Process exit: drop every timer and close every live connection.
    pub fn shutdown(&mut self) -> Vec<Outbound> {
        self.scheduler.clear();
        let ids = self.connections.ids();
        info!(
            connections = ids.len(),
            lobbies = self.lobbies.len(),
            "session manager shutting down"
        );
        ids.into_iter().map(Outbound::Close).collect()
    }

    pub fn lobby(&self, code: &str) -> Option<&Lobby> {
        self.lobbies.get(code)
    }

    #[cfg(test)]
    pub(crate) fn lobby_mut(&mut self, code: &str) -> Option<&mut Lobby> {
        self.lobbies.get_mut(code)
    }

    pub fn connection(&self, conn: ConnectionId) -> Option<&Connection> {
        self.connections.get(conn)
    }

    pub fn lobby_count(&self) -> usize {
        self.lobbies.len()
    }

    pub fn connection_count(&self) -> usize {
        self.connections.len()
    }

    pub fn is_timer_armed(&self, key: &TimerKey) -> bool {
        self.scheduler.is_armed(key)
    }
}

fn reply(conn: ConnectionId, event: ServerEvent) -> Outbound {
    Outbound::Deliver(Delivery {
        to: vec![conn],
        event,
    })
}

/// Trimmed, control characters stripped, capped at `max_len` chars.
pub fn sanitize_name(raw: Option<&str>, player_id: PlayerId, max_len: usize) -> String {
    let cleaned: String = raw
        .unwrap_or_default()
        .chars()
        .filter(|c| !c.is_control())
        .collect();
    let trimmed: String = cleaned.trim().chars().take(max_len).collect();
    let trimmed = trimmed.trim_end();
    if trimmed.is_empty() {
        format!("Player {player_id}")
    } else {
        trimmed.to_string()
    }
}
