// One game instance: roster, food, lifecycle phase and the per-tick pipeline.
//
// A lobby never touches timers, sockets, or other lobbies directly. It reports
// what should happen through `Effect`s and its owner carries them out.

use super::types::{ConnectionId, Delivery, Effect, LobbyTimer, PlayerId, ServerEvent};
use crate::domain::systems::collisions::{self, CollisionConfig};
use crate::domain::systems::food::{self, FoodConfig};
use crate::domain::systems::movement::{self, MovementConfig};
use crate::domain::{
    FoodItem, GameConfig, LobbyError, LobbyPhase, Player, PlayerSnapshot, RosterEntry, SimFault,
    Vec2,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

const COUNTDOWN_STEP: Duration = Duration::from_secs(1);

#[derive(Debug)]
pub struct Lobby {
    code: String,
    config: Arc<GameConfig>,
    phase: LobbyPhase,
    // Ascending player id, which is also join order.
    roster: Vec<Player>,
    food: Vec<FoodItem>,
    countdown: u32,
    // Set once game_over went out; teardown is pending.
    finished: bool,
    last_tick_at: Duration,
}

impl Lobby {
    pub fn new(code: String, config: Arc<GameConfig>) -> Self {
        let countdown = config.countdown_seconds;
        Self {
            code,
            config,
            phase: LobbyPhase::Lobby,
            roster: Vec::new(),
            food: Vec::new(),
            countdown,
            finished: false,
            last_tick_at: Duration::ZERO,
        }
    }

    pub fn code(&self) -> &str {
        &self.code
    }

    pub fn phase(&self) -> LobbyPhase {
        self.phase
    }

    pub fn roster(&self) -> &[Player] {
        &self.roster
    }

    pub fn food(&self) -> &[FoodItem] {
        &self.food
    }

    pub fn countdown(&self) -> u32 {
        self.countdown
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn is_empty(&self) -> bool {
        self.roster.is_empty()
    }

    pub fn player(&self, player_id: PlayerId) -> Option<&Player> {
        self.roster.iter().find(|p| p.id == player_id)
    }

    #[cfg(test)]
    pub(crate) fn player_mut(&mut self, player_id: PlayerId) -> Option<&mut Player> {
        self.roster.iter_mut().find(|p| p.id == player_id)
    }

    pub fn connection_ids(&self) -> Vec<ConnectionId> {
        self.roster.iter().map(|p| p.connection_id).collect()
    }

    pub fn check_joinable(&self) -> Result<(), LobbyError> {
        if self.phase != LobbyPhase::Lobby {
            return Err(LobbyError::NotJoinable);
        }
        if self.roster.len() >= self.config.max_players {
            return Err(LobbyError::Full);
        }
        Ok(())
    }

    pub fn add_player(
        &mut self,
        player_id: PlayerId,
        connection_id: ConnectionId,
        name: String,
        now: Duration,
    ) -> Result<&Player, LobbyError> {
        self.check_joinable()?;

        let color = self.next_color();
        self.roster.push(Player::new(
            player_id,
            connection_id,
            name,
            color,
            self.config.player_start_size,
            now,
        ));
        info!(lobby = %self.code, player_id, color, roster = self.roster.len(), "player joined");
        Ok(&self.roster[self.roster.len() - 1])
    }

    // First unused palette entry; cyclic by roster size once all are taken.
    fn next_color(&self) -> &'static str {
        let palette = &self.config.palette;
        palette
            .iter()
            .copied()
            .find(|c| self.roster.iter().all(|p| p.color != *c))
            .or_else(|| palette.get(self.roster.len() % palette.len().max(1)).copied())
            .unwrap_or("#ffffff")
    }

    /// Lobby-wide multicast, addressed to whoever is on the roster right now.
    pub fn broadcast(&self, event: ServerEvent, out: &mut Vec<Effect>) {
        let to = self.connection_ids();
        if to.is_empty() {
            return;
        }
        out.push(Effect::Deliver(Delivery { to, event }));
    }

    pub fn broadcast_roster(&self, out: &mut Vec<Effect>) {
        let players = self.roster.iter().map(RosterEntry::from).collect();
        self.broadcast(ServerEvent::LobbyUpdate { players }, out);
    }

    fn snapshots(&self) -> Vec<PlayerSnapshot> {
        self.roster.iter().map(PlayerSnapshot::from).collect()
    }

    /// Records activity for the inactivity reaper.
    pub fn touch(&mut self, player_id: PlayerId, now: Duration) {
        if let Some(p) = self.roster.iter_mut().find(|p| p.id == player_id) {
            p.last_activity = now;
        }
    }

    pub fn toggle_ready(
        &mut self,
        player_id: PlayerId,
        out: &mut Vec<Effect>,
    ) -> Result<(), LobbyError> {
        if self.phase == LobbyPhase::Playing {
            return Err(LobbyError::GameInProgress);
        }
        let p = self
            .roster
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(LobbyError::NotInLobby)?;
        p.ready = !p.ready;
        debug!(lobby = %self.code, player_id, ready = p.ready, "ready toggled");

        self.broadcast_roster(out);
        self.maybe_begin_countdown(out);
        Ok(())
    }

    pub fn set_input(&mut self, player_id: PlayerId, input: Vec2) -> Result<(), LobbyError> {
        let p = self
            .roster
            .iter_mut()
            .find(|p| p.id == player_id)
            .ok_or(LobbyError::NotInLobby)?;
        p.input = input.normalized();
        Ok(())
    }

    fn maybe_begin_countdown(&mut self, out: &mut Vec<Effect>) {
        if self.phase != LobbyPhase::Lobby {
            return;
        }
        if self.roster.len() < self.config.min_players_to_start || !self.roster.iter().all(|p| p.ready)
        {
            return;
        }

        self.phase = LobbyPhase::Countdown;
        self.countdown = self.config.countdown_seconds;
        info!(lobby = %self.code, count = self.countdown, "countdown started");
        self.broadcast(
            ServerEvent::Countdown {
                count: self.countdown,
            },
            out,
        );
        out.push(Effect::Arm {
            timer: LobbyTimer::Countdown,
            delay: COUNTDOWN_STEP,
            period: Some(COUNTDOWN_STEP),
        });
    }

    /// One-second countdown step; starts the game when it reaches zero.
    pub fn countdown_tick<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        rng: &mut R,
        out: &mut Vec<Effect>,
    ) {
        if self.phase != LobbyPhase::Countdown {
            warn!(lobby = %self.code, phase = self.phase.as_str(), "stale countdown timer");
            out.push(Effect::Disarm(LobbyTimer::Countdown));
            return;
        }

        self.countdown = self.countdown.saturating_sub(1);
        self.broadcast(
            ServerEvent::Countdown {
                count: self.countdown,
            },
            out,
        );

        if self.countdown == 0 {
            out.push(Effect::Disarm(LobbyTimer::Countdown));
            self.start_game(now, rng, out);
        }
    }

    fn start_game<R: Rng + ?Sized>(&mut self, now: Duration, rng: &mut R, out: &mut Vec<Effect>) {
        self.phase = LobbyPhase::Playing;
        self.finished = false;
        self.last_tick_at = now;

        let count = self.roster.len();
        let radius = self.config.spawn_radius();
        for (i, p) in self.roster.iter_mut().enumerate() {
            p.pos = movement::spawn_slot(i, count, radius);
            p.size = self.config.player_start_size;
            p.input = Vec2::ZERO;
            // Lobby idling must not count against the in-game timeout.
            p.last_activity = now;
        }
        self.food = food::scatter_food(
            self.config.food_count,
            rng,
            FoodConfig::from(self.config.as_ref()),
        );

        let interval = self.config.tick_interval();
        out.push(Effect::Arm {
            timer: LobbyTimer::Tick,
            delay: interval,
            period: Some(interval),
        });

        info!(lobby = %self.code, players = count, food = self.food.len(), "game started");
        self.broadcast(
            ServerEvent::GameStart {
                players: self.snapshots(),
                food: self.food.clone(),
            },
            out,
        );
    }

    /// One simulation step: integrate, food, player collisions, reap, then
    /// broadcast the post-tick snapshot. Every stage finishes for the whole
    /// roster before the next begins.
    pub fn tick<R: Rng + ?Sized>(
        &mut self,
        now: Duration,
        rng: &mut R,
        out: &mut Vec<Effect>,
    ) -> Result<(), SimFault> {
        if self.phase != LobbyPhase::Playing || self.finished {
            return Err(SimFault::InvalidState);
        }
        self.validate()?;

        let dt = now.saturating_sub(self.last_tick_at).as_secs_f64();
        self.last_tick_at = now;

        let movement_cfg = MovementConfig::from(self.config.as_ref());
        for p in &mut self.roster {
            movement::tick_player(p, dt, movement_cfg);
        }
        self.validate()?;

        let food_events = food::tick_food(
            &mut self.roster,
            &mut self.food,
            rng,
            FoodConfig::from(self.config.as_ref()),
        );
        for ev in food_events {
            self.broadcast(ServerEvent::FoodEaten(ev), out);
        }

        let absorptions =
            collisions::tick_collisions(&mut self.roster, CollisionConfig::from(self.config.as_ref()));
        let absorbed_any = !absorptions.is_empty();
        for a in absorptions {
            info!(lobby = %self.code, eaten = a.eaten.id, by = a.eater_id, "player absorbed");
            self.broadcast(
                ServerEvent::PlayerEaten {
                    eaten: a.eaten.id,
                    by: a.eater_id,
                },
                out,
            );
            out.push(Effect::Deliver(Delivery {
                to: vec![a.eaten.connection_id],
                event: ServerEvent::YouWereEliminated,
            }));
            out.push(Effect::Eliminated(a.eaten.connection_id));
        }
        if absorbed_any && self.roster.len() <= 1 {
            self.end_game(out);
            return Ok(());
        }

        self.reap_inactive(now, out);
        if self.roster.len() <= 1 {
            self.end_game(out);
            return Ok(());
        }
        self.validate()?;

        self.broadcast(
            ServerEvent::GameUpdate {
                players: self.snapshots(),
            },
            out,
        );
        Ok(())
    }

    fn validate(&self) -> Result<(), SimFault> {
        match self.roster.iter().find(|p| !p.is_finite()) {
            Some(p) => Err(SimFault::InvalidEntity { player_id: p.id }),
            None => Ok(()),
        }
    }

    fn reap_inactive(&mut self, now: Duration, out: &mut Vec<Effect>) {
        let timeout = self.config.inactivity_timeout;
        let (idle, active): (Vec<Player>, Vec<Player>) = self
            .roster
            .drain(..)
            .partition(|p| now.saturating_sub(p.last_activity) > timeout);
        self.roster = active;

        for p in idle {
            info!(lobby = %self.code, player_id = p.id, "reaping inactive player");
            self.broadcast(ServerEvent::PlayerDisconnected { player_id: p.id }, out);
            out.push(Effect::Released(p.connection_id));
        }
    }

    fn end_game(&mut self, out: &mut Vec<Effect>) {
        if self.finished {
            return;
        }
        self.finished = true;
        out.push(Effect::Disarm(LobbyTimer::Tick));

        let winner = match self.roster.as_slice() {
            [sole] => Some((sole.id, sole.size)),
            _ => None,
        };
        info!(lobby = %self.code, winner = ?winner.map(|w| w.0), "game over");
        self.broadcast(
            ServerEvent::GameOver {
                winner: winner.map(|w| w.0),
                size: winner.map(|w| w.1),
            },
            out,
        );
        out.push(Effect::Arm {
            timer: LobbyTimer::Teardown,
            delay: self.config.game_over_delay,
            period: None,
        });
    }

    /// Drops a player whose connection went away.
    pub fn remove_player(&mut self, player_id: PlayerId, out: &mut Vec<Effect>) -> Option<Player> {
        let index = self.roster.iter().position(|p| p.id == player_id)?;
        let removed = self.roster.remove(index);
        info!(lobby = %self.code, player_id, phase = self.phase.as_str(), "player left");

        self.broadcast(ServerEvent::PlayerDisconnected { player_id }, out);
        match self.phase {
            LobbyPhase::Playing => {
                if self.roster.len() <= 1 {
                    self.end_game(out);
                }
            }
            // A running countdown keeps going even if the roster shrinks.
            LobbyPhase::Lobby | LobbyPhase::Countdown => {
                self.broadcast_roster(out);
                self.maybe_begin_countdown(out);
            }
        }
        Some(removed)
    }

    /// Hard reset back to the pre-game lobby, from any phase.
    pub fn reset_to_lobby(&mut self, out: &mut Vec<Effect>) {
        self.phase = LobbyPhase::Lobby;
        self.finished = false;
        self.food.clear();
        self.countdown = self.config.countdown_seconds;
        for p in &mut self.roster {
            p.reset(self.config.player_start_size);
        }

        out.push(Effect::Disarm(LobbyTimer::Countdown));
        out.push(Effect::Disarm(LobbyTimer::Tick));
        out.push(Effect::Disarm(LobbyTimer::Teardown));

        info!(lobby = %self.code, "lobby reset");
        self.broadcast(ServerEvent::ForceLobby, out);
        self.broadcast_roster(out);
    }

    /// Best-effort repair after a failed tick, picked by fault category.
    pub fn recover(&mut self, fault: SimFault, now: Duration, out: &mut Vec<Effect>) {
        if self.phase != LobbyPhase::Playing || self.finished {
            out.push(Effect::Disarm(LobbyTimer::Tick));
            return;
        }

        let count = self.roster.len();
        let radius = self.config.spawn_radius();
        let start_size = self.config.player_start_size;
        match fault {
            SimFault::InvalidEntity { player_id } => {
                if let Some((i, p)) = self
                    .roster
                    .iter_mut()
                    .enumerate()
                    .find(|(_, p)| p.id == player_id)
                {
                    respawn_in_place(p, movement::spawn_slot(i, count, radius), start_size);
                }
            }
            SimFault::InvalidState | SimFault::Panicked => {
                for (i, p) in self.roster.iter_mut().enumerate() {
                    respawn_in_place(p, movement::spawn_slot(i, count, radius), start_size);
                }
            }
        }
        self.last_tick_at = now;
    }
}

// Sizes only ever grow, so a finite size is kept as is.
fn respawn_in_place(p: &mut Player, slot: Vec2, start_size: f64) {
    p.pos = slot;
    p.input = Vec2::ZERO;
    if !p.size.is_finite() {
        p.size = start_size;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn lobby_with(players: u64, config: GameConfig) -> Lobby {
        let mut lobby = Lobby::new("ABCDEF".to_string(), Arc::new(config));
        for id in 1..=players {
            lobby
                .add_player(id, id + 100, format!("P{id}"), Duration::ZERO)
                .expect("join should succeed");
        }
        lobby
    }

    fn quiet_config() -> GameConfig {
        // No food so tests control every collision.
        GameConfig {
            food_count: 0,
            ..GameConfig::default()
        }
    }

    fn ready_all(lobby: &mut Lobby, out: &mut Vec<Effect>) {
        let ids: Vec<u64> = lobby.roster().iter().map(|p| p.id).collect();
        for id in ids {
            lobby.toggle_ready(id, out).expect("toggle should succeed");
        }
    }

    fn start(lobby: &mut Lobby, rng: &mut StdRng) -> Vec<Effect> {
        let mut out = Vec::new();
        ready_all(lobby, &mut out);
        let mut t = Duration::ZERO;
        while lobby.phase() == LobbyPhase::Countdown {
            t += COUNTDOWN_STEP;
            lobby.countdown_tick(t, rng, &mut out);
        }
        out
    }

    fn events(out: &[Effect]) -> Vec<&ServerEvent> {
        out.iter()
            .filter_map(|e| match e {
                Effect::Deliver(d) => Some(&d.event),
                _ => None,
            })
            .collect()
    }

    #[test]
    fn colors_stay_unique_after_someone_leaves() {
        let mut lobby = lobby_with(3, GameConfig::default());
        let mut out = Vec::new();
        lobby.remove_player(2, &mut out);
        lobby
            .add_player(4, 104, "P4".to_string(), Duration::ZERO)
            .expect("join should succeed");

        let mut colors: Vec<&str> = lobby.roster().iter().map(|p| p.color).collect();
        colors.sort();
        colors.dedup();
        assert_eq!(colors.len(), 3);
    }

    #[test]
    fn join_is_rejected_when_full_or_not_in_lobby_phase() {
        let mut lobby = lobby_with(5, GameConfig::default());
        assert_eq!(
            lobby.add_player(6, 106, "P6".to_string(), Duration::ZERO).err(),
            Some(LobbyError::Full)
        );

        let mut lobby = lobby_with(2, quiet_config());
        let mut out = Vec::new();
        ready_all(&mut lobby, &mut out);
        assert_eq!(lobby.phase(), LobbyPhase::Countdown);
        assert_eq!(lobby.check_joinable(), Err(LobbyError::NotJoinable));
    }

    #[test]
    fn countdown_needs_everyone_ready_and_minimum_players() {
        let mut lobby = lobby_with(1, quiet_config());
        let mut out = Vec::new();
        lobby.toggle_ready(1, &mut out).expect("toggle should succeed");
        assert_eq!(lobby.phase(), LobbyPhase::Lobby);

        lobby
            .add_player(2, 102, "P2".to_string(), Duration::ZERO)
            .expect("join should succeed");
        assert_eq!(lobby.phase(), LobbyPhase::Lobby);
        lobby.toggle_ready(2, &mut out).expect("toggle should succeed");

        assert_eq!(lobby.phase(), LobbyPhase::Countdown);
        assert!(out.contains(&Effect::Arm {
            timer: LobbyTimer::Countdown,
            delay: COUNTDOWN_STEP,
            period: Some(COUNTDOWN_STEP),
        }));
    }

    #[test]
    fn game_start_places_players_on_circle_and_fills_food() {
        let config = GameConfig::default();
        let radius = config.spawn_radius();
        let mut lobby = lobby_with(3, config);
        let mut rng = StdRng::seed_from_u64(5);

        let out = start(&mut lobby, &mut rng);

        assert_eq!(lobby.phase(), LobbyPhase::Playing);
        assert_eq!(lobby.food().len(), 120);
        for p in lobby.roster() {
            assert!((p.pos.length() - radius).abs() < 1e-9);
            assert_eq!(p.size, 1.0);
        }
        assert!(
            events(&out)
                .iter()
                .any(|e| matches!(e, ServerEvent::GameStart { players, food } if players.len() == 3 && food.len() == 120))
        );
        let countdown_pos = out
            .iter()
            .position(|e| *e == Effect::Disarm(LobbyTimer::Countdown))
            .expect("countdown disarmed");
        let tick_pos = out
            .iter()
            .position(|e| matches!(e, Effect::Arm { timer: LobbyTimer::Tick, .. }))
            .expect("tick armed");
        assert!(countdown_pos < tick_pos);
    }

    #[test]
    fn tick_ends_with_game_update_after_collision_events() {
        let mut lobby = lobby_with(2, GameConfig::default());
        let mut rng = StdRng::seed_from_u64(9);
        start(&mut lobby, &mut rng);
        // Drop a food item right on player 1.
        let pos = lobby.player(1).expect("player").pos;
        lobby.food.push(FoodItem { pos });

        let mut out = Vec::new();
        lobby
            .tick(Duration::from_millis(3_033), &mut rng, &mut out)
            .expect("tick should succeed");

        let evs = events(&out);
        assert!(matches!(evs.last(), Some(ServerEvent::GameUpdate { .. })));
        assert!(evs.iter().any(|e| matches!(e, ServerEvent::FoodEaten(f) if f.by == 1)));
    }

    #[test]
    fn absorption_down_to_one_player_ends_game_once() {
        let mut lobby = lobby_with(2, quiet_config());
        let mut rng = StdRng::seed_from_u64(2);
        start(&mut lobby, &mut rng);
        {
            let a = lobby.player_mut(1).expect("player 1");
            a.size = 2.0;
            a.pos = Vec2::new(0.0, 0.0);
        }
        {
            let b = lobby.player_mut(2).expect("player 2");
            b.size = 1.0;
            b.pos = Vec2::new(1.0, 0.0);
        }

        let now = Duration::from_secs(3);
        let mut out = Vec::new();
        lobby.tick(now, &mut rng, &mut out).expect("tick should succeed");

        assert_eq!(lobby.roster().len(), 1);
        assert!((lobby.player(1).expect("winner").size - 2.5).abs() < 1e-9);
        assert!(lobby.is_finished());
        let evs = events(&out);
        assert_eq!(
            evs.iter()
                .filter(|e| matches!(e, ServerEvent::GameOver { winner: Some(1), .. }))
                .count(),
            1
        );
        assert!(!evs.iter().any(|e| matches!(e, ServerEvent::GameUpdate { .. })));
        assert!(out.contains(&Effect::Disarm(LobbyTimer::Tick)));
        assert!(out.contains(&Effect::Eliminated(102)));

        // A finished game does not tick again.
        assert_eq!(
            lobby.tick(now + Duration::from_millis(33), &mut rng, &mut Vec::new()),
            Err(SimFault::InvalidState)
        );
    }

    #[test]
    fn sizes_never_shrink_across_ticks() {
        let mut lobby = lobby_with(4, GameConfig::default());
        let mut rng = StdRng::seed_from_u64(21);
        start(&mut lobby, &mut rng);
        for id in 1..=4 {
            let p = lobby.player_mut(id).expect("player");
            p.input = Vec2::new(-p.pos.x, -p.pos.y).normalized();
        }

        let step = Duration::from_millis(33);
        let mut now = Duration::from_secs(3);
        for _ in 0..120 {
            if lobby.is_finished() {
                break;
            }
            let before: Vec<(u64, f64)> = lobby.roster().iter().map(|p| (p.id, p.size)).collect();
            now += step;
            lobby.tick(now, &mut rng, &mut Vec::new()).expect("tick should succeed");
            for p in lobby.roster() {
                let (_, prev) = before.iter().find(|(id, _)| *id == p.id).expect("survivor existed");
                assert!(p.size >= *prev);
                assert!(p.size >= 1.0);
            }
        }
    }

    #[test]
    fn idle_players_are_reaped_with_disconnect_event() {
        let config = GameConfig {
            inactivity_timeout: Duration::from_secs(10),
            ..quiet_config()
        };
        let mut lobby = lobby_with(3, config);
        let mut rng = StdRng::seed_from_u64(4);
        start(&mut lobby, &mut rng);
        // Game started at t=3s; players 1 and 2 stay active.
        let now = Duration::from_secs(14);
        lobby.touch(1, now);
        lobby.touch(2, now);

        let mut out = Vec::new();
        lobby.tick(now, &mut rng, &mut out).expect("tick should succeed");

        assert!(lobby.player(3).is_none());
        assert!(events(&out).contains(&&ServerEvent::PlayerDisconnected { player_id: 3 }));
        assert!(out.contains(&Effect::Released(103)));
        assert!(!lobby.is_finished());
    }

    #[test]
    fn non_finite_entity_is_reported_and_recovered() {
        let mut lobby = lobby_with(2, quiet_config());
        let mut rng = StdRng::seed_from_u64(8);
        start(&mut lobby, &mut rng);
        lobby.player_mut(2).expect("player").pos = Vec2::new(f64::NAN, 0.0);

        let now = Duration::from_secs(4);
        let fault = lobby
            .tick(now, &mut rng, &mut Vec::new())
            .expect_err("tick should fault");
        assert_eq!(fault, SimFault::InvalidEntity { player_id: 2 });

        lobby.recover(fault, now, &mut Vec::new());
        assert!(lobby.roster().iter().all(|p| p.is_finite()));
        lobby
            .tick(now + Duration::from_millis(33), &mut rng, &mut Vec::new())
            .expect("tick after recovery should succeed");
    }

    #[test]
    fn reset_restores_defaults_and_disarms_every_timer() {
        let mut lobby = lobby_with(2, GameConfig::default());
        let mut rng = StdRng::seed_from_u64(3);
        start(&mut lobby, &mut rng);

        let mut out = Vec::new();
        lobby.reset_to_lobby(&mut out);

        assert_eq!(lobby.phase(), LobbyPhase::Lobby);
        assert!(lobby.food().is_empty());
        assert_eq!(lobby.countdown(), 3);
        for p in lobby.roster() {
            assert_eq!(p.pos, Vec2::ZERO);
            assert_eq!(p.size, 1.0);
            assert!(!p.ready);
            assert_eq!(p.input, Vec2::ZERO);
        }
        for timer in [LobbyTimer::Countdown, LobbyTimer::Tick, LobbyTimer::Teardown] {
            assert!(out.contains(&Effect::Disarm(timer)));
        }
        assert_eq!(events(&out)[0], &ServerEvent::ForceLobby);
    }

    #[test]
    fn disconnect_during_countdown_does_not_cancel_it() {
        let mut lobby = lobby_with(3, quiet_config());
        let mut out = Vec::new();
        ready_all(&mut lobby, &mut out);
        assert_eq!(lobby.phase(), LobbyPhase::Countdown);

        let mut out = Vec::new();
        lobby.remove_player(3, &mut out);

        assert_eq!(lobby.phase(), LobbyPhase::Countdown);
        assert!(!out.iter().any(|e| matches!(e, Effect::Disarm(_))));
    }
}
