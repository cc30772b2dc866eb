// Virtual timer table driven by the session loop (or directly by tests).
//
// Deadlines are readings of the injected clock; nothing here sleeps. The
// owner asks for `next_deadline`, waits however it likes, then drains
// `pop_due` until it returns `None`.

use super::types::{ConnectionId, LobbyTimer};
use std::collections::BTreeMap;
use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum TimerKey {
    Lobby { code: String, timer: LobbyTimer },
    EliminationNotice(ConnectionId),
}

impl TimerKey {
    pub fn lobby(code: &str, timer: LobbyTimer) -> Self {
        TimerKey::Lobby {
            code: code.to_string(),
            timer,
        }
    }
}

#[derive(Debug, Clone, Copy)]
struct Timer {
    deadline: Duration,
    period: Option<Duration>,
}

#[derive(Debug, Default)]
pub struct Scheduler {
    // BTreeMap keeps firing order deterministic for equal deadlines.
    timers: BTreeMap<TimerKey, Timer>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Arms (or re-arms) a timer `delay` after `now`, repeating every `period` if set.
    pub fn arm(&mut self, key: TimerKey, now: Duration, delay: Duration, period: Option<Duration>) {
        self.timers.insert(
            key,
            Timer {
                deadline: now + delay,
                period,
            },
        );
    }

    pub fn disarm(&mut self, key: &TimerKey) -> bool {
        self.timers.remove(key).is_some()
    }

    /// Drops every timer owned by a lobby.
    pub fn disarm_lobby(&mut self, lobby_code: &str) {
        self.timers
            .retain(|key, _| !matches!(key, TimerKey::Lobby { code, .. } if code == lobby_code));
    }

    pub fn is_armed(&self, key: &TimerKey) -> bool {
        self.timers.contains_key(key)
    }

    pub fn next_deadline(&self) -> Option<Duration> {
        self.timers.values().map(|t| t.deadline).min()
    }

    /// Takes the earliest timer due at `now`. Periodic timers are re-armed;
    /// missed periods are skipped rather than replayed.
    pub fn pop_due(&mut self, now: Duration) -> Option<TimerKey> {
        let (key, timer) = self
            .timers
            .iter()
            .filter(|(_, t)| t.deadline <= now)
            .min_by_key(|(_, t)| t.deadline)
            .map(|(k, t)| (k.clone(), *t))?;

        match timer.period {
            Some(period) => {
                let mut deadline = timer.deadline + period;
                if deadline <= now {
                    deadline = now + period;
                }
                self.timers.insert(
                    key.clone(),
                    Timer {
                        deadline,
                        period: Some(period),
                    },
                );
            }
            None => {
                self.timers.remove(&key);
            }
        }

        Some(key)
    }

    pub fn clear(&mut self) {
        self.timers.clear();
    }

    pub fn len(&self) -> usize {
        self.timers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timers.is_empty()
    }
}
