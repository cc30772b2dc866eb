use std::sync::{Arc, Mutex};
use std::time::Duration;

use rand::SeedableRng;
use rand::rngs::StdRng;

use super::session::SessionManager;
use super::types::{ConnectionId, Outbound, ServerEvent};
use crate::domain::{Clock, GameConfig};

// Shared manual time source so timer-driven tests run without sleeping.
#[derive(Clone, Default)]
pub(crate) struct ManualClock(Arc<Mutex<Duration>>);

impl ManualClock {
    pub(crate) fn advance(&self, by: Duration) {
        let mut guard = self.0.lock().expect("clock mutex poisoned");
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Duration {
        *self.0.lock().expect("clock mutex poisoned")
    }
}

pub(crate) type TestManager = SessionManager<ManualClock>;

pub(crate) fn manager_with(config: GameConfig) -> (TestManager, ManualClock) {
    let clock = ManualClock::default();
    let manager = SessionManager::new(config, clock.clone(), StdRng::seed_from_u64(42));
    (manager, clock)
}

/// Steps the clock in `step` increments up to `total`, firing timers as they come due.
pub(crate) fn run_for(
    manager: &mut TestManager,
    clock: &ManualClock,
    total: Duration,
    step: Duration,
) -> Vec<Outbound> {
    let mut out = Vec::new();
    let mut elapsed = Duration::ZERO;
    while elapsed < total {
        clock.advance(step);
        elapsed += step;
        out.extend(manager.run_due_timers());
    }
    out
}

/// Events delivered to one connection, in order.
pub(crate) fn events_for(out: &[Outbound], conn: ConnectionId) -> Vec<ServerEvent> {
    out.iter()
        .filter_map(|o| match o {
            Outbound::Deliver(d) if d.to.contains(&conn) => Some(d.event.clone()),
            _ => None,
        })
        .collect()
}

pub(crate) fn closed(out: &[Outbound]) -> Vec<ConnectionId> {
    out.iter()
        .filter_map(|o| match o {
            Outbound::Close(id) => Some(*id),
            _ => None,
        })
        .collect()
}
