use std::time::{Duration, Instant};

// Port for reading monotonic time; swapped for a manual clock in tests.
pub trait Clock: Send {
    // Time elapsed since the clock's origin.
    fn now(&self) -> Duration;
}

// Wall-clock backed implementation used by the running server.
#[derive(Debug, Clone, Copy)]
pub struct SystemClock {
    origin: Instant,
}

impl SystemClock {
    pub fn new(origin: Instant) -> Self {
        Self { origin }
    }
}

impl Clock for SystemClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}
