use std::{
    env,
    net::{IpAddr, Ipv4Addr},
};

// Runtime/server settings (not gameplay tuning; see `domain::tuning`).

pub fn http_port() -> u16 {
    env::var("ARENA_PORT")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(3001)
}

pub fn bind_host() -> IpAddr {
    env::var("ARENA_HOST")
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(IpAddr::V4(Ipv4Addr::LOCALHOST))
}

/// Fixed seed for reproducible food placement and lobby codes.
pub fn rng_seed() -> Option<u64> {
    env::var("ARENA_SEED").ok().and_then(|v| v.parse().ok())
}

pub const EVENT_CHANNEL_CAPACITY: usize = 1024;
pub const OUTGOING_QUEUE_CAPACITY: usize = 128;
