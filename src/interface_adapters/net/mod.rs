// Network adapter modules: client sockets, the owning session loop, and internal HTTP routes.

pub mod client;
pub mod hub;
pub mod internal;
pub mod session_loop;

pub use client::ws_handler;
pub use internal::health_handler;
pub use session_loop::{LoopEvent, run_session_loop};
