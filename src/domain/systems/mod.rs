// Per-tick simulation systems, applied in order: movement, food, collisions.

pub mod collisions;
pub mod food;
pub mod movement;
