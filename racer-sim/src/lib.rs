pub mod ai;
pub mod checkpoints;
pub mod map;
pub mod physics;
pub mod race;
pub mod session;
pub mod vehicle;
