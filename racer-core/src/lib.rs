pub mod control;
pub mod entity_location;
pub mod hook;
pub mod lap_info;
pub mod race_event;
pub mod settings;

pub use settings::GLOBAL_CONFIG;

pub type AgentID = usize;
