use config::{builder::DefaultState, Config, ConfigBuilder, ConfigError, File};
use lazy_static::lazy_static;
use serde::Deserialize;

#[derive(Clone, Debug, Deserialize)]
pub struct Settings {
    pub tick_ms: u64,
    pub race: RaceSettings,
    pub ai: AiSettings,
    pub ability: AbilitySettings,
    pub vehicle: VehicleSettings,
}

#[derive(Clone, Debug, Deserialize)]
pub struct RaceSettings {
    pub total_laps: u32,
    pub get_ready_secs: f64,
    pub intro_secs: f64,
    pub countdown_from: u32,
    // largest delta a single update may consume; keeps a stalled frame from
    // skipping straight through a phase
    pub max_tick_delta: f64,
    pub overview_zoom: f64,
    pub player_zoom: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AiSettings {
    pub max_view_distance: f64,
    pub imminent_collision_distance: f64,
    pub passable_distance: f64,
    pub openness_weight: f64,
    pub alignment_weight: f64,
    pub center_deadband_degrees: f64,
    pub center_correction: f64,
    pub cornering_distance: f64,
    pub cornering_throttle: f64,
    pub brake_speed: f64,
    pub brake_strength: f64,
    pub sharp_steer: f64,
    pub sharp_steer_throttle: f64,
    pub waypoint_acceptance_radius: f64,
    pub fallback_waypoint_x: f64,
    pub fallback_waypoint_y: f64,
    pub stuck_speed: f64,
    pub stuck_detect_secs: f64,
    pub stuck_recovery_secs: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct AbilitySettings {
    pub radius: f64,
    pub force: f64,
    pub active_secs: f64,
    pub cooldown_secs: f64,
    pub detection_radius: f64,
    pub check_interval_secs: f64,
}

#[derive(Clone, Debug, Deserialize)]
pub struct VehicleSettings {
    pub mass: f64,
    pub radius: f64,
    pub accelerator: f64,
    pub reverse_accelerator: f64,
    pub brake: f64,
    pub drag_coefficient: f64,
    pub rolling_resistance_coefficient: f64,
    pub lateral_grip: f64,
    pub steering_rate: f64,
    pub player_max_speed: f64,
    pub player_max_reverse_speed: f64,
    pub npc_max_speed: f64,
    pub npc_max_reverse_speed: f64,
}

impl Settings {
    fn with_defaults() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            .set_default("tick_ms", 16)?
            .set_default("race.total_laps", 3)?
            .set_default("race.get_ready_secs", 3.0)?
            .set_default("race.intro_secs", 2.5)?
            .set_default("race.countdown_from", 4)?
            .set_default("race.max_tick_delta", 0.1)?
            .set_default("race.overview_zoom", 0.35)?
            .set_default("race.player_zoom", 1.0)?
            .set_default("ai.max_view_distance", 450.0)?
            .set_default("ai.imminent_collision_distance", 60.0)?
            .set_default("ai.passable_distance", 100.0)?
            .set_default("ai.openness_weight", 2.0)?
            .set_default("ai.alignment_weight", 1.5)?
            .set_default("ai.center_deadband_degrees", 5.0)?
            .set_default("ai.center_correction", 0.2)?
            .set_default("ai.cornering_distance", 150.0)?
            .set_default("ai.cornering_throttle", 0.2)?
            .set_default("ai.brake_speed", 400.0)?
            .set_default("ai.brake_strength", 0.5)?
            .set_default("ai.sharp_steer", 0.6)?
            .set_default("ai.sharp_steer_throttle", 0.6)?
            .set_default("ai.waypoint_acceptance_radius", 400.0)?
            .set_default("ai.fallback_waypoint_x", 2714.0)?
            .set_default("ai.fallback_waypoint_y", 1472.0)?
            .set_default("ai.stuck_speed", 10.0)?
            .set_default("ai.stuck_detect_secs", 2.0)?
            .set_default("ai.stuck_recovery_secs", 1.5)?
            .set_default("ability.radius", 150.0)?
            .set_default("ability.force", 2000.0)?
            .set_default("ability.active_secs", 0.5)?
            .set_default("ability.cooldown_secs", 5.0)?
            .set_default("ability.detection_radius", 200.0)?
            .set_default("ability.check_interval_secs", 0.5)?
            .set_default("vehicle.mass", 1.0)?
            .set_default("vehicle.radius", 20.0)?
            .set_default("vehicle.accelerator", 900.0)?
            .set_default("vehicle.reverse_accelerator", 500.0)?
            .set_default("vehicle.brake", 1200.0)?
            .set_default("vehicle.drag_coefficient", 0.0005)?
            .set_default("vehicle.rolling_resistance_coefficient", 0.8)?
            .set_default("vehicle.lateral_grip", 8.0)?
            .set_default("vehicle.steering_rate", 3.0)?
            .set_default("vehicle.player_max_speed", 800.0)?
            .set_default("vehicle.player_max_reverse_speed", 400.0)?
            .set_default("vehicle.npc_max_speed", 1100.0)?
            .set_default("vehicle.npc_max_reverse_speed", 500.0)
    }

    fn new() -> Result<Settings, ConfigError> {
        let config = Self::with_defaults()?
            .add_source(File::with_name("config.yaml").required(false))
            .build()?;

        config.try_deserialize()
    }

    /// Built-in values only, ignoring any `config.yaml` next to the binary.
    pub fn defaults() -> Result<Settings, ConfigError> {
        Self::with_defaults()?.build()?.try_deserialize()
    }

    /// Defaults overlaid with an explicit settings file.
    pub fn from_file(path: &str) -> Result<Settings, ConfigError> {
        Self::with_defaults()?
            .add_source(File::with_name(path))
            .build()?
            .try_deserialize()
    }
}

lazy_static! {
    pub static ref GLOBAL_CONFIG: Settings = Settings::new().expect("failed to read config file");
}
