use glam::DVec2;
use rand::Rng;
use serde::Serialize;

use racer_core::control::ControlIntent;
use racer_core::entity_location::EntityLocation;
use racer_core::settings::AiSettings;

use crate::checkpoints::CheckpointRegistry;
use crate::physics::{BodyHandle, PhysicsQuery};

pub mod ability;
pub mod gap_scorer;
pub mod sensors;
pub mod stuck;
pub mod waypoint;

use sensors::{SensorArray, SensorReading, CENTER_SENSOR, SENSOR_OFFSETS_DEGREES};
use stuck::{StuckDetector, StuckStatus};
use waypoint::WaypointTracker;

/// Everything the AI remembers about one computer-controlled car.
#[derive(Clone, Debug, PartialEq)]
pub struct NpcState {
    pub waypoints: WaypointTracker,
    pub sensor_readings: [SensorReading; 5],
    pub best_sensor_index: usize,
    pub stuck: StuckDetector,
    pub last_intent: ControlIntent,
}

impl NpcState {
    pub fn new(max_view_distance: f64) -> Self {
        NpcState {
            waypoints: WaypointTracker::new(),
            sensor_readings: SENSOR_OFFSETS_DEGREES
                .map(|offset| SensorReading::clear(offset, max_view_distance)),
            best_sensor_index: CENTER_SENSOR,
            stuck: StuckDetector::default(),
            last_intent: ControlIntent::idle(),
        }
    }

    /// Last scan as line segments for an overlay: blocked rays end at the
    /// hit point, and the ray the scorer picked is flagged.
    pub fn debug_rays(&self, origin: DVec2) -> Vec<SensorDebugRay> {
        self.sensor_readings
            .iter()
            .enumerate()
            .map(|(index, reading)| SensorDebugRay {
                from: origin,
                to: reading.end_point,
                hit: reading.hit,
                chosen: index == self.best_sensor_index,
            })
            .collect()
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct SensorDebugRay {
    pub from: DVec2,
    pub to: DVec2,
    pub hit: bool,
    pub chosen: bool,
}

/// The car being driven, as the physics world sees it right now.
#[derive(Clone, Copy, Debug)]
pub struct CarState {
    pub location: EntityLocation,
    pub velocity: DVec2,
    pub body: BodyHandle,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DriveOutcome {
    pub intent: ControlIntent,
    pub stuck_status: StuckStatus,
    pub waypoint_reached: bool,
}

pub struct NpcDriver {
    settings: AiSettings,
    sensors: SensorArray,
}

impl NpcDriver {
    pub fn new(settings: AiSettings) -> Self {
        let sensors = SensorArray::new(settings.max_view_distance);
        NpcDriver { settings, sensors }
    }

    pub fn settings(&self) -> &AiSettings {
        &self.settings
    }

    pub fn new_state(&self) -> NpcState {
        NpcState::new(self.settings.max_view_distance)
    }

    /// One tick for an NPC: pick the next waypoint, then steer for it.
    pub fn update(
        &self,
        state: &mut NpcState,
        car: &CarState,
        physics: &dyn PhysicsQuery,
        registry: &CheckpointRegistry,
        time_step: f64,
        rng: &mut impl Rng,
    ) -> DriveOutcome {
        let waypoint_reached = state
            .waypoints
            .update(car.location.position, registry, &self.settings);
        if waypoint_reached {
            state.stuck.clear_timer();
        }
        let goal = state.waypoints.target_position(registry, &self.settings);

        DriveOutcome {
            waypoint_reached,
            ..self.drive_towards(state, car, physics, goal, time_step, rng)
        }
    }

    /// Sense, score and pick an intent for reaching `goal`, unless a stuck
    /// recovery is in progress, in which case that wins.
    pub fn drive_towards(
        &self,
        state: &mut NpcState,
        car: &CarState,
        physics: &dyn PhysicsQuery,
        goal: DVec2,
        time_step: f64,
        rng: &mut impl Rng,
    ) -> DriveOutcome {
        state.sensor_readings = self.sensors.scan(physics, &car.location, car.body);
        let speed = car.velocity.length();
        let stuck_status = state.stuck.update(speed, time_step, &self.settings, rng);

        let intent = match state.stuck.recovery_intent() {
            Some(recovery) => recovery,
            None => {
                let bearing = car.location.bearing_to(goal);
                let choice =
                    gap_scorer::choose(&state.sensor_readings, bearing, speed, &self.settings);
                state.best_sensor_index = choice.best_index;
                ControlIntent::new(choice.throttle, choice.steer, choice.brake)
            }
        };
        state.last_intent = intent;

        DriveOutcome {
            intent,
            stuck_status,
            waypoint_reached: false,
        }
    }
}
