use glam::DVec2;

use racer_core::control::{ControlIntent, EngineStatus};
use racer_core::entity_location::EntityLocation;
use racer_core::settings::VehicleSettings;
use racer_core::AgentID;

use crate::map::{Terrain, DEFAULT_START_HEADING_DEGREES};
use crate::physics::{BodyHandle, BodyKind, BodyPurpose, PhysicsQuery, Shape, World};

// below this a car is considered parked
const REST_SPEED: f64 = 0.05;

// Where a car goes when the map has no start marker for it
pub fn fallback_start(index: usize) -> EntityLocation {
    EntityLocation::new(
        DVec2::new(500.0 + 100.0 * index as f64, 300.0),
        DEFAULT_START_HEADING_DEGREES.to_radians(),
    )
}

/// A car body plus the driving limits that apply to it. Intents turn into
/// forces on the body; the world does the moving.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vehicle {
    pub body: BodyHandle,
    pub max_speed: f64,
    pub max_reverse_speed: f64,
    pub terrain: Terrain,
    pub intent: ControlIntent,
}

impl Vehicle {
    fn spawn(
        world: &mut World,
        start: &EntityLocation,
        purpose: BodyPurpose,
        max_speed: f64,
        max_reverse_speed: f64,
        settings: &VehicleSettings,
    ) -> Vehicle {
        let body = world.create_solid_body(
            Shape::Circle {
                radius: settings.radius,
            },
            start.position,
            BodyKind::Dynamic,
            settings.mass,
            purpose,
        );
        world.set_angle(body, start.heading);
        Vehicle {
            body,
            max_speed,
            max_reverse_speed,
            terrain: Terrain::Normal,
            intent: ControlIntent::idle(),
        }
    }

    pub fn player(world: &mut World, start: &EntityLocation, settings: &VehicleSettings) -> Vehicle {
        Self::spawn(
            world,
            start,
            BodyPurpose::PlayerVehicle,
            settings.player_max_speed,
            settings.player_max_reverse_speed,
            settings,
        )
    }

    pub fn npc(
        world: &mut World,
        start: &EntityLocation,
        agent: AgentID,
        settings: &VehicleSettings,
    ) -> Vehicle {
        Self::spawn(
            world,
            start,
            BodyPurpose::NpcVehicle(agent),
            settings.npc_max_speed,
            settings.npc_max_reverse_speed,
            settings,
        )
    }

    pub fn location(&self, world: &World) -> Option<EntityLocation> {
        Some(EntityLocation::new(
            world.position(self.body)?,
            world.angle(self.body)?,
        ))
    }

    pub fn velocity(&self, world: &World) -> DVec2 {
        world.velocity(self.body).unwrap_or(DVec2::ZERO)
    }

    pub fn speed(&self, world: &World) -> f64 {
        self.velocity(world).length()
    }

    /// Turns the intent into this tick's steering and forces. Nothing moves
    /// until the world steps.
    pub fn apply_intent(
        &mut self,
        world: &mut World,
        intent: ControlIntent,
        time_step: f64,
        settings: &VehicleSettings,
    ) {
        self.intent = intent.clamped();
        let (Some(location), Some(mass)) = (self.location(world), world.mass(self.body)) else {
            return;
        };
        let velocity = self.velocity(world);

        let steered = EntityLocation::new(
            location.position,
            location.heading + self.intent.steer * settings.steering_rate * time_step,
        );
        world.set_angle(self.body, steered.heading);
        let forward = steered.unit_steer_direction();

        let engine = match self.intent.engine_status() {
            EngineStatus::Accelerating(amount) => {
                forward * mass * settings.accelerator * amount * self.terrain.acceleration()
            }
            EngineStatus::Reversing(amount) => {
                forward * -1.0 * mass * settings.reverse_accelerator * amount
                    * self.terrain.acceleration()
            }
            // braking acts against the direction of travel, not the heading
            EngineStatus::Braking(amount) => {
                velocity.normalize_or_zero() * -1.0 * mass * settings.brake * amount
            }
            EngineStatus::Neutral => DVec2::ZERO,
        };
        // air resistance grows with the square of speed, rolling resistance linearly
        let air_resistance = velocity * mass * -1.0 * settings.drag_coefficient * velocity.length();
        let rolling_resistance = velocity * mass * -1.0 * settings.rolling_resistance_coefficient;
        world.apply_force(self.body, engine + air_resistance + rolling_resistance);

        // tyres cancel part of the sideways slide; slippery ground cancels less
        let lateral = velocity - forward * velocity.dot(forward);
        let grip = (settings.lateral_grip * self.terrain.friction() * time_step).min(1.0);
        world.apply_impulse(self.body, lateral * -1.0 * mass * grip);
    }

    /// Caps the speed after a step: forward and reverse have separate limits.
    pub fn limit_speed(&self, world: &mut World) {
        let (Some(location), Some(velocity)) = (self.location(world), world.velocity(self.body))
        else {
            return;
        };
        let speed = velocity.length();
        if speed < REST_SPEED {
            world.set_velocity(self.body, DVec2::ZERO);
            return;
        }
        let forward = location.unit_steer_direction();
        let cap = if velocity.dot(forward) >= 0.0 {
            self.max_speed
        } else {
            self.max_reverse_speed
        };
        if speed > cap {
            world.set_velocity(self.body, velocity * (cap / speed));
        }
    }
}
