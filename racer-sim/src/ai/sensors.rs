use glam::DVec2;

use racer_core::entity_location::EntityLocation;

use crate::physics::{BodyHandle, BodyInfo, PhysicsQuery};

pub const SENSOR_OFFSETS_DEGREES: [f64; 5] = [-60.0, -30.0, 0.0, 30.0, 60.0];
pub const CENTER_SENSOR: usize = 2;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SensorReading {
    pub offset_degrees: f64,
    pub distance: f64,
    pub hit: bool,
    // where the ray stopped: the hit point, or the end of its reach
    pub end_point: DVec2,
}

impl SensorReading {
    pub fn clear(offset_degrees: f64, max_view_distance: f64) -> Self {
        SensorReading {
            offset_degrees,
            distance: max_view_distance,
            hit: false,
            end_point: DVec2::ZERO,
        }
    }
}

/// Only solid static geometry blocks a sensor ray. Checkpoints, ability
/// zones and other cars are looked straight through.
pub fn blocks_sensor(info: &BodyInfo, own_body: BodyHandle) -> bool {
    info.handle != own_body && info.is_static_obstacle()
}

#[derive(Clone, Copy, Debug)]
pub struct SensorArray {
    max_view_distance: f64,
}

impl SensorArray {
    pub fn new(max_view_distance: f64) -> Self {
        SensorArray { max_view_distance }
    }

    pub fn scan(
        &self,
        physics: &dyn PhysicsQuery,
        location: &EntityLocation,
        own_body: BodyHandle,
    ) -> [SensorReading; 5] {
        let filter = |info: &BodyInfo| blocks_sensor(info, own_body);
        SENSOR_OFFSETS_DEGREES.map(|offset_degrees| {
            let angle = location.heading + offset_degrees.to_radians();
            let target =
                location.position + DVec2::new(angle.cos(), angle.sin()) * self.max_view_distance;

            match physics.cast_ray(location.position, target, &filter) {
                Some(hit) => SensorReading {
                    offset_degrees,
                    distance: hit.fraction * self.max_view_distance,
                    hit: true,
                    end_point: hit.point,
                },
                None => SensorReading {
                    offset_degrees,
                    distance: self.max_view_distance,
                    hit: false,
                    end_point: target,
                },
            }
        })
    }
}
