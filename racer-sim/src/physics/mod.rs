use glam::DVec2;

use racer_core::lap_info::CheckpointOrder;
use racer_core::AgentID;

use slotmap::new_key_type;

pub mod bounding_box;
pub mod shape;
mod world;

#[cfg(test)]
mod tests;

pub use bounding_box::BoundingBox;
pub use world::World;

new_key_type! {
    /// Stable id of a body in a [`World`]. Stale after the body is removed.
    pub struct BodyHandle;
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyKind {
    // never moves
    Static,
    // moves at its set velocity, ignores forces
    Kinematic,
    // integrates forces and gets pushed around by collisions
    Dynamic,
}

/// Body geometry relative to the body position. Rectangles are centered on
/// it; polygon and chain points are offsets from it.
#[derive(Clone, Debug, PartialEq)]
pub enum Shape {
    Circle { radius: f64 },
    Rectangle { half_extents: DVec2 },
    Polygon { points: Vec<DVec2> },
    Chain { points: Vec<DVec2>, closed: bool },
}

/// What a body stands for in the race, so contact handling and ray filters
/// don't need to look the handle up anywhere else.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BodyPurpose {
    Wall,
    PlayerVehicle,
    NpcVehicle(AgentID),
    Checkpoint(CheckpointOrder),
    AbilityZone(AgentID),
}

impl BodyPurpose {
    pub fn is_vehicle(&self) -> bool {
        matches!(self, BodyPurpose::PlayerVehicle | BodyPurpose::NpcVehicle(_))
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BodyInfo {
    pub handle: BodyHandle,
    pub kind: BodyKind,
    pub sensor: bool,
    pub purpose: BodyPurpose,
    pub position: DVec2,
}

impl BodyInfo {
    pub fn is_static_obstacle(&self) -> bool {
        self.kind == BodyKind::Static && !self.sensor
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RayHit {
    pub body: BodyInfo,
    pub point: DVec2,
    pub normal: DVec2,
    pub fraction: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactPhase {
    Enter,
    Exit,
}

/// Fired synchronously from inside `World::step` when two bodies start or
/// stop overlapping. `a` always has the lower handle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ContactEvent {
    pub phase: ContactPhase,
    pub a: BodyInfo,
    pub b: BodyInfo,
}

impl ContactEvent {
    /// The pair ordered as (body matching `pred`, the other body).
    pub fn involving(&self, pred: impl Fn(&BodyInfo) -> bool) -> Option<(&BodyInfo, &BodyInfo)> {
        if pred(&self.a) {
            Some((&self.a, &self.b))
        } else if pred(&self.b) {
            Some((&self.b, &self.a))
        } else {
            None
        }
    }
}

/// Read-only view of the physics world, handed to the driving AI.
pub trait PhysicsQuery {
    /// Closest body along `origin -> target` among those accepted by `filter`.
    /// Rejected bodies are see-through.
    fn cast_ray(
        &self,
        origin: DVec2,
        target: DVec2,
        filter: &dyn Fn(&BodyInfo) -> bool,
    ) -> Option<RayHit>;

    fn body_info(&self, handle: BodyHandle) -> Option<BodyInfo>;

    fn velocity(&self, handle: BodyHandle) -> Option<DVec2>;

    fn query_area(&self, area: BoundingBox) -> Vec<BodyInfo>;
}
