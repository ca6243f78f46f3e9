use std::collections::BTreeSet;

use glam::DVec2;

use super::bounding_box::BoundingBox;
use super::shape::WorldShape;
use super::{
    BodyHandle, BodyInfo, BodyKind, BodyPurpose, ContactEvent, ContactPhase, PhysicsQuery, RayHit,
    Shape,
};
use slotmap::SlotMap;

// fraction of the into-wall speed a car keeps when it bounces off
pub const WALL_RESTITUTION: f64 = 0.2;
// solid bodies resting against each other still count as touching
const CONTACT_SLOP: f64 = 0.5;

struct Body {
    kind: BodyKind,
    shape: Shape,
    position: DVec2,
    angle: f64,
    velocity: DVec2,
    force: DVec2,
    mass: f64,
    sensor: bool,
    purpose: BodyPurpose,
}

impl Body {
    fn world_shape(&self) -> WorldShape {
        match &self.shape {
            Shape::Circle { radius } => WorldShape::Circle {
                center: self.position,
                radius: *radius,
            },
            Shape::Rectangle { half_extents } => {
                let min = self.position - *half_extents;
                let max = self.position + *half_extents;
                WorldShape::Polygon(vec![
                    min,
                    DVec2::new(max.x, min.y),
                    max,
                    DVec2::new(min.x, max.y),
                ])
            }
            Shape::Polygon { points } => {
                WorldShape::Polygon(points.iter().map(|p| *p + self.position).collect())
            }
            Shape::Chain { points, closed } => WorldShape::Chain {
                points: points.iter().map(|p| *p + self.position).collect(),
                closed: *closed,
            },
        }
    }

    // moving bodies collide as circles; anything else uses its bounding circle
    fn collision_radius(&self) -> f64 {
        match &self.shape {
            Shape::Circle { radius } => *radius,
            Shape::Rectangle { half_extents } => half_extents.length(),
            Shape::Polygon { points } | Shape::Chain { points, .. } => points
                .iter()
                .map(|p| p.length())
                .fold(0.0, f64::max),
        }
    }

    fn is_solid_mover(&self) -> bool {
        self.kind == BodyKind::Dynamic && !self.sensor
    }
}

/// A small 2D rigid-body world: bodies live in a slot map keyed by handle,
/// dynamic bodies are integrated with semi-implicit Euler, and overlap
/// changes are reported through the callback passed to `step`.
#[derive(Default)]
pub struct World {
    bodies: SlotMap<BodyHandle, Body>,
    touching: BTreeSet<(BodyHandle, BodyHandle)>,
}

impl World {
    pub fn new() -> Self {
        Self::default()
    }

    fn create_body(
        &mut self,
        kind: BodyKind,
        shape: Shape,
        position: DVec2,
        mass: f64,
        sensor: bool,
        purpose: BodyPurpose,
    ) -> BodyHandle {
        self.bodies.insert(Body {
            kind,
            shape,
            position,
            angle: 0.0,
            velocity: DVec2::ZERO,
            force: DVec2::ZERO,
            mass,
            sensor,
            purpose,
        })
    }

    /// A non-colliding volume that only reports overlaps.
    pub fn create_detection_volume(
        &mut self,
        shape: Shape,
        position: DVec2,
        kind: BodyKind,
        purpose: BodyPurpose,
    ) -> BodyHandle {
        self.create_body(kind, shape, position, 0.0, true, purpose)
    }

    pub fn create_solid_body(
        &mut self,
        shape: Shape,
        position: DVec2,
        kind: BodyKind,
        mass: f64,
        purpose: BodyPurpose,
    ) -> BodyHandle {
        self.create_body(kind, shape, position, mass, false, purpose)
    }

    /// Drops the body. Overlaps it was part of vanish without an exit event.
    pub fn remove(&mut self, handle: BodyHandle) -> bool {
        let removed = self.bodies.remove(handle).is_some();
        if removed {
            self.touching
                .retain(|(a, b)| *a != handle && *b != handle);
        }
        removed
    }

    pub fn contains(&self, handle: BodyHandle) -> bool {
        self.bodies.contains_key(handle)
    }

    pub fn len(&self) -> usize {
        self.bodies.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bodies.is_empty()
    }

    pub fn position(&self, handle: BodyHandle) -> Option<DVec2> {
        self.bodies.get(handle).map(|body| body.position)
    }

    pub fn set_position(&mut self, handle: BodyHandle, position: DVec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.position = position;
        }
    }

    pub fn angle(&self, handle: BodyHandle) -> Option<f64> {
        self.bodies.get(handle).map(|body| body.angle)
    }

    pub fn set_angle(&mut self, handle: BodyHandle, angle: f64) {
        if let Some(body) = self.bodies.get_mut(handle) {
            body.angle = angle;
        }
    }

    pub fn set_velocity(&mut self, handle: BodyHandle, velocity: DVec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.kind != BodyKind::Static {
                body.velocity = velocity;
            }
        }
    }

    pub fn mass(&self, handle: BodyHandle) -> Option<f64> {
        self.bodies.get(handle).map(|body| body.mass)
    }

    // forces accumulate until the next step and only move dynamic bodies
    pub fn apply_force(&mut self, handle: BodyHandle, force: DVec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.kind == BodyKind::Dynamic {
                body.force += force;
            }
        }
    }

    pub fn apply_impulse(&mut self, handle: BodyHandle, impulse: DVec2) {
        if let Some(body) = self.bodies.get_mut(handle) {
            if body.kind == BodyKind::Dynamic && body.mass > 0.0 {
                body.velocity += impulse / body.mass;
            }
        }
    }

    pub fn bodies(&self) -> impl Iterator<Item = BodyInfo> + '_ {
        self.bodies
            .iter()
            .map(|(index, body)| info(index, body))
    }

    pub fn step(&mut self, time_step: f64, on_contact: &mut dyn FnMut(&ContactEvent)) {
        for (_, body) in self.bodies.iter_mut() {
            match body.kind {
                BodyKind::Dynamic => {
                    let acceleration = if body.mass > 0.0 {
                        body.force / body.mass
                    } else {
                        DVec2::ZERO
                    };
                    body.velocity += acceleration * time_step;
                    body.position += body.velocity * time_step;
                }
                BodyKind::Kinematic => body.position += body.velocity * time_step,
                BodyKind::Static => {}
            }
            body.force = DVec2::ZERO;
        }

        self.resolve_obstacle_collisions();
        self.resolve_mover_collisions();
        self.report_contacts(on_contact);
    }

    // dynamic vs static/kinematic solids: push out, then bounce the into-wall
    // part of the velocity
    fn resolve_obstacle_collisions(&mut self) {
        let obstacles: Vec<WorldShape> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.kind != BodyKind::Dynamic && !body.sensor)
            .map(|(_, body)| body.world_shape())
            .collect();

        for (_, body) in self.bodies.iter_mut() {
            if !body.is_solid_mover() {
                continue;
            }
            let radius = body.collision_radius();
            for obstacle in &obstacles {
                if let Some(penetration) = obstacle.circle_contact(body.position, radius) {
                    body.position += penetration.normal * penetration.depth;
                    let into_wall = body.velocity.dot(penetration.normal);
                    if into_wall < 0.0 {
                        body.velocity -= (1.0 + WALL_RESTITUTION) * into_wall * penetration.normal;
                    }
                }
            }
        }
    }

    // dynamic vs dynamic: elastic exchange along the line between centers,
    // https://en.wikipedia.org/wiki/Elastic_collision#Two-dimensional
    fn resolve_mover_collisions(&mut self) {
        let movers: Vec<_> = self
            .bodies
            .iter()
            .filter(|(_, body)| body.is_solid_mover())
            .map(|(index, body)| {
                (
                    index,
                    body.position,
                    body.velocity,
                    body.mass.max(f64::EPSILON),
                    body.collision_radius(),
                )
            })
            .collect();

        let mut position_changes = vec![DVec2::ZERO; movers.len()];
        let mut velocity_changes = vec![DVec2::ZERO; movers.len()];

        for i in 0..movers.len() {
            for j in (i + 1)..movers.len() {
                let (_, x1, v1, m1, r1) = movers[i];
                let (_, x2, v2, m2, r2) = movers[j];
                let offset = x1 - x2;
                let distance_squared = offset.length_squared();
                let reach = r1 + r2;
                if distance_squared >= reach * reach || distance_squared < 1e-12 {
                    continue;
                }

                let approach = (v1 - v2).dot(offset);
                if approach < 0.0 {
                    let shared = approach / distance_squared;
                    velocity_changes[i] -= (2.0 * m2 / (m1 + m2)) * shared * offset;
                    velocity_changes[j] += (2.0 * m1 / (m1 + m2)) * shared * offset;
                }

                let distance = distance_squared.sqrt();
                let normal = offset / distance;
                let depth = reach - distance;
                position_changes[i] += normal * depth * m2 / (m1 + m2);
                position_changes[j] -= normal * depth * m1 / (m1 + m2);
            }
        }

        for (k, (index, ..)) in movers.iter().enumerate() {
            if let Some(body) = self.bodies.get_mut(*index) {
                body.position += position_changes[k];
                body.velocity += velocity_changes[k];
            }
        }
    }

    fn report_contacts(&mut self, on_contact: &mut dyn FnMut(&ContactEvent)) {
        let snapshot: Vec<(BodyInfo, WorldShape)> = self
            .bodies
            .iter()
            .map(|(index, body)| (info(index, body), body.world_shape()))
            .collect();

        let mut current = BTreeSet::new();
        for i in 0..snapshot.len() {
            for j in (i + 1)..snapshot.len() {
                let (a, a_shape) = &snapshot[i];
                let (b, b_shape) = &snapshot[j];
                // two static bodies never start or stop touching
                if a.kind == BodyKind::Static && b.kind == BodyKind::Static {
                    continue;
                }
                let margin = if a.sensor || b.sensor { 0.0 } else { CONTACT_SLOP };
                if a_shape.overlaps(b_shape, margin) {
                    current.insert(ordered(a.handle, b.handle));
                }
            }
        }

        let lookup = |handle: BodyHandle| {
            snapshot
                .iter()
                .find(|(info, _)| info.handle == handle)
                .map(|(info, _)| *info)
        };

        for (a, b) in self.touching.difference(&current) {
            if let (Some(a), Some(b)) = (lookup(*a), lookup(*b)) {
                on_contact(&ContactEvent {
                    phase: ContactPhase::Exit,
                    a,
                    b,
                });
            }
        }
        for (a, b) in current.difference(&self.touching) {
            if let (Some(a), Some(b)) = (lookup(*a), lookup(*b)) {
                on_contact(&ContactEvent {
                    phase: ContactPhase::Enter,
                    a,
                    b,
                });
            }
        }

        self.touching = current;
    }
}

fn ordered(a: BodyHandle, b: BodyHandle) -> (BodyHandle, BodyHandle) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn info(handle: BodyHandle, body: &Body) -> BodyInfo {
    BodyInfo {
        handle,
        kind: body.kind,
        sensor: body.sensor,
        purpose: body.purpose,
        position: body.position,
    }
}

impl PhysicsQuery for World {
    fn cast_ray(
        &self,
        origin: DVec2,
        target: DVec2,
        filter: &dyn Fn(&BodyInfo) -> bool,
    ) -> Option<RayHit> {
        let delta = target - origin;
        self.bodies
            .iter()
            .filter_map(|(index, body)| {
                let body_info = info(index, body);
                if !filter(&body_info) {
                    return None;
                }
                body.world_shape()
                    .cast_ray(origin, delta)
                    .map(|contact| RayHit {
                        body: body_info,
                        point: origin + delta * contact.fraction,
                        normal: contact.normal,
                        fraction: contact.fraction,
                    })
            })
            .min_by(|a, b| a.fraction.total_cmp(&b.fraction))
    }

    fn body_info(&self, handle: BodyHandle) -> Option<BodyInfo> {
        self.bodies.get(handle).map(|body| info(handle, body))
    }

    fn velocity(&self, handle: BodyHandle) -> Option<DVec2> {
        self.bodies.get(handle).map(|body| body.velocity)
    }

    fn query_area(&self, area: BoundingBox) -> Vec<BodyInfo> {
        self.bodies
            .iter()
            .filter(|(_, body)| body.world_shape().bounding_box().is_colliding(&area))
            .map(|(index, body)| info(index, body))
            .collect()
    }
}
