use glam::DVec2;
use tracing::debug;

use racer_core::race_event::RaceEvent;
use racer_core::settings::AbilitySettings;
use racer_core::AgentID;

use crate::physics::{
    BodyHandle, BodyInfo, BodyKind, BodyPurpose, BoundingBox, PhysicsQuery, Shape, World,
};

// cars this close to the blast center don't get a direction to fly in
const MIN_PUSH_DISTANCE: f64 = 0.1;

/// An NPC's shove: a short-lived radial force field around where it was
/// triggered, pushing every other car away.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct PushAbility {
    cooldown_remaining: f64,
    check_timer: f64,
    active_elapsed: Option<f64>,
    center: DVec2,
    zone: Option<BodyHandle>,
}

impl PushAbility {
    pub fn is_ready(&self) -> bool {
        self.cooldown_remaining <= 0.0 && self.active_elapsed.is_none()
    }

    pub fn is_active(&self) -> bool {
        self.active_elapsed.is_some()
    }

    pub fn zone(&self) -> Option<BodyHandle> {
        self.zone
    }

    pub fn update(
        &mut self,
        world: &mut World,
        owner: AgentID,
        own_body: BodyHandle,
        time_step: f64,
        settings: &AbilitySettings,
    ) -> Option<RaceEvent> {
        self.cooldown_remaining = (self.cooldown_remaining - time_step).max(0.0);

        if let Some(elapsed) = self.active_elapsed {
            let elapsed = elapsed + time_step;
            if elapsed >= settings.active_secs {
                self.cancel(world);
            } else {
                self.active_elapsed = Some(elapsed);
                self.push(world, own_body, elapsed, settings);
            }
            return None;
        }

        self.check_timer += time_step;
        if self.check_timer < settings.check_interval_secs {
            return None;
        }
        self.check_timer = 0.0;

        let position = world.position(own_body)?;
        if !self.is_ready() || !other_car_within(world, own_body, position, settings.detection_radius)
        {
            return None;
        }

        self.activate(world, owner, position, settings);
        self.push(world, own_body, 0.0, settings);
        Some(RaceEvent::AbilityActivated {
            agent: owner,
            position,
        })
    }

    fn activate(
        &mut self,
        world: &mut World,
        owner: AgentID,
        position: DVec2,
        settings: &AbilitySettings,
    ) {
        self.zone = Some(world.create_detection_volume(
            Shape::Circle {
                radius: settings.radius,
            },
            position,
            BodyKind::Static,
            BodyPurpose::AbilityZone(owner),
        ));
        self.center = position;
        self.active_elapsed = Some(0.0);
        self.cooldown_remaining = settings.cooldown_secs;
        debug!("agent {} pushes at ({:.0}, {:.0})", owner, position.x, position.y);
    }

    fn push(&self, world: &mut World, own_body: BodyHandle, elapsed: f64, settings: &AbilitySettings) {
        let fade = 1.0 - elapsed / settings.active_secs;
        let targets: Vec<BodyInfo> = world
            .query_area(BoundingBox::around(self.center, DVec2::splat(settings.radius)))
            .into_iter()
            .filter(|info| {
                info.purpose.is_vehicle() && info.kind == BodyKind::Dynamic && info.handle != own_body
            })
            .collect();

        for target in targets {
            let offset = target.position - self.center;
            let distance = offset.length();
            if distance <= MIN_PUSH_DISTANCE || distance > settings.radius {
                continue;
            }
            let strength = settings.force * (1.0 - distance / settings.radius) * fade * fade;
            world.apply_force(target.handle, offset / distance * strength);
        }
    }

    /// Ends any active push and removes its zone from the world.
    pub fn cancel(&mut self, world: &mut World) {
        if let Some(zone) = self.zone.take() {
            world.remove(zone);
        }
        self.active_elapsed = None;
    }
}

fn other_car_within(world: &World, own_body: BodyHandle, position: DVec2, radius: f64) -> bool {
    world
        .query_area(BoundingBox::around(position, DVec2::splat(radius)))
        .iter()
        .any(|info| {
            info.purpose.is_vehicle()
                && info.handle != own_body
                && info.position.distance(position) <= radius
        })
}

#[cfg(test)]
mod tests {
    use racer_core::GLOBAL_CONFIG;

    use super::*;

    fn vehicle(world: &mut World, position: DVec2, purpose: BodyPurpose) -> BodyHandle {
        world.create_solid_body(
            Shape::Circle { radius: 10.0 },
            position,
            BodyKind::Dynamic,
            1.0,
            purpose,
        )
    }

    fn run(ability: &mut PushAbility, world: &mut World, me: BodyHandle, secs: f64) -> Vec<RaceEvent> {
        let settings = &GLOBAL_CONFIG.ability;
        let mut events = Vec::new();
        let ticks = (secs / 0.05).round() as usize;
        for _ in 0..ticks {
            events.extend(ability.update(world, 3, me, 0.05, settings));
            world.step(0.05, &mut |_| {});
        }
        events
    }

    #[test]
    fn fires_near_another_car_and_pushes_it_away() {
        let mut world = World::new();
        let me = vehicle(&mut world, DVec2::ZERO, BodyPurpose::NpcVehicle(3));
        let victim = vehicle(&mut world, DVec2::new(60.0, 0.0), BodyPurpose::PlayerVehicle);
        let mut ability = PushAbility::default();

        let events = run(&mut ability, &mut world, me, 0.6);
        assert_eq!(
            events,
            vec![RaceEvent::AbilityActivated {
                agent: 3,
                position: DVec2::ZERO
            }]
        );
        assert!(world.velocity(victim).unwrap().x > 0.0);
        assert_eq!(world.velocity(me), Some(DVec2::ZERO));
        assert!(!ability.is_ready());
    }

    #[test]
    fn zone_disappears_and_cooldown_holds() {
        let settings = &GLOBAL_CONFIG.ability;
        let mut world = World::new();
        let me = vehicle(&mut world, DVec2::ZERO, BodyPurpose::NpcVehicle(3));
        vehicle(&mut world, DVec2::new(0.0, 120.0), BodyPurpose::NpcVehicle(4));
        let mut ability = PushAbility::default();

        run(&mut ability, &mut world, me, settings.check_interval_secs + 0.05);
        assert!(ability.is_active());
        let zone = ability.zone().unwrap();
        assert!(world.contains(zone));

        run(&mut ability, &mut world, me, settings.active_secs + 0.1);
        assert!(!ability.is_active());
        assert!(!world.contains(zone));

        // still cooling down even with a car right there
        let events = run(&mut ability, &mut world, me, 1.0);
        assert!(events.is_empty());
    }

    #[test]
    fn stays_idle_with_nobody_around() {
        let mut world = World::new();
        let me = vehicle(&mut world, DVec2::ZERO, BodyPurpose::NpcVehicle(3));
        vehicle(&mut world, DVec2::new(500.0, 0.0), BodyPurpose::PlayerVehicle);
        let mut ability = PushAbility::default();
        assert!(run(&mut ability, &mut world, me, 2.0).is_empty());
        assert!(ability.is_ready());
    }
}
