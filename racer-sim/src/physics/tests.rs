use glam::DVec2;

use super::world::WALL_RESTITUTION;
use super::*;

fn car(world: &mut World, position: DVec2) -> BodyHandle {
    world.create_solid_body(
        Shape::Circle { radius: 10.0 },
        position,
        BodyKind::Dynamic,
        1.0,
        BodyPurpose::PlayerVehicle,
    )
}

fn wall_box(world: &mut World, center: DVec2, half_extents: DVec2) -> BodyHandle {
    world.create_solid_body(
        Shape::Rectangle { half_extents },
        center,
        BodyKind::Static,
        0.0,
        BodyPurpose::Wall,
    )
}

fn step_collecting(world: &mut World, time_step: f64) -> Vec<ContactEvent> {
    let mut events = Vec::new();
    world.step(time_step, &mut |event| events.push(*event));
    events
}

#[test]
fn test_force_integration() {
    let mut world = World::new();
    let body = world.create_solid_body(
        Shape::Circle { radius: 1.0 },
        DVec2::ZERO,
        BodyKind::Dynamic,
        2.0,
        BodyPurpose::PlayerVehicle,
    );

    world.apply_force(body, DVec2::new(10.0, 0.0));
    world.step(1.0, &mut |_| {});

    // velocity picks up force / mass first, then position moves by the new velocity
    assert!(world
        .velocity(body)
        .unwrap()
        .abs_diff_eq(DVec2::new(5.0, 0.0), 0.001));
    assert!(world
        .position(body)
        .unwrap()
        .abs_diff_eq(DVec2::new(5.0, 0.0), 0.001));

    // forces don't carry over into the next step
    world.step(1.0, &mut |_| {});
    assert!(world
        .velocity(body)
        .unwrap()
        .abs_diff_eq(DVec2::new(5.0, 0.0), 0.001));
}

#[test]
fn test_static_bodies_ignore_forces() {
    let mut world = World::new();
    let wall = wall_box(&mut world, DVec2::ZERO, DVec2::splat(5.0));
    world.apply_force(wall, DVec2::new(100.0, 0.0));
    world.apply_impulse(wall, DVec2::new(100.0, 0.0));
    world.set_velocity(wall, DVec2::new(100.0, 0.0));
    world.step(1.0, &mut |_| {});
    assert_eq!(world.position(wall), Some(DVec2::ZERO));
}

#[test]
fn test_ray_sees_through_filtered_bodies() {
    let mut world = World::new();
    world.create_detection_volume(
        Shape::Rectangle {
            half_extents: DVec2::new(5.0, 50.0),
        },
        DVec2::new(50.0, 0.0),
        BodyKind::Static,
        BodyPurpose::Checkpoint(1),
    );
    let wall = wall_box(&mut world, DVec2::new(150.0, 0.0), DVec2::new(10.0, 50.0));

    let any = world
        .cast_ray(DVec2::ZERO, DVec2::new(400.0, 0.0), &|_| true)
        .unwrap();
    assert_eq!(any.body.purpose, BodyPurpose::Checkpoint(1));

    let solid = world
        .cast_ray(DVec2::ZERO, DVec2::new(400.0, 0.0), &|info| {
            info.is_static_obstacle()
        })
        .unwrap();
    assert_eq!(solid.body.handle, wall);
    assert!(solid.point.abs_diff_eq(DVec2::new(140.0, 0.0), 0.001));
    assert!((solid.fraction - 0.35).abs() < 0.001);
    assert!(solid.normal.abs_diff_eq(DVec2::new(-1.0, 0.0), 0.001));
}

#[test]
fn test_ray_misses_when_nothing_in_range() {
    let mut world = World::new();
    wall_box(&mut world, DVec2::new(500.0, 0.0), DVec2::splat(10.0));
    assert!(world
        .cast_ray(DVec2::ZERO, DVec2::new(450.0, 0.0), &|_| true)
        .is_none());
}

#[test]
fn test_sensor_enter_and_exit() {
    let mut world = World::new();
    let sensor = world.create_detection_volume(
        Shape::Rectangle {
            half_extents: DVec2::new(20.0, 100.0),
        },
        DVec2::new(60.0, 0.0),
        BodyKind::Static,
        BodyPurpose::Checkpoint(0),
    );
    let body = car(&mut world, DVec2::ZERO);
    world.set_velocity(body, DVec2::new(50.0, 0.0));

    let mut entered = 0;
    let mut exited = 0;
    for _ in 0..10 {
        for event in step_collecting(&mut world, 0.1) {
            let (vehicle, other) = event
                .involving(|info| info.purpose.is_vehicle())
                .unwrap();
            assert_eq!(vehicle.handle, body);
            assert_eq!(other.handle, sensor);
            match event.phase {
                ContactPhase::Enter => entered += 1,
                ContactPhase::Exit => exited += 1,
            }
        }
    }
    // 50 units per second for one second: reached the sensor, not yet out
    assert_eq!((entered, exited), (1, 0));

    for _ in 0..30 {
        for event in step_collecting(&mut world, 0.1) {
            if event.phase == ContactPhase::Exit {
                exited += 1;
            }
        }
    }
    assert_eq!((entered, exited), (1, 1));
}

#[test]
fn test_sensors_do_not_block() {
    let mut world = World::new();
    world.create_detection_volume(
        Shape::Rectangle {
            half_extents: DVec2::splat(30.0),
        },
        DVec2::new(40.0, 0.0),
        BodyKind::Static,
        BodyPurpose::Checkpoint(2),
    );
    let body = car(&mut world, DVec2::ZERO);
    world.set_velocity(body, DVec2::new(100.0, 0.0));
    for _ in 0..10 {
        world.step(0.1, &mut |_| {});
    }
    assert!(world
        .position(body)
        .unwrap()
        .abs_diff_eq(DVec2::new(100.0, 0.0), 0.001));
}

#[test]
fn test_bounce_off_wall() {
    let mut world = World::new();
    wall_box(&mut world, DVec2::new(100.0, 0.0), DVec2::new(10.0, 100.0));
    let body = car(&mut world, DVec2::new(75.0, 0.0));
    world.set_velocity(body, DVec2::new(100.0, 20.0));

    // one step moves the car 10 units into the wall face at x = 90
    world.step(0.1, &mut |_| {});

    let position = world.position(body).unwrap();
    assert!((position.x - 80.0).abs() < 0.001);
    let velocity = world.velocity(body).unwrap();
    assert!(velocity.abs_diff_eq(DVec2::new(-100.0 * WALL_RESTITUTION, 20.0), 0.001));
}

#[test]
fn test_head_on_collision_swaps_velocities() {
    let mut world = World::new();
    let left = car(&mut world, DVec2::new(-10.5, 0.0));
    let right = car(&mut world, DVec2::new(10.5, 0.0));
    world.set_velocity(left, DVec2::new(30.0, 0.0));
    world.set_velocity(right, DVec2::new(-10.0, 0.0));

    let events = step_collecting(&mut world, 0.1);

    assert!(world
        .velocity(left)
        .unwrap()
        .abs_diff_eq(DVec2::new(-10.0, 0.0), 0.001));
    assert!(world
        .velocity(right)
        .unwrap()
        .abs_diff_eq(DVec2::new(30.0, 0.0), 0.001));
    assert_eq!(events.len(), 1);
    assert_eq!(events[0].phase, ContactPhase::Enter);
}

#[test]
fn test_removed_handle_is_stale() {
    let mut world = World::new();
    let first = car(&mut world, DVec2::ZERO);
    assert!(world.remove(first));
    let second = car(&mut world, DVec2::ZERO);
    // the freed slot is reused under a new version
    assert_ne!(first, second);
    assert!(!world.contains(first));
    assert!(world.contains(second));
    assert_eq!(world.body_info(first), None);
    assert!(!world.remove(first));
}

#[test]
fn test_area_query() {
    let mut world = World::new();
    let near = car(&mut world, DVec2::new(10.0, 10.0));
    car(&mut world, DVec2::new(500.0, 500.0));
    let found = world.query_area(BoundingBox::around(DVec2::ZERO, DVec2::splat(50.0)));
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].handle, near);
}
