use std::fmt;

use glam::DVec2;
use tracing::{info, warn};

use racer_core::lap_info::CheckpointOrder;

use crate::map::{ObjectRole, TrackMap};
use crate::physics::{BodyHandle, BodyKind, BodyPurpose, BoundingBox, Shape, World};

#[derive(Clone, Debug)]
pub struct Checkpoint {
    pub order: CheckpointOrder,
    pub name: String,
    pub sensor: BodyHandle,
    pub position: DVec2,
    pub bounds: BoundingBox,
    pub crossed: bool,
}

impl Checkpoint {
    pub fn is_finish_line(&self) -> bool {
        self.order == 0
    }
}

/// Something wrong with how the track lays out its checkpoints. None of these
/// stop the race from running, but some mean it can never be finished.
#[derive(Clone, Debug, PartialEq)]
pub enum RegistryIssue {
    MissingFinishLine,
    DuplicateOrder {
        order: CheckpointOrder,
        kept: String,
        dropped: String,
    },
    MissingOrder {
        order: CheckpointOrder,
    },
    OverlappingSensors {
        first: CheckpointOrder,
        second: CheckpointOrder,
    },
}

impl fmt::Display for RegistryIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingFinishLine => {
                write!(f, "track has no finish line (order 0); laps can never complete")
            }
            Self::DuplicateOrder {
                order,
                kept,
                dropped,
            } => write!(
                f,
                "checkpoint order {order} used twice; keeping '{kept}', dropping '{dropped}'"
            ),
            Self::MissingOrder { order } => write!(
                f,
                "no checkpoint with order {order}; the sequence stalls there"
            ),
            Self::OverlappingSensors { first, second } => write!(
                f,
                "checkpoints {first} and {second} overlap; one crossing may resolve to either"
            ),
        }
    }
}

/// The track's checkpoint sensors, sorted by order. Built once before the
/// race starts; afterwards only the crossed flags change.
pub struct CheckpointRegistry {
    checkpoints: Vec<Checkpoint>,
    finish_line: Option<usize>,
    issues: Vec<RegistryIssue>,
}

impl CheckpointRegistry {
    pub fn build(map: &TrackMap, world: &mut World) -> CheckpointRegistry {
        let placements = map
            .objects()
            .filter_map(|placed| match placed.role() {
                ObjectRole::Checkpoint(order) => Some((
                    order,
                    placed.object.name.clone(),
                    placed.center(),
                    placed.size(),
                )),
                _ => None,
            })
            .collect();
        Self::from_placements(placements, world)
    }

    /// `(order, name, center, size)` for every checkpoint; each becomes a
    /// static detection volume in `world`.
    pub fn from_placements(
        mut placements: Vec<(CheckpointOrder, String, DVec2, DVec2)>,
        world: &mut World,
    ) -> CheckpointRegistry {
        // stable, so on duplicates the first one in the map wins
        placements.sort_by_key(|(order, ..)| *order);

        let mut issues = Vec::new();
        let mut checkpoints: Vec<Checkpoint> = Vec::with_capacity(placements.len());
        for (order, name, center, size) in placements {
            if let Some(existing) = checkpoints.iter().find(|c| c.order == order) {
                issues.push(RegistryIssue::DuplicateOrder {
                    order,
                    kept: existing.name.clone(),
                    dropped: name,
                });
                continue;
            }

            let half_extents = size / 2.0;
            let sensor = world.create_detection_volume(
                Shape::Rectangle { half_extents },
                center,
                BodyKind::Static,
                BodyPurpose::Checkpoint(order),
            );
            checkpoints.push(Checkpoint {
                order,
                name,
                sensor,
                position: center,
                bounds: BoundingBox::around(center, half_extents),
                crossed: false,
            });
        }

        let finish_line = checkpoints.iter().position(|c| c.is_finish_line());
        if finish_line.is_none() {
            issues.push(RegistryIssue::MissingFinishLine);
        }

        let total = checkpoints.last().map_or(0, |c| c.order);
        for order in 1..total {
            if !checkpoints.iter().any(|c| c.order == order) {
                issues.push(RegistryIssue::MissingOrder { order });
            }
        }

        for (i, first) in checkpoints.iter().enumerate() {
            for second in &checkpoints[i + 1..] {
                if first.bounds.is_colliding(&second.bounds) {
                    issues.push(RegistryIssue::OverlappingSensors {
                        first: first.order,
                        second: second.order,
                    });
                }
            }
        }

        for issue in &issues {
            warn!("{}", issue);
        }
        info!(
            "checkpoint registry ready: {} checkpoints, last order {}",
            checkpoints.len(),
            total
        );

        CheckpointRegistry {
            checkpoints,
            finish_line,
            issues,
        }
    }

    pub fn issues(&self) -> &[RegistryIssue] {
        &self.issues
    }

    pub fn get(&self, order: CheckpointOrder) -> Option<&Checkpoint> {
        self.checkpoints.iter().find(|c| c.order == order)
    }

    pub fn position(&self, order: CheckpointOrder) -> Option<DVec2> {
        self.get(order).map(|c| c.position)
    }

    // highest order on the track; the sequence wraps back to 0 after it
    pub fn total_checkpoints(&self) -> CheckpointOrder {
        self.checkpoints.last().map_or(0, |c| c.order)
    }

    pub fn len(&self) -> usize {
        self.checkpoints.len()
    }

    pub fn is_empty(&self) -> bool {
        self.checkpoints.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Checkpoint> {
        self.checkpoints.iter()
    }

    pub fn finish_line(&self) -> Option<&Checkpoint> {
        self.finish_line.map(|index| &self.checkpoints[index])
    }

    pub fn nearest(&self, point: DVec2) -> Option<&Checkpoint> {
        self.checkpoints.iter().min_by(|a, b| {
            a.position
                .distance_squared(point)
                .total_cmp(&b.position.distance_squared(point))
        })
    }

    pub(crate) fn mark_crossed(&mut self, order: CheckpointOrder) {
        if let Some(checkpoint) = self.checkpoints.iter_mut().find(|c| c.order == order) {
            checkpoint.crossed = true;
        }
    }

    pub fn is_crossed(&self, order: CheckpointOrder) -> bool {
        self.get(order).map_or(false, |c| c.crossed)
    }

    /// Every checkpoint except the finish line has been crossed this lap.
    pub fn all_crossed(&self) -> bool {
        self.checkpoints
            .iter()
            .filter(|c| !c.is_finish_line())
            .all(|c| c.crossed)
    }

    pub fn crossed_count(&self) -> usize {
        self.checkpoints.iter().filter(|c| c.crossed).count()
    }

    pub(crate) fn reset_crossed(&mut self) {
        for checkpoint in &mut self.checkpoints {
            checkpoint.crossed = false;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gate(order: CheckpointOrder, x: f64) -> (CheckpointOrder, String, DVec2, DVec2) {
        (
            order,
            format!("gate{order}"),
            DVec2::new(x, 0.0),
            DVec2::new(20.0, 100.0),
        )
    }

    #[test]
    fn sorts_by_order_and_creates_sensors() {
        let mut world = World::new();
        let registry = CheckpointRegistry::from_placements(
            vec![gate(2, 200.0), gate(0, 0.0), gate(1, 100.0)],
            &mut world,
        );

        let orders: Vec<_> = registry.iter().map(|c| c.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
        assert_eq!(registry.total_checkpoints(), 2);
        assert_eq!(registry.position(1), Some(DVec2::new(100.0, 0.0)));
        assert_eq!(registry.position(7), None);
        assert_eq!(registry.finish_line().map(|c| c.order), Some(0));
        assert!(registry.issues().is_empty());
        assert_eq!(world.len(), 3);
        assert!(world.bodies().all(|info| info.sensor));
    }

    #[test]
    fn reports_layout_problems() {
        let mut world = World::new();
        let mut placements = vec![gate(1, 100.0), gate(3, 300.0), gate(3, 305.0)];
        placements[2].1 = "late".to_string();
        let registry = CheckpointRegistry::from_placements(placements, &mut world);

        assert_eq!(
            registry.issues(),
            &[
                RegistryIssue::DuplicateOrder {
                    order: 3,
                    kept: "gate3".to_string(),
                    dropped: "late".to_string(),
                },
                RegistryIssue::MissingFinishLine,
                RegistryIssue::MissingOrder { order: 2 },
            ]
        );
        assert_eq!(registry.len(), 2);
        assert!(registry.finish_line().is_none());
    }

    #[test]
    fn flags_overlapping_sensors() {
        let mut world = World::new();
        let registry =
            CheckpointRegistry::from_placements(vec![gate(0, 0.0), gate(1, 10.0)], &mut world);
        assert_eq!(
            registry.issues(),
            &[RegistryIssue::OverlappingSensors { first: 0, second: 1 }]
        );
    }

    #[test]
    fn nearest_and_crossed_bookkeeping() {
        let mut world = World::new();
        let mut registry = CheckpointRegistry::from_placements(
            vec![gate(0, 0.0), gate(1, 100.0), gate(2, 200.0)],
            &mut world,
        );

        assert_eq!(registry.nearest(DVec2::new(140.0, 30.0)).unwrap().order, 1);

        registry.mark_crossed(1);
        assert!(registry.is_crossed(1));
        assert!(!registry.all_crossed());
        registry.mark_crossed(2);
        assert!(registry.all_crossed());
        assert_eq!(registry.crossed_count(), 2);

        registry.reset_crossed();
        assert_eq!(registry.crossed_count(), 0);
    }
}
