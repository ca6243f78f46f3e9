use glam::DVec2;

use racer_core::lap_info::CheckpointOrder;
use racer_core::settings::AiSettings;

use crate::checkpoints::CheckpointRegistry;

/// An NPC's own idea of which checkpoint to head for. It never checks
/// sequencing; it only cycles through the orders by proximity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaypointTracker {
    pub target_checkpoint_order: CheckpointOrder,
}

impl Default for WaypointTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointTracker {
    pub fn new() -> Self {
        WaypointTracker {
            target_checkpoint_order: 1,
        }
    }

    pub fn target_position(&self, registry: &CheckpointRegistry, settings: &AiSettings) -> DVec2 {
        registry
            .position(self.target_checkpoint_order)
            .unwrap_or_else(|| fallback_waypoint(settings))
    }

    /// Advances to the next order once within the acceptance radius. Returns
    /// whether it advanced.
    pub fn update(
        &mut self,
        position: DVec2,
        registry: &CheckpointRegistry,
        settings: &AiSettings,
    ) -> bool {
        let target = self.target_position(registry, settings);
        if position.distance(target) >= settings.waypoint_acceptance_radius {
            return false;
        }
        self.target_checkpoint_order = if self.target_checkpoint_order >= registry.total_checkpoints()
        {
            0
        } else {
            self.target_checkpoint_order + 1
        };
        true
    }
}

pub fn fallback_waypoint(settings: &AiSettings) -> DVec2 {
    DVec2::new(settings.fallback_waypoint_x, settings.fallback_waypoint_y)
}

#[cfg(test)]
mod tests {
    use racer_core::GLOBAL_CONFIG;

    use super::*;
    use crate::physics::World;

    fn registry(world: &mut World) -> CheckpointRegistry {
        CheckpointRegistry::from_placements(
            (0..=3)
                .map(|order: CheckpointOrder| {
                    (
                        order,
                        format!("C{order}"),
                        DVec2::new(order as f64 * 1000.0, 0.0),
                        DVec2::new(20.0, 20.0),
                    )
                })
                .collect(),
            world,
        )
    }

    #[test]
    fn cycles_through_orders_and_wraps_to_the_finish_line() {
        let ai = &GLOBAL_CONFIG.ai;
        let mut world = World::new();
        let registry = registry(&mut world);
        let mut tracker = WaypointTracker::new();

        assert!(!tracker.update(DVec2::ZERO, &registry, ai));
        assert_eq!(tracker.target_checkpoint_order, 1);

        let mut visited = Vec::new();
        for _ in 0..5 {
            let at = tracker.target_position(&registry, ai);
            assert!(tracker.update(at, &registry, ai));
            visited.push(tracker.target_checkpoint_order);
        }
        assert_eq!(visited, vec![2, 3, 0, 1, 2]);
    }

    #[test]
    fn missing_checkpoint_falls_back_to_safe_point() {
        let ai = &GLOBAL_CONFIG.ai;
        let mut world = World::new();
        let empty = CheckpointRegistry::from_placements(Vec::new(), &mut world);
        let tracker = WaypointTracker::new();
        assert_eq!(
            tracker.target_position(&empty, ai),
            DVec2::new(ai.fallback_waypoint_x, ai.fallback_waypoint_y)
        );
    }
}
