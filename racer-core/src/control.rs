use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Deserialize, Serialize)]
pub enum EngineStatus {
    Accelerating(f64),
    Reversing(f64),
    Braking(f64),
    Neutral,
}

/// What a driver (human or AI) wants the vehicle to do this tick. Every
/// field is normalized: `throttle` and `steer` in `[-1, 1]`, `brake` in
/// `[0, 1]`. Positive steer turns towards increasing heading.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize, Serialize)]
pub struct ControlIntent {
    pub throttle: f64,
    pub steer: f64,
    pub brake: f64,
}

impl ControlIntent {
    pub fn idle() -> Self {
        Self::default()
    }

    pub fn new(throttle: f64, steer: f64, brake: f64) -> Self {
        ControlIntent {
            throttle,
            steer,
            brake,
        }
        .clamped()
    }

    pub fn clamped(self) -> Self {
        ControlIntent {
            throttle: self.throttle.clamp(-1.0, 1.0),
            steer: self.steer.clamp(-1.0, 1.0),
            brake: self.brake.clamp(0.0, 1.0),
        }
    }

    // braking wins over the pedal; a car can't press both in this game
    pub fn engine_status(&self) -> EngineStatus {
        if self.brake > 0.0 {
            EngineStatus::Braking(self.brake)
        } else if self.throttle > 0.0 {
            EngineStatus::Accelerating(self.throttle)
        } else if self.throttle < 0.0 {
            EngineStatus::Reversing(-self.throttle)
        } else {
            EngineStatus::Neutral
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clamps_out_of_range_inputs() {
        let intent = ControlIntent::new(3.0, -7.5, -1.0);
        assert_eq!(intent, ControlIntent::new(1.0, -1.0, 0.0));
    }

    #[test]
    fn brake_overrides_throttle() {
        let intent = ControlIntent::new(0.2, 0.0, 0.5);
        assert_eq!(intent.engine_status(), EngineStatus::Braking(0.5));
        assert_eq!(
            ControlIntent::new(-1.0, 0.3, 0.0).engine_status(),
            EngineStatus::Reversing(1.0)
        );
        assert_eq!(ControlIntent::idle().engine_status(), EngineStatus::Neutral);
    }
}
