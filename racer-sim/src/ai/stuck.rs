use rand::Rng;

use racer_core::control::ControlIntent;
use racer_core::settings::AiSettings;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StuckStatus {
    Driving,
    // the car just got declared stuck this tick
    Stuck,
    Recovering,
    // the reverse-and-turn manoeuvre just ran out
    Recovered,
}

/// Watches for a car that stopped making progress and runs a timed
/// reverse-and-turn when it does. The manoeuvre always ends after the
/// configured recovery time, whether or not it worked.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct StuckDetector {
    pub stuck: bool,
    pub timer: f64,
    pub recovery_steer_sign: f64,
}

impl StuckDetector {
    pub fn update(
        &mut self,
        speed: f64,
        time_step: f64,
        settings: &AiSettings,
        rng: &mut impl Rng,
    ) -> StuckStatus {
        if self.stuck {
            // keeps counting while reversing so the manoeuvre is bounded
            self.timer += time_step;
            if self.timer > settings.stuck_detect_secs + settings.stuck_recovery_secs {
                self.stuck = false;
                self.timer = 0.0;
                return StuckStatus::Recovered;
            }
            return StuckStatus::Recovering;
        }

        if speed < settings.stuck_speed {
            self.timer += time_step;
        } else {
            self.timer = 0.0;
        }

        if self.timer > settings.stuck_detect_secs {
            self.stuck = true;
            self.recovery_steer_sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
            return StuckStatus::Stuck;
        }
        StuckStatus::Driving
    }

    // progress was made some other way, e.g. a waypoint was reached
    pub fn clear_timer(&mut self) {
        self.timer = 0.0;
    }

    pub fn recovery_intent(&self) -> Option<ControlIntent> {
        self.stuck
            .then(|| ControlIntent::new(-1.0, self.recovery_steer_sign, 0.0))
    }
}
