use racer_core::lap_info::RacePhase;
use racer_core::race_event::RaceEvent;
use racer_core::settings::RaceSettings;

use super::camera::{CameraPose, CameraRig};

/// The timed part of the race lifecycle: get-ready pause, camera intro and
/// countdown. Phases only ever move forward, one step per `advance`.
pub struct Choreography {
    phase: RacePhase,
    elapsed: f64,
    countdown_remaining: f64,
    get_ready_secs: f64,
    intro_secs: f64,
    countdown_from: u32,
    rig: CameraRig,
}

impl Choreography {
    pub fn new(settings: &RaceSettings, rig: CameraRig) -> Self {
        Choreography {
            phase: RacePhase::GetReady,
            elapsed: 0.0,
            countdown_remaining: settings.countdown_from as f64,
            get_ready_secs: settings.get_ready_secs,
            intro_secs: settings.intro_secs,
            countdown_from: settings.countdown_from,
            rig,
        }
    }

    pub fn phase(&self) -> RacePhase {
        self.phase
    }

    // what a HUD would print during the countdown
    pub fn countdown_display(&self) -> Option<u32> {
        match self.phase {
            RacePhase::Countdown => Some(self.countdown_remaining.ceil() as u32),
            _ => None,
        }
    }

    fn transition(&mut self, to: RacePhase) -> RaceEvent {
        let from = self.phase;
        self.phase = to;
        self.elapsed = 0.0;
        RaceEvent::PhaseChanged { from, to }
    }

    pub fn advance(&mut self, time_step: f64) -> Vec<RaceEvent> {
        let mut events = Vec::new();
        match self.phase {
            RacePhase::GetReady => {
                self.elapsed += time_step;
                if self.elapsed >= self.get_ready_secs {
                    events.push(self.transition(RacePhase::Intro));
                }
            }
            RacePhase::Intro => {
                self.elapsed += time_step;
                if self.elapsed >= self.intro_secs {
                    self.countdown_remaining = self.countdown_from as f64;
                    events.push(self.transition(RacePhase::Countdown));
                }
            }
            RacePhase::Countdown => {
                self.elapsed += time_step;
                let before = self.countdown_remaining;
                let after = (before - time_step).max(0.0);
                self.countdown_remaining = after;

                for remaining in (1..self.countdown_from).rev() {
                    let boundary = remaining as f64;
                    if after <= boundary && boundary < before {
                        events.push(RaceEvent::CountdownTick { remaining });
                    }
                }
                if after <= 0.0 {
                    events.push(RaceEvent::Go);
                    events.push(self.transition(RacePhase::Running));
                }
            }
            RacePhase::Running | RacePhase::Finished => self.elapsed += time_step,
        }
        events
    }

    /// Running -> Finished. Anything else is left alone.
    pub fn finish(&mut self) -> Option<RaceEvent> {
        match self.phase {
            RacePhase::Running => Some(self.transition(RacePhase::Finished)),
            _ => None,
        }
    }

    pub fn camera(&self) -> CameraPose {
        match self.phase {
            RacePhase::GetReady => self.rig.overview,
            RacePhase::Intro if self.intro_secs > 0.0 => self
                .rig
                .overview
                .ease_towards(&self.rig.player, self.elapsed / self.intro_secs),
            _ => self.rig.player,
        }
    }
}
