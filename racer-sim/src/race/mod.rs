use std::fmt;

use glam::DVec2;
use tracing::{debug, info};

use racer_core::lap_info::{CheckpointOrder, LapInformation, LapNumber, RacePhase};
use racer_core::race_event::RaceEvent;
use racer_core::settings::RaceSettings;

use crate::checkpoints::CheckpointRegistry;

pub mod camera;
mod phase;


pub use camera::{CameraPose, CameraRig};
pub use phase::Choreography;

#[derive(Clone, Debug, PartialEq)]
pub enum CrossingOutcome {
    Advanced {
        order: CheckpointOrder,
        next_expected: CheckpointOrder,
    },
    LapCompleted {
        lap: LapNumber,
        next_lap: LapNumber,
    },
    RaceFinished {
        laps: LapNumber,
    },
}

impl CrossingOutcome {
    pub fn events(&self) -> Vec<RaceEvent> {
        match *self {
            CrossingOutcome::Advanced {
                order,
                next_expected,
            } => vec![RaceEvent::CheckpointCrossed {
                order,
                next_expected,
            }],
            CrossingOutcome::LapCompleted { lap, .. } => vec![RaceEvent::LapCompleted { lap }],
            CrossingOutcome::RaceFinished { laps } => vec![
                RaceEvent::LapCompleted { lap: laps },
                RaceEvent::RaceFinished { laps },
                RaceEvent::PhaseChanged {
                    from: RacePhase::Running,
                    to: RacePhase::Finished,
                },
            ],
        }
    }
}

/// Why a checkpoint crossing didn't count. The race state is untouched
/// whenever one of these comes back.
#[derive(Clone, Debug, PartialEq)]
pub enum CrossingRejection {
    NotRunning {
        phase: RacePhase,
    },
    UnknownCheckpoint,
    OutOfOrder {
        expected: CheckpointOrder,
        got: CheckpointOrder,
    },
    AlreadyCrossed {
        order: CheckpointOrder,
    },
    MissingCheckpoints {
        crossed: usize,
        required: usize,
    },
}

impl CrossingRejection {
    pub fn checkpoint(&self) -> Option<CheckpointOrder> {
        match self {
            Self::OutOfOrder { got, .. } => Some(*got),
            Self::AlreadyCrossed { order } => Some(*order),
            Self::MissingCheckpoints { .. } => Some(0),
            Self::NotRunning { .. } | Self::UnknownCheckpoint => None,
        }
    }

    pub fn to_event(&self) -> RaceEvent {
        RaceEvent::CheckpointRejected {
            order: self.checkpoint(),
            reason: self.to_string(),
        }
    }
}

impl fmt::Display for CrossingRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotRunning { phase } => write!(f, "race is not running (phase {phase:?})"),
            Self::UnknownCheckpoint => write!(f, "no checkpoint registered there"),
            Self::OutOfOrder { expected, got } => {
                write!(f, "checkpoint {got} out of order, expected {expected}")
            }
            Self::AlreadyCrossed { order } => {
                write!(f, "checkpoint {order} already crossed this lap")
            }
            Self::MissingCheckpoints { crossed, required } => write!(
                f,
                "finish line reached with {crossed} of {required} checkpoints crossed"
            ),
        }
    }
}

/// Lap counting and checkpoint sequencing for the player, plus the pre-race
/// choreography. Crossings only count while the race is running; a valid
/// crossing moves the expected order one step along `1, 2, .., N, 0`.
pub struct RaceState {
    current_lap: LapNumber,
    total_laps: LapNumber,
    next_expected_order: CheckpointOrder,
    total_checkpoints: CheckpointOrder,
    race_finished: bool,
    max_tick_delta: f64,
    choreography: Choreography,
}

// a track with only a finish line goes straight back to it
fn first_expected_order(total_checkpoints: CheckpointOrder) -> CheckpointOrder {
    if total_checkpoints == 0 {
        0
    } else {
        1
    }
}

impl RaceState {
    pub fn new(settings: &RaceSettings, registry: &CheckpointRegistry, rig: CameraRig) -> Self {
        let total_checkpoints = registry.total_checkpoints();
        RaceState {
            current_lap: 1,
            total_laps: settings.total_laps.max(1),
            next_expected_order: first_expected_order(total_checkpoints),
            total_checkpoints,
            race_finished: false,
            max_tick_delta: settings.max_tick_delta,
            choreography: Choreography::new(settings, rig),
        }
    }

    /// Moves the choreography timers along. At most one phase change happens
    /// per call, however large `time_step` is.
    pub fn update(&mut self, time_step: f64) -> Vec<RaceEvent> {
        let time_step = if time_step.is_finite() {
            time_step.clamp(0.0, self.max_tick_delta)
        } else {
            0.0
        };
        let events = self.choreography.advance(time_step);
        for event in &events {
            if let RaceEvent::PhaseChanged { from, to } = event {
                info!("race phase {:?} -> {:?}", from, to);
            }
        }
        events
    }

    /// The player's car touched a checkpoint sensor. The checkpoint is taken
    /// to be the one nearest the car.
    pub fn on_checkpoint_entered(
        &mut self,
        registry: &mut CheckpointRegistry,
        player_position: DVec2,
    ) -> Result<CrossingOutcome, CrossingRejection> {
        if !self.can_agents_move() {
            return Err(CrossingRejection::NotRunning {
                phase: self.phase(),
            });
        }
        let order = registry
            .nearest(player_position)
            .map(|checkpoint| checkpoint.order)
            .ok_or(CrossingRejection::UnknownCheckpoint)?;
        self.validate_crossing(registry, order)
    }

    pub fn validate_crossing(
        &mut self,
        registry: &mut CheckpointRegistry,
        order: CheckpointOrder,
    ) -> Result<CrossingOutcome, CrossingRejection> {
        if self.race_finished || self.phase() != RacePhase::Running {
            return Err(CrossingRejection::NotRunning {
                phase: self.phase(),
            });
        }
        let (is_finish_line, already_crossed) = registry
            .get(order)
            .map(|checkpoint| (checkpoint.is_finish_line(), checkpoint.crossed))
            .ok_or(CrossingRejection::UnknownCheckpoint)?;

        if is_finish_line {
            if !registry.all_crossed() {
                return Err(CrossingRejection::MissingCheckpoints {
                    crossed: registry.crossed_count(),
                    required: registry.len().saturating_sub(1),
                });
            }
            return Ok(self.complete_lap(registry));
        }

        if already_crossed {
            return Err(CrossingRejection::AlreadyCrossed { order });
        }
        if order != self.next_expected_order {
            return Err(CrossingRejection::OutOfOrder {
                expected: self.next_expected_order,
                got: order,
            });
        }

        registry.mark_crossed(order);
        self.next_expected_order = if order >= self.total_checkpoints {
            0
        } else {
            order + 1
        };
        debug!(
            "checkpoint {} crossed, next {}",
            order, self.next_expected_order
        );
        Ok(CrossingOutcome::Advanced {
            order,
            next_expected: self.next_expected_order,
        })
    }

    fn complete_lap(&mut self, registry: &mut CheckpointRegistry) -> CrossingOutcome {
        if self.current_lap >= self.total_laps {
            self.race_finished = true;
            self.choreography.finish();
            info!("race finished after {} laps", self.current_lap);
            return CrossingOutcome::RaceFinished {
                laps: self.current_lap,
            };
        }

        let lap = self.current_lap;
        self.current_lap += 1;
        self.next_expected_order = first_expected_order(self.total_checkpoints);
        registry.reset_crossed();
        info!("lap {} complete, starting lap {}", lap, self.current_lap);
        CrossingOutcome::LapCompleted {
            lap,
            next_lap: self.current_lap,
        }
    }

    pub fn current_lap(&self) -> LapNumber {
        self.current_lap
    }

    pub fn total_laps(&self) -> LapNumber {
        self.total_laps
    }

    pub fn next_checkpoint_order(&self) -> CheckpointOrder {
        self.next_expected_order
    }

    pub fn is_race_finished(&self) -> bool {
        self.race_finished
    }

    pub fn phase(&self) -> RacePhase {
        self.choreography.phase()
    }

    pub fn can_agents_move(&self) -> bool {
        self.phase() == RacePhase::Running
    }

    // the outer loop stops once this is set
    pub fn should_stop(&self) -> bool {
        self.phase() == RacePhase::Finished
    }

    pub fn countdown_display(&self) -> Option<u32> {
        self.choreography.countdown_display()
    }

    pub fn camera(&self) -> CameraPose {
        self.choreography.camera()
    }

    pub fn is_lap_complete(&self, registry: &CheckpointRegistry) -> bool {
        registry.all_crossed()
    }

    pub fn lap_information(&self, registry: &CheckpointRegistry) -> LapInformation {
        LapInformation {
            lap: self.current_lap,
            total_laps: self.total_laps,
            next_checkpoint: self.next_expected_order,
            checkpoints_crossed: registry.crossed_count() as u32,
            total_checkpoints: self.total_checkpoints,
            phase: self.phase(),
            finished: self.race_finished,
        }
    }
}
