use serde::{Deserialize, Serialize};

pub type LapNumber = u32;
// 0 is the finish line, 1..=N the intermediate checkpoints in driving order
pub type CheckpointOrder = u32;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Deserialize, Serialize)]
pub enum RacePhase {
    // Track overview on screen, nothing moves yet
    GetReady,
    // Camera sweeps from the overview onto the player's car
    Intro,
    // Numbers on screen, cars still held
    Countdown,
    Running,
    Finished,
}

impl RacePhase {
    pub fn next(self) -> RacePhase {
        match self {
            RacePhase::GetReady => RacePhase::Intro,
            RacePhase::Intro => RacePhase::Countdown,
            RacePhase::Countdown => RacePhase::Running,
            RacePhase::Running | RacePhase::Finished => RacePhase::Finished,
        }
    }
}

/// Snapshot of the player's race progress, suitable for a HUD.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct LapInformation {
    pub lap: LapNumber,
    pub total_laps: LapNumber,
    pub next_checkpoint: CheckpointOrder,
    pub checkpoints_crossed: u32,
    pub total_checkpoints: u32,
    pub phase: RacePhase,
    pub finished: bool,
}

impl LapInformation {
    pub fn new(total_laps: LapNumber, total_checkpoints: u32) -> Self {
        LapInformation {
            lap: 1,
            total_laps,
            next_checkpoint: 1,
            checkpoints_crossed: 0,
            total_checkpoints,
            phase: RacePhase::GetReady,
            finished: false,
        }
    }
}
